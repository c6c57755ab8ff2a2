//! Standardized log lines for loading sources

use std::path::Path;
use std::time::Duration;

/// Log the start of a source load
pub fn log_load_start(source: &str, path: &Path) {
    log::info!("Loading {source} from {}", path.display());
}

/// Log a finished source load with its row count
///
/// # Arguments
/// * `source` - Name of the source
/// * `path` - File the rows were read from
/// * `rows` - Number of rows read
/// * `elapsed` - Optional elapsed time
pub fn log_load_complete(source: &str, path: &Path, rows: usize, elapsed: Option<Duration>) {
    match elapsed {
        Some(duration) => log::info!(
            "Loaded {rows} {source} rows from {} in {duration:?}",
            path.display()
        ),
        None => log::info!("Loaded {rows} {source} rows from {}", path.display()),
    }
}

/// Log a warning, optionally naming the file it concerns
pub fn log_warning(message: &str, path: Option<&Path>) {
    if let Some(path) = path {
        log::warn!("{message}: {}", path.display());
    } else {
        log::warn!("{message}");
    }
}
