//! Utility functions for error handling
//!
//! Helpers that turn filesystem failures into errors carrying the path and
//! the reason the file was needed.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::Context;

use crate::error::Result;

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.exists() {
        anyhow::bail!("File not found: {} (needed for: {purpose})", path.display());
    }

    if !path.is_file() {
        anyhow::bail!(
            "Path is not a file: {} (expected a file for: {purpose})",
            path.display()
        );
    }

    fs::File::open(path).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::PermissionDenied => "Permission denied - check file permissions".to_string(),
            io::ErrorKind::NotFound => {
                "File not found - it may have been deleted during operation".to_string()
            }
            _ => format!("Failed to open file for: {purpose}"),
        };
        anyhow::Error::new(e).context(format!("{context}: {}", path.display()))
    })
}

/// Make sure a directory exists, creating it (and parents) when missing
pub fn ensure_directory(path: &Path, purpose: &str) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }

    if path.exists() {
        anyhow::bail!(
            "Path is not a directory: {} (expected a directory for: {purpose})",
            path.display()
        );
    }

    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory {} for: {purpose}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_mentions_purpose() {
        let dir = tempfile::tempdir().unwrap();
        let err = safe_open_file(&dir.path().join("absent.csv"), "loading demographics")
            .unwrap_err()
            .to_string();
        assert!(err.contains("loading demographics"));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(safe_open_file(dir.path(), "reading").is_err());
    }

    #[test]
    fn test_ensure_directory_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_directory(&nested, "cache").unwrap();
        assert!(nested.is_dir());
    }
}
