//! Error handling for the biomarker explorer.

use std::path::PathBuf;

pub mod util;

/// Failure modes of loading, merging and analyzing biomarker data
#[derive(Debug, thiserror::Error)]
pub enum BiomarkerError {
    /// A column the current step cannot run without is absent
    #[error("Required column '{column}' not found in {table}")]
    ColumnNotFound { table: String, column: String },

    /// Neither the local file nor a remote copy could be resolved
    #[error(
        "Source '{source_name}' unavailable: no file at {} and no usable URL ({detail})",
        .local.display()
    )]
    SourceUnavailable {
        source_name: String,
        local: PathBuf,
        detail: String,
    },

    /// The file extension is not one the reader understands
    #[error("Unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Configuration could not be parsed or is inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Not enough data to produce the requested analysis
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

/// Result type used across the crate
pub type Result<T> = anyhow::Result<T>;
