//! Logging utilities for output and progress tracking
//!
//! Standardized log lines for source loading, progress bars for the
//! parallel reads, and console rendering of reports.

pub mod console;
pub mod log;
pub mod progress;

pub use log::{log_load_complete, log_load_start, log_warning};
pub use progress::{create_load_progress_bar, create_spinner, finish_progress_bar};
