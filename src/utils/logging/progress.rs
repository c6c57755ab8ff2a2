//! Progress reporting for source loading, using the indicatif crate

use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::Result;

/// Style of the bar shown while sources load
pub const LOAD_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}";

/// Style of the spinner shown while a download runs
pub const SPINNER_TEMPLATE: &str = "{spinner:.green} {elapsed_precise} {msg}";

/// Create a progress bar counting loaded sources
///
/// # Arguments
/// * `length` - Number of sources
/// * `description` - Optional initial message
pub fn create_load_progress_bar(length: u64, description: Option<&str>) -> Result<ProgressBar> {
    let pb = ProgressBar::new(length);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(LOAD_TEMPLATE)
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );

    if let Some(desc) = description {
        pb.set_message(desc.to_string());
    }

    Ok(pb)
}

/// Create a spinner for operations without a known length
pub fn create_spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template(SPINNER_TEMPLATE)
            .context("Invalid spinner template")?,
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    Ok(pb)
}

/// Finish a progress bar, leaving the message on screen when one is given
pub fn finish_progress_bar(pb: &ProgressBar, message: Option<&str>) {
    if let Some(msg) = message {
        pb.finish_with_message(msg.to_string());
    } else {
        pb.finish_and_clear();
    }
}
