//! Console output of reports

use std::io::Write;

use anyhow::Context;
use serde::Serialize;

use crate::error::Result;

/// Print a report as pretty JSON on stdout
pub fn print_json<T: Serialize>(report: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, report).context("Failed to serialize report")?;
    writeln!(out).context("Failed to write report")?;
    Ok(())
}
