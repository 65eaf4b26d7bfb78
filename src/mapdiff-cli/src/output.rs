//! Report rendering

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use mapdiff::Report;
use std::io::Write;

/// Write `report` to `out` in the requested format
pub fn render<W: Write>(out: &mut W, report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            write!(out, "{}", report).context("Failed to write report")?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report).context("Failed to serialize report")?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}
