//! Report output.

use anyhow::Context;
use serde::Serialize;
use std::io::Write;

/// Write `report` to stdout as 2-space indented JSON followed by a newline.
pub fn emit_report<T: Serialize>(report: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}").context("Failed to write report to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}
