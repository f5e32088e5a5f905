//! Report output

use anyhow::{Context, Result};
use perfdash_lib::BuildData;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Write the aggregate as pretty JSON to `path`, or stdout when absent
pub fn write_report(result: &BuildData, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("Failed to serialize report")?;

    match path {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json).context("Failed to write report to stdout")
        }
    }
}
