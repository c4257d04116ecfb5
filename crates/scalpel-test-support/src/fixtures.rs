//! Config documents and log file readers for integration tests.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// YAML `logs` section pointing the file sink at `dir` with the given levels.
#[must_use]
pub fn logs_yaml(dir: &Path, file_level: &str, console_level: &str) -> String {
    format!(
        concat!(
            "logs:\n  file:\n    level: {}\n    path: {}\n",
            "  console:\n    level: {}\n    color: never\n",
        ),
        file_level,
        dir.display(),
        console_level,
    )
}

/// Parse every line of a JSON-lines log file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a line is not valid JSON.
pub fn read_json_lines(path: &Path) -> Result<Vec<Value>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read log file '{}'", path.display()))?;
    contents
        .lines()
        .enumerate()
        .map(|(index, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("line {} is not valid JSON: {line}", index + 1))
        })
        .collect()
}
