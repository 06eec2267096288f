//! External module classifier.
//!
//! The classifier is invoked as `<program> <source-file>` and prints a JSON
//! object `{"name", "parameters", "ports": [{"name", "mode"}]}` on stdout.
//! An empty output or a literal `null` means the text holds no module.

use std::fs;
use std::io::Write;
use std::time::Duration;

use super::process::ToolCommand;
use crate::errors::{ClassificationFailure, Result};
use crate::record::ClassifiedModule;

/// Classify one source candidate in isolation.
pub fn classify(program: &str, timeout: Duration, source: &str) -> Result<Option<ClassifiedModule>> {
    let mut input = tempfile::Builder::new()
        .prefix("wavebench-")
        .suffix(".v")
        .tempfile()?;
    input.write_all(source.as_bytes())?;
    input.flush()?;

    let output = tempfile::NamedTempFile::new()?;

    ToolCommand::new(program, timeout)
        .path_arg(input.path())
        .stdout_to(output.path())
        .run()
        .map_err(|e| ClassificationFailure::Tool(e.to_string()))?;

    let stdout = fs::read_to_string(output.path())?;
    parse_output(&stdout)
}

/// Interpret the classifier's stdout.
pub fn parse_output(stdout: &str) -> Result<Option<ClassifiedModule>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }

    let module: ClassifiedModule = serde_json::from_str(trimmed)
        .map_err(|e| ClassificationFailure::Tool(format!("unparsable classifier output: {e}")))?;
    if module.name.is_empty() {
        return Ok(None);
    }
    Ok(Some(module))
}
