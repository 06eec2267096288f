//! Trace extraction (`dump.vcd` to WaveDrom JSON) and image rendering.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use super::process::{Diagnostics, ToolCommand};
use super::{expect_output, Outcome};
use crate::layout::{ModuleDir, DUMP_FILE, RAW_TRACE_FILE, TRACE_CONFIG_FILE};
use crate::record::{write_atomic, ModuleRecord};

/// Contents of `trace_config.json` read by the extractor.
#[derive(Debug, Serialize)]
struct TraceConfig<'a> {
    clocks: &'a [String],
}

/// Write the clock list and convert `dump.vcd` into `wavedrom_raw.json`.
pub fn extract(
    program: &str,
    timeout: Duration,
    dir: &ModuleDir,
    record: &ModuleRecord,
    diagnostics: Diagnostics,
) -> Outcome {
    let config = TraceConfig {
        clocks: &record.clocks,
    };
    let written = serde_json::to_vec(&config)
        .map_err(|e| e.to_string())
        .and_then(|bytes| write_atomic(&dir.trace_config_file(), &bytes).map_err(|e| e.to_string()));
    if let Err(reason) = written {
        diagnostics.record_failure(&reason);
        return Outcome::RetryableFailure(reason);
    }

    let cmd = ToolCommand::new(program, timeout)
        .args(["-in", DUMP_FILE, "-out", RAW_TRACE_FILE, "-c", TRACE_CONFIG_FILE])
        .current_dir(dir.path())
        .produces(&dir.raw_trace_file())
        .diagnostics(diagnostics.clone());
    if let Err(e) = cmd.run() {
        return e.into();
    }
    expect_output(&dir.raw_trace_file(), &diagnostics)
}

/// Render one descriptor to `image`.
pub fn render(
    program: &str,
    timeout: Duration,
    descriptor: &Path,
    image: &Path,
    diagnostics: Diagnostics,
) -> Outcome {
    let cmd = ToolCommand::new(program, timeout)
        .arg("-i")
        .path_arg(descriptor)
        .arg("-p")
        .path_arg(image)
        .produces(image)
        .diagnostics(diagnostics.clone());
    if let Err(e) = cmd.run() {
        return e.into();
    }
    expect_output(image, &diagnostics)
}
