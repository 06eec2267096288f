//! Compilation and execution of the generated testbench.

use std::fs;
use std::time::Duration;

use super::process::{Diagnostics, ToolCommand};
use super::testbench::has_trailer;
use super::{expect_output, Outcome};
use crate::layout::{ModuleDir, COMPILED_FILE, SOURCE_FILE, TESTBENCH_FILE};

/// Compile `module.v` and `tb.v` into `iverilog_out`.
///
/// Refuses to run when the testbench lacks the trace-dump trailer: the
/// simulation would finish without producing a trace.
pub fn compile(program: &str, timeout: Duration, dir: &ModuleDir, diagnostics: Diagnostics) -> Outcome {
    match fs::read_to_string(dir.testbench_file()) {
        Ok(text) if has_trailer(&text) => {}
        Ok(_) => {
            let reason = "testbench has no trace-dump trailer".to_string();
            diagnostics.record_failure(&reason);
            return Outcome::TerminalFailure(reason);
        }
        Err(e) => {
            let reason = format!("cannot read testbench: {e}");
            diagnostics.record_failure(&reason);
            return Outcome::TerminalFailure(reason);
        }
    }

    let cmd = ToolCommand::new(program, timeout)
        .args([SOURCE_FILE, TESTBENCH_FILE, "-o", COMPILED_FILE])
        .current_dir(dir.path())
        .produces(&dir.compiled_file())
        .diagnostics(diagnostics.clone());
    if let Err(e) = cmd.run() {
        return e.into();
    }
    expect_output(&dir.compiled_file(), &diagnostics)
}

/// Run `iverilog_out` inside the module directory so `dump.vcd` lands there.
pub fn run(program: &str, timeout: Duration, dir: &ModuleDir, diagnostics: Diagnostics) -> Outcome {
    let cmd = ToolCommand::new(program, timeout)
        .arg(COMPILED_FILE)
        .current_dir(dir.path())
        .produces(&dir.dump_file())
        .diagnostics(diagnostics.clone());
    if let Err(e) = cmd.run() {
        return e.into();
    }
    expect_output(&dir.dump_file(), &diagnostics)
}
