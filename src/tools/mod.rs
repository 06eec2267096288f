//! Adapters around the external programs that do the real work.
//!
//! Each adapter turns one program invocation into an [`Outcome`]. The
//! [`Toolchain`] trait is the seam the pipeline talks to, so tests can
//! substitute a fake that never spawns a process.

pub mod classifier;
pub mod environment;
pub mod process;
pub mod simulator;
pub mod testbench;
pub mod wavedrom;

use std::path::Path;

use crate::config::{TimeoutConfig, ToolsConfig};
use crate::errors::{PipelineError, Result};
use crate::layout::ModuleDir;
use crate::record::{self, ClassifiedModule, ModuleRecord};
use process::{Diagnostics, ToolError};

/// Diagnostic labels used for `<label>_stdout`, `<label>_stderr` and
/// `<label>_err.txt` inside module directories.
pub const CLASSIFIER_LABEL: &str = "classifier";
pub const TESTBENCH_LABEL: &str = "gentbvlog";
pub const COMPILER_LABEL: &str = "iverilog";
pub const RUNNER_LABEL: &str = "vvp";
pub const EXTRACTOR_LABEL: &str = "vcd2wavedrom";
pub const RENDERER_LABEL: &str = "wavedrom";

/// Result of one external step for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The step failed but a later run may succeed; keep the directory
    RetryableFailure(String),
    /// The module cannot progress; its directory may be discarded
    TerminalFailure(String),
}

impl Outcome {
    pub fn retryable(reason: impl Into<String>) -> Self {
        Self::RetryableFailure(reason.into())
    }

    pub fn terminal(reason: impl Into<String>) -> Self {
        Self::TerminalFailure(reason.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn should_discard(&self) -> bool {
        matches!(self, Self::TerminalFailure(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::RetryableFailure(reason) | Self::TerminalFailure(reason) => Some(reason),
        }
    }
}

impl From<ToolError> for Outcome {
    fn from(err: ToolError) -> Self {
        Self::RetryableFailure(err.to_string())
    }
}

/// `Success` if the tool left `output` behind, otherwise a terminal failure.
///
/// A clean exit without the expected artifact means the input itself is
/// unusable, so retrying cannot help.
pub(crate) fn expect_output(output: &Path, diagnostics: &Diagnostics) -> Outcome {
    if output.exists() {
        Outcome::Success
    } else {
        let reason = format!("exited cleanly but produced no {}", output.display());
        diagnostics.record_failure(&reason);
        Outcome::TerminalFailure(reason)
    }
}

/// Load the record of a module, mapping failures onto stage outcomes.
///
/// A missing record is terminal; a corrupt one is kept for inspection and
/// retried on a later run.
pub fn load_record(dir: &ModuleDir) -> std::result::Result<ModuleRecord, Outcome> {
    let record = record::load(dir).map_err(|e| match e {
        PipelineError::RecordNotFound { .. } => Outcome::terminal(e.to_string()),
        PipelineError::RecordCorrupt { ref contents, .. } => {
            log::debug!("{}: corrupt record contents: {}", dir.name(), contents);
            Outcome::retryable(e.to_string())
        }
        other => Outcome::retryable(other.to_string()),
    })?;

    // A record that parses but breaks the clock/reset invariants is corrupt
    record.validate().map_err(|reason| {
        log::debug!("{}: invalid record: {}", dir.name(), reason);
        Outcome::retryable(format!("invalid metadata record: {reason}"))
    })?;
    Ok(record)
}

/// The external programs the pipeline drives, one method per program.
pub trait Toolchain: Send + Sync {
    /// Classify HDL source text. `Ok(None)` when it contains no module.
    fn classify(&self, source: &str) -> Result<Option<ClassifiedModule>>;

    /// Write `tb.v` for the module, including the trace-dump trailer.
    fn generate_testbench(&self, dir: &ModuleDir, record: &ModuleRecord) -> Outcome;

    /// Compile `module.v` and `tb.v` into `iverilog_out`.
    fn compile(&self, dir: &ModuleDir) -> Outcome;

    /// Run the compiled simulation, producing `dump.vcd`.
    fn run_simulation(&self, dir: &ModuleDir) -> Outcome;

    /// Convert `dump.vcd` into the raw WaveDrom trace.
    fn extract_trace(&self, dir: &ModuleDir, record: &ModuleRecord) -> Outcome;

    /// Render a WaveDrom descriptor to an image.
    fn render(&self, dir: &ModuleDir, descriptor: &Path, image: &Path) -> Outcome;
}

/// Toolchain backed by real processes.
#[derive(Debug, Clone)]
pub struct ExternalToolchain {
    tools: ToolsConfig,
    timeouts: TimeoutConfig,
    max_sim_time: u64,
    debug: bool,
}

impl ExternalToolchain {
    pub fn new(tools: ToolsConfig, timeouts: TimeoutConfig, max_sim_time: u64, debug: bool) -> Self {
        Self {
            tools,
            timeouts,
            max_sim_time,
            debug,
        }
    }

    fn diagnostics(&self, dir: &ModuleDir, label: &str) -> Diagnostics {
        Diagnostics::for_module(self.debug, dir, label)
    }
}

impl Toolchain for ExternalToolchain {
    fn classify(&self, source: &str) -> Result<Option<ClassifiedModule>> {
        classifier::classify(&self.tools.classifier, self.timeouts.classify(), source)
    }

    fn generate_testbench(&self, dir: &ModuleDir, record: &ModuleRecord) -> Outcome {
        let request = testbench::TestbenchRequest {
            program: &self.tools.testbench,
            timeout: self.timeouts.testbench(),
            max_sim_time: self.max_sim_time,
        };
        testbench::generate(&request, dir, record, self.diagnostics(dir, TESTBENCH_LABEL))
    }

    fn compile(&self, dir: &ModuleDir) -> Outcome {
        simulator::compile(
            &self.tools.compiler,
            self.timeouts.compile(),
            dir,
            self.diagnostics(dir, COMPILER_LABEL),
        )
    }

    fn run_simulation(&self, dir: &ModuleDir) -> Outcome {
        simulator::run(
            &self.tools.runner,
            self.timeouts.run(),
            dir,
            self.diagnostics(dir, RUNNER_LABEL),
        )
    }

    fn extract_trace(&self, dir: &ModuleDir, record: &ModuleRecord) -> Outcome {
        wavedrom::extract(
            &self.tools.extractor,
            self.timeouts.extract(),
            dir,
            record,
            self.diagnostics(dir, EXTRACTOR_LABEL),
        )
    }

    fn render(&self, dir: &ModuleDir, descriptor: &Path, image: &Path) -> Outcome {
        wavedrom::render(
            &self.tools.renderer,
            self.timeouts.render(),
            descriptor,
            image,
            self.diagnostics(dir, RENDERER_LABEL),
        )
    }
}
