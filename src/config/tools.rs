//! External program names and per-tool timeouts.

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_classifier() -> String {
    "hdl-classify".to_string()
}

fn default_testbench() -> String {
    "gentbvlog".to_string()
}

fn default_compiler() -> String {
    "iverilog".to_string()
}

fn default_runner() -> String {
    "vvp".to_string()
}

fn default_extractor() -> String {
    "vcd2wavedrom".to_string()
}

fn default_renderer() -> String {
    "wavedrom-cli".to_string()
}

/// Program names of the external tools.
///
/// Each entry is looked up on `PATH` unless it is an explicit path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolsConfig {
    /// Module classifier: `<program> <source-file>` prints the port list as JSON
    #[serde(default = "default_classifier")]
    pub classifier: String,

    /// Testbench generator
    #[serde(default = "default_testbench")]
    pub testbench: String,

    /// Verilog compiler
    #[serde(default = "default_compiler")]
    pub compiler: String,

    /// Runner for the compiled simulation
    #[serde(default = "default_runner")]
    pub runner: String,

    /// VCD to WaveDrom JSON converter
    #[serde(default = "default_extractor")]
    pub extractor: String,

    /// WaveDrom JSON to image renderer
    #[serde(default = "default_renderer")]
    pub renderer: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            classifier: default_classifier(),
            testbench: default_testbench(),
            compiler: default_compiler(),
            runner: default_runner(),
            extractor: default_extractor(),
            renderer: default_renderer(),
        }
    }
}

fn default_classify_secs() -> u64 {
    10
}

fn default_testbench_secs() -> u64 {
    60
}

fn default_compile_secs() -> u64 {
    10
}

fn default_run_secs() -> u64 {
    10
}

fn default_extract_secs() -> u64 {
    30
}

fn default_render_secs() -> u64 {
    30
}

/// Upper bound, in seconds, on every external invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeoutConfig {
    #[serde(default = "default_classify_secs")]
    pub classify_secs: u64,
    #[serde(default = "default_testbench_secs")]
    pub testbench_secs: u64,
    #[serde(default = "default_compile_secs")]
    pub compile_secs: u64,
    #[serde(default = "default_run_secs")]
    pub run_secs: u64,
    #[serde(default = "default_extract_secs")]
    pub extract_secs: u64,
    #[serde(default = "default_render_secs")]
    pub render_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            classify_secs: default_classify_secs(),
            testbench_secs: default_testbench_secs(),
            compile_secs: default_compile_secs(),
            run_secs: default_run_secs(),
            extract_secs: default_extract_secs(),
            render_secs: default_render_secs(),
        }
    }
}

impl TimeoutConfig {
    pub fn classify(&self) -> Duration {
        secs(self.classify_secs)
    }

    pub fn testbench(&self) -> Duration {
        secs(self.testbench_secs)
    }

    pub fn compile(&self) -> Duration {
        secs(self.compile_secs)
    }

    pub fn run(&self) -> Duration {
        secs(self.run_secs)
    }

    pub fn extract(&self) -> Duration {
        secs(self.extract_secs)
    }

    pub fn render(&self) -> Duration {
        secs(self.render_secs)
    }
}

// A zero timeout would kill every tool immediately
fn secs(value: u64) -> Duration {
    Duration::from_secs(value.max(1))
}
