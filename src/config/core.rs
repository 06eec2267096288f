use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::parallel::ParallelConfig;
use super::tools::{TimeoutConfig, ToolsConfig};

fn default_max_ports() -> usize {
    6
}

fn default_max_sim_time() -> u64 {
    100
}

fn default_max_variants() -> usize {
    16
}

/// Dataset-shape and failure-handling settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineSettings {
    /// Dataset root holding one directory per module
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Maximum number of non-clock, non-reset ports for ingestion
    #[serde(default = "default_max_ports")]
    pub max_ports: usize,

    /// Simulation length passed to the testbench generator, in ns
    #[serde(default = "default_max_sim_time")]
    pub max_sim_time: u64,

    /// Upper bound (inclusive) on waveform variants per module
    #[serde(default = "default_max_variants")]
    pub max_variants: usize,

    /// Delete module directories whose failure is unrecoverable
    #[serde(default)]
    pub discard_failed: bool,

    /// Keep per-tool stdout/stderr and failure reasons in module directories
    #[serde(default)]
    pub debug: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            root: None,
            max_ports: default_max_ports(),
            max_sim_time: default_max_sim_time(),
            max_variants: default_max_variants(),
            discard_failed: false,
            debug: false,
        }
    }
}

/// Top-level contents of `.wavebench.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WavebenchConfig {
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub parallel: ParallelConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}
