//! Parallelism configuration for stage execution.
//!
//! One general limit (`jobs`) drives every stage. The testbench generator is
//! known to misbehave under load, so its admission gate gets roughly half of
//! the general limit.

use serde::{Deserialize, Serialize};

/// Configuration for parallel processing operations.
///
/// # Example
///
/// ```rust
/// use wavebench::config::ParallelConfig;
///
/// let config = ParallelConfig { jobs: Some(8) };
/// assert_eq!(config.effective_jobs(), 8);
/// assert_eq!(config.testbench_concurrency(), 4);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParallelConfig {
    /// General concurrency limit (default: available cores minus two)
    ///
    /// Used as the worker count of every stage and as the capacity of the
    /// simulation and rendering gates.
    #[serde(default)]
    pub jobs: Option<usize>,
}

impl ParallelConfig {
    pub fn with_jobs(jobs: usize) -> Self {
        Self { jobs: Some(jobs) }
    }

    /// Get the effective general limit, never below one.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(default_jobs).max(1)
    }

    /// Capacity of the testbench generator gate.
    pub fn testbench_concurrency(&self) -> usize {
        (self.effective_jobs() / 2).max(1)
    }

    /// Capacity of the compile/run gate.
    pub fn simulation_concurrency(&self) -> usize {
        self.effective_jobs()
    }

    /// Capacity of the trace extraction and rendering gate.
    pub fn render_concurrency(&self) -> usize {
        self.effective_jobs()
    }
}

/// Available cores minus two, leaving room for the coordinator and the OS.
fn default_jobs() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    if cores > 2 {
        cores - 2
    } else {
        1
    }
}
