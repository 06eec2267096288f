//! Completion totals of a dataset, computed from the marker files.

use std::fmt;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::layout::list_module_dirs;

/// Number of module directories carrying each stage marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CountReport {
    pub total: usize,
    pub modules: usize,
    pub testbenches: usize,
    pub compilations: usize,
    pub simulations: usize,
    pub traces: usize,
    pub rendered: usize,
}

/// Scan every module directory under `root`.
///
/// Each marker is counted on its own, so a directory with a stray dump but
/// no testbench still counts as a simulation.
pub fn count(root: &Path) -> io::Result<CountReport> {
    let mut report = CountReport::default();
    for dir in list_module_dirs(root)? {
        report.total += 1;
        report.modules += usize::from(dir.source_file().is_file());
        report.testbenches += usize::from(dir.testbench_file().is_file());
        report.compilations += usize::from(dir.compiled_file().is_file());
        report.simulations += usize::from(dir.dump_file().is_file());
        report.traces += usize::from(dir.trace_file().is_file());
        report.rendered += usize::from(dir.has_images());
    }
    Ok(report)
}

impl fmt::Display for CountReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total dataset folders: {}", self.total)?;
        writeln!(f, "Total modules: {}", self.modules)?;
        writeln!(f, "Total testbenches: {}", self.testbenches)?;
        writeln!(f, "Total compilations: {}", self.compilations)?;
        writeln!(f, "Total simulations: {}", self.simulations)?;
        writeln!(f, "Total traces: {}", self.traces)?;
        write!(f, "Total rendered: {}", self.rendered)
    }
}
