//! Per-module progress derived from the files in its directory.
//!
//! Nothing about progress is stored separately: the state is recomputed
//! from completion markers every time, so an interrupted run resumes
//! exactly where the artifacts say it stopped.

use super::stage::PipelineStage;
use crate::layout::ModuleDir;
use crate::tools::{CLASSIFIER_LABEL, TESTBENCH_LABEL};

/// How far a module directory has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModuleState {
    /// Missing source or record
    Empty,
    /// `module.v` and `meta.json`
    Classified,
    /// `tb.v`
    TestbenchReady,
    /// `iverilog_out`
    Compiled,
    /// `dump.vcd`
    Simulated,
    /// `wavedrom.json`
    Traced,
    /// at least one rendered image
    Rendered,
}

impl ModuleState {
    /// Highest state whose marker, and every earlier marker, is present.
    pub fn probe(dir: &ModuleDir) -> ModuleState {
        if !(dir.source_file().is_file() && dir.record_file().is_file()) {
            return ModuleState::Empty;
        }

        let steps = [
            (dir.testbench_file().is_file(), ModuleState::TestbenchReady),
            (dir.compiled_file().is_file(), ModuleState::Compiled),
            (dir.dump_file().is_file(), ModuleState::Simulated),
            (dir.trace_file().is_file(), ModuleState::Traced),
        ];

        let mut state = ModuleState::Classified;
        for (present, next) in steps {
            if !present {
                return state;
            }
            state = next;
        }

        if dir.has_images() {
            ModuleState::Rendered
        } else {
            state
        }
    }

    /// Whether `stage` has work to do for a directory in this state.
    pub fn needs(self, stage: PipelineStage, dir: &ModuleDir) -> bool {
        match stage {
            // Ingestion rebuilds the dataset root; it never works per directory
            PipelineStage::Ingest => false,
            PipelineStage::Synthesize => {
                self == ModuleState::Classified
                    && !dir.has_error_marker(CLASSIFIER_LABEL)
                    && !dir.has_error_marker(TESTBENCH_LABEL)
            }
            PipelineStage::Simulate => {
                matches!(self, ModuleState::TestbenchReady | ModuleState::Compiled)
            }
            PipelineStage::Render => matches!(self, ModuleState::Simulated | ModuleState::Traced),
        }
    }
}

/// Probe `dir` and decide whether `stage` should process it.
pub fn needs_work(stage: PipelineStage, dir: &ModuleDir) -> bool {
    ModuleState::probe(dir).needs(stage, dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: std::path::PathBuf) {
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_probe_walks_markers_in_order() {
        let temp = TempDir::new().unwrap();
        let dir = ModuleDir::new(temp.path());
        assert_eq!(ModuleState::probe(&dir), ModuleState::Empty);

        touch(dir.source_file());
        touch(dir.record_file());
        assert_eq!(ModuleState::probe(&dir), ModuleState::Classified);

        touch(dir.testbench_file());
        touch(dir.compiled_file());
        assert_eq!(ModuleState::probe(&dir), ModuleState::Compiled);

        touch(dir.dump_file());
        touch(dir.trace_file());
        assert_eq!(ModuleState::probe(&dir), ModuleState::Traced);

        fs::create_dir(dir.images_dir()).unwrap();
        touch(dir.variant_image(0));
        assert_eq!(ModuleState::probe(&dir), ModuleState::Rendered);
    }

    #[test]
    fn test_probe_stops_at_first_gap() {
        let temp = TempDir::new().unwrap();
        let dir = ModuleDir::new(temp.path());
        touch(dir.source_file());
        touch(dir.record_file());
        // A dump without a testbench does not count
        touch(dir.dump_file());
        assert_eq!(ModuleState::probe(&dir), ModuleState::Classified);
    }

    #[test]
    fn test_synthesize_skips_recorded_generator_failure() {
        let temp = TempDir::new().unwrap();
        let dir = ModuleDir::new(temp.path());
        touch(dir.source_file());
        touch(dir.record_file());
        assert!(needs_work(PipelineStage::Synthesize, &dir));

        touch(dir.error_marker(TESTBENCH_LABEL));
        assert!(!needs_work(PipelineStage::Synthesize, &dir));
    }

    #[test]
    fn test_stage_windows() {
        let dir = ModuleDir::new("/nonexistent");
        assert!(ModuleState::Compiled.needs(PipelineStage::Simulate, &dir));
        assert!(!ModuleState::Simulated.needs(PipelineStage::Simulate, &dir));
        assert!(ModuleState::Traced.needs(PipelineStage::Render, &dir));
        assert!(!ModuleState::Rendered.needs(PipelineStage::Render, &dir));
        assert!(!ModuleState::Classified.needs(PipelineStage::Ingest, &dir));
    }
}
