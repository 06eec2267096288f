//! Sequencing of the four stages over a dataset root.

use std::fmt;
use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use super::stage::PipelineStage;
use super::state::{needs_work, ModuleState};
use crate::config::{ParallelConfig, PipelineSettings};
use crate::errors::{PipelineError, Result};
use crate::executor::{AdmissionGate, CancelToken, StageExecutor, StageSummary};
use crate::ingest::{self, SourceBlob};
use crate::layout::{list_module_dirs, ModuleDir};
use crate::observability::{increment_processed, set_current_module, set_current_tool, set_stage, start_progress};
use crate::progress::ProgressManager;
use crate::tools::{load_record, Outcome, Toolchain, COMPILER_LABEL, RUNNER_LABEL, TESTBENCH_LABEL};
use crate::waveform;

/// Per-stage results of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub stages: Vec<StageSummary>,
    /// The run stopped early because the cancel token was set
    pub cancelled: bool,
}

impl PipelineReport {
    pub fn stage(&self, name: &str) -> Option<&StageSummary> {
        self.stages.iter().find(|s| s.name == name)
    }
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for summary in &self.stages {
            write!(
                f,
                "{:<11} {}/{} succeeded",
                summary.name, summary.succeeded, summary.attempted
            )?;
            if summary.skipped > 0 {
                write!(f, ", {} skipped", summary.skipped)?;
            }
            writeln!(f, " ({:.1?})", summary.elapsed)?;
        }
        if self.cancelled {
            writeln!(f, "cancelled")?;
        }
        Ok(())
    }
}

/// Drives the stages over one dataset root.
pub struct PipelineController {
    root: PathBuf,
    settings: PipelineSettings,
    toolchain: Arc<dyn Toolchain>,
    executor: StageExecutor,
    testbench_gate: AdmissionGate,
    simulation_gate: AdmissionGate,
    render_gate: AdmissionGate,
    cancel: CancelToken,
    progress: ProgressManager,
}

impl PipelineController {
    /// Fails when `settings.root` is unset.
    pub fn new(
        settings: PipelineSettings,
        toolchain: Arc<dyn Toolchain>,
        parallel: &ParallelConfig,
        cancel: CancelToken,
        progress: ProgressManager,
    ) -> Result<Self> {
        let root = settings
            .root
            .clone()
            .ok_or_else(|| PipelineError::Config("dataset root is not set".to_string()))?;

        Ok(Self {
            root,
            settings,
            toolchain,
            executor: StageExecutor::new(parallel.effective_jobs(), cancel.clone()),
            testbench_gate: AdmissionGate::new("testbench", parallel.testbench_concurrency()),
            simulation_gate: AdmissionGate::new("simulation", parallel.simulation_concurrency()),
            render_gate: AdmissionGate::new("render", parallel.render_concurrency()),
            cancel,
            progress,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run `start` and every later stage.
    ///
    /// A stage starts once the previous one has attempted all its modules,
    /// however many of them succeeded.
    pub fn run(&self, start: PipelineStage, sources: &[SourceBlob]) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();
        for stage in PipelineStage::from_start(start) {
            if self.cancel.is_cancelled() {
                log::warn!("Cancelled before the {stage} stage");
                report.cancelled = true;
                break;
            }

            let summary = match stage {
                PipelineStage::Ingest => self.ingest(sources)?,
                PipelineStage::Synthesize => self.synthesize()?,
                PipelineStage::Simulate => self.simulate()?,
                PipelineStage::Render => self.render()?,
            };
            log::info!(
                "{}: {}/{} succeeded ({:.0}%), {} skipped in {:.1?}",
                stage,
                summary.succeeded,
                summary.attempted,
                summary.success_rate() * 100.0,
                summary.skipped,
                summary.elapsed
            );
            if summary.skipped > 0 {
                report.cancelled = true;
            }
            report.stages.push(summary);
        }
        Ok(report)
    }

    /// Rebuild the dataset root from `sources`.
    ///
    /// Any previous contents of the root are deleted. Candidates are
    /// classified in parallel on the rayon pool.
    pub fn ingest(&self, sources: &[SourceBlob]) -> Result<StageSummary> {
        let _stage = set_stage(PipelineStage::Ingest);
        let started = Instant::now();

        if self.root.exists() {
            log::info!("Removing existing dataset at {}", self.root.display());
            fs::remove_dir_all(&self.root)?;
        }
        fs::create_dir_all(&self.root)?;

        let candidates = ingest::prepare_candidates(sources);
        log::info!(
            "Classifying {} module candidates from {} sources",
            candidates.len(),
            sources.len()
        );

        let bar = self.progress.stage_bar(PipelineStage::Ingest, candidates.len());
        start_progress(candidates.len());

        let results: Vec<Option<bool>> = candidates
            .par_iter()
            .map(|candidate| {
                if self.cancel.is_cancelled() {
                    return None;
                }
                let _stage = set_stage(PipelineStage::Ingest);
                let _module = set_current_module(ModuleDir::for_id(&self.root, candidate.id).path());
                let accepted = catch_unwind(AssertUnwindSafe(|| {
                    ingest::ingest_candidate(
                        &self.root,
                        candidate,
                        self.toolchain.as_ref(),
                        self.settings.max_ports,
                    )
                }));
                let accepted = match accepted {
                    Ok(Ok(_)) => true,
                    Ok(Err(e)) => {
                        log::debug!("candidate {}: {}", candidate.id, e);
                        false
                    }
                    Err(_) => false,
                };
                bar.inc(1);
                increment_processed();
                Some(accepted)
            })
            .collect();
        bar.finish_and_clear();

        let attempted = results.iter().flatten().count();
        let succeeded = results.iter().flatten().filter(|ok| **ok).count();
        Ok(StageSummary {
            name: PipelineStage::Ingest.name().to_string(),
            total: candidates.len(),
            attempted,
            succeeded,
            skipped: candidates.len() - attempted,
            elapsed: started.elapsed(),
        })
    }

    /// Generate testbenches for classified modules.
    pub fn synthesize(&self) -> Result<StageSummary> {
        self.run_module_stage(PipelineStage::Synthesize, |dir| {
            let record = match load_record(dir) {
                Ok(record) => record,
                Err(outcome) => return self.settle(dir, outcome),
            };
            let outcome = {
                let _permit = self.testbench_gate.acquire();
                let _tool = set_current_tool(TESTBENCH_LABEL);
                self.toolchain.generate_testbench(dir, &record)
            };
            self.settle(dir, outcome)
        })
    }

    /// Compile and run the simulation of every module with a testbench.
    ///
    /// A module that is already compiled only runs. A failed compile never
    /// reaches the run step.
    pub fn simulate(&self) -> Result<StageSummary> {
        self.run_module_stage(PipelineStage::Simulate, |dir| {
            if ModuleState::probe(dir) < ModuleState::Compiled {
                let compiled = {
                    let _permit = self.simulation_gate.acquire();
                    let _tool = set_current_tool(COMPILER_LABEL);
                    self.toolchain.compile(dir)
                };
                if !compiled.is_success() {
                    return self.settle(dir, compiled);
                }
            }

            let ran = {
                let _permit = self.simulation_gate.acquire();
                let _tool = set_current_tool(RUNNER_LABEL);
                self.toolchain.run_simulation(dir)
            };
            self.settle(dir, ran)
        })
    }

    /// Extract traces and render waveform variants.
    pub fn render(&self) -> Result<StageSummary> {
        self.run_module_stage(PipelineStage::Render, |dir| {
            let outcome = waveform::render_module(
                dir,
                self.toolchain.as_ref(),
                &self.render_gate,
                self.settings.max_variants,
            );
            self.settle(dir, outcome)
        })
    }

    /// Run `op` on every module directory that still needs `stage`.
    ///
    /// The directory listing is taken once, at stage start.
    fn run_module_stage<F>(&self, stage: PipelineStage, op: F) -> Result<StageSummary>
    where
        F: Fn(&ModuleDir) -> bool + Sync,
    {
        let _stage = set_stage(stage);
        let all = list_module_dirs(&self.root)?;
        let total = all.len();
        let pending: Vec<ModuleDir> = all
            .into_iter()
            .filter(|dir| needs_work(stage, dir))
            .collect();
        log::info!(
            "{stage}: {} of {} module directories need work",
            pending.len(),
            total
        );

        let bar = self.progress.stage_bar(stage, pending.len());
        start_progress(pending.len());

        let summary = self.executor.run_stage_with(
            stage.name(),
            pending,
            |dir| {
                let _stage = set_stage(stage);
                let _module = set_current_module(dir.path());
                op(&dir)
            },
            |_| {
                bar.inc(1);
                increment_processed();
            },
        );
        bar.finish_and_clear();
        Ok(summary)
    }

    /// Turn an outcome into the item's success flag, discarding the module
    /// directory when the failure is terminal and discarding is enabled.
    fn settle(&self, dir: &ModuleDir, outcome: Outcome) -> bool {
        match outcome {
            Outcome::Success => true,
            failure => {
                log::debug!(
                    "{}: {}",
                    dir.name(),
                    failure.reason().unwrap_or("failed")
                );
                if failure.should_discard() && self.settings.discard_failed {
                    match dir.discard() {
                        Ok(()) => log::debug!("{}: discarded", dir.name()),
                        Err(e) => log::warn!("Failed to discard {}: {}", dir.name(), e),
                    }
                }
                false
            }
        }
    }
}
