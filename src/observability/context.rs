//! Thread-local context tracking for crash reports.
//!
//! Records which stage a thread is running and which module directory it is
//! working on. Every worker thread (rayon or executor) carries its own
//! context; stage-wide progress lives in atomic counters.

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::pipeline::PipelineStage;

static MODULES_PROCESSED: AtomicUsize = AtomicUsize::new(0);
static MODULES_TOTAL: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static CURRENT_CONTEXT: RefCell<PipelineContext> = const { RefCell::new(PipelineContext::new()) };
}

/// What the current thread was doing.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    pub stage: Option<PipelineStage>,
    /// Module directory being processed
    pub module: Option<PathBuf>,
    /// External tool currently running for the module
    pub tool: Option<String>,
}

impl PipelineContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stage: None,
            module: None,
            tool: None,
        }
    }
}

/// RAII guard restoring the previous context on drop.
pub struct ContextGuard {
    previous: PipelineContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = self.previous.clone();
        });
    }
}

fn update(apply: impl FnOnce(&mut PipelineContext)) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        apply(&mut ctx.borrow_mut());
        ContextGuard { previous }
    })
}

/// Set the current stage until the guard drops.
#[must_use]
pub fn set_stage(stage: PipelineStage) -> ContextGuard {
    update(|ctx| ctx.stage = Some(stage))
}

/// Set the current module directory until the guard drops.
#[must_use]
pub fn set_current_module(path: impl Into<PathBuf>) -> ContextGuard {
    let path = path.into();
    update(|ctx| ctx.module = Some(path))
}

/// Set the external tool being run until the guard drops.
#[must_use]
pub fn set_current_tool(tool: impl Into<String>) -> ContextGuard {
    let tool = tool.into();
    update(|ctx| ctx.tool = Some(tool))
}

/// Reset the progress counters for a new stage of `total` modules.
pub fn start_progress(total: usize) {
    MODULES_PROCESSED.store(0, Ordering::Relaxed);
    MODULES_TOTAL.store(total, Ordering::Relaxed);
}

pub fn increment_processed() {
    MODULES_PROCESSED.fetch_add(1, Ordering::Relaxed);
}

#[must_use]
pub fn get_current_context() -> PipelineContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// (processed, total) of the running stage
#[must_use]
pub fn get_progress() -> (usize, usize) {
    (
        MODULES_PROCESSED.load(Ordering::Relaxed),
        MODULES_TOTAL.load(Ordering::Relaxed),
    )
}
