//! Crash reporting and per-thread pipeline context.
//!
//! Install the panic hook at startup and mark work with context guards:
//!
//! ```ignore
//! use wavebench::observability::{install_panic_hook, set_current_module, set_stage};
//!
//! install_panic_hook();
//! let _stage = set_stage(PipelineStage::Simulate);
//! for dir in dirs {
//!     let _module = set_current_module(dir.path());
//!     // a panic here is reported with stage and module
//! }
//! ```

pub mod context;
pub mod panic_hook;

pub use context::{
    get_current_context, get_progress, increment_processed, set_current_module, set_current_tool,
    set_stage, start_progress, ContextGuard, PipelineContext,
};
pub use panic_hook::install_panic_hook;
