//! The staged dataset pipeline.
//!
//! Stages run in a fixed order (`ingest`, `synthesize`, `simulate`,
//! `render`) and communicate only through files in the module
//! directories. Each stage processes exactly the directories whose markers
//! say it still has work, so a run can be restarted from any stage.

pub mod controller;
pub mod counter;
pub mod stage;
pub mod state;

pub use controller::{PipelineController, PipelineReport};
pub use counter::{count, CountReport};
pub use stage::PipelineStage;
pub use state::{needs_work, ModuleState};
