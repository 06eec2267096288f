// Export modules for library usage
pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod executor;
pub mod ingest;
pub mod layout;
pub mod observability;
pub mod pipeline;
pub mod progress;
pub mod record;
pub mod tools;
pub mod waveform;

// Re-export commonly used types
pub use crate::config::{PipelineSettings, WavebenchConfig};
pub use crate::errors::{ClassificationFailure, PipelineError, Result};
pub use crate::executor::{AdmissionGate, CancelToken, StageExecutor, StageSummary};
pub use crate::ingest::SourceBlob;
pub use crate::layout::ModuleDir;
pub use crate::pipeline::{
    count, CountReport, ModuleState, PipelineController, PipelineReport, PipelineStage,
};
pub use crate::record::{ClassifiedModule, ModuleRecord, Port, PortMode, VariantKind};
pub use crate::tools::{ExternalToolchain, Outcome, Toolchain};
