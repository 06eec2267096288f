//! Error types for dataset pipeline operations.
//!
//! Errors are categorized so that the pipeline can decide how to treat a
//! module after a failure:
//!
//! - `Classification`: the source text yields no usable module. The module is
//!   excluded from the dataset and never retried.
//! - `RecordNotFound`: the metadata record is missing. The module cannot be
//!   reprocessed without re-ingesting.
//! - `RecordCorrupt`: the record is unreadable. The directory is kept and
//!   the module is retried on the next run.
//! - `EnvironmentMissing`: a required program is not on `PATH`. Reported once
//!   as a warning, never fatal for the whole run.
//!
//! None of these ever terminate a stage: the stage executor converts every
//! per-module error into a failed item.

use std::path::PathBuf;
use thiserror::Error;

/// Why a source candidate was not accepted into the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationFailure {
    /// The classifier found no module in the source text
    #[error("no module found in source")]
    NoModule,

    /// The module has more data ports than the dataset allows
    #[error("module has {data} data ports, maximum is {max}")]
    TooManyPorts { data: usize, max: usize },

    /// The classifier itself failed
    #[error("classifier failed: {0}")]
    Tool(String),
}

/// Main error type for wavebench operations
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source text could not be turned into a dataset module
    #[error("Classification failed: {0}")]
    Classification(#[from] ClassificationFailure),

    /// No metadata record in the module directory
    #[error("No metadata record at {}", .path.display())]
    RecordNotFound { path: PathBuf },

    /// Metadata record present but unparsable; raw contents are kept
    #[error("Corrupt metadata record at {}: {source}", .path.display())]
    RecordCorrupt {
        path: PathBuf,
        contents: String,
        #[source]
        source: serde_json::Error,
    },

    /// Required external program is not installed
    #[error("Required tool '{tool}' not found on PATH")]
    EnvironmentMissing { tool: String },

    /// Waveform trace could not be interpreted
    #[error("Trace error: {0}")]
    Trace(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl PipelineError {
    /// Create a trace error
    pub fn trace(message: impl Into<String>) -> Self {
        Self::Trace(message.into())
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, PipelineError>;
