//! Configuration for the dataset pipeline.
//!
//! Settings come from `.wavebench.toml` (searched upward from the current
//! directory, or given explicitly) and are then overridden by command-line
//! flags.

mod core;
mod loader;
mod parallel;
mod tools;

pub use core::{PipelineSettings, WavebenchConfig};
pub use loader::{
    default_config_contents, directory_ancestors, load_config, load_config_from,
    load_config_from_path, parse_and_validate_config, CONFIG_FILE_NAME,
};
pub use parallel::ParallelConfig;
pub use tools::{TimeoutConfig, ToolsConfig};
