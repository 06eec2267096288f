//! CLI command implementations.
//!
//! - **run**: execute the pipeline from a stage onwards
//! - **count**: print per-stage marker counts for a dataset
//! - **init**: write a default `.wavebench.toml`

pub mod count;
pub mod init;
pub mod run;

pub use count::print_counts;
pub use init::init_config;
pub use run::run_pipeline;
