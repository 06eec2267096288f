pub mod setup;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::WavebenchConfig;
use crate::pipeline::PipelineStage;

#[derive(Parser, Debug)]
#[command(name = "wavebench")]
#[command(about = "Builds HDL waveform datasets from Verilog sources", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline from a stage onwards
    Run(RunArgs),

    /// Print per-stage marker counts for a dataset
    Count {
        /// Dataset root
        #[arg(long)]
        root: PathBuf,
    },

    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// First stage to run (name or 0-3)
    #[arg(long = "start-at", value_enum, default_value = "synthesize")]
    pub start_at: PipelineStage,

    /// Dataset root holding one directory per module
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Directory of Verilog sources (required when starting at ingest)
    #[arg(long)]
    pub sources: Option<PathBuf>,

    /// General concurrency limit
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Maximum number of non-clock, non-reset ports
    #[arg(long = "max-ports")]
    pub max_ports: Option<usize>,

    /// Simulation length in ns
    #[arg(long = "max-sim-time")]
    pub max_sim_time: Option<u64>,

    /// Maximum waveform variants per module
    #[arg(long = "max-variants", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_variants: Option<u64>,

    /// Delete module directories that fail unrecoverably
    #[arg(long = "discard-failed")]
    pub discard_failed: bool,

    /// Keep tool output and failure reasons in module directories
    #[arg(long)]
    pub debug: bool,

    /// Hide progress bars
    #[arg(short, long)]
    pub quiet: bool,

    /// Configuration file (default: search for .wavebench.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl RunArgs {
    /// Overlay the flags that were given on top of file configuration.
    pub fn apply_to(&self, config: &mut WavebenchConfig) {
        let pipeline = &mut config.pipeline;
        if let Some(root) = &self.root {
            pipeline.root = Some(root.clone());
        }
        if let Some(max_ports) = self.max_ports {
            pipeline.max_ports = max_ports;
        }
        if let Some(max_sim_time) = self.max_sim_time {
            pipeline.max_sim_time = max_sim_time;
        }
        if let Some(max_variants) = self.max_variants {
            pipeline.max_variants = max_variants as usize;
        }
        pipeline.discard_failed |= self.discard_failed;
        pipeline.debug |= self.debug;

        if let Some(jobs) = self.jobs {
            config.parallel.jobs = Some(jobs);
        }
    }
}
