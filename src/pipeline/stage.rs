//! The four dataset stages and their order.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

/// A pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum PipelineStage {
    /// Split sources into modules, classify and filter them
    #[value(alias = "0")]
    Ingest,
    /// Generate a testbench per module
    #[value(alias = "1")]
    Synthesize,
    /// Compile and run the simulation
    #[value(alias = "2")]
    Simulate,
    /// Extract traces and render waveform variants
    #[value(alias = "3")]
    Render,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 4] = [
        PipelineStage::Ingest,
        PipelineStage::Synthesize,
        PipelineStage::Simulate,
        PipelineStage::Render,
    ];

    pub fn next(self) -> Option<PipelineStage> {
        match self {
            Self::Ingest => Some(Self::Synthesize),
            Self::Synthesize => Some(Self::Simulate),
            Self::Simulate => Some(Self::Render),
            Self::Render => None,
        }
    }

    /// This stage followed by every later one.
    pub fn from_start(start: PipelineStage) -> impl Iterator<Item = PipelineStage> {
        std::iter::successors(Some(start), |stage| stage.next())
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Synthesize => "synthesize",
            Self::Simulate => "simulate",
            Self::Render => "render",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PipelineStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if let Ok(index) = value.parse::<usize>() {
            return Self::ALL
                .get(index)
                .copied()
                .ok_or_else(|| format!("stage index {index} out of range 0..=3"));
        }
        Self::ALL
            .iter()
            .copied()
            .find(|stage| stage.name().eq_ignore_ascii_case(value))
            .ok_or_else(|| format!("unknown stage '{value}'"))
    }
}
