//! Progress feedback for pipeline stages.
//!
//! One `indicatif` bar per stage, advanced as modules complete. Bars are
//! hidden in quiet mode (`--quiet` or the `WAVEBENCH_QUIET` env var) and
//! whenever stderr is not a terminal, so CI logs stay clean.
//!
//! # Examples
//!
//! ```rust,no_run
//! use wavebench::progress::{ProgressConfig, ProgressManager, TEMPLATE_STAGE};
//!
//! let manager = ProgressManager::new(ProgressConfig::from_env(false));
//! let bar = manager.create_bar(40, TEMPLATE_STAGE);
//! bar.set_message("simulate");
//! for _ in 0..40 {
//!     bar.inc(1);
//! }
//! bar.finish_and_clear();
//! ```

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

use crate::pipeline::PipelineStage;

pub const TEMPLATE_STAGE: &str =
    "{spinner} {msg:<11} [{bar:30}] {pos}/{len} modules ({percent}%) - {eta}";
pub const TEMPLATE_INGEST: &str =
    "{spinner} {msg:<11} [{bar:30}] {pos}/{len} candidates ({percent}%) - {per_sec}";

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Configuration for progress display behavior
#[derive(Debug, Clone, Default)]
pub struct ProgressConfig {
    /// Whether to suppress all progress output
    pub quiet_mode: bool,
}

impl ProgressConfig {
    /// Create progress configuration from environment and CLI arguments
    pub fn from_env(quiet: bool) -> Self {
        let env_quiet = std::env::var("WAVEBENCH_QUIET").is_ok();
        Self {
            quiet_mode: quiet || env_quiet,
        }
    }

    pub fn quiet() -> Self {
        Self { quiet_mode: true }
    }

    /// Determine if progress bars should be displayed
    pub fn should_show_progress(&self) -> bool {
        if self.quiet_mode {
            return false;
        }

        use std::io::IsTerminal;
        std::io::stderr().is_terminal()
    }
}

/// Centralized progress manager for coordinating multiple progress bars
#[derive(Clone)]
pub struct ProgressManager {
    multi: Arc<MultiProgress>,
    config: ProgressConfig,
}

impl ProgressManager {
    pub fn new(config: ProgressConfig) -> Self {
        Self {
            multi: Arc::new(MultiProgress::new()),
            config,
        }
    }

    /// A manager whose bars are always hidden
    pub fn hidden() -> Self {
        Self::new(ProgressConfig::quiet())
    }

    /// Create a progress bar with the given length and template
    ///
    /// Returns a hidden progress bar if progress should not be shown
    pub fn create_bar(&self, len: u64, template: &str) -> ProgressBar {
        if !self.config.should_show_progress() {
            return ProgressBar::hidden();
        }

        let style = ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░  ")
            .tick_chars(TICK_CHARS);
        let pb = self.multi.add(ProgressBar::new(len));
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    /// Bar for one pipeline stage over `len` items
    pub fn stage_bar(&self, stage: PipelineStage, len: usize) -> ProgressBar {
        let template = match stage {
            PipelineStage::Ingest => TEMPLATE_INGEST,
            _ => TEMPLATE_STAGE,
        };
        let pb = self.create_bar(len as u64, template);
        pb.set_message(stage.name());
        pb
    }
}
