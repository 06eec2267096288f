use anyhow::{Context, Result};
use std::path::Path;

use crate::pipeline::{count, CountReport};

/// Count the markers under `root` and print one line per stage.
pub fn print_counts(root: &Path) -> Result<CountReport> {
    let report =
        count(root).with_context(|| format!("Failed to count dataset at {}", root.display()))?;
    println!("{report}");
    Ok(report)
}
