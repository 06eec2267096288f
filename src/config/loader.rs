use std::fs;
use std::path::{Path, PathBuf};

use super::core::WavebenchConfig;
use crate::errors::{PipelineError, Result};

/// Name of the configuration file searched for in the directory hierarchy
pub const CONFIG_FILE_NAME: &str = ".wavebench.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Pure function to parse and validate config from TOML string
pub fn parse_and_validate_config(contents: &str) -> Result<WavebenchConfig> {
    let config = toml::from_str::<WavebenchConfig>(contents)?;

    if config.pipeline.max_variants == 0 {
        return Err(PipelineError::Config(
            "pipeline.max_variants must be at least 1".to_string(),
        ));
    }

    Ok(config)
}

/// Load configuration from an explicit path. A missing file is an error.
pub fn load_config_from_path(path: &Path) -> Result<WavebenchConfig> {
    let contents = fs::read_to_string(path).map_err(|e| {
        PipelineError::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let config = parse_and_validate_config(&contents)?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Pure function to try loading config from a specific path
fn try_load_config_from_path(config_path: &Path) -> Option<WavebenchConfig> {
    let contents = match fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            // Only log actual errors, not "file not found"
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!(
                    "Failed to read config file {}: {}",
                    config_path.display(),
                    e
                );
            }
            return None;
        }
    };

    match parse_and_validate_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("{}: {}. Using defaults.", config_path.display(), e);
            None
        }
    }
}

/// Pure function to generate directory ancestors up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Search the current directory and its ancestors for `.wavebench.toml`.
pub fn load_config() -> WavebenchConfig {
    let current = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            log::warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            return WavebenchConfig::default();
        }
    };

    load_config_from(current)
}

/// Search `start` and its ancestors for `.wavebench.toml`.
pub fn load_config_from(start: PathBuf) -> WavebenchConfig {
    directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            log::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            WavebenchConfig::default()
        })
}

/// Default file written by `wavebench init`
pub fn default_config_contents() -> &'static str {
    r#"# wavebench configuration

[pipeline]
max_ports = 6
max_sim_time = 100
max_variants = 16
discard_failed = false
debug = false

[parallel]
# jobs = 8

[tools]
classifier = "hdl-classify"
testbench = "gentbvlog"
compiler = "iverilog"
runner = "vvp"
extractor = "vcd2wavedrom"
renderer = "wavedrom-cli"

[timeouts]
classify_secs = 10
testbench_secs = 60
compile_secs = 10
run_secs = 10
extract_secs = 30
render_secs = 30
"#
}
