use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::config::{default_config_contents, CONFIG_FILE_NAME};

pub fn init_config(force: bool) -> Result<()> {
    init_config_in(Path::new("."), force)
}

/// Write the default configuration file into `dir`.
pub fn init_config_in(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    fs::write(&config_path, default_config_contents())?;
    println!("Created {} configuration file", CONFIG_FILE_NAME);

    Ok(())
}
