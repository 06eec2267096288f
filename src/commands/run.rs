use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::cli::setup::configure_thread_pool;
use crate::cli::RunArgs;
use crate::config::{load_config, load_config_from_path, WavebenchConfig};
use crate::executor::CancelToken;
use crate::ingest::{collect_sources, SourceBlob};
use crate::pipeline::{PipelineController, PipelineReport, PipelineStage};
use crate::progress::{ProgressConfig, ProgressManager};
use crate::tools::environment::check_environment;
use crate::tools::ExternalToolchain;

/// Resolve configuration for a `run` invocation: the file (explicit or
/// discovered) with command-line flags layered on top.
pub fn resolve_config(args: &RunArgs) -> Result<WavebenchConfig> {
    let mut config = match &args.config {
        Some(path) => load_config_from_path(path)?,
        None => load_config(),
    };
    args.apply_to(&mut config);

    if config.pipeline.root.is_none() {
        anyhow::bail!("No dataset root given. Pass --root or set pipeline.root.");
    }
    Ok(config)
}

/// Read the sources an ingest run needs. Later stages take none.
fn load_sources(start: PipelineStage, sources: Option<&Path>) -> Result<Vec<SourceBlob>> {
    if start != PipelineStage::Ingest {
        if sources.is_some() {
            log::warn!("--sources is only used when starting at ingest; ignoring it");
        }
        return Ok(Vec::new());
    }

    let dir = sources.context("--sources is required when starting at ingest")?;
    let blobs = collect_sources(dir)
        .with_context(|| format!("Failed to read sources from {}", dir.display()))?;
    log::info!("Read {} source files from {}", blobs.len(), dir.display());
    Ok(blobs)
}

#[cfg(feature = "signals")]
fn install_interrupt_handler(cancel: &CancelToken) {
    let token = cancel.clone();
    let installed = ctrlc::set_handler(move || {
        if !token.is_cancelled() {
            eprintln!("Interrupted; finishing in-flight modules");
        }
        token.cancel();
    });
    if let Err(e) = installed {
        log::warn!("Could not install interrupt handler: {}", e);
    }
}

#[cfg(not(feature = "signals"))]
fn install_interrupt_handler(_cancel: &CancelToken) {}

/// Execute the pipeline with the external toolchain.
pub fn run_pipeline(args: &RunArgs) -> Result<PipelineReport> {
    let config = resolve_config(args)?;
    let sources = load_sources(args.start_at, args.sources.as_deref())?;

    check_environment(&config.tools, PipelineStage::from_start(args.start_at));
    configure_thread_pool(config.parallel.effective_jobs());

    let cancel = CancelToken::new();
    install_interrupt_handler(&cancel);

    let toolchain = Arc::new(ExternalToolchain::new(
        config.tools.clone(),
        config.timeouts.clone(),
        config.pipeline.max_sim_time,
        config.pipeline.debug,
    ));
    let progress = ProgressManager::new(ProgressConfig::from_env(args.quiet));
    let controller = PipelineController::new(
        config.pipeline.clone(),
        toolchain,
        &config.parallel,
        cancel,
        progress,
    )?;

    log::info!(
        "Running from {} on {} with {} jobs",
        args.start_at,
        controller.root().display(),
        config.parallel.effective_jobs()
    );
    let report = controller.run(args.start_at, &sources)?;
    print!("{report}");
    Ok(report)
}
