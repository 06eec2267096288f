//! Waveform stage: trace extraction, normalization and variant rendering.

pub mod permutation;
pub mod render;
pub mod trace;
pub mod variants;

pub use permutation::{permutations, signal_orderings};
pub use render::{render_variants, RenderOutcome};
pub use trace::Trace;
pub use variants::{plan_variants, VariantPlan};

use std::fs;

use crate::executor::AdmissionGate;
use crate::layout::ModuleDir;
use crate::record::{self, ModuleRecord};
use crate::tools::{load_record, Outcome, Toolchain};

/// Produce the normalized `wavedrom.json`, extracting it first if needed.
///
/// The extractor's raw output is normalized once and replaced by the
/// normalized trace, so later runs and every variant read the same data.
pub fn prepare_trace(
    dir: &ModuleDir,
    record: &ModuleRecord,
    toolchain: &dyn Toolchain,
    gate: &AdmissionGate,
) -> Result<Trace, Outcome> {
    if dir.trace_file().is_file() {
        return Trace::load(&dir.trace_file()).map_err(|e| Outcome::terminal(e.to_string()));
    }

    let extracted = {
        let _permit = gate.acquire();
        toolchain.extract_trace(dir, record)
    };
    if !extracted.is_success() {
        return Err(extracted);
    }

    let mut trace =
        Trace::load(&dir.raw_trace_file()).map_err(|e| Outcome::terminal(e.to_string()))?;
    trace.normalize(record);
    trace
        .save(&dir.trace_file())
        .map_err(|e| Outcome::retryable(e.to_string()))?;
    if let Err(e) = fs::remove_file(dir.raw_trace_file()) {
        log::debug!("{}: could not remove raw trace: {}", dir.name(), e);
    }
    Ok(trace)
}

/// Run the whole waveform stage for one module.
///
/// Succeeds when at least one variant was rendered; the rendered variants
/// are recorded in `meta.json`.
pub fn render_module(
    dir: &ModuleDir,
    toolchain: &dyn Toolchain,
    gate: &AdmissionGate,
    max_variants: usize,
) -> Outcome {
    let mut record = match load_record(dir) {
        Ok(record) => record,
        Err(outcome) => return outcome,
    };
    let trace = match prepare_trace(dir, &record, toolchain, gate) {
        Ok(trace) => trace,
        Err(outcome) => return outcome,
    };
    if trace.lanes().is_empty() {
        return Outcome::terminal("trace has no signals");
    }

    let plans = plan_variants(&record, max_variants);
    if plans.is_empty() {
        return Outcome::terminal("module has no ports to order");
    }

    let outcome = render_variants(dir, &trace, &plans, toolchain, gate);
    if !outcome.any_rendered() {
        return Outcome::retryable(format!("none of {} variants rendered", plans.len()));
    }
    if outcome.failed > 0 {
        log::debug!(
            "{}: {} of {} variants failed to render",
            dir.name(),
            outcome.failed,
            plans.len()
        );
    }

    record.waveform_variants = outcome.rendered;
    match record::save(&record, dir) {
        Ok(()) => Outcome::Success,
        Err(e) => Outcome::retryable(e.to_string()),
    }
}
