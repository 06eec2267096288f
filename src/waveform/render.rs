//! Writing variant descriptors and rendering them to images.

use std::fs;

use crate::executor::AdmissionGate;
use crate::layout::ModuleDir;
use crate::record::WaveformVariant;
use crate::tools::Toolchain;

use super::trace::Trace;
use super::variants::{descriptor_path, VariantPlan};

/// What happened to the variants of one module.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderOutcome {
    pub rendered: Vec<WaveformVariant>,
    pub failed: usize,
}

impl RenderOutcome {
    pub fn any_rendered(&self) -> bool {
        !self.rendered.is_empty()
    }
}

/// Render every plan independently; a failed variant does not stop the
/// others.
pub fn render_variants(
    dir: &ModuleDir,
    trace: &Trace,
    plans: &[VariantPlan],
    toolchain: &dyn Toolchain,
    gate: &AdmissionGate,
) -> RenderOutcome {
    let mut outcome = RenderOutcome::default();
    if let Err(e) = fs::create_dir_all(dir.images_dir()) {
        log::debug!("{}: cannot create images directory: {}", dir.name(), e);
        outcome.failed = plans.len();
        return outcome;
    }

    for plan in plans {
        let descriptor = descriptor_path(dir, plan);
        if plan.needs_descriptor() {
            if let Err(e) = trace.reselect(&plan.ordering).save(&descriptor) {
                log::debug!("{}: variant {} descriptor: {}", dir.name(), plan.index, e);
                outcome.failed += 1;
                continue;
            }
        }

        let image = dir.variant_image(plan.index);
        let result = {
            let _permit = gate.acquire();
            toolchain.render(dir, &descriptor, &image)
        };

        if result.is_success() {
            outcome.rendered.push(plan.to_variant());
        } else {
            log::debug!(
                "{}: variant {} not rendered: {}",
                dir.name(),
                plan.index,
                result.reason().unwrap_or("unknown")
            );
            outcome.failed += 1;
        }
    }
    outcome
}
