//! Selection of the waveform variants to render for a module.

use crate::layout::{ModuleDir, IMAGES_DIR, TRACE_FILE};
use crate::record::{ModuleRecord, Port, VariantKind, WaveformVariant};

use super::permutation::signal_orderings;

/// One variant to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantPlan {
    pub index: usize,
    pub kind: VariantKind,
    pub ordering: Vec<Port>,
    /// Trace document for this variant, relative to the module directory
    pub source_json_path: String,
    pub pre_order: Option<Vec<String>>,
    pub post_order: Option<Vec<String>>,
}

impl VariantPlan {
    /// Record entry for this plan once its image exists.
    pub fn to_variant(&self) -> WaveformVariant {
        WaveformVariant {
            index: self.index,
            source_json_path: self.source_json_path.clone(),
            kind: self.kind,
            pre_order: self.pre_order.clone(),
            post_order: self.post_order.clone(),
        }
    }

    /// Whether this plan needs its own descriptor written.
    pub fn needs_descriptor(&self) -> bool {
        self.kind == VariantKind::Shuffled
    }
}

fn names(ports: &[Port]) -> Vec<String> {
    ports.iter().map(|p| p.name.clone()).collect()
}

/// Plan at most `max_variants` variants.
///
/// The ordering equal to the declaration order is the `Original` variant
/// and points at the module's base trace; every other ordering is
/// `Shuffled` and gets its own descriptor under `images/`.
pub fn plan_variants(record: &ModuleRecord, max_variants: usize) -> Vec<VariantPlan> {
    let declared = names(&record.ports);

    signal_orderings(record, max_variants)
        .into_iter()
        .enumerate()
        .map(|(index, ordering)| {
            let order = names(&ordering);
            if order == declared {
                VariantPlan {
                    index,
                    kind: VariantKind::Original,
                    ordering,
                    source_json_path: TRACE_FILE.to_string(),
                    pre_order: None,
                    post_order: None,
                }
            } else {
                VariantPlan {
                    index,
                    kind: VariantKind::Shuffled,
                    ordering,
                    source_json_path: format!("{IMAGES_DIR}/variant_{index}.json"),
                    pre_order: Some(declared.clone()),
                    post_order: Some(order),
                }
            }
        })
        .collect()
}

/// Absolute descriptor path of a plan inside `dir`.
pub fn descriptor_path(dir: &ModuleDir, plan: &VariantPlan) -> std::path::PathBuf {
    match plan.kind {
        VariantKind::Original => dir.trace_file(),
        VariantKind::Shuffled => dir.variant_descriptor(plan.index),
    }
}
