//! Signal orderings for waveform variants.
//!
//! Clocks stay pinned to the front in declaration order. The remaining
//! inputs and outputs are permuted independently and combined as a
//! Cartesian product, input-major.

use crate::record::{ModuleRecord, Port, PortMode};

/// Permutations of `items` by recursive exchange, at most `limit` of them.
///
/// Each element in turn is taken as the head and prepended to every
/// permutation of the others. An empty slice has no permutations; a single
/// element has exactly one. Generation stops as soon as `limit` is reached,
/// so the result never materializes more than `limit` sequences.
pub fn permutations<T: Clone>(items: &[T], limit: usize) -> Vec<Vec<T>> {
    let mut out = Vec::new();
    collect_permutations(items, limit, &mut out);
    out
}

fn collect_permutations<T: Clone>(items: &[T], limit: usize, out: &mut Vec<Vec<T>>) {
    if limit == 0 || items.is_empty() {
        return;
    }
    if items.len() == 1 {
        out.push(items.to_vec());
        return;
    }

    for (i, head) in items.iter().enumerate() {
        let remaining = limit - out.len();
        if remaining == 0 {
            return;
        }
        let rest: Vec<T> = items
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, item)| item.clone())
            .collect();
        for tail in permutations(&rest, remaining) {
            let mut ordering = Vec::with_capacity(items.len());
            ordering.push(head.clone());
            ordering.extend(tail);
            out.push(ordering);
        }
    }
}

// An empty group still contributes one (empty) ordering to the product
fn group_orderings(group: &[Port], limit: usize) -> Vec<Vec<Port>> {
    if group.is_empty() {
        vec![Vec::new()]
    } else {
        permutations(group, limit)
    }
}

/// All admissible port orderings of a module, at most `limit` of them.
pub fn signal_orderings(record: &ModuleRecord, limit: usize) -> Vec<Vec<Port>> {
    if limit == 0 {
        return Vec::new();
    }

    let prefix = record.clock_ports();
    let (inputs, outputs): (Vec<Port>, Vec<Port>) = record
        .ports
        .iter()
        .filter(|p| !record.is_clock(&p.name))
        .cloned()
        .partition(|p| p.mode == PortMode::Input);

    let input_orders = group_orderings(&inputs, limit);
    let output_orders = group_orderings(&outputs, limit);

    let mut orderings = Vec::new();
    for ins in &input_orders {
        for outs in &output_orders {
            if orderings.len() == limit {
                return orderings;
            }
            let mut ordering = Vec::with_capacity(prefix.len() + ins.len() + outs.len());
            ordering.extend(prefix.iter().cloned());
            ordering.extend(ins.iter().cloned());
            ordering.extend(outs.iter().cloned());
            orderings.push(ordering);
        }
    }
    orderings
}
