//! WaveDrom trace documents.
//!
//! A trace is `{"signal": [...], ...}` where each entry of `signal` is either
//! a lane object (`{"name": .., "wave": .., "data": ..}`) or a group: an
//! array whose first element is the group label and whose remaining
//! elements are lanes or nested groups. Keys other than `signal` (`config`,
//! `head`, `foot`, ...) are carried through untouched.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{PipelineError, Result};
use crate::record::{write_atomic, ModuleRecord, Port};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default)]
    signal: Vec<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn is_lane(value: &Value) -> bool {
    value.as_object().is_some_and(|lane| lane.contains_key("name"))
}

fn lane_name(lane: &Value) -> Option<&str> {
    lane.get("name").and_then(Value::as_str)
}

fn collect_lanes<'a>(entries: &'a [Value], out: &mut Vec<&'a Value>) {
    for entry in entries {
        match entry {
            Value::Array(group) => {
                // First element of a group is its label
                let members = group.get(1..).unwrap_or_default();
                collect_lanes(members, out);
            }
            lane if is_lane(lane) => out.push(lane),
            _ => {}
        }
    }
}

/// Whether a lane's name refers to `port`, either exactly or as the last
/// component of a hierarchical name.
fn names_port(name: &str, port: &str) -> bool {
    name == port
        || name
            .strip_suffix(port)
            .is_some_and(|scope| scope.ends_with('.'))
}

impl Trace {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| PipelineError::trace(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        write_atomic(path, &bytes)
    }

    pub fn signals(&self) -> &[Value] {
        &self.signal
    }

    /// Every lane, with groups expanded depth-first.
    pub fn lanes(&self) -> Vec<&Value> {
        let mut lanes = Vec::new();
        collect_lanes(&self.signal, &mut lanes);
        lanes
    }

    /// The lane recording `port`.
    pub fn find_lane(&self, port: &str) -> Option<&Value> {
        let lanes = self.lanes();
        lanes
            .iter()
            .find(|lane| lane_name(lane) == Some(port))
            .or_else(|| {
                lanes
                    .iter()
                    .find(|lane| lane_name(lane).is_some_and(|name| names_port(name, port)))
            })
            .copied()
    }

    /// Correct the extractor's output for single-clock modules.
    ///
    /// With exactly one clock the extractor groups lanes and samples the
    /// clock at twice the rate of the other signals; groups are flattened
    /// into top-level lanes and the clock wave is cut to half its length.
    /// Traces of modules with zero or several clocks are left as they are.
    pub fn normalize(&mut self, record: &ModuleRecord) {
        let [clock] = record.clocks.as_slice() else {
            return;
        };

        let mut flattened: Vec<Value> = self.lanes().into_iter().cloned().collect();
        let clock_index = flattened
            .iter()
            .position(|lane| lane_name(lane) == Some(clock.as_str()))
            .or_else(|| {
                flattened
                    .iter()
                    .position(|lane| lane_name(lane).is_some_and(|name| names_port(name, clock)))
            });

        if let Some(index) = clock_index {
            if let Some(Value::String(wave)) = flattened[index].get_mut("wave") {
                let half = wave.chars().count() / 2;
                *wave = wave.chars().take(half).collect();
            }
        } else {
            log::debug!("Clock '{clock}' has no lane in trace");
        }

        self.signal = flattened;
    }

    /// A trace holding only the lanes of `order`, in that order.
    ///
    /// Ports without a lane are left out.
    pub fn reselect(&self, order: &[Port]) -> Trace {
        let signal = order
            .iter()
            .filter_map(|port| self.find_lane(&port.name))
            .cloned()
            .collect();
        Trace {
            signal,
            extra: self.extra.clone(),
        }
    }
}
