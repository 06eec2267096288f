//! Per-module metadata record.
//!
//! A `ModuleRecord` is created from the classifier output during ingestion,
//! stored as `meta.json` inside the module directory and reloaded by every
//! later stage. Stages only ever add to it; the waveform stage is the last
//! writer and appends the list of rendered variants.

pub mod lexicon;
pub mod store;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub use lexicon::{classify_port, is_clock_name, is_reset_name, SignalRole};
pub use store::{load, save, write_atomic};

/// Direction of a module port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortMode {
    Input,
    Output,
}

/// A named module port in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub mode: PortMode,
}

impl Port {
    pub fn new(name: impl Into<String>, mode: PortMode) -> Self {
        Self {
            name: name.into(),
            mode,
        }
    }

    pub fn input(name: impl Into<String>) -> Self {
        Self::new(name, PortMode::Input)
    }

    pub fn output(name: impl Into<String>) -> Self {
        Self::new(name, PortMode::Output)
    }
}

/// Structured classifier output for a single module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedModule {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub ports: Vec<Port>,
}

/// How a waveform variant relates to the base trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    Original,
    Shuffled,
}

/// One rendered reordering of the module's trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveformVariant {
    pub index: usize,
    pub source_json_path: String,
    pub kind: VariantKind,
    /// Port order of the base trace (shuffled variants only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_order: Option<Vec<String>>,
    /// Port order of this variant (shuffled variants only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_order: Option<Vec<String>>,
}

/// Metadata for one dataset module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    #[serde(default)]
    pub module_name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub clocks: Vec<String>,
    #[serde(default)]
    pub resets: Vec<String>,
    #[serde(default)]
    pub ports: Vec<Port>,
    #[serde(default, rename = "code")]
    pub source_code: String,
    #[serde(default)]
    pub waveform_variants: Vec<WaveformVariant>,
}

impl ModuleRecord {
    /// Build a record from classifier output, tagging clocks and resets by
    /// name in declaration order.
    pub fn from_classified(module: ClassifiedModule, source_code: impl Into<String>) -> Self {
        let mut clocks = Vec::new();
        let mut resets = Vec::new();
        for port in &module.ports {
            match classify_port(&port.name) {
                SignalRole::Clock => clocks.push(port.name.clone()),
                SignalRole::Reset => resets.push(port.name.clone()),
                SignalRole::Data => {}
            }
        }

        Self {
            module_name: module.name,
            parameters: module.parameters,
            clocks,
            resets,
            ports: module.ports,
            source_code: source_code.into(),
            waveform_variants: Vec::new(),
        }
    }

    pub fn is_clock(&self, name: &str) -> bool {
        self.clocks.iter().any(|c| c == name)
    }

    /// Ports that are neither clocks nor resets
    pub fn data_port_count(&self) -> usize {
        self.ports
            .len()
            .saturating_sub(self.clocks.len())
            .saturating_sub(self.resets.len())
    }

    /// Clock ports in declaration order
    pub fn clock_ports(&self) -> Vec<Port> {
        self.ports
            .iter()
            .filter(|p| self.is_clock(&p.name))
            .cloned()
            .collect()
    }

    /// Check the clock/reset invariants against the port list.
    pub fn validate(&self) -> Result<(), String> {
        if self.module_name.is_empty() {
            return Err("module name is empty".to_string());
        }

        let names: HashSet<&str> = self.ports.iter().map(|p| p.name.as_str()).collect();
        for clock in &self.clocks {
            if !names.contains(clock.as_str()) {
                return Err(format!("clock '{clock}' is not a port"));
            }
        }
        for reset in &self.resets {
            if !names.contains(reset.as_str()) {
                return Err(format!("reset '{reset}' is not a port"));
            }
            if self.is_clock(reset) {
                return Err(format!("'{reset}' is both clock and reset"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn counter_module() -> ClassifiedModule {
        ClassifiedModule {
            name: "counter".to_string(),
            parameters: vec!["WIDTH".to_string()],
            ports: vec![
                Port::input("CLK"),
                Port::input("rst_n"),
                Port::input("clk_en"),
                Port::output("count"),
            ],
        }
    }

    #[test]
    fn test_from_classified_tags_roles() {
        let record = ModuleRecord::from_classified(counter_module(), "module counter; endmodule");
        assert_eq!(record.clocks, vec!["CLK"]);
        assert_eq!(record.resets, vec!["rst_n"]);
        assert_eq!(record.data_port_count(), 2);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_clock() {
        let mut record = ModuleRecord::from_classified(counter_module(), "");
        record.clocks.push("ghost".to_string());
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_record_json_field_names() {
        let record = ModuleRecord::from_classified(counter_module(), "src");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["module_name"], "counter");
        assert_eq!(value["code"], "src");
        assert_eq!(value["ports"][3]["mode"], "output");
    }

    #[test]
    fn test_record_tolerates_missing_later_fields() {
        let json = r#"{"module_name": "m", "ports": [], "code": ""}"#;
        let record: ModuleRecord = serde_json::from_str(json).unwrap();
        assert!(record.waveform_variants.is_empty());
        assert!(record.clocks.is_empty());
    }

    #[test]
    fn test_shuffled_variant_serializes_orders() {
        let variant = WaveformVariant {
            index: 1,
            source_json_path: "images/variant_1.json".to_string(),
            kind: VariantKind::Shuffled,
            pre_order: Some(vec!["a".into(), "b".into()]),
            post_order: Some(vec!["b".into(), "a".into()]),
        };
        let value = serde_json::to_value(&variant).unwrap();
        assert_eq!(value["kind"], "shuffled");
        assert_eq!(value["post_order"][0], "b");
    }
}
