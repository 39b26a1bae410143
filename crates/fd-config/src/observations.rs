//! Observation set file format.
//!
//! Signals are keyed by node name so the file does not depend on the order in
//! which the circuit lists its inputs and outputs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::validate::{ValidationError, ValidationResult};

/// A list of observed (input, output) pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ObservationSet {
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    pub observations: Vec<ObservationSpec>,
}

/// One observed test application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ObservationSpec {
    #[serde(default)]
    pub label: Option<String>,

    /// Primary input name to applied value (0 or 1).
    pub inputs: BTreeMap<String, u8>,

    /// Primary output name to observed value (0 or 1).
    pub outputs: BTreeMap<String, u8>,
}

impl ObservationSpec {
    pub fn new(inputs: &[(&str, u8)], outputs: &[(&str, u8)]) -> Self {
        ObservationSpec {
            label: None,
            inputs: inputs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            outputs: outputs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }
}

impl ObservationSet {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid observations JSON: {}", e)))
    }

    /// Observations for the demonstration circuit: (1,1) unexpectedly reads
    /// 0, and (0,0) reads the fault-free 1.
    pub fn demo() -> Self {
        ObservationSet {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            description: Some("Unexpected output on (1,1), normal output on (0,0)".to_string()),
            observations: vec![
                ObservationSpec::new(&[("A", 1), ("B", 1)], &[("N3", 0)]),
                ObservationSpec::new(&[("A", 0), ("B", 0)], &[("N3", 1)]),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_observations() {
        let json = r#"{
            "schema_version": "1.0.0",
            "observations": [
                {"label": "t0", "inputs": {"A": 1, "B": 1}, "outputs": {"N3": 0}},
                {"inputs": {"B": 0, "A": 0}, "outputs": {"N3": 1}}
            ]
        }"#;
        let set = ObservationSet::from_str(json).unwrap();
        assert_eq!(set.observations.len(), 2);
        assert_eq!(set.observations[0].label.as_deref(), Some("t0"));
        assert_eq!(set.observations[1].inputs["A"], 0);
    }

    #[test]
    fn demo_matches_parsed_form() {
        let demo = ObservationSet::demo();
        assert_eq!(demo.observations[0].outputs["N3"], 0);
        assert_eq!(demo.observations[1].outputs["N3"], 1);
    }
}
