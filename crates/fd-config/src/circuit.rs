//! Circuit description file format.
//!
//! A description is an untyped netlist: node names, gate kind strings and
//! fan-in names. Topology checks (cycles, dangling edges, gate arity) happen
//! when fd-core builds the typed graph from it.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::validate::{ValidationError, ValidationResult};

/// A combinational circuit as written in circuit.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CircuitDescription {
    pub schema_version: String,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Nodes in any order. Primary inputs use gate `INPUT` and no fan-in.
    pub nodes: Vec<NodeSpec>,

    /// Names of the nodes whose values are observable.
    pub outputs: Vec<String>,
}

/// One node of the netlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeSpec {
    pub name: String,

    /// Gate kind: INPUT, BUF, NOT, AND, OR, NAND, NOR, XOR or XNOR.
    pub gate: String,

    #[serde(default)]
    pub inputs: Vec<String>,
}

impl NodeSpec {
    pub fn input(name: &str) -> Self {
        NodeSpec {
            name: name.to_string(),
            gate: "INPUT".to_string(),
            inputs: Vec::new(),
        }
    }

    pub fn gate(name: &str, gate: &str, inputs: &[&str]) -> Self {
        NodeSpec {
            name: name.to_string(),
            gate: gate.to_string(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CircuitDescription {
    /// Load a circuit description from a JSON file.
    /// Parse a circuit description from a JSON string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid circuit JSON: {}", e)))
    }

    /// The two-input demonstration circuit.
    ///
    /// ```text
    /// N1 = AND(A, B)
    /// N2 = NOT(A)
    /// N3 = OR(N1, N2)    (output)
    /// ```
    pub fn demo() -> Self {
        CircuitDescription {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            name: "demo".to_string(),
            description: Some("N3 = OR(AND(A, B), NOT(A))".to_string()),
            nodes: vec![
                NodeSpec::input("A"),
                NodeSpec::input("B"),
                NodeSpec::gate("N1", "AND", &["A", "B"]),
                NodeSpec::gate("N2", "NOT", &["A"]),
                NodeSpec::gate("N3", "OR", &["N1", "N2"]),
            ],
            outputs: vec!["N3".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_circuit() {
        let json = r#"{
            "schema_version": "1.0.0",
            "name": "and2",
            "nodes": [
                {"name": "IN1", "gate": "INPUT"},
                {"name": "IN2", "gate": "INPUT"},
                {"name": "G", "gate": "AND", "inputs": ["IN1", "IN2"]}
            ],
            "outputs": ["G"]
        }"#;
        let desc = CircuitDescription::from_str(json).unwrap();
        assert_eq!(desc.nodes.len(), 3);
        assert!(desc.nodes[0].inputs.is_empty());
        assert_eq!(desc.nodes[2].inputs, vec!["IN1", "IN2"]);
        assert_eq!(desc.description, None);
    }

    #[test]
    fn parse_error_is_reported() {
        let err = CircuitDescription::from_str("{\"name\": 1}").unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    }

    #[test]
    fn demo_round_trips_through_json() {
        let demo = CircuitDescription::demo();
        let json = serde_json::to_string(&demo).unwrap();
        assert_eq!(CircuitDescription::from_str(&json).unwrap(), demo);
    }
}
