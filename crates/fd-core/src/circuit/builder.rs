//! Programmatic circuit construction.

use fd_config::{CircuitDescription, NodeSpec};

use super::gate::GateKind;
use super::graph::Circuit;
use crate::error::ConfigurationError;

/// Builds a [`Circuit`] in code, with the same validation as loading a file.
///
/// ```
/// use fd_core::circuit::{CircuitBuilder, GateKind};
///
/// let circuit = CircuitBuilder::new("and2")
///     .input("IN1")
///     .input("IN2")
///     .gate("AND", GateKind::And, &["IN1", "IN2"])
///     .output("AND")
///     .build()
///     .unwrap();
/// assert_eq!(circuit.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct CircuitBuilder {
    desc: CircuitDescription,
}

impl CircuitBuilder {
    pub fn new(name: &str) -> Self {
        CircuitBuilder {
            desc: CircuitDescription {
                schema_version: fd_config::CONFIG_SCHEMA_VERSION.to_string(),
                name: name.to_string(),
                description: None,
                nodes: Vec::new(),
                outputs: Vec::new(),
            },
        }
    }

    pub fn description(mut self, text: &str) -> Self {
        self.desc.description = Some(text.to_string());
        self
    }

    pub fn input(mut self, name: &str) -> Self {
        self.desc.nodes.push(NodeSpec::input(name));
        self
    }

    pub fn gate(mut self, name: &str, kind: GateKind, fanin: &[&str]) -> Self {
        self.desc.nodes.push(NodeSpec::gate(name, kind.name(), fanin));
        self
    }

    /// Mark an existing (or later-added) node as a primary output.
    pub fn output(mut self, name: &str) -> Self {
        self.desc.outputs.push(name.to_string());
        self
    }

    pub fn build(self) -> Result<Circuit, ConfigurationError> {
        Circuit::from_description(&self.desc)
    }
}
