//! Single stuck-at faults.

use schemars::JsonSchema;
use serde::Serialize;

use crate::circuit::{Circuit, NodeId};
use crate::error::ConfigurationError;

/// A node whose value is forced to a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fault {
    pub node: NodeId,
    pub stuck_at: bool,
}

impl Fault {
    pub fn new(node: NodeId, stuck_at: bool) -> Self {
        Fault { node, stuck_at }
    }

    pub fn stuck_at_0(node: NodeId) -> Self {
        Fault::new(node, false)
    }

    pub fn stuck_at_1(node: NodeId) -> Self {
        Fault::new(node, true)
    }

    /// Both stuck-at faults of a node, stuck-at-0 first.
    pub fn both(node: NodeId) -> [Fault; 2] {
        [Fault::stuck_at_0(node), Fault::stuck_at_1(node)]
    }

    /// Parse `NODE=V`, `NODE:V` or `NODE/saV` with `V` in {0, 1}.
    pub fn parse(circuit: &Circuit, spec: &str) -> Result<Self, ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidFault {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let (name, value) = if let Some((n, v)) = spec.rsplit_once('=') {
            (n, v)
        } else if let Some((n, v)) = spec.rsplit_once(':') {
            (n, v)
        } else if let Some((n, v)) = spec.rsplit_once('/') {
            (n, v.trim().trim_start_matches("sa").trim_start_matches("SA"))
        } else {
            return Err(invalid("expected NODE=0 or NODE=1"));
        };

        let stuck_at = match value.trim() {
            "0" => false,
            "1" => true,
            _ => return Err(invalid("stuck-at value must be 0 or 1")),
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(invalid("missing node name"));
        }
        let node = circuit.lookup(name)?;
        Ok(Fault::new(node, stuck_at))
    }

    pub fn stuck_value(&self) -> u8 {
        u8::from(self.stuck_at)
    }

    /// Human label, e.g. `N1 stuck-at-0`.
    pub fn label(&self, circuit: &Circuit) -> String {
        format!("{} stuck-at-{}", circuit.name_of(self.node), self.stuck_value())
    }

    pub fn describe(&self, circuit: &Circuit) -> FaultDescription {
        FaultDescription {
            node: circuit.name_of(self.node).to_string(),
            stuck_at: self.stuck_value(),
        }
    }

    /// Fail unless the faulted node belongs to `circuit`.
    pub fn check(&self, circuit: &Circuit) -> Result<(), ConfigurationError> {
        if circuit.contains(self.node) {
            Ok(())
        } else {
            Err(ConfigurationError::UnknownNode(format!(
                "#{}",
                self.node.index()
            )))
        }
    }
}

/// Serializable form of a [`Fault`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct FaultDescription {
    pub node: String,
    pub stuck_at: u8,
}
