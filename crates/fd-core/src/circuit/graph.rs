//! Typed, validated circuit graph.
//!
//! A [`Circuit`] is built once from a [`CircuitDescription`] and never
//! mutated. Construction checks every topology rule, so the rest of the
//! crate can index nodes and walk the topological order without re-checking.

use std::collections::{HashMap, HashSet, VecDeque};

use fd_config::validate::validate_circuit_description;
use fd_config::{CircuitDescription, NodeSpec};
use tracing::debug;

use super::gate::GateKind;
use crate::error::ConfigurationError;

/// Index of a node within its circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One node: a primary input or a gate.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    kind: GateKind,
    fanin: Vec<NodeId>,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> GateKind {
        self.kind
    }

    pub fn fanin(&self) -> &[NodeId] {
        &self.fanin
    }

    pub fn is_input(&self) -> bool {
        self.kind.is_input()
    }
}

/// An acyclic combinational circuit.
#[derive(Debug, Clone)]
pub struct Circuit {
    name: String,
    description: Option<String>,
    nodes: Vec<Node>,
    by_name: HashMap<String, NodeId>,
    inputs: Vec<NodeId>,
    input_position: Vec<Option<usize>>,
    outputs: Vec<NodeId>,
    order: Vec<NodeId>,
    fanout: Vec<Vec<NodeId>>,
    observable: Vec<bool>,
}

impl Circuit {
    /// Build and validate a circuit.
    ///
    /// Fails on schema version mismatch, an empty node or output list,
    /// duplicate names, unknown gate kinds, wrong fan-in counts, references
    /// to undefined nodes, unknown or repeated outputs, and cycles.
    pub fn from_description(desc: &CircuitDescription) -> Result<Self, ConfigurationError> {
        validate_circuit_description(desc)?;

        let mut by_name = HashMap::with_capacity(desc.nodes.len());
        for (idx, spec) in desc.nodes.iter().enumerate() {
            if by_name.insert(spec.name.clone(), NodeId(idx)).is_some() {
                return Err(ConfigurationError::DuplicateNode(spec.name.clone()));
            }
        }

        let mut nodes = Vec::with_capacity(desc.nodes.len());
        for spec in &desc.nodes {
            nodes.push(resolve_node(spec, &by_name)?);
        }

        let mut outputs = Vec::with_capacity(desc.outputs.len());
        let mut seen = HashSet::new();
        for out in &desc.outputs {
            let id = *by_name
                .get(out)
                .ok_or_else(|| ConfigurationError::UnknownOutput(out.clone()))?;
            if !seen.insert(id) {
                return Err(ConfigurationError::DuplicateOutput(out.clone()));
            }
            outputs.push(id);
        }

        let mut fanout = vec![Vec::new(); nodes.len()];
        for (idx, node) in nodes.iter().enumerate() {
            for &src in &node.fanin {
                fanout[src.0].push(NodeId(idx));
            }
        }

        let order = topological_order(&nodes, &fanout)?;

        let mut inputs = Vec::new();
        let mut input_position = vec![None; nodes.len()];
        for (idx, node) in nodes.iter().enumerate() {
            if node.is_input() {
                input_position[idx] = Some(inputs.len());
                inputs.push(NodeId(idx));
            }
        }

        let observable = observable_nodes(&nodes, &outputs);

        debug!(
            circuit = %desc.name,
            nodes = nodes.len(),
            inputs = inputs.len(),
            outputs = outputs.len(),
            "circuit built"
        );

        Ok(Circuit {
            name: desc.name.clone(),
            description: desc.description.clone(),
            nodes,
            by_name,
            inputs,
            input_position,
            outputs,
            order,
            fanout,
            observable,
        })
    }

    /// The built-in demonstration circuit, `N3 = OR(AND(A, B), NOT(A))`.
    pub fn demo() -> Result<Self, ConfigurationError> {
        Circuit::from_description(&CircuitDescription::demo())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` belongs to a circuit of this size.
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Node by id.
    ///
    /// Ids come from this circuit; an id from a larger circuit panics.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Primary inputs in declaration order; input vectors follow this order.
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Primary outputs in the order the description lists them.
    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|&id| self.name_of(id)).collect()
    }

    pub fn output_names(&self) -> Vec<&str> {
        self.outputs.iter().map(|&id| self.name_of(id)).collect()
    }

    /// Position of a primary input within input vectors.
    pub fn input_position(&self, id: NodeId) -> Option<usize> {
        self.input_position.get(id.0).copied().flatten()
    }

    pub fn is_output(&self, id: NodeId) -> bool {
        self.outputs.contains(&id)
    }

    /// Evaluation order: every node appears after all of its fan-in.
    pub fn topo_order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn id(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    /// Like [`Circuit::id`], failing with [`ConfigurationError::UnknownNode`].
    pub fn lookup(&self, name: &str) -> Result<NodeId, ConfigurationError> {
        self.id(name)
            .ok_or_else(|| ConfigurationError::UnknownNode(name.to_string()))
    }

    pub fn name_of(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    /// Nodes reading from `id`.
    pub fn fanout(&self, id: NodeId) -> &[NodeId] {
        &self.fanout[id.0]
    }

    /// Whether some path leads from `id` to a primary output.
    ///
    /// Outputs reach themselves. A fault on a node that does not reach an
    /// output can never be observed.
    pub fn reaches_output(&self, id: NodeId) -> bool {
        self.observable.get(id.0).copied().unwrap_or(false)
    }

    /// Serialize back into the file format.
    pub fn to_description(&self) -> CircuitDescription {
        CircuitDescription {
            schema_version: fd_config::CONFIG_SCHEMA_VERSION.to_string(),
            name: self.name.clone(),
            description: self.description.clone(),
            nodes: self
                .nodes
                .iter()
                .map(|n| NodeSpec {
                    name: n.name.clone(),
                    gate: n.kind.name().to_string(),
                    inputs: n.fanin.iter().map(|&f| self.name_of(f).to_string()).collect(),
                })
                .collect(),
            outputs: self.output_names().iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// The built-in demonstration circuit.
pub fn demo_circuit() -> Result<Circuit, ConfigurationError> {
    Circuit::demo()
}

fn resolve_node(spec: &NodeSpec, by_name: &HashMap<String, NodeId>) -> Result<Node, ConfigurationError> {
    let kind: GateKind = spec
        .gate
        .parse()
        .map_err(|_| ConfigurationError::UnknownGate {
            node: spec.name.clone(),
            gate: spec.gate.clone(),
        })?;

    let arity = kind.arity();
    if !arity.accepts(spec.inputs.len()) {
        return Err(ConfigurationError::InvalidArity {
            node: spec.name.clone(),
            gate: kind,
            expected: arity.describe(),
            actual: spec.inputs.len(),
        });
    }

    let fanin = spec
        .inputs
        .iter()
        .map(|src| {
            by_name
                .get(src)
                .copied()
                .ok_or_else(|| ConfigurationError::DanglingEdge {
                    node: spec.name.clone(),
                    missing: src.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Node {
        name: spec.name.clone(),
        kind,
        fanin,
    })
}

/// Kahn's algorithm, seeded in declaration order so the result is stable.
fn topological_order(nodes: &[Node], fanout: &[Vec<NodeId>]) -> Result<Vec<NodeId>, ConfigurationError> {
    let mut indegree: Vec<usize> = nodes.iter().map(|n| n.fanin.len()).collect();
    let mut ready: VecDeque<NodeId> = indegree
        .iter()
        .enumerate()
        .filter(|(_, &d)| d == 0)
        .map(|(i, _)| NodeId(i))
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(id) = ready.pop_front() {
        order.push(id);
        for &next in &fanout[id.0] {
            indegree[next.0] -= 1;
            if indegree[next.0] == 0 {
                ready.push_back(next);
            }
        }
    }

    if order.len() < nodes.len() {
        let nodes = indegree
            .iter()
            .enumerate()
            .filter(|(_, &d)| d > 0)
            .map(|(i, _)| nodes[i].name.clone())
            .collect();
        return Err(ConfigurationError::Cycle { nodes });
    }
    Ok(order)
}

/// Reverse reachability from the outputs along fan-in edges.
fn observable_nodes(nodes: &[Node], outputs: &[NodeId]) -> Vec<bool> {
    let mut seen = vec![false; nodes.len()];
    let mut stack: Vec<NodeId> = outputs.to_vec();
    while let Some(id) = stack.pop() {
        if seen[id.0] {
            continue;
        }
        seen[id.0] = true;
        stack.extend(nodes[id.0].fanin.iter().copied().filter(|f| !seen[f.0]));
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(nodes: Vec<NodeSpec>, outputs: &[&str]) -> CircuitDescription {
        CircuitDescription {
            schema_version: fd_config::CONFIG_SCHEMA_VERSION.to_string(),
            name: "t".to_string(),
            description: None,
            nodes,
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn demo_topology() {
        let c = Circuit::demo().unwrap();
        assert_eq!(c.len(), 5);
        assert_eq!(c.input_names(), vec!["A", "B"]);
        assert_eq!(c.output_names(), vec!["N3"]);
        let n1 = c.id("N1").unwrap();
        assert_eq!(c.node(n1).kind(), GateKind::And);
        assert_eq!(c.fanout(c.id("A").unwrap()).len(), 2);
    }

    #[test]
    fn demo_circuit_builds() {
        let c = demo_circuit().unwrap();
        assert_eq!(c.name(), "demo");
        assert_eq!(c.topo_order(), Circuit::demo().unwrap().topo_order());
    }

    #[test]
    fn topo_order_respects_fanin() {
        // Declared out of order on purpose.
        let c = Circuit::from_description(&desc(
            vec![
                NodeSpec::gate("OUT", "OR", &["G", "B"]),
                NodeSpec::gate("G", "NOT", &["A"]),
                NodeSpec::input("A"),
                NodeSpec::input("B"),
            ],
            &["OUT"],
        ))
        .unwrap();
        let pos: HashMap<NodeId, usize> = c
            .topo_order()
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();
        for (id, node) in c.nodes() {
            for f in node.fanin() {
                assert!(pos[f] < pos[&id]);
            }
        }
        assert_eq!(c.input_names(), vec!["A", "B"]);
    }

    #[test]
    fn cycle_rejected() {
        let err = Circuit::from_description(&desc(
            vec![
                NodeSpec::input("A"),
                NodeSpec::gate("G1", "AND", &["A", "G2"]),
                NodeSpec::gate("G2", "NOT", &["G1"]),
            ],
            &["G2"],
        ))
        .unwrap_err();
        match err {
            ConfigurationError::Cycle { nodes } => assert_eq!(nodes, vec!["G1", "G2"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn dangling_edge_rejected() {
        let err = Circuit::from_description(&desc(
            vec![NodeSpec::input("A"), NodeSpec::gate("G", "AND", &["A", "X"])],
            &["G"],
        ))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DanglingEdge {
                node: "G".to_string(),
                missing: "X".to_string()
            }
        );
    }

    #[test]
    fn unknown_gate_rejected() {
        let err = Circuit::from_description(&desc(
            vec![NodeSpec::input("A"), NodeSpec::gate("G", "MUX", &["A"])],
            &["G"],
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownGate { .. }));
    }

    #[test]
    fn arity_enforced() {
        let err = Circuit::from_description(&desc(
            vec![NodeSpec::input("A"), NodeSpec::gate("G", "AND", &["A"])],
            &["G"],
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidArity { actual: 1, .. }));

        let err = Circuit::from_description(&desc(
            vec![
                NodeSpec::input("A"),
                NodeSpec {
                    name: "B".to_string(),
                    gate: "INPUT".to_string(),
                    inputs: vec!["A".to_string()],
                },
            ],
            &["B"],
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidArity { gate: GateKind::Input, .. }));
    }

    #[test]
    fn duplicate_names_and_outputs_rejected() {
        let err = Circuit::from_description(&desc(
            vec![NodeSpec::input("A"), NodeSpec::input("A")],
            &["A"],
        ))
        .unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateNode("A".to_string()));

        let err = Circuit::from_description(&desc(vec![NodeSpec::input("A")], &["A", "A"]))
            .unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateOutput("A".to_string()));

        let err = Circuit::from_description(&desc(vec![NodeSpec::input("A")], &["Z"]))
            .unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownOutput("Z".to_string()));
    }

    #[test]
    fn reachability() {
        let c = Circuit::from_description(&desc(
            vec![
                NodeSpec::input("A"),
                NodeSpec::input("B"),
                NodeSpec::gate("USED", "AND", &["A", "B"]),
                NodeSpec::gate("DEAD", "NOT", &["B"]),
            ],
            &["USED"],
        ))
        .unwrap();
        assert!(c.reaches_output(c.id("A").unwrap()));
        assert!(c.reaches_output(c.id("USED").unwrap()));
        assert!(!c.reaches_output(c.id("DEAD").unwrap()));
    }

    #[test]
    fn description_round_trip() {
        let c = Circuit::demo().unwrap();
        let again = Circuit::from_description(&c.to_description()).unwrap();
        assert_eq!(again.len(), c.len());
        assert_eq!(again.topo_order(), c.topo_order());
        assert_eq!(c.to_description(), CircuitDescription::demo());
    }

    #[test]
    fn lookup_unknown_node() {
        let c = Circuit::demo().unwrap();
        assert_eq!(
            c.lookup("Z").unwrap_err(),
            ConfigurationError::UnknownNode("Z".to_string())
        );
    }
}
