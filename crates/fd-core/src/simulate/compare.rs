//! Healthy versus faulty trace comparison.

use schemars::JsonSchema;
use serde::Serialize;

use super::fault::Fault;
use super::trace::{evaluate, simulate_batch, Trace};
use crate::circuit::Circuit;
use crate::error::ConfigurationError;

/// A node whose value differs between two traces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct NodeDiff {
    pub node: String,
    pub healthy: u8,
    pub faulty: u8,
}

/// Nodes whose values differ, in declaration order.
pub fn compare_traces(circuit: &Circuit, healthy: &Trace, faulty: &Trace) -> Vec<NodeDiff> {
    circuit
        .nodes()
        .filter(|(id, _)| healthy.value(*id) != faulty.value(*id))
        .map(|(id, node)| NodeDiff {
            node: node.name().to_string(),
            healthy: u8::from(healthy.value(id)),
            faulty: u8::from(faulty.value(id)),
        })
        .collect()
}

/// An input vector that exposes a fault at the outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub inputs: Vec<bool>,
    /// Every node the fault changed for this vector, outputs included.
    pub diffs: Vec<NodeDiff>,
}

/// First vector in `vectors` whose outputs differ between the healthy and
/// faulty circuit, or `None` if the fault stays hidden on all of them.
pub fn first_detecting_input(
    circuit: &Circuit,
    fault: Fault,
    vectors: &[Vec<bool>],
) -> Result<Option<Detection>, ConfigurationError> {
    let faulty_runs = simulate_batch(circuit, vectors, Some(fault))?;
    for run in faulty_runs {
        let healthy = evaluate(circuit, &run.inputs, None);
        if healthy.outputs(circuit) != run.trace.outputs(circuit) {
            let diffs = compare_traces(circuit, &healthy, &run.trace);
            return Ok(Some(Detection {
                inputs: run.inputs,
                diffs,
            }));
        }
    }
    Ok(None)
}

/// Whether any vector in `vectors` detects `fault`.
pub fn detects(circuit: &Circuit, fault: Fault, vectors: &[Vec<bool>]) -> Result<bool, ConfigurationError> {
    first_detecting_input(circuit, fault, vectors).map(|d| d.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{CircuitBuilder, GateKind};
    use crate::simulate::trace::{exhaustive_inputs, simulate};

    #[test]
    fn diff_lists_changed_nodes_only() {
        let c = Circuit::demo().unwrap();
        let n1 = c.id("N1").unwrap();
        let healthy = simulate(&c, &[true, true], None).unwrap();
        let faulty = simulate(&c, &[true, true], Some(Fault::stuck_at_0(n1))).unwrap();
        let diffs = compare_traces(&c, &healthy, &faulty);
        assert_eq!(
            diffs,
            vec![
                NodeDiff {
                    node: "N1".to_string(),
                    healthy: 1,
                    faulty: 0
                },
                NodeDiff {
                    node: "N3".to_string(),
                    healthy: 1,
                    faulty: 0
                },
            ]
        );
        assert!(compare_traces(&c, &healthy, &healthy).is_empty());
    }

    #[test]
    fn first_detecting_input_for_demo() {
        let c = Circuit::demo().unwrap();
        let vectors = exhaustive_inputs(2).unwrap();
        // N1 stuck-at-0 only shows when A=1, B=1.
        let det = first_detecting_input(&c, Fault::stuck_at_0(c.id("N1").unwrap()), &vectors)
            .unwrap()
            .unwrap();
        assert_eq!(det.inputs, vec![true, true]);
        // N2 stuck-at-1 first shows at A=1, B=0.
        let det = first_detecting_input(&c, Fault::stuck_at_1(c.id("N2").unwrap()), &vectors)
            .unwrap()
            .unwrap();
        assert_eq!(det.inputs, vec![true, false]);
    }

    #[test]
    fn unobservable_fault_never_detected() {
        let c = CircuitBuilder::new("dead")
            .input("A")
            .input("B")
            .gate("OUT", GateKind::And, &["A", "B"])
            .gate("DEAD", GateKind::Not, &["A"])
            .output("OUT")
            .build()
            .unwrap();
        let vectors = exhaustive_inputs(2).unwrap();
        let dead = c.id("DEAD").unwrap();
        for f in Fault::both(dead) {
            assert!(!detects(&c, f, &vectors).unwrap());
        }
    }
}
