//! Serializable simulation results for the `simulate` command.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::Serialize;

use super::compare::{compare_traces, NodeDiff};
use super::fault::{Fault, FaultDescription};
use super::trace::{evaluate, format_bits, simulate_batch};
use crate::circuit::Circuit;
use crate::error::ConfigurationError;

/// Per-vector traces, with faulty outputs and affected nodes when a fault
/// is injected.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SimulationReport {
    pub circuit: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<FaultDescription>,
    pub runs: Vec<RunRecord>,
    /// Vectors (as bit strings) whose outputs expose the fault.
    pub detecting_inputs: Vec<String>,
    /// Nodes the fault changed on at least one vector, in declaration order.
    pub affected_nodes: Vec<String>,
}

/// One simulated input vector.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct RunRecord {
    pub inputs: String,
    /// Fault-free value of every node.
    pub values: BTreeMap<String, u8>,
    pub outputs: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faulty_outputs: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diffs: Vec<NodeDiff>,
}

impl SimulationReport {
    pub fn run(
        circuit: &Circuit,
        fault: Option<Fault>,
        vectors: &[Vec<bool>],
    ) -> Result<Self, ConfigurationError> {
        let healthy_runs = simulate_batch(circuit, vectors, None)?;
        if let Some(f) = fault {
            f.check(circuit)?;
        }

        let mut runs = Vec::with_capacity(healthy_runs.len());
        let mut detecting_inputs = Vec::new();
        let mut affected = vec![false; circuit.len()];

        for run in healthy_runs {
            let outputs = run.trace.outputs(circuit);
            let (faulty_outputs, diffs) = match fault {
                Some(f) => {
                    let faulty = evaluate(circuit, &run.inputs, Some(f));
                    let faulty_out = faulty.outputs(circuit);
                    if faulty_out != outputs {
                        detecting_inputs.push(format_bits(&run.inputs));
                    }
                    for id in circuit.node_ids() {
                        if faulty.value(id) != run.trace.value(id) {
                            affected[id.index()] = true;
                        }
                    }
                    (
                        Some(format_bits(&faulty_out)),
                        compare_traces(circuit, &run.trace, &faulty),
                    )
                }
                None => (None, Vec::new()),
            };
            runs.push(RunRecord {
                inputs: format_bits(&run.inputs),
                values: run.trace.named(circuit),
                outputs: format_bits(&outputs),
                faulty_outputs,
                diffs,
            });
        }

        let affected_nodes = circuit
            .nodes()
            .filter(|(id, _)| affected[id.index()])
            .map(|(_, n)| n.name().to_string())
            .collect();

        Ok(SimulationReport {
            circuit: circuit.name().to_string(),
            inputs: circuit.input_names().iter().map(|s| s.to_string()).collect(),
            outputs: circuit.output_names().iter().map(|s| s.to_string()).collect(),
            fault: fault.map(|f| f.describe(circuit)),
            runs,
            detecting_inputs,
            affected_nodes,
        })
    }

    pub fn is_detected(&self) -> bool {
        !self.detecting_inputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::trace::exhaustive_inputs;

    #[test]
    fn fault_free_report_has_no_diffs() {
        let c = Circuit::demo().unwrap();
        let report = SimulationReport::run(&c, None, &exhaustive_inputs(2).unwrap()).unwrap();
        assert_eq!(report.runs.len(), 4);
        assert_eq!(report.runs[2].inputs, "10");
        assert_eq!(report.runs[2].outputs, "0");
        assert!(report.affected_nodes.is_empty());
        assert!(!report.is_detected());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("fault").is_none());
    }

    #[test]
    fn faulty_report_collects_affected_nodes() {
        let c = Circuit::demo().unwrap();
        let fault = Fault::parse(&c, "N1=0").unwrap();
        let report =
            SimulationReport::run(&c, Some(fault), &exhaustive_inputs(2).unwrap()).unwrap();
        assert_eq!(report.detecting_inputs, vec!["11"]);
        assert_eq!(report.affected_nodes, vec!["N1", "N3"]);
        assert_eq!(report.runs[3].faulty_outputs.as_deref(), Some("0"));
    }
}
