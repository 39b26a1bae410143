//! Evaluation of input vectors in topological order.

use std::collections::BTreeMap;

use tracing::trace;

use super::fault::Fault;
use crate::circuit::{Circuit, NodeId};
use crate::error::ConfigurationError;

/// Largest input count [`exhaustive_inputs`] will enumerate (65536 vectors).
pub const MAX_EXHAUSTIVE_INPUTS: usize = 16;

/// The value of every node for one simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trace {
    values: Vec<bool>,
}

impl Trace {
    pub fn value(&self, id: NodeId) -> bool {
        self.values[id.index()]
    }

    /// Values indexed by [`NodeId::index`].
    pub fn values(&self) -> &[bool] {
        &self.values
    }

    /// Primary output values in the circuit's output order.
    pub fn outputs(&self, circuit: &Circuit) -> Vec<bool> {
        circuit.outputs().iter().map(|&id| self.value(id)).collect()
    }

    /// Node name to 0/1, for reports.
    pub fn named(&self, circuit: &Circuit) -> BTreeMap<String, u8> {
        circuit
            .nodes()
            .map(|(id, n)| (n.name().to_string(), u8::from(self.value(id))))
            .collect()
    }
}

/// One input vector with the trace it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationRun {
    pub inputs: Vec<bool>,
    pub trace: Trace,
}

/// Simulate one input vector, optionally with a stuck-at fault applied.
///
/// `inputs` follows [`Circuit::inputs`] order. A fault on a primary input
/// replaces the supplied value; a fault anywhere else replaces the gate's
/// computed value before its fan-out reads it.
pub fn simulate(
    circuit: &Circuit,
    inputs: &[bool],
    fault: Option<Fault>,
) -> Result<Trace, ConfigurationError> {
    check_inputs(circuit, inputs)?;
    if let Some(f) = fault {
        f.check(circuit)?;
    }
    Ok(evaluate(circuit, inputs, fault))
}

/// Simulate and project the primary outputs.
pub fn simulate_outputs(
    circuit: &Circuit,
    inputs: &[bool],
    fault: Option<Fault>,
) -> Result<Vec<bool>, ConfigurationError> {
    simulate(circuit, inputs, fault).map(|t| t.outputs(circuit))
}

/// Simulate every vector in `vectors` under the same fault.
pub fn simulate_batch(
    circuit: &Circuit,
    vectors: &[Vec<bool>],
    fault: Option<Fault>,
) -> Result<Vec<SimulationRun>, ConfigurationError> {
    if let Some(f) = fault {
        f.check(circuit)?;
    }
    vectors
        .iter()
        .map(|v| {
            check_inputs(circuit, v)?;
            Ok(SimulationRun {
                inputs: v.clone(),
                trace: evaluate(circuit, v, fault),
            })
        })
        .collect()
}

/// All `2^n` input vectors in lexicographic order, first input most
/// significant: `[0,0], [0,1], [1,0], [1,1]` for two inputs.
pub fn exhaustive_inputs(n: usize) -> Result<Vec<Vec<bool>>, ConfigurationError> {
    if n > MAX_EXHAUSTIVE_INPUTS {
        return Err(ConfigurationError::TooManyInputs {
            inputs: n,
            max: MAX_EXHAUSTIVE_INPUTS,
        });
    }
    Ok((0..1usize << n)
        .map(|i| (0..n).map(|k| (i >> (n - 1 - k)) & 1 == 1).collect())
        .collect())
}

/// Parse an input vector written `0,1,1`, `0 1 1` or `011`.
pub fn parse_input_vector(circuit: &Circuit, text: &str) -> Result<Vec<bool>, ConfigurationError> {
    let invalid = |reason: String| ConfigurationError::InvalidInputVector {
        text: text.to_string(),
        reason,
    };
    let bits: Vec<bool> = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            other => Err(invalid(format!("unexpected character '{}'", other))),
        })
        .collect::<Result<_, _>>()?;
    if bits.len() != circuit.inputs().len() {
        return Err(invalid(format!(
            "expected {} bits for inputs {}, got {}",
            circuit.inputs().len(),
            circuit.input_names().join(","),
            bits.len()
        )));
    }
    Ok(bits)
}

/// Render bits as a compact `0`/`1` string.
pub fn format_bits(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}

fn check_inputs(circuit: &Circuit, inputs: &[bool]) -> Result<(), ConfigurationError> {
    if inputs.len() != circuit.inputs().len() {
        return Err(ConfigurationError::WidthMismatch {
            what: "input",
            expected: circuit.inputs().len(),
            actual: inputs.len(),
        });
    }
    Ok(())
}

/// Evaluation without argument checks. Callers guarantee the input width
/// and that the fault names a node of `circuit`.
pub(crate) fn evaluate(circuit: &Circuit, inputs: &[bool], fault: Option<Fault>) -> Trace {
    let mut values = vec![false; circuit.len()];
    let mut fanin_values = Vec::new();
    for &id in circuit.topo_order() {
        let node = circuit.node(id);
        let computed = match circuit.input_position(id) {
            Some(pos) => inputs[pos],
            None => {
                fanin_values.clear();
                fanin_values.extend(node.fanin().iter().map(|f| values[f.index()]));
                node.kind().eval(&fanin_values)
            }
        };
        values[id.index()] = match fault {
            Some(f) if f.node == id => f.stuck_at,
            _ => computed,
        };
    }
    trace!(
        inputs = %format_bits(inputs),
        fault = ?fault.map(|f| f.label(circuit)),
        "simulated"
    );
    Trace { values }
}

/// Output projection of [`evaluate`].
pub(crate) fn evaluate_outputs(circuit: &Circuit, inputs: &[bool], fault: Option<Fault>) -> Vec<bool> {
    evaluate(circuit, inputs, fault).outputs(circuit)
}
