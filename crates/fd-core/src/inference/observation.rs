//! Observed (input vector, output vector) pairs.

use std::collections::BTreeMap;

use fd_config::validate::validate_observations;
use fd_config::{ObservationSet, ObservationSpec};

use crate::circuit::Circuit;
use crate::error::ConfigurationError;
use crate::simulate::trace::evaluate_outputs;
use crate::simulate::{format_bits, Fault};

/// Inputs applied to the circuit and the outputs seen in response, both in
/// the circuit's input/output order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub inputs: Vec<bool>,
    pub outputs: Vec<bool>,
    pub label: Option<String>,
}

impl Observation {
    pub fn new(inputs: Vec<bool>, outputs: Vec<bool>) -> Self {
        Observation {
            inputs,
            outputs,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// What the circuit would show under `fault` for `inputs`.
    pub fn simulated(
        circuit: &Circuit,
        inputs: &[bool],
        fault: Option<Fault>,
    ) -> Result<Self, ConfigurationError> {
        let outputs = crate::simulate::simulate_outputs(circuit, inputs, fault)?;
        Ok(Observation::new(inputs.to_vec(), outputs))
    }

    /// Resolve a name-keyed observation from a file against the circuit.
    ///
    /// Every primary input and every primary output must be given, and no
    /// other names may appear.
    pub fn from_spec(
        circuit: &Circuit,
        spec: &ObservationSpec,
        index: usize,
    ) -> Result<Self, ConfigurationError> {
        let inputs = resolve_signals(circuit, &circuit.input_names(), &spec.inputs, "input", index)?;
        let outputs =
            resolve_signals(circuit, &circuit.output_names(), &spec.outputs, "output", index)?;
        Ok(Observation {
            inputs,
            outputs,
            label: spec.label.clone(),
        })
    }

    /// Validate and resolve a whole observation file.
    pub fn from_set(circuit: &Circuit, set: &ObservationSet) -> Result<Vec<Self>, ConfigurationError> {
        validate_observations(set)?;
        set.observations
            .iter()
            .enumerate()
            .map(|(i, spec)| Self::from_spec(circuit, spec, i))
            .collect()
    }

    /// Fail unless the vector widths match the circuit.
    pub fn check(&self, circuit: &Circuit) -> Result<(), ConfigurationError> {
        if self.inputs.len() != circuit.inputs().len() {
            return Err(ConfigurationError::WidthMismatch {
                what: "input",
                expected: circuit.inputs().len(),
                actual: self.inputs.len(),
            });
        }
        if self.outputs.len() != circuit.outputs().len() {
            return Err(ConfigurationError::WidthMismatch {
                what: "output",
                expected: circuit.outputs().len(),
                actual: self.outputs.len(),
            });
        }
        Ok(())
    }

    /// Name-keyed form for writing observation files.
    pub fn to_spec(&self, circuit: &Circuit) -> ObservationSpec {
        let named = |names: Vec<&str>, bits: &[bool]| -> BTreeMap<String, u8> {
            names
                .into_iter()
                .zip(bits)
                .map(|(n, &b)| (n.to_string(), u8::from(b)))
                .collect()
        };
        ObservationSpec {
            label: self.label.clone(),
            inputs: named(circuit.input_names(), &self.inputs),
            outputs: named(circuit.output_names(), &self.outputs),
        }
    }

    /// `inputs -> outputs` as bit strings, e.g. `11 -> 0`.
    pub fn summary(&self) -> String {
        format!("{} -> {}", format_bits(&self.inputs), format_bits(&self.outputs))
    }
}

/// Observations the circuit would produce under `fault` for each vector.
pub fn synthesize_observations(
    circuit: &Circuit,
    fault: Option<Fault>,
    vectors: &[Vec<bool>],
) -> Result<Vec<Observation>, ConfigurationError> {
    if let Some(f) = fault {
        f.check(circuit)?;
    }
    vectors
        .iter()
        .map(|v| {
            if v.len() != circuit.inputs().len() {
                return Err(ConfigurationError::WidthMismatch {
                    what: "input",
                    expected: circuit.inputs().len(),
                    actual: v.len(),
                });
            }
            Ok(Observation::new(v.clone(), evaluate_outputs(circuit, v, fault)))
        })
        .collect()
}

fn resolve_signals(
    circuit: &Circuit,
    expected: &[&str],
    given: &BTreeMap<String, u8>,
    what: &str,
    index: usize,
) -> Result<Vec<bool>, ConfigurationError> {
    for name in given.keys() {
        if !expected.contains(&name.as_str()) {
            let message = if circuit.id(name).is_some() {
                format!("'{}' is not a primary {}", name, what)
            } else {
                format!("unknown {} '{}'", what, name)
            };
            return Err(ConfigurationError::InvalidObservation { index, message });
        }
    }
    expected
        .iter()
        .map(|&name| match given.get(name) {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            Some(v) => Err(ConfigurationError::InvalidObservation {
                index,
                message: format!("{} '{}' must be 0 or 1, got {}", what, name, v),
            }),
            None => Err(ConfigurationError::InvalidObservation {
                index,
                message: format!("missing {} '{}'", what, name),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::exhaustive_inputs;

    #[test]
    fn demo_observations_resolve() {
        let c = Circuit::demo().unwrap();
        let obs = Observation::from_set(&c, &ObservationSet::demo()).unwrap();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].inputs, vec![true, true]);
        assert_eq!(obs[0].outputs, vec![false]);
        assert_eq!(obs[1].summary(), "00 -> 1");
    }

    #[test]
    fn missing_and_unknown_signals_rejected() {
        let c = Circuit::demo().unwrap();
        let missing = ObservationSpec::new(&[("A", 1)], &[("N3", 0)]);
        let err = Observation::from_spec(&c, &missing, 3).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::InvalidObservation {
                index: 3,
                message: "missing input 'B'".to_string()
            }
        );

        let internal = ObservationSpec::new(&[("A", 1), ("B", 1)], &[("N1", 0), ("N3", 0)]);
        let err = Observation::from_spec(&c, &internal, 0).unwrap_err();
        assert!(err.to_string().contains("'N1' is not a primary output"));

        let unknown = ObservationSpec::new(&[("A", 1), ("B", 1), ("Q", 0)], &[("N3", 0)]);
        let err = Observation::from_spec(&c, &unknown, 0).unwrap_err();
        assert!(err.to_string().contains("unknown input 'Q'"));
    }

    #[test]
    fn to_spec_round_trip() {
        let c = Circuit::demo().unwrap();
        let obs = Observation::simulated(&c, &[false, true], None).unwrap().with_label("x");
        let back = Observation::from_spec(&c, &obs.to_spec(&c), 0).unwrap();
        assert_eq!(back, obs);
    }

    #[test]
    fn width_check() {
        let c = Circuit::demo().unwrap();
        assert!(Observation::new(vec![true], vec![true]).check(&c).is_err());
        assert!(Observation::new(vec![true, true], vec![]).check(&c).is_err());
        assert!(Observation::new(vec![true, true], vec![true]).check(&c).is_ok());
    }

    #[test]
    fn synthesized_observations_follow_fault() {
        let c = Circuit::demo().unwrap();
        let n1 = c.id("N1").unwrap();
        let obs = synthesize_observations(&c, Some(Fault::stuck_at_0(n1)), &exhaustive_inputs(2).unwrap())
            .unwrap();
        let outs: Vec<bool> = obs.iter().map(|o| o.outputs[0]).collect();
        assert_eq!(outs, vec![true, true, false, false]);
    }
}
