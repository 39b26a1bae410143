//! Single-fault hypotheses and their prior.

use std::collections::HashSet;

use fd_config::{DiagnosisSettings, PriorPolicy, PriorSpec};
use tracing::warn;

use crate::circuit::{Circuit, NodeId};
use crate::error::ConfigurationError;
use crate::simulate::Fault;

/// Prior weights may deviate from 1 by this much before the policy applies.
pub const PRIOR_SUM_TOLERANCE: f64 = 1e-6;

/// One candidate explanation of the observed behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hypothesis {
    NoFault,
    StuckAt(Fault),
}

impl Hypothesis {
    pub fn fault(&self) -> Option<Fault> {
        match self {
            Hypothesis::NoFault => None,
            Hypothesis::StuckAt(f) => Some(*f),
        }
    }

    pub fn node(&self) -> Option<NodeId> {
        self.fault().map(|f| f.node)
    }

    pub fn is_no_fault(&self) -> bool {
        matches!(self, Hypothesis::NoFault)
    }

    pub fn label(&self, circuit: &Circuit) -> String {
        match self {
            Hypothesis::NoFault => "no fault".to_string(),
            Hypothesis::StuckAt(f) => f.label(circuit),
        }
    }
}

/// Candidate hypotheses with a prior that sums to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct HypothesisSet {
    hypotheses: Vec<Hypothesis>,
    prior: Vec<f64>,
}

impl HypothesisSet {
    /// Build a set from explicit weights.
    ///
    /// Weights must be finite and non-negative with a positive sum. Under
    /// [`PriorPolicy::Normalize`] they are rescaled to sum to 1; under
    /// [`PriorPolicy::Strict`] a sum further than [`PRIOR_SUM_TOLERANCE`]
    /// from 1 is an error.
    pub fn new(
        circuit: &Circuit,
        entries: Vec<(Hypothesis, f64)>,
        policy: PriorPolicy,
    ) -> Result<Self, ConfigurationError> {
        if entries.is_empty() {
            return Err(ConfigurationError::EmptyHypothesisSet);
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for (h, w) in &entries {
            if let Some(f) = h.fault() {
                f.check(circuit)?;
            }
            if !seen.insert(*h) {
                return Err(ConfigurationError::InvalidPrior {
                    hypothesis: h.label(circuit),
                    message: "listed more than once".to_string(),
                });
            }
            if !w.is_finite() || *w < 0.0 {
                return Err(ConfigurationError::InvalidPrior {
                    hypothesis: h.label(circuit),
                    message: format!("weight must be finite and non-negative, got {}", w),
                });
            }
        }

        let sum: f64 = entries.iter().map(|(_, w)| w).sum();
        if sum <= 0.0 {
            return Err(ConfigurationError::InvalidPrior {
                hypothesis: "all hypotheses".to_string(),
                message: "weights sum to zero".to_string(),
            });
        }
        if (sum - 1.0).abs() > PRIOR_SUM_TOLERANCE {
            match policy {
                PriorPolicy::Strict => {
                    return Err(ConfigurationError::InvalidPrior {
                        hypothesis: "all hypotheses".to_string(),
                        message: format!("weights sum to {}, strict policy requires 1", sum),
                    });
                }
                PriorPolicy::Normalize => {
                    warn!(sum, hypotheses = entries.len(), "prior does not sum to 1; normalizing");
                }
            }
        }

        let (hypotheses, prior) = entries.into_iter().map(|(h, w)| (h, w / sum)).unzip();
        Ok(HypothesisSet { hypotheses, prior })
    }

    /// Every single-fault hypothesis: `NoFault` first (when included), then
    /// stuck-at-0 and stuck-at-1 for each node in declaration order.
    pub fn enumerate(circuit: &Circuit, include_no_fault: bool) -> Vec<Hypothesis> {
        let mut out = Vec::with_capacity(2 * circuit.len() + 1);
        if include_no_fault {
            out.push(Hypothesis::NoFault);
        }
        for id in circuit.node_ids() {
            out.extend(Fault::both(id).into_iter().map(Hypothesis::StuckAt));
        }
        out
    }

    pub fn uniform(circuit: &Circuit, include_no_fault: bool) -> Result<Self, ConfigurationError> {
        let hypotheses = Self::enumerate(circuit, include_no_fault);
        let w = 1.0 / hypotheses.len() as f64;
        Self::new(
            circuit,
            hypotheses.into_iter().map(|h| (h, w)).collect(),
            PriorPolicy::Normalize,
        )
    }

    /// Prior from a settings file's prior section.
    ///
    /// Each hypothesis takes its override weight if one names it, else the
    /// `no_fault` / `fault` default, else the uniform weight `1/n`.
    pub fn from_prior_spec(
        circuit: &Circuit,
        spec: &PriorSpec,
        policy: PriorPolicy,
    ) -> Result<Self, ConfigurationError> {
        let hypotheses = Self::enumerate(circuit, spec.include_no_fault);
        let uniform = 1.0 / hypotheses.len() as f64;

        let mut overrides = Vec::with_capacity(spec.overrides.len());
        for o in &spec.overrides {
            let label = format!("{} stuck-at-{}", o.node, o.stuck_at);
            let node = circuit.id(&o.node).ok_or_else(|| ConfigurationError::InvalidPrior {
                hypothesis: label.clone(),
                message: format!("override names unknown node '{}'", o.node),
            })?;
            let stuck_at = match o.stuck_at {
                0 => false,
                1 => true,
                other => {
                    return Err(ConfigurationError::InvalidPrior {
                        hypothesis: label,
                        message: format!("stuck_at must be 0 or 1, got {}", other),
                    })
                }
            };
            overrides.push((Fault::new(node, stuck_at), o.prob));
        }

        let entries = hypotheses
            .into_iter()
            .map(|h| {
                let w = match h {
                    Hypothesis::NoFault => spec.no_fault.unwrap_or(uniform),
                    Hypothesis::StuckAt(f) => overrides
                        .iter()
                        .find(|(of, _)| *of == f)
                        .map(|(_, p)| *p)
                        .or(spec.fault)
                        .unwrap_or(uniform),
                };
                (h, w)
            })
            .collect();

        Self::new(circuit, entries, policy)
    }

    pub fn from_settings(circuit: &Circuit, settings: &DiagnosisSettings) -> Result<Self, ConfigurationError> {
        Self::from_prior_spec(circuit, &settings.prior, settings.prior_policy)
    }

    pub fn len(&self) -> usize {
        self.hypotheses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hypotheses.is_empty()
    }

    pub fn hypotheses(&self) -> &[Hypothesis] {
        &self.hypotheses
    }

    pub fn prior(&self) -> &[f64] {
        &self.prior
    }

    pub fn iter(&self) -> impl Iterator<Item = (Hypothesis, f64)> + '_ {
        self.hypotheses.iter().copied().zip(self.prior.iter().copied())
    }

    pub fn index_of(&self, h: &Hypothesis) -> Option<usize> {
        self.hypotheses.iter().position(|x| x == h)
    }

    pub fn prior_of(&self, h: &Hypothesis) -> Option<f64> {
        self.index_of(h).map(|i| self.prior[i])
    }

    pub fn contains_no_fault(&self) -> bool {
        self.hypotheses.contains(&Hypothesis::NoFault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fd_config::PriorOverride;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn enumeration_order() {
        let c = Circuit::demo().unwrap();
        let hs = HypothesisSet::enumerate(&c, true);
        assert_eq!(hs.len(), 11);
        assert_eq!(hs[0], Hypothesis::NoFault);
        assert_eq!(hs[1].label(&c), "A stuck-at-0");
        assert_eq!(hs[2].label(&c), "A stuck-at-1");
        assert_eq!(hs[10].label(&c), "N3 stuck-at-1");
        assert_eq!(HypothesisSet::enumerate(&c, false).len(), 10);
    }

    #[test]
    fn uniform_prior_sums_to_one() {
        let c = Circuit::demo().unwrap();
        let set = HypothesisSet::uniform(&c, true).unwrap();
        assert!(approx_eq(set.prior().iter().sum(), 1.0));
        assert!(set.prior().iter().all(|&p| approx_eq(p, 1.0 / 11.0)));
        assert!(set.contains_no_fault());
    }

    #[test]
    fn demo_prior_spec_normalizes_overrides() {
        let c = Circuit::demo().unwrap();
        let settings = DiagnosisSettings::demo();
        let set = HypothesisSet::from_settings(&c, &settings).unwrap();
        assert!(!set.contains_no_fault());
        let n1 = c.id("N1").unwrap();
        assert!(approx_eq(set.prior_of(&Hypothesis::StuckAt(Fault::stuck_at_0(n1))).unwrap(), 0.25));
        let a = c.id("A").unwrap();
        assert_eq!(set.prior_of(&Hypothesis::StuckAt(Fault::stuck_at_1(a))), Some(0.0));
    }

    #[test]
    fn strict_policy_rejects_unnormalized() {
        let c = Circuit::demo().unwrap();
        let spec = PriorSpec {
            include_no_fault: true,
            no_fault: Some(0.5),
            fault: Some(0.1),
            overrides: vec![],
        };
        let err = HypothesisSet::from_prior_spec(&c, &spec, PriorPolicy::Strict).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidPrior { .. }));
        // 0.5 + 10 * 0.05 = 1
        let spec = PriorSpec {
            fault: Some(0.05),
            ..spec
        };
        HypothesisSet::from_prior_spec(&c, &spec, PriorPolicy::Strict).unwrap();
    }

    #[test]
    fn bad_weights_rejected() {
        let c = Circuit::demo().unwrap();
        let nf = Hypothesis::NoFault;
        assert!(matches!(
            HypothesisSet::new(&c, vec![], PriorPolicy::Normalize),
            Err(ConfigurationError::EmptyHypothesisSet)
        ));
        for w in [-0.1, f64::NAN, f64::INFINITY, 0.0] {
            assert!(
                HypothesisSet::new(&c, vec![(nf, w)], PriorPolicy::Normalize).is_err(),
                "weight {w} accepted"
            );
        }
        assert!(HypothesisSet::new(&c, vec![(nf, 0.5), (nf, 0.5)], PriorPolicy::Normalize).is_err());
    }

    #[test]
    fn override_for_unknown_node_rejected() {
        let c = Circuit::demo().unwrap();
        let spec = PriorSpec {
            overrides: vec![PriorOverride {
                node: "Z".to_string(),
                stuck_at: 0,
                prob: 0.1,
            }],
            ..PriorSpec::default()
        };
        let err = HypothesisSet::from_prior_spec(&c, &spec, PriorPolicy::Normalize).unwrap_err();
        assert!(err.to_string().contains("unknown node 'Z'"));
    }

    #[test]
    fn fault_outside_circuit_rejected() {
        let c = Circuit::demo().unwrap();
        let h = Hypothesis::StuckAt(Fault::stuck_at_0(NodeId(42)));
        assert!(matches!(
            HypothesisSet::new(&c, vec![(h, 1.0)], PriorPolicy::Normalize),
            Err(ConfigurationError::UnknownNode(_))
        ));
    }
}
