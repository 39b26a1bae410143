//! Ranked posterior with per-observation evidence.

use std::collections::BTreeMap;

use fd_math::bayes_factor::EvidenceSummary;
use fd_math::{entropy_bits, max_entropy_bits};
use schemars::JsonSchema;
use serde::Serialize;

use super::diagnoser::Diagnoser;
use super::hypothesis::Hypothesis;
use super::likelihood::LikelihoodModel;
use crate::simulate::format_bits;

/// Confidence bucket for the MAP hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Confidence {
    pub fn from_probability(p: f64) -> Self {
        if p > 0.99 {
            Confidence::VeryHigh
        } else if p > 0.95 {
            Confidence::High
        } else if p > 0.80 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
            Confidence::VeryHigh => "very high",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Bayes factor of a fault hypothesis against "no fault".
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct BayesFactorEntry {
    /// Clamped log Bayes factor in nats.
    pub log_bf: f64,
    pub delta_bits: f64,
    pub strength: String,
    pub direction: String,
}

impl From<EvidenceSummary> for BayesFactorEntry {
    fn from(s: EvidenceSummary) -> Self {
        BayesFactorEntry {
            log_bf: s.log_bf,
            delta_bits: s.delta_bits,
            strength: s.strength.label().to_string(),
            direction: s.direction.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct RankedHypothesis {
    /// 1-based.
    pub rank: usize,
    pub hypothesis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stuck_at: Option<u8>,
    pub prior: f64,
    pub posterior: f64,
    /// Accumulated log likelihood; `None` once an observation has ruled the
    /// hypothesis out.
    pub log_likelihood: Option<f64>,
    pub consistent_observations: usize,
    /// Absent for "no fault" and when the set has no "no fault" baseline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bayes_factor: Option<BayesFactorEntry>,
}

/// One observation's row in the evidence ledger.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct EvidenceTerm {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub inputs: String,
    pub outputs: String,
    /// Hypotheses that predict these outputs.
    pub consistent: Vec<String>,
    /// `ln P(o | posterior before o)`.
    pub log_evidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct PosteriorReport {
    pub circuit: String,
    pub observation_count: usize,
    pub likelihood: LikelihoodModel,
    pub map_hypothesis: String,
    pub map_posterior: f64,
    pub confidence: Confidence,
    pub entropy_bits: f64,
    pub prior_entropy_bits: f64,
    pub max_entropy_bits: f64,
    pub ranked: Vec<RankedHypothesis>,
    pub evidence: Vec<EvidenceTerm>,
}

impl PosteriorReport {
    pub fn from_diagnoser(d: &Diagnoser<'_>) -> Self {
        let circuit = d.circuit();
        let set = d.hypotheses();
        let posterior = d.posterior();
        let log_likelihood = d.log_likelihood();
        let baseline = set.index_of(&Hypothesis::NoFault).map(|i| log_likelihood[i]);

        let mut order: Vec<usize> = (0..set.len()).collect();
        // Stable: ties keep hypothesis-set order.
        order.sort_by(|&a, &b| posterior[b].total_cmp(&posterior[a]));

        let ranked: Vec<RankedHypothesis> = order
            .iter()
            .enumerate()
            .map(|(rank, &i)| {
                let h = set.hypotheses()[i];
                let description = h.fault().map(|f| f.describe(circuit));
                let ll = log_likelihood[i];
                let bayes_factor = match (h, baseline) {
                    (Hypothesis::StuckAt(_), Some(base)) => {
                        Some(EvidenceSummary::from_log_likelihoods(ll, base).into())
                    }
                    _ => None,
                };
                RankedHypothesis {
                    rank: rank + 1,
                    hypothesis: h.label(circuit),
                    node: description.as_ref().map(|f| f.node.clone()),
                    stuck_at: description.map(|f| f.stuck_at),
                    prior: set.prior()[i],
                    posterior: posterior[i],
                    log_likelihood: ll.is_finite().then_some(ll),
                    consistent_observations: d.records().iter().filter(|r| r.consistent[i]).count(),
                    bayes_factor,
                }
            })
            .collect();

        let evidence = d
            .records()
            .iter()
            .enumerate()
            .map(|(index, r)| EvidenceTerm {
                index,
                label: r.observation.label.clone(),
                inputs: format_bits(&r.observation.inputs),
                outputs: format_bits(&r.observation.outputs),
                consistent: set
                    .hypotheses()
                    .iter()
                    .zip(&r.consistent)
                    .filter(|&(_, &c)| c)
                    .map(|(h, _)| h.label(circuit))
                    .collect(),
                log_evidence: r.log_evidence,
            })
            .collect();

        let (map, map_posterior) = d.map();
        PosteriorReport {
            circuit: circuit.name().to_string(),
            observation_count: d.observation_count(),
            likelihood: *d.model(),
            map_hypothesis: map.label(circuit),
            map_posterior,
            confidence: Confidence::from_probability(map_posterior),
            entropy_bits: entropy_bits(&posterior),
            prior_entropy_bits: entropy_bits(set.prior()),
            max_entropy_bits: max_entropy_bits(set.len()),
            ranked,
            evidence,
        }
    }

    pub fn posterior_of(&self, hypothesis: &str) -> Option<f64> {
        self.ranked
            .iter()
            .find(|r| r.hypothesis == hypothesis)
            .map(|r| r.posterior)
    }

    /// Posterior keyed by hypothesis label.
    pub fn scores(&self) -> BTreeMap<String, f64> {
        self.ranked
            .iter()
            .map(|r| (r.hypothesis.clone(), r.posterior))
            .collect()
    }

    /// Entropy removed by the observations, in bits.
    pub fn information_gain_bits(&self) -> f64 {
        self.prior_entropy_bits - self.entropy_bits
    }

    pub fn top(&self, n: usize) -> &[RankedHypothesis] {
        &self.ranked[..n.min(self.ranked.len())]
    }
}
