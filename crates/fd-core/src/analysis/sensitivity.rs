//! Per-node fault sensitivity.
//!
//! Every scored node gets both stuck-at faults injected in turn and is
//! scored by how much that changes what can be seen from outside:
//!
//! - `OutputMismatch`: fraction of (stuck value, test vector) pairs whose
//!   primary outputs differ from the healthy circuit.
//! - `PosteriorShift`: mean over the two stuck values of the total variation
//!   distance between the posterior diagnosed from the faulty circuit's
//!   outputs and the posterior diagnosed from healthy outputs on the same
//!   vectors.
//!
//! Scores lie in `[0, 1]`. A node with no path to a primary output scores 0
//! under both metrics.
//!
//! Under an exact likelihood or a restricted prior some evidence sets are
//! explained by no hypothesis at all. Such a set has no posterior and is
//! treated as a point mass on an extra "unexplained" outcome: two unexplained
//! sets are distance 0 apart, an unexplained set and any posterior are
//! distance 1 apart.

use std::collections::BTreeMap;

use fd_config::{DiagnosisSettings, SensitivityMetricKind};
use fd_math::total_variation;
use schemars::JsonSchema;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::circuit::{Circuit, GateKind, NodeId};
use crate::error::{ConfigurationError, DiagnosisError};
use crate::inference::{
    posterior_after, synthesize_observations, HypothesisSet, LikelihoodModel, Observation,
};
use crate::simulate::trace::evaluate_outputs;
use crate::simulate::{exhaustive_inputs, Fault};

pub use fd_config::SensitivityMetricKind as SensitivityMetric;

/// What to score and against which test vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityConfig {
    pub metric: SensitivityMetric,
    pub include_inputs: bool,
    /// `None` means every input combination.
    pub vectors: Option<Vec<Vec<bool>>>,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        SensitivityConfig {
            metric: SensitivityMetric::OutputMismatch,
            include_inputs: true,
            vectors: None,
        }
    }
}

impl SensitivityConfig {
    pub fn from_settings(settings: &DiagnosisSettings) -> Self {
        SensitivityConfig {
            metric: settings.sensitivity.metric,
            include_inputs: settings.sensitivity.include_inputs,
            vectors: None,
        }
    }

    pub fn with_vectors(mut self, vectors: Vec<Vec<bool>>) -> Self {
        self.vectors = Some(vectors);
        self
    }

    fn resolve_vectors(&self, circuit: &Circuit) -> Result<Vec<Vec<bool>>, ConfigurationError> {
        let vectors = match &self.vectors {
            Some(v) => v.clone(),
            None => exhaustive_inputs(circuit.inputs().len())?,
        };
        if vectors.is_empty() {
            return Err(ConfigurationError::EmptyTestSet);
        }
        let width = circuit.inputs().len();
        if let Some(v) = vectors.iter().find(|v| v.len() != width) {
            return Err(ConfigurationError::WidthMismatch {
                what: "input",
                expected: width,
                actual: v.len(),
            });
        }
        Ok(vectors)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct NodeSensitivity {
    pub node: String,
    pub gate: GateKind,
    pub score: f64,
    pub stuck_at_0: f64,
    pub stuck_at_1: f64,
    /// Whether the node has a path to a primary output.
    pub observable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct SensitivityReport {
    pub circuit: String,
    pub metric: SensitivityMetric,
    pub include_inputs: bool,
    pub test_vectors: usize,
    pub scores: BTreeMap<String, f64>,
    /// Node names, most sensitive first; ties by name.
    pub ranking: Vec<String>,
    /// Per-node detail in ranking order.
    pub nodes: Vec<NodeSensitivity>,
}

impl SensitivityReport {
    fn new(
        circuit: &Circuit,
        metric: SensitivityMetric,
        include_inputs: bool,
        test_vectors: usize,
        mut nodes: Vec<NodeSensitivity>,
    ) -> Self {
        nodes.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.node.cmp(&b.node)));
        SensitivityReport {
            circuit: circuit.name().to_string(),
            metric,
            include_inputs,
            test_vectors,
            scores: nodes.iter().map(|n| (n.node.clone(), n.score)).collect(),
            ranking: nodes.iter().map(|n| n.node.clone()).collect(),
            nodes,
        }
    }

    pub fn score_of(&self, node: &str) -> Option<f64> {
        self.scores.get(node).copied()
    }

    pub fn most_sensitive(&self) -> Option<&NodeSensitivity> {
        self.nodes.first()
    }
}

fn scored_nodes(circuit: &Circuit, include_inputs: bool) -> impl Iterator<Item = NodeId> + '_ {
    circuit
        .nodes()
        .filter(move |(_, n)| include_inputs || !n.is_input())
        .map(|(id, _)| id)
}

fn node_entry(circuit: &Circuit, id: NodeId, per_value: [f64; 2]) -> NodeSensitivity {
    let node = circuit.node(id);
    NodeSensitivity {
        node: node.name().to_string(),
        gate: node.kind(),
        score: (per_value[0] + per_value[1]) / 2.0,
        stuck_at_0: per_value[0],
        stuck_at_1: per_value[1],
        observable: circuit.reaches_output(id),
    }
}

/// Output-mismatch sensitivity over `vectors`.
pub fn output_sensitivity(
    circuit: &Circuit,
    vectors: &[Vec<bool>],
    include_inputs: bool,
) -> Result<SensitivityReport, ConfigurationError> {
    let config = SensitivityConfig {
        metric: SensitivityMetric::OutputMismatch,
        include_inputs,
        vectors: Some(vectors.to_vec()),
    };
    let vectors = config.resolve_vectors(circuit)?;
    let healthy: Vec<Vec<bool>> = vectors
        .iter()
        .map(|v| evaluate_outputs(circuit, v, None))
        .collect();

    let mut nodes = Vec::new();
    for id in scored_nodes(circuit, include_inputs) {
        let mut per_value = [0.0; 2];
        if circuit.reaches_output(id) {
            for fault in Fault::both(id) {
                let mismatches = vectors
                    .iter()
                    .zip(&healthy)
                    .filter(|(v, h)| evaluate_outputs(circuit, v, Some(fault)) != **h)
                    .count();
                per_value[fault.stuck_value() as usize] = mismatches as f64 / vectors.len() as f64;
            }
        }
        let entry = node_entry(circuit, id, per_value);
        debug!(node = %entry.node, score = entry.score, "output sensitivity");
        nodes.push(entry);
    }

    Ok(SensitivityReport::new(
        circuit,
        SensitivityMetric::OutputMismatch,
        include_inputs,
        vectors.len(),
        nodes,
    ))
}

/// Posterior after `observations`, or `None` when every hypothesis has zero
/// likelihood for one of them.
fn explained_posterior(
    circuit: &Circuit,
    hypotheses: &HypothesisSet,
    model: LikelihoodModel,
    observations: &[Observation],
) -> Result<Option<Vec<f64>>, DiagnosisError> {
    match posterior_after(circuit, hypotheses, model, observations) {
        Ok(posterior) => Ok(Some(posterior)),
        Err(DiagnosisError::InconsistentEvidence { index }) => {
            debug!(index, "evidence explained by no hypothesis");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn posterior_distance(p: Option<&[f64]>, q: Option<&[f64]>) -> f64 {
    match (p, q) {
        (Some(p), Some(q)) => total_variation(p, q),
        (None, None) => 0.0,
        _ => 1.0,
    }
}

/// Posterior-shift sensitivity over `vectors`, diagnosing with `hypotheses`
/// and `model`.
pub fn posterior_sensitivity(
    circuit: &Circuit,
    hypotheses: &HypothesisSet,
    model: LikelihoodModel,
    vectors: &[Vec<bool>],
    include_inputs: bool,
) -> Result<SensitivityReport, DiagnosisError> {
    let config = SensitivityConfig {
        metric: SensitivityMetric::PosteriorShift,
        include_inputs,
        vectors: Some(vectors.to_vec()),
    };
    let vectors = config.resolve_vectors(circuit)?;

    let healthy_obs = synthesize_observations(circuit, None, &vectors)?;
    let baseline = explained_posterior(circuit, hypotheses, model, &healthy_obs)?;
    if baseline.is_none() {
        warn!(
            circuit = circuit.name(),
            "no hypothesis explains the healthy outputs; any explained fault scores 1"
        );
    }

    let mut nodes = Vec::new();
    for id in scored_nodes(circuit, include_inputs) {
        let mut per_value = [0.0; 2];
        if circuit.reaches_output(id) {
            for fault in Fault::both(id) {
                let obs = synthesize_observations(circuit, Some(fault), &vectors)?;
                // Identical evidence gives an identical posterior.
                if obs == healthy_obs {
                    continue;
                }
                let shifted = explained_posterior(circuit, hypotheses, model, &obs)?;
                per_value[fault.stuck_value() as usize] =
                    posterior_distance(shifted.as_deref(), baseline.as_deref());
            }
        }
        let entry = node_entry(circuit, id, per_value);
        debug!(node = %entry.node, score = entry.score, "posterior sensitivity");
        nodes.push(entry);
    }

    Ok(SensitivityReport::new(
        circuit,
        SensitivityMetric::PosteriorShift,
        include_inputs,
        vectors.len(),
        nodes,
    ))
}

/// Run the sweep `config` describes.
///
/// `hypotheses` and `model` are only consulted for
/// [`SensitivityMetric::PosteriorShift`].
pub fn analyze(
    circuit: &Circuit,
    config: &SensitivityConfig,
    hypotheses: &HypothesisSet,
    model: LikelihoodModel,
) -> Result<SensitivityReport, DiagnosisError> {
    let vectors = config.resolve_vectors(circuit)?;
    info!(
        circuit = circuit.name(),
        metric = %config.metric,
        vectors = vectors.len(),
        include_inputs = config.include_inputs,
        "running sensitivity analysis"
    );
    let report = match config.metric {
        SensitivityMetricKind::OutputMismatch => {
            output_sensitivity(circuit, &vectors, config.include_inputs)?
        }
        SensitivityMetricKind::PosteriorShift => {
            posterior_sensitivity(circuit, hypotheses, model, &vectors, config.include_inputs)?
        }
    };
    if let Some(top) = report.most_sensitive() {
        info!(node = %top.node, score = top.score, "most sensitive node");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::CircuitBuilder;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    /// Demo circuit plus a gate whose output goes nowhere.
    fn with_dead_gate() -> Circuit {
        CircuitBuilder::new("dead")
            .input("A")
            .input("B")
            .gate("N1", GateKind::And, &["A", "B"])
            .gate("N2", GateKind::Not, &["A"])
            .gate("N3", GateKind::Or, &["N1", "N2"])
            .gate("DEAD", GateKind::Xor, &["A", "B"])
            .output("N3")
            .build()
            .unwrap()
    }

    #[test]
    fn demo_output_scores() {
        let c = Circuit::demo().unwrap();
        let r = output_sensitivity(&c, &exhaustive_inputs(2).unwrap(), true).unwrap();
        // N3 = A ? B : 1, so N3 sa0 flips 3 of 4 rows and sa1 flips 1.
        assert!(approx_eq(r.score_of("N3").unwrap(), 0.5));
        // N1 sa0 flips (1,1); N1 sa1 flips (1,0).
        assert!(approx_eq(r.score_of("N1").unwrap(), 0.25));
        assert_eq!(r.ranking[0], "N3");
        assert_eq!(r.test_vectors, 4);
        assert_eq!(r.scores.len(), 5);
    }

    #[test]
    fn skipping_inputs() {
        let c = Circuit::demo().unwrap();
        let r = output_sensitivity(&c, &exhaustive_inputs(2).unwrap(), false).unwrap();
        assert_eq!(r.scores.keys().collect::<Vec<_>>(), vec!["N1", "N2", "N3"]);
    }

    #[test]
    fn ranking_ties_break_by_name() {
        let c = Circuit::demo().unwrap();
        let r = output_sensitivity(&c, &exhaustive_inputs(2).unwrap(), true).unwrap();
        for w in r.nodes.windows(2) {
            assert!(w[0].score > w[1].score || (w[0].score == w[1].score && w[0].node < w[1].node));
        }
    }

    #[test]
    fn unobservable_node_scores_zero_under_both_metrics() {
        let c = with_dead_gate();
        let vectors = exhaustive_inputs(2).unwrap();
        let out = output_sensitivity(&c, &vectors, true).unwrap();
        assert_eq!(out.score_of("DEAD"), Some(0.0));

        let set = HypothesisSet::uniform(&c, true).unwrap();
        let post = posterior_sensitivity(&c, &set, LikelihoodModel::default(), &vectors, true).unwrap();
        assert_eq!(post.score_of("DEAD"), Some(0.0));
        let dead = post.nodes.iter().find(|n| n.node == "DEAD").unwrap();
        assert!(!dead.observable);
        assert!(post.score_of("N3").unwrap() > 0.0);
    }

    #[test]
    fn posterior_scores_bounded() {
        let c = Circuit::demo().unwrap();
        let set = HypothesisSet::uniform(&c, true).unwrap();
        let r = posterior_sensitivity(
            &c,
            &set,
            LikelihoodModel::default(),
            &exhaustive_inputs(2).unwrap(),
            true,
        )
        .unwrap();
        assert!(r.scores.values().all(|&s| (0.0..=1.0).contains(&s)));
    }

    #[test]
    fn exact_model_with_restricted_prior() {
        let c = Circuit::demo().unwrap();
        let set = HypothesisSet::from_settings(&c, &DiagnosisSettings::demo()).unwrap();
        let r = posterior_sensitivity(
            &c,
            &set,
            LikelihoodModel::exact(),
            &exhaustive_inputs(2).unwrap(),
            true,
        )
        .unwrap();
        assert_eq!(r.scores.len(), 5);
        assert!(r.scores.values().all(|&s| (0.0..=1.0).contains(&s)));
        // Healthy outputs are unexplained; N1 sa0 and sa1 are each explained
        // by their own hypothesis, so both shift fully.
        assert!(approx_eq(r.score_of("N1").unwrap(), 1.0));
        // N3 sa0 outputs constant 0, which nothing in the prior explains;
        // constant 1 is explained by N1 sa1 and N2 sa1.
        let n3 = r.nodes.iter().find(|n| n.node == "N3").unwrap();
        assert_eq!(n3.stuck_at_0, 0.0);
        assert!(approx_eq(n3.stuck_at_1, 1.0));
        assert!(approx_eq(n3.score, 0.5));
    }

    #[test]
    fn exact_model_with_dead_gate() {
        let c = with_dead_gate();
        let set = HypothesisSet::uniform(&c, false).unwrap();
        let r = posterior_sensitivity(
            &c,
            &set,
            LikelihoodModel::exact(),
            &exhaustive_inputs(2).unwrap(),
            true,
        )
        .unwrap();
        // DEAD faults explain the healthy outputs, so the baseline exists.
        assert_eq!(r.score_of("DEAD"), Some(0.0));
        assert!(r.scores.values().all(|&s| (0.0..=1.0).contains(&s)));
    }

    #[test]
    fn distance_with_unexplained_evidence() {
        let p = [0.5, 0.5];
        assert_eq!(posterior_distance(None, None), 0.0);
        assert_eq!(posterior_distance(Some(&p), None), 1.0);
        assert_eq!(posterior_distance(None, Some(&p)), 1.0);
        assert_eq!(posterior_distance(Some(&p), Some(&p)), 0.0);
    }

    #[test]
    fn empty_test_set_rejected() {
        let c = Circuit::demo().unwrap();
        assert_eq!(
            output_sensitivity(&c, &[], true).unwrap_err(),
            ConfigurationError::EmptyTestSet
        );
    }

    #[test]
    fn analyze_is_idempotent() {
        let c = Circuit::demo().unwrap();
        let set = HypothesisSet::uniform(&c, true).unwrap();
        for metric in [SensitivityMetric::OutputMismatch, SensitivityMetric::PosteriorShift] {
            let config = SensitivityConfig {
                metric,
                ..SensitivityConfig::default()
            };
            let a = analyze(&c, &config, &set, LikelihoodModel::default()).unwrap();
            let b = analyze(&c, &config, &set, LikelihoodModel::default()).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.metric, metric);
        }
    }
}
