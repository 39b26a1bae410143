//! Incremental Bayesian update over single-fault hypotheses.
//!
//! The posterior is kept in the log domain and renormalized after every
//! observation:
//!
//! ```text
//! log P(h | o_1..o_k) = log P(h | o_1..o_k-1) + log P(o_k | h) - log Z_k
//! ```
//!
//! where `P(o | h)` comes from the [`LikelihoodModel`] and `Z_k` is the
//! marginal likelihood of `o_k`. Addition commutes, so the final posterior
//! does not depend on observation order.

use fd_math::{argmax, ln_prob, log_sum_exp, normalize_log_probs, probs_from_log};
use tracing::debug;

use super::hypothesis::{Hypothesis, HypothesisSet};
use super::likelihood::LikelihoodModel;
use super::observation::Observation;
use super::report::PosteriorReport;
use crate::circuit::Circuit;
use crate::error::{ConfigurationError, DiagnosisError};
use crate::simulate::trace::evaluate_outputs;

/// What one observation contributed to the posterior.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    pub observation: Observation,
    /// Per hypothesis: whether its simulated outputs match.
    pub consistent: Vec<bool>,
    /// Per hypothesis: `log P(o | h)`.
    pub log_likelihood: Vec<f64>,
    /// `log P(o | previous posterior)`.
    pub log_evidence: f64,
}

/// Running posterior for one circuit and hypothesis set.
#[derive(Debug, Clone)]
pub struct Diagnoser<'c> {
    circuit: &'c Circuit,
    hypotheses: HypothesisSet,
    model: LikelihoodModel,
    log_prior: Vec<f64>,
    log_posterior: Vec<f64>,
    log_likelihood: Vec<f64>,
    records: Vec<ObservationRecord>,
}

impl<'c> Diagnoser<'c> {
    pub fn new(
        circuit: &'c Circuit,
        hypotheses: HypothesisSet,
        model: LikelihoodModel,
    ) -> Result<Self, ConfigurationError> {
        if hypotheses.is_empty() {
            return Err(ConfigurationError::EmptyHypothesisSet);
        }
        for h in hypotheses.hypotheses() {
            if let Some(f) = h.fault() {
                f.check(circuit)?;
            }
        }
        let log_prior: Vec<f64> = hypotheses.prior().iter().map(|&p| ln_prob(p)).collect();
        Ok(Diagnoser {
            circuit,
            log_posterior: log_prior.clone(),
            log_likelihood: vec![0.0; hypotheses.len()],
            log_prior,
            hypotheses,
            model,
            records: Vec::new(),
        })
    }

    /// Fold one observation into the posterior.
    ///
    /// On error the posterior is left unchanged.
    pub fn observe(&mut self, obs: &Observation) -> Result<(), DiagnosisError> {
        obs.check(self.circuit)?;
        let index = self.records.len();

        let consistent: Vec<bool> = self
            .hypotheses
            .hypotheses()
            .iter()
            .map(|h| evaluate_outputs(self.circuit, &obs.inputs, h.fault()) == obs.outputs)
            .collect();
        let log_likelihood: Vec<f64> = consistent
            .iter()
            .map(|&c| self.model.log_likelihood(c))
            .collect();

        let unnormalized: Vec<f64> = self
            .log_posterior
            .iter()
            .zip(&log_likelihood)
            .map(|(p, l)| p + l)
            .collect();
        let log_evidence = log_sum_exp(&unnormalized);
        if !log_evidence.is_finite() {
            return Err(DiagnosisError::InconsistentEvidence { index });
        }

        self.log_posterior = normalize_log_probs(&unnormalized);
        for (acc, l) in self.log_likelihood.iter_mut().zip(&log_likelihood) {
            *acc += l;
        }

        debug!(
            observation = index,
            io = %obs.summary(),
            consistent = consistent.iter().filter(|&&c| c).count(),
            log_evidence,
            "posterior updated"
        );

        self.records.push(ObservationRecord {
            observation: obs.clone(),
            consistent,
            log_likelihood,
            log_evidence,
        });
        Ok(())
    }

    pub fn observe_all(&mut self, observations: &[Observation]) -> Result<(), DiagnosisError> {
        observations.iter().try_for_each(|o| self.observe(o))
    }

    /// Posterior probabilities in hypothesis-set order; sums to 1.
    pub fn posterior(&self) -> Vec<f64> {
        probs_from_log(&self.log_posterior)
    }

    pub fn log_posterior(&self) -> &[f64] {
        &self.log_posterior
    }

    pub fn log_prior(&self) -> &[f64] {
        &self.log_prior
    }

    /// Accumulated `log P(o_1..o_k | h)` per hypothesis.
    pub fn log_likelihood(&self) -> &[f64] {
        &self.log_likelihood
    }

    pub fn posterior_of(&self, h: &Hypothesis) -> Option<f64> {
        self.hypotheses
            .index_of(h)
            .map(|i| self.log_posterior[i].exp())
    }

    /// Most probable hypothesis; the first in set order wins ties.
    pub fn map(&self) -> (Hypothesis, f64) {
        let posterior = self.posterior();
        let i = argmax(&posterior).unwrap_or(0);
        (self.hypotheses.hypotheses()[i], posterior[i])
    }

    pub fn hypotheses(&self) -> &HypothesisSet {
        &self.hypotheses
    }

    pub fn model(&self) -> &LikelihoodModel {
        &self.model
    }

    pub fn circuit(&self) -> &Circuit {
        self.circuit
    }

    pub fn records(&self) -> &[ObservationRecord] {
        &self.records
    }

    pub fn observation_count(&self) -> usize {
        self.records.len()
    }

    pub fn report(&self) -> PosteriorReport {
        PosteriorReport::from_diagnoser(self)
    }
}

/// Batch form: fold all observations and report.
pub fn diagnose(
    circuit: &Circuit,
    hypotheses: HypothesisSet,
    model: LikelihoodModel,
    observations: &[Observation],
) -> Result<PosteriorReport, DiagnosisError> {
    let mut diagnoser = Diagnoser::new(circuit, hypotheses, model)?;
    diagnoser.observe_all(observations)?;
    Ok(diagnoser.report())
}

/// Posterior probabilities only, without building a report.
pub fn posterior_after(
    circuit: &Circuit,
    hypotheses: &HypothesisSet,
    model: LikelihoodModel,
    observations: &[Observation],
) -> Result<Vec<f64>, DiagnosisError> {
    let mut diagnoser = Diagnoser::new(circuit, hypotheses.clone(), model)?;
    diagnoser.observe_all(observations)?;
    Ok(diagnoser.posterior())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{CircuitBuilder, GateKind};
    use crate::simulate::Fault;
    use fd_config::{DiagnosisSettings, ObservationSet, PriorPolicy};

    fn and2() -> Circuit {
        CircuitBuilder::new("and2")
            .input("IN1")
            .input("IN2")
            .gate("AND", GateKind::And, &["IN1", "IN2"])
            .output("AND")
            .build()
            .unwrap()
    }

    #[test]
    fn consistent_fault_gains_majority() {
        let c = and2();
        let sa0 = Hypothesis::StuckAt(Fault::stuck_at_0(c.id("AND").unwrap()));
        let set = HypothesisSet::new(
            &c,
            vec![(Hypothesis::NoFault, 0.5), (sa0, 0.5)],
            PriorPolicy::Strict,
        )
        .unwrap();
        let mut d = Diagnoser::new(&c, set, LikelihoodModel::default()).unwrap();
        d.observe(&Observation::new(vec![true, true], vec![false])).unwrap();
        let p = d.posterior_of(&sa0).unwrap();
        assert!(p > 0.5);
        assert!((p - 1.0 / 1.01).abs() < 1e-12);
        assert_eq!(d.map().0, sa0);
    }

    #[test]
    fn posterior_before_observations_is_prior() {
        let c = Circuit::demo().unwrap();
        let set = HypothesisSet::uniform(&c, true).unwrap();
        let prior = set.prior().to_vec();
        let d = Diagnoser::new(&c, set, LikelihoodModel::default()).unwrap();
        for (a, b) in d.posterior().iter().zip(&prior) {
            assert!((a - b).abs() < 1e-12);
        }
        assert_eq!(d.observation_count(), 0);
    }

    #[test]
    fn demo_ranks_n1_stuck_at_0_first() {
        let c = Circuit::demo().unwrap();
        let set = HypothesisSet::from_settings(&c, &DiagnosisSettings::demo()).unwrap();
        let obs = Observation::from_set(&c, &ObservationSet::demo()).unwrap();
        let mut d = Diagnoser::new(&c, set, LikelihoodModel::default()).unwrap();
        d.observe_all(&obs).unwrap();
        let (map, p) = d.map();
        assert_eq!(map.label(&c), "N1 stuck-at-0");
        // Likelihoods: N1/0 = 1, N1/1 = N2/1 = 0.01, N2/0 = 1e-4, equal priors.
        assert!((p - 1.0 / 1.0201).abs() < 1e-9);
    }

    #[test]
    fn inconsistent_evidence_is_an_error_and_leaves_state() {
        let c = and2();
        let set = HypothesisSet::new(&c, vec![(Hypothesis::NoFault, 1.0)], PriorPolicy::Strict).unwrap();
        let mut d = Diagnoser::new(&c, set, LikelihoodModel::exact()).unwrap();
        let err = d
            .observe(&Observation::new(vec![true, true], vec![false]))
            .unwrap_err();
        assert_eq!(err, DiagnosisError::InconsistentEvidence { index: 0 });
        assert_eq!(d.observation_count(), 0);
        assert_eq!(d.posterior(), vec![1.0]);
    }

    #[test]
    fn exact_model_zeroes_contradicted_hypotheses() {
        let c = and2();
        let set = HypothesisSet::uniform(&c, true).unwrap();
        let mut d = Diagnoser::new(&c, set, LikelihoodModel::exact()).unwrap();
        d.observe(&Observation::new(vec![true, true], vec![true])).unwrap();
        let and = c.id("AND").unwrap();
        assert_eq!(d.posterior_of(&Hypothesis::StuckAt(Fault::stuck_at_0(and))), Some(0.0));
        let total: f64 = d.posterior().iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn log_posterior_stays_normalized() {
        let c = and2();
        let set = HypothesisSet::uniform(&c, true).unwrap();
        let mut d = Diagnoser::new(&c, set, LikelihoodModel::exact()).unwrap();
        d.observe(&Observation::new(vec![true, true], vec![true])).unwrap();
        d.observe(&Observation::new(vec![false, true], vec![false])).unwrap();
        assert!(log_sum_exp(d.log_posterior()).abs() < 1e-12);
        let and = c.id("AND").unwrap();
        let i = d
            .hypotheses()
            .index_of(&Hypothesis::StuckAt(Fault::stuck_at_1(and)))
            .unwrap();
        assert_eq!(d.log_posterior()[i], f64::NEG_INFINITY);
    }

    #[test]
    fn width_mismatch_is_configuration_error() {
        let c = and2();
        let set = HypothesisSet::uniform(&c, true).unwrap();
        let mut d = Diagnoser::new(&c, set, LikelihoodModel::default()).unwrap();
        let err = d.observe(&Observation::new(vec![true], vec![true])).unwrap_err();
        assert!(matches!(
            err,
            DiagnosisError::Configuration(ConfigurationError::WidthMismatch { .. })
        ));
    }

    #[test]
    fn records_keep_evidence_terms() {
        let c = Circuit::demo().unwrap();
        let set = HypothesisSet::uniform(&c, true).unwrap();
        let obs = Observation::from_set(&c, &ObservationSet::demo()).unwrap();
        let mut d = Diagnoser::new(&c, set, LikelihoodModel::default()).unwrap();
        d.observe_all(&obs).unwrap();
        assert_eq!(d.records().len(), 2);
        // (1,1) -> 0 contradicts the fault-free circuit.
        assert!(!d.records()[0].consistent[0]);
        assert!(d.records()[1].consistent[0]);
        let summed: f64 = d.records().iter().map(|r| r.log_likelihood[0]).sum();
        assert!((summed - d.log_likelihood()[0]).abs() < 1e-12);
    }
}
