//! Bayesian single-fault diagnosis.
//!
//! Hypotheses are "no fault" plus one stuck-at fault per node and value.
//! Each observation is scored against every hypothesis by simulating the
//! circuit under that hypothesis, and the posterior is updated in the log
//! domain.

pub mod diagnoser;
pub mod hypothesis;
pub mod likelihood;
pub mod observation;
pub mod report;

pub use diagnoser::{diagnose, posterior_after, Diagnoser, ObservationRecord};
pub use hypothesis::{Hypothesis, HypothesisSet, PRIOR_SUM_TOLERANCE};
pub use likelihood::LikelihoodModel;
pub use observation::{synthesize_observations, Observation};
pub use report::{BayesFactorEntry, Confidence, EvidenceTerm, PosteriorReport, RankedHypothesis};
