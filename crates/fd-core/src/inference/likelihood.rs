//! Two-level observation likelihood.

use fd_config::LikelihoodParams;
use fd_math::ln_prob;
use schemars::JsonSchema;
use serde::Serialize;

use crate::error::ConfigurationError;

/// `P(observation | hypothesis)`: `match_prob` when the hypothesis predicts
/// the observed outputs exactly, `noise_prob` otherwise.
///
/// A non-zero `noise_prob` keeps a single contradicting observation from
/// ruling a hypothesis out entirely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, JsonSchema)]
pub struct LikelihoodModel {
    pub match_prob: f64,
    pub noise_prob: f64,
}

impl Default for LikelihoodModel {
    fn default() -> Self {
        let p = LikelihoodParams::default();
        LikelihoodModel {
            match_prob: p.match_prob,
            noise_prob: p.noise_prob,
        }
    }
}

impl LikelihoodModel {
    /// Requires `0 <= noise_prob < match_prob <= 1`.
    pub fn new(match_prob: f64, noise_prob: f64) -> Result<Self, ConfigurationError> {
        for (name, p) in [("match_prob", match_prob), ("noise_prob", noise_prob)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigurationError::InvalidLikelihood(format!(
                    "{} must be in [0, 1], got {}",
                    name, p
                )));
            }
        }
        if noise_prob >= match_prob {
            return Err(ConfigurationError::InvalidLikelihood(format!(
                "noise_prob ({}) must be below match_prob ({})",
                noise_prob, match_prob
            )));
        }
        Ok(LikelihoodModel {
            match_prob,
            noise_prob,
        })
    }

    /// Deterministic model: inconsistent observations have probability 0.
    pub fn exact() -> Self {
        LikelihoodModel {
            match_prob: 1.0,
            noise_prob: 0.0,
        }
    }

    pub fn from_params(params: &LikelihoodParams) -> Result<Self, ConfigurationError> {
        Self::new(params.match_prob, params.noise_prob)
    }

    pub fn log_likelihood(&self, consistent: bool) -> f64 {
        if consistent {
            ln_prob(self.match_prob)
        } else {
            ln_prob(self.noise_prob)
        }
    }
}
