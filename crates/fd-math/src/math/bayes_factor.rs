//! Bayes factor utilities for comparing a fault hypothesis against a baseline.
//!
//! A Bayes factor BF = P(data|candidate) / P(data|baseline) measures the
//! relative support the observations give one hypothesis over another. The
//! diagnoser reports each fault hypothesis against "no fault" this way.
//!
//! Everything here works on the log Bayes factor in nats. Labels exist for
//! presentation only; the raw value is always preserved.

use serde::Serialize;

/// Log Bayes factors are clamped to this magnitude before reporting, so that
/// a zero-likelihood baseline does not leak an infinity into JSON output.
pub const LOG_BF_LIMIT: f64 = 700.0;

/// Clamp a log Bayes factor into `[-LOG_BF_LIMIT, LOG_BF_LIMIT]`.
///
/// NaN is passed through unchanged.
pub fn clamp_log_bf(log_bf: f64) -> f64 {
    if log_bf.is_nan() {
        return log_bf;
    }
    log_bf.clamp(-LOG_BF_LIMIT, LOG_BF_LIMIT)
}

/// Convert a log Bayes factor in nats to bits.
pub fn delta_bits(log_bf: f64) -> f64 {
    if log_bf.is_nan() {
        return f64::NAN;
    }
    log_bf / std::f64::consts::LN_2
}

/// Evidence strength on the Jeffreys scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStrength {
    /// |log_bf| == 0
    None,
    /// 0 < |log_bf| < ln(3.2)
    Anecdotal,
    /// ln(3.2) <= |log_bf| < ln(10)
    Substantial,
    /// ln(10) <= |log_bf| < ln(32)
    Strong,
    /// ln(32) <= |log_bf| < ln(100)
    VeryStrong,
    /// |log_bf| >= ln(100)
    Decisive,
}

impl EvidenceStrength {
    /// Classify evidence strength from the magnitude of a log Bayes factor.
    pub fn from_log_bf(log_bf: f64) -> Self {
        if log_bf.is_nan() {
            return EvidenceStrength::None;
        }

        const LN_3_2: f64 = 1.163_150_809_678_64;
        const LN_32: f64 = 3.465_735_902_799_727;
        const LN_100: f64 = 4.605_170_185_988_092;

        let magnitude = log_bf.abs();
        if magnitude < f64::EPSILON {
            EvidenceStrength::None
        } else if magnitude < LN_3_2 {
            EvidenceStrength::Anecdotal
        } else if magnitude < std::f64::consts::LN_10 {
            EvidenceStrength::Substantial
        } else if magnitude < LN_32 {
            EvidenceStrength::Strong
        } else if magnitude < LN_100 {
            EvidenceStrength::VeryStrong
        } else {
            EvidenceStrength::Decisive
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EvidenceStrength::None => "none",
            EvidenceStrength::Anecdotal => "anecdotal",
            EvidenceStrength::Substantial => "substantial",
            EvidenceStrength::Strong => "strong",
            EvidenceStrength::VeryStrong => "very strong",
            EvidenceStrength::Decisive => "decisive",
        }
    }
}

impl std::fmt::Display for EvidenceStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Which side of the comparison the evidence supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceDirection {
    /// log_bf > 0
    FavorsCandidate,
    /// log_bf < 0
    FavorsBaseline,
    Neutral,
}

impl EvidenceDirection {
    pub fn from_log_bf(log_bf: f64) -> Self {
        if log_bf.is_nan() || log_bf.abs() < f64::EPSILON {
            EvidenceDirection::Neutral
        } else if log_bf > 0.0 {
            EvidenceDirection::FavorsCandidate
        } else {
            EvidenceDirection::FavorsBaseline
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EvidenceDirection::FavorsCandidate => "favors candidate",
            EvidenceDirection::FavorsBaseline => "favors baseline",
            EvidenceDirection::Neutral => "neutral",
        }
    }
}

/// Evidence summary for one Bayes factor.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceSummary {
    /// Clamped log Bayes factor in nats.
    pub log_bf: f64,
    pub delta_bits: f64,
    pub strength: EvidenceStrength,
    pub direction: EvidenceDirection,
}

impl EvidenceSummary {
    pub fn from_log_bf(log_bf: f64) -> Self {
        let log_bf = clamp_log_bf(log_bf);
        EvidenceSummary {
            log_bf,
            delta_bits: delta_bits(log_bf),
            strength: EvidenceStrength::from_log_bf(log_bf),
            direction: EvidenceDirection::from_log_bf(log_bf),
        }
    }

    /// Build a summary from the log likelihoods of candidate and baseline.
    pub fn from_log_likelihoods(candidate: f64, baseline: f64) -> Self {
        let log_bf = match (candidate == f64::NEG_INFINITY, baseline == f64::NEG_INFINITY) {
            (true, true) => 0.0,
            (true, false) => f64::NEG_INFINITY,
            (false, true) => f64::INFINITY,
            (false, false) => candidate - baseline,
        };
        Self::from_log_bf(log_bf)
    }

    pub fn is_significant(&self, min_strength: EvidenceStrength) -> bool {
        self.strength >= min_strength
    }
}
