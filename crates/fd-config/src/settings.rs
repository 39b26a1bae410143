//! Diagnosis settings: likelihood model, fault prior and sensitivity options.
//!
//! Every field has a default, so an empty `{"schema_version": "1.0.0"}` file
//! is valid and equivalent to [`DiagnosisSettings::default`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::validate::{ValidationError, ValidationResult};

/// Complete settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DiagnosisSettings {
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub likelihood: LikelihoodParams,

    #[serde(default)]
    pub prior: PriorSpec,

    #[serde(default)]
    pub prior_policy: PriorPolicy,

    #[serde(default)]
    pub sensitivity: SensitivitySettings,
}

impl Default for DiagnosisSettings {
    fn default() -> Self {
        DiagnosisSettings {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            description: None,
            likelihood: LikelihoodParams::default(),
            prior: PriorSpec::default(),
            prior_policy: PriorPolicy::default(),
            sensitivity: SensitivitySettings::default(),
        }
    }
}

/// Two-level observation likelihood.
///
/// An observation whose outputs equal the outputs simulated under a
/// hypothesis has likelihood `match_prob`; any other observation has
/// likelihood `noise_prob`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LikelihoodParams {
    #[serde(default = "default_match_prob")]
    pub match_prob: f64,

    #[serde(default = "default_noise_prob")]
    pub noise_prob: f64,
}

fn default_match_prob() -> f64 {
    1.0
}

fn default_noise_prob() -> f64 {
    0.01
}

impl Default for LikelihoodParams {
    fn default() -> Self {
        LikelihoodParams {
            match_prob: default_match_prob(),
            noise_prob: default_noise_prob(),
        }
    }
}

/// Prior over fault hypotheses.
///
/// A hypothesis takes its weight from the first of: a matching override,
/// `no_fault` / `fault`, or the uniform weight `1/n`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PriorSpec {
    /// Whether the "no fault" hypothesis is part of the set.
    #[serde(default = "default_true")]
    pub include_no_fault: bool,

    #[serde(default)]
    pub no_fault: Option<f64>,

    /// Weight of every stuck-at hypothesis without an override.
    #[serde(default)]
    pub fault: Option<f64>,

    #[serde(default)]
    pub overrides: Vec<PriorOverride>,
}

fn default_true() -> bool {
    true
}

impl Default for PriorSpec {
    fn default() -> Self {
        PriorSpec {
            include_no_fault: true,
            no_fault: None,
            fault: None,
            overrides: Vec::new(),
        }
    }
}

/// Explicit prior weight for one `(node, stuck_at)` hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PriorOverride {
    pub node: String,
    pub stuck_at: u8,
    pub prob: f64,
}

/// What to do when prior weights do not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PriorPolicy {
    /// Rescale the weights to sum to 1.
    #[default]
    Normalize,
    /// Reject weights whose sum differs from 1 by more than 1e-6.
    Strict,
}

impl std::fmt::Display for PriorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriorPolicy::Normalize => write!(f, "normalize"),
            PriorPolicy::Strict => write!(f, "strict"),
        }
    }
}

/// Metric used by the sensitivity sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityMetricKind {
    /// Fraction of (stuck value, test input) pairs that change an output.
    #[default]
    OutputMismatch,
    /// Total variation shift of the diagnosis when a node's fault is injected.
    PosteriorShift,
}

impl std::str::FromStr for SensitivityMetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "output" | "output_mismatch" | "mismatch" => Ok(SensitivityMetricKind::OutputMismatch),
            "posterior" | "posterior_shift" | "shift" => Ok(SensitivityMetricKind::PosteriorShift),
            _ => Err(format!("unknown sensitivity metric: {}", s)),
        }
    }
}

impl std::fmt::Display for SensitivityMetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensitivityMetricKind::OutputMismatch => write!(f, "output_mismatch"),
            SensitivityMetricKind::PosteriorShift => write!(f, "posterior_shift"),
        }
    }
}

/// Sensitivity sweep options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SensitivitySettings {
    #[serde(default)]
    pub metric: SensitivityMetricKind,

    /// Score primary inputs as well as gates.
    #[serde(default = "default_true")]
    pub include_inputs: bool,
}

impl Default for SensitivitySettings {
    fn default() -> Self {
        SensitivitySettings {
            metric: SensitivityMetricKind::default(),
            include_inputs: true,
        }
    }
}

impl DiagnosisSettings {
    /// Load settings from a JSON file.
    /// Parse settings from a JSON string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid settings JSON: {}", e)))
    }

    /// Settings reproducing the classic two-gate demonstration: four stuck-at
    /// hypotheses on N1/N2 at 0.005 each, no "no fault" hypothesis.
    pub fn demo() -> Self {
        let overrides = ["N1", "N2"]
            .iter()
            .flat_map(|node| {
                [0u8, 1].into_iter().map(move |stuck_at| PriorOverride {
                    node: node.to_string(),
                    stuck_at,
                    prob: 0.005,
                })
            })
            .collect();
        DiagnosisSettings {
            description: Some("Two-gate demonstration prior".to_string()),
            prior: PriorSpec {
                include_no_fault: false,
                no_fault: None,
                fault: Some(0.0),
                overrides,
            },
            ..DiagnosisSettings::default()
        }
    }
}
