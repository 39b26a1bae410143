//! Configuration validation errors and semantic validation.
//!
//! These checks need only the file contents. Checks that need the typed
//! circuit (node existence, acyclicity, observation widths) live in fd-core.

use std::collections::HashSet;
use thiserror::Error;

use crate::circuit::CircuitDescription;
use crate::observations::ObservationSet;
use crate::settings::DiagnosisSettings;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

fn check_version(actual: &str) -> ValidationResult<()> {
    if actual != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

fn check_probability(field: &str, value: f64) -> ValidationResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be in [0, 1], got {}", value),
        });
    }
    Ok(())
}

fn check_weight(field: &str, value: f64) -> ValidationResult<()> {
    if value.is_nan() || value < 0.0 || value.is_infinite() {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be a finite non-negative weight, got {}", value),
        });
    }
    Ok(())
}

fn check_bit(field: &str, value: u8) -> ValidationResult<()> {
    if value > 1 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be 0 or 1, got {}", value),
        });
    }
    Ok(())
}

/// Validate a circuit description without building the graph.
pub fn validate_circuit_description(desc: &CircuitDescription) -> ValidationResult<()> {
    check_version(&desc.schema_version)?;

    if desc.nodes.is_empty() {
        return Err(ValidationError::SemanticError(format!(
            "Circuit '{}' has no nodes",
            desc.name
        )));
    }
    if desc.outputs.is_empty() {
        return Err(ValidationError::SemanticError(format!(
            "Circuit '{}' declares no outputs",
            desc.name
        )));
    }

    for (idx, node) in desc.nodes.iter().enumerate() {
        if node.name.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("nodes[{}].name", idx),
                message: "Must not be empty".to_string(),
            });
        }
        if node.name.trim() != node.name {
            return Err(ValidationError::InvalidValue {
                field: format!("nodes[{}].name", idx),
                message: "Must not have leading or trailing whitespace".to_string(),
            });
        }
    }

    Ok(())
}

/// Validate settings semantically.
pub fn validate_settings(settings: &DiagnosisSettings) -> ValidationResult<()> {
    check_version(&settings.schema_version)?;

    let lik = &settings.likelihood;
    check_probability("likelihood.match_prob", lik.match_prob)?;
    check_probability("likelihood.noise_prob", lik.noise_prob)?;
    if lik.match_prob <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "likelihood.match_prob".to_string(),
            message: "Must be positive".to_string(),
        });
    }
    if lik.noise_prob >= lik.match_prob {
        return Err(ValidationError::SemanticError(format!(
            "likelihood.noise_prob ({}) must be below likelihood.match_prob ({}) or evidence cannot discriminate",
            lik.noise_prob, lik.match_prob
        )));
    }

    let prior = &settings.prior;
    if let Some(p) = prior.no_fault {
        check_weight("prior.no_fault", p)?;
    }
    if let Some(p) = prior.fault {
        check_weight("prior.fault", p)?;
    }
    let mut seen = HashSet::new();
    for (idx, o) in prior.overrides.iter().enumerate() {
        check_weight(&format!("prior.overrides[{}].prob", idx), o.prob)?;
        check_bit(&format!("prior.overrides[{}].stuck_at", idx), o.stuck_at)?;
        if !seen.insert((o.node.as_str(), o.stuck_at)) {
            return Err(ValidationError::SemanticError(format!(
                "Duplicate prior override for {} stuck-at-{}",
                o.node, o.stuck_at
            )));
        }
    }

    Ok(())
}

/// Validate an observation set semantically.
pub fn validate_observations(set: &ObservationSet) -> ValidationResult<()> {
    check_version(&set.schema_version)?;

    for (idx, obs) in set.observations.iter().enumerate() {
        if obs.inputs.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("observations[{}].inputs", idx),
                message: "Must assign at least one input".to_string(),
            });
        }
        if obs.outputs.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("observations[{}].outputs", idx),
                message: "Must record at least one output".to_string(),
            });
        }
        for (name, value) in obs.inputs.iter().chain(obs.outputs.iter()) {
            check_bit(&format!("observations[{}].{}", idx, name), *value)?;
        }
    }

    Ok(())
}
