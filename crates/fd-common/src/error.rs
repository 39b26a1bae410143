//! Error types for fault diagnosis.
//!
//! Library crates raise their own focused errors (`ValidationError` in
//! fd-config, `ConfigurationError` and `DiagnosisError` in fd-core). At the
//! command-line boundary they are folded into [`Error`], which carries:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Remediation hints for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Invalid Circuit
//!   Reason: invalid circuit: cycle detected through nodes N1, N2
//!   Fix: Fix the circuit description; run 'fd-core check --circuit <file>' to validate.
//! ```
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 20,
//!   "category": "circuit",
//!   "message": "invalid circuit: cycle detected through nodes N1, N2"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for fault diagnosis operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Settings and observation files.
    Config,
    /// Circuit topology and fault specifications.
    Circuit,
    /// Bayesian diagnosis.
    Diagnosis,
    /// Sensitivity analysis.
    Analysis,
    /// File I/O and serialization.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Circuit => write!(f, "circuit"),
            ErrorCategory::Diagnosis => write!(f, "diagnosis"),
            ErrorCategory::Analysis => write!(f, "analysis"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for fault diagnosis.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("invalid observations: {0}")]
    InvalidObservations(String),

    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    // Circuit errors (20-29)
    #[error("invalid circuit: {0}")]
    InvalidCircuit(String),

    #[error("invalid fault: {0}")]
    InvalidFault(String),

    // Diagnosis errors (30-39)
    #[error("diagnosis failed: {0}")]
    Diagnosis(String),

    #[error("inconsistent evidence: {0}")]
    InconsistentEvidence(String),

    // Analysis errors (40-49)
    #[error("sensitivity analysis failed: {0}")]
    Analysis(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Circuit errors
    /// - 30-39: Diagnosis errors
    /// - 40-49: Analysis errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidSettings(_) => 11,
            Error::InvalidObservations(_) => 12,
            Error::SchemaValidation(_) => 13,
            Error::InvalidCircuit(_) => 20,
            Error::InvalidFault(_) => 21,
            Error::Diagnosis(_) => 30,
            Error::InconsistentEvidence(_) => 31,
            Error::Analysis(_) => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_)
            | Error::InvalidSettings(_)
            | Error::InvalidObservations(_)
            | Error::SchemaValidation(_) => ErrorCategory::Config,

            Error::InvalidCircuit(_) | Error::InvalidFault(_) => ErrorCategory::Circuit,

            Error::Diagnosis(_) | Error::InconsistentEvidence(_) => ErrorCategory::Diagnosis,

            Error::Analysis(_) => ErrorCategory::Analysis,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) | Error::SchemaValidation(_) => {
                "Run 'fd-core check' to validate configuration files and their schema_version."
            }
            Error::InvalidSettings(_) => {
                "Check likelihood probabilities are in [0, 1] and prior entries are non-negative."
            }
            Error::InvalidObservations(_) => {
                "Every observation must assign 0 or 1 to each primary input and output by name."
            }
            Error::InvalidCircuit(_) => {
                "Fix the circuit description; run 'fd-core check --circuit <file>' to validate."
            }
            Error::InvalidFault(_) => "Faults are written NODE=0 or NODE=1 and must name an existing node.",
            Error::Diagnosis(_) => "Check the prior and observation set against the circuit.",
            Error::InconsistentEvidence(_) => {
                "No hypothesis explains the observations. Use a non-zero noise_prob or review the observations."
            }
            Error::Analysis(_) => "Check the test input set and, for posterior sensitivity, the observations.",
            Error::Io(_) => "Check that the file exists and is readable.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq . <file>'.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidSettings(_) => "Invalid Settings",
            Error::InvalidObservations(_) => "Invalid Observations",
            Error::SchemaValidation(_) => "Schema Validation Failed",
            Error::InvalidCircuit(_) => "Invalid Circuit",
            Error::InvalidFault(_) => "Invalid Fault",
            Error::Diagnosis(_) => "Diagnosis Error",
            Error::InconsistentEvidence(_) => "Inconsistent Evidence",
            Error::Analysis(_) => "Analysis Error",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
        }
    }
}

/// Structured error for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    pub category: ErrorCategory,

    pub message: String,

    /// Additional structured context (e.g., file path).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            context: HashMap::new(),
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
