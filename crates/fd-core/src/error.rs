//! Error types for circuit construction, simulation and diagnosis.
//!
//! [`ConfigurationError`] covers everything that is wrong with the inputs
//! before any inference happens: topology, fault specifications, priors,
//! likelihood parameters and observation shapes. [`DiagnosisError`] adds the
//! one failure that can only be discovered while updating the posterior.
//!
//! Both fold into [`fd_common::Error`] at the command-line boundary.

use fd_config::ValidationError;
use thiserror::Error;

use crate::circuit::GateKind;

/// Invalid circuit, fault, prior or observation input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error(transparent)]
    Validation(#[from] ValidationErrorRepr),

    #[error("duplicate node name '{0}'")]
    DuplicateNode(String),

    #[error("node '{node}' has unknown gate kind '{gate}'")]
    UnknownGate { node: String, gate: String },

    #[error("node '{node}' ({gate}) takes {expected} inputs, got {actual}")]
    InvalidArity {
        node: String,
        gate: GateKind,
        expected: &'static str,
        actual: usize,
    },

    #[error("node '{node}' reads from undefined node '{missing}'")]
    DanglingEdge { node: String, missing: String },

    #[error("output '{0}' is not a node of the circuit")]
    UnknownOutput(String),

    #[error("output '{0}' is listed more than once")]
    DuplicateOutput(String),

    #[error("cycle detected through nodes {}", .nodes.join(", "))]
    Cycle { nodes: Vec<String> },

    #[error("unknown node '{0}'")]
    UnknownNode(String),

    #[error("invalid fault specification '{spec}': {reason}")]
    InvalidFault { spec: String, reason: String },

    #[error("expected {expected} {what} values, got {actual}")]
    WidthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("observation {index}: {message}")]
    InvalidObservation { index: usize, message: String },

    #[error("invalid prior for {hypothesis}: {message}")]
    InvalidPrior { hypothesis: String, message: String },

    #[error("hypothesis set is empty")]
    EmptyHypothesisSet,

    #[error("invalid likelihood model: {0}")]
    InvalidLikelihood(String),

    #[error("exhaustive input set for {inputs} inputs exceeds the {max}-input limit")]
    TooManyInputs { inputs: usize, max: usize },

    #[error("invalid input vector '{text}': {reason}")]
    InvalidInputVector { text: String, reason: String },

    #[error("sensitivity analysis needs at least one test input vector")]
    EmptyTestSet,
}

/// Cloneable rendering of a [`ValidationError`].
///
/// `ValidationError` is not `Clone`, so its code and message are kept.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ValidationErrorRepr {
    pub code: u32,
    pub message: String,
    pub kind: ValidationKind,
}

/// Coarse kind of a file-level validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    Io,
    Parse,
    Version,
    Semantic,
}

impl From<ValidationError> for ValidationErrorRepr {
    fn from(err: ValidationError) -> Self {
        let kind = match &err {
            ValidationError::IoError(_) => ValidationKind::Io,
            ValidationError::ParseError(_) => ValidationKind::Parse,
            ValidationError::VersionMismatch { .. } => ValidationKind::Version,
            ValidationError::SemanticError(_) | ValidationError::InvalidValue { .. } => {
                ValidationKind::Semantic
            }
        };
        ValidationErrorRepr {
            code: err.code(),
            message: err.to_string(),
            kind,
        }
    }
}

impl From<ValidationError> for ConfigurationError {
    fn from(err: ValidationError) -> Self {
        ConfigurationError::Validation(err.into())
    }
}

/// Failure while updating or reading the posterior.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiagnosisError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Every hypothesis assigns zero likelihood to an observation.
    #[error("no hypothesis explains observation {index} (all likelihoods are zero)")]
    InconsistentEvidence { index: usize },
}

/// Which configuration file a validation failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFile {
    Circuit,
    Settings,
    Observations,
}

impl ConfigurationError {
    /// Convert into the unified error, attributing file-level failures to
    /// `file`.
    pub fn into_common(self, file: ConfigFile) -> fd_common::Error {
        use fd_common::Error;
        let message = self.to_string();
        match self {
            ConfigurationError::Validation(repr) => match repr.kind {
                ValidationKind::Io => Error::Io(std::io::Error::other(message)),
                ValidationKind::Parse => Error::Config(message),
                ValidationKind::Version => Error::SchemaValidation(message),
                ValidationKind::Semantic => match file {
                    ConfigFile::Circuit => Error::InvalidCircuit(message),
                    ConfigFile::Settings => Error::InvalidSettings(message),
                    ConfigFile::Observations => Error::InvalidObservations(message),
                },
            },
            ConfigurationError::UnknownNode(_) | ConfigurationError::InvalidFault { .. } => {
                Error::InvalidFault(message)
            }
            ConfigurationError::WidthMismatch { .. }
            | ConfigurationError::InvalidObservation { .. }
            | ConfigurationError::InvalidInputVector { .. } => Error::InvalidObservations(message),
            ConfigurationError::InvalidPrior { .. }
            | ConfigurationError::EmptyHypothesisSet
            | ConfigurationError::InvalidLikelihood(_) => Error::InvalidSettings(message),
            ConfigurationError::TooManyInputs { .. } | ConfigurationError::EmptyTestSet => {
                Error::Analysis(message)
            }
            ConfigurationError::DuplicateNode(_)
            | ConfigurationError::UnknownGate { .. }
            | ConfigurationError::InvalidArity { .. }
            | ConfigurationError::DanglingEdge { .. }
            | ConfigurationError::UnknownOutput(_)
            | ConfigurationError::DuplicateOutput(_)
            | ConfigurationError::Cycle { .. } => Error::InvalidCircuit(message),
        }
    }
}

impl From<ConfigurationError> for fd_common::Error {
    fn from(err: ConfigurationError) -> Self {
        err.into_common(ConfigFile::Circuit)
    }
}

impl From<DiagnosisError> for fd_common::Error {
    fn from(err: DiagnosisError) -> Self {
        match err {
            DiagnosisError::Configuration(inner) => inner.into_common(ConfigFile::Settings),
            other @ DiagnosisError::InconsistentEvidence { .. } => {
                fd_common::Error::InconsistentEvidence(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_lists_nodes() {
        let err = ConfigurationError::Cycle {
            nodes: vec!["G1".to_string(), "G2".to_string()],
        };
        assert_eq!(err.to_string(), "cycle detected through nodes G1, G2");
    }

    #[test]
    fn validation_errors_keep_code_and_kind() {
        let err: ConfigurationError = ValidationError::VersionMismatch {
            expected: "1.0.0".to_string(),
            actual: "2.0.0".to_string(),
        }
        .into();
        let common = err.into_common(ConfigFile::Settings);
        assert_eq!(common.code(), 13);
    }

    #[test]
    fn semantic_errors_attributed_to_file() {
        let err: ConfigurationError =
            ValidationError::SemanticError("bad".to_string()).into();
        assert_eq!(err.clone().into_common(ConfigFile::Circuit).code(), 20);
        assert_eq!(err.clone().into_common(ConfigFile::Settings).code(), 11);
        assert_eq!(err.into_common(ConfigFile::Observations).code(), 12);
    }

    #[test]
    fn topology_errors_map_to_invalid_circuit() {
        let err: fd_common::Error = ConfigurationError::DanglingEdge {
            node: "G".to_string(),
            missing: "X".to_string(),
        }
        .into();
        assert_eq!(err.code(), 20);
        assert!(err.to_string().contains("undefined node 'X'"));
    }

    #[test]
    fn inconsistent_evidence_maps_to_diagnosis_category() {
        let err: fd_common::Error = DiagnosisError::InconsistentEvidence { index: 2 }.into();
        assert_eq!(err.code(), 31);
        assert_eq!(err.category(), fd_common::ErrorCategory::Diagnosis);
    }

    #[test]
    fn unknown_node_maps_to_invalid_fault() {
        let err: fd_common::Error = ConfigurationError::UnknownNode("Z".to_string()).into();
        assert_eq!(err.code(), 21);
    }
}
