//! Fault diagnosis configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for circuit.json, settings.json and observations.json
//! - Settings resolution (CLI → env → XDG → defaults)
//! - Schema and semantic validation
//! - Config snapshots for report provenance

pub mod circuit;
pub mod observations;
pub mod resolve;
pub mod settings;
pub mod snapshot;
pub mod validate;

pub use circuit::{CircuitDescription, NodeSpec};
pub use observations::{ObservationSet, ObservationSpec};
pub use resolve::{resolve_settings, ConfigPaths, ConfigSource};
pub use settings::{
    DiagnosisSettings, LikelihoodParams, PriorOverride, PriorPolicy, PriorSpec,
    SensitivityMetricKind, SensitivitySettings,
};
pub use snapshot::{ConfigSnapshot, SnapshotSources};
pub use validate::{ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Read a file into a string, mapping failures to [`ValidationError::IoError`].
pub fn read_file(path: &std::path::Path) -> ValidationResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e)))
}
