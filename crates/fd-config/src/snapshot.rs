//! Configuration snapshots for report provenance.
//!
//! A snapshot records exactly which circuit, settings and observations a
//! report was computed from, so a result can be reproduced later.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolve::ConfigSource;
use crate::settings::DiagnosisSettings;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    pub schema_version: String,

    /// Path the circuit was loaded from (None for the built-in circuit).
    #[serde(default)]
    pub circuit_path: Option<String>,

    /// SHA-256 of the circuit JSON as loaded or serialized.
    pub circuit_hash: String,

    #[serde(default)]
    pub settings_path: Option<String>,

    #[serde(default)]
    pub settings_hash: Option<String>,

    pub settings_source: String,

    #[serde(default)]
    pub observations_path: Option<String>,

    #[serde(default)]
    pub observations_hash: Option<String>,

    /// Combined hash of all inputs (for quick comparison).
    pub combined_hash: String,

    pub summary: SettingsSummary,
}

/// Key settings values for quick reference.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SettingsSummary {
    pub match_prob: f64,
    pub noise_prob: f64,
    pub prior_policy: String,
    pub include_no_fault: bool,
    pub prior_override_count: usize,
}

/// Raw inputs to a snapshot.
#[derive(Debug, Default)]
pub struct SnapshotSources<'a> {
    pub circuit_path: Option<&'a str>,
    pub circuit_json: &'a str,
    pub settings_path: Option<&'a str>,
    pub settings_json: Option<&'a str>,
    pub settings_source: ConfigSource,
    pub observations_path: Option<&'a str>,
    pub observations_json: Option<&'a str>,
}

impl ConfigSnapshot {
    pub fn new(settings: &DiagnosisSettings, sources: &SnapshotSources<'_>) -> Self {
        let circuit_hash = hash_content(sources.circuit_json);
        let settings_hash = sources.settings_json.map(hash_content);
        let observations_hash = sources.observations_json.map(hash_content);

        let combined = format!(
            "{}:{}:{}",
            circuit_hash,
            settings_hash.as_deref().unwrap_or("none"),
            observations_hash.as_deref().unwrap_or("none")
        );

        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            circuit_path: sources.circuit_path.map(str::to_string),
            circuit_hash,
            settings_path: sources.settings_path.map(str::to_string),
            settings_hash,
            settings_source: sources.settings_source.to_string(),
            observations_path: sources.observations_path.map(str::to_string),
            observations_hash,
            combined_hash: hash_content(&combined),
            summary: SettingsSummary {
                match_prob: settings.likelihood.match_prob,
                noise_prob: settings.likelihood.noise_prob,
                prior_policy: settings.prior_policy.to_string(),
                include_no_fault: settings.prior.include_no_fault,
                prior_override_count: settings.prior.overrides.len(),
            },
        }
    }

    /// Check whether two snapshots were built from identical inputs.
    pub fn same_inputs(&self, other: &ConfigSnapshot) -> bool {
        self.combined_hash == other.combined_hash
    }
}

/// Lowercase hex SHA-256 of a string.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
