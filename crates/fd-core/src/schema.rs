//! JSON Schema generation for CLI output and input file types.
//!
//! ```bash
//! fd-core schema --list
//! fd-core schema PosteriorReport
//! fd-core schema --all
//! ```

use std::collections::BTreeMap;

use schemars::schema_for;
use serde_json::Value;

pub use crate::analysis::{NodeSensitivity, SensitivityReport};
pub use crate::inference::{EvidenceTerm, PosteriorReport, RankedHypothesis};
pub use crate::pipeline::{CheckReport, DemoReport};
pub use crate::simulate::{NodeDiff, SimulationReport};
pub use fd_config::{CircuitDescription, ConfigSnapshot, DiagnosisSettings, ObservationSet};

/// Schema names with one-line descriptions.
pub fn available_schemas() -> Vec<(&'static str, &'static str)> {
    vec![
        // Input files
        ("CircuitDescription", "Circuit file: nodes, gates and outputs"),
        ("DiagnosisSettings", "Settings file: likelihood, prior and sensitivity options"),
        ("ObservationSet", "Observation file: named input and output values"),
        // Reports
        ("SimulationReport", "Per-vector traces with faulty outputs and affected nodes"),
        ("NodeDiff", "A node whose value differs between healthy and faulty runs"),
        ("PosteriorReport", "Ranked posterior over single-fault hypotheses"),
        ("RankedHypothesis", "One hypothesis in a posterior report"),
        ("EvidenceTerm", "One observation's contribution to a diagnosis"),
        ("SensitivityReport", "Per-node sensitivity scores and ranking"),
        ("NodeSensitivity", "Sensitivity detail for one node"),
        ("DemoReport", "Simulation, diagnosis and sensitivity of one run"),
        ("CheckReport", "Validation summary of circuit, settings and observations"),
        ("ConfigSnapshot", "Hashes and sources of the inputs a report used"),
    ]
}

/// Schema for `type_name`, or `None` if the name is unknown.
pub fn generate_schema(type_name: &str) -> Option<Value> {
    let schema = match type_name {
        "CircuitDescription" => schema_for!(CircuitDescription),
        "DiagnosisSettings" => schema_for!(DiagnosisSettings),
        "ObservationSet" => schema_for!(ObservationSet),
        "SimulationReport" => schema_for!(SimulationReport),
        "NodeDiff" => schema_for!(NodeDiff),
        "PosteriorReport" => schema_for!(PosteriorReport),
        "RankedHypothesis" => schema_for!(RankedHypothesis),
        "EvidenceTerm" => schema_for!(EvidenceTerm),
        "SensitivityReport" => schema_for!(SensitivityReport),
        "NodeSensitivity" => schema_for!(NodeSensitivity),
        "DemoReport" => schema_for!(DemoReport),
        "CheckReport" => schema_for!(CheckReport),
        "ConfigSnapshot" => schema_for!(ConfigSnapshot),
        _ => return None,
    };
    serde_json::to_value(schema).ok()
}

pub fn generate_all_schemas() -> BTreeMap<String, Value> {
    available_schemas()
        .into_iter()
        .filter_map(|(name, _)| generate_schema(name).map(|s| (name.to_string(), s)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_listed_schemas_generate() {
        for (name, _) in available_schemas() {
            assert!(generate_schema(name).is_some(), "schema for {name} should generate");
        }
        assert_eq!(generate_all_schemas().len(), available_schemas().len());
    }

    #[test]
    fn unknown_schema() {
        assert!(generate_schema("Plan").is_none());
        assert!(generate_schema("").is_none());
    }

    #[test]
    fn posterior_schema_lists_fields() {
        let schema = generate_schema("PosteriorReport").unwrap();
        let props = schema["properties"].as_object().unwrap();
        for field in ["map_hypothesis", "confidence", "ranked", "evidence"] {
            assert!(props.contains_key(field), "missing {field}");
        }
    }
}
