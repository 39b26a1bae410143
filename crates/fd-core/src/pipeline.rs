//! Loading inputs and running the three stages end to end.
//!
//! Each loader keeps the raw JSON it read so the CLI can hash it into a
//! [`ConfigSnapshot`].

use std::path::{Path, PathBuf};

use fd_common::Error;
use fd_config::{
    resolve_settings, CircuitDescription, ConfigSnapshot, ConfigSource, DiagnosisSettings,
    ObservationSet, SnapshotSources,
};
use schemars::JsonSchema;
use serde::Serialize;
use tracing::{debug, info};

use crate::analysis::{analyze, SensitivityConfig, SensitivityReport};
use crate::circuit::Circuit;
use crate::error::{ConfigFile, ConfigurationError};
use crate::inference::{diagnose, HypothesisSet, LikelihoodModel, Observation, PosteriorReport};
use crate::simulate::{exhaustive_inputs, Fault, SimulationReport};

/// Fault the demo run injects for its simulation stage.
pub const DEMO_FAULT: &str = "N1=1";

#[derive(Debug, Clone)]
pub struct LoadedCircuit {
    pub circuit: Circuit,
    /// `None` for the built-in demo circuit.
    pub path: Option<PathBuf>,
    pub json: String,
}

impl LoadedCircuit {
    pub fn is_demo(&self) -> bool {
        self.path.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: DiagnosisSettings,
    pub path: Option<PathBuf>,
    pub json: Option<String>,
    pub source: ConfigSource,
}

impl LoadedSettings {
    pub fn model(&self) -> Result<LikelihoodModel, Error> {
        LikelihoodModel::from_params(&self.settings.likelihood)
            .map_err(|e| e.into_common(ConfigFile::Settings))
    }
}

#[derive(Debug, Clone)]
pub struct LoadedObservations {
    pub observations: Vec<Observation>,
    pub path: Option<PathBuf>,
    pub json: String,
}

/// File contents, read once so the parsed and the hashed bytes agree.
fn read_input(path: &Path, file: ConfigFile) -> Result<String, Error> {
    fd_config::read_file(path).map_err(|e| ConfigurationError::from(e).into_common(file))
}

/// Read and validate a circuit file, or use the demo circuit.
pub fn load_circuit(path: Option<&Path>) -> Result<LoadedCircuit, Error> {
    let (desc, json) = match path {
        Some(p) => {
            let json = read_input(p, ConfigFile::Circuit)?;
            let desc = CircuitDescription::from_str(&json)
                .map_err(|e| ConfigurationError::from(e).into_common(ConfigFile::Circuit))?;
            (desc, json)
        }
        None => {
            let desc = CircuitDescription::demo();
            let json = serde_json::to_string(&desc)?;
            (desc, json)
        }
    };
    let circuit = Circuit::from_description(&desc).map_err(|e| e.into_common(ConfigFile::Circuit))?;
    info!(
        circuit = circuit.name(),
        nodes = circuit.len(),
        path = ?path,
        "circuit loaded"
    );
    Ok(LoadedCircuit {
        circuit,
        path: path.map(Path::to_path_buf),
        json,
    })
}

/// Resolve the settings file (CLI, environment, XDG, defaults) and load it.
pub fn load_settings(cli_path: Option<&Path>) -> Result<LoadedSettings, Error> {
    let resolved = resolve_settings(cli_path);
    match resolved.settings {
        Some(p) => {
            let json = read_input(&p, ConfigFile::Settings)?;
            let settings = DiagnosisSettings::from_str(&json)
                .map_err(|e| ConfigurationError::from(e).into_common(ConfigFile::Settings))?;
            info!(path = %p.display(), source = %resolved.settings_source, "settings loaded");
            Ok(LoadedSettings {
                settings,
                path: Some(p),
                json: Some(json),
                source: resolved.settings_source,
            })
        }
        None => {
            debug!("no settings file found; using defaults");
            Ok(LoadedSettings {
                settings: DiagnosisSettings::default(),
                path: None,
                json: None,
                source: ConfigSource::BuiltinDefault,
            })
        }
    }
}

/// Read observations for `circuit`. Without a path, the demo observations
/// are used, which only fit the demo circuit.
pub fn load_observations(path: Option<&Path>, loaded: &LoadedCircuit) -> Result<LoadedObservations, Error> {
    let (set, json) = match path {
        Some(p) => {
            let json = read_input(p, ConfigFile::Observations)?;
            let set = ObservationSet::from_str(&json)
                .map_err(|e| ConfigurationError::from(e).into_common(ConfigFile::Observations))?;
            (set, json)
        }
        None if loaded.is_demo() => {
            let set = ObservationSet::demo();
            let json = serde_json::to_string(&set)?;
            (set, json)
        }
        None => {
            return Err(Error::Config(
                "--observations is required with a custom circuit".to_string(),
            ))
        }
    };
    let observations =
        Observation::from_set(&loaded.circuit, &set).map_err(|e| e.into_common(ConfigFile::Observations))?;
    info!(count = observations.len(), "observations loaded");
    Ok(LoadedObservations {
        observations,
        path: path.map(Path::to_path_buf),
        json,
    })
}

/// Hypothesis set from the settings' prior section.
pub fn hypotheses_for(circuit: &Circuit, settings: &DiagnosisSettings) -> Result<HypothesisSet, Error> {
    HypothesisSet::from_settings(circuit, settings).map_err(|e| e.into_common(ConfigFile::Settings))
}

/// Provenance of a run.
pub fn snapshot(
    circuit: &LoadedCircuit,
    settings: &LoadedSettings,
    observations: Option<&LoadedObservations>,
) -> ConfigSnapshot {
    let circuit_path = circuit.path.as_ref().map(|p| p.display().to_string());
    let settings_path = settings.path.as_ref().map(|p| p.display().to_string());
    let observations_path = observations
        .and_then(|o| o.path.as_ref())
        .map(|p| p.display().to_string());
    ConfigSnapshot::new(
        &settings.settings,
        &SnapshotSources {
            circuit_path: circuit_path.as_deref(),
            circuit_json: &circuit.json,
            settings_path: settings_path.as_deref(),
            settings_json: settings.json.as_deref(),
            settings_source: settings.source,
            observations_path: observations_path.as_deref(),
            observations_json: observations.map(|o| o.json.as_str()),
        },
    )
}

/// All three stages on one circuit.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DemoReport {
    pub simulation: SimulationReport,
    pub diagnosis: PosteriorReport,
    pub sensitivity: SensitivityReport,
}

/// Simulate `fault` over every input vector, diagnose `observations`, and
/// run the configured sensitivity sweep.
pub fn run_all(
    circuit: &Circuit,
    settings: &DiagnosisSettings,
    fault: Fault,
    observations: &[Observation],
) -> Result<DemoReport, Error> {
    let vectors = exhaustive_inputs(circuit.inputs().len())?;
    let simulation = SimulationReport::run(circuit, Some(fault), &vectors)?;

    let model = LikelihoodModel::from_params(&settings.likelihood)
        .map_err(|e| e.into_common(ConfigFile::Settings))?;
    let hypotheses = hypotheses_for(circuit, settings)?;
    let diagnosis = diagnose(circuit, hypotheses.clone(), model, observations)?;

    let config = SensitivityConfig::from_settings(settings).with_vectors(vectors);
    let sensitivity = analyze(circuit, &config, &hypotheses, model)?;

    info!(
        map = %diagnosis.map_hypothesis,
        most_sensitive = ?sensitivity.ranking.first(),
        "pipeline finished"
    );
    Ok(DemoReport {
        simulation,
        diagnosis,
        sensitivity,
    })
}

/// The demonstration run: demo circuit, N1 stuck-at-1 simulation, the demo
/// prior and observations.
pub fn run_demo() -> Result<DemoReport, Error> {
    let circuit = load_circuit(None)?.circuit;
    let fault = Fault::parse(&circuit, DEMO_FAULT)?;
    let observations = Observation::from_set(&circuit, &ObservationSet::demo())
        .map_err(|e| e.into_common(ConfigFile::Observations))?;
    run_all(&circuit, &DiagnosisSettings::demo(), fault, &observations)
}

/// Result of validating a set of input files.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CheckReport {
    pub circuit: String,
    pub nodes: usize,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    /// Nodes with no path to a primary output; their faults are invisible.
    pub unobservable: Vec<String>,
    pub settings_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings_path: Option<String>,
    pub hypotheses: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observations: Option<usize>,
}

/// Load and validate everything a diagnosis would use, without running it.
pub fn check(
    circuit_path: Option<&Path>,
    settings_path: Option<&Path>,
    observations_path: Option<&Path>,
) -> Result<CheckReport, Error> {
    let loaded = load_circuit(circuit_path)?;
    let settings = load_settings(settings_path)?;
    settings.model()?;
    let hypotheses = hypotheses_for(&loaded.circuit, &settings.settings)?;
    let observations = match observations_path {
        Some(p) => Some(load_observations(Some(p), &loaded)?.observations.len()),
        None => None,
    };
    let circuit = &loaded.circuit;
    Ok(CheckReport {
        circuit: circuit.name().to_string(),
        nodes: circuit.len(),
        inputs: circuit.input_names().iter().map(|s| s.to_string()).collect(),
        outputs: circuit.output_names().iter().map(|s| s.to_string()).collect(),
        unobservable: circuit
            .nodes()
            .filter(|(id, _)| !circuit.reaches_output(*id))
            .map(|(_, n)| n.name().to_string())
            .collect(),
        settings_source: settings.source.to_string(),
        settings_path: settings.path.map(|p| p.display().to_string()),
        hypotheses: hypotheses.len(),
        observations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fd_config::snapshot::hash_content;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn demo_pipeline() {
        let report = run_demo().unwrap();
        assert_eq!(report.diagnosis.map_hypothesis, "N1 stuck-at-0");
        assert_eq!(report.simulation.detecting_inputs, vec!["10".to_string()]);
        assert_eq!(report.sensitivity.ranking[0], "N3");
    }

    #[test]
    fn demo_circuit_is_default() {
        let loaded = load_circuit(None).unwrap();
        assert!(loaded.is_demo());
        assert_eq!(loaded.circuit.name(), "demo");
        let obs = load_observations(None, &loaded).unwrap();
        assert_eq!(obs.observations.len(), 2);
    }

    #[test]
    fn circuit_file_round_trip() {
        let json = serde_json::to_string(&CircuitDescription::demo()).unwrap();
        let f = write_temp(&json);
        let loaded = load_circuit(Some(f.path())).unwrap();
        assert!(!loaded.is_demo());
        assert_eq!(loaded.circuit.len(), 5);
        // A custom circuit needs explicit observations.
        assert!(matches!(load_observations(None, &loaded), Err(Error::Config(_))));
    }

    #[test]
    fn cyclic_circuit_file_is_invalid_circuit() {
        let f = write_temp(
            r#"{"schema_version":"1.0.0","name":"loop","nodes":[
                {"name":"A","gate":"INPUT"},
                {"name":"X","gate":"AND","inputs":["A","Y"]},
                {"name":"Y","gate":"OR","inputs":["A","X"]}],
              "outputs":["Y"]}"#,
        );
        let err = load_circuit(Some(f.path())).unwrap_err();
        assert!(matches!(err, Error::InvalidCircuit(_)), "{err:?}");
    }

    #[test]
    fn missing_circuit_file_is_io() {
        let err = load_circuit(Some(Path::new("/nonexistent/circuit.json"))).unwrap_err();
        assert!(matches!(err, Error::Io(_)), "{err:?}");
    }

    #[test]
    fn check_demo_defaults() {
        let report = check(None, None, None).unwrap();
        assert_eq!(report.circuit, "demo");
        assert_eq!(report.nodes, 5);
        assert!(report.unobservable.is_empty());
        assert!(report.observations.is_none());
    }

    #[test]
    fn check_rejects_bad_settings() {
        let f = write_temp(r#"{"schema_version":"1.0.0","likelihood":{"match_prob":0.1,"noise_prob":0.5}}"#);
        let err = check(None, Some(f.path()), None).unwrap_err();
        assert!(matches!(err, Error::InvalidSettings(_)), "{err:?}");
    }

    #[test]
    fn snapshot_hashes_the_bytes_parsed() {
        let json = format!("{}\n\n", serde_json::to_string_pretty(&CircuitDescription::demo()).unwrap());
        let circuit_file = write_temp(&json);
        let settings_file = write_temp(r#"{"schema_version": "1.0.0"}"#);
        let circuit = load_circuit(Some(circuit_file.path())).unwrap();
        let settings = load_settings(Some(settings_file.path())).unwrap();
        assert_eq!(circuit.json, json);

        let snap = snapshot(&circuit, &settings, None);
        assert_eq!(snap.circuit_hash, hash_content(&json));
        assert_eq!(
            snap.settings_hash.as_deref(),
            Some(hash_content(r#"{"schema_version": "1.0.0"}"#).as_str())
        );
    }

    #[test]
    fn snapshot_hashes_loaded_files() {
        let circuit = load_circuit(None).unwrap();
        let settings = LoadedSettings {
            settings: DiagnosisSettings::default(),
            path: None,
            json: None,
            source: ConfigSource::BuiltinDefault,
        };
        let obs = load_observations(None, &circuit).unwrap();
        let a = snapshot(&circuit, &settings, Some(&obs));
        let b = snapshot(&circuit, &settings, Some(&obs));
        assert!(a.same_inputs(&b));
        assert!(a.observations_hash.is_some());
        assert!(a.settings_hash.is_none());
        assert_eq!(a.settings_source, "builtin default");
    }
}
