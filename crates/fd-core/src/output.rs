//! Payload formatting for the CLI.
//!
//! Reports are plain serializable data; this module turns them into the
//! three `--format` renditions. JSON output wraps the report in an
//! [`Envelope`] carrying run metadata and the config snapshot.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use fd_common::{OutputFormat, SCHEMA_VERSION};
use fd_config::ConfigSnapshot;
use serde::Serialize;

use crate::analysis::SensitivityReport;
use crate::inference::PosteriorReport;
use crate::pipeline::{CheckReport, DemoReport};
use crate::simulate::SimulationReport;

/// Markdown and one-line renditions of a report.
pub trait Render {
    fn to_markdown(&self) -> String;
    fn summary(&self) -> String;
}

/// JSON wrapper around a command result.
#[derive(Debug, Serialize)]
pub struct Envelope<'a, T: Serialize> {
    pub schema_version: &'static str,
    pub run_id: &'a str,
    pub command: &'a str,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<&'a ConfigSnapshot>,
    pub result: &'a T,
}

impl<'a, T: Serialize> Envelope<'a, T> {
    pub fn new(run_id: &'a str, command: &'a str, result: &'a T) -> Self {
        Envelope {
            schema_version: SCHEMA_VERSION,
            run_id,
            command,
            generated_at: Utc::now(),
            config: None,
            result,
        }
    }

    pub fn with_config(mut self, config: &'a ConfigSnapshot) -> Self {
        self.config = Some(config);
        self
    }
}

/// Format `envelope.result` for stdout.
pub fn format_payload<T: Serialize + Render>(
    envelope: &Envelope<'_, T>,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(envelope),
        OutputFormat::Md => Ok(envelope.result.to_markdown()),
        OutputFormat::Summary => Ok(envelope.result.summary()),
    }
}

impl Render for SimulationReport {
    fn to_markdown(&self) -> String {
        let mut out = format!("# Simulation: {}\n\n", self.circuit);
        if let Some(f) = &self.fault {
            let _ = writeln!(out, "Fault: **{} stuck-at-{}**\n", f.node, f.stuck_at);
        }
        let _ = writeln!(
            out,
            "| {} | {} |{}",
            self.inputs.join(""),
            self.outputs.join(","),
            if self.fault.is_some() { " faulty | changed nodes |" } else { "" }
        );
        let _ = writeln!(out, "|---|---|{}", if self.fault.is_some() { "---|---|" } else { "" });
        for run in &self.runs {
            let _ = write!(out, "| {} | {} |", run.inputs, run.outputs);
            if let Some(faulty) = &run.faulty_outputs {
                let changed: Vec<&str> = run.diffs.iter().map(|d| d.node.as_str()).collect();
                let _ = write!(out, " {} | {} |", faulty, changed.join(", "));
            }
            out.push('\n');
        }
        if self.fault.is_some() {
            let _ = writeln!(
                out,
                "\nDetected by: {}\n\nAffected nodes: {}",
                list_or_none(&self.detecting_inputs),
                list_or_none(&self.affected_nodes)
            );
        }
        out
    }

    fn summary(&self) -> String {
        match &self.fault {
            Some(f) if self.is_detected() => format!(
                "{}: {} stuck-at-{} detected by {} of {} vectors ({})",
                self.circuit,
                f.node,
                f.stuck_at,
                self.detecting_inputs.len(),
                self.runs.len(),
                self.detecting_inputs.join(" ")
            ),
            Some(f) => format!(
                "{}: {} stuck-at-{} undetected on {} vectors",
                self.circuit,
                f.node,
                f.stuck_at,
                self.runs.len()
            ),
            None => format!("{}: simulated {} vectors", self.circuit, self.runs.len()),
        }
    }
}

impl Render for PosteriorReport {
    fn to_markdown(&self) -> String {
        let mut out = format!("# Diagnosis: {}\n\n", self.circuit);
        let _ = writeln!(
            out,
            "Most likely: **{}** ({:.2}%, {} confidence) after {} observations\n",
            self.map_hypothesis,
            self.map_posterior * 100.0,
            self.confidence,
            self.observation_count
        );
        let _ = writeln!(
            out,
            "Entropy: {:.3} bits (prior {:.3}, max {:.3})\n",
            self.entropy_bits, self.prior_entropy_bits, self.max_entropy_bits
        );
        out.push_str("| # | Hypothesis | Prior | Posterior | Consistent | Bayes factor |\n");
        out.push_str("|---|---|---|---|---|---|\n");
        for r in &self.ranked {
            let bf = r
                .bayes_factor
                .as_ref()
                .map(|b| format!("{:+.1} bits ({})", b.delta_bits, b.strength))
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "| {} | {} | {:.4} | {:.4} | {}/{} | {} |",
                r.rank,
                r.hypothesis,
                r.prior,
                r.posterior,
                r.consistent_observations,
                self.observation_count,
                bf
            );
        }
        if !self.evidence.is_empty() {
            out.push_str("\n## Evidence\n\n");
            for e in &self.evidence {
                let _ = writeln!(
                    out,
                    "- {}{} -> {}: explained by {}",
                    e.label.as_ref().map(|l| format!("{}: ", l)).unwrap_or_default(),
                    e.inputs,
                    e.outputs,
                    list_or_none(&e.consistent)
                );
            }
        }
        out
    }

    fn summary(&self) -> String {
        format!(
            "{}: {} ({:.2}%, {} confidence, {} observations)",
            self.circuit,
            self.map_hypothesis,
            self.map_posterior * 100.0,
            self.confidence,
            self.observation_count
        )
    }
}

impl Render for SensitivityReport {
    fn to_markdown(&self) -> String {
        let mut out = format!("# Sensitivity: {}\n\n", self.circuit);
        let _ = writeln!(out, "Metric: {} over {} test vectors\n", self.metric, self.test_vectors);
        out.push_str("| Node | Gate | Score | sa0 | sa1 | Observable |\n");
        out.push_str("|---|---|---|---|---|---|\n");
        for n in &self.nodes {
            let _ = writeln!(
                out,
                "| {} | {} | {:.4} | {:.4} | {:.4} | {} |",
                n.node,
                n.gate,
                n.score,
                n.stuck_at_0,
                n.stuck_at_1,
                if n.observable { "yes" } else { "no" }
            );
        }
        out
    }

    fn summary(&self) -> String {
        let top: Vec<String> = self
            .nodes
            .iter()
            .take(3)
            .map(|n| format!("{}={:.3}", n.node, n.score))
            .collect();
        format!("{}: {} top {}", self.circuit, self.metric, top.join(" "))
    }
}

impl Render for DemoReport {
    fn to_markdown(&self) -> String {
        [
            self.simulation.to_markdown(),
            self.diagnosis.to_markdown(),
            self.sensitivity.to_markdown(),
        ]
        .join("\n")
    }

    fn summary(&self) -> String {
        [
            self.simulation.summary(),
            self.diagnosis.summary(),
            self.sensitivity.summary(),
        ]
        .join("\n")
    }
}

impl Render for CheckReport {
    fn to_markdown(&self) -> String {
        let mut out = format!("# Check: {}\n\n", self.circuit);
        let _ = writeln!(out, "- nodes: {}", self.nodes);
        let _ = writeln!(out, "- inputs: {}", self.inputs.join(", "));
        let _ = writeln!(out, "- outputs: {}", self.outputs.join(", "));
        let _ = writeln!(out, "- unobservable: {}", list_or_none(&self.unobservable));
        let _ = writeln!(
            out,
            "- settings: {}{}",
            self.settings_source,
            self.settings_path.as_ref().map(|p| format!(" ({})", p)).unwrap_or_default()
        );
        let _ = writeln!(out, "- hypotheses: {}", self.hypotheses);
        if let Some(n) = self.observations {
            let _ = writeln!(out, "- observations: {}", n);
        }
        out
    }

    fn summary(&self) -> String {
        format!(
            "{}: ok ({} nodes, {} hypotheses, settings from {})",
            self.circuit, self.nodes, self.hypotheses, self.settings_source
        )
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::run_demo;

    #[test]
    fn demo_markdown_sections() {
        let report = run_demo().unwrap();
        let md = report.to_markdown();
        assert!(md.contains("# Simulation: demo"));
        assert!(md.contains("Fault: **N1 stuck-at-1**"));
        assert!(md.contains("# Diagnosis: demo"));
        assert!(md.contains("Most likely: **N1 stuck-at-0**"));
        assert!(md.contains("| N3 | OR |"));
    }

    #[test]
    fn summaries_are_single_lines() {
        let report = run_demo().unwrap();
        assert!(!report.simulation.summary().contains('\n'));
        assert_eq!(
            report.simulation.summary(),
            "demo: N1 stuck-at-1 detected by 1 of 4 vectors (10)"
        );
        assert!(report.diagnosis.summary().starts_with("demo: N1 stuck-at-0 (98."));
        assert!(report.sensitivity.summary().starts_with("demo: output_mismatch top N3=0.500"));
        assert_eq!(report.summary().lines().count(), 3);
    }

    #[test]
    fn json_envelope_fields() {
        let report = run_demo().unwrap();
        let env = Envelope::new("run-000000000000", "demo", &report);
        let text = format_payload(&env, OutputFormat::Json).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["schema_version"], SCHEMA_VERSION);
        assert_eq!(v["command"], "demo");
        assert!(v.get("config").is_none());
        assert_eq!(v["result"]["diagnosis"]["map_hypothesis"], "N1 stuck-at-0");
    }
}
