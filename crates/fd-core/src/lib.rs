//! Stuck-at fault simulation, Bayesian fault diagnosis and sensitivity
//! analysis for small combinational circuits.
//!
//! - [`circuit`]: validated gate-level netlists
//! - [`simulate`]: fault injection, traces and healthy/faulty comparison
//! - [`inference`]: single-fault posterior over observed input/output pairs
//! - [`analysis`]: per-node sensitivity scores
//!
//! The binary entry point is in `main.rs`.

pub mod analysis;
pub mod circuit;
pub mod error;
pub mod exit_codes;
pub mod inference;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod schema;
pub mod simulate;

pub use circuit::{demo_circuit, Circuit, CircuitBuilder, GateKind, NodeId};
pub use error::{ConfigurationError, DiagnosisError};
pub use inference::{diagnose, Diagnoser, Hypothesis, HypothesisSet, LikelihoodModel, Observation};
pub use simulate::{simulate, Fault};
