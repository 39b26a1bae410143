//! Node criticality analysis.

pub mod sensitivity;

pub use sensitivity::{
    analyze, output_sensitivity, posterior_sensitivity, NodeSensitivity, SensitivityConfig,
    SensitivityMetric, SensitivityReport,
};
