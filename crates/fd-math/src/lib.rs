//! Fault diagnosis math utilities.

pub mod math;

pub use math::bayes_factor;
pub use math::distribution::*;
pub use math::stable::*;
