//! Core math modules.

pub mod bayes_factor;
pub mod distribution;
pub mod stable;
