//! Fault diagnosis common types and errors.
//!
//! This crate provides foundational types shared across the workspace:
//! - Unified error type with stable codes and categories
//! - Output format specifications
//! - Report schema versioning

pub mod error;
pub mod output;
pub mod schema;

pub use error::{format_error_human, Error, ErrorCategory, Result, StructuredError};
pub use output::OutputFormat;
pub use schema::SCHEMA_VERSION;
