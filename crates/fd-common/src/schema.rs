//! Report schema versioning.

/// Version of the JSON report payloads emitted by the CLI.
///
/// Bumped whenever a field is renamed or removed from a report type.
pub const SCHEMA_VERSION: &str = "1.0.0";
