//! Exit codes for the fd-core CLI.
//!
//! Ranges:
//! - 0-9: success and operational outcomes
//! - 10-19: user errors (bad files, arguments or evidence)
//! - 20-29: internal and I/O errors

use fd_common::Error;

/// Stable process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command completed.
    Clean = 0,

    /// `simulate` with a fault: some test vector exposes the fault.
    FaultDetected = 1,

    /// Invalid arguments or settings.
    ArgsError = 10,

    /// Circuit description or fault specification rejected.
    CircuitError = 11,

    /// Observation file rejected or observations explain nothing.
    EvidenceError = 12,

    /// `schema_version` does not match.
    VersionError = 13,

    /// Bug.
    InternalError = 20,

    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        (self as i32) < 10
    }

    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Map a unified error to its exit code.
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::Config(_) | Error::InvalidSettings(_) | Error::Analysis(_) => ExitCode::ArgsError,
            Error::SchemaValidation(_) => ExitCode::VersionError,
            Error::InvalidCircuit(_) | Error::InvalidFault(_) => ExitCode::CircuitError,
            Error::InvalidObservations(_) | Error::InconsistentEvidence(_) => ExitCode::EvidenceError,
            Error::Diagnosis(_) => ExitCode::InternalError,
            Error::Io(_) | Error::Json(_) => ExitCode::IoError,
        }
    }

    /// Name used in JSON output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::FaultDetected => "OK_DETECTED",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::CircuitError => "ERR_CIRCUIT",
            ExitCode::EvidenceError => "ERR_EVIDENCE",
            ExitCode::VersionError => "ERR_VERSION",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        ExitCode::from_error(err)
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
