//! Error types shared by the value store, the command dispatcher and the backdoor.

use thiserror::Error;

use crate::value::ValueKind;

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;

/// The kinds of addressable subsystem, used to report which lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsystemKind {
    Channel,
    Valve,
    PressureSensor,
    Probe,
}

impl std::fmt::Display for SubsystemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SubsystemKind::Channel => "channel",
            SubsystemKind::Valve => "valve",
            SubsystemKind::PressureSensor => "pressure sensor",
            SubsystemKind::Probe => "probe",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while reading or mutating the simulated device.
///
/// None of these are fatal: a failed operation leaves the device untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeviceError {
    /// The command or path could not be tokenised into a known shape.
    #[error("Malformed path '{input}': {reason}")]
    Parse { input: String, reason: &'static str },

    /// The grammar was valid but the index or name does not exist.
    #[error("No such {kind} '{id}'")]
    UnknownSubsystem { kind: SubsystemKind, id: String },

    /// The subsystem exists but has no such attribute.
    #[error("No such field '{path}'")]
    NotFound { path: String },

    /// The value is incompatible with the field's type.
    #[error("Field '{field}' expects {expected}, got '{found}'")]
    TypeMismatch {
        field: String,
        expected: ValueKind,
        found: String,
    },

    /// Heater percent power was requested while the heater range is zero.
    #[error("Heater range is zero, percent power is undefined")]
    DivisionByZero,

    /// The field is derived and cannot be written.
    #[error("Field '{field}' is read-only")]
    ReadOnly { field: String },

    /// A configuration value is out of its permitted range.
    #[error("Invalid configuration: {what}")]
    InvalidConfig { what: String },
}

impl DeviceError {
    /// Short upper-case tag used on the wire in `ERR:` responses.
    pub fn code(&self) -> &'static str {
        match self {
            DeviceError::Parse { .. } => "PARSE",
            DeviceError::UnknownSubsystem { .. } => "UNKNOWN_SUBSYSTEM",
            DeviceError::NotFound { .. } => "NOT_FOUND",
            DeviceError::TypeMismatch { .. } => "TYPE_MISMATCH",
            DeviceError::DivisionByZero => "DIVISION_BY_ZERO",
            DeviceError::ReadOnly { .. } => "READ_ONLY",
            DeviceError::InvalidConfig { .. } => "INVALID_CONFIG",
        }
    }

    pub(crate) fn parse(input: &str, reason: &'static str) -> Self {
        DeviceError::Parse {
            input: input.to_string(),
            reason,
        }
    }

    pub(crate) fn unknown(kind: SubsystemKind, id: impl Into<String>) -> Self {
        DeviceError::UnknownSubsystem {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        DeviceError::NotFound { path: path.into() }
    }
}
