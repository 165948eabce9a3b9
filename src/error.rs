//! Unified error types for the PanelBot simulator.
//!
//! Every subsystem has its own small error enum with a manual `Display`.
//! Command rejections additionally know their HTTP status code and JSON
//! body, which the control listener returns as-is.

use core::fmt;

use serde_json::{Value, json};

use crate::runtime::capability::Capability;
use crate::runtime::params::Param;

// ---------------------------------------------------------------------------
// Capability errors
// ---------------------------------------------------------------------------

/// A parameter change needs an actuator this robot does not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityError {
    pub param: Param,
    pub missing: Capability,
}

impl fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actuator {} is not available", self.missing)
    }
}

impl std::error::Error for CapabilityError {}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

/// Rejection of an external command.  Never retried internally; the state
/// store is untouched whenever one of these is returned.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// A mandatory field is missing or malformed.
    Validation { field: String, reason: String },
    /// A gated parameter needs an unavailable actuator.
    Capability(CapabilityError),
    /// `expectedVersion` did not match the live version.
    VersionConflict { expected: u64, current: u64 },
    /// The command `type` is not one the dispatcher knows.
    Unsupported(String),
}

impl CommandError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status the control listener answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } | Self::Capability(_) => 422,
            Self::VersionConflict { .. } => 409,
            Self::Unsupported(_) => 400,
        }
    }

    /// JSON error body for the control listener.
    pub fn to_body(&self) -> Value {
        match self {
            Self::Validation { field, reason } => json!({
                "error": "validation error",
                "field": field,
                "details": reason,
                "code": self.status_code(),
            }),
            Self::Capability(e) => json!({
                "error": "capability error",
                "details": { "param": e.param.name(), "reason": e.to_string() },
                "code": self.status_code(),
            }),
            Self::VersionConflict { expected, current } => json!({
                "error": "version conflict",
                "expectedVersion": expected,
                "currentVersion": current,
                "code": self.status_code(),
            }),
            Self::Unsupported(kind) => json!({
                "error": "unsupported command",
                "details": format!("unknown command type `{kind}`"),
                "code": self.status_code(),
            }),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { field, reason } => write!(f, "invalid `{field}`: {reason}"),
            Self::Capability(e) => write!(f, "cannot set {}: {e}", e.param),
            Self::VersionConflict { expected, current } => {
                write!(f, "version conflict: expected {expected}, current {current}")
            }
            Self::Unsupported(kind) => write!(f, "unsupported command type `{kind}`"),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<CapabilityError> for CommandError {
    fn from(e: CapabilityError) -> Self {
        Self::Capability(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    Io(std::io::Error),
    /// The config file is not valid JSON for [`SystemConfig`](crate::config::SystemConfig).
    Parse(serde_json::Error),
    /// A field failed range validation.  The text names the field.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Parse(e) => write!(f, "parse error: {e}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::ValidationFailed(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Telemetry errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum TelemetryError {
    /// Transport-level failure (DNS, connect, timeout, body decode).
    Transport(reqwest::Error),
    /// The backend answered with a non-success status.
    Rejected { status: u16 },
    /// The backend answered without a usable session id.
    MissingSessionId,
    /// A configured backend URL could not be parsed.
    InvalidUrl(String),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Rejected { status } => write!(f, "backend rejected request with {status}"),
            Self::MissingSessionId => write!(f, "backend response had no sessionId"),
            Self::InvalidUrl(url) => write!(f, "invalid backend URL `{url}`"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TelemetryError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Subscriber errors
// ---------------------------------------------------------------------------

/// Failure reported by an event-bus subscriber.  Isolated by the bus and
/// never propagated to the mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberError(pub String);

impl fmt::Display for SubscriberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for SubscriberError {}
