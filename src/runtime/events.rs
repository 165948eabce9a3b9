//! Change events recorded for every committed mutation.
//!
//! A [`ChangeEvent`] is built exactly once per successful `set_mode`,
//! `set_param` or `set_params_bulk`, then appended to the audit log and
//! published on the bus.  It is never modified afterwards.

use core::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;

use super::modes::Mode;
use super::params::{Param, ParamSet};

/// Which kind of mutation produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    StateChange,
    ParamChange,
    ParamChangeBulk,
}

impl EventKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StateChange => "state_change",
            Self::ParamChange => "param_change",
            Self::ParamChangeBulk => "param_change_bulk",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mode plus a parameter set, as shown in `prev` / `next`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateView {
    pub mode: Mode,
    pub params: ParamSet,
}

/// Extra, mutation-specific information.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChangeDetails {
    #[serde(rename_all = "camelCase")]
    Param {
        param: Param,
        /// Value as requested by the caller, before clamping.
        value: f64,
        clamped_applied: bool,
    },
    Bulk {
        changed: Vec<Param>,
        clamped: Vec<Param>,
    },
}

/// Immutable audit record of one committed change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    pub ts: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub cause: String,
    /// Store version after the change.
    pub version: u64,
    pub prev: StateView,
    pub next: StateView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ChangeDetails>,
}

impl ChangeEvent {
    /// One-line JSON digest for the audit log output.
    pub fn audit_line(&self) -> String {
        json!({
            "ts": self.ts.to_rfc3339_opts(SecondsFormat::Millis, true),
            "type": self.kind,
            "cause": self.cause,
            "version": self.version,
            "prevMode": self.prev.mode,
            "nextMode": self.next.mode,
            "details": self.details,
        })
        .to_string()
    }
}
