//! Command dispatcher: shape validation, optimistic concurrency, delegation.
//!
//! ```text
//!  JSON body ──▶ WireCommand ──validate()──▶ ValidatedCommand ──apply()──▶ CommandOutcome
//!                                 │                               │
//!                          ValidationError                VersionConflict
//!                          Unsupported                    CapabilityError
//! ```
//!
//! Validation is pure and runs before the store lock is taken.  `apply`
//! checks `expectedVersion` and mutates under the same lock, so the check
//! and the write cannot be interleaved with another writer.

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::events::StateView;
use super::modes::Mode;
use super::params::Param;
use super::store::{ClampNote, Commit, RuntimeStore};
use crate::error::CommandError;

// ---------------------------------------------------------------------------
// Wire shape
// ---------------------------------------------------------------------------

/// A command as received from the control listener.  Every field is kept
/// loosely typed so that a wrong type becomes a validation error naming the
/// field, not a JSON parse failure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCommand {
    #[serde(rename = "type")]
    pub kind: Option<Value>,
    pub cause: Option<Value>,
    pub state: Option<Value>,
    pub param: Option<Value>,
    pub value: Option<Value>,
    pub params: Option<Value>,
    pub expected_version: Option<Value>,
}

/// Parsed intent of a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetState {
        mode: Mode,
        /// The identifier as sent, kept to report an unknown-mode fallback.
        requested: String,
    },
    SetParam {
        param: Param,
        value: f64,
    },
    SetParamsBulk(Vec<(Param, f64)>),
    Pause,
    Resume,
}

/// A command that passed shape validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCommand {
    pub command: Command,
    pub cause: String,
    pub expected_version: Option<u64>,
}

/// Successful command result, serialised as the `200` response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcome {
    pub accepted_at: DateTime<Utc>,
    pub applied_at: DateTime<Utc>,
    pub version: u64,
    pub prev: StateView,
    pub next: StateView,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "core::ops::Not::not")]
    pub clamped_changed: bool,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl WireCommand {
    /// Check shape and decode every field.  Order: `cause`, `type`, then the
    /// type-specific fields, then `expectedVersion`.
    pub fn validate(&self) -> Result<ValidatedCommand, CommandError> {
        let cause = match self.cause.as_ref().and_then(Value::as_str).map(str::trim) {
            Some(c) if !c.is_empty() => c.to_owned(),
            _ => return Err(CommandError::validation("cause", "cause is required")),
        };

        // Missing, null or blank is a validation error; any other non-string
        // value names a command type nobody knows.
        let kind = match &self.kind {
            Some(Value::String(k)) if !k.trim().is_empty() => k.trim().to_ascii_uppercase(),
            None | Some(Value::Null | Value::String(_)) => {
                return Err(CommandError::validation("type", "type is required"));
            }
            Some(other) => return Err(CommandError::Unsupported(other.to_string())),
        };

        let command = match kind.as_str() {
            "SET_STATE" => {
                let requested = required_str(self.state.as_ref(), "state")?;
                Command::SetState {
                    mode: Mode::parse_or_regular(Some(requested)),
                    requested: requested.to_owned(),
                }
            }
            "SET_PARAM" => {
                let name = required_str(self.param.as_ref(), "param")?;
                let param = parse_param(name, "param")?;
                let value = required_number(self.value.as_ref(), "value")?;
                Command::SetParam { param, value }
            }
            "SET_PARAMS_BULK" => Command::SetParamsBulk(parse_bulk(self.params.as_ref())?),
            "PAUSE" => Command::Pause,
            "RESUME" => Command::Resume,
            _ => return Err(CommandError::Unsupported(kind)),
        };

        let expected_version = match &self.expected_version {
            None | Some(Value::Null) => None,
            Some(v) => Some(v.as_u64().ok_or_else(|| {
                CommandError::validation("expectedVersion", "must be a non-negative integer")
            })?),
        };

        Ok(ValidatedCommand {
            command,
            cause,
            expected_version,
        })
    }
}

fn required_str<'a>(value: Option<&'a Value>, field: &str) -> Result<&'a str, CommandError> {
    match value.and_then(Value::as_str).map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s),
        Some(_) | None => Err(CommandError::validation(field, format!("{field} is required"))),
    }
}

fn required_number(value: Option<&Value>, field: &str) -> Result<f64, CommandError> {
    let v = value
        .filter(|v| !v.is_null())
        .ok_or_else(|| CommandError::validation(field, format!("{field} is required")))?;
    match v.as_f64() {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(CommandError::validation(field, "must be a finite number")),
    }
}

fn parse_param(name: &str, field: &str) -> Result<Param, CommandError> {
    Param::from_name(name)
        .ok_or_else(|| CommandError::validation(field, format!("unknown parameter `{name}`")))
}

fn parse_bulk(raw: Option<&Value>) -> Result<Vec<(Param, f64)>, CommandError> {
    let map = match raw {
        Some(Value::Object(map)) => map,
        Some(Value::Null) | None => {
            return Err(CommandError::validation("params", "params is required"));
        }
        Some(_) => return Err(CommandError::validation("params", "must be an object")),
    };
    if map.is_empty() {
        return Err(CommandError::validation("params", "at least one parameter is required"));
    }

    let mut changes = Vec::with_capacity(map.len());
    for (name, value) in map {
        let field = format!("params.{name}");
        let param = parse_param(name, &field)?;
        let value = required_number(Some(value), &field)?;
        changes.push((param, value));
    }
    Ok(changes)
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Apply a validated command.  Rejections leave `store` untouched.
pub fn apply(
    store: &mut RuntimeStore,
    cmd: ValidatedCommand,
    accepted_at: DateTime<Utc>,
) -> Result<CommandOutcome, CommandError> {
    if let Some(expected) = cmd.expected_version {
        let current = store.version();
        if expected != current {
            return Err(CommandError::VersionConflict { expected, current });
        }
    }

    let mut warnings = Vec::new();
    let commit = match cmd.command {
        Command::SetState { mode, requested } => {
            if Mode::parse(&requested).is_none() {
                warn!("dispatcher: unknown state `{requested}`, falling back to {mode}");
                warnings.push(format!("unknown state `{requested}`, using {mode}"));
            }
            store.set_mode(mode, &cmd.cause)
        }
        Command::SetParam { param, value } => store.set_param(param, value, &cmd.cause)?,
        Command::SetParamsBulk(changes) => store.set_params_bulk(&changes, &cmd.cause)?,
        Command::Pause => store.set_mode(Mode::Idle, &cmd.cause),
        Command::Resume => store.set_mode(Mode::Regular, &cmd.cause),
    };

    Ok(outcome(commit, accepted_at, warnings))
}

/// Validate then apply in one step.
pub fn dispatch(
    store: &mut RuntimeStore,
    wire: &WireCommand,
    accepted_at: DateTime<Utc>,
) -> Result<CommandOutcome, CommandError> {
    let cmd = wire.validate()?;
    apply(store, cmd, accepted_at)
}

fn outcome(
    commit: Commit,
    accepted_at: DateTime<Utc>,
    mut warnings: Vec<String>,
) -> CommandOutcome {
    warnings.extend(commit.clamped.iter().map(clamp_warning));
    CommandOutcome {
        accepted_at,
        applied_at: commit.applied_at,
        version: commit.version,
        prev: commit.prev,
        next: commit.next,
        clamped_changed: !commit.clamped.is_empty(),
        warnings,
    }
}

fn clamp_warning(note: &ClampNote) -> String {
    format!("{} clamped from {} to {}", note.param, note.requested, note.applied)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::adapters::time::ManualClock;
    use crate::app::ports::Clock;
    use crate::runtime::capability::CapabilitySet;

    fn wire(v: Value) -> WireCommand {
        serde_json::from_value(v).unwrap()
    }

    fn store() -> RuntimeStore {
        RuntimeStore::new(
            Mode::Regular,
            CapabilitySet::all(),
            Arc::new(ManualClock::at_epoch()),
        )
    }

    fn now() -> DateTime<Utc> {
        ManualClock::at_epoch().now()
    }

    fn field_of(err: CommandError) -> String {
        match err {
            CommandError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn cause_is_checked_first() {
        let err = wire(json!({"type": "NOPE"})).validate().unwrap_err();
        assert_eq!(field_of(err), "cause");
        let err = wire(json!({"type": "PAUSE", "cause": "   "})).validate().unwrap_err();
        assert_eq!(field_of(err), "cause");
    }

    #[test]
    fn missing_type_is_validation_unknown_is_unsupported() {
        let err = wire(json!({"cause": "x"})).validate().unwrap_err();
        assert_eq!(field_of(err), "type");
        let err = wire(json!({"cause": "x", "type": "SELF_DESTRUCT"})).validate().unwrap_err();
        assert_eq!(err, CommandError::Unsupported("SELF_DESTRUCT".into()));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn non_string_type_is_unsupported() {
        for kind in [json!(42), json!(true), json!({}), json!(["PAUSE"])] {
            let raw = kind.to_string();
            let mut s = store();
            let err = dispatch(&mut s, &wire(json!({"cause": "x", "type": kind})), now())
                .unwrap_err();
            assert_eq!(err, CommandError::Unsupported(raw));
            assert_eq!(err.status_code(), 400);
            assert_eq!(s.version(), 0);
        }
        let err = wire(json!({"cause": "x", "type": null})).validate().unwrap_err();
        assert_eq!(field_of(err), "type");
        let err = wire(json!({"cause": "x", "type": "  "})).validate().unwrap_err();
        assert_eq!(field_of(err), "type");
    }

    #[test]
    fn type_matching_ignores_case() {
        let cmd = wire(json!({"cause": "x", "type": "pause"})).validate().unwrap();
        assert_eq!(cmd.command, Command::Pause);
    }

    #[test]
    fn set_param_requires_known_param_and_finite_value() {
        let err = wire(json!({"cause": "x", "type": "SET_PARAM", "value": 1.0}))
            .validate()
            .unwrap_err();
        assert_eq!(field_of(err), "param");

        let err = wire(json!({"cause": "x", "type": "SET_PARAM", "param": "warpDrive", "value": 1}))
            .validate()
            .unwrap_err();
        assert_eq!(field_of(err), "param");

        let err = wire(json!({"cause": "x", "type": "SET_PARAM", "param": "robotSpeed", "value": "fast"}))
            .validate()
            .unwrap_err();
        assert_eq!(field_of(err), "value");
    }

    #[test]
    fn bulk_rejects_empty_and_unknown_keys() {
        let err = wire(json!({"cause": "x", "type": "SET_PARAMS_BULK", "params": {}}))
            .validate()
            .unwrap_err();
        assert_eq!(field_of(err), "params");

        let err = wire(json!({"cause": "x", "type": "SET_PARAMS_BULK", "params": {"robotSpeed": 1, "bogus": 2}}))
            .validate()
            .unwrap_err();
        assert_eq!(field_of(err), "params.bogus");
    }

    #[test]
    fn expected_version_must_be_unsigned_integer() {
        let err = wire(json!({"cause": "x", "type": "PAUSE", "expectedVersion": -1}))
            .validate()
            .unwrap_err();
        assert_eq!(field_of(err), "expectedVersion");
        let cmd = wire(json!({"cause": "x", "type": "PAUSE", "expectedVersion": 0}))
            .validate()
            .unwrap();
        assert_eq!(cmd.expected_version, Some(0));
    }

    #[test]
    fn stale_version_conflicts_without_mutation() {
        let mut s = store();
        for _ in 0..4 {
            dispatch(&mut s, &wire(json!({"cause": "warm", "type": "RESUME"})), now()).unwrap();
        }
        let before = s.snapshot();
        let err = dispatch(
            &mut s,
            &wire(json!({"cause": "x", "type": "PAUSE", "expectedVersion": 3})),
            now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CommandError::VersionConflict {
                expected: 3,
                current: 4
            }
        );
        assert_eq!(err.status_code(), 409);
        assert_eq!(s.snapshot(), before);
    }

    #[test]
    fn matching_version_applies() {
        let mut s = store();
        let out = dispatch(
            &mut s,
            &wire(json!({"cause": "x", "type": "SET_STATE", "state": "RIGOROUS", "expectedVersion": 0})),
            now(),
        )
        .unwrap();
        assert_eq!(out.version, 1);
        assert_eq!(out.next.mode, Mode::Rigorous);
        assert!(out.warnings.is_empty());
        assert!(!out.clamped_changed);
    }

    #[test]
    fn clamping_is_reported_not_rejected() {
        let mut s = store();
        let out = dispatch(
            &mut s,
            &wire(json!({"cause": "operator", "type": "SET_PARAM", "param": "vacuumPower", "value": 5.0})),
            now(),
        )
        .unwrap();
        assert!(out.clamped_changed);
        assert_eq!(out.warnings, ["vacuumPower clamped from 5 to 1"]);
        assert_eq!(out.next.params[Param::VacuumPower], 1.0);

        let body = serde_json::to_value(&out).unwrap();
        assert_eq!(body["clampedChanged"], true);
    }

    #[test]
    fn unknown_state_falls_back_with_warning() {
        let mut s = store();
        s.set_mode(Mode::Light, "setup");
        let out = dispatch(
            &mut s,
            &wire(json!({"cause": "x", "type": "SET_STATE", "state": "TURBO"})),
            now(),
        )
        .unwrap();
        assert_eq!(out.next.mode, Mode::Regular);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn pause_and_resume_are_mode_sugar() {
        let mut s = store();
        let out = dispatch(&mut s, &wire(json!({"cause": "x", "type": "PAUSE"})), now()).unwrap();
        assert_eq!(out.next.mode, Mode::Idle);
        let out = dispatch(&mut s, &wire(json!({"cause": "x", "type": "RESUME"})), now()).unwrap();
        assert_eq!(out.prev.mode, Mode::Idle);
        assert_eq!(out.next.mode, Mode::Regular);
    }

    #[test]
    fn capability_error_maps_to_422() {
        let mut s = RuntimeStore::new(
            Mode::Regular,
            CapabilitySet {
                has_brush: false,
                ..CapabilitySet::all()
            },
            Arc::new(ManualClock::at_epoch()),
        );
        let err = dispatch(
            &mut s,
            &wire(json!({"cause": "x", "type": "SET_PARAMS_BULK", "params": {"robotSpeed": 1.0, "brushRpm": 800}})),
            now(),
        )
        .unwrap_err();
        assert_eq!(err.status_code(), 422);
        assert!(matches!(err, CommandError::Capability(_)));
        assert_eq!(s.version(), 0);
    }
}
