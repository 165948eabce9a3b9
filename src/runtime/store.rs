//! Runtime state store: the single owner of the robot's commanded state.
//!
//! ```text
//!  set_mode / set_param / set_params_bulk        advance(elapsed_ms)
//!            │                                          │
//!            ▼                                          ▼
//!  ┌────────────────────────────────────────────────────────────┐
//!  │ mode · current · target · version · last change · cause    │
//!  └───────────────┬────────────────────────────────────────────┘
//!                  │ every commit
//!                  ▼
//!        ChangeEvent ──▶ audit log (50) ──▶ EventBus subscribers
//! ```
//!
//! Mutations either fully commit (version +1, one event) or are rejected
//! before anything is written.  The store is not internally synchronised;
//! share it through [`SharedRuntime`](super::SharedRuntime).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

use super::bus::{AUDIT_CAPACITY, AuditLog, EventBus, EventSubscriber, SubscriptionId, Topic};
use super::capability::{CapabilitySet, check_capability};
use super::convergence;
use super::events::{ChangeDetails, ChangeEvent, EventKind, StateView};
use super::limits::clamp;
use super::modes::{Mode, preset_for};
use super::params::{Param, ParamSet};
use crate::app::ports::Clock;
use crate::error::CapabilityError;

/// How many audit entries a snapshot carries.
pub const SNAPSHOT_RECENT_CHANGES: usize = 20;

/// A requested value that was silently pulled into range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampNote {
    pub param: Param,
    pub requested: f64,
    pub applied: f64,
}

/// Result of a committed mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub version: u64,
    pub applied_at: DateTime<Utc>,
    /// Mode and *applied* parameters before the change.
    pub prev: StateView,
    /// Mode and *target* parameters after the change.
    pub next: StateView,
    pub clamped: Vec<ClampNote>,
}

/// Read-only projection served to the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeSnapshot {
    pub version: u64,
    pub mode: Mode,
    pub params: ParamSet,
    pub target_params: ParamSet,
    pub last_change_ts: DateTime<Utc>,
    pub cause: Option<String>,
    pub recent_changes: Vec<ChangeEvent>,
}

/// Owner of mode, current/target parameters, version and audit trail.
pub struct RuntimeStore {
    mode: Mode,
    current: ParamSet,
    target: ParamSet,
    version: u64,
    last_change_ts: DateTime<Utc>,
    cause: Option<String>,
    capabilities: CapabilitySet,
    audit: AuditLog,
    bus: EventBus,
    clock: Arc<dyn Clock>,
}

impl RuntimeStore {
    /// Start in `mode` with its preset as both current and target, version 0.
    pub fn new(mode: Mode, capabilities: CapabilitySet, clock: Arc<dyn Clock>) -> Self {
        let preset = preset_for(mode);
        info!("runtime: starting in {mode} with {capabilities:?}");
        Self {
            mode,
            current: preset,
            target: preset,
            version: 0,
            last_change_ts: clock.now(),
            cause: None,
            capabilities,
            audit: AuditLog::new(),
            bus: EventBus::new(),
            clock,
        }
    }

    // ── Mutations ─────────────────────────────────────────────

    /// Switch mode.  The whole target set is replaced by the mode preset,
    /// discarding any per-parameter overrides; current values converge on
    /// later ticks.
    pub fn set_mode(&mut self, mode: Mode, cause: &str) -> Commit {
        let prev = self.applied_view();
        self.mode = mode;
        self.target = preset_for(mode);
        self.commit(EventKind::StateChange, cause, prev, None, Vec::new())
    }

    /// Set one target parameter, clamped into range.
    pub fn set_param(
        &mut self,
        param: Param,
        value: f64,
        cause: &str,
    ) -> Result<Commit, CapabilityError> {
        check_capability(param, &self.capabilities)?;

        let prev = self.applied_view();
        let applied = clamp(param, value);
        self.target.set(param, applied);

        let clamped_applied = applied != value;
        let notes = if clamped_applied {
            vec![ClampNote {
                param,
                requested: value,
                applied,
            }]
        } else {
            Vec::new()
        };
        let details = ChangeDetails::Param {
            param,
            value,
            clamped_applied,
        };
        Ok(self.commit(EventKind::ParamChange, cause, prev, Some(details), notes))
    }

    /// Set several target parameters at once.  Every key is capability
    /// checked and clamped before anything is written; a single rejection
    /// leaves the store untouched.  Later duplicates win.
    pub fn set_params_bulk(
        &mut self,
        changes: &[(Param, f64)],
        cause: &str,
    ) -> Result<Commit, CapabilityError> {
        for &(param, _) in changes {
            check_capability(param, &self.capabilities)?;
        }

        let mut staged = self.target;
        let mut changed: Vec<Param> = Vec::with_capacity(changes.len());
        let mut notes: Vec<ClampNote> = Vec::new();
        for &(param, requested) in changes {
            let applied = clamp(param, requested);
            staged.set(param, applied);
            if !changed.contains(&param) {
                changed.push(param);
            }
            notes.retain(|n| n.param != param);
            if applied != requested {
                notes.push(ClampNote {
                    param,
                    requested,
                    applied,
                });
            }
        }

        let prev = self.applied_view();
        self.target = staged;
        let details = ChangeDetails::Bulk {
            changed,
            clamped: notes.iter().map(|n| n.param).collect(),
        };
        Ok(self.commit(EventKind::ParamChangeBulk, cause, prev, Some(details), notes))
    }

    // ── Convergence ───────────────────────────────────────────

    /// Move applied parameters toward their targets by `elapsed_ms`.
    pub fn advance(&mut self, elapsed_ms: i64) {
        convergence::advance(&mut self.current, &self.target, elapsed_ms);
    }

    /// Advance, then return the applied parameters for a sensor reading.
    pub fn params_for_tick(&mut self, elapsed_ms: i64) -> ParamSet {
        self.advance(elapsed_ms);
        self.current
    }

    // ── Subscribers ───────────────────────────────────────────

    /// Register a change subscriber.  Subscribers run while the store is
    /// borrowed and must not call back into it.
    pub fn subscribe(
        &mut self,
        topic: impl Into<Topic>,
        subscriber: impl EventSubscriber + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe(topic, subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Subscriber failures isolated so far.
    pub fn delivery_failures(&self) -> u64 {
        self.bus.failure_count()
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn current(&self) -> ParamSet {
        self.current
    }

    pub fn target(&self) -> ParamSet {
        self.target
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn last_change_ts(&self) -> DateTime<Utc> {
        self.last_change_ts
    }

    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Consistent copy of the observable state.
    pub fn snapshot(&self) -> RuntimeSnapshot {
        RuntimeSnapshot {
            version: self.version,
            mode: self.mode,
            params: self.current,
            target_params: self.target,
            last_change_ts: self.last_change_ts,
            cause: self.cause.clone(),
            recent_changes: self.audit.recent(SNAPSHOT_RECENT_CHANGES),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn applied_view(&self) -> StateView {
        StateView {
            mode: self.mode,
            params: self.current,
        }
    }

    fn commit(
        &mut self,
        kind: EventKind,
        cause: &str,
        prev: StateView,
        details: Option<ChangeDetails>,
        clamped: Vec<ClampNote>,
    ) -> Commit {
        let ts = self.clock.now();
        self.version += 1;
        self.last_change_ts = ts;
        self.cause = Some(cause.to_owned());

        let next = StateView {
            mode: self.mode,
            params: self.target,
        };
        let event = ChangeEvent {
            ts,
            kind,
            cause: cause.to_owned(),
            version: self.version,
            prev,
            next,
            details,
        };

        info!(target: "audit", "[audit] {}", event.audit_line());
        self.audit.append(event.clone());
        debug_assert!(self.audit.len() <= AUDIT_CAPACITY);

        for failure in self.bus.publish(&event) {
            warn!(
                "runtime: subscriber {:?} on {:?} failed for v{}: {}",
                failure.subscription, failure.topic, event.version, failure.error
            );
        }

        Commit {
            version: self.version,
            applied_at: ts,
            prev,
            next,
            clamped,
        }
    }
}
