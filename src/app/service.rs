//! Simulation service: the session orchestrator.
//!
//! [`SimulationService`] owns the telemetry generator and a handle to the
//! shared runtime.  It exposes a clean, transport-agnostic API.  All I/O
//! flows through port traits injected at call sites, making the entire
//! service testable with mock adapters.
//!
//! ```text
//!                 ┌──────────────────────────┐
//!  SessionPort ◀──│    SimulationService     │──▶ TelemetryPort
//!                 │ generator · change queue │
//!                 └────────────┬─────────────┘
//!                              │ params_for_tick
//!                              ▼
//!                        SharedRuntime
//! ```

use log::{info, warn};
use uuid::Uuid;

use crate::adapters::change_queue::{ChangeQueue, change_queue};
use crate::config::SystemConfig;
use crate::runtime::{SharedRuntime, SubscriptionId, Topic};
use crate::sensors::{Scenario, SensorReading, TelemetryGenerator, TickState};

use super::ports::{SessionMeta, SessionPort, TelemetryPort};

/// Counters for the end-of-session summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceStats {
    pub ticks: u64,
    pub readings_failed: u64,
    pub changes_forwarded: u64,
    pub changes_failed: u64,
}

// ───────────────────────────────────────────────────────────────
// SimulationService
// ───────────────────────────────────────────────────────────────

pub struct SimulationService {
    runtime: SharedRuntime,
    generator: TelemetryGenerator,
    changes: ChangeQueue,
    subscription: Option<SubscriptionId>,
    panel_id: String,
    interval_ms: u64,
    session_id: Option<String>,
    stats: ServiceStats,
}

impl SimulationService {
    /// Build the generator from `config` and subscribe the change queue on
    /// the catch-all topic.
    ///
    /// Does **not** open a session; call [`start`](Self::start) next.
    pub fn new(config: &SystemConfig, runtime: SharedRuntime) -> Self {
        let generator = TelemetryGenerator::new(
            config.panel_id.clone(),
            config.location,
            config.scenario,
            config.seed,
        );
        let (forwarder, changes) = change_queue();
        let subscription = runtime.subscribe(Topic::Any, forwarder);
        Self {
            runtime,
            generator,
            changes,
            subscription: Some(subscription),
            panel_id: config.panel_id.clone(),
            interval_ms: config.interval_ms,
            session_id: None,
            stats: ServiceStats::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Open a backend session.  When the backend is unreachable the
    /// session continues under a locally generated id.
    pub fn start(&mut self, sessions: &mut impl SessionPort) -> &str {
        let meta = SessionMeta {
            scenario: self.generator.scenario().key().to_owned(),
            mode: self.runtime.snapshot().mode.to_string(),
            interval_ms: self.interval_ms,
        };
        let id = match sessions.start_session(&self.panel_id, &meta) {
            Ok(id) => id,
            Err(e) => {
                let local = Uuid::new_v4().to_string();
                warn!("Session start failed ({e}); continuing as {local}");
                local
            }
        };
        info!(
            "Session {id} started: scenario {} ({})",
            self.generator.scenario(),
            self.generator.scenario().label()
        );
        self.session_id.insert(id)
    }

    /// Close the session, flushing queued change events first.
    ///
    /// The `port` parameter satisfies **both** [`SessionPort`] and
    /// [`TelemetryPort`], as one backend adapter usually serves both.
    pub fn finish(&mut self, port: &mut (impl SessionPort + TelemetryPort)) -> ServiceStats {
        self.forward_changes(port);
        if let Some(id) = self.subscription.take() {
            self.runtime.unsubscribe(id);
        }
        if let Some(id) = self.session_id.take() {
            if let Err(e) = port.stop_session(&id) {
                warn!("Session {id} stop failed: {e}");
            }
            info!("Session {id} finished after {} ticks", self.stats.ticks);
        }
        self.stats
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One telemetry cycle: forward changes → converge → sample → send.
    pub fn tick(&mut self, elapsed_ms: i64, sink: &mut impl TelemetryPort) -> SensorReading {
        self.stats.ticks += 1;

        // 1. Forward change events committed since the last tick
        self.forward_changes(sink);

        // 2. Converge and capture state under one lock
        let state = self.runtime.with_store(|store| {
            let params = store.params_for_tick(elapsed_ms);
            TickState {
                mode: store.mode(),
                version: store.version(),
                params,
            }
        });

        // 3. Sample sensors
        let now = self.runtime.clock().now();
        let session_id = self.session_id.as_deref().unwrap_or_default();
        let reading = self.generator.generate(now, session_id, state);

        // 4. Send
        if let Err(e) = sink.send_reading(&reading) {
            self.stats.readings_failed += 1;
            warn!("Reading {} not delivered: {e}", self.stats.ticks);
        }
        reading
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn scenario(&self) -> Scenario {
        self.generator.scenario()
    }

    pub fn stats(&self) -> ServiceStats {
        self.stats
    }

    pub fn runtime(&self) -> &SharedRuntime {
        &self.runtime
    }

    // ── Internal ──────────────────────────────────────────────

    fn forward_changes(&mut self, sink: &mut impl TelemetryPort) {
        for event in self.changes.drain() {
            match sink.send_change(&event) {
                Ok(()) => self.stats.changes_forwarded += 1,
                Err(e) => {
                    self.stats.changes_failed += 1;
                    warn!("Change v{} not delivered: {e}", event.version);
                }
            }
        }
    }
}
