//! Port traits: the hexagonal boundary between the simulator core and
//! the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ SimulationService / RuntimeStore
//! ```
//!
//! Driven adapters (clock, backend sender, session client) implement these
//! traits.  The core consumes them through trait objects or generics, so
//! nothing inside `runtime` or `app` ever performs I/O directly.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::TelemetryError;
use crate::runtime::events::ChangeEvent;
use crate::sensors::SensorReading;

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: wall clock → domain)
// ───────────────────────────────────────────────────────────────

/// Wall-clock source for change timestamps.
///
/// Shared between the control listener thread and the tick loop, hence
/// `Send + Sync`.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

// ───────────────────────────────────────────────────────────────
// Telemetry port (driven adapter: domain → backend)
// ───────────────────────────────────────────────────────────────

/// Outbound telemetry.  Implementations decide whether readings go to an
/// HTTP backend or to the console.
pub trait TelemetryPort {
    /// Forward one sensor reading.
    fn send_reading(&mut self, reading: &SensorReading) -> Result<(), TelemetryError>;

    /// Forward one runtime change event.
    fn send_change(&mut self, event: &ChangeEvent) -> Result<(), TelemetryError>;
}

// ───────────────────────────────────────────────────────────────
// Session port (driven adapter: domain ↔ backend sessions)
// ───────────────────────────────────────────────────────────────

/// Descriptive metadata attached when a cleaning session starts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMeta {
    pub scenario: String,
    pub mode: String,
    pub interval_ms: u64,
}

/// Opens and closes cleaning sessions on the backend.
pub trait SessionPort {
    /// Start a session and return its backend-assigned id.
    fn start_session(&mut self, panel_id: &str, meta: &SessionMeta)
    -> Result<String, TelemetryError>;

    /// Close a session.  Best effort: callers log and ignore failures.
    fn stop_session(&mut self, session_id: &str) -> Result<(), TelemetryError>;
}
