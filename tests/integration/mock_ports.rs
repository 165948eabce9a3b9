//! Mock telemetry and session adapter for integration tests.
//!
//! Records every outbound call so tests can assert on the full history
//! without a network.  Failures can be switched on per call kind.

use panelbot::app::ports::{SessionMeta, SessionPort, TelemetryPort};
use panelbot::error::TelemetryError;
use panelbot::runtime::ChangeEvent;
use panelbot::sensors::SensorReading;

// ── Outbound call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum PortCall {
    Reading { version: u64, session_id: String },
    Change { version: u64 },
    StartSession { panel_id: String, scenario: String },
    StopSession { session_id: String },
}

// ── MockBackend ───────────────────────────────────────────────

pub struct MockBackend {
    pub calls: Vec<PortCall>,
    pub readings: Vec<SensorReading>,
    pub changes: Vec<ChangeEvent>,
    pub fail_readings: bool,
    pub fail_changes: bool,
    pub fail_sessions: bool,
    next_session: u32,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            readings: Vec::new(),
            changes: Vec::new(),
            fail_readings: false,
            fail_changes: false,
            fail_sessions: false,
            next_session: 1,
        }
    }

    pub fn change_versions(&self) -> Vec<u64> {
        self.changes.iter().map(|e| e.version).collect()
    }

    pub fn count(&self, pred: impl Fn(&PortCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl TelemetryPort for MockBackend {
    fn send_reading(&mut self, reading: &SensorReading) -> Result<(), TelemetryError> {
        self.calls.push(PortCall::Reading {
            version: reading.version,
            session_id: reading.session_id.clone(),
        });
        if self.fail_readings {
            return Err(TelemetryError::Rejected { status: 503 });
        }
        self.readings.push(reading.clone());
        Ok(())
    }

    fn send_change(&mut self, event: &ChangeEvent) -> Result<(), TelemetryError> {
        self.calls.push(PortCall::Change {
            version: event.version,
        });
        if self.fail_changes {
            return Err(TelemetryError::Rejected { status: 500 });
        }
        self.changes.push(event.clone());
        Ok(())
    }
}

impl SessionPort for MockBackend {
    fn start_session(
        &mut self,
        panel_id: &str,
        meta: &SessionMeta,
    ) -> Result<String, TelemetryError> {
        self.calls.push(PortCall::StartSession {
            panel_id: panel_id.to_owned(),
            scenario: meta.scenario.clone(),
        });
        if self.fail_sessions {
            return Err(TelemetryError::MissingSessionId);
        }
        let id = format!("mock-session-{}", self.next_session);
        self.next_session += 1;
        Ok(id)
    }

    fn stop_session(&mut self, session_id: &str) -> Result<(), TelemetryError> {
        self.calls.push(PortCall::StopSession {
            session_id: session_id.to_owned(),
        });
        if self.fail_sessions {
            return Err(TelemetryError::Rejected { status: 404 });
        }
        Ok(())
    }
}
