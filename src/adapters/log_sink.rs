//! Log-based telemetry adapter.
//!
//! Implements [`TelemetryPort`] and [`SessionPort`] by writing to the `log`
//! facade instead of the network.  Used for dry runs and whenever no
//! backend is configured.  Session ids are generated locally.

use log::info;
use uuid::Uuid;

use crate::app::ports::{SessionMeta, SessionPort, TelemetryPort};
use crate::error::TelemetryError;
use crate::runtime::{ChangeEvent, Param};
use crate::sensors::SensorReading;

/// Adapter that logs every reading and change to the console.
#[derive(Debug, Default)]
pub struct LogEventSink {
    readings: u64,
    changes: u64,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn readings_logged(&self) -> u64 {
        self.readings
    }

    pub fn changes_logged(&self) -> u64 {
        self.changes
    }
}

impl TelemetryPort for LogEventSink {
    fn send_reading(&mut self, r: &SensorReading) -> Result<(), TelemetryError> {
        self.readings += 1;
        info!(
            "TELEM | {} | mode={} v{} | T={:.2}\u{00b0}C H={:.2}% dust={:.2}% P={:.2}W \
             vib={:.3} risk={:.2} | ({:.6}, {:.6}) | speed={:.2} rpm={:.0}",
            r.panel_id,
            r.mode,
            r.version,
            r.temperature,
            r.humidity,
            r.dust_level,
            r.power_output,
            r.vibration,
            r.micro_fracture_risk,
            r.location.lat,
            r.location.lng,
            r.params[Param::RobotSpeed],
            r.params[Param::BrushRpm],
        );
        Ok(())
    }

    fn send_change(&mut self, e: &ChangeEvent) -> Result<(), TelemetryError> {
        self.changes += 1;
        info!(
            "CHANGE | v{} {} | {} -> {} | cause={}",
            e.version, e.kind, e.prev.mode, e.next.mode, e.cause
        );
        Ok(())
    }
}

impl SessionPort for LogEventSink {
    fn start_session(
        &mut self,
        panel_id: &str,
        meta: &SessionMeta,
    ) -> Result<String, TelemetryError> {
        let id = Uuid::new_v4().to_string();
        info!(
            "SESSION | start {id} panel={panel_id} scenario={} mode={} interval={}ms",
            meta.scenario, meta.mode, meta.interval_ms
        );
        Ok(id)
    }

    fn stop_session(&mut self, session_id: &str) -> Result<(), TelemetryError> {
        info!("SESSION | stop {session_id}");
        Ok(())
    }
}
