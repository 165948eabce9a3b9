//! Integration tests: SimulationService → runtime → mock backend.

use std::sync::Arc;

use panelbot::adapters::time::ManualClock;
use panelbot::app::service::SimulationService;
use panelbot::config::SystemConfig;
use panelbot::runtime::{CapabilitySet, Mode, Param, SharedRuntime, WireCommand};
use panelbot::scheduler::{ScheduleDecision, SessionSchedule};
use panelbot::sensors::Scenario;
use serde_json::json;

use crate::mock_ports::{MockBackend, PortCall};

fn config() -> SystemConfig {
    SystemConfig {
        seed: Some(2024),
        scenario: Some(Scenario::DegradedPanel),
        panel_id: "PANEL-TEST".into(),
        ..SystemConfig::default()
    }
}

fn service() -> (SimulationService, SharedRuntime, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::at_epoch());
    let rt = SharedRuntime::new(Mode::Regular, CapabilitySet::all(), clock.clone());
    (SimulationService::new(&config(), rt.clone()), rt, clock)
}

fn cmd(v: serde_json::Value) -> WireCommand {
    serde_json::from_value(v).unwrap()
}

#[test]
fn session_lifecycle_hits_backend_in_order() {
    let (mut svc, _, _) = service();
    let mut backend = MockBackend::new();

    let id = svc.start(&mut backend).to_owned();
    assert_eq!(id, "mock-session-1");
    svc.tick(0, &mut backend);
    svc.tick(2000, &mut backend);
    let stats = svc.finish(&mut backend);

    assert_eq!(stats.ticks, 2);
    assert_eq!(
        backend.calls,
        [
            PortCall::StartSession {
                panel_id: "PANEL-TEST".into(),
                scenario: "degraded_panel".into()
            },
            PortCall::Reading { version: 0, session_id: id.clone() },
            PortCall::Reading { version: 0, session_id: id.clone() },
            PortCall::StopSession { session_id: id },
        ]
    );
}

#[test]
fn readings_carry_converging_params() {
    let (mut svc, rt, _) = service();
    let mut backend = MockBackend::new();
    svc.start(&mut backend);

    rt.dispatch(&cmd(json!({"type": "SET_STATE", "state": "RIGOROUS", "cause": "scheduled"})))
        .unwrap();
    let r1 = svc.tick(1000, &mut backend);
    let r2 = svc.tick(1000, &mut backend);

    assert_eq!(r1.mode, Mode::Rigorous);
    assert_eq!(r1.version, 1);
    assert_eq!(r1.params[Param::BrushRpm], 800.0);
    assert_eq!(r2.params[Param::BrushRpm], 900.0);
}

#[test]
fn change_events_are_forwarded_on_the_next_tick() {
    let (mut svc, rt, _) = service();
    let mut backend = MockBackend::new();
    svc.start(&mut backend);

    rt.dispatch(&cmd(json!({"type": "PAUSE", "cause": "a"}))).unwrap();
    rt.dispatch(&cmd(json!({"type": "RESUME", "cause": "b"}))).unwrap();
    assert!(backend.changes.is_empty());

    svc.tick(100, &mut backend);
    assert_eq!(backend.change_versions(), [1, 2]);

    rt.dispatch(&cmd(json!({"type": "SET_PARAM", "param": "turnRadius", "value": 1.0, "cause": "c"})))
        .unwrap();
    svc.finish(&mut backend);
    assert_eq!(backend.change_versions(), [1, 2, 3]);
    assert_eq!(svc.stats().changes_forwarded, 3);
}

#[test]
fn backend_failures_are_counted_not_fatal() {
    let (mut svc, rt, _) = service();
    let mut backend = MockBackend::new();
    backend.fail_readings = true;
    backend.fail_changes = true;
    backend.fail_sessions = true;

    let id = svc.start(&mut backend).to_owned();
    assert!(!id.is_empty(), "falls back to a local session id");

    rt.dispatch(&cmd(json!({"type": "PAUSE", "cause": "a"}))).unwrap();
    svc.tick(100, &mut backend);
    let stats = svc.finish(&mut backend);

    assert_eq!(stats.readings_failed, 1);
    assert_eq!(stats.changes_failed, 1);
    assert_eq!(rt.snapshot().version, 1);
}

#[test]
fn same_seed_same_readings() {
    let (mut a, _, _) = service();
    let (mut b, _, _) = service();
    let (mut ma, mut mb) = (MockBackend::new(), MockBackend::new());
    a.start(&mut ma);
    b.start(&mut mb);
    for _ in 0..5 {
        let ra = a.tick(2000, &mut ma);
        let rb = b.tick(2000, &mut mb);
        assert_eq!(ra.temperature, rb.temperature);
        assert_eq!(ra.dust_level, rb.dust_level);
        assert_eq!(ra.location, rb.location);
    }
}

#[test]
fn schedule_drives_the_expected_tick_count() {
    let (mut svc, _, clock) = service();
    let mut backend = MockBackend::new();
    let mut schedule = SessionSchedule::new(2000, 10_000);
    svc.start(&mut backend);
    schedule.start(0);

    let mut now = 0u64;
    loop {
        match schedule.poll(now) {
            ScheduleDecision::Tick { elapsed_ms } => {
                svc.tick(elapsed_ms, &mut backend);
            }
            ScheduleDecision::Wait(ms) => {
                now += ms;
                clock.advance_ms(ms as i64);
            }
            ScheduleDecision::Finished => break,
        }
    }
    svc.finish(&mut backend);

    assert_eq!(backend.readings.len(), 5);
    assert_eq!(backend.count(|c| matches!(c, PortCall::StopSession { .. })), 1);
}
