//! Runtime engine end to end: commands through the dispatcher, ticks
//! through convergence, events through the bus.

use std::sync::{Arc, Mutex};

use panelbot::adapters::time::ManualClock;
use panelbot::error::{CommandError, SubscriberError};
use panelbot::runtime::events::ChangeDetails;
use panelbot::runtime::{
    CapabilitySet, ChangeEvent, EventKind, Mode, Param, SharedRuntime, Topic, WireCommand,
};
use serde_json::json;

fn runtime(caps: CapabilitySet) -> (SharedRuntime, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::at_epoch());
    (SharedRuntime::new(Mode::Regular, caps, clock.clone()), clock)
}

fn cmd(v: serde_json::Value) -> WireCommand {
    serde_json::from_value(v).unwrap()
}

#[test]
fn rigorous_switch_ramps_brush_over_two_ticks() {
    let (rt, _) = runtime(CapabilitySet::all());
    let out = rt
        .dispatch(&cmd(json!({"type": "SET_STATE", "state": "RIGOROUS", "cause": "scheduled"})))
        .unwrap();
    assert_eq!(out.next.params[Param::BrushRpm], 900.0);
    assert_eq!(out.prev.params[Param::BrushRpm], 700.0);

    assert_eq!(rt.params_for_tick(1000)[Param::BrushRpm], 800.0);
    assert_eq!(rt.params_for_tick(1000)[Param::BrushRpm], 900.0);
    assert_eq!(rt.params_for_tick(1000)[Param::BrushRpm], 900.0);
}

#[test]
fn vacuum_request_is_clamped_and_flagged() {
    let (rt, _) = runtime(CapabilitySet::all());
    let out = rt
        .dispatch(&cmd(json!({
            "type": "SET_PARAM", "param": "vacuumPower", "value": 5.0, "cause": "operator"
        })))
        .unwrap();
    assert!(out.clamped_changed);
    assert_eq!(rt.snapshot().target_params[Param::VacuumPower], 1.0);
}

#[test]
fn stale_expected_version_is_rejected() {
    let (rt, _) = runtime(CapabilitySet::all());
    for i in 0..4 {
        rt.dispatch(&cmd(json!({"type": "SET_PARAM", "param": "robotSpeed", "value": 0.5, "cause": format!("c{i}")})))
            .unwrap();
    }
    let before = rt.snapshot();
    let err = rt
        .dispatch(&cmd(json!({"type": "PAUSE", "cause": "late", "expectedVersion": 3})))
        .unwrap_err();
    assert_eq!(err, CommandError::VersionConflict { expected: 3, current: 4 });
    assert_eq!(rt.snapshot(), before);
}

#[test]
fn water_pressure_needs_a_pump() {
    let caps = CapabilitySet {
        has_water_pump: false,
        ..CapabilitySet::all()
    };
    let (rt, _) = runtime(caps);
    let err = rt
        .dispatch(&cmd(json!({"type": "SET_PARAM", "param": "waterPressure", "value": 4.0, "cause": "x"})))
        .unwrap_err();
    assert_eq!(err.status_code(), 422);
    assert!(err.to_string().contains("hasWaterPump"));
    assert_eq!(rt.snapshot().target_params[Param::WaterPressure], 2.0);
}

#[test]
fn mode_switch_discards_overrides() {
    let (rt, _) = runtime(CapabilitySet::all());
    rt.dispatch(&cmd(json!({"type": "SET_PARAMS_BULK", "params": {"robotSpeed": 1.1, "dwellTime": 20}, "cause": "tune"})))
        .unwrap();
    rt.dispatch(&cmd(json!({"type": "SET_STATE", "state": "LIGHT", "cause": "switch"})))
        .unwrap();
    let snap = rt.snapshot();
    assert_eq!(snap.target_params[Param::RobotSpeed], 0.6);
    assert_eq!(snap.target_params[Param::DwellTime], 0.0);
}

#[test]
fn subscribers_observe_each_commit_in_order() {
    let (rt, clock) = runtime(CapabilitySet::all());
    let seen: Arc<Mutex<Vec<(EventKind, u64)>>> = Arc::default();
    let any: Arc<Mutex<Vec<u64>>> = Arc::default();

    let s = Arc::clone(&seen);
    rt.subscribe(EventKind::ParamChangeBulk, move |e: &ChangeEvent| -> Result<(), SubscriberError> {
        s.lock().unwrap().push((e.kind, e.version));
        Ok(())
    });
    let a = Arc::clone(&any);
    rt.subscribe(Topic::Any, move |e: &ChangeEvent| -> Result<(), SubscriberError> {
        a.lock().unwrap().push(e.version);
        Ok(())
    });

    rt.dispatch(&cmd(json!({"type": "PAUSE", "cause": "a"}))).unwrap();
    clock.advance_ms(10);
    rt.dispatch(&cmd(json!({"type": "SET_PARAMS_BULK", "params": {"pathSpacing": 0.9}, "cause": "b"})))
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), [(EventKind::ParamChangeBulk, 2)]);
    assert_eq!(*any.lock().unwrap(), [1, 2]);

    let snap = rt.snapshot();
    let last = snap.recent_changes.last().unwrap();
    assert_eq!(
        last.details,
        Some(ChangeDetails::Bulk {
            changed: vec![Param::PathSpacing],
            clamped: vec![],
        })
    );
    assert_eq!(snap.last_change_ts, last.ts);
}

#[test]
fn pause_then_resume_parks_and_restores() {
    let (rt, _) = runtime(CapabilitySet::all());
    rt.dispatch(&cmd(json!({"type": "PAUSE", "cause": "rain"}))).unwrap();
    for _ in 0..20 {
        rt.params_for_tick(1000);
    }
    let parked = rt.snapshot().params;
    assert_eq!(parked[Param::BrushRpm], 0.0);
    assert_eq!(parked[Param::RobotSpeed], 0.0);

    let out = rt.dispatch(&cmd(json!({"type": "RESUME", "cause": "dry"}))).unwrap();
    assert_eq!(out.next.mode, Mode::Regular);
    assert_eq!(rt.params_for_tick(1000)[Param::BrushRpm], 100.0);
}
