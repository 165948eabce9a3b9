//! Integration tests: HTTP client → ControlServer → SharedRuntime.

use std::sync::Arc;

use panelbot::adapters::time::ManualClock;
use panelbot::control::{ControlApi, ControlServer};
use panelbot::runtime::{CapabilitySet, Mode, SharedRuntime};
use reqwest::blocking::Client;
use serde_json::{Value, json};

struct Harness {
    server: ControlServer,
    runtime: SharedRuntime,
    client: Client,
}

impl Harness {
    fn start(caps: CapabilitySet) -> Self {
        let runtime = SharedRuntime::new(Mode::Regular, caps, Arc::new(ManualClock::at_epoch()));
        let api = ControlApi::new(runtime.clone(), 50);
        let server = ControlServer::spawn("127.0.0.1:0", api).expect("bind control listener");
        Self {
            server,
            runtime,
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.server.addr())
    }

    fn get(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().expect("GET");
        let status = resp.status().as_u16();
        (status, resp.json().unwrap_or(Value::Null))
    }

    fn post(&self, path: &str, body: String) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .expect("POST");
        let status = resp.status().as_u16();
        (status, resp.json().unwrap_or(Value::Null))
    }
}

#[test]
fn health_and_runtime_over_http() {
    let h = Harness::start(CapabilitySet::all());

    let (status, body) = h.get("/health");
    assert_eq!(status, 200);
    assert_eq!(body, json!({"ok": true}));

    let (status, body) = h.get("/runtime?verbose=1");
    assert_eq!(status, 200);
    assert_eq!(body["mode"], "REGULAR");
    assert_eq!(body["version"], 0);
    assert_eq!(body["params"]["brushRpm"], 700.0);

    h.server.shutdown();
}

#[test]
fn command_round_trip_updates_runtime() {
    let h = Harness::start(CapabilitySet::all());

    let cmd = json!({
        "type": "SET_PARAM",
        "param": "vacuumPower",
        "value": 3.0,
        "cause": "operator",
        "expectedVersion": 0
    });
    let (status, body) = h.post("/commands", cmd.to_string());
    assert_eq!(status, 200);
    assert_eq!(body["version"], 1);
    assert_eq!(body["clampedChanged"], true);
    assert_eq!(body["next"]["params"]["vacuumPower"], 1.0);

    let (_, snap) = h.get("/runtime");
    assert_eq!(snap["version"], 1);
    assert_eq!(snap["targetParams"]["vacuumPower"], 1.0);
    assert_eq!(snap["recentChanges"][0]["cause"], "operator");
    assert_eq!(h.runtime.snapshot().version, 1);

    h.server.shutdown();
}

#[test]
fn errors_map_to_status_codes() {
    let caps = CapabilitySet {
        has_water_pump: false,
        ..CapabilitySet::all()
    };
    let h = Harness::start(caps);

    let (status, body) = h.post("/commands", "{not json".into());
    assert_eq!(status, 400);
    assert_eq!(body["error"], "invalid JSON");

    let (status, body) = h.post("/commands", json!({"type": "PAUSE"}).to_string());
    assert_eq!(status, 422);
    assert_eq!(body["field"], "cause");

    let gated = json!({"type": "SET_PARAM", "param": "waterPressure", "value": 1.0, "cause": "op"});
    let (status, _) = h.post("/commands", gated.to_string());
    assert_eq!(status, 422);

    let stale = json!({"type": "PAUSE", "cause": "op", "expectedVersion": 7});
    let (status, _) = h.post("/commands", stale.to_string());
    assert_eq!(status, 409);

    let (status, _) = h.get("/nowhere");
    assert_eq!(status, 404);

    assert_eq!(h.runtime.snapshot().version, 0);
    h.server.shutdown();
}
