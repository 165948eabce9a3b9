//! Fuzz target: `ControlApi::handle`
//!
//! Splits the input into method, path and body and routes it.  The route
//! table must answer every request with a known status and a JSON object.
//!
//! cargo fuzz run fuzz_control_routes

#![no_main]

use std::sync::Arc;
use std::time::Duration;

use libfuzzer_sys::fuzz_target;
use panelbot::adapters::time::ManualClock;
use panelbot::control::ControlApi;
use panelbot::runtime::{CapabilitySet, Mode, SharedRuntime};

const METHODS: [&str; 4] = ["GET", "POST", "PUT", "DELETE"];
const PATHS: [&str; 5] = ["/health", "/runtime", "/commands", "/commands?x=1", "/"];

fn frozen() -> Duration {
    Duration::ZERO
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let method = METHODS[usize::from(data[0]) % METHODS.len()];
    let path = PATHS[usize::from(data[1]) % PATHS.len()];
    let body = String::from_utf8_lossy(&data[2..]);

    let rt = SharedRuntime::new(
        Mode::Regular,
        CapabilitySet::all(),
        Arc::new(ManualClock::at_epoch()),
    );
    let mut api = ControlApi::with_time_provider(rt, 5, frozen);
    let reply = api.handle(method, path, &body);

    assert!(matches!(reply.status, 200 | 400 | 404 | 409 | 422 | 429));
    assert!(reply.body.is_object());
});
