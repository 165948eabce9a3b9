//! Fuzz target: `WireCommand` decoding, validation and dispatch
//!
//! Feeds arbitrary bytes through the JSON decoder and, when they decode,
//! through `SharedRuntime::dispatch`.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - A rejected command leaves the version and both parameter sets untouched
//! - An accepted command bumps the version by exactly one
//! - Current and target parameters always stay within their limits
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use panelbot::adapters::time::ManualClock;
use panelbot::runtime::limits::within_limits;
use panelbot::runtime::{CapabilitySet, Mode, SharedRuntime, WireCommand};

fuzz_target!(|data: &[u8]| {
    let Ok(cmd) = serde_json::from_slice::<WireCommand>(data) else {
        return;
    };

    // First byte picks the installed actuators so gating gets exercised.
    let bits = data.first().copied().unwrap_or(0);
    let caps = CapabilitySet {
        has_water_pump: bits & 1 != 0,
        has_brush: bits & 2 != 0,
        has_vacuum: bits & 4 != 0,
    };
    let rt = SharedRuntime::new(Mode::Regular, caps, Arc::new(ManualClock::at_epoch()));
    let before = rt.snapshot();

    match rt.dispatch(&cmd) {
        Ok(outcome) => {
            assert_eq!(outcome.version, before.version + 1);
            assert!(within_limits(&outcome.next.params));
        }
        Err(_) => {
            let after = rt.snapshot();
            assert_eq!(after.version, before.version);
            assert_eq!(after.target_params, before.target_params);
            assert_eq!(after.params, before.params);
        }
    }

    let snap = rt.snapshot();
    assert!(within_limits(&snap.params));
    assert!(within_limits(&snap.target_params));
});
