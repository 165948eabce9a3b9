//! HTTP routes of the control listener, as a pure function.
//!
//! | Method | Path        | Result                                      |
//! |--------|-------------|---------------------------------------------|
//! | GET    | `/health`   | `200 {"ok":true}`                           |
//! | GET    | `/runtime`  | `200` runtime snapshot                      |
//! | POST   | `/commands` | `200` outcome, or the command error's status |
//! | *      | *           | `404`                                       |
//!
//! Commands pass a token bucket first (`429` when empty), then JSON
//! decoding (`400` when the body is not a JSON object).

use core::time::Duration;

use burster::Limiter;
use log::{debug, warn};
use serde::Serialize;
use serde_json::{Value, json};

use crate::runtime::{SharedRuntime, WireCommand};

/// Status code and JSON body for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlResponse {
    pub status: u16,
    pub body: Value,
}

impl ControlResponse {
    fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    fn error(status: u16, error: &str) -> Self {
        Self::new(status, json!({ "error": error, "code": status }))
    }

    fn serialised(value: &impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(body) => Self::ok(body),
            Err(e) => Self::new(500, json!({ "error": "server error", "details": e.to_string() })),
        }
    }
}

/// Route table bound to one runtime.
pub struct ControlApi {
    runtime: SharedRuntime,
    limiter: burster::TokenBucket<fn() -> Duration>,
}

impl ControlApi {
    /// `rate_per_sec` tokens per second with the same burst capacity.
    pub fn new(runtime: SharedRuntime, rate_per_sec: u32) -> Self {
        Self::with_time_provider(runtime, rate_per_sec, platform_now)
    }

    pub fn with_time_provider(
        runtime: SharedRuntime,
        rate_per_sec: u32,
        now: fn() -> Duration,
    ) -> Self {
        let rate = u64::from(rate_per_sec.max(1));
        Self {
            runtime,
            limiter: burster::TokenBucket::new_with_time_provider(rate, rate, now),
        }
    }

    pub fn handle(&mut self, method: &str, url: &str, body: &str) -> ControlResponse {
        let path = url.split_once('?').map_or(url, |(p, _)| p);
        debug!("control: {method} {path}");
        match (method, path) {
            ("GET", "/health") => ControlResponse::ok(json!({ "ok": true })),
            ("GET", "/runtime") => ControlResponse::serialised(&self.runtime.snapshot()),
            ("POST", "/commands") => self.command(body),
            _ => ControlResponse::error(404, "not found"),
        }
    }

    fn command(&mut self, body: &str) -> ControlResponse {
        if self.limiter.try_consume(1).is_err() {
            warn!("control: command rate limit exceeded");
            return ControlResponse::error(429, "rate limit exceeded");
        }

        let cmd: WireCommand = match serde_json::from_str(body) {
            Ok(cmd) => cmd,
            Err(e) => {
                return ControlResponse::new(
                    400,
                    json!({ "error": "invalid JSON", "details": e.to_string() }),
                );
            }
        };

        match self.runtime.dispatch(&cmd) {
            Ok(outcome) => ControlResponse::serialised(&outcome),
            Err(e) => {
                warn!("control: command rejected: {e}");
                ControlResponse::new(e.status_code(), e.to_body())
            }
        }
    }
}

fn platform_now() -> Duration {
    use std::time::Instant;
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    START.get_or_init(Instant::now).elapsed()
}
