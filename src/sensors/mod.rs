//! Sensor telemetry generator.
//!
//! Produces one [`SensorReading`] per tick from the active [`Scenario`],
//! a slow location walk around the configured base point, and the
//! runtime parameters applied for that tick.

pub mod noise;
pub mod risk;
pub mod scenarios;

use chrono::{DateTime, Utc};
use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::runtime::{Mode, ParamSet};
use noise::{biased_random, round_to};
pub use scenarios::Scenario;

/// Steps over which the location offset grows by one `LOCATION_DELTA`.
const WALK_STEPS: f64 = 100.0;
const LOCATION_DELTA: f64 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Runtime state captured for a tick, after convergence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickState {
    pub mode: Mode,
    pub version: u64,
    pub params: ParamSet,
}

/// One telemetry sample as sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub session_id: String,
    pub panel_id: String,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub dust_level: f64,
    pub power_output: f64,
    pub vibration: f64,
    pub micro_fracture_risk: f64,
    pub location: Location,
    pub mode: Mode,
    pub version: u64,
    pub params: ParamSet,
}

/// Seedable generator bound to one scenario and panel.
pub struct TelemetryGenerator {
    rng: StdRng,
    scenario: Scenario,
    panel_id: String,
    base: Location,
    step: u64,
}

impl TelemetryGenerator {
    /// `scenario = None` picks one at random from the same RNG, so a fixed
    /// `seed` reproduces both the scenario and every sample.
    pub fn new(
        panel_id: impl Into<String>,
        base: Location,
        scenario: Option<Scenario>,
        seed: Option<u64>,
    ) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let scenario = scenario.unwrap_or_else(|| Scenario::pick(&mut rng));
        Self {
            rng,
            scenario,
            panel_id: panel_id.into(),
            base,
            step: 0,
        }
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn generate(
        &mut self,
        timestamp: DateTime<Utc>,
        session_id: &str,
        state: TickState,
    ) -> SensorReading {
        let profile = self.scenario.profile();
        let p = profile.anomaly_probability;

        let temperature = biased_random(&mut self.rng, profile.temperature, p);
        let humidity = biased_random(&mut self.rng, profile.humidity, p);
        let dust_level = biased_random(&mut self.rng, profile.dust_level, p);
        let vibration = biased_random(&mut self.rng, profile.vibration, p);

        let power_output = risk::power_output(dust_level);
        let micro_fracture_risk =
            risk::micro_fracture_risk(temperature, vibration, power_output, dust_level);

        let location = walk(self.base, self.step);
        self.step += 1;

        debug!(
            "sensors: step {} {} t={temperature} dust={dust_level} risk={micro_fracture_risk}",
            self.step, self.scenario
        );

        SensorReading {
            session_id: session_id.to_owned(),
            panel_id: self.panel_id.clone(),
            timestamp,
            temperature,
            humidity,
            dust_level,
            power_output,
            vibration,
            micro_fracture_risk,
            location,
            mode: state.mode,
            version: state.version,
            params: state.params,
        }
    }
}

/// Alternating offset that widens with each step.
fn walk(base: Location, step: u64) -> Location {
    let sign = if step % 2 == 0 { 1.0 } else { -1.0 };
    let offset = sign * (step as f64 / WALK_STEPS) * LOCATION_DELTA;
    Location {
        lat: round_to(base.lat + offset, 6),
        lng: round_to(base.lng + offset, 6),
    }
}
