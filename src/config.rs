//! System configuration parameters
//!
//! All tunable parameters for the PanelBot simulator.
//! Values come from defaults, then an optional JSON file, then environment
//! variables, then command-line flags (each layer overriding the previous).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::runtime::{CapabilitySet, Mode};
use crate::sensors::{Location, Scenario};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemConfig {
    // --- Backend ---
    /// Endpoint readings are POSTed to
    pub backend_url: String,
    /// Base URL for session and event endpoints
    pub backend_base: String,
    /// Sent as `X-Api-Key` when present
    pub api_key: Option<String>,
    /// Log instead of sending anything over the network
    pub dry_run: bool,

    // --- Panel ---
    pub panel_id: String,
    /// Base point of the simulated location walk
    pub location: Location,
    /// `None` picks a scenario at random
    pub scenario: Option<Scenario>,
    /// RNG seed for reproducible telemetry
    pub seed: Option<u64>,

    // --- Runtime ---
    /// Initial operating mode
    pub cleaning_mode: Mode,
    /// Actuators physically present on this robot
    pub actuators: CapabilitySet,

    // --- Timing ---
    /// Telemetry tick interval (milliseconds)
    pub interval_ms: u64,
    /// Total session length (milliseconds)
    pub session_duration_ms: u64,

    // --- Control listener ---
    pub control_port: u16,
    /// Command rate limit (tokens per second, also the burst size)
    pub control_rate_per_sec: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Backend
            backend_url: "http://localhost:8080/api/readings".into(),
            backend_base: "http://localhost:8080".into(),
            api_key: None,
            dry_run: true,

            // Panel
            panel_id: "PANEL-001".into(),
            location: Location {
                lat: 6.25184,
                lng: -75.56359,
            },
            scenario: None,
            seed: None,

            // Runtime
            cleaning_mode: Mode::Regular,
            actuators: CapabilitySet::all(),

            // Timing
            interval_ms: 2_000,           // 0.5 Hz
            session_duration_ms: 600_000, // 10 min

            // Control listener
            control_port: 8081,
            control_rate_per_sec: 10,
        }
    }
}

impl SystemConfig {
    /// Read a JSON file.  Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Overlay environment variables.  `lookup` is usually
    /// `|k| std::env::var(k).ok()`; tests pass a map.
    ///
    /// An unrecognised `CLEANING_MODE` falls back to `REGULAR`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = lookup("BACKEND_URL") {
            self.backend_url = v;
        }
        if let Some(v) = lookup("BACKEND_BASE") {
            self.backend_base = v;
        }
        if let Some(v) = lookup("API_KEY") {
            self.api_key = Some(v).filter(|k| !k.is_empty());
        }
        if let Some(v) = lookup("PANEL_ID") {
            self.panel_id = v;
        }
        if let Some(v) = lookup("CLEANING_MODE") {
            self.cleaning_mode = Mode::parse_or_regular(Some(&v));
        }
        if let Some(v) = lookup("CONTROL_PORT") {
            self.control_port = v
                .trim()
                .parse()
                .map_err(|_| ConfigError::ValidationFailed("CONTROL_PORT must be a port number"))?;
        }
        if let Some(v) = lookup("SCENARIO") {
            self.scenario = Some(
                Scenario::from_key(&v)
                    .ok_or(ConfigError::ValidationFailed("SCENARIO is not a known scenario"))?,
            );
        }
        Ok(())
    }

    /// Range checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("intervalMs must be positive"));
        }
        if self.session_duration_ms < self.interval_ms {
            return Err(ConfigError::ValidationFailed(
                "sessionDurationMs must be at least intervalMs",
            ));
        }
        if !self.location.is_valid() {
            return Err(ConfigError::ValidationFailed("location is out of range"));
        }
        if self.control_rate_per_sec == 0 {
            return Err(ConfigError::ValidationFailed("controlRatePerSec must be positive"));
        }
        if self.panel_id.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("panelId must not be empty"));
        }
        Ok(())
    }
}
