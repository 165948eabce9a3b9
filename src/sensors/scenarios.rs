//! Panel condition scenarios.
//!
//! Each scenario fixes a base value and normal variance for every
//! simulated signal, plus the probability that a sample is an anomaly.

use core::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Centre and half-width of a signal's normal band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub base: f64,
    pub variance: f64,
}

const fn band(base: f64, variance: f64) -> Band {
    Band { base, variance }
}

/// Signal bands for one scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioProfile {
    pub temperature: Band,
    pub humidity: Band,
    pub dust_level: Band,
    pub vibration: Band,
    pub anomaly_probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    OptimalMaintenance,
    ScheduledMaintenance,
    IrregularMaintenance,
    DegradedPanel,
    NeglectedPanel,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Self::OptimalMaintenance,
        Self::ScheduledMaintenance,
        Self::IrregularMaintenance,
        Self::DegradedPanel,
        Self::NeglectedPanel,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::OptimalMaintenance => "optimal_maintenance",
            Self::ScheduledMaintenance => "scheduled_maintenance",
            Self::IrregularMaintenance => "irregular_maintenance",
            Self::DegradedPanel => "degraded_panel",
            Self::NeglectedPanel => "neglected_panel",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::OptimalMaintenance => "new or recently and frequently cleaned panel",
            Self::ScheduledMaintenance => "panel serviced every two weeks",
            Self::IrregularMaintenance => "working panel with irregular upkeep",
            Self::DegradedPanel => "ageing panel with accumulated dust",
            Self::NeglectedPanel => "poorly maintained panel, possibly failing",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.key().eq_ignore_ascii_case(key))
    }

    /// Uniform pick, used when no scenario is configured.
    pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub const fn profile(self) -> ScenarioProfile {
        match self {
            Self::OptimalMaintenance => ScenarioProfile {
                temperature: band(30.0, 2.0),
                humidity: band(45.0, 5.0),
                dust_level: band(5.0, 3.0),
                vibration: band(0.01, 0.005),
                anomaly_probability: 0.01,
            },
            Self::ScheduledMaintenance => ScenarioProfile {
                temperature: band(32.0, 3.0),
                humidity: band(50.0, 8.0),
                dust_level: band(15.0, 5.0),
                vibration: band(0.03, 0.01),
                anomaly_probability: 0.05,
            },
            Self::IrregularMaintenance => ScenarioProfile {
                temperature: band(34.0, 5.0),
                humidity: band(60.0, 10.0),
                dust_level: band(35.0, 15.0),
                vibration: band(0.1, 0.05),
                anomaly_probability: 0.15,
            },
            Self::DegradedPanel => ScenarioProfile {
                temperature: band(38.0, 5.0),
                humidity: band(65.0, 12.0),
                dust_level: band(60.0, 20.0),
                vibration: band(0.15, 0.07),
                anomaly_probability: 0.25,
            },
            Self::NeglectedPanel => ScenarioProfile {
                temperature: band(42.0, 6.0),
                humidity: band(75.0, 15.0),
                dust_level: band(85.0, 10.0),
                vibration: band(0.25, 0.1),
                anomaly_probability: 0.35,
            },
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
