//! Operating modes and their default parameter presets.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::params::ParamSet;

/// Named operating profile of the robot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Light,
    #[default]
    Regular,
    Rigorous,
    Idle,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Self::Light, Self::Regular, Self::Rigorous, Self::Idle];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Light => "LIGHT",
            Self::Regular => "REGULAR",
            Self::Rigorous => "RIGOROUS",
            Self::Idle => "IDLE",
        }
    }

    /// Case-insensitive parse.  Returns `None` for unrecognised identifiers.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(raw))
    }

    /// Total parse: absent or unrecognised identifiers select `REGULAR`.
    pub fn parse_or_regular(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or(Self::Regular)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Columns follow `Param::ALL`:
// speed, rpm, water, detergent, vacuum, turn, overlap, spacing, squeegee,
// dwell, ramp, water/min, energy/min
const LIGHT: ParamSet = ParamSet::from_array([
    0.6, 500.0, 1.0, 0.1, 0.4, 0.8, 15.0, 0.8, 20.0, 0.0, 100.0, 0.6, 40.0,
]);
const REGULAR: ParamSet = ParamSet::from_array([
    0.45, 700.0, 2.0, 0.3, 0.6, 0.6, 25.0, 0.6, 40.0, 5.0, 100.0, 1.0, 60.0,
]);
const RIGOROUS: ParamSet = ParamSet::from_array([
    0.3, 900.0, 3.5, 0.5, 0.8, 0.5, 40.0, 0.4, 60.0, 10.0, 100.0, 1.6, 80.0,
]);
// Parked: motion, brush, fluids and squeegee off.  Geometry and budgets
// keep their REGULAR values.
const IDLE: ParamSet = ParamSet::from_array([
    0.0, 0.0, 0.0, 0.0, 0.0, 0.6, 25.0, 0.6, 0.0, 0.0, 100.0, 1.0, 60.0,
]);

/// Complete default parameter set for `mode`.
pub const fn preset_for(mode: Mode) -> ParamSet {
    match mode {
        Mode::Light => LIGHT,
        Mode::Regular => REGULAR,
        Mode::Rigorous => RIGOROUS,
        Mode::Idle => IDLE,
    }
}
