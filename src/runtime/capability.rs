//! Actuator capability gate.
//!
//! Some parameters only mean something when the matching actuator is
//! physically fitted.  The gate refuses changes to those parameters on a
//! robot that lacks the actuator; ungated parameters always pass.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::params::Param;
use crate::error::CapabilityError;

/// Actuator categories a robot may or may not carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    WaterPump,
    Brush,
    Vacuum,
}

impl Capability {
    /// Configuration flag name, also used in rejection messages.
    pub const fn flag(self) -> &'static str {
        match self {
            Self::WaterPump => "hasWaterPump",
            Self::Brush => "hasBrush",
            Self::Vacuum => "hasVacuum",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

/// Which actuators this robot has.  Read once from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapabilitySet {
    pub has_water_pump: bool,
    pub has_brush: bool,
    pub has_vacuum: bool,
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::all()
    }
}

impl CapabilitySet {
    /// Fully equipped robot.
    pub const fn all() -> Self {
        Self {
            has_water_pump: true,
            has_brush: true,
            has_vacuum: true,
        }
    }

    pub const fn has(&self, cap: Capability) -> bool {
        match cap {
            Capability::WaterPump => self.has_water_pump,
            Capability::Brush => self.has_brush,
            Capability::Vacuum => self.has_vacuum,
        }
    }
}

/// The actuator needed to change `param`, if any.
pub const fn required_capability(param: Param) -> Option<Capability> {
    match param {
        Param::WaterPressure
        | Param::DetergentFlowRate
        | Param::DwellTime
        | Param::SqueegeePressure
        | Param::PathSpacing => Some(Capability::WaterPump),
        Param::BrushRpm | Param::RpmRampRate | Param::PassOverlap => Some(Capability::Brush),
        Param::VacuumPower => Some(Capability::Vacuum),
        Param::RobotSpeed | Param::TurnRadius | Param::MaxWaterPerMin | Param::MaxEnergyPerMin => {
            None
        }
    }
}

/// Approve or reject a change to `param` given the fitted actuators.
pub fn check_capability(param: Param, caps: &CapabilitySet) -> Result<(), CapabilityError> {
    match required_capability(param) {
        Some(missing) if !caps.has(missing) => Err(CapabilityError { param, missing }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ungated_params_always_pass() {
        let none = CapabilitySet {
            has_water_pump: false,
            has_brush: false,
            has_vacuum: false,
        };
        for p in [
            Param::RobotSpeed,
            Param::TurnRadius,
            Param::MaxWaterPerMin,
            Param::MaxEnergyPerMin,
        ] {
            assert!(check_capability(p, &none).is_ok());
        }
    }

    #[test]
    fn water_pump_gate() {
        let caps = CapabilitySet {
            has_water_pump: false,
            ..CapabilitySet::all()
        };
        let err = check_capability(Param::WaterPressure, &caps).unwrap_err();
        assert_eq!(err.missing, Capability::WaterPump);
        assert!(check_capability(Param::BrushRpm, &caps).is_ok());
    }

    #[test]
    fn brush_gate_covers_ramp_rate() {
        let caps = CapabilitySet {
            has_brush: false,
            ..CapabilitySet::all()
        };
        assert!(check_capability(Param::RpmRampRate, &caps).is_err());
        assert!(check_capability(Param::PassOverlap, &caps).is_err());
    }

    #[test]
    fn missing_flags_default_to_present() {
        let caps: CapabilitySet = serde_json::from_str(r#"{"hasVacuum":false}"#).unwrap();
        assert!(caps.has_water_pump);
        assert!(caps.has_brush);
        assert!(!caps.has_vacuum);
    }
}
