//! Static range and slew-rate table.
//!
//! Every parameter has an inclusive `[min, max]` range.  Most also have a
//! maximum rate of change per second of elapsed time; `brushRpm` has none
//! here because it ramps at the live `rpmRampRate` value instead.

use super::params::{Param, ParamSet};

/// Static limits for a single parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamLimits {
    pub min: f64,
    pub max: f64,
    /// Maximum change per second.  `None` means the parameter may jump
    /// straight to its target.
    pub max_rate_per_sec: Option<f64>,
}

impl ParamLimits {
    const fn new(min: f64, max: f64, rate: Option<f64>) -> Self {
        Self {
            min,
            max,
            max_rate_per_sec: rate,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Look up the static limits for `param`.
pub const fn limits(param: Param) -> ParamLimits {
    match param {
        Param::RobotSpeed => ParamLimits::new(0.0, 1.5, Some(0.5)),
        Param::BrushRpm => ParamLimits::new(0.0, 1500.0, None),
        Param::WaterPressure => ParamLimits::new(0.0, 8.0, Some(1.0)),
        Param::DetergentFlowRate => ParamLimits::new(0.0, 2.0, Some(0.5)),
        Param::VacuumPower => ParamLimits::new(0.0, 1.0, Some(0.5)),
        Param::TurnRadius => ParamLimits::new(0.2, 2.0, Some(0.5)),
        Param::PassOverlap => ParamLimits::new(0.0, 100.0, Some(20.0)),
        Param::PathSpacing => ParamLimits::new(0.2, 1.5, Some(0.4)),
        Param::SqueegeePressure => ParamLimits::new(0.0, 100.0, Some(50.0)),
        Param::DwellTime => ParamLimits::new(0.0, 60.0, Some(5.0)),
        Param::RpmRampRate => ParamLimits::new(10.0, 500.0, Some(100.0)),
        Param::MaxWaterPerMin => ParamLimits::new(0.0, 5.0, Some(2.0)),
        Param::MaxEnergyPerMin => ParamLimits::new(0.0, 200.0, Some(50.0)),
    }
}

/// Bound `value` into the static range of `param`.
pub fn clamp(param: Param, value: f64) -> f64 {
    let l = limits(param);
    value.clamp(l.min, l.max)
}

/// Clamp every value of `set` in place.
pub fn clamp_all(set: &mut ParamSet) {
    for param in Param::ALL {
        set.set(param, clamp(param, set.get(param)));
    }
}

/// True when every value of `set` lies inside its range.
pub fn within_limits(set: &ParamSet) -> bool {
    set.iter().all(|(p, v)| limits(p).contains(v))
}
