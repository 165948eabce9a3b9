//! Derived panel signals: power output and micro-fracture risk.

use super::noise::round_to;

/// Nominal output of a clean panel, in watts.
pub const NOMINAL_POWER_W: f64 = 250.0;

/// Output falls linearly with dust coverage (percent).
pub fn power_output(dust_level: f64) -> f64 {
    round_to(NOMINAL_POWER_W * (1.0 - dust_level / 100.0), 2)
}

/// Additive risk score in `[0, 1]`.
pub fn micro_fracture_risk(temperature: f64, vibration: f64, power: f64, dust_level: f64) -> f64 {
    let mut risk = 0.0;
    if temperature > 38.0 {
        risk += 0.3;
    }
    if vibration > 0.3 {
        risk += 0.2;
    }
    if power < 160.0 {
        risk += 0.3;
    }
    if dust_level > 80.0 {
        risk += 0.2;
    }
    round_to(f64::min(risk, 1.0), 2)
}
