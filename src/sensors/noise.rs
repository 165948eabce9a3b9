//! Biased random sampling around a scenario band.

use rand::Rng;

use super::scenarios::Band;

/// Anomalies land this many variances away from the base.
pub const ANOMALY_MAGNITUDE: f64 = 1.5;

/// Round to `decimals` places (half away from zero).
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Sample one value.  With probability `anomaly_probability` the value sits
/// exactly `variance * ANOMALY_MAGNITUDE` above or below the base; otherwise
/// it is uniform within `base ± variance`.  Rounded to two decimals.
pub fn biased_random<R: Rng + ?Sized>(rng: &mut R, band: Band, anomaly_probability: f64) -> f64 {
    let p = anomaly_probability.clamp(0.0, 1.0);
    let shift = if rng.gen_bool(p) {
        let sign = if rng.gen_bool(0.5) { -1.0 } else { 1.0 };
        sign * band.variance * ANOMALY_MAGNITUDE
    } else {
        rng.gen_range(-1.0..1.0) * band.variance
    };
    round_to(band.base + shift, 2)
}
