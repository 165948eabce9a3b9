//! Rate-limited convergence of applied parameters toward their targets.
//!
//! Each tick moves every `current` value toward its `target` by at most
//! `rate * dt`.  `brushRpm` is special: its step is bounded by the live
//! `rpmRampRate` parameter, so operators can tune spin-up at runtime.

use super::limits::{clamp, clamp_all, limits};
use super::params::{Param, ParamSet};

/// Smallest brush step per tick (rpm).
const MIN_RPM_STEP: f64 = 1.0;
/// Smallest step for rate-limited parameters.
const MIN_STEP: f64 = 1e-6;

/// Move `current` toward `target` by at most `max_delta`, snapping once
/// within reach.  Never overshoots.
pub fn move_towards(current: f64, target: f64, max_delta: f64) -> f64 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + delta.signum() * max_delta
    }
}

/// Advance `current` toward `target` by `elapsed_ms` of simulated time.
///
/// Non-positive durations count as 1 ms so repeated zero-length ticks still
/// make forward progress.
pub fn advance(current: &mut ParamSet, target: &ParamSet, elapsed_ms: i64) {
    let dt = elapsed_ms.max(1) as f64 / 1000.0;

    // Ramp rate is read before it moves this tick.
    let ramp = clamp(Param::RpmRampRate, current[Param::RpmRampRate]);
    let rpm_step = (ramp * dt).max(MIN_RPM_STEP);
    current.set(
        Param::BrushRpm,
        move_towards(current[Param::BrushRpm], target[Param::BrushRpm], rpm_step),
    );

    for param in Param::ALL {
        if param == Param::BrushRpm {
            continue;
        }
        let step = limits(param)
            .max_rate_per_sec
            .map_or(f64::INFINITY, |rate| (rate * dt).max(MIN_STEP));
        current.set(param, move_towards(current[param], target[param], step));
    }

    clamp_all(current);
}
