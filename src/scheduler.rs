//! Session timing.
//!
//! Decides when the next telemetry tick is due and when the cleaning
//! session ends.  Pure over a caller-supplied monotonic millisecond
//! counter, so the main loop owns the sleeping and tests own the clock.
//!
//! ```text
//!  start(t0)
//!    │ tick (elapsed 0)
//!    ├── interval ──▶ tick (elapsed = now - last tick)
//!    ├── interval ──▶ tick
//!    ⋮
//!    └── t0 + duration ──▶ Finished
//! ```

use log::info;

/// What the session loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDecision {
    /// Nothing due; sleep this many milliseconds.
    Wait(u64),
    /// Produce a reading; `elapsed_ms` is the real time since the last tick.
    Tick { elapsed_ms: i64 },
    /// The session duration has passed.
    Finished,
}

/// Fixed-interval, fixed-duration session schedule.
#[derive(Debug, Clone)]
pub struct SessionSchedule {
    interval_ms: u64,
    duration_ms: u64,
    started_at: Option<u64>,
    last_tick: Option<u64>,
    ticks: u64,
}

impl SessionSchedule {
    pub fn new(interval_ms: u64, duration_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            duration_ms,
            started_at: None,
            last_tick: None,
            ticks: 0,
        }
    }

    pub fn start(&mut self, now_ms: u64) {
        info!(
            "Scheduler: session of {:.1} min, tick every {:.1} s",
            self.duration_ms as f64 / 60_000.0,
            self.interval_ms as f64 / 1_000.0
        );
        self.started_at = Some(now_ms);
        self.last_tick = None;
        self.ticks = 0;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Poll at `now_ms`.  Ticking records the tick; call again to wait.
    /// Before `start` the schedule reports `Finished`.
    pub fn poll(&mut self, now_ms: u64) -> ScheduleDecision {
        let Some(started_at) = self.started_at else {
            return ScheduleDecision::Finished;
        };
        if now_ms.saturating_sub(started_at) >= self.duration_ms {
            return ScheduleDecision::Finished;
        }

        match self.last_tick {
            None => {
                self.last_tick = Some(now_ms);
                self.ticks += 1;
                ScheduleDecision::Tick { elapsed_ms: 0 }
            }
            Some(last) => {
                let since = now_ms.saturating_sub(last);
                if since >= self.interval_ms {
                    self.last_tick = Some(now_ms);
                    self.ticks += 1;
                    ScheduleDecision::Tick {
                        elapsed_ms: i64::try_from(since).unwrap_or(i64::MAX),
                    }
                } else {
                    let until_end = (started_at + self.duration_ms).saturating_sub(now_ms);
                    ScheduleDecision::Wait((self.interval_ms - since).min(until_end))
                }
            }
        }
    }
}
