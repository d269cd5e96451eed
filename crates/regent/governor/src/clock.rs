//! Monotonic time source for the evaluation loop.
//!
//! Dwell and elapsed arithmetic runs on the monotonic stream; wall-clock
//! timestamps are derived from it, so ledger timestamps cannot move
//! backward on system clock correction. The wall clock is display and
//! persistence only.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::time::Instant;

/// A single observation of the governor clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickStamp {
    /// Seconds since the clock epoch on the monotonic stream.
    pub mono_s: f64,

    /// Wall-clock time derived from the monotonic stream.
    pub wall: DateTime<Utc>,
}

impl TickStamp {
    /// A stamp `seconds` later on both streams. Primarily for tests.
    pub fn offset(&self, seconds: f64) -> TickStamp {
        TickStamp {
            mono_s: self.mono_s + seconds,
            wall: self.wall + ChronoDuration::milliseconds((seconds * 1000.0) as i64),
        }
    }
}

/// Clock pairing a wall epoch with a monotonic epoch.
#[derive(Debug, Clone, Copy)]
pub struct GovernorClock {
    epoch_wall: DateTime<Utc>,
    epoch_mono: Instant,
}

impl GovernorClock {
    /// Anchor a new clock at the current instant.
    pub fn start() -> Self {
        Self {
            epoch_wall: Utc::now(),
            epoch_mono: Instant::now(),
        }
    }

    /// Observe the clock.
    pub fn now(&self) -> TickStamp {
        let elapsed = self.epoch_mono.elapsed();
        TickStamp {
            mono_s: elapsed.as_secs_f64(),
            wall: self.epoch_wall + ChronoDuration::milliseconds(elapsed.as_millis() as i64),
        }
    }

    /// Wall time the clock was anchored at.
    pub fn epoch_wall(&self) -> DateTime<Utc> {
        self.epoch_wall
    }

    /// Monotonic offset of a wall timestamp relative to the epoch.
    ///
    /// Negative for timestamps that predate this clock; used when
    /// re-anchoring dwell from a replayed ledger.
    pub fn mono_of_wall(&self, wall: DateTime<Utc>) -> f64 {
        (wall - self.epoch_wall).num_milliseconds() as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_follows_the_monotonic_stream() {
        let clock = GovernorClock::start();
        let a = clock.now();
        let b = clock.now();
        assert!(b.mono_s >= a.mono_s);
        assert!(b.wall >= a.wall);
    }

    #[test]
    fn offset_advances_both_streams() {
        let clock = GovernorClock::start();
        let stamp = clock.now();
        let later = stamp.offset(120.0);
        assert!((later.mono_s - stamp.mono_s - 120.0).abs() < 1e-9);
        assert_eq!(later.wall - stamp.wall, ChronoDuration::seconds(120));
    }

    #[test]
    fn past_wall_times_map_to_negative_offsets() {
        let clock = GovernorClock::start();
        let before = clock.epoch_wall() - ChronoDuration::seconds(30);
        assert!(clock.mono_of_wall(before) < 0.0);
    }
}
