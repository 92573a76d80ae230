//! Simulation time services
//!
//! A [`TimeService`] supplies the simulation start epoch and a single
//! "wait until timestamp" operation. It is the only suspension point of
//! the whole engine: the event loop is identical whether a run is paced
//! to a human observer ([`RealtimeClock`]) or executed as fast as
//! possible for deterministic batch analysis ([`InstantClock`]).

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Grace period applied to realtime waits so input-device events for a
/// given instant have arrived before it is processed (µs)
const INPUT_GRACE_US: u64 = 50_000;

/// Start epoch plus a way to wait for a simulation timestamp
pub trait TimeService: Send {
    /// Epoch captured at construction, in µs
    ///
    /// Wall-clock µs since the Unix epoch for realtime pacing, 0 for
    /// batch runs. Sources use this to map device event timestamps onto
    /// simulation time.
    fn start_epoch(&self) -> u64;

    /// Block the calling thread until simulation time `ts` (µs) is due
    fn wait_until(&self, ts: u64);
}

/// Batch time service: no waiting, fully deterministic
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantClock;

impl TimeService for InstantClock {
    fn start_epoch(&self) -> u64 {
        0
    }

    fn wait_until(&self, _ts: u64) {}
}

/// Wall-clock paced time service
///
/// Waits until wall-clock time since construction reaches
/// `ts + INPUT_GRACE_US`, running the simulation a fixed 50 ms behind
/// realtime so device events have arrived. Never blocks when already
/// past due.
#[derive(Debug)]
pub struct RealtimeClock {
    epoch_us: u64,
    started: Instant,
}

impl RealtimeClock {
    /// Capture the current wall-clock time as the simulation epoch
    pub fn new() -> Self {
        let epoch_us = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);
        Self {
            epoch_us,
            started: Instant::now(),
        }
    }
}

impl Default for RealtimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeService for RealtimeClock {
    fn start_epoch(&self) -> u64 {
        self.epoch_us
    }

    fn wait_until(&self, ts: u64) {
        let target = ts + INPUT_GRACE_US;
        let elapsed = self.started.elapsed().as_micros() as u64;
        if target > elapsed {
            std::thread::sleep(Duration::from_micros(target - elapsed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instant_clock_is_immediate() {
        let clock = InstantClock;
        assert_eq!(clock.start_epoch(), 0);

        let before = Instant::now();
        clock.wait_until(10_000_000);
        assert!(before.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_realtime_clock_epoch_is_wall_clock() {
        let clock = RealtimeClock::new();
        assert!(clock.start_epoch() > 0);
    }

    #[test]
    fn test_realtime_clock_waits_for_grace_period() {
        let clock = RealtimeClock::new();
        let before = Instant::now();
        clock.wait_until(0);
        // Timestamp 0 is due 50 ms after construction.
        assert!(before.elapsed() >= Duration::from_millis(45));
    }

    #[test]
    fn test_realtime_clock_does_not_block_when_past_due() {
        let clock = RealtimeClock::new();
        std::thread::sleep(Duration::from_millis(60));
        let before = Instant::now();
        clock.wait_until(0);
        assert!(before.elapsed() < Duration::from_millis(20));
    }
}
