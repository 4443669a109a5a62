//! # Frame Clock
//!
//! Process-wide frame time. The host loop calls [`FrameClock::update`]
//! once per tick, so everything stamped during a frame sees the same time.

use std::sync::atomic::{AtomicI32, AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Frame-stable wall clock in milliseconds since the Unix epoch.
#[derive(Debug)]
pub struct FrameClock {
    /// Time captured at the last [`FrameClock::update`].
    frame_time: AtomicI64,
    /// Offset in hours applied by the local-time helpers.
    time_zone: AtomicI32,
}

impl FrameClock {
    /// Creates a clock whose frame time is the current wall time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frame_time: AtomicI64::new(Self::client_now()),
            time_zone: AtomicI32::new(0),
        }
    }

    /// Creates a clock pinned to a fixed frame time.
    ///
    /// Useful for hosts that drive time themselves and for deterministic tests.
    #[must_use]
    pub fn fixed(frame_time: i64) -> Self {
        Self {
            frame_time: AtomicI64::new(frame_time),
            time_zone: AtomicI32::new(0),
        }
    }

    /// Current wall time in milliseconds since the Unix epoch.
    ///
    /// Thread-safe; does not touch the frame time.
    #[must_use]
    pub fn client_now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
    }

    /// Captures the wall time as the new frame time.
    pub fn update(&self) {
        self.frame_time.store(Self::client_now(), Ordering::Release);
    }

    /// Overrides the frame time.
    pub fn set_frame_time(&self, frame_time: i64) {
        self.frame_time.store(frame_time, Ordering::Release);
    }

    /// Time captured at the last update, in epoch milliseconds.
    #[inline]
    #[must_use]
    pub fn frame_time(&self) -> i64 {
        self.frame_time.load(Ordering::Acquire)
    }

    /// Time zone offset in hours.
    #[inline]
    #[must_use]
    pub fn time_zone(&self) -> i32 {
        self.time_zone.load(Ordering::Relaxed)
    }

    /// Sets the time zone offset in hours.
    pub fn set_time_zone(&self, hours: i32) {
        self.time_zone.store(hours, Ordering::Relaxed);
    }

    /// Converts an epoch timestamp into local milliseconds.
    #[must_use]
    pub fn to_local_millis(&self, timestamp: i64) -> i64 {
        timestamp + i64::from(self.time_zone()) * MILLIS_PER_HOUR
    }

    /// Converts local milliseconds back into an epoch timestamp.
    #[must_use]
    pub fn transition(&self, local_millis: i64) -> i64 {
        local_millis - i64::from(self.time_zone()) * MILLIS_PER_HOUR
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_time_is_stable_until_update() {
        let clock = FrameClock::fixed(1_000);
        assert_eq!(clock.frame_time(), 1_000);
        assert_eq!(clock.frame_time(), 1_000);

        clock.update();
        assert!(clock.frame_time() > 1_000);
    }

    #[test]
    fn test_time_zone_round_trip() {
        let clock = FrameClock::fixed(0);
        clock.set_time_zone(8);

        let local = clock.to_local_millis(1_700_000_000_000);
        assert_eq!(local - 1_700_000_000_000, 8 * MILLIS_PER_HOUR);
        assert_eq!(clock.transition(local), 1_700_000_000_000);
    }
}
