//! # Identifier Generator
//!
//! Two 64-bit identifier layouts, both time-ordered:
//!
//! ```text
//! IdStruct          | process (14) | seconds since 2022 (30) | value (20) |
//! InstanceIdStruct  |      seconds since 2022 (32)    |    value (32)    |
//! ```
//!
//! The 20-bit value rolls over silently. Ids stay ordered only while fewer
//! than 2^20 of them are issued within one second.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::clock::FrameClock;
use super::Id;

/// Mask for the 14-bit process field.
pub const MASK_14BIT: u64 = 0x3fff;
/// Mask for the 30-bit time field.
pub const MASK_30BIT: u64 = 0x3fff_ffff;
/// Mask for the 20-bit value field.
pub const MASK_20BIT: u64 = 0xf_ffff;

/// Largest value issued before the sequence resets to 0.
const MAX_VALUE: u32 = 0xf_fffe;

/// 2022-01-01T00:00:00Z in epoch milliseconds.
pub const EPOCH_2022_MILLIS: i64 = 1_640_995_200_000;

/// Process tag stamped into every long-lived identifier by default.
pub const DEFAULT_PROCESS: u16 = 1;

/// Unpacked long-lived identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IdStruct {
    /// Process/shard tag (14 bits).
    pub process: u16,
    /// Seconds since 2022 (30 bits).
    pub time: u32,
    /// Rolling sequence value (20 bits).
    pub value: u32,
}

impl IdStruct {
    /// Creates an identifier from its parts.
    #[inline]
    #[must_use]
    pub const fn new(time: u32, process: u16, value: u32) -> Self {
        Self {
            process,
            time,
            value,
        }
    }

    /// Packs the parts into one identifier. Fields are truncated to their widths.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn to_long(self) -> Id {
        let mut result = (self.process as u64) & MASK_14BIT;
        result <<= 30;
        result |= (self.time as u64) & MASK_30BIT;
        result <<= 20;
        result |= (self.value as u64) & MASK_20BIT;
        result as Id
    }

    /// Unpacks an identifier.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub const fn from_long(id: Id) -> Self {
        let mut result = id as u64;
        let value = (result & MASK_20BIT) as u32;
        result >>= 20;
        let time = (result & MASK_30BIT) as u32;
        result >>= 30;
        let process = (result & MASK_14BIT) as u16;
        Self {
            process,
            time,
            value,
        }
    }
}

impl fmt::Display for IdStruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "process: {}, time: {}, value: {}",
            self.process, self.time, self.value
        )
    }
}

/// Unpacked short-lived instance identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct InstanceIdStruct {
    /// Seconds since 2022.
    pub time: u32,
    /// Atomic sequence value.
    pub value: u32,
}

impl InstanceIdStruct {
    /// Creates an instance identifier from its parts.
    #[inline]
    #[must_use]
    pub const fn new(time: u32, value: u32) -> Self {
        Self { time, value }
    }

    /// Packs the parts into one identifier.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn to_long(self) -> Id {
        (((self.time as u64) << 32) | (self.value as u64)) as Id
    }

    /// Unpacks an instance identifier.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub const fn from_long(id: Id) -> Self {
        let raw = id as u64;
        Self {
            time: (raw >> 32) as u32,
            value: raw as u32,
        }
    }
}

impl fmt::Display for InstanceIdStruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "time: {}, value: {}", self.time, self.value)
    }
}

/// Issues identifiers stamped with the frame clock.
///
/// # Thread Safety
///
/// `generate_id` serializes on a short lock; `generate_instance_id` is a
/// single atomic increment.
#[derive(Debug)]
pub struct IdGenerator {
    clock: Arc<FrameClock>,
    process: u16,
    value: Mutex<u32>,
    instance_value: AtomicU32,
}

impl IdGenerator {
    /// Creates a generator for the given process tag.
    #[must_use]
    pub fn new(clock: Arc<FrameClock>, process: u16) -> Self {
        Self {
            clock,
            process,
            value: Mutex::new(0),
            instance_value: AtomicU32::new(0),
        }
    }

    /// The clock identifiers are stamped with.
    #[inline]
    #[must_use]
    pub fn clock(&self) -> &Arc<FrameClock> {
        &self.clock
    }

    /// Process tag stamped into long-lived identifiers.
    #[inline]
    #[must_use]
    pub const fn process(&self) -> u16 {
        self.process
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn time_since_2022(&self) -> u32 {
        ((self.clock.frame_time() - EPOCH_2022_MILLIS) / 1000).max(0) as u32
    }

    /// Issues a long-lived identifier.
    ///
    /// The value field pre-increments and resets to 0 once it would pass
    /// `MASK_20BIT - 1`.
    pub fn generate_id(&self) -> Id {
        let time = self.time_since_2022();
        let value = {
            let mut value = self.value.lock();
            *value += 1;
            if *value > MAX_VALUE {
                *value = 0;
            }
            *value
        };
        IdStruct::new(time, self.process, value).to_long()
    }

    /// Issues a short-lived instance identifier. Safe for concurrent callers.
    pub fn generate_instance_id(&self) -> Id {
        let time = self.time_since_2022();
        let value = self
            .instance_value
            .fetch_add(1, Ordering::Relaxed)
            .wrapping_add(1);
        InstanceIdStruct::new(time, value).to_long()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: i64 = EPOCH_2022_MILLIS + 86_400_000;

    fn generator() -> IdGenerator {
        IdGenerator::new(Arc::new(FrameClock::fixed(FRAME)), DEFAULT_PROCESS)
    }

    #[test]
    fn test_id_struct_roundtrip() {
        let id = IdStruct::new(0x2abc_def0, 0x1fff, 0xf_0f0f);
        assert_eq!(IdStruct::from_long(id.to_long()), id);
    }

    #[test]
    fn test_instance_id_roundtrip() {
        let id = InstanceIdStruct::new(u32::MAX, 7);
        assert_eq!(InstanceIdStruct::from_long(id.to_long()), id);
    }

    #[test]
    fn test_generated_id_carries_process_and_time() {
        let ids = generator();
        let parts = IdStruct::from_long(ids.generate_id());

        assert_eq!(parts.process, DEFAULT_PROCESS);
        assert_eq!(parts.time, 86_400);
        assert_eq!(parts.value, 1);
    }

    #[test]
    fn test_counter_wraps_without_panicking() {
        let ids = generator();
        let mut last = 0;
        for _ in 0..MASK_20BIT {
            last = IdStruct::from_long(ids.generate_id()).value;
        }
        // 0xFFFFE is the last value before the reset
        assert_eq!(last, 0);
        assert_eq!(IdStruct::from_long(ids.generate_id()).value, 1);
    }

    #[test]
    fn test_instance_ids_are_distinct_across_threads() {
        let ids = Arc::new(generator());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || {
                    (0..1000).map(|_| ids.generate_instance_id()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<Id> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 4000);
    }
}
