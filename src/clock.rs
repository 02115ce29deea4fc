//! Time sources and the calendar view of the scheduler's clock.
//!
//! The scheduler never reads a clock on its own. Hosts either pass readings to
//! `CallTimer::advance` directly or hand a `TimeSource` to `CallTimer::update`.
use std::{
    sync::{
        atomic::{AtomicU64, Ordering::Acquire, Ordering::Release},
        Arc,
    },
    time::{SystemTime, UNIX_EPOCH},
};

use time::{OffsetDateTime, UtcOffset};

// 9999-12-30T00:00:00Z; leaves room for any UTC offset inside the calendar range.
const MAX_CALENDAR_MILLIS: u64 = 253_402_128_000_000;

/// Anything able to report the current time in milliseconds.
///
/// Readings must be non-decreasing across calls.
pub trait TimeSource {
    fn now_millis(&self) -> u64;
}

/// Milliseconds since the Unix epoch, UTC.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// A clock moved only by its owner. Useful for hosts with their own frame time.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            millis: AtomicU64::new(start),
        }
    }

    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Release);
    }

    /// Moves the clock forward by `millis`, returning the new reading.
    pub fn advance(&self, millis: u64) -> u64 {
        let next = self.now_millis().saturating_add(millis);
        self.set(next);
        next
    }
}

impl TimeSource for ManualClock {
    fn now_millis(&self) -> u64 {
        self.millis.load(Acquire)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now_millis(&self) -> u64 {
        (**self).now_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn now_millis(&self) -> u64 {
        (**self).now_millis()
    }
}

/// Calendar fields of an epoch-millisecond reading in a fixed offset.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LocalTime(OffsetDateTime);

impl LocalTime {
    /// Interprets `millis` as time since the Unix epoch. Readings past the
    /// calendar range clamp to the latest representable instant.
    pub fn from_millis(millis: u64, offset: UtcOffset) -> Self {
        let nanos = i128::from(millis.min(MAX_CALENDAR_MILLIS)) * 1_000_000;
        let utc = OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);
        LocalTime(utc.to_offset(offset))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Month of year, 1 through 12.
    pub fn month(&self) -> u8 {
        u8::from(self.0.month())
    }

    pub fn day(&self) -> u8 {
        self.0.day()
    }

    /// Day of week with Sunday as 0.
    pub fn day_of_week(&self) -> u8 {
        self.0.weekday().number_days_from_sunday()
    }

    /// `HH:MM:SS`, zero padded.
    pub fn time_str(&self) -> String {
        format!(
            "{:02}:{:02}:{:02}",
            self.0.hour(),
            self.0.minute(),
            self.0.second()
        )
    }

    pub fn date_time(&self) -> OffsetDateTime {
        self.0
    }
}

/// The process's local offset, or UTC when it cannot be determined.
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}
