//! Caller-facing time units and their conversion into the scheduler's internal
//! millisecond base.
use std::str::FromStr;

use crate::TimerError;

/// Unit a registration delay is expressed in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    #[default]
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
}

impl FromStr for TimeUnit {
    type Err = TimerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = match s.trim().to_ascii_lowercase().as_str() {
            "ms" | "millis" | "millisecond" | "milliseconds" => TimeUnit::Millisecond,
            "s" | "sec" | "secs" | "second" | "seconds" => TimeUnit::Second,
            "m" | "min" | "mins" | "minute" | "minutes" => TimeUnit::Minute,
            "h" | "hr" | "hour" | "hours" => TimeUnit::Hour,
            "d" | "day" | "days" => TimeUnit::Day,
            _ => return Err(TimerError::UnknownTimeUnit(s.to_string())),
        };
        Ok(unit)
    }
}

/// Validates a caller delay and rounds it to whole internal milliseconds.
///
/// The result is used both for the first deadline and as the repeat period, so
/// rounding happens exactly once per registration.
pub fn delay_to_millis(delay: f64, unit: TimeUnit) -> Result<u64, TimerError> {
    if !delay.is_finite() || delay < 0.0 {
        return Err(TimerError::InvalidDelay(delay.to_string()));
    }
    let per_unit = match unit {
        TimeUnit::Millisecond => 1.0,
        TimeUnit::Second => 1_000.0,
        TimeUnit::Minute => 60_000.0,
        TimeUnit::Hour => 3_600_000.0,
        TimeUnit::Day => 86_400_000.0,
    };
    let millis = (delay * per_unit).round();
    if millis >= u64::MAX as f64 {
        return Ok(u64::MAX);
    }
    Ok(millis as u64)
}
