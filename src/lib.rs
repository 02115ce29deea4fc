//! Tick-driven interval timers.
//!
//! A `CallTimer` lets callers register a callback to run once or repeatedly
//! after a delay, and cancel it later by the returned `TimerId`. The host
//! drives it by calling `advance` (or `update` with a `TimeSource`) once per
//! frame or fixed interval; the timer itself never reads a clock.
use thiserror::Error;

pub mod clock;
pub mod config;
pub mod driver;
pub mod logging;
pub mod scheduling;

pub use clock::{LocalTime, ManualClock, SystemClock, TimeSource};
pub use config::TimerConfig;
pub use driver::Ticker;
pub use scheduling::{
    calltimer::{CallTimer, TickSummary},
    task::{Callback, TaskError, TaskResult, TimerId},
    unit::TimeUnit,
};

/// Error type for the timer and its helpers
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("Invalid delay {0}, must be finite and non-negative")]
    InvalidDelay(String),
    #[error("Unknown time unit `{0}`, delay left unconverted")]
    UnknownTimeUnit(String),
    #[error("No free handles, {0} timers are live")]
    HandlesExhausted(usize),
    #[error("Callback for timer {handle} failed: {reason}")]
    CallbackFailed { handle: TimerId, reason: String },
    #[error("Callback for timer {handle} panicked: {reason}")]
    CallbackPanicked { handle: TimerId, reason: String },
    #[error("advance called while a pass is already running; nested pass skipped")]
    ReentrantAdvance,
    #[error("Clock went backwards from {last} to {now}, holding at {last}")]
    ClockWentBackwards { last: u64, now: u64 },
    #[error("Failed to spawn the ticker thread ({kind:?}): {reason}")]
    TickerSpawn {
        kind: std::io::ErrorKind,
        reason: String,
    },
}
