use std::{fmt::Display, sync::Arc};

/// Error type a callback may hand back to the scheduler.
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a single callback invocation.
pub type TaskResult = Result<(), TaskError>;

/// Shared, zero-argument timer action.
pub type Callback = Arc<dyn Fn() -> TaskResult + Send + Sync>;

/// Handle identifying one registration. `0` is reserved and never issued.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub(crate) u32);

impl TimerId {
    /// The "no timer" handle.
    pub const NONE: TimerId = TimerId(0);

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One registration: when it fires next, how often, and how many times remain.
#[derive(Clone)]
pub struct TimerTask {
    pub handle: TimerId,
    pub next_fire_time: u64,
    pub period: u64,
    /// `1` fires once more then retires, `0` repeats until cancelled.
    pub remaining_calls: u32,
    pub callback: Callback,
}

impl TimerTask {
    pub fn new(
        handle: TimerId,
        now: u64,
        period: u64,
        remaining_calls: u32,
        callback: Callback,
    ) -> Self {
        Self {
            handle,
            next_fire_time: now.saturating_add(period),
            period,
            remaining_calls,
            callback,
        }
    }

    /// Re-anchors a task that has not fired yet onto `origin`.
    pub fn rebase(&mut self, origin: u64) {
        self.next_fire_time = origin.saturating_add(self.period);
    }

    pub fn is_due(&self, now: u64) -> bool {
        now >= self.next_fire_time
    }

    /// Whether the firing that just happened was the last one.
    pub fn is_exhausted(&self) -> bool {
        self.remaining_calls == 1
    }

    /// Consumes one firing and pushes the deadline out by one period.
    ///
    /// The deadline is advanced from the previous deadline rather than from the
    /// observed time, keeping a stable phase under late ticks.
    pub fn reschedule(&mut self) {
        if self.remaining_calls > 1 {
            self.remaining_calls -= 1;
        }
        self.next_fire_time = self.next_fire_time.saturating_add(self.period);
    }
}
