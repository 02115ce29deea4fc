use time::UtcOffset;

/// Construction-time settings for a `CallTimer`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimerConfig {
    /// Initial reading on the tick source's clock. When `None`, the first
    /// `advance` sets the origin and earlier registrations count from it.
    pub start_time: Option<u64>,
    /// Handles are issued in `1..handle_limit`, wrapping back to 1.
    pub handle_limit: u32,
    /// Offset for the calendar accessors. `None` uses the process's local offset.
    pub utc_offset: Option<UtcOffset>,
    /// Retire a task the first time its callback fails instead of keeping its schedule.
    pub retire_on_failure: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            start_time: None,
            handle_limit: u32::MAX,
            utc_offset: None,
            retire_on_failure: false,
        }
    }
}

impl TimerConfig {
    pub fn start_time(mut self, millis: u64) -> Self {
        self.start_time = Some(millis);
        self
    }

    pub fn handle_limit(mut self, limit: u32) -> Self {
        self.handle_limit = limit;
        self
    }

    pub fn utc_offset(mut self, offset: UtcOffset) -> Self {
        self.utc_offset = Some(offset);
        self
    }

    pub fn retire_on_failure(mut self, retire: bool) -> Self {
        self.retire_on_failure = retire;
        self
    }
}
