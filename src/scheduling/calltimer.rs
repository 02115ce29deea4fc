//! Tick-driven interval timer.
//!
//! `CallTimer` multiplexes any number of logical timers onto one periodic
//! `advance` call. New registrations land in a staging list and only become
//! scannable at the start of the next pass, so callbacks may register and
//! cancel timers freely while a pass is running.
//!
//! Lock order is `active`, then `staging`, then `handles`. No lock is held
//! while a callback runs.
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{
            AtomicBool, AtomicU64,
            Ordering::{AcqRel, Acquire, Release},
        },
        Arc,
    },
};

use parking_lot::Mutex;
use time::UtcOffset;

use crate::{
    clock::{local_offset, LocalTime, TimeSource},
    config::TimerConfig,
    logging::Reporter,
    TimerError,
};

use super::{
    handles::HandleAllocator,
    task::{Callback, TaskResult, TimerId, TimerTask},
    unit::{delay_to_millis, TimeUnit},
};

/// What a single `advance` pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// Tasks moved from staging into the active set.
    pub promoted: usize,
    /// Callbacks invoked, including ones that failed.
    pub fired: usize,
    /// Tasks removed because their last firing happened.
    pub retired: usize,
    pub failures: Vec<TimerError>,
}

pub struct CallTimer {
    // cancelled or retired slots stay `None` until the end of the pass
    active: Mutex<Vec<Option<TimerTask>>>,
    staging: Mutex<Vec<TimerTask>>,
    handles: Mutex<HandleAllocator>,
    now: AtomicU64,
    // false until a reading on the tick source's clock is known
    anchored: AtomicBool,
    scanning: AtomicBool,
    offset: UtcOffset,
    retire_on_failure: bool,
    reporter: Reporter,
}

impl CallTimer {
    pub fn new() -> Self {
        CallTimer::with_config(TimerConfig::default())
    }

    pub fn with_config(config: TimerConfig) -> Self {
        Self {
            active: Mutex::new(Vec::new()),
            staging: Mutex::new(Vec::new()),
            handles: Mutex::new(HandleAllocator::new(config.handle_limit)),
            now: AtomicU64::new(config.start_time.unwrap_or(0)),
            anchored: AtomicBool::new(config.start_time.is_some()),
            scanning: AtomicBool::new(false),
            offset: config.utc_offset.unwrap_or_else(local_offset),
            retire_on_failure: config.retire_on_failure,
            reporter: Reporter::default(),
        }
    }

    /// Starts the clock at `source`'s current reading.
    pub fn with_source<S: TimeSource + ?Sized>(config: TimerConfig, source: &S) -> Self {
        CallTimer::with_config(config.start_time(source.now_millis()))
    }

    /// Attaches a diagnostic sink for non-fatal anomalies.
    pub fn with_reporter<F>(mut self, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.reporter = Reporter::new(Some(Arc::new(sink)));
        self
    }

    /// Registers `callback` to fire after `delay` units, `repeat` times in total.
    /// A `repeat` of 0 fires until cancelled.
    pub fn set_interval<F>(
        &self,
        callback: F,
        delay: f64,
        repeat: u32,
        unit: TimeUnit,
    ) -> Result<TimerId, TimerError>
    where
        F: Fn() -> TaskResult + Send + Sync + 'static,
    {
        self.set_interval_shared(Arc::new(callback), delay, repeat, unit)
    }

    /// Like `set_interval`, for a callback the caller keeps a reference to.
    pub fn set_interval_shared(
        &self,
        callback: Callback,
        delay: f64,
        repeat: u32,
        unit: TimeUnit,
    ) -> Result<TimerId, TimerError> {
        let period = delay_to_millis(delay, unit)?;
        let handle = self.handles.lock().allocate()?;
        // read the clock under the staging lock so anchoring cannot slip between
        let mut staging = self.staging.lock();
        let task = TimerTask::new(handle, self.now(), period, repeat, callback);
        tracing::debug!(%handle, period, repeat, fire_at = task.next_fire_time, "timer registered");
        staging.push(task);
        Ok(handle)
    }

    /// Like `set_interval`, with the unit given by name (`"ms"`, `"seconds"`, ...).
    ///
    /// An unrecognized name is reported and the delay is taken as milliseconds.
    pub fn set_interval_in<F>(
        &self,
        callback: F,
        delay: f64,
        repeat: u32,
        unit: &str,
    ) -> Result<TimerId, TimerError>
    where
        F: Fn() -> TaskResult + Send + Sync + 'static,
    {
        let unit = unit.parse::<TimeUnit>().unwrap_or_else(|err| {
            self.reporter.report(&err);
            TimeUnit::Millisecond
        });
        self.set_interval(callback, delay, repeat, unit)
    }

    /// Cancels a staged or active timer. Returns `false` if `handle` is not live.
    pub fn clear_interval(&self, handle: TimerId) -> bool {
        if !self.handles.lock().is_live(handle) {
            return false;
        }
        let removed = {
            let mut active = self.active.lock();
            let mut staging = self.staging.lock();
            let removed = match active.iter_mut().find(|slot| matches!(slot, Some(t) if t.handle == handle)) {
                Some(slot) => slot.take(),
                None => staging.iter().position(|t| t.handle == handle).map(|idx| staging.remove(idx)),
            };
            if removed.is_some() {
                self.handles.lock().release(handle);
            }
            removed
        };
        // dropped outside the locks; a callback's captures may touch this timer
        tracing::debug!(%handle, found = removed.is_some(), "timer cancel");
        removed.is_some()
    }

    /// Reads `source` and runs one pass at that time.
    pub fn update<S: TimeSource + ?Sized>(&self, source: &S) -> TickSummary {
        self.advance(source.now_millis())
    }

    /// Runs one maturation pass at time `now`.
    ///
    /// Every due task fires at most once per pass, however many periods have
    /// elapsed. Callback failures are reported and collected, never propagated.
    pub fn advance(&self, now: u64) -> TickSummary {
        let mut summary = TickSummary::default();
        if self.scanning.swap(true, AcqRel) {
            self.reporter.report(&TimerError::ReentrantAdvance);
            summary.failures.push(TimerError::ReentrantAdvance);
            return summary;
        }
        let _pass = PassGuard(&self.scanning);

        self.anchor(now);
        summary.promoted = self.promote();
        let now = self.observe(now, &mut summary);

        let mut retiring = Vec::new();
        let mut idx = 0;
        loop {
            let (handle, callback) = {
                let active = self.active.lock();
                let Some(slot) = active.get(idx) else {
                    break;
                };
                idx += 1;
                match slot {
                    Some(task) if task.is_due(now) => (task.handle, Arc::clone(&task.callback)),
                    _ => continue,
                }
            };

            summary.fired += 1;
            let failed = match invoke(handle, &callback) {
                Ok(()) => false,
                Err(err) => {
                    self.reporter.report(&err);
                    summary.failures.push(err);
                    true
                }
            };

            let retired = {
                let mut active = self.active.lock();
                // slots only empty out mid-pass, they never move
                let slot = &mut active[idx - 1];
                let retire = match slot.as_mut() {
                    Some(task) if task.is_exhausted() || (failed && self.retire_on_failure) => true,
                    Some(task) => {
                        task.reschedule();
                        false
                    }
                    // cancelled while the callback ran
                    None => false,
                };
                if retire {
                    slot.take()
                } else {
                    None
                }
            };
            if let Some(task) = retired {
                tracing::debug!(handle = %task.handle, "timer retired");
                retiring.push(task.handle);
            }
        }

        self.active.lock().retain(Option::is_some);
        summary.retired = retiring.len();
        let mut handles = self.handles.lock();
        for handle in retiring {
            handles.release(handle);
        }
        drop(handles);

        tracing::trace!(now, ?summary, "timer pass complete");
        summary
    }

    /// On the first reading of an unanchored timer, makes it the origin for
    /// everything registered so far. Only staged tasks can exist before then.
    fn anchor(&self, now: u64) {
        if self.anchored.load(Acquire) {
            return;
        }
        let mut staging = self.staging.lock();
        for task in staging.iter_mut() {
            task.rebase(now);
        }
        self.now.store(now, Release);
        self.anchored.store(true, Release);
        tracing::debug!(origin = now, rebased = staging.len(), "timer clock anchored");
    }

    fn promote(&self) -> usize {
        let mut active = self.active.lock();
        let mut staging = self.staging.lock();
        let promoted = staging.len();
        active.extend(staging.drain(..).map(Some));
        promoted
    }

    fn observe(&self, now: u64, summary: &mut TickSummary) -> u64 {
        let last = self.now.load(Acquire);
        if now < last {
            let err = TimerError::ClockWentBackwards { last, now };
            self.reporter.report(&err);
            summary.failures.push(err);
            return last;
        }
        self.now.store(now, Release);
        now
    }

    /// Time recorded by the most recent pass.
    pub fn now(&self) -> u64 {
        self.now.load(Acquire)
    }

    /// Whether `handle` belongs to a staged or active timer.
    pub fn is_live(&self, handle: TimerId) -> bool {
        self.handles.lock().is_live(handle)
    }

    /// Number of live timers, staged or active.
    pub fn len(&self) -> usize {
        self.handles.lock().live_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of timers waiting to be promoted by the next pass.
    pub fn pending(&self) -> usize {
        self.staging.lock().len()
    }

    /// Calendar view (year, month, day, weekday, `HH:MM:SS`) of `now()`.
    pub fn local_time(&self) -> LocalTime {
        LocalTime::from_millis(self.now(), self.offset)
    }
}

struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Release);
    }
}

fn invoke(handle: TimerId, callback: &Callback) -> Result<(), TimerError> {
    match panic::catch_unwind(AssertUnwindSafe(|| callback())) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(TimerError::CallbackFailed {
            handle,
            reason: err.to_string(),
        }),
        Err(payload) => Err(TimerError::CallbackPanicked {
            handle,
            reason: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|msg| msg.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
