//! A background thread standing in for a host's frame loop.
use std::{
    sync::{
        atomic::{AtomicBool, Ordering::Acquire, Ordering::Release},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::{clock::TimeSource, scheduling::calltimer::CallTimer, TimerError};

/// Calls `CallTimer::update` every `cadence` until stopped or dropped.
#[derive(Debug)]
pub struct Ticker {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn<S>(timer: Arc<CallTimer>, source: S, cadence: Duration) -> Result<Self, TimerError>
    where
        S: TimeSource + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name("calltimer-tick".to_string())
            .spawn(move || {
                tracing::debug!(?cadence, "ticker started");
                while !flag.load(Acquire) {
                    timer.update(&source);
                    thread::sleep(cadence);
                }
                tracing::debug!("ticker stopped");
            })
            .map_err(|err| TimerError::TickerSpawn {
                kind: err.kind(),
                reason: err.to_string(),
            })?;
        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }

    /// Stops the loop and waits for the in-flight pass to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("ticker thread panicked");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
