//! Diagnostic reporting for timer anomalies.
//!
//! Every anomaly is emitted as a `tracing` event. A host may additionally hook
//! a plain string sink, which receives the message prefixed with `CallTimer Log: `.
use std::sync::Arc;

use crate::TimerError;

/// Host-provided diagnostic sink.
pub type ReportFn = Arc<dyn Fn(&str) + Send + Sync>;

const PREFIX: &str = "CallTimer Log: ";

#[derive(Clone, Default)]
pub struct Reporter {
    sink: Option<ReportFn>,
}

impl Reporter {
    pub fn new(sink: Option<ReportFn>) -> Self {
        Self { sink }
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Reports a non-fatal anomaly.
    pub fn report(&self, err: &TimerError) {
        tracing::warn!(error = %err, "timer anomaly");
        if let Some(sink) = &self.sink {
            sink(&format!("{PREFIX}{err}"));
        }
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("sink", &self.sink.is_some())
            .finish()
    }
}
