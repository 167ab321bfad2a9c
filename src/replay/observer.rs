//! Replay progress reporting

use super::scheduler::{ReplayReport, ReplayStatus};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Position of the most recently dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayProgress {
    /// 1-based position of the event within its repetition
    pub index: usize,
    pub total_events: usize,
    /// 1-based repetition number
    pub repetition: u32,
    pub total_repetitions: u32,
}

impl ReplayProgress {
    /// Fraction of the whole replay (all repetitions) that has been dispatched.
    pub fn fraction(&self) -> f64 {
        let total = self.total_events as f64 * f64::from(self.total_repetitions);
        if total == 0.0 {
            return 1.0;
        }
        let done = (f64::from(self.repetition) - 1.0) * self.total_events as f64 + self.index as f64;
        (done / total).clamp(0.0, 1.0)
    }
}

/// A recoverable problem during replay.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayWarning {
    pub repetition: u32,
    /// 0-based index of the event that failed
    pub index: usize,
    pub event_type: &'static str,
    pub message: String,
}

/// Callbacks invoked on the replay thread. All methods default to no-ops.
pub trait ReplayObserver {
    fn on_repetition_start(&mut self, _repetition: u32, _total_repetitions: u32) {}

    fn on_progress(&mut self, _progress: ReplayProgress) {}

    fn on_warning(&mut self, _warning: &ReplayWarning) {}

    fn on_finished(&mut self, _report: &ReplayReport) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ReplayObserver for NoopObserver {}

/// Observer that reports through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ReplayObserver for TracingObserver {
    fn on_repetition_start(&mut self, repetition: u32, total_repetitions: u32) {
        info!("Repetition {repetition}/{total_repetitions}");
    }

    fn on_progress(&mut self, progress: ReplayProgress) {
        debug!(
            "Progress: {}/{} (repetition {}/{}, {:.0}%)",
            progress.index,
            progress.total_events,
            progress.repetition,
            progress.total_repetitions,
            progress.fraction() * 100.0
        );
    }

    fn on_warning(&mut self, warning: &ReplayWarning) {
        warn!(
            repetition = warning.repetition,
            index = warning.index,
            event = warning.event_type,
            "Injection failed: {}",
            warning.message
        );
    }

    fn on_finished(&mut self, report: &ReplayReport) {
        match report.status {
            ReplayStatus::Completed => info!(
                "Replay completed: {} events dispatched, {} failed in {:.2}s",
                report.dispatched,
                report.failed,
                report.elapsed.as_secs_f64()
            ),
            ReplayStatus::Cancelled => info!(
                "Replay cancelled after {} events ({} repetitions completed)",
                report.dispatched, report.repetitions_completed
            ),
        }
    }
}

/// Rate limiter for progress notifications.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    interval: Duration,
    last: Option<Duration>,
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Whether to notify at clock time `now`. `force` bypasses the interval.
    pub fn should_notify(&mut self, now: Duration, force: bool) -> bool {
        let due = match self.last {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.interval,
        };
        if force || due {
            self.last = Some(now);
            true
        } else {
            false
        }
    }
}
