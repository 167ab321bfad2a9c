//! Replay Scheduler
//!
//! Re-emits a timeline through an injector with its original relative
//! timing, scaled by `speed`, for a number of repetitions.
//!
//! Each event is due at `timestamp / speed` after the repetition's own
//! origin. Waits are cut into short slices so a cancellation request is seen
//! within one slice. A scheduler that has fallen behind dispatches the late
//! event immediately and does not try to catch up; later events keep their
//! absolute offsets.

use super::cancel::CancellationToken;
use super::dispatch::Dispatcher;
use super::injector::InputInjector;
use super::observer::{ProgressThrottle, ReplayObserver, ReplayProgress, ReplayWarning};
use crate::time::Clock;
use crate::timeline::Timeline;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lowest speed multiplier the command surface accepts.
pub const MIN_SPEED: f64 = 0.1;

/// Highest speed multiplier the command surface accepts.
pub const MAX_SPEED: f64 = 10.0;

/// Longest single sleep while waiting for the next event.
pub const DEFAULT_WAIT_SLICE: Duration = Duration::from_millis(50);

/// Minimum spacing between progress notifications.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Clamp a user-supplied speed into `MIN_SPEED..=MAX_SPEED`.
pub fn clamp_speed(speed: f64) -> f64 {
    if speed.is_nan() {
        return 1.0;
    }
    speed.clamp(MIN_SPEED, MAX_SPEED)
}

/// Parameters for one replay run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    /// Playback speed multiplier (2.0 = twice as fast)
    pub speed: f64,
    pub repetitions: u32,
    pub wait_slice: Duration,
    pub progress_interval: Duration,
    /// Release keys and buttons still held by the replay when it ends
    pub release_held_on_exit: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            repetitions: 1,
            wait_slice: DEFAULT_WAIT_SLICE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            release_held_on_exit: true,
        }
    }
}

impl ReplayConfig {
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_repetitions(mut self, repetitions: u32) -> Self {
        self.repetitions = repetitions;
        self
    }

    pub fn validate(&self) -> crate::Result<()> {
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(crate::Error::InvalidReplay(format!(
                "speed must be a positive number, got {}",
                self.speed
            )));
        }
        if self.repetitions == 0 {
            return Err(crate::Error::InvalidReplay(
                "repetitions must be at least 1".into(),
            ));
        }
        if self.wait_slice.is_zero() {
            return Err(crate::Error::InvalidReplay(
                "wait slice must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// How a replay run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayStatus {
    Completed,
    Cancelled,
}

/// Outcome of a replay run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub status: ReplayStatus,
    /// Events injected successfully, over all repetitions
    pub dispatched: usize,
    /// Events whose injection failed
    pub failed: usize,
    pub repetitions_completed: u32,
    pub elapsed: Duration,
}

/// Sleep for `total` on `clock` in slices of at most `slice`, checking
/// `token` before every slice.
///
/// Returns `false` as soon as cancellation is observed, `true` once the full
/// duration has passed.
pub fn wait_cancellable(
    clock: &dyn Clock,
    total: Duration,
    slice: Duration,
    token: &CancellationToken,
) -> bool {
    let deadline = clock.now().saturating_add(total);
    loop {
        if token.is_cancelled() {
            return false;
        }
        let now = clock.now();
        if now >= deadline {
            return true;
        }
        clock.sleep((deadline - now).min(slice));
    }
}

/// Count down `secs` whole seconds, calling `on_tick` with the remaining
/// count before each one. Returns `false` if cancelled.
pub fn countdown(
    clock: &dyn Clock,
    secs: u32,
    token: &CancellationToken,
    mut on_tick: impl FnMut(u32),
) -> bool {
    for remaining in (1..=secs).rev() {
        on_tick(remaining);
        if !wait_cancellable(clock, Duration::from_secs(1), DEFAULT_WAIT_SLICE, token) {
            return false;
        }
    }
    !token.is_cancelled()
}

/// Drives replay of a timeline against a clock.
pub struct ReplayScheduler {
    clock: Arc<dyn Clock>,
    config: ReplayConfig,
}

impl ReplayScheduler {
    pub fn new(clock: Arc<dyn Clock>, config: ReplayConfig) -> Self {
        Self { clock, config }
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Offset from the repetition origin at which an event is due.
    fn target_offset(&self, timestamp: f64) -> Duration {
        Duration::try_from_secs_f64(timestamp / self.config.speed).unwrap_or(Duration::MAX)
    }

    /// Replay `timeline` through `injector`.
    ///
    /// Injection failures are reported to `observer` as warnings and replay
    /// moves on to the next event. Cancellation is a normal outcome reported
    /// in the returned status.
    ///
    /// # Errors
    /// `InvalidReplay` if the configuration is out of range.
    pub fn run(
        &self,
        timeline: &Timeline,
        injector: &mut dyn InputInjector,
        observer: &mut dyn ReplayObserver,
        token: &CancellationToken,
    ) -> crate::Result<ReplayReport> {
        self.config.validate()?;

        let clock = self.clock.as_ref();
        let started = clock.now();
        let total_events = timeline.len();
        let total_repetitions = self.config.repetitions;

        info!(
            events = total_events,
            speed = self.config.speed,
            repetitions = total_repetitions,
            "Starting replay"
        );

        let mut dispatcher = Dispatcher::new();
        let mut dispatched = 0;
        let mut failed = 0;
        let mut repetitions_completed = 0;
        let mut status = ReplayStatus::Completed;

        if timeline.is_empty() {
            debug!("Timeline is empty, nothing to replay");
            repetitions_completed = total_repetitions;
        } else {
            'repetitions: for repetition in 1..=total_repetitions {
                if token.is_cancelled() {
                    status = ReplayStatus::Cancelled;
                    break;
                }
                observer.on_repetition_start(repetition, total_repetitions);

                let origin = clock.now();
                let mut throttle = ProgressThrottle::new(self.config.progress_interval);

                for (index, event) in timeline.iter().enumerate() {
                    if token.is_cancelled() {
                        status = ReplayStatus::Cancelled;
                        break 'repetitions;
                    }

                    let target = self.target_offset(event.timestamp);
                    let elapsed = clock.now().saturating_sub(origin);
                    if target > elapsed
                        && !wait_cancellable(clock, target - elapsed, self.config.wait_slice, token)
                    {
                        status = ReplayStatus::Cancelled;
                        break 'repetitions;
                    }

                    match dispatcher.dispatch(event, injector) {
                        Ok(()) => dispatched += 1,
                        Err(err) => {
                            failed += 1;
                            let warning = ReplayWarning {
                                repetition,
                                index,
                                event_type: event.type_tag(),
                                message: err.to_string(),
                            };
                            observer.on_warning(&warning);
                        }
                    }

                    let boundary = index == 0 || index + 1 == total_events;
                    if throttle.should_notify(clock.now(), boundary) {
                        observer.on_progress(ReplayProgress {
                            index: index + 1,
                            total_events,
                            repetition,
                            total_repetitions,
                        });
                    }
                }

                repetitions_completed = repetition;
            }
        }

        if self.config.release_held_on_exit {
            let released = dispatcher.release_held(injector);
            if released > 0 {
                debug!(released, "Released inputs still held by replay");
            }
        }

        if failed > 0 {
            warn!(failed, "Some events could not be injected");
        }

        let report = ReplayReport {
            status,
            dispatched,
            failed,
            repetitions_completed,
            elapsed: clock.now().saturating_sub(started),
        };
        observer.on_finished(&report);
        Ok(report)
    }
}
