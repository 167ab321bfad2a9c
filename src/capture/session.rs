//! Capture Session
//!
//! Owns one recording from start to stop: `Idle -> Recording -> Stopped`.
//! A session can also be armed first (`Idle -> Armed -> Recording`): it
//! listens to the source but records nothing until the start chord arrives.
//!
//! Raw events are pushed into the session through a [`RawEventSink`] from
//! whatever thread the input source delivers on. Sampling the clock,
//! filtering and appending all happen under one mutex, so deliveries from
//! several threads land in the timeline in timestamp order. The source's
//! subscription handle lives outside that mutex and is released after it, so
//! a delivery thread blocked on the lock can never deadlock a `stop()`.

use super::filter::MoveFilter;
use super::hotkey::{HotkeyBindings, HotkeyMatcher, HotkeyTrigger};
use super::raw::{normalize, RawInputEvent};
use super::types::Event;
use crate::time::Clock;
use crate::timeline::store::{iso_now, Timeline};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Lifecycle of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// Subscribed and waiting for the start hotkey
    Armed,
    Recording,
    Stopped,
}

/// Handle to an active input-source subscription.
pub trait Subscription: Send {
    /// Stop delivering events. Called at most once.
    fn cancel(&mut self);
}

/// Push-based producer of raw input notifications.
pub trait InputSource: Send {
    /// Begin delivering events into `sink`.
    ///
    /// # Errors
    /// Permission or OS hook failures, surfaced before any recording starts.
    fn subscribe(&mut self, sink: RawEventSink) -> crate::Result<Box<dyn Subscription>>;
}

struct Inner {
    state: SessionState,
    origin: Duration,
    timeline: Timeline,
    last_move: Option<Event>,
    hotkeys: Option<HotkeyMatcher>,
    suppressed: u64,
}

struct Shared {
    clock: Arc<dyn Clock>,
    filter: MoveFilter,
    inner: Mutex<Inner>,
}

impl Shared {
    /// Enter `Recording` with a fresh origin and an empty timeline.
    fn begin(&self, inner: &mut Inner) {
        inner.origin = self.clock.now();
        inner.timeline = Timeline::starting_now();
        inner.last_move = None;
        inner.suppressed = 0;
        inner.state = SessionState::Recording;
    }

    fn finish(inner: &mut Inner) {
        inner.state = SessionState::Stopped;
        inner.timeline.set_end_time(iso_now());
        info!(
            events = inner.timeline.len(),
            suppressed_moves = inner.suppressed,
            duration = inner.timeline.duration(),
            "Capture session stopped"
        );
    }

    fn deliver(&self, raw: RawInputEvent) -> crate::Result<Option<Event>> {
        let mut inner = self.inner.lock();

        if inner.state == SessionState::Armed {
            match inner.hotkeys.as_ref().and_then(|m| m.match_raw(&raw)) {
                Some(HotkeyTrigger::Start) => {
                    info!("Start hotkey pressed");
                    self.begin(&mut inner);
                }
                Some(HotkeyTrigger::EmergencyStop) => {
                    info!("Emergency stop before recording started");
                    Self::finish(&mut inner);
                }
                _ => trace!("Waiting for the start hotkey"),
            }
            return Ok(None);
        }

        if inner.state != SessionState::Recording {
            trace!(state = ?inner.state, "Dropping raw event outside recording");
            return Ok(None);
        }

        if let Some(trigger) = inner.hotkeys.as_ref().and_then(|m| m.match_raw(&raw)) {
            match trigger {
                HotkeyTrigger::Start => debug!("Start hotkey while already recording; ignored"),
                HotkeyTrigger::Stop | HotkeyTrigger::EmergencyStop => {
                    info!(?trigger, "Stop hotkey pressed");
                    Self::finish(&mut inner);
                }
            }
            return Ok(None);
        }

        let elapsed = self.clock.secs_since(inner.origin);
        let event = normalize(&raw, elapsed);

        if !self.filter.is_significant(&event, inner.last_move.as_ref()) {
            inner.suppressed += 1;
            return Ok(None);
        }

        inner.timeline.append(event.clone())?;
        if event.is_mouse_move() {
            inner.last_move = Some(event.clone());
        }
        trace!(kind = event.type_tag(), t = event.timestamp, "Captured event");
        Ok(Some(event))
    }
}

/// Cloneable handle through which an input source delivers raw events.
#[derive(Clone)]
pub struct RawEventSink {
    shared: Arc<Shared>,
}

impl RawEventSink {
    /// Deliver one raw event; see [`CaptureSession::on_raw_event`].
    pub fn deliver(&self, raw: RawInputEvent) -> crate::Result<Option<Event>> {
        self.shared.deliver(raw)
    }

    /// Whether the session is still accepting events.
    pub fn is_recording(&self) -> bool {
        self.shared.inner.lock().state == SessionState::Recording
    }
}

impl std::fmt::Debug for RawEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawEventSink").finish_non_exhaustive()
    }
}

/// One recording, from start trigger to stop trigger.
pub struct CaptureSession {
    shared: Arc<Shared>,
    source: Mutex<Box<dyn InputSource>>,
    subscription: Mutex<Option<Box<dyn Subscription>>>,
}

impl CaptureSession {
    /// Create an idle session reading from `source`.
    pub fn new(source: Box<dyn InputSource>, clock: Arc<dyn Clock>, filter: MoveFilter) -> Self {
        Self {
            shared: Arc::new(Shared {
                clock,
                filter,
                inner: Mutex::new(Inner {
                    state: SessionState::Idle,
                    origin: Duration::ZERO,
                    timeline: Timeline::starting_now(),
                    last_move: None,
                    hotkeys: None,
                    suppressed: 0,
                }),
            }),
            source: Mutex::new(source),
            subscription: Mutex::new(None),
        }
    }

    /// Consume key-downs matching `bindings` as stop / emergency-stop
    /// triggers instead of recording them.
    pub fn with_hotkeys(self, bindings: HotkeyBindings) -> Self {
        self.shared.inner.lock().hotkeys = Some(HotkeyMatcher::new(bindings));
        self
    }

    pub fn state(&self) -> SessionState {
        self.shared.inner.lock().state
    }

    pub fn is_recording(&self) -> bool {
        self.state() == SessionState::Recording
    }

    /// Number of events captured so far.
    pub fn event_count(&self) -> usize {
        self.shared.inner.lock().timeline.len()
    }

    /// Number of mouse moves dropped by the significance filter.
    pub fn suppressed_count(&self) -> u64 {
        self.shared.inner.lock().suppressed
    }

    /// Handle for delivering raw events into this session.
    pub fn sink(&self) -> RawEventSink {
        RawEventSink {
            shared: Arc::clone(&self.shared),
        }
    }

    /// `Idle -> Armed`: subscribe to the source and wait for the start
    /// hotkey. Nothing is recorded until the chord arrives; the chord itself
    /// is consumed. An emergency stop while armed ends the session empty.
    ///
    /// # Errors
    /// `SessionState` if the session is not idle or has no hotkeys; any
    /// subscription failure from the source, in which case the session stays
    /// idle.
    pub fn arm(&self) -> crate::Result<()> {
        {
            let mut inner = self.shared.inner.lock();
            if inner.state != SessionState::Idle {
                return Err(crate::Error::SessionState(format!(
                    "cannot arm a session that is {:?}",
                    inner.state
                )));
            }
            if inner.hotkeys.is_none() {
                return Err(crate::Error::SessionState(
                    "cannot arm a session without hotkeys".to_string(),
                ));
            }
            inner.state = SessionState::Armed;
        }

        self.subscribe()?;
        info!("Capture session armed, waiting for the start hotkey");
        Ok(())
    }

    /// `Idle | Armed -> Recording`: stamp the origin and, unless already
    /// armed, subscribe to the source.
    ///
    /// # Errors
    /// `SessionState` if the session is neither idle nor armed; any
    /// subscription failure from the source, in which case the session stays
    /// idle.
    pub fn start(&self) -> crate::Result<()> {
        let armed = {
            let mut inner = self.shared.inner.lock();
            let armed = match inner.state {
                SessionState::Idle => false,
                SessionState::Armed => true,
                other => {
                    return Err(crate::Error::SessionState(format!(
                        "cannot start a session that is {other:?}"
                    )))
                }
            };
            // Recording before subscribing, so the first deliveries count.
            self.shared.begin(&mut inner);
            armed
        };

        if !armed {
            self.subscribe()?;
        }
        info!("Capture session started");
        Ok(())
    }

    fn subscribe(&self) -> crate::Result<()> {
        let subscription = match self.source.lock().subscribe(self.sink()) {
            Ok(subscription) => subscription,
            Err(e) => {
                let mut inner = self.shared.inner.lock();
                inner.state = SessionState::Idle;
                inner.timeline = Timeline::starting_now();
                return Err(e);
            }
        };

        *self.subscription.lock() = Some(subscription);
        // A stop() that raced the subscribe call found no handle to release.
        if self.state() == SessionState::Stopped {
            if let Some(mut subscription) = self.subscription.lock().take() {
                subscription.cancel();
            }
        }
        Ok(())
    }

    /// Normalize, filter and append one raw event.
    ///
    /// Returns the appended event, or `None` if it was filtered out, consumed
    /// as a hotkey, or arrived while the session was not recording.
    pub fn on_raw_event(&self, raw: RawInputEvent) -> crate::Result<Option<Event>> {
        self.shared.deliver(raw)
    }

    /// `Recording -> Stopped`, returning the captured timeline.
    ///
    /// Safe to call any number of times from any state: outside `Recording`
    /// or `Armed` it just returns the current timeline. A subscription still held (for
    /// example after a stop hotkey fired on the delivery thread) is released
    /// here.
    pub fn stop(&self) -> Timeline {
        let timeline = {
            let mut inner = self.shared.inner.lock();
            if matches!(inner.state, SessionState::Recording | SessionState::Armed) {
                Shared::finish(&mut inner);
            }
            inner.timeline.clone()
        };

        if let Some(mut subscription) = self.subscription.lock().take() {
            subscription.cancel();
            debug!("Input source unsubscribed");
        }

        timeline
    }

    /// Route a named trigger to the matching transition.
    ///
    /// Stop and emergency stop are the same transition and return the
    /// timeline; start returns `None`.
    pub fn on_trigger(&self, trigger: HotkeyTrigger) -> crate::Result<Option<Timeline>> {
        match trigger {
            HotkeyTrigger::Start => {
                self.start()?;
                Ok(None)
            }
            HotkeyTrigger::Stop | HotkeyTrigger::EmergencyStop => Ok(Some(self.stop())),
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if let Some(mut subscription) = self.subscription.get_mut().take() {
            subscription.cancel();
        }
    }
}
