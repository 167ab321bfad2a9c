//! Global input hook backed by `rdev::listen`.
//!
//! `rdev::listen` blocks its thread for the life of the process and cannot be
//! unregistered, so the hook thread is started once and a shared gate decides
//! whether its notifications reach the current sink. Cancelling a
//! subscription closes the gate.

use super::keymap::{button_of, modifier_of, native_key};
use crate::capture::raw::RawInputEvent;
use crate::capture::session::{InputSource, RawEventSink, Subscription};
use crate::capture::types::ModifierSet;
use parking_lot::Mutex;
use rdev::EventType;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

/// How long `subscribe` waits for the hook to report a startup failure.
const STARTUP_GRACE: Duration = Duration::from_millis(200);

#[derive(Default)]
struct Gate {
    active: AtomicBool,
    sink: Mutex<Option<RawEventSink>>,
}

impl Gate {
    fn forward(&self, raw: RawInputEvent) {
        if !self.active.load(Ordering::Acquire) {
            return;
        }
        let sink = self.sink.lock().clone();
        if let Some(sink) = sink {
            if let Err(e) = sink.deliver(raw) {
                error!("Dropping captured event: {e}");
            }
        }
    }
}

/// Tracks modifier and pointer state between hook callbacks.
#[derive(Default)]
struct HookState {
    modifiers: ModifierSet,
    pointer: (f64, f64),
}

impl HookState {
    fn translate(&mut self, event: rdev::Event) -> Option<RawInputEvent> {
        match event.event_type {
            EventType::KeyPress(key) => {
                if let Some(m) = modifier_of(key) {
                    self.modifiers.insert(m);
                }
                Some(RawInputEvent::KeyDown {
                    key: native_key(key, event.name.as_deref()),
                    modifiers: self.modifiers.clone(),
                })
            }
            EventType::KeyRelease(key) => {
                let raw = RawInputEvent::KeyUp {
                    key: native_key(key, event.name.as_deref()),
                    modifiers: self.modifiers.clone(),
                };
                if let Some(m) = modifier_of(key) {
                    self.modifiers.remove(m);
                }
                Some(raw)
            }
            EventType::MouseMove { x, y } => {
                self.pointer = (x, y);
                Some(RawInputEvent::MouseMove { x, y })
            }
            EventType::ButtonPress(button) | EventType::ButtonRelease(button) => {
                let pressed = matches!(event.event_type, EventType::ButtonPress(_));
                let Some(button) = button_of(button) else {
                    trace!(?button, "Ignoring unsupported mouse button");
                    return None;
                };
                let (x, y) = self.pointer;
                Some(RawInputEvent::MouseButton {
                    x,
                    y,
                    button,
                    pressed,
                })
            }
            EventType::Wheel { delta_x, delta_y } => {
                let (x, y) = self.pointer;
                Some(RawInputEvent::MouseScroll {
                    x,
                    y,
                    dx: delta_x as f64,
                    dy: delta_y as f64,
                })
            }
        }
    }
}

/// Process-wide input source using the OS hook exposed by `rdev`.
pub struct RdevSource {
    gate: Arc<Gate>,
    started: bool,
}

impl RdevSource {
    pub fn new() -> Self {
        Self {
            gate: Arc::new(Gate::default()),
            started: false,
        }
    }

    fn start_hook(&mut self) -> crate::Result<()> {
        let (tx, rx) = mpsc::channel::<String>();
        let gate = Arc::clone(&self.gate);

        thread::Builder::new()
            .name("input-hook".into())
            .spawn(move || {
                let mut state = HookState::default();
                let result = rdev::listen(move |event| {
                    if let Some(raw) = state.translate(event) {
                        gate.forward(raw);
                    }
                });
                if let Err(e) = result {
                    let _ = tx.send(format!("{e:?}"));
                }
            })
            .map_err(|e| crate::Error::Capture(format!("Failed to spawn input hook thread: {e}")))?;

        match rx.recv_timeout(STARTUP_GRACE) {
            Ok(reason) => Err(crate::Error::Capture(format!(
                "Input hook failed to start ({reason}). Check accessibility / input permissions"
            ))),
            Err(_) => {
                debug!("Input hook running");
                self.started = true;
                Ok(())
            }
        }
    }
}

impl Default for RdevSource {
    fn default() -> Self {
        Self::new()
    }
}

struct RdevSubscription {
    gate: Arc<Gate>,
}

impl Subscription for RdevSubscription {
    fn cancel(&mut self) {
        self.gate.active.store(false, Ordering::Release);
        self.gate.sink.lock().take();
    }
}

impl InputSource for RdevSource {
    fn subscribe(&mut self, sink: RawEventSink) -> crate::Result<Box<dyn Subscription>> {
        if self.gate.active.load(Ordering::Acquire) {
            warn!("Replacing an active input subscription");
        }
        *self.gate.sink.lock() = Some(sink);
        if !self.started {
            if let Err(e) = self.start_hook() {
                self.gate.sink.lock().take();
                return Err(e);
            }
        }
        self.gate.active.store(true, Ordering::Release);
        Ok(Box::new(RdevSubscription {
            gate: Arc::clone(&self.gate),
        }))
    }
}
