//! Input synthesis backed by `rdev::simulate`.

use super::keymap::{to_rdev_button, to_rdev_key};
use crate::capture::types::{KeySymbol, MouseButton};
use crate::replay::injector::InputInjector;
use rdev::{simulate, EventType};
use std::thread;
use std::time::Duration;

/// Injector that posts synthetic OS events.
#[derive(Debug, Default)]
pub struct RdevInjector {
    settle: Duration,
}

impl RdevInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pause after every synthesized event; some platforms drop events
    /// posted back to back.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    fn send(&self, event: EventType) -> crate::Result<()> {
        simulate(&event)
            .map_err(|_| crate::Error::Injection(format!("OS rejected {event:?}")))?;
        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }
        Ok(())
    }
}

impl InputInjector for RdevInjector {
    fn press_key(&mut self, key: &KeySymbol) -> crate::Result<()> {
        self.send(EventType::KeyPress(to_rdev_key(key)?))
    }

    fn release_key(&mut self, key: &KeySymbol) -> crate::Result<()> {
        self.send(EventType::KeyRelease(to_rdev_key(key)?))
    }

    fn move_mouse(&mut self, x: i32, y: i32) -> crate::Result<()> {
        self.send(EventType::MouseMove {
            x: f64::from(x),
            y: f64::from(y),
        })
    }

    fn click_mouse(
        &mut self,
        x: i32,
        y: i32,
        button: MouseButton,
        pressed: bool,
    ) -> crate::Result<()> {
        self.move_mouse(x, y)?;
        let button = to_rdev_button(button);
        self.send(if pressed {
            EventType::ButtonPress(button)
        } else {
            EventType::ButtonRelease(button)
        })
    }

    fn scroll_mouse(&mut self, x: i32, y: i32, dx: i32, dy: i32) -> crate::Result<()> {
        self.move_mouse(x, y)?;
        self.send(EventType::Wheel {
            delta_x: i64::from(dx),
            delta_y: i64::from(dy),
        })
    }
}
