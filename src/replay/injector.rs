//! Input injection capability
//!
//! The scheduler never talks to the OS directly; it drives an
//! [`InputInjector`]. The native backend lives in `crate::platform`;
//! [`DryRunInjector`] only logs what it would have done.

use crate::capture::types::{KeySymbol, MouseButton};
use tracing::info;

/// Synthesizes OS-level input at absolute screen coordinates.
///
/// Every call may fail independently; the scheduler treats a failure as a
/// per-event warning.
pub trait InputInjector {
    fn press_key(&mut self, key: &KeySymbol) -> crate::Result<()>;

    fn release_key(&mut self, key: &KeySymbol) -> crate::Result<()>;

    fn move_mouse(&mut self, x: i32, y: i32) -> crate::Result<()>;

    /// Press (`pressed == true`) or release `button` at `(x, y)`.
    fn click_mouse(&mut self, x: i32, y: i32, button: MouseButton, pressed: bool)
        -> crate::Result<()>;

    /// Scroll by `(dx, dy)` notches with the pointer at `(x, y)`.
    fn scroll_mouse(&mut self, x: i32, y: i32, dx: i32, dy: i32) -> crate::Result<()>;
}

/// Injector that logs each action instead of performing it.
#[derive(Debug, Default)]
pub struct DryRunInjector {
    actions: usize,
}

impl DryRunInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of actions logged so far.
    pub fn actions(&self) -> usize {
        self.actions
    }
}

impl InputInjector for DryRunInjector {
    fn press_key(&mut self, key: &KeySymbol) -> crate::Result<()> {
        self.actions += 1;
        info!("[dry-run] press key {key}");
        Ok(())
    }

    fn release_key(&mut self, key: &KeySymbol) -> crate::Result<()> {
        self.actions += 1;
        info!("[dry-run] release key {key}");
        Ok(())
    }

    fn move_mouse(&mut self, x: i32, y: i32) -> crate::Result<()> {
        self.actions += 1;
        info!("[dry-run] move mouse to ({x}, {y})");
        Ok(())
    }

    fn click_mouse(
        &mut self,
        x: i32,
        y: i32,
        button: MouseButton,
        pressed: bool,
    ) -> crate::Result<()> {
        self.actions += 1;
        let verb = if pressed { "press" } else { "release" };
        info!("[dry-run] {verb} {} button at ({x}, {y})", button.as_str());
        Ok(())
    }

    fn scroll_mouse(&mut self, x: i32, y: i32, dx: i32, dy: i32) -> crate::Result<()> {
        self.actions += 1;
        info!("[dry-run] scroll ({dx}, {dy}) at ({x}, {y})");
        Ok(())
    }
}
