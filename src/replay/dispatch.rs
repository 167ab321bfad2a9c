//! Event-to-injector dispatch
//!
//! Maps each recorded event onto injector calls and remembers what the
//! replay itself is holding down. Key presses apply their recorded modifiers
//! first (modifier-then-key); key releases undo them afterwards in reverse
//! order. A modifier that is already held, either because the timeline
//! pressed it explicitly or because an earlier chord synthesized it, is never
//! pressed a second time.

use super::injector::InputInjector;
use crate::capture::types::{Event, EventKind, KeyAction, KeySymbol, Modifier, ModifierSet, MouseButton};
use tracing::{trace, warn};

#[derive(Debug, Clone)]
struct HeldKey {
    key: KeySymbol,
    /// Modifiers pressed on this key's behalf, in press order
    synthesized: Vec<Modifier>,
}

/// Stateful dispatcher for one replay run.
#[derive(Debug, Default)]
pub struct Dispatcher {
    held_keys: Vec<HeldKey>,
    held_buttons: Vec<MouseButton>,
    pointer: Option<(i32, i32)>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `modifier` is currently down because of this replay.
    pub fn is_modifier_held(&self, modifier: Modifier) -> bool {
        self.held_keys.iter().any(|held| {
            held.key.as_modifier() == Some(modifier) || held.synthesized.contains(&modifier)
        })
    }

    /// Keys currently held by the replay, in press order.
    pub fn held_keys(&self) -> Vec<KeySymbol> {
        self.held_keys.iter().map(|h| h.key.clone()).collect()
    }

    pub fn held_buttons(&self) -> &[MouseButton] {
        &self.held_buttons
    }

    /// Perform `event` through `injector`.
    pub fn dispatch(&mut self, event: &Event, injector: &mut dyn InputInjector) -> crate::Result<()> {
        trace!(kind = event.type_tag(), t = event.timestamp, "Dispatching");
        match &event.kind {
            EventKind::Key {
                action: KeyAction::Press,
                key,
                modifiers,
            } => self.press(key, modifiers, injector),
            EventKind::Key {
                action: KeyAction::Release,
                key,
                ..
            } => self.release(key, injector),
            EventKind::MouseMove { x, y } => {
                injector.move_mouse(*x, *y)?;
                self.pointer = Some((*x, *y));
                Ok(())
            }
            EventKind::MouseClick {
                x,
                y,
                button,
                pressed,
            } => {
                injector.click_mouse(*x, *y, *button, *pressed)?;
                self.pointer = Some((*x, *y));
                if *pressed {
                    if !self.held_buttons.contains(button) {
                        self.held_buttons.push(*button);
                    }
                } else {
                    self.held_buttons.retain(|b| b != button);
                }
                Ok(())
            }
            EventKind::MouseScroll { x, y, dx, dy } => {
                injector.scroll_mouse(*x, *y, *dx, *dy)?;
                self.pointer = Some((*x, *y));
                Ok(())
            }
        }
    }

    fn press(
        &mut self,
        key: &KeySymbol,
        modifiers: &ModifierSet,
        injector: &mut dyn InputInjector,
    ) -> crate::Result<()> {
        let own_modifier = key.as_modifier();
        let mut synthesized = Vec::new();

        for modifier in modifiers.iter() {
            if Some(modifier) == own_modifier || self.is_modifier_held(modifier) {
                continue;
            }
            if let Err(err) = injector.press_key(&modifier.key()) {
                Self::undo_modifiers(&synthesized, injector);
                return Err(err);
            }
            synthesized.push(modifier);
        }

        if let Err(err) = injector.press_key(key) {
            Self::undo_modifiers(&synthesized, injector);
            return Err(err);
        }

        match self.held_keys.iter_mut().find(|h| h.key.matches_ignore_case(key)) {
            // Auto-repeat of a key we already hold.
            Some(held) => held.synthesized.extend(synthesized),
            None => self.held_keys.push(HeldKey {
                key: key.clone(),
                synthesized,
            }),
        }
        Ok(())
    }

    /// Release `key`, then the modifiers pressed on its behalf.
    ///
    /// A key whose own release fails stays tracked. Every synthesized
    /// modifier is attempted even if an earlier one fails; the ones that
    /// failed stay tracked as held keys so [`Dispatcher::release_held`]
    /// retries them.
    fn release(&mut self, key: &KeySymbol, injector: &mut dyn InputInjector) -> crate::Result<()> {
        injector.release_key(key)?;

        let Some(pos) = self.held_keys.iter().position(|h| h.key.matches_ignore_case(key)) else {
            return Ok(());
        };
        let held = self.held_keys.remove(pos);

        let mut first_error = None;
        for modifier in held.synthesized.iter().rev() {
            if let Err(err) = injector.release_key(&modifier.key()) {
                warn!("Failed to release {modifier} after {key}: {err}");
                self.held_keys.push(HeldKey {
                    key: modifier.key(),
                    synthesized: Vec::new(),
                });
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn undo_modifiers(synthesized: &[Modifier], injector: &mut dyn InputInjector) {
        for modifier in synthesized.iter().rev() {
            if let Err(err) = injector.release_key(&modifier.key()) {
                warn!("Failed to release {modifier} after aborted key press: {err}");
            }
        }
    }

    /// Release everything the replay still holds: keys in reverse press order
    /// (each followed by its synthesized modifiers), then mouse buttons at the
    /// last known pointer position.
    ///
    /// Failures are logged and skipped. Returns the number of releases that
    /// succeeded.
    pub fn release_held(&mut self, injector: &mut dyn InputInjector) -> usize {
        let mut released = 0;

        while let Some(held) = self.held_keys.pop() {
            let keys = std::iter::once(held.key)
                .chain(held.synthesized.iter().rev().map(|m| m.key()));
            for key in keys {
                match injector.release_key(&key) {
                    Ok(()) => released += 1,
                    Err(err) => warn!("Failed to release held key {key}: {err}"),
                }
            }
        }

        let (x, y) = self.pointer.unwrap_or((0, 0));
        for button in self.held_buttons.drain(..).rev() {
            match injector.click_mouse(x, y, button, false) {
                Ok(()) => released += 1,
                Err(err) => warn!("Failed to release {} button: {err}", button.as_str()),
            }
        }

        released
    }
}
