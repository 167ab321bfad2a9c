//! Hotkey chords for capture control
//!
//! Start, stop and emergency stop are three named triggers. Each is bound to
//! a chord such as `ctrl+shift+r`; a key-down whose key and active modifiers
//! satisfy a chord fires the trigger and is not recorded.

use super::raw::RawInputEvent;
use super::types::{KeySymbol, Modifier, ModifierSet};
use std::fmt;
use std::str::FromStr;

/// Capture control triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyTrigger {
    Start,
    Stop,
    EmergencyStop,
}

/// A key plus the modifiers that must be held with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotkey {
    pub modifiers: ModifierSet,
    pub key: KeySymbol,
}

impl Hotkey {
    pub fn new(modifiers: ModifierSet, key: KeySymbol) -> Self {
        Self { modifiers, key }
    }

    /// Whether a key-down of `key` with `active` modifiers fires this chord.
    ///
    /// Extra held modifiers are tolerated; the chord's own modifiers must all
    /// be active.
    pub fn matches(&self, key: &KeySymbol, active: &ModifierSet) -> bool {
        self.key.matches_ignore_case(key) && active.is_superset(&self.modifiers)
    }
}

impl FromStr for Hotkey {
    type Err = crate::Error;

    /// Parse `"ctrl+shift+r"`-style chords. The last segment is the key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let (key_part, modifier_parts) = parts
            .split_last()
            .ok_or_else(|| crate::Error::Config(format!("empty hotkey '{s}'")))?;

        let mut modifiers = ModifierSet::new();
        for part in modifier_parts {
            let modifier = KeySymbol::parse(part)
                .and_then(|k| k.as_modifier())
                .ok_or_else(|| {
                    crate::Error::Config(format!("'{part}' is not a modifier in hotkey '{s}'"))
                })?;
            modifiers.insert(modifier);
        }

        let key = KeySymbol::parse(key_part)
            .ok_or_else(|| crate::Error::Config(format!("hotkey '{s}' has no key")))?;

        Ok(Self { modifiers, key })
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in self.modifiers.iter() {
            write!(f, "{modifier}+")?;
        }
        write!(f, "{}", self.key)
    }
}

/// The three chord bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyBindings {
    pub start: Hotkey,
    pub stop: Hotkey,
    pub emergency_stop: Hotkey,
}

impl Default for HotkeyBindings {
    fn default() -> Self {
        Self {
            start: Hotkey::new(
                [Modifier::Ctrl, Modifier::Shift].into(),
                KeySymbol::Char('r'),
            ),
            stop: Hotkey::new([Modifier::Ctrl, Modifier::Alt].into(), KeySymbol::Char('s')),
            emergency_stop: Hotkey::new(
                ModifierSet::new(),
                KeySymbol::Named(super::types::NamedKey::Escape),
            ),
        }
    }
}

impl HotkeyBindings {
    /// Build bindings from their textual chords.
    pub fn parse(start: &str, stop: &str, emergency_stop: &str) -> crate::Result<Self> {
        Ok(Self {
            start: start.parse()?,
            stop: stop.parse()?,
            emergency_stop: emergency_stop.parse()?,
        })
    }
}

/// Maps raw key-downs to triggers.
#[derive(Debug, Clone, Default)]
pub struct HotkeyMatcher {
    bindings: HotkeyBindings,
}

impl HotkeyMatcher {
    pub fn new(bindings: HotkeyBindings) -> Self {
        Self { bindings }
    }

    pub fn bindings(&self) -> &HotkeyBindings {
        &self.bindings
    }

    /// Trigger fired by `raw`, if any. Only key-downs can fire.
    ///
    /// Stop chords are checked before emergency stop so a chord that happens
    /// to contain the emergency key still reports as a normal stop.
    pub fn match_raw(&self, raw: &RawInputEvent) -> Option<HotkeyTrigger> {
        let RawInputEvent::KeyDown { key, modifiers } = raw else {
            return None;
        };
        let key = key.to_symbol();
        [
            (&self.bindings.start, HotkeyTrigger::Start),
            (&self.bindings.stop, HotkeyTrigger::Stop),
            (&self.bindings.emergency_stop, HotkeyTrigger::EmergencyStop),
        ]
        .into_iter()
        .find(|(hotkey, _)| hotkey.matches(&key, modifiers))
        .map(|(_, trigger)| trigger)
    }
}
