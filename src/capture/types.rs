//! Core types for the event model
//!
//! Defines the canonical representation of one recorded input action. Every
//! native notification is normalized into an [`Event`] before it reaches the
//! timeline, and the replay dispatcher only ever sees these types.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Keyboard modifier keys tracked alongside key events.
///
/// Declaration order is the press order used during replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Ctrl,
    Alt,
    Shift,
    Cmd,
}

impl Modifier {
    /// All modifiers, in press order.
    pub const ALL: [Modifier; 4] = [Modifier::Ctrl, Modifier::Alt, Modifier::Shift, Modifier::Cmd];

    /// The key that produces this modifier.
    pub fn key(self) -> KeySymbol {
        KeySymbol::Named(match self {
            Modifier::Ctrl => NamedKey::Ctrl,
            Modifier::Alt => NamedKey::Alt,
            Modifier::Shift => NamedKey::Shift,
            Modifier::Cmd => NamedKey::Cmd,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::Ctrl => "ctrl",
            Modifier::Alt => "alt",
            Modifier::Shift => "shift",
            Modifier::Cmd => "cmd",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of active modifiers, kept in press order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierSet(BTreeSet<Modifier>);

impl ModifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, modifier: Modifier) -> bool {
        self.0.insert(modifier)
    }

    pub fn remove(&mut self, modifier: Modifier) -> bool {
        self.0.remove(&modifier)
    }

    pub fn contains(&self, modifier: Modifier) -> bool {
        self.0.contains(&modifier)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate in press order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Modifier> + '_ {
        self.0.iter().copied()
    }

    /// True if every modifier in `other` is also active here.
    pub fn is_superset(&self, other: &ModifierSet) -> bool {
        self.0.is_superset(&other.0)
    }
}

impl FromIterator<Modifier> for ModifierSet {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Modifier; N]> for ModifierSet {
    fn from(modifiers: [Modifier; N]) -> Self {
        modifiers.into_iter().collect()
    }
}

/// Non-character keys with a stable persisted name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Alt,
    AltGr,
    Backspace,
    CapsLock,
    Cmd,
    Ctrl,
    Delete,
    Down,
    End,
    Enter,
    Escape,
    /// Function key F1..=F24
    F(u8),
    Home,
    Insert,
    Left,
    MediaNext,
    MediaPlayPause,
    MediaPrevious,
    MediaVolumeDown,
    MediaVolumeMute,
    MediaVolumeUp,
    Menu,
    NumLock,
    PageDown,
    PageUp,
    Pause,
    PrintScreen,
    Right,
    ScrollLock,
    Shift,
    Space,
    Tab,
    Up,
}

impl NamedKey {
    /// Persisted (lowercase) name.
    pub fn name(self) -> String {
        let fixed = match self {
            NamedKey::Alt => "alt",
            NamedKey::AltGr => "alt_gr",
            NamedKey::Backspace => "backspace",
            NamedKey::CapsLock => "caps_lock",
            NamedKey::Cmd => "cmd",
            NamedKey::Ctrl => "ctrl",
            NamedKey::Delete => "delete",
            NamedKey::Down => "down",
            NamedKey::End => "end",
            NamedKey::Enter => "enter",
            NamedKey::Escape => "escape",
            NamedKey::F(n) => return format!("f{n}"),
            NamedKey::Home => "home",
            NamedKey::Insert => "insert",
            NamedKey::Left => "left",
            NamedKey::MediaNext => "media_next",
            NamedKey::MediaPlayPause => "media_play_pause",
            NamedKey::MediaPrevious => "media_previous",
            NamedKey::MediaVolumeDown => "media_volume_down",
            NamedKey::MediaVolumeMute => "media_volume_mute",
            NamedKey::MediaVolumeUp => "media_volume_up",
            NamedKey::Menu => "menu",
            NamedKey::NumLock => "num_lock",
            NamedKey::PageDown => "page_down",
            NamedKey::PageUp => "page_up",
            NamedKey::Pause => "pause",
            NamedKey::PrintScreen => "print_screen",
            NamedKey::Right => "right",
            NamedKey::ScrollLock => "scroll_lock",
            NamedKey::Shift => "shift",
            NamedKey::Space => "space",
            NamedKey::Tab => "tab",
            NamedKey::Up => "up",
        };
        fixed.to_string()
    }

    /// Look up a key by name, folding the side-specific and legacy aliases
    /// that native hooks report (`ctrl_l`, `esc`, `return`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "alt" | "alt_l" | "alt_r" | "option" => NamedKey::Alt,
            "alt_gr" | "altgr" => NamedKey::AltGr,
            "backspace" => NamedKey::Backspace,
            "caps_lock" | "capslock" => NamedKey::CapsLock,
            "cmd" | "cmd_l" | "cmd_r" | "command" | "super" | "meta" | "win" => NamedKey::Cmd,
            "ctrl" | "ctrl_l" | "ctrl_r" | "control" => NamedKey::Ctrl,
            "delete" | "del" => NamedKey::Delete,
            "down" => NamedKey::Down,
            "end" => NamedKey::End,
            "enter" | "return" => NamedKey::Enter,
            "escape" | "esc" => NamedKey::Escape,
            "home" => NamedKey::Home,
            "insert" => NamedKey::Insert,
            "left" => NamedKey::Left,
            "media_next" => NamedKey::MediaNext,
            "media_play_pause" => NamedKey::MediaPlayPause,
            "media_previous" => NamedKey::MediaPrevious,
            "media_volume_down" => NamedKey::MediaVolumeDown,
            "media_volume_mute" => NamedKey::MediaVolumeMute,
            "media_volume_up" => NamedKey::MediaVolumeUp,
            "menu" => NamedKey::Menu,
            "num_lock" | "numlock" => NamedKey::NumLock,
            "page_down" | "pagedown" => NamedKey::PageDown,
            "page_up" | "pageup" => NamedKey::PageUp,
            "pause" => NamedKey::Pause,
            "print_screen" | "printscreen" => NamedKey::PrintScreen,
            "right" => NamedKey::Right,
            "scroll_lock" | "scrolllock" => NamedKey::ScrollLock,
            "shift" | "shift_l" | "shift_r" => NamedKey::Shift,
            "space" => NamedKey::Space,
            "tab" => NamedKey::Tab,
            "up" => NamedKey::Up,
            other => {
                let n: u8 = other.strip_prefix('f')?.parse().ok()?;
                if (1..=24).contains(&n) {
                    NamedKey::F(n)
                } else {
                    return None;
                }
            }
        };
        Some(key)
    }

    /// The modifier this key produces, if it is a modifier key.
    pub fn as_modifier(self) -> Option<Modifier> {
        match self {
            NamedKey::Ctrl => Some(Modifier::Ctrl),
            NamedKey::Alt => Some(Modifier::Alt),
            NamedKey::Shift => Some(Modifier::Shift),
            NamedKey::Cmd => Some(Modifier::Cmd),
            _ => None,
        }
    }
}

/// Identity of a key as persisted in a timeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeySymbol {
    /// Printable character
    Char(char),
    /// Well-known non-character key
    Named(NamedKey),
    /// Anything else the native hook reported (e.g. `<65>` virtual key codes)
    Other(String),
}

impl KeySymbol {
    /// Parse a persisted or native key name.
    ///
    /// A single character is a [`KeySymbol::Char`]; a `Key.` prefix is dropped
    /// and known names (case-insensitive) become [`KeySymbol::Named`].
    /// Returns `None` for an empty name.
    pub fn parse(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (None, _) => return None,
            (Some(c), None) => return Some(KeySymbol::Char(c)),
            _ => {}
        }

        let bare = name.strip_prefix("Key.").unwrap_or(name);
        let lowered = bare.to_ascii_lowercase();
        Some(match NamedKey::from_name(&lowered) {
            Some(named) => KeySymbol::Named(named),
            None => KeySymbol::Other(bare.to_string()),
        })
    }

    pub fn as_modifier(&self) -> Option<Modifier> {
        match self {
            KeySymbol::Named(named) => named.as_modifier(),
            _ => None,
        }
    }

    pub fn is_modifier(&self) -> bool {
        self.as_modifier().is_some()
    }

    /// Case-insensitive comparison for character keys (hotkey matching
    /// should not care whether Shift turned `r` into `R`).
    pub fn matches_ignore_case(&self, other: &KeySymbol) -> bool {
        match (self, other) {
            (KeySymbol::Char(a), KeySymbol::Char(b)) => {
                a.to_lowercase().eq(b.to_lowercase())
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for KeySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySymbol::Char(c) => write!(f, "{c}"),
            KeySymbol::Named(named) => f.write_str(&named.name()),
            KeySymbol::Other(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for KeySymbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeySymbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        KeySymbol::parse(&name).ok_or_else(|| serde::de::Error::custom("key name must not be empty"))
    }
}

/// Mouse buttons that can be recorded and replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn as_str(self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        }
    }
}

/// Direction of a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Press,
    Release,
}

/// The five kinds of recorded input.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Key {
        action: KeyAction,
        key: KeySymbol,
        modifiers: ModifierSet,
    },
    MouseMove {
        x: i32,
        y: i32,
    },
    MouseClick {
        x: i32,
        y: i32,
        button: MouseButton,
        pressed: bool,
    },
    MouseScroll {
        x: i32,
        y: i32,
        dx: i32,
        dy: i32,
    },
}

/// One normalized input occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Seconds since recording start
    pub timestamp: f64,
    pub kind: EventKind,
}

impl Event {
    pub fn new(timestamp: f64, kind: EventKind) -> Self {
        Self { timestamp, kind }
    }

    pub fn key_press(timestamp: f64, key: KeySymbol, modifiers: ModifierSet) -> Self {
        Self::new(
            timestamp,
            EventKind::Key {
                action: KeyAction::Press,
                key,
                modifiers,
            },
        )
    }

    pub fn key_release(timestamp: f64, key: KeySymbol, modifiers: ModifierSet) -> Self {
        Self::new(
            timestamp,
            EventKind::Key {
                action: KeyAction::Release,
                key,
                modifiers,
            },
        )
    }

    pub fn mouse_move(timestamp: f64, x: i32, y: i32) -> Self {
        Self::new(timestamp, EventKind::MouseMove { x, y })
    }

    pub fn mouse_click(timestamp: f64, x: i32, y: i32, button: MouseButton, pressed: bool) -> Self {
        Self::new(
            timestamp,
            EventKind::MouseClick {
                x,
                y,
                button,
                pressed,
            },
        )
    }

    pub fn mouse_scroll(timestamp: f64, x: i32, y: i32, dx: i32, dy: i32) -> Self {
        Self::new(timestamp, EventKind::MouseScroll { x, y, dx, dy })
    }

    /// Persisted `type` tag of this event.
    pub fn type_tag(&self) -> &'static str {
        match &self.kind {
            EventKind::Key {
                action: KeyAction::Press,
                ..
            } => "key_press",
            EventKind::Key {
                action: KeyAction::Release,
                ..
            } => "key_release",
            EventKind::MouseMove { .. } => "mouse_move",
            EventKind::MouseClick { .. } => "mouse_click",
            EventKind::MouseScroll { .. } => "mouse_scroll",
        }
    }

    pub fn is_mouse_move(&self) -> bool {
        matches!(self.kind, EventKind::MouseMove { .. })
    }

    pub fn is_keyboard(&self) -> bool {
        matches!(self.kind, EventKind::Key { .. })
    }

    /// Screen position for positional events.
    pub fn position(&self) -> Option<(i32, i32)> {
        match self.kind {
            EventKind::Key { .. } => None,
            EventKind::MouseMove { x, y }
            | EventKind::MouseClick { x, y, .. }
            | EventKind::MouseScroll { x, y, .. } => Some((x, y)),
        }
    }
}
