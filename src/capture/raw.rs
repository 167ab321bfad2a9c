//! Native input notifications and their normalization
//!
//! A platform hook reports what it saw in its own terms: floating point
//! screen coordinates, key names with side-specific variants, raw virtual key
//! codes. [`normalize`] maps those into the canonical [`Event`] model.

use super::types::{Event, EventKind, KeyAction, KeySymbol, ModifierSet, MouseButton};

/// Key identity as reported by a native hook.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeKey {
    /// The key produced a printable character
    Char(char),
    /// The hook named the key (`"Key.ctrl_l"`, `"return"`, ...)
    Named(String),
    /// Only a platform virtual key code is known
    Code(u32),
}

impl NativeKey {
    /// Canonical key symbol for this native key.
    pub fn to_symbol(&self) -> KeySymbol {
        match self {
            NativeKey::Char(c) => KeySymbol::Char(*c),
            NativeKey::Named(name) => {
                KeySymbol::parse(name).unwrap_or_else(|| KeySymbol::Other(String::from("<unnamed>")))
            }
            NativeKey::Code(code) => KeySymbol::Other(format!("<{code}>")),
        }
    }
}

/// One push notification from an input source.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInputEvent {
    KeyDown {
        key: NativeKey,
        modifiers: ModifierSet,
    },
    KeyUp {
        key: NativeKey,
        modifiers: ModifierSet,
    },
    MouseMove {
        x: f64,
        y: f64,
    },
    MouseButton {
        x: f64,
        y: f64,
        button: MouseButton,
        pressed: bool,
    },
    MouseScroll {
        x: f64,
        y: f64,
        dx: f64,
        dy: f64,
    },
}

impl RawInputEvent {
    pub fn is_key_down(&self) -> bool {
        matches!(self, RawInputEvent::KeyDown { .. })
    }
}

/// Round a native coordinate/delta onto the integer grid, saturating at the
/// `i32` range.
#[inline]
pub(crate) fn to_pixel(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

/// Round an elapsed time in seconds to millisecond precision.
#[inline]
pub fn round_timestamp(elapsed: f64) -> f64 {
    (elapsed.max(0.0) * 1000.0).round() / 1000.0
}

/// Map a native notification to a canonical event stamped with `elapsed`
/// seconds since capture start.
pub fn normalize(raw: &RawInputEvent, elapsed: f64) -> Event {
    let timestamp = round_timestamp(elapsed);
    let kind = match raw {
        RawInputEvent::KeyDown { key, modifiers } => EventKind::Key {
            action: KeyAction::Press,
            key: key.to_symbol(),
            modifiers: modifiers.clone(),
        },
        RawInputEvent::KeyUp { key, modifiers } => EventKind::Key {
            action: KeyAction::Release,
            key: key.to_symbol(),
            modifiers: modifiers.clone(),
        },
        RawInputEvent::MouseMove { x, y } => EventKind::MouseMove {
            x: to_pixel(*x),
            y: to_pixel(*y),
        },
        RawInputEvent::MouseButton {
            x,
            y,
            button,
            pressed,
        } => EventKind::MouseClick {
            x: to_pixel(*x),
            y: to_pixel(*y),
            button: *button,
            pressed: *pressed,
        },
        RawInputEvent::MouseScroll { x, y, dx, dy } => EventKind::MouseScroll {
            x: to_pixel(*x),
            y: to_pixel(*y),
            dx: to_pixel(*dx),
            dy: to_pixel(*dy),
        },
    };
    Event::new(timestamp, kind)
}
