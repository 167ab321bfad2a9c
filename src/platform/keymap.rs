//! Translation between `rdev` key codes and canonical key symbols.

use crate::capture::raw::NativeKey;
use crate::capture::types::{KeySymbol, Modifier, MouseButton, NamedKey};
use rdev::{Button, Key};

/// Native identity of an `rdev` key.
///
/// Keys with a known physical identity map the same way on press and
/// release, whatever the held modifiers make them type (Shift+A stays `a`,
/// Option+S stays `s`). The typed text only names keys outside that table.
pub fn native_key(key: Key, typed: Option<&str>) -> NativeKey {
    if let Some(named) = named(key) {
        return NativeKey::Named(named.name());
    }
    if let Some(c) = char_for(key) {
        return NativeKey::Char(c);
    }
    match typed.and_then(single_printable) {
        Some(c) => NativeKey::Char(c),
        None => NativeKey::Code(code_of(key)),
    }
}

fn single_printable(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_control() => Some(c),
        _ => None,
    }
}

/// Modifier produced by an `rdev` key.
pub fn modifier_of(key: Key) -> Option<Modifier> {
    match key {
        Key::ControlLeft | Key::ControlRight => Some(Modifier::Ctrl),
        Key::Alt | Key::AltGr => Some(Modifier::Alt),
        Key::ShiftLeft | Key::ShiftRight => Some(Modifier::Shift),
        Key::MetaLeft | Key::MetaRight => Some(Modifier::Cmd),
        _ => None,
    }
}

pub fn button_of(button: Button) -> Option<MouseButton> {
    match button {
        Button::Left => Some(MouseButton::Left),
        Button::Right => Some(MouseButton::Right),
        Button::Middle => Some(MouseButton::Middle),
        Button::Unknown(_) => None,
    }
}

pub fn to_rdev_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Middle => Button::Middle,
    }
}

fn named(key: Key) -> Option<NamedKey> {
    Some(match key {
        Key::Alt => NamedKey::Alt,
        Key::AltGr => NamedKey::AltGr,
        Key::Backspace => NamedKey::Backspace,
        Key::CapsLock => NamedKey::CapsLock,
        Key::ControlLeft | Key::ControlRight => NamedKey::Ctrl,
        Key::Delete => NamedKey::Delete,
        Key::DownArrow => NamedKey::Down,
        Key::End => NamedKey::End,
        Key::Escape => NamedKey::Escape,
        Key::F1 => NamedKey::F(1),
        Key::F2 => NamedKey::F(2),
        Key::F3 => NamedKey::F(3),
        Key::F4 => NamedKey::F(4),
        Key::F5 => NamedKey::F(5),
        Key::F6 => NamedKey::F(6),
        Key::F7 => NamedKey::F(7),
        Key::F8 => NamedKey::F(8),
        Key::F9 => NamedKey::F(9),
        Key::F10 => NamedKey::F(10),
        Key::F11 => NamedKey::F(11),
        Key::F12 => NamedKey::F(12),
        Key::Home => NamedKey::Home,
        Key::Insert => NamedKey::Insert,
        Key::LeftArrow => NamedKey::Left,
        Key::MetaLeft | Key::MetaRight => NamedKey::Cmd,
        Key::NumLock => NamedKey::NumLock,
        Key::PageDown => NamedKey::PageDown,
        Key::PageUp => NamedKey::PageUp,
        Key::Pause => NamedKey::Pause,
        Key::PrintScreen => NamedKey::PrintScreen,
        Key::Return | Key::KpReturn => NamedKey::Enter,
        Key::RightArrow => NamedKey::Right,
        Key::ScrollLock => NamedKey::ScrollLock,
        Key::ShiftLeft | Key::ShiftRight => NamedKey::Shift,
        Key::Space => NamedKey::Space,
        Key::Tab => NamedKey::Tab,
        Key::UpArrow => NamedKey::Up,
        _ => return None,
    })
}

const LETTERS: [Key; 26] = [
    Key::KeyA, Key::KeyB, Key::KeyC, Key::KeyD, Key::KeyE, Key::KeyF, Key::KeyG,
    Key::KeyH, Key::KeyI, Key::KeyJ, Key::KeyK, Key::KeyL, Key::KeyM, Key::KeyN,
    Key::KeyO, Key::KeyP, Key::KeyQ, Key::KeyR, Key::KeyS, Key::KeyT, Key::KeyU,
    Key::KeyV, Key::KeyW, Key::KeyX, Key::KeyY, Key::KeyZ,
];

const DIGITS: [Key; 10] = [
    Key::Num0, Key::Num1, Key::Num2, Key::Num3, Key::Num4,
    Key::Num5, Key::Num6, Key::Num7, Key::Num8, Key::Num9,
];

const PUNCTUATION: [(char, Key); 11] = [
    ('`', Key::BackQuote),
    ('-', Key::Minus),
    ('=', Key::Equal),
    ('[', Key::LeftBracket),
    (']', Key::RightBracket),
    (';', Key::SemiColon),
    ('\'', Key::Quote),
    ('\\', Key::BackSlash),
    (',', Key::Comma),
    ('.', Key::Dot),
    ('/', Key::Slash),
];

fn char_for(key: Key) -> Option<char> {
    if let Some(i) = LETTERS.iter().position(|k| *k == key) {
        return Some((b'a' + i as u8) as char);
    }
    if let Some(i) = DIGITS.iter().position(|k| *k == key) {
        return Some((b'0' + i as u8) as char);
    }
    PUNCTUATION.iter().find(|(_, k)| *k == key).map(|(c, _)| *c)
}

fn code_of(key: Key) -> u32 {
    match key {
        Key::Unknown(code) => code,
        _ => 0,
    }
}

fn key_for_char(c: char) -> Option<Key> {
    let lower = c.to_ascii_lowercase();
    match lower {
        'a'..='z' => Some(LETTERS[(lower as u8 - b'a') as usize]),
        '0'..='9' => Some(DIGITS[(lower as u8 - b'0') as usize]),
        ' ' => Some(Key::Space),
        '\t' => Some(Key::Tab),
        '\n' | '\r' => Some(Key::Return),
        _ => PUNCTUATION.iter().find(|(p, _)| *p == lower).map(|(_, k)| *k),
    }
}

fn key_for_named(named: NamedKey) -> Option<Key> {
    Some(match named {
        NamedKey::Alt => Key::Alt,
        NamedKey::AltGr => Key::AltGr,
        NamedKey::Backspace => Key::Backspace,
        NamedKey::CapsLock => Key::CapsLock,
        NamedKey::Cmd => Key::MetaLeft,
        NamedKey::Ctrl => Key::ControlLeft,
        NamedKey::Delete => Key::Delete,
        NamedKey::Down => Key::DownArrow,
        NamedKey::End => Key::End,
        NamedKey::Enter => Key::Return,
        NamedKey::Escape => Key::Escape,
        NamedKey::F(1) => Key::F1,
        NamedKey::F(2) => Key::F2,
        NamedKey::F(3) => Key::F3,
        NamedKey::F(4) => Key::F4,
        NamedKey::F(5) => Key::F5,
        NamedKey::F(6) => Key::F6,
        NamedKey::F(7) => Key::F7,
        NamedKey::F(8) => Key::F8,
        NamedKey::F(9) => Key::F9,
        NamedKey::F(10) => Key::F10,
        NamedKey::F(11) => Key::F11,
        NamedKey::F(12) => Key::F12,
        NamedKey::Home => Key::Home,
        NamedKey::Insert => Key::Insert,
        NamedKey::Left => Key::LeftArrow,
        NamedKey::NumLock => Key::NumLock,
        NamedKey::PageDown => Key::PageDown,
        NamedKey::PageUp => Key::PageUp,
        NamedKey::Pause => Key::Pause,
        NamedKey::PrintScreen => Key::PrintScreen,
        NamedKey::Right => Key::RightArrow,
        NamedKey::ScrollLock => Key::ScrollLock,
        NamedKey::Shift => Key::ShiftLeft,
        NamedKey::Space => Key::Space,
        NamedKey::Tab => Key::Tab,
        NamedKey::Up => Key::UpArrow,
        _ => return None,
    })
}

/// `rdev` key to synthesize for `symbol`.
///
/// # Errors
/// `Injection` for keys with no `rdev` equivalent.
pub fn to_rdev_key(symbol: &KeySymbol) -> crate::Result<Key> {
    let key = match symbol {
        KeySymbol::Char(c) => key_for_char(*c),
        KeySymbol::Named(named) => key_for_named(*named),
        KeySymbol::Other(raw) => raw
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .and_then(|code| code.parse().ok())
            .map(Key::Unknown),
    };
    key.ok_or_else(|| crate::Error::Injection(format!("no native key for '{symbol}'")))
}
