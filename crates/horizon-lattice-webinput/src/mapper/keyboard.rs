//! Keyboard conversion.
//!
//! A native key event becomes a `RawKeyDown` or `KeyUp` with the Windows
//! virtual key code, DOM key and DOM code the engine expects. A key-down
//! that also inserts text is delivered twice: once as a `RawKeyDown` the
//! browser side skips, then as a `Char`, so the page sees exactly one text
//! insertion per physical press.
//!
//! On platforms that present Command as Control the key value and the
//! modifier mask are swapped together.

use std::time::Instant;

use crate::canonical::{DomKey, EventModifiers, KeyboardEvent, KeyboardEventKind};
use crate::edit_command::EditCommand;
use crate::logging::targets;
use crate::native::{KeyEventKind, KeyLocation, NamedKey, NativeKey, NativeKeyEvent, NativeModifiers};

use super::EventMapper;

/// Exchange the Control and Meta key values.
pub fn swap_control_meta_key(key: NativeKey) -> NativeKey {
    match key {
        NativeKey::Named(NamedKey::Control) => NativeKey::Named(NamedKey::Meta),
        NativeKey::Named(NamedKey::Meta) => NativeKey::Named(NamedKey::Control),
        other => other,
    }
}

/// Windows virtual key code for a key.
pub fn windows_key_code(key: NativeKey, keypad: bool) -> u16 {
    if keypad {
        return keypad_key_code(key);
    }
    match key {
        NativeKey::Character(c) => character_key_code(c),
        NativeKey::Named(named) => named_key_code(named),
    }
}

fn keypad_key_code(key: NativeKey) -> u16 {
    match key {
        NativeKey::Character(c @ '0'..='9') => 0x60 + (c as u16 - '0' as u16),
        NativeKey::Character('*') => 0x6A,
        NativeKey::Character('+') => 0x6B,
        NativeKey::Character('-') => 0x6D,
        NativeKey::Character('.') | NativeKey::Character(',') => 0x6E,
        NativeKey::Character('/') => 0x6F,
        NativeKey::Named(
            named @ (NamedKey::PageUp
            | NamedKey::PageDown
            | NamedKey::End
            | NamedKey::Home
            | NamedKey::ArrowLeft
            | NamedKey::ArrowUp
            | NamedKey::ArrowRight
            | NamedKey::ArrowDown
            | NamedKey::Enter
            | NamedKey::Insert
            | NamedKey::Delete),
        ) => named_key_code(named),
        _ => 0,
    }
}

fn character_key_code(c: char) -> u16 {
    match c {
        'a'..='z' => c.to_ascii_uppercase() as u16,
        'A'..='Z' | '0'..='9' => c as u16,
        ' ' => 0x20,
        ';' | ':' => 0xBA,
        '=' | '+' => 0xBB,
        ',' | '<' => 0xBC,
        '-' | '_' => 0xBD,
        '.' | '>' => 0xBE,
        '/' | '?' => 0xBF,
        '`' | '~' => 0xC0,
        '[' | '{' => 0xDB,
        '\\' | '|' => 0xDC,
        ']' | '}' => 0xDD,
        '\'' | '"' => 0xDE,
        // Shifted digits on a US layout.
        ')' => 0x30,
        '!' => 0x31,
        '@' => 0x32,
        '#' => 0x33,
        '$' => 0x34,
        '%' => 0x35,
        '^' => 0x36,
        '&' => 0x37,
        '*' => 0x38,
        '(' => 0x39,
        _ => 0,
    }
}

fn named_key_code(key: NamedKey) -> u16 {
    match key {
        NamedKey::Backspace => 0x08,
        NamedKey::Tab | NamedKey::Backtab => 0x09,
        NamedKey::Clear => 0x0C,
        NamedKey::Enter => 0x0D,
        NamedKey::Shift => 0x10,
        NamedKey::Control => 0x11,
        NamedKey::Alt => 0x12,
        NamedKey::Pause => 0x13,
        NamedKey::CapsLock => 0x14,
        NamedKey::Escape => 0x1B,
        NamedKey::Space => 0x20,
        NamedKey::PageUp => 0x21,
        NamedKey::PageDown => 0x22,
        NamedKey::End => 0x23,
        NamedKey::Home => 0x24,
        NamedKey::ArrowLeft => 0x25,
        NamedKey::ArrowUp => 0x26,
        NamedKey::ArrowRight => 0x27,
        NamedKey::ArrowDown => 0x28,
        NamedKey::PrintScreen => 0x2C,
        NamedKey::Insert => 0x2D,
        NamedKey::Delete => 0x2E,
        NamedKey::Help => 0x2F,
        NamedKey::Meta => 0x5B,
        NamedKey::ContextMenu => 0x5D,
        NamedKey::F(n @ 1..=24) => 0x70 + u16::from(n - 1),
        NamedKey::NumLock => 0x90,
        NamedKey::ScrollLock => 0x91,
        NamedKey::AltGraph => 0xE1,
        NamedKey::F(_) | NamedKey::Unidentified => 0,
    }
}

const LETTER_CODES: [&str; 26] = [
    "KeyA", "KeyB", "KeyC", "KeyD", "KeyE", "KeyF", "KeyG", "KeyH", "KeyI", "KeyJ", "KeyK", "KeyL",
    "KeyM", "KeyN", "KeyO", "KeyP", "KeyQ", "KeyR", "KeyS", "KeyT", "KeyU", "KeyV", "KeyW", "KeyX",
    "KeyY", "KeyZ",
];
const DIGIT_CODES: [&str; 10] = [
    "Digit0", "Digit1", "Digit2", "Digit3", "Digit4", "Digit5", "Digit6", "Digit7", "Digit8",
    "Digit9",
];
const NUMPAD_CODES: [&str; 10] = [
    "Numpad0", "Numpad1", "Numpad2", "Numpad3", "Numpad4", "Numpad5", "Numpad6", "Numpad7",
    "Numpad8", "Numpad9",
];
const FUNCTION_CODES: [&str; 24] = [
    "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12", "F13", "F14", "F15",
    "F16", "F17", "F18", "F19", "F20", "F21", "F22", "F23", "F24",
];

/// DOM code (physical key name) for a key; empty when unknown.
pub fn dom_code(key: NativeKey, location: KeyLocation, keypad: bool) -> &'static str {
    let keypad = keypad || location == KeyLocation::Numpad;
    let right = location == KeyLocation::Right;
    match key {
        NativeKey::Character(c) if keypad => match c {
            '0'..='9' => NUMPAD_CODES[c as usize - '0' as usize],
            '*' => "NumpadMultiply",
            '+' => "NumpadAdd",
            '-' => "NumpadSubtract",
            '.' | ',' => "NumpadDecimal",
            '/' => "NumpadDivide",
            _ => "",
        },
        NativeKey::Character(c) => match c.to_ascii_lowercase() {
            l @ 'a'..='z' => LETTER_CODES[l as usize - 'a' as usize],
            d @ '0'..='9' => DIGIT_CODES[d as usize - '0' as usize],
            ' ' => "Space",
            '-' | '_' => "Minus",
            '=' | '+' => "Equal",
            '[' | '{' => "BracketLeft",
            ']' | '}' => "BracketRight",
            '\\' | '|' => "Backslash",
            ';' | ':' => "Semicolon",
            '\'' | '"' => "Quote",
            '`' | '~' => "Backquote",
            ',' | '<' => "Comma",
            '.' | '>' => "Period",
            '/' | '?' => "Slash",
            _ => "",
        },
        NativeKey::Named(named) => match named {
            NamedKey::Enter if keypad => "NumpadEnter",
            NamedKey::Enter => "Enter",
            NamedKey::Backspace => "Backspace",
            NamedKey::Tab | NamedKey::Backtab => "Tab",
            NamedKey::Escape => "Escape",
            NamedKey::Space => "Space",
            NamedKey::Shift if right => "ShiftRight",
            NamedKey::Shift => "ShiftLeft",
            NamedKey::Control if right => "ControlRight",
            NamedKey::Control => "ControlLeft",
            NamedKey::Alt if right => "AltRight",
            NamedKey::Alt => "AltLeft",
            NamedKey::AltGraph => "AltRight",
            NamedKey::Meta if right => "MetaRight",
            NamedKey::Meta => "MetaLeft",
            NamedKey::CapsLock => "CapsLock",
            NamedKey::PageUp => "PageUp",
            NamedKey::PageDown => "PageDown",
            NamedKey::End => "End",
            NamedKey::Home => "Home",
            NamedKey::ArrowLeft => "ArrowLeft",
            NamedKey::ArrowUp => "ArrowUp",
            NamedKey::ArrowRight => "ArrowRight",
            NamedKey::ArrowDown => "ArrowDown",
            NamedKey::Insert => "Insert",
            NamedKey::Delete => "Delete",
            NamedKey::PrintScreen => "PrintScreen",
            NamedKey::ScrollLock => "ScrollLock",
            NamedKey::Pause => "Pause",
            NamedKey::NumLock => "NumLock",
            NamedKey::ContextMenu => "ContextMenu",
            NamedKey::Help => "Help",
            NamedKey::Clear => "NumpadClear",
            NamedKey::F(n @ 1..=24) => FUNCTION_CODES[usize::from(n - 1)],
            NamedKey::F(_) | NamedKey::Unidentified => "",
        },
    }
}

fn is_control_text(text: &str) -> bool {
    let mut chars = text.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_control())
}

impl EventMapper {
    /// Convert a key event to a single `RawKeyDown` or `KeyUp`.
    pub fn map_key(&self, event: &NativeKeyEvent, timestamp: Instant) -> KeyboardEvent {
        let swap = self.config.swap_control_meta();
        let key = if swap {
            swap_control_meta_key(event.key)
        } else {
            event.key
        };
        let keypad = event.modifiers.contains(NativeModifiers::KEYPAD)
            || event.location == KeyLocation::Numpad;

        let text = if key == NativeKey::Named(NamedKey::Enter) {
            "\r".to_string()
        } else if is_control_text(&event.text) {
            // Control+letter arrives as a control character; the key value
            // still names the letter.
            String::new()
        } else {
            event.text.clone()
        };

        let dom_key = match key {
            NativeKey::Named(NamedKey::Unidentified) => DomKey::Unidentified,
            NativeKey::Named(NamedKey::Space) => DomKey::Character(' '),
            NativeKey::Named(named) => DomKey::Named(named),
            NativeKey::Character(c) => match text.chars().next() {
                Some(t) if text.chars().count() == 1 => DomKey::Character(t),
                _ => DomKey::Character(c),
            },
        };

        let mut modifiers = self.modifiers(event.modifiers, Default::default());
        if keypad {
            modifiers |= EventModifiers::IS_KEYPAD;
        }
        if event.auto_repeat {
            modifiers |= EventModifiers::IS_AUTO_REPEAT;
        }
        match event.location {
            KeyLocation::Left => modifiers |= EventModifiers::IS_LEFT,
            KeyLocation::Right => modifiers |= EventModifiers::IS_RIGHT,
            KeyLocation::Standard | KeyLocation::Numpad => {}
        }

        KeyboardEvent {
            kind: match event.kind {
                KeyEventKind::Press => KeyboardEventKind::RawKeyDown,
                KeyEventKind::Release => KeyboardEventKind::KeyUp,
            },
            windows_key_code: windows_key_code(key, keypad),
            native_key_code: event.native_virtual_key,
            dom_key,
            dom_code: dom_code(key, event.location, keypad),
            unmodified_text: text.clone(),
            text,
            skip_in_browser: false,
            edit_command: None,
            modifiers,
            timestamp,
        }
    }

    /// Convert a key event into the canonical events to route, in order.
    ///
    /// A pending editor command is attached to a raw key-down instead of
    /// splitting it into a text insertion.
    pub fn keyboard_events(
        &self,
        event: &NativeKeyEvent,
        timestamp: Instant,
        edit_command: Option<EditCommand>,
    ) -> Vec<KeyboardEvent> {
        let mut raw = self.map_key(event, timestamp);
        if raw.kind != KeyboardEventKind::RawKeyDown {
            return vec![raw];
        }
        if let Some(command) = edit_command {
            raw.edit_command = Some(command);
            tracing::trace!(target: targets::KEYBOARD, command = command.name(), "key with edit command");
            return vec![raw];
        }
        if raw.text.is_empty() {
            return vec![raw];
        }
        raw.skip_in_browser = true;
        let mut char_event = raw.clone();
        char_event.kind = KeyboardEventKind::Char;
        char_event.skip_in_browser = false;
        tracing::trace!(target: targets::KEYBOARD, code = raw.dom_code, "key down with text insertion");
        vec![raw, char_event]
    }
}
