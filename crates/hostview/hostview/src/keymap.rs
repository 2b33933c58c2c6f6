//! Host key codes to USB HID keyboard usages.
//!
//! The bridge speaks HID usage IDs (page 0x07) on both sides: the
//! translator's pressed-key table is indexed by them and the guest receives
//! them unchanged in [`KeyEvent::code`](platform::KeyEvent). Every usage in
//! the page fits in a `u8`, so the 256-entry table covers the whole space.
//!
//! | Host key            | Usage        |
//! |---------------------|--------------|
//! | A..Z                | 0x04..=0x1D  |
//! | 1..9, 0             | 0x1E..=0x27  |
//! | F1..F12             | 0x3A..=0x45  |
//! | Arrows              | 0x4F..=0x52  |
//! | Left/Right modifier | 0xE0..=0xE7  |

use winit::keyboard::KeyCode;

/// Usage IDs the bridge itself needs to recognise
pub mod usage {
    /// `G`, release-gesture key
    pub const G: u8 = 0x0A;
    /// `F`, full-screen shortcut
    pub const F: u8 = 0x09;
    /// `Q`, quit shortcut
    pub const Q: u8 = 0x14;
    /// `Z`, zoom shortcut
    pub const Z: u8 = 0x1D;
    /// Left Control
    pub const LEFT_CTRL: u8 = 0xE0;
    /// Left Shift
    pub const LEFT_SHIFT: u8 = 0xE1;
    /// Left Alt / Option
    pub const LEFT_ALT: u8 = 0xE2;
    /// Left GUI / Command / Super
    pub const LEFT_GUI: u8 = 0xE3;
    /// Right Control
    pub const RIGHT_CTRL: u8 = 0xE4;
    /// Right Shift
    pub const RIGHT_SHIFT: u8 = 0xE5;
    /// Right Alt / Option
    pub const RIGHT_ALT: u8 = 0xE6;
    /// Right GUI / Command / Super
    pub const RIGHT_GUI: u8 = 0xE7;
}

/// Swap the Alt and GUI usages, leaving every other code alone
pub fn swap_option_command(code: u8) -> u8 {
    match code {
        usage::LEFT_ALT => usage::LEFT_GUI,
        usage::LEFT_GUI => usage::LEFT_ALT,
        usage::RIGHT_ALT => usage::RIGHT_GUI,
        usage::RIGHT_GUI => usage::RIGHT_ALT,
        other => other,
    }
}

/// Map a physical key to its HID usage.
///
/// Returns `None` for keys with no usage in the keyboard page (media keys
/// outside the page, `Fn`, unidentified scancodes). Those are ignored.
pub fn usage_for(code: KeyCode) -> Option<u8> {
    let usage = match code {
        KeyCode::KeyA => 0x04,
        KeyCode::KeyB => 0x05,
        KeyCode::KeyC => 0x06,
        KeyCode::KeyD => 0x07,
        KeyCode::KeyE => 0x08,
        KeyCode::KeyF => 0x09,
        KeyCode::KeyG => 0x0A,
        KeyCode::KeyH => 0x0B,
        KeyCode::KeyI => 0x0C,
        KeyCode::KeyJ => 0x0D,
        KeyCode::KeyK => 0x0E,
        KeyCode::KeyL => 0x0F,
        KeyCode::KeyM => 0x10,
        KeyCode::KeyN => 0x11,
        KeyCode::KeyO => 0x12,
        KeyCode::KeyP => 0x13,
        KeyCode::KeyQ => 0x14,
        KeyCode::KeyR => 0x15,
        KeyCode::KeyS => 0x16,
        KeyCode::KeyT => 0x17,
        KeyCode::KeyU => 0x18,
        KeyCode::KeyV => 0x19,
        KeyCode::KeyW => 0x1A,
        KeyCode::KeyX => 0x1B,
        KeyCode::KeyY => 0x1C,
        KeyCode::KeyZ => 0x1D,
        KeyCode::Digit1 => 0x1E,
        KeyCode::Digit2 => 0x1F,
        KeyCode::Digit3 => 0x20,
        KeyCode::Digit4 => 0x21,
        KeyCode::Digit5 => 0x22,
        KeyCode::Digit6 => 0x23,
        KeyCode::Digit7 => 0x24,
        KeyCode::Digit8 => 0x25,
        KeyCode::Digit9 => 0x26,
        KeyCode::Digit0 => 0x27,
        KeyCode::Enter => 0x28,
        KeyCode::Escape => 0x29,
        KeyCode::Backspace => 0x2A,
        KeyCode::Tab => 0x2B,
        KeyCode::Space => 0x2C,
        KeyCode::Minus => 0x2D,
        KeyCode::Equal => 0x2E,
        KeyCode::BracketLeft => 0x2F,
        KeyCode::BracketRight => 0x30,
        KeyCode::Backslash => 0x31,
        KeyCode::Semicolon => 0x33,
        KeyCode::Quote => 0x34,
        KeyCode::Backquote => 0x35,
        KeyCode::Comma => 0x36,
        KeyCode::Period => 0x37,
        KeyCode::Slash => 0x38,
        KeyCode::CapsLock => 0x39,
        KeyCode::F1 => 0x3A,
        KeyCode::F2 => 0x3B,
        KeyCode::F3 => 0x3C,
        KeyCode::F4 => 0x3D,
        KeyCode::F5 => 0x3E,
        KeyCode::F6 => 0x3F,
        KeyCode::F7 => 0x40,
        KeyCode::F8 => 0x41,
        KeyCode::F9 => 0x42,
        KeyCode::F10 => 0x43,
        KeyCode::F11 => 0x44,
        KeyCode::F12 => 0x45,
        KeyCode::PrintScreen => 0x46,
        KeyCode::ScrollLock => 0x47,
        KeyCode::Pause => 0x48,
        KeyCode::Insert => 0x49,
        KeyCode::Home => 0x4A,
        KeyCode::PageUp => 0x4B,
        KeyCode::Delete => 0x4C,
        KeyCode::End => 0x4D,
        KeyCode::PageDown => 0x4E,
        KeyCode::ArrowRight => 0x4F,
        KeyCode::ArrowLeft => 0x50,
        KeyCode::ArrowDown => 0x51,
        KeyCode::ArrowUp => 0x52,
        KeyCode::NumLock => 0x53,
        KeyCode::NumpadDivide => 0x54,
        KeyCode::NumpadMultiply => 0x55,
        KeyCode::NumpadSubtract => 0x56,
        KeyCode::NumpadAdd => 0x57,
        KeyCode::NumpadEnter => 0x58,
        KeyCode::Numpad1 => 0x59,
        KeyCode::Numpad2 => 0x5A,
        KeyCode::Numpad3 => 0x5B,
        KeyCode::Numpad4 => 0x5C,
        KeyCode::Numpad5 => 0x5D,
        KeyCode::Numpad6 => 0x5E,
        KeyCode::Numpad7 => 0x5F,
        KeyCode::Numpad8 => 0x60,
        KeyCode::Numpad9 => 0x61,
        KeyCode::Numpad0 => 0x62,
        KeyCode::NumpadDecimal => 0x63,
        KeyCode::IntlBackslash => 0x64,
        KeyCode::ContextMenu => 0x65,
        KeyCode::Power => 0x66,
        KeyCode::NumpadEqual => 0x67,
        KeyCode::F13 => 0x68,
        KeyCode::F14 => 0x69,
        KeyCode::F15 => 0x6A,
        KeyCode::F16 => 0x6B,
        KeyCode::F17 => 0x6C,
        KeyCode::F18 => 0x6D,
        KeyCode::F19 => 0x6E,
        KeyCode::F20 => 0x6F,
        KeyCode::F21 => 0x70,
        KeyCode::F22 => 0x71,
        KeyCode::F23 => 0x72,
        KeyCode::F24 => 0x73,
        KeyCode::AudioVolumeMute => 0x7F,
        KeyCode::AudioVolumeUp => 0x80,
        KeyCode::AudioVolumeDown => 0x81,
        KeyCode::NumpadComma => 0x85,
        KeyCode::IntlRo => 0x87,
        KeyCode::KanaMode => 0x88,
        KeyCode::IntlYen => 0x89,
        KeyCode::Convert => 0x8A,
        KeyCode::NonConvert => 0x8B,
        KeyCode::Lang1 => 0x90,
        KeyCode::Lang2 => 0x91,
        KeyCode::ControlLeft => usage::LEFT_CTRL,
        KeyCode::ShiftLeft => usage::LEFT_SHIFT,
        KeyCode::AltLeft => usage::LEFT_ALT,
        KeyCode::SuperLeft => usage::LEFT_GUI,
        KeyCode::ControlRight => usage::RIGHT_CTRL,
        KeyCode::ShiftRight => usage::RIGHT_SHIFT,
        KeyCode::AltRight => usage::RIGHT_ALT,
        KeyCode::SuperRight => usage::RIGHT_GUI,
        _ => return None,
    };
    Some(usage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_and_digits() {
        assert_eq!(usage_for(KeyCode::KeyA), Some(0x04));
        assert_eq!(usage_for(KeyCode::KeyG), Some(usage::G));
        assert_eq!(usage_for(KeyCode::KeyZ), Some(usage::Z));
        assert_eq!(usage_for(KeyCode::Digit0), Some(0x27));
    }

    #[test]
    fn modifiers_use_the_e0_block() {
        assert_eq!(usage_for(KeyCode::ControlLeft), Some(0xE0));
        assert_eq!(usage_for(KeyCode::SuperRight), Some(0xE7));
    }

    #[test]
    fn unmapped_keys_return_none() {
        assert_eq!(usage_for(KeyCode::Fn), None);
        assert_eq!(usage_for(KeyCode::MediaPlayPause), None);
    }

    #[test]
    fn swap_is_an_involution() {
        for code in 0..=u8::MAX {
            assert_eq!(swap_option_command(swap_option_command(code)), code);
        }
        assert_eq!(swap_option_command(usage::LEFT_ALT), usage::LEFT_GUI);
        assert_eq!(swap_option_command(0x04), 0x04);
    }
}
