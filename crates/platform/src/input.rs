//! Guest input abstraction
//!
//! Neutral key and pointer events handed to the emulated input subsystem.
//! Key codes are USB HID keyboard usage IDs (usage page 0x07), so every code
//! fits in a byte and the same numbering is used on both sides of the bridge.

/// Receiver for neutral input events (the emulated input subsystem).
///
/// Any `FnMut(GuestInputEvent)` closure is a sink, so callers can hand the
/// bridge a plain closure instead of implementing the trait.
pub trait InputSink {
    /// Deliver one event to the guest.
    fn send(&mut self, event: GuestInputEvent);
}

impl<F> InputSink for F
where
    F: FnMut(GuestInputEvent),
{
    fn send(&mut self, event: GuestInputEvent) {
        self(event);
    }
}

/// Events forwarded to the emulated machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestInputEvent {
    /// Key press or release
    Key(KeyEvent),
    /// Pointer position in guest display coordinates
    PointerAbsolute(PointerAbsoluteEvent),
    /// Pointer motion delta
    PointerRelative(PointerRelativeEvent),
}

/// Key press or release, keyed by HID usage ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// HID keyboard usage ID
    pub code: u16,
    /// `true` on press, `false` on release
    pub pressed: bool,
}

/// Absolute pointer position, already mapped into guest display space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerAbsoluteEvent {
    /// Column in `0..guest_width`
    pub x: u32,
    /// Row in `0..guest_height`
    pub y: u32,
    /// Buttons held at the time of the event
    pub buttons: ButtonMask,
}

/// Relative pointer motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerRelativeEvent {
    /// Horizontal delta (positive = right)
    pub dx: i32,
    /// Vertical delta (positive = down)
    pub dy: i32,
    /// Buttons held at the time of the event
    pub buttons: ButtonMask,
}

/// Set of pointer buttons currently held.
///
/// Wheel motion is reported as a press and release of [`ButtonMask::WHEEL_UP`]
/// or [`ButtonMask::WHEEL_DOWN`], matching how PS/2 and USB pointers expose it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ButtonMask(u8);

impl ButtonMask {
    /// Primary (left) button
    pub const LEFT: Self = Self(1 << 0);
    /// Secondary (right) button
    pub const RIGHT: Self = Self(1 << 1);
    /// Middle button
    pub const MIDDLE: Self = Self(1 << 2);
    /// Wheel rotated away from the user
    pub const WHEEL_UP: Self = Self(1 << 3);
    /// Wheel rotated towards the user
    pub const WHEEL_DOWN: Self = Self(1 << 4);
    /// Side ("back") button
    pub const SIDE: Self = Self(1 << 5);
    /// Extra ("forward") button
    pub const EXTRA: Self = Self(1 << 6);

    /// No buttons held
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bit pattern
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether every button in `other` is held
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no button is held
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Copy with `other` added
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Copy with `other` removed
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Add or remove `button` depending on `held`
    pub fn set(&mut self, button: Self, held: bool) {
        *self = if held {
            self.with(button)
        } else {
            self.without(button)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_mask_set_and_clear() {
        let mut mask = ButtonMask::empty();
        mask.set(ButtonMask::LEFT, true);
        mask.set(ButtonMask::MIDDLE, true);
        assert!(mask.contains(ButtonMask::LEFT));
        assert!(mask.contains(ButtonMask::LEFT.with(ButtonMask::MIDDLE)));
        assert!(!mask.contains(ButtonMask::RIGHT));

        mask.set(ButtonMask::LEFT, false);
        assert_eq!(mask, ButtonMask::MIDDLE);
        assert_eq!(mask.bits(), 0b100);
    }

    #[test]
    fn closure_is_a_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |event| seen.push(event);
            let key = GuestInputEvent::Key(KeyEvent {
                code: 0x04,
                pressed: true,
            });
            InputSink::send(&mut sink, key);
        }
        assert_eq!(seen.len(), 1);
    }
}
