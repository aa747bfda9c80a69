//! Event normalizer: backend-native key codes, modifier bits and mouse
//! buttons mapped onto one canonical vocabulary.
//!
//! Every mapping here is total. Unmapped keys become [`KeyCode::Unknown`],
//! unknown modifier bits are dropped, and unrecognized buttons pass through as
//! [`MouseButton::Other`].

mod cursor;
mod keymap;
mod winit_map;

pub use cursor::{CursorState, CursorTracker, GrabMode, MotionOutput};
pub use keymap::{AndroidInput, GdkInput, UiKitInput, Win32Input};
pub use winit_map::{from_winit_button, from_winit_key, from_winit_modifiers};

use bitflags::bitflags;

// =============================================================================
// Canonical Key Codes
// =============================================================================

/// Canonical key identity. Discriminants are the wire values used by the C ABI.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    A = 0, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    Key0 = 26, Key1, Key2, Key3, Key4, Key5, Key6, Key7, Key8, Key9,
    Space = 36,
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up = 47,
    Down,
    Left,
    Right,
    F1 = 51, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    Shift = 63,
    Control,
    Alt,
    Meta,
    Unknown = 0xFFFF_FFFF,
}

/// Every mapped key in discriminant order; index == raw value.
const KEYS: [KeyCode; 67] = {
    use KeyCode::*;
    [
        A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
        Key0, Key1, Key2, Key3, Key4, Key5, Key6, Key7, Key8, Key9,
        Space, Enter, Escape, Tab, Backspace, Delete, Insert, Home, End, PageUp, PageDown,
        Up, Down, Left, Right,
        F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
        Shift, Control, Alt, Meta,
    ]
};

impl KeyCode {
    pub fn from_raw(raw: u32) -> KeyCode {
        KEYS.get(raw as usize).copied().unwrap_or(KeyCode::Unknown)
    }

    pub fn to_raw(self) -> u32 {
        self as u32
    }

    /// Letter by offset from 'A'. Offsets past 'Z' are Unknown.
    pub fn letter(offset: u32) -> KeyCode {
        if offset < 26 {
            KEYS[offset as usize]
        } else {
            KeyCode::Unknown
        }
    }

    /// Digit by offset from '0'. Offsets past '9' are Unknown.
    pub fn digit(offset: u32) -> KeyCode {
        if offset < 10 {
            KEYS[26 + offset as usize]
        } else {
            KeyCode::Unknown
        }
    }

    /// Function key F1..F12 by one-based number.
    pub fn function(n: u32) -> KeyCode {
        if (1..=12).contains(&n) {
            KEYS[KeyCode::F1 as usize + (n as usize - 1)]
        } else {
            KeyCode::Unknown
        }
    }

    pub fn is_modifier(self) -> bool {
        matches!(self, KeyCode::Shift | KeyCode::Control | KeyCode::Alt | KeyCode::Meta)
    }
}

/// Case-insensitive letter/digit mapping shared by families whose native
/// values for those keys are ASCII.
pub(crate) fn ascii_key(native: u32) -> Option<KeyCode> {
    match native {
        0x41..=0x5A => Some(KeyCode::letter(native - 0x41)),
        0x61..=0x7A => Some(KeyCode::letter(native - 0x61)),
        0x30..=0x39 => Some(KeyCode::digit(native - 0x30)),
        _ => None,
    }
}

// =============================================================================
// Modifiers
// =============================================================================

bitflags! {
    /// Canonical modifier set. Bit values are the C ABI wire values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModifierFlags: u32 {
        const SHIFT = 1;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

/// OR in `flag` for every native bit in `table` that is set in `native`.
pub(crate) fn decode_bits(native: u64, table: &[(u64, ModifierFlags)]) -> ModifierFlags {
    table
        .iter()
        .filter(|(bit, _)| native & bit != 0)
        .fold(ModifierFlags::empty(), |acc, (_, flag)| acc | *flag)
}

// =============================================================================
// Mouse Buttons
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Primary,
    Secondary,
    Middle,
    Back,
    Forward,
    /// Unrecognized native button, carried as its raw value.
    Other(u32),
}

/// First wire index used for [`MouseButton::Other`].
pub const OTHER_BUTTON_BASE: u32 = 5;

impl MouseButton {
    /// Canonical wire index: 0..=4 for known buttons, `OTHER_BUTTON_BASE + raw`
    /// otherwise, so an unrecognized button never reads as a known one.
    pub fn index(self) -> u32 {
        match self {
            MouseButton::Primary => 0,
            MouseButton::Secondary => 1,
            MouseButton::Middle => 2,
            MouseButton::Back => 3,
            MouseButton::Forward => 4,
            MouseButton::Other(raw) => raw.saturating_add(OTHER_BUTTON_BASE),
        }
    }

    pub fn from_index(index: u32) -> MouseButton {
        match index {
            0 => MouseButton::Primary,
            1 => MouseButton::Secondary,
            2 => MouseButton::Middle,
            3 => MouseButton::Back,
            4 => MouseButton::Forward,
            other => MouseButton::Other(other - OTHER_BUTTON_BASE),
        }
    }
}

// =============================================================================
// Native Families
// =============================================================================

/// A backend's native input vocabulary.
pub trait NativeInput: Send + Sync {
    fn keycode(&self, native: u32) -> KeyCode;
    fn modifiers(&self, native: u64) -> ModifierFlags;
    fn mouse_button(&self, native: u32) -> MouseButton;
}

/// Native input vocabularies understood by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeFamily {
    /// Canonical values passed through unchanged.
    Canonical,
    Gdk,
    Win32,
    Android,
    UiKit,
}

/// Identity mapping for events that are already canonical.
#[derive(Debug, Default, Clone, Copy)]
pub struct CanonicalInput;

impl NativeInput for CanonicalInput {
    fn keycode(&self, native: u32) -> KeyCode {
        KeyCode::from_raw(native)
    }

    fn modifiers(&self, native: u64) -> ModifierFlags {
        ModifierFlags::from_bits_truncate(native as u32)
    }

    fn mouse_button(&self, native: u32) -> MouseButton {
        MouseButton::from_index(native)
    }
}

impl NativeFamily {
    pub fn input(self) -> &'static dyn NativeInput {
        match self {
            NativeFamily::Canonical => &CanonicalInput,
            NativeFamily::Gdk => &GdkInput,
            NativeFamily::Win32 => &Win32Input,
            NativeFamily::Android => &AndroidInput,
            NativeFamily::UiKit => &UiKitInput,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_values_round_trip() {
        for raw in 0..67u32 {
            assert_eq!(KeyCode::from_raw(raw).to_raw(), raw);
        }
        assert_eq!(KeyCode::from_raw(67), KeyCode::Unknown);
        assert_eq!(KeyCode::Unknown.to_raw(), 0xFFFF_FFFF);
    }

    #[test]
    fn test_wire_anchors() {
        assert_eq!(KeyCode::Key0.to_raw(), 26);
        assert_eq!(KeyCode::Space.to_raw(), 36);
        assert_eq!(KeyCode::PageDown.to_raw(), 46);
        assert_eq!(KeyCode::Right.to_raw(), 50);
        assert_eq!(KeyCode::F12.to_raw(), 62);
        assert_eq!(KeyCode::Meta.to_raw(), 66);
        assert_eq!(KeyCode::function(0), KeyCode::Unknown);
        assert_eq!(KeyCode::function(13), KeyCode::Unknown);
    }

    #[test]
    fn test_ascii_is_case_insensitive() {
        assert_eq!(ascii_key(b'q' as u32), Some(KeyCode::Q));
        assert_eq!(ascii_key(b'Q' as u32), Some(KeyCode::Q));
        assert_eq!(ascii_key(b'7' as u32), Some(KeyCode::Key7));
        assert_eq!(ascii_key(b'[' as u32), None);
    }

    #[test]
    fn test_button_index_passthrough() {
        assert_eq!(MouseButton::from_index(2), MouseButton::Middle);
        assert_eq!(MouseButton::from_index(9), MouseButton::Other(4));
        assert_eq!(MouseButton::from_index(9).index(), 9);
        assert_eq!(MouseButton::Other(0).index(), 5);
        assert_eq!(MouseButton::Forward.index(), 4);
    }

    #[test]
    fn test_canonical_family_drops_unknown_modifier_bits() {
        let input = NativeFamily::Canonical.input();
        assert_eq!(
            input.modifiers(0xF0 | 1 | 8),
            ModifierFlags::SHIFT | ModifierFlags::META
        );
    }
}
