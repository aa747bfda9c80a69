//! Per-family native keymaps.
//!
//! Each family maps its native key values, modifier masks and button numbers
//! onto the canonical vocabulary. Left/right modifier variants collapse onto
//! one canonical key.

use super::{ascii_key, decode_bits, KeyCode, ModifierFlags, MouseButton, NativeInput};

// =============================================================================
// GDK / X11 keysyms
// =============================================================================

const GDK_KEYS: &[(u32, KeyCode)] = &[
    (0x0020, KeyCode::Space),
    (0xff0d, KeyCode::Enter),
    (0xff8d, KeyCode::Enter), // KP_Enter
    (0xff1b, KeyCode::Escape),
    (0xff09, KeyCode::Tab),
    (0xfe20, KeyCode::Tab), // ISO_Left_Tab (shift+tab)
    (0xff08, KeyCode::Backspace),
    (0xffff, KeyCode::Delete),
    (0xff63, KeyCode::Insert),
    (0xff50, KeyCode::Home),
    (0xff57, KeyCode::End),
    (0xff55, KeyCode::PageUp),
    (0xff56, KeyCode::PageDown),
    (0xff51, KeyCode::Left),
    (0xff52, KeyCode::Up),
    (0xff53, KeyCode::Right),
    (0xff54, KeyCode::Down),
    (0xffe1, KeyCode::Shift),
    (0xffe2, KeyCode::Shift),
    (0xffe3, KeyCode::Control),
    (0xffe4, KeyCode::Control),
    (0xffe7, KeyCode::Meta),
    (0xffe8, KeyCode::Meta),
    (0xffe9, KeyCode::Alt),
    (0xffea, KeyCode::Alt),
    (0xffeb, KeyCode::Meta), // Super_L
    (0xffec, KeyCode::Meta), // Super_R
];

const GDK_F1: u32 = 0xffbe;

const GDK_MODIFIERS: &[(u64, ModifierFlags)] = &[
    (1 << 0, ModifierFlags::SHIFT),
    (1 << 2, ModifierFlags::CONTROL),
    (1 << 3, ModifierFlags::ALT), // MOD1
    (1 << 26, ModifierFlags::META), // SUPER
    (1 << 28, ModifierFlags::META), // META
];

/// GDK keysyms, `GdkModifierType` masks and X11 button numbers.
#[derive(Debug, Default, Clone, Copy)]
pub struct GdkInput;

impl NativeInput for GdkInput {
    fn keycode(&self, native: u32) -> KeyCode {
        if let Some(key) = ascii_key(native) {
            return key;
        }
        if (GDK_F1..GDK_F1 + 12).contains(&native) {
            return KeyCode::function(native - GDK_F1 + 1);
        }
        lookup(GDK_KEYS, native)
    }

    fn modifiers(&self, native: u64) -> ModifierFlags {
        decode_bits(native, GDK_MODIFIERS)
    }

    // X11 numbers middle as 2 and right as 3.
    fn mouse_button(&self, native: u32) -> MouseButton {
        match native {
            1 => MouseButton::Primary,
            2 => MouseButton::Middle,
            3 => MouseButton::Secondary,
            8 => MouseButton::Back,
            9 => MouseButton::Forward,
            raw => MouseButton::Other(raw),
        }
    }
}

// =============================================================================
// Win32 virtual keys
// =============================================================================

const WIN32_KEYS: &[(u32, KeyCode)] = &[
    (0x20, KeyCode::Space),
    (0x0D, KeyCode::Enter),
    (0x1B, KeyCode::Escape),
    (0x09, KeyCode::Tab),
    (0x08, KeyCode::Backspace),
    (0x2E, KeyCode::Delete),
    (0x2D, KeyCode::Insert),
    (0x24, KeyCode::Home),
    (0x23, KeyCode::End),
    (0x21, KeyCode::PageUp),
    (0x22, KeyCode::PageDown),
    (0x25, KeyCode::Left),
    (0x26, KeyCode::Up),
    (0x27, KeyCode::Right),
    (0x28, KeyCode::Down),
    (0x10, KeyCode::Shift),
    (0xA0, KeyCode::Shift),
    (0xA1, KeyCode::Shift),
    (0x11, KeyCode::Control),
    (0xA2, KeyCode::Control),
    (0xA3, KeyCode::Control),
    (0x12, KeyCode::Alt), // VK_MENU
    (0xA4, KeyCode::Alt),
    (0xA5, KeyCode::Alt),
    (0x5B, KeyCode::Meta), // VK_LWIN
    (0x5C, KeyCode::Meta),
];

const VK_F1: u32 = 0x70;
const VK_NUMPAD0: u32 = 0x60;

const WIN32_MODIFIERS: &[(u64, ModifierFlags)] = &[
    (0x0001, ModifierFlags::ALT),
    (0x0002, ModifierFlags::CONTROL),
    (0x0004, ModifierFlags::SHIFT),
    (0x0008, ModifierFlags::META),
];

/// Win32 virtual-key codes, `MOD_*` bits and `VK_*BUTTON` codes.
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Input;

impl NativeInput for Win32Input {
    fn keycode(&self, native: u32) -> KeyCode {
        match native {
            // Virtual keys have no lowercase range; 0x61.. are numpad keys.
            0x41..=0x5A => KeyCode::letter(native - 0x41),
            0x30..=0x39 => KeyCode::digit(native - 0x30),
            n if (VK_NUMPAD0..VK_NUMPAD0 + 10).contains(&n) => KeyCode::digit(n - VK_NUMPAD0),
            n if (VK_F1..VK_F1 + 12).contains(&n) => KeyCode::function(n - VK_F1 + 1),
            n => lookup(WIN32_KEYS, n),
        }
    }

    fn modifiers(&self, native: u64) -> ModifierFlags {
        decode_bits(native, WIN32_MODIFIERS)
    }

    fn mouse_button(&self, native: u32) -> MouseButton {
        match native {
            0x01 => MouseButton::Primary,
            0x02 => MouseButton::Secondary,
            0x04 => MouseButton::Middle,
            0x05 => MouseButton::Back, // VK_XBUTTON1
            0x06 => MouseButton::Forward,
            raw => MouseButton::Other(raw),
        }
    }
}

// =============================================================================
// Android key events
// =============================================================================

const AKEYCODE_0: u32 = 7;
const AKEYCODE_A: u32 = 29;
const AKEYCODE_F1: u32 = 131;

const ANDROID_KEYS: &[(u32, KeyCode)] = &[
    (62, KeyCode::Space),
    (66, KeyCode::Enter),
    (111, KeyCode::Escape),
    (61, KeyCode::Tab),
    (67, KeyCode::Backspace), // AKEYCODE_DEL
    (112, KeyCode::Delete),   // AKEYCODE_FORWARD_DEL
    (124, KeyCode::Insert),
    (122, KeyCode::Home),
    (123, KeyCode::End),
    (92, KeyCode::PageUp),
    (93, KeyCode::PageDown),
    (19, KeyCode::Up),
    (20, KeyCode::Down),
    (21, KeyCode::Left),
    (22, KeyCode::Right),
    (59, KeyCode::Shift),
    (60, KeyCode::Shift),
    (57, KeyCode::Alt),
    (58, KeyCode::Alt),
    (113, KeyCode::Control),
    (114, KeyCode::Control),
    (117, KeyCode::Meta),
    (118, KeyCode::Meta),
];

const ANDROID_MODIFIERS: &[(u64, ModifierFlags)] = &[
    (0x0000_0001, ModifierFlags::SHIFT),
    (0x0000_0002, ModifierFlags::ALT),
    (0x0000_1000, ModifierFlags::CONTROL),
    (0x0001_0000, ModifierFlags::META),
];

/// `AKEYCODE_*` values, `AMETA_*_ON` state and `AMOTION_EVENT_BUTTON_*` bits.
#[derive(Debug, Default, Clone, Copy)]
pub struct AndroidInput;

impl NativeInput for AndroidInput {
    fn keycode(&self, native: u32) -> KeyCode {
        match native {
            n if (AKEYCODE_A..AKEYCODE_A + 26).contains(&n) => KeyCode::letter(n - AKEYCODE_A),
            n if (AKEYCODE_0..AKEYCODE_0 + 10).contains(&n) => KeyCode::digit(n - AKEYCODE_0),
            n if (AKEYCODE_F1..AKEYCODE_F1 + 12).contains(&n) => {
                KeyCode::function(n - AKEYCODE_F1 + 1)
            }
            n => lookup(ANDROID_KEYS, n),
        }
    }

    fn modifiers(&self, native: u64) -> ModifierFlags {
        decode_bits(native, ANDROID_MODIFIERS)
    }

    fn mouse_button(&self, native: u32) -> MouseButton {
        button_from_mask(native)
    }
}

// =============================================================================
// UIKit hardware keyboard (HID usage page 0x07)
// =============================================================================

const HID_A: u32 = 0x04;
const HID_1: u32 = 0x1E;
const HID_0: u32 = 0x27;
const HID_F1: u32 = 0x3A;

const UIKIT_KEYS: &[(u32, KeyCode)] = &[
    (0x28, KeyCode::Enter),
    (0x58, KeyCode::Enter), // keypad enter
    (0x29, KeyCode::Escape),
    (0x2A, KeyCode::Backspace),
    (0x2B, KeyCode::Tab),
    (0x2C, KeyCode::Space),
    (0x49, KeyCode::Insert),
    (0x4A, KeyCode::Home),
    (0x4B, KeyCode::PageUp),
    (0x4C, KeyCode::Delete),
    (0x4D, KeyCode::End),
    (0x4E, KeyCode::PageDown),
    (0x4F, KeyCode::Right),
    (0x50, KeyCode::Left),
    (0x51, KeyCode::Down),
    (0x52, KeyCode::Up),
    (0xE0, KeyCode::Control),
    (0xE4, KeyCode::Control),
    (0xE1, KeyCode::Shift),
    (0xE5, KeyCode::Shift),
    (0xE2, KeyCode::Alt),
    (0xE6, KeyCode::Alt),
    (0xE3, KeyCode::Meta),
    (0xE7, KeyCode::Meta),
];

const UIKIT_MODIFIERS: &[(u64, ModifierFlags)] = &[
    (1 << 17, ModifierFlags::SHIFT),
    (1 << 18, ModifierFlags::CONTROL),
    (1 << 19, ModifierFlags::ALT),
    (1 << 20, ModifierFlags::META), // Command
];

/// `UIKeyboardHIDUsage` values, `UIKeyModifierFlags` and `UIEventButtonMask`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UiKitInput;

impl NativeInput for UiKitInput {
    fn keycode(&self, native: u32) -> KeyCode {
        match native {
            n if (HID_A..HID_A + 26).contains(&n) => KeyCode::letter(n - HID_A),
            n if (HID_1..HID_1 + 9).contains(&n) => KeyCode::digit(n - HID_1 + 1),
            HID_0 => KeyCode::Key0,
            n if (HID_F1..HID_F1 + 12).contains(&n) => KeyCode::function(n - HID_F1 + 1),
            n => lookup(UIKIT_KEYS, n),
        }
    }

    fn modifiers(&self, native: u64) -> ModifierFlags {
        decode_bits(native, UIKIT_MODIFIERS)
    }

    fn mouse_button(&self, native: u32) -> MouseButton {
        button_from_mask(native)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn lookup(table: &[(u32, KeyCode)], native: u32) -> KeyCode {
    table
        .iter()
        .find(|(n, _)| *n == native)
        .map(|(_, key)| *key)
        .unwrap_or(KeyCode::Unknown)
}

/// Single-bit button masks (primary=1, secondary=2, tertiary=4, back=8,
/// forward=16). Anything else passes through raw.
fn button_from_mask(native: u32) -> MouseButton {
    match native {
        0x01 => MouseButton::Primary,
        0x02 => MouseButton::Secondary,
        0x04 => MouseButton::Middle,
        0x08 => MouseButton::Back,
        0x10 => MouseButton::Forward,
        raw => MouseButton::Other(raw),
    }
}
