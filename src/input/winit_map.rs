//! winit input types mapped onto the canonical vocabulary.

use winit::keyboard::{KeyCode as WinitKey, ModifiersState, PhysicalKey};

use super::{KeyCode, ModifierFlags, MouseButton};

pub fn from_winit_key(key: PhysicalKey) -> KeyCode {
    let PhysicalKey::Code(code) = key else {
        return KeyCode::Unknown;
    };
    match code {
        WinitKey::KeyA => KeyCode::A,
        WinitKey::KeyB => KeyCode::B,
        WinitKey::KeyC => KeyCode::C,
        WinitKey::KeyD => KeyCode::D,
        WinitKey::KeyE => KeyCode::E,
        WinitKey::KeyF => KeyCode::F,
        WinitKey::KeyG => KeyCode::G,
        WinitKey::KeyH => KeyCode::H,
        WinitKey::KeyI => KeyCode::I,
        WinitKey::KeyJ => KeyCode::J,
        WinitKey::KeyK => KeyCode::K,
        WinitKey::KeyL => KeyCode::L,
        WinitKey::KeyM => KeyCode::M,
        WinitKey::KeyN => KeyCode::N,
        WinitKey::KeyO => KeyCode::O,
        WinitKey::KeyP => KeyCode::P,
        WinitKey::KeyQ => KeyCode::Q,
        WinitKey::KeyR => KeyCode::R,
        WinitKey::KeyS => KeyCode::S,
        WinitKey::KeyT => KeyCode::T,
        WinitKey::KeyU => KeyCode::U,
        WinitKey::KeyV => KeyCode::V,
        WinitKey::KeyW => KeyCode::W,
        WinitKey::KeyX => KeyCode::X,
        WinitKey::KeyY => KeyCode::Y,
        WinitKey::KeyZ => KeyCode::Z,
        WinitKey::Digit0 | WinitKey::Numpad0 => KeyCode::Key0,
        WinitKey::Digit1 | WinitKey::Numpad1 => KeyCode::Key1,
        WinitKey::Digit2 | WinitKey::Numpad2 => KeyCode::Key2,
        WinitKey::Digit3 | WinitKey::Numpad3 => KeyCode::Key3,
        WinitKey::Digit4 | WinitKey::Numpad4 => KeyCode::Key4,
        WinitKey::Digit5 | WinitKey::Numpad5 => KeyCode::Key5,
        WinitKey::Digit6 | WinitKey::Numpad6 => KeyCode::Key6,
        WinitKey::Digit7 | WinitKey::Numpad7 => KeyCode::Key7,
        WinitKey::Digit8 | WinitKey::Numpad8 => KeyCode::Key8,
        WinitKey::Digit9 | WinitKey::Numpad9 => KeyCode::Key9,
        WinitKey::Space => KeyCode::Space,
        WinitKey::Enter | WinitKey::NumpadEnter => KeyCode::Enter,
        WinitKey::Escape => KeyCode::Escape,
        WinitKey::Tab => KeyCode::Tab,
        WinitKey::Backspace => KeyCode::Backspace,
        WinitKey::Delete => KeyCode::Delete,
        WinitKey::Insert => KeyCode::Insert,
        WinitKey::Home => KeyCode::Home,
        WinitKey::End => KeyCode::End,
        WinitKey::PageUp => KeyCode::PageUp,
        WinitKey::PageDown => KeyCode::PageDown,
        WinitKey::ArrowUp => KeyCode::Up,
        WinitKey::ArrowDown => KeyCode::Down,
        WinitKey::ArrowLeft => KeyCode::Left,
        WinitKey::ArrowRight => KeyCode::Right,
        WinitKey::F1 => KeyCode::F1,
        WinitKey::F2 => KeyCode::F2,
        WinitKey::F3 => KeyCode::F3,
        WinitKey::F4 => KeyCode::F4,
        WinitKey::F5 => KeyCode::F5,
        WinitKey::F6 => KeyCode::F6,
        WinitKey::F7 => KeyCode::F7,
        WinitKey::F8 => KeyCode::F8,
        WinitKey::F9 => KeyCode::F9,
        WinitKey::F10 => KeyCode::F10,
        WinitKey::F11 => KeyCode::F11,
        WinitKey::F12 => KeyCode::F12,
        WinitKey::ShiftLeft | WinitKey::ShiftRight => KeyCode::Shift,
        WinitKey::ControlLeft | WinitKey::ControlRight => KeyCode::Control,
        WinitKey::AltLeft | WinitKey::AltRight => KeyCode::Alt,
        WinitKey::SuperLeft | WinitKey::SuperRight | WinitKey::Meta => KeyCode::Meta,
        _ => KeyCode::Unknown,
    }
}

pub fn from_winit_modifiers(state: ModifiersState) -> ModifierFlags {
    let mut flags = ModifierFlags::empty();
    flags.set(ModifierFlags::SHIFT, state.shift_key());
    flags.set(ModifierFlags::CONTROL, state.control_key());
    flags.set(ModifierFlags::ALT, state.alt_key());
    flags.set(ModifierFlags::META, state.super_key());
    flags
}

pub fn from_winit_button(button: winit::event::MouseButton) -> MouseButton {
    use winit::event::MouseButton as W;
    match button {
        W::Left => MouseButton::Primary,
        W::Right => MouseButton::Secondary,
        W::Middle => MouseButton::Middle,
        W::Back => MouseButton::Back,
        W::Forward => MouseButton::Forward,
        W::Other(raw) => MouseButton::Other(raw as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winit_keys() {
        assert_eq!(from_winit_key(PhysicalKey::Code(WinitKey::KeyQ)), KeyCode::Q);
        assert_eq!(from_winit_key(PhysicalKey::Code(WinitKey::Numpad4)), KeyCode::Key4);
        assert_eq!(from_winit_key(PhysicalKey::Code(WinitKey::ShiftRight)), KeyCode::Shift);
        assert_eq!(from_winit_key(PhysicalKey::Code(WinitKey::F13)), KeyCode::Unknown);
    }

    #[test]
    fn test_winit_modifiers() {
        let flags = from_winit_modifiers(ModifiersState::SHIFT | ModifiersState::SUPER);
        assert_eq!(flags, ModifierFlags::SHIFT | ModifierFlags::META);
    }

    #[test]
    fn test_winit_buttons() {
        assert_eq!(from_winit_button(winit::event::MouseButton::Right).index(), 1);
        assert_eq!(from_winit_button(winit::event::MouseButton::Other(7)).index(), 12);
        assert_eq!(from_winit_button(winit::event::MouseButton::Other(3)), MouseButton::Other(3));
    }
}
