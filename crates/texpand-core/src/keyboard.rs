use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use rdev::{Event, EventType, Key as RdevKey};
use std::thread;
use std::time::Duration;

use crate::config::is_boundary_char;
use crate::error::{Result, TexpandError};
use crate::matcher::{BoundaryKey, KeyInput};

/// Reduce a raw input event to the matcher's input alphabet. Only
/// key-press events carry matching semantics; everything else is `Other`.
pub fn key_input_from_event(event: &Event) -> KeyInput {
    let key = match event.event_type {
        EventType::KeyPress(key) => key,
        _ => return KeyInput::Other,
    };

    match key {
        RdevKey::Space => KeyInput::Boundary(BoundaryKey::Space),
        RdevKey::Return => KeyInput::Boundary(BoundaryKey::Enter),
        RdevKey::Tab => KeyInput::Boundary(BoundaryKey::Tab),
        RdevKey::Backspace => KeyInput::Backspace,
        _ => match event_char(event) {
            Some(c) if is_boundary_char(c) => KeyInput::Boundary(BoundaryKey::Char(c)),
            Some(c) => KeyInput::Char(c),
            None => KeyInput::Other,
        },
    }
}

/// Printable character carried by a key event, if any. The OS reports the
/// layout-resolved character (including shifted punctuation) through the
/// event name, so we read it from there rather than mapping key codes.
fn event_char(event: &Event) -> Option<char> {
    let name = event.name.as_ref()?;
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_control() => Some(c),
        _ => None,
    }
}

/// Create a keyboard controller for synthetic input
pub fn create_keyboard_controller() -> Result<Enigo> {
    let settings = Settings::default();
    Enigo::new(&settings).map_err(|err| {
        TexpandError::InjectionFailed(format!("failed to create keyboard controller: {}", err))
    })
}

/// Send backspace key presses
pub fn send_backspace(keyboard: &mut Enigo, count: usize) -> Result<()> {
    for _ in 0..count {
        // Small delay so the focused application keeps up with deletion
        thread::sleep(Duration::from_millis(2));

        keyboard
            .key(Key::Backspace, Direction::Click)
            .map_err(|err| {
                TexpandError::InjectionFailed(format!("failed to send backspace: {}", err))
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn press(key: RdevKey, name: Option<&str>) -> Event {
        Event {
            time: SystemTime::now(),
            name: name.map(|s| s.to_string()),
            event_type: EventType::KeyPress(key),
        }
    }

    #[test]
    fn space_enter_tab_are_boundary_keys() {
        assert_eq!(
            key_input_from_event(&press(RdevKey::Space, Some(" "))),
            KeyInput::Boundary(BoundaryKey::Space)
        );
        assert_eq!(
            key_input_from_event(&press(RdevKey::Return, None)),
            KeyInput::Boundary(BoundaryKey::Enter)
        );
        assert_eq!(
            key_input_from_event(&press(RdevKey::Tab, None)),
            KeyInput::Boundary(BoundaryKey::Tab)
        );
    }

    #[test]
    fn named_characters_become_chars_or_boundaries() {
        assert_eq!(
            key_input_from_event(&press(RdevKey::KeyA, Some("a"))),
            KeyInput::Char('a')
        );
        assert_eq!(
            key_input_from_event(&press(RdevKey::KeyA, Some("A"))),
            KeyInput::Char('A')
        );
        assert_eq!(
            key_input_from_event(&press(RdevKey::Dot, Some("."))),
            KeyInput::Boundary(BoundaryKey::Char('.'))
        );
    }

    #[test]
    fn unnamed_keys_are_other() {
        assert_eq!(
            key_input_from_event(&press(RdevKey::ShiftLeft, None)),
            KeyInput::Other
        );
        assert_eq!(
            key_input_from_event(&press(RdevKey::F5, Some(""))),
            KeyInput::Other
        );
    }

    #[test]
    fn key_release_is_other() {
        let event = Event {
            time: SystemTime::now(),
            name: Some("a".to_string()),
            event_type: EventType::KeyRelease(RdevKey::KeyA),
        };
        assert_eq!(key_input_from_event(&event), KeyInput::Other);
    }

    #[test]
    fn backspace_is_recognized() {
        assert_eq!(
            key_input_from_event(&press(RdevKey::Backspace, None)),
            KeyInput::Backspace
        );
    }
}
