//! Adapter to convert winit key events to our Keystroke type

use winit::keyboard::{Key, NamedKey};

use super::types::{KeyCode, Keystroke, Modifiers};

/// Convert winit key event data to our Keystroke type
///
/// Returns None if the key cannot be mapped (e.g., unknown keys)
pub fn keystroke_from_winit(
    logical_key: &Key,
    ctrl: bool,
    shift: bool,
    alt: bool,
    logo: bool, // logo = meta = cmd on macOS
) -> Option<Keystroke> {
    let mods = Modifiers::new(ctrl, shift, alt, logo);

    let key_code = match logical_key {
        Key::Named(named) => match named {
            NamedKey::Enter => KeyCode::Enter,
            NamedKey::Escape => KeyCode::Escape,
            NamedKey::Tab => KeyCode::Tab,
            NamedKey::Backspace => KeyCode::Backspace,
            NamedKey::Delete => KeyCode::Delete,
            NamedKey::Space => KeyCode::Space,
            NamedKey::ArrowUp => KeyCode::Up,
            NamedKey::ArrowDown => KeyCode::Down,
            NamedKey::ArrowLeft => KeyCode::Left,
            NamedKey::ArrowRight => KeyCode::Right,
            NamedKey::Home => KeyCode::Home,
            NamedKey::End => KeyCode::End,
            NamedKey::PageUp => KeyCode::PageUp,
            NamedKey::PageDown => KeyCode::PageDown,
            _ => return None,
        },

        // Character keys - normalize to lowercase
        Key::Character(s) => {
            let c = s.chars().next()?;
            KeyCode::Char(c.to_ascii_lowercase())
        }

        _ => return None,
    };

    Some(Keystroke::new(key_code, mods))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_key() {
        let stroke = keystroke_from_winit(&Key::Character("r".into()), true, false, false, false)
            .expect("should map");
        assert_eq!(stroke.key, KeyCode::Char('r'));
        assert!(stroke.mods.ctrl());
        assert!(!stroke.mods.shift());
    }

    #[test]
    fn test_uppercase_normalized() {
        let stroke = keystroke_from_winit(&Key::Character("S".into()), false, true, false, false)
            .expect("should map");
        assert_eq!(stroke.key, KeyCode::Char('s'));
        assert!(stroke.mods.shift());
    }

    #[test]
    fn test_named_key() {
        let stroke =
            keystroke_from_winit(&Key::Named(NamedKey::Home), false, false, false, false)
                .expect("should map");
        assert_eq!(stroke, Keystroke::key(KeyCode::Home));
    }

    #[test]
    fn test_unmapped_named_key() {
        assert!(
            keystroke_from_winit(&Key::Named(NamedKey::F13), false, false, false, false).is_none()
        );
    }
}
