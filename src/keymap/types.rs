//! Keystroke types shared by the keymap parser, the winit adapter and lookup

use std::fmt;
use std::ops::BitOr;

/// Held modifier keys
///
/// `META` is Cmd on macOS and the Windows/Super key elsewhere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    bits: u8,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { bits: 0 };
    pub const CTRL: Modifiers = Modifiers { bits: 1 };
    pub const SHIFT: Modifiers = Modifiers { bits: 1 << 1 };
    pub const ALT: Modifiers = Modifiers { bits: 1 << 2 };
    pub const META: Modifiers = Modifiers { bits: 1 << 3 };

    /// Config-file names, in the order they are written out
    const NAMES: [(Modifiers, &'static str); 4] = [
        (Modifiers::CTRL, "ctrl"),
        (Modifiers::SHIFT, "shift"),
        (Modifiers::ALT, "alt"),
        (Modifiers::META, "meta"),
    ];

    pub fn new(ctrl: bool, shift: bool, alt: bool, meta: bool) -> Self {
        [ctrl, shift, alt, meta]
            .into_iter()
            .zip(Self::NAMES)
            .filter(|(held, _)| *held)
            .fold(Modifiers::NONE, |acc, (_, (flag, _))| acc | flag)
    }

    pub const fn contains(self, other: Modifiers) -> bool {
        self.bits & other.bits == other.bits
    }

    pub const fn ctrl(self) -> bool {
        self.contains(Self::CTRL)
    }

    pub const fn shift(self) -> bool {
        self.contains(Self::SHIFT)
    }

    /// The shortcut modifier written `cmd` in keymap files
    pub fn cmd() -> Modifiers {
        if cfg!(target_os = "macos") {
            Modifiers::META
        } else {
            Modifiers::CTRL
        }
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        Modifiers {
            bits: self.bits | rhs.bits,
        }
    }
}

/// Logical key, independent of layout for the named keys
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Character key, stored lowercase
    Char(char),
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Space,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
}

impl KeyCode {
    /// Name used in keymap files (`pageup`, `backspace`, ...)
    pub fn config_name(self) -> String {
        let name = match self {
            KeyCode::Char(c) => return c.to_string(),
            KeyCode::Enter => "enter",
            KeyCode::Escape => "escape",
            KeyCode::Tab => "tab",
            KeyCode::Backspace => "backspace",
            KeyCode::Delete => "delete",
            KeyCode::Space => "space",
            KeyCode::Up => "up",
            KeyCode::Down => "down",
            KeyCode::Left => "left",
            KeyCode::Right => "right",
            KeyCode::Home => "home",
            KeyCode::End => "end",
            KeyCode::PageUp => "pageup",
            KeyCode::PageDown => "pagedown",
        };
        name.to_string()
    }
}

/// A key plus the modifiers held with it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Keystroke {
    pub key: KeyCode,
    pub mods: Modifiers,
}

impl Keystroke {
    pub const fn new(key: KeyCode, mods: Modifiers) -> Self {
        Self { key, mods }
    }

    pub const fn key(key: KeyCode) -> Self {
        Self::new(key, Modifiers::NONE)
    }
}

/// Written in keymap-file syntax, e.g. `ctrl+shift+s`
impl fmt::Display for Keystroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, name) in Modifiers::NAMES {
            if self.mods.contains(flag) {
                write!(f, "{}+", name)?;
            }
        }
        f.write_str(&self.key.config_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_each_flag() {
        let mods = Modifiers::new(true, false, true, false);
        assert!(mods.ctrl());
        assert!(!mods.shift());
        assert!(mods.contains(Modifiers::ALT));
        assert!(!mods.contains(Modifiers::META));
        assert_eq!(Modifiers::new(false, false, false, false), Modifiers::NONE);
    }

    #[test]
    fn test_display_matches_keymap_syntax() {
        let stroke = Keystroke::new(KeyCode::Char('s'), Modifiers::SHIFT | Modifiers::CTRL);
        assert_eq!(stroke.to_string(), "ctrl+shift+s");
        assert_eq!(Keystroke::key(KeyCode::PageDown).to_string(), "pagedown");
    }
}
