//! keymap.yaml loading
//!
//! A file is a list of `{ key, command, platform? }` entries. Entries for
//! another platform are dropped before their keys are parsed.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use super::command::Command;
use super::keymap::Keybinding;
use super::types::{KeyCode, Keystroke, Modifiers};

#[derive(Debug, Deserialize)]
struct KeymapFile {
    bindings: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    key: String,
    command: String,
    #[serde(default)]
    platform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeymapError {
    IoError(String),
    ParseError(String),
    InvalidKey(String),
    InvalidCommand(String),
}

impl fmt::Display for KeymapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, detail) = match self {
            KeymapError::IoError(d) => ("cannot read keymap", d),
            KeymapError::ParseError(d) => ("malformed keymap", d),
            KeymapError::InvalidKey(d) => ("unknown key", d),
            KeymapError::InvalidCommand(d) => ("unknown command", d),
        };
        write!(f, "{}: {}", kind, detail)
    }
}

impl std::error::Error for KeymapError {}

/// Spellings accepted for each named key
const KEY_NAMES: &[(&str, KeyCode)] = &[
    ("enter", KeyCode::Enter),
    ("return", KeyCode::Enter),
    ("escape", KeyCode::Escape),
    ("esc", KeyCode::Escape),
    ("tab", KeyCode::Tab),
    ("backspace", KeyCode::Backspace),
    ("delete", KeyCode::Delete),
    ("del", KeyCode::Delete),
    ("space", KeyCode::Space),
    ("up", KeyCode::Up),
    ("down", KeyCode::Down),
    ("left", KeyCode::Left),
    ("right", KeyCode::Right),
    ("home", KeyCode::Home),
    ("end", KeyCode::End),
    ("pageup", KeyCode::PageUp),
    ("pgup", KeyCode::PageUp),
    ("pagedown", KeyCode::PageDown),
    ("pgdn", KeyCode::PageDown),
];

fn modifier_named(name: &str) -> Option<Modifiers> {
    Some(match name {
        "cmd" => Modifiers::cmd(),
        "ctrl" | "control" => Modifiers::CTRL,
        "shift" => Modifiers::SHIFT,
        "alt" | "option" => Modifiers::ALT,
        "meta" | "super" | "win" => Modifiers::META,
        _ => return None,
    })
}

fn key_named(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c));
    }
    KEY_NAMES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, key)| *key)
}

impl FromStr for Keystroke {
    type Err = KeymapError;

    /// Accepts `+`-joined parts in any order, case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mods = Modifiers::NONE;
        let mut key = None;

        for part in s.split('+').map(|p| p.trim().to_lowercase()) {
            if let Some(flag) = modifier_named(&part) {
                mods = mods | flag;
                continue;
            }
            let code = key_named(&part).ok_or_else(|| KeymapError::InvalidKey(part.clone()))?;
            if key.replace(code).is_some() {
                return Err(KeymapError::InvalidKey(format!("more than one key in {:?}", s)));
            }
        }

        match key {
            Some(key) => Ok(Keystroke::new(key, mods)),
            None => Err(KeymapError::InvalidKey(format!("no key in {:?}", s))),
        }
    }
}

/// Parse one binding's key, e.g. `ctrl+shift+s`
pub fn parse_key_string(key: &str) -> Result<Keystroke, KeymapError> {
    key.parse()
}

pub fn load_keymap_file(path: &Path) -> Result<Vec<Keybinding>, KeymapError> {
    let yaml = std::fs::read_to_string(path).map_err(|e| KeymapError::IoError(e.to_string()))?;
    parse_keymap_yaml(&yaml)
}

pub fn parse_keymap_yaml(yaml: &str) -> Result<Vec<Keybinding>, KeymapError> {
    let file: KeymapFile =
        serde_yaml::from_str(yaml).map_err(|e| KeymapError::ParseError(e.to_string()))?;
    let platform = platform_name();

    file.bindings
        .into_iter()
        .filter(|entry| entry.platform.as_deref().map_or(true, |p| p == platform))
        .map(|entry| {
            let keystroke = entry.key.parse::<Keystroke>()?;
            let command = Command::from_str(&entry.command)
                .map_err(|_| KeymapError::InvalidCommand(entry.command))?;
            Ok(Keybinding::new(keystroke, command))
        })
        .collect()
}

fn platform_name() -> &'static str {
    match std::env::consts::OS {
        "macos" => "macos",
        "windows" => "windows",
        _ => "linux",
    }
}
