//! Keymap struct for storing and looking up keybindings

use std::collections::HashMap;

use super::command::Command;
use super::config::{load_keymap_file, parse_keymap_yaml};
use super::types::{KeyCode, Keystroke, Modifiers};

/// Default keymap YAML embedded at compile time
const DEFAULT_KEYMAP_YAML: &str = include_str!("../../keymap.yaml");

/// A mapping from one keystroke to a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keybinding {
    pub keystroke: Keystroke,
    pub command: Command,
}

impl Keybinding {
    pub fn new(keystroke: Keystroke, command: Command) -> Self {
        Self { keystroke, command }
    }
}

/// The keymap stores all keybindings and handles lookup
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    lookup: HashMap<Keystroke, Command>,
}

impl Keymap {
    /// Create a keymap with the given bindings; later bindings win
    pub fn with_bindings(bindings: Vec<Keybinding>) -> Self {
        let mut keymap = Self::default();
        for binding in bindings {
            keymap.add_binding(binding);
        }
        keymap
    }

    /// Add a binding, replacing any existing one for the same keystroke
    pub fn add_binding(&mut self, binding: Keybinding) {
        if binding.command == Command::Unbound {
            if self.lookup.remove(&binding.keystroke).is_some() {
                tracing::debug!("Unbound {}", binding.keystroke);
            }
        } else if let Some(previous) = self.lookup.insert(binding.keystroke, binding.command) {
            if previous != binding.command {
                tracing::debug!(
                    "Rebound {}: {:?} -> {:?}",
                    binding.keystroke,
                    previous,
                    binding.command
                );
            }
        }
    }

    pub fn lookup(&self, keystroke: &Keystroke) -> Option<Command> {
        self.lookup.get(keystroke).copied()
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

/// Hardcoded fallback if the embedded YAML fails to parse
pub fn default_bindings() -> Vec<Keybinding> {
    let cmd = Modifiers::cmd();
    let plain = |key, command| Keybinding::new(Keystroke::key(key), command);

    vec![
        Keybinding::new(Keystroke::new(KeyCode::Char('r'), cmd), Command::Run),
        Keybinding::new(Keystroke::new(KeyCode::Char('s'), cmd), Command::Save),
        Keybinding::new(Keystroke::new(KeyCode::Char('q'), cmd), Command::Quit),
        plain(KeyCode::Up, Command::MoveCursorUp),
        plain(KeyCode::Down, Command::MoveCursorDown),
        plain(KeyCode::Left, Command::MoveCursorLeft),
        plain(KeyCode::Right, Command::MoveCursorRight),
        plain(KeyCode::Home, Command::MoveCursorLineStart),
        plain(KeyCode::End, Command::MoveCursorLineEnd),
        Keybinding::new(
            Keystroke::new(KeyCode::Home, Modifiers::CTRL),
            Command::MoveCursorDocumentStart,
        ),
        Keybinding::new(
            Keystroke::new(KeyCode::End, Modifiers::CTRL),
            Command::MoveCursorDocumentEnd,
        ),
        plain(KeyCode::PageUp, Command::PageUp),
        plain(KeyCode::PageDown, Command::PageDown),
        plain(KeyCode::Enter, Command::InsertNewline),
        plain(KeyCode::Tab, Command::InsertTab),
        plain(KeyCode::Backspace, Command::DeleteBackward),
        plain(KeyCode::Delete, Command::DeleteForward),
    ]
}

/// Embedded defaults merged with `~/.config/code-studio/keymap.yaml`
pub fn load_default_keymap() -> Keymap {
    let mut bindings = match parse_keymap_yaml(DEFAULT_KEYMAP_YAML) {
        Ok(b) => {
            tracing::info!("Loaded embedded default keymap ({} bindings)", b.len());
            b
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse embedded keymap: {}, using hardcoded defaults",
                e
            );
            default_bindings()
        }
    };

    if let Some(user_path) = crate::config_paths::keymap_file() {
        if user_path.exists() {
            match load_keymap_file(&user_path) {
                Ok(user_bindings) => {
                    tracing::info!(
                        "Merging user keymap from {} ({} bindings)",
                        user_path.display(),
                        user_bindings.len()
                    );
                    bindings.extend(user_bindings);
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to load user keymap from {}: {}",
                        user_path.display(),
                        e
                    );
                }
            }
        }
    }

    Keymap::with_bindings(bindings)
}

/// Keymap built from the embedded YAML only
pub fn embedded_keymap() -> Keymap {
    Keymap::with_bindings(parse_keymap_yaml(DEFAULT_KEYMAP_YAML).unwrap_or_else(|e| {
        tracing::warn!("Failed to parse embedded keymap: {}", e);
        default_bindings()
    }))
}
