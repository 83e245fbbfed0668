//! Configurable keyboard mapping
//!
//! Maps keystrokes to editor commands. Defaults ship as an embedded
//! `keymap.yaml`; a user file with the same format can override them.
//!
//! # Architecture
//!
//! ```text
//! winit::KeyEvent → Keystroke → Keymap::lookup() → Command → Vec<Msg>
//! ```
//!
//! Keys without a binding fall through to text input in the runtime.

mod command;
mod config;
#[allow(clippy::module_inception)]
mod keymap;
mod types;
mod winit_adapter;

pub use command::Command;
pub use config::{load_keymap_file, parse_key_string, parse_keymap_yaml, KeymapError};
pub use keymap::{default_bindings, embedded_keymap, load_default_keymap, Keybinding, Keymap};
pub use types::{KeyCode, Keystroke, Modifiers};
pub use winit_adapter::keystroke_from_winit;

#[cfg(test)]
mod tests;
