//! Code Studio - Elm-style code editor with a Run button
//!
//! This crate provides the model, messages and update functions of the
//! editor, plus the script engine and run plumbing. The window, renderer
//! and event loop live in the binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_paths;
pub mod keymap;
pub mod messages;
pub mod model;
pub mod run;
pub mod script;
pub mod syntax;
pub mod theme;
pub mod tracing;
pub mod update;
pub mod view;

// Re-export commonly used types
pub use commands::Cmd;
pub use config::EditorConfig;
pub use messages::Msg;
pub use model::AppModel;
pub use theme::Theme;
