//! Application model - the complete state of the editor
//!
//! This module contains all the state types following the Elm Architecture pattern.

pub mod document;
pub mod editor;
pub mod layout;
pub mod output;
pub mod ui;

pub use document::Document;
pub use editor::{Cursor, EditorState, Viewport};
pub use layout::{
    gutter_border_x, text_start_x, DialogSize, Layout, Rect, ToolbarItem,
    LINE_NUMBER_GUTTER_CHARS,
};
pub use output::{OutputLog, ERROR_PREFIX};
pub use ui::{
    DebugDialogState, InputPromptState, MenuState, ModalId, ModalState, UiState,
};

use std::path::PathBuf;

use crate::cli::StartupConfig;
use crate::config::EditorConfig;
use crate::theme::{Theme, ThemeId};

/// Lifecycle of the Run button
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    /// A script is running on the worker thread
    Evaluating,
    /// The script is blocked in `input()` waiting for the prompt modal
    AwaitingInput { prompt: String },
}

impl RunState {
    pub fn is_running(&self) -> bool {
        !matches!(self, RunState::Idle)
    }

    /// Short text for the status bar
    pub fn label(&self) -> &'static str {
        match self {
            RunState::Idle => "Ready",
            RunState::Evaluating => "Running",
            RunState::AwaitingInput { .. } => "Waiting for input",
        }
    }
}

/// The complete application model
#[derive(Debug)]
pub struct AppModel {
    /// The buffer being edited
    pub document: Document,
    /// Cursor and viewport over the buffer
    pub editor: EditorState,
    /// Read-only pane under the editor
    pub output: OutputLog,
    /// UI state (status bar, cursor blink, modals)
    pub ui: UiState,
    /// Resolved colors of the active theme
    pub theme: Theme,
    pub theme_id: ThemeId,
    /// Startup configuration
    pub config: EditorConfig,
    pub run_state: RunState,
    /// Window dimensions
    pub window_size: (u32, u32),
    /// Line height in pixels
    pub line_height: usize,
    /// Character width in pixels (monospace)
    pub char_width: f32,
}

impl AppModel {
    /// Create a new application model with the given window size
    pub fn new(window_width: u32, window_height: u32, startup: StartupConfig) -> Self {
        let line_height = 20;
        let char_width: f32 = 10.0; // Will be corrected by renderer with actual font metrics

        let (document, status_message) = match &startup.file {
            Some(path) => match Document::from_file(path, startup.language) {
                Ok(doc) => (doc, format!("Loaded: {}", path.display())),
                Err(e) => {
                    tracing::warn!("Failed to open {}: {}", path.display(), e);
                    let msg = format!("Error loading {}: {}", path.display(), e);
                    let mut doc = Document::new(startup.language);
                    doc.file_path = Some(path.clone());
                    (doc, msg)
                }
            },
            None => (Document::new(startup.language), String::new()),
        };

        let mut model = Self {
            document,
            editor: EditorState::new(),
            output: OutputLog::new(),
            ui: UiState::with_status(status_message),
            theme: Theme::for_id(startup.theme),
            theme_id: startup.theme,
            config: startup.editor,
            run_state: RunState::Idle,
            window_size: (window_width, window_height),
            line_height,
            char_width,
        };
        model.relayout();
        model
    }

    /// Current layout of the window
    pub fn layout(&self) -> Layout {
        Layout::compute(
            self.window_size,
            self.line_height,
            self.char_width,
            self.document.language,
        )
    }

    /// Push pane sizes from the layout into the editor and output state
    fn relayout(&mut self) {
        let layout = self.layout();
        let (lines, columns) = layout.editor_text_size();
        self.editor.resize_viewport(lines, columns);
        self.output.set_visible_lines(layout.output_visible_lines());
        self.editor.ensure_cursor_visible(&self.document);
    }

    /// Update window size and recalculate viewport dimensions
    pub fn resize(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
        self.relayout();
    }

    /// Set font metrics measured by the renderer
    pub fn set_font_metrics(&mut self, line_height: usize, char_width: f32) {
        self.line_height = line_height.max(1);
        self.char_width = char_width.max(1.0);
        self.relayout();
    }

    pub fn ensure_cursor_visible(&mut self) {
        self.editor.ensure_cursor_visible(&self.document);
    }

    pub fn reset_cursor_blink(&mut self) {
        self.ui.reset_cursor_blink();
    }

    /// Replace the active theme
    pub fn apply_theme(&mut self, id: ThemeId) {
        self.theme = Theme::for_id(id);
        self.theme_id = id;
    }

    /// Where the HTML preview is written
    pub fn preview_path(&self) -> PathBuf {
        self.config.preview_file.clone()
    }

    /// Title shown by the window manager
    pub fn window_title(&self) -> String {
        match &self.document.file_path {
            Some(_) => {
                let dirty = if self.document.is_modified { "*" } else { "" };
                format!("{}{} - Code Studio", self.document.display_name(), dirty)
            }
            None => "Code Studio".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::LanguageTag;

    fn startup() -> StartupConfig {
        StartupConfig {
            file: None,
            language: LanguageTag::Python,
            theme: ThemeId::Default,
            editor: EditorConfig::default(),
        }
    }

    #[test]
    fn test_new_model_is_idle_and_empty() {
        let model = AppModel::new(800, 600, startup());
        assert_eq!(model.run_state, RunState::Idle);
        assert!(model.output.is_empty());
        assert_eq!(model.document.text(), "");
        assert_eq!(model.window_title(), "Code Studio");
        assert!(model.editor.viewport.visible_lines > 0);
    }

    #[test]
    fn test_missing_file_sets_error_status() {
        let mut config = startup();
        config.file = Some(PathBuf::from("/definitely/not/here.py"));
        let model = AppModel::new(800, 600, config);
        assert!(model.ui.status_message.starts_with("Error loading"));
        assert_eq!(model.window_title(), "here.py - Code Studio");
    }

    #[test]
    fn test_apply_theme_replaces_colors() {
        let mut model = AppModel::new(800, 600, startup());
        model.apply_theme(ThemeId::SolarizedLight);
        assert_eq!(model.theme_id, ThemeId::SolarizedLight);
        assert_eq!(model.theme, Theme::for_id(ThemeId::SolarizedLight));
    }
}
