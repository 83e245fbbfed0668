//! Message types for the Elm-style architecture
//!
//! All state changes flow through these message types.

use std::path::PathBuf;

use crate::syntax::LanguageTag;
use crate::theme::ThemeId;

/// Direction for cursor movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Editor-specific messages (cursor movement, viewport scrolling)
#[derive(Debug, Clone)]
pub enum EditorMsg {
    /// Move cursor in a direction
    MoveCursor(Direction),
    /// Move cursor to start of line (Home key)
    MoveCursorLineStart,
    /// Move cursor to end of line (End key)
    MoveCursorLineEnd,
    /// Move cursor to start of document (Ctrl+Home)
    MoveCursorDocumentStart,
    /// Move cursor to end of document (Ctrl+End)
    MoveCursorDocumentEnd,
    PageUp,
    PageDown,
    /// Set cursor to specific position (from mouse click)
    SetCursorPosition { line: usize, column: usize },
    /// Scroll viewport vertically (positive = down, negative = up)
    Scroll(i32),
    /// Scroll the output pane (positive = down, negative = up)
    ScrollOutput(i32),
}

/// Document-specific messages (text editing)
#[derive(Debug, Clone)]
pub enum DocumentMsg {
    /// Insert a character at cursor
    InsertChar(char),
    /// Insert a newline at cursor
    InsertNewline,
    /// Insert four spaces (Tab)
    InsertTab,
    /// Delete character before cursor (Backspace)
    DeleteBackward,
    /// Delete character at cursor (Delete)
    DeleteForward,
}

/// Modal-specific messages (input prompt, dialogs, dropdowns)
#[derive(Debug, Clone)]
pub enum ModalMsg {
    /// Insert character into the prompt input
    InsertChar(char),
    /// Delete character from the prompt input (backspace)
    DeleteBackward,
    /// Move selection up in a dropdown
    SelectPrevious,
    /// Move selection down in a dropdown
    SelectNext,
    /// Pick a dropdown entry directly (mouse click)
    SelectIndex(usize),
    /// Scroll the debug dialog's buffer echo
    Scroll(i32),
    /// Confirm the modal action (Enter)
    Confirm,
    /// Dismiss the modal (Escape, click outside)
    Cancel,
}

/// UI-specific messages (status bar, cursor blink, modals)
#[derive(Debug, Clone)]
pub enum UiMsg {
    /// Set status bar message
    SetStatus(String),
    /// Toggle cursor blink state
    BlinkCursor,
    /// Open the about dialog
    OpenInfo,
    /// Open the debug dialog
    OpenDebug,
    /// Open the Themes menu
    OpenThemeMenu,
    /// Open the toolbar language dropdown
    OpenLanguageMenu,
    /// Modal messages
    Modal(ModalMsg),
}

/// Application-level messages (file operations, window events)
#[derive(Debug, Clone)]
pub enum AppMsg {
    /// Window resized
    Resize(u32, u32),
    /// Save button or Ctrl+S
    SaveRequested,
    /// Save dialog returned a path (or None if cancelled)
    SaveDialogResult { path: Option<PathBuf> },
    /// File save completed (async result)
    SaveCompleted(Result<PathBuf, String>),
    /// Switch the buffer's language
    SetLanguage(LanguageTag),
    /// Quit the application
    Quit,
}

/// Run button and script worker messages
#[derive(Debug, Clone)]
pub enum RunMsg {
    /// Run button or Ctrl+R
    Start,
    /// Stop button
    Cancel,
    /// Text printed by the running script
    Output(String),
    /// The script is blocked in `input()`
    InputRequested(String),
    /// The worker thread exited
    Finished(Result<(), String>),
    /// The preview file was written and handed to the browser
    PreviewFinished(Result<PathBuf, String>),
}

/// Top-level message type
#[derive(Debug, Clone)]
pub enum Msg {
    /// Editor messages (cursor, viewport)
    Editor(EditorMsg),
    /// Document messages (text editing)
    Document(DocumentMsg),
    /// UI messages (status, animation, modals)
    Ui(UiMsg),
    /// App messages (file I/O, window)
    App(AppMsg),
    /// Run button and evaluation worker
    Run(RunMsg),
    /// Apply a theme from the Themes menu
    Theme(ThemeId),
}

// Convenience constructors for common messages
impl Msg {
    /// Create a cursor movement message
    pub fn move_cursor(direction: Direction) -> Self {
        Msg::Editor(EditorMsg::MoveCursor(direction))
    }

    /// Create an insert character message
    pub fn insert_char(ch: char) -> Self {
        Msg::Document(DocumentMsg::InsertChar(ch))
    }

    /// Create a resize message
    pub fn resize(width: u32, height: u32) -> Self {
        Msg::App(AppMsg::Resize(width, height))
    }
}
