//! Commands a keystroke can be bound to

use std::str::FromStr;

use crate::messages::{AppMsg, Direction, DocumentMsg, EditorMsg, Msg, RunMsg};

/// Bindable editor commands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Run,
    Save,
    Quit,

    MoveCursorUp,
    MoveCursorDown,
    MoveCursorLeft,
    MoveCursorRight,
    MoveCursorLineStart,
    MoveCursorLineEnd,
    MoveCursorDocumentStart,
    MoveCursorDocumentEnd,
    PageUp,
    PageDown,

    InsertNewline,
    InsertTab,
    DeleteBackward,
    DeleteForward,

    /// Removes a default binding when used in a user keymap
    Unbound,
}

impl Command {
    /// Messages dispatched for this command
    pub fn to_msgs(self) -> Vec<Msg> {
        use Command::*;

        match self {
            Run => vec![Msg::Run(RunMsg::Start)],
            Save => vec![Msg::App(AppMsg::SaveRequested)],
            Quit => vec![Msg::App(AppMsg::Quit)],

            MoveCursorUp => vec![Msg::move_cursor(Direction::Up)],
            MoveCursorDown => vec![Msg::move_cursor(Direction::Down)],
            MoveCursorLeft => vec![Msg::move_cursor(Direction::Left)],
            MoveCursorRight => vec![Msg::move_cursor(Direction::Right)],
            MoveCursorLineStart => vec![Msg::Editor(EditorMsg::MoveCursorLineStart)],
            MoveCursorLineEnd => vec![Msg::Editor(EditorMsg::MoveCursorLineEnd)],
            MoveCursorDocumentStart => vec![Msg::Editor(EditorMsg::MoveCursorDocumentStart)],
            MoveCursorDocumentEnd => vec![Msg::Editor(EditorMsg::MoveCursorDocumentEnd)],
            PageUp => vec![Msg::Editor(EditorMsg::PageUp)],
            PageDown => vec![Msg::Editor(EditorMsg::PageDown)],

            InsertNewline => vec![Msg::Document(DocumentMsg::InsertNewline)],
            InsertTab => vec![Msg::Document(DocumentMsg::InsertTab)],
            DeleteBackward => vec![Msg::Document(DocumentMsg::DeleteBackward)],
            DeleteForward => vec![Msg::Document(DocumentMsg::DeleteForward)],

            Unbound => vec![],
        }
    }

    /// Whether the command edits or moves inside the buffer
    ///
    /// These are suppressed while a modal has focus.
    pub fn is_editing(self) -> bool {
        !matches!(self, Command::Run | Command::Save | Command::Quit | Command::Unbound)
    }
}

impl FromStr for Command {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Command::*;

        Ok(match s {
            "Run" => Run,
            "Save" => Save,
            "Quit" => Quit,
            "MoveCursorUp" => MoveCursorUp,
            "MoveCursorDown" => MoveCursorDown,
            "MoveCursorLeft" => MoveCursorLeft,
            "MoveCursorRight" => MoveCursorRight,
            "MoveCursorLineStart" => MoveCursorLineStart,
            "MoveCursorLineEnd" => MoveCursorLineEnd,
            "MoveCursorDocumentStart" => MoveCursorDocumentStart,
            "MoveCursorDocumentEnd" => MoveCursorDocumentEnd,
            "PageUp" => PageUp,
            "PageDown" => PageDown,
            "InsertNewline" => InsertNewline,
            "InsertTab" => InsertTab,
            "DeleteBackward" => DeleteBackward,
            "DeleteForward" => DeleteForward,
            "Unbound" => Unbound,
            _ => return Err(()),
        })
    }
}
