//! Editor message handlers (cursor movement, scrolling)

use crate::commands::Cmd;
use crate::messages::{Direction, EditorMsg};
use crate::model::AppModel;

/// Handle editor messages (cursor movement, viewport scrolling)
pub fn update_editor(model: &mut AppModel, msg: EditorMsg) -> Option<Cmd> {
    let doc = &model.document;
    let editor = &mut model.editor;

    match msg {
        EditorMsg::MoveCursor(direction) => match direction {
            Direction::Up => editor.move_vertical(doc, -1),
            Direction::Down => editor.move_vertical(doc, 1),
            Direction::Left => editor.move_left(doc),
            Direction::Right => editor.move_right(doc),
        },
        EditorMsg::MoveCursorLineStart => editor.move_line_start(),
        EditorMsg::MoveCursorLineEnd => editor.move_line_end(doc),
        EditorMsg::MoveCursorDocumentStart => editor.move_document_start(),
        EditorMsg::MoveCursorDocumentEnd => editor.move_document_end(doc),

        EditorMsg::PageUp => {
            let jump = editor.page_jump();
            editor.move_vertical(doc, -(jump as isize));
            editor.scroll_lines(-(jump as isize), doc);
        }
        EditorMsg::PageDown => {
            let jump = editor.page_jump();
            editor.move_vertical(doc, jump as isize);
            editor.scroll_lines(jump as isize, doc);
        }

        EditorMsg::SetCursorPosition { line, column } => {
            editor.cursor.line = line;
            editor.cursor.column = column;
            editor.clamp_cursor(doc);
            editor.cursor.clear_desired_column();
        }

        // Scrolling leaves the cursor where it is
        EditorMsg::Scroll(delta) => {
            editor.scroll_lines(delta as isize, doc);
            return Some(Cmd::Redraw);
        }
        EditorMsg::ScrollOutput(delta) => {
            model.output.scroll_lines(delta as isize);
            return Some(Cmd::Redraw);
        }
    }

    model.ensure_cursor_visible();
    model.reset_cursor_blink();
    Some(Cmd::Redraw)
}
