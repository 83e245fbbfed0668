//! Document message handlers (text editing)
//!
//! Every edit goes through `Document::insert`/`remove`, which re-highlight
//! only the touched lines.

use crate::commands::Cmd;
use crate::messages::DocumentMsg;
use crate::model::AppModel;

/// Spaces inserted by Tab
pub const TAB_TEXT: &str = "    ";

/// Handle document messages (text editing)
pub fn update_document(model: &mut AppModel, msg: DocumentMsg) -> Option<Cmd> {
    match msg {
        DocumentMsg::InsertChar(ch) => {
            let mut buf = [0u8; 4];
            insert_text(model, ch.encode_utf8(&mut buf));
        }
        DocumentMsg::InsertNewline => insert_text(model, "\n"),
        DocumentMsg::InsertTab => insert_text(model, TAB_TEXT),

        DocumentMsg::DeleteBackward => {
            let offset = model.editor.cursor_offset(&model.document);
            if offset == 0 {
                return None;
            }
            let start = offset - line_break_len_before(model, offset);
            model.document.remove(start..offset);
            model
                .editor
                .set_cursor_from_offset(&model.document, start);
        }

        DocumentMsg::DeleteForward => {
            let offset = model.editor.cursor_offset(&model.document);
            let len = model.document.buffer.len_chars();
            if offset >= len {
                return None;
            }
            let end = offset + line_break_len_at(model, offset);
            model.document.remove(offset..end);
        }
    }

    model.ensure_cursor_visible();
    model.reset_cursor_blink();
    Some(Cmd::Redraw)
}

fn insert_text(model: &mut AppModel, text: &str) {
    let offset = model.editor.cursor_offset(&model.document);
    model.document.insert(offset, text);
    model
        .editor
        .set_cursor_from_offset(&model.document, offset + text.chars().count());
}

/// Chars removed by Backspace at `offset`: a CRLF pair goes as one
fn line_break_len_before(model: &AppModel, offset: usize) -> usize {
    let buffer = &model.document.buffer;
    if offset >= 2 && buffer.char(offset - 1) == '\n' && buffer.char(offset - 2) == '\r' {
        2
    } else {
        1
    }
}

/// Chars removed by Delete at `offset`: a CRLF pair goes as one
fn line_break_len_at(model: &AppModel, offset: usize) -> usize {
    let buffer = &model.document.buffer;
    if buffer.char(offset) == '\r'
        && offset + 1 < buffer.len_chars()
        && buffer.char(offset + 1) == '\n'
    {
        2
    } else {
        1
    }
}
