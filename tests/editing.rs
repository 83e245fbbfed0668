//! Text editing and cursor movement tests

mod common;

use common::{buffer_to_string, test_model};
use code_studio::messages::{Direction, DocumentMsg, EditorMsg, Msg};
use code_studio::syntax::HighlightCategory;
use code_studio::update::update;

// ========================================================================
// Insertion
// ========================================================================

#[test]
fn test_insert_char_at_middle() {
    let mut model = test_model("hello", 0, 2);
    update(&mut model, Msg::Document(DocumentMsg::InsertChar('X')));

    assert_eq!(buffer_to_string(&model), "heXllo");
    assert_eq!(model.editor.cursor.column, 3);
    assert!(model.document.is_modified);
}

#[test]
fn test_insert_newline_splits_line() {
    let mut model = test_model("helloworld", 0, 5);
    update(&mut model, Msg::Document(DocumentMsg::InsertNewline));

    assert_eq!(buffer_to_string(&model), "hello\nworld");
    assert_eq!(model.editor.cursor.line, 1);
    assert_eq!(model.editor.cursor.column, 0);
}

#[test]
fn test_tab_inserts_four_spaces() {
    let mut model = test_model("x", 0, 0);
    update(&mut model, Msg::Document(DocumentMsg::InsertTab));

    assert_eq!(buffer_to_string(&model), "    x");
    assert_eq!(model.editor.cursor.column, 4);
}

// ========================================================================
// Deletion
// ========================================================================

#[test]
fn test_backspace_joins_lines() {
    let mut model = test_model("ab\ncd", 1, 0);
    update(&mut model, Msg::Document(DocumentMsg::DeleteBackward));

    assert_eq!(buffer_to_string(&model), "abcd");
    assert_eq!(model.editor.cursor.line, 0);
    assert_eq!(model.editor.cursor.column, 2);
}

#[test]
fn test_backspace_removes_crlf_pair() {
    let mut model = test_model("ab\r\ncd", 1, 0);
    update(&mut model, Msg::Document(DocumentMsg::DeleteBackward));

    assert_eq!(buffer_to_string(&model), "abcd");
}

#[test]
fn test_backspace_at_start_is_noop() {
    let mut model = test_model("abc", 0, 0);
    let cmd = update(&mut model, Msg::Document(DocumentMsg::DeleteBackward));

    assert!(cmd.is_none());
    assert_eq!(buffer_to_string(&model), "abc");
    assert!(!model.document.is_modified);
}

#[test]
fn test_delete_forward_joins_next_line() {
    let mut model = test_model("ab\ncd", 0, 2);
    update(&mut model, Msg::Document(DocumentMsg::DeleteForward));

    assert_eq!(buffer_to_string(&model), "abcd");
    assert_eq!(model.editor.cursor.column, 2);
}

#[test]
fn test_delete_forward_at_end_is_noop() {
    let mut model = test_model("ab", 0, 2);
    assert!(update(&mut model, Msg::Document(DocumentMsg::DeleteForward)).is_none());
}

// ========================================================================
// Highlighting follows edits
// ========================================================================

#[test]
fn test_typing_rehighlights_edited_line() {
    let mut model = test_model("de\nx = 1", 0, 2);
    assert!(model.document.line_highlights(0).is_empty());

    update(&mut model, Msg::Document(DocumentMsg::InsertChar('f')));

    let spans = model.document.line_highlights(0);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].category, HighlightCategory::Keyword);
    assert_eq!((spans[0].start_col, spans[0].end_col), (0, 3));
}

#[test]
fn test_newline_highlights_both_halves() {
    let mut model = test_model("print(1) # note", 0, 8);
    update(&mut model, Msg::Document(DocumentMsg::InsertNewline));

    assert_eq!(
        model.document.line_highlights(0)[0].category,
        HighlightCategory::CallIdentifier
    );
    let second = model.document.line_highlights(1);
    assert!(second
        .iter()
        .any(|span| span.category == HighlightCategory::Comment));
}

// ========================================================================
// Movement
// ========================================================================

#[test]
fn test_vertical_movement_keeps_desired_column() {
    let mut model = test_model("long line\nab\nanother line", 0, 7);

    update(&mut model, Msg::move_cursor(Direction::Down));
    assert_eq!((model.editor.cursor.line, model.editor.cursor.column), (1, 2));

    update(&mut model, Msg::move_cursor(Direction::Down));
    assert_eq!((model.editor.cursor.line, model.editor.cursor.column), (2, 7));
}

#[test]
fn test_left_right_wrap_across_lines() {
    let mut model = test_model("ab\ncd", 1, 0);

    update(&mut model, Msg::move_cursor(Direction::Left));
    assert_eq!((model.editor.cursor.line, model.editor.cursor.column), (0, 2));

    update(&mut model, Msg::move_cursor(Direction::Right));
    assert_eq!((model.editor.cursor.line, model.editor.cursor.column), (1, 0));
}

#[test]
fn test_home_end_and_document_bounds() {
    let mut model = test_model("first\nsecond line", 1, 3);

    update(&mut model, Msg::Editor(EditorMsg::MoveCursorLineEnd));
    assert_eq!(model.editor.cursor.column, 11);
    update(&mut model, Msg::Editor(EditorMsg::MoveCursorLineStart));
    assert_eq!(model.editor.cursor.column, 0);
    update(&mut model, Msg::Editor(EditorMsg::MoveCursorDocumentStart));
    assert_eq!((model.editor.cursor.line, model.editor.cursor.column), (0, 0));
    update(&mut model, Msg::Editor(EditorMsg::MoveCursorDocumentEnd));
    assert_eq!((model.editor.cursor.line, model.editor.cursor.column), (1, 11));
}

#[test]
fn test_click_position_is_clamped() {
    let mut model = test_model("abc\nde", 0, 0);
    update(
        &mut model,
        Msg::Editor(EditorMsg::SetCursorPosition {
            line: 9,
            column: 40,
        }),
    );
    assert_eq!((model.editor.cursor.line, model.editor.cursor.column), (1, 2));
}

#[test]
fn test_page_down_scrolls_and_moves() {
    let text = (0..200).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
    let mut model = test_model(&text, 0, 0);
    let jump = model.editor.page_jump();

    update(&mut model, Msg::Editor(EditorMsg::PageDown));

    assert_eq!(model.editor.cursor.line, jump);
    assert!(model.editor.viewport.top_line > 0);
    let viewport = &model.editor.viewport;
    assert!(model.editor.cursor.line >= viewport.top_line);
    assert!(model.editor.cursor.line < viewport.top_line + viewport.visible_lines);
}

#[test]
fn test_scroll_leaves_cursor_in_place() {
    let text = "x\n".repeat(100);
    let mut model = test_model(&text, 0, 0);

    update(&mut model, Msg::Editor(EditorMsg::Scroll(5)));

    assert_eq!(model.editor.viewport.top_line, 5);
    assert_eq!(model.editor.cursor.line, 0);
}
