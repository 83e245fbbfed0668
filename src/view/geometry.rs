//! Geometry helpers shared by rendering and mouse hit testing
//!
//! All functions here are pure and can be tested without a window.

use crate::model::{text_start_x, AppModel, Layout, ModalId, Rect, ToolbarItem};
use crate::syntax::LanguageTag;
use crate::theme::ThemeId;

/// Tab stop width used when drawing text
pub const TAB_WIDTH: usize = 4;

/// Convert a character column to a visual (screen) column, expanding tabs
pub fn char_col_to_visual_col(text: &str, char_col: usize) -> usize {
    let mut visual_col = 0;
    for ch in text.chars().take(char_col) {
        if ch == '\t' {
            visual_col += TAB_WIDTH - (visual_col % TAB_WIDTH);
        } else {
            visual_col += 1;
        }
    }
    visual_col
}

/// Convert a visual column back to a character column
///
/// Columns inside a tab snap to the tab itself; columns past the end of the
/// text return the text length.
pub fn visual_col_to_char_col(text: &str, visual_col: usize) -> usize {
    let mut current_visual = 0;
    let mut char_col = 0;

    for ch in text.chars() {
        if current_visual >= visual_col {
            return char_col;
        }
        if ch == '\t' {
            current_visual += TAB_WIDTH - (current_visual % TAB_WIDTH);
        } else {
            current_visual += 1;
        }
        char_col += 1;
    }

    char_col
}

/// The part of a line visible after horizontal scrolling
pub fn visible_slice(text: &str, left_column: usize) -> &str {
    match text.char_indices().nth(left_column) {
        Some((byte, _)) => &text[byte..],
        None => "",
    }
}

/// Convert window pixel coordinates inside the editor pane to a cursor
/// position, clamped to the document
pub fn pixel_to_cursor(x: f64, y: f64, layout: &Layout, model: &AppModel) -> (usize, usize) {
    let editor = &layout.editor;
    let viewport = &model.editor.viewport;
    let document = &model.document;

    let local_y = (y - editor.y as f64).max(0.0);
    let visual_line = (local_y / layout.line_height as f64).floor() as usize;
    let line = (viewport.top_line + visual_line).min(document.line_count().saturating_sub(1));

    let x_offset = x - editor.x as f64 - text_start_x(layout.char_width) as f64;
    let visual_column = if x_offset > 0.0 {
        (x_offset / layout.char_width as f64).round() as usize
    } else {
        0
    };

    let line_text = document.line_text(line).unwrap_or_default();
    let shown = visible_slice(&line_text, viewport.left_column);
    let column = viewport.left_column + visual_col_to_char_col(shown, visual_column);

    (line, column.min(document.line_length(line)))
}

/// Entry labels of an open dropdown, in display order
pub fn menu_labels(modal: ModalId) -> Vec<&'static str> {
    match modal {
        ModalId::ThemeMenu => ThemeId::ALL.iter().map(|t| t.label()).collect(),
        ModalId::LanguageMenu => LanguageTag::SELECTABLE
            .iter()
            .map(|l| l.display_name())
            .collect(),
        _ => Vec::new(),
    }
}

/// Entry rects of an open dropdown, hanging below its menu bar entry or
/// toolbar button
pub fn menu_entry_rects(layout: &Layout, modal: ModalId) -> Vec<Rect> {
    let anchor = match modal {
        ModalId::ThemeMenu => layout.themes_menu,
        ModalId::LanguageMenu => layout.toolbar_item(ToolbarItem::LanguageSelector),
        _ => return Vec::new(),
    };
    layout.menu_entries(anchor, &menu_labels(modal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_expansion_columns() {
        assert_eq!(char_col_to_visual_col("a\tb", 0), 0);
        assert_eq!(char_col_to_visual_col("a\tb", 2), 4);
        assert_eq!(char_col_to_visual_col("\t\tx", 2), 8);
        assert_eq!(char_col_to_visual_col("abc", 10), 3);
    }

    #[test]
    fn test_visual_to_char_col() {
        assert_eq!(visual_col_to_char_col("a\tb", 4), 2);
        assert_eq!(visual_col_to_char_col("a\tb", 2), 2);
        assert_eq!(visual_col_to_char_col("hello", 3), 3);
        assert_eq!(visual_col_to_char_col("hi", 40), 2);
    }

    #[test]
    fn test_menu_rects_match_labels() {
        let layout = Layout::compute((800, 600), 20, 10.0, LanguageTag::Python);
        let themes = menu_entry_rects(&layout, ModalId::ThemeMenu);
        assert_eq!(themes.len(), 6);
        assert_eq!(themes[0].y, layout.themes_menu.bottom());

        let languages = menu_entry_rects(&layout, ModalId::LanguageMenu);
        assert_eq!(languages.len(), 2);
        assert!(menu_entry_rects(&layout, ModalId::Info).is_empty());
    }

    #[test]
    fn test_visible_slice_is_char_based() {
        assert_eq!(visible_slice("héllo", 2), "llo");
        assert_eq!(visible_slice("abc", 0), "abc");
        assert_eq!(visible_slice("abc", 5), "");
    }
}
