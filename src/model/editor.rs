//! Editor state - cursor and viewport

use super::document::Document;

/// Cursor position in the document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed, in chars)
    pub column: usize,
    /// Desired column for vertical movement (preserves position when moving through short lines)
    pub desired_column: Option<usize>,
}

impl Cursor {
    pub fn at(line: usize, column: usize) -> Self {
        Self {
            line,
            column,
            desired_column: None,
        }
    }

    /// Reset the desired column (called after horizontal movement)
    pub fn clear_desired_column(&mut self) {
        self.desired_column = None;
    }

    /// Set the desired column (called before vertical movement if not set)
    pub fn remember_column(&mut self) {
        if self.desired_column.is_none() {
            self.desired_column = Some(self.column);
        }
    }
}

/// Viewport state - what portion of the document is visible
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    /// First visible line (0-indexed)
    pub top_line: usize,
    /// First visible column (for horizontal scrolling)
    pub left_column: usize,
    /// Number of lines that fit in the viewport
    pub visible_lines: usize,
    /// Number of columns that fit in the viewport
    pub visible_columns: usize,
}

impl Viewport {
    pub fn new(visible_lines: usize, visible_columns: usize) -> Self {
        Self {
            top_line: 0,
            left_column: 0,
            visible_lines,
            visible_columns,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(25, 80)
    }
}

/// Editor state - the cursor and the visible window onto the document
#[derive(Debug, Clone)]
pub struct EditorState {
    pub cursor: Cursor,
    pub viewport: Viewport,
    /// Lines of padding kept above/below the cursor when scrolling
    pub scroll_padding: usize,
}

impl EditorState {
    pub fn new() -> Self {
        Self::with_viewport(25, 80)
    }

    pub fn with_viewport(visible_lines: usize, visible_columns: usize) -> Self {
        Self {
            cursor: Cursor::default(),
            viewport: Viewport::new(visible_lines, visible_columns),
            scroll_padding: 1,
        }
    }

    /// Update viewport dimensions (e.g., on window resize)
    pub fn resize_viewport(&mut self, visible_lines: usize, visible_columns: usize) {
        self.viewport.visible_lines = visible_lines;
        self.viewport.visible_columns = visible_columns;
    }

    /// Buffer offset of the cursor
    pub fn cursor_offset(&self, document: &Document) -> usize {
        document.cursor_to_offset(self.cursor.line, self.cursor.column)
    }

    /// Move the cursor to a buffer offset
    pub fn set_cursor_from_offset(&mut self, document: &Document, offset: usize) {
        let (line, column) = document.offset_to_cursor(offset);
        self.cursor = Cursor::at(line, column);
    }

    /// Keep the cursor inside the document after an external change
    pub fn clamp_cursor(&mut self, document: &Document) {
        let last_line = document.line_count().saturating_sub(1);
        self.cursor.line = self.cursor.line.min(last_line);
        self.cursor.column = self.cursor.column.min(document.line_length(self.cursor.line));
    }

    /// Scroll the viewport just enough to keep the cursor in the padded safe zone
    pub fn ensure_cursor_visible(&mut self, document: &Document) {
        let padding = self.scroll_padding;
        let total_lines = document.line_count();
        let visible = self.viewport.visible_lines;
        let line = self.cursor.line;

        if total_lines > visible && visible > 0 {
            let max_top = total_lines.saturating_sub(visible);
            let safe_top = self.viewport.top_line + padding;
            let safe_bottom = self.viewport.top_line
                + visible.saturating_sub(padding).saturating_sub(1);

            if line < safe_top {
                self.viewport.top_line = line.saturating_sub(padding);
            } else if line > safe_bottom {
                self.viewport.top_line = (line + padding + 1).saturating_sub(visible);
            }
            self.viewport.top_line = self.viewport.top_line.min(max_top);
        } else {
            self.viewport.top_line = 0;
        }

        const HORIZONTAL_MARGIN: usize = 4;
        let column = self.cursor.column;
        let left_safe = self.viewport.left_column.saturating_add(HORIZONTAL_MARGIN);
        let right_safe = self
            .viewport
            .left_column
            .saturating_add(self.viewport.visible_columns)
            .saturating_sub(HORIZONTAL_MARGIN);

        if column < left_safe {
            self.viewport.left_column = column.saturating_sub(HORIZONTAL_MARGIN);
        } else if column >= right_safe {
            self.viewport.left_column = column
                .saturating_add(HORIZONTAL_MARGIN)
                .saturating_add(1)
                .saturating_sub(self.viewport.visible_columns);
        }
    }

    /// Move up or down by `delta` lines, keeping the desired column
    pub fn move_vertical(&mut self, document: &Document, delta: isize) {
        self.cursor.remember_column();
        let last_line = document.line_count().saturating_sub(1) as isize;
        let line = (self.cursor.line as isize + delta).clamp(0, last_line) as usize;
        let desired = self.cursor.desired_column.unwrap_or(self.cursor.column);
        self.cursor.line = line;
        self.cursor.column = desired.min(document.line_length(line));
    }

    /// Move one character left, wrapping to the end of the previous line
    pub fn move_left(&mut self, document: &Document) {
        if self.cursor.column > 0 {
            self.cursor.column -= 1;
        } else if self.cursor.line > 0 {
            self.cursor.line -= 1;
            self.cursor.column = document.line_length(self.cursor.line);
        }
        self.cursor.clear_desired_column();
    }

    /// Move one character right, wrapping to the start of the next line
    pub fn move_right(&mut self, document: &Document) {
        if self.cursor.column < document.line_length(self.cursor.line) {
            self.cursor.column += 1;
        } else if self.cursor.line + 1 < document.line_count() {
            self.cursor.line += 1;
            self.cursor.column = 0;
        }
        self.cursor.clear_desired_column();
    }

    pub fn move_line_start(&mut self) {
        self.cursor.column = 0;
        self.cursor.clear_desired_column();
    }

    pub fn move_line_end(&mut self, document: &Document) {
        self.cursor.column = document.line_length(self.cursor.line);
        self.cursor.clear_desired_column();
    }

    pub fn move_document_start(&mut self) {
        self.cursor = Cursor::default();
    }

    pub fn move_document_end(&mut self, document: &Document) {
        let last_line = document.line_count().saturating_sub(1);
        self.cursor = Cursor::at(last_line, document.line_length(last_line));
    }

    /// Lines moved by PageUp/PageDown
    pub fn page_jump(&self) -> usize {
        self.viewport.visible_lines.saturating_sub(2).max(1)
    }

    /// Scroll by whole lines without moving the cursor
    pub fn scroll_lines(&mut self, delta: isize, document: &Document) {
        let max_top = document
            .line_count()
            .saturating_sub(self.viewport.visible_lines.max(1));
        let top = self.viewport.top_line as isize + delta;
        self.viewport.top_line = (top.max(0) as usize).min(max_top);
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new()
    }
}
