//! Document model - the text buffer, its language and highlight cache

use std::borrow::Cow;
use std::ops::Range;
use std::path::{Path, PathBuf};

use ropey::Rope;

use crate::syntax::{DocumentHighlights, HighlightSpan, LanguageTag};

/// The text buffer plus everything derived from it
#[derive(Debug, Clone)]
pub struct Document {
    /// The text buffer
    pub buffer: Rope,
    /// Path of the last load or save (None for a new buffer)
    pub file_path: Option<PathBuf>,
    /// Whether the buffer has unsaved changes
    pub is_modified: bool,
    /// Selects the highlight rules and the Run branch
    pub language: LanguageTag,
    /// Bumped on every text change
    revision: u64,
    /// One entry per buffer line
    highlights: DocumentHighlights,
}

impl Document {
    /// Create an empty document
    pub fn new(language: LanguageTag) -> Self {
        Self::with_text("", language)
    }

    /// Create a document with initial text
    pub fn with_text(text: &str, language: LanguageTag) -> Self {
        let buffer = Rope::from(text);
        let highlights = DocumentHighlights::rebuild(&buffer, language);
        Self {
            buffer,
            file_path: None,
            is_modified: false,
            language,
            revision: 0,
            highlights,
        }
    }

    /// Load a document from a file path
    pub fn from_file(path: &Path, language: LanguageTag) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        let mut doc = Self::with_text(&content, language);
        doc.file_path = Some(path.to_path_buf());
        Ok(doc)
    }

    /// File name for the title bar, or "Untitled"
    pub fn display_name(&self) -> String {
        self.file_path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string())
    }

    /// The whole buffer as a string
    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn line_count(&self) -> usize {
        self.buffer.len_lines()
    }

    /// Line content without its trailing line break
    pub fn line_text(&self, line_idx: usize) -> Option<Cow<'_, str>> {
        if line_idx >= self.buffer.len_lines() {
            return None;
        }
        let line = self.buffer.line(line_idx);
        let trimmed = line.slice(..self.line_length(line_idx));
        Some(match trimmed.as_str() {
            Some(s) => Cow::Borrowed(s),
            None => Cow::Owned(trimmed.to_string()),
        })
    }

    /// Length of a line in characters, excluding the line break
    pub fn line_length(&self, line_idx: usize) -> usize {
        if line_idx >= self.buffer.len_lines() {
            return 0;
        }
        let line = self.buffer.line(line_idx);
        let len = line.len_chars();
        let mut trim = 0;
        if len > 0 && line.char(len - 1) == '\n' {
            trim = 1;
            if len > 1 && line.char(len - 2) == '\r' {
                trim = 2;
            }
        }
        len - trim
    }

    /// Convert a (line, column) position to a buffer offset
    pub fn cursor_to_offset(&self, line: usize, column: usize) -> usize {
        if line >= self.buffer.len_lines() {
            return self.buffer.len_chars();
        }
        self.buffer.line_to_char(line) + column.min(self.line_length(line))
    }

    /// Convert a buffer offset to a (line, column) position
    pub fn offset_to_cursor(&self, offset: usize) -> (usize, usize) {
        let clamped = offset.min(self.buffer.len_chars());
        let line = self.buffer.char_to_line(clamped);
        (line, clamped - self.buffer.line_to_char(line))
    }

    /// Insert text at a char offset and re-scan the touched lines
    pub fn insert(&mut self, offset: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        let offset = offset.min(self.buffer.len_chars());
        let edit_line = self.buffer.char_to_line(offset);
        self.buffer.insert(offset, text);
        self.after_edit(edit_line);
    }

    /// Remove a char range and re-scan the touched line
    pub fn remove(&mut self, range: Range<usize>) {
        let end = range.end.min(self.buffer.len_chars());
        let start = range.start.min(end);
        if start == end {
            return;
        }
        let edit_line = self.buffer.char_to_line(start);
        self.buffer.remove(start..end);
        self.after_edit(edit_line);
    }

    /// Replace the whole buffer
    pub fn set_text(&mut self, text: &str) {
        self.buffer = Rope::from(text);
        self.highlights = DocumentHighlights::rebuild(&self.buffer, self.language);
        self.is_modified = true;
        self.revision += 1;
    }

    /// Changes whenever the text does; compare two reads to detect edits
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn after_edit(&mut self, edit_line: usize) {
        self.is_modified = true;
        self.revision += 1;
        self.highlights
            .sync_edit(&self.buffer, self.language, edit_line);
    }

    /// Switch language and re-highlight every line
    pub fn set_language(&mut self, language: LanguageTag) {
        self.language = language;
        self.highlights = DocumentHighlights::rebuild(&self.buffer, language);
    }

    /// Highlight spans of a line
    pub fn line_highlights(&self, line_idx: usize) -> &[HighlightSpan] {
        self.highlights.line(line_idx)
    }

    pub fn highlights(&self) -> &DocumentHighlights {
        &self.highlights
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(LanguageTag::Python)
    }
}
