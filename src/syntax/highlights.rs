//! Syntax highlighting data structures
//!
//! Defines highlight categories, line spans, and the per-document line cache.

use ropey::Rope;

use super::languages::LanguageTag;
use super::rules::RuleSet;

/// Category assigned to a highlighted span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightCategory {
    Keyword,
    CallIdentifier,
    Comment,
    StringLiteral,
    Number,
}

impl HighlightCategory {
    /// Application order: later categories paint over earlier ones
    pub const PRIORITY: [HighlightCategory; 5] = [
        HighlightCategory::Keyword,
        HighlightCategory::CallIdentifier,
        HighlightCategory::Comment,
        HighlightCategory::StringLiteral,
        HighlightCategory::Number,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HighlightCategory::Keyword => "keyword",
            HighlightCategory::CallIdentifier => "function",
            HighlightCategory::Comment => "comment",
            HighlightCategory::StringLiteral => "string",
            HighlightCategory::Number => "number",
        }
    }
}

/// A single highlighted span within a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    /// Start column (0-indexed, inclusive, in chars)
    pub start_col: usize,
    /// End column (exclusive)
    pub end_col: usize,
    pub category: HighlightCategory,
}

/// Highlight information for a single line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineHighlights {
    /// Spans sorted by start_col, never overlapping
    pub spans: Vec<HighlightSpan>,
}

impl LineHighlights {
    /// Get the category for a given column, if any
    pub fn category_at(&self, col: usize) -> Option<HighlightCategory> {
        for span in &self.spans {
            if col >= span.start_col && col < span.end_col {
                return Some(span.category);
            }
            if span.start_col > col {
                break;
            }
        }
        None
    }
}

/// Per-line highlight cache for a document
///
/// Always holds exactly one entry per buffer line once synced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentHighlights {
    lines: Vec<LineHighlights>,
}

/// Line text without its trailing line break
fn line_text(buffer: &Rope, line_idx: usize) -> String {
    let mut text = buffer.line(line_idx).to_string();
    while text.ends_with('\n') || text.ends_with('\r') {
        text.pop();
    }
    text
}

impl DocumentHighlights {
    /// Highlight every line of the buffer from scratch
    pub fn rebuild(buffer: &Rope, language: LanguageTag) -> Self {
        let rules = RuleSet::for_language(language);
        let lines = (0..buffer.len_lines())
            .map(|idx| LineHighlights {
                spans: rules.highlight(&line_text(buffer, idx)),
            })
            .collect();
        Self { lines }
    }

    /// Re-scan a single line
    pub fn refresh_line(&mut self, buffer: &Rope, language: LanguageTag, line_idx: usize) {
        if line_idx >= buffer.len_lines() {
            return;
        }
        if self.lines.len() <= line_idx {
            self.lines.resize(line_idx + 1, LineHighlights::default());
        }
        self.lines[line_idx] = LineHighlights {
            spans: RuleSet::for_language(language).highlight(&line_text(buffer, line_idx)),
        };
    }

    /// Bring the cache in line with an edit that started on `edit_line`.
    ///
    /// Lines inserted by the edit are added after `edit_line`, removed lines
    /// are dropped from there, and then only the touched lines are re-scanned.
    pub fn sync_edit(&mut self, buffer: &Rope, language: LanguageTag, edit_line: usize) {
        let new_count = buffer.len_lines();
        let old_count = self.lines.len();
        let at = (edit_line + 1).min(self.lines.len());

        if new_count > old_count {
            let added = new_count - old_count;
            self.lines
                .splice(at..at, std::iter::repeat(LineHighlights::default()).take(added));
        } else if new_count < old_count {
            let removed = old_count - new_count;
            let end = (at + removed).min(self.lines.len());
            self.lines.drain(at..end);
            self.lines.truncate(new_count);
        }

        let touched = new_count.saturating_sub(old_count);
        for line_idx in edit_line..=edit_line + touched {
            self.refresh_line(buffer, language, line_idx);
        }
    }

    /// Spans for a line, or an empty slice if none
    pub fn line(&self, line_idx: usize) -> &[HighlightSpan] {
        self.lines
            .get(line_idx)
            .map(|lh| lh.spans.as_slice())
            .unwrap_or(&[])
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_at() {
        let lh = LineHighlights {
            spans: vec![
                HighlightSpan {
                    start_col: 0,
                    end_col: 3,
                    category: HighlightCategory::Keyword,
                },
                HighlightSpan {
                    start_col: 5,
                    end_col: 7,
                    category: HighlightCategory::Number,
                },
            ],
        };
        assert_eq!(lh.category_at(0), Some(HighlightCategory::Keyword));
        assert_eq!(lh.category_at(3), None);
        assert_eq!(lh.category_at(6), Some(HighlightCategory::Number));
        assert_eq!(lh.category_at(7), None);
    }

    #[test]
    fn test_rebuild_has_one_entry_per_line() {
        let rope = Rope::from("def f():\n    return 1\n");
        let hl = DocumentHighlights::rebuild(&rope, LanguageTag::Python);
        assert_eq!(hl.line_count(), rope.len_lines());
        assert_eq!(hl.line(0)[0].category, HighlightCategory::Keyword);
        assert!(hl.line(2).is_empty());
    }

    #[test]
    fn test_sync_edit_after_split_and_join() {
        let mut rope = Rope::from("x = 1 # note");
        let mut hl = DocumentHighlights::rebuild(&rope, LanguageTag::Python);

        // Split the line before the comment
        rope.insert_char(6, '\n');
        hl.sync_edit(&rope, LanguageTag::Python, 0);
        assert_eq!(hl.line_count(), 2);
        assert_eq!(hl.line(1)[0].category, HighlightCategory::Comment);
        assert_eq!(hl.line(1)[0].start_col, 0);

        // Join it back
        rope.remove(6..7);
        hl.sync_edit(&rope, LanguageTag::Python, 0);
        assert_eq!(hl, DocumentHighlights::rebuild(&rope, LanguageTag::Python));
    }
}
