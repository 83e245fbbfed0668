//! Output log - append-only text shown in the read-only pane under the editor

/// Append-only log of script output, notices and errors
///
/// Never cleared automatically. Scrolling follows new output until the user
/// scrolls away from the bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLog {
    text: String,
    /// Byte offset where each line begins; never empty
    line_starts: Vec<usize>,
    /// First visible line
    pub scroll_offset: usize,
    /// Lines that fit in the pane (set by layout)
    pub visible_lines: usize,
    /// Whether new output keeps the view pinned to the bottom
    follow: bool,
}

/// Prefix used when a run fails
pub const ERROR_PREFIX: &str = "Error executing code: ";

impl Default for OutputLog {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputLog {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            line_starts: vec![0],
            scroll_offset: 0,
            visible_lines: 0,
            follow: true,
        }
    }

    /// Append raw text exactly as produced
    pub fn write(&mut self, text: &str) {
        self.push_text(text);
        self.after_append();
    }

    /// Index new line breaks as the text grows, so appends stay cheap
    /// however long the log gets
    fn push_text(&mut self, text: &str) {
        let base = self.text.len();
        self.line_starts
            .extend(text.match_indices('\n').map(|(i, _)| base + i + 1));
        self.text.push_str(text);
    }

    /// Append text as its own paragraph: a newline separates it from
    /// earlier content when the log is not empty
    pub fn append_line(&mut self, text: &str) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.push_text("\n");
        }
        self.push_text(text);
        self.after_append();
    }

    /// Append a failed run's error message
    pub fn append_error(&mut self, message: &str) {
        self.append_line(&format!("{}{}", ERROR_PREFIX, message));
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Line `index` without its newline; empty past the end
    pub fn line(&self, index: usize) -> &str {
        let Some(&start) = self.line_starts.get(index) else {
            return "";
        };
        let end = self
            .line_starts
            .get(index + 1)
            .map_or(self.text.len(), |next| next - 1);
        &self.text[start..end]
    }

    /// Lines from `first` to the end of the log
    pub fn lines_from(&self, first: usize) -> impl Iterator<Item = &str> {
        (first..self.line_count()).map(move |index| self.line(index))
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines_from(0)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    fn max_scroll(&self) -> usize {
        self.line_count().saturating_sub(self.visible_lines.max(1))
    }

    fn after_append(&mut self) {
        if self.follow {
            self.scroll_offset = self.max_scroll();
        }
    }

    /// Scroll by whole lines; scrolling back to the bottom resumes following
    pub fn scroll_lines(&mut self, delta: isize) {
        let max = self.max_scroll();
        let target = (self.scroll_offset as isize + delta).max(0) as usize;
        self.scroll_offset = target.min(max);
        self.follow = self.scroll_offset >= max;
    }

    /// Update the pane height and keep the bottom pinned when following
    pub fn set_visible_lines(&mut self, visible_lines: usize) {
        self.visible_lines = visible_lines;
        if self.follow {
            self.scroll_offset = self.max_scroll();
        } else {
            self.scroll_offset = self.scroll_offset.min(self.max_scroll());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_is_verbatim() {
        let mut log = OutputLog::new();
        log.write("a");
        log.write("b\n");
        assert_eq!(log.text(), "ab\n");
    }

    #[test]
    fn test_append_line_separates_paragraphs() {
        let mut log = OutputLog::new();
        log.append_line("first");
        log.append_line("second");
        assert_eq!(log.text(), "first\nsecond");

        let mut log = OutputLog::new();
        log.write("out\n");
        log.append_error("boom");
        assert_eq!(log.text(), "out\nError executing code: boom");
    }

    #[test]
    fn test_line_index_tracks_split_writes() {
        let mut log = OutputLog::new();
        assert_eq!(log.line_count(), 1);
        log.write("al");
        log.write("pha\nbe");
        log.append_line("gamma\n");
        log.write("\u{e9}\n");

        let expected: Vec<&str> = log.text().split('\n').collect();
        assert_eq!(log.lines().collect::<Vec<_>>(), expected);
        assert_eq!(log.line_count(), 5);
        assert_eq!(log.line(1), "be");
        assert_eq!(log.lines_from(2).collect::<Vec<_>>(), vec!["gamma", "\u{e9}", ""]);
        assert_eq!(log.line(99), "");
    }

    #[test]
    fn test_many_small_writes_keep_following() {
        let mut log = OutputLog::new();
        log.set_visible_lines(10);
        for i in 0..50_000 {
            log.write(&format!("{}\n", i));
        }
        assert_eq!(log.line_count(), 50_001);
        assert_eq!(log.scroll_offset, 50_001 - 10);
        assert_eq!(log.lines_from(log.scroll_offset).next(), Some("49991"));
    }

    #[test]
    fn test_follow_until_user_scrolls_up() {
        let mut log = OutputLog::new();
        log.set_visible_lines(2);
        for i in 0..5 {
            log.write(&format!("{}\n", i));
        }
        assert_eq!(log.scroll_offset, 4);

        log.scroll_lines(-2);
        assert_eq!(log.scroll_offset, 2);
        log.write("5\n");
        assert_eq!(log.scroll_offset, 2);

        log.scroll_lines(10);
        log.write("6\n");
        assert_eq!(log.scroll_offset, log.line_count() - 2);
    }
}
