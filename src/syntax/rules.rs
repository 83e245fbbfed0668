//! Regex rule sets and the line highlighter
//!
//! Each rule set is an ordered list of `(pattern, category)` pairs. Rules are
//! applied in [`HighlightCategory::PRIORITY`] order and later rules repaint the
//! columns of earlier ones, so the text `"if"` ends up a string, not a keyword.

use std::sync::OnceLock;

use regex::Regex;

use super::highlights::{HighlightCategory, HighlightSpan};
use super::languages::LanguageTag;

const PYTHON_KEYWORDS: &str =
    r"\b(?:def|class|if|else|elif|for|while|return|import|from|try|except|finally)\b";
const CPP_KEYWORDS: &str = r"\b(?:int|float|double|char|if|else|while|for|return|class|public|private|protected|void|new|delete)\b";
const CSHARP_KEYWORDS: &str = r"\b(?:int|float|double|string|bool|if|else|while|for|return|class|public|private|protected|void|new)\b";

/// Identifier (plus trailing whitespace) directly followed by `(`.
/// Group 1 excludes the parenthesis.
const CALL_IDENTIFIER: &str = r"\b([a-zA-Z_][a-zA-Z0-9_]*\s*)\(";
const HASH_COMMENT: &str = r"#.*";
const SLASH_COMMENT: &str = r"//.*|/\*.*?\*/";
const STRING_LITERAL: &str = r#"".*?"|'.*?'"#;
const NUMBER: &str = r"\b\d+\b";

/// A single highlight rule
#[derive(Debug, Clone)]
pub struct HighlightRule {
    pub category: HighlightCategory,
    pub pattern: Regex,
    /// Capture group whose span gets painted (0 = whole match)
    pub group: usize,
}

impl HighlightRule {
    fn new(category: HighlightCategory, pattern: &str, group: usize) -> Self {
        Self {
            category,
            // Patterns are compile-time constants covered by the unit tests below
            pattern: Regex::new(pattern).expect("built-in highlight pattern must compile"),
            group,
        }
    }
}

/// Ordered rule set for one language
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<HighlightRule>,
}

impl RuleSet {
    /// A rule set that highlights nothing
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    fn c_family(keywords: &str, comment: &str) -> Self {
        Self {
            rules: vec![
                HighlightRule::new(HighlightCategory::Keyword, keywords, 0),
                HighlightRule::new(HighlightCategory::CallIdentifier, CALL_IDENTIFIER, 1),
                HighlightRule::new(HighlightCategory::Comment, comment, 0),
                HighlightRule::new(HighlightCategory::StringLiteral, STRING_LITERAL, 0),
                HighlightRule::new(HighlightCategory::Number, NUMBER, 0),
            ],
        }
    }

    /// Build the rule set for a language tag (uncached)
    pub fn build(tag: LanguageTag) -> Self {
        match tag {
            LanguageTag::Python => Self::c_family(PYTHON_KEYWORDS, HASH_COMMENT),
            LanguageTag::Cpp => Self::c_family(CPP_KEYWORDS, SLASH_COMMENT),
            LanguageTag::CSharp => Self::c_family(CSHARP_KEYWORDS, SLASH_COMMENT),
            LanguageTag::Html => Self::empty(),
        }
    }

    /// Get the shared, lazily compiled rule set for a language tag
    pub fn for_language(tag: LanguageTag) -> &'static RuleSet {
        static PYTHON: OnceLock<RuleSet> = OnceLock::new();
        static HTML: OnceLock<RuleSet> = OnceLock::new();
        static CPP: OnceLock<RuleSet> = OnceLock::new();
        static CSHARP: OnceLock<RuleSet> = OnceLock::new();

        let cell = match tag {
            LanguageTag::Python => &PYTHON,
            LanguageTag::Html => &HTML,
            LanguageTag::Cpp => &CPP,
            LanguageTag::CSharp => &CSHARP,
        };
        cell.get_or_init(|| RuleSet::build(tag))
    }

    pub fn rules(&self) -> &[HighlightRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Highlight one line of text (without its trailing newline)
    ///
    /// Returns sorted, non-overlapping spans in character columns.
    pub fn highlight(&self, line: &str) -> Vec<HighlightSpan> {
        if self.rules.is_empty() || line.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char, for converting regex offsets to columns
        let char_starts: Vec<usize> = line.char_indices().map(|(i, _)| i).collect();
        let to_col = |byte: usize| char_starts.partition_point(|&start| start < byte);

        let mut paint: Vec<Option<HighlightCategory>> = vec![None; char_starts.len()];

        for category in HighlightCategory::PRIORITY {
            for rule in self.rules.iter().filter(|r| r.category == category) {
                for caps in rule.pattern.captures_iter(line) {
                    let Some(m) = caps.get(rule.group) else {
                        continue;
                    };
                    if m.is_empty() {
                        continue;
                    }
                    let (start, end) = (to_col(m.start()), to_col(m.end()));
                    for slot in &mut paint[start..end] {
                        *slot = Some(rule.category);
                    }
                }
            }
        }

        coalesce(&paint)
    }
}

/// Merge runs of equally painted columns into spans
fn coalesce(paint: &[Option<HighlightCategory>]) -> Vec<HighlightSpan> {
    let mut spans: Vec<HighlightSpan> = Vec::new();
    for (col, slot) in paint.iter().enumerate() {
        let Some(category) = *slot else { continue };
        match spans.last_mut() {
            Some(last) if last.end_col == col && last.category == category => last.end_col += 1,
            _ => spans.push(HighlightSpan {
                start_col: col,
                end_col: col + 1,
                category,
            }),
        }
    }
    spans
}

/// Highlight one line with the rule set of `tag`
pub fn highlight_line(line: &str, tag: LanguageTag) -> Vec<HighlightSpan> {
    RuleSet::for_language(tag).highlight(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start_col: usize, end_col: usize, category: HighlightCategory) -> HighlightSpan {
        HighlightSpan {
            start_col,
            end_col,
            category,
        }
    }

    #[test]
    fn test_all_builtin_rule_sets_compile() {
        for &tag in LanguageTag::ALL {
            let _ = RuleSet::build(tag);
        }
    }

    #[test]
    fn test_keyword_and_number() {
        let spans = highlight_line("return 42", LanguageTag::Python);
        assert_eq!(
            spans,
            vec![
                span(0, 6, HighlightCategory::Keyword),
                span(7, 9, HighlightCategory::Number),
            ]
        );
    }

    #[test]
    fn test_call_identifier_excludes_paren() {
        let spans = highlight_line("print (x)", LanguageTag::Python);
        assert_eq!(spans, vec![span(0, 6, HighlightCategory::CallIdentifier)]);
    }

    #[test]
    fn test_string_paints_over_keyword() {
        let spans = highlight_line("\"if\"", LanguageTag::Python);
        assert_eq!(spans, vec![span(0, 4, HighlightCategory::StringLiteral)]);
    }

    #[test]
    fn test_comment_marker_inside_string_is_not_special() {
        // Flat matching: the comment paints from `#`, the string repaints its
        // own columns, the trailing `)` keeps the comment color.
        let spans = highlight_line("print(\"#\")", LanguageTag::Python);
        assert_eq!(
            spans,
            vec![
                span(0, 5, HighlightCategory::CallIdentifier),
                span(6, 9, HighlightCategory::StringLiteral),
                span(9, 10, HighlightCategory::Comment),
            ]
        );
    }

    #[test]
    fn test_digits_inside_identifier_are_not_numbers() {
        assert!(highlight_line("x1 = y2", LanguageTag::Python).is_empty());
    }

    #[test]
    fn test_columns_are_chars_not_bytes() {
        let spans = highlight_line("é = 'ü'", LanguageTag::Python);
        assert_eq!(spans, vec![span(4, 7, HighlightCategory::StringLiteral)]);
    }

    #[test]
    fn test_html_has_no_rules() {
        assert!(RuleSet::for_language(LanguageTag::Html).is_empty());
        assert!(highlight_line("<p>if 1</p>", LanguageTag::Html).is_empty());
    }

    #[test]
    fn test_cpp_block_comment_on_one_line() {
        let spans = highlight_line("int x; /* note */", LanguageTag::Cpp);
        assert_eq!(
            spans,
            vec![
                span(0, 3, HighlightCategory::Keyword),
                span(7, 17, HighlightCategory::Comment),
            ]
        );
    }
}
