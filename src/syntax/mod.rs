//! Syntax highlighting module
//!
//! Flat, per-line regex highlighting:
//! - Language tags and file-extension detection
//! - Ordered rule sets (keyword, call identifier, comment, string, number)
//! - A per-line highlight cache owned by the document
//!
//! ## Architecture
//!
//! ```text
//! Document Edit → DocumentHighlights::sync_edit (re-scan edited lines)
//! Language Change → DocumentHighlights::rebuild (re-scan every line)
//! Render → DocumentHighlights::line(n) → per-character category colors
//! ```
//!
//! There is no cross-line state: a string literal or comment spanning
//! several lines is not recognized.

mod highlights;
mod languages;
mod rules;

pub use highlights::{DocumentHighlights, HighlightCategory, HighlightSpan, LineHighlights};
pub use languages::LanguageTag;
pub use rules::{highlight_line, HighlightRule, RuleSet};
