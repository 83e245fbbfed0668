//! Language tags and detection

use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Selects the active highlight rule set and the run dispatch branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LanguageTag {
    #[default]
    Python,
    Html,
    /// Legacy tag: still highlighted, no longer offered in the toolbar
    Cpp,
    /// Legacy tag: still highlighted, no longer offered in the toolbar
    CSharp,
}

impl LanguageTag {
    /// Tags offered by the toolbar language selector, in display order
    pub const SELECTABLE: &'static [LanguageTag] = &[LanguageTag::Python, LanguageTag::Html];

    /// Every known tag
    pub const ALL: &'static [LanguageTag] = &[
        LanguageTag::Python,
        LanguageTag::Html,
        LanguageTag::Cpp,
        LanguageTag::CSharp,
    ];

    /// Stable lowercase identifier (used in config and on the command line)
    pub fn id(self) -> &'static str {
        match self {
            LanguageTag::Python => "python",
            LanguageTag::Html => "html",
            LanguageTag::Cpp => "cpp",
            LanguageTag::CSharp => "csharp",
        }
    }

    /// Name shown in the selector dropdown
    pub fn display_name(self) -> &'static str {
        match self {
            LanguageTag::Python => "Python",
            LanguageTag::Html => "HTML",
            LanguageTag::Cpp => "C++",
            LanguageTag::CSharp => "C#",
        }
    }

    /// Text for the toolbar label, e.g. `Language: Python`
    ///
    /// The label capitalizes the identifier, so HTML reads `Html`.
    pub fn label(self) -> String {
        let id = self.id();
        let mut chars = id.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        };
        format!("Language: {}", capitalized)
    }

    /// Parse a tag from its identifier or display name (case-insensitive)
    pub fn from_id(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Some(LanguageTag::Python),
            "html" | "htm" => Some(LanguageTag::Html),
            "cpp" | "c++" => Some(LanguageTag::Cpp),
            "csharp" | "c#" | "cs" => Some(LanguageTag::CSharp),
            _ => None,
        }
    }

    /// Detect the language from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "py" | "pyw" => Some(LanguageTag::Python),
            "html" | "htm" => Some(LanguageTag::Html),
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "h" => Some(LanguageTag::Cpp),
            "cs" => Some(LanguageTag::CSharp),
            _ => None,
        }
    }

    /// Markup languages are previewed in the browser instead of evaluated
    pub fn is_markup(self) -> bool {
        matches!(self, LanguageTag::Html)
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for LanguageTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageTag::from_id(s).ok_or_else(|| {
            let known: Vec<&str> = LanguageTag::ALL.iter().map(|t| t.id()).collect();
            format!("unknown language '{}' (expected one of: {})", s, known.join(", "))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_label_capitalizes_identifier() {
        assert_eq!(LanguageTag::Python.label(), "Language: Python");
        assert_eq!(LanguageTag::Html.label(), "Language: Html");
    }

    #[test]
    fn test_from_id_accepts_aliases() {
        assert_eq!(LanguageTag::from_id("PYTHON"), Some(LanguageTag::Python));
        assert_eq!(LanguageTag::from_id("c#"), Some(LanguageTag::CSharp));
        assert_eq!(LanguageTag::from_id("c++"), Some(LanguageTag::Cpp));
        assert_eq!(LanguageTag::from_id("cobol"), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            LanguageTag::from_path(&PathBuf::from("script.py")),
            Some(LanguageTag::Python)
        );
        assert_eq!(
            LanguageTag::from_path(&PathBuf::from("index.HTML")),
            Some(LanguageTag::Html)
        );
        assert_eq!(LanguageTag::from_path(&PathBuf::from("notes.txt")), None);
        assert_eq!(LanguageTag::from_path(&PathBuf::from("Makefile")), None);
    }

    #[test]
    fn test_from_str_error_lists_known_tags() {
        let err = "rust".parse::<LanguageTag>().unwrap_err();
        assert!(err.contains("python"));
        assert!(err.contains("html"));
    }

    #[test]
    fn test_only_html_is_markup() {
        let markup: Vec<_> = LanguageTag::ALL.iter().filter(|t| t.is_markup()).collect();
        assert_eq!(markup, vec![&LanguageTag::Html]);
    }
}
