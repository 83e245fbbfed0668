//! Script error types
//!
//! A [`ScriptError`] is both the value of a raised exception inside the
//! interpreter and the final outcome reported to the output log. Its
//! `Display` is the text Python's `str(exception)` would produce, except for
//! syntax errors which carry their line.

use std::fmt;

/// Exception class of a script error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SyntaxError,
    IndentationError,
    Exception,
    ArithmeticError,
    ZeroDivisionError,
    OverflowError,
    LookupError,
    IndexError,
    KeyError,
    NameError,
    UnboundLocalError,
    TypeError,
    ValueError,
    AttributeError,
    AssertionError,
    RuntimeError,
    RecursionError,
    ImportError,
    ModuleNotFoundError,
    /// Raised when the run is cancelled; never caught by `except`
    Interrupted,
}

impl ErrorKind {
    /// Kinds a script can name in `raise` or `except`
    pub const NAMED: &'static [ErrorKind] = &[
        ErrorKind::Exception,
        ErrorKind::ArithmeticError,
        ErrorKind::ZeroDivisionError,
        ErrorKind::OverflowError,
        ErrorKind::LookupError,
        ErrorKind::IndexError,
        ErrorKind::KeyError,
        ErrorKind::NameError,
        ErrorKind::UnboundLocalError,
        ErrorKind::TypeError,
        ErrorKind::ValueError,
        ErrorKind::AttributeError,
        ErrorKind::AssertionError,
        ErrorKind::RuntimeError,
        ErrorKind::RecursionError,
        ErrorKind::ImportError,
        ErrorKind::ModuleNotFoundError,
        ErrorKind::SyntaxError,
        ErrorKind::IndentationError,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::IndentationError => "IndentationError",
            ErrorKind::Exception => "Exception",
            ErrorKind::ArithmeticError => "ArithmeticError",
            ErrorKind::ZeroDivisionError => "ZeroDivisionError",
            ErrorKind::OverflowError => "OverflowError",
            ErrorKind::LookupError => "LookupError",
            ErrorKind::IndexError => "IndexError",
            ErrorKind::KeyError => "KeyError",
            ErrorKind::NameError => "NameError",
            ErrorKind::UnboundLocalError => "UnboundLocalError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ValueError => "ValueError",
            ErrorKind::AttributeError => "AttributeError",
            ErrorKind::AssertionError => "AssertionError",
            ErrorKind::RuntimeError => "RuntimeError",
            ErrorKind::RecursionError => "RecursionError",
            ErrorKind::ImportError => "ImportError",
            ErrorKind::ModuleNotFoundError => "ModuleNotFoundError",
            ErrorKind::Interrupted => "KeyboardInterrupt",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        ErrorKind::NAMED.iter().copied().find(|k| k.name() == name)
    }

    /// Direct base class, `None` for `Exception` itself
    pub fn parent(self) -> Option<ErrorKind> {
        match self {
            ErrorKind::Exception | ErrorKind::Interrupted => None,
            ErrorKind::ZeroDivisionError | ErrorKind::OverflowError => {
                Some(ErrorKind::ArithmeticError)
            }
            ErrorKind::IndexError | ErrorKind::KeyError => Some(ErrorKind::LookupError),
            ErrorKind::UnboundLocalError => Some(ErrorKind::NameError),
            ErrorKind::RecursionError => Some(ErrorKind::RuntimeError),
            ErrorKind::ModuleNotFoundError => Some(ErrorKind::ImportError),
            ErrorKind::IndentationError => Some(ErrorKind::SyntaxError),
            _ => Some(ErrorKind::Exception),
        }
    }

    /// Whether an `except <ancestor>` clause catches this kind
    pub fn is_subclass_of(self, ancestor: ErrorKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    pub fn is_syntax(self) -> bool {
        self.is_subclass_of(ErrorKind::SyntaxError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An error raised while lexing, parsing or running a script
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptError {
    pub kind: ErrorKind,
    pub message: String,
    /// 1-based source line, when known
    pub line: Option<usize>,
}

impl ScriptError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
        }
    }

    pub fn syntax(message: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::SyntaxError, message).at(line)
    }

    pub fn indentation(message: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::IndentationError, message).at(line)
    }

    pub fn interrupted() -> Self {
        Self::new(ErrorKind::Interrupted, "execution interrupted")
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValueError, message)
    }

    pub fn name_error(name: &str) -> Self {
        Self::new(ErrorKind::NameError, format!("name '{}' is not defined", name))
    }

    pub fn zero_division(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ZeroDivisionError, message)
    }

    pub fn overflow() -> Self {
        Self::new(ErrorKind::OverflowError, "integer overflow")
    }

    /// Attach a line number unless one is already known
    pub fn at(mut self, line: usize) -> Self {
        if self.line.is_none() {
            self.line = Some(line);
        }
        self
    }

    pub fn is_interrupt(&self) -> bool {
        self.kind == ErrorKind::Interrupted
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind.is_syntax(), self.line) {
            (true, Some(line)) => write!(f, "{} (line {})", self.message, line),
            _ => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ScriptError {}

pub type ScriptResult<T> = Result<T, ScriptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchy() {
        assert!(ErrorKind::ZeroDivisionError.is_subclass_of(ErrorKind::ArithmeticError));
        assert!(ErrorKind::KeyError.is_subclass_of(ErrorKind::Exception));
        assert!(!ErrorKind::KeyError.is_subclass_of(ErrorKind::IndexError));
        assert!(!ErrorKind::Interrupted.is_subclass_of(ErrorKind::Exception));
    }

    #[test]
    fn test_display_adds_line_only_for_syntax_errors() {
        assert_eq!(
            ScriptError::syntax("invalid syntax", 3).to_string(),
            "invalid syntax (line 3)"
        );
        assert_eq!(
            ScriptError::zero_division("division by zero").at(7).to_string(),
            "division by zero"
        );
    }

    #[test]
    fn test_interrupted_is_not_nameable() {
        assert_eq!(ErrorKind::from_name("KeyboardInterrupt"), None);
        assert_eq!(ErrorKind::from_name("ValueError"), Some(ErrorKind::ValueError));
    }
}
