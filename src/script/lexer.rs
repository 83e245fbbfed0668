//! Lexer for the script language
//!
//! Produces a flat token stream with explicit `Newline`, `Indent` and
//! `Dedent` tokens, so the parser never looks at whitespace. Newlines inside
//! brackets and after a trailing backslash do not end a logical line.

use std::fmt;

use super::error::{ErrorKind, ScriptError, ScriptResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    False,
    None,
    True,
    And,
    As,
    Assert,
    Break,
    Class,
    Continue,
    Def,
    Del,
    Elif,
    Else,
    Except,
    Finally,
    For,
    From,
    Global,
    If,
    Import,
    In,
    Is,
    Lambda,
    Nonlocal,
    Not,
    Or,
    Pass,
    Raise,
    Return,
    Try,
    While,
    With,
    Yield,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::False => "False",
            Keyword::None => "None",
            Keyword::True => "True",
            Keyword::And => "and",
            Keyword::As => "as",
            Keyword::Assert => "assert",
            Keyword::Break => "break",
            Keyword::Class => "class",
            Keyword::Continue => "continue",
            Keyword::Def => "def",
            Keyword::Del => "del",
            Keyword::Elif => "elif",
            Keyword::Else => "else",
            Keyword::Except => "except",
            Keyword::Finally => "finally",
            Keyword::For => "for",
            Keyword::From => "from",
            Keyword::Global => "global",
            Keyword::If => "if",
            Keyword::Import => "import",
            Keyword::In => "in",
            Keyword::Is => "is",
            Keyword::Lambda => "lambda",
            Keyword::Nonlocal => "nonlocal",
            Keyword::Not => "not",
            Keyword::Or => "or",
            Keyword::Pass => "pass",
            Keyword::Raise => "raise",
            Keyword::Return => "return",
            Keyword::Try => "try",
            Keyword::While => "while",
            Keyword::With => "with",
            Keyword::Yield => "yield",
        }
    }

    fn from_ident(ident: &str) -> Option<Self> {
        Some(match ident {
            "False" => Keyword::False,
            "None" => Keyword::None,
            "True" => Keyword::True,
            "and" => Keyword::And,
            "as" => Keyword::As,
            "assert" => Keyword::Assert,
            "break" => Keyword::Break,
            "class" => Keyword::Class,
            "continue" => Keyword::Continue,
            "def" => Keyword::Def,
            "del" => Keyword::Del,
            "elif" => Keyword::Elif,
            "else" => Keyword::Else,
            "except" => Keyword::Except,
            "finally" => Keyword::Finally,
            "for" => Keyword::For,
            "from" => Keyword::From,
            "global" => Keyword::Global,
            "if" => Keyword::If,
            "import" => Keyword::Import,
            "in" => Keyword::In,
            "is" => Keyword::Is,
            "lambda" => Keyword::Lambda,
            "nonlocal" => Keyword::Nonlocal,
            "not" => Keyword::Not,
            "or" => Keyword::Or,
            "pass" => Keyword::Pass,
            "raise" => Keyword::Raise,
            "return" => Keyword::Return,
            "try" => Keyword::Try,
            "while" => Keyword::While,
            "with" => Keyword::With,
            "yield" => Keyword::Yield,
            _ => return None,
        })
    }
}

/// One piece of an f-string
#[derive(Debug, Clone, PartialEq)]
pub enum FStringPiece {
    Literal(String),
    Field {
        /// Source text of the interpolated expression
        source: String,
        /// `!r` or `!s`
        conversion: Option<char>,
        /// Text after the top-level `:`
        spec: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Int(i64),
    Float(f64),
    Str(String),
    FString(Vec<FStringPiece>),
    Name(String),
    Keyword(Keyword),

    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,

    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    DoubleSlashAssign,
    PercentAssign,
    DoubleStarAssign,

    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Semicolon,

    Newline,
    Indent,
    Dedent,
    Eof,
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tok::Int(n) => write!(f, "{}", n),
            Tok::Float(x) => write!(f, "{}", x),
            Tok::Str(_) | Tok::FString(_) => write!(f, "string literal"),
            Tok::Name(name) => write!(f, "'{}'", name),
            Tok::Keyword(kw) => write!(f, "'{}'", kw.as_str()),
            Tok::Newline => write!(f, "newline"),
            Tok::Indent => write!(f, "indent"),
            Tok::Dedent => write!(f, "dedent"),
            Tok::Eof => write!(f, "end of input"),
            other => write!(f, "'{}'", punct_text(other)),
        }
    }
}

fn punct_text(tok: &Tok) -> &'static str {
    match tok {
        Tok::Plus => "+",
        Tok::Minus => "-",
        Tok::Star => "*",
        Tok::DoubleStar => "**",
        Tok::Slash => "/",
        Tok::DoubleSlash => "//",
        Tok::Percent => "%",
        Tok::Assign => "=",
        Tok::PlusAssign => "+=",
        Tok::MinusAssign => "-=",
        Tok::StarAssign => "*=",
        Tok::SlashAssign => "/=",
        Tok::DoubleSlashAssign => "//=",
        Tok::PercentAssign => "%=",
        Tok::DoubleStarAssign => "**=",
        Tok::EqEq => "==",
        Tok::NotEq => "!=",
        Tok::Lt => "<",
        Tok::Le => "<=",
        Tok::Gt => ">",
        Tok::Ge => ">=",
        Tok::LParen => "(",
        Tok::RParen => ")",
        Tok::LBracket => "[",
        Tok::RBracket => "]",
        Tok::LBrace => "{",
        Tok::RBrace => "}",
        Tok::Comma => ",",
        Tok::Colon => ":",
        Tok::Dot => ".",
        Tok::Semicolon => ";",
        _ => "?",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    /// 1-based line the token starts on
    pub line: usize,
}

/// Tokenize a whole program
pub fn tokenize(source: &str) -> ScriptResult<Vec<Token>> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    tokens: Vec<Token>,
    indents: Vec<usize>,
    /// Open brackets with the line they were opened on
    brackets: Vec<(char, usize)>,
    at_line_start: bool,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            tokens: Vec::new(),
            indents: vec![0],
            brackets: Vec::new(),
            at_line_start: true,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn push(&mut self, tok: Tok, line: usize) {
        self.tokens.push(Token { tok, line });
    }

    fn run(mut self) -> ScriptResult<Vec<Token>> {
        loop {
            if self.at_line_start && self.brackets.is_empty() {
                self.at_line_start = false;
                if !self.handle_indentation()? {
                    continue;
                }
            }

            self.skip_inline_whitespace()?;

            let Some(ch) = self.peek() else { break };
            let line = self.line;

            match ch {
                '#' => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.pos += 1;
                    }
                }
                '\n' => {
                    self.advance();
                    if self.brackets.is_empty() {
                        self.push_newline(line);
                        self.at_line_start = true;
                    }
                }
                '\r' => {
                    self.pos += 1;
                }
                c if c.is_ascii_digit()
                    || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) =>
                {
                    let tok = self.number()?;
                    self.push(tok, line);
                }
                c if c == '"' || c == '\'' || self.string_prefix_len().is_some() => {
                    let tok = self.string()?;
                    self.push(tok, line);
                }
                c if c.is_alphabetic() || c == '_' => {
                    let ident = self.identifier();
                    let tok = match Keyword::from_ident(&ident) {
                        Some(kw) => Tok::Keyword(kw),
                        None => Tok::Name(ident),
                    };
                    self.push(tok, line);
                }
                _ => {
                    let tok = self.operator()?;
                    self.push(tok, line);
                }
            }
        }

        if let Some(&(open, line)) = self.brackets.last() {
            return Err(ScriptError::syntax(format!("'{}' was never closed", open), line));
        }

        let line = self.line;
        self.push_newline(line);
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(Tok::Dedent, line);
        }
        self.push(Tok::Eof, line);
        Ok(self.tokens)
    }

    fn push_newline(&mut self, line: usize) {
        let needed = self
            .tokens
            .last()
            .is_some_and(|t| !matches!(t.tok, Tok::Newline | Tok::Indent | Tok::Dedent));
        if needed {
            self.push(Tok::Newline, line);
        }
    }

    /// Measure the indentation of a new line and emit Indent/Dedent.
    ///
    /// Returns false for blank and comment-only lines, which are consumed.
    fn handle_indentation(&mut self) -> ScriptResult<bool> {
        let mut width = 0;
        while let Some(c) = self.peek() {
            match c {
                ' ' => width += 1,
                '\t' => width = (width / 8 + 1) * 8,
                '\x0c' => width = 0,
                _ => break,
            }
            self.pos += 1;
        }

        match self.peek() {
            None => return Ok(false),
            Some('\n') => {
                self.advance();
                self.at_line_start = true;
                return Ok(false);
            }
            Some('\r') => {
                self.pos += 1;
                self.at_line_start = true;
                return Ok(false);
            }
            Some('#') => {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.pos += 1;
                }
                if self.peek().is_some() {
                    self.advance();
                }
                self.at_line_start = true;
                return Ok(false);
            }
            Some(_) => {}
        }

        let line = self.line;
        let current = self.indents.last().copied().unwrap_or(0);
        if width > current {
            self.indents.push(width);
            self.push(Tok::Indent, line);
        } else if width < current {
            while self.indents.last().is_some_and(|&w| w > width) {
                self.indents.pop();
                self.push(Tok::Dedent, line);
            }
            if self.indents.last().copied().unwrap_or(0) != width {
                return Err(ScriptError::indentation(
                    "unindent does not match any outer indentation level",
                    line,
                ));
            }
        }
        Ok(true)
    }

    fn skip_inline_whitespace(&mut self) -> ScriptResult<()> {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\x0c') => self.pos += 1,
                Some('\\') => {
                    let next = match self.peek_at(1) {
                        Some('\r') => self.peek_at(2),
                        other => other,
                    };
                    if next != Some('\n') {
                        return Err(ScriptError::syntax(
                            "unexpected character after line continuation character",
                            self.line,
                        ));
                    }
                    while self.peek() != Some('\n') {
                        self.pos += 1;
                    }
                    self.advance();
                }
                // Inside brackets a newline is plain whitespace
                Some('\n') if !self.brackets.is_empty() => {
                    self.advance();
                }
                _ => return Ok(()),
            }
        }
    }

    fn identifier(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn digits(&mut self, radix: u32) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '_' {
                self.pos += 1;
            } else if c.is_digit(radix) {
                text.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        text
    }

    fn number(&mut self) -> ScriptResult<Tok> {
        let line = self.line;

        if self.peek() == Some('0') {
            let radix = match self.peek_at(1) {
                Some('x') | Some('X') => Some(16),
                Some('o') | Some('O') => Some(8),
                Some('b') | Some('B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.pos += 2;
                let digits = self.digits(radix);
                if digits.is_empty() {
                    return Err(ScriptError::syntax("invalid number literal", line));
                }
                return i64::from_str_radix(&digits, radix)
                    .map(Tok::Int)
                    .map_err(|_| literal_too_large(line));
            }
        }

        let mut text = self.digits(10);
        let mut is_float = false;

        if self.peek() == Some('.')
            && !self
                .peek_at(1)
                .is_some_and(|c| c.is_alphabetic() || c == '_')
        {
            is_float = true;
            self.pos += 1;
            text.push('.');
            text.push_str(&self.digits(10));
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign = self.peek_at(1);
            let has_sign = matches!(sign, Some('+') | Some('-'));
            let first_digit = if has_sign { self.peek_at(2) } else { sign };
            if first_digit.is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.pos += 1;
                text.push('e');
                if has_sign {
                    text.push(self.chars[self.pos]);
                    self.pos += 1;
                }
                text.push_str(&self.digits(10));
            }
        }

        if self
            .peek()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
        {
            return Err(ScriptError::syntax("invalid decimal literal", line));
        }

        if is_float {
            text.parse::<f64>()
                .map(Tok::Float)
                .map_err(|_| ScriptError::syntax("invalid decimal literal", line))
        } else {
            text.parse::<i64>()
                .map(Tok::Int)
                .map_err(|_| literal_too_large(line))
        }
    }

    /// Length of a string prefix (`r`, `f`, `rf`, `fr`) directly before a quote
    fn string_prefix_len(&self) -> Option<usize> {
        let is_quote = |c: Option<char>| matches!(c, Some('"' | '\''));
        let lower = |c: Option<char>| c.map(|c| c.to_ascii_lowercase());
        match (lower(self.peek()), lower(self.peek_at(1))) {
            (Some('r' | 'f'), _) if is_quote(self.peek_at(1)) => Some(1),
            (Some('r'), Some('f')) | (Some('f'), Some('r')) if is_quote(self.peek_at(2)) => {
                Some(2)
            }
            _ => None,
        }
    }

    fn string(&mut self) -> ScriptResult<Tok> {
        let line = self.line;
        let prefix_len = self.string_prefix_len().unwrap_or(0);
        let prefix: String = self.chars[self.pos..self.pos + prefix_len]
            .iter()
            .map(|c| c.to_ascii_lowercase())
            .collect();
        self.pos += prefix_len;
        let raw = prefix.contains('r');
        let formatted = prefix.contains('f');

        let quote = self.advance().unwrap_or('"');
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.pos += 2;
        }

        // Collect the body unprocessed; escapes are resolved afterwards so
        // f-string fields see their original text.
        let mut body = String::new();
        loop {
            let Some(c) = self.peek() else {
                let message = if triple {
                    format!("unterminated triple-quoted string literal (detected at line {})", self.line)
                } else {
                    format!("unterminated string literal (detected at line {})", line)
                };
                return Err(ScriptError::syntax(message, line));
            };
            if c == quote {
                if !triple {
                    self.pos += 1;
                    break;
                }
                if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                    self.pos += 3;
                    break;
                }
            }
            if c == '\n' && !triple {
                return Err(ScriptError::syntax(
                    format!("unterminated string literal (detected at line {})", line),
                    line,
                ));
            }
            if c == '\\' {
                self.advance();
                body.push('\\');
                if let Some(escaped) = self.advance() {
                    body.push(escaped);
                }
                continue;
            }
            self.advance();
            body.push(c);
        }

        if formatted {
            split_fstring(&body, raw, line).map(Tok::FString)
        } else if raw {
            Ok(Tok::Str(body))
        } else {
            Ok(Tok::Str(unescape(&body)))
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn operator(&mut self) -> ScriptResult<Tok> {
        let line = self.line;
        let ch = self.advance().unwrap_or('\0');

        let tok = match ch {
            '*' if self.eat('*') => {
                if self.eat('=') {
                    Tok::DoubleStarAssign
                } else {
                    Tok::DoubleStar
                }
            }
            '/' if self.eat('/') => {
                if self.eat('=') {
                    Tok::DoubleSlashAssign
                } else {
                    Tok::DoubleSlash
                }
            }
            '+' if self.eat('=') => Tok::PlusAssign,
            '-' if self.eat('=') => Tok::MinusAssign,
            '*' if self.eat('=') => Tok::StarAssign,
            '/' if self.eat('=') => Tok::SlashAssign,
            '%' if self.eat('=') => Tok::PercentAssign,
            '=' if self.eat('=') => Tok::EqEq,
            '!' if self.eat('=') => Tok::NotEq,
            '<' if self.eat('=') => Tok::Le,
            '>' if self.eat('=') => Tok::Ge,
            '+' => Tok::Plus,
            '-' => Tok::Minus,
            '*' => Tok::Star,
            '/' => Tok::Slash,
            '%' => Tok::Percent,
            '=' => Tok::Assign,
            '<' => Tok::Lt,
            '>' => Tok::Gt,
            ',' => Tok::Comma,
            ':' => Tok::Colon,
            '.' => Tok::Dot,
            ';' => Tok::Semicolon,
            '(' => {
                self.brackets.push((ch, line));
                Tok::LParen
            }
            '[' => {
                self.brackets.push((ch, line));
                Tok::LBracket
            }
            '{' => {
                self.brackets.push((ch, line));
                Tok::LBrace
            }
            ')' | ']' | '}' => {
                let (expected, tok) = match ch {
                    ')' => ('(', Tok::RParen),
                    ']' => ('[', Tok::RBracket),
                    _ => ('{', Tok::RBrace),
                };
                match self.brackets.pop() {
                    Some((open, _)) if open == expected => tok,
                    Some((open, _)) => {
                        return Err(ScriptError::syntax(
                            format!(
                                "closing parenthesis '{}' does not match opening parenthesis '{}'",
                                ch, open
                            ),
                            line,
                        ))
                    }
                    None => {
                        return Err(ScriptError::syntax(format!("unmatched '{}'", ch), line))
                    }
                }
            }
            '!' => return Err(ScriptError::syntax("invalid syntax", line)),
            other => {
                return Err(ScriptError::syntax(
                    format!("invalid character '{}' (U+{:04X})", other, other as u32),
                    line,
                ))
            }
        };
        Ok(tok)
    }
}

fn literal_too_large(line: usize) -> ScriptError {
    ScriptError::new(ErrorKind::OverflowError, "integer literal too large").at(line)
}

/// Resolve backslash escapes; unknown escapes keep their backslash
pub fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(e) = chars.next() else {
            out.push('\\');
            break;
        };
        match e {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            '\n' => {}
            'x' | 'u' => {
                let len = if e == 'x' { 2 } else { 4 };
                let hex: String = chars.by_ref().take(len).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == len => out.push(decoded),
                    _ => {
                        out.push('\\');
                        out.push(e);
                        out.push_str(&hex);
                    }
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

/// Split an f-string body into literal text and `{field}` pieces
fn split_fstring(body: &str, raw: bool, line: usize) -> ScriptResult<Vec<FStringPiece>> {
    let chars: Vec<char> = body.chars().collect();
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    let flush = |literal: &mut String, pieces: &mut Vec<FStringPiece>| {
        if !literal.is_empty() {
            let text = if raw {
                std::mem::take(literal)
            } else {
                unescape(&std::mem::take(literal))
            };
            pieces.push(FStringPiece::Literal(text));
        }
    };

    while i < chars.len() {
        let c = chars[i];
        match c {
            '{' if chars.get(i + 1) == Some(&'{') => {
                literal.push('{');
                i += 2;
            }
            '}' if chars.get(i + 1) == Some(&'}') => {
                literal.push('}');
                i += 2;
            }
            '}' => {
                return Err(ScriptError::syntax(
                    "f-string: single '}' is not allowed",
                    line,
                ))
            }
            '{' => {
                flush(&mut literal, &mut pieces);
                let (piece, next) = fstring_field(&chars, i + 1, line)?;
                pieces.push(piece);
                i = next;
            }
            _ => {
                literal.push(c);
                i += 1;
            }
        }
    }
    flush(&mut literal, &mut pieces);
    Ok(pieces)
}

/// Parse one replacement field starting after its `{`; returns the index
/// after the closing `}`
fn fstring_field(chars: &[char], start: usize, line: usize) -> ScriptResult<(FStringPiece, usize)> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut expr_end = None;
    let mut conversion = None;
    let mut i = start;

    while i < chars.len() {
        let c = chars[i];
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            '}' if depth > 0 => depth -= 1,
            '!' if depth == 0 && chars.get(i + 1) != Some(&'=') => {
                expr_end.get_or_insert(i);
                conversion = chars.get(i + 1).copied();
                i += 2;
                continue;
            }
            ':' | '}' if depth == 0 => {
                let expr_end = expr_end.unwrap_or(i);
                let source: String = chars[start..expr_end].iter().collect();
                if source.trim().is_empty() {
                    return Err(ScriptError::syntax(
                        "f-string: valid expression required before '}'",
                        line,
                    ));
                }
                if !matches!(conversion, None | Some('r') | Some('s')) {
                    return Err(ScriptError::syntax(
                        "f-string: invalid conversion character: expected 's' or 'r'",
                        line,
                    ));
                }
                let mut spec = String::new();
                let mut j = i;
                if c == ':' {
                    j += 1;
                    while j < chars.len() && chars[j] != '}' {
                        spec.push(chars[j]);
                        j += 1;
                    }
                    if j >= chars.len() {
                        break;
                    }
                }
                return Ok((
                    FStringPiece::Field {
                        source,
                        conversion,
                        spec,
                    },
                    j + 1,
                ));
            }
            _ => {}
        }
        i += 1;
    }

    Err(ScriptError::syntax("f-string: expecting '}'", line))
}
