//! Lexical analysis of program source.
//!
//! Source text is a sequence of whitespace-separated words. Each word becomes
//! exactly one [`Token`]:
//!
//! ```text
//! :        definition start
//! ;        definition end
//! -1.5     decimal literal   [+-]? digits ('.' digits?)?  |  [+-]? '.' digits
//! op1.sync anything else is a name
//! ```
//!
//! Two comment forms are skipped entirely: `( ... )`, opened by a word that
//! is exactly `(` and closed by the first word ending in `)`, and `\`, which
//! comments out the rest of the line.
//!
//! Tokenizing never fails. Words that merely look numeric (`1e3`, `0x10`,
//! `1.2.3`) are passed through as names and rejected later by the compiler
//! if nothing by that name exists.

use core::fmt;

/// Word that opens a definition.
pub const DEFINITION_START: &str = ":";

/// Word that closes a definition.
pub const DEFINITION_END: &str = ";";

/// Position of a token in the source text, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    /// Line number, starting at 1.
    pub line: usize,
    /// Column in characters, starting at 1.
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// A decimal literal with its parsed value.
    Number(f64),
    /// A reference to an operation.
    Name,
    /// The `:` marker.
    DefinitionStart,
    /// The `;` marker.
    DefinitionEnd,
}

/// One lexical unit, borrowing its text from the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
    /// Lexical class.
    pub kind: TokenKind,
    /// Raw text of the word.
    pub text: &'a str,
    /// Where the word starts.
    pub location: Location,
}

/// Lazy token stream over a source string.
///
/// Cloning a tokenizer restarts nothing; it forks the stream at the current
/// position. Create a new one from the same text to start over.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer at the beginning of `source`.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn skip_line(&mut self) {
        while let Some(ch) = self.bump() {
            if ch == '\n' {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some((word, _)) = self.next_word() {
            if word.ends_with(')') {
                break;
            }
        }
    }

    /// Read the next whitespace-delimited word.
    fn next_word(&mut self) -> Option<(&'a str, Location)> {
        self.skip_whitespace();
        let source = self.source;
        let start = self.pos;
        let location = Location {
            line: self.line,
            column: self.column,
        };
        while self.peek().is_some_and(|c| !c.is_whitespace()) {
            self.bump();
        }
        (self.pos > start).then(|| (&source[start..self.pos], location))
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            let (text, location) = self.next_word()?;
            match text {
                "\\" => self.skip_line(),
                "(" => self.skip_comment(),
                _ => {
                    return Some(Token {
                        kind: classify(text),
                        text,
                        location,
                    });
                }
            }
        }
    }
}

/// Tokenize a source string.
pub fn tokenize(source: &str) -> Tokenizer<'_> {
    Tokenizer::new(source)
}

fn classify(text: &str) -> TokenKind {
    match text {
        DEFINITION_START => TokenKind::DefinitionStart,
        DEFINITION_END => TokenKind::DefinitionEnd,
        _ => parse_decimal(text).map_or(TokenKind::Name, TokenKind::Number),
    }
}

/// Parse a signed or unsigned decimal literal.
///
/// Returns `None` for anything outside the decimal grammar, including
/// exponents, hex, `inf` and `nan`, all of which `f64::from_str` would accept.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (int, frac) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let has_digits = !int.is_empty() || frac.is_some_and(|f| !f.is_empty());

    if !(all_digits(int) && frac.is_none_or(all_digits) && has_digits) {
        return None;
    }
    text.parse().ok()
}
