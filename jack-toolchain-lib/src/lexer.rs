//! Shared lexical analysis for the three translators.
//!
//! The Jack stage needs real tokenization; the Hack and VM grammars are
//! whitespace splits over comment-free lines. Both disciplines live here so
//! no translator grows its own comment handling:
//!
//! - [`clean_lines`] yields the non-empty payload of a line-oriented source
//!   with `//` comments removed, used by the assembler and the VM parser.
//! - [`Lexer`] is a full tokenizer over a [`Syntax`] configuration (keyword
//!   predicate plus symbol set), used by the Jack compiler. It exposes the
//!   current token via [`Lexer::peek`] and consumes with [`Lexer::advance`],
//!   which reports whether a token remains.
//!
//! # Example
//!
//! ```
//! use jack_toolchain_lib::lexer::clean_lines;
//!
//! let source = "  @100 // load\n\n// nothing\nD=A";
//! let lines: Vec<_> = clean_lines(source).collect();
//! assert_eq!(lines, vec![(1, "@100"), (4, "D=A")]);
//! ```

use log::trace;

use std::fmt;

use crate::error::{Result, TranslateError};

/// Iterate over the non-empty payload of `source`.
///
/// `//` comments are stripped, surrounding whitespace is trimmed and blank
/// lines are dropped. Yields `(line_number, payload)` with 1-based lines.
pub fn clean_lines(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source.lines().enumerate().filter_map(|(nr, line)| {
        let line = match line.find("//") {
            Some(comment) => &line[..comment],
            None => line,
        };
        let line = line.trim();
        if line.is_empty() {
            None
        } else {
            Some((nr + 1, line))
        }
    })
}

/// Lexical configuration of a tokenized language.
///
/// The token shapes (strings, integers, identifiers, whitespace and comment
/// forms) are fixed; what varies between languages is which words are
/// keywords and which single characters are symbols.
pub struct Syntax {
    /// Decides whether a word is a keyword of the language.
    pub is_keyword: fn(&str) -> bool,
    /// Every character that forms a one-character symbol token.
    pub symbols: &'static str,
}

/// The five token classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Symbol,
    IntConst,
    StrConst,
    Ident,
}

/// A single token: its class, its lexeme and the line it started on.
///
/// For [`TokenKind::StrConst`] the lexeme is the string content without the
/// enclosing quotes; for [`TokenKind::IntConst`] it denotes a decimal
/// integer in `0..=32767`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

impl Token {
    /// Whether this token has the given class and lexeme.
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Byte cursor over ASCII source with line tracking.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Cursor {
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
        }
    }
    fn peek(&self) -> Option<char> {
        self.bytes.get(self.pos).map(|&b| b as char)
    }
    fn peek_second(&self) -> Option<char> {
        self.bytes.get(self.pos + 1).map(|&b| b as char)
    }
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }
    fn line(&self) -> usize {
        self.line
    }
}

/// Tokenizer over a [`Syntax`] configuration.
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    syntax: &'static Syntax,
    current: Option<Token>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer positioned *before* the first token.
    /// Call [`Lexer::advance`] once to load it.
    pub fn new(source: &'a str, syntax: &'static Syntax) -> Self {
        Lexer {
            cursor: Cursor::new(source),
            syntax,
            current: None,
        }
    }
    /// The current token, if the input is not exhausted.
    pub fn peek(&self) -> Option<&Token> {
        self.current.as_ref()
    }
    /// Load the next token into the current slot.
    ///
    /// Returns `Ok(false)` once the input is exhausted; the current slot is
    /// empty from then on.
    pub fn advance(&mut self) -> Result<bool> {
        self.skip_trivia()?;
        let line = self.cursor.line();
        let ch = match self.cursor.peek() {
            Some(ch) => ch,
            None => {
                self.current = None;
                return Ok(false);
            }
        };
        let token = if ch == '"' {
            self.lex_string(line)?
        } else if ch.is_ascii_digit() {
            self.lex_integer(line)?
        } else if self.syntax.symbols.contains(ch) {
            self.cursor.advance();
            Token {
                kind: TokenKind::Symbol,
                text: ch.to_string(),
                line,
            }
        } else if ch.is_ascii_alphabetic() || ch == '_' {
            self.lex_word(line)
        } else {
            return Err(TranslateError::UnexpectedCharacter { found: ch, line });
        };
        trace!("token {:?} {:?}", token.kind, token.text);
        self.current = Some(token);
        Ok(true)
    }
    /// Skip whitespace, `//` comments and `/* */` comments.
    /// Block comments do not nest.
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.cursor.peek() {
                Some(ch) if ch.is_ascii_whitespace() => {
                    self.cursor.advance();
                }
                Some('/') if self.cursor.peek_second() == Some('/') => {
                    while let Some(ch) = self.cursor.advance() {
                        if ch == '\n' {
                            break;
                        }
                    }
                }
                Some('/') if self.cursor.peek_second() == Some('*') => {
                    let line = self.cursor.line();
                    self.cursor.advance();
                    self.cursor.advance();
                    loop {
                        match self.cursor.advance() {
                            Some('*') if self.cursor.peek() == Some('/') => {
                                self.cursor.advance();
                                break;
                            }
                            Some(_) => {}
                            None => {
                                return Err(TranslateError::UnterminatedComment { line });
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }
    /// Lex a `"..."` constant. No escape processing; the closing quote must
    /// appear on the same line.
    fn lex_string(&mut self, line: usize) -> Result<Token> {
        self.cursor.advance();
        let mut text = String::new();
        loop {
            match self.cursor.advance() {
                Some('"') => break,
                Some('\n') | None => {
                    return Err(TranslateError::UnterminatedString { line });
                }
                Some(ch) => text.push(ch),
            }
        }
        Ok(Token {
            kind: TokenKind::StrConst,
            text,
            line,
        })
    }
    fn lex_integer(&mut self, line: usize) -> Result<Token> {
        let mut text = String::new();
        while let Some(ch) = self.cursor.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            text.push(ch);
            self.cursor.advance();
        }
        let out_of_range = TranslateError::IntegerOutOfRange {
            literal: text.clone(),
            line,
        };
        match text.parse::<u32>() {
            Ok(value) if value <= 32767 => Ok(Token {
                kind: TokenKind::IntConst,
                text,
                line,
            }),
            _ => Err(out_of_range),
        }
    }
    fn lex_word(&mut self, line: usize) -> Token {
        let mut text = String::new();
        while let Some(ch) = self.cursor.peek() {
            if !(ch.is_ascii_alphanumeric() || ch == '_') {
                break;
            }
            text.push(ch);
            self.cursor.advance();
        }
        let kind = if (self.syntax.is_keyword)(&text) {
            TokenKind::Keyword
        } else {
            TokenKind::Ident
        };
        Token { kind, text, line }
    }
}
