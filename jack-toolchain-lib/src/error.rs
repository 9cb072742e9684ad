//! Error module.
//!
//! This module defines the fatal error type shared by the three translators.
//! The first error aborts the current translation unit; there is no recovery
//! and no multi-error reporting.

use thiserror::Error;

/// Shorthand for results produced by the translators.
pub type Result<T> = std::result::Result<T, TranslateError>;

/// A fatal lexing, parsing or semantic error.
///
/// Line numbers are 1-based and refer to the input of the failing
/// translation unit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// The lexer hit a character no token can start with.
    #[error("unexpected character {found:?} (line {line})")]
    UnexpectedCharacter { found: char, line: usize },
    /// A string constant was still open at the end of its line.
    #[error("unterminated string constant (line {line})")]
    UnterminatedString { line: usize },
    /// A `/* ... */` comment was still open at the end of the input.
    #[error("unterminated block comment (line {line})")]
    UnterminatedComment { line: usize },
    /// An integer constant outside `0..=32767`.
    #[error("integer constant `{literal}` out of range (line {line})")]
    IntegerOutOfRange { literal: String, line: usize },
    /// A production needed a different token than the one found.
    #[error("expected {expected}, found `{found}` (line {line})")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
    },
    /// The token stream ended inside a production.
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    /// A label definition that is not of the form `(NAME)`.
    #[error("malformed label `{text}` (line {line})")]
    MalformedLabel { text: String, line: usize },
    /// A computation mnemonic the Hack ALU cannot perform.
    #[error("unknown computation `{mnemonic}` (line {line})")]
    UnknownComp { mnemonic: String, line: usize },
    /// A destination containing anything but `A`, `D` and `M`.
    #[error("unknown destination `{mnemonic}` (line {line})")]
    UnknownDest { mnemonic: String, line: usize },
    /// An unknown jump mnemonic.
    #[error("unknown jump `{mnemonic}` (line {line})")]
    UnknownJump { mnemonic: String, line: usize },
    /// A VM line that is no known command.
    #[error("unknown command `{text}` (line {line})")]
    UnknownCommand { text: String, line: usize },
    /// A push/pop naming an unknown segment.
    #[error("unknown segment `{segment}` (line {line})")]
    UnknownSegment { segment: String, line: usize },
    /// `pop constant i` has no storage to pop into.
    #[error("cannot pop into the constant segment (line {line})")]
    PopIntoConstant { line: usize },
    /// A segment index outside the segment's range.
    #[error("index {index} out of range for segment `{segment}` (line {line})")]
    IndexOutOfRange {
        segment: String,
        index: u16,
        line: usize,
    },
    /// An identifier used in an expression that no scope defines.
    #[error("unknown symbol `{name}` (line {line})")]
    UnknownSymbol { name: String, line: usize },
}
