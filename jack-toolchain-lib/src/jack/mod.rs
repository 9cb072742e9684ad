//! The Jack → VM compiler.
//!
//! One compilation unit is one class in one `.jack` file. [`compile`] turns
//! its source into the VM command list; serialization to `.vm` text happens
//! at the output boundary via each command's `Display`.
//!
//! # Example
//!
//! ```
//! use jack_toolchain_lib::jack::compile;
//!
//! let code = compile("class Main { function void main() { return; } }").unwrap();
//! let text: Vec<String> = code.iter().map(|command| command.to_string()).collect();
//! assert_eq!(text, vec!["function Main.main 0", "push constant 0", "return"]);
//! ```

use phf::phf_set;

pub mod engine;
pub mod symbols;


pub use engine::CompilationEngine;

use crate::error::Result;
use crate::lexer::Syntax;
use crate::vm::Command;

/// The fixed keyword set of Jack.
static KEYWORDS: phf::Set<&'static str> = phf_set! {
    "class",
    "constructor",
    "function",
    "method",
    "field",
    "static",
    "var",
    "int",
    "char",
    "boolean",
    "void",
    "true",
    "false",
    "null",
    "this",
    "let",
    "do",
    "if",
    "else",
    "while",
    "return",
};

fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(word)
}

/// Lexical shape of Jack.
pub static SYNTAX: Syntax = Syntax {
    is_keyword,
    symbols: "{}()[].,;+-*/&|<>=~",
};

/// Compile one Jack class into VM commands.
pub fn compile(source: &str) -> Result<Vec<Command>> {
    CompilationEngine::new(source).compile()
}
