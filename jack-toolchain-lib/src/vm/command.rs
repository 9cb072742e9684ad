//! The VM instruction set as tagged records.
//!
//! Commands exist in two representations: the wire text (one command per
//! line, as found in `.vm` files) and this enum. [`Command::parse`] reads
//! the wire form, [`std::fmt::Display`] writes it; the Jack compiler emits
//! `Command` values directly and only serializes at the output boundary.

#[cfg(test)]
use proptest_derive::Arbitrary;

use std::fmt;

use crate::error::{Result, TranslateError};

/// A memory segment addressable by `<segment> <index>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum Segment {
    Constant,
    Local,
    Argument,
    This,
    That,
    Pointer,
    Temp,
    Static,
}

impl Segment {
    fn parse(text: &str, line: usize) -> Result<Self> {
        match text {
            "constant" => Ok(Segment::Constant),
            "local" => Ok(Segment::Local),
            "argument" => Ok(Segment::Argument),
            "this" => Ok(Segment::This),
            "that" => Ok(Segment::That),
            "pointer" => Ok(Segment::Pointer),
            "temp" => Ok(Segment::Temp),
            "static" => Ok(Segment::Static),
            _ => Err(TranslateError::UnknownSegment {
                segment: text.to_string(),
                line,
            }),
        }
    }
    /// The base-address register backing this segment, for the four
    /// register-relative segments.
    pub fn register(self) -> Option<&'static str> {
        match self {
            Segment::Local => Some("LCL"),
            Segment::Argument => Some("ARG"),
            Segment::This => Some("THIS"),
            Segment::That => Some("THAT"),
            _ => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Segment::Constant => "constant",
            Segment::Local => "local",
            Segment::Argument => "argument",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
            Segment::Static => "static",
        };
        f.write_str(name)
    }
}

/// One VM command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Push(Segment, u16),
    Pop(Segment, u16),
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
    Label(String),
    Goto(String),
    IfGoto(String),
    Function(String, u16),
    Call(String, u16),
    Return,
}

impl Command {
    /// Parse one cleaned line of VM text.
    ///
    /// Semantic restrictions are enforced here: `pop constant` is illegal,
    /// `pointer` indices are 0 or 1, `temp` indices at most 7.
    pub fn parse(text: &str, line: usize) -> Result<Self> {
        let unknown = || TranslateError::UnknownCommand {
            text: text.to_string(),
            line,
        };
        let fields: Vec<&str> = text.split_whitespace().collect();
        let command = match fields.as_slice() {
            ["push", segment, index] => {
                let segment = Segment::parse(segment, line)?;
                let index = index.parse().map_err(|_| unknown())?;
                check_index(segment, index, line)?;
                Command::Push(segment, index)
            }
            ["pop", segment, index] => {
                let segment = Segment::parse(segment, line)?;
                if segment == Segment::Constant {
                    return Err(TranslateError::PopIntoConstant { line });
                }
                let index = index.parse().map_err(|_| unknown())?;
                check_index(segment, index, line)?;
                Command::Pop(segment, index)
            }
            ["add"] => Command::Add,
            ["sub"] => Command::Sub,
            ["neg"] => Command::Neg,
            ["eq"] => Command::Eq,
            ["gt"] => Command::Gt,
            ["lt"] => Command::Lt,
            ["and"] => Command::And,
            ["or"] => Command::Or,
            ["not"] => Command::Not,
            ["label", label] => Command::Label(label.to_string()),
            ["goto", label] => Command::Goto(label.to_string()),
            ["if-goto", label] => Command::IfGoto(label.to_string()),
            ["function", name, locals] => {
                Command::Function(name.to_string(), locals.parse().map_err(|_| unknown())?)
            }
            ["call", name, args] => {
                Command::Call(name.to_string(), args.parse().map_err(|_| unknown())?)
            }
            ["return"] => Command::Return,
            _ => return Err(unknown()),
        };
        Ok(command)
    }
}

fn check_index(segment: Segment, index: u16, line: usize) -> Result<()> {
    let limit = match segment {
        Segment::Pointer => 1,
        Segment::Temp => 7,
        _ => return Ok(()),
    };
    if index > limit {
        Err(TranslateError::IndexOutOfRange {
            segment: segment.to_string(),
            index,
            line,
        })
    } else {
        Ok(())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Command::Push(segment, index) => write!(f, "push {} {}", segment, index),
            Command::Pop(segment, index) => write!(f, "pop {} {}", segment, index),
            Command::Add => f.write_str("add"),
            Command::Sub => f.write_str("sub"),
            Command::Neg => f.write_str("neg"),
            Command::Eq => f.write_str("eq"),
            Command::Gt => f.write_str("gt"),
            Command::Lt => f.write_str("lt"),
            Command::And => f.write_str("and"),
            Command::Or => f.write_str("or"),
            Command::Not => f.write_str("not"),
            Command::Label(label) => write!(f, "label {}", label),
            Command::Goto(label) => write!(f, "goto {}", label),
            Command::IfGoto(label) => write!(f, "if-goto {}", label),
            Command::Function(name, locals) => write!(f, "function {} {}", name, locals),
            Command::Call(name, args) => write!(f, "call {} {}", name, args),
            Command::Return => f.write_str("return"),
        }
    }
}
