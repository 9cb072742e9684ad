//! Binary encoding of Hack instructions.
//!
//! A-instructions are `0` followed by a 15-bit address. C-instructions are
//! `111` + 7-bit comp + 3-bit dest + 3-bit jump. The comp table stores only
//! the `A`-side rows; a mnemonic referencing `M` sets the leading `a` bit
//! and is looked up with `M` rewritten to `A`.

use bitflags::bitflags;
use phf::phf_map;

use crate::error::{Result, TranslateError};

/// 6-bit ALU codes, keyed by the `A`-side comp mnemonic.
static COMP_CODES: phf::Map<&'static str, &'static str> = phf_map! {
    "0" => "101010",
    "1" => "111111",
    "-1" => "111010",
    "D" => "001100",
    "A" => "110000",
    "!D" => "001101",
    "!A" => "110001",
    "-D" => "001111",
    "-A" => "110011",
    "D+1" => "011111",
    "A+1" => "110111",
    "D-1" => "001110",
    "A-1" => "110010",
    "D+A" => "000010",
    "D-A" => "010011",
    "A-D" => "000111",
    "D&A" => "000000",
    "D|A" => "010101",
};

/// 3-bit jump codes. The empty jump is handled before lookup.
static JUMP_CODES: phf::Map<&'static str, &'static str> = phf_map! {
    "JGT" => "001",
    "JEQ" => "010",
    "JGE" => "011",
    "JLT" => "100",
    "JNE" => "101",
    "JLE" => "110",
    "JMP" => "111",
};

bitflags! {
    /// Destination registers of a C-instruction, in emission order `A D M`.
    struct Dest: u8 {
        const A = 0b100;
        const D = 0b010;
        const M = 0b001;
    }
}

/// Encode an A-instruction with a resolved 15-bit address.
pub fn encode_a(address: u16) -> String {
    format!("0{:015b}", address)
}

/// Encode a whitespace-free C-instruction like `D=M+1` or `0;JMP`.
pub fn encode_c(instruction: &str, line: usize) -> Result<String> {
    let (operation, jump) = match instruction.find(';') {
        Some(at) => (&instruction[..at], &instruction[at + 1..]),
        None => (instruction, ""),
    };
    let (dest, comp) = match operation.find('=') {
        Some(at) => (&operation[..at], &operation[at + 1..]),
        None => ("", operation),
    };
    Ok(format!(
        "111{}{}{}",
        comp_bits(comp, line)?,
        dest_bits(dest, line)?,
        jump_bits(jump, line)?
    ))
}

fn comp_bits(comp: &str, line: usize) -> Result<String> {
    let (a, lookup) = if comp.contains('M') {
        ('1', comp.replace('M', "A"))
    } else {
        ('0', comp.to_string())
    };
    let code = COMP_CODES
        .get(lookup.as_str())
        .ok_or_else(|| TranslateError::UnknownComp {
            mnemonic: comp.to_string(),
            line,
        })?;
    Ok(format!("{}{}", a, code))
}

fn dest_bits(dest: &str, line: usize) -> Result<String> {
    let mut bits = Dest::empty();
    for ch in dest.chars() {
        bits |= match ch {
            'A' => Dest::A,
            'D' => Dest::D,
            'M' => Dest::M,
            _ => {
                return Err(TranslateError::UnknownDest {
                    mnemonic: dest.to_string(),
                    line,
                })
            }
        };
    }
    Ok(format!("{:03b}", bits.bits()))
}

fn jump_bits(jump: &str, line: usize) -> Result<&'static str> {
    if jump.is_empty() {
        return Ok("000");
    }
    JUMP_CODES
        .get(jump)
        .copied()
        .ok_or_else(|| TranslateError::UnknownJump {
            mnemonic: jump.to_string(),
            line,
        })
}
