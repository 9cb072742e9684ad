//! Two-pass assembler for Hack assembly.
//!
//! The first pass walks the cleaned source, binds `(LABEL)` definitions to
//! the running instruction counter and keeps the whitespace-free text of
//! every real instruction. The second pass encodes each instruction into a
//! 16-character bitstring, resolving symbolic `@` operands through the
//! [`SymbolTable`].
//!
//! # Example
//!
//! ```
//! use jack_toolchain_lib::assembler::assemble;
//!
//! let binary = assemble("@100\nD=A").unwrap();
//! assert_eq!(binary, vec!["0000000001100100", "1110110000010000"]);
//! ```

use log::debug;

pub mod code;
pub mod symbols;

pub use symbols::SymbolTable;

use crate::error::{Result, TranslateError};
use crate::lexer::clean_lines;

/// Assemble a Hack assembly source into binary lines.
pub fn assemble(source: &str) -> Result<Vec<String>> {
    let mut symbols = SymbolTable::new();
    let mut instructions: Vec<(usize, String)> = vec![];
    // First pass: register labels, keep only instructions. Whitespace is
    // insignificant everywhere, even inside an instruction.
    for (line, text) in clean_lines(source) {
        let text: String = text.split_whitespace().collect();
        if let Some(rest) = text.strip_prefix('(') {
            match rest.strip_suffix(')') {
                Some(label) if !label.is_empty() => {
                    symbols.define(label, instructions.len() as u16);
                }
                _ => return Err(TranslateError::MalformedLabel { text, line }),
            }
        } else {
            instructions.push((line, text));
        }
    }
    debug!(
        "first pass kept {} instructions from {} source lines",
        instructions.len(),
        source.lines().count()
    );
    // Second pass: encode.
    instructions
        .iter()
        .map(|(line, text)| encode(&mut symbols, text, *line))
        .collect()
}

/// Encode a single instruction, resolving symbols as needed.
fn encode(symbols: &mut SymbolTable, instruction: &str, line: usize) -> Result<String> {
    match instruction.strip_prefix('@') {
        Some(operand) if operand.bytes().all(|b| b.is_ascii_digit()) => {
            let address: u16 = operand.parse().map_err(|_| TranslateError::IntegerOutOfRange {
                literal: operand.to_string(),
                line,
            })?;
            if address > 0x7FFF {
                return Err(TranslateError::IntegerOutOfRange {
                    literal: operand.to_string(),
                    line,
                });
            }
            Ok(code::encode_a(address))
        }
        Some(operand) => {
            // Symbols must not start with a digit; that case is a broken
            // numeric operand, not an identifier.
            if operand.is_empty()
                || operand.as_bytes()[0].is_ascii_digit()
                || !operand.bytes().all(is_symbol_byte)
            {
                return Err(TranslateError::MalformedLabel {
                    text: instruction.to_string(),
                    line,
                });
            }
            Ok(code::encode_a(symbols.resolve(operand)))
        }
        None => code::encode_c(instruction, line),
    }
}

/// Characters permitted in Hack symbols: letters, digits, `_.$:`.
fn is_symbol_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'$' || b == b':'
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn numeric_a_instruction_and_comp() {
        let binary = assemble("@100\nD=A").unwrap();
        assert_eq!(binary, vec!["0000000001100100", "1110110000010000"]);
    }

    #[test]
    fn label_before_first_instruction_is_address_zero() {
        let binary = assemble("(LOOP)\n@LOOP\n0;JMP").unwrap();
        assert_eq!(binary, vec!["0000000000000000", "1110101010000111"]);
    }

    #[test]
    fn fresh_variables_start_at_sixteen() {
        let binary = assemble("@i\nM=0\n@i\nM=M+1").unwrap();
        assert_eq!(binary[0], "0000000000010000");
        assert_eq!(binary[2], "0000000000010000");
    }

    #[test]
    fn labels_variables_and_predefined_mix() {
        let source = "\
            @R2\n\
            M=0\n\
            (LOOP)\n\
            @counter\n\
            D=M\n\
            @END\n\
            D;JEQ\n\
            @LOOP\n\
            0;JMP\n\
            (END)\n\
            @END\n\
            0;JMP";
        let binary = assemble(source).unwrap();
        // R2 is predefined, counter is the first variable, LOOP sits at
        // instruction 2 and END behind the last jump.
        assert_eq!(binary[0], code::encode_a(2));
        assert_eq!(binary[2], code::encode_a(16));
        assert_eq!(binary[4], code::encode_a(8));
        assert_eq!(binary[6], code::encode_a(2));
        assert_eq!(binary[8], code::encode_a(8));
    }

    #[test]
    fn whitespace_inside_instructions_is_ignored() {
        let binary = assemble("  @ 5 \n D = M + 1 ; JGT ").unwrap();
        assert_eq!(binary, vec!["0000000000000101", "1111110111010001"]);
    }

    #[test]
    fn comments_may_follow_instructions() {
        let binary = assemble("// setup\n@2 // two\nD=A// copy").unwrap();
        assert_eq!(binary.len(), 2);
    }

    #[test]
    fn malformed_labels_are_fatal() {
        assert_eq!(
            assemble("(LOOP"),
            Err(TranslateError::MalformedLabel {
                text: "(LOOP".into(),
                line: 1,
            })
        );
        assert_eq!(
            assemble("@"),
            Err(TranslateError::MalformedLabel {
                text: "@".into(),
                line: 1,
            })
        );
    }

    #[test]
    fn oversized_addresses_are_fatal() {
        assert!(matches!(
            assemble("@32768"),
            Err(TranslateError::IntegerOutOfRange { .. })
        ));
        assert!(matches!(
            assemble("@99999999999"),
            Err(TranslateError::IntegerOutOfRange { .. })
        ));
    }

    #[test]
    fn unknown_comp_reports_its_line() {
        assert_eq!(
            assemble("@1\nD=A\nD=A*2"),
            Err(TranslateError::UnknownComp {
                mnemonic: "A*2".into(),
                line: 3,
            })
        );
    }

    proptest! {
        #[test]
        fn a_instruction_encoding_is_faithful(address in 0u16..=0x7FFF) {
            let source = format!("@{}", address);
            let binary = assemble(&source).unwrap();
            prop_assert_eq!(binary[0].len(), 16);
            prop_assert_eq!(u16::from_str_radix(&binary[0], 2).unwrap(), address);
        }

        #[test]
        fn variable_allocation_is_dense(count in 1usize..24) {
            let source: String = (0..count)
                .map(|nr| format!("@var{}\n", nr))
                .collect();
            let binary = assemble(&source).unwrap();
            for (nr, encoded) in binary.iter().enumerate() {
                prop_assert_eq!(
                    u16::from_str_radix(encoded, 2).unwrap(),
                    16 + nr as u16
                );
            }
        }
    }
}
