//! Lowering of VM programs to Hack assembly.
//!
//! A [`Translator`] owns one [`CodeWriter`] for the lifetime of a whole
//! translation, which may span many `.vm` files (directory mode): the label
//! counter is shared so that generated labels stay globally unique, and the
//! static-segment namespace switches with every [`Translator::translate_unit`].
//!
//! # Example
//!
//! ```
//! use jack_toolchain_lib::vm::Translator;
//!
//! let mut translator = Translator::new();
//! translator.translate_unit("Main", "push constant 7").unwrap();
//! let asm = translator.finish();
//! assert_eq!(asm[0], "// push constant 7");
//! assert_eq!(asm[1], "@7");
//! ```

pub mod command;
pub mod writer;

pub use command::{Command, Segment};
pub use writer::CodeWriter;

use log::debug;

use crate::error::Result;
use crate::lexer::clean_lines;

/// Translates VM source text, one unit (file) at a time.
#[derive(Debug, Default)]
pub struct Translator {
    writer: CodeWriter,
}

impl Translator {
    pub fn new() -> Self {
        Translator::default()
    }
    /// Emit the program prologue: `SP = 256`, then `call Sys.init 0`.
    /// Used by directory translations only.
    pub fn write_bootstrap(&mut self) {
        self.writer.bootstrap();
    }
    /// Emit a plain comment line, e.g. a per-file banner.
    pub fn write_comment(&mut self, text: &str) {
        self.writer.comment(text);
    }
    /// Translate one `.vm` unit. `stem` is the file's basename and becomes
    /// the namespace of its static segment.
    pub fn translate_unit(&mut self, stem: &str, source: &str) -> Result<()> {
        self.writer.set_unit(stem);
        let mut count = 0;
        for (line, text) in clean_lines(source) {
            let command = Command::parse(text, line)?;
            self.writer.write(&command);
            count += 1;
        }
        debug!("translated {} commands from unit `{}`", count, stem);
        Ok(())
    }
    /// The finished assembly, one instruction or comment per line.
    pub fn finish(self) -> Vec<String> {
        self.writer.into_lines()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Translate a single unit and keep only real instructions.
    fn translate(source: &str) -> Vec<String> {
        let mut translator = Translator::new();
        translator
            .translate_unit("Test", source)
            .expect("translation failed");
        code_lines(translator.finish())
    }

    fn code_lines(lines: Vec<String>) -> Vec<String> {
        lines
            .into_iter()
            .filter(|line| !line.starts_with("//"))
            .collect()
    }

    #[test]
    fn push_constant_and_add() {
        let asm = translate("push constant 7\npush constant 8\nadd");
        let push7 = ["@7", "D=A", "@SP", "M=M+1", "A=M-1", "M=D"];
        let push8 = ["@8", "D=A", "@SP", "M=M+1", "A=M-1", "M=D"];
        let add = ["@SP", "AM=M-1", "D=M", "A=A-1", "M=D+M"];
        let expected: Vec<&str> = push7
            .iter()
            .chain(push8.iter())
            .chain(add.iter())
            .copied()
            .collect();
        assert_eq!(asm, expected);
    }

    #[test]
    fn register_relative_push_and_pop() {
        let asm = translate("push local 2");
        assert_eq!(
            asm,
            vec!["@LCL", "D=M", "@2", "A=D+A", "D=M", "@SP", "M=M+1", "A=M-1", "M=D"]
        );
        let asm = translate("pop argument 3");
        assert_eq!(
            asm,
            vec![
                "@ARG", "D=M", "@3", "D=D+A", "@R13", "M=D", "@SP", "AM=M-1", "D=M", "@R13",
                "A=M", "M=D"
            ]
        );
    }

    #[test]
    fn pointer_and_temp_map_to_registers() {
        assert_eq!(translate("push pointer 0")[0], "@R3");
        assert_eq!(translate("push pointer 1")[0], "@R4");
        assert_eq!(translate("push temp 3")[0], "@R8");
        assert_eq!(translate("pop temp 7")[3], "@R12");
        assert_eq!(translate("pop pointer 1")[3], "@R4");
    }

    #[test]
    fn static_references_are_namespaced_per_unit() {
        let mut translator = Translator::new();
        translator.translate_unit("Foo", "push static 0").unwrap();
        translator.translate_unit("Bar", "push static 0").unwrap();
        let asm = code_lines(translator.finish());
        assert_eq!(asm[0], "@Foo.0");
        assert_eq!(asm[6], "@Bar.0");
    }

    #[test]
    fn unary_operations_rewrite_the_top_cell() {
        assert_eq!(translate("not"), vec!["@SP", "A=M-1", "M=!M"]);
        assert_eq!(translate("neg"), vec!["@SP", "A=M-1", "M=-M"]);
    }

    #[test]
    fn comparisons_use_two_fresh_labels_each() {
        let asm = translate("eq\nlt\ngt");
        let definitions: Vec<&String> =
            asm.iter().filter(|line| line.starts_with('(')).collect();
        assert_eq!(definitions.len(), 6);
        let unique: std::collections::HashSet<_> = definitions.iter().collect();
        assert_eq!(unique.len(), 6);
        // Every comparison pushes both truth values.
        assert_eq!(asm.iter().filter(|line| *line == "M=-1").count(), 3);
        assert_eq!(asm.iter().filter(|line| *line == "M=0").count(), 3);
        assert!(asm.contains(&"D;JEQ".to_string()));
        assert!(asm.contains(&"D;JLT".to_string()));
        assert!(asm.contains(&"D;JGT".to_string()));
    }

    #[test]
    fn comparison_subtracts_x_minus_y() {
        let asm = translate("lt");
        let jump = asm.iter().position(|line| line == "D;JLT").unwrap();
        assert_eq!(asm[jump - 2], "D=M-D");
    }

    #[test]
    fn flow_labels_are_namespaced_inside_functions() {
        let asm = translate(
            "function Main.loop 0\nlabel TOP\ngoto TOP\npush constant 0\nif-goto TOP",
        );
        assert!(asm.contains(&"(Main.loop$TOP)".to_string()));
        assert_eq!(
            asm.iter().filter(|line| *line == "@Main.loop$TOP").count(),
            2
        );
        // if-goto pops before branching.
        let branch = asm.iter().position(|line| line == "D;JNE").unwrap();
        assert_eq!(asm[branch - 1], "@Main.loop$TOP");
        assert_eq!(asm[branch - 2], "D=M");
    }

    #[test]
    fn top_level_labels_stay_plain() {
        let asm = translate("label START\ngoto START");
        assert_eq!(asm[0], "(START)");
        assert_eq!(asm[1], "@START");
    }

    #[test]
    fn call_saves_the_frame_and_repositions_arg() {
        let asm = translate("call Math.max 2");
        // Return address, then LCL, ARG, THIS, THAT.
        assert!(asm[0].starts_with("@$RET"));
        assert_eq!(asm[1], "D=A");
        for (nr, register) in ["@LCL", "@ARG", "@THIS", "@THAT"].iter().enumerate() {
            assert_eq!(&asm[6 + nr * 6], register);
            assert_eq!(asm[6 + nr * 6 + 1], "D=M");
        }
        // ARG = SP - 2 - 5
        assert!(asm.contains(&"@7".to_string()));
        // The call ends with the jump and the return label.
        assert_eq!(asm[asm.len() - 3], "@Math.max");
        assert_eq!(asm[asm.len() - 2], "0;JMP");
        assert!(asm[asm.len() - 1].starts_with("($RET"));
    }

    #[test]
    fn function_pushes_zeroed_locals() {
        let asm = translate("function Sys.init 2");
        assert_eq!(asm[0], "(Sys.init)");
        assert_eq!(asm[1], "D=0");
        assert_eq!(asm.iter().filter(|line| *line == "M=D").count(), 2);
        // No locals, no initialisation.
        assert_eq!(translate("function Sys.halt 0"), vec!["(Sys.halt)"]);
    }

    #[test]
    fn return_captures_the_return_address_first() {
        let asm = translate("return");
        let capture = asm.iter().position(|line| line == "@R14").unwrap();
        let write_result = asm.iter().position(|line| line == "@ARG").unwrap();
        assert!(capture < write_result);
        // Frame restore order: THAT, THIS, ARG, LCL.
        let restores: Vec<&String> = asm
            .iter()
            .filter(|line| ["@THAT", "@THIS", "@LCL"].contains(&line.as_str()))
            .collect();
        assert_eq!(restores, vec!["@LCL", "@THAT", "@THIS", "@LCL"]);
        assert_eq!(asm[asm.len() - 1], "0;JMP");
        assert_eq!(asm[asm.len() - 2], "A=M");
        assert_eq!(asm[asm.len() - 3], "@R14");
    }

    #[test]
    fn bootstrap_sets_sp_and_calls_sys_init() {
        let mut translator = Translator::new();
        translator.write_bootstrap();
        let asm = code_lines(translator.finish());
        assert_eq!(&asm[..4], ["@256", "D=A", "@SP", "M=D"]);
        assert!(asm.contains(&"@Sys.init".to_string()));
    }

    #[test]
    fn label_counter_spans_units() {
        let mut translator = Translator::new();
        translator.translate_unit("Foo", "eq").unwrap();
        translator.translate_unit("Bar", "eq").unwrap();
        let asm = code_lines(translator.finish());
        let definitions: std::collections::HashSet<&String> =
            asm.iter().filter(|line| line.starts_with('(')).collect();
        assert_eq!(definitions.len(), 4);
    }
}
