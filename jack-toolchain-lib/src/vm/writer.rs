//! Lowering of VM commands to Hack assembly.
//!
//! The writer owns every piece of state that must survive a single input
//! file: the monotonic counter behind generated labels, the static-segment
//! prefix of the current file and the name of the current function (the
//! namespace of flow-control labels). In directory mode one writer serves
//! all files, which is what keeps generated labels globally unique.
//!
//! Generated labels are `$CMP<n>.TRUE` / `$CMP<n>.END` (comparisons) and
//! `$RET<n>` (return addresses). User labels expand to
//! `<function>$<label>`; since function names are never empty, the two
//! shapes cannot collide.

use log::trace;

use super::command::{Command, Segment};

/// Emits Hack assembly lines for VM commands.
#[derive(Debug, Default)]
pub struct CodeWriter {
    lines: Vec<String>,
    label_count: usize,
    statics: String,
    function: String,
}

impl CodeWriter {
    pub fn new() -> Self {
        CodeWriter::default()
    }
    /// Start a new input file: `static k` now compiles to `<stem>.k`.
    pub fn set_unit(&mut self, stem: &str) {
        self.statics = stem.to_string();
    }
    /// The lines emitted so far.
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    fn emit(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }
    pub fn comment(&mut self, text: &str) {
        self.emit(format!("// {}", text));
    }
    fn fresh_label_number(&mut self) -> usize {
        self.label_count += 1;
        self.label_count
    }
    /// Expand a flow-control label to its per-function namespace.
    fn flow_label(&self, label: &str) -> String {
        if self.function.is_empty() {
            label.to_string()
        } else {
            format!("{}${}", self.function, label)
        }
    }

    /// Write one command, preceded by its wire text as a comment.
    pub fn write(&mut self, command: &Command) {
        trace!("lowering `{}`", command);
        self.comment(&command.to_string());
        match command {
            Command::Push(segment, index) => self.push(*segment, *index),
            Command::Pop(segment, index) => self.pop(*segment, *index),
            Command::Add => self.binary("M=D+M"),
            Command::Sub => self.binary("M=M-D"),
            Command::And => self.binary("M=D&M"),
            Command::Or => self.binary("M=D|M"),
            Command::Neg => self.unary("M=-M"),
            Command::Not => self.unary("M=!M"),
            Command::Eq => self.compare("JEQ"),
            Command::Gt => self.compare("JGT"),
            Command::Lt => self.compare("JLT"),
            Command::Label(label) => {
                let label = self.flow_label(label);
                self.label(&label);
            }
            Command::Goto(label) => {
                let label = self.flow_label(label);
                self.goto(&label);
            }
            Command::IfGoto(label) => {
                let label = self.flow_label(label);
                self.pop_d();
                self.emit(format!("@{}", label));
                self.emit("D;JNE");
            }
            Command::Function(name, locals) => self.start_function(name, *locals),
            Command::Call(name, args) => self.call(name, *args),
            Command::Return => self.ret(),
        }
    }

    /// Emit `SP = 256` and the call to `Sys.init`.
    pub fn bootstrap(&mut self) {
        self.comment("bootstrap");
        self.emit("@256");
        self.emit("D=A");
        self.emit("@SP");
        self.emit("M=D");
        self.comment("call Sys.init 0");
        self.call("Sys.init", 0);
    }

    /// `*SP = D; SP += 1`
    fn push_d(&mut self) {
        self.emit("@SP");
        self.emit("M=M+1");
        self.emit("A=M-1");
        self.emit("M=D");
    }
    /// `SP -= 1; D = *SP`
    fn pop_d(&mut self) {
        self.emit("@SP");
        self.emit("AM=M-1");
        self.emit("D=M");
    }

    fn push(&mut self, segment: Segment, index: u16) {
        match segment {
            Segment::Constant => {
                self.emit(format!("@{}", index));
                self.emit("D=A");
                self.push_d();
            }
            Segment::Pointer => self.push_address(&format!("R{}", 3 + index)),
            Segment::Temp => self.push_address(&format!("R{}", 5 + index)),
            Segment::Static => self.push_address(&format!("{}.{}", self.statics, index)),
            _ => {
                let register = segment.register().expect("a register-relative segment");
                self.emit(format!("@{}", register));
                self.emit("D=M");
                self.emit(format!("@{}", index));
                self.emit("A=D+A");
                self.emit("D=M");
                self.push_d();
            }
        }
    }
    /// Push the word stored at a directly addressable symbol.
    fn push_address(&mut self, symbol: &str) {
        self.emit(format!("@{}", symbol));
        self.emit("D=M");
        self.push_d();
    }

    fn pop(&mut self, segment: Segment, index: u16) {
        match segment {
            Segment::Constant => unreachable!("rejected while parsing"),
            Segment::Pointer => self.pop_address(&format!("R{}", 3 + index)),
            Segment::Temp => self.pop_address(&format!("R{}", 5 + index)),
            Segment::Static => self.pop_address(&format!("{}.{}", self.statics, index)),
            _ => {
                // R13 = base + index, then *R13 = pop().
                let register = segment.register().expect("a register-relative segment");
                self.emit(format!("@{}", register));
                self.emit("D=M");
                self.emit(format!("@{}", index));
                self.emit("D=D+A");
                self.emit("@R13");
                self.emit("M=D");
                self.pop_d();
                self.emit("@R13");
                self.emit("A=M");
                self.emit("M=D");
            }
        }
    }
    fn pop_address(&mut self, symbol: &str) {
        self.pop_d();
        self.emit(format!("@{}", symbol));
        self.emit("M=D");
    }

    /// Two-operand operation: y into D, then combine into x's cell.
    fn binary(&mut self, operation: &str) {
        self.emit("@SP");
        self.emit("AM=M-1");
        self.emit("D=M");
        self.emit("A=A-1");
        self.emit(operation);
    }
    fn unary(&mut self, operation: &str) {
        self.emit("@SP");
        self.emit("A=M-1");
        self.emit(operation);
    }

    /// `x - y`, branch on `jump`, push all-ones for true and zero for false.
    fn compare(&mut self, jump: &str) {
        let nr = self.fresh_label_number();
        let true_label = format!("$CMP{}.TRUE", nr);
        let end_label = format!("$CMP{}.END", nr);
        self.emit("@SP");
        self.emit("AM=M-1");
        self.emit("D=M");
        self.emit("A=A-1");
        self.emit("D=M-D");
        self.emit(format!("@{}", true_label));
        self.emit(format!("D;{}", jump));
        self.emit("@SP");
        self.emit("A=M-1");
        self.emit("M=0");
        self.goto(&end_label);
        self.label(&true_label);
        self.emit("@SP");
        self.emit("A=M-1");
        self.emit("M=-1");
        self.label(&end_label);
    }

    fn label(&mut self, label: &str) {
        self.emit(format!("({})", label));
    }
    fn goto(&mut self, label: &str) {
        self.emit(format!("@{}", label));
        self.emit("0;JMP");
    }

    fn call(&mut self, name: &str, args: u16) {
        let return_label = format!("$RET{}", self.fresh_label_number());
        // Push the return address and the caller's frame.
        self.emit(format!("@{}", return_label));
        self.emit("D=A");
        self.push_d();
        for register in &["LCL", "ARG", "THIS", "THAT"] {
            self.emit(format!("@{}", register));
            self.emit("D=M");
            self.push_d();
        }
        // ARG = SP - args - 5
        self.emit("@SP");
        self.emit("D=M");
        self.emit(format!("@{}", args + 5));
        self.emit("D=D-A");
        self.emit("@ARG");
        self.emit("M=D");
        // LCL = SP
        self.emit("@SP");
        self.emit("D=M");
        self.emit("@LCL");
        self.emit("M=D");
        self.goto(name);
        self.label(&return_label);
    }

    fn start_function(&mut self, name: &str, locals: u16) {
        self.function = name.to_string();
        self.label(name);
        if locals > 0 {
            self.emit("D=0");
            for _ in 0..locals {
                self.push_d();
            }
        }
    }

    fn ret(&mut self) {
        // R13 = LCL (the frame pointer)
        self.emit("@LCL");
        self.emit("D=M");
        self.emit("@R13");
        self.emit("M=D");
        // R14 = *(frame - 5). The return address must be captured before
        // *ARG is overwritten: with zero arguments ARG points at it.
        self.emit("@5");
        self.emit("A=D-A");
        self.emit("D=M");
        self.emit("@R14");
        self.emit("M=D");
        // *ARG = pop()
        self.pop_d();
        self.emit("@ARG");
        self.emit("A=M");
        self.emit("M=D");
        // SP = ARG + 1
        self.emit("@ARG");
        self.emit("D=M+1");
        self.emit("@SP");
        self.emit("M=D");
        // Restore the caller's frame, walking down from frame - 1.
        for register in &["THAT", "THIS", "ARG", "LCL"] {
            self.emit("@R13");
            self.emit("AM=M-1");
            self.emit("D=M");
            self.emit(format!("@{}", register));
            self.emit("M=D");
        }
        // goto R14
        self.emit("@R14");
        self.emit("A=M");
        self.emit("0;JMP");
    }
}
