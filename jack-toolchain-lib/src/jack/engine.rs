//! Recursive-descent compilation of a Jack class.
//!
//! The engine walks the LL(1) grammar directly, keeps the two symbol scopes
//! current and appends [`Command`]s as it recognises productions. Nothing is
//! serialized here; the caller turns the command list into `.vm` text.

use log::debug;

use crate::error::{Result, TranslateError};
use crate::lexer::{Lexer, TokenKind};
use crate::vm::{Command, Segment};

use super::symbols::{Entry, SymbolTable};
use super::SYNTAX;

/// The infix operators of the expression grammar. There is no precedence:
/// chains evaluate strictly left to right.
const OPERATORS: &str = "+-*/&|<>=";

/// Compiler for a single Jack class (one compilation unit).
pub struct CompilationEngine<'a> {
    lexer: Lexer<'a>,
    class_name: String,
    class_symbols: SymbolTable,
    subroutine_symbols: SymbolTable,
    label_count: usize,
    code: Vec<Command>,
}

impl<'a> CompilationEngine<'a> {
    pub fn new(source: &'a str) -> Self {
        CompilationEngine {
            lexer: Lexer::new(source, &SYNTAX),
            class_name: String::new(),
            class_symbols: SymbolTable::new(),
            subroutine_symbols: SymbolTable::new(),
            label_count: 0,
            code: vec![],
        }
    }

    /// Compile the class and return the generated code.
    pub fn compile(mut self) -> Result<Vec<Command>> {
        self.lexer.advance()?;
        self.compile_class()?;
        if self.lexer.peek().is_some() {
            return Err(self.mismatch("end of input"));
        }
        Ok(self.code)
    }

    // ------------------------------------------------------------------
    // Token plumbing

    fn emit(&mut self, command: Command) {
        self.code.push(command);
    }
    fn fresh_label(&mut self) -> String {
        self.label_count += 1;
        format!("L{}", self.label_count)
    }
    /// Line of the current token, for error context.
    fn line(&self) -> usize {
        self.lexer.peek().map(|token| token.line).unwrap_or(0)
    }
    fn advance(&mut self) -> Result<()> {
        self.lexer.advance()?;
        Ok(())
    }
    fn mismatch(&self, expected: &str) -> TranslateError {
        match self.lexer.peek() {
            Some(token) => TranslateError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.text.clone(),
                line: token.line,
            },
            None => TranslateError::UnexpectedEndOfInput,
        }
    }
    fn at(&self, kind: TokenKind, text: &str) -> bool {
        matches!(self.lexer.peek(), Some(token) if token.is(kind, text))
    }
    fn at_keyword(&self, keyword: &str) -> bool {
        self.at(TokenKind::Keyword, keyword)
    }
    fn at_symbol(&self, symbol: char) -> bool {
        matches!(
            self.lexer.peek(),
            Some(token) if token.kind == TokenKind::Symbol && token.text.starts_with(symbol)
        )
    }
    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.at_keyword(keyword) {
            self.advance()
        } else {
            Err(self.mismatch(&format!("`{}`", keyword)))
        }
    }
    fn expect_symbol(&mut self, symbol: char) -> Result<()> {
        if self.at_symbol(symbol) {
            self.advance()
        } else {
            Err(self.mismatch(&format!("`{}`", symbol)))
        }
    }
    /// Consume `symbol` if it is current.
    fn eat_symbol(&mut self, symbol: char) -> Result<bool> {
        if self.at_symbol(symbol) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
    fn expect_identifier(&mut self) -> Result<String> {
        let text = match self.lexer.peek() {
            Some(token) if token.kind == TokenKind::Ident => token.text.clone(),
            _ => return Err(self.mismatch("an identifier")),
        };
        self.advance()?;
        Ok(text)
    }
    /// A type name: `int | char | boolean | void` or a class identifier.
    fn expect_type(&mut self) -> Result<String> {
        let text = match self.lexer.peek() {
            Some(token)
                if token.kind == TokenKind::Ident
                    || (token.kind == TokenKind::Keyword
                        && ["int", "char", "boolean", "void"].contains(&token.text.as_str())) =>
            {
                token.text.clone()
            }
            _ => return Err(self.mismatch("a type")),
        };
        self.advance()?;
        Ok(text)
    }

    /// Look a name up, subroutine scope shadowing class scope.
    fn lookup(&self, name: &str) -> Option<Entry> {
        self.subroutine_symbols
            .get(name)
            .or_else(|| self.class_symbols.get(name))
            .cloned()
    }
    fn resolve(&self, name: &str, line: usize) -> Result<Entry> {
        self.lookup(name).ok_or_else(|| TranslateError::UnknownSymbol {
            name: name.to_string(),
            line,
        })
    }

    // ------------------------------------------------------------------
    // Program structure

    fn compile_class(&mut self) -> Result<()> {
        self.expect_keyword("class")?;
        self.class_name = self.expect_identifier()?;
        debug!("compiling class `{}`", self.class_name);
        self.expect_symbol('{')?;
        while self.at_keyword("static") || self.at_keyword("field") {
            self.compile_class_var_dec()?;
        }
        while self.at_keyword("constructor")
            || self.at_keyword("function")
            || self.at_keyword("method")
        {
            self.compile_subroutine()?;
        }
        self.expect_symbol('}')
    }

    fn compile_class_var_dec(&mut self) -> Result<()> {
        let segment = if self.at_keyword("static") {
            Segment::Static
        } else {
            Segment::This
        };
        self.advance()?; // static | field
        let typ = self.expect_type()?;
        loop {
            let name = self.expect_identifier()?;
            self.class_symbols.define(&name, &typ, segment);
            if !self.eat_symbol(',')? {
                break;
            }
        }
        self.expect_symbol(';')
    }

    fn compile_subroutine(&mut self) -> Result<()> {
        self.subroutine_symbols = SymbolTable::new();
        let kind = match self.lexer.peek() {
            Some(token) => token.text.clone(),
            None => return Err(TranslateError::UnexpectedEndOfInput),
        };
        self.advance()?; // constructor | function | method
        let _return_type = self.expect_type()?;
        let name = self.expect_identifier()?;
        if kind == "method" {
            // Slot 0 of the argument segment is the receiver.
            let class_name = self.class_name.clone();
            self.subroutine_symbols
                .define("this", &class_name, Segment::Argument);
        }
        self.expect_symbol('(')?;
        self.compile_parameter_list()?;
        self.expect_symbol(')')?;
        self.compile_subroutine_body(&kind, &name)
    }

    fn compile_parameter_list(&mut self) -> Result<()> {
        if self.at_symbol(')') {
            return Ok(());
        }
        loop {
            let typ = self.expect_type()?;
            let name = self.expect_identifier()?;
            self.subroutine_symbols.define(&name, &typ, Segment::Argument);
            if !self.eat_symbol(',')? {
                break;
            }
        }
        Ok(())
    }

    fn compile_subroutine_body(&mut self, kind: &str, name: &str) -> Result<()> {
        self.expect_symbol('{')?;
        while self.at_keyword("var") {
            self.compile_var_dec()?;
        }
        let locals = self.subroutine_symbols.count(Segment::Local);
        self.emit(Command::Function(
            format!("{}.{}", self.class_name, name),
            locals,
        ));
        match kind {
            "constructor" => {
                // Allocate the new object and bind it to `this`.
                let fields = self.class_symbols.count(Segment::This);
                self.emit(Command::Push(Segment::Constant, fields));
                self.emit(Command::Call("Memory.alloc".to_string(), 1));
                self.emit(Command::Pop(Segment::Pointer, 0));
            }
            "method" => {
                // Bind the receiver passed in argument 0.
                self.emit(Command::Push(Segment::Argument, 0));
                self.emit(Command::Pop(Segment::Pointer, 0));
            }
            _ => {}
        }
        self.compile_statements()?;
        self.expect_symbol('}')?;
        // Every path must leave through `return`; guarantee the opcode even
        // if the source forgot the final statement.
        if self.code.last() != Some(&Command::Return) {
            self.emit(Command::Push(Segment::Constant, 0));
            self.emit(Command::Return);
        }
        Ok(())
    }

    fn compile_var_dec(&mut self) -> Result<()> {
        self.expect_keyword("var")?;
        let typ = self.expect_type()?;
        loop {
            let name = self.expect_identifier()?;
            self.subroutine_symbols.define(&name, &typ, Segment::Local);
            if !self.eat_symbol(',')? {
                break;
            }
        }
        self.expect_symbol(';')
    }

    // ------------------------------------------------------------------
    // Statements

    fn compile_statements(&mut self) -> Result<()> {
        loop {
            if self.at_keyword("let") {
                self.compile_let()?;
            } else if self.at_keyword("if") {
                self.compile_if()?;
            } else if self.at_keyword("while") {
                self.compile_while()?;
            } else if self.at_keyword("do") {
                self.compile_do()?;
            } else if self.at_keyword("return") {
                self.compile_return()?;
            } else {
                return Ok(());
            }
        }
    }

    fn compile_let(&mut self) -> Result<()> {
        self.expect_keyword("let")?;
        let line = self.line();
        let name = self.expect_identifier()?;
        let target = self.resolve(&name, line)?;
        let is_array = self.eat_symbol('[')?;
        if is_array {
            // Leave the element address on the stack for later.
            self.emit(Command::Push(target.segment, target.index));
            self.compile_expression()?;
            self.expect_symbol(']')?;
            self.emit(Command::Add);
        }
        self.expect_symbol('=')?;
        self.compile_expression()?;
        self.expect_symbol(';')?;
        if is_array {
            self.emit(Command::Pop(Segment::Temp, 0));
            self.emit(Command::Pop(Segment::Pointer, 1));
            self.emit(Command::Push(Segment::Temp, 0));
            self.emit(Command::Pop(Segment::That, 0));
        } else {
            self.emit(Command::Pop(target.segment, target.index));
        }
        Ok(())
    }

    fn compile_if(&mut self) -> Result<()> {
        let else_label = self.fresh_label();
        let end_label = self.fresh_label();
        self.expect_keyword("if")?;
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;
        self.emit(Command::Not);
        self.emit(Command::IfGoto(else_label.clone()));
        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;
        self.emit(Command::Goto(end_label.clone()));
        self.emit(Command::Label(else_label));
        if self.at_keyword("else") {
            self.advance()?;
            self.expect_symbol('{')?;
            self.compile_statements()?;
            self.expect_symbol('}')?;
        }
        self.emit(Command::Label(end_label));
        Ok(())
    }

    fn compile_while(&mut self) -> Result<()> {
        let top_label = self.fresh_label();
        let end_label = self.fresh_label();
        self.emit(Command::Label(top_label.clone()));
        self.expect_keyword("while")?;
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;
        self.emit(Command::Not);
        self.emit(Command::IfGoto(end_label.clone()));
        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;
        self.emit(Command::Goto(top_label));
        self.emit(Command::Label(end_label));
        Ok(())
    }

    fn compile_do(&mut self) -> Result<()> {
        self.expect_keyword("do")?;
        let name = self.expect_identifier()?;
        self.compile_subroutine_call(name)?;
        self.expect_symbol(';')?;
        // Discard the return value.
        self.emit(Command::Pop(Segment::Temp, 0));
        Ok(())
    }

    fn compile_return(&mut self) -> Result<()> {
        self.expect_keyword("return")?;
        if self.at_symbol(';') {
            // Dummy return value.
            self.emit(Command::Push(Segment::Constant, 0));
        } else {
            self.compile_expression()?;
        }
        self.expect_symbol(';')?;
        self.emit(Command::Return);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Expressions

    fn compile_expression(&mut self) -> Result<()> {
        self.compile_term()?;
        // Left-to-right chaining, no precedence: `1+2*3` is `(1+2)*3`.
        while let Some(op) = self.current_operator() {
            self.advance()?;
            self.compile_term()?;
            self.emit_operator(op);
        }
        Ok(())
    }

    fn current_operator(&self) -> Option<char> {
        let token = self.lexer.peek()?;
        if token.kind != TokenKind::Symbol {
            return None;
        }
        let symbol = token.text.chars().next()?;
        if OPERATORS.contains(symbol) {
            Some(symbol)
        } else {
            None
        }
    }

    fn emit_operator(&mut self, op: char) {
        let command = match op {
            '+' => Command::Add,
            '-' => Command::Sub,
            '*' => Command::Call("Math.multiply".to_string(), 2),
            '/' => Command::Call("Math.divide".to_string(), 2),
            '&' => Command::And,
            '|' => Command::Or,
            '<' => Command::Lt,
            '>' => Command::Gt,
            '=' => Command::Eq,
            _ => unreachable!("operator set is fixed"),
        };
        self.emit(command);
    }

    fn compile_term(&mut self) -> Result<()> {
        let token = match self.lexer.peek() {
            Some(token) => token.clone(),
            None => return Err(TranslateError::UnexpectedEndOfInput),
        };
        match token.kind {
            TokenKind::IntConst => {
                let value = token
                    .text
                    .parse()
                    .expect("infallible. The lexer range-checks integers");
                self.advance()?;
                self.emit(Command::Push(Segment::Constant, value));
            }
            TokenKind::StrConst => {
                self.advance()?;
                self.emit(Command::Push(Segment::Constant, token.text.len() as u16));
                self.emit(Command::Call("String.new".to_string(), 1));
                for ch in token.text.chars() {
                    self.emit(Command::Push(Segment::Constant, ch as u16));
                    self.emit(Command::Call("String.appendChar".to_string(), 2));
                }
            }
            TokenKind::Keyword => match token.text.as_str() {
                "true" => {
                    self.advance()?;
                    // -1, all bits set.
                    self.emit(Command::Push(Segment::Constant, 1));
                    self.emit(Command::Neg);
                }
                "false" | "null" => {
                    self.advance()?;
                    self.emit(Command::Push(Segment::Constant, 0));
                }
                "this" => {
                    self.advance()?;
                    self.emit(Command::Push(Segment::Pointer, 0));
                }
                _ => return Err(self.mismatch("a term")),
            },
            TokenKind::Symbol => match token.text.as_str() {
                "-" => {
                    self.advance()?;
                    self.compile_term()?;
                    self.emit(Command::Neg);
                }
                "~" => {
                    self.advance()?;
                    self.compile_term()?;
                    self.emit(Command::Not);
                }
                "(" => {
                    self.advance()?;
                    self.compile_expression()?;
                    self.expect_symbol(')')?;
                }
                _ => return Err(self.mismatch("a term")),
            },
            TokenKind::Ident => {
                let name = token.text;
                self.advance()?;
                if self.at_symbol('(') || self.at_symbol('.') {
                    self.compile_subroutine_call(name)?;
                } else {
                    let entry = self.resolve(&name, token.line)?;
                    self.emit(Command::Push(entry.segment, entry.index));
                    if self.eat_symbol('[')? {
                        self.compile_expression()?;
                        self.expect_symbol(']')?;
                        self.emit(Command::Add);
                        self.emit(Command::Pop(Segment::Pointer, 1));
                        self.emit(Command::Push(Segment::That, 0));
                    }
                }
            }
        }
        Ok(())
    }

    /// Compile a call whose leading identifier is already consumed.
    ///
    /// `name(...)` is a method call on the current object. `name.member(...)`
    /// is a method call if `name` resolves to a variable (the receiver is
    /// pushed and the variable's type names the class), otherwise a plain
    /// function or constructor call on the class `name`.
    fn compile_subroutine_call(&mut self, name: String) -> Result<()> {
        let (callee, receiver_args) = if self.eat_symbol('.')? {
            let member = self.expect_identifier()?;
            match self.lookup(&name) {
                Some(entry) => {
                    self.emit(Command::Push(entry.segment, entry.index));
                    (format!("{}.{}", entry.typ, member), 1)
                }
                None => (format!("{}.{}", name, member), 0),
            }
        } else {
            self.emit(Command::Push(Segment::Pointer, 0));
            (format!("{}.{}", self.class_name, name), 1)
        };
        self.expect_symbol('(')?;
        let args = receiver_args + self.compile_expression_list()?;
        self.expect_symbol(')')?;
        self.emit(Command::Call(callee, args));
        Ok(())
    }

    fn compile_expression_list(&mut self) -> Result<u16> {
        if self.at_symbol(')') {
            return Ok(0);
        }
        let mut count = 0;
        loop {
            self.compile_expression()?;
            count += 1;
            if !self.eat_symbol(',')? {
                break;
            }
        }
        Ok(count)
    }
}
