//! A structured emitter for Toit source text.
//!
//! Every construct that spans more than a single token is opened and closed with a pair of
//! `start_*`/`end_*` calls. The writer tracks the open constructs on a stack and derives the
//! indentation of every line from it: bodies of classes, functions and blocks are indented by
//! two spaces relative to the line that opened them, and continuation lines of an expression
//! by four.

use std::fmt;

use thiserror::Error;

const BODY_INDENT: usize = 2;
const CONTINUATION_INDENT: usize = 4;

/// A construct that can be open in a [`CodeWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Class,
    FunctionDecl,
    Function,
    ConstructorDecl,
    Constructor,
    Call,
    Block,
    ParensBlock,
    Parens,
    Assignment,
    Return,
}

impl Scope {
    /// Whether the body of this construct is a sequence of statements.
    fn holds_statements(scope: Option<Scope>) -> bool {
        matches!(
            scope,
            None | Some(
                Scope::Class
                    | Scope::Function
                    | Scope::Constructor
                    | Scope::Block
                    | Scope::ParensBlock
            )
        )
    }

    fn holds_expressions(scope: Option<Scope>) -> bool {
        matches!(
            scope,
            Some(Scope::Call | Scope::Parens | Scope::Assignment | Scope::Return)
        )
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Class => f.write_str("class"),
            Scope::FunctionDecl => f.write_str("function declaration"),
            Scope::Function => f.write_str("function"),
            Scope::ConstructorDecl => f.write_str("constructor declaration"),
            Scope::Constructor => f.write_str("constructor"),
            Scope::Call => f.write_str("call"),
            Scope::Block => f.write_str("block"),
            Scope::ParensBlock => f.write_str("parenthesized block"),
            Scope::Parens => f.write_str("parenthesized expression"),
            Scope::Assignment => f.write_str("assignment"),
            Scope::Return => f.write_str("return statement"),
        }
    }
}

/// A construct was opened or closed out of order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    #[error("cannot end {expected} while a {found} is open")]
    Mismatched { expected: Scope, found: Scope },
    #[error("cannot end {expected} because nothing is open")]
    NothingOpen { expected: Scope },
    #[error("'{op}' is not allowed {}", location(.scope))]
    Misplaced {
        op: &'static str,
        scope: Option<Scope>,
    },
    #[error("{0} was never closed")]
    Unclosed(Scope),
}

fn location(scope: &Option<Scope>) -> String {
    match scope {
        Some(scope) => format!("inside a {}", scope),
        None => "at the top level".to_owned(),
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    scope: Scope,
    /// The indentation of the line the construct was opened on.
    base: usize,
    /// The indentation of lines started inside the construct.
    indent: usize,
    parenthesized: bool,
}

#[derive(Debug, Default)]
pub struct CodeWriter {
    out: String,
    frames: Vec<Frame>,
    line_open: bool,
    line_indent: usize,
    need_space: bool,
}

impl CodeWriter {
    pub fn new() -> Self {
        CodeWriter::default()
    }

    /// Returns the generated text, failing if any construct is still open.
    pub fn finish(mut self) -> Result<String, WriteError> {
        if let Some(frame) = self.frames.last() {
            return Err(WriteError::Unclosed(frame.scope));
        }
        self.end_line();
        Ok(self.out)
    }

    pub fn comment(&mut self, text: &str) -> Result<(), WriteError> {
        self.require_statement("comment")?;
        self.begin_statement();
        self.write(&format!("// {}", text));
        self.end_line();
        Ok(())
    }

    /// Terminates the current line, if any.
    pub fn end_line(&mut self) {
        if self.line_open {
            self.out.push('\n');
            self.line_open = false;
            self.need_space = false;
        }
    }

    /// Terminates the current line, or emits an empty line if there is none.
    pub fn new_line(&mut self) {
        if self.line_open {
            self.end_line();
        } else {
            self.out.push('\n');
        }
    }

    pub fn import_as(&mut self, module: &str, alias: &str) -> Result<(), WriteError> {
        if self.top().is_some() {
            return Err(self.misplaced("import"));
        }
        self.begin_statement();
        self.write(&format!("import {} as {}", module, alias));
        self.end_line();
        Ok(())
    }

    /// Emits a module level constant `name/ty ::= value`.
    pub fn constant(&mut self, name: &str, ty: &str, value: &str) -> Result<(), WriteError> {
        if self.top().is_some() {
            return Err(self.misplaced("constant"));
        }
        self.begin_statement();
        self.declaration(name, ty, "::=", value);
        Ok(())
    }

    pub fn static_constant(&mut self, name: &str, ty: &str, value: &str) -> Result<(), WriteError> {
        if self.top() != Some(Scope::Class) {
            return Err(self.misplaced("static constant"));
        }
        self.begin_statement();
        self.write("static");
        self.declaration(name, ty, "::=", value);
        Ok(())
    }

    /// Emits `name/ty := value`, or `name := value` if `ty` is empty.
    pub fn variable(&mut self, name: &str, ty: &str, value: &str) -> Result<(), WriteError> {
        self.require_statement("variable")?;
        self.begin_statement();
        self.declaration(name, ty, ":=", value);
        Ok(())
    }

    /// Emits raw text, separated from the previous token by a space.
    pub fn literal(&mut self, text: &str) -> Result<(), WriteError> {
        let scope = self.top();
        if !Scope::holds_expressions(scope)
            && !matches!(
                scope,
                Some(Scope::Function | Scope::Constructor | Scope::Block | Scope::ParensBlock)
            )
        {
            return Err(self.misplaced("literal"));
        }
        self.write(text);
        Ok(())
    }

    pub fn argument(&mut self, value: &str) -> Result<(), WriteError> {
        self.require_expression("argument")?;
        self.write(value);
        Ok(())
    }

    /// Emits `--name=value`, or the flag `--name` if there is no value.
    pub fn named_argument(&mut self, name: &str, value: Option<&str>) -> Result<(), WriteError> {
        self.require_expression("named argument")?;
        match value {
            Some(value) => self.write(&format!("--{}={}", name, value)),
            None => self.write(&format!("--{}", name)),
        }
        Ok(())
    }

    /// Emits `(condition ? then : otherwise)`.
    pub fn condition_expression(
        &mut self,
        condition: &str,
        then: &str,
        otherwise: &str,
    ) -> Result<(), WriteError> {
        self.require_expression("condition expression")?;
        self.write(&format!("({} ? {} : {})", condition, then, otherwise));
        Ok(())
    }

    pub fn start_class(&mut self, name: &str, extends: Option<&str>) -> Result<(), WriteError> {
        if self.top().is_some() {
            return Err(self.misplaced("class"));
        }
        self.begin_statement();
        match extends {
            Some(parent) => self.write(&format!("class {} extends {}:", name, parent)),
            None => self.write(&format!("class {}:", name)),
        }
        self.end_line();
        self.push_body(Scope::Class, self.line_indent);
        Ok(())
    }

    pub fn end_class(&mut self) -> Result<(), WriteError> {
        self.pop(Scope::Class)?;
        self.end_line();
        Ok(())
    }

    pub fn start_function_decl(&mut self, name: &str) -> Result<(), WriteError> {
        self.start_decl("function", Scope::FunctionDecl, &[name])
    }

    pub fn start_static_function_decl(&mut self, name: &str) -> Result<(), WriteError> {
        self.start_decl("static function", Scope::FunctionDecl, &["static", name])
    }

    /// Emits the parameter `name/ty`, or `name` if `ty` is empty.
    pub fn parameter(&mut self, name: &str, ty: &str) -> Result<(), WriteError> {
        self.require_decl("parameter")?;
        if ty.is_empty() {
            self.write(name);
        } else {
            self.write(&format!("{}/{}", name, ty));
        }
        Ok(())
    }

    pub fn parameter_with_default(
        &mut self,
        name: &str,
        ty: &str,
        default: &str,
    ) -> Result<(), WriteError> {
        self.require_decl("parameter")?;
        self.write(&format!("{}/{}={}", name, ty, default));
        Ok(())
    }

    /// Ends the signature with `-> ret:`, or just `:` if `ret` is empty, and opens the body.
    pub fn end_function_decl(&mut self, ret: &str) -> Result<(), WriteError> {
        let frame = self.pop(Scope::FunctionDecl)?;
        if !ret.is_empty() {
            self.write(&format!("-> {}", ret));
        }
        self.append(":");
        self.end_line();
        self.push_body(Scope::Function, frame.base);
        Ok(())
    }

    pub fn end_function(&mut self) -> Result<(), WriteError> {
        self.pop(Scope::Function)?;
        self.end_line();
        self.new_line();
        Ok(())
    }

    /// Starts `constructor`, or the named constructor `constructor.name`.
    pub fn start_constructor_decl(&mut self, name: Option<&str>) -> Result<(), WriteError> {
        if self.top() != Some(Scope::Class) {
            return Err(self.misplaced("constructor"));
        }
        let keyword = match name {
            Some(name) => format!("constructor.{}", name),
            None => "constructor".to_owned(),
        };
        self.start_decl("constructor", Scope::ConstructorDecl, &[keyword.as_str()])
    }

    pub fn end_constructor_decl(&mut self) -> Result<(), WriteError> {
        let frame = self.pop(Scope::ConstructorDecl)?;
        self.append(":");
        self.end_line();
        self.push_body(Scope::Constructor, frame.base);
        Ok(())
    }

    pub fn end_constructor(&mut self) -> Result<(), WriteError> {
        self.pop(Scope::Constructor)?;
        self.end_line();
        self.new_line();
        Ok(())
    }

    /// Starts a call of `name`.
    ///
    /// A call that starts on the same line as the arguments of an enclosing call is wrapped in
    /// parentheses.
    pub fn start_call(&mut self, name: &str) -> Result<(), WriteError> {
        let scope = self.top();
        let parenthesized = scope == Some(Scope::Call) && self.line_open;
        if Scope::holds_statements(scope) {
            if matches!(scope, None | Some(Scope::Class)) {
                return Err(self.misplaced("call"));
            }
            self.begin_statement();
        } else if !Scope::holds_expressions(scope) {
            return Err(self.misplaced("call"));
        }

        if parenthesized {
            self.begin_token();
            self.out.push('(');
            self.need_space = false;
        }
        self.write(name);
        self.push_continuation(Scope::Call, parenthesized);
        Ok(())
    }

    pub fn end_call(&mut self) -> Result<(), WriteError> {
        let frame = self.pop(Scope::Call)?;
        if frame.parenthesized {
            self.append(")");
        }
        self.end_statement();
        Ok(())
    }

    /// Opens a block argument `: | params |` at the end of the current line.
    pub fn start_block(&mut self, params: &[&str]) -> Result<(), WriteError> {
        if self.top() != Some(Scope::Call) {
            return Err(self.misplaced("block"));
        }
        self.append(":");
        if !params.is_empty() {
            self.append(&format!(" | {} |", params.join(" ")));
        }
        self.end_line();
        self.push_body(Scope::Block, self.line_indent);
        Ok(())
    }

    /// Opens a block argument `(: | params |` on a continuation line of the enclosing call.
    pub fn start_parens_block(&mut self, params: &[&str]) -> Result<(), WriteError> {
        if self.top() != Some(Scope::Call) {
            return Err(self.misplaced("parenthesized block"));
        }
        self.end_line();
        if params.is_empty() {
            self.write("(:");
        } else {
            self.write(&format!("(: | {} |", params.join(" ")));
        }
        self.end_line();
        self.push_body(Scope::ParensBlock, self.line_indent);
        Ok(())
    }

    /// Ends a block opened by [`start_block`](Self::start_block) or
    /// [`start_parens_block`](Self::start_parens_block).
    pub fn end_block(&mut self) -> Result<(), WriteError> {
        let scope = match self.top() {
            Some(Scope::ParensBlock) => Scope::ParensBlock,
            _ => Scope::Block,
        };
        let frame = self.pop(scope)?;
        self.end_line();
        if frame.scope == Scope::ParensBlock {
            self.append(")");
        }
        Ok(())
    }

    pub fn start_parens(&mut self) -> Result<(), WriteError> {
        self.require_expression("parentheses")?;
        self.begin_token();
        self.out.push('(');
        self.need_space = false;
        self.push_continuation(Scope::Parens, true);
        Ok(())
    }

    pub fn end_parens(&mut self) -> Result<(), WriteError> {
        self.pop(Scope::Parens)?;
        self.append(")");
        Ok(())
    }

    pub fn start_assignment(&mut self, target: &str) -> Result<(), WriteError> {
        self.require_body("assignment")?;
        self.begin_statement();
        self.write(target);
        self.write("=");
        self.push_continuation(Scope::Assignment, false);
        Ok(())
    }

    pub fn end_assignment(&mut self) -> Result<(), WriteError> {
        self.pop(Scope::Assignment)?;
        self.end_statement();
        Ok(())
    }

    pub fn start_return(&mut self) -> Result<(), WriteError> {
        self.require_body("return")?;
        self.begin_statement();
        self.write("return");
        self.push_continuation(Scope::Return, false);
        Ok(())
    }

    pub fn end_return(&mut self) -> Result<(), WriteError> {
        self.pop(Scope::Return)?;
        self.end_statement();
        Ok(())
    }

    fn start_decl(
        &mut self,
        op: &'static str,
        scope: Scope,
        words: &[&str],
    ) -> Result<(), WriteError> {
        if !matches!(self.top(), None | Some(Scope::Class)) {
            return Err(self.misplaced(op));
        }
        self.begin_statement();
        for word in words {
            self.write(word);
        }
        self.push_continuation(scope, false);
        Ok(())
    }

    fn declaration(&mut self, name: &str, ty: &str, op: &str, value: &str) {
        if ty.is_empty() {
            self.write(name);
        } else {
            self.write(&format!("{}/{}", name, ty));
        }
        self.write(op);
        self.write(value);
        self.end_line();
    }

    fn top(&self) -> Option<Scope> {
        self.frames.last().map(|frame| frame.scope)
    }

    fn indent(&self) -> usize {
        self.frames.last().map_or(0, |frame| frame.indent)
    }

    fn misplaced(&self, op: &'static str) -> WriteError {
        WriteError::Misplaced {
            op,
            scope: self.top(),
        }
    }

    fn require_statement(&self, op: &'static str) -> Result<(), WriteError> {
        if Scope::holds_statements(self.top()) {
            Ok(())
        } else {
            Err(self.misplaced(op))
        }
    }

    fn require_body(&self, op: &'static str) -> Result<(), WriteError> {
        match self.top() {
            Some(Scope::Function | Scope::Constructor | Scope::Block | Scope::ParensBlock) => Ok(()),
            _ => Err(self.misplaced(op)),
        }
    }

    fn require_expression(&self, op: &'static str) -> Result<(), WriteError> {
        if Scope::holds_expressions(self.top()) {
            Ok(())
        } else {
            Err(self.misplaced(op))
        }
    }

    fn require_decl(&self, op: &'static str) -> Result<(), WriteError> {
        match self.top() {
            Some(Scope::FunctionDecl | Scope::ConstructorDecl) => Ok(()),
            _ => Err(self.misplaced(op)),
        }
    }

    fn push_body(&mut self, scope: Scope, base: usize) {
        self.frames.push(Frame {
            scope,
            base,
            indent: base + BODY_INDENT,
            parenthesized: false,
        });
    }

    fn push_continuation(&mut self, scope: Scope, parenthesized: bool) {
        let base = self.line_indent;
        self.frames.push(Frame {
            scope,
            base,
            indent: base + CONTINUATION_INDENT,
            parenthesized,
        });
    }

    fn pop(&mut self, expected: Scope) -> Result<Frame, WriteError> {
        let frame = self
            .frames
            .pop()
            .ok_or(WriteError::NothingOpen { expected })?;
        if frame.scope != expected {
            self.frames.push(frame);
            return Err(WriteError::Mismatched {
                expected,
                found: frame.scope,
            });
        }
        Ok(frame)
    }

    /// Statements always start on a line of their own.
    fn begin_statement(&mut self) {
        self.end_line();
    }

    /// Terminates the line if the innermost construct holds statements.
    fn end_statement(&mut self) {
        if Scope::holds_statements(self.top()) {
            self.end_line();
        }
    }

    fn begin_token(&mut self) {
        if !self.line_open {
            let indent = self.indent();
            self.out.extend(std::iter::repeat(' ').take(indent));
            self.line_indent = indent;
            self.line_open = true;
        } else if self.need_space {
            self.out.push(' ');
        }
        self.need_space = false;
    }

    fn write(&mut self, text: &str) {
        self.begin_token();
        self.out.push_str(text);
        self.need_space = true;
    }

    /// Appends text directly to the last line, even if it was already terminated.
    fn append(&mut self, text: &str) {
        if self.line_open || !self.out.ends_with('\n') {
            self.out.push_str(text);
        } else {
            let end = self.out.len() - 1;
            self.out.insert_str(end, text);
        }
        self.need_space = true;
    }
}
