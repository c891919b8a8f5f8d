//! Statement renderer.
//!
//! Rendering a token stream runs in build contexts held on a stack. Each
//! build pushes a context, compiles every token into a fragment, links the
//! fragments into text and pops the context again. Compound conditions
//! render their operands through [`Renderer::nested`], which runs the same
//! cycle one level deeper.

mod compiler;
mod linker;

use serde::Serialize;
use tracing::{debug, trace};

use crate::dialect::Dialect;
use crate::error::Result;
use crate::token::{Sql, Token};
use crate::value::SqlValue;

/// Whether values are inlined or bound to placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompileMode {
    /// Values render as dialect literals.
    #[default]
    Direct,
    /// Values render as placeholders and are collected as bindings.
    Prepared,
}

/// Output of a prepared render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedSql {
    /// Statement text with dialect placeholders.
    pub sql: String,
    /// Values in placeholder order.
    pub bindings: Vec<SqlValue>,
    /// Number of column tokens in the statement.
    pub column_count: usize,
}

#[derive(Debug, Default)]
struct BuildContext {
    tokens: Vec<Token>,
    cursor: usize,
    fragments: Vec<compiler::Fragment>,
    result: String,
    bindings: Vec<SqlValue>,
}

/// Renders token streams for one dialect.
pub struct Renderer<'d> {
    dialect: &'d dyn Dialect,
    stack: Vec<BuildContext>,
    mode: CompileMode,
    bind_count: usize,
    column_count: usize,
}

impl<'d> Renderer<'d> {
    /// Creates a renderer for the given dialect.
    #[must_use]
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            stack: Vec::new(),
            mode: CompileMode::Direct,
            bind_count: 0,
            column_count: 0,
        }
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// Renders with values inlined as literals.
    pub fn direct(&mut self, sql: &Sql) -> Result<String> {
        let (text, _) = self.build(sql, CompileMode::Direct)?;
        Ok(text)
    }

    /// Renders with placeholders, collecting bindings in placeholder order.
    pub fn prepare(&mut self, sql: &Sql) -> Result<PreparedSql> {
        let (text, bindings) = self.build(sql, CompileMode::Prepared)?;
        Ok(PreparedSql {
            sql: text,
            bindings,
            column_count: self.column_count,
        })
    }

    /// Returns `true` while rendering in prepared mode.
    #[must_use]
    pub fn is_preparing(&self) -> bool {
        self.mode == CompileMode::Prepared
    }

    /// Number of placeholders emitted by the last build.
    #[must_use]
    pub const fn bind_count(&self) -> usize {
        self.bind_count
    }

    /// Number of column tokens visited by the last build.
    #[must_use]
    pub const fn column_count(&self) -> usize {
        self.column_count
    }

    /// Current build context depth; zero outside a build.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub(crate) fn inc_bind_count(&mut self) {
        self.bind_count += 1;
    }

    pub(crate) fn inc_column_count(&mut self) {
        self.column_count += 1;
    }

    /// Renders tokens in a nested build context, returning text and bindings.
    pub(crate) fn nested(&mut self, tokens: Vec<Token>) -> Result<(String, Vec<SqlValue>)> {
        let (text, bindings) = self.run(tokens, false)?;
        Ok((text.trim_end().to_owned(), bindings))
    }

    fn build(&mut self, sql: &Sql, mode: CompileMode) -> Result<(String, Vec<SqlValue>)> {
        self.mode = mode;
        self.bind_count = 0;
        self.column_count = 0;
        let (text, bindings) = self.run(sql.tokens().to_vec(), true)?;
        debug!(
            dialect = self.dialect.name(),
            sql = %text,
            bindings = bindings.len(),
            "rendered statement"
        );
        Ok((text, bindings))
    }

    fn run(&mut self, tokens: Vec<Token>, outermost: bool) -> Result<(String, Vec<SqlValue>)> {
        self.push(tokens);
        let compiled = self.compile();
        if compiled.is_ok() {
            self.link(outermost);
        }
        // The context is popped whether or not compilation succeeded.
        let context = self.pop();
        compiled?;
        Ok((context.result, context.bindings))
    }

    fn push(&mut self, tokens: Vec<Token>) {
        trace!(depth = self.stack.len() + 1, tokens = tokens.len(), "push build context");
        self.stack.push(BuildContext {
            tokens,
            ..BuildContext::default()
        });
    }

    fn pop(&mut self) -> BuildContext {
        let context = self.stack.pop().unwrap_or_default();
        trace!(depth = self.stack.len(), "pop build context");
        context
    }

    fn compile(&mut self) -> Result<()> {
        loop {
            let token = match self.stack.last_mut() {
                Some(context) if context.cursor < context.tokens.len() => {
                    context.cursor += 1;
                    context.tokens[context.cursor - 1].clone()
                }
                _ => return Ok(()),
            };
            let fragment = compiler::compile(self, &token)?;
            if let Some(context) = self.stack.last_mut() {
                context.fragments.push(fragment);
            }
        }
    }

    fn link(&mut self, outermost: bool) {
        let number = outermost && self.is_preparing();
        let dialect = self.dialect;
        if let Some(context) = self.stack.last_mut() {
            let fragments = std::mem::take(&mut context.fragments);
            let linked = linker::link(dialect, fragments, number);
            context.result = linked.sql;
            context.bindings = linked.bindings;
        }
    }
}
