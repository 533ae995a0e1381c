//! Method body builder
//!
//! Bodies are built as a small statement tree (lines and braced blocks) and
//! rendered to text only on [`Body::complete`]. Block balance is an
//! IR-level property checked before rendering; whether the text compiles is
//! the host's call.

mod render;
pub mod template;

use crate::error::{AssistError, AssistResult};
use crate::naming::NameGenerator;
use std::fmt::Display;

/// Statement in a body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Line(String),
    Block(Block),
}

/// A braced block with its header, e.g. `if (x)` or `try`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: String,
    pub body: Vec<Stmt>,
}

/// Accumulates a method body.
///
/// An auto-wrapping body (see [`Body::auto_wrap`]) opens a `try` on
/// construction and closes it with a catch-all on completion, so anything
/// the body throws reaches the caller as an unchecked exception.
#[derive(Debug)]
pub struct Body {
    tag: String,
    root: Vec<Stmt>,
    open: Vec<Block>,
    wrap: Option<NameGenerator>,
}

impl Body {
    /// Create an empty body. `tag` only appears in diagnostics.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            root: Vec::new(),
            open: Vec::new(),
            wrap: None,
        }
    }

    /// Create a body that translates every exception it raises into an
    /// unchecked one
    pub fn auto_wrap(tag: impl Into<String>, names: &NameGenerator) -> Self {
        let mut body = Self::new(tag);
        body.open.push(Block {
            header: "try".to_string(),
            body: Vec::new(),
        });
        body.wrap = Some(names.clone());
        body
    }

    /// Append one line built from `template`
    pub fn append_line(&mut self, template: &str, args: &[&dyn Display]) -> AssistResult<&mut Self> {
        let line = template::expand(template, args)?;
        self.push(Stmt::Line(line));
        Ok(self)
    }

    /// Open a block headed by the expanded `template`
    pub fn start_block(&mut self, template: &str, args: &[&dyn Display]) -> AssistResult<&mut Self> {
        let header = template::expand(template, args)?;
        self.open.push(Block {
            header,
            body: Vec::new(),
        });
        Ok(self)
    }

    /// Close the innermost open block
    pub fn end_block(&mut self) -> AssistResult<&mut Self> {
        let block = self.open.pop().ok_or_else(|| AssistError::NoOpenBlock {
            tag: self.tag.clone(),
        })?;
        self.push(Stmt::Block(block));
        Ok(self)
    }

    /// Headers of the blocks still open, outermost first
    pub fn open_blocks(&self) -> Vec<&str> {
        self.open.iter().map(|b| b.header.as_str()).collect()
    }

    /// Whether every explicitly started block has been ended
    pub fn is_balanced(&self) -> bool {
        self.open.is_empty()
    }

    /// Finish the body and render it, braces included
    pub fn complete(mut self) -> AssistResult<String> {
        if let Some(names) = self.wrap.take() {
            let e = names.generate("lazyException");
            self.end_block()?
                .start_block("catch (Exception %s)", &[&e])?
                .append_line(
                    "throw %1$s instanceof RuntimeException ? (RuntimeException) %1$s : new RuntimeException(%1$s);",
                    &[&e],
                )?
                .end_block()?;
        }

        if !self.is_balanced() {
            return Err(AssistError::UnterminatedBlocks {
                tag: self.tag.clone(),
                blocks: self.open.into_iter().map(|b| b.header).collect(),
            });
        }

        Ok(render::render(&self.root))
    }

    fn push(&mut self, stmt: Stmt) {
        match self.open.last_mut() {
            Some(block) => block.body.push(stmt),
            None => self.root.push(stmt),
        }
    }
}
