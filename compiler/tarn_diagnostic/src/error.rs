//! Located resolution errors.
//!
//! # Design
//!
//! A [`CompileError`] starts out *single*: a kind and the location where it
//! was detected. When it escapes the body of a function being specialized,
//! the engine upgrades it once to a *stacked* error that also records the
//! chain of call sites active at that moment. Upgrading is idempotent, so an
//! error unwinding through several nested specializations keeps the chain
//! captured at the innermost one.

use std::fmt;

use tarn_ir::Info;

use crate::{Diagnostic, ErrorKind};

/// A resolution failure at a source location.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct CompileError {
    info: Info,
    kind: ErrorKind,
    /// Call sites, innermost first. `None` until stacked.
    stack: Option<Box<[Info]>>,
}

impl CompileError {
    pub fn new(info: Info, kind: ErrorKind) -> Self {
        CompileError {
            info,
            kind,
            stack: None,
        }
    }

    pub fn info(&self) -> &Info {
        &self.info
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The message without location or call chain.
    pub fn base_message(&self) -> String {
        self.kind.to_string()
    }

    pub fn is_stacked(&self) -> bool {
        self.stack.is_some()
    }

    /// The captured call chain, empty for a single error.
    pub fn stack(&self) -> &[Info] {
        self.stack.as_deref().unwrap_or(&[])
    }

    /// Attach the call chain. A no-op on an already stacked error.
    #[must_use]
    pub fn into_stacked(mut self, stack: impl IntoIterator<Item = Info>) -> Self {
        if self.stack.is_none() {
            self.stack = Some(stack.into_iter().collect());
        }
        self
    }

    /// Prefix the kind with the place inside a larger type where it
    /// happened. The location is kept.
    #[must_use]
    pub fn within(mut self, context: impl Into<String>) -> Self {
        self.kind = self.kind.within(context);
        self
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diagnostic = Diagnostic::error(self.kind.code())
            .with_message(self.base_message())
            .with_label(self.info.clone(), "error occurred here");
        for call in self.stack() {
            diagnostic = diagnostic.with_secondary_label(call.clone(), "called from here");
        }
        match self.kind.root() {
            ErrorKind::AmbiguousReturn => {
                diagnostic.with_suggestion("annotate the result type of one of the functions")
            }
            ErrorKind::Mutability(_) => diagnostic
                .with_note("argument mutability is declared with `let` or `mut` on the formal"),
            _ => diagnostic,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.stack {
            None => f.write_str(&self.info.render(&self.base_message(), false)),
            Some(stack) => {
                f.write_str(&self.base_message())?;
                for call in stack.iter() {
                    write!(f, "\n{}", call.render("from", true))?;
                }
                write!(f, "\n{}", self.info.render("at", true))
            }
        }
    }
}

impl std::error::Error for CompileError {}

impl From<(Info, ErrorKind)> for CompileError {
    fn from((info, kind): (Info, ErrorKind)) -> Self {
        CompileError::new(info, kind)
    }
}

#[cfg(test)]
mod tests;
