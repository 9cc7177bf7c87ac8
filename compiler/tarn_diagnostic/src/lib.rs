//! Diagnostic system for type resolution errors.
//!
//! - [`ErrorKind`]: what went wrong, one variant per failure class
//! - [`CompileError`]: a kind pinned to a source location, optionally
//!   carrying the chain of calls that led to it
//! - [`Diagnostic`]: the rich, code-tagged record handed to emitters
//!
//! Every resolver operation returns `Result<_, CompileError>`. Failures are
//! never recovered locally; the driver decides whether to stop.

mod diagnostic;
mod error;
mod error_code;
mod kind;

pub use diagnostic::{Diagnostic, Label};
pub use error::CompileError;
pub use error_code::ErrorCode;
pub use kind::{ErrorKind, MutabilityViolation};
