//! Function declarations and their specializations.
//!
//! A [`FunctionDeclaration`] is a function as written; calling it with
//! concrete argument types produces one [`FunctionDefinition`] per
//! structural signature, shared by every thread that asks for it.

mod cache;
mod declaration;
mod definition;
mod resolving;

pub use declaration::{Formal, FunctionDeclaration};
pub use definition::{DefinitionState, FunctionDefinition};

#[cfg(test)]
mod tests;
