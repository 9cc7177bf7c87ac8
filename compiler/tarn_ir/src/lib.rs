//! Tarn IR - source locations and the expression tree.
//!
//! This crate holds the data the parser hands to the type resolver:
//! - [`Info`] source locations carried by every node and diagnostic
//! - [`Name`] identifiers
//! - [`DeclarationId`] process-unique function literal identities
//! - the [`ast`] expression tree and type annotations
//! - [`build`] helpers for constructing trees by hand
//!
//! The tree is immutable once built and shared between threads behind `Arc`,
//! so every type here is `Send + Sync`.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

pub mod ast;
pub mod build;
mod id;
mod info;
mod name;

pub use ast::{
    Argument, BinaryOp, Expr, ExprKind, FunctionLiteral, IntWidth, Mutability, TypeAnnot, UnaryOp,
};
pub use id::DeclarationId;
pub use info::Info;
pub use name::Name;
