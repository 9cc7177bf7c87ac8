//! Type model and function specialization for Tarn.
//!
//! The resolver walks an expression tree from `tarn_ir` in a [`Scope`],
//! assigning every node a [`TypedValue`]. Calls specialize their callee's
//! [`FunctionDeclaration`] for the concrete argument types:
//!
//! - [`MetaType`] is the closed type model with its cast protocol
//! - [`BinaryType`] is the structural signature used as the cache key
//! - [`FunctionDefinition`] is one specialization, cached process-wide
//!
//! Resolution may run on many threads at once. Each specialization is
//! resolved exactly once; other threads asking for it wait and share the
//! result.

mod annotation;
pub mod binary;
mod function;
mod meta;
mod resolve;
mod scope;
mod settings;
mod stack;
mod value;

use std::sync::Once;

pub use annotation::resolve_annotation;
pub use binary::{BinaryType, BinaryTypeBuilder, Tag};
pub use function::{DefinitionState, Formal, FunctionDeclaration, FunctionDefinition};
pub use meta::{FunctionType, MetaType, SlotId, TupleShape};
pub use resolve::{resolve_expr, ResolvedExpr, ResolvedKind};
pub use scope::{Scope, Variable, VariableAbility};
pub use settings::{Platform, Settings, UnknownPlatform};
pub use value::{Convention, Mutability, TypedValue};

#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::SlotId;
    tarn_ir::static_assert_size!(SlotId, 4);
}

static TRACING_INIT: Once = Once::new();

/// Install a tracing subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
