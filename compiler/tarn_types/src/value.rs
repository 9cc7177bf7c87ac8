//! Typed values and usage conventions.

use bitflags::bitflags;

pub use tarn_ir::Mutability;

use crate::{MetaType, Scope};

bitflags! {
    /// Positions a type may appear in.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct Convention: u8 {
        /// Result of a function.
        const RETURN = 1 << 0;
        /// Type of a variable or argument binding.
        const INIT_VARIABLE = 1 << 1;
        /// Target of an assignment.
        const SET = 1 << 2;
        const ANY = Self::RETURN.bits() | Self::INIT_VARIABLE.bits() | Self::SET.bits();
    }
}

/// A type together with how its value may be used.
///
/// Attached to every resolved expression and every binding.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct TypedValue {
    pub mutability: Mutability,
    pub ty: MetaType,
}

impl TypedValue {
    pub fn new(mutability: Mutability, ty: MetaType) -> Self {
        TypedValue { mutability, ty }
    }

    /// A temporary whose mutability is the type's own.
    pub fn of(ctx: &Scope, ty: MetaType) -> Self {
        TypedValue {
            mutability: ty.mutability(ctx),
            ty,
        }
    }

    pub fn void() -> Self {
        TypedValue::new(Mutability::Copy, MetaType::Void)
    }

    pub fn never() -> Self {
        TypedValue::new(Mutability::Copy, MetaType::Never)
    }

    pub fn name(&self, ctx: &Scope) -> String {
        format!("{}{}", self.mutability.prefix(), self.ty.name(ctx))
    }

    /// Replace every unresolved slot with its final type.
    #[must_use]
    pub fn fixate(&self, ctx: &Scope) -> Self {
        TypedValue {
            mutability: self.mutability,
            ty: ctx.fixate(&self.ty),
        }
    }
}
