//! The type model.
//!
//! [`MetaType`] is a closed set of variants with match-based dispatch for
//! naming, signatures, casts, operators and access. Operations that need to
//! see through unresolved slots take the current [`Scope`] as context.
//!
//! # Design
//!
//! - `Unresolved(slot)` is the only mutable part of the model: a stable id
//!   into the current function resolution's slot arena. Casting through it
//!   refines the slot in place, which lets a placeholder binding pick up its
//!   type from later uses.
//! - `Not(T)` marks a value of a function that also has a fail path.
//! - Tuples come in three shapes (see [`TupleShape`]) that share one
//!   signature encoding, so the shape is a representation detail.

mod cast;
mod function;
mod ops;
mod tuple;

use std::fmt;
use std::sync::Arc;

use tarn_ir::IntWidth;

pub use function::FunctionType;
pub use tuple::TupleShape;

use crate::binary::{BinaryType, BinaryTypeBuilder, Tag};
use crate::{Convention, Mutability, Platform, Scope};

/// Index of an unresolved slot in the current function resolution.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SlotId(u32);

impl SlotId {
    #[inline]
    pub(crate) const fn new(index: u32) -> Self {
        SlotId(index)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A type.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum MetaType {
    Bool,
    Int(IntWidth),
    UInt(IntWidth),
    Void,
    /// Type of expressions that never complete.
    Never,
    /// Not known yet; absorbed by any cast.
    PlaceHolder,
    /// Success payload of a fallible computation.
    Not(Arc<MetaType>),
    Pointer {
        mutable: bool,
        inner: Arc<MetaType>,
    },
    Tuple(TupleShape),
    Function(FunctionType),
    Unresolved(SlotId),
}

impl MetaType {
    pub fn not(inner: MetaType) -> Self {
        MetaType::Not(Arc::new(inner))
    }

    pub fn pointer(mutable: bool, inner: MetaType) -> Self {
        MetaType::Pointer {
            mutable,
            inner: Arc::new(inner),
        }
    }

    /// Display name, seeing through unresolved slots.
    pub fn name(&self, ctx: &Scope) -> String {
        match self {
            MetaType::Unresolved(_) => ctx.resolve(self).name(ctx),
            MetaType::Not(inner) => format!("!{}", inner.name(ctx)),
            MetaType::Pointer { mutable, inner } => {
                let prefix = if *mutable { "^mut " } else { "^" };
                format!("{prefix}{}", inner.name(ctx))
            }
            MetaType::Tuple(shape) => shape.name(ctx),
            MetaType::Function(function) => function.name(ctx),
            other => other.to_string(),
        }
    }

    pub fn mutability(&self, ctx: &Scope) -> Mutability {
        match self {
            MetaType::Bool
            | MetaType::Int(_)
            | MetaType::UInt(_)
            | MetaType::Void
            | MetaType::Never => Mutability::Copy,
            MetaType::PlaceHolder => Mutability::PlaceHolder,
            MetaType::Not(inner) => inner.mutability(ctx),
            MetaType::Pointer { mutable: true, .. } => Mutability::Mutate,
            MetaType::Pointer { mutable: false, .. } => Mutability::Copy,
            MetaType::Tuple(shape) => {
                if shape
                    .elements()
                    .iter()
                    .any(|e| e.mutability(ctx) == Mutability::Mutate)
                {
                    Mutability::Mutate
                } else {
                    Mutability::Copy
                }
            }
            MetaType::Function(_) => Mutability::Const,
            MetaType::Unresolved(_) => ctx.resolve(self).mutability(ctx),
        }
    }

    pub fn convention(&self, ctx: &Scope) -> Convention {
        match self {
            MetaType::Never | MetaType::Not(_) => Convention::RETURN,
            MetaType::Tuple(shape) => shape
                .elements()
                .iter()
                .fold(Convention::ANY, |acc, e| acc & e.convention(ctx)),
            MetaType::Unresolved(_) => ctx.resolve(self).convention(ctx),
            _ => Convention::ANY,
        }
    }

    pub fn binary(&self, ctx: &Scope) -> BinaryType {
        let mut builder = BinaryTypeBuilder::new();
        self.write_binary(ctx, &mut builder);
        builder.finish()
    }

    pub fn write_binary(&self, ctx: &Scope, builder: &mut BinaryTypeBuilder) {
        match self {
            MetaType::Bool => builder.push_tag(Tag::Bool),
            MetaType::Int(width) => {
                builder.push_tag(Tag::Int);
                builder.push_width(*width);
            }
            MetaType::UInt(width) => {
                builder.push_tag(Tag::UInt);
                builder.push_width(*width);
            }
            MetaType::Void => builder.push_tag(Tag::Void),
            MetaType::Never => builder.push_tag(Tag::Never),
            MetaType::PlaceHolder => builder.push_tag(Tag::PlaceHolder),
            MetaType::Not(inner) => {
                builder.push_tag(Tag::Not);
                inner.write_binary(ctx, builder);
            }
            MetaType::Pointer { mutable, inner } => {
                builder.push_tag(if *mutable {
                    Tag::MutPointer
                } else {
                    Tag::Pointer
                });
                inner.write_binary(ctx, builder);
            }
            MetaType::Tuple(shape) => shape.write_binary(ctx, builder),
            MetaType::Function(function) => function.write_binary(ctx, builder),
            MetaType::Unresolved(_) => ctx.resolve(self).write_binary(ctx, builder),
        }
    }

    /// Whether the type, seen through slots, is still a bare placeholder.
    pub fn is_placeholder(&self, ctx: &Scope) -> bool {
        matches!(ctx.resolve(self), MetaType::PlaceHolder)
    }

    /// Whether a placeholder occurs anywhere in the type.
    pub fn has_placeholder(&self, ctx: &Scope) -> bool {
        match self {
            MetaType::PlaceHolder => true,
            MetaType::Not(inner) | MetaType::Pointer { inner, .. } => inner.has_placeholder(ctx),
            MetaType::Tuple(shape) => shape.elements().iter().any(|e| e.has_placeholder(ctx)),
            MetaType::Function(function) => {
                function.result().has_placeholder(ctx)
                    || function
                        .arguments()
                        .iter()
                        .any(|a| a.ty.has_placeholder(ctx))
            }
            MetaType::Unresolved(_) => ctx.resolve(self).has_placeholder(ctx),
            _ => false,
        }
    }

    /// Whether `slot` occurs in the type, following slot bindings.
    pub(crate) fn mentions(&self, ctx: &Scope, slot: SlotId) -> bool {
        match self {
            MetaType::Unresolved(id) => *id == slot || ctx.slot(*id).mentions(ctx, slot),
            MetaType::Not(inner) | MetaType::Pointer { inner, .. } => inner.mentions(ctx, slot),
            MetaType::Tuple(shape) => shape.elements().iter().any(|e| e.mentions(ctx, slot)),
            MetaType::Function(function) => {
                function.result().mentions(ctx, slot)
                    || function
                        .arguments()
                        .iter()
                        .any(|a| a.ty.mentions(ctx, slot))
            }
            _ => false,
        }
    }

    /// Whether values of this type can be called.
    pub fn callable(&self, ctx: &Scope) -> bool {
        match ctx.resolve(self) {
            MetaType::Function(_) => true,
            MetaType::Tuple(shape) => matches!(shape, TupleShape::Callable { .. }),
            _ => false,
        }
    }

    /// Size of a value in bytes, `None` while the type is not known.
    pub fn byte_size(&self, ctx: &Scope, platform: Platform) -> Option<u64> {
        match self {
            MetaType::Bool => Some(1),
            MetaType::Int(width) | MetaType::UInt(width) => Some(width.bytes()),
            MetaType::Void | MetaType::Never | MetaType::Function(_) => Some(0),
            MetaType::PlaceHolder => None,
            MetaType::Not(inner) => inner.byte_size(ctx, platform).map(|size| size + 1),
            MetaType::Pointer { .. } => Some(platform.pointer_size()),
            MetaType::Tuple(shape) => shape
                .elements()
                .iter()
                .map(|e| e.byte_size(ctx, platform))
                .sum(),
            MetaType::Unresolved(_) => ctx.resolve(self).byte_size(ctx, platform),
        }
    }
}

impl fmt::Display for MetaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaType::Bool => f.write_str("bool"),
            MetaType::Int(width) => write!(f, "i{}", width.bits()),
            MetaType::UInt(width) => write!(f, "u{}", width.bits()),
            MetaType::Void => f.write_str("void"),
            MetaType::Never => f.write_str("never"),
            MetaType::PlaceHolder => f.write_str("?"),
            MetaType::Not(inner) => write!(f, "!{inner}"),
            MetaType::Pointer { mutable: true, inner } => write!(f, "^mut {inner}"),
            MetaType::Pointer { mutable: false, inner } => write!(f, "^{inner}"),
            MetaType::Tuple(shape) => write!(f, "{shape}"),
            MetaType::Function(function) => write!(f, "{function}"),
            MetaType::Unresolved(slot) => write!(f, "?{}", slot.0),
        }
    }
}
