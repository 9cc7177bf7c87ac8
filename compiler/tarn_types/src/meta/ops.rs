//! Operators, member access and calls.

use std::sync::Arc;

use tarn_diagnostic::{CompileError, ErrorKind};
use tarn_ir::{BinaryOp, Info, IntWidth, UnaryOp};

use crate::{FunctionDefinition, MetaType, Mutability, Scope, TupleShape, TypedValue};

impl MetaType {
    /// Result type of `self op right`.
    ///
    /// The operands are unified first; a placeholder operand adopts the
    /// other side. Integers of different widths promote to the wider one.
    pub fn binary_operation(
        &self,
        ctx: &Scope,
        info: &Info,
        op: BinaryOp,
        right: &MetaType,
    ) -> Result<MetaType, CompileError> {
        let unsupported = || {
            CompileError::new(
                info.clone(),
                ErrorKind::UnsupportedBinary {
                    op: op.name(),
                    left: self.name(ctx),
                    right: right.name(ctx),
                },
            )
        };
        let unified = ctx
            .speculate(|| self.template_cast(ctx, info, right, false))
            .ok();
        let operand = match unified {
            Some(ty) => ctx.resolve(&ty),
            None => match (ctx.resolve(self), ctx.resolve(right)) {
                (MetaType::Int(a), MetaType::Int(b)) => MetaType::Int(a.max(b)),
                (MetaType::UInt(a), MetaType::UInt(b)) => MetaType::UInt(a.max(b)),
                _ => return Err(unsupported()),
            },
        };
        match op {
            BinaryOp::Eq | BinaryOp::NotEq => match operand {
                MetaType::Bool
                | MetaType::Int(_)
                | MetaType::UInt(_)
                | MetaType::Pointer { .. }
                | MetaType::PlaceHolder => Ok(MetaType::Bool),
                _ => Err(unsupported()),
            },
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => match operand {
                MetaType::Int(_) | MetaType::UInt(_) | MetaType::PlaceHolder => Ok(MetaType::Bool),
                _ => Err(unsupported()),
            },
            BinaryOp::And | BinaryOp::Or => match operand {
                MetaType::Bool | MetaType::PlaceHolder => Ok(MetaType::Bool),
                _ => Err(unsupported()),
            },
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => match operand {
                MetaType::Bool | MetaType::Int(_) | MetaType::UInt(_) | MetaType::PlaceHolder => {
                    Ok(operand)
                }
                _ => Err(unsupported()),
            },
            BinaryOp::Add
            | BinaryOp::Sub
            | BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Mod
            | BinaryOp::Shl
            | BinaryOp::Shr
            | BinaryOp::RotateLeft
            | BinaryOp::RotateRight => match operand {
                MetaType::Int(_) | MetaType::UInt(_) | MetaType::PlaceHolder => Ok(operand),
                _ => Err(unsupported()),
            },
        }
    }

    /// Result type of `op self`. `mutability` is the operand value's and
    /// decides whether a reference is mutable.
    pub fn unary_operation(
        &self,
        ctx: &Scope,
        info: &Info,
        op: UnaryOp,
        mutability: Mutability,
    ) -> Result<MetaType, CompileError> {
        let operand = ctx.resolve(self);
        let result = match (op, &operand) {
            (UnaryOp::Ref, _) => Some(MetaType::pointer(
                mutability == Mutability::Mutate,
                self.clone(),
            )),
            (_, MetaType::PlaceHolder) => Some(if op == UnaryOp::Not {
                MetaType::Bool
            } else {
                MetaType::PlaceHolder
            }),
            (UnaryOp::Neg, MetaType::Int(_))
            | (UnaryOp::Plus | UnaryOp::Invert, MetaType::Int(_) | MetaType::UInt(_))
            | (UnaryOp::Not, MetaType::Bool) => Some(operand.clone()),
            (UnaryOp::Deref, MetaType::Pointer { inner, .. }) => Some(MetaType::clone(inner)),
            _ => None,
        };
        result.ok_or_else(|| {
            CompileError::new(
                info.clone(),
                ErrorKind::UnsupportedUnary {
                    op: op.name(),
                    ty: self.name(ctx),
                },
            )
        })
    }

    /// Type of `self.index`.
    pub fn access_index(
        &self,
        ctx: &Scope,
        info: &Info,
        index: usize,
    ) -> Result<MetaType, CompileError> {
        match ctx.resolve(self) {
            MetaType::Tuple(shape) => shape.access_index(ctx, info, index),
            MetaType::PlaceHolder => Ok(MetaType::PlaceHolder),
            _ => Err(CompileError::new(
                info.clone(),
                ErrorKind::NoField {
                    ty: self.name(ctx),
                    field: index.to_string(),
                },
            )),
        }
    }

    /// Type of `self.name`.
    pub fn access_name(
        &self,
        ctx: &Scope,
        info: &Info,
        name: &str,
    ) -> Result<MetaType, CompileError> {
        match ctx.resolve(self) {
            MetaType::Tuple(shape) => shape.access_name(ctx, info, name),
            MetaType::PlaceHolder => Ok(MetaType::PlaceHolder),
            _ => Err(CompileError::new(
                info.clone(),
                ErrorKind::NoField {
                    ty: self.name(ctx),
                    field: name.to_owned(),
                },
            )),
        }
    }

    /// Type of `self[index]`. The index must convert to an integer.
    pub fn index_addressation(
        &self,
        ctx: &Scope,
        info: &Info,
        index: &MetaType,
    ) -> Result<MetaType, CompileError> {
        if !matches!(ctx.resolve(index), MetaType::UInt(_)) {
            index.implicit_cast(ctx, info, &MetaType::Int(IntWidth::W64))?;
        }
        match ctx.resolve(self) {
            MetaType::Pointer { inner, .. } => Ok(MetaType::clone(&inner)),
            MetaType::Tuple(shape) => shape.index_addressation(ctx, info),
            MetaType::PlaceHolder => Ok(MetaType::PlaceHolder),
            _ => Err(CompileError::new(
                info.clone(),
                ErrorKind::NoIndexAddressation(self.name(ctx)),
            )),
        }
    }

    /// Specialize the function behind this type for `args`.
    ///
    /// Callable tuples prepend their bound arguments.
    pub fn call(
        &self,
        ctx: &Scope,
        info: &Info,
        args: &[(Info, TypedValue)],
    ) -> Result<Arc<FunctionDefinition>, CompileError> {
        match ctx.resolve(self) {
            MetaType::Function(function) => function.declaration().resolve_call(ctx, info, args),
            MetaType::Tuple(ref shape @ TupleShape::Callable { .. }) => {
                let Some((function, bound)) = shape.callable_parts(ctx) else {
                    return Err(uncallable(ctx, info, self));
                };
                let all: Vec<(Info, TypedValue)> = bound
                    .into_iter()
                    .map(|value| (info.clone(), value))
                    .chain(args.iter().cloned())
                    .collect();
                function.call(ctx, info, &all)
            }
            _ => Err(uncallable(ctx, info, self)),
        }
    }
}

fn uncallable(ctx: &Scope, info: &Info, ty: &MetaType) -> CompileError {
    CompileError::new(info.clone(), ErrorKind::Uncallable(ty.name(ctx)))
}
