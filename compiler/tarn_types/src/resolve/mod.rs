//! Expression resolution.
//!
//! [`resolve_expr`] walks a source expression in a [`Scope`] and returns
//! the same tree annotated with value types, with every call bound to the
//! [`FunctionDefinition`](crate::FunctionDefinition) it specializes to.
//!
//! Call targets, call arguments, operands and binding initializers resolve
//! in isolated scopes, so jump labels of the enclosing block are not
//! visible inside them. Blocks and conditional branches get child scopes
//! that keep every ability.

mod resolved;

use tarn_diagnostic::{CompileError, ErrorKind};
use tarn_ir::{Expr, ExprKind, Info, TypeAnnot, UnaryOp};

pub use resolved::{ResolvedExpr, ResolvedKind};

use crate::annotation::resolve_annotation;
use crate::stack::ensure_sufficient_stack;
use crate::{
    Convention, FunctionDeclaration, MetaType, Mutability, Scope, TupleShape, TypedValue,
};

/// Resolve `expr` in `scope`.
pub fn resolve_expr(expr: &Expr, scope: &mut Scope) -> Result<ResolvedExpr, CompileError> {
    ensure_sufficient_stack(|| resolve_kind(expr, scope))
}

fn resolve_isolated(expr: &Expr, scope: &Scope) -> Result<ResolvedExpr, CompileError> {
    resolve_expr(expr, &mut scope.isolated())
}

fn resolve_kind(expr: &Expr, scope: &mut Scope) -> Result<ResolvedExpr, CompileError> {
    let info = &expr.info;
    let done = |value: TypedValue, kind: ResolvedKind| -> Result<ResolvedExpr, CompileError> {
        Ok(ResolvedExpr::new(info.clone(), value, kind))
    };
    match &expr.kind {
        ExprKind::Integer {
            value,
            signed,
            width,
        } => {
            let ty = if *signed {
                MetaType::Int(*width)
            } else {
                MetaType::UInt(*width)
            };
            done(
                TypedValue::new(Mutability::Copy, ty),
                ResolvedKind::Integer(*value),
            )
        }
        ExprKind::Bool(value) => done(
            TypedValue::new(Mutability::Copy, MetaType::Bool),
            ResolvedKind::Bool(*value),
        ),
        ExprKind::Void => done(TypedValue::void(), ResolvedKind::Void),
        ExprKind::Ident(name) => done(
            scope.get_variable(info, name)?,
            ResolvedKind::Variable(name.clone()),
        ),
        ExprKind::Call { callee, args } => {
            let callee = resolve_isolated(callee, scope)?;
            let args = args
                .iter()
                .map(|arg| resolve_isolated(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            let passed: Vec<(Info, TypedValue)> = args
                .iter()
                .map(|arg| (arg.info.clone(), arg.value.clone()))
                .collect();
            let definition = callee.value.ty.call(scope, info, &passed)?;
            done(
                TypedValue::new(Mutability::Const, definition.result().clone()),
                ResolvedKind::Call {
                    callee: Box::new(callee),
                    definition,
                    args,
                },
            )
        }
        ExprKind::Conditional {
            cond,
            then,
            otherwise,
        } => {
            let cond = resolve_isolated(cond, scope)?;
            cond.value
                .ty
                .implicit_cast(scope, &cond.info, &MetaType::Bool)?;
            let then = resolve_expr(then, &mut scope.block())?;
            let otherwise = resolve_expr(otherwise, &mut scope.block())?;
            let ty = scope
                .speculate(|| {
                    otherwise
                        .value
                        .ty
                        .implicit_cast(scope, &otherwise.info, &then.value.ty)
                })
                .or_else(|_| then.value.ty.implicit_cast(scope, info, &otherwise.value.ty))?;
            done(
                TypedValue::of(scope, ty),
                ResolvedKind::Conditional {
                    cond: Box::new(cond),
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                },
            )
        }
        ExprKind::Let {
            name,
            annot: _,
            value: None,
        } => {
            scope.create_label(info, name.clone())?;
            done(TypedValue::void(), ResolvedKind::Label(name.clone()))
        }
        ExprKind::Let {
            name,
            annot,
            value: Some(value),
        } => {
            let value = resolve_isolated(value, scope)?;
            let ty = bound_type(scope, info, &value, annot)?;
            if ty.mutability(scope) == Mutability::Mutate {
                return Err(CompileError::new(
                    info.clone(),
                    ErrorKind::MutableIntoImmutable,
                ));
            }
            let bound =
                scope.create_variable(info, name.clone(), TypedValue::new(Mutability::Const, ty))?;
            done(
                bound,
                ResolvedKind::Let {
                    name: name.clone(),
                    value: Box::new(value),
                },
            )
        }
        ExprKind::Mut { name, annot, value } => {
            let value = resolve_isolated(value, scope)?;
            let ty = bound_type(scope, info, &value, annot)?;
            if ty.mutability(scope) == Mutability::Const {
                return Err(CompileError::new(
                    info.clone(),
                    ErrorKind::ImmutableIntoMutable,
                ));
            }
            let bound = scope.create_variable(
                info,
                name.clone(),
                TypedValue::new(Mutability::Mutate, ty),
            )?;
            done(
                bound,
                ResolvedKind::Mut {
                    name: name.clone(),
                    value: Box::new(value),
                },
            )
        }
        ExprKind::Set { acceptor, value } => {
            let acceptor = resolve_isolated(acceptor, scope)?;
            if acceptor.value.mutability != Mutability::Mutate {
                return Err(CompileError::new(
                    acceptor.info.clone(),
                    ErrorKind::AssignToImmutable,
                ));
            }
            if !acceptor.value.ty.convention(scope).contains(Convention::SET) {
                return Err(CompileError::new(
                    acceptor.info.clone(),
                    ErrorKind::UnassignableType(acceptor.value.ty.name(scope)),
                ));
            }
            let value = resolve_isolated(value, scope)?;
            value
                .value
                .ty
                .implicit_cast(scope, &value.info, &acceptor.value.ty)?;
            done(
                TypedValue::void(),
                ResolvedKind::Set {
                    acceptor: Box::new(acceptor),
                    value: Box::new(value),
                },
            )
        }
        ExprKind::Fail(value) => {
            let value = resolve_isolated(value, scope)?;
            let error_type = scope.handle_error();
            value
                .value
                .ty
                .implicit_cast(scope, &value.info, &error_type)?;
            done(
                TypedValue::never(),
                ResolvedKind::Fail {
                    value: Box::new(value),
                    error_type,
                },
            )
        }
        ExprKind::Propagate(value) => {
            let value = resolve_isolated(value, scope)?;
            let Some(success) = unwrap_fallible(scope, &value) else {
                return Ok(value);
            };
            let error_type = scope.handle_error();
            done(
                TypedValue::new(value.value.mutability, success),
                ResolvedKind::Propagate {
                    value: Box::new(value),
                    error_type,
                },
            )
        }
        ExprKind::Panic(value) => {
            let value = resolve_isolated(value, scope)?;
            let Some(success) = unwrap_fallible(scope, &value) else {
                return Ok(value);
            };
            done(
                TypedValue::new(value.value.mutability, success),
                ResolvedKind::Panic(Box::new(value)),
            )
        }
        ExprKind::Block(inner) => {
            let inner = resolve_expr(inner, &mut scope.block())?;
            done(inner.value.clone(), ResolvedKind::Block(Box::new(inner)))
        }
        ExprKind::Steps(steps) => {
            let steps = steps
                .iter()
                .map(|step| resolve_expr(step, scope))
                .collect::<Result<Vec<_>, _>>()?;
            let value = steps
                .last()
                .map_or_else(TypedValue::void, |last| last.value.clone());
            done(value, ResolvedKind::Steps(steps))
        }
        ExprKind::Tuple(elements) => {
            let elements = elements
                .iter()
                .map(|element| resolve_isolated(element, scope))
                .collect::<Result<Vec<_>, _>>()?;
            let types = elements.iter().map(|e| e.value.ty.clone()).collect();
            let ty = MetaType::Tuple(TupleShape::create(scope, info, types)?);
            done(TypedValue::of(scope, ty), ResolvedKind::Tuple(elements))
        }
        ExprKind::Function(literal) => {
            let declaration = FunctionDeclaration::from_literal(literal)?;
            done(
                TypedValue::new(Mutability::Const, declaration.create_type()),
                ResolvedKind::Function(declaration),
            )
        }
        ExprKind::AccessIndex { value, index } => {
            let value = resolve_isolated(value, scope)?;
            let ty = value.value.ty.access_index(scope, info, *index)?;
            done(
                TypedValue::new(value.value.mutability, ty),
                ResolvedKind::AccessIndex {
                    value: Box::new(value),
                    index: *index,
                },
            )
        }
        ExprKind::AccessName { value, name } => {
            let value = resolve_isolated(value, scope)?;
            let ty = value.value.ty.access_name(scope, info, name.as_str())?;
            done(
                TypedValue::new(Mutability::Copy, ty),
                ResolvedKind::AccessName {
                    value: Box::new(value),
                    name: name.clone(),
                },
            )
        }
        ExprKind::Index { value, index } => {
            let value = resolve_isolated(value, scope)?;
            let index = resolve_isolated(index, scope)?;
            let ty = value
                .value
                .ty
                .index_addressation(scope, info, &index.value.ty)?;
            let mutability = match scope.resolve(&value.value.ty) {
                MetaType::Pointer { mutable, .. } => pointee_mutability(mutable),
                _ => value.value.mutability,
            };
            done(
                TypedValue::new(mutability, ty),
                ResolvedKind::Index {
                    value: Box::new(value),
                    index: Box::new(index),
                },
            )
        }
        ExprKind::Cast {
            value,
            annot,
            explicit,
        } => {
            let value = resolve_isolated(value, scope)?;
            let target = resolve_annotation(info, annot)?;
            let ty = if *explicit {
                value.value.ty.explicit_cast(scope, info, &target)?
            } else {
                value.value.ty.implicit_cast(scope, info, &target)?
            };
            done(
                TypedValue::new(value.value.mutability, ty),
                ResolvedKind::Cast {
                    value: Box::new(value),
                    explicit: *explicit,
                },
            )
        }
        ExprKind::Jump(label) => {
            scope.validate_label(info, label)?;
            done(TypedValue::never(), ResolvedKind::Jump(label.clone()))
        }
        ExprKind::Binary { op, left, right } => {
            let left = resolve_isolated(left, scope)?;
            let right = resolve_isolated(right, scope)?;
            let ty = left
                .value
                .ty
                .binary_operation(scope, info, *op, &right.value.ty)?;
            done(
                TypedValue::of(scope, ty),
                ResolvedKind::Binary {
                    op: *op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            )
        }
        ExprKind::Unary { op, operand } => {
            let operand = resolve_isolated(operand, scope)?;
            let ty = operand
                .value
                .ty
                .unary_operation(scope, info, *op, operand.value.mutability)?;
            let mutability = match (op, scope.resolve(&operand.value.ty)) {
                (UnaryOp::Deref, MetaType::Pointer { mutable, .. }) => pointee_mutability(mutable),
                _ => ty.mutability(scope),
            };
            done(
                TypedValue::new(mutability, ty),
                ResolvedKind::Unary {
                    op: *op,
                    operand: Box::new(operand),
                },
            )
        }
    }
}

/// Type of a binding: the initializer cast to the annotation.
fn bound_type(
    scope: &Scope,
    info: &Info,
    value: &ResolvedExpr,
    annot: &TypeAnnot,
) -> Result<MetaType, CompileError> {
    let target = resolve_annotation(info, annot)?;
    value.value.ty.implicit_cast(scope, &value.info, &target)
}

/// Success type of a fallible value, `None` when the value cannot fail.
fn unwrap_fallible(scope: &Scope, value: &ResolvedExpr) -> Option<MetaType> {
    match scope.resolve(&value.value.ty) {
        MetaType::Not(inner) => Some(MetaType::clone(&inner)),
        _ => None,
    }
}

fn pointee_mutability(mutable: bool) -> Mutability {
    if mutable {
        Mutability::Mutate
    } else {
        Mutability::Const
    }
}

#[cfg(test)]
mod tests;
