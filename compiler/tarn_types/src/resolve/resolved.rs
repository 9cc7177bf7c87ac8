//! Type-resolved expression tree.

use std::sync::Arc;

use tarn_ir::{BinaryOp, Info, Name, UnaryOp};

use crate::{FunctionDeclaration, FunctionDefinition, MetaType, Scope, TypedValue};

/// An expression with its resolved value type.
#[derive(Clone, Debug)]
pub struct ResolvedExpr {
    pub info: Info,
    pub value: TypedValue,
    pub kind: ResolvedKind,
}

/// Resolved expression variants. Mirrors the source tree, with calls bound
/// to the specialization they invoke.
#[derive(Clone, Debug)]
pub enum ResolvedKind {
    Integer(i128),
    Bool(bool),
    Void,
    Variable(Name),
    Call {
        callee: Box<ResolvedExpr>,
        definition: Arc<FunctionDefinition>,
        args: Vec<ResolvedExpr>,
    },
    Conditional {
        cond: Box<ResolvedExpr>,
        then: Box<ResolvedExpr>,
        otherwise: Box<ResolvedExpr>,
    },
    Label(Name),
    Let {
        name: Name,
        value: Box<ResolvedExpr>,
    },
    Mut {
        name: Name,
        value: Box<ResolvedExpr>,
    },
    Set {
        acceptor: Box<ResolvedExpr>,
        value: Box<ResolvedExpr>,
    },
    /// `error_type` is the enclosing function's error payload type.
    Fail {
        value: Box<ResolvedExpr>,
        error_type: MetaType,
    },
    Propagate {
        value: Box<ResolvedExpr>,
        error_type: MetaType,
    },
    Panic(Box<ResolvedExpr>),
    Block(Box<ResolvedExpr>),
    Steps(Vec<ResolvedExpr>),
    Tuple(Vec<ResolvedExpr>),
    Function(Arc<FunctionDeclaration>),
    AccessIndex {
        value: Box<ResolvedExpr>,
        index: usize,
    },
    AccessName {
        value: Box<ResolvedExpr>,
        name: Name,
    },
    Index {
        value: Box<ResolvedExpr>,
        index: Box<ResolvedExpr>,
    },
    Cast {
        value: Box<ResolvedExpr>,
        explicit: bool,
    },
    Jump(Name),
    Binary {
        op: BinaryOp,
        left: Box<ResolvedExpr>,
        right: Box<ResolvedExpr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<ResolvedExpr>,
    },
    /// Body of a function whose result could not be inferred and was
    /// settled as `never`.
    NeverResult(Box<ResolvedExpr>),
}

impl ResolvedExpr {
    pub(crate) fn new(info: Info, value: TypedValue, kind: ResolvedKind) -> Self {
        ResolvedExpr { info, value, kind }
    }

    pub(crate) fn never_result(body: ResolvedExpr) -> Self {
        ResolvedExpr {
            info: body.info.clone(),
            value: TypedValue::never(),
            kind: ResolvedKind::NeverResult(Box::new(body)),
        }
    }

    pub fn ty(&self) -> &MetaType {
        &self.value.ty
    }

    /// Replace every unresolved slot in the tree with its final type.
    #[must_use]
    pub fn fixate(self, ctx: &Scope) -> Self {
        let boxed = |expr: Box<ResolvedExpr>| Box::new(expr.fixate(ctx));
        let kind = match self.kind {
            ResolvedKind::Call {
                callee,
                definition,
                args,
            } => ResolvedKind::Call {
                callee: boxed(callee),
                definition,
                args: args.into_iter().map(|arg| arg.fixate(ctx)).collect(),
            },
            ResolvedKind::Conditional {
                cond,
                then,
                otherwise,
            } => ResolvedKind::Conditional {
                cond: boxed(cond),
                then: boxed(then),
                otherwise: boxed(otherwise),
            },
            ResolvedKind::Let { name, value } => ResolvedKind::Let {
                name,
                value: boxed(value),
            },
            ResolvedKind::Mut { name, value } => ResolvedKind::Mut {
                name,
                value: boxed(value),
            },
            ResolvedKind::Set { acceptor, value } => ResolvedKind::Set {
                acceptor: boxed(acceptor),
                value: boxed(value),
            },
            ResolvedKind::Fail { value, error_type } => ResolvedKind::Fail {
                value: boxed(value),
                error_type: ctx.fixate(&error_type),
            },
            ResolvedKind::Propagate { value, error_type } => ResolvedKind::Propagate {
                value: boxed(value),
                error_type: ctx.fixate(&error_type),
            },
            ResolvedKind::Panic(value) => ResolvedKind::Panic(boxed(value)),
            ResolvedKind::Block(inner) => ResolvedKind::Block(boxed(inner)),
            ResolvedKind::NeverResult(inner) => ResolvedKind::NeverResult(boxed(inner)),
            ResolvedKind::Steps(steps) => {
                ResolvedKind::Steps(steps.into_iter().map(|step| step.fixate(ctx)).collect())
            }
            ResolvedKind::Tuple(elements) => ResolvedKind::Tuple(
                elements
                    .into_iter()
                    .map(|element| element.fixate(ctx))
                    .collect(),
            ),
            ResolvedKind::AccessIndex { value, index } => ResolvedKind::AccessIndex {
                value: boxed(value),
                index,
            },
            ResolvedKind::AccessName { value, name } => ResolvedKind::AccessName {
                value: boxed(value),
                name,
            },
            ResolvedKind::Index { value, index } => ResolvedKind::Index {
                value: boxed(value),
                index: boxed(index),
            },
            ResolvedKind::Cast { value, explicit } => ResolvedKind::Cast {
                value: boxed(value),
                explicit,
            },
            ResolvedKind::Binary { op, left, right } => ResolvedKind::Binary {
                op,
                left: boxed(left),
                right: boxed(right),
            },
            ResolvedKind::Unary { op, operand } => ResolvedKind::Unary {
                op,
                operand: boxed(operand),
            },
            leaf @ (ResolvedKind::Integer(_)
            | ResolvedKind::Bool(_)
            | ResolvedKind::Void
            | ResolvedKind::Variable(_)
            | ResolvedKind::Label(_)
            | ResolvedKind::Function(_)
            | ResolvedKind::Jump(_)) => leaf,
        };
        ResolvedExpr {
            info: self.info,
            value: self.value.fixate(ctx),
            kind,
        }
    }
}
