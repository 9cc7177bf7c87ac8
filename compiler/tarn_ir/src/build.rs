//! Helpers for building expression trees by hand.
//!
//! Every node gets the default [`Info`]; use [`Expr::at`] to place one.

use std::sync::Arc;

use crate::{
    Argument, BinaryOp, Expr, ExprKind, FunctionLiteral, Info, IntWidth, Mutability, Name,
    TypeAnnot, UnaryOp,
};

fn expr(kind: ExprKind) -> Expr {
    Expr::new(kind, Info::default())
}

pub fn int(value: i128, width: IntWidth) -> Expr {
    expr(ExprKind::Integer {
        value,
        signed: true,
        width,
    })
}

pub fn uint(value: i128, width: IntWidth) -> Expr {
    expr(ExprKind::Integer {
        value,
        signed: false,
        width,
    })
}

/// A 32-bit signed literal.
pub fn int32(value: i128) -> Expr {
    int(value, IntWidth::W32)
}

pub fn boolean(value: bool) -> Expr {
    expr(ExprKind::Bool(value))
}

pub fn void() -> Expr {
    expr(ExprKind::Void)
}

pub fn ident(name: &str) -> Expr {
    expr(ExprKind::Ident(Name::new(name)))
}

pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
    expr(ExprKind::Call {
        callee: Box::new(callee),
        args,
    })
}

pub fn cond(cond: Expr, then: Expr, otherwise: Expr) -> Expr {
    expr(ExprKind::Conditional {
        cond: Box::new(cond),
        then: Box::new(then),
        otherwise: Box::new(otherwise),
    })
}

pub fn let_(name: &str, value: Expr) -> Expr {
    let_annotated(name, TypeAnnot::PlaceHolder, value)
}

pub fn let_annotated(name: &str, annot: TypeAnnot, value: Expr) -> Expr {
    expr(ExprKind::Let {
        name: Name::new(name),
        annot,
        value: Some(Box::new(value)),
    })
}

pub fn label(name: &str) -> Expr {
    expr(ExprKind::Let {
        name: Name::new(name),
        annot: TypeAnnot::PlaceHolder,
        value: None,
    })
}

pub fn mut_(name: &str, value: Expr) -> Expr {
    expr(ExprKind::Mut {
        name: Name::new(name),
        annot: TypeAnnot::PlaceHolder,
        value: Box::new(value),
    })
}

pub fn set(acceptor: Expr, value: Expr) -> Expr {
    expr(ExprKind::Set {
        acceptor: Box::new(acceptor),
        value: Box::new(value),
    })
}

pub fn fail(value: Expr) -> Expr {
    expr(ExprKind::Fail(Box::new(value)))
}

pub fn propagate(value: Expr) -> Expr {
    expr(ExprKind::Propagate(Box::new(value)))
}

pub fn panic_on_fail(value: Expr) -> Expr {
    expr(ExprKind::Panic(Box::new(value)))
}

pub fn block(inner: Expr) -> Expr {
    expr(ExprKind::Block(Box::new(inner)))
}

pub fn steps(steps: Vec<Expr>) -> Expr {
    expr(ExprKind::Steps(steps))
}

pub fn tuple(elements: Vec<Expr>) -> Expr {
    expr(ExprKind::Tuple(elements))
}

pub fn access_index(value: Expr, index: usize) -> Expr {
    expr(ExprKind::AccessIndex {
        value: Box::new(value),
        index,
    })
}

pub fn access_name(value: Expr, name: &str) -> Expr {
    expr(ExprKind::AccessName {
        value: Box::new(value),
        name: Name::new(name),
    })
}

pub fn index(value: Expr, index: Expr) -> Expr {
    expr(ExprKind::Index {
        value: Box::new(value),
        index: Box::new(index),
    })
}

pub fn cast(value: Expr, annot: TypeAnnot, explicit: bool) -> Expr {
    expr(ExprKind::Cast {
        value: Box::new(value),
        annot,
        explicit,
    })
}

pub fn jump(label: &str) -> Expr {
    expr(ExprKind::Jump(Name::new(label)))
}

pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    expr(ExprKind::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
    expr(ExprKind::Unary {
        op,
        operand: Box::new(operand),
    })
}

/// A `Copy` argument without annotation.
pub fn arg(name: &str) -> Argument {
    typed_arg(name, Mutability::Copy, TypeAnnot::PlaceHolder)
}

pub fn typed_arg(name: &str, mutability: Mutability, annot: TypeAnnot) -> Argument {
    Argument {
        name: Name::new(name),
        mutability,
        annot,
        info: Info::default(),
    }
}

/// A function literal with an inferred result.
pub fn func(arguments: Vec<Argument>, body: Expr) -> Expr {
    func_returning(arguments, TypeAnnot::PlaceHolder, body)
}

pub fn func_returning(arguments: Vec<Argument>, result: TypeAnnot, body: Expr) -> Expr {
    let literal = FunctionLiteral::new(Info::default(), arguments, result, body);
    expr(ExprKind::Function(Arc::new(literal)))
}
