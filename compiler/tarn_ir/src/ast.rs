//! Expression tree produced by the parser.
//!
//! # Design
//!
//! The tree is a plain owned structure (`Box` children, `Arc` for function
//! literals). Function literals are shared because a single literal is
//! specialized many times, possibly on several threads, and every
//! specialization resolves the same body.
//!
//! Every node carries an [`Info`]; the resolver attaches it to each resolved
//! node and to every diagnostic raised while resolving the node.

use std::fmt;
use std::sync::Arc;

use crate::{DeclarationId, Info, Name};

/// How a value or binding may be used.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Mutability {
    /// Plain value, copied on use.
    #[default]
    Copy,
    /// Immutable binding (`let`).
    Const,
    /// Mutable binding (`mut`).
    Mutate,
    /// Not known yet.
    PlaceHolder,
}

impl Mutability {
    /// Prefix used when rendering a typed value, empty for `Copy`.
    pub fn prefix(self) -> &'static str {
        match self {
            Mutability::Copy => "",
            Mutability::Const => "let ",
            Mutability::Mutate => "mut ",
            Mutability::PlaceHolder => "? ",
        }
    }
}

/// Width of a fixed-size integer.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
    W128,
}

impl IntWidth {
    #[inline]
    pub const fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
            IntWidth::W128 => 128,
        }
    }

    #[inline]
    pub const fn bytes(self) -> u64 {
        self.bits() as u64 / 8
    }
}

/// A type as written in source.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum TypeAnnot {
    /// `?`, or no annotation at all.
    #[default]
    PlaceHolder,
    Bool,
    Void,
    Never,
    Int(IntWidth),
    UInt(IntWidth),
    /// `(a, b, ...)`
    Tuple(Vec<TypeAnnot>),
    /// `(n T)`
    Homogeneous { count: usize, element: Box<TypeAnnot> },
    /// `^T` / `^mut T`
    Pointer { mutable: bool, inner: Box<TypeAnnot> },
    /// `!T`
    Fallible(Box<TypeAnnot>),
}

/// Binary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    RotateLeft,
    RotateRight,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl BinaryOp {
    /// Operator name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "addition",
            BinaryOp::Sub => "subtraction",
            BinaryOp::Mul => "multiplication",
            BinaryOp::Div => "division",
            BinaryOp::Mod => "modulo",
            BinaryOp::Shl => "left shift",
            BinaryOp::Shr => "right shift",
            BinaryOp::RotateLeft => "left rotation",
            BinaryOp::RotateRight => "right rotation",
            BinaryOp::BitAnd => "bitwise and",
            BinaryOp::BitOr => "bitwise or",
            BinaryOp::BitXor => "bitwise xor",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Eq => "equals",
            BinaryOp::NotEq => "not equals",
            BinaryOp::Lt => "lower",
            BinaryOp::LtEq => "lower or equals",
            BinaryOp::Gt => "greater",
            BinaryOp::GtEq => "greater or equals",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Plus,
    /// `not x`
    Not,
    /// `~x`
    Invert,
    /// `*x`
    Deref,
    /// `&x`
    Ref,
}

impl UnaryOp {
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "negation",
            UnaryOp::Plus => "plus",
            UnaryOp::Not => "not",
            UnaryOp::Invert => "inversion",
            UnaryOp::Deref => "dereference",
            UnaryOp::Ref => "reference",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A formal argument of a function literal.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Argument {
    pub name: Name,
    /// `Copy` unless declared with `let` or `mut`.
    pub mutability: Mutability,
    pub annot: TypeAnnot,
    pub info: Info,
}

/// A function literal.
///
/// The identity is assigned once, when the literal is built, and never
/// changes: every resolution of this literal specializes the same
/// declaration.
#[derive(Eq, PartialEq, Debug)]
pub struct FunctionLiteral {
    pub id: DeclarationId,
    pub arguments: Vec<Argument>,
    /// Declared result type, `PlaceHolder` when inferred.
    pub result: TypeAnnot,
    pub body: Arc<Expr>,
    pub info: Info,
}

impl FunctionLiteral {
    pub fn new(info: Info, arguments: Vec<Argument>, result: TypeAnnot, body: Expr) -> Self {
        FunctionLiteral {
            id: DeclarationId::fresh(),
            arguments,
            result,
            body: Arc::new(body),
            info,
        }
    }
}

/// Expression node.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub info: Info,
}

impl Expr {
    pub fn new(kind: ExprKind, info: Info) -> Self {
        Expr { kind, info }
    }

    /// Replace the location of this node.
    #[must_use]
    pub fn at(mut self, info: Info) -> Self {
        self.info = info;
        self
    }
}

/// Expression variants.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ExprKind {
    Integer {
        value: i128,
        signed: bool,
        width: IntWidth,
    },
    Bool(bool),
    Void,
    Ident(Name),
    /// `callee' arg, arg`
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// `let name: T = value`, or a jump label when `value` is absent.
    Let {
        name: Name,
        annot: TypeAnnot,
        value: Option<Box<Expr>>,
    },
    /// `mut name: T = value`
    Mut {
        name: Name,
        annot: TypeAnnot,
        value: Box<Expr>,
    },
    /// `acceptor = value`
    Set {
        acceptor: Box<Expr>,
        value: Box<Expr>,
    },
    /// `fail value`
    Fail(Box<Expr>),
    /// `value?`: propagate a failure to the enclosing function.
    Propagate(Box<Expr>),
    /// `value!`: unwrap a fallible value, panicking on failure.
    Panic(Box<Expr>),
    /// A nested block with its own bindings.
    Block(Box<Expr>),
    /// `a; b; c`: the value of the last step. Empty steps are `void`.
    Steps(Vec<Expr>),
    Tuple(Vec<Expr>),
    Function(Arc<FunctionLiteral>),
    /// `value.0`
    AccessIndex {
        value: Box<Expr>,
        index: usize,
    },
    /// `value.name`
    AccessName {
        value: Box<Expr>,
        name: Name,
    },
    /// `value[index]`
    Index {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    /// `value as T` (explicit) or `value: T` (implicit).
    Cast {
        value: Box<Expr>,
        annot: TypeAnnot,
        explicit: bool,
    },
    /// `in label`
    Jump(Name),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
}
