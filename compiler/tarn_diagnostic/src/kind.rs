//! Failure classes raised during type resolution.

use thiserror::Error;

use crate::ErrorCode;

/// Argument binding that breaks the formal's mutability.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Error)]
pub enum MutabilityViolation {
    /// Copy formal given a mutable value.
    #[error("primitive argument cannot get mutable type value")]
    CopyFromMutable,
    /// Mutable formal given a plain value.
    #[error("mutable argument cannot get primitive value")]
    MutableFromCopy,
    /// Mutable formal given an immutable value.
    #[error("mutable argument cannot get immutable value")]
    MutableFromConst,
    /// Immutable formal given a mutable value.
    #[error("immutable argument cannot get mutable value")]
    ConstFromMutable,
}

/// What went wrong. Type and variable names are pre-rendered.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Error)]
pub enum ErrorKind {
    #[error("called function waiting for {expected} arguments but {found} is passed")]
    ArityMismatch { expected: usize, found: usize },

    #[error(transparent)]
    Mutability(#[from] MutabilityViolation),

    #[error("type {from} cannot be casted to type {to}")]
    CastFailed { from: String, to: String },

    #[error(
        "function with {expected} waited arguments cannot be casted to function with {found} waited arguments"
    )]
    FunctionArity { expected: usize, found: usize },

    /// A structural failure inside a larger type.
    #[error("{context}: {inner}")]
    Nested {
        context: String,
        inner: Box<ErrorKind>,
    },

    #[error("ambiguous return type, specify explicitly")]
    AmbiguousReturn,

    #[error("mutable only type is cannot be returned")]
    MutableReturn,

    #[error("type {0} cannot be returned")]
    UnreturnableType(String),

    #[error("variable {0} is already defined")]
    AlreadyDefined(String),

    #[error("variable {0} is not defined")]
    Undefined(String),

    #[error("{0} is a label, not a variable")]
    LabelAsVariable(String),

    #[error("variable {0} is not suitable to be a jump label")]
    NotALabel(String),

    #[error("type {0} is not suitable to be a variable type")]
    UnsuitableVariableType(String),

    #[error("mutable type cannot be placed to immutable variable")]
    MutableIntoImmutable,

    #[error("immutable type cannot be placed to mutable variable")]
    ImmutableIntoMutable,

    #[error("cannot assign to immutable value")]
    AssignToImmutable,

    #[error("type {0} cannot be assigned")]
    UnassignableType(String),

    #[error("trying to call type {0} which is not callable")]
    Uncallable(String),

    #[error("tuple index {index} is out of range of {ty}")]
    IndexOutOfRange { index: usize, ty: String },

    #[error("type {ty} does not have field {field}")]
    NoField { ty: String, field: String },

    #[error("type {0} does not support index addressation")]
    NoIndexAddressation(String),

    #[error("{op} operator is not supported at type {left} with type {right}")]
    UnsupportedBinary {
        op: &'static str,
        left: String,
        right: String,
    },

    #[error("{op} operator is not supported at type {ty}")]
    UnsupportedUnary { op: &'static str, ty: String },

    #[error("tuple must have at least two elements")]
    TupleTooShort,
}

impl ErrorKind {
    /// Prefix this failure with the place inside a larger type where it
    /// happened, e.g. `at element 2`.
    #[must_use]
    pub fn within(self, context: impl Into<String>) -> Self {
        ErrorKind::Nested {
            context: context.into(),
            inner: Box::new(self),
        }
    }

    /// The failure beneath any context prefixes.
    pub fn root(&self) -> &ErrorKind {
        match self {
            ErrorKind::Nested { inner, .. } => inner.root(),
            other => other,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ErrorKind::CastFailed { .. } | ErrorKind::FunctionArity { .. } => ErrorCode::E2001,
            ErrorKind::Nested { inner, .. } => inner.code(),
            ErrorKind::Undefined(_) | ErrorKind::LabelAsVariable(_) => ErrorCode::E2003,
            ErrorKind::ArityMismatch { .. } => ErrorCode::E2004,
            ErrorKind::AmbiguousReturn => ErrorCode::E2005,
            ErrorKind::AlreadyDefined(_) => ErrorCode::E2006,
            ErrorKind::Mutability(_)
            | ErrorKind::MutableIntoImmutable
            | ErrorKind::ImmutableIntoMutable
            | ErrorKind::AssignToImmutable => ErrorCode::E2007,
            ErrorKind::MutableReturn
            | ErrorKind::UnreturnableType(_)
            | ErrorKind::UnsuitableVariableType(_)
            | ErrorKind::UnassignableType(_) => ErrorCode::E2008,
            ErrorKind::NotALabel(_) => ErrorCode::E2009,
            ErrorKind::Uncallable(_) => ErrorCode::E2010,
            ErrorKind::IndexOutOfRange { .. }
            | ErrorKind::NoField { .. }
            | ErrorKind::NoIndexAddressation(_) => ErrorCode::E2011,
            ErrorKind::UnsupportedBinary { .. } | ErrorKind::UnsupportedUnary { .. } => {
                ErrorCode::E2012
            }
            ErrorKind::TupleTooShort => ErrorCode::E9001,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn nested_context_prefixes_message() {
        let kind = ErrorKind::CastFailed {
            from: "bool".into(),
            to: "i32".into(),
        }
        .within("at element 2")
        .within("at function argument 1");

        assert_eq!(
            kind.to_string(),
            "at function argument 1: at element 2: type bool cannot be casted to type i32"
        );
        assert_eq!(kind.code(), ErrorCode::E2001);
        assert!(matches!(kind.root(), ErrorKind::CastFailed { .. }));
    }

    #[test]
    fn mutability_messages() {
        let kind = ErrorKind::from(MutabilityViolation::CopyFromMutable);
        assert_eq!(
            kind.to_string(),
            "primitive argument cannot get mutable type value"
        );
        assert_eq!(
            ErrorKind::from(MutabilityViolation::MutableFromConst).to_string(),
            "mutable argument cannot get immutable value"
        );
        assert_eq!(kind.code(), ErrorCode::E2007);
    }

    #[test]
    fn arity_message() {
        let kind = ErrorKind::ArityMismatch {
            expected: 2,
            found: 1,
        };
        assert_eq!(
            kind.to_string(),
            "called function waiting for 2 arguments but 1 is passed"
        );
    }
}
