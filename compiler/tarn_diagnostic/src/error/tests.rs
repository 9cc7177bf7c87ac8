use pretty_assertions::assert_eq;

use super::*;
use crate::{ErrorCode, MutabilityViolation};

fn cast_failed() -> ErrorKind {
    ErrorKind::CastFailed {
        from: "bool".into(),
        to: "i32".into(),
    }
}

#[test]
fn single_error_renders_location_first() {
    let error = CompileError::new(Info::new(2, 3, "  x + true"), cast_failed());
    assert_eq!(
        error.to_string(),
        "(2:3) type bool cannot be casted to type i32\n  x + true\n  ^"
    );
    assert!(!error.is_stacked());
    assert!(error.stack().is_empty());
}

#[test]
fn stacked_error_renders_chain_then_origin() {
    let error = CompileError::new(Info::new(3, 1, "fail"), ErrorKind::AmbiguousReturn)
        .into_stacked([Info::new(2, 5, "    g' x"), Info::new(1, 1, "f' 1")]);

    assert_eq!(
        error.to_string(),
        "ambiguous return type, specify explicitly\n\
         from (2:5)\n    g' x\n    ^\n\
         from (1:1)\nf' 1\n^\n\
         at (3:1)\nfail\n^"
    );
}

#[test]
fn stacking_is_idempotent() {
    let inner = [Info::new(5, 1, "inner")];
    let outer = [Info::new(9, 1, "outer"), Info::new(1, 1, "root")];

    let error = CompileError::new(Info::new(6, 2, "x"), ErrorKind::TupleTooShort)
        .into_stacked(inner.clone())
        .into_stacked(outer);

    assert!(error.is_stacked());
    assert_eq!(error.stack(), &inner);
}

#[test]
fn within_keeps_location() {
    let info = Info::new(4, 4, "abc");
    let error = CompileError::new(info.clone(), cast_failed()).within("at element 1");
    assert_eq!(error.info(), &info);
    assert_eq!(
        error.base_message(),
        "at element 1: type bool cannot be casted to type i32"
    );
}

#[test]
fn diagnostic_labels_origin_and_chain() {
    let error = CompileError::new(
        Info::new(3, 1, "x"),
        ErrorKind::Mutability(MutabilityViolation::MutableFromConst),
    )
    .into_stacked([Info::new(1, 1, "f' y")]);

    let diag = error.to_diagnostic();
    assert_eq!(diag.code, ErrorCode::E2007);
    assert_eq!(diag.message, "mutable argument cannot get immutable value");
    assert_eq!(diag.labels.len(), 2);
    assert!(diag.labels[0].is_primary);
    assert!(!diag.labels[1].is_primary);
    assert_eq!(diag.notes.len(), 1);
}

#[test]
fn ambiguous_return_suggests_annotation() {
    let diag = CompileError::new(Info::default(), ErrorKind::AmbiguousReturn).to_diagnostic();
    assert_eq!(diag.code, ErrorCode::E2005);
    assert_eq!(diag.suggestions.len(), 1);
}
