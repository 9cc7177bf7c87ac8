#![allow(clippy::unwrap_used, reason = "tests unwrap resolved trees")]

use std::sync::Arc;

use pretty_assertions::assert_eq;
use tarn_ir::build::{
    access_index, access_name, arg, binary, block, boolean, call, cast, cond, fail, func, ident,
    index, int32, jump, label, let_, mut_, panic_on_fail, propagate, set, steps, tuple, uint,
    unary, void,
};
use tarn_ir::{BinaryOp, IntWidth};

use super::*;

const I32: MetaType = MetaType::Int(IntWidth::W32);

fn resolve(expr: &Expr) -> Result<ResolvedExpr, CompileError> {
    resolve_expr(expr, &mut Scope::create())
}

fn ty(expr: &Expr) -> MetaType {
    resolve(expr).unwrap().value.ty
}

fn error(expr: &Expr) -> String {
    resolve(expr).unwrap_err().kind().to_string()
}

fn last_step(resolved: &ResolvedExpr) -> &ResolvedExpr {
    match &resolved.kind {
        ResolvedKind::Steps(steps) => steps.last().unwrap(),
        other => panic!("expected steps, found {other:?}"),
    }
}

#[test]
fn literals() {
    let int = resolve(&int32(3)).unwrap();
    assert_eq!(int.value, TypedValue::new(Mutability::Copy, I32));
    assert_eq!(ty(&uint(3, IntWidth::W8)), MetaType::UInt(IntWidth::W8));
    assert_eq!(ty(&boolean(true)), MetaType::Bool);
    assert_eq!(ty(&void()), MetaType::Void);
    assert_eq!(ty(&steps(Vec::new())), MetaType::Void);
}

#[test]
fn let_binds_an_immutable_value() {
    let program = steps(vec![
        let_("x", int32(1)),
        binary(BinaryOp::Add, ident("x"), int32(2)),
    ]);
    assert_eq!(ty(&program), I32);

    let bound = resolve(&let_("x", int32(1))).unwrap();
    assert_eq!(bound.value.mutability, Mutability::Const);
    assert_eq!(error(&ident("x")), "variable x is not defined");
}

#[test]
fn binding_checks_mutability() {
    let leak = steps(vec![
        mut_("x", int32(1)),
        let_("p", unary(UnaryOp::Ref, ident("x"))),
    ]);
    assert_eq!(
        error(&leak),
        "mutable type cannot be placed to immutable variable"
    );

    let frozen = mut_("f", func(Vec::new(), int32(1)));
    assert_eq!(
        error(&frozen),
        "immutable type cannot be placed to mutable variable"
    );
}

#[test]
fn assignment() {
    let ok = steps(vec![mut_("x", int32(1)), set(ident("x"), int32(5))]);
    assert_eq!(ty(&ok), MetaType::Void);

    let immutable = steps(vec![let_("x", int32(1)), set(ident("x"), int32(5))]);
    assert_eq!(error(&immutable), "cannot assign to immutable value");

    let mismatched = steps(vec![mut_("x", int32(1)), set(ident("x"), boolean(true))]);
    assert_eq!(error(&mismatched), "type bool cannot be casted to type i32");
}

#[test]
fn assignment_through_pointers() {
    let through_mut = steps(vec![
        mut_("x", int32(1)),
        mut_("p", unary(UnaryOp::Ref, ident("x"))),
        set(unary(UnaryOp::Deref, ident("p")), int32(3)),
    ]);
    assert!(resolve(&through_mut).is_ok());

    let through_shared = steps(vec![
        let_("y", int32(1)),
        let_("q", unary(UnaryOp::Ref, ident("y"))),
        set(unary(UnaryOp::Deref, ident("q")), int32(3)),
    ]);
    assert_eq!(error(&through_shared), "cannot assign to immutable value");
}

#[test]
fn labels_and_jumps() {
    let program = steps(vec![label("exit"), jump("exit")]);
    assert_eq!(ty(&program), MetaType::Never);

    let nested = steps(vec![label("exit"), block(jump("exit"))]);
    assert!(resolve(&nested).is_ok());

    let isolated = steps(vec![label("exit"), tuple(vec![jump("exit"), int32(1)])]);
    assert_eq!(error(&isolated), "variable exit is not suitable to be a jump label");

    let in_condition = steps(vec![
        label("exit"),
        cond(jump("exit"), int32(1), int32(2)),
    ]);
    assert_eq!(
        error(&in_condition),
        "variable exit is not suitable to be a jump label"
    );

    let in_branch = steps(vec![
        label("exit"),
        cond(boolean(true), jump("exit"), int32(2)),
    ]);
    assert_eq!(ty(&in_branch), I32);

    let read = steps(vec![label("exit"), ident("exit")]);
    assert_eq!(error(&read), "exit is a label, not a variable");

    let wrong = steps(vec![let_("x", int32(1)), tuple(vec![jump("x"), int32(1)])]);
    assert_eq!(error(&wrong), "variable x is not suitable to be a jump label");
}

#[test]
fn conditional_branches_unify() {
    let widened = cond(boolean(true), int32(1), uint(2, IntWidth::W8));
    assert_eq!(ty(&widened), I32);

    let diverging = cond(boolean(true), fail(int32(0)), int32(2));
    assert_eq!(ty(&diverging), I32);

    assert_eq!(
        error(&cond(int32(1), int32(1), int32(2))),
        "type i32 cannot be casted to type bool"
    );
    assert!(resolve(&cond(boolean(true), int32(1), boolean(false))).is_err());
}

#[test]
fn calling_a_literal_specializes_it() {
    let program = steps(vec![
        let_("id", func(vec![arg("x")], ident("x"))),
        call(ident("id"), vec![int32(4)]),
        call(ident("id"), vec![int32(5)]),
        call(ident("id"), vec![boolean(true)]),
    ]);
    let resolved = resolve(&program).unwrap();
    let ResolvedKind::Steps(steps) = &resolved.kind else {
        panic!("expected steps");
    };
    let definitions: Vec<_> = steps[1..]
        .iter()
        .map(|step| match &step.kind {
            ResolvedKind::Call { definition, .. } => Arc::clone(definition),
            other => panic!("expected call, found {other:?}"),
        })
        .collect();

    assert!(Arc::ptr_eq(&definitions[0], &definitions[1]));
    assert!(!Arc::ptr_eq(&definitions[0], &definitions[2]));
    assert_eq!(definitions[0].result(), &I32);
    assert_eq!(definitions[2].result(), &MetaType::Bool);
    assert_eq!(definitions[0].declaration().resolution_count(), 2);
    assert_eq!(last_step(&resolved).value.mutability, Mutability::Const);
}

#[test]
fn literal_keeps_one_declaration() {
    let literal = func(vec![arg("x")], ident("x"));
    let first = resolve(&literal).unwrap();
    let second = resolve(&literal).unwrap();
    let (ResolvedKind::Function(a), ResolvedKind::Function(b)) = (&first.kind, &second.kind)
    else {
        panic!("expected function values");
    };
    assert!(Arc::ptr_eq(a, b));
    let ctx = Scope::create();
    assert_eq!(first.value.ty.binary(&ctx), second.value.ty.binary(&ctx));
}

#[test]
fn calling_a_value_that_is_not_a_function() {
    assert_eq!(
        error(&call(int32(1), Vec::new())),
        "trying to call type i32 which is not callable"
    );
}

#[test]
fn callable_tuple_prepends_bound_arguments() {
    let add = func(
        vec![arg("a"), arg("b")],
        binary(BinaryOp::Add, ident("a"), ident("b")),
    );
    let program = steps(vec![
        let_("inc", tuple(vec![add, int32(1)])),
        call(ident("inc"), vec![int32(2)]),
    ]);
    assert_eq!(ty(&program), I32);
}

#[test]
fn tuple_access() {
    let pair = || tuple(vec![int32(1), boolean(true)]);
    assert_eq!(ty(&access_index(pair(), 1)), MetaType::Bool);
    assert_eq!(ty(&access_name(pair(), "len")), I32);

    let triple = tuple(vec![int32(1), int32(2), int32(3)]);
    assert_eq!(ty(&index(triple, uint(0, IntWidth::W64))), I32);

    assert_eq!(
        error(&tuple(vec![int32(1)])),
        "tuple must have at least two elements"
    );
}

#[test]
fn casts() {
    let explicit = cast(int32(1), TypeAnnot::UInt(IntWidth::W8), true);
    assert_eq!(ty(&explicit), MetaType::UInt(IntWidth::W8));

    let implicit = cast(int32(1), TypeAnnot::UInt(IntWidth::W8), false);
    assert_eq!(error(&implicit), "type i32 cannot be casted to type u8");
}

#[test]
fn fail_marks_the_enclosing_scope() {
    let mut scope = Scope::create();
    let resolved = resolve_expr(&fail(int32(1)), &mut scope).unwrap();
    assert_eq!(resolved.value.ty, MetaType::Never);
    assert!(scope.has_error());
}

#[test]
fn unwrapping_fallible_values() {
    let checked = || func(vec![arg("f")], cond(ident("f"), fail(int32(1)), int32(2)));

    let mut scope = Scope::create();
    let panicking = steps(vec![
        let_("g", checked()),
        panic_on_fail(call(ident("g"), vec![boolean(true)])),
    ]);
    assert_eq!(resolve_expr(&panicking, &mut scope).unwrap().value.ty, I32);
    assert!(!scope.has_error());

    let mut scope = Scope::create();
    let propagating = steps(vec![
        let_("g", checked()),
        propagate(call(ident("g"), vec![boolean(true)])),
    ]);
    assert_eq!(resolve_expr(&propagating, &mut scope).unwrap().value.ty, I32);
    assert!(scope.has_error());

    let mut scope = Scope::create();
    let plain = resolve_expr(&propagate(int32(1)), &mut scope).unwrap();
    assert_eq!(plain.value.ty, I32);
    assert!(matches!(plain.kind, ResolvedKind::Integer(1)));
    assert!(!scope.has_error());
    assert_eq!(ty(&panic_on_fail(boolean(true))), MetaType::Bool);
}
