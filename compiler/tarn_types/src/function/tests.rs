#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "tests unwrap successful specializations"
)]

use std::sync::{Arc, Barrier};
use std::thread;

use pretty_assertions::assert_eq;
use rayon::prelude::*;
use tarn_diagnostic::{CompileError, ErrorKind, MutabilityViolation};
use tarn_ir::build::{binary, boolean, call, cond, fail, ident, int32, propagate, void};
use tarn_ir::{BinaryOp, Expr, Info, IntWidth, Name};

use super::cache::DefinitionCache;
use super::*;
use crate::resolve::ResolvedKind;
use crate::{MetaType, Mutability, Scope, TypedValue};

const I32: MetaType = MetaType::Int(IntWidth::W32);

fn info() -> Info {
    Info::default()
}

fn formal(name: &str, mutability: Mutability, ty: MetaType) -> Formal {
    Formal {
        name: Name::new(name),
        value: TypedValue::new(mutability, ty),
        info: info(),
    }
}

/// A declaration with inferred formals and result.
fn declare(formals: &[&str], body: Expr) -> Arc<FunctionDeclaration> {
    let formals = formals
        .iter()
        .map(|name| formal(name, Mutability::Copy, MetaType::PlaceHolder))
        .collect();
    FunctionDeclaration::new(info(), formals, MetaType::PlaceHolder, body)
}

fn value(ty: MetaType) -> (Info, TypedValue) {
    (info(), TypedValue::new(Mutability::Copy, ty))
}

fn function(declaration: &Arc<FunctionDeclaration>) -> (Info, TypedValue) {
    (
        info(),
        TypedValue::new(Mutability::Const, declaration.create_type()),
    )
}

fn resolve(
    declaration: &Arc<FunctionDeclaration>,
    args: &[(Info, TypedValue)],
) -> Result<Arc<FunctionDefinition>, CompileError> {
    declaration.resolve_call(&Scope::create(), &info(), args)
}

fn minus_one(name: &str) -> Expr {
    binary(BinaryOp::Sub, ident(name), int32(1))
}

#[test]
fn equal_signatures_share_one_definition() {
    let inc = declare(&["x"], binary(BinaryOp::Add, ident("x"), int32(1)));

    let first = resolve(&inc, &[value(I32)]).unwrap();
    let second = resolve(&inc, &[value(I32)]).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.result(), &I32);
    assert!(first.is_complete());
    assert_eq!(inc.resolution_count(), 1);
    assert!(DefinitionCache::global().is_committed(first.signature()));
}

#[test]
fn distinct_signatures_specialize_separately() {
    let id = declare(&["x"], ident("x"));

    let int = resolve(&id, &[value(I32)]).unwrap();
    let flag = resolve(&id, &[value(MetaType::Bool)]).unwrap();

    assert!(!Arc::ptr_eq(&int, &flag));
    assert_eq!(int.result(), &I32);
    assert_eq!(flag.result(), &MetaType::Bool);
    assert_ne!(int.signature(), flag.signature());
    assert_eq!(id.resolution_count(), 2);
}

#[test]
fn identical_bodies_do_not_alias() {
    let a = declare(&["x"], ident("x"));
    let b = declare(&["x"], ident("x"));

    let from_a = resolve(&a, &[value(I32)]).unwrap();
    let from_b = resolve(&b, &[value(I32)]).unwrap();
    assert!(!Arc::ptr_eq(&from_a, &from_b));
}

fn fib() -> Arc<FunctionDeclaration> {
    declare(
        &["f", "n"],
        cond(
            binary(BinaryOp::LtEq, ident("n"), int32(1)),
            ident("n"),
            binary(
                BinaryOp::Add,
                call(ident("f"), vec![ident("f"), minus_one("n")]),
                call(
                    ident("f"),
                    vec![ident("f"), binary(BinaryOp::Sub, ident("n"), int32(2))],
                ),
            ),
        ),
    )
}

#[test]
fn self_recursion_resolves_once() {
    let fib = fib();
    let definition = resolve(&fib, &[function(&fib), value(I32)]).unwrap();

    assert_eq!(definition.result(), &I32);
    assert_eq!(fib.resolution_count(), 1);
    assert_eq!(resolving::depth(), 0);

    let runtime: Vec<usize> = definition.runtime_arguments().map(|(i, _)| i).collect();
    assert_eq!(runtime, vec![1]);
}

#[test]
fn recursive_calls_see_open_definitions() {
    let fib = fib();
    let definition = resolve(&fib, &[function(&fib), value(I32)]).unwrap();

    let Some(body) = definition.body() else {
        panic!("complete definition without body");
    };
    let ResolvedKind::Conditional { otherwise, .. } = &body.kind else {
        panic!("unexpected body {:?}", body.kind);
    };
    let ResolvedKind::Binary { left, .. } = &otherwise.kind else {
        panic!("unexpected branch {:?}", otherwise.kind);
    };
    let ResolvedKind::Call { definition: inner, .. } = &left.kind else {
        panic!("unexpected operand {:?}", left.kind);
    };
    assert_eq!(inner.state(), DefinitionState::Open);
    assert_eq!(inner.signature(), definition.signature());
}

#[test]
fn recursion_without_result_is_never() {
    let spin = declare(&["f"], call(ident("f"), vec![ident("f")]));
    let definition = resolve(&spin, &[function(&spin)]).unwrap();

    assert_eq!(definition.result(), &MetaType::Never);
    let body = definition.body().expect("complete definition has a body");
    assert!(matches!(body.kind, ResolvedKind::NeverResult(_)));
}

/// `a(a, b, n)` calls `b(a, b, n)` and `b` calls back into `a`.
fn ping_pong(a_body: Expr) -> (Arc<FunctionDeclaration>, Arc<FunctionDeclaration>) {
    let a = declare(&["a", "b", "n"], a_body);
    let b = declare(
        &["a", "b", "n"],
        call(ident("a"), vec![ident("a"), ident("b"), ident("n")]),
    );
    (a, b)
}

#[test]
fn mutual_recursion_without_concrete_result_is_ambiguous() {
    let (a, b) = ping_pong(call(ident("b"), vec![ident("a"), ident("b"), ident("n")]));

    let err = resolve(&a, &[function(&a), function(&b), value(I32)]).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::AmbiguousReturn);
    assert!(err.is_stacked());
    assert_eq!(
        err.base_message(),
        "ambiguous return type, specify explicitly"
    );
    assert_eq!(resolving::depth(), 0);
}

#[test]
fn mutual_recursion_with_concrete_base_case_resolves() {
    let (a, b) = ping_pong(cond(
        binary(BinaryOp::Eq, ident("n"), int32(0)),
        int32(1),
        call(ident("b"), vec![ident("a"), ident("b"), minus_one("n")]),
    ));
    let args = [function(&a), function(&b), value(I32)];

    let from_a = resolve(&a, &args).unwrap();
    assert_eq!(from_a.result(), &I32);
    assert!(from_a.is_complete());
    assert_eq!(a.resolution_count(), 2);

    let from_b = resolve(&b, &args).unwrap();
    assert_eq!(from_b.result(), &I32);
    assert!(from_b.is_complete());
    assert!(DefinitionCache::global().is_committed(from_b.signature()));
    assert_eq!(b.resolution_count(), 2);
}

#[test]
fn crossed_mutual_recursion_on_two_threads_completes() {
    for _ in 0..200 {
        let (a, b) = ping_pong(cond(
            binary(BinaryOp::Eq, ident("n"), int32(0)),
            int32(1),
            call(ident("b"), vec![ident("a"), ident("b"), minus_one("n")]),
        ));
        let args = [function(&a), function(&b), value(I32)];
        let barrier = Barrier::new(2);

        let (from_a, from_b) = thread::scope(|s| {
            let left = s.spawn(|| {
                barrier.wait();
                resolve(&a, &args).unwrap()
            });
            let right = s.spawn(|| {
                barrier.wait();
                resolve(&b, &args).unwrap()
            });
            (
                left.join().expect("resolver thread panicked"),
                right.join().expect("resolver thread panicked"),
            )
        });

        assert_eq!(from_a.result(), &I32);
        assert_eq!(from_b.result(), &I32);
        assert!(Arc::ptr_eq(
            &resolve(&a, &args).unwrap(),
            &resolve(&a, &args).unwrap()
        ));
        assert!(Arc::ptr_eq(
            &resolve(&b, &args).unwrap(),
            &resolve(&b, &args).unwrap()
        ));
        assert_eq!(resolving::depth(), 0);
    }
}

#[test]
fn concurrent_callers_share_one_resolution() {
    const THREADS: usize = 8;
    let fib = fib();
    let barrier = Barrier::new(THREADS);

    let definitions: Vec<Arc<FunctionDefinition>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    resolve(&fib, &[function(&fib), value(I32)]).unwrap()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("resolver thread panicked"))
            .collect()
    });

    assert_eq!(fib.resolution_count(), 1);
    for definition in &definitions[1..] {
        assert!(Arc::ptr_eq(&definitions[0], definition));
    }
}

#[test]
fn parallel_specialization_resolves_each_signature_once() {
    let id = declare(&["x"], ident("x"));

    let definitions: Vec<(bool, Arc<FunctionDefinition>)> = (0..64)
        .into_par_iter()
        .map(|i| {
            let ty = if i % 2 == 0 { I32 } else { MetaType::Bool };
            (i % 2 == 0, resolve(&id, &[value(ty)]).unwrap())
        })
        .collect();

    assert_eq!(id.resolution_count(), 2);
    let first_int = definitions.iter().find(|(int, _)| *int).map(|(_, d)| d);
    let first_bool = definitions.iter().find(|(int, _)| !*int).map(|(_, d)| d);
    let (Some(first_int), Some(first_bool)) = (first_int, first_bool) else {
        panic!("both specializations expected");
    };
    for (int, definition) in &definitions {
        let expected = if *int { first_int } else { first_bool };
        assert!(Arc::ptr_eq(expected, definition));
    }
}

#[test]
fn fail_path_wraps_the_result() {
    let checked = declare(
        &["flag"],
        cond(ident("flag"), fail(int32(1)), int32(2)),
    );
    let definition = resolve(&checked, &[value(MetaType::Bool)]).unwrap();
    assert_eq!(definition.result().to_string(), "!i32");
}

#[test]
fn fail_only_body_returns_never() {
    let abort = declare(&[], fail(int32(7)));
    let definition = resolve(&abort, &[]).unwrap();
    assert_eq!(definition.result(), &MetaType::not(MetaType::Never));
}

#[test]
fn propagation_makes_the_caller_fallible() {
    let checked = declare(
        &["flag"],
        cond(ident("flag"), fail(int32(1)), int32(2)),
    );
    let caller = declare(
        &["g", "flag"],
        binary(
            BinaryOp::Add,
            propagate(call(ident("g"), vec![ident("flag")])),
            int32(1),
        ),
    );
    let definition = resolve(&caller, &[function(&checked), value(MetaType::Bool)]).unwrap();
    assert_eq!(definition.result(), &MetaType::not(I32));
}

#[test]
fn propagation_passes_infallible_results_through() {
    let forward = declare(&["g", "x"], propagate(call(ident("g"), vec![ident("x")])));
    let same = declare(&["x"], ident("x"));
    let checked = declare(
        &["flag"],
        cond(ident("flag"), fail(int32(1)), int32(2)),
    );

    let plain = resolve(&forward, &[function(&same), value(I32)]).unwrap();
    assert_eq!(plain.result(), &I32);

    let fallible = resolve(&forward, &[function(&checked), value(MetaType::Bool)]).unwrap();
    assert_eq!(fallible.result(), &MetaType::not(I32));
}

#[test]
fn fail_payload_must_match_success() {
    let mismatched = declare(
        &["flag"],
        cond(ident("flag"), fail(boolean(false)), int32(2)),
    );
    let err = resolve(&mismatched, &[value(MetaType::Bool)]).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::CastFailed { .. }));
}

#[test]
fn declared_result_is_applied() {
    let widened = FunctionDeclaration::new(
        info(),
        Vec::new(),
        MetaType::Int(IntWidth::W64),
        int32(1),
    );
    assert_eq!(
        resolve(&widened, &[]).unwrap().result(),
        &MetaType::Int(IntWidth::W64)
    );

    let wrong = FunctionDeclaration::new(info(), Vec::new(), MetaType::Bool, int32(1));
    let err = resolve(&wrong, &[]).unwrap_err();
    assert_eq!(err.base_message(), "type i32 cannot be casted to type bool");
}

#[test]
fn mutable_result_is_rejected() {
    let leak = FunctionDeclaration::new(
        info(),
        vec![formal("p", Mutability::Mutate, MetaType::PlaceHolder)],
        MetaType::PlaceHolder,
        ident("p"),
    );
    let pointer = (
        info(),
        TypedValue::new(Mutability::Mutate, MetaType::pointer(true, I32)),
    );
    let err = resolve(&leak, &[pointer]).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::MutableReturn);
}

fn violation(formal_mutability: Mutability, arg: TypedValue) -> ErrorKind {
    let declaration = FunctionDeclaration::new(
        info(),
        vec![formal("x", formal_mutability, MetaType::PlaceHolder)],
        MetaType::PlaceHolder,
        void(),
    );
    resolve(&declaration, &[(info(), arg)])
        .unwrap_err()
        .kind()
        .clone()
}

#[test]
fn argument_mutability_rules() {
    let cases = [
        (
            Mutability::Copy,
            TypedValue::new(Mutability::Mutate, I32),
            MutabilityViolation::CopyFromMutable,
        ),
        (
            Mutability::Copy,
            TypedValue::new(Mutability::Const, MetaType::pointer(true, I32)),
            MutabilityViolation::CopyFromMutable,
        ),
        (
            Mutability::Mutate,
            TypedValue::new(Mutability::Copy, I32),
            MutabilityViolation::MutableFromCopy,
        ),
        (
            Mutability::Mutate,
            TypedValue::new(Mutability::Const, I32),
            MutabilityViolation::MutableFromConst,
        ),
        (
            Mutability::Const,
            TypedValue::new(Mutability::Mutate, I32),
            MutabilityViolation::ConstFromMutable,
        ),
    ];
    for (to, arg, expected) in cases {
        assert_eq!(violation(to, arg), ErrorKind::Mutability(expected));
    }

    assert_eq!(
        violation(Mutability::Copy, TypedValue::new(Mutability::Mutate, I32)).to_string(),
        "primitive argument cannot get mutable type value"
    );
    assert_eq!(
        violation(Mutability::Mutate, TypedValue::new(Mutability::Const, I32)).to_string(),
        "mutable argument cannot get immutable value"
    );
}

#[test]
fn arity_is_checked_before_resolution() {
    let id = declare(&["x"], ident("x"));
    let err = resolve(&id, &[]).unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::ArityMismatch {
            expected: 1,
            found: 0
        }
    );
    assert!(!err.is_stacked());
    assert_eq!(id.resolution_count(), 0);
}

#[test]
fn nested_failure_carries_the_call_chain() {
    let inner = declare(&["x"], binary(BinaryOp::Add, ident("x"), int32(1)));
    let inner_call = Info::new(3, 5, "    g' true");
    let outer = declare(
        &["g"],
        call(ident("g"), vec![boolean(true)]).at(inner_call.clone()),
    );
    let outer_call = Info::new(1, 1, "outer' inner");

    let attempt = || outer.resolve_call(&Scope::create(), &outer_call, &[function(&inner)]);
    let err = attempt().unwrap_err();

    assert!(matches!(err.kind(), ErrorKind::UnsupportedBinary { .. }));
    assert_eq!(err.stack(), &[inner_call.clone(), outer_call.clone()][..]);
    assert_eq!(resolving::depth(), 0);

    // nothing is left behind: a second attempt fails the same way
    assert_eq!(attempt().unwrap_err(), err);
}
