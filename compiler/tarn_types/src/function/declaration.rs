//! The specialization engine.
//!
//! # Design
//!
//! `resolve_call` turns a declaration plus concrete call-site arguments into
//! exactly one [`FunctionDefinition`] per structural signature:
//!
//! 1. Check arity, then bind each argument to its formal (mutability rules,
//!    implicit cast).
//! 2. Compute the signature over the declaration id and argument types.
//! 3. A signature already in flight on this thread is a recursive re-entry:
//!    return an open definition instead of recursing.
//! 4. Otherwise claim the signature in the process-wide cache: reuse a
//!    committed definition, wait for another thread's, or own it.
//! 5. Resolve the body in a fictive scope, settle the result type and
//!    commit.
//!
//! Recursion through a caller's open result is settled in at most two
//! passes. A frame that consumed an open result from further down the stack
//! finishes *provisional* and is not cached; the frame it depended on,
//! having seen a provisional callee, resolves again with its own first-pass
//! result seeded for re-entries. A result that is still a placeholder at
//! that point is ambiguous.
//!
//! Errors escaping a body are stacked once with the active call chain, and
//! all per-thread and cache bookkeeping for the failed signature is rolled
//! back by guards.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tarn_diagnostic::{CompileError, ErrorKind, MutabilityViolation};
use tarn_ir::{DeclarationId, Expr, FunctionLiteral, Info, Name};

use super::cache::{Claim, DefinitionCache, OwnedSlot};
use super::resolving::{self, FrameGuard};
use crate::annotation::resolve_annotation;
use crate::binary::BinaryType;
use crate::resolve::{resolve_expr, ResolvedExpr};
use crate::stack::ensure_sufficient_stack;
use crate::{
    Convention, FunctionDefinition, FunctionType, MetaType, Mutability, Scope, Settings,
    TypedValue,
};

/// Declarations created from function literals, by literal identity.
static LITERALS: LazyLock<Mutex<FxHashMap<DeclarationId, Arc<FunctionDeclaration>>>> =
    LazyLock::new(|| Mutex::new(FxHashMap::default()));

/// A formal argument: name, declared mutability and declared type.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Formal {
    pub name: Name,
    pub value: TypedValue,
    pub info: Info,
}

/// A function as written: formals, optional result type and body.
///
/// Identity is the [`DeclarationId`]; two declarations with the same id are
/// the same function.
pub struct FunctionDeclaration {
    id: DeclarationId,
    info: Info,
    formals: Vec<Formal>,
    /// Declared result type, `PlaceHolder` when inferred.
    result: MetaType,
    body: Arc<Expr>,
    resolutions: AtomicUsize,
}

/// How a body resolution pass ended.
enum BodyOutcome {
    Complete(FunctionType, ResolvedExpr),
    /// Depends on the open result of frame `dependency` below.
    Provisional {
        result: MetaType,
        dependency: usize,
    },
    /// Consumed provisional results; resolve again assuming `result`.
    Reresolve(MetaType),
}

/// Where a finished definition goes.
enum Publish {
    Owned(OwnedSlot),
    Independent,
}

impl Publish {
    fn commit(
        self,
        signature: &BinaryType,
        definition: Arc<FunctionDefinition>,
    ) -> Arc<FunctionDefinition> {
        match self {
            Publish::Owned(slot) => slot.commit(definition),
            Publish::Independent => {
                DefinitionCache::global().publish_independent(signature, definition)
            }
        }
    }
}

impl FunctionDeclaration {
    /// A declaration with a fresh identity.
    pub fn new(info: Info, formals: Vec<Formal>, result: MetaType, body: Expr) -> Arc<Self> {
        Self::with_id(DeclarationId::fresh(), info, formals, result, Arc::new(body))
    }

    fn with_id(
        id: DeclarationId,
        info: Info,
        formals: Vec<Formal>,
        result: MetaType,
        body: Arc<Expr>,
    ) -> Arc<Self> {
        Arc::new(FunctionDeclaration {
            id,
            info,
            formals,
            result,
            body,
            resolutions: AtomicUsize::new(0),
        })
    }

    /// The declaration of a function literal. Every call with the same
    /// literal returns the same declaration.
    pub fn from_literal(literal: &FunctionLiteral) -> Result<Arc<Self>, CompileError> {
        if let Some(declaration) = LITERALS.lock().get(&literal.id) {
            return Ok(Arc::clone(declaration));
        }
        let formals = literal
            .arguments
            .iter()
            .map(|argument| {
                Ok(Formal {
                    name: argument.name.clone(),
                    value: TypedValue::new(
                        argument.mutability,
                        resolve_annotation(&argument.info, &argument.annot)?,
                    ),
                    info: argument.info.clone(),
                })
            })
            .collect::<Result<Vec<_>, CompileError>>()?;
        let result = resolve_annotation(&literal.info, &literal.result)?;
        let declaration = Self::with_id(
            literal.id,
            literal.info.clone(),
            formals,
            result,
            Arc::clone(&literal.body),
        );
        Ok(Arc::clone(
            LITERALS.lock().entry(literal.id).or_insert(declaration),
        ))
    }

    pub fn id(&self) -> DeclarationId {
        self.id
    }

    pub fn info(&self) -> &Info {
        &self.info
    }

    /// How many body resolution passes ran for this declaration.
    pub fn resolution_count(&self) -> usize {
        self.resolutions.load(Ordering::Relaxed)
    }

    /// Type of a value referring to this declaration.
    pub fn create_type(self: &Arc<Self>) -> MetaType {
        let arguments: Vec<TypedValue> = self.formals.iter().map(|f| f.value.clone()).collect();
        MetaType::Function(FunctionType::new(
            MetaType::PlaceHolder,
            arguments,
            Arc::clone(self),
        ))
    }

    /// Specialize this declaration for `args`, each paired with the
    /// location of its expression.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(declaration = %self.id, args = args.len(), depth = resolving::depth())
    )]
    pub fn resolve_call(
        self: &Arc<Self>,
        scope: &Scope,
        info: &Info,
        args: &[(Info, TypedValue)],
    ) -> Result<Arc<FunctionDefinition>, CompileError> {
        if args.len() != self.formals.len() {
            return Err(CompileError::new(
                info.clone(),
                ErrorKind::ArityMismatch {
                    expected: self.formals.len(),
                    found: args.len(),
                },
            ));
        }
        let arguments = self
            .formals
            .iter()
            .zip(args)
            .map(|(formal, (arg_info, value))| bind_argument(scope, formal, arg_info, value))
            .collect::<Result<Vec<_>, _>>()?;

        let signature =
            FunctionType::new(MetaType::PlaceHolder, arguments.clone(), Arc::clone(self))
                .binary(scope);

        if let Some(result) = resolving::reenter(&signature) {
            tracing::debug!(%result, "recursive re-entry");
            return Ok(Arc::new(FunctionDefinition::open(
                FunctionType::new(result, arguments, Arc::clone(self)),
                signature,
            )));
        }

        match DefinitionCache::global().claim(&signature) {
            Claim::Ready(definition) => {
                tracing::trace!("cache hit");
                Ok(definition)
            }
            Claim::Owned(slot) => {
                self.resolve_definition(info, arguments, signature, Publish::Owned(slot))
            }
            Claim::Contended => {
                tracing::warn!("cross-thread cycle on signature, resolving independently");
                self.resolve_definition(info, arguments, signature, Publish::Independent)
            }
        }
    }

    fn resolve_definition(
        self: &Arc<Self>,
        info: &Info,
        arguments: Vec<TypedValue>,
        signature: BinaryType,
        publish: Publish,
    ) -> Result<Arc<FunctionDefinition>, CompileError> {
        let mut seeded = None;
        loop {
            match self.resolve_body(info, &arguments, &signature, seeded.take())? {
                BodyOutcome::Complete(ty, body) => {
                    if Settings::current().trace_inference {
                        tracing::info!(declaration = %self.id, ty = %ty, "specialized");
                    }
                    let definition =
                        Arc::new(FunctionDefinition::complete(ty, body, signature.clone()));
                    tracing::debug!(result = %definition.result(), "committed");
                    return Ok(publish.commit(&signature, definition));
                }
                BodyOutcome::Provisional { result, dependency } => {
                    drop(publish);
                    resolving::consume_provisional(dependency);
                    tracing::debug!(%result, dependency, "provisional");
                    return Ok(Arc::new(FunctionDefinition::provisional(
                        FunctionType::new(result, arguments, Arc::clone(self)),
                        signature,
                    )));
                }
                BodyOutcome::Reresolve(result) => {
                    tracing::debug!(%result, "resolving again with seeded result");
                    seeded = Some(result);
                }
            }
        }
    }

    fn resolve_body(
        self: &Arc<Self>,
        info: &Info,
        arguments: &[TypedValue],
        signature: &BinaryType,
        seeded: Option<MetaType>,
    ) -> Result<BodyOutcome, CompileError> {
        let second_pass = seeded.is_some();
        let frame = resolving::push(signature.clone(), info.clone(), seeded);
        self.resolutions.fetch_add(1, Ordering::Relaxed);

        let outcome =
            ensure_sufficient_stack(|| self.infer(&frame, info, arguments, second_pass));
        outcome.map_err(|error| {
            let chain = frame.call_stack();
            drop(frame);
            tracing::debug!(declaration = %self.id, %error, "specialization failed");
            error.into_stacked(chain)
        })
    }

    fn infer(
        self: &Arc<Self>,
        frame: &FrameGuard,
        info: &Info,
        arguments: &[TypedValue],
        second_pass: bool,
    ) -> Result<BodyOutcome, CompileError> {
        let mut scope = Scope::fictive_variables(
            info,
            self.formals.iter().map(|formal| &formal.name).zip(arguments),
        )?;
        let body = resolve_expr(&self.body, &mut scope)?;
        let flags = frame.flags();

        if let Some(dependency) = flags.open_dependency {
            let inferred = scope.fixate(&body.value.ty);
            let result = if scope.has_error() {
                MetaType::not(strip_not(inferred))
            } else {
                inferred
            };
            return Ok(BodyOutcome::Provisional { result, dependency });
        }

        let (result, body) = self.settle_result(&scope, body, flags.consumed_provisional)?;
        if flags.consumed_provisional && !second_pass {
            return Ok(BodyOutcome::Reresolve(result));
        }
        let ty = FunctionType::new(result, arguments.to_vec(), Arc::clone(self));
        Ok(BodyOutcome::Complete(ty, body.fixate(&scope)))
    }

    /// Final result type of a body: declared type, fail path and
    /// placeholder demotion applied.
    fn settle_result(
        &self,
        scope: &Scope,
        body: ResolvedExpr,
        consumed_provisional: bool,
    ) -> Result<(MetaType, ResolvedExpr), CompileError> {
        let origin = body.info.clone();
        let inferred = scope.fixate(&body.value.ty);
        let ambiguous = || CompileError::new(origin.clone(), ErrorKind::AmbiguousReturn);

        let (result, body) = if scope.has_error() {
            let declared = strip_not(self.result.clone());
            let mut success = strip_not(inferred).implicit_cast(scope, &origin, &declared)?;
            if success.is_placeholder(scope) {
                if consumed_provisional {
                    return Err(ambiguous());
                }
                success = MetaType::Never;
            }
            scope.finalize_error_type(&origin, &success)?;
            (MetaType::not(scope.fixate(&success)), body)
        } else {
            let result = inferred.implicit_cast(scope, &origin, &self.result)?;
            if result.is_placeholder(scope) {
                if consumed_provisional {
                    return Err(ambiguous());
                }
                (MetaType::Never, ResolvedExpr::never_result(body))
            } else {
                (scope.fixate(&result), body)
            }
        };

        if result.mutability(scope) == Mutability::Mutate {
            return Err(CompileError::new(origin, ErrorKind::MutableReturn));
        }
        if !result.convention(scope).contains(Convention::RETURN) {
            return Err(CompileError::new(
                origin,
                ErrorKind::UnreturnableType(result.name(scope)),
            ));
        }
        Ok((result, body))
    }
}

/// Bind one call-site argument to its formal.
fn bind_argument(
    scope: &Scope,
    formal: &Formal,
    info: &Info,
    value: &TypedValue,
) -> Result<TypedValue, CompileError> {
    check_mutability(
        info,
        value.mutability,
        formal.value.mutability,
        value.ty.mutability(scope),
    )?;
    let ty = value.ty.implicit_cast(scope, info, &formal.value.ty)?;
    Ok(TypedValue::new(formal.value.mutability, scope.fixate(&ty)))
}

/// `from` is the value's mutability, `to` the formal's, `ty` the mutability
/// of the value's type.
fn check_mutability(
    info: &Info,
    from: Mutability,
    to: Mutability,
    ty: Mutability,
) -> Result<(), CompileError> {
    let violation = match (to, from) {
        (Mutability::Copy, _) if from == Mutability::Mutate || ty == Mutability::Mutate => {
            Some(MutabilityViolation::CopyFromMutable)
        }
        (Mutability::Mutate, Mutability::Copy) => Some(MutabilityViolation::MutableFromCopy),
        (Mutability::Mutate, Mutability::Const) => Some(MutabilityViolation::MutableFromConst),
        (Mutability::Const, Mutability::Mutate) => Some(MutabilityViolation::ConstFromMutable),
        _ => None,
    };
    match violation {
        Some(violation) => Err(CompileError::new(info.clone(), violation.into())),
        None => Ok(()),
    }
}

fn strip_not(ty: MetaType) -> MetaType {
    match ty {
        MetaType::Not(inner) => MetaType::clone(&inner),
        other => other,
    }
}

impl fmt::Debug for FunctionDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDeclaration")
            .field("id", &self.id)
            .field("info", &self.info)
            .field("formals", &self.formals)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}
