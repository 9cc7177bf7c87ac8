//! Resolved specializations.

use std::fmt;
use std::sync::Arc;

use crate::binary::BinaryType;
use crate::resolve::ResolvedExpr;
use crate::{FunctionDeclaration, FunctionType, MetaType, TypedValue};

/// How final a definition is.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DefinitionState {
    /// Fully resolved and cached.
    Complete,
    /// Handed out for a recursive re-entry while the body is still being
    /// resolved. Carries no body; refers to the specialization by signature.
    Open,
    /// Resolved against an open result of a caller; superseded once that
    /// caller settles. Never cached.
    Provisional,
}

/// One specialization of a declaration: its concrete function type and,
/// once complete, its type-resolved body.
pub struct FunctionDefinition {
    ty: FunctionType,
    body: Option<ResolvedExpr>,
    signature: BinaryType,
    state: DefinitionState,
}

impl FunctionDefinition {
    pub(crate) fn complete(ty: FunctionType, body: ResolvedExpr, signature: BinaryType) -> Self {
        FunctionDefinition {
            ty,
            body: Some(body),
            signature,
            state: DefinitionState::Complete,
        }
    }

    pub(crate) fn open(ty: FunctionType, signature: BinaryType) -> Self {
        FunctionDefinition {
            ty,
            body: None,
            signature,
            state: DefinitionState::Open,
        }
    }

    pub(crate) fn provisional(ty: FunctionType, signature: BinaryType) -> Self {
        FunctionDefinition {
            ty,
            body: None,
            signature,
            state: DefinitionState::Provisional,
        }
    }

    pub fn ty(&self) -> &FunctionType {
        &self.ty
    }

    pub fn result(&self) -> &MetaType {
        self.ty.result()
    }

    pub fn arguments(&self) -> &[TypedValue] {
        self.ty.arguments()
    }

    pub fn declaration(&self) -> &Arc<FunctionDeclaration> {
        self.ty.declaration()
    }

    /// The resolved body, present on complete definitions.
    pub fn body(&self) -> Option<&ResolvedExpr> {
        self.body.as_ref()
    }

    /// The cache key this definition was resolved under.
    pub fn signature(&self) -> &BinaryType {
        &self.signature
    }

    pub fn state(&self) -> DefinitionState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == DefinitionState::Complete
    }

    /// Arguments that exist at run time, with their positions. Function
    /// values are resolved statically and never passed.
    pub fn runtime_arguments(&self) -> impl Iterator<Item = (usize, &TypedValue)> {
        self.arguments()
            .iter()
            .enumerate()
            .filter(|(_, argument)| !matches!(argument.ty, MetaType::Function(_)))
    }
}

impl fmt::Debug for FunctionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDefinition")
            .field("ty", &self.ty)
            .field("state", &self.state)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for FunctionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty.declaration().id(), self.ty)
    }
}
