//! Function types.

use std::fmt;
use std::sync::Arc;

use tarn_diagnostic::{CompileError, ErrorKind};
use tarn_ir::Info;

use crate::binary::{BinaryType, BinaryTypeBuilder, Tag};
use crate::{FunctionDeclaration, MetaType, Scope, TypedValue};

/// Type of a function value: result, arguments and the declaration the
/// value was created from.
///
/// Equality is by declaration identity plus structure; the declaration body
/// is never compared.
#[derive(Clone)]
pub struct FunctionType {
    result: Arc<MetaType>,
    arguments: Arc<[TypedValue]>,
    declaration: Arc<FunctionDeclaration>,
}

impl FunctionType {
    pub fn new(
        result: MetaType,
        arguments: impl Into<Arc<[TypedValue]>>,
        declaration: Arc<FunctionDeclaration>,
    ) -> Self {
        FunctionType {
            result: Arc::new(result),
            arguments: arguments.into(),
            declaration,
        }
    }

    pub fn result(&self) -> &MetaType {
        &self.result
    }

    pub fn arguments(&self) -> &[TypedValue] {
        &self.arguments
    }

    pub fn declaration(&self) -> &Arc<FunctionDeclaration> {
        &self.declaration
    }

    /// Structural signature, keyed on the declaration.
    pub fn binary(&self, ctx: &Scope) -> BinaryType {
        let mut builder = BinaryTypeBuilder::new();
        self.write_binary(ctx, &mut builder);
        builder.finish()
    }

    pub fn name(&self, ctx: &Scope) -> String {
        let arguments: Vec<String> = self.arguments.iter().map(|a| a.name(ctx)).collect();
        format!(
            "(fn {} -> {})",
            arguments.join(", "),
            self.result.name(ctx)
        )
    }

    pub(crate) fn write_binary(&self, ctx: &Scope, builder: &mut BinaryTypeBuilder) {
        builder.push_tag(Tag::FunctionStart);
        builder.push_declaration(self.declaration.id());
        self.result.write_binary(ctx, builder);
        for argument in self.arguments.iter() {
            argument.ty.write_binary(ctx, builder);
        }
        builder.push_tag(Tag::FunctionEnd);
    }

    /// Unify argument-wise and on the result. `Ok(None)` when the two
    /// types come from different declarations.
    pub(crate) fn unify(
        &self,
        ctx: &Scope,
        info: &Info,
        to: &FunctionType,
    ) -> Result<Option<FunctionType>, CompileError> {
        if self.arguments.len() != to.arguments.len() {
            return Err(CompileError::new(
                info.clone(),
                ErrorKind::FunctionArity {
                    expected: self.arguments.len(),
                    found: to.arguments.len(),
                },
            ));
        }
        if self.declaration.id() != to.declaration.id() {
            return Ok(None);
        }
        let arguments = self
            .arguments
            .iter()
            .zip(to.arguments.iter())
            .enumerate()
            .map(|(i, (from, target))| {
                from.ty
                    .template_cast(ctx, info, &target.ty, false)
                    .map(|ty| TypedValue::new(target.mutability, ty))
                    .map_err(|e| e.within(format!("at function argument {}", i + 1)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let result = self
            .result
            .template_cast(ctx, info, &to.result, false)
            .map_err(|e| e.within("at function return type"))?;
        Ok(Some(FunctionType::new(
            result,
            arguments,
            Arc::clone(&self.declaration),
        )))
    }

    #[must_use]
    pub(crate) fn fixate(&self, ctx: &Scope) -> FunctionType {
        FunctionType {
            result: Arc::new(ctx.fixate(&self.result)),
            arguments: self.arguments.iter().map(|a| a.fixate(ctx)).collect(),
            declaration: Arc::clone(&self.declaration),
        }
    }
}

impl PartialEq for FunctionType {
    fn eq(&self, other: &Self) -> bool {
        self.declaration.id() == other.declaration.id()
            && self.result == other.result
            && self.arguments == other.arguments
    }
}

impl Eq for FunctionType {}

impl fmt::Debug for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionType")
            .field("declaration", &self.declaration.id())
            .field("result", &self.result)
            .field("arguments", &self.arguments)
            .finish()
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(fn ")?;
        for (i, argument) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}{}", argument.mutability.prefix(), argument.ty)?;
        }
        write!(f, " -> {})", self.result)
    }
}
