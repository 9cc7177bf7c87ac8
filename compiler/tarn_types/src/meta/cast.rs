//! The cast protocol.
//!
//! Three entry points share one selection routine:
//! - [`MetaType::implicit_cast`] at argument, binding and return sites
//! - [`MetaType::explicit_cast`] for user-requested conversions
//! - [`MetaType::template_cast`] to unify placeholders between two shapes
//!
//! Selection, given a source and a target:
//! 1. A placeholder on either side is absorbed by the other side.
//! 2. Equal signatures succeed with the source.
//! 3. Unless this is already a repeated attempt, try unifying source into
//!    target, then target into source; failed attempts leave no trace in
//!    the slot arena.
//! 4. Otherwise fall back to the variant rules for the requested cast.
//!
//! Unresolved slots on either side receive the selected type.

use std::sync::Arc;

use tarn_diagnostic::{CompileError, ErrorKind};
use tarn_ir::Info;

use crate::{MetaType, Scope};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum CastMode {
    Implicit,
    Explicit,
    Template,
}

impl MetaType {
    pub fn implicit_cast(
        &self,
        ctx: &Scope,
        info: &Info,
        to: &MetaType,
    ) -> Result<MetaType, CompileError> {
        self.cast(ctx, info, to, CastMode::Implicit, false)
    }

    pub fn explicit_cast(
        &self,
        ctx: &Scope,
        info: &Info,
        to: &MetaType,
    ) -> Result<MetaType, CompileError> {
        self.cast(ctx, info, to, CastMode::Explicit, false)
    }

    /// Unify `self` with `to`. `repeat` suppresses the bidirectional retry
    /// and is set when this call is itself such a retry.
    pub fn template_cast(
        &self,
        ctx: &Scope,
        info: &Info,
        to: &MetaType,
        repeat: bool,
    ) -> Result<MetaType, CompileError> {
        self.cast(ctx, info, to, CastMode::Template, repeat)
    }

    fn cast(
        &self,
        ctx: &Scope,
        info: &Info,
        to: &MetaType,
        mode: CastMode,
        repeat: bool,
    ) -> Result<MetaType, CompileError> {
        if let MetaType::Unresolved(slot) = self {
            let current = ctx.slot(*slot);
            // a concrete binding keeps its type when a value is converted
            let refine = mode == CastMode::Template || current.has_placeholder(ctx);
            let result = current.cast(ctx, info, to, mode, repeat)?;
            if refine {
                ctx.assign_slot(*slot, result.clone());
            }
            return Ok(result);
        }
        let (target_slot, target) = ctx.resolve_with_slot(to);
        let result = self.select(ctx, info, &target, mode, repeat)?;
        if let Some(slot) = target_slot {
            ctx.assign_slot(slot, result.clone());
        }
        Ok(result)
    }

    fn select(
        &self,
        ctx: &Scope,
        info: &Info,
        to: &MetaType,
        mode: CastMode,
        repeat: bool,
    ) -> Result<MetaType, CompileError> {
        match (self, to) {
            (_, MetaType::PlaceHolder) => return Ok(self.clone()),
            (MetaType::PlaceHolder, _) => return Ok(to.clone()),
            _ => {}
        }
        if self.binary(ctx) == to.binary(ctx) {
            return Ok(self.clone());
        }
        if !repeat {
            if mode != CastMode::Template {
                let forward = ctx.speculate(|| self.cast(ctx, info, to, CastMode::Template, true));
                if forward.is_ok() {
                    return forward;
                }
            }
            let backward = ctx.speculate(|| to.cast(ctx, info, self, CastMode::Template, true));
            if backward.is_ok() {
                return backward;
            }
        }
        self.structural(ctx, info, to, mode)
    }

    /// Variant rules. Neither side is a placeholder or unresolved here.
    fn structural(
        &self,
        ctx: &Scope,
        info: &Info,
        to: &MetaType,
        mode: CastMode,
    ) -> Result<MetaType, CompileError> {
        let converts = mode != CastMode::Template;
        let explicit = mode == CastMode::Explicit;
        match (self, to) {
            (MetaType::Not(from), MetaType::Not(inner)) => from
                .cast(ctx, info, inner, mode, false)
                .map(MetaType::not),
            (_, MetaType::Not(inner)) => self.cast(ctx, info, inner, mode, false).map(MetaType::not),
            (MetaType::Never, _) if converts => Ok(to.clone()),
            (MetaType::Int(_), MetaType::Int(_))
            | (MetaType::UInt(_), MetaType::UInt(_) | MetaType::Int(_))
                if converts =>
            {
                Ok(to.clone())
            }
            (MetaType::Int(_) | MetaType::Bool, MetaType::UInt(_))
            | (MetaType::Bool, MetaType::Int(_))
            | (MetaType::Int(_) | MetaType::UInt(_), MetaType::Bool)
                if explicit =>
            {
                Ok(to.clone())
            }
            (
                MetaType::Pointer {
                    mutable: from_mutable,
                    inner: from,
                },
                MetaType::Pointer {
                    mutable: to_mutable,
                    inner: target,
                },
            ) => {
                let allowed = match mode {
                    CastMode::Template => from_mutable == to_mutable,
                    CastMode::Implicit => *from_mutable || !*to_mutable,
                    CastMode::Explicit => true,
                };
                if !allowed {
                    return Err(cast_error(ctx, info, self, to));
                }
                let inner = from.template_cast(ctx, info, target, false)?;
                Ok(MetaType::Pointer {
                    mutable: *to_mutable,
                    inner: Arc::new(inner),
                })
            }
            (MetaType::Tuple(from), MetaType::Tuple(target)) => match from.unify(ctx, info, target)? {
                Some(shape) => Ok(MetaType::Tuple(shape)),
                None => Err(cast_error(ctx, info, self, to)),
            },
            (MetaType::Function(from), MetaType::Function(target)) => {
                match from.unify(ctx, info, target)? {
                    Some(function) => Ok(MetaType::Function(function)),
                    None => Err(cast_error(ctx, info, self, to)),
                }
            }
            _ => Err(cast_error(ctx, info, self, to)),
        }
    }
}

fn cast_error(ctx: &Scope, info: &Info, from: &MetaType, to: &MetaType) -> CompileError {
    CompileError::new(
        info.clone(),
        ErrorKind::CastFailed {
            from: from.name(ctx),
            to: to.name(ctx),
        },
    )
}
