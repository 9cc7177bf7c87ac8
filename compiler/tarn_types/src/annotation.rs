//! Type annotations to types.

use std::sync::Arc;

use tarn_diagnostic::{CompileError, ErrorKind};
use tarn_ir::{Info, TypeAnnot};

use crate::{MetaType, Scope, TupleShape};

/// The type an annotation denotes. `info` locates the annotation for
/// diagnostics.
pub fn resolve_annotation(info: &Info, annot: &TypeAnnot) -> Result<MetaType, CompileError> {
    // annotations never contain slots, so any frame works as context
    let ctx = Scope::create();
    lower(&ctx, info, annot)
}

fn lower(ctx: &Scope, info: &Info, annot: &TypeAnnot) -> Result<MetaType, CompileError> {
    Ok(match annot {
        TypeAnnot::PlaceHolder => MetaType::PlaceHolder,
        TypeAnnot::Bool => MetaType::Bool,
        TypeAnnot::Void => MetaType::Void,
        TypeAnnot::Never => MetaType::Never,
        TypeAnnot::Int(width) => MetaType::Int(*width),
        TypeAnnot::UInt(width) => MetaType::UInt(*width),
        TypeAnnot::Tuple(elements) => {
            let elements = elements
                .iter()
                .map(|element| lower(ctx, info, element))
                .collect::<Result<Vec<_>, _>>()?;
            MetaType::Tuple(TupleShape::create(ctx, info, elements)?)
        }
        TypeAnnot::Homogeneous { count, element } => {
            let element = lower(ctx, info, element)?;
            if *count < 2 {
                return Err(CompileError::new(
                    info.clone(),
                    ErrorKind::TupleTooShort,
                ));
            }
            MetaType::Tuple(TupleShape::Homogeneous {
                count: *count,
                element: Arc::new(element),
            })
        }
        TypeAnnot::Pointer { mutable, inner } => {
            MetaType::pointer(*mutable, lower(ctx, info, inner)?)
        }
        TypeAnnot::Fallible(inner) => MetaType::not(lower(ctx, info, inner)?),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tarn_ir::IntWidth;

    use super::*;

    fn lower_ok(annot: &TypeAnnot) -> MetaType {
        match resolve_annotation(&Info::default(), annot) {
            Ok(ty) => ty,
            Err(err) => panic!("annotation failed: {err}"),
        }
    }

    #[test]
    fn primitives_and_wrappers() {
        assert_eq!(lower_ok(&TypeAnnot::Int(IntWidth::W16)), MetaType::Int(IntWidth::W16));
        assert_eq!(
            lower_ok(&TypeAnnot::Pointer {
                mutable: true,
                inner: Box::new(TypeAnnot::UInt(IntWidth::W8)),
            })
            .to_string(),
            "^mut u8"
        );
        assert_eq!(
            lower_ok(&TypeAnnot::Fallible(Box::new(TypeAnnot::Bool))).to_string(),
            "!bool"
        );
    }

    #[test]
    fn equal_elements_make_a_homogeneous_tuple() {
        let ty = lower_ok(&TypeAnnot::Tuple(vec![
            TypeAnnot::Int(IntWidth::W32),
            TypeAnnot::Int(IntWidth::W32),
        ]));
        assert_eq!(ty.to_string(), "(2 i32)");

        let mixed = lower_ok(&TypeAnnot::Tuple(vec![
            TypeAnnot::Int(IntWidth::W32),
            TypeAnnot::Bool,
        ]));
        assert_eq!(mixed.to_string(), "(i32, bool)");
    }

    #[test]
    fn short_tuples_are_rejected() {
        let single = TypeAnnot::Tuple(vec![TypeAnnot::Bool]);
        let err = resolve_annotation(&Info::default(), &single).err();
        assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::TupleTooShort));

        let homogeneous = TypeAnnot::Homogeneous {
            count: 1,
            element: Box::new(TypeAnnot::Bool),
        };
        assert!(resolve_annotation(&Info::default(), &homogeneous).is_err());
    }
}
