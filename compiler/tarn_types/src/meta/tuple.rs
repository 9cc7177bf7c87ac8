//! Tuple shapes.

use std::fmt;
use std::sync::Arc;

use tarn_diagnostic::{CompileError, ErrorKind};
use tarn_ir::{Info, IntWidth};

use crate::binary::{BinaryTypeBuilder, Tag};
use crate::{MetaType, Scope, TypedValue};

/// The three representations of a tuple.
///
/// All three encode to the same signature as the equivalent element list,
/// so `(i32, i32)` is equal to `(2 i32)` wherever shapes are compared.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum TupleShape {
    /// Heterogeneous element list.
    Basic(Arc<[MetaType]>),
    /// `count` elements sharing one structural signature.
    Homogeneous {
        count: usize,
        element: Arc<MetaType>,
    },
    /// A call target followed by bound arguments.
    Callable {
        function: Arc<MetaType>,
        args: Arc<[MetaType]>,
    },
}

impl TupleShape {
    /// Pick the shape for `elements`: callable when the first element can be
    /// called, homogeneous when every element has the same signature, basic
    /// otherwise.
    pub fn create(
        ctx: &Scope,
        info: &Info,
        elements: Vec<MetaType>,
    ) -> Result<TupleShape, CompileError> {
        let Some((first, rest)) = elements.split_first() else {
            return Err(CompileError::new(info.clone(), ErrorKind::TupleTooShort));
        };
        if rest.is_empty() {
            return Err(CompileError::new(info.clone(), ErrorKind::TupleTooShort));
        }
        if first.callable(ctx) {
            return Ok(TupleShape::Callable {
                function: Arc::new(first.clone()),
                args: rest.iter().cloned().collect(),
            });
        }
        let signature = first.binary(ctx);
        if rest.iter().all(|e| e.binary(ctx) == signature) {
            return Ok(TupleShape::Homogeneous {
                count: elements.len(),
                element: Arc::new(first.clone()),
            });
        }
        Ok(TupleShape::Basic(elements.into()))
    }

    pub fn count(&self) -> usize {
        match self {
            TupleShape::Basic(elements) => elements.len(),
            TupleShape::Homogeneous { count, .. } => *count,
            TupleShape::Callable { args, .. } => args.len() + 1,
        }
    }

    /// The element list, with homogeneous tuples expanded.
    pub fn elements(&self) -> Vec<MetaType> {
        match self {
            TupleShape::Basic(elements) => elements.to_vec(),
            TupleShape::Homogeneous { count, element } => vec![MetaType::clone(element); *count],
            TupleShape::Callable { function, args } => std::iter::once(MetaType::clone(function))
                .chain(args.iter().cloned())
                .collect(),
        }
    }

    pub fn name(&self, ctx: &Scope) -> String {
        match self {
            TupleShape::Basic(elements) => {
                let names: Vec<String> = elements.iter().map(|e| e.name(ctx)).collect();
                format!("({})", names.join(", "))
            }
            TupleShape::Homogeneous { count, element } => {
                format!("({count} {})", element.name(ctx))
            }
            TupleShape::Callable { function, args } => {
                let names: Vec<String> = std::iter::once(function.name(ctx))
                    .chain(args.iter().map(|a| a.name(ctx)))
                    .collect();
                format!("({})", names.join(", "))
            }
        }
    }

    pub(crate) fn write_binary(&self, ctx: &Scope, builder: &mut BinaryTypeBuilder) {
        builder.push_tag(Tag::TupleStart);
        match self {
            TupleShape::Basic(elements) => {
                for element in elements.iter() {
                    element.write_binary(ctx, builder);
                }
            }
            TupleShape::Homogeneous { count, element } => {
                for _ in 0..*count {
                    element.write_binary(ctx, builder);
                }
            }
            TupleShape::Callable { function, args } => {
                function.write_binary(ctx, builder);
                for arg in args.iter() {
                    arg.write_binary(ctx, builder);
                }
            }
        }
        builder.push_tag(Tag::TupleEnd);
    }

    /// Type of `tuple.index`.
    pub fn access_index(
        &self,
        ctx: &Scope,
        info: &Info,
        index: usize,
    ) -> Result<MetaType, CompileError> {
        let element = match self {
            TupleShape::Basic(elements) => elements.get(index).cloned(),
            TupleShape::Homogeneous { count, element } => {
                (index < *count).then(|| MetaType::clone(element))
            }
            TupleShape::Callable { function, args } => {
                if index == 0 {
                    Some(MetaType::clone(function))
                } else {
                    args.get(index - 1).cloned()
                }
            }
        };
        element.ok_or_else(|| {
            CompileError::new(
                info.clone(),
                ErrorKind::IndexOutOfRange {
                    index,
                    ty: self.name(ctx),
                },
            )
        })
    }

    /// Type of `tuple.name`. Only `len` is defined.
    pub fn access_name(
        &self,
        ctx: &Scope,
        info: &Info,
        name: &str,
    ) -> Result<MetaType, CompileError> {
        if name == "len" {
            return Ok(MetaType::Int(IntWidth::W32));
        }
        Err(CompileError::new(
            info.clone(),
            ErrorKind::NoField {
                ty: self.name(ctx),
                field: name.to_owned(),
            },
        ))
    }

    /// Type of `tuple[i]`, defined for homogeneous tuples only.
    pub fn index_addressation(&self, ctx: &Scope, info: &Info) -> Result<MetaType, CompileError> {
        match self {
            TupleShape::Homogeneous { element, .. } => Ok(MetaType::clone(element)),
            _ => Err(CompileError::new(
                info.clone(),
                ErrorKind::NoIndexAddressation(self.name(ctx)),
            )),
        }
    }

    /// The call target and the bound arguments as typed values.
    pub(crate) fn callable_parts(&self, ctx: &Scope) -> Option<(&MetaType, Vec<TypedValue>)> {
        match self {
            TupleShape::Callable { function, args } => Some((
                function,
                args.iter().map(|a| TypedValue::of(ctx, a.clone())).collect(),
            )),
            _ => None,
        }
    }

    /// Unify element-wise. `Ok(None)` when the element counts differ.
    pub(crate) fn unify(
        &self,
        ctx: &Scope,
        info: &Info,
        to: &TupleShape,
    ) -> Result<Option<TupleShape>, CompileError> {
        if self.count() != to.count() {
            return Ok(None);
        }
        if let (
            TupleShape::Homogeneous { count, element },
            TupleShape::Homogeneous { element: target, .. },
        ) = (self, to)
        {
            let element = element
                .template_cast(ctx, info, target, false)
                .map_err(|e| e.within("at element 1"))?;
            return Ok(Some(TupleShape::Homogeneous {
                count: *count,
                element: Arc::new(element),
            }));
        }
        let unified = self
            .elements()
            .iter()
            .zip(to.elements().iter())
            .enumerate()
            .map(|(i, (from, target))| {
                from.template_cast(ctx, info, target, false)
                    .map_err(|e| e.within(format!("at element {}", i + 1)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        TupleShape::create(ctx, info, unified).map(Some)
    }

    /// Replace every unresolved slot with its final type.
    #[must_use]
    pub(crate) fn fixate(&self, ctx: &Scope) -> TupleShape {
        match self {
            TupleShape::Basic(elements) => {
                TupleShape::Basic(elements.iter().map(|e| ctx.fixate(e)).collect())
            }
            TupleShape::Homogeneous { count, element } => TupleShape::Homogeneous {
                count: *count,
                element: Arc::new(ctx.fixate(element)),
            },
            TupleShape::Callable { function, args } => TupleShape::Callable {
                function: Arc::new(ctx.fixate(function)),
                args: args.iter().map(|a| ctx.fixate(a)).collect(),
            },
        }
    }
}

impl fmt::Display for TupleShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TupleShape::Homogeneous { count, element } => write!(f, "({count} {element})"),
            TupleShape::Basic(elements) => {
                f.write_str("(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str(")")
            }
            TupleShape::Callable { function, args } => {
                write!(f, "({function}")?;
                for arg in args.iter() {
                    write!(f, ", {arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}
