//! Lexical environments.
//!
//! # Design
//!
//! A [`Scope`] maps names to [`Variable`]s and shares a [`Frame`] with every
//! other scope of the same function resolution. The frame owns the slot
//! arena behind [`MetaType::Unresolved`] and the fail-path bookkeeping:
//!
//! - `handle_error` marks that the body has a fail site and hands out the
//!   shared error-payload slot;
//! - `finalize_error_type` unifies that slot with the body's normal result
//!   once it is known.
//!
//! Child scopes copy the parent's bindings, so lookups never walk a chain.
//! Redefinition is checked against the names defined in the scope itself;
//! a child may shadow its parent.
//!
//! Scopes are single-threaded (`Rc`/`RefCell`): each function resolution
//! runs on one thread and its frame dies with it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bitflags::bitflags;
use rustc_hash::{FxHashMap, FxHashSet};
use tarn_diagnostic::{CompileError, ErrorKind};
use tarn_ir::{Info, Name};

use crate::meta::SlotId;
use crate::{Convention, MetaType, TypedValue};

bitflags! {
    /// What a binding may be used for.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct VariableAbility: u8 {
        /// Target of `in label`.
        const JUMP = 1 << 0;
        /// Holds a value that can be read and stored.
        const STORE_READ = 1 << 1;
        const FULL = Self::JUMP.bits() | Self::STORE_READ.bits();
    }
}

/// A binding.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Variable {
    pub ability: VariableAbility,
    pub value: TypedValue,
}

/// Per-resolution state shared by all scopes of one function body.
#[derive(Debug)]
struct Frame {
    slots: RefCell<Vec<MetaType>>,
    error_slot: SlotId,
    has_error: Cell<bool>,
}

impl Frame {
    fn new() -> Rc<Self> {
        Rc::new(Frame {
            slots: RefCell::new(vec![MetaType::PlaceHolder]),
            error_slot: SlotId::new(0),
            has_error: Cell::new(false),
        })
    }
}

/// Variable environment of a block.
#[derive(Debug)]
pub struct Scope {
    variables: FxHashMap<Name, Variable>,
    local: FxHashSet<Name>,
    frame: Rc<Frame>,
}

impl Scope {
    /// A top-level scope with a frame of its own.
    pub fn create() -> Self {
        Scope {
            variables: FxHashMap::default(),
            local: FxHashSet::default(),
            frame: Frame::new(),
        }
    }

    /// The scope of a function body being specialized: a fresh frame in
    /// which each formal is bound to its resolved argument.
    ///
    /// A still unknown argument type is bound through a fresh slot so uses
    /// in the body can refine it.
    pub fn fictive_variables<'a>(
        info: &Info,
        arguments: impl IntoIterator<Item = (&'a Name, &'a TypedValue)>,
    ) -> Result<Self, CompileError> {
        let mut scope = Scope::create();
        for (name, value) in arguments {
            scope.create_argument(info, name.clone(), value.clone())?;
        }
        Ok(scope)
    }

    /// Child scope keeping every ability. Used for blocks and branches.
    pub fn block(&self) -> Self {
        Scope {
            variables: self.variables.clone(),
            local: FxHashSet::default(),
            frame: Rc::clone(&self.frame),
        }
    }

    /// Child scope in which no binding can be jumped to. Used for call
    /// targets and argument expressions. Outer labels stay visible with no
    /// ability left.
    pub fn isolated(&self) -> Self {
        let variables = self
            .variables
            .iter()
            .map(|(name, variable)| {
                (
                    name.clone(),
                    Variable {
                        ability: variable.ability - VariableAbility::JUMP,
                        value: variable.value.clone(),
                    },
                )
            })
            .collect();
        Scope {
            variables,
            local: FxHashSet::default(),
            frame: Rc::clone(&self.frame),
        }
    }

    pub fn create_variable(
        &mut self,
        info: &Info,
        name: Name,
        value: TypedValue,
    ) -> Result<TypedValue, CompileError> {
        self.bind(info, name, value, VariableAbility::FULL)
    }

    pub fn create_argument(
        &mut self,
        info: &Info,
        name: Name,
        value: TypedValue,
    ) -> Result<TypedValue, CompileError> {
        self.bind(info, name, value, VariableAbility::STORE_READ)
    }

    fn bind(
        &mut self,
        info: &Info,
        name: Name,
        value: TypedValue,
        ability: VariableAbility,
    ) -> Result<TypedValue, CompileError> {
        if !value.ty.convention(self).contains(Convention::INIT_VARIABLE) {
            return Err(CompileError::new(
                info.clone(),
                ErrorKind::UnsuitableVariableType(value.ty.name(self)),
            ));
        }
        let value = if value.ty.is_placeholder(self) {
            TypedValue::new(value.mutability, self.fresh_slot(MetaType::PlaceHolder))
        } else {
            value
        };
        self.insert(
            info,
            name,
            Variable {
                ability,
                value: value.clone(),
            },
        )?;
        Ok(value)
    }

    pub fn create_label(&mut self, info: &Info, name: Name) -> Result<(), CompileError> {
        self.insert(
            info,
            name,
            Variable {
                ability: VariableAbility::JUMP,
                value: TypedValue::void(),
            },
        )
    }

    fn insert(&mut self, info: &Info, name: Name, variable: Variable) -> Result<(), CompileError> {
        if !self.local.insert(name.clone()) {
            return Err(CompileError::new(
                info.clone(),
                ErrorKind::AlreadyDefined(name.to_string()),
            ));
        }
        tracing::trace!(name = %name, ability = ?variable.ability, "bind");
        self.variables.insert(name, variable);
        Ok(())
    }

    pub fn get_variable(&self, info: &Info, name: &Name) -> Result<TypedValue, CompileError> {
        match self.variables.get(name) {
            None => Err(CompileError::new(
                info.clone(),
                ErrorKind::Undefined(name.to_string()),
            )),
            Some(variable) if !variable.ability.contains(VariableAbility::STORE_READ) => Err(
                CompileError::new(info.clone(), ErrorKind::LabelAsVariable(name.to_string())),
            ),
            Some(variable) => Ok(variable.value.clone()),
        }
    }

    pub fn validate_label(&self, info: &Info, name: &Name) -> Result<(), CompileError> {
        match self.variables.get(name) {
            Some(variable) if variable.ability.contains(VariableAbility::JUMP) => Ok(()),
            Some(_) => Err(CompileError::new(
                info.clone(),
                ErrorKind::NotALabel(name.to_string()),
            )),
            None => Err(CompileError::new(
                info.clone(),
                ErrorKind::Undefined(name.to_string()),
            )),
        }
    }

    /// Mark that the body has a fail path and return the shared error
    /// payload type.
    pub fn handle_error(&self) -> MetaType {
        self.frame.has_error.set(true);
        MetaType::Unresolved(self.frame.error_slot)
    }

    pub fn has_error(&self) -> bool {
        self.frame.has_error.get()
    }

    /// Unify the error payload type with the body's success type and
    /// return the payload type. A `never` success leaves the payload as the
    /// fail sites made it.
    pub fn finalize_error_type(
        &self,
        info: &Info,
        success: &MetaType,
    ) -> Result<MetaType, CompileError> {
        let slot = MetaType::Unresolved(self.frame.error_slot);
        if !matches!(self.resolve(success), MetaType::Never) {
            success.implicit_cast(self, info, &slot)?;
        }
        Ok(self.fixate(&slot))
    }

    /// Allocate a slot bound to `initial`.
    pub fn fresh_slot(&self, initial: MetaType) -> MetaType {
        let mut slots = self.frame.slots.borrow_mut();
        #[allow(clippy::cast_possible_truncation, reason = "slot counts stay far below u32::MAX")]
        let id = SlotId::new(slots.len() as u32);
        slots.push(initial);
        MetaType::Unresolved(id)
    }

    /// Current binding of `slot`.
    pub(crate) fn slot(&self, slot: SlotId) -> MetaType {
        let slots = self.frame.slots.borrow();
        debug_assert!(slot.index() < slots.len(), "slot from another frame");
        slots
            .get(slot.index())
            .cloned()
            .unwrap_or(MetaType::PlaceHolder)
    }

    /// Rebind `slot`. A binding that would make the slot contain itself is
    /// ignored.
    pub(crate) fn assign_slot(&self, slot: SlotId, ty: MetaType) {
        if ty.mentions(self, slot) {
            return;
        }
        if let Some(current) = self.frame.slots.borrow_mut().get_mut(slot.index()) {
            *current = ty;
        }
    }

    /// Run `attempt`, undoing its slot assignments if it fails.
    pub(crate) fn speculate<T>(
        &self,
        attempt: impl FnOnce() -> Result<T, CompileError>,
    ) -> Result<T, CompileError> {
        let snapshot = self.frame.slots.borrow().clone();
        let result = attempt();
        if result.is_err() {
            let mut slots = self.frame.slots.borrow_mut();
            for (slot, saved) in slots.iter_mut().zip(snapshot) {
                *slot = saved;
            }
        }
        result
    }

    /// Follow slot bindings to the first type that is not a slot.
    pub fn resolve(&self, ty: &MetaType) -> MetaType {
        self.resolve_with_slot(ty).1
    }

    /// Like [`Scope::resolve`], also returning the last slot on the way.
    pub(crate) fn resolve_with_slot(&self, ty: &MetaType) -> (Option<SlotId>, MetaType) {
        let mut last = None;
        let mut current = ty.clone();
        let limit = self.frame.slots.borrow().len();
        for _ in 0..=limit {
            match current {
                MetaType::Unresolved(slot) => {
                    last = Some(slot);
                    current = self.slot(slot);
                }
                other => return (last, other),
            }
        }
        (last, MetaType::PlaceHolder)
    }

    /// Replace every slot in `ty`, at any depth, with its binding.
    pub fn fixate(&self, ty: &MetaType) -> MetaType {
        match ty {
            MetaType::Unresolved(_) => {
                let resolved = self.resolve(ty);
                self.fixate(&resolved)
            }
            MetaType::Not(inner) => MetaType::not(self.fixate(inner)),
            MetaType::Pointer { mutable, inner } => MetaType::pointer(*mutable, self.fixate(inner)),
            MetaType::Tuple(shape) => MetaType::Tuple(shape.fixate(self)),
            MetaType::Function(function) => MetaType::Function(function.fixate(self)),
            other => other.clone(),
        }
    }

    /// The binding for `name`, if any, without ability checks.
    pub fn lookup(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }
}
