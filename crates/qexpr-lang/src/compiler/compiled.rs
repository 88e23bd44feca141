//! Compiled expression types.
//!
//! A compiled node is a closure over its compiled children. It runs against a
//! [`Frame`]: the argument and temporary slots of one invocation, the cells
//! that invocation allocated for its hoisted parameters, and the scope the
//! callable was bound to.

use std::fmt::{self, Debug, Formatter};

use smallvec::SmallVec;

use super::CompilerOptions;
use crate::arena::{Arena, ArenaId};
use crate::ast::node::Parameter;
use crate::ast::types::Signature;
use crate::error::runtime::RuntimeError;
use crate::runtime::scope::{ExecutionScope, HoistedLocals};
use crate::value::Value;
use crate::{Ident, Shared};

/// A compiled expression represented as a dynamically-dispatched closure.
///
/// ## Example
///
/// ```rust,ignore
/// let compiled: CompiledExpr = Box::new(|_frame| Ok(Value::I32(42)));
/// assert_eq!(compiled(&mut frame)?, Value::I32(42));
/// ```
pub type CompiledExpr = Box<dyn Fn(&mut Frame<'_>) -> Result<Value, RuntimeError> + Send + Sync>;

pub type UnitId = ArenaId<CompiledUnit>;
pub type GlobalId = ArenaId<Value>;

/// The state of one invocation of a compiled unit.
pub struct Frame<'a> {
    pub(crate) scope: &'a Shared<ExecutionScope>,
    /// Arguments first, then stored temporaries.
    pub(crate) slots: SmallVec<[Value; 8]>,
    pub(crate) hoisted: Option<HoistedLocals>,
    pub(crate) depth: u32,
}

impl Frame<'_> {
    #[inline]
    pub(crate) fn load(&self, slot: usize) -> Value {
        self.slots.get(slot).cloned().unwrap_or_default()
    }

    #[inline]
    pub(crate) fn store(&mut self, slot: usize, value: Value) {
        if let Some(target) = self.slots.get_mut(slot) {
            *target = value;
        }
    }

    #[inline]
    pub(crate) fn global(&self, id: GlobalId) -> Value {
        self.scope.program.globals.get(id).cloned().unwrap_or_default()
    }

    #[inline]
    pub(crate) fn own_locals(&self) -> Result<&HoistedLocals, RuntimeError> {
        self.hoisted.as_ref().ok_or(RuntimeError::MissingScope)
    }
}

/// A parameter the unit boxes into a cell because a nested lambda uses it.
#[derive(Debug, Clone)]
pub struct HoistedVariable {
    pub parameter: Shared<Parameter>,
    /// Slot of the incoming argument.
    pub argument: usize,
    /// Index in the unit's cell array.
    pub position: usize,
}

/// The generated code of one lambda.
pub struct CompiledUnit {
    pub(crate) name: Option<Ident>,
    pub(crate) signature: Shared<Signature>,
    pub(crate) hoisted: Vec<HoistedVariable>,
    pub(crate) parent: Option<UnitId>,
    /// Arguments plus stored temporaries.
    pub(crate) slot_count: usize,
    pub(crate) body: CompiledExpr,
}

impl CompiledUnit {
    pub(crate) fn hoisted_position(&self, parameter: &Parameter) -> Option<usize> {
        self.hoisted
            .iter()
            .find(|variable| variable.parameter.id() == parameter.id())
            .map(|variable| variable.position)
    }

    /// Boxes every hoisted argument into a fresh cell array, then runs the body.
    pub(crate) fn run(&self, frame: &mut Frame<'_>) -> Result<Value, RuntimeError> {
        if !self.hoisted.is_empty() {
            let cells = HoistedLocals::new(self.hoisted.iter().map(|variable| frame.load(variable.argument)));
            frame.hoisted = Some(cells);
        }
        (self.body)(frame)
    }
}

impl Debug for CompiledUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledUnit")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("hoisted", &self.hoisted)
            .field("parent", &self.parent)
            .field("slot_count", &self.slot_count)
            .finish()
    }
}

/// Every unit compiled from one root lambda and the constant pool they share.
/// Read-only once compilation finishes.
#[derive(Debug)]
pub struct Program {
    pub(crate) units: Arena<CompiledUnit>,
    pub(crate) globals: Arena<Value>,
    pub(crate) options: CompilerOptions,
}

impl Program {
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn global_count(&self) -> usize {
        self.globals.len()
    }

    /// Parameters each unit hoists, by unit.
    pub fn hoisted_variables(&self) -> impl Iterator<Item = (UnitId, &[HoistedVariable])> {
        self.units.iter().map(|(id, unit)| (id, unit.hoisted.as_slice()))
    }
}
