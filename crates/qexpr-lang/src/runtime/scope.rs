use std::fmt::{self, Debug, Formatter};
use std::sync::PoisonError;

use crate::ast::node::Parameter;
use crate::compiler::compiled::{CompiledUnit, Program, UnitId};
use crate::value::Value;
use crate::{Shared, SharedCell};

/// The cell array a frame allocates for its hoisted parameters.
///
/// Every closure created by that frame shares the same cells, so a write
/// through one is visible to all of them.
#[derive(Clone)]
pub struct HoistedLocals(Shared<[SharedCell<Value>]>);

impl HoistedLocals {
    pub(crate) fn new(values: impl IntoIterator<Item = Value>) -> Self {
        Self(values.into_iter().map(SharedCell::new).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<Value> {
        self.0
            .get(position)
            .map(|cell| cell.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    /// Returns `false` if `position` is out of range.
    pub fn set(&self, position: usize, value: Value) -> bool {
        match self.0.get(position) {
            Some(cell) => {
                *cell.write().unwrap_or_else(PoisonError::into_inner) = value;
                true
            }
            None => false,
        }
    }

    pub fn ptr_eq(&self, other: &HoistedLocals) -> bool {
        Shared::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for HoistedLocals {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries((0..self.len()).filter_map(|i| self.get(i))).finish()
    }
}

/// The runtime scope a callable executes in.
///
/// It holds the program (units and constant pool), the unit to run, the
/// hoisted cells of the frame that created the callable, and that frame's
/// own scope. The parent link is owning: a closure keeps the scopes it reads
/// from alive after the creating call has returned.
///
/// A closure stored into a cell it captures (the recursive-lambda pattern)
/// forms a reference cycle through `locals`, so its scope chain is never
/// freed. Clear the cell with [`ExecutionScope::set_captured`] to break it.
pub struct ExecutionScope {
    pub(crate) program: Shared<Program>,
    pub(crate) unit: UnitId,
    pub(crate) locals: Option<HoistedLocals>,
    pub(crate) parent: Option<Shared<ExecutionScope>>,
}

impl ExecutionScope {
    pub(crate) fn root(program: Shared<Program>, unit: UnitId) -> Shared<Self> {
        Shared::new(Self {
            program,
            unit,
            locals: None,
            parent: None,
        })
    }

    /// A scope for `unit` created by a frame running in `self`.
    pub(crate) fn nested(self: &Shared<Self>, unit: UnitId, locals: Option<HoistedLocals>) -> Shared<Self> {
        Shared::new(Self {
            program: Shared::clone(&self.program),
            unit,
            locals,
            parent: Some(Shared::clone(self)),
        })
    }

    /// Cells captured from the creating frame. `None` for a root scope or
    /// when the creating unit hoists nothing.
    pub fn locals(&self) -> Option<&HoistedLocals> {
        self.locals.as_ref()
    }

    pub fn parent(&self) -> Option<&Shared<ExecutionScope>> {
        self.parent.as_ref()
    }

    #[inline]
    pub(crate) fn unit(&self) -> &CompiledUnit {
        &self.program.units[self.unit]
    }

    /// Cells `level + 1` frames up the scope chain.
    pub(crate) fn ancestor_locals(&self, level: usize) -> Option<&HoistedLocals> {
        let mut scope = self;
        for _ in 0..level {
            scope = scope.parent.as_deref()?;
        }
        scope.locals.as_ref()
    }

    /// Finds the cell holding `parameter`, walking the unit chain outwards.
    /// `own` are the cells of the frame currently running this scope's unit.
    fn find_cell<'a>(
        &'a self,
        own: Option<&'a HoistedLocals>,
        parameter: &Parameter,
    ) -> Option<(&'a HoistedLocals, usize)> {
        let mut unit_id = self.unit;
        let mut cells = own;
        let mut scope = Some(self);
        loop {
            let unit = &self.program.units[unit_id];
            if let Some(position) = unit.hoisted_position(parameter) {
                return cells.map(|cells| (cells, position));
            }
            let current = scope?;
            unit_id = unit.parent?;
            cells = current.locals.as_ref();
            scope = current.parent.as_deref();
        }
    }

    pub(crate) fn lookup(&self, own: Option<&HoistedLocals>, parameter: &Parameter) -> Option<Value> {
        let (cells, position) = self.find_cell(own, parameter)?;
        cells.get(position)
    }

    /// Current value of a parameter captured from an enclosing lambda.
    pub fn captured(&self, parameter: &Parameter) -> Option<Value> {
        self.lookup(None, parameter)
    }

    /// Overwrites a captured parameter. Every closure sharing the cell
    /// observes the new value. Returns `false` if nothing captures it.
    pub fn set_captured(&self, parameter: &Parameter, value: Value) -> bool {
        match self.find_cell(None, parameter) {
            Some((cells, position)) => cells.set(position, value),
            None => false,
        }
    }
}

impl Debug for ExecutionScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionScope")
            .field("unit", &self.unit)
            .field("locals", &self.locals)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hoisted_locals_are_shared_between_clones() {
        let cells = HoistedLocals::new([Value::I32(1), Value::Null]);
        let alias = cells.clone();
        assert!(alias.set(1, Value::Bool(true)));
        assert_eq!(cells.get(1), Some(Value::Bool(true)));
        assert!(cells.ptr_eq(&alias));
        assert!(!cells.set(2, Value::Null));
        assert_eq!(cells.get(2), None);
        assert_eq!(cells.len(), 2);
    }
}
