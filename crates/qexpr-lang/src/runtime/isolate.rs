//! Materializes quoted sub-trees into scope-independent expressions.

use rustc_hash::FxHashMap;
use tracing::trace;

use super::scope::{ExecutionScope, HoistedLocals};
use crate::Shared;
use crate::ast::node::Node;
use crate::ast::visit::{free_parameters, replace_parameters};
use crate::error::runtime::RuntimeError;

/// Rewrites every free parameter read in `subtree` into a constant holding
/// the current value of its hoisted cell.
///
/// `hoisted` are the cells of the frame running `scope`'s unit. The scope is
/// only read; isolating twice from the same state yields equivalent trees.
pub fn isolate(
    scope: &ExecutionScope,
    hoisted: Option<&HoistedLocals>,
    subtree: &Shared<Node>,
) -> Result<Shared<Node>, RuntimeError> {
    let free = free_parameters(subtree);
    let mut values = FxHashMap::default();
    values.reserve(free.len());
    for parameter in &free {
        let value = scope.lookup(hoisted, parameter).ok_or(RuntimeError::MissingScope)?;
        values.insert(parameter.id(), value);
    }
    trace!(parameters = free.len(), "isolated quoted expression");
    Ok(replace_parameters(subtree, &values))
}
