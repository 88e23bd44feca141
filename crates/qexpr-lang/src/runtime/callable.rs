use std::fmt::{self, Debug, Formatter};

use smallvec::SmallVec;

use super::scope::ExecutionScope;
use crate::ast::types::Signature;
use crate::compiler::call_stack::check_call_depth;
use crate::compiler::compiled::Frame;
use crate::error::runtime::RuntimeError;
use crate::value::Value;
use crate::{Ident, Shared};

/// A compiled lambda bound to a runtime scope.
///
/// Cloning is cheap; equality is identity of the bound scope. Callables are
/// `Send + Sync` and may be invoked from several threads at once: every
/// invocation gets its own frame and hoisted cells.
#[derive(Clone)]
pub struct Callable {
    scope: Shared<ExecutionScope>,
}

impl Callable {
    pub(crate) fn new(scope: Shared<ExecutionScope>) -> Self {
        Self { scope }
    }

    pub fn signature(&self) -> &Shared<Signature> {
        &self.scope.unit().signature
    }

    pub fn name(&self) -> Option<Ident> {
        self.scope.unit().name
    }

    pub fn scope(&self) -> &Shared<ExecutionScope> {
        &self.scope
    }

    /// Runs the callable with `args`, which must match its signature.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        self.invoke_at(args, 0)
    }

    pub(crate) fn invoke_at(&self, args: &[Value], depth: u32) -> Result<Value, RuntimeError> {
        let unit = self.scope.unit();
        check_call_depth(depth, self.scope.program.options.max_call_depth)?;

        let params = &unit.signature.params;
        if args.len() != params.len() {
            return Err(RuntimeError::ArgumentCount {
                expected: params.len(),
                got: args.len(),
            });
        }
        if let Some((index, (arg, ty))) = args
            .iter()
            .zip(params.iter())
            .enumerate()
            .find(|(_, (arg, ty))| !arg.conforms_to(ty))
        {
            return Err(RuntimeError::ArgumentType {
                index,
                expected: ty.clone(),
                got: arg.type_name(),
            });
        }

        let mut slots: SmallVec<[Value; 8]> = SmallVec::with_capacity(unit.slot_count);
        slots.extend(args.iter().cloned());
        slots.resize(unit.slot_count.max(args.len()), Value::Null);
        let mut frame = Frame {
            scope: &self.scope,
            slots,
            hoisted: None,
            depth,
        };
        unit.run(&mut frame)
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        Shared::ptr_eq(&self.scope, &other.scope)
    }
}

impl Debug for Callable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name())
            .field("signature", &self.signature().to_string())
            .finish()
    }
}
