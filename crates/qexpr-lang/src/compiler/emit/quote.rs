use tracing::trace;

use crate::Shared;
use crate::ast::node::Node;
use crate::ast::visit::free_parameters;
use crate::compiler::compiled::CompiledExpr;
use crate::compiler::emitter::Emitter;
use crate::error::compile::CompileError;
use crate::error::runtime::RuntimeError;
use crate::runtime::isolate;
use crate::value::Value;

impl Emitter<'_> {
    /// Pools the quoted tree and isolates it against the running scope each
    /// time the quote is evaluated.
    pub(crate) fn emit_quote(&mut self, operand: &Shared<Node>) -> Result<CompiledExpr, CompileError> {
        let free = free_parameters(operand);
        for parameter in &free {
            self.resolve(parameter)?;
        }
        trace!(free = free.len(), "emitting quote");

        let id = self.context.add_global(&Value::Expression(Shared::clone(operand)));
        Ok(Box::new(move |frame| {
            let Value::Expression(tree) = frame.global(id) else {
                return Err(RuntimeError::MissingScope);
            };
            let isolated = isolate(frame.scope, frame.hoisted.as_ref(), &tree)?;
            Ok(Value::Expression(isolated))
        }))
    }
}
