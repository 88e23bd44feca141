use crate::Shared;
use crate::ast::node::{BinaryExpr, Node};
use crate::compiler::compiled::CompiledExpr;
use crate::compiler::emitter::Emitter;
use crate::error::compile::CompileError;
use crate::error::runtime::RuntimeError;
use crate::runtime::ops::as_bool;
use crate::value::Value;

impl Emitter<'_> {
    pub(crate) fn emit_conditional(
        &mut self,
        test: &Shared<Node>,
        if_true: &Shared<Node>,
        if_false: &Shared<Node>,
    ) -> Result<CompiledExpr, CompileError> {
        let test = self.emit(test)?;
        let if_true = self.emit(if_true)?;
        let if_false = self.emit(if_false)?;
        Ok(Box::new(move |frame| {
            if as_bool(test(frame)?)? {
                if_true(frame)
            } else {
                if_false(frame)
            }
        }))
    }

    /// `left ?? right`, optionally converting a present left value.
    pub(crate) fn emit_coalesce(&mut self, binary: &BinaryExpr) -> Result<CompiledExpr, CompileError> {
        let left = self.emit(&binary.left)?;
        let right = self.emit(&binary.right)?;
        let Some(conversion) = &binary.conversion else {
            return Ok(Box::new(move |frame| {
                let l = left(frame)?;
                if l.is_null() { right(frame) } else { Ok(l) }
            }));
        };

        let convert = self.emit_create_closure(conversion)?;
        Ok(Box::new(move |frame| {
            let l = left(frame)?;
            if l.is_null() {
                return right(frame);
            }
            match convert(frame)? {
                Value::Function(callable) => callable.invoke_at(&[l], frame.depth + 1),
                other => Err(RuntimeError::NotCallable(other.type_name())),
            }
        }))
    }
}
