use crate::Shared;
use crate::ast::node::{Node, NodeKind, UnaryExpr};
use crate::ast::types::Type;
use crate::compiler::compiled::CompiledExpr;
use crate::compiler::emitter::Emitter;
use crate::error::compile::CompileError;
use crate::runtime::ops;
use crate::value::Value;

impl Emitter<'_> {
    pub(crate) fn emit_convert(&mut self, node: &Shared<Node>, unary: &UnaryExpr) -> Result<CompiledExpr, CompileError> {
        let operand = self.emit(&unary.operand)?;
        if let Some(method) = &unary.method {
            let method = method.clone();
            let lifted = unary.lifted;
            return Ok(Box::new(move |frame| {
                let value = operand(frame)?;
                if lifted && value.is_null() {
                    return Ok(Value::Null);
                }
                method.invoke(&[value])
            }));
        }

        let checked = node.kind == NodeKind::ConvertChecked;
        let convert = ops::conversion(&unary.operand.ty, &node.ty, checked).ok_or_else(|| {
            CompileError::unsupported(
                node.kind,
                format!("no conversion from {} to {}", unary.operand.ty, node.ty),
            )
        })?;
        Ok(Box::new(move |frame| convert(operand(frame)?)))
    }

    /// `operand as T`: the operand when it conforms to `T`, `null` otherwise.
    pub(crate) fn emit_type_as(&mut self, node: &Shared<Node>, unary: &UnaryExpr) -> Result<CompiledExpr, CompileError> {
        if !node.ty.admits_null() {
            return Err(CompileError::unsupported(
                NodeKind::TypeAs,
                format!("{} cannot hold null", node.ty),
            ));
        }
        let target = node.ty.clone();
        let operand = self.emit(&unary.operand)?;
        Ok(Box::new(move |frame| {
            let value = operand(frame)?;
            Ok(if value.conforms_to(&target) { value } else { Value::Null })
        }))
    }

    pub(crate) fn emit_type_is(&mut self, operand: &Shared<Node>, ty: &Type) -> Result<CompiledExpr, CompileError> {
        let target = ty.clone();
        let operand = self.emit(operand)?;
        Ok(Box::new(move |frame| {
            let value = operand(frame)?;
            Ok(Value::Bool(!value.is_null() && value.conforms_to(&target)))
        }))
    }
}
