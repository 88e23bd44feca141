use crate::Shared;
use crate::ast::member::Method;
use crate::ast::node::{BinaryExpr, Node, NodeKind};
use crate::compiler::compiled::CompiledExpr;
use crate::compiler::emitter::Emitter;
use crate::error::compile::CompileError;
use crate::error::runtime::RuntimeError;
use crate::runtime::ops::as_bool;
use crate::value::Value;

/// Reads an optional boolean: `Some` for a value, `None` for `null`.
fn optional_bool(value: Value) -> Result<Option<bool>, RuntimeError> {
    match value {
        Value::Null => Ok(None),
        other => as_bool(other).map(Some),
    }
}

impl Emitter<'_> {
    /// Three-valued `And`/`Or` over optional booleans. Both operands are
    /// always evaluated.
    pub(crate) fn emit_kleene(&mut self, kind: NodeKind, binary: &BinaryExpr) -> Result<CompiledExpr, CompileError> {
        let left = self.emit(&binary.left)?;
        let right = self.emit(&binary.right)?;
        if kind == NodeKind::And {
            Ok(Box::new(move |frame| {
                let l = optional_bool(left(frame)?)?;
                let r = optional_bool(right(frame)?)?;
                Ok(match (l, r) {
                    (Some(false), _) | (_, Some(false)) => Value::Bool(false),
                    (Some(true), Some(true)) => Value::Bool(true),
                    _ => Value::Null,
                })
            }))
        } else {
            Ok(Box::new(move |frame| {
                let l = optional_bool(left(frame)?)?;
                let r = optional_bool(right(frame)?)?;
                Ok(match (l, r) {
                    (Some(true), _) | (_, Some(true)) => Value::Bool(true),
                    (Some(false), Some(false)) => Value::Bool(false),
                    _ => Value::Null,
                })
            }))
        }
    }

    /// `AndAlso`/`OrElse`. The right operand runs only when the left one does
    /// not decide the result.
    pub(crate) fn emit_short_circuit(
        &mut self,
        node: &Shared<Node>,
        binary: &BinaryExpr,
    ) -> Result<CompiledExpr, CompileError> {
        if let Some(method) = &binary.method {
            return self.emit_user_short_circuit(node, binary, method);
        }

        // The left value that decides the result on its own.
        let decisive = node.kind == NodeKind::OrElse;
        let left = self.emit(&binary.left)?;
        let right = self.emit(&binary.right)?;
        if !binary.lifted {
            return Ok(Box::new(move |frame| {
                let l = as_bool(left(frame)?)?;
                if l == decisive { Ok(Value::Bool(l)) } else { right(frame) }
            }));
        }

        Ok(Box::new(move |frame| match optional_bool(left(frame)?)? {
            Some(l) if l == decisive => Ok(Value::Bool(l)),
            Some(_) => right(frame),
            None => match optional_bool(right(frame)?)? {
                Some(r) if r == decisive => Ok(Value::Bool(r)),
                _ => Ok(Value::Null),
            },
        }))
    }

    /// A user `AndAlso`/`OrElse` operator. The record's truth operators
    /// decide whether the left operand alone is the result.
    fn emit_user_short_circuit(
        &mut self,
        node: &Shared<Node>,
        binary: &BinaryExpr,
        method: &Method,
    ) -> Result<CompiledExpr, CompileError> {
        let operand_ty = &binary.left.ty;
        let truth = operand_ty
            .record()
            .and_then(|record| record.truth_operators())
            .ok_or_else(|| CompileError::MissingTruthOperators(operand_ty.clone()))?;
        let test = if node.kind == NodeKind::AndAlso {
            truth.is_false.clone()
        } else {
            truth.is_true.clone()
        };

        let left = self.emit(&binary.left)?;
        let right = self.emit(&binary.right)?;
        let method = method.clone();
        let lifted = binary.lifted;
        Ok(Box::new(move |frame| {
            let l = left(frame)?;
            if lifted && l.is_null() {
                return Ok(Value::Null);
            }
            if as_bool(test.invoke(std::slice::from_ref(&l))?)? {
                return Ok(l);
            }
            let r = right(frame)?;
            if lifted && r.is_null() {
                return Ok(Value::Null);
            }
            method.invoke(&[l, r])
        }))
    }
}
