use crate::Shared;
use crate::ast::member::Method;
use crate::ast::node::{BinaryExpr, Node, NodeKind, UnaryExpr};
use crate::ast::types::Type;
use crate::compiler::compiled::CompiledExpr;
use crate::compiler::emitter::Emitter;
use crate::error::compile::CompileError;
use crate::runtime::ops;
use crate::value::Value;

/// What a lifted binary operator yields when an operand is `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NullResult {
    Null,
    False,
    /// `Equal`: true only if both operands are null.
    BothNull,
    /// `NotEqual`: true unless both operands are null.
    NotBothNull,
}

impl NullResult {
    fn for_node(kind: NodeKind, ty: &Type) -> Self {
        if !kind.is_relational() || ty.admits_null() {
            return NullResult::Null;
        }
        match kind {
            NodeKind::Equal => NullResult::BothNull,
            NodeKind::NotEqual => NullResult::NotBothNull,
            _ => NullResult::False,
        }
    }

    fn resolve(self, left: &Value, right: &Value) -> Value {
        let both_null = left.is_null() && right.is_null();
        match self {
            NullResult::Null => Value::Null,
            NullResult::False => Value::Bool(false),
            NullResult::BothNull => Value::Bool(both_null),
            NullResult::NotBothNull => Value::Bool(!both_null),
        }
    }
}

impl Emitter<'_> {
    pub(crate) fn emit_unary(&mut self, node: &Shared<Node>, unary: &UnaryExpr) -> Result<CompiledExpr, CompileError> {
        match node.kind {
            NodeKind::Quote => return self.emit_quote(&unary.operand),
            NodeKind::Convert | NodeKind::ConvertChecked => return self.emit_convert(node, unary),
            NodeKind::TypeAs => return self.emit_type_as(node, unary),
            _ => {}
        }
        if let Some(method) = &unary.method {
            return self.emit_user_unary(unary, method);
        }

        let operand_ty = unary.operand.ty.non_nullable();
        let op = ops::unary_op(node.kind, operand_ty).ok_or_else(|| {
            CompileError::unsupported(node.kind, format!("no primitive operator for operand of type {}", operand_ty))
        })?;
        let operand = self.emit(&unary.operand)?;
        if unary.lifted {
            Ok(Box::new(move |frame| {
                let value = operand(frame)?;
                if value.is_null() { Ok(Value::Null) } else { op(value) }
            }))
        } else {
            Ok(Box::new(move |frame| op(operand(frame)?)))
        }
    }

    fn emit_user_unary(&mut self, unary: &UnaryExpr, method: &Method) -> Result<CompiledExpr, CompileError> {
        let operand = self.emit(&unary.operand)?;
        let method = method.clone();
        let lifted = unary.lifted;
        Ok(Box::new(move |frame| {
            let value = operand(frame)?;
            if lifted && value.is_null() {
                return Ok(Value::Null);
            }
            method.invoke(&[value])
        }))
    }

    pub(crate) fn emit_binary(
        &mut self,
        node: &Shared<Node>,
        binary: &BinaryExpr,
    ) -> Result<CompiledExpr, CompileError> {
        match node.kind {
            NodeKind::Coalesce => self.emit_coalesce(binary),
            NodeKind::AndAlso | NodeKind::OrElse => self.emit_short_circuit(node, binary),
            NodeKind::ArrayIndex => self.emit_array_index(binary),
            kind => match &binary.method {
                Some(method) => self.emit_user_binary(node, binary, method),
                None if binary.lifted
                    && matches!(kind, NodeKind::And | NodeKind::Or)
                    && binary.left.ty.non_nullable().is_bool() =>
                {
                    self.emit_kleene(kind, binary)
                }
                None => self.emit_primitive_binary(node, binary),
            },
        }
    }

    fn emit_primitive_binary(
        &mut self,
        node: &Shared<Node>,
        binary: &BinaryExpr,
    ) -> Result<CompiledExpr, CompileError> {
        let operand_ty = binary.left.ty.non_nullable();
        let op = ops::binary_op(node.kind, operand_ty).ok_or_else(|| {
            CompileError::unsupported(node.kind, format!("no primitive operator for operands of type {}", operand_ty))
        })?;
        let left = self.emit(&binary.left)?;
        let right = self.emit(&binary.right)?;
        if !binary.lifted {
            return Ok(Box::new(move |frame| {
                let l = left(frame)?;
                op(l, right(frame)?)
            }));
        }

        let on_null = NullResult::for_node(node.kind, &node.ty);
        Ok(Box::new(move |frame| {
            let l = left(frame)?;
            let r = right(frame)?;
            if l.is_null() || r.is_null() {
                Ok(on_null.resolve(&l, &r))
            } else {
                op(l, r)
            }
        }))
    }

    fn emit_user_binary(
        &mut self,
        node: &Shared<Node>,
        binary: &BinaryExpr,
        method: &Method,
    ) -> Result<CompiledExpr, CompileError> {
        let left = self.emit(&binary.left)?;
        let right = self.emit(&binary.right)?;
        let method = method.clone();
        if !binary.lifted {
            return Ok(Box::new(move |frame| {
                let l = left(frame)?;
                let r = right(frame)?;
                method.invoke(&[l, r])
            }));
        }

        let on_null = NullResult::for_node(node.kind, &node.ty);
        Ok(Box::new(move |frame| {
            let l = left(frame)?;
            let r = right(frame)?;
            if l.is_null() || r.is_null() {
                Ok(on_null.resolve(&l, &r))
            } else {
                method.invoke(&[l, r])
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(NodeKind::Add, Type::nullable(Type::I32), NullResult::Null)]
    #[case(NodeKind::Equal, Type::Bool, NullResult::BothNull)]
    #[case(NodeKind::NotEqual, Type::Bool, NullResult::NotBothNull)]
    #[case(NodeKind::LessThan, Type::Bool, NullResult::False)]
    #[case(NodeKind::LessThan, Type::nullable(Type::Bool), NullResult::Null)]
    #[case(NodeKind::Equal, Type::nullable(Type::Bool), NullResult::Null)]
    fn test_null_result_for_node(#[case] kind: NodeKind, #[case] ty: Type, #[case] expected: NullResult) {
        assert_eq!(NullResult::for_node(kind, &ty), expected);
    }

    #[rstest]
    #[case(NullResult::BothNull, Value::Null, Value::Null, Value::Bool(true))]
    #[case(NullResult::BothNull, Value::Null, Value::I32(1), Value::Bool(false))]
    #[case(NullResult::NotBothNull, Value::I32(1), Value::Null, Value::Bool(true))]
    #[case(NullResult::NotBothNull, Value::Null, Value::Null, Value::Bool(false))]
    #[case(NullResult::False, Value::Null, Value::I32(1), Value::Bool(false))]
    #[case(NullResult::Null, Value::I32(1), Value::Null, Value::Null)]
    fn test_null_result_resolve(
        #[case] on_null: NullResult,
        #[case] left: Value,
        #[case] right: Value,
        #[case] expected: Value,
    ) {
        assert_eq!(on_null.resolve(&left, &right), expected);
    }
}
