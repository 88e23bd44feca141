use std::sync::PoisonError;

use smallvec::SmallVec;

use crate::Shared;
use crate::ast::member::{Member, Method};
use crate::ast::node::{BinaryExpr, Node, NodeKind};
use crate::compiler::compiled::CompiledExpr;
use crate::compiler::emitter::{Emitter, eval_args};
use crate::error::compile::CompileError;
use crate::error::runtime::RuntimeError;
use crate::value::{Object, Value};

/// Reads a member given its target. Static members ignore the target.
pub(crate) type MemberReader = Box<dyn Fn(Value) -> Result<Value, RuntimeError> + Send + Sync>;

pub(crate) fn expect_object(value: Value) -> Result<Shared<Object>, RuntimeError> {
    match value {
        Value::Object(object) => Ok(object),
        Value::Null => Err(RuntimeError::NullReference),
        other => Err(RuntimeError::type_mismatch("object", other.type_name())),
    }
}

pub(crate) fn read_member(member: &Member) -> MemberReader {
    match member {
        Member::Field { index, .. } => {
            let index = *index;
            Box::new(move |target: Value| Ok(expect_object(target)?.field(index)))
        }
        Member::StaticField { cell, .. } => {
            let cell = Shared::clone(cell);
            Box::new(move |_: Value| Ok(cell.read().unwrap_or_else(PoisonError::into_inner).clone()))
        }
        Member::Property { getter, .. } if getter.is_static() => {
            let getter = getter.clone();
            Box::new(move |_: Value| getter.invoke(&[]))
        }
        Member::Property { getter, .. } => {
            let getter = getter.clone();
            Box::new(move |target: Value| {
                if target.is_null() {
                    return Err(RuntimeError::NullReference);
                }
                getter.invoke(&[target])
            })
        }
    }
}

pub(crate) fn index_of(value: &Value) -> Result<i64, RuntimeError> {
    match *value {
        Value::I8(n) => Ok(n.into()),
        Value::I16(n) => Ok(n.into()),
        Value::I32(n) => Ok(n.into()),
        Value::I64(n) => Ok(n),
        Value::U8(n) => Ok(n.into()),
        Value::U16(n) => Ok(n.into()),
        Value::U32(n) => Ok(n.into()),
        Value::U64(n) => i64::try_from(n).map_err(|_| RuntimeError::Overflow),
        ref other => Err(RuntimeError::type_mismatch("integer", other.type_name())),
    }
}

impl Emitter<'_> {
    pub(crate) fn emit_member_access(
        &mut self,
        target: Option<&Shared<Node>>,
        member: &Member,
    ) -> Result<CompiledExpr, CompileError> {
        let read = read_member(member);
        if member.is_static() {
            return Ok(Box::new(move |_| read(Value::Null)));
        }
        let target = target.ok_or_else(|| {
            CompileError::unsupported(NodeKind::MemberAccess, format!("instance member {} has no target", member.name()))
        })?;
        let target = self.emit(target)?;
        Ok(Box::new(move |frame| read(target(frame)?)))
    }

    pub(crate) fn emit_array_index(&mut self, binary: &BinaryExpr) -> Result<CompiledExpr, CompileError> {
        let array = self.emit(&binary.left)?;
        let index = self.emit(&binary.right)?;
        Ok(Box::new(move |frame| {
            let array = array(frame)?;
            let index = index_of(&index(frame)?)?;
            let element = |items: &[Value]| {
                usize::try_from(index)
                    .ok()
                    .and_then(|i| items.get(i))
                    .cloned()
                    .ok_or(RuntimeError::IndexOutOfRange { index, len: items.len() })
            };
            match array {
                Value::Array(items) => element(&items[..]),
                Value::List(list) => element(list.read().unwrap_or_else(PoisonError::into_inner).as_slice()),
                Value::Null => Err(RuntimeError::NullReference),
                other => Err(RuntimeError::type_mismatch("array", other.type_name())),
            }
        }))
    }

    pub(crate) fn emit_call(
        &mut self,
        target: Option<&Shared<Node>>,
        method: &Method,
        args: &[Shared<Node>],
    ) -> Result<CompiledExpr, CompileError> {
        let method = method.clone();
        if method.is_static() {
            let args = self.emit_all(args)?;
            return Ok(Box::new(move |frame| method.invoke(&eval_args(&args, frame)?)));
        }

        let target = target.ok_or_else(|| {
            CompileError::unsupported(NodeKind::Call, format!("instance method {} has no target", method.name()))
        })?;
        let target = self.emit(target)?;
        let args = self.emit_all(args)?;
        Ok(Box::new(move |frame| {
            let this = target(frame)?;
            if this.is_null() {
                return Err(RuntimeError::NullReference);
            }
            let mut values: SmallVec<[Value; 4]> = SmallVec::with_capacity(args.len() + 1);
            values.push(this);
            for arg in &args {
                values.push(arg(frame)?);
            }
            method.invoke(&values)
        }))
    }
}
