use std::sync::PoisonError;

use smallvec::SmallVec;

use super::access::{expect_object, index_of, read_member};
use crate::Shared;
use crate::ast::member::{Constructor, Member};
use crate::ast::node::{ElementInit, MemberBinding, Node, NodeKind};
use crate::ast::types::Type;
use crate::compiler::compiled::CompiledExpr;
use crate::compiler::emitter::{Emitter, eval_args};
use crate::error::compile::CompileError;
use crate::error::runtime::RuntimeError;
use crate::value::Value;

/// Stores a value into a member given its target.
type MemberWriter = Box<dyn Fn(Value, Value) -> Result<(), RuntimeError> + Send + Sync>;

fn write_member(member: &Member) -> Result<MemberWriter, CompileError> {
    match member {
        Member::Field { index, .. } => {
            let index = *index;
            Ok(Box::new(move |target: Value, value: Value| {
                let object = expect_object(target)?;
                if object.set_field(index, value) {
                    Ok(())
                } else {
                    Err(RuntimeError::IndexOutOfRange {
                        index: index as i64,
                        len: object.record_type().fields.len(),
                    })
                }
            }))
        }
        Member::StaticField { cell, .. } => {
            let cell = Shared::clone(cell);
            Ok(Box::new(move |_: Value, value: Value| {
                *cell.write().unwrap_or_else(PoisonError::into_inner) = value;
                Ok(())
            }))
        }
        Member::Property {
            setter: Some(setter), ..
        } if setter.is_static() => {
            let setter = setter.clone();
            Ok(Box::new(move |_: Value, value: Value| setter.invoke(&[value]).map(|_| ())))
        }
        Member::Property {
            setter: Some(setter), ..
        } => {
            let setter = setter.clone();
            Ok(Box::new(move |target: Value, value: Value| {
                if target.is_null() {
                    return Err(RuntimeError::NullReference);
                }
                setter.invoke(&[target, value]).map(|_| ())
            }))
        }
        Member::Property { name, setter: None, .. } => Err(CompileError::unsupported(
            NodeKind::MemberInit,
            format!("property {} has no setter", name),
        )),
    }
}

impl Emitter<'_> {
    pub(crate) fn emit_new(
        &mut self,
        node: &Shared<Node>,
        constructor: Option<&Constructor>,
        args: &[Shared<Node>],
    ) -> Result<CompiledExpr, CompileError> {
        if let Some(constructor) = constructor {
            let constructor = constructor.clone();
            let args = self.emit_all(args)?;
            return Ok(Box::new(move |frame| constructor.invoke(&eval_args(&args, frame)?)));
        }

        match &node.ty {
            Type::Record(record) => {
                let record = Shared::clone(record);
                Ok(Box::new(move |_| Ok(record.instantiate())))
            }
            Type::List(_) => Ok(Box::new(|_| Ok(Value::list(Vec::new())))),
            ty if ty.is_nullable() || !ty.admits_null() => {
                let value = ty.default_value();
                Ok(Box::new(move |_| Ok(value.clone())))
            }
            ty => Err(CompileError::unsupported(
                NodeKind::New,
                format!("{} has no default constructor", ty),
            )),
        }
    }

    pub(crate) fn emit_new_array_init(&mut self, items: &[Shared<Node>]) -> Result<CompiledExpr, CompileError> {
        let items = self.emit_all(items)?;
        Ok(Box::new(move |frame| {
            let values = items.iter().map(|item| item(frame)).collect::<Result<Vec<_>, _>>()?;
            Ok(Value::array(values))
        }))
    }

    pub(crate) fn emit_new_array_bounds(
        &mut self,
        node: &Shared<Node>,
        bounds: &[Shared<Node>],
    ) -> Result<CompiledExpr, CompileError> {
        let [length] = bounds else {
            return Err(CompileError::unsupported(
                NodeKind::NewArrayBounds,
                "only single-dimensional arrays are supported",
            ));
        };
        let element = node.ty.element_type().ok_or_else(|| {
            CompileError::unsupported(NodeKind::NewArrayBounds, format!("{} is not an array type", node.ty))
        })?;
        let default = element.default_value();
        let length = self.emit(length)?;
        Ok(Box::new(move |frame| {
            let length = index_of(&length(frame)?)?;
            let length = usize::try_from(length).map_err(|_| RuntimeError::NegativeArraySize(length))?;
            let mut items = Vec::new();
            items
                .try_reserve_exact(length)
                .map_err(|_| RuntimeError::ArrayTooLarge(length))?;
            items.resize(length, default.clone());
            Ok(Value::array(items))
        }))
    }

    pub(crate) fn emit_list_init(
        &mut self,
        new: &Shared<Node>,
        initializers: &[ElementInit],
    ) -> Result<CompiledExpr, CompileError> {
        let new = self.emit(new)?;
        let slot = self.alloc_temp();
        let initializers = self.emit_element_inits(slot, initializers)?;
        Ok(Box::new(move |frame| {
            let list = new(frame)?;
            frame.store(slot, list);
            for initializer in &initializers {
                initializer(frame)?;
            }
            Ok(frame.load(slot))
        }))
    }

    pub(crate) fn emit_member_init(
        &mut self,
        new: &Shared<Node>,
        bindings: &[MemberBinding],
    ) -> Result<CompiledExpr, CompileError> {
        let new = self.emit(new)?;
        let slot = self.alloc_temp();
        let bindings = self.emit_bindings(slot, bindings)?;
        Ok(Box::new(move |frame| {
            let instance = new(frame)?;
            frame.store(slot, instance);
            for binding in &bindings {
                binding(frame)?;
            }
            Ok(frame.load(slot))
        }))
    }

    /// Each binding reads its target from `slot`.
    fn emit_bindings(&mut self, slot: usize, bindings: &[MemberBinding]) -> Result<Vec<CompiledExpr>, CompileError> {
        bindings
            .iter()
            .map(|binding| -> Result<CompiledExpr, CompileError> {
                match binding {
                    MemberBinding::Assignment(member, value) => {
                        let write = write_member(member)?;
                        let value = self.emit(value)?;
                        Ok(Box::new(move |frame| {
                            let value = value(frame)?;
                            write(frame.load(slot), value)?;
                            Ok(Value::Unit)
                        }))
                    }
                    MemberBinding::Member(member, nested) => {
                        let read = read_member(member);
                        let inner = self.alloc_temp();
                        let nested = self.emit_bindings(inner, nested)?;
                        Ok(Box::new(move |frame| {
                            let value = read(frame.load(slot))?;
                            frame.store(inner, value);
                            for binding in &nested {
                                binding(frame)?;
                            }
                            Ok(Value::Unit)
                        }))
                    }
                    MemberBinding::List(member, initializers) => {
                        let read = read_member(member);
                        let inner = self.alloc_temp();
                        let initializers = self.emit_element_inits(inner, initializers)?;
                        Ok(Box::new(move |frame| {
                            let value = read(frame.load(slot))?;
                            frame.store(inner, value);
                            for initializer in &initializers {
                                initializer(frame)?;
                            }
                            Ok(Value::Unit)
                        }))
                    }
                }
            })
            .collect()
    }

    /// Each initializer calls its add method on the value in `slot`.
    fn emit_element_inits(
        &mut self,
        slot: usize,
        initializers: &[ElementInit],
    ) -> Result<Vec<CompiledExpr>, CompileError> {
        initializers
            .iter()
            .map(|initializer| -> Result<CompiledExpr, CompileError> {
                let method = initializer.add_method.clone();
                if method.is_static() {
                    return Err(CompileError::unsupported(
                        NodeKind::ListInit,
                        format!("add method {} must be an instance method", method.name()),
                    ));
                }
                let args = self.emit_all(&initializer.args)?;
                Ok(Box::new(move |frame| {
                    let target = frame.load(slot);
                    if target.is_null() {
                        return Err(RuntimeError::NullReference);
                    }
                    let mut values: SmallVec<[Value; 4]> = SmallVec::with_capacity(args.len() + 1);
                    values.push(target);
                    for arg in &args {
                        values.push(arg(frame)?);
                    }
                    method.invoke(&values)?;
                    Ok(Value::Unit)
                }))
            })
            .collect()
    }
}
