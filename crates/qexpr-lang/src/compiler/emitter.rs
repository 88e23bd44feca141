use itertools::Itertools;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::compiled::{CompiledExpr, Frame, HoistedVariable, UnitId};
use super::constant_pool::is_immediate;
use super::context::CompilationContext;
use crate::Shared;
use crate::ast::node::{Expr, Lambda, Node, NodeKind, Parameter};
use crate::error::compile::CompileError;
use crate::error::runtime::RuntimeError;
use crate::runtime::Callable;
use crate::value::Value;

/// Parameter id to position in a unit's hoisted cell array.
pub(crate) type HoistedSlots = FxHashMap<u64, usize>;

/// Where a parameter reference reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Binding {
    /// Argument slot of the current frame.
    Argument(usize),
    /// Cell of the current frame.
    OwnHoisted(usize),
    /// Cell captured `level` scopes up. Level 0 is the creating frame.
    Hoisted { level: usize, position: usize },
}

/// Emits the body of one unit.
pub(crate) struct Emitter<'c> {
    pub(crate) context: &'c mut CompilationContext,
    unit: UnitId,
    arguments: FxHashMap<u64, usize>,
    hoisted: Shared<HoistedSlots>,
    /// Hoisted slots of the enclosing units, innermost first.
    ancestors: Vec<Shared<HoistedSlots>>,
    slot_count: usize,
}

impl<'c> Emitter<'c> {
    /// Reserves a unit for `lambda`, emits its body and returns its id.
    pub(crate) fn emit_unit(
        context: &'c mut CompilationContext,
        lambda: &Shared<Lambda>,
        parent: Option<UnitId>,
        ancestors: Vec<Shared<HoistedSlots>>,
    ) -> Result<UnitId, CompileError> {
        let unit = context.add_unit(lambda, parent);
        let hoisted_params = context.hoisted_variables(lambda).to_vec();
        debug!(
            unit = %unit,
            hoisted = %hoisted_params.iter().map(|param| param.name).join(", "),
            depth = ancestors.len(),
            "emitting unit"
        );

        let mut emitter = Emitter {
            context,
            unit,
            arguments: lambda
                .params
                .iter()
                .enumerate()
                .map(|(slot, param)| (param.id(), slot))
                .collect(),
            hoisted: Shared::new(
                hoisted_params
                    .iter()
                    .enumerate()
                    .map(|(position, param)| (param.id(), position))
                    .collect(),
            ),
            ancestors,
            slot_count: lambda.params.len(),
        };
        let body = emitter.emit(&lambda.body)?;

        let variables = hoisted_params
            .into_iter()
            .enumerate()
            .filter_map(|(position, parameter)| {
                let argument = *emitter.arguments.get(&parameter.id())?;
                Some(HoistedVariable {
                    parameter,
                    argument,
                    position,
                })
            })
            .collect();
        let slot_count = emitter.slot_count;
        emitter.context.finish_unit(unit, variables, slot_count, body);
        Ok(unit)
    }

    pub(crate) fn resolve(&self, parameter: &Parameter) -> Result<Binding, CompileError> {
        let id = parameter.id();
        if let Some(&position) = self.hoisted.get(&id) {
            return Ok(Binding::OwnHoisted(position));
        }
        if let Some(&slot) = self.arguments.get(&id) {
            return Ok(Binding::Argument(slot));
        }
        self.ancestors
            .iter()
            .enumerate()
            .find_map(|(level, slots)| slots.get(&id).map(|&position| Binding::Hoisted { level, position }))
            .ok_or(CompileError::ParameterOutOfScope { name: parameter.name })
    }

    /// Reserves a frame slot past the arguments.
    pub(crate) fn alloc_temp(&mut self) -> usize {
        let slot = self.slot_count;
        self.slot_count += 1;
        slot
    }

    pub(crate) fn emit(&mut self, node: &Shared<Node>) -> Result<CompiledExpr, CompileError> {
        match (&node.expr, node.kind) {
            (Expr::Constant(value), NodeKind::Constant) => self.emit_constant(value),
            (Expr::Parameter(parameter), NodeKind::Parameter) => self.emit_parameter(parameter),
            (Expr::Unary(unary), kind) if kind.is_unary() => self.emit_unary(node, unary),
            (Expr::Binary(binary), kind) if kind.is_binary() => self.emit_binary(node, binary),
            (
                Expr::Conditional {
                    test,
                    if_true,
                    if_false,
                },
                NodeKind::Conditional,
            ) => self.emit_conditional(test, if_true, if_false),
            (Expr::MemberAccess { target, member }, NodeKind::MemberAccess) => {
                self.emit_member_access(target.as_ref(), member)
            }
            (Expr::Call { target, method, args }, NodeKind::Call) => self.emit_call(target.as_ref(), method, args),
            (Expr::New { constructor, args }, NodeKind::New) => self.emit_new(node, constructor.as_ref(), args),
            (Expr::NewArray(items), NodeKind::NewArrayInit) => self.emit_new_array_init(items),
            (Expr::NewArray(bounds), NodeKind::NewArrayBounds) => self.emit_new_array_bounds(node, bounds),
            (Expr::ListInit { new, initializers }, NodeKind::ListInit) => self.emit_list_init(new, initializers),
            (Expr::MemberInit { new, bindings }, NodeKind::MemberInit) => self.emit_member_init(new, bindings),
            (Expr::Lambda(lambda), NodeKind::Lambda) => self.emit_create_closure(lambda),
            (Expr::Invoke { target, args }, NodeKind::Invoke) => self.emit_invoke(target, args),
            (Expr::TypeIs { operand, type_operand }, NodeKind::TypeIs) => self.emit_type_is(operand, type_operand),
            (Expr::Assign { target, value }, NodeKind::Assign) => self.emit_assign(target, value),
            (Expr::Block(items), NodeKind::Block) => self.emit_block(items),
            (_, kind) => Err(CompileError::unsupported(kind, "node payload does not match its kind")),
        }
    }

    pub(crate) fn emit_all(&mut self, nodes: &[Shared<Node>]) -> Result<Vec<CompiledExpr>, CompileError> {
        nodes.iter().map(|node| self.emit(node)).collect()
    }

    fn emit_constant(&mut self, value: &Value) -> Result<CompiledExpr, CompileError> {
        if is_immediate(value) {
            let value = value.clone();
            Ok(Box::new(move |_| Ok(value.clone())))
        } else {
            self.emit_global(value)
        }
    }

    /// Loads a value from the constant pool.
    pub(crate) fn emit_global(&mut self, value: &Value) -> Result<CompiledExpr, CompileError> {
        let id = self.context.add_global(value);
        Ok(Box::new(move |frame| Ok(frame.global(id))))
    }

    fn emit_parameter(&mut self, parameter: &Parameter) -> Result<CompiledExpr, CompileError> {
        match self.resolve(parameter)? {
            Binding::Argument(slot) => Ok(Box::new(move |frame| Ok(frame.load(slot)))),
            Binding::OwnHoisted(position) => Ok(Box::new(move |frame| {
                frame.own_locals()?.get(position).ok_or(RuntimeError::MissingScope)
            })),
            Binding::Hoisted { level, position } => Ok(Box::new(move |frame| {
                frame
                    .scope
                    .ancestor_locals(level)
                    .and_then(|cells| cells.get(position))
                    .ok_or(RuntimeError::MissingScope)
            })),
        }
    }

    fn emit_assign(&mut self, target: &Parameter, value: &Shared<Node>) -> Result<CompiledExpr, CompileError> {
        let value = self.emit(value)?;
        match self.resolve(target)? {
            Binding::Argument(slot) => Ok(Box::new(move |frame| {
                let value = value(frame)?;
                frame.store(slot, value.clone());
                Ok(value)
            })),
            Binding::OwnHoisted(position) => Ok(Box::new(move |frame| {
                let value = value(frame)?;
                if frame.own_locals()?.set(position, value.clone()) {
                    Ok(value)
                } else {
                    Err(RuntimeError::MissingScope)
                }
            })),
            Binding::Hoisted { level, position } => Ok(Box::new(move |frame| {
                let value = value(frame)?;
                let stored = frame
                    .scope
                    .ancestor_locals(level)
                    .is_some_and(|cells| cells.set(position, value.clone()));
                if stored { Ok(value) } else { Err(RuntimeError::MissingScope) }
            })),
        }
    }

    fn emit_block(&mut self, items: &[Shared<Node>]) -> Result<CompiledExpr, CompileError> {
        let items = self.emit_all(items)?;
        Ok(Box::new(move |frame| {
            let mut last = Value::Unit;
            for item in &items {
                last = item(frame)?;
            }
            Ok(last)
        }))
    }

    /// Emits `lambda` as its own unit and returns code that binds it to the
    /// running frame.
    pub(crate) fn emit_create_closure(&mut self, lambda: &Shared<Lambda>) -> Result<CompiledExpr, CompileError> {
        let ancestors = std::iter::once(Shared::clone(&self.hoisted))
            .chain(self.ancestors.iter().cloned())
            .collect();
        let unit = Emitter::emit_unit(&mut *self.context, lambda, Some(self.unit), ancestors)?;
        trace!(unit = %unit, parent = %self.unit, "emitted closure creation");
        Ok(Box::new(move |frame| {
            let scope = frame.scope.nested(unit, frame.hoisted.clone());
            Ok(Value::Function(Callable::new(scope)))
        }))
    }

    fn emit_invoke(&mut self, target: &Shared<Node>, args: &[Shared<Node>]) -> Result<CompiledExpr, CompileError> {
        let target = self.emit(target)?;
        let args = self.emit_all(args)?;
        Ok(Box::new(move |frame| {
            let callee = target(frame)?;
            let args = eval_args(&args, frame)?;
            match callee {
                Value::Function(callable) => callable.invoke_at(&args, frame.depth + 1),
                Value::Null => Err(RuntimeError::NullReference),
                other => Err(RuntimeError::NotCallable(other.type_name())),
            }
        }))
    }
}

/// Evaluates compiled arguments left to right.
pub(crate) fn eval_args(args: &[CompiledExpr], frame: &mut Frame<'_>) -> Result<SmallVec<[Value; 4]>, RuntimeError> {
    args.iter().map(|arg| arg(frame)).collect()
}
