//! Orchestration of one compilation: the unit table, the constant pool and
//! the hoisting map, plus the public [`Compiler`] entry point.

use smol_str::SmolStr;
use tracing::debug;

use super::CompilerOptions;
use super::compiled::{CompiledExpr, CompiledUnit, Frame, GlobalId, HoistedVariable, Program, UnitId};
use super::constant_pool::ConstantPool;
use super::emitter::Emitter;
use super::hoist::HoistingMap;
use crate::Shared;
use crate::arena::Arena;
use crate::ast::node::{Lambda, Node, Parameter};
use crate::ast::types::Signature;
use crate::error::compile::CompileError;
use crate::error::runtime::RuntimeError;
use crate::runtime::{Callable, ExecutionScope};
use crate::value::Value;

/// Compiles root lambdas into [`CompiledLambda`]s.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompilerOptions,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn set_max_call_depth(&mut self, max_call_depth: u32) {
        self.options.max_call_depth = max_call_depth;
    }

    pub fn set_name(&mut self, name: impl Into<SmolStr>) {
        self.options.name = Some(name.into());
    }

    /// Compiles a tree whose root is a lambda node.
    pub fn compile(&self, root: &Shared<Node>) -> Result<CompiledLambda, CompileError> {
        let lambda = root
            .as_lambda()
            .ok_or_else(|| CompileError::unsupported(root.kind, "the root of a compilation must be a lambda"))?;
        self.compile_lambda(lambda)
    }

    pub fn compile_lambda(&self, lambda: &Shared<Lambda>) -> Result<CompiledLambda, CompileError> {
        debug!(
            compiler = self.options.name.as_deref().unwrap_or_default(),
            signature = %lambda.signature,
            "compiling root lambda"
        );
        let mut context = CompilationContext::new(HoistingMap::analyze(lambda));
        let root = Emitter::emit_unit(&mut context, lambda, None, Vec::new())?;
        let program = context.finish(self.options.clone());
        debug!(
            compiler = self.options.name.as_deref().unwrap_or_default(),
            units = program.unit_count(),
            globals = program.global_count(),
            "compiled root lambda"
        );
        Ok(CompiledLambda {
            program: Shared::new(program),
            root,
        })
    }
}

/// Handle to a compiled root lambda. Instantiating it is cheap and yields an
/// independent [`Callable`].
#[derive(Debug, Clone)]
pub struct CompiledLambda {
    program: Shared<Program>,
    root: UnitId,
}

impl CompiledLambda {
    /// Binds the root unit to a fresh scope with no captured cells.
    pub fn instantiate(&self) -> Callable {
        Callable::new(ExecutionScope::root(Shared::clone(&self.program), self.root))
    }

    pub fn program(&self) -> &Shared<Program> {
        &self.program
    }

    pub fn signature(&self) -> &Shared<Signature> {
        &self.program.units[self.root].signature
    }
}

fn unfinished(_frame: &mut Frame<'_>) -> Result<Value, RuntimeError> {
    Err(RuntimeError::MissingScope)
}

/// State shared by every emitter of one compilation.
pub(crate) struct CompilationContext {
    units: Arena<CompiledUnit>,
    pool: ConstantPool,
    hoisting: HoistingMap,
}

impl CompilationContext {
    pub(crate) fn new(hoisting: HoistingMap) -> Self {
        Self {
            units: Arena::default(),
            pool: ConstantPool::default(),
            hoisting,
        }
    }

    /// Reserves a unit so nested units can name it as their parent before
    /// its body exists.
    pub(crate) fn add_unit(&mut self, lambda: &Lambda, parent: Option<UnitId>) -> UnitId {
        let id = self.units.alloc(CompiledUnit {
            name: lambda.name,
            signature: Shared::clone(&lambda.signature),
            hoisted: Vec::new(),
            parent,
            slot_count: lambda.params.len(),
            body: Box::new(unfinished),
        });
        debug!(unit = %id, parent = ?parent.map(|p| p.index()), signature = %lambda.signature, "created unit");
        id
    }

    pub(crate) fn finish_unit(
        &mut self,
        id: UnitId,
        hoisted: Vec<HoistedVariable>,
        slot_count: usize,
        body: CompiledExpr,
    ) {
        let unit = &mut self.units[id];
        unit.hoisted = hoisted;
        unit.slot_count = slot_count;
        unit.body = body;
    }

    /// Appends a copy of `value` to the constant pool.
    pub(crate) fn add_global(&mut self, value: &Value) -> GlobalId {
        self.pool.add(value)
    }

    pub(crate) fn hoisted_variables(&self, lambda: &Lambda) -> &[Shared<Parameter>] {
        self.hoisting.hoisted(lambda)
    }

    fn finish(self, options: CompilerOptions) -> Program {
        Program {
            units: self.units,
            globals: self.pool.into_arena(),
            options,
        }
    }
}
