//! Compiler from expression trees to closure trees.
//!
//! Compiling a root lambda runs the hoisting analysis once, then emits one
//! [`CompiledUnit`](compiled::CompiledUnit) per lambda reached from the root.
//! Nested lambdas are emitted on demand when their closure-creation node is
//! reached. All units share one constant pool.
//!
//! ## Example
//!
//! ```rust,ignore
//! let x = Parameter::new("x", Type::I32);
//! let lambda = build::lambda(vec![x.clone()], build::add(build::param(&x), build::constant(1)));
//! let callable = Compiler::default().compile(&lambda)?.instantiate();
//! assert_eq!(callable.invoke(&[Value::I32(41)])?, Value::I32(42));
//! ```

pub(crate) mod call_stack;
pub mod compiled;
mod constant_pool;
mod context;
mod emit;
mod emitter;
mod hoist;

use smol_str::SmolStr;

pub use context::{CompiledLambda, Compiler};

/// Options for [`Compiler`].
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Maximum nesting of invocations made by compiled code.
    pub max_call_depth: u32,
    /// Shown in tracing output for the units of this compiler.
    pub name: Option<SmolStr>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            max_call_depth: call_stack::DEFAULT_MAX_CALL_DEPTH,
            name: None,
        }
    }
}
