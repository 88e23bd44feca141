//! `qexpr-lang` compiles typed expression trees into executable closures.
//!
//! A tree is built from [`Node`]s (see [`ast::build`]) and rooted at a lambda.
//! Compiling it produces a [`CompiledLambda`]; instantiating that yields a
//! [`Callable`] which can be invoked any number of times, from any thread.
//!
//! Parameters read by nested lambdas are hoisted into shared cells, so
//! closures observe and mutate the variables of the frame that created them.
//! Quoted sub-trees evaluate to new trees in which those captured variables
//! have been replaced by their current values.
//!
//! ## Examples
//!
//! ```rs
//! use qexpr_lang::{Parameter, Type, Value, build};
//!
//! let x = Parameter::new("x", Type::I32);
//! let lambda = build::lambda(vec![x.clone()], build::add(build::param(&x), build::constant(1)));
//!
//! let callable = qexpr_lang::compile(&lambda).unwrap();
//! assert_eq!(callable.invoke(&[Value::I32(41)]).unwrap(), Value::I32(42));
//!
//! // A closure capturing the parameter of its creator
//! let y = Parameter::new("y", Type::I32);
//! let add_x = build::lambda(vec![y.clone()], build::add(build::param(&x), build::param(&y)));
//! let make_adder = build::lambda(vec![x.clone()], add_x);
//!
//! let adder = qexpr_lang::compile(&make_adder).unwrap().invoke(&[Value::I32(10)]).unwrap();
//! let adder = adder.as_function().unwrap();
//! assert_eq!(adder.invoke(&[Value::I32(5)]).unwrap(), Value::I32(15));
//! ```
mod arena;
pub mod ast;
pub mod compiler;
pub mod error;
mod ident;
pub mod runtime;
pub mod value;

pub use arena::{Arena, ArenaId};
pub use ast::build;
pub use ast::member::{Constructor, Member, Method};
pub use ast::node::{BinaryExpr, ElementInit, Expr, Lambda, MemberBinding, Node, NodeKind, Parameter, UnaryExpr};
pub use ast::types::{Field, RecordType, Signature, Type};
pub use compiler::{CompiledLambda, Compiler, CompilerOptions};
pub use error::{CompileError, Error, RuntimeError};
pub use ident::Ident;
pub use runtime::{Callable, ExecutionScope, HoistedLocals, isolate};
pub use value::{Object, Value};

/// Reference-counted pointer used for every shared structure: trees, scopes
/// and cells. Compiled callables are `Send + Sync`.
pub type Shared<T> = std::sync::Arc<T>;
/// Interior-mutable cell behind hoisted variables, list contents and fields.
pub type SharedCell<T> = std::sync::RwLock<T>;

pub type QexprResult = Result<Value, Error>;

/// Compiles a lambda tree with default options and instantiates it.
pub fn compile(lambda: &Shared<Node>) -> Result<Callable, Error> {
    Ok(Compiler::default().compile(lambda)?.instantiate())
}

/// Compiles and invokes a lambda tree once.
pub fn eval(lambda: &Shared<Node>, args: &[Value]) -> QexprResult {
    Ok(compile(lambda)?.invoke(args)?)
}
