//! Runtime side of compiled trees: scopes, callables and primitive operators.

pub mod callable;
pub mod isolate;
pub(crate) mod ops;
pub mod scope;

pub use callable::Callable;
pub use isolate::isolate;
pub use scope::{ExecutionScope, HoistedLocals};
