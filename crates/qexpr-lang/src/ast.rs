//! The expression tree: typed nodes, reflection handles and tree walking.

pub mod build;
pub mod member;
pub mod node;
pub mod types;
pub mod visit;

pub use member::{Constructor, Member, Method, NativeFn};
pub use node::{BinaryExpr, ElementInit, Expr, Lambda, MemberBinding, Node, NodeKind, Parameter, UnaryExpr};
pub use types::{Field, RecordType, Signature, TruthOperators, Type};
pub use visit::Visitor;
