//! Property-based testing strategies for qexpr-lang.
//!
//! Reusable proptest strategies that build expression trees together with
//! the value they are expected to evaluate to.
//!
//! # Examples
//!
//! ```rust,ignore
//! use strategies::*;
//! use proptest::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn test_something((tree, expected) in arb_int_tree()) {
//!         // Your test here
//!     }
//! }
//! ```

use proptest::prelude::*;
use qexpr_lang::{Node, NodeKind, Shared, Value, build};

/// Strategy for small `i32` constants.
pub fn arb_small_int() -> impl Strategy<Value = i32> {
    -1000i32..1000
}

/// Strategy for wrapping integer arithmetic trees and their expected value.
pub fn arb_int_tree() -> impl Strategy<Value = (Shared<Node>, i32)> {
    let leaf = arb_small_int().prop_map(|n| (build::constant(n), n));
    leaf.prop_recursive(4, 32, 2, |inner| {
        (
            inner.clone(),
            inner,
            prop::sample::select(vec![NodeKind::Add, NodeKind::Subtract, NodeKind::Multiply]),
        )
            .prop_map(|((left, a), (right, b), kind)| {
                let expected = match kind {
                    NodeKind::Add => a.wrapping_add(b),
                    NodeKind::Subtract => a.wrapping_sub(b),
                    _ => a.wrapping_mul(b),
                };
                (build::binary(kind, left, right), expected)
            })
    })
}

/// Strategy for optional booleans as runtime values.
pub fn arb_optional_bool() -> impl Strategy<Value = Option<bool>> {
    proptest::option::of(any::<bool>())
}

/// Strategy for optional `i32` arguments.
pub fn arb_optional_int() -> impl Strategy<Value = Option<i32>> {
    proptest::option::weighted(0.7, arb_small_int())
}

/// Strategy for relational operator kinds.
pub fn arb_relational_kind() -> impl Strategy<Value = NodeKind> {
    prop::sample::select(vec![
        NodeKind::Equal,
        NodeKind::NotEqual,
        NodeKind::LessThan,
        NodeKind::LessThanOrEqual,
        NodeKind::GreaterThan,
        NodeKind::GreaterThanOrEqual,
    ])
}

pub fn to_value<T: Into<Value>>(value: Option<T>) -> Value {
    value.map(Into::into).unwrap_or(Value::Null)
}
