//! Property-based tests for compiled qexpr-lang trees.
use proptest::prelude::*;
use qexpr_lang::{NodeKind, Parameter, Shared, Type, Value, build};

mod strategies;
use strategies::*;

fn kleene(kind: NodeKind, left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match kind {
        NodeKind::And => match (left, right) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        _ => match (left, right) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
    }
}

fn compare(kind: NodeKind, left: Option<i32>, right: Option<i32>) -> bool {
    match (left, right) {
        (Some(a), Some(b)) => match kind {
            NodeKind::Equal => a == b,
            NodeKind::NotEqual => a != b,
            NodeKind::LessThan => a < b,
            NodeKind::LessThanOrEqual => a <= b,
            NodeKind::GreaterThan => a > b,
            _ => a >= b,
        },
        (None, None) => kind == NodeKind::Equal,
        _ => kind == NodeKind::NotEqual,
    }
}

proptest! {
    #[test]
    fn test_arithmetic_trees_evaluate_like_wrapping_i32((tree, expected) in arb_int_tree()) {
        let result = qexpr_lang::eval(&build::lambda(vec![], tree), &[]);
        prop_assert_eq!(result, Ok(Value::I32(expected)));
    }

    #[test]
    fn test_kleene_matches_three_valued_logic(
        left in arb_optional_bool(),
        right in arb_optional_bool(),
        kind in prop::sample::select(vec![NodeKind::And, NodeKind::Or]),
    ) {
        let a = Parameter::new("a", Type::nullable(Type::Bool));
        let b = Parameter::new("b", Type::nullable(Type::Bool));
        let body = build::binary(kind, build::param(&a), build::param(&b));
        let callable = qexpr_lang::compile(&build::lambda(vec![a, b], body)).unwrap();

        let result = callable.invoke(&[to_value(left), to_value(right)]);
        prop_assert_eq!(result, Ok(to_value(kleene(kind, left, right))));
    }

    #[test]
    fn test_lifted_comparisons_never_yield_null(
        left in arb_optional_int(),
        right in arb_optional_int(),
        kind in arb_relational_kind(),
    ) {
        let a = Parameter::new("a", Type::nullable(Type::I32));
        let b = Parameter::new("b", Type::nullable(Type::I32));
        let body = build::binary(kind, build::param(&a), build::param(&b));
        let callable = qexpr_lang::compile(&build::lambda(vec![a, b], body)).unwrap();

        let result = callable.invoke(&[to_value(left), to_value(right)]);
        prop_assert_eq!(result, Ok(Value::Bool(compare(kind, left, right))));
    }

    #[test]
    fn test_quote_isolation_is_idempotent(x in arb_small_int(), c in arb_small_int()) {
        let p = Parameter::new("x", Type::I32);
        let body = build::quote(build::add(build::param(&p), build::constant(c)));
        let callable = qexpr_lang::compile(&build::lambda(vec![p], body)).unwrap();

        let first = callable.invoke(&[Value::I32(x)]).unwrap();
        let second = callable.invoke(&[Value::I32(x)]).unwrap();
        let first = first.as_expression().unwrap();
        let second = second.as_expression().unwrap();
        prop_assert_eq!(&**first, &**second);

        let result = qexpr_lang::eval(&build::lambda(vec![], Shared::clone(first)), &[]);
        prop_assert_eq!(result, Ok(Value::I32(x.wrapping_add(c))));
    }

    #[test]
    fn test_counter_closure_counts(start in arb_small_int(), times in 0usize..20) {
        let x = Parameter::new("x", Type::I32);
        let increment = build::lambda(
            vec![],
            build::assign(&x, build::add(build::param(&x), build::constant(1))),
        );
        let callable = qexpr_lang::compile(&build::lambda(vec![x], increment)).unwrap();
        let counter = callable.invoke(&[Value::I32(start)]).unwrap();
        let counter = counter.as_function().unwrap();

        for _ in 0..times {
            counter.invoke(&[]).unwrap();
        }
        let expected = start + times as i32 + 1;
        prop_assert_eq!(counter.invoke(&[]), Ok(Value::I32(expected)));
    }

    #[test]
    fn test_coalesce_prefers_present_value(x in arb_optional_int(), fallback in arb_small_int()) {
        let p = Parameter::new("x", Type::nullable(Type::I32));
        let body = build::coalesce(build::param(&p), build::constant(fallback));
        let callable = qexpr_lang::compile(&build::lambda(vec![p], body)).unwrap();

        let result = callable.invoke(&[to_value(x)]);
        prop_assert_eq!(result, Ok(Value::I32(x.unwrap_or(fallback))));
    }
}
