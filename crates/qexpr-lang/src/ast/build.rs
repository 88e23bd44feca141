//! Non-validating constructors for expression trees.
//!
//! Result types are inferred from operands the way a validated tree would
//! carry them, and the `lifted` flags are set whenever an operand is
//! optional. Nothing here checks that operand types fit the operator.

use super::member::{Constructor, Member, Method};
use super::node::{Args, BinaryExpr, ElementInit, Expr, Lambda, MemberBinding, Node, NodeKind, Parameter, UnaryExpr};
use super::types::{Signature, Type};
use crate::Shared;
use crate::value::Value;

/// A constant typed by its value. `Value::Null` is typed `Object`.
pub fn constant(value: impl Into<Value>) -> Shared<Node> {
    let value = value.into();
    Node::new(NodeKind::Constant, value.natural_type(), Expr::Constant(value))
}

pub fn typed_constant(value: impl Into<Value>, ty: Type) -> Shared<Node> {
    Node::new(NodeKind::Constant, ty, Expr::Constant(value.into()))
}

/// A `null` of the given type, e.g. an optional with no value.
pub fn null(ty: Type) -> Shared<Node> {
    typed_constant(Value::Null, ty)
}

pub fn param(parameter: &Shared<Parameter>) -> Shared<Node> {
    Node::new(
        NodeKind::Parameter,
        parameter.ty.clone(),
        Expr::Parameter(Shared::clone(parameter)),
    )
}

pub fn lambda(params: Vec<Shared<Parameter>>, body: Shared<Node>) -> Shared<Node> {
    lambda_node(Lambda::new(None, params, body))
}

pub fn named_lambda(name: &str, params: Vec<Shared<Parameter>>, body: Shared<Node>) -> Shared<Node> {
    lambda_node(Lambda::new(Some(name), params, body))
}

pub fn lambda_node(lambda: Shared<Lambda>) -> Shared<Node> {
    Node::new(
        NodeKind::Lambda,
        Type::Function(Shared::clone(&lambda.signature)),
        Expr::Lambda(lambda),
    )
}

fn binary_type(kind: NodeKind, left: &Type, lifted: bool, lifted_to_null: bool) -> Type {
    if kind.is_relational() {
        if lifted_to_null {
            Type::nullable(Type::Bool)
        } else {
            Type::Bool
        }
    } else if kind == NodeKind::ArrayIndex {
        left.element_type().cloned().unwrap_or(Type::Object)
    } else if lifted {
        Type::nullable(left.non_nullable().clone())
    } else {
        left.clone()
    }
}

/// A primitive binary operator. Comparisons over optionals produce `bool`;
/// use [`binary_lifted_to_null`] for an optional result.
pub fn binary(kind: NodeKind, left: Shared<Node>, right: Shared<Node>) -> Shared<Node> {
    let lifted = left.ty.is_nullable() || right.ty.is_nullable();
    let lifted_to_null = lifted && !kind.is_relational();
    make_binary(kind, left, right, lifted, lifted_to_null)
}

pub fn binary_lifted_to_null(kind: NodeKind, left: Shared<Node>, right: Shared<Node>) -> Shared<Node> {
    let lifted = left.ty.is_nullable() || right.ty.is_nullable();
    make_binary(kind, left, right, lifted, lifted)
}

/// A binary operator implemented by a user method.
///
/// The node is lifted when an operand is optional and the method takes plain
/// values. A lifted comparison whose method does not return `bool` gets an
/// optional result type.
pub fn binary_with_method(kind: NodeKind, left: Shared<Node>, right: Shared<Node>, method: Method) -> Shared<Node> {
    let takes_optional = method.params().iter().any(Type::is_nullable);
    let lifted = !takes_optional && (left.ty.is_nullable() || right.ty.is_nullable());
    let ret = method.return_type().clone();
    let (ty, lifted_to_null) = if !lifted {
        (ret, false)
    } else if kind.is_relational() && ret.is_bool() {
        (Type::Bool, false)
    } else {
        (Type::nullable(ret), true)
    };
    Node::new(
        kind,
        ty,
        Expr::Binary(BinaryExpr {
            left,
            right,
            method: Some(method),
            lifted,
            lifted_to_null,
            conversion: None,
        }),
    )
}

fn make_binary(
    kind: NodeKind,
    left: Shared<Node>,
    right: Shared<Node>,
    lifted: bool,
    lifted_to_null: bool,
) -> Shared<Node> {
    let ty = binary_type(kind, &left.ty, lifted, lifted_to_null);
    Node::new(
        kind,
        ty,
        Expr::Binary(BinaryExpr {
            left,
            right,
            method: None,
            lifted,
            lifted_to_null,
            conversion: None,
        }),
    )
}

macro_rules! binary_builders {
    ($($name:ident => $kind:ident),* $(,)?) => {
        $(
            pub fn $name(left: Shared<Node>, right: Shared<Node>) -> Shared<Node> {
                binary(NodeKind::$kind, left, right)
            }
        )*
    };
}

binary_builders!(
    add => Add,
    add_checked => AddChecked,
    subtract => Subtract,
    subtract_checked => SubtractChecked,
    multiply => Multiply,
    multiply_checked => MultiplyChecked,
    divide => Divide,
    modulo => Modulo,
    power => Power,
    left_shift => LeftShift,
    right_shift => RightShift,
    and => And,
    or => Or,
    exclusive_or => ExclusiveOr,
    and_also => AndAlso,
    or_else => OrElse,
    equal => Equal,
    not_equal => NotEqual,
    less_than => LessThan,
    less_than_or_equal => LessThanOrEqual,
    greater_than => GreaterThan,
    greater_than_or_equal => GreaterThanOrEqual,
    array_index => ArrayIndex,
);

/// `left ?? right`. An optional left with a plain right yields a plain value.
pub fn coalesce(left: Shared<Node>, right: Shared<Node>) -> Shared<Node> {
    let ty = if left.ty.is_nullable() && !right.ty.is_nullable() {
        left.ty.non_nullable().clone()
    } else {
        left.ty.clone()
    };
    Node::new(
        NodeKind::Coalesce,
        ty,
        Expr::Binary(BinaryExpr {
            left,
            right,
            method: None,
            lifted: false,
            lifted_to_null: false,
            conversion: None,
        }),
    )
}

/// `left ?? right` where a present left value goes through `conversion`.
pub fn coalesce_with(left: Shared<Node>, right: Shared<Node>, conversion: Shared<Lambda>) -> Shared<Node> {
    Node::new(
        NodeKind::Coalesce,
        conversion.signature.ret.clone(),
        Expr::Binary(BinaryExpr {
            left,
            right,
            method: None,
            lifted: false,
            lifted_to_null: false,
            conversion: Some(conversion),
        }),
    )
}

pub fn unary(kind: NodeKind, operand: Shared<Node>) -> Shared<Node> {
    let lifted = operand.ty.is_nullable();
    let ty = match kind {
        NodeKind::ArrayLength => Type::I32,
        NodeKind::Quote => return quote(operand),
        _ => operand.ty.clone(),
    };
    Node::new(
        kind,
        ty,
        Expr::Unary(UnaryExpr {
            operand,
            method: None,
            lifted,
        }),
    )
}

pub fn unary_with_method(kind: NodeKind, operand: Shared<Node>, method: Method) -> Shared<Node> {
    let takes_optional = method.params().iter().any(Type::is_nullable);
    let lifted = !takes_optional && operand.ty.is_nullable();
    let ret = method.return_type().clone();
    let ty = if lifted { Type::nullable(ret) } else { ret };
    Node::new(
        kind,
        ty,
        Expr::Unary(UnaryExpr {
            operand,
            method: Some(method),
            lifted,
        }),
    )
}

pub fn negate(operand: Shared<Node>) -> Shared<Node> {
    unary(NodeKind::Negate, operand)
}

pub fn negate_checked(operand: Shared<Node>) -> Shared<Node> {
    unary(NodeKind::NegateChecked, operand)
}

pub fn unary_plus(operand: Shared<Node>) -> Shared<Node> {
    unary(NodeKind::UnaryPlus, operand)
}

pub fn not(operand: Shared<Node>) -> Shared<Node> {
    unary(NodeKind::Not, operand)
}

pub fn array_length(array: Shared<Node>) -> Shared<Node> {
    unary(NodeKind::ArrayLength, array)
}

fn conversion(kind: NodeKind, operand: Shared<Node>, ty: Type, method: Option<Method>) -> Shared<Node> {
    let lifted = operand.ty.is_nullable() && ty.is_nullable();
    Node::new(
        kind,
        ty,
        Expr::Unary(UnaryExpr {
            operand,
            method,
            lifted,
        }),
    )
}

pub fn convert(operand: Shared<Node>, ty: Type) -> Shared<Node> {
    conversion(NodeKind::Convert, operand, ty, None)
}

pub fn convert_checked(operand: Shared<Node>, ty: Type) -> Shared<Node> {
    conversion(NodeKind::ConvertChecked, operand, ty, None)
}

/// A conversion implemented by a user method.
pub fn convert_with_method(operand: Shared<Node>, ty: Type, method: Method) -> Shared<Node> {
    conversion(NodeKind::Convert, operand, ty, Some(method))
}

/// `operand as ty`: the value if it conforms, `null` otherwise.
pub fn type_as(operand: Shared<Node>, ty: Type) -> Shared<Node> {
    conversion(NodeKind::TypeAs, operand, ty, None)
}

pub fn type_is(operand: Shared<Node>, ty: Type) -> Shared<Node> {
    Node::new(
        NodeKind::TypeIs,
        Type::Bool,
        Expr::TypeIs {
            operand,
            type_operand: ty,
        },
    )
}

/// Quotes `operand`. A quoted lambda is typed `Expression<signature>`.
pub fn quote(operand: Shared<Node>) -> Shared<Node> {
    let signature = match &operand.ty {
        Type::Function(signature) if operand.as_lambda().is_some() => Shared::clone(signature),
        ty => Shared::new(Signature::new(Vec::new(), ty.clone())),
    };
    Node::new(
        NodeKind::Quote,
        Type::Expression(signature),
        Expr::Unary(UnaryExpr {
            operand,
            method: None,
            lifted: false,
        }),
    )
}

pub fn condition(test: Shared<Node>, if_true: Shared<Node>, if_false: Shared<Node>) -> Shared<Node> {
    let ty = if_true.ty.clone();
    Node::new(
        NodeKind::Conditional,
        ty,
        Expr::Conditional {
            test,
            if_true,
            if_false,
        },
    )
}

pub fn member_access(target: Option<Shared<Node>>, member: Member) -> Shared<Node> {
    Node::new(
        NodeKind::MemberAccess,
        member.ty().clone(),
        Expr::MemberAccess { target, member },
    )
}

/// Reads a record field by name. `None` if the target type has no such field.
pub fn field(target: Shared<Node>, name: &str) -> Option<Shared<Node>> {
    let member = Member::field(&target.ty, name)?;
    Some(member_access(Some(target), member))
}

pub fn call(target: Option<Shared<Node>>, method: Method, args: Args) -> Shared<Node> {
    Node::new(
        NodeKind::Call,
        method.return_type().clone(),
        Expr::Call { target, method, args },
    )
}

pub fn new(constructor: Constructor, args: Args) -> Shared<Node> {
    Node::new(
        NodeKind::New,
        constructor.ty.clone(),
        Expr::New {
            constructor: Some(constructor),
            args,
        },
    )
}

/// A default instance of `ty`: a fresh record, or a value type's zero.
pub fn new_default(ty: Type) -> Shared<Node> {
    Node::new(
        NodeKind::New,
        ty,
        Expr::New {
            constructor: None,
            args: Vec::new(),
        },
    )
}

pub fn new_array(element: Type, items: Args) -> Shared<Node> {
    Node::new(NodeKind::NewArrayInit, Type::array(element), Expr::NewArray(items))
}

pub fn new_array_bounds(element: Type, length: Shared<Node>) -> Shared<Node> {
    Node::new(NodeKind::NewArrayBounds, Type::array(element), Expr::NewArray(vec![length]))
}

pub fn element_init(add_method: Method, args: Args) -> ElementInit {
    ElementInit { add_method, args }
}

pub fn list_init(new: Shared<Node>, initializers: Vec<ElementInit>) -> Shared<Node> {
    let ty = new.ty.clone();
    Node::new(NodeKind::ListInit, ty, Expr::ListInit { new, initializers })
}

pub fn member_init(new: Shared<Node>, bindings: Vec<MemberBinding>) -> Shared<Node> {
    let ty = new.ty.clone();
    Node::new(NodeKind::MemberInit, ty, Expr::MemberInit { new, bindings })
}

pub fn invoke(target: Shared<Node>, args: Args) -> Shared<Node> {
    let ty = target
        .ty
        .signature()
        .map(|signature| signature.ret.clone())
        .unwrap_or(Type::Object);
    Node::new(NodeKind::Invoke, ty, Expr::Invoke { target, args })
}

pub fn assign(target: &Shared<Parameter>, value: Shared<Node>) -> Shared<Node> {
    Node::new(
        NodeKind::Assign,
        target.ty.clone(),
        Expr::Assign {
            target: Shared::clone(target),
            value,
        },
    )
}

/// Evaluates `items` in order and yields the last value, or unit if empty.
pub fn block(items: Args) -> Shared<Node> {
    let ty = items.last().map(|item| item.ty.clone()).unwrap_or(Type::Unit);
    Node::new(NodeKind::Block, ty, Expr::Block(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(add(constant(1), constant(2)), Type::I32)]
    #[case(add(null(Type::nullable(Type::I32)), constant(2)), Type::nullable(Type::I32))]
    #[case(equal(null(Type::nullable(Type::I32)), constant(2)), Type::Bool)]
    #[case(
        binary_lifted_to_null(NodeKind::LessThan, null(Type::nullable(Type::I32)), constant(2)),
        Type::nullable(Type::Bool)
    )]
    #[case(coalesce(null(Type::nullable(Type::I64)), constant(2_i64)), Type::I64)]
    #[case(array_index(new_array(Type::F64, vec![constant(1.0)]), constant(0)), Type::F64)]
    #[case(block(vec![]), Type::Unit)]
    fn test_inferred_type(#[case] node: Shared<Node>, #[case] expected: Type) {
        assert_eq!(node.ty, expected);
    }

    #[test]
    fn test_lifted_flags() {
        let node = and(null(Type::nullable(Type::Bool)), constant(true));
        let Expr::Binary(binary) = &node.expr else {
            panic!("expected a binary node");
        };
        assert!(binary.lifted);
        assert!(binary.lifted_to_null);
    }

    #[test]
    fn test_lifted_comparison_with_non_bool_method_is_optional() {
        let method = Method::new_static("cmp", vec![Type::I32, Type::I32], Type::I32, |_| Ok(Value::I32(0)));
        let node = binary_with_method(
            NodeKind::LessThan,
            null(Type::nullable(Type::I32)),
            constant(1),
            method,
        );
        assert_eq!(node.ty, Type::nullable(Type::I32));
    }

    #[test]
    fn test_quote_of_lambda_is_typed_expression() {
        let x = Parameter::new("x", Type::I32);
        let node = quote(lambda(vec![Shared::clone(&x)], param(&x)));
        assert_eq!(node.ty.to_string(), "Expression<fn(i32) -> i32>");
    }
}
