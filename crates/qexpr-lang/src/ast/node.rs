use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use super::member::{Constructor, Member, Method};
use super::types::{Signature, Type};
use crate::value::Value;
use crate::{Ident, Shared};

pub type Args = Vec<Shared<Node>>;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// The tag of an expression node.
///
/// The tag is independent of the [`Expr`] payload so that a tree can describe
/// shapes the compiler rejects, e.g. a binary payload tagged `Lambda`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Add,
    AddChecked,
    And,
    AndAlso,
    ArrayIndex,
    ArrayLength,
    Assign,
    Block,
    Call,
    Coalesce,
    Conditional,
    Constant,
    Convert,
    ConvertChecked,
    Divide,
    Equal,
    ExclusiveOr,
    GreaterThan,
    GreaterThanOrEqual,
    Invoke,
    Lambda,
    LeftShift,
    LessThan,
    LessThanOrEqual,
    ListInit,
    MemberAccess,
    MemberInit,
    Modulo,
    Multiply,
    MultiplyChecked,
    Negate,
    NegateChecked,
    New,
    NewArrayBounds,
    NewArrayInit,
    Not,
    NotEqual,
    Or,
    OrElse,
    Parameter,
    Power,
    Quote,
    RightShift,
    Subtract,
    SubtractChecked,
    TypeAs,
    TypeIs,
    UnaryPlus,
}

impl NodeKind {
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            NodeKind::Add
                | NodeKind::AddChecked
                | NodeKind::And
                | NodeKind::AndAlso
                | NodeKind::ArrayIndex
                | NodeKind::Coalesce
                | NodeKind::Divide
                | NodeKind::Equal
                | NodeKind::ExclusiveOr
                | NodeKind::GreaterThan
                | NodeKind::GreaterThanOrEqual
                | NodeKind::LeftShift
                | NodeKind::LessThan
                | NodeKind::LessThanOrEqual
                | NodeKind::Modulo
                | NodeKind::Multiply
                | NodeKind::MultiplyChecked
                | NodeKind::NotEqual
                | NodeKind::Or
                | NodeKind::OrElse
                | NodeKind::Power
                | NodeKind::RightShift
                | NodeKind::Subtract
                | NodeKind::SubtractChecked
        )
    }

    pub fn is_unary(self) -> bool {
        matches!(
            self,
            NodeKind::ArrayLength
                | NodeKind::Convert
                | NodeKind::ConvertChecked
                | NodeKind::Negate
                | NodeKind::NegateChecked
                | NodeKind::Not
                | NodeKind::Quote
                | NodeKind::TypeAs
                | NodeKind::UnaryPlus
        )
    }

    /// Comparison kinds, whose lifted form may still produce a plain `bool`.
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            NodeKind::Equal
                | NodeKind::NotEqual
                | NodeKind::LessThan
                | NodeKind::LessThanOrEqual
                | NodeKind::GreaterThan
                | NodeKind::GreaterThanOrEqual
        )
    }

    pub fn is_checked(self) -> bool {
        matches!(
            self,
            NodeKind::AddChecked
                | NodeKind::SubtractChecked
                | NodeKind::MultiplyChecked
                | NodeKind::NegateChecked
                | NodeKind::ConvertChecked
        )
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// An immutable, typed expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub ty: Type,
    pub expr: Expr,
}

impl Node {
    pub fn new(kind: NodeKind, ty: Type, expr: Expr) -> Shared<Self> {
        Shared::new(Self { kind, ty, expr })
    }

    pub fn as_lambda(&self) -> Option<&Shared<Lambda>> {
        match &self.expr {
            Expr::Lambda(lambda) => Some(lambda),
            _ => None,
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.ty)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(Value),
    Parameter(Shared<Parameter>),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Conditional {
        test: Shared<Node>,
        if_true: Shared<Node>,
        if_false: Shared<Node>,
    },
    /// `target` is `None` for static members.
    MemberAccess {
        target: Option<Shared<Node>>,
        member: Member,
    },
    Call {
        target: Option<Shared<Node>>,
        method: Method,
        args: Args,
    },
    /// Without a constructor the node's type is default-initialized.
    New {
        constructor: Option<Constructor>,
        args: Args,
    },
    /// Elements for `NewArrayInit`, the single length for `NewArrayBounds`.
    NewArray(Args),
    ListInit {
        new: Shared<Node>,
        initializers: Vec<ElementInit>,
    },
    MemberInit {
        new: Shared<Node>,
        bindings: Vec<MemberBinding>,
    },
    Lambda(Shared<Lambda>),
    Invoke {
        target: Shared<Node>,
        args: Args,
    },
    TypeIs {
        operand: Shared<Node>,
        type_operand: Type,
    },
    Assign {
        target: Shared<Parameter>,
        value: Shared<Node>,
    },
    Block(Args),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub operand: Shared<Node>,
    /// User-defined operator or conversion.
    pub method: Option<Method>,
    pub lifted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Shared<Node>,
    pub right: Shared<Node>,
    /// User-defined operator.
    pub method: Option<Method>,
    /// Operands are optional while the operator is defined on plain values.
    pub lifted: bool,
    /// The result is optional as well. Only meaningful for comparisons.
    pub lifted_to_null: bool,
    /// Applied to the left operand of a `Coalesce` when it has a value.
    pub conversion: Option<Shared<Lambda>>,
}

/// A lambda parameter. Identity is a process-unique id, never the name.
#[derive(Debug)]
pub struct Parameter {
    id: u64,
    pub name: Ident,
    pub ty: Type,
}

impl Parameter {
    pub fn new(name: &str, ty: Type) -> Shared<Self> {
        Shared::new(Self {
            id: next_id(),
            name: Ident::new(name),
            ty,
        })
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Parameter {}

impl Hash for Parameter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug)]
pub struct Lambda {
    id: u64,
    pub name: Option<Ident>,
    pub params: Vec<Shared<Parameter>>,
    pub body: Shared<Node>,
    pub signature: Shared<Signature>,
}

impl Lambda {
    pub fn new(name: Option<&str>, params: Vec<Shared<Parameter>>, body: Shared<Node>) -> Shared<Self> {
        let signature = Shared::new(Signature::new(
            params.iter().map(|param| param.ty.clone()).collect(),
            body.ty.clone(),
        ));
        Shared::new(Self {
            id: next_id(),
            name: name.map(Ident::new),
            params,
            body,
            signature,
        })
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn declares(&self, parameter: &Parameter) -> bool {
        self.params.iter().any(|param| param.id == parameter.id)
    }
}

impl PartialEq for Lambda {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// One `Add`-style call of a list initializer.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementInit {
    pub add_method: Method,
    pub args: Args,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberBinding {
    /// `member = value`
    Assignment(Member, Shared<Node>),
    /// Applies nested bindings to the object held by `member`.
    Member(Member, Vec<MemberBinding>),
    /// Adds elements to the list held by `member`.
    List(Member, Vec<ElementInit>),
}

impl MemberBinding {
    pub fn member(&self) -> &Member {
        match self {
            MemberBinding::Assignment(member, _) | MemberBinding::Member(member, _) | MemberBinding::List(member, _) => {
                member
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(NodeKind::Add, true, false, false)]
    #[case(NodeKind::Equal, true, false, true)]
    #[case(NodeKind::Quote, false, true, false)]
    #[case(NodeKind::Lambda, false, false, false)]
    fn test_node_kind_classes(
        #[case] kind: NodeKind,
        #[case] binary: bool,
        #[case] unary: bool,
        #[case] relational: bool,
    ) {
        assert_eq!(kind.is_binary(), binary);
        assert_eq!(kind.is_unary(), unary);
        assert_eq!(kind.is_relational(), relational);
    }

    #[test]
    fn test_parameter_identity_ignores_name() {
        let a = Parameter::new("x", Type::I32);
        let b = Parameter::new("x", Type::I32);
        assert_ne!(a, b);
        assert_eq!(a, Shared::clone(&a));
    }

    #[test]
    fn test_lambda_signature() {
        let x = Parameter::new("x", Type::I32);
        let body = Node::new(NodeKind::Parameter, Type::I32, Expr::Parameter(Shared::clone(&x)));
        let lambda = Lambda::new(Some("id"), vec![Shared::clone(&x)], body);
        assert!(lambda.declares(&x));
        assert_eq!(lambda.signature.to_string(), "fn(i32) -> i32");
    }
}
