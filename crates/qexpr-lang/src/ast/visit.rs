//! Tree walking and parameter substitution.

use rustc_hash::{FxHashMap, FxHashSet};

use super::node::{BinaryExpr, ElementInit, Expr, Lambda, MemberBinding, Node, NodeKind, Parameter, UnaryExpr};
use crate::Shared;
use crate::value::Value;

/// A read-only walk over a tree. Every method recurses by default.
pub trait Visitor {
    fn visit_node(&mut self, node: &Shared<Node>) {
        walk_node(self, node);
    }

    fn visit_lambda(&mut self, lambda: &Shared<Lambda>) {
        walk_lambda(self, lambda);
    }

    /// Called for parameter reads and for assignment targets.
    fn visit_parameter(&mut self, _parameter: &Shared<Parameter>) {}

    /// Called with the operand of a `Quote` node.
    fn visit_quote(&mut self, operand: &Shared<Node>) {
        self.visit_node(operand);
    }
}

pub fn walk_lambda<V: Visitor + ?Sized>(visitor: &mut V, lambda: &Shared<Lambda>) {
    visitor.visit_node(&lambda.body);
}

pub fn walk_node<V: Visitor + ?Sized>(visitor: &mut V, node: &Shared<Node>) {
    match &node.expr {
        Expr::Constant(_) => {}
        Expr::Parameter(parameter) => visitor.visit_parameter(parameter),
        Expr::Unary(UnaryExpr { operand, .. }) if node.kind == NodeKind::Quote => visitor.visit_quote(operand),
        Expr::Unary(UnaryExpr { operand, .. }) => visitor.visit_node(operand),
        Expr::Binary(BinaryExpr {
            left,
            right,
            conversion,
            ..
        }) => {
            visitor.visit_node(left);
            visitor.visit_node(right);
            if let Some(conversion) = conversion {
                visitor.visit_lambda(conversion);
            }
        }
        Expr::Conditional {
            test,
            if_true,
            if_false,
        } => {
            visitor.visit_node(test);
            visitor.visit_node(if_true);
            visitor.visit_node(if_false);
        }
        Expr::MemberAccess { target, .. } => {
            if let Some(target) = target {
                visitor.visit_node(target);
            }
        }
        Expr::Call { target, args, .. } => {
            if let Some(target) = target {
                visitor.visit_node(target);
            }
            args.iter().for_each(|arg| visitor.visit_node(arg));
        }
        Expr::New { args, .. } | Expr::NewArray(args) | Expr::Block(args) => {
            args.iter().for_each(|arg| visitor.visit_node(arg));
        }
        Expr::ListInit { new, initializers } => {
            visitor.visit_node(new);
            walk_initializers(visitor, initializers);
        }
        Expr::MemberInit { new, bindings } => {
            visitor.visit_node(new);
            walk_bindings(visitor, bindings);
        }
        Expr::Lambda(lambda) => visitor.visit_lambda(lambda),
        Expr::Invoke { target, args } => {
            visitor.visit_node(target);
            args.iter().for_each(|arg| visitor.visit_node(arg));
        }
        Expr::TypeIs { operand, .. } => visitor.visit_node(operand),
        Expr::Assign { target, value } => {
            visitor.visit_parameter(target);
            visitor.visit_node(value);
        }
    }
}

fn walk_initializers<V: Visitor + ?Sized>(visitor: &mut V, initializers: &[ElementInit]) {
    for initializer in initializers {
        initializer.args.iter().for_each(|arg| visitor.visit_node(arg));
    }
}

fn walk_bindings<V: Visitor + ?Sized>(visitor: &mut V, bindings: &[MemberBinding]) {
    for binding in bindings {
        match binding {
            MemberBinding::Assignment(_, value) => visitor.visit_node(value),
            MemberBinding::Member(_, nested) => walk_bindings(visitor, nested),
            MemberBinding::List(_, initializers) => walk_initializers(visitor, initializers),
        }
    }
}

#[derive(Default)]
struct FreeParameters {
    /// Declaration counts, so that a lambda reused inside itself stays bound.
    declared: FxHashMap<u64, usize>,
    seen: FxHashSet<u64>,
    free: Vec<Shared<Parameter>>,
}

impl Visitor for FreeParameters {
    fn visit_lambda(&mut self, lambda: &Shared<Lambda>) {
        for param in &lambda.params {
            *self.declared.entry(param.id()).or_default() += 1;
        }
        walk_lambda(self, lambda);
        for param in &lambda.params {
            if let Some(count) = self.declared.get_mut(&param.id()) {
                *count -= 1;
                if *count == 0 {
                    self.declared.remove(&param.id());
                }
            }
        }
    }

    fn visit_parameter(&mut self, parameter: &Shared<Parameter>) {
        if !self.declared.contains_key(&parameter.id()) && self.seen.insert(parameter.id()) {
            self.free.push(Shared::clone(parameter));
        }
    }
}

/// Parameters referenced in `node` that no lambda inside `node` declares, in
/// first-seen order.
pub fn free_parameters(node: &Shared<Node>) -> Vec<Shared<Parameter>> {
    let mut visitor = FreeParameters::default();
    visitor.visit_node(node);
    visitor.free
}

/// Rebuilds `node` with every read of a parameter in `values` replaced by a
/// constant holding the mapped value.
///
/// Assignment targets are left untouched.
pub fn replace_parameters(node: &Shared<Node>, values: &FxHashMap<u64, Value>) -> Shared<Node> {
    if values.is_empty() {
        return Shared::clone(node);
    }
    Replacer { values }.node(node)
}

struct Replacer<'a> {
    values: &'a FxHashMap<u64, Value>,
}

impl Replacer<'_> {
    fn node(&self, node: &Shared<Node>) -> Shared<Node> {
        let expr = match &node.expr {
            Expr::Constant(_) => return Shared::clone(node),
            Expr::Parameter(parameter) => match self.values.get(&parameter.id()) {
                Some(value) => return Node::new(NodeKind::Constant, node.ty.clone(), Expr::Constant(value.clone())),
                None => return Shared::clone(node),
            },
            Expr::Unary(unary) => Expr::Unary(UnaryExpr {
                operand: self.node(&unary.operand),
                method: unary.method.clone(),
                lifted: unary.lifted,
            }),
            Expr::Binary(binary) => Expr::Binary(BinaryExpr {
                left: self.node(&binary.left),
                right: self.node(&binary.right),
                method: binary.method.clone(),
                lifted: binary.lifted,
                lifted_to_null: binary.lifted_to_null,
                conversion: binary.conversion.as_ref().map(|lambda| self.lambda(lambda)),
            }),
            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => Expr::Conditional {
                test: self.node(test),
                if_true: self.node(if_true),
                if_false: self.node(if_false),
            },
            Expr::MemberAccess { target, member } => Expr::MemberAccess {
                target: target.as_ref().map(|target| self.node(target)),
                member: member.clone(),
            },
            Expr::Call { target, method, args } => Expr::Call {
                target: target.as_ref().map(|target| self.node(target)),
                method: method.clone(),
                args: self.nodes(args),
            },
            Expr::New { constructor, args } => Expr::New {
                constructor: constructor.clone(),
                args: self.nodes(args),
            },
            Expr::NewArray(args) => Expr::NewArray(self.nodes(args)),
            Expr::ListInit { new, initializers } => Expr::ListInit {
                new: self.node(new),
                initializers: self.initializers(initializers),
            },
            Expr::MemberInit { new, bindings } => Expr::MemberInit {
                new: self.node(new),
                bindings: self.bindings(bindings),
            },
            Expr::Lambda(lambda) => Expr::Lambda(self.lambda(lambda)),
            Expr::Invoke { target, args } => Expr::Invoke {
                target: self.node(target),
                args: self.nodes(args),
            },
            Expr::TypeIs { operand, type_operand } => Expr::TypeIs {
                operand: self.node(operand),
                type_operand: type_operand.clone(),
            },
            Expr::Assign { target, value } => Expr::Assign {
                target: Shared::clone(target),
                value: self.node(value),
            },
            Expr::Block(args) => Expr::Block(self.nodes(args)),
        };
        Node::new(node.kind, node.ty.clone(), expr)
    }

    fn nodes(&self, nodes: &[Shared<Node>]) -> Vec<Shared<Node>> {
        nodes.iter().map(|node| self.node(node)).collect()
    }

    fn lambda(&self, lambda: &Shared<Lambda>) -> Shared<Lambda> {
        Lambda::new(
            None,
            lambda.params.iter().map(Shared::clone).collect(),
            self.node(&lambda.body),
        )
    }

    fn initializers(&self, initializers: &[ElementInit]) -> Vec<ElementInit> {
        initializers
            .iter()
            .map(|initializer| ElementInit {
                add_method: initializer.add_method.clone(),
                args: self.nodes(&initializer.args),
            })
            .collect()
    }

    fn bindings(&self, bindings: &[MemberBinding]) -> Vec<MemberBinding> {
        bindings
            .iter()
            .map(|binding| match binding {
                MemberBinding::Assignment(member, value) => MemberBinding::Assignment(member.clone(), self.node(value)),
                MemberBinding::Member(member, nested) => MemberBinding::Member(member.clone(), self.bindings(nested)),
                MemberBinding::List(member, initializers) => {
                    MemberBinding::List(member.clone(), self.initializers(initializers))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build;
    use crate::ast::types::Type;

    #[test]
    fn test_free_parameters_skips_bound_ones() {
        let x = Parameter::new("x", Type::I32);
        let y = Parameter::new("y", Type::I32);
        let inner = build::lambda(
            vec![Shared::clone(&y)],
            build::add(build::param(&x), build::param(&y)),
        );
        let free = free_parameters(&inner);
        assert_eq!(free, vec![x]);
    }

    #[test]
    fn test_free_parameters_includes_assign_targets() {
        let x = Parameter::new("x", Type::I32);
        let node = build::assign(&x, build::constant(1));
        assert_eq!(free_parameters(&node), vec![x]);
    }

    #[test]
    fn test_replace_parameters() {
        let x = Parameter::new("x", Type::I32);
        let y = Parameter::new("y", Type::I32);
        let node = build::block(vec![
            build::assign(&x, build::constant(3)),
            build::add(build::param(&x), build::param(&y)),
        ]);
        let values = FxHashMap::from_iter([(x.id(), Value::I32(7))]);
        let replaced = replace_parameters(&node, &values);

        assert_eq!(free_parameters(&replaced), vec![Shared::clone(&x), y]);
        let Expr::Block(items) = &replaced.expr else {
            panic!("expected a block");
        };
        let Expr::Binary(add) = &items[1].expr else {
            panic!("expected a binary node");
        };
        assert_eq!(add.left.expr, Expr::Constant(Value::I32(7)));
        assert!(matches!(&items[0].expr, Expr::Assign { target, .. } if *target == x));
    }
}
