//! Hoisting analysis.
//!
//! Decides, for every lambda, which of its parameters live in a shared cell
//! rather than an argument slot: exactly those read or written from a lambda
//! (or quote) nested strictly inside it.

use rustc_hash::FxHashMap;

use crate::Shared;
use crate::ast::node::{Lambda, Node, Parameter};
use crate::ast::visit::{Visitor, walk_lambda};

/// Hoisted parameters per lambda id, in first-seen order.
#[derive(Debug, Default)]
pub(crate) struct HoistingMap {
    hoisted: FxHashMap<u64, Vec<Shared<Parameter>>>,
}

impl HoistingMap {
    pub(crate) fn analyze(root: &Shared<Lambda>) -> Self {
        let mut analyzer = HoistingAnalyzer::default();
        analyzer.visit_lambda(root);
        Self {
            hoisted: analyzer.hoisted,
        }
    }

    pub(crate) fn hoisted(&self, lambda: &Lambda) -> &[Shared<Parameter>] {
        self.hoisted.get(&lambda.id()).map(Vec::as_slice).unwrap_or_default()
    }
}

#[derive(Default)]
struct HoistingAnalyzer {
    /// Innermost enclosing lambda; `None` inside a quote.
    current: Option<u64>,
    /// Parameter id to the ids of the lambdas declaring it, innermost last.
    declared: FxHashMap<u64, Vec<u64>>,
    hoisted: FxHashMap<u64, Vec<Shared<Parameter>>>,
}

impl Visitor for HoistingAnalyzer {
    fn visit_lambda(&mut self, lambda: &Shared<Lambda>) {
        for param in &lambda.params {
            self.declared.entry(param.id()).or_default().push(lambda.id());
        }
        let enclosing = self.current.replace(lambda.id());
        walk_lambda(self, lambda);
        self.current = enclosing;
        for param in &lambda.params {
            if let Some(lambdas) = self.declared.get_mut(&param.id()) {
                lambdas.pop();
                if lambdas.is_empty() {
                    self.declared.remove(&param.id());
                }
            }
        }
    }

    fn visit_quote(&mut self, operand: &Shared<Node>) {
        let enclosing = self.current.take();
        self.visit_node(operand);
        self.current = enclosing;
    }

    fn visit_parameter(&mut self, parameter: &Shared<Parameter>) {
        // Unbound parameters are left for the emitter to report.
        let Some(&declaring) = self.declared.get(&parameter.id()).and_then(|lambdas| lambdas.last()) else {
            return;
        };
        if self.current == Some(declaring) {
            return;
        }
        let hoisted = self.hoisted.entry(declaring).or_default();
        if !hoisted.iter().any(|p| p.id() == parameter.id()) {
            hoisted.push(Shared::clone(parameter));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build;
    use crate::ast::types::Type;

    fn lambda_of(node: &Shared<Node>) -> Shared<Lambda> {
        Shared::clone(node.as_lambda().expect("expected a lambda"))
    }

    #[test]
    fn test_parameter_used_only_locally_is_not_hoisted() {
        let x = Parameter::new("x", Type::I32);
        let root = build::lambda(vec![Shared::clone(&x)], build::add(build::param(&x), build::param(&x)));
        let map = HoistingMap::analyze(&lambda_of(&root));
        assert!(map.hoisted(&lambda_of(&root)).is_empty());
    }

    #[test]
    fn test_parameter_read_by_nested_lambda_is_hoisted_once() {
        let x = Parameter::new("x", Type::I32);
        let y = Parameter::new("y", Type::I32);
        let inner = build::lambda(
            vec![Shared::clone(&y)],
            build::add(build::add(build::param(&x), build::param(&y)), build::param(&x)),
        );
        let root = build::lambda(vec![Shared::clone(&x)], inner.clone());
        let map = HoistingMap::analyze(&lambda_of(&root));
        assert_eq!(map.hoisted(&lambda_of(&root)), &[x]);
        assert!(map.hoisted(&lambda_of(&inner)).is_empty());
    }

    #[test]
    fn test_deeply_nested_reference_hoists_in_declaring_lambda() {
        let x = Parameter::new("x", Type::I32);
        let z = Parameter::new("z", Type::I32);
        let innermost = build::lambda(vec![], build::add(build::param(&x), build::param(&z)));
        let middle = build::lambda(vec![Shared::clone(&z)], innermost);
        let root = build::lambda(vec![Shared::clone(&x)], middle.clone());
        let map = HoistingMap::analyze(&lambda_of(&root));
        assert_eq!(map.hoisted(&lambda_of(&root)), &[x]);
        assert_eq!(map.hoisted(&lambda_of(&middle)), &[z]);
    }

    #[test]
    fn test_quote_is_a_boundary() {
        let x = Parameter::new("x", Type::I32);
        let root = build::lambda(
            vec![Shared::clone(&x)],
            build::quote(build::add(build::param(&x), build::constant(1))),
        );
        let map = HoistingMap::analyze(&lambda_of(&root));
        assert_eq!(map.hoisted(&lambda_of(&root)), &[x]);
    }

    #[test]
    fn test_redeclared_parameter_keeps_outer_binding() {
        let x = Parameter::new("x", Type::I32);
        let shadow = build::lambda(vec![Shared::clone(&x)], build::param(&x));
        let reader = build::lambda(vec![], build::param(&x));
        let root = build::lambda(vec![Shared::clone(&x)], build::block(vec![shadow.clone(), reader]));
        let map = HoistingMap::analyze(&lambda_of(&root));
        assert_eq!(map.hoisted(&lambda_of(&root)), &[x]);
        assert!(map.hoisted(&lambda_of(&shadow)).is_empty());
    }

    #[test]
    fn test_unbound_parameter_is_ignored() {
        let free = Parameter::new("free", Type::I32);
        let root = build::lambda(vec![], build::lambda(vec![], build::param(&free)));
        let map = HoistingMap::analyze(&lambda_of(&root));
        assert!(map.hoisted(&lambda_of(&root)).is_empty());
    }
}
