//! Runtime values produced and consumed by compiled callables.

use std::fmt::{self, Display, Formatter};
use std::sync::PoisonError;

use itertools::Itertools;
use smol_str::SmolStr;

use crate::ast::node::Node;
use crate::ast::types::{RecordType, Type};
use crate::runtime::Callable;
use crate::{Shared, SharedCell};

/// A runtime value.
///
/// An optional without a value and a null reference are both [`Value::Null`];
/// an optional holding a value is represented by the bare value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Unit,
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(Shared<str>),
    Array(Shared<[Value]>),
    List(Shared<SharedCell<Vec<Value>>>),
    Object(Shared<Object>),
    Function(Callable),
    /// A quoted, scope-independent expression tree.
    Expression(Shared<Node>),
}

/// An instance of a [`RecordType`].
#[derive(Debug)]
pub struct Object {
    pub(crate) ty: Shared<RecordType>,
    pub(crate) fields: SharedCell<Vec<Value>>,
}

impl Object {
    pub fn record_type(&self) -> &Shared<RecordType> {
        &self.ty
    }

    pub fn field(&self, index: usize) -> Value {
        self.fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns `false` if the index is out of range.
    pub fn set_field(&self, index: usize, value: Value) -> bool {
        let mut fields = self.fields.write().unwrap_or_else(PoisonError::into_inner);
        match fields.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl Value {
    pub fn string(s: &str) -> Self {
        Value::String(Shared::from(s))
    }

    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(Shared::from(values))
    }

    pub fn list(values: Vec<Value>) -> Self {
        Value::List(Shared::new(SharedCell::new(values)))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Callable> {
        match self {
            Value::Function(callable) => Some(callable),
            _ => None,
        }
    }

    pub fn as_expression(&self) -> Option<&Shared<Node>> {
        match self {
            Value::Expression(node) => Some(node),
            _ => None,
        }
    }

    /// Snapshot of a list's elements.
    pub fn list_items(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(list) => Some(list.read().unwrap_or_else(PoisonError::into_inner).clone()),
            _ => None,
        }
    }

    /// The natural static type of a value, used when building constants.
    pub fn natural_type(&self) -> Type {
        match self {
            Value::Null => Type::Object,
            Value::Unit => Type::Unit,
            Value::Bool(_) => Type::Bool,
            Value::Char(_) => Type::Char,
            Value::I8(_) => Type::I8,
            Value::I16(_) => Type::I16,
            Value::I32(_) => Type::I32,
            Value::I64(_) => Type::I64,
            Value::U8(_) => Type::U8,
            Value::U16(_) => Type::U16,
            Value::U32(_) => Type::U32,
            Value::U64(_) => Type::U64,
            Value::F32(_) => Type::F32,
            Value::F64(_) => Type::F64,
            Value::String(_) => Type::String,
            Value::Array(_) => Type::array(Type::Object),
            Value::List(_) => Type::list(Type::Object),
            Value::Object(object) => Type::Record(Shared::clone(&object.ty)),
            Value::Function(callable) => Type::Function(Shared::clone(callable.signature())),
            Value::Expression(node) => match &node.ty {
                Type::Function(signature) => Type::Expression(Shared::clone(signature)),
                ty => ty.clone(),
            },
        }
    }

    pub fn type_name(&self) -> SmolStr {
        match self {
            Value::Null => SmolStr::new_static("null"),
            Value::Object(object) => object.ty.name.resolve_with(|name| SmolStr::new(name)),
            Value::Array(_) => SmolStr::new_static("array"),
            Value::List(_) => SmolStr::new_static("list"),
            Value::Function(_) => SmolStr::new_static("function"),
            Value::Expression(_) => SmolStr::new_static("expression"),
            other => SmolStr::new(other.natural_type().to_string()),
        }
    }

    /// Returns `true` if the value may be stored in a slot of type `ty`.
    ///
    /// Array and list element types are not inspected.
    pub fn conforms_to(&self, ty: &Type) -> bool {
        match (self, ty) {
            (Value::Null, ty) => ty.admits_null(),
            (value, Type::Nullable(inner)) => value.conforms_to(inner),
            (_, Type::Object) => true,
            (Value::Unit, Type::Unit)
            | (Value::Bool(_), Type::Bool)
            | (Value::Char(_), Type::Char)
            | (Value::I8(_), Type::I8)
            | (Value::I16(_), Type::I16)
            | (Value::I32(_), Type::I32)
            | (Value::I64(_), Type::I64)
            | (Value::U8(_), Type::U8)
            | (Value::U16(_), Type::U16)
            | (Value::U32(_), Type::U32)
            | (Value::U64(_), Type::U64)
            | (Value::F32(_), Type::F32)
            | (Value::F64(_), Type::F64)
            | (Value::String(_), Type::String)
            | (Value::Array(_), Type::Array(_))
            | (Value::List(_), Type::List(_))
            | (Value::Function(_), Type::Function(_))
            | (Value::Expression(_), Type::Expression(_)) => true,
            (Value::Object(object), Type::Record(record)) => object.ty.derives_from(record),
            _ => false,
        }
    }

    /// Equality as the `Equal` operator sees it: value equality for
    /// primitives, content equality for strings, identity for references.
    pub fn operator_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Shared::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => Shared::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Shared::ptr_eq(a, b),
            (Value::Expression(a), Value::Expression(b)) => Shared::ptr_eq(a, b),
            (a, b) => a == b,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                Shared::ptr_eq(a, b)
                    || *a.read().unwrap_or_else(PoisonError::into_inner)
                        == *b.read().unwrap_or_else(PoisonError::into_inner)
            }
            (Value::Object(a), Value::Object(b)) => Shared::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Expression(a), Value::Expression(b)) => Shared::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "{}", c),
            Value::I8(n) => write!(f, "{}", n),
            Value::I16(n) => write!(f, "{}", n),
            Value::I32(n) => write!(f, "{}", n),
            Value::I64(n) => write!(f, "{}", n),
            Value::U8(n) => write!(f, "{}", n),
            Value::U16(n) => write!(f, "{}", n),
            Value::U32(n) => write!(f, "{}", n),
            Value::U64(n) => write!(f, "{}", n),
            Value::F32(n) => write!(f, "{}", n),
            Value::F64(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(values) => write!(f, "[{}]", values.iter().join(", ")),
            Value::List(list) => write!(
                f,
                "[{}]",
                list.read().unwrap_or_else(PoisonError::into_inner).iter().join(", ")
            ),
            Value::Object(object) => write!(f, "{} {{ .. }}", object.ty.name),
            Value::Function(callable) => write!(f, "{}", callable.signature()),
            Value::Expression(node) => write!(f, "quote({})", node),
        }
    }
}

macro_rules! impl_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from!(
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    Callable => Function,
);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Shared::from(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::Field;
    use rstest::rstest;

    #[rstest]
    #[case(Value::I32(1), Type::I32, true)]
    #[case(Value::I32(1), Type::I64, false)]
    #[case(Value::I32(1), Type::nullable(Type::I32), true)]
    #[case(Value::Null, Type::nullable(Type::I32), true)]
    #[case(Value::Null, Type::I32, false)]
    #[case(Value::Null, Type::String, true)]
    #[case(Value::string("a"), Type::Object, true)]
    fn test_conforms_to(#[case] value: Value, #[case] ty: Type, #[case] expected: bool) {
        assert_eq!(value.conforms_to(&ty), expected);
    }

    #[test]
    fn test_record_conformance_follows_inheritance() {
        let base = RecordType::new("Animal", vec![Field::new("name", Type::String)]);
        let dog = RecordType::derived("Dog", &base, vec![]);
        let value = dog.instantiate();
        assert!(value.conforms_to(&Type::Record(Shared::clone(&base))));
        assert!(!base.instantiate().conforms_to(&Type::Record(dog)));
    }

    #[test]
    fn test_operator_eq_uses_identity_for_references() {
        let a = Value::array(vec![Value::I32(1)]);
        let b = Value::array(vec![Value::I32(1)]);
        assert_eq!(a, b);
        assert!(!a.operator_eq(&b));
        assert!(a.operator_eq(&a.clone()));
        assert!(Value::string("x").operator_eq(&Value::string("x")));
    }

    #[rstest]
    #[case(Value::from(Some(3_i32)), Value::I32(3))]
    #[case(Value::from(None::<i32>), Value::Null)]
    #[case(Value::from("hi"), Value::string("hi"))]
    fn test_from(#[case] actual: Value, #[case] expected: Value) {
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::array(vec![Value::I32(1), Value::Null]).to_string(), "[1, null]");
        assert_eq!(Value::list(vec![Value::Bool(true)]).to_string(), "[true]");
    }
}
