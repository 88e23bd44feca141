//! Reflection handles referenced by nodes: methods, members and constructors.

use std::fmt::{self, Debug, Formatter};

use super::types::Type;
use crate::error::runtime::RuntimeError;
use crate::value::Value;
use crate::{Ident, Shared, SharedCell};

/// Host function backing a [`Method`] or [`Constructor`].
///
/// Instance methods receive the target as the first argument.
pub type NativeFn = Shared<dyn Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync>;

struct MethodDef {
    name: Ident,
    this: Option<Type>,
    params: Vec<Type>,
    ret: Type,
    func: NativeFn,
}

/// A callable member: a static function, an instance method, or a
/// user-defined operator. Cloning is cheap and equality is identity.
#[derive(Clone)]
pub struct Method(Shared<MethodDef>);

impl Method {
    pub fn new_static<F>(name: &str, params: Vec<Type>, ret: Type, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        Self(Shared::new(MethodDef {
            name: Ident::new(name),
            this: None,
            params,
            ret,
            func: Shared::new(func),
        }))
    }

    pub fn new_instance<F>(name: &str, this: Type, params: Vec<Type>, ret: Type, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        Self(Shared::new(MethodDef {
            name: Ident::new(name),
            this: Some(this),
            params,
            ret,
            func: Shared::new(func),
        }))
    }

    pub fn name(&self) -> Ident {
        self.0.name
    }

    pub fn is_static(&self) -> bool {
        self.0.this.is_none()
    }

    /// The declaring type of an instance method.
    pub fn this_type(&self) -> Option<&Type> {
        self.0.this.as_ref()
    }

    pub fn params(&self) -> &[Type] {
        &self.0.params
    }

    pub fn return_type(&self) -> &Type {
        &self.0.ret
    }

    #[inline]
    pub fn invoke(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        (self.0.func)(args)
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        Shared::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.0.name)
            .field("static", &self.is_static())
            .field("params", &self.0.params)
            .field("ret", &self.0.ret)
            .finish()
    }
}

/// Creates a record instance or a value of some other type from arguments.
#[derive(Clone)]
pub struct Constructor {
    pub ty: Type,
    pub params: Vec<Type>,
    func: NativeFn,
}

impl Constructor {
    pub fn new<F>(ty: Type, params: Vec<Type>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        Self {
            ty,
            params,
            func: Shared::new(func),
        }
    }

    #[inline]
    pub fn invoke(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        (self.func)(args)
    }
}

impl PartialEq for Constructor {
    fn eq(&self, other: &Self) -> bool {
        Shared::ptr_eq(&self.func, &other.func)
    }
}

impl Debug for Constructor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("ty", &self.ty)
            .field("params", &self.params)
            .finish()
    }
}

/// A readable (and possibly writable) member of a type.
#[derive(Debug, Clone)]
pub enum Member {
    /// Instance field of a record, addressed by position.
    Field { name: Ident, index: usize, ty: Type },
    /// Process-wide storage shared by every tree that references it.
    StaticField {
        name: Ident,
        ty: Type,
        cell: Shared<SharedCell<Value>>,
    },
    Property {
        name: Ident,
        ty: Type,
        getter: Method,
        setter: Option<Method>,
    },
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Member::Field { name, index, ty },
                Member::Field {
                    name: other_name,
                    index: other_index,
                    ty: other_ty,
                },
            ) => name == other_name && index == other_index && ty == other_ty,
            (Member::StaticField { cell, .. }, Member::StaticField { cell: other, .. }) => {
                Shared::ptr_eq(cell, other)
            }
            (
                Member::Property { getter, setter, .. },
                Member::Property {
                    getter: other_getter,
                    setter: other_setter,
                    ..
                },
            ) => getter == other_getter && setter == other_setter,
            _ => false,
        }
    }
}

impl Member {
    /// Looks a field up by name on a record type.
    pub fn field(record: &Type, name: &str) -> Option<Self> {
        let record_type = record.record()?;
        let index = record_type.field_index(name)?;
        Some(Member::Field {
            name: Ident::new(name),
            index,
            ty: record_type.fields[index].ty.clone(),
        })
    }

    pub fn static_field(name: &str, ty: Type, initial: Value) -> Self {
        Member::StaticField {
            name: Ident::new(name),
            ty,
            cell: Shared::new(SharedCell::new(initial)),
        }
    }

    pub fn property(name: &str, getter: Method, setter: Option<Method>) -> Self {
        Member::Property {
            name: Ident::new(name),
            ty: getter.return_type().clone(),
            getter,
            setter,
        }
    }

    pub fn name(&self) -> Ident {
        match self {
            Member::Field { name, .. } | Member::StaticField { name, .. } | Member::Property { name, .. } => *name,
        }
    }

    pub fn ty(&self) -> &Type {
        match self {
            Member::Field { ty, .. } | Member::StaticField { ty, .. } | Member::Property { ty, .. } => ty,
        }
    }

    pub fn is_static(&self) -> bool {
        match self {
            Member::Field { .. } => false,
            Member::StaticField { .. } => true,
            Member::Property { getter, .. } => getter.is_static(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::{Field, RecordType};

    #[test]
    fn test_method_identity() {
        let a = Method::new_static("f", vec![], Type::I32, |_| Ok(Value::I32(1)));
        let b = Method::new_static("f", vec![], Type::I32, |_| Ok(Value::I32(1)));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.invoke(&[]), Ok(Value::I32(1)));
    }

    #[test]
    fn test_field_lookup() {
        let point = Type::Record(RecordType::new(
            "Point",
            vec![Field::new("x", Type::I32), Field::new("y", Type::I32)],
        ));
        let member = Member::field(&point, "y").expect("field y");
        assert!(matches!(member, Member::Field { index: 1, .. }));
        assert_eq!(member.ty(), &Type::I32);
        assert!(!member.is_static());
        assert!(Member::field(&point, "z").is_none());
        assert!(Member::field(&Type::I32, "x").is_none());
    }
}
