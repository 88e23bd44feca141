//! Static types carried by expression nodes.

use std::fmt::{self, Debug, Display, Formatter};
use std::sync::OnceLock;

use itertools::Itertools;

use super::member::Method;
use crate::value::{Object, Value};
use crate::{Ident, Shared, SharedCell};

/// The static type of an expression node.
///
/// `Nullable` wraps value types only; reference types (`String`, `Object`,
/// arrays, lists, functions, expressions and records) already admit `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Unit,
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    Object,
    Nullable(Box<Type>),
    Array(Box<Type>),
    List(Box<Type>),
    Function(Shared<Signature>),
    Expression(Shared<Signature>),
    Record(Shared<RecordType>),
}

impl Type {
    /// Wraps a value type into its optional form. Types that already admit
    /// `null` are returned unchanged.
    pub fn nullable(inner: Type) -> Type {
        if inner.admits_null() {
            inner
        } else {
            Type::Nullable(Box::new(inner))
        }
    }

    pub fn array(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn list(element: Type) -> Type {
        Type::List(Box::new(element))
    }

    pub fn function(params: Vec<Type>, ret: Type) -> Type {
        Type::Function(Shared::new(Signature::new(params, ret)))
    }

    /// Strips one level of `Nullable`.
    pub fn non_nullable(&self) -> &Type {
        match self {
            Type::Nullable(inner) => inner,
            other => other,
        }
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        matches!(self, Type::Nullable(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::String
                | Type::Object
                | Type::Array(_)
                | Type::List(_)
                | Type::Function(_)
                | Type::Expression(_)
                | Type::Record(_)
        )
    }

    /// Returns `true` when `null` is a valid value of this type.
    pub fn admits_null(&self) -> bool {
        self.is_nullable() || self.is_reference()
    }

    pub fn is_signed_integer(&self) -> bool {
        matches!(self, Type::I8 | Type::I16 | Type::I32 | Type::I64)
    }

    pub fn is_unsigned_integer(&self) -> bool {
        matches!(self, Type::U8 | Type::U16 | Type::U32 | Type::U64)
    }

    pub fn is_integer(&self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::F32 | Type::F64)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Bool)
    }

    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(element) | Type::List(element) => Some(element),
            _ => None,
        }
    }

    pub fn signature(&self) -> Option<&Shared<Signature>> {
        match self {
            Type::Function(signature) | Type::Expression(signature) => Some(signature),
            _ => None,
        }
    }

    pub fn record(&self) -> Option<&Shared<RecordType>> {
        match self.non_nullable() {
            Type::Record(record) => Some(record),
            _ => None,
        }
    }

    /// The value a slot of this type holds before anything is stored in it.
    pub fn default_value(&self) -> Value {
        match self {
            Type::Unit => Value::Unit,
            Type::Bool => Value::Bool(false),
            Type::Char => Value::Char('\0'),
            Type::I8 => Value::I8(0),
            Type::I16 => Value::I16(0),
            Type::I32 => Value::I32(0),
            Type::I64 => Value::I64(0),
            Type::U8 => Value::U8(0),
            Type::U16 => Value::U16(0),
            Type::U32 => Value::U32(0),
            Type::U64 => Value::U64(0),
            Type::F32 => Value::F32(0.0),
            Type::F64 => Value::F64(0.0),
            _ => Value::Null,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unit => write!(f, "unit"),
            Type::Bool => write!(f, "bool"),
            Type::Char => write!(f, "char"),
            Type::I8 => write!(f, "i8"),
            Type::I16 => write!(f, "i16"),
            Type::I32 => write!(f, "i32"),
            Type::I64 => write!(f, "i64"),
            Type::U8 => write!(f, "u8"),
            Type::U16 => write!(f, "u16"),
            Type::U32 => write!(f, "u32"),
            Type::U64 => write!(f, "u64"),
            Type::F32 => write!(f, "f32"),
            Type::F64 => write!(f, "f64"),
            Type::String => write!(f, "string"),
            Type::Object => write!(f, "object"),
            Type::Nullable(inner) => write!(f, "{}?", inner),
            Type::Array(element) => write!(f, "{}[]", element),
            Type::List(element) => write!(f, "List<{}>", element),
            Type::Function(signature) => write!(f, "{}", signature),
            Type::Expression(signature) => write!(f, "Expression<{}>", signature),
            Type::Record(record) => write!(f, "{}", record.name),
        }
    }
}

/// Parameter and return types of a lambda or callable.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<Type>,
    pub ret: Type,
}

impl Signature {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self { params, ret }
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "fn({}) -> {}", self.params.iter().join(", "), self.ret)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: Ident,
    pub ty: Type,
}

impl Field {
    pub fn new(name: &str, ty: Type) -> Self {
        Self {
            name: Ident::new(name),
            ty,
        }
    }
}

/// The `true`/`false` operator pair a record declares so that user-defined
/// `AndAlso`/`OrElse` operators can short-circuit.
#[derive(Debug, Clone)]
pub struct TruthOperators {
    pub is_true: Method,
    pub is_false: Method,
}

/// A user-defined record type. Instances have reference identity.
///
/// Equality is identity: two records with the same name and fields are
/// still distinct types.
pub struct RecordType {
    pub name: Ident,
    /// All fields, inherited ones first.
    pub fields: Vec<Field>,
    pub base: Option<Shared<RecordType>>,
    truth: OnceLock<TruthOperators>,
}

impl Debug for RecordType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("base", &self.base.as_ref().map(|base| base.name))
            .field("truth_operators", &self.truth.get().is_some())
            .finish()
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl RecordType {
    pub fn new(name: &str, fields: Vec<Field>) -> Shared<Self> {
        Shared::new(Self {
            name: Ident::new(name),
            fields,
            base: None,
            truth: OnceLock::new(),
        })
    }

    pub fn derived(name: &str, base: &Shared<RecordType>, fields: Vec<Field>) -> Shared<Self> {
        Shared::new(Self {
            name: Ident::new(name),
            fields: base.fields.iter().cloned().chain(fields).collect(),
            base: Some(Shared::clone(base)),
            truth: OnceLock::new(),
        })
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        let name = Ident::new(name);
        self.fields.iter().position(|field| field.name == name)
    }

    /// Returns `true` if `self` is `other` or inherits from it.
    pub fn derives_from(&self, other: &RecordType) -> bool {
        let mut current = Some(self);
        while let Some(record) = current {
            if record == other {
                return true;
            }
            current = record.base.as_deref();
        }
        false
    }

    /// Declares the truth operators. Returns `false` if they were already set.
    pub fn set_truth_operators(&self, is_true: Method, is_false: Method) -> bool {
        self.truth.set(TruthOperators { is_true, is_false }).is_ok()
    }

    pub fn truth_operators(&self) -> Option<&TruthOperators> {
        self.truth
            .get()
            .or_else(|| self.base.as_ref().and_then(|base| base.truth_operators()))
    }

    /// Creates an instance with every field at its default value.
    pub fn instantiate(self: &Shared<Self>) -> Value {
        let fields = self.fields.iter().map(|field| field.ty.default_value()).collect();
        Value::Object(Shared::new(Object {
            ty: Shared::clone(self),
            fields: SharedCell::new(fields),
        }))
    }
}
