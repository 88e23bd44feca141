//! Primitive operators over [`Value`]s.
//!
//! Operators are selected once, at emission time, from the operand type and
//! handed to the compiled closure as plain function pointers.

use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Sub};

use crate::ast::node::NodeKind;
use crate::ast::types::Type;
use crate::error::runtime::RuntimeError;
use crate::value::Value;

pub(crate) type BinaryFn = fn(Value, Value) -> Result<Value, RuntimeError>;
pub(crate) type UnaryFn = fn(Value) -> Result<Value, RuntimeError>;
pub(crate) type ConvertFn = Box<dyn Fn(Value) -> Result<Value, RuntimeError> + Send + Sync>;

/// Intermediate form of numeric conversions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Int(i128),
    Float(f64),
}

pub(crate) trait Primitive: Copy + PartialOrd + Sized + 'static {
    const NAME: &'static str;

    fn from_value(value: Value) -> Result<Self, RuntimeError>;
    fn into_value(self) -> Value;
}

pub(crate) trait Numeric: Primitive {
    fn to_number(self) -> Number;
    fn from_number(number: Number, checked: bool) -> Result<Self, RuntimeError>;
}

pub(crate) trait Integer:
    Numeric + BitAnd<Output = Self> + BitOr<Output = Self> + BitXor<Output = Self> + Not<Output = Self>
{
    fn is_zero(self) -> bool;
    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;
    fn wrapping_mul(self, rhs: Self) -> Self;
    fn wrapping_neg(self) -> Self;
    fn checked_add(self, rhs: Self) -> Option<Self>;
    fn checked_sub(self, rhs: Self) -> Option<Self>;
    fn checked_mul(self, rhs: Self) -> Option<Self>;
    fn checked_div(self, rhs: Self) -> Option<Self>;
    fn checked_rem(self, rhs: Self) -> Option<Self>;
    fn checked_neg(self) -> Option<Self>;
    /// The count is masked by the bit width.
    fn wrapping_shl(self, count: u32) -> Self;
    /// Arithmetic for signed types, logical for unsigned ones.
    fn wrapping_shr(self, count: u32) -> Self;
}

pub(crate) trait Float:
    Numeric
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Rem<Output = Self>
    + Neg<Output = Self>
{
    fn powf(self, rhs: Self) -> Self;
}

#[cold]
fn mismatch(expected: &'static str, value: Value) -> RuntimeError {
    match value {
        Value::Null => RuntimeError::NullValue,
        other => RuntimeError::type_mismatch(expected, other.type_name()),
    }
}

macro_rules! impl_primitive {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl Primitive for $t {
                const NAME: &'static str = stringify!($t);

                #[inline]
                fn from_value(value: Value) -> Result<Self, RuntimeError> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(mismatch(Self::NAME, other)),
                    }
                }

                #[inline]
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }
        )*
    };
}

impl_primitive!(
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
    char => Char,
);

macro_rules! impl_integer {
    ($($t:ty),* $(,)?) => {
        $(
            impl Numeric for $t {
                #[inline]
                fn to_number(self) -> Number {
                    Number::Int(self as i128)
                }

                fn from_number(number: Number, checked: bool) -> Result<Self, RuntimeError> {
                    match number {
                        Number::Int(i) if checked => <$t>::try_from(i).map_err(|_| RuntimeError::Overflow),
                        Number::Int(i) => Ok(i as $t),
                        Number::Float(f) if checked => {
                            let t = f.trunc();
                            if f.is_nan() || t < <$t>::MIN as f64 || t >= <$t>::MAX as f64 + 1.0 {
                                Err(RuntimeError::Overflow)
                            } else {
                                Ok(t as $t)
                            }
                        }
                        Number::Float(f) => Ok(f as $t),
                    }
                }
            }

            impl Integer for $t {
                #[inline]
                fn is_zero(self) -> bool {
                    self == 0
                }

                #[inline]
                fn wrapping_add(self, rhs: Self) -> Self {
                    <$t>::wrapping_add(self, rhs)
                }

                #[inline]
                fn wrapping_sub(self, rhs: Self) -> Self {
                    <$t>::wrapping_sub(self, rhs)
                }

                #[inline]
                fn wrapping_mul(self, rhs: Self) -> Self {
                    <$t>::wrapping_mul(self, rhs)
                }

                #[inline]
                fn wrapping_neg(self) -> Self {
                    <$t>::wrapping_neg(self)
                }

                #[inline]
                fn checked_add(self, rhs: Self) -> Option<Self> {
                    <$t>::checked_add(self, rhs)
                }

                #[inline]
                fn checked_sub(self, rhs: Self) -> Option<Self> {
                    <$t>::checked_sub(self, rhs)
                }

                #[inline]
                fn checked_mul(self, rhs: Self) -> Option<Self> {
                    <$t>::checked_mul(self, rhs)
                }

                #[inline]
                fn checked_div(self, rhs: Self) -> Option<Self> {
                    <$t>::checked_div(self, rhs)
                }

                #[inline]
                fn checked_rem(self, rhs: Self) -> Option<Self> {
                    <$t>::checked_rem(self, rhs)
                }

                #[inline]
                fn checked_neg(self) -> Option<Self> {
                    <$t>::checked_neg(self)
                }

                #[inline]
                fn wrapping_shl(self, count: u32) -> Self {
                    <$t>::wrapping_shl(self, count)
                }

                #[inline]
                fn wrapping_shr(self, count: u32) -> Self {
                    <$t>::wrapping_shr(self, count)
                }
            }
        )*
    };
}

impl_integer!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! impl_float {
    ($($t:ty),* $(,)?) => {
        $(
            impl Numeric for $t {
                #[inline]
                fn to_number(self) -> Number {
                    Number::Float(self as f64)
                }

                fn from_number(number: Number, _checked: bool) -> Result<Self, RuntimeError> {
                    Ok(match number {
                        Number::Int(i) => i as $t,
                        Number::Float(f) => f as $t,
                    })
                }
            }

            impl Float for $t {
                #[inline]
                fn powf(self, rhs: Self) -> Self {
                    <$t>::powf(self, rhs)
                }
            }
        )*
    };
}

impl_float!(f32, f64);

impl Numeric for char {
    fn to_number(self) -> Number {
        Number::Int(self as u32 as i128)
    }

    fn from_number(number: Number, checked: bool) -> Result<Self, RuntimeError> {
        let code = match number {
            Number::Int(i) => i,
            Number::Float(f) => f as i128,
        };
        if checked {
            u16::try_from(code)
                .ok()
                .and_then(|code| char::from_u32(code as u32))
                .ok_or(RuntimeError::Overflow)
        } else {
            Ok(char::from_u32(code as u16 as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
        }
    }
}

macro_rules! select_integer {
    ($ty:expr, $fn_ty:ty, $f:ident) => {
        match $ty {
            Type::I8 => Some($f::<i8> as $fn_ty),
            Type::I16 => Some($f::<i16> as $fn_ty),
            Type::I32 => Some($f::<i32> as $fn_ty),
            Type::I64 => Some($f::<i64> as $fn_ty),
            Type::U8 => Some($f::<u8> as $fn_ty),
            Type::U16 => Some($f::<u16> as $fn_ty),
            Type::U32 => Some($f::<u32> as $fn_ty),
            Type::U64 => Some($f::<u64> as $fn_ty),
            _ => None,
        }
    };
}

macro_rules! select_float {
    ($ty:expr, $fn_ty:ty, $f:ident) => {
        match $ty {
            Type::F32 => Some($f::<f32> as $fn_ty),
            Type::F64 => Some($f::<f64> as $fn_ty),
            _ => None,
        }
    };
}

macro_rules! select_numeric {
    ($ty:expr, $fn_ty:ty, $int:ident, $float:ident) => {
        select_integer!($ty, $fn_ty, $int).or_else(|| select_float!($ty, $fn_ty, $float))
    };
}

macro_rules! select_ordered {
    ($ty:expr, $f:ident) => {
        match $ty {
            Type::Char => Some($f::<char> as BinaryFn),
            ty => select_integer!(ty, BinaryFn, $f).or_else(|| select_float!(ty, BinaryFn, $f)),
        }
    };
}

fn wrapping_add<T: Integer>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok(T::from_value(left)?.wrapping_add(T::from_value(right)?).into_value())
}

fn wrapping_sub<T: Integer>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok(T::from_value(left)?.wrapping_sub(T::from_value(right)?).into_value())
}

fn wrapping_mul<T: Integer>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok(T::from_value(left)?.wrapping_mul(T::from_value(right)?).into_value())
}

fn checked_add<T: Integer>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    T::from_value(left)?
        .checked_add(T::from_value(right)?)
        .map(T::into_value)
        .ok_or(RuntimeError::Overflow)
}

fn checked_sub<T: Integer>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    T::from_value(left)?
        .checked_sub(T::from_value(right)?)
        .map(T::into_value)
        .ok_or(RuntimeError::Overflow)
}

fn checked_mul<T: Integer>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    T::from_value(left)?
        .checked_mul(T::from_value(right)?)
        .map(T::into_value)
        .ok_or(RuntimeError::Overflow)
}

/// `MIN / -1` does not fit and is reported as an overflow.
fn divide<T: Integer>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    let (left, right) = (T::from_value(left)?, T::from_value(right)?);
    if right.is_zero() {
        return Err(RuntimeError::DivideByZero);
    }
    left.checked_div(right).map(T::into_value).ok_or(RuntimeError::Overflow)
}

fn remainder<T: Integer>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    let (left, right) = (T::from_value(left)?, T::from_value(right)?);
    if right.is_zero() {
        return Err(RuntimeError::DivideByZero);
    }
    left.checked_rem(right).map(T::into_value).ok_or(RuntimeError::Overflow)
}

fn shift_left<T: Integer>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    let count = i32::from_value(right)?;
    Ok(T::from_value(left)?.wrapping_shl(count as u32).into_value())
}

fn shift_right<T: Integer>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    let count = i32::from_value(right)?;
    Ok(T::from_value(left)?.wrapping_shr(count as u32).into_value())
}

fn bit_and<T: Integer>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok((T::from_value(left)? & T::from_value(right)?).into_value())
}

fn bit_or<T: Integer>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok((T::from_value(left)? | T::from_value(right)?).into_value())
}

fn bit_xor<T: Integer>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok((T::from_value(left)? ^ T::from_value(right)?).into_value())
}

fn float_add<T: Float>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok((T::from_value(left)? + T::from_value(right)?).into_value())
}

fn float_sub<T: Float>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok((T::from_value(left)? - T::from_value(right)?).into_value())
}

fn float_mul<T: Float>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok((T::from_value(left)? * T::from_value(right)?).into_value())
}

fn float_div<T: Float>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok((T::from_value(left)? / T::from_value(right)?).into_value())
}

fn float_rem<T: Float>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok((T::from_value(left)? % T::from_value(right)?).into_value())
}

fn float_pow<T: Float>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok(T::from_value(left)?.powf(T::from_value(right)?).into_value())
}

fn less_than<T: Primitive>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(T::from_value(left)? < T::from_value(right)?))
}

fn less_than_or_equal<T: Primitive>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(T::from_value(left)? <= T::from_value(right)?))
}

fn greater_than<T: Primitive>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(T::from_value(left)? > T::from_value(right)?))
}

fn greater_than_or_equal<T: Primitive>(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(T::from_value(left)? >= T::from_value(right)?))
}

fn equal(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(left.operator_eq(&right)))
}

fn not_equal(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(!left.operator_eq(&right)))
}

pub(crate) fn as_bool(value: Value) -> Result<bool, RuntimeError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(mismatch("bool", other)),
    }
}

fn bool_and(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(as_bool(left)? & as_bool(right)?))
}

fn bool_or(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(as_bool(left)? | as_bool(right)?))
}

fn bool_xor(left: Value, right: Value) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(as_bool(left)? ^ as_bool(right)?))
}

/// String concatenation. `null` concatenates as the empty string.
fn concat(left: Value, right: Value) -> Result<Value, RuntimeError> {
    let mut s = String::new();
    for value in [left, right] {
        match value {
            Value::Null => {}
            Value::String(part) => s.push_str(&part),
            other => s.push_str(&other.to_string()),
        }
    }
    Ok(Value::from(s))
}

/// Selects the primitive implementation of a binary operator for operands of
/// type `ty`. `None` means the operator has no primitive form for that type.
pub(crate) fn binary_op(kind: NodeKind, ty: &Type) -> Option<BinaryFn> {
    match kind {
        NodeKind::Add if *ty == Type::String => Some(concat),
        NodeKind::Add => select_numeric!(ty, BinaryFn, wrapping_add, float_add),
        NodeKind::AddChecked => select_numeric!(ty, BinaryFn, checked_add, float_add),
        NodeKind::Subtract => select_numeric!(ty, BinaryFn, wrapping_sub, float_sub),
        NodeKind::SubtractChecked => select_numeric!(ty, BinaryFn, checked_sub, float_sub),
        NodeKind::Multiply => select_numeric!(ty, BinaryFn, wrapping_mul, float_mul),
        NodeKind::MultiplyChecked => select_numeric!(ty, BinaryFn, checked_mul, float_mul),
        NodeKind::Divide => select_numeric!(ty, BinaryFn, divide, float_div),
        NodeKind::Modulo => select_numeric!(ty, BinaryFn, remainder, float_rem),
        NodeKind::Power => select_float!(ty, BinaryFn, float_pow),
        NodeKind::LeftShift => select_integer!(ty, BinaryFn, shift_left),
        NodeKind::RightShift => select_integer!(ty, BinaryFn, shift_right),
        NodeKind::And if ty.is_bool() => Some(bool_and),
        NodeKind::And => select_integer!(ty, BinaryFn, bit_and),
        NodeKind::Or if ty.is_bool() => Some(bool_or),
        NodeKind::Or => select_integer!(ty, BinaryFn, bit_or),
        NodeKind::ExclusiveOr if ty.is_bool() => Some(bool_xor),
        NodeKind::ExclusiveOr => select_integer!(ty, BinaryFn, bit_xor),
        NodeKind::Equal => Some(equal),
        NodeKind::NotEqual => Some(not_equal),
        NodeKind::LessThan => select_ordered!(ty, less_than),
        NodeKind::LessThanOrEqual => select_ordered!(ty, less_than_or_equal),
        NodeKind::GreaterThan => select_ordered!(ty, greater_than),
        NodeKind::GreaterThanOrEqual => select_ordered!(ty, greater_than_or_equal),
        _ => None,
    }
}

fn wrapping_neg<T: Integer>(operand: Value) -> Result<Value, RuntimeError> {
    Ok(T::from_value(operand)?.wrapping_neg().into_value())
}

fn checked_neg<T: Integer>(operand: Value) -> Result<Value, RuntimeError> {
    T::from_value(operand)?
        .checked_neg()
        .map(T::into_value)
        .ok_or(RuntimeError::Overflow)
}

fn float_neg<T: Float>(operand: Value) -> Result<Value, RuntimeError> {
    Ok((-T::from_value(operand)?).into_value())
}

fn bit_not<T: Integer>(operand: Value) -> Result<Value, RuntimeError> {
    Ok((!T::from_value(operand)?).into_value())
}

fn bool_not(operand: Value) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(!as_bool(operand)?))
}

fn unary_plus(operand: Value) -> Result<Value, RuntimeError> {
    Ok(operand)
}

fn array_length(operand: Value) -> Result<Value, RuntimeError> {
    match operand {
        Value::Array(items) => i32::try_from(items.len())
            .map(Value::I32)
            .map_err(|_| RuntimeError::Overflow),
        Value::Null => Err(RuntimeError::NullReference),
        other => Err(mismatch("array", other)),
    }
}

/// Selects the primitive implementation of a unary operator.
pub(crate) fn unary_op(kind: NodeKind, ty: &Type) -> Option<UnaryFn> {
    match kind {
        NodeKind::Negate => select_numeric!(ty, UnaryFn, wrapping_neg, float_neg),
        NodeKind::NegateChecked => select_numeric!(ty, UnaryFn, checked_neg, float_neg),
        NodeKind::UnaryPlus if ty.is_numeric() => Some(unary_plus),
        NodeKind::Not if ty.is_bool() => Some(bool_not),
        NodeKind::Not => select_integer!(ty, UnaryFn, bit_not),
        NodeKind::ArrayLength if matches!(ty, Type::Array(_)) => Some(array_length),
        _ => None,
    }
}

fn to_number(value: Value) -> Result<Number, RuntimeError> {
    match value {
        Value::I8(n) => Ok(n.to_number()),
        Value::I16(n) => Ok(n.to_number()),
        Value::I32(n) => Ok(n.to_number()),
        Value::I64(n) => Ok(n.to_number()),
        Value::U8(n) => Ok(n.to_number()),
        Value::U16(n) => Ok(n.to_number()),
        Value::U32(n) => Ok(n.to_number()),
        Value::U64(n) => Ok(n.to_number()),
        Value::F32(n) => Ok(n.to_number()),
        Value::F64(n) => Ok(n.to_number()),
        Value::Char(c) => Ok(c.to_number()),
        other => Err(mismatch("number", other)),
    }
}

fn convert_to<T: Numeric, const CHECKED: bool>(value: Value) -> Result<Value, RuntimeError> {
    Ok(T::from_number(to_number(value)?, CHECKED)?.into_value())
}

fn numeric_conversion(target: &Type, checked: bool) -> Option<UnaryFn> {
    macro_rules! pick {
        ($t:ty) => {
            if checked {
                Some(convert_to::<$t, true> as UnaryFn)
            } else {
                Some(convert_to::<$t, false> as UnaryFn)
            }
        };
    }
    match target {
        Type::I8 => pick!(i8),
        Type::I16 => pick!(i16),
        Type::I32 => pick!(i32),
        Type::I64 => pick!(i64),
        Type::U8 => pick!(u8),
        Type::U16 => pick!(u16),
        Type::U32 => pick!(u32),
        Type::U64 => pick!(u64),
        Type::F32 => pick!(f32),
        Type::F64 => pick!(f64),
        Type::Char => pick!(char),
        _ => None,
    }
}

fn identity() -> ConvertFn {
    Box::new(|value: Value| -> Result<Value, RuntimeError> { Ok(value) })
}

/// A checked cast: `null` passes only to types that admit it.
fn cast_to(target: Type) -> ConvertFn {
    Box::new(move |value: Value| {
        if value.is_null() {
            if target.admits_null() {
                Ok(Value::Null)
            } else {
                Err(RuntimeError::NullReference)
            }
        } else if value.conforms_to(&target) {
            Ok(value)
        } else {
            Err(RuntimeError::InvalidCast {
                from: value.type_name(),
                to: target.clone(),
            })
        }
    })
}

/// Builds the conversion from `from` to `to`, or `None` if there is none.
///
/// Optional-to-optional conversions are lifted, optional-to-plain ones fail
/// with [`RuntimeError::NullValue`] on a missing value.
pub(crate) fn conversion(from: &Type, to: &Type, checked: bool) -> Option<ConvertFn> {
    if from == to {
        return Some(identity());
    }
    match (from, to) {
        (Type::Nullable(source), Type::Nullable(target)) => {
            let inner = conversion(source, target, checked)?;
            Some(Box::new(move |value: Value| {
                if value.is_null() { Ok(Value::Null) } else { inner(value) }
            }))
        }
        (source, Type::Nullable(target)) if !source.admits_null() => conversion(source, target, checked),
        (Type::Nullable(source), target) if !target.admits_null() => {
            let inner = conversion(source, target, checked)?;
            Some(Box::new(move |value: Value| {
                if value.is_null() {
                    Err(RuntimeError::NullValue)
                } else {
                    inner(value)
                }
            }))
        }
        (_, Type::Object) => Some(identity()),
        (Type::Object, target) => Some(cast_to(target.clone())),
        (Type::Record(source), Type::Record(target)) if source.derives_from(target) => Some(identity()),
        (Type::Record(source), Type::Record(target)) if target.derives_from(source) => {
            Some(cast_to(to.clone()))
        }
        (source, target) if is_convertible(source) && is_convertible(target) => {
            numeric_conversion(target, checked).map(|f| Box::new(f) as ConvertFn)
        }
        _ => None,
    }
}

fn is_convertible(ty: &Type) -> bool {
    ty.is_numeric() || matches!(ty, Type::Char)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn apply(kind: NodeKind, ty: Type, left: Value, right: Value) -> Result<Value, RuntimeError> {
        let op = binary_op(kind, &ty).expect("operator should exist");
        op(left, right)
    }

    #[rstest]
    #[case(NodeKind::Add, Type::I32, Value::I32(2), Value::I32(3), Ok(Value::I32(5)))]
    #[case(NodeKind::Add, Type::I32, Value::I32(i32::MAX), Value::I32(1), Ok(Value::I32(i32::MIN)))]
    #[case(NodeKind::AddChecked, Type::I32, Value::I32(i32::MAX), Value::I32(1), Err(RuntimeError::Overflow))]
    #[case(NodeKind::SubtractChecked, Type::U8, Value::U8(0), Value::U8(1), Err(RuntimeError::Overflow))]
    #[case(NodeKind::MultiplyChecked, Type::I64, Value::I64(i64::MAX), Value::I64(2), Err(RuntimeError::Overflow))]
    #[case(NodeKind::Divide, Type::I32, Value::I32(7), Value::I32(2), Ok(Value::I32(3)))]
    #[case(NodeKind::Divide, Type::I32, Value::I32(1), Value::I32(0), Err(RuntimeError::DivideByZero))]
    #[case(NodeKind::Modulo, Type::U16, Value::U16(1), Value::U16(0), Err(RuntimeError::DivideByZero))]
    #[case(NodeKind::Divide, Type::I32, Value::I32(i32::MIN), Value::I32(-1), Err(RuntimeError::Overflow))]
    #[case(NodeKind::Divide, Type::F64, Value::F64(1.0), Value::F64(0.0), Ok(Value::F64(f64::INFINITY)))]
    #[case(NodeKind::Power, Type::F64, Value::F64(2.0), Value::F64(10.0), Ok(Value::F64(1024.0)))]
    #[case(NodeKind::LeftShift, Type::I32, Value::I32(1), Value::I32(33), Ok(Value::I32(2)))]
    #[case(NodeKind::RightShift, Type::I8, Value::I8(-8), Value::I32(1), Ok(Value::I8(-4)))]
    #[case(NodeKind::RightShift, Type::U8, Value::U8(0x80), Value::I32(7), Ok(Value::U8(1)))]
    #[case(NodeKind::ExclusiveOr, Type::Bool, Value::Bool(true), Value::Bool(true), Ok(Value::Bool(false)))]
    #[case(NodeKind::And, Type::U32, Value::U32(0b1100), Value::U32(0b1010), Ok(Value::U32(0b1000)))]
    #[case(NodeKind::LessThan, Type::Char, Value::Char('a'), Value::Char('b'), Ok(Value::Bool(true)))]
    #[case(NodeKind::GreaterThanOrEqual, Type::F32, Value::F32(1.5), Value::F32(1.5), Ok(Value::Bool(true)))]
    #[case(NodeKind::Add, Type::String, Value::string("ab"), Value::Null, Ok(Value::string("ab")))]
    fn test_binary_op(
        #[case] kind: NodeKind,
        #[case] ty: Type,
        #[case] left: Value,
        #[case] right: Value,
        #[case] expected: Result<Value, RuntimeError>,
    ) {
        assert_eq!(apply(kind, ty, left, right), expected);
    }

    #[rstest]
    #[case(NodeKind::Power, Type::I32)]
    #[case(NodeKind::LeftShift, Type::F64)]
    #[case(NodeKind::LessThan, Type::Bool)]
    #[case(NodeKind::Coalesce, Type::I32)]
    fn test_binary_op_missing(#[case] kind: NodeKind, #[case] ty: Type) {
        assert!(binary_op(kind, &ty).is_none());
    }

    #[rstest]
    #[case(NodeKind::Negate, Type::I32, Value::I32(i32::MIN), Ok(Value::I32(i32::MIN)))]
    #[case(NodeKind::NegateChecked, Type::I32, Value::I32(i32::MIN), Err(RuntimeError::Overflow))]
    #[case(NodeKind::Not, Type::I16, Value::I16(0), Ok(Value::I16(-1)))]
    #[case(NodeKind::Not, Type::Bool, Value::Bool(false), Ok(Value::Bool(true)))]
    #[case(NodeKind::ArrayLength, Type::array(Type::I32), Value::array(vec![Value::I32(1)]), Ok(Value::I32(1)))]
    fn test_unary_op(
        #[case] kind: NodeKind,
        #[case] ty: Type,
        #[case] operand: Value,
        #[case] expected: Result<Value, RuntimeError>,
    ) {
        let op = unary_op(kind, &ty).expect("operator should exist");
        assert_eq!(op(operand), expected);
    }

    #[rstest]
    #[case(Type::I32, Type::I8, false, Value::I32(300), Ok(Value::I8(44)))]
    #[case(Type::I32, Type::I8, true, Value::I32(300), Err(RuntimeError::Overflow))]
    #[case(Type::F64, Type::I32, false, Value::F64(2.9), Ok(Value::I32(2)))]
    #[case(Type::F64, Type::U8, true, Value::F64(-1.0), Err(RuntimeError::Overflow))]
    #[case(Type::Char, Type::I32, false, Value::Char('A'), Ok(Value::I32(65)))]
    #[case(Type::I32, Type::nullable(Type::I64), false, Value::I32(5), Ok(Value::I64(5)))]
    #[case(Type::nullable(Type::I32), Type::nullable(Type::I64), false, Value::Null, Ok(Value::Null))]
    #[case(Type::nullable(Type::I32), Type::I32, false, Value::Null, Err(RuntimeError::NullValue))]
    #[case(Type::I32, Type::Object, false, Value::I32(1), Ok(Value::I32(1)))]
    #[case(Type::Object, Type::I32, false, Value::Null, Err(RuntimeError::NullReference))]
    #[case(
        Type::Object,
        Type::I32,
        false,
        Value::string("x"),
        Err(RuntimeError::InvalidCast { from: "string".into(), to: Type::I32 })
    )]
    fn test_conversion(
        #[case] from: Type,
        #[case] to: Type,
        #[case] checked: bool,
        #[case] value: Value,
        #[case] expected: Result<Value, RuntimeError>,
    ) {
        let convert = conversion(&from, &to, checked).expect("conversion should exist");
        assert_eq!(convert(value), expected);
    }

    #[test]
    fn test_no_conversion_between_unrelated_types() {
        assert!(conversion(&Type::Bool, &Type::I32, false).is_none());
        assert!(conversion(&Type::String, &Type::array(Type::Char), false).is_none());
    }
}
