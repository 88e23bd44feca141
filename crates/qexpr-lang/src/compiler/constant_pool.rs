//! The constant pool shared by every unit of one root lambda.

use tracing::trace;

use super::compiled::GlobalId;
use crate::arena::Arena;
use crate::value::Value;

/// Returns `true` for constants the compiled closure can carry inline.
/// Everything else is pooled and read back by index.
pub(crate) fn is_immediate(value: &Value) -> bool {
    matches!(
        value,
        Value::Null
            | Value::Unit
            | Value::Bool(_)
            | Value::Char(_)
            | Value::I8(_)
            | Value::I16(_)
            | Value::I32(_)
            | Value::I64(_)
            | Value::U8(_)
            | Value::U16(_)
            | Value::U32(_)
            | Value::U64(_)
            | Value::F32(_)
            | Value::F64(_)
    )
}

/// Append-only. Ids are assigned in insertion order and never reused.
#[derive(Debug, Default)]
pub(crate) struct ConstantPool {
    values: Arena<Value>,
}

impl ConstantPool {
    /// Stores a copy of `value`; the pool owns its clone.
    pub(crate) fn add(&mut self, value: &Value) -> GlobalId {
        let id = self.values.alloc(value.clone());
        trace!(global = %id, ty = %value.type_name(), "pooled constant");
        id
    }

    pub(crate) fn into_arena(self) -> Arena<Value> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Value::I64(1), true)]
    #[case(Value::Null, true)]
    #[case(Value::string("s"), false)]
    #[case(Value::array(vec![]), false)]
    fn test_is_immediate(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(is_immediate(&value), expected);
    }

    #[test]
    fn test_ids_are_stable() {
        let mut pool = ConstantPool::default();
        let a = pool.add(&Value::string("a"));
        let b = pool.add(&Value::string("a"));
        assert_ne!(a, b);
        let arena = pool.into_arena();
        assert_eq!(arena.len(), 2);
        assert_eq!(arena[a], Value::string("a"));
    }
}
