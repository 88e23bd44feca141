use smol_str::SmolStr;
use thiserror::Error;

use crate::ast::types::Type;

/// Errors raised while a compiled callable runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Invalid number of arguments, expected {expected}, got {got}")]
    ArgumentCount { expected: usize, got: usize },
    #[error("Invalid type for argument {index}, expected {expected}, got {got}")]
    ArgumentType { index: usize, expected: Type, got: SmolStr },
    #[error("Type mismatch, expected {expected}, got {got}")]
    TypeMismatch { expected: SmolStr, got: SmolStr },
    #[error("Arithmetic operation resulted in an overflow")]
    Overflow,
    #[error("Divided by 0")]
    DivideByZero,
    #[error("Object reference is null")]
    NullReference,
    #[error("Optional value has no value")]
    NullValue,
    #[error("Unable to cast {from} to {to}")]
    InvalidCast { from: SmolStr, to: Type },
    #[error("Index {index} is out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("Array size cannot be negative, got {0}")]
    NegativeArraySize(i64),
    #[error("Unable to allocate an array of length {0}")]
    ArrayTooLarge(usize),
    #[error("Value of type {0} is not callable")]
    NotCallable(SmolStr),
    #[error("Maximum call depth exceeded \"{0}\"")]
    RecursionLimit(u32),
    #[error("Hoisted variable is not reachable from the current scope")]
    MissingScope,
    #[error("{0}")]
    Native(String),
}

impl RuntimeError {
    /// Error for a user-supplied method or constructor.
    pub fn native(message: impl Into<String>) -> Self {
        RuntimeError::Native(message.into())
    }

    #[cold]
    pub(crate) fn type_mismatch(expected: impl Into<SmolStr>, got: SmolStr) -> Self {
        RuntimeError::TypeMismatch {
            expected: expected.into(),
            got,
        }
    }
}
