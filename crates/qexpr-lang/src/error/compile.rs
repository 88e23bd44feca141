use smol_str::SmolStr;
use thiserror::Error;

use crate::Ident;
use crate::ast::node::NodeKind;
use crate::ast::types::Type;

/// Fatal errors raised while emitting a tree. Compilation never partially
/// succeeds.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Parameter \"{name}\" is not declared by any enclosing lambda")]
    ParameterOutOfScope { name: Ident },
    #[error("Unsupported {kind} node: {reason}")]
    Unsupported { kind: NodeKind, reason: SmolStr },
    #[error("Type \"{0}\" does not declare true/false operators")]
    MissingTruthOperators(Type),
}

impl CompileError {
    pub(crate) fn unsupported(kind: NodeKind, reason: impl Into<SmolStr>) -> Self {
        CompileError::Unsupported {
            kind,
            reason: reason.into(),
        }
    }
}
