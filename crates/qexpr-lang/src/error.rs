use miette::Diagnostic;

pub mod compile;
pub mod runtime;

pub use compile::CompileError;
pub use runtime::RuntimeError;

/// Any failure of compiling or invoking a tree, with diagnostic codes and help.
#[derive(PartialEq, Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let c = match self {
            Error::Compile(CompileError::ParameterOutOfScope { .. }) => "CompileError::ParameterOutOfScope",
            Error::Compile(CompileError::Unsupported { .. }) => "CompileError::Unsupported",
            Error::Compile(CompileError::MissingTruthOperators(_)) => "CompileError::MissingTruthOperators",
            Error::Runtime(RuntimeError::ArgumentCount { .. }) => "RuntimeError::ArgumentCount",
            Error::Runtime(RuntimeError::ArgumentType { .. }) => "RuntimeError::ArgumentType",
            Error::Runtime(RuntimeError::TypeMismatch { .. }) => "RuntimeError::TypeMismatch",
            Error::Runtime(RuntimeError::Overflow) => "RuntimeError::Overflow",
            Error::Runtime(RuntimeError::DivideByZero) => "RuntimeError::DivideByZero",
            Error::Runtime(RuntimeError::NullReference) => "RuntimeError::NullReference",
            Error::Runtime(RuntimeError::NullValue) => "RuntimeError::NullValue",
            Error::Runtime(RuntimeError::InvalidCast { .. }) => "RuntimeError::InvalidCast",
            Error::Runtime(RuntimeError::IndexOutOfRange { .. }) => "RuntimeError::IndexOutOfRange",
            Error::Runtime(RuntimeError::NegativeArraySize(_)) => "RuntimeError::NegativeArraySize",
            Error::Runtime(RuntimeError::ArrayTooLarge(_)) => "RuntimeError::ArrayTooLarge",
            Error::Runtime(RuntimeError::NotCallable(_)) => "RuntimeError::NotCallable",
            Error::Runtime(RuntimeError::RecursionLimit(_)) => "RuntimeError::RecursionLimit",
            Error::Runtime(RuntimeError::MissingScope) => "RuntimeError::MissingScope",
            Error::Runtime(RuntimeError::Native(_)) => "RuntimeError::Native",
        };
        Some(Box::new(c))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let msg = match self {
            Error::Compile(CompileError::ParameterOutOfScope { name }) => Some(format!(
                "Add \"{name}\" to the parameter list of an enclosing lambda, or reuse the parameter object that lambda declares."
            )),
            Error::Compile(CompileError::Unsupported { kind, .. }) => Some(format!(
                "Check that the payload of the {kind} node matches its kind and operand types."
            )),
            Error::Compile(CompileError::MissingTruthOperators(ty)) => Some(format!(
                "Declare is_true/is_false operators on {ty} with RecordType::set_truth_operators."
            )),
            Error::Runtime(RuntimeError::ArgumentCount { expected, .. }) => {
                Some(format!("Pass exactly {expected} argument(s)."))
            }
            Error::Runtime(RuntimeError::ArgumentType { expected, .. }) => {
                Some(format!("Pass a value of type {expected}."))
            }
            Error::Runtime(RuntimeError::Overflow) => {
                Some("Use a wider type or the unchecked operator to wrap around.".to_string())
            }
            Error::Runtime(RuntimeError::DivideByZero) => Some("Check the divisor before dividing.".to_string()),
            Error::Runtime(RuntimeError::NullReference) | Error::Runtime(RuntimeError::NullValue) => {
                Some("Guard the operand with a Coalesce or a TypeIs check.".to_string())
            }
            Error::Runtime(RuntimeError::RecursionLimit(_)) => {
                Some("Raise CompilerOptions::max_call_depth or bound the recursion.".to_string())
            }
            _ => None,
        };
        msg.map(|m| Box::new(m) as Box<dyn std::fmt::Display>)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::Ident;
    use crate::ast::node::NodeKind;

    #[rstest]
    #[case(
        Error::Compile(CompileError::ParameterOutOfScope { name: Ident::new("x") }),
        "CompileError::ParameterOutOfScope",
        true
    )]
    #[case(
        Error::Compile(CompileError::unsupported(NodeKind::Lambda, "binary payload")),
        "CompileError::Unsupported",
        true
    )]
    #[case(Error::Runtime(RuntimeError::DivideByZero), "RuntimeError::DivideByZero", true)]
    #[case(Error::Runtime(RuntimeError::MissingScope), "RuntimeError::MissingScope", false)]
    fn test_diagnostic(#[case] error: Error, #[case] code: &str, #[case] has_help: bool) {
        assert_eq!(error.code().map(|c| c.to_string()), Some(code.to_string()));
        assert_eq!(error.help().is_some(), has_help);
    }

    #[test]
    fn test_display_is_transparent() {
        let error: Error = RuntimeError::IndexOutOfRange { index: 3, len: 2 }.into();
        assert_eq!(error.to_string(), "Index 3 is out of range for length 2");
    }
}
