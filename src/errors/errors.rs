use std::fmt::Display;

use thiserror::Error;

use crate::{
    ast::ast::NodeKind,
    scope::scope::ScopeError,
    types::types::{LatticeError, Type},
};

/// A compilation error together with the kind of node that raised it.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    internal_error: ErrorImpl,
    node: NodeKind,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, node: NodeKind) -> Self {
        Error {
            internal_error: error_impl,
            node,
        }
    }

    pub fn get_node(&self) -> NodeKind {
        self.node
    }

    pub fn get_impl(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::Redeclaration { .. } => "Redeclaration",
            ErrorImpl::Undeclared { .. } => "Undeclared",
            ErrorImpl::TypeMismatch { .. } => "TypeMismatch",
            ErrorImpl::ArityMismatch { .. } => "ArityMismatch",
            ErrorImpl::DimensionMismatch { .. } => "DimensionMismatch",
            ErrorImpl::NonBooleanCondition { .. } => "NonBooleanCondition",
            ErrorImpl::NotAVariable { .. } => "NotAVariable",
            ErrorImpl::NotAFunction { .. } => "NotAFunction",
            ErrorImpl::NonConstantGlobal { .. } => "NonConstantGlobal",
            ErrorImpl::ArrayInitializer { .. } => "ArrayInitializer",
            ErrorImpl::ArrayTooLarge { .. } => "ArrayTooLarge",
            ErrorImpl::InvalidParameter { .. } => "InvalidParameter",
            ErrorImpl::MissingReturn { .. } => "MissingReturn",
            ErrorImpl::ReturnOutsideFunction => "ReturnOutsideFunction",
            ErrorImpl::NotValidated => "NotValidated",
            ErrorImpl::ScopeUnderflow => "ScopeUnderflow",
            ErrorImpl::Backend { .. } => "Backend",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::Redeclaration { name } => ErrorTip::Suggestion(format!(
                "`{}` is already declared in this block, pick another name or remove one declaration",
                name
            )),
            ErrorImpl::Undeclared { name } => {
                ErrorTip::Suggestion(format!("`{}` must be declared before it is used", name))
            }
            ErrorImpl::TypeMismatch { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::ArityMismatch {
                function,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "`{}` takes {} arguments, received {}",
                function, expected, received
            )),
            ErrorImpl::DimensionMismatch {
                variable,
                declared,
                accessed,
            } => ErrorTip::Suggestion(format!(
                "`{}` has {} dimensions but is indexed {} times",
                variable, declared, accessed
            )),
            ErrorImpl::NonBooleanCondition { received } => ErrorTip::Suggestion(format!(
                "Conditions must be `boolean`, received `{}`; compare the value instead",
                received
            )),
            ErrorImpl::NotAVariable { name } => {
                ErrorTip::Suggestion(format!("`{}` is a function, call it instead", name))
            }
            ErrorImpl::NotAFunction { name } => {
                ErrorTip::Suggestion(format!("`{}` is a variable and cannot be called", name))
            }
            ErrorImpl::NonConstantGlobal { name } => ErrorTip::Suggestion(format!(
                "Global `{}` can only be initialized with constant values",
                name
            )),
            ErrorImpl::ArrayInitializer { name } => ErrorTip::Suggestion(format!(
                "Assign the elements of `{}` one by one after declaring it",
                name
            )),
            ErrorImpl::ArrayTooLarge { name } => ErrorTip::Suggestion(format!(
                "The dimensions of `{}` multiply to more elements than can be addressed",
                name
            )),
            ErrorImpl::InvalidParameter { parameter, .. } => ErrorTip::Suggestion(format!(
                "Parameter `{}` must be a scalar without a default value",
                parameter
            )),
            ErrorImpl::MissingReturn { function } => ErrorTip::Suggestion(format!(
                "Add a `return` at the end of `{}`",
                function
            )),
            ErrorImpl::ReturnOutsideFunction | ErrorImpl::NotValidated => ErrorTip::None,
            ErrorImpl::ScopeUnderflow => ErrorTip::None,
            ErrorImpl::Backend { .. } => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (in {})", self.internal_error, self.node)
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("{name:?} already declared in this scope")]
    Redeclaration { name: String },
    #[error("{name:?} not declared")]
    Undeclared { name: String },
    #[error("types do not match: expected {expected}, received {received}")]
    TypeMismatch { expected: Type, received: Type },
    #[error("{function:?} expects {expected} arguments, received {received}")]
    ArityMismatch {
        function: String,
        expected: usize,
        received: usize,
    },
    #[error("{variable:?} has {declared} dimensions, accessed with {accessed}")]
    DimensionMismatch {
        variable: String,
        declared: usize,
        accessed: usize,
    },
    #[error("condition must be boolean, received {received}")]
    NonBooleanCondition { received: Type },
    #[error("{name:?} is not a variable")]
    NotAVariable { name: String },
    #[error("{name:?} is not a function")]
    NotAFunction { name: String },
    #[error("global {name:?} has a non-constant initializer")]
    NonConstantGlobal { name: String },
    #[error("array {name:?} cannot have an initializer")]
    ArrayInitializer { name: String },
    #[error("array {name:?} has too many elements")]
    ArrayTooLarge { name: String },
    #[error("parameter {parameter:?} of {function:?} must be a plain scalar")]
    InvalidParameter { function: String, parameter: String },
    #[error("function {function:?} does not return on every path")]
    MissingReturn { function: String },
    #[error("return outside of a function")]
    ReturnOutsideFunction,
    #[error("program generated before it was validated")]
    NotValidated,
    #[error("attempted to leave the global scope")]
    ScopeUnderflow,
    #[error("backend error: {message}")]
    Backend { message: String },
}

impl ErrorImpl {
    /// Wraps a lattice failure. For mismatches the left type is reported as expected.
    pub fn from_lattice(error: LatticeError) -> Self {
        match error {
            LatticeError::TypeMismatch { left, right } => ErrorImpl::TypeMismatch {
                expected: left,
                received: right,
            },
            LatticeError::UnsupportedConversion { target, from } => ErrorImpl::TypeMismatch {
                expected: target,
                received: from,
            },
            // Bitwise operators only accept the integer family
            LatticeError::UnsupportedOperator { ty, .. } => ErrorImpl::TypeMismatch {
                expected: Type::Long,
                received: ty,
            },
        }
    }
}

impl From<ScopeError> for ErrorImpl {
    fn from(error: ScopeError) -> Self {
        match error {
            ScopeError::Redeclaration { name } => ErrorImpl::Redeclaration { name },
            ScopeError::Underflow => ErrorImpl::ScopeUnderflow,
        }
    }
}

impl From<ScopeError> for Error {
    fn from(error: ScopeError) -> Self {
        Error::new(error.into(), NodeKind::Block)
    }
}
