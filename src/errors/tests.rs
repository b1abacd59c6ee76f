//! Unit tests for error handling.
//!
//! This module contains tests for error types and error reporting.

use crate::ast::ast::NodeKind;
use crate::errors::errors::{Error, ErrorImpl, ErrorTip};
use crate::scope::scope::ScopeError;
use crate::types::types::{BinaryOp, LatticeError, Type};

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::Undeclared {
            name: "foo".to_string(),
        },
        NodeKind::Var,
    );

    assert_eq!(error.get_error_name(), "Undeclared");
    assert_eq!(error.get_node(), NodeKind::Var);
}

#[test]
fn test_type_mismatch_error() {
    let error = Error::new(
        ErrorImpl::TypeMismatch {
            expected: Type::Int,
            received: Type::String,
        },
        NodeKind::Call,
    );

    assert_eq!(error.get_error_name(), "TypeMismatch");
    assert_eq!(
        error.to_string(),
        "types do not match: expected int, received string (in call)"
    );
}

#[test]
fn test_arity_mismatch_error() {
    let error = Error::new(
        ErrorImpl::ArityMismatch {
            function: "f".to_string(),
            expected: 2,
            received: 1,
        },
        NodeKind::Call,
    );

    assert_eq!(error.get_error_name(), "ArityMismatch");
    assert!(error.to_string().contains("expects 2 arguments, received 1"));
}

#[test]
fn test_error_tip_suggestion() {
    let error = Error::new(
        ErrorImpl::Redeclaration {
            name: "x".to_string(),
        },
        NodeKind::VarDecl,
    );

    match error.get_tip() {
        ErrorTip::Suggestion(msg) => assert!(msg.contains("`x`")),
        ErrorTip::None => panic!("Expected a suggestion"),
    }
}

#[test]
fn test_array_too_large_error() {
    let error = Error::new(
        ErrorImpl::ArrayTooLarge {
            name: "grid".to_string(),
        },
        NodeKind::VarDecl,
    );

    assert_eq!(error.get_error_name(), "ArrayTooLarge");
    assert_eq!(error.get_impl().to_string(), "array \"grid\" has too many elements");
    match error.get_tip() {
        ErrorTip::Suggestion(msg) => assert!(msg.contains("`grid`")),
        ErrorTip::None => panic!("Expected a suggestion"),
    }
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(ErrorImpl::NotValidated, NodeKind::Program);

    assert!(matches!(error.get_tip(), ErrorTip::None));
    assert_eq!(error.get_tip().to_string(), "");
}

#[test]
fn test_lattice_errors_become_type_mismatches() {
    assert_eq!(
        ErrorImpl::from_lattice(LatticeError::TypeMismatch {
            left: Type::Int,
            right: Type::Boolean,
        }),
        ErrorImpl::TypeMismatch {
            expected: Type::Int,
            received: Type::Boolean,
        }
    );

    assert_eq!(
        ErrorImpl::from_lattice(LatticeError::UnsupportedConversion {
            target: Type::Short,
            from: Type::String,
        }),
        ErrorImpl::TypeMismatch {
            expected: Type::Short,
            received: Type::String,
        }
    );

    assert_eq!(
        ErrorImpl::from_lattice(LatticeError::UnsupportedOperator {
            operator: BinaryOp::BitAnd,
            ty: Type::Double,
        }),
        ErrorImpl::TypeMismatch {
            expected: Type::Long,
            received: Type::Double,
        }
    );
}

#[test]
fn test_scope_errors_convert() {
    let redeclared: ErrorImpl = ScopeError::Redeclaration {
        name: "a".to_string(),
    }
    .into();
    assert_eq!(
        redeclared,
        ErrorImpl::Redeclaration {
            name: "a".to_string()
        }
    );

    let error: Error = ScopeError::Underflow.into();
    assert_eq!(error.get_error_name(), "ScopeUnderflow");
    assert_eq!(error.get_node(), NodeKind::Block);
}
