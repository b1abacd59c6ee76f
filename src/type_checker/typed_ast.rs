//! Typed Abstract Syntax Tree definitions.
//!
//! This module contains the typed variants of AST nodes produced by the
//! type checker. Each typed node has been validated and carries:
//!
//! - The resolved type of every expression
//! - The conversion selected for every implicit widening or narrowing
//! - The family-specific operation or comparison predicate for operators
//!
//! Typed nodes can only be produced by a successful validation, so the code
//! generator consumes them without performing any semantic checks.

use crate::types::types::{Conversion, Literal, Operation, Predicate, Type};

#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpr {
    pub kind: TypedExprKind,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedExprKind {
    Literal(Literal),
    Var(TypedVar),
    Assign {
        target: TypedVar,
        value: Coerced,
    },
    /// Negation, lowered as `zero - operand`.
    Negate {
        operand: Box<TypedExpr>,
        zero: Literal,
        operation: Operation,
    },
    Arithmetic {
        left: Coerced,
        operation: Operation,
        right: Coerced,
    },
    Compare {
        left: Coerced,
        predicate: Predicate,
        right: Coerced,
    },
    Call {
        function: String,
        arguments: Vec<Coerced>,
    },
}

/// An expression together with the conversion into `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    pub value: Box<TypedExpr>,
    pub conversion: Conversion,
    pub target: Type,
}

/// A resolved variable access. Indices are already converted to `long`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedVar {
    pub name: String,
    pub indices: Vec<Coerced>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypedBlock {
    pub body: Vec<TypedStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedStmt {
    Block(TypedBlock),
    VarDecl(TypedVarDecl),
    Expression(TypedExpr),
    If {
        condition: TypedExpr,
        then_block: TypedBlock,
        else_block: Option<TypedBlock>,
    },
    For {
        declaration: TypedVarDecl,
        condition: TypedExpr,
        step: TypedExpr,
        body: TypedBlock,
    },
    While {
        condition: TypedExpr,
        body: TypedBlock,
    },
    Switch(TypedSwitch),
    Return(Option<Coerced>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedSwitch {
    /// Scrutinee converted to the common type of the scrutinee and all cases.
    pub scrutinee: Coerced,
    pub cases: Vec<TypedCase>,
    /// Set when the comparison type is an integer and every case value is a
    /// constant, in which case a single `switch` terminator is emitted.
    pub jump_table: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedCase {
    pub value: Coerced,
    pub predicate: Predicate,
    /// Folded case value, converted to the comparison type.
    pub constant: Option<Literal>,
    pub body: TypedBlock,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedVarDecl {
    pub name: String,
    pub ty: Type,
    /// Dimension sizes converted to `long`.
    pub dimensions: Vec<Coerced>,
    pub initializer: Option<Coerced>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedFnDecl {
    pub name: String,
    pub return_type: Type,
    pub parameters: Vec<TypedVarDecl>,
    pub body: TypedBlock,
}

/// Module-level storage with constant shape and initial value.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedGlobal {
    pub name: String,
    pub ty: Type,
    pub dimensions: Vec<u64>,
    /// Element count, the product of `dimensions`.
    pub length: u64,
    pub initializer: Option<Literal>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedDecl {
    Global(TypedGlobal),
    Function(TypedFnDecl),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypedProgram {
    pub declarations: Vec<TypedDecl>,
}

impl TypedBlock {
    /// Whether control can never fall off the end of this block.
    pub fn always_returns(&self) -> bool {
        self.body.iter().any(TypedStmt::always_returns)
    }
}

impl TypedStmt {
    pub fn always_returns(&self) -> bool {
        match self {
            TypedStmt::Return(_) => true,
            TypedStmt::Block(block) => block.always_returns(),
            TypedStmt::If {
                then_block,
                else_block: Some(else_block),
                ..
            } => then_block.always_returns() && else_block.always_returns(),
            // Loops may run zero times and switches have no default clause
            TypedStmt::If { .. }
            | TypedStmt::For { .. }
            | TypedStmt::While { .. }
            | TypedStmt::Switch(_)
            | TypedStmt::VarDecl(_)
            | TypedStmt::Expression(_) => false,
        }
    }
}

impl Coerced {
    pub fn new(value: TypedExpr, conversion: Conversion, target: Type) -> Self {
        Coerced {
            value: Box::new(value),
            conversion,
            target,
        }
    }
}
