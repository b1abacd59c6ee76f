//! Type checking and semantic analysis module.
//!
//! This module validates the AST and lowers it into a typed AST while:
//!
//! - Resolving variable and function references through the scope stack
//! - Widening operands and selecting conversions for every implicit cast
//! - Checking call arity and argument types
//! - Requiring boolean conditions and constant global initializers
//! - Detecting non-void functions that can fall off their end
//!
//! Code generation only accepts the typed AST, so it never sees a program
//! that failed validation.

pub mod type_checker;
pub mod typed_ast;

#[cfg(test)]
mod tests;
