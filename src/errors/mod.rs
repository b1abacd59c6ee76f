//! Error types and error handling for the compiler.
//!
//! This module defines the semantic errors raised while validating a
//! program. It includes:
//!
//! - The error structure carrying the node kind that raised it
//! - Specific error variants for each violated invariant
//! - Human-readable tips for displaying errors

pub mod errors;

#[cfg(test)]
mod tests;
