//! Code generation module for the compiler.
//!
//! This module lowers the typed AST into basic blocks through an
//! [`builder::IrBuilder`]. It handles:
//!
//! - Functions, their parameters and implicit returns
//! - Local and global storage, including row-major array addressing
//! - Structured control flow lowered to explicit branches
//! - Conversions selected during validation

pub mod builder;
pub mod compiler;
pub mod expr;
pub mod stmt;

#[cfg(test)]
mod tests;
