//! Primitive types and the numeric widening lattice.
//!
//! This module defines:
//!
//! - The nine primitive types and their storage widths
//! - Widening of numeric operand pairs to a common type
//! - Conversion selection between two types
//! - Operator to family-specific operation mapping
//! - Typed constants used by literals and constant folding

pub mod types;
