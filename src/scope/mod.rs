//! Nested lexical scopes.
//!
//! A generic stack of name-binding frames shared by the validation pass
//! (names to declarations) and the generation pass (names to storage).

pub mod scope;

#[cfg(test)]
mod tests;
