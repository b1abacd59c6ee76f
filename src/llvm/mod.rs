//! Native backend.
//!
//! [`builder::LlvmBuilder`] implements the code generation target on top of
//! inkwell, producing a verified LLVM module.

pub mod builder;

#[cfg(test)]
mod tests;
