//! In-memory intermediate representation.
//!
//! A backend-neutral module made of functions, basic blocks and explicit
//! terminators, together with:
//!
//! - [`builder::IrModuleBuilder`], the default code generation target
//! - [`interp::Interpreter`], which executes a finished module

pub mod builder;
pub mod interp;
pub mod module;
