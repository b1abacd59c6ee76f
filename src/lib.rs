#![allow(clippy::module_inception)]

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod ir;
#[cfg(feature = "llvm")]
pub mod llvm;
pub mod program;
pub mod scope;
pub mod type_checker;
pub mod types;

pub use program::{compile, CompileOptions, Program};

use crate::errors::errors::{Error, ErrorTip};

/// Renders an error the way the command line reports it:
///
/// ```text
/// Error: TypeMismatch (Expected type `int`, received `boolean`)
/// -> in call
///    types do not match: expected int, received boolean
/// ```
pub fn format_error(error: &Error) -> String {
    let mut output = match error.get_tip() {
        ErrorTip::None => format!("Error: {}\n", error.get_error_name()),
        tip => format!("Error: {} ({})\n", error.get_error_name(), tip),
    };

    output.push_str(&format!("-> in {}\n", error.get_node()));
    output.push_str(&format!("   {}", error.get_impl()));
    output
}
