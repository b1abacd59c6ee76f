//! Abstract Syntax Tree (AST) definitions.
//!
//! This module contains the node types handed to the core by the parser:
//!
//! - `ast`: node kinds and top-level declarations
//! - `expressions`: value-producing nodes
//! - `statements`: statements, blocks and declarations
//!
//! Every node kind is a variant of a closed enum, so the validation and
//! generation passes match on them exhaustively.

pub mod ast;
pub mod expressions;
pub mod statements;
