//! The instruction-builder seam between code generation and a backend.
//!
//! Code generation only talks to an [`IrBuilder`]; the in-crate IR and the
//! LLVM backend both implement it.

use std::fmt::Debug;

use thiserror::Error;

use crate::{
    ast::ast::NodeKind,
    errors::errors::{Error, ErrorImpl},
    types::types::{Conversion, Literal, Operation, Predicate, Type},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("no block to insert into")]
    NoInsertBlock,
    #[error("block {block:?} already has a terminator")]
    AfterTerminator { block: String },
    #[error("block {block:?} in {function:?} has no terminator")]
    Unterminated { function: String, block: String },
    #[error("{0}")]
    Backend(String),
}

impl From<BuildError> for ErrorImpl {
    fn from(error: BuildError) -> Self {
        ErrorImpl::Backend {
            message: error.to_string(),
        }
    }
}

/// Attaches the node being lowered to a backend failure.
pub trait WithNode<T> {
    fn at(self, node: NodeKind) -> Result<T, Error>;
}

impl<T> WithNode<T> for Result<T, BuildError> {
    fn at(self, node: NodeKind) -> Result<T, Error> {
        self.map_err(|error| Error::new(error.into(), node))
    }
}

/// Emits instructions at an insertion point, one basic block at a time.
///
/// Slots are addressable storage: a scalar or a flat, row-major array. An
/// `offset` of `None` addresses element zero.
pub trait IrBuilder {
    type Value: Clone + Debug;
    type Slot: Clone + Debug;
    type Block: Clone + Debug;
    type Function: Clone + Debug;
    type Module;

    fn define_function(
        &mut self,
        name: &str,
        return_type: Type,
        parameters: &[Type],
    ) -> Result<Self::Function, BuildError>;

    fn function_params(&self, function: &Self::Function) -> Vec<Self::Value>;

    fn append_block(&mut self, function: &Self::Function, label: &str) -> Self::Block;

    fn position_at(&mut self, block: &Self::Block);

    fn current_block(&self) -> Option<Self::Block>;

    /// Whether the current block already ends in a terminator.
    fn is_terminated(&self) -> bool;

    fn alloca(
        &mut self,
        ty: Type,
        length: Option<&Self::Value>,
        name: &str,
    ) -> Result<Self::Slot, BuildError>;

    fn global(
        &mut self,
        ty: Type,
        length: Option<u64>,
        initializer: Option<&Literal>,
        name: &str,
    ) -> Result<Self::Slot, BuildError>;

    fn load(
        &mut self,
        slot: &Self::Slot,
        ty: Type,
        offset: Option<&Self::Value>,
        name: &str,
    ) -> Result<Self::Value, BuildError>;

    fn store(
        &mut self,
        slot: &Self::Slot,
        ty: Type,
        offset: Option<&Self::Value>,
        value: &Self::Value,
    ) -> Result<(), BuildError>;

    fn const_value(&mut self, literal: &Literal) -> Result<Self::Value, BuildError>;

    fn binary(
        &mut self,
        operation: Operation,
        left: &Self::Value,
        right: &Self::Value,
        name: &str,
    ) -> Result<Self::Value, BuildError>;

    fn compare(
        &mut self,
        predicate: Predicate,
        left: &Self::Value,
        right: &Self::Value,
        name: &str,
    ) -> Result<Self::Value, BuildError>;

    fn convert(
        &mut self,
        conversion: Conversion,
        value: &Self::Value,
        target: Type,
        name: &str,
    ) -> Result<Self::Value, BuildError>;

    fn call(
        &mut self,
        function: &Self::Function,
        arguments: &[Self::Value],
        name: &str,
    ) -> Result<Option<Self::Value>, BuildError>;

    fn branch(&mut self, target: &Self::Block) -> Result<(), BuildError>;

    fn cond_branch(
        &mut self,
        condition: &Self::Value,
        then_block: &Self::Block,
        else_block: &Self::Block,
    ) -> Result<(), BuildError>;

    fn switch(
        &mut self,
        value: &Self::Value,
        default: &Self::Block,
        cases: &[(Literal, Self::Block)],
    ) -> Result<(), BuildError>;

    fn ret(&mut self, value: Option<&Self::Value>) -> Result<(), BuildError>;

    fn unreachable(&mut self) -> Result<(), BuildError>;

    /// Verifies and returns the finished module.
    fn finish(self) -> Result<Self::Module, BuildError>;
}
