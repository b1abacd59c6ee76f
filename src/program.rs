//! The top-level aggregator: a list of global declarations that is validated
//! as a whole and then lowered into one module.

use tracing::debug;

use crate::{
    ast::ast::{Decl, NodeKind},
    compiler::{builder::IrBuilder, compiler::gen_program},
    errors::errors::{Error, ErrorImpl},
    type_checker::{type_checker::type_check, typed_ast::TypedProgram},
};

/// Settings applied to the emitted module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub module_name: String,
}

impl CompileOptions {
    pub fn new(module_name: &str) -> Self {
        CompileOptions {
            module_name: module_name.to_string(),
        }
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions::new("main")
    }
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    declarations: Vec<Decl>,
    typed: Option<TypedProgram>,
}

impl Program {
    pub fn new(declarations: Vec<Decl>) -> Self {
        Program {
            declarations,
            typed: None,
        }
    }

    /// Appends a declaration. A previous validation no longer applies.
    pub fn push(&mut self, declaration: impl Into<Decl>) {
        self.declarations.push(declaration.into());
        self.typed = None;
    }

    /// Validates every declaration in order, stopping at the first error.
    pub fn validate(&mut self) -> Result<(), Error> {
        self.typed = None;
        debug!(declarations = self.declarations.len(), "validating program");

        self.typed = Some(type_check(&self.declarations)?);
        Ok(())
    }

    pub fn is_validated(&self) -> bool {
        self.typed.is_some()
    }

    pub fn typed(&self) -> Option<&TypedProgram> {
        self.typed.as_ref()
    }

    /// Lowers the validated program through `builder`.
    pub fn generate<B: IrBuilder>(&self, builder: B) -> Result<B::Module, Error> {
        let typed = self
            .typed
            .as_ref()
            .ok_or_else(|| Error::new(ErrorImpl::NotValidated, NodeKind::Program))?;

        debug!(declarations = typed.declarations.len(), "generating program");
        gen_program(builder, typed)
    }
}

/// Runs both passes.
pub fn compile<B: IrBuilder>(program: &mut Program, builder: B) -> Result<B::Module, Error> {
    program.validate()?;
    program.generate(builder)
}
