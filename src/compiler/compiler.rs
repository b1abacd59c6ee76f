//! Main compiler module.
//!
//! This module contains the core Compiler structure and drives generation
//! from the typed AST into whatever module an [`IrBuilder`] produces. It owns
//! the generation-time scope that maps names onto storage handles.

use tracing::debug;

use crate::{
    ast::ast::NodeKind,
    errors::errors::{Error, ErrorImpl},
    scope::scope::{scoped, ScopeOwner, ScopeStack},
    type_checker::typed_ast::{TypedDecl, TypedFnDecl, TypedGlobal, TypedProgram},
    types::types::{Literal, Type},
};

use super::{
    builder::{BuildError, IrBuilder, WithNode},
    stmt::{gen_block, gen_parameter},
};

/// What a name is bound to during generation.
pub enum Storage<B: IrBuilder> {
    /// A slot and the evaluated size of each of its dimensions.
    Variable {
        slot: B::Slot,
        ty: Type,
        dimensions: Vec<B::Value>,
    },
    Function {
        function: B::Function,
        return_type: Type,
    },
}

/// The main compiler structure that holds the state of the generation pass.
///
/// This structure manages:
/// - The backend builder and its insertion point
/// - Named storage for variables and functions, one frame per block
/// - The function currently being lowered
pub struct Compiler<B: IrBuilder> {
    /// The backend receiving instructions
    pub builder: B,
    /// Generation-time scope, parallel to the validation-time one
    pub scope: ScopeStack<Storage<B>>,
    /// The function whose body is being lowered
    pub function: Option<B::Function>,
}

impl<B: IrBuilder> ScopeOwner for Compiler<B> {
    type Binding = Storage<B>;

    fn scope_mut(&mut self) -> &mut ScopeStack<Storage<B>> {
        &mut self.scope
    }
}

impl<B: IrBuilder> Compiler<B> {
    pub fn new(builder: B) -> Self {
        Compiler {
            builder,
            scope: ScopeStack::new(),
            function: None,
        }
    }

    pub fn declare(&mut self, name: &str, storage: Storage<B>, node: NodeKind) -> Result<(), Error> {
        self.scope
            .declare(name, storage)
            .map_err(|error| Error::new(error.into(), node))
    }

    /// Slot, element type and dimension sizes bound to `name`.
    pub fn lookup_variable(
        &self,
        name: &str,
        node: NodeKind,
    ) -> Result<(B::Slot, Type, Vec<B::Value>), Error> {
        match self.scope.lookup(name) {
            Some(Storage::Variable {
                slot,
                ty,
                dimensions,
            }) => Ok((slot.clone(), *ty, dimensions.clone())),
            Some(Storage::Function { .. }) => Err(Error::new(
                ErrorImpl::NotAVariable {
                    name: name.to_string(),
                },
                node,
            )),
            None => Err(Error::new(
                ErrorImpl::Undeclared {
                    name: name.to_string(),
                },
                node,
            )),
        }
    }

    pub fn lookup_function(&self, name: &str, node: NodeKind) -> Result<B::Function, Error> {
        match self.scope.lookup(name) {
            Some(Storage::Function { function, .. }) => Ok(function.clone()),
            Some(Storage::Variable { .. }) => Err(Error::new(
                ErrorImpl::NotAFunction {
                    name: name.to_string(),
                },
                node,
            )),
            None => Err(Error::new(
                ErrorImpl::Undeclared {
                    name: name.to_string(),
                },
                node,
            )),
        }
    }

    /// The function new blocks are appended to.
    pub fn current_function(&self, node: NodeKind) -> Result<B::Function, Error> {
        self.function
            .clone()
            .ok_or_else(|| Error::new(BuildError::NoInsertBlock.into(), node))
    }
}

/// Lowers a validated program into a finished module.
///
/// Globals and functions are emitted in declaration order; a function is
/// bound before its body is lowered so it can call itself.
///
/// # Arguments
///
/// * `builder` - The backend that receives the instructions
/// * `program` - The typed program produced by validation
///
/// # Returns
///
/// The module produced by `builder.finish()`.
pub fn gen_program<B: IrBuilder>(builder: B, program: &TypedProgram) -> Result<B::Module, Error> {
    let mut compiler = Compiler::new(builder);

    for declaration in program.declarations.iter() {
        gen_declaration(&mut compiler, declaration)?;
    }

    debug!(declarations = program.declarations.len(), "generation complete");
    compiler.builder.finish().at(NodeKind::Program)
}

pub fn gen_declaration<B: IrBuilder>(compiler: &mut Compiler<B>, declaration: &TypedDecl) -> Result<(), Error> {
    match declaration {
        TypedDecl::Global(global) => gen_global(compiler, global),
        TypedDecl::Function(function) => gen_function(compiler, function),
    }
}

fn gen_global<B: IrBuilder>(compiler: &mut Compiler<B>, global: &TypedGlobal) -> Result<(), Error> {
    let node = NodeKind::VarDecl;
    let length = if global.dimensions.is_empty() {
        None
    } else {
        Some(global.length)
    };

    let slot = compiler
        .builder
        .global(global.ty, length, global.initializer.as_ref(), &global.name)
        .at(node)?;

    let dimensions = global
        .dimensions
        .iter()
        .map(|size| compiler.builder.const_value(&Literal::Long(*size as i64)).at(node))
        .collect::<Result<Vec<B::Value>, Error>>()?;

    debug!(global = %global.name, ty = %global.ty, "emitted global");
    compiler.declare(
        &global.name,
        Storage::Variable {
            slot,
            ty: global.ty,
            dimensions,
        },
        node,
    )
}

/// Defines a function, spills its parameters into slots and lowers its body.
pub fn gen_function<B: IrBuilder>(compiler: &mut Compiler<B>, decl: &TypedFnDecl) -> Result<(), Error> {
    let node = NodeKind::FnDecl;
    let parameter_types = decl.parameters.iter().map(|p| p.ty).collect::<Vec<Type>>();

    let function = compiler
        .builder
        .define_function(&decl.name, decl.return_type, &parameter_types)
        .at(node)?;

    compiler
        .scope
        .declare_global(
            &decl.name,
            Storage::Function {
                function: function.clone(),
                return_type: decl.return_type,
            },
        )
        .map_err(|error| Error::new(error.into(), node))?;

    let entry = compiler.builder.append_block(&function, "entry");
    compiler.builder.position_at(&entry);

    let previous = compiler.function.replace(function.clone());

    let result: Result<(), Error> = scoped(compiler, |compiler| {
        let arguments = compiler.builder.function_params(&function);
        for (parameter, argument) in decl.parameters.iter().zip(arguments) {
            gen_parameter(compiler, parameter, &argument)?;
        }

        gen_block(compiler, &decl.body)?;

        if !compiler.builder.is_terminated() {
            if decl.return_type == Type::Void {
                compiler.builder.ret(None).at(node)?;
            } else {
                // Only reached through a continuation no path falls into
                compiler.builder.unreachable().at(node)?;
            }
        }

        Ok(())
    });

    compiler.function = previous;
    result?;

    debug!(function = %decl.name, "generated function");
    Ok(())
}
