use crate::{
    ast::ast::NodeKind,
    errors::errors::{Error, ErrorImpl},
    type_checker::typed_ast::{Coerced, TypedExpr, TypedExprKind, TypedVar},
    types::types::{Conversion, Operation},
};

use super::{
    builder::{IrBuilder, WithNode},
    compiler::Compiler,
};

/// Lowers an expression. Calls to `void` functions yield no value.
pub fn gen_expression<B: IrBuilder>(
    compiler: &mut Compiler<B>,
    expression: &TypedExpr,
) -> Result<Option<B::Value>, Error> {
    match &expression.kind {
        TypedExprKind::Literal(literal) => {
            let value = compiler.builder.const_value(literal).at(NodeKind::Literal)?;
            Ok(Some(value))
        }
        TypedExprKind::Var(var) => {
            let node = NodeKind::Var;
            let (slot, ty, dimensions) = compiler.lookup_variable(&var.name, node)?;
            let offset = gen_offset(compiler, var, &dimensions, node)?;

            let value = compiler
                .builder
                .load(&slot, ty, offset.as_ref(), &var.name)
                .at(node)?;
            Ok(Some(value))
        }
        TypedExprKind::Assign { target, value } => {
            let node = NodeKind::Assign;
            let value = gen_coerced(compiler, value, node)?;

            let (slot, ty, dimensions) = compiler.lookup_variable(&target.name, node)?;
            let offset = gen_offset(compiler, target, &dimensions, node)?;
            compiler
                .builder
                .store(&slot, ty, offset.as_ref(), &value)
                .at(node)?;

            Ok(Some(value))
        }
        TypedExprKind::Negate {
            operand,
            zero,
            operation,
        } => {
            let node = NodeKind::Unary;
            let zero = compiler.builder.const_value(zero).at(node)?;
            let operand = gen_value(compiler, operand, node)?;

            let value = compiler
                .builder
                .binary(*operation, &zero, &operand, "neg")
                .at(node)?;
            Ok(Some(value))
        }
        TypedExprKind::Arithmetic {
            left,
            operation,
            right,
        } => {
            let node = NodeKind::Binary;
            let left = gen_coerced(compiler, left, node)?;
            let right = gen_coerced(compiler, right, node)?;

            let value = compiler
                .builder
                .binary(*operation, &left, &right, "binop")
                .at(node)?;
            Ok(Some(value))
        }
        TypedExprKind::Compare {
            left,
            predicate,
            right,
        } => {
            let node = NodeKind::Binary;
            let left = gen_coerced(compiler, left, node)?;
            let right = gen_coerced(compiler, right, node)?;

            let value = compiler
                .builder
                .compare(*predicate, &left, &right, "cmp")
                .at(node)?;
            Ok(Some(value))
        }
        TypedExprKind::Call {
            function,
            arguments,
        } => {
            let node = NodeKind::Call;
            let callee = compiler.lookup_function(function, node)?;
            let arguments = arguments
                .iter()
                .map(|argument| gen_coerced(compiler, argument, node))
                .collect::<Result<Vec<B::Value>, Error>>()?;

            compiler.builder.call(&callee, &arguments, function).at(node)
        }
    }
}

/// Lowers an expression whose value is used.
pub fn gen_value<B: IrBuilder>(
    compiler: &mut Compiler<B>,
    expression: &TypedExpr,
    node: NodeKind,
) -> Result<B::Value, Error> {
    gen_expression(compiler, expression)?.ok_or_else(|| {
        Error::new(
            ErrorImpl::Backend {
                message: "void value used as an operand".to_string(),
            },
            node,
        )
    })
}

/// Lowers an expression and applies its selected conversion.
pub fn gen_coerced<B: IrBuilder>(
    compiler: &mut Compiler<B>,
    coerced: &Coerced,
    node: NodeKind,
) -> Result<B::Value, Error> {
    let value = gen_value(compiler, &coerced.value, node)?;
    if coerced.conversion == Conversion::Identity {
        return Ok(value);
    }

    compiler
        .builder
        .convert(coerced.conversion, &value, coerced.target, "conv")
        .at(node)
}

/// Row-major element offset of an indexed access. Missing trailing indices
/// are zero, so `m[i]` on a 2-D array addresses `m[i][0]`.
fn gen_offset<B: IrBuilder>(
    compiler: &mut Compiler<B>,
    var: &TypedVar,
    dimensions: &[B::Value],
    node: NodeKind,
) -> Result<Option<B::Value>, Error> {
    if var.indices.is_empty() {
        return Ok(None);
    }

    let mut offset: Option<B::Value> = None;
    for (position, size) in dimensions.iter().enumerate() {
        let index = match var.indices.get(position) {
            Some(index) => Some(gen_coerced(compiler, index, node)?),
            None => None,
        };

        offset = match offset {
            None => index,
            Some(offset) => {
                let scaled = compiler
                    .builder
                    .binary(Operation::IntMul, &offset, size, "scaled")
                    .at(node)?;
                match index {
                    Some(index) => Some(
                        compiler
                            .builder
                            .binary(Operation::IntAdd, &scaled, &index, "offset")
                            .at(node)?,
                    ),
                    None => Some(scaled),
                }
            }
        };
    }

    Ok(offset)
}
