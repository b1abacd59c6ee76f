use tracing::trace;

use crate::{
    ast::ast::NodeKind,
    errors::errors::Error,
    scope::scope::scoped,
    type_checker::typed_ast::{TypedBlock, TypedExpr, TypedStmt, TypedSwitch, TypedVarDecl},
    types::types::{Literal, Operation},
};

use super::{
    builder::{IrBuilder, WithNode},
    compiler::{Compiler, Storage},
    expr::{gen_coerced, gen_expression, gen_value},
};

/// Lowers the statements of `block` in the current frame.
///
/// Lowering stops at the first terminator; anything after it is unreachable.
pub fn gen_block<B: IrBuilder>(compiler: &mut Compiler<B>, block: &TypedBlock) -> Result<(), Error> {
    for (index, stmt) in block.body.iter().enumerate() {
        if compiler.builder.is_terminated() {
            trace!(skipped = block.body.len() - index, "unreachable statements");
            break;
        }
        gen_statement(compiler, stmt)?;
    }
    Ok(())
}

fn gen_scoped_block<B: IrBuilder>(compiler: &mut Compiler<B>, block: &TypedBlock) -> Result<(), Error> {
    scoped(compiler, |compiler| gen_block(compiler, block))
}

/// Branches to `target` unless the current block is already closed.
fn branch_if_open<B: IrBuilder>(
    compiler: &mut Compiler<B>,
    target: &B::Block,
    node: NodeKind,
) -> Result<bool, Error> {
    if compiler.builder.is_terminated() {
        return Ok(false);
    }
    compiler.builder.branch(target).at(node)?;
    Ok(true)
}

pub fn gen_statement<B: IrBuilder>(compiler: &mut Compiler<B>, statement: &TypedStmt) -> Result<(), Error> {
    match statement {
        TypedStmt::Block(block) => gen_scoped_block(compiler, block),
        TypedStmt::VarDecl(var_decl) => gen_var_decl(compiler, var_decl),
        TypedStmt::Expression(expression) => {
            gen_expression(compiler, expression)?;
            Ok(())
        }
        TypedStmt::If {
            condition,
            then_block,
            else_block,
        } => gen_if(compiler, condition, then_block, else_block.as_ref()),
        TypedStmt::For {
            declaration,
            condition,
            step,
            body,
        } => gen_for(compiler, declaration, condition, step, body),
        TypedStmt::While { condition, body } => gen_while(compiler, condition, body),
        TypedStmt::Switch(switch) => gen_switch(compiler, switch),
        TypedStmt::Return(value) => {
            let value = match value {
                Some(value) => Some(gen_coerced(compiler, value, NodeKind::Return)?),
                None => None,
            };
            compiler.builder.ret(value.as_ref()).at(NodeKind::Return)
        }
    }
}

/// Allocates a local, binds it and stores its initializer.
pub fn gen_var_decl<B: IrBuilder>(compiler: &mut Compiler<B>, var_decl: &TypedVarDecl) -> Result<(), Error> {
    let node = NodeKind::VarDecl;

    let dimensions = var_decl
        .dimensions
        .iter()
        .map(|size| gen_coerced(compiler, size, node))
        .collect::<Result<Vec<B::Value>, Error>>()?;

    // Element count is the product of the sizes, as a long
    let mut length: Option<B::Value> = None;
    for size in dimensions.iter() {
        length = Some(match length {
            Some(length) => compiler
                .builder
                .binary(Operation::IntMul, &length, size, "length")
                .at(node)?,
            None => size.clone(),
        });
    }

    let slot = compiler
        .builder
        .alloca(var_decl.ty, length.as_ref(), &var_decl.name)
        .at(node)?;

    compiler.declare(
        &var_decl.name,
        Storage::Variable {
            slot: slot.clone(),
            ty: var_decl.ty,
            dimensions,
        },
        node,
    )?;

    if let Some(initializer) = &var_decl.initializer {
        let value = gen_coerced(compiler, initializer, node)?;
        compiler
            .builder
            .store(&slot, var_decl.ty, None, &value)
            .at(node)?;
    }

    Ok(())
}

/// Spills an incoming argument into a slot of its own.
pub fn gen_parameter<B: IrBuilder>(
    compiler: &mut Compiler<B>,
    parameter: &TypedVarDecl,
    argument: &B::Value,
) -> Result<(), Error> {
    let node = NodeKind::VarDecl;
    let slot = compiler
        .builder
        .alloca(parameter.ty, None, &parameter.name)
        .at(node)?;
    compiler
        .builder
        .store(&slot, parameter.ty, None, argument)
        .at(node)?;

    compiler.declare(
        &parameter.name,
        Storage::Variable {
            slot,
            ty: parameter.ty,
            dimensions: vec![],
        },
        node,
    )
}

fn gen_if<B: IrBuilder>(
    compiler: &mut Compiler<B>,
    condition: &TypedExpr,
    then_body: &TypedBlock,
    else_body: Option<&TypedBlock>,
) -> Result<(), Error> {
    let node = NodeKind::If;
    let function = compiler.current_function(node)?;
    let condition = gen_value(compiler, condition, node)?;

    let then_block = compiler.builder.append_block(&function, "then");
    let else_block = else_body.map(|_| compiler.builder.append_block(&function, "else"));
    let end_block = compiler.builder.append_block(&function, "end");
    trace!(else_arm = else_block.is_some(), "if blocks");

    compiler
        .builder
        .cond_branch(&condition, &then_block, else_block.as_ref().unwrap_or(&end_block))
        .at(node)?;

    compiler.builder.position_at(&then_block);
    gen_scoped_block(compiler, then_body)?;
    let mut reaches_end = branch_if_open(compiler, &end_block, node)?;

    match (else_block, else_body) {
        (Some(else_block), Some(else_body)) => {
            compiler.builder.position_at(&else_block);
            gen_scoped_block(compiler, else_body)?;
            reaches_end |= branch_if_open(compiler, &end_block, node)?;
        }
        // The false edge lands on `end` directly
        _ => reaches_end = true,
    }

    compiler.builder.position_at(&end_block);
    if !reaches_end {
        compiler.builder.unreachable().at(node)?;
    }

    Ok(())
}

fn gen_while<B: IrBuilder>(
    compiler: &mut Compiler<B>,
    condition: &TypedExpr,
    body: &TypedBlock,
) -> Result<(), Error> {
    let node = NodeKind::While;
    let function = compiler.current_function(node)?;

    let cond_block = compiler.builder.append_block(&function, "cond");
    let body_block = compiler.builder.append_block(&function, "body");
    let end_block = compiler.builder.append_block(&function, "end");

    compiler.builder.branch(&cond_block).at(node)?;

    compiler.builder.position_at(&cond_block);
    let condition = gen_value(compiler, condition, node)?;
    compiler
        .builder
        .cond_branch(&condition, &body_block, &end_block)
        .at(node)?;

    compiler.builder.position_at(&body_block);
    gen_scoped_block(compiler, body)?;
    branch_if_open(compiler, &cond_block, node)?;

    compiler.builder.position_at(&end_block);
    Ok(())
}

fn gen_for<B: IrBuilder>(
    compiler: &mut Compiler<B>,
    declaration: &TypedVarDecl,
    condition: &TypedExpr,
    step: &TypedExpr,
    body: &TypedBlock,
) -> Result<(), Error> {
    let node = NodeKind::For;

    // The induction variable lives in a frame spanning condition, step and body
    scoped(compiler, |compiler| {
        let function = compiler.current_function(node)?;
        gen_var_decl(compiler, declaration)?;

        let cond_block = compiler.builder.append_block(&function, "cond");
        let body_block = compiler.builder.append_block(&function, "body");
        let step_block = compiler.builder.append_block(&function, "step");
        let end_block = compiler.builder.append_block(&function, "end");

        compiler.builder.branch(&cond_block).at(node)?;

        compiler.builder.position_at(&cond_block);
        let condition = gen_value(compiler, condition, node)?;
        compiler
            .builder
            .cond_branch(&condition, &body_block, &end_block)
            .at(node)?;

        compiler.builder.position_at(&body_block);
        gen_scoped_block(compiler, body)?;
        branch_if_open(compiler, &step_block, node)?;

        compiler.builder.position_at(&step_block);
        gen_expression(compiler, step)?;
        compiler.builder.branch(&cond_block).at(node)?;

        compiler.builder.position_at(&end_block);
        Ok(())
    })
}

fn gen_switch<B: IrBuilder>(compiler: &mut Compiler<B>, switch: &TypedSwitch) -> Result<(), Error> {
    let node = NodeKind::Switch;
    let function = compiler.current_function(node)?;
    let scrutinee = gen_coerced(compiler, &switch.scrutinee, node)?;

    if switch.jump_table {
        let case_blocks = switch
            .cases
            .iter()
            .map(|_| compiler.builder.append_block(&function, "case"))
            .collect::<Vec<B::Block>>();
        let end_block = compiler.builder.append_block(&function, "end");

        // A repeated constant can never match past its first occurrence
        let mut table: Vec<(Literal, B::Block)> = vec![];
        for (case, block) in switch.cases.iter().zip(case_blocks.iter()) {
            if let Some(constant) = &case.constant {
                if !table.iter().any(|(seen, _)| seen == constant) {
                    table.push((constant.clone(), block.clone()));
                }
            }
        }
        trace!(cases = table.len(), "switch jump table");

        compiler
            .builder
            .switch(&scrutinee, &end_block, &table)
            .at(node)?;

        for (case, block) in switch.cases.iter().zip(case_blocks.iter()) {
            compiler.builder.position_at(block);
            gen_scoped_block(compiler, &case.body)?;
            branch_if_open(compiler, &end_block, NodeKind::Case)?;
        }

        compiler.builder.position_at(&end_block);
        return Ok(());
    }

    trace!(cases = switch.cases.len(), "switch compare chain");
    let end_block = compiler.builder.append_block(&function, "end");

    for case in switch.cases.iter() {
        let value = gen_coerced(compiler, &case.value, NodeKind::Case)?;
        let matched = compiler
            .builder
            .compare(case.predicate, &scrutinee, &value, "case_match")
            .at(NodeKind::Case)?;

        let case_block = compiler.builder.append_block(&function, "case");
        let next_block = compiler.builder.append_block(&function, "next");
        compiler
            .builder
            .cond_branch(&matched, &case_block, &next_block)
            .at(NodeKind::Case)?;

        compiler.builder.position_at(&case_block);
        gen_scoped_block(compiler, &case.body)?;
        branch_if_open(compiler, &end_block, NodeKind::Case)?;

        compiler.builder.position_at(&next_block);
    }

    compiler.builder.branch(&end_block).at(node)?;
    compiler.builder.position_at(&end_block);
    Ok(())
}
