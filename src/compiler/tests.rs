//! Unit tests for code generation.
//!
//! Programs are lowered into an [`IrModule`] and the resulting block
//! structure is inspected directly.

use pretty_assertions::assert_eq;

use super::compiler::{gen_function, Compiler};
use crate::ast::ast::{Decl, NodeKind};
use crate::ast::expressions::{Expr, VarExpr};
use crate::ast::statements::{Block, Case, FnDecl, Stmt, VarDecl};
use crate::ir::builder::IrModuleBuilder;
use crate::ir::module::{Instruction, IrModule, Operand, Terminator};
use crate::program::{compile, CompileOptions, Program};
use crate::type_checker::{type_checker::type_check, typed_ast::TypedDecl};
use crate::types::types::{BinaryOp, Literal, Operation, Type};

fn lower(declarations: Vec<Decl>) -> IrModule {
    let mut program = Program::new(declarations);
    compile(&mut program, IrModuleBuilder::new(&CompileOptions::default())).unwrap()
}

fn void_fn(name: &str, body: Vec<Stmt>) -> Decl {
    FnDecl::new(Type::Void, name, vec![], Block::new(body)).into()
}

fn labels(module: &IrModule, function: &str) -> Vec<String> {
    let (_, function) = module.function(function).unwrap();
    function.blocks.iter().map(|block| block.label.clone()).collect()
}

fn terminator<'m>(module: &'m IrModule, function: &str, label: &str) -> &'m Terminator {
    let (_, function) = module.function(function).unwrap();
    function.block(label).unwrap().terminator.as_ref().unwrap()
}

#[test]
fn test_void_function_gets_implicit_return() {
    let module = lower(vec![void_fn("main", vec![])]);

    assert_eq!(labels(&module, "main"), vec!["entry"]);
    assert_eq!(terminator(&module, "main", "entry"), &Terminator::Return(None));
}

#[test]
fn test_parameters_are_spilled_to_slots() {
    let module = lower(vec![FnDecl::new(
        Type::Int,
        "id",
        vec![VarDecl::new(Type::Int, "x")],
        Block::new(vec![Stmt::ret(Expr::var("x"))]),
    )
    .into()]);

    let (_, function) = module.function("id").unwrap();
    let entry = &function.blocks[0].instructions;

    assert!(matches!(entry[0], Instruction::Alloca { slot: 0, ty: Type::Int, .. }));
    assert!(matches!(
        &entry[1],
        Instruction::Store { value: Operand::Parameter(0), .. }
    ));
}

#[test]
fn test_if_else_blocks() {
    let module = lower(vec![void_fn(
        "main",
        vec![
            VarDecl::new(Type::Int, "x").into(),
            Stmt::if_else(
                Expr::binary(Expr::var("x"), BinaryOp::Lt, Expr::int(1)),
                Block::new(vec![Stmt::expr(Expr::assign_to("x", Expr::int(2)))]),
                Block::new(vec![Stmt::expr(Expr::assign_to("x", Expr::int(3)))]),
            ),
        ],
    )]);

    assert_eq!(labels(&module, "main"), vec!["entry", "then", "else", "end"]);
    assert!(matches!(
        terminator(&module, "main", "entry"),
        Terminator::CondBranch { then_block: 1, else_block: 2, .. }
    ));
    assert_eq!(terminator(&module, "main", "then"), &Terminator::Branch(3));
    assert_eq!(terminator(&module, "main", "else"), &Terminator::Branch(3));
    assert_eq!(terminator(&module, "main", "end"), &Terminator::Return(None));
}

#[test]
fn test_if_without_else_branches_to_end() {
    let module = lower(vec![void_fn(
        "main",
        vec![Stmt::if_then(Expr::boolean(true), Block::new(vec![]))],
    )]);

    assert_eq!(labels(&module, "main"), vec!["entry", "then", "end"]);
    assert!(matches!(
        terminator(&module, "main", "entry"),
        Terminator::CondBranch { then_block: 1, else_block: 2, .. }
    ));
}

#[test]
fn test_if_with_returning_arms_marks_end_unreachable() {
    let module = lower(vec![FnDecl::new(
        Type::Int,
        "pick",
        vec![VarDecl::new(Type::Boolean, "flag")],
        Block::new(vec![Stmt::if_else(
            Expr::var("flag"),
            Block::new(vec![Stmt::ret(Expr::int(1))]),
            Block::new(vec![Stmt::ret(Expr::int(2))]),
        )]),
    )
    .into()]);

    assert_eq!(terminator(&module, "pick", "end"), &Terminator::Unreachable);
}

#[test]
fn test_statements_after_return_are_skipped() {
    let module = lower(vec![FnDecl::new(
        Type::Int,
        "main",
        vec![],
        Block::new(vec![
            Stmt::ret(Expr::int(1)),
            VarDecl::new(Type::Int, "dead").into(),
            Stmt::ret(Expr::int(2)),
        ]),
    )
    .into()]);

    let (_, function) = module.function("main").unwrap();

    assert_eq!(function.blocks.len(), 1);
    assert!(function.blocks[0].instructions.is_empty());
    assert_eq!(
        function.blocks[0].terminator,
        Some(Terminator::Return(Some(Operand::Constant(Literal::Int(1)))))
    );
}

#[test]
fn test_while_blocks() {
    let module = lower(vec![void_fn(
        "main",
        vec![Stmt::while_loop(Expr::boolean(false), Block::new(vec![]))],
    )]);

    assert_eq!(labels(&module, "main"), vec!["entry", "cond", "body", "end"]);
    assert_eq!(terminator(&module, "main", "entry"), &Terminator::Branch(1));
    assert!(matches!(
        terminator(&module, "main", "cond"),
        Terminator::CondBranch { then_block: 2, else_block: 3, .. }
    ));
    assert_eq!(terminator(&module, "main", "body"), &Terminator::Branch(1));
}

#[test]
fn test_for_blocks() {
    let module = lower(vec![void_fn(
        "main",
        vec![Stmt::for_loop(
            VarDecl::new(Type::Int, "i").with_initializer(Expr::int(0)),
            Expr::binary(Expr::var("i"), BinaryOp::Lt, Expr::int(3)),
            Expr::assign_to("i", Expr::binary(Expr::var("i"), BinaryOp::Add, Expr::int(1))),
            Block::new(vec![]),
        )],
    )]);

    assert_eq!(
        labels(&module, "main"),
        vec!["entry", "cond", "body", "step", "end"]
    );
    assert_eq!(terminator(&module, "main", "body"), &Terminator::Branch(3));
    assert_eq!(terminator(&module, "main", "step"), &Terminator::Branch(1));
}

#[test]
fn test_nested_loops_get_unique_labels() {
    let module = lower(vec![void_fn(
        "main",
        vec![Stmt::while_loop(
            Expr::boolean(false),
            Block::new(vec![Stmt::while_loop(Expr::boolean(false), Block::new(vec![]))]),
        )],
    )]);

    assert_eq!(
        labels(&module, "main"),
        vec!["entry", "cond", "body", "end", "cond.1", "body.1", "end.1"]
    );
}

#[test]
fn test_switch_on_constants_uses_jump_table() {
    let module = lower(vec![FnDecl::new(
        Type::Void,
        "main",
        vec![VarDecl::new(Type::Int, "x")],
        Block::new(vec![Stmt::switch(
            Expr::var("x"),
            vec![
                Case::new(Expr::int(1), Block::new(vec![])),
                Case::new(Expr::int(2), Block::new(vec![])),
                Case::new(Expr::int(1), Block::new(vec![])),
            ],
        )]),
    )
    .into()]);

    assert_eq!(
        labels(&module, "main"),
        vec!["entry", "case", "case.1", "case.2", "end"]
    );
    match terminator(&module, "main", "entry") {
        Terminator::Switch { default, cases, .. } => {
            assert_eq!(*default, 4);
            assert_eq!(
                cases,
                &vec![(Literal::Int(1), 1), (Literal::Int(2), 2)]
            );
        }
        other => panic!("Expected a switch, got {:?}", other),
    }
}

#[test]
fn test_switch_on_double_uses_compare_chain() {
    let module = lower(vec![FnDecl::new(
        Type::Void,
        "main",
        vec![VarDecl::new(Type::Double, "x")],
        Block::new(vec![Stmt::switch(
            Expr::var("x"),
            vec![Case::new(Expr::int(1), Block::new(vec![]))],
        )]),
    )
    .into()]);

    assert_eq!(
        labels(&module, "main"),
        vec!["entry", "end", "case", "next"]
    );
    assert!(matches!(
        terminator(&module, "main", "entry"),
        Terminator::CondBranch { then_block: 2, else_block: 3, .. }
    ));
    assert_eq!(terminator(&module, "main", "case"), &Terminator::Branch(1));
    assert_eq!(terminator(&module, "main", "next"), &Terminator::Branch(1));
}

#[test]
fn test_array_length_is_product_of_dimensions() {
    let module = lower(vec![void_fn(
        "main",
        vec![VarDecl::new(Type::Int, "m")
            .with_dimensions(vec![Expr::int(2), Expr::int(3)])
            .into()],
    )]);

    let (_, function) = module.function("main").unwrap();
    let instructions = &function.blocks[0].instructions;

    assert!(instructions.iter().any(|instruction| matches!(
        instruction,
        Instruction::Binary { operation: Operation::IntMul, .. }
    )));
    assert!(instructions.iter().any(|instruction| matches!(
        instruction,
        Instruction::Alloca { length: Some(_), .. }
    )));
}

#[test]
fn test_globals_are_emitted_with_folded_initializers() {
    let module = lower(vec![
        VarDecl::new(Type::Int, "answer")
            .with_initializer(Expr::binary(Expr::int(40), BinaryOp::Add, Expr::int(2)))
            .into(),
        VarDecl::new(Type::Char, "grid")
            .with_dimensions(vec![Expr::int(4), Expr::int(5)])
            .into(),
    ]);

    assert_eq!(module.globals.len(), 2);
    assert_eq!(module.globals[0].initializer, Some(Literal::Int(42)));
    assert_eq!(module.globals[1].length, Some(20));
}

#[test]
fn test_indexed_store_into_global() {
    let module = lower(vec![
        VarDecl::new(Type::Int, "row")
            .with_dimensions(vec![Expr::int(3)])
            .into(),
        void_fn(
            "main",
            vec![Stmt::expr(Expr::assign(
                VarExpr::indexed("row", vec![Expr::int(2)]),
                Expr::int(9),
            ))],
        ),
    ]);

    let (_, function) = module.function("main").unwrap();

    assert!(function.blocks[0].instructions.iter().any(|instruction| matches!(
        instruction,
        Instruction::Store { offset: Some(_), .. }
    )));
}

#[test]
fn test_scope_restored_after_function() {
    let typed = type_check(&[FnDecl::new(
        Type::Int,
        "square",
        vec![VarDecl::new(Type::Int, "x")],
        Block::new(vec![Stmt::ret(Expr::binary(
            Expr::var("x"),
            BinaryOp::Mul,
            Expr::var("x"),
        ))]),
    )
    .into()])
    .unwrap();

    let mut compiler = Compiler::new(IrModuleBuilder::new(&CompileOptions::default()));
    match &typed.declarations[0] {
        TypedDecl::Function(function) => gen_function(&mut compiler, function).unwrap(),
        other => panic!("Expected a function, got {:?}", other),
    }

    assert_eq!(compiler.scope.depth(), 1);
    assert!(compiler.function.is_none());
    assert!(compiler.lookup_function("square", NodeKind::Call).is_ok());
    assert_eq!(
        compiler.lookup_variable("x", NodeKind::Var).err().map(|error| error.get_error_name().to_string()),
        Some("Undeclared".to_string())
    );
}
