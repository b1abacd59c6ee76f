use inkwell::context::Context;

use super::builder::LlvmBuilder;
use crate::ast::expressions::{Expr, VarExpr};
use crate::ast::statements::{Block, Case, FnDecl, Stmt, VarDecl};
use crate::program::{compile, CompileOptions, Program};
use crate::types::types::{BinaryOp, Type};

#[test]
fn test_function_with_parameters() {
    let context = Context::create();
    let mut program = Program::new(vec![FnDecl::new(
        Type::Int,
        "add",
        vec![VarDecl::new(Type::Int, "a"), VarDecl::new(Type::Short, "b")],
        Block::new(vec![Stmt::ret(Expr::binary(
            Expr::var("a"),
            BinaryOp::Add,
            Expr::var("b"),
        ))]),
    )
    .into()]);

    let module = compile(
        &mut program,
        LlvmBuilder::new(&context, &CompileOptions::new("add")),
    )
    .unwrap();
    let text = module.print_to_string().to_string();

    assert!(text.contains("define i32 @add(i32"));
    assert!(text.contains("sext i16"));
}

#[test]
fn test_globals_and_switch() {
    let context = Context::create();
    let mut program = Program::new(vec![
        VarDecl::new(Type::Int, "table")
            .with_dimensions(vec![Expr::int(2), Expr::int(3)])
            .into(),
        VarDecl::new(Type::Double, "scale")
            .with_initializer(Expr::double(1.5))
            .into(),
        FnDecl::new(
            Type::Void,
            "main",
            vec![VarDecl::new(Type::Int, "x")],
            Block::new(vec![Stmt::switch(
                Expr::var("x"),
                vec![
                    Case::new(
                        Expr::int(1),
                        Block::new(vec![Stmt::expr(Expr::assign(
                            VarExpr::indexed("table", vec![Expr::int(1), Expr::int(2)]),
                            Expr::int(7),
                        ))]),
                    ),
                    Case::new(Expr::int(2), Block::new(vec![Stmt::ret_void()])),
                ],
            )]),
        )
        .into(),
    ]);

    let module = compile(&mut program, LlvmBuilder::new(&context, &CompileOptions::default())).unwrap();
    let text = module.print_to_string().to_string();

    assert!(text.contains("[6 x i32]"));
    assert!(text.contains("switch i32"));
    assert!(text.contains("ret void"));
}

#[test]
fn test_string_constant() {
    let context = Context::create();
    let mut program = Program::new(vec![FnDecl::new(
        Type::String,
        "greeting",
        vec![],
        Block::new(vec![Stmt::ret(Expr::string("hello"))]),
    )
    .into()]);

    let module = compile(&mut program, LlvmBuilder::new(&context, &CompileOptions::default())).unwrap();

    assert!(module.print_to_string().to_string().contains("c\"hello\\00\""));
}
