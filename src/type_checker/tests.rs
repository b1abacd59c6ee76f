//! Unit tests for the type checker.
//!
//! This module contains tests for validating:
//! - Declarations, redeclaration and shadowing
//! - Implicit widening and narrowing conversions
//! - Calls, arity and argument types
//! - Control-flow conditions and return paths
//! - Constant folding of global initializers and array sizes

use pretty_assertions::assert_eq;

use super::type_checker::{type_check, Declaration, TypeChecker};
use super::typed_ast::{TypedDecl, TypedExprKind, TypedStmt};
use crate::ast::ast::{Decl, NodeKind};
use crate::ast::expressions::Expr;
use crate::ast::statements::{Block, Case, FnDecl, Stmt, VarDecl};
use crate::errors::errors::{Error, ErrorImpl};
use crate::types::types::{BinaryOp, Conversion, Literal, Operation, Predicate, Type};

fn void_fn(name: &str, body: Vec<Stmt>) -> Decl {
    FnDecl::new(Type::Void, name, vec![], Block::new(body)).into()
}

fn check(declarations: Vec<Decl>) -> Result<Vec<TypedDecl>, Error> {
    type_check(&declarations).map(|program| program.declarations)
}

fn check_err(declarations: Vec<Decl>) -> Error {
    match check(declarations) {
        Ok(program) => panic!("Expected an error, got {:?}", program),
        Err(error) => error,
    }
}

fn function_body(decl: &TypedDecl) -> &[TypedStmt] {
    match decl {
        TypedDecl::Function(function) => &function.body.body,
        TypedDecl::Global(global) => panic!("Expected a function, got {:?}", global),
    }
}

#[test]
fn test_variable_declaration() {
    let result = check(vec![void_fn(
        "main",
        vec![VarDecl::new(Type::Int, "x").with_initializer(Expr::int(1)).into()],
    )]);

    assert!(result.is_ok());
}

#[test]
fn test_redeclaration_in_same_block() {
    let error = check_err(vec![void_fn(
        "main",
        vec![
            VarDecl::new(Type::Int, "x").into(),
            VarDecl::new(Type::Double, "x").into(),
        ],
    )]);

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::Redeclaration {
            name: "x".to_string()
        }
    );
}

#[test]
fn test_shadowing_in_nested_block() {
    let result = check(vec![void_fn(
        "main",
        vec![
            VarDecl::new(Type::Int, "x").into(),
            Stmt::Block(Block::new(vec![VarDecl::new(Type::Double, "x").into()])),
            Stmt::expr(Expr::assign_to("x", Expr::int(3))),
        ],
    )]);

    assert!(result.is_ok());
}

#[test]
fn test_nested_block_bindings_do_not_leak() {
    let error = check_err(vec![void_fn(
        "main",
        vec![
            Stmt::Block(Block::new(vec![VarDecl::new(Type::Int, "inner").into()])),
            Stmt::expr(Expr::var("inner")),
        ],
    )]);

    assert_eq!(error.get_error_name(), "Undeclared");
}

#[test]
fn test_undeclared_variable() {
    let error = check_err(vec![void_fn("main", vec![Stmt::expr(Expr::var("missing"))])]);

    assert_eq!(error.get_error_name(), "Undeclared");
    assert_eq!(error.get_node(), NodeKind::Var);
}

#[test]
fn test_assignment_narrows_double_to_short() {
    let program = check(vec![void_fn(
        "main",
        vec![
            VarDecl::new(Type::Short, "s").into(),
            Stmt::expr(Expr::assign_to("s", Expr::double(3.7))),
        ],
    )])
    .unwrap();

    match &function_body(&program[0])[1] {
        TypedStmt::Expression(expr) => match &expr.kind {
            TypedExprKind::Assign { value, .. } => {
                assert_eq!(value.conversion, Conversion::FloatToSignedInt);
                assert_eq!(value.target, Type::Short);
            }
            other => panic!("Expected an assignment, got {:?}", other),
        },
        other => panic!("Expected an expression statement, got {:?}", other),
    }
}

#[test]
fn test_binary_widens_to_common_type() {
    let program = check(vec![void_fn(
        "main",
        vec![
            VarDecl::new(Type::Short, "a").into(),
            Stmt::expr(Expr::binary(Expr::var("a"), BinaryOp::Add, Expr::long(1))),
        ],
    )])
    .unwrap();

    match &function_body(&program[0])[1] {
        TypedStmt::Expression(expr) => {
            assert_eq!(expr.ty, Type::Long);
            match &expr.kind {
                TypedExprKind::Arithmetic {
                    left, operation, ..
                } => {
                    assert_eq!(*operation, Operation::IntAdd);
                    assert_eq!(left.conversion, Conversion::IntSignExtend);
                }
                other => panic!("Expected arithmetic, got {:?}", other),
            }
        }
        other => panic!("Expected an expression statement, got {:?}", other),
    }
}

#[test]
fn test_relational_yields_boolean() {
    let program = check(vec![void_fn(
        "main",
        vec![Stmt::expr(Expr::binary(
            Expr::float(1.0),
            BinaryOp::Lt,
            Expr::int(2),
        ))],
    )])
    .unwrap();

    match &function_body(&program[0])[0] {
        TypedStmt::Expression(expr) => {
            assert_eq!(expr.ty, Type::Boolean);
            assert!(matches!(
                expr.kind,
                TypedExprKind::Compare {
                    predicate: Predicate::FloatOlt,
                    ..
                }
            ));
        }
        other => panic!("Expected an expression statement, got {:?}", other),
    }
}

#[test]
fn test_binary_with_non_numeric_operand() {
    let error = check_err(vec![void_fn(
        "main",
        vec![Stmt::expr(Expr::binary(
            Expr::int(1),
            BinaryOp::Add,
            Expr::boolean(true),
        ))],
    )]);

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::TypeMismatch {
            expected: Type::Int,
            received: Type::Boolean
        }
    );
}

#[test]
fn test_bitwise_rejects_floats() {
    let error = check_err(vec![void_fn(
        "main",
        vec![Stmt::expr(Expr::binary(
            Expr::double(1.0),
            BinaryOp::BitAnd,
            Expr::int(1),
        ))],
    )]);

    assert_eq!(error.get_error_name(), "TypeMismatch");
}

#[test]
fn test_non_boolean_condition() {
    let error = check_err(vec![void_fn(
        "main",
        vec![Stmt::if_then(Expr::int(1), Block::default())],
    )]);

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::NonBooleanCondition {
            received: Type::Int
        }
    );
    assert_eq!(error.get_node(), NodeKind::If);
}

#[test]
fn test_call_arity_mismatch() {
    let error = check_err(vec![
        FnDecl::new(
            Type::Void,
            "f",
            vec![VarDecl::new(Type::Int, "a"), VarDecl::new(Type::Int, "b")],
            Block::default(),
        )
        .into(),
        void_fn("main", vec![Stmt::expr(Expr::call("f", vec![Expr::int(1)]))]),
    ]);

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::ArityMismatch {
            function: "f".to_string(),
            expected: 2,
            received: 1,
        }
    );
}

#[test]
fn test_call_argument_type_mismatch() {
    let error = check_err(vec![
        FnDecl::new(
            Type::Void,
            "f",
            vec![VarDecl::new(Type::Int, "a")],
            Block::default(),
        )
        .into(),
        void_fn(
            "main",
            vec![Stmt::expr(Expr::call("f", vec![Expr::boolean(true)]))],
        ),
    ]);

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::TypeMismatch {
            expected: Type::Int,
            received: Type::Boolean
        }
    );
}

#[test]
fn test_void_call_as_initializer() {
    let error = check_err(vec![
        void_fn("f", vec![]),
        void_fn(
            "main",
            vec![VarDecl::new(Type::Int, "x")
                .with_initializer(Expr::call("f", vec![]))
                .into()],
        ),
    ]);

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::TypeMismatch {
            expected: Type::Int,
            received: Type::Void
        }
    );
    assert_eq!(error.get_node(), NodeKind::VarDecl);
}

#[test]
fn test_void_call_as_operand() {
    let error = check_err(vec![
        void_fn("f", vec![]),
        void_fn(
            "main",
            vec![Stmt::expr(Expr::binary(
                Expr::call("f", vec![]),
                BinaryOp::Add,
                Expr::int(1),
            ))],
        ),
    ]);

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::TypeMismatch {
            expected: Type::Int,
            received: Type::Void
        }
    );
    assert_eq!(error.get_node(), NodeKind::Binary);
}

#[test]
fn test_void_call_as_argument() {
    let error = check_err(vec![
        void_fn("f", vec![]),
        FnDecl::new(
            Type::Void,
            "g",
            vec![VarDecl::new(Type::Int, "a")],
            Block::default(),
        )
        .into(),
        void_fn(
            "main",
            vec![Stmt::expr(Expr::call("g", vec![Expr::call("f", vec![])]))],
        ),
    ]);

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::TypeMismatch {
            expected: Type::Int,
            received: Type::Void
        }
    );
    assert_eq!(error.get_node(), NodeKind::Call);
}

#[test]
fn test_void_call_as_statement() {
    let result = check(vec![
        void_fn("f", vec![]),
        void_fn("main", vec![Stmt::expr(Expr::call("f", vec![]))]),
    ]);

    assert!(result.is_ok());
}

#[test]
fn test_calling_a_variable() {
    let error = check_err(vec![void_fn(
        "main",
        vec![
            VarDecl::new(Type::Int, "x").into(),
            Stmt::expr(Expr::call("x", vec![])),
        ],
    )]);

    assert_eq!(error.get_error_name(), "NotAFunction");
}

#[test]
fn test_reading_a_function() {
    let error = check_err(vec![void_fn("main", vec![Stmt::expr(Expr::var("main"))])]);

    assert_eq!(error.get_error_name(), "NotAVariable");
}

#[test]
fn test_recursive_call() {
    let body = Block::new(vec![
        Stmt::if_then(
            Expr::binary(Expr::var("n"), BinaryOp::Le, Expr::int(1)),
            Block::new(vec![Stmt::ret(Expr::int(1))]),
        ),
        Stmt::ret(Expr::binary(
            Expr::var("n"),
            BinaryOp::Mul,
            Expr::call(
                "fact",
                vec![Expr::binary(Expr::var("n"), BinaryOp::Sub, Expr::int(1))],
            ),
        )),
    ]);

    let result = check(vec![FnDecl::new(
        Type::Int,
        "fact",
        vec![VarDecl::new(Type::Int, "n")],
        body,
    )
    .into()]);

    assert!(result.is_ok());
}

#[test]
fn test_missing_return() {
    let error = check_err(vec![FnDecl::new(
        Type::Int,
        "f",
        vec![VarDecl::new(Type::Boolean, "flag")],
        Block::new(vec![Stmt::if_then(
            Expr::var("flag"),
            Block::new(vec![Stmt::ret(Expr::int(1))]),
        )]),
    )
    .into()]);

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::MissingReturn {
            function: "f".to_string()
        }
    );
}

#[test]
fn test_return_on_both_branches() {
    let result = check(vec![FnDecl::new(
        Type::Int,
        "f",
        vec![VarDecl::new(Type::Boolean, "flag")],
        Block::new(vec![Stmt::if_else(
            Expr::var("flag"),
            Block::new(vec![Stmt::ret(Expr::int(1))]),
            Block::new(vec![Stmt::ret(Expr::int(2))]),
        )]),
    )
    .into()]);

    assert!(result.is_ok());
}

#[test]
fn test_return_value_from_void_function() {
    let error = check_err(vec![void_fn("main", vec![Stmt::ret(Expr::int(1))])]);

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::TypeMismatch {
            expected: Type::Void,
            received: Type::Int
        }
    );
}

#[test]
fn test_return_without_value_from_int_function() {
    let error = check_err(vec![FnDecl::new(
        Type::Int,
        "f",
        vec![],
        Block::new(vec![Stmt::ret_void()]),
    )
    .into()]);

    assert_eq!(error.get_error_name(), "TypeMismatch");
}

#[test]
fn test_dimension_mismatch() {
    let error = check_err(vec![void_fn(
        "main",
        vec![
            VarDecl::new(Type::Int, "a")
                .with_dimensions(vec![Expr::int(3)])
                .into(),
            Stmt::expr(Expr::index("a", vec![Expr::int(0), Expr::int(1)])),
        ],
    )]);

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::DimensionMismatch {
            variable: "a".to_string(),
            declared: 1,
            accessed: 2,
        }
    );
}

#[test]
fn test_array_initializer_rejected() {
    let error = check_err(vec![void_fn(
        "main",
        vec![VarDecl::new(Type::Int, "a")
            .with_dimensions(vec![Expr::int(3)])
            .with_initializer(Expr::int(0))
            .into()],
    )]);

    assert_eq!(error.get_error_name(), "ArrayInitializer");
}

#[test]
fn test_array_parameter_rejected() {
    let error = check_err(vec![FnDecl::new(
        Type::Void,
        "f",
        vec![VarDecl::new(Type::Int, "a").with_dimensions(vec![Expr::int(2)])],
        Block::default(),
    )
    .into()]);

    assert_eq!(error.get_error_name(), "InvalidParameter");
}

#[test]
fn test_global_initializer_is_folded() {
    let program = check(vec![VarDecl::new(Type::Short, "g")
        .with_initializer(Expr::binary(
            Expr::int(2),
            BinaryOp::Mul,
            Expr::negate(Expr::int(21)),
        ))
        .into()])
    .unwrap();

    match &program[0] {
        TypedDecl::Global(global) => {
            assert_eq!(global.initializer, Some(Literal::Short(-42)));
        }
        other => panic!("Expected a global, got {:?}", other),
    }
}

#[test]
fn test_global_initializer_must_be_constant() {
    let error = check_err(vec![
        VarDecl::new(Type::Int, "a").into(),
        VarDecl::new(Type::Int, "b")
            .with_initializer(Expr::var("a"))
            .into(),
    ]);

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::NonConstantGlobal {
            name: "b".to_string()
        }
    );
}

#[test]
fn test_global_array_dimensions() {
    let program = check(vec![VarDecl::new(Type::Double, "grid")
        .with_dimensions(vec![Expr::int(2), Expr::long(3)])
        .into()])
    .unwrap();

    match &program[0] {
        TypedDecl::Global(global) => {
            assert_eq!(global.dimensions, vec![2, 3]);
            assert_eq!(global.length, 6);
        }
        other => panic!("Expected a global, got {:?}", other),
    }
}

#[test]
fn test_global_array_too_large() {
    let error = check_err(vec![VarDecl::new(Type::Int, "g")
        .with_dimensions(vec![Expr::long(i64::MAX); 3])
        .into()]);

    assert_eq!(
        error.get_impl(),
        &ErrorImpl::ArrayTooLarge {
            name: "g".to_string()
        }
    );
    assert_eq!(error.get_node(), NodeKind::VarDecl);
}

#[test]
fn test_global_redeclaration() {
    let error = check_err(vec![
        VarDecl::new(Type::Int, "g").into(),
        void_fn("g", vec![]),
    ]);

    assert_eq!(error.get_error_name(), "Redeclaration");
}

#[test]
fn test_return_outside_function() {
    let mut type_checker = TypeChecker::new();
    let error = super::type_checker::type_check_stmt(&mut type_checker, &Stmt::ret_void()).unwrap_err();

    assert_eq!(error.get_impl(), &ErrorImpl::ReturnOutsideFunction);
}

#[test]
fn test_for_variable_scoped_to_loop() {
    let error = check_err(vec![void_fn(
        "main",
        vec![
            Stmt::for_loop(
                VarDecl::new(Type::Int, "i").with_initializer(Expr::int(0)),
                Expr::binary(Expr::var("i"), BinaryOp::Lt, Expr::int(3)),
                Expr::assign_to(
                    "i",
                    Expr::binary(Expr::var("i"), BinaryOp::Add, Expr::int(1)),
                ),
                Block::default(),
            ),
            Stmt::expr(Expr::var("i")),
        ],
    )]);

    assert_eq!(error.get_error_name(), "Undeclared");
}

#[test]
fn test_switch_jump_table_detection() {
    let program = check(vec![void_fn(
        "main",
        vec![
            VarDecl::new(Type::Int, "x").into(),
            Stmt::switch(
                Expr::var("x"),
                vec![
                    Case::new(Expr::int(1), Block::default()),
                    Case::new(Expr::short(2), Block::default()),
                ],
            ),
        ],
    )])
    .unwrap();

    match &function_body(&program[0])[1] {
        TypedStmt::Switch(switch) => {
            assert!(switch.jump_table);
            assert_eq!(switch.cases[1].constant, Some(Literal::Int(2)));
        }
        other => panic!("Expected a switch, got {:?}", other),
    }
}

#[test]
fn test_switch_with_runtime_case_uses_compare_chain() {
    let program = check(vec![void_fn(
        "main",
        vec![
            VarDecl::new(Type::Int, "x").into(),
            VarDecl::new(Type::Int, "y").into(),
            Stmt::switch(
                Expr::var("x"),
                vec![Case::new(Expr::var("y"), Block::default())],
            ),
        ],
    )])
    .unwrap();

    match &function_body(&program[0])[2] {
        TypedStmt::Switch(switch) => assert!(!switch.jump_table),
        other => panic!("Expected a switch, got {:?}", other),
    }
}

#[test]
fn test_switch_case_type_mismatch() {
    let error = check_err(vec![void_fn(
        "main",
        vec![
            VarDecl::new(Type::Int, "x").into(),
            Stmt::switch(
                Expr::var("x"),
                vec![Case::new(Expr::string("one"), Block::default())],
            ),
        ],
    )]);

    assert_eq!(error.get_error_name(), "TypeMismatch");
    assert_eq!(error.get_node(), NodeKind::Case);
}

#[test]
fn test_functions_are_registered_globally() {
    let mut type_checker = TypeChecker::new();
    let declarations = vec![void_fn("main", vec![])];
    for declaration in declarations.iter() {
        super::type_checker::type_check_decl(&mut type_checker, declaration).unwrap();
    }

    assert_eq!(
        type_checker.scope.lookup("main"),
        Some(&Declaration::Function {
            return_type: Type::Void,
            parameters: vec![]
        })
    );
    assert_eq!(type_checker.scope.depth(), 1);
}
