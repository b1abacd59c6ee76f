use tracing::debug;

use crate::{
    ast::{
        ast::{Decl, NodeKind},
        expressions::{Expr, UnaryOp, VarExpr},
        statements::{Block, FnDecl, Stmt, VarDecl},
    },
    errors::errors::{Error, ErrorImpl},
    scope::scope::{scoped, ScopeOwner, ScopeStack},
    types::types::{conversion, operation, predicate, widen, BinaryOp, Literal, Type},
};

use super::typed_ast::{
    Coerced, TypedBlock, TypedCase, TypedDecl, TypedExpr, TypedExprKind, TypedFnDecl,
    TypedGlobal, TypedProgram, TypedStmt, TypedSwitch, TypedVar, TypedVarDecl,
};

/// What a name is bound to during validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Variable { ty: Type, dimensions: usize },
    Function { return_type: Type, parameters: Vec<Type> },
}

#[derive(Debug)]
struct FunctionContext {
    name: String,
    return_type: Type,
}

/// Validation state for one compilation run.
#[derive(Debug, Default)]
pub struct TypeChecker {
    pub scope: ScopeStack<Declaration>,
    function: Option<FunctionContext>,
}

impl ScopeOwner for TypeChecker {
    type Binding = Declaration;

    fn scope_mut(&mut self) -> &mut ScopeStack<Declaration> {
        &mut self.scope
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        TypeChecker::default()
    }

    fn declare(&mut self, name: &str, declaration: Declaration, node: NodeKind) -> Result<(), Error> {
        self.scope
            .declare(name, declaration)
            .map_err(|error| Error::new(error.into(), node))
    }

    fn lookup_variable(&self, name: &str, node: NodeKind) -> Result<(Type, usize), Error> {
        match self.scope.lookup(name) {
            Some(Declaration::Variable { ty, dimensions }) => Ok((*ty, *dimensions)),
            Some(Declaration::Function { .. }) => Err(Error::new(
                ErrorImpl::NotAVariable {
                    name: name.to_string(),
                },
                node,
            )),
            None => Err(undeclared(name, node)),
        }
    }
}

fn undeclared(name: &str, node: NodeKind) -> Error {
    Error::new(
        ErrorImpl::Undeclared {
            name: name.to_string(),
        },
        node,
    )
}

fn mismatch(expected: Type, received: Type, node: NodeKind) -> Error {
    Error::new(ErrorImpl::TypeMismatch { expected, received }, node)
}

/// Wraps `value` with the conversion into `target`, or fails naming both types.
pub fn coerce(value: TypedExpr, target: Type, node: NodeKind) -> Result<Coerced, Error> {
    let selected = conversion(target, value.ty).map_err(|_| mismatch(target, value.ty, node))?;
    Ok(Coerced::new(value, selected, target))
}

/// Evaluates an expression made only of constants.
pub fn fold_constant(expr: &TypedExpr) -> Option<Literal> {
    match &expr.kind {
        TypedExprKind::Literal(literal) => Some(literal.clone()),
        TypedExprKind::Negate {
            operand,
            zero,
            operation,
        } => Literal::fold(*operation, zero, &fold_constant(operand)?, expr.ty),
        TypedExprKind::Arithmetic {
            left,
            operation,
            right,
        } => Literal::fold(*operation, &fold_coerced(left)?, &fold_coerced(right)?, expr.ty),
        _ => None,
    }
}

fn fold_coerced(coerced: &Coerced) -> Option<Literal> {
    fold_constant(&coerced.value)?.convert(coerced.target)
}

fn check_storable(ty: Type, node: NodeKind) -> Result<(), Error> {
    if ty == Type::Void {
        return Err(mismatch(Type::Int, Type::Void, node));
    }
    Ok(())
}

/// Validates the whole program, declaration by declaration.
pub fn type_check(declarations: &[Decl]) -> Result<TypedProgram, Error> {
    let mut type_checker = TypeChecker::new();
    let mut typed = TypedProgram::default();

    for declaration in declarations {
        debug!(name = declaration.name(), kind = ?declaration.kind(), "checking declaration");
        typed
            .declarations
            .push(type_check_decl(&mut type_checker, declaration)?);
    }

    debug!(declarations = typed.declarations.len(), "type check complete");
    Ok(typed)
}

pub fn type_check_decl(type_checker: &mut TypeChecker, declaration: &Decl) -> Result<TypedDecl, Error> {
    match declaration {
        Decl::Variable(var_decl) => Ok(TypedDecl::Global(type_check_global(type_checker, var_decl)?)),
        Decl::Function(fn_decl) => Ok(TypedDecl::Function(type_check_fn_decl(type_checker, fn_decl)?)),
    }
}

fn type_check_global(type_checker: &mut TypeChecker, var_decl: &VarDecl) -> Result<TypedGlobal, Error> {
    let node = NodeKind::VarDecl;
    check_storable(var_decl.ty, node)?;

    let non_constant = || {
        Error::new(
            ErrorImpl::NonConstantGlobal {
                name: var_decl.name.clone(),
            },
            node,
        )
    };

    let mut dimensions = vec![];
    let mut length: u64 = 1;
    for dimension in var_decl.dimensions.iter() {
        let size = type_check_index(type_checker, dimension, node)?;
        let size = match fold_coerced(&size).and_then(|size| size.as_i64()) {
            Some(size) if size > 0 => size as u64,
            _ => return Err(non_constant()),
        };

        length = length.checked_mul(size).ok_or_else(|| {
            Error::new(
                ErrorImpl::ArrayTooLarge {
                    name: var_decl.name.clone(),
                },
                node,
            )
        })?;
        dimensions.push(size);
    }

    type_checker.declare(
        &var_decl.name,
        Declaration::Variable {
            ty: var_decl.ty,
            dimensions: dimensions.len(),
        },
        node,
    )?;

    let initializer = match &var_decl.initializer {
        Some(initializer) => {
            if !dimensions.is_empty() {
                return Err(Error::new(
                    ErrorImpl::ArrayInitializer {
                        name: var_decl.name.clone(),
                    },
                    node,
                ));
            }
            let value = type_check_expr(type_checker, initializer)?;
            let value = coerce(value, var_decl.ty, node)?;
            Some(fold_coerced(&value).ok_or_else(non_constant)?)
        }
        None => None,
    };

    debug!(global = %var_decl.name, ty = %var_decl.ty, "validated global");
    Ok(TypedGlobal {
        name: var_decl.name.clone(),
        ty: var_decl.ty,
        dimensions,
        length,
        initializer,
    })
}

pub fn type_check_var_decl(
    type_checker: &mut TypeChecker,
    var_decl: &VarDecl,
) -> Result<TypedVarDecl, Error> {
    let node = NodeKind::VarDecl;
    check_storable(var_decl.ty, node)?;

    if type_checker.scope.is_declared_in_current(&var_decl.name) {
        return Err(Error::new(
            ErrorImpl::Redeclaration {
                name: var_decl.name.clone(),
            },
            node,
        ));
    }

    let dimensions = var_decl
        .dimensions
        .iter()
        .map(|dimension| type_check_index(type_checker, dimension, node))
        .collect::<Result<Vec<Coerced>, Error>>()?;

    // Registered before the initializer is checked, matching sequential declare-then-assign
    type_checker.declare(
        &var_decl.name,
        Declaration::Variable {
            ty: var_decl.ty,
            dimensions: dimensions.len(),
        },
        node,
    )?;

    let initializer = match &var_decl.initializer {
        Some(_) if !dimensions.is_empty() => {
            return Err(Error::new(
                ErrorImpl::ArrayInitializer {
                    name: var_decl.name.clone(),
                },
                node,
            ))
        }
        Some(initializer) => {
            let value = type_check_expr(type_checker, initializer)?;
            Some(coerce(value, var_decl.ty, node)?)
        }
        None => None,
    };

    Ok(TypedVarDecl {
        name: var_decl.name.clone(),
        ty: var_decl.ty,
        dimensions,
        initializer,
    })
}

pub fn type_check_fn_decl(type_checker: &mut TypeChecker, fn_decl: &FnDecl) -> Result<TypedFnDecl, Error> {
    let node = NodeKind::FnDecl;

    for parameter in fn_decl.parameters.iter() {
        if !parameter.dimensions.is_empty() || parameter.initializer.is_some() {
            return Err(Error::new(
                ErrorImpl::InvalidParameter {
                    function: fn_decl.name.clone(),
                    parameter: parameter.name.clone(),
                },
                node,
            ));
        }
    }

    // Registered before the body so the function can call itself
    type_checker
        .scope
        .declare_global(
            &fn_decl.name,
            Declaration::Function {
                return_type: fn_decl.return_type,
                parameters: fn_decl.parameters.iter().map(|p| p.ty).collect(),
            },
        )
        .map_err(|error| Error::new(error.into(), node))?;

    let previous = type_checker.function.replace(FunctionContext {
        name: fn_decl.name.clone(),
        return_type: fn_decl.return_type,
    });

    // Parameters and body locals share one frame
    let result: Result<_, Error> = scoped(type_checker, |type_checker| {
        let parameters = fn_decl
            .parameters
            .iter()
            .map(|parameter| type_check_var_decl(type_checker, parameter))
            .collect::<Result<Vec<TypedVarDecl>, Error>>()?;
        let body = type_check_block(type_checker, &fn_decl.body)?;
        Ok((parameters, body))
    });

    let context = std::mem::replace(&mut type_checker.function, previous);
    let (parameters, body) = result?;

    if fn_decl.return_type != Type::Void && !body.always_returns() {
        let function = context.map_or_else(|| fn_decl.name.clone(), |context| context.name);
        return Err(Error::new(ErrorImpl::MissingReturn { function }, node));
    }

    debug!(function = %fn_decl.name, parameters = parameters.len(), "validated function");
    Ok(TypedFnDecl {
        name: fn_decl.name.clone(),
        return_type: fn_decl.return_type,
        parameters,
        body,
    })
}

/// Validates the statements of `block` in the current frame.
pub fn type_check_block(type_checker: &mut TypeChecker, block: &Block) -> Result<TypedBlock, Error> {
    let mut typed = TypedBlock::default();
    for stmt in block.iter() {
        typed.body.push(type_check_stmt(type_checker, stmt)?);
    }
    Ok(typed)
}

fn type_check_scoped_block(type_checker: &mut TypeChecker, block: &Block) -> Result<TypedBlock, Error> {
    scoped(type_checker, |type_checker| type_check_block(type_checker, block))
}

fn type_check_condition(
    type_checker: &mut TypeChecker,
    condition: &Expr,
    node: NodeKind,
) -> Result<TypedExpr, Error> {
    let condition = type_check_expr(type_checker, condition)?;
    if condition.ty != Type::Boolean {
        return Err(Error::new(
            ErrorImpl::NonBooleanCondition {
                received: condition.ty,
            },
            node,
        ));
    }
    Ok(condition)
}

fn type_check_index(type_checker: &mut TypeChecker, index: &Expr, node: NodeKind) -> Result<Coerced, Error> {
    let index = type_check_expr(type_checker, index)?;
    if !index.ty.is_integer() {
        return Err(mismatch(Type::Int, index.ty, node));
    }
    coerce(index, Type::Long, node)
}

pub fn type_check_stmt(type_checker: &mut TypeChecker, stmt: &Stmt) -> Result<TypedStmt, Error> {
    match stmt {
        Stmt::Block(block) => Ok(TypedStmt::Block(type_check_scoped_block(type_checker, block)?)),
        Stmt::VarDecl(var_decl) => Ok(TypedStmt::VarDecl(type_check_var_decl(type_checker, var_decl)?)),
        Stmt::Expression(expression) => Ok(TypedStmt::Expression(type_check_expr(type_checker, expression)?)),
        Stmt::If(if_stmt) => {
            let condition = type_check_condition(type_checker, &if_stmt.condition, stmt.kind())?;
            let then_block = type_check_scoped_block(type_checker, &if_stmt.then_block)?;
            let else_block = match &if_stmt.else_block {
                Some(else_block) => Some(type_check_scoped_block(type_checker, else_block)?),
                None => None,
            };

            Ok(TypedStmt::If {
                condition,
                then_block,
                else_block,
            })
        }
        Stmt::For(for_stmt) => scoped(type_checker, |type_checker| {
            let declaration = type_check_var_decl(type_checker, &for_stmt.declaration)?;
            let condition = type_check_condition(type_checker, &for_stmt.condition, stmt.kind())?;
            let step = type_check_expr(type_checker, &for_stmt.step)?;
            let body = type_check_scoped_block(type_checker, &for_stmt.body)?;

            Ok(TypedStmt::For {
                declaration,
                condition,
                step,
                body,
            })
        }),
        Stmt::While(while_stmt) => {
            let condition = type_check_condition(type_checker, &while_stmt.condition, stmt.kind())?;
            let body = type_check_scoped_block(type_checker, &while_stmt.body)?;

            Ok(TypedStmt::While { condition, body })
        }
        Stmt::Switch(switch_stmt) => {
            let scrutinee = type_check_expr(type_checker, &switch_stmt.scrutinee)?;
            if !(scrutinee.ty.is_numeric() || matches!(scrutinee.ty, Type::Boolean | Type::Char)) {
                return Err(mismatch(Type::Int, scrutinee.ty, NodeKind::Switch));
            }

            let mut compare_type = scrutinee.ty;
            let mut cases = vec![];
            for case in switch_stmt.cases.iter() {
                let value = type_check_expr(type_checker, &case.value)?;
                compare_type = widen(compare_type, value.ty)
                    .map_err(|_| mismatch(scrutinee.ty, value.ty, NodeKind::Case))?;
                let body = type_check_scoped_block(type_checker, &case.body)?;
                cases.push((value, body));
            }

            let equals = predicate(BinaryOp::Eq, compare_type)
                .map_err(|error| Error::new(ErrorImpl::from_lattice(error), NodeKind::Switch))?;

            let cases = cases
                .into_iter()
                .map(|(value, body)| {
                    let constant = fold_constant(&value).and_then(|constant| constant.convert(compare_type));
                    Ok(TypedCase {
                        value: coerce(value, compare_type, NodeKind::Case)?,
                        predicate: equals,
                        constant,
                        body,
                    })
                })
                .collect::<Result<Vec<TypedCase>, Error>>()?;

            let jump_table = compare_type.is_integer()
                && !cases.is_empty()
                && cases.iter().all(|case| case.constant.is_some());

            Ok(TypedStmt::Switch(TypedSwitch {
                scrutinee: coerce(scrutinee, compare_type, NodeKind::Switch)?,
                cases,
                jump_table,
            }))
        }
        Stmt::Return(return_stmt) => {
            let node = stmt.kind();
            let return_type = match &type_checker.function {
                Some(function) => function.return_type,
                None => return Err(Error::new(ErrorImpl::ReturnOutsideFunction, node)),
            };

            match (&return_stmt.value, return_type) {
                (None, Type::Void) => Ok(TypedStmt::Return(None)),
                (None, expected) => Err(mismatch(expected, Type::Void, node)),
                (Some(value), Type::Void) => {
                    let value = type_check_expr(type_checker, value)?;
                    Err(mismatch(Type::Void, value.ty, node))
                }
                (Some(value), expected) => {
                    let value = type_check_expr(type_checker, value)?;
                    Ok(TypedStmt::Return(Some(coerce(value, expected, node)?)))
                }
            }
        }
    }
}

fn type_check_var(type_checker: &mut TypeChecker, var: &VarExpr) -> Result<TypedVar, Error> {
    let node = NodeKind::Var;
    let (ty, dimensions) = type_checker.lookup_variable(&var.name, node)?;

    if var.indices.len() > dimensions {
        return Err(Error::new(
            ErrorImpl::DimensionMismatch {
                variable: var.name.clone(),
                declared: dimensions,
                accessed: var.indices.len(),
            },
            node,
        ));
    }

    let indices = var
        .indices
        .iter()
        .map(|index| type_check_index(type_checker, index, node))
        .collect::<Result<Vec<Coerced>, Error>>()?;

    Ok(TypedVar {
        name: var.name.clone(),
        indices,
        ty,
    })
}

pub fn type_check_expr(type_checker: &mut TypeChecker, expr: &Expr) -> Result<TypedExpr, Error> {
    match expr {
        Expr::Literal(literal) => Ok(TypedExpr {
            kind: TypedExprKind::Literal(literal.clone()),
            ty: literal.get_type(),
        }),
        Expr::Var(var) => {
            let var = type_check_var(type_checker, var)?;
            Ok(TypedExpr {
                ty: var.ty,
                kind: TypedExprKind::Var(var),
            })
        }
        Expr::Assign(assignment) => {
            let target = type_check_var(type_checker, &assignment.target)?;
            let value = type_check_expr(type_checker, &assignment.value)?;
            let value = coerce(value, target.ty, expr.kind())?;

            Ok(TypedExpr {
                ty: target.ty,
                kind: TypedExprKind::Assign { target, value },
            })
        }
        Expr::Unary(unary) => match unary.operator {
            UnaryOp::Negate => {
                let node = expr.kind();
                let operand = type_check_expr(type_checker, &unary.operand)?;
                let zero = Literal::zero(operand.ty).ok_or_else(|| mismatch(Type::Int, operand.ty, node))?;
                let operation = operation(BinaryOp::Sub, operand.ty)
                    .map_err(|error| Error::new(ErrorImpl::from_lattice(error), node))?;

                Ok(TypedExpr {
                    ty: operand.ty,
                    kind: TypedExprKind::Negate {
                        operand: Box::new(operand),
                        zero,
                        operation,
                    },
                })
            }
        },
        Expr::Binary(binary) => {
            let node = expr.kind();
            let left = type_check_expr(type_checker, &binary.left)?;
            let right = type_check_expr(type_checker, &binary.right)?;

            if binary.operator.is_relational() {
                // Comparisons are numeric only
                if !left.ty.is_numeric() {
                    let expected = if right.ty.is_numeric() { right.ty } else { Type::Int };
                    return Err(mismatch(expected, left.ty, node));
                }
                if !right.ty.is_numeric() {
                    return Err(mismatch(left.ty, right.ty, node));
                }

                let common = widen(left.ty, right.ty).map_err(|_| mismatch(left.ty, right.ty, node))?;
                let predicate = predicate(binary.operator, common)
                    .map_err(|error| Error::new(ErrorImpl::from_lattice(error), node))?;

                Ok(TypedExpr {
                    kind: TypedExprKind::Compare {
                        left: coerce(left, common, node)?,
                        predicate,
                        right: coerce(right, common, node)?,
                    },
                    ty: Type::Boolean,
                })
            } else {
                // A void call has no value to combine
                if left.ty == Type::Void || right.ty == Type::Void {
                    let other = if left.ty == Type::Void { right.ty } else { left.ty };
                    let expected = if other == Type::Void { Type::Int } else { other };
                    return Err(mismatch(expected, Type::Void, node));
                }

                let common = widen(left.ty, right.ty).map_err(|_| mismatch(left.ty, right.ty, node))?;
                let operation = operation(binary.operator, common)
                    .map_err(|error| Error::new(ErrorImpl::from_lattice(error), node))?;

                Ok(TypedExpr {
                    kind: TypedExprKind::Arithmetic {
                        left: coerce(left, common, node)?,
                        operation,
                        right: coerce(right, common, node)?,
                    },
                    ty: common,
                })
            }
        }
        Expr::Call(call) => {
            let node = expr.kind();
            let (return_type, parameters) = match type_checker.scope.lookup(&call.name) {
                Some(Declaration::Function {
                    return_type,
                    parameters,
                }) => (*return_type, parameters.clone()),
                Some(Declaration::Variable { .. }) => {
                    return Err(Error::new(
                        ErrorImpl::NotAFunction {
                            name: call.name.clone(),
                        },
                        node,
                    ))
                }
                None => return Err(undeclared(&call.name, node)),
            };

            if call.arguments.len() != parameters.len() {
                return Err(Error::new(
                    ErrorImpl::ArityMismatch {
                        function: call.name.clone(),
                        expected: parameters.len(),
                        received: call.arguments.len(),
                    },
                    node,
                ));
            }

            let mut arguments = vec![];
            for (argument, parameter) in call.arguments.iter().zip(parameters) {
                let argument = type_check_expr(type_checker, argument)?;
                arguments.push(coerce(argument, parameter, node)?);
            }

            Ok(TypedExpr {
                kind: TypedExprKind::Call {
                    function: call.name.clone(),
                    arguments,
                },
                ty: return_type,
            })
        }
    }
}
