use crate::types::types::{BinaryOp, Literal};

use super::ast::NodeKind;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Var(VarExpr),
    Assign(AssignExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Call(CallExpr),
}

/// A variable read, optionally indexed: `a`, `m[i][j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct VarExpr {
    pub name: String,
    pub indices: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignExpr {
    pub target: VarExpr,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub operator: UnaryOp,
    pub operand: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub operator: BinaryOp,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub name: String,
    pub arguments: Vec<Expr>,
}

impl Expr {
    pub fn kind(&self) -> NodeKind {
        match self {
            Expr::Literal(_) => NodeKind::Literal,
            Expr::Var(_) => NodeKind::Var,
            Expr::Assign(_) => NodeKind::Assign,
            Expr::Unary(_) => NodeKind::Unary,
            Expr::Binary(_) => NodeKind::Binary,
            Expr::Call(_) => NodeKind::Call,
        }
    }

    pub fn short(value: i16) -> Self {
        Expr::Literal(Literal::Short(value))
    }

    pub fn int(value: i32) -> Self {
        Expr::Literal(Literal::Int(value))
    }

    pub fn long(value: i64) -> Self {
        Expr::Literal(Literal::Long(value))
    }

    pub fn float(value: f32) -> Self {
        Expr::Literal(Literal::Float(value))
    }

    pub fn double(value: f64) -> Self {
        Expr::Literal(Literal::Double(value))
    }

    pub fn boolean(value: bool) -> Self {
        Expr::Literal(Literal::Boolean(value))
    }

    pub fn char(value: u8) -> Self {
        Expr::Literal(Literal::Char(value))
    }

    pub fn string(value: &str) -> Self {
        Expr::Literal(Literal::String(value.to_string()))
    }

    pub fn var(name: &str) -> Self {
        Expr::Var(VarExpr::new(name))
    }

    pub fn index(name: &str, indices: Vec<Expr>) -> Self {
        Expr::Var(VarExpr::indexed(name, indices))
    }

    pub fn assign(target: VarExpr, value: Expr) -> Self {
        Expr::Assign(AssignExpr {
            target,
            value: Box::new(value),
        })
    }

    /// `name = value` for a scalar target.
    pub fn assign_to(name: &str, value: Expr) -> Self {
        Expr::assign(VarExpr::new(name), value)
    }

    pub fn negate(operand: Expr) -> Self {
        Expr::Unary(UnaryExpr {
            operator: UnaryOp::Negate,
            operand: Box::new(operand),
        })
    }

    pub fn binary(left: Expr, operator: BinaryOp, right: Expr) -> Self {
        Expr::Binary(BinaryExpr {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    pub fn call(name: &str, arguments: Vec<Expr>) -> Self {
        Expr::Call(CallExpr {
            name: name.to_string(),
            arguments,
        })
    }
}

impl VarExpr {
    pub fn new(name: &str) -> Self {
        VarExpr {
            name: name.to_string(),
            indices: Vec::new(),
        }
    }

    pub fn indexed(name: &str, indices: Vec<Expr>) -> Self {
        VarExpr {
            name: name.to_string(),
            indices,
        }
    }
}
