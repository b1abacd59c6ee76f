use std::fmt::Display;

use super::statements::{FnDecl, VarDecl};

/// Node kinds, used to give errors and log lines their context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Program,
    VarDecl,
    FnDecl,
    Block,
    ExpressionStmt,
    If,
    For,
    While,
    Switch,
    Case,
    Return,
    Literal,
    Var,
    Assign,
    Unary,
    Binary,
    Call,
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NodeKind::Program => "program",
            NodeKind::VarDecl => "variable declaration",
            NodeKind::FnDecl => "function declaration",
            NodeKind::Block => "block",
            NodeKind::ExpressionStmt => "expression statement",
            NodeKind::If => "if statement",
            NodeKind::For => "for statement",
            NodeKind::While => "while statement",
            NodeKind::Switch => "switch statement",
            NodeKind::Case => "case",
            NodeKind::Return => "return statement",
            NodeKind::Literal => "literal",
            NodeKind::Var => "variable",
            NodeKind::Assign => "assignment",
            NodeKind::Unary => "unary expression",
            NodeKind::Binary => "binary expression",
            NodeKind::Call => "call",
        };
        write!(f, "{}", name)
    }
}

/// Top-level declarations.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Variable(VarDecl),
    Function(FnDecl),
}

impl Decl {
    pub fn kind(&self) -> NodeKind {
        match self {
            Decl::Variable(_) => NodeKind::VarDecl,
            Decl::Function(_) => NodeKind::FnDecl,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Decl::Variable(decl) => &decl.name,
            Decl::Function(decl) => &decl.name,
        }
    }
}

impl From<VarDecl> for Decl {
    fn from(decl: VarDecl) -> Self {
        Decl::Variable(decl)
    }
}

impl From<FnDecl> for Decl {
    fn from(decl: FnDecl) -> Self {
        Decl::Function(decl)
    }
}
