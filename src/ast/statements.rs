use crate::types::types::Type;

use super::{ast::NodeKind, expressions::Expr};

/// A sequence of statements. A block does not open a scope by itself; the
/// construct that owns it decides.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub body: Vec<Stmt>,
}

impl Block {
    pub fn new(body: Vec<Stmt>) -> Self {
        Block { body }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stmt> {
        self.body.iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// A nested `{ ... }` block; it gets its own frame.
    Block(Block),
    VarDecl(VarDecl),
    Expression(Expr),
    If(IfStmt),
    For(ForStmt),
    While(WhileStmt),
    Switch(SwitchStmt),
    Return(ReturnStmt),
}

/// `type name[d0][d1]... = initializer`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,
    pub initializer: Option<Expr>,
    /// One size expression per dimension; empty for scalars.
    pub dimensions: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub name: String,
    pub return_type: Type,
    pub parameters: Vec<VarDecl>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Block,
    pub else_block: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub declaration: VarDecl,
    pub condition: Expr,
    pub step: Expr,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    pub scrutinee: Expr,
    pub cases: Vec<Case>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub value: Expr,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
}

impl Stmt {
    pub fn kind(&self) -> NodeKind {
        match self {
            Stmt::Block(_) => NodeKind::Block,
            Stmt::VarDecl(_) => NodeKind::VarDecl,
            Stmt::Expression(_) => NodeKind::ExpressionStmt,
            Stmt::If(_) => NodeKind::If,
            Stmt::For(_) => NodeKind::For,
            Stmt::While(_) => NodeKind::While,
            Stmt::Switch(_) => NodeKind::Switch,
            Stmt::Return(_) => NodeKind::Return,
        }
    }

    pub fn expr(expression: Expr) -> Self {
        Stmt::Expression(expression)
    }

    pub fn if_then(condition: Expr, then_block: Block) -> Self {
        Stmt::If(IfStmt {
            condition,
            then_block,
            else_block: None,
        })
    }

    pub fn if_else(condition: Expr, then_block: Block, else_block: Block) -> Self {
        Stmt::If(IfStmt {
            condition,
            then_block,
            else_block: Some(else_block),
        })
    }

    pub fn for_loop(declaration: VarDecl, condition: Expr, step: Expr, body: Block) -> Self {
        Stmt::For(ForStmt {
            declaration,
            condition,
            step,
            body,
        })
    }

    pub fn while_loop(condition: Expr, body: Block) -> Self {
        Stmt::While(WhileStmt { condition, body })
    }

    pub fn switch(scrutinee: Expr, cases: Vec<Case>) -> Self {
        Stmt::Switch(SwitchStmt { scrutinee, cases })
    }

    pub fn ret(value: Expr) -> Self {
        Stmt::Return(ReturnStmt { value: Some(value) })
    }

    pub fn ret_void() -> Self {
        Stmt::Return(ReturnStmt { value: None })
    }
}

impl From<VarDecl> for Stmt {
    fn from(decl: VarDecl) -> Self {
        Stmt::VarDecl(decl)
    }
}

impl VarDecl {
    pub fn new(ty: Type, name: &str) -> Self {
        VarDecl {
            name: name.to_string(),
            ty,
            initializer: None,
            dimensions: Vec::new(),
        }
    }

    pub fn with_initializer(mut self, initializer: Expr) -> Self {
        self.initializer = Some(initializer);
        self
    }

    pub fn with_dimensions(mut self, dimensions: Vec<Expr>) -> Self {
        self.dimensions = dimensions;
        self
    }
}

impl FnDecl {
    pub fn new(return_type: Type, name: &str, parameters: Vec<VarDecl>, body: Block) -> Self {
        FnDecl {
            name: name.to_string(),
            return_type,
            parameters,
            body,
        }
    }
}

impl Case {
    pub fn new(value: Expr, body: Block) -> Self {
        Case { value, body }
    }
}
