//! Statement nodes (spec.md §3, "Stmt").

use crate::ast::expr::{Expr, TypeExpr};
use crate::span::Span;
use crate::types::Type;
use crate::varid::VarId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: Box<StmtKind>,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self {
            kind: Box::new(kind),
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    Expr(Expr),
    Assign {
        target: Expr,
        value: Expr,
    },
    /// `+=`, `-=`, ... desugared lazily by the analyzer, kept distinct here
    /// so diagnostics can name the original operator.
    AssignOp {
        op: crate::ast::expr::BinOp,
        target: Expr,
        value: Expr,
    },
    Block(Vec<Stmt>),
    VarDecl {
        name: String,
        id: Option<VarId>,
        is_const: bool,
        declared_type: Option<TypeExpr>,
        resolved_type: Type,
        init: Option<Expr>,
    },
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    For {
        var_name: String,
        var_id: Option<VarId>,
        kind: ForKind,
        body: Box<Stmt>,
    },
    /// `simulate` block inside `main`; see `decl::SimulateStmt` for the
    /// parsed parameter list.
    Simulate(crate::ast::decl::SimulateStmt),
    Return(Option<Expr>),
    Break,
    Continue,
}

/// What a `for` loop iterates over: a plain numeric range, an array, or
/// an agent population (with an optional `near` filter), matching the
/// three `for` forms in spec.md §6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ForKind {
    Range {
        start: Expr,
        end: Expr,
    },
    Array(Expr),
    /// `for (a : AgentName)` or `for (a : near(self, radius, AgentName))`.
    Agent {
        agent_name: String,
        near: Option<NearFilter>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearFilter {
    pub center: Expr,
    pub radius: Expr,
}
