//! Expression nodes (spec.md §3, "Expr" and operator tables).

use crate::span::Span;
use crate::types::Type;
use crate::varid::VarId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: Box<ExprKind>,
    pub span: Span,
    /// Filled in by the analyzer; `Type::Invalid` until then.
    pub ty: Type,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind: Box::new(kind),
            span,
            ty: Type::Invalid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    BoolLit(bool),
    IntLit(i64),
    FloatLit(f64),
    StringLit(String),
    /// A bare identifier as written by the user; `id` is resolved by the
    /// analyzer once the binding it refers to is known.
    Var {
        name: String,
        id: Option<VarId>,
    },
    Unary {
        op: UnaryOp,
        operand: Expr,
    },
    Binary {
        op: BinOp,
        left: Expr,
        right: Expr,
    },
    Ternary {
        cond: Expr,
        then_branch: Expr,
        else_branch: Expr,
    },
    /// `base.member`, e.g. `self.pos`, `environment.width`.
    Member {
        base: Expr,
        member: String,
    },
    /// `environment.min`/`environment.max`, inlined by the analyzer once
    /// resolved (spec.md §4.2's `leave_expr` rewrite hook).
    EnvironmentAccess {
        field: String,
    },
    ArrayAccess {
        base: Expr,
        index: Expr,
    },
    /// `{e1, e2, ...}` array literal.
    ArrayInit {
        elements: Vec<Expr>,
    },
    /// `new type[size]`.
    NewArray {
        elem_type: TypeExpr,
        size: Expr,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// `new AgentName(args...)` or the implicit seed-population form.
    AgentCreation {
        agent_name: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Plus,
    Minus,
    LogicalNot,
    BitwiseNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    /// `a..b`, only valid as the iterable of a `for` statement.
    Range,
}

/// The as-parsed, unresolved type syntax (spec.md §6). The analyzer
/// resolves this into a `Type` by looking up agent names in the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExpr {
    Void,
    Bool,
    Int,
    Float,
    String,
    Vec2,
    Vec3,
    Named(String),
    Array(Box<TypeExpr>),
}
