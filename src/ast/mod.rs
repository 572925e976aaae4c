//! The abstract syntax tree (spec.md §3).
//!
//! Nodes are grouped the way the source language groups them: expressions,
//! statements, and top-level declarations, with `Script` as the arena root
//! that owns every `AgentDecl`/`FunctionDecl` by index (spec.md §9).

pub mod decl;
pub mod expr;
pub mod stmt;

pub use decl::{
    AgentDecl, AgentMember, ConstDecl, EnvironmentDecl, FuncRef, FunctionDecl, FunctionFlags,
    FunctionKind, OutVar, Param, ReductionKind, Script, SimulateStmt, StepMetadata,
};
pub use expr::{BinOp, Expr, ExprKind, TypeExpr, UnaryOp};
pub use stmt::{ForKind, NearFilter, Stmt, StmtKind};
