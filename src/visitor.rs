//! The paired enter/leave visitor used by the analyzer and the Flame
//! model builder (spec.md §4.2).
//!
//! Every node kind gets an `enter_*`/`leave_*` pair with a default no-op
//! body, mirroring the teacher's chumsky-adjacent convention of small
//! trait methods over one giant match. `leave_expr` is the one exception:
//! it returns `Option<Expr>` so a visitor can rewrite a node in place
//! (implicit int->float casts, environment.min/max inlining) by handing
//! back a replacement.

use crate::ast::{AgentDecl, ConstDecl, Expr, FunctionDecl, Script, Stmt};

pub trait Visitor {
    fn enter_script(&mut self, _script: &Script) {}
    fn leave_script(&mut self, _script: &mut Script) {}

    fn enter_agent(&mut self, _agent: &AgentDecl) {}
    fn leave_agent(&mut self, _agent: &mut AgentDecl) {}

    fn enter_function(&mut self, _func: &FunctionDecl) {}
    fn leave_function(&mut self, _func: &mut FunctionDecl) {}

    fn enter_const(&mut self, _decl: &ConstDecl) {}
    fn leave_const(&mut self, _decl: &mut ConstDecl) {}

    fn enter_stmt(&mut self, _stmt: &Stmt) {}
    fn leave_stmt(&mut self, _stmt: &mut Stmt) {}

    fn enter_expr(&mut self, _expr: &Expr) {}

    /// Returning `Some(replacement)` substitutes the visited node;
    /// returning `None` leaves it as walked (possibly mutated in place).
    fn leave_expr(&mut self, _expr: &mut Expr) -> Option<Expr> {
        None
    }
}

/// Walk every statement in `body`, then every expression inside each
/// statement, calling `enter_*`/`leave_*` around each. Constant-folding
/// and type-resolution visitors drive their logic entirely from these
/// callbacks rather than writing their own traversal.
pub fn walk_stmt<V: Visitor>(v: &mut V, stmt: &mut Stmt) {
    use crate::ast::StmtKind;

    v.enter_stmt(stmt);
    match &mut *stmt.kind {
        StmtKind::Expr(e) => walk_expr(v, e),
        StmtKind::Assign { target, value } => {
            walk_expr(v, target);
            walk_expr(v, value);
        }
        StmtKind::AssignOp { target, value, .. } => {
            walk_expr(v, target);
            walk_expr(v, value);
        }
        StmtKind::Block(stmts) => {
            for s in stmts {
                walk_stmt(v, s);
            }
        }
        StmtKind::VarDecl { init, .. } => {
            if let Some(init) = init {
                walk_expr(v, init);
            }
        }
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            walk_expr(v, cond);
            walk_stmt(v, then_branch);
            if let Some(else_branch) = else_branch {
                walk_stmt(v, else_branch);
            }
        }
        StmtKind::While { cond, body } => {
            walk_expr(v, cond);
            walk_stmt(v, body);
        }
        StmtKind::For { kind, body, .. } => {
            use crate::ast::ForKind;
            match kind {
                ForKind::Range { start, end } => {
                    walk_expr(v, start);
                    walk_expr(v, end);
                }
                ForKind::Array(arr) => walk_expr(v, arr),
                ForKind::Agent { near, .. } => {
                    if let Some(near) = near {
                        walk_expr(v, &mut near.center);
                        walk_expr(v, &mut near.radius);
                    }
                }
            }
            walk_stmt(v, body);
        }
        StmtKind::Simulate(sim) => walk_expr(v, &mut sim.step_count),
        StmtKind::Return(Some(e)) => walk_expr(v, e),
        StmtKind::Return(None) | StmtKind::Break | StmtKind::Continue => {}
    }
    v.leave_stmt(stmt);
}

pub fn walk_expr<V: Visitor>(v: &mut V, expr: &mut Expr) {
    use crate::ast::ExprKind;

    v.enter_expr(expr);
    match &mut *expr.kind {
        ExprKind::BoolLit(_)
        | ExprKind::IntLit(_)
        | ExprKind::FloatLit(_)
        | ExprKind::StringLit(_)
        | ExprKind::Var { .. }
        | ExprKind::EnvironmentAccess { .. } => {}
        ExprKind::Unary { operand, .. } => walk_expr(v, operand),
        ExprKind::Binary { left, right, .. } => {
            walk_expr(v, left);
            walk_expr(v, right);
        }
        ExprKind::Ternary {
            cond,
            then_branch,
            else_branch,
        } => {
            walk_expr(v, cond);
            walk_expr(v, then_branch);
            walk_expr(v, else_branch);
        }
        ExprKind::Member { base, .. } => walk_expr(v, base),
        ExprKind::ArrayAccess { base, index } => {
            walk_expr(v, base);
            walk_expr(v, index);
        }
        ExprKind::ArrayInit { elements } => {
            for e in elements {
                walk_expr(v, e);
            }
        }
        ExprKind::NewArray { size, .. } => walk_expr(v, size),
        ExprKind::Call { args, .. } => {
            for a in args {
                walk_expr(v, a);
            }
        }
        ExprKind::AgentCreation { args, .. } => {
            for a in args {
                walk_expr(v, a);
            }
        }
    }
    if let Some(replacement) = v.leave_expr(expr) {
        *expr = replacement;
    }
}
