//! Semantic analysis (spec.md §4.1, §4.2).
//!
//! A straight-line driver rather than a trait object pipeline: resolve
//! agents, then constants (applying `-P` overrides and folding), then
//! function signatures, then walk every function body to resolve
//! expression types, variable identities, and call targets. A final
//! lowering pass inlines `environment.min`/`environment.max` access the
//! way the collaborator program's `leave_expr` rewrite hook does
//! (spec.md §9).

mod builtins;
mod fold;

use crate::ast::{
    AgentDecl, BinOp, Expr, ExprKind, ForKind, FuncRef, FunctionDecl, FunctionFlags, FunctionKind,
    Param, ReductionKind, Script, Stmt, StmtKind, TypeExpr, UnaryOp,
};
use crate::diagnostics::{CompileError, DiagnosticSink};
use crate::function_table::{FunctionSignature, FunctionTable};
use crate::scope::{Binding, Scope};
use crate::types::{AgentRef, Type};
use crate::value::ConstValue;
use crate::varid::VarIdSource;

pub fn analyze(
    script: &mut Script,
    params: &[(String, String)],
    sink: &mut DiagnosticSink,
) -> Result<(), CompileError> {
    let mut ids = VarIdSource::new();
    let mut table = FunctionTable::new();
    builtins::register(&mut table);

    resolve_agent_members(script, sink);

    let mut global = Scope::root();
    expose_agent_types(script, &mut global, &mut ids);
    resolve_consts(script, params, &mut ids, &mut global, sink);
    resolve_environment(script, &global, sink);
    register_functions(script, &mut table, &mut ids, sink);

    for idx in 0..script.functions.len() {
        check_function_body(script, idx, &table, &mut ids, &global, sink);
    }

    finalize_environment(script, &global, sink);
    check_main_present(script, sink);

    Ok(())
}

/// Declares every agent's name as an `AgentType` constant in the global
/// scope, so `count(AgentName)`/`sum(AgentName.member)` resolve the name
/// instead of failing as undeclared.
fn expose_agent_types(script: &Script, global: &mut Scope, ids: &mut VarIdSource) {
    for (idx, agent) in script.agents.iter().enumerate() {
        global.declare(
            agent.name.clone(),
            Binding {
                id: ids.fresh(),
                ty: Type::AgentType(AgentRef(idx as u32)),
                is_const: true,
                is_global: true,
                folded_value: None,
            },
        );
    }
}

fn resolve_agent_members(script: &mut Script, sink: &mut DiagnosticSink) {
    let agents_snapshot = script.agents.clone();
    for agent in script.agents.iter_mut() {
        for member in agent.members.iter_mut() {
            member.resolved_type = resolve_type_expr_static(&member.declared_type, &agents_snapshot, sink, &member.span);
        }
    }
}

/// Same as `resolve_type_expr` but against a snapshot, used where the
/// caller already holds a `&mut script.agents` borrow.
fn resolve_type_expr_static(
    te: &TypeExpr,
    agents: &[AgentDecl],
    sink: &mut DiagnosticSink,
    span: &crate::span::Span,
) -> Type {
    match te {
        TypeExpr::Void => Type::Void,
        TypeExpr::Bool => Type::Bool,
        TypeExpr::Int => Type::Int,
        TypeExpr::Float => Type::Float,
        TypeExpr::String => Type::String,
        TypeExpr::Vec2 => Type::Vec2,
        TypeExpr::Vec3 => Type::Vec3,
        TypeExpr::Named(name) => match agents.iter().position(|a| &a.name == name) {
            Some(i) => Type::concrete_agent(AgentRef(i as u32)),
            None => {
                sink.error(format!("unknown type '{name}'"), span.clone());
                Type::Invalid
            }
        },
        TypeExpr::Array(base) => Type::Array(Box::new(resolve_type_expr_static(base, agents, sink, span))),
    }
}

/// Rewrites an int-typed expression in place into a float-typed one, so
/// implicit promotion is visible in the AST rather than only in `Type`
/// (spec.md §4.1's promotion rule: literal rewrite, or a synthetic
/// `float(...)` CTOR wrap for anything that isn't a bare literal).
fn rewrite_int_to_float(expr: &mut Expr) {
    if let ExprKind::IntLit(i) = &*expr.kind {
        let i = *i;
        *expr.kind = ExprKind::FloatLit(i as f64);
        expr.ty = Type::Float;
        return;
    }
    let span = expr.span.clone();
    let old = std::mem::replace(expr, Expr::new(ExprKind::FloatLit(0.0), span.clone()));
    *expr = Expr::new(
        ExprKind::Call {
            name: "float".to_string(),
            args: vec![old],
        },
        span,
    );
    expr.ty = Type::Float;
}

fn resolve_consts(
    script: &mut Script,
    params: &[(String, String)],
    ids: &mut VarIdSource,
    global: &mut Scope,
    sink: &mut DiagnosticSink,
) {
    let agents_snapshot = script.agents.clone();
    for decl in script.consts.iter_mut() {
        let declared = decl
            .declared_type
            .as_ref()
            .map(|te| resolve_type_expr_static(te, &agents_snapshot, sink, &decl.span));
        let initial_ty = fold::eval_expression(&decl.value, global).map(|v| v.get_type());
        if matches!(declared, Some(Type::Float)) && matches!(initial_ty, Some(Type::Int)) {
            rewrite_int_to_float(&mut decl.value);
        }
        let folded = fold::eval_expression(&decl.value, global);
        let value_ty = folded.as_ref().map(|v| v.get_type());
        let mut resolved = declared.or(value_ty).unwrap_or(Type::Invalid);

        let mut folded = folded;
        if decl.is_param {
            if let Some((_, text)) = params.iter().find(|(name, _)| name == &decl.name) {
                match ConstValue::from_str_for(text, &resolved) {
                    Some(v) => {
                        resolved = v.get_type();
                        folded = Some(v);
                    }
                    None => sink.error(
                        format!("malformed param: missing \"=\" or bad value in '{text}'"),
                        decl.span.clone(),
                    ),
                }
            }
        }

        decl.resolved_type = resolved.clone();
        decl.id = Some(ids.fresh());
        global.declare(
            decl.name.clone(),
            Binding {
                id: decl.id.unwrap(),
                ty: resolved,
                is_const: true,
                is_global: true,
                folded_value: folded,
            },
        );
    }
}

fn resolve_environment(script: &Script, _global: &Scope, sink: &mut DiagnosticSink) {
    let env = &script.environment;
    if env.min.is_none() && env.max.is_none() && env.dimension.is_some() {
        sink.warning(
            "environment declares a dimension but no min/max bounds",
            env.span.clone().unwrap_or(0..0),
        );
    }
}

/// Runs after every function body has been checked, since `script.radiuses`
/// is only populated while walking `near(...)` loops (spec.md §4.3: "missing
/// granularity auto-inferred from max literal radius passed to any
/// near(...)"; "environment max.x >= min.x componentwise"; "position members
/// legal only when environment with matching dimension exists").
fn finalize_environment(script: &mut Script, global: &Scope, sink: &mut DiagnosticSink) {
    let span = script.environment.span.clone().unwrap_or(0..0);

    if script.environment.granularity.is_none() {
        if let Some(max_radius) = script.radiuses.iter().cloned().fold(None, |acc: Option<f64>, r| {
            Some(acc.map_or(r, |a| a.max(r)))
        }) {
            script.environment.granularity = Some(Expr::new(ExprKind::FloatLit(max_radius), span.clone()));
        }
    }

    let min_val = script.environment.min.as_ref().and_then(|e| fold::eval_expression(e, global));
    let max_val = script.environment.max.as_ref().and_then(|e| fold::eval_expression(e, global));

    let dimension = match (&min_val, &max_val) {
        (Some(ConstValue::Vec3(..)), _) | (_, Some(ConstValue::Vec3(..))) => Some(3u8),
        (Some(ConstValue::Vec2(..)), _) | (_, Some(ConstValue::Vec2(..))) => Some(2u8),
        _ => None,
    };

    if let (Some(min), Some(max)) = (&min_val, &max_val) {
        let ok = match (min, max) {
            (ConstValue::Vec2(min_x, min_y), ConstValue::Vec2(max_x, max_y)) => max_x >= min_x && max_y >= min_y,
            (ConstValue::Vec3(min_x, min_y, min_z), ConstValue::Vec3(max_x, max_y, max_z)) => {
                max_x >= min_x && max_y >= min_y && max_z >= min_z
            }
            _ => true,
        };
        if !ok {
            sink.error("environment max must be componentwise >= min", span.clone());
        }
    }

    for agent in script.agents.iter() {
        for member in agent.members.iter().filter(|m| m.is_position) {
            match dimension {
                // No environment min/max declared at all: nothing to check
                // a position member's dimension against.
                None => {}
                Some(dim) => {
                    let member_dim = if member.resolved_type.is_vec2() {
                        Some(2u8)
                    } else if member.resolved_type.is_vec3() {
                        Some(3u8)
                    } else {
                        None
                    };
                    if member_dim.is_some_and(|d| d != dim) {
                        sink.error(
                            format!(
                                "agent '{}' position member '{}' doesn't match the environment's dimension",
                                agent.name, member.name
                            ),
                            member.span.clone(),
                        );
                    }
                }
            }
        }
    }
}

fn register_functions(script: &mut Script, table: &mut FunctionTable, ids: &mut VarIdSource, sink: &mut DiagnosticSink) {
    let agents_snapshot = script.agents.clone();
    for (idx, func) in script.functions.iter_mut().enumerate() {
        let fref = crate::ast::FuncRef(idx as u32);

        for p in func.params.iter_mut() {
            p.resolved_type = resolve_type_expr_static(&p.declared_type, &agents_snapshot, sink, &p.span);
            p.id = Some(ids.fresh());
        }
        func.resolved_return_type = resolve_type_expr_static(&func.return_type, &agents_snapshot, sink, &func.span);

        func.flags = derive_flags(func);
        if func.name == "main" {
            func.kind = FunctionKind::Main;
            script.main = Some(fref);
        }

        let param_types: Vec<Type> = func.params.iter().map(|p| p.resolved_type.clone()).collect();
        table.insert(FunctionSignature {
            orig_name: func.name.clone(),
            mangled_name: func.name.clone(),
            param_types,
            return_type: func.resolved_return_type.clone(),
            flags: func.flags,
            decl_ref: Some(fref),
        });

        if matches!(func.kind, FunctionKind::Step | FunctionKind::SeqStep) {
            if let Some(agent_ref) = func.self_agent {
                script.agent_mut(agent_ref).steps.push(fref);
            }
        }
    }

    for decl in &script.functions {
        let dupes = table.by_name(&decl.name);
        if dupes.len() > 1 {
            let same_arity = dupes
                .iter()
                .filter(|s| s.param_types.len() == decl.params.len())
                .count();
            if same_arity > 1 {
                sink.warning(
                    format!("function '{}' has ambiguous overloads with the same arity", decl.name),
                    decl.span.clone(),
                );
            }
        }
    }
}

fn derive_flags(func: &FunctionDecl) -> FunctionFlags {
    match func.kind {
        FunctionKind::Main => FunctionFlags {
            main_only: true,
            ..Default::default()
        },
        FunctionKind::SeqStep => FunctionFlags {
            seq_step_only: true,
            ..Default::default()
        },
        FunctionKind::Step => FunctionFlags {
            step_only: true,
            ..Default::default()
        },
        FunctionKind::Plain => FunctionFlags::default(),
    }
}

struct BodyChecker<'a> {
    script: &'a mut Script,
    table: &'a FunctionTable,
    ids: &'a mut VarIdSource,
    sink: &'a mut DiagnosticSink,
    self_agent: Option<AgentRef>,
    in_step: bool,
    is_seq_step: bool,
    is_main: bool,
    return_type: Type,
    loop_depth: u32,
    conditional_depth: u32,
    accessed_members: Vec<(AgentRef, String)>,
    uses_runtime_removal: bool,
    runtime_added_agent: Option<AgentRef>,
    uses_rng: bool,
    add_called: bool,
}

fn check_function_body(
    script: &mut Script,
    idx: usize,
    table: &FunctionTable,
    ids: &mut VarIdSource,
    global: &Scope,
    sink: &mut DiagnosticSink,
) {
    let (self_agent, in_step, is_seq_step, is_main, return_type, mut body, self_name, param_bindings) = {
        let func = &script.functions[idx];
        let self_name = func.self_agent.map(|_| "self".to_string());
        let param_bindings: Vec<(String, Type, crate::varid::VarId)> = func
            .params
            .iter()
            .map(|p: &Param| (p.name.clone(), p.resolved_type.clone(), p.id.unwrap()))
            .collect();
        (
            func.self_agent,
            matches!(func.kind, FunctionKind::Step | FunctionKind::SeqStep),
            matches!(func.kind, FunctionKind::SeqStep),
            matches!(func.kind, FunctionKind::Main),
            func.resolved_return_type.clone(),
            func.body.clone(),
            self_name,
            param_bindings,
        )
    };

    let mut scope = Scope::child(global.clone());
    for (name, ty, id) in param_bindings {
        scope.declare(
            name,
            Binding {
                id,
                ty,
                is_const: false,
                is_global: false,
                folded_value: None,
            },
        );
    }
    if let (Some(agent_ref), Some(name)) = (self_agent, self_name) {
        scope.declare(
            name,
            Binding {
                id: ids.fresh(),
                ty: Type::concrete_agent(agent_ref),
                is_const: false,
                is_global: false,
                folded_value: None,
            },
        );
    }

    let mut checker = BodyChecker {
        script,
        table,
        ids,
        sink,
        self_agent,
        in_step,
        is_seq_step,
        is_main,
        return_type,
        loop_depth: 0,
        conditional_depth: 0,
        accessed_members: Vec::new(),
        uses_runtime_removal: false,
        runtime_added_agent: None,
        uses_rng: false,
        add_called: false,
    };
    checker.check_stmt(&mut body, &mut scope);

    let accessed_members = checker.accessed_members.clone();
    let uses_runtime_removal = checker.uses_runtime_removal;
    let runtime_added_agent = checker.runtime_added_agent;
    let uses_rng = checker.uses_rng;
    let func = &mut checker.script.functions[idx];
    func.body = body;
    if let Some(agent_ref) = func.step_metadata_agent_hint(&accessed_members) {
        func.step_metadata.accessed_agent = Some(agent_ref);
        func.step_metadata.accessed_members = accessed_members
            .into_iter()
            .filter(|(r, _)| *r == agent_ref)
            .map(|(_, m)| m)
            .collect();
    }
    func.step_metadata.uses_runtime_removal = uses_runtime_removal;
    func.step_metadata.runtime_added_agent = runtime_added_agent;
    func.step_metadata.uses_rng = uses_rng;
}

impl FunctionDecl {
    fn step_metadata_agent_hint(&self, accessed: &[(AgentRef, String)]) -> Option<AgentRef> {
        accessed.first().map(|(r, _)| *r)
    }
}

/// Recurses through member/array access to the assignment target's root
/// binding; an assignment is rejected iff that root is `is_const`.
fn assignment_target_is_const(expr: &Expr, scope: &Scope) -> bool {
    match &*expr.kind {
        ExprKind::Var { name, .. } => scope.lookup(name).map(|b| b.is_const).unwrap_or(false),
        ExprKind::Member { base, .. } => assignment_target_is_const(base, scope),
        ExprKind::ArrayAccess { base, .. } => assignment_target_is_const(base, scope),
        _ => false,
    }
}

impl<'a> BodyChecker<'a> {
    fn check_stmt(&mut self, stmt: &mut Stmt, scope: &mut Scope) {
        match &mut *stmt.kind {
            StmtKind::Expr(e) => {
                self.check_expr(e, scope);
            }
            StmtKind::Assign { target, value } => {
                self.check_expr(target, scope);
                self.check_expr(value, scope);
                if assignment_target_is_const(target, scope) {
                    self.sink.error("cannot assign to a const binding", target.span.clone());
                }
            }
            StmtKind::AssignOp { target, value, .. } => {
                self.check_expr(target, scope);
                self.check_expr(value, scope);
                if assignment_target_is_const(target, scope) {
                    self.sink.error("cannot assign to a const binding", target.span.clone());
                }
            }
            StmtKind::Block(stmts) => {
                for s in stmts.iter_mut() {
                    self.check_stmt(s, scope);
                }
            }
            StmtKind::VarDecl {
                name,
                id,
                declared_type,
                resolved_type,
                init,
                ..
            } => {
                let declared = declared_type.as_ref().map(|te| {
                    resolve_type_expr_static(te, &self.script.agents, self.sink, &stmt.span)
                });
                if init.is_none() {
                    self.sink.error(format!("'{name}' must be initialized"), stmt.span.clone());
                }
                let init_ty = init.as_mut().map(|e| self.check_expr(e, scope));
                *resolved_type = declared.clone().or(init_ty.clone()).unwrap_or(Type::Invalid);
                if let (Some(Type::Float), Some(Type::Int)) = (&declared, &init_ty) {
                    if let Some(e) = init.as_mut() {
                        rewrite_int_to_float(e);
                    }
                }
                let fresh = self.ids.fresh();
                *id = Some(fresh);
                let folded = init.as_ref().and_then(|e| fold::eval_expression(e, scope));
                scope.declare(
                    name.clone(),
                    Binding {
                        id: fresh,
                        ty: resolved_type.clone(),
                        is_const: false,
                        is_global: false,
                        folded_value: folded,
                    },
                );
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_ty = self.check_expr(cond, scope);
                if !cond_ty.is_bool() && !cond_ty.is_invalid() {
                    self.sink.error("'if' condition must be bool", cond.span.clone());
                }
                self.conditional_depth += 1;
                self.check_stmt(then_branch, scope);
                if let Some(e) = else_branch {
                    self.check_stmt(e, scope);
                }
                self.conditional_depth -= 1;
            }
            StmtKind::While { cond, body } => {
                let cond_ty = self.check_expr(cond, scope);
                if !cond_ty.is_bool() && !cond_ty.is_invalid() {
                    self.sink.error("'while' condition must be bool", cond.span.clone());
                }
                self.conditional_depth += 1;
                self.loop_depth += 1;
                self.check_stmt(body, scope);
                self.loop_depth -= 1;
                self.conditional_depth -= 1;
            }
            StmtKind::For {
                var_name,
                var_id,
                kind,
                body,
            } => {
                let elem_ty = match kind {
                    ForKind::Range { start, end } => {
                        self.check_expr(start, scope);
                        self.check_expr(end, scope);
                        Type::Int
                    }
                    ForKind::Array(arr) => {
                        let arr_ty = self.check_expr(arr, scope);
                        arr_ty.array_base().cloned().unwrap_or(Type::Invalid)
                    }
                    ForKind::Agent { agent_name, near } => {
                        let resolved_agent = self.script.find_agent(agent_name);
                        if resolved_agent.is_none() {
                            self.sink
                                .error(format!("unknown agent '{agent_name}'"), body.span.clone());
                        }
                        if let Some(near) = near {
                            self.check_expr(&mut near.center, scope);
                            self.check_expr(&mut near.radius, scope);
                            if let Some(r) = fold::eval_expression(&near.radius, scope).and_then(|v| v.as_float()) {
                                self.script.add_radius(r);
                            }
                        }
                        resolved_agent.map(Type::concrete_agent).unwrap_or(Type::Invalid)
                    }
                };
                let fresh = self.ids.fresh();
                *var_id = Some(fresh);
                scope.declare(
                    var_name.clone(),
                    Binding {
                        id: fresh,
                        ty: elem_ty,
                        is_const: false,
                        is_global: false,
                        folded_value: None,
                    },
                );
                self.conditional_depth += 1;
                self.loop_depth += 1;
                self.check_stmt(body, scope);
                self.loop_depth -= 1;
                self.conditional_depth -= 1;
            }
            StmtKind::Simulate(sim) => {
                self.check_expr(&mut sim.step_count, scope);
                if !self.is_main || self.conditional_depth != 0 {
                    self.sink
                        .error("'simulate' may only appear unconditionally at the top level of main", sim.span.clone());
                }
                self.check_simulate_steps(sim);
            }
            StmtKind::Return(Some(e)) => {
                let ty = self.check_expr(e, scope);
                if self.return_type.is_void() {
                    self.sink.error("'return' with a value in a void function", e.span.clone());
                } else if !ty.is_invalid() && !ty.is_promotable_to(&self.return_type) {
                    self.sink.error(
                        format!("'return' type doesn't match the declared return type '{}'", self.return_type),
                        e.span.clone(),
                    );
                }
            }
            StmtKind::Return(None) => {
                if !self.return_type.is_void() {
                    self.sink
                        .error(format!("'return' must produce a value of type '{}'", self.return_type), stmt.span.clone());
                }
            }
            StmtKind::Break => {
                if self.loop_depth == 0 {
                    self.sink.error("'break' outside a loop", stmt.span.clone());
                }
            }
            StmtKind::Continue => {
                if self.loop_depth == 0 {
                    self.sink.error("'continue' outside a loop", stmt.span.clone());
                }
            }
        }
    }

    /// Resolves `simulate(...)`'s step-name list against declared
    /// functions, enforcing that every name is `Step`/`SeqStep`-tagged and
    /// that at most one `SeqStep` appears, only as the last step.
    fn check_simulate_steps(&mut self, sim: &mut crate::ast::SimulateStmt) {
        let mut resolved = Vec::with_capacity(sim.step_names.len());
        let mut seq_step_seen_at: Option<usize> = None;
        for (i, name) in sim.step_names.iter().enumerate() {
            match self.script.functions.iter().position(|f| &f.name == name) {
                Some(idx) => {
                    let func = &self.script.functions[idx];
                    match func.kind {
                        FunctionKind::Step => {}
                        FunctionKind::SeqStep => seq_step_seen_at = Some(i),
                        _ => {
                            self.sink.error(
                                format!("'{name}' in simulate(...) is not a step function"),
                                sim.span.clone(),
                            );
                        }
                    }
                    resolved.push(FuncRef(idx as u32));
                }
                None => self.sink.error(format!("unknown step function '{name}'"), sim.span.clone()),
            }
        }
        if let Some(at) = seq_step_seen_at {
            if at != sim.step_names.len() - 1 {
                self.sink.error("a sequential step may only appear last in simulate(...)", sim.span.clone());
            }
        }
        let seq_step_count = sim
            .step_names
            .iter()
            .filter_map(|name| self.script.functions.iter().find(|f| &f.name == name))
            .filter(|f| f.kind == FunctionKind::SeqStep)
            .count();
        if seq_step_count > 1 {
            self.sink.error("simulate(...) may name at most one sequential step", sim.span.clone());
        }
        sim.resolved_steps = resolved;
    }

    fn check_expr(&mut self, expr: &mut Expr, scope: &Scope) -> Type {
        let ty = match &mut *expr.kind {
            ExprKind::BoolLit(_) => Type::Bool,
            ExprKind::IntLit(_) => Type::Int,
            ExprKind::FloatLit(_) => Type::Float,
            ExprKind::StringLit(_) => Type::String,
            ExprKind::Var { name, id } => match scope.lookup(name) {
                Some(b) => {
                    *id = Some(b.id);
                    b.ty.clone()
                }
                None => match self.self_member_type(name) {
                    Some(ty) => ty,
                    None => {
                        self.sink.error(format!("use of undeclared name '{name}'"), expr.span.clone());
                        Type::Invalid
                    }
                },
            },
            ExprKind::Unary { op, operand } => self.check_unary(*op, operand, scope, &expr.span),
            ExprKind::Binary { op, left, right } => self.check_binary(*op, left, right, scope, &expr.span),
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_ty = self.check_expr(cond, scope);
                if !cond_ty.is_bool() && !cond_ty.is_invalid() {
                    self.sink.error("ternary condition must be bool", cond.span.clone());
                }
                let t = self.check_expr(then_branch, scope);
                let e = self.check_expr(else_branch, scope);
                t.common_promotion(&e).unwrap_or_else(|| {
                    self.sink.error("ternary branches have incompatible types", expr.span.clone());
                    Type::Invalid
                })
            }
            ExprKind::Member { base, member } => {
                let base_ty = self.check_expr(base, scope);
                match &base_ty {
                    Type::AgentType(agent_ref) => {
                        let agent_ref = *agent_ref;
                        let agent = self.script.agent(agent_ref);
                        match agent.members.iter().find(|m| &m.name == member) {
                            Some(_) => Type::AgentMember(agent_ref, member.clone()),
                            None => {
                                self.sink.error(
                                    format!("agent '{}' has no member '{member}'", agent.name),
                                    expr.span.clone(),
                                );
                                Type::Invalid
                            }
                        }
                    }
                    Type::Agent(Some(agent_ref)) => {
                        let agent_ref = *agent_ref;
                        self.accessed_members.push((agent_ref, member.clone()));
                        let agent = self.script.agent(agent_ref);
                        agent
                            .members
                            .iter()
                            .find(|m| &m.name == member)
                            .map(|m| m.resolved_type.clone())
                            .unwrap_or_else(|| {
                                self.sink.error(
                                    format!("agent '{}' has no member '{member}'", agent.name),
                                    expr.span.clone(),
                                );
                                Type::Invalid
                            })
                    }
                    _ if base_ty.is_vec2() || base_ty.is_vec3() => Type::Float,
                    _ => {
                        if !base_ty.is_invalid() {
                            self.sink.error(format!("cannot access member '{member}' here"), expr.span.clone());
                        }
                        Type::Invalid
                    }
                }
            }
            ExprKind::EnvironmentAccess { .. } => Type::Vec2,
            ExprKind::ArrayAccess { base, index } => {
                let base_ty = self.check_expr(base, scope);
                let idx_ty = self.check_expr(index, scope);
                if !idx_ty.is_int() && !idx_ty.is_invalid() {
                    self.sink.error("array index must be int", index.span.clone());
                }
                base_ty.array_base().cloned().unwrap_or(Type::Invalid)
            }
            ExprKind::ArrayInit { elements } => {
                let mut elem_ty = Type::Invalid;
                for e in elements.iter_mut() {
                    let t = self.check_expr(e, scope);
                    if !elem_ty.is_invalid() && t != elem_ty && !t.is_promotable_to(&elem_ty) {
                        self.sink.error("array elements must share a type", e.span.clone());
                    }
                    if elem_ty.is_invalid() {
                        elem_ty = t;
                    }
                }
                Type::Array(Box::new(elem_ty))
            }
            ExprKind::NewArray { elem_type, size } => {
                let size_ty = self.check_expr(size, scope);
                if !size_ty.is_int() && !size_ty.is_invalid() {
                    self.sink.error("array size must be int", size.span.clone());
                }
                Type::Array(Box::new(resolve_type_expr_static(elem_type, &self.script.agents, self.sink, &expr.span)))
            }
            ExprKind::Call { name, args } => self.check_call(name, args, scope, &expr.span),
            ExprKind::AgentCreation { agent_name, args } => {
                for a in args.iter_mut() {
                    self.check_expr(a, scope);
                }
                match self.script.find_agent(agent_name) {
                    Some(r) => {
                        self.script.uses_agent_creation_in_step |= self.in_step;
                        Type::concrete_agent(r)
                    }
                    None => {
                        self.sink.error(format!("unknown agent '{agent_name}'"), expr.span.clone());
                        Type::Invalid
                    }
                }
            }
        };
        expr.ty = ty.clone();
        ty
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &mut Expr, scope: &Scope, span: &crate::span::Span) -> Type {
        let t = self.check_expr(operand, scope);
        match op {
            UnaryOp::Plus | UnaryOp::Minus => {
                if t.is_num() || t.is_vec() {
                    t
                } else {
                    self.invalid_op(span, "unary +/- requires a numeric or vector operand")
                }
            }
            UnaryOp::LogicalNot => {
                if t.is_bool() {
                    Type::Bool
                } else {
                    self.invalid_op(span, "'!' requires a bool operand")
                }
            }
            UnaryOp::BitwiseNot => {
                if t.is_int() {
                    Type::Int
                } else {
                    self.invalid_op(span, "'~' requires an int operand")
                }
            }
        }
    }

    fn check_binary(&mut self, op: BinOp, left: &mut Expr, right: &mut Expr, scope: &Scope, span: &crate::span::Span) -> Type {
        let l = self.check_expr(left, scope);
        let r = self.check_expr(right, scope);
        if l.is_invalid() || r.is_invalid() {
            return Type::Invalid;
        }
        match op {
            BinOp::Add | BinOp::Sub => {
                if l.is_vec() && l == r {
                    l
                } else if l.is_num() && r.is_num() {
                    self.promote_operands_if_needed(&l, &r, left, right)
                } else {
                    self.invalid_op(span, "operand types don't support this operator")
                }
            }
            BinOp::Mul => {
                if l.is_vec() && r.is_num() {
                    l
                } else if l.is_num() && r.is_vec() {
                    // Keep the vector operand on the left after analysis
                    // (spec.md §4.3: "swap so vector is on the left").
                    std::mem::swap(left, right);
                    r
                } else if l.is_num() && r.is_num() {
                    self.promote_operands_if_needed(&l, &r, left, right)
                } else {
                    self.invalid_op(span, "operand types don't support this operator")
                }
            }
            BinOp::Div => {
                if l.is_vec() && r.is_num() {
                    l
                } else if l.is_num() && r.is_num() {
                    self.promote_operands_if_needed(&l, &r, left, right)
                } else {
                    self.invalid_op(span, "'/' only supports vec/num or num/num")
                }
            }
            BinOp::Mod | BinOp::BitwiseAnd | BinOp::BitwiseOr | BinOp::BitwiseXor | BinOp::ShiftLeft | BinOp::ShiftRight => {
                if l.is_int() && r.is_int() {
                    Type::Int
                } else if matches!(op, BinOp::Mod) && l.is_num() && r.is_num() {
                    self.promote_operands_if_needed(&l, &r, left, right)
                } else {
                    self.invalid_op(span, "bitwise/modulo operators require int operands")
                }
            }
            BinOp::Eq | BinOp::Ne => {
                if l.is_num() && r.is_num() {
                    self.promote_operands_if_needed(&l, &r, left, right);
                    Type::Bool
                } else if l.common_promotion(&r).is_some() {
                    Type::Bool
                } else {
                    self.invalid_op(span, "operands are not comparable")
                }
            }
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                if l.is_num() && r.is_num() {
                    self.promote_operands_if_needed(&l, &r, left, right);
                    Type::Bool
                } else {
                    self.invalid_op(span, "relational operators require numeric operands")
                }
            }
            BinOp::And | BinOp::Or => {
                if l.is_bool() && r.is_bool() {
                    Type::Bool
                } else {
                    self.invalid_op(span, "'&&'/'||' require bool operands")
                }
            }
            BinOp::Range => Type::Int,
        }
    }

    /// Rewrites whichever operand is `Int` into a float-typed expression
    /// when the other is `Float`, so promotion is visible in the AST, not
    /// just in the computed `Type` (spec.md §4.3).
    fn promote_operands_if_needed(&mut self, l: &Type, r: &Type, left: &mut Expr, right: &mut Expr) -> Type {
        match (l, r) {
            (Type::Int, Type::Float) => {
                rewrite_int_to_float(left);
                Type::Float
            }
            (Type::Float, Type::Int) => {
                rewrite_int_to_float(right);
                Type::Float
            }
            _ => l.common_promotion(r).unwrap_or(Type::Float),
        }
    }

    /// A bare name that isn't in scope falls back to a member of `self`
    /// (spec.md §6: step bodies read/write their own agent's members
    /// without a `self.` prefix, unlike a neighbor reached through `near`).
    fn self_member_type(&self, name: &str) -> Option<Type> {
        let agent_ref = self.self_agent?;
        let agent = self.script.agent(agent_ref);
        agent.members.iter().find(|m| &m.name == name).map(|m| m.resolved_type.clone())
    }

    fn invalid_op(&mut self, span: &crate::span::Span, message: &str) -> Type {
        self.sink.error(message.to_string(), span.clone());
        Type::Invalid
    }

    fn check_call(&mut self, name: &str, args: &mut [Expr], scope: &Scope, span: &crate::span::Span) -> Type {
        if let Some(ctor) = ctor_type_name(name) {
            return self.check_ctor_call(ctor, name, args, scope, span);
        }

        match name {
            "near" => {
                // Legitimate `near(...)` syntax is consumed directly by
                // the `for`-loop grammar and never reaches here as a call.
                for a in args.iter_mut() {
                    self.check_expr(a, scope);
                }
                self.sink.error("'near' is only valid as a for-loop iterable", span.clone());
                Type::Invalid
            }
            "removeCurrent" => {
                for a in args.iter_mut() {
                    self.check_expr(a, scope);
                }
                if !args.is_empty() {
                    self.sink.error("'removeCurrent' takes no arguments", span.clone());
                }
                if !self.in_step || self.is_seq_step {
                    self.sink.error("'removeCurrent' may only be called from a parallel step", span.clone());
                }
                self.script.uses_runtime_removal = true;
                self.uses_runtime_removal = true;
                Type::Void
            }
            "add" => {
                let arg_types: Vec<Type> = args.iter_mut().map(|a| self.check_expr(a, scope)).collect();
                if !self.is_main && (!self.in_step || self.is_seq_step) {
                    self.sink.error("'add' may only be called from main or a parallel step", span.clone());
                }
                if self.in_step {
                    if self.add_called {
                        self.sink.error("at most one 'add' call is allowed per step", span.clone());
                    }
                    self.add_called = true;
                }
                let added = arg_types.first().and_then(|t| t.agent_ref());
                if added.is_none() {
                    self.sink.error("'add' requires an agent-typed argument", span.clone());
                }
                self.script.uses_runtime_addition = true;
                self.runtime_added_agent = added;
                Type::Void
            }
            "log_csv" => {
                for a in args.iter_mut() {
                    self.check_expr(a, scope);
                }
                self.script.uses_logging = true;
                Type::Void
            }
            "getLastExecTime" => {
                if !args.is_empty() {
                    self.sink.error("'getLastExecTime' takes no arguments", span.clone());
                }
                self.script.uses_timing = true;
                Type::Float
            }
            "count" => {
                let arg_types: Vec<Type> = args.iter_mut().map(|a| self.check_expr(a, scope)).collect();
                match arg_types.as_slice() {
                    [Type::AgentType(agent_ref)] => {
                        self.script.add_reduction(ReductionKind::Count, Type::AgentType(*agent_ref));
                        Type::Int
                    }
                    _ => {
                        self.sink.error("'count' takes a single agent type argument, e.g. count(AgentName)", span.clone());
                        Type::Invalid
                    }
                }
            }
            "sum" => {
                let arg_types: Vec<Type> = args.iter_mut().map(|a| self.check_expr(a, scope)).collect();
                match arg_types.as_slice() {
                    [Type::AgentMember(agent_ref, member)] => {
                        self.script.add_reduction(ReductionKind::Sum, Type::AgentMember(*agent_ref, member.clone()));
                        let agent = self.script.agent(*agent_ref);
                        agent
                            .members
                            .iter()
                            .find(|m| &m.name == member)
                            .map(|m| m.resolved_type.clone())
                            .unwrap_or(Type::Invalid)
                    }
                    _ => {
                        self.sink.error("'sum' takes a single member access, e.g. sum(AgentName.member)", span.clone());
                        Type::Invalid
                    }
                }
            }
            _ => self.check_user_or_table_call(name, args, scope, span),
        }
    }

    fn check_user_or_table_call(&mut self, name: &str, args: &mut [Expr], scope: &Scope, span: &crate::span::Span) -> Type {
        if let Some(decl) = self.script.functions.iter().find(|f| f.name == name) {
            if matches!(decl.kind, FunctionKind::Step | FunctionKind::SeqStep) {
                self.sink.error(format!("'{name}' is a step function and cannot be called directly"), span.clone());
                for a in args.iter_mut() {
                    self.check_expr(a, scope);
                }
                return Type::Invalid;
            }
        }

        let arg_types: Vec<Type> = args.iter_mut().map(|a| self.check_expr(a, scope)).collect();
        let matches = self.table.compatible_signatures(name, &arg_types);
        match matches.as_slice() {
            [] => {
                self.sink.error(format!("no matching overload for call to '{name}'"), span.clone());
                Type::Invalid
            }
            [single] => {
                if self.in_step && single.flags.main_only {
                    self.sink.error(format!("'{name}' may only be called from main"), span.clone());
                }
                if !self.in_step && (single.flags.step_only || single.flags.seq_step_only) {
                    self.sink.error(format!("'{name}' may only be called from a step function"), span.clone());
                }
                if matches!(name, "random" | "randomInt") {
                    self.script.uses_random = true;
                    self.uses_rng = true;
                }
                specialize_return(single, &arg_types)
            }
            _ => {
                self.sink.error(format!("ambiguous call to '{name}'"), span.clone());
                Type::Invalid
            }
        }
    }

    /// Constructor-call argument checking (spec.md §4.3): `bool`/`int`/
    /// `float` take exactly one bool-or-numeric argument; `float2` takes 1
    /// or 2 numeric arguments; `float3` takes 1 or 3.
    fn check_ctor_call(&mut self, ctor: Type, name: &str, args: &mut [Expr], scope: &Scope, span: &crate::span::Span) -> Type {
        let arg_types: Vec<Type> = args.iter_mut().map(|a| self.check_expr(a, scope)).collect();
        let all_num_or_bool = arg_types.iter().all(|t| t.is_num() || t.is_bool() || t.is_invalid());
        let ok = match &ctor {
            Type::Bool | Type::Int | Type::Float => arg_types.len() == 1 && all_num_or_bool,
            Type::Vec2 => (arg_types.len() == 1 || arg_types.len() == 2) && all_num_or_bool,
            Type::Vec3 => (arg_types.len() == 1 || arg_types.len() == 3) && all_num_or_bool,
            _ => false,
        };
        if !ok {
            self.sink.error(format!("'{name}' is not a valid constructor call"), span.clone());
            return Type::Invalid;
        }
        ctor
    }
}

/// Classifies a callee name as a primitive/vector constructor, tried
/// before function-table resolution (spec.md §4.3: "CTOR-first").
fn ctor_type_name(name: &str) -> Option<Type> {
    match name {
        "bool" => Some(Type::Bool),
        "int" => Some(Type::Int),
        "float" => Some(Type::Float),
        "float2" => Some(Type::Vec2),
        "float3" => Some(Type::Vec3),
        _ => None,
    }
}

fn specialize_return(sig: &FunctionSignature, arg_types: &[Type]) -> Type {
    if matches!(sig.return_type, Type::Array(ref base) if matches!(**base, Type::Agent(None))) {
        if let Some(concrete) = arg_types.first().and_then(|t| t.agent_ref()) {
            return Type::Array(Box::new(Type::concrete_agent(concrete)));
        }
    }
    sig.return_type.clone()
}

fn check_main_present(script: &Script, sink: &mut DiagnosticSink) {
    if script.main.is_none() {
        sink.error("script has no 'main' function", 0..0);
    }
}
