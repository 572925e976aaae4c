//! End-to-end analyzer scenarios (spec.md §8).

use abmc::ast::{ExprKind, ReductionKind, Stmt, StmtKind};
use abmc::compile_to_script;
use abmc::types::Type;
use pretty_assertions::assert_eq;

const BOID_SOURCE: &str = r#"
    agent Boid {
        position float2 pos;
        float heading;
    }
    param float SPEED = 1.0;
    function void main() {
        simulate(10);
    }
"#;

/// Finds a `VarDecl`'s initializer by name, recursing into nested blocks.
/// Panics if the declaration isn't present: every scenario below that uses
/// this helper expects the declaration to exist.
fn find_var_init<'a>(stmt: &'a Stmt, name: &str) -> &'a abmc::ast::Expr {
    fn go<'a>(stmt: &'a Stmt, name: &str) -> Option<&'a abmc::ast::Expr> {
        match &*stmt.kind {
            StmtKind::Block(stmts) => stmts.iter().find_map(|s| go(s, name)),
            StmtKind::VarDecl { name: n, init, .. } if n == name => init.as_ref(),
            _ => None,
        }
    }
    go(stmt, name).unwrap_or_else(|| panic!("no VarDecl named '{name}' found"))
}

/// `CompileError::Analysis`'s `Display` only reports an error count, not
/// the individual messages, so scenarios that check for a specific
/// diagnostic inspect the collected messages directly.
fn error_text(err: &abmc::CompileError) -> String {
    match err {
        abmc::CompileError::Analysis { messages } => messages.join("\n"),
        other => other.to_string(),
    }
}

#[test]
fn s1_well_formed_script_compiles_without_errors() {
    let script = compile_to_script(BOID_SOURCE, &[]).expect("should compile");
    assert_eq!(script.agents.len(), 1);
    assert!(script.main.is_some());
}

#[test]
fn s2_param_override_replaces_the_folded_default() {
    let script = compile_to_script(BOID_SOURCE, &[("SPEED".to_string(), "2.5".to_string())])
        .expect("should compile");
    assert_eq!(script.consts[0].resolved_type, Type::Float);
}

#[test]
fn s3_missing_main_function_is_rejected() {
    let source = r#"
        agent Boid {
            position float2 pos;
        }
    "#;
    let err = compile_to_script(source, &[]).expect_err("should fail analysis");
    assert!(err.to_string().contains("error"));
}

#[test]
fn s4_reference_to_undeclared_name_is_rejected() {
    let source = r#"
        agent Boid {
            position float2 pos;
        }
        function void main() {
            int x = undeclaredThing;
            simulate(1);
        }
    "#;
    assert!(compile_to_script(source, &[]).is_err());
}

#[test]
fn s5_unknown_agent_type_reference_is_rejected() {
    let source = r#"
        agent Boid {
            position float2 pos;
        }
        function void main() {
            Predator p = new Predator();
            simulate(1);
        }
    "#;
    assert!(compile_to_script(source, &[]).is_err());
}

/// `simulate(N; f1, ..., fk)` resolves every named step against the
/// declared step functions, enforces that at most one sequential step is
/// named and that it comes last, and exposes the resolved order for the
/// Flame model to walk (spec.md §4.1, §4.2).
#[test]
fn s6_simulate_step_list_is_resolved_and_order_preserving() {
    let source = r#"
        agent Prey {
            position float2 pos;
        }
        agent Predator {
            position float2 pos;
        }
        Prey step {
            pos = pos;
        }
        Predator step seq {
            pos = pos;
        }
        function void main() {
            simulate(5; Prey, Predator);
        }
    "#;
    let script = compile_to_script(source, &[]).expect("should compile");
    let main = script.function(script.main.unwrap());
    let sim = find_simulate(&main.body).expect("main should contain a simulate(...) call");
    assert_eq!(sim.step_names, vec!["Prey".to_string(), "Predator".to_string()]);
    let resolved_names: Vec<&str> = sim
        .resolved_steps
        .iter()
        .map(|r| script.function(*r).name.as_str())
        .collect();
    assert_eq!(resolved_names, vec!["Prey", "Predator"]);
}

#[test]
fn s6_unknown_step_name_in_simulate_is_rejected() {
    let source = r#"
        agent Prey {
            position float2 pos;
        }
        Prey step {
            pos = pos;
        }
        function void main() {
            simulate(5; Ghost);
        }
    "#;
    let err = compile_to_script(source, &[]).expect_err("should fail analysis");
    assert!(error_text(&err).contains("unknown step function"));
}

#[test]
fn s6_non_step_function_named_in_simulate_is_rejected() {
    let source = r#"
        agent Prey {
            position float2 pos;
        }
        function int helper() {
            return 1;
        }
        function void main() {
            simulate(5; helper);
        }
    "#;
    let err = compile_to_script(source, &[]).expect_err("should fail analysis");
    assert!(error_text(&err).contains("not a step function"));
}

#[test]
fn s6_sequential_step_must_be_last() {
    let source = r#"
        agent Prey {
            position float2 pos;
        }
        agent Predator {
            position float2 pos;
        }
        Prey step seq {
            pos = pos;
        }
        Predator step {
            pos = pos;
        }
        function void main() {
            simulate(5; Prey, Predator);
        }
    "#;
    let err = compile_to_script(source, &[]).expect_err("should fail analysis");
    assert!(error_text(&err).contains("sequential step may only appear last"));
}

#[test]
fn s6_at_most_one_sequential_step_is_allowed() {
    let source = r#"
        agent Prey {
            position float2 pos;
        }
        agent Predator {
            position float2 pos;
        }
        Prey step seq {
            pos = pos;
        }
        Predator step seq {
            pos = pos;
        }
        function void main() {
            simulate(5; Prey, Predator);
        }
    "#;
    let err = compile_to_script(source, &[]).expect_err("should fail analysis");
    assert!(error_text(&err).contains("at most one sequential step"));
}

/// `count(AgentName)`/`sum(AgentName.member)` resolve the agent name as an
/// `AgentType` scope binding and record a reduction keyed by the concrete
/// member type, not a second positional argument (spec.md §4.1).
#[test]
fn s7_count_and_sum_resolve_agent_type_and_member() {
    let source = r#"
        agent Fish {
            position float2 pos;
            float mass;
        }
        function void main() {
            int n = count(Fish);
            float total = sum(Fish.mass);
            simulate(1);
        }
    "#;
    let script = compile_to_script(source, &[]).expect("should compile");
    let fish = script.find_agent("Fish").unwrap();
    assert!(script.reductions.contains(&(ReductionKind::Count, Type::AgentType(fish))));
    assert!(script
        .reductions
        .contains(&(ReductionKind::Sum, Type::AgentMember(fish, "mass".to_string()))));
}

#[test]
fn s7_sum_over_unknown_member_is_rejected() {
    let source = r#"
        agent Fish {
            position float2 pos;
        }
        function void main() {
            float total = sum(Fish.mass);
            simulate(1);
        }
    "#;
    assert!(compile_to_script(source, &[]).is_err());
}

/// `num * vec` is rewritten so the vector operand is always the AST's
/// left child, matching `vec * num`'s shape (spec.md §4.3).
#[test]
fn s8_scalar_times_vector_swaps_operands_in_place() {
    let source = r#"
        agent Fish {
            position float2 pos;
        }
        function void main() {
            float2 p = float2(1.0, 2.0);
            float2 v = 2.0 * p;
            simulate(1);
        }
    "#;
    let script = compile_to_script(source, &[]).expect("should compile");
    let main = script.function(script.main.unwrap());
    let init = find_var_init(&main.body, "v");
    match &*init.kind {
        ExprKind::Binary { left, right, .. } => {
            assert!(matches!(&*left.kind, ExprKind::Var { name, .. } if name == "p"));
            assert!(matches!(&*right.kind, ExprKind::FloatLit(f) if (*f - 2.0).abs() < f64::EPSILON));
        }
        other => panic!("expected a binary multiply, got {other:?}"),
    }
}

/// A `float`-declared const initialized from an int literal has that
/// literal rewritten to a float in place, not just retyped (spec.md §4.1).
#[test]
fn s9_int_literal_promotes_to_float_literal_in_place() {
    let source = r#"
        const float THRESHOLD = 1;
        agent Fish {
            position float2 pos;
        }
        function void main() {
            simulate(1);
        }
    "#;
    let script = compile_to_script(source, &[]).expect("should compile");
    assert_eq!(script.consts[0].resolved_type, Type::Float);
    match &*script.consts[0].value.kind {
        ExprKind::FloatLit(f) => assert_eq!(*f, 1.0),
        other => panic!("expected the int literal to be rewritten to a float, got {other:?}"),
    }
}

/// Missing `environment.granularity` is auto-inferred as the largest
/// literal radius passed to any `near(...)` call in the script; an
/// explicit environment with mismatched min/max is rejected (spec.md §4.1).
#[test]
fn s10_environment_granularity_infers_from_near_radius() {
    let source = r#"
        environment {
            min = float2(0.0, 0.0);
            max = float2(10.0, 10.0);
        }
        agent Fish {
            position float2 pos;
        }
        Fish step {
            for (other : near(self, 0.5, Fish)) {
                pos = pos;
            }
            for (other : near(self, 0.8, Fish)) {
                pos = pos;
            }
        }
        function void main() {
            simulate(1; Fish);
        }
    "#;
    let script = compile_to_script(source, &[]).expect("should compile");
    let granularity = script.environment.granularity.as_ref().expect("granularity should be inferred");
    match &*granularity.kind {
        ExprKind::FloatLit(f) => assert_eq!(*f, 0.8),
        other => panic!("expected a float literal, got {other:?}"),
    }
}

#[test]
fn s10_environment_max_below_min_is_rejected() {
    let source = r#"
        environment {
            min = float2(10.0, 10.0);
            max = float2(0.0, 0.0);
        }
        agent Fish {
            position float2 pos;
        }
        function void main() {
            simulate(1);
        }
    "#;
    let err = compile_to_script(source, &[]).expect_err("should fail analysis");
    assert!(error_text(&err).contains("componentwise"));
}

#[test]
fn s10_position_member_dimension_must_match_environment() {
    let source = r#"
        environment {
            min = float2(0.0, 0.0);
            max = float2(10.0, 10.0);
        }
        agent Fish {
            position float3 pos;
        }
        function void main() {
            simulate(1);
        }
    "#;
    let err = compile_to_script(source, &[]).expect_err("should fail analysis");
    assert!(error_text(&err).contains("dimension"));
}

#[test]
fn s11_assignment_to_const_binding_is_rejected() {
    let source = r#"
        const float THRESHOLD = 1.0;
        agent Fish {
            position float2 pos;
        }
        function void main() {
            THRESHOLD = 2.0;
            simulate(1);
        }
    "#;
    let err = compile_to_script(source, &[]).expect_err("should fail analysis");
    assert!(error_text(&err).contains("const"));
}

#[test]
fn s11_break_outside_a_loop_is_rejected() {
    let source = r#"
        agent Fish {
            position float2 pos;
        }
        function void main() {
            break;
            simulate(1);
        }
    "#;
    let err = compile_to_script(source, &[]).expect_err("should fail analysis");
    assert!(error_text(&err).contains("'break' outside a loop"));
}

#[test]
fn s12_calling_a_step_function_directly_is_rejected() {
    let source = r#"
        agent Fish {
            position float2 pos;
        }
        Fish step {
            pos = pos;
        }
        function void main() {
            Fish();
            simulate(1; Fish);
        }
    "#;
    let err = compile_to_script(source, &[]).expect_err("should fail analysis");
    assert!(error_text(&err).contains("cannot be called directly"));
}

#[test]
fn s12_vec2_constructor_call_folds_to_a_vector() {
    let source = r#"
        const float2 ORIGIN = float2(1.0, 2.0);
        agent Fish {
            position float2 pos;
        }
        function void main() {
            simulate(1);
        }
    "#;
    let script = compile_to_script(source, &[]).expect("should compile");
    assert_eq!(script.consts[0].resolved_type, Type::Vec2);
}

fn find_simulate(stmt: &Stmt) -> Option<&abmc::ast::SimulateStmt> {
    match &*stmt.kind {
        StmtKind::Simulate(sim) => Some(sim),
        StmtKind::Block(stmts) => stmts.iter().find_map(find_simulate),
        _ => None,
    }
}
