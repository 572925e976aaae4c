//! Parser coverage over the source language surface (spec.md §6).

use abmc::parser;
use pretty_assertions::assert_eq;

#[test]
fn parses_an_agent_with_a_position_member() {
    let source = r#"
        agent Boid {
            position float2 pos;
            float heading;
        }
    "#;
    let script = parser::parse(source).expect("should parse");
    assert_eq!(script.agents.len(), 1);
    assert_eq!(script.agents[0].name, "Boid");
    assert!(script.agents[0].members.iter().any(|m| m.is_position));
}

#[test]
fn parses_const_and_param_declarations() {
    let source = r#"
        const float SPEED = 1.5;
        param int COUNT = 100;
    "#;
    let script = parser::parse(source).expect("should parse");
    assert_eq!(script.consts.len(), 2);
    assert!(!script.consts[0].is_param);
    assert!(script.consts[1].is_param);
}

#[test]
fn parses_a_step_function_on_an_agent() {
    let source = r#"
        agent Boid {
            position float2 pos;
        }
        Boid step {
            pos = pos + pos;
        }
        function void main() {
            simulate(10);
        }
    "#;
    let script = parser::parse(source).expect("should parse");
    assert!(script.functions.iter().any(|f| f.name == "Boid"));
}

#[test]
fn reports_a_parse_error_with_a_line_number() {
    let source = "agent {\n";
    let err = parser::parse(source).expect_err("should fail to parse");
    assert!(err.to_string().contains("line"));
}
