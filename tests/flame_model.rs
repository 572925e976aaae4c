//! Flame model derivation (spec.md §4.2).

use abmc::compile_to_script;
use abmc::flame::FlameModel;
use pretty_assertions::assert_eq;

const PREDATOR_PREY_SOURCE: &str = r#"
    agent Prey {
        position float2 pos;
        bool alive;
    }
    agent Predator {
        position float2 pos;
    }
    Prey step {
        pos = pos;
    }
    Predator step {
        for (p : near(self, 1.0, Prey)) {
            pos = pos;
        }
    }
    function void main() {
        simulate(5; Prey, Predator);
    }
"#;

#[test]
fn every_agent_gets_a_start_state() {
    let script = compile_to_script(PREDATOR_PREY_SOURCE, &[]).expect("should compile");
    let model = FlameModel::generate_from_script(&script);
    assert_eq!(model.agents.len(), 2);
    for agent in &model.agents {
        assert_eq!(agent.states[0].name, "start");
    }
}

#[test]
fn state_names_increase_monotonically_per_agent() {
    let script = compile_to_script(PREDATOR_PREY_SOURCE, &[]).expect("should compile");
    let model = FlameModel::generate_from_script(&script);
    for agent in &model.agents {
        let names: Vec<&str> = agent.states.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names[0], "start");
        for (i, name) in names.iter().enumerate().skip(1) {
            assert_eq!(*name, i.to_string());
        }
    }
}
