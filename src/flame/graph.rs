//! Derived `petgraph` view over a [`super::FlameModel`]'s per-agent state
//! chains, gated behind the `graph` feature (spec.md §9, ambient
//! tooling). Nodes are states, edges are the step function that moves an
//! agent from one state to the next.

use super::FlameModel;
use petgraph::graph::{DiGraph, NodeIndex};

#[derive(Debug, Clone, PartialEq)]
pub struct StateNode {
    pub agent_name: String,
    pub state_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepEdge {
    pub func_name: String,
}

pub type StateGraph = DiGraph<StateNode, StepEdge>;

/// Build one linear chain per agent: `start -> 1 -> 2 -> ...`, labeling
/// each edge with the step function that performs the transition.
pub fn build(model: &FlameModel, agent_name: impl Fn(crate::types::AgentRef) -> String) -> StateGraph {
    let mut graph = StateGraph::new();

    for agent in &model.agents {
        let name = agent_name(agent.agent);
        let mut nodes: Vec<NodeIndex> = Vec::with_capacity(agent.states.len());
        for state in &agent.states {
            nodes.push(graph.add_node(StateNode {
                agent_name: name.clone(),
                state_name: state.name.clone(),
            }));
        }
        let steps: Vec<_> = agent.funcs.iter().filter(|f| !f.is_generator).collect();
        for (i, func) in steps.iter().enumerate() {
            if i + 1 < nodes.len() {
                graph.add_edge(
                    nodes[i],
                    nodes[i + 1],
                    StepEdge {
                        func_name: func.name.clone(),
                    },
                );
            }
        }
    }

    graph
}
