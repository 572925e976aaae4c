//! Flame model derivation (spec.md §4.2).
//!
//! Turns an analyzed [`Script`] into a backend-agnostic description of
//! per-agent state machines and the typed messages agents exchange,
//! mirroring the collaborator program's `FlameModel::generate`: each
//! agent gets a monotonically numbered state chain (`"start"`, `"1"`,
//! `"2"`, ...), and each step function becomes one or two generated
//! functions depending on whether it reads another agent's position.

mod wire;

#[cfg(feature = "graph")]
pub mod graph;

use crate::ast::{FuncRef, ReductionKind, Script, SimulateStmt, Stmt, StmtKind};
use crate::types::{AgentRef, Type};
pub use wire::{unpack_members, WireField};

#[derive(Debug, Clone, PartialEq)]
pub struct FlameState {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub name: String,
    /// Always includes the broadcasting agent's position member first,
    /// then whatever members the consuming step actually reads
    /// (spec.md §4.2).
    pub fields: Vec<WireField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Func {
    pub name: String,
    pub step: FuncRef,
    /// The companion `_gen` function emitted before a step that reads a
    /// neighboring agent's state through `near`, matching the ordering
    /// the collaborator program's backend expects: generator first, then
    /// the step itself.
    pub is_generator: bool,
}

#[derive(Debug, Clone)]
pub struct AgentFlame {
    pub agent: AgentRef,
    pub states: Vec<FlameState>,
    pub funcs: Vec<Func>,
}

#[derive(Debug, Clone)]
pub struct FlameModel {
    pub agents: Vec<AgentFlame>,
    pub messages: Vec<Message>,
    pub reductions: Vec<(ReductionKind, Type)>,
}

impl FlameModel {
    /// Deterministic, depending only on the step order named in
    /// `simulate(...)` and the analyzer's `accessedAgent`/`accessedMembers`
    /// annotations (spec.md §4.2).
    pub fn generate_from_script(script: &Script) -> FlameModel {
        let mut agents: Vec<AgentFlame> = script
            .agents
            .iter()
            .enumerate()
            .map(|(idx, _)| AgentFlame {
                agent: AgentRef(idx as u32),
                states: vec![FlameState { name: "start".to_string() }],
                funcs: Vec::new(),
            })
            .collect();
        let mut messages = Vec::new();

        for step_ref in simulate_step_order(script) {
            let step = script.function(step_ref);

            if let Some(accessed_agent) = step.step_metadata.accessed_agent {
                let accessed = script.agent(accessed_agent);
                let message_name = format!("{}_message", step.name);
                if !messages.iter().any(|m: &Message| m.name == message_name) {
                    messages.push(Message {
                        name: message_name.clone(),
                        fields: unpack_members(accessed, &step.step_metadata.accessed_members),
                    });
                }
                push_func(
                    &mut agents,
                    accessed_agent,
                    Func {
                        name: format!("{}_gen", step.name),
                        step: step_ref,
                        is_generator: true,
                    },
                );
            }

            if let Some(self_agent) = step.self_agent {
                push_func(
                    &mut agents,
                    self_agent,
                    Func {
                        name: step.name.clone(),
                        step: step_ref,
                        is_generator: false,
                    },
                );
            }
        }

        FlameModel {
            agents,
            messages,
            reductions: script.reductions.clone(),
        }
    }
}

/// Appends one state and the given function to a single agent's chain,
/// advancing only that agent forward by exactly one state.
fn push_func(agents: &mut [AgentFlame], agent_ref: AgentRef, func: Func) {
    let flame = &mut agents[agent_ref.0 as usize];
    let next = flame.states.len();
    flame.funcs.push(func);
    flame.states.push(FlameState { name: next.to_string() });
}

/// The step functions named in `main`'s `simulate(...)` call, in
/// declared order. Empty if `main`'s body has no `simulate` statement
/// (or no named steps), in which case every agent keeps just its
/// `"start"` state.
fn simulate_step_order(script: &Script) -> Vec<FuncRef> {
    let Some(main_ref) = script.main else {
        return Vec::new();
    };
    let main = script.function(main_ref);
    find_simulate(&main.body).map(|sim| sim.resolved_steps.clone()).unwrap_or_default()
}

fn find_simulate(stmt: &Stmt) -> Option<&SimulateStmt> {
    match &*stmt.kind {
        StmtKind::Simulate(sim) => Some(sim),
        StmtKind::Block(stmts) => stmts.iter().find_map(find_simulate),
        _ => None,
    }
}
