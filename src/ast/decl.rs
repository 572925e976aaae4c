//! Top-level declarations and the `Script` arena root (spec.md §3, §4.1).

use crate::ast::expr::{Expr, TypeExpr};
use crate::ast::stmt::Stmt;
use crate::span::Span;
use crate::types::{AgentRef, Type};
use crate::varid::VarId;
use serde::{Deserialize, Serialize};

/// Index of a function declaration within `Script::functions`, mirroring
/// `AgentRef` so functions avoid `Rc<RefCell<...>>` the same way agents do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FuncRef(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionKind {
    /// A plain, freestanding function.
    Plain,
    /// An agent step function: `AgentName step { ... }`.
    Step,
    /// An agent step function restricted to sequential execution
    /// (declared `step seq` in source, spec.md §6).
    SeqStep,
    /// The special `main` function.
    Main,
}

/// Constraints on where a function may legally be called from
/// (spec.md §4.1: `MAIN_ONLY`, `STEP_ONLY`, `SEQ_STEP_ONLY`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionFlags {
    pub main_only: bool,
    pub step_only: bool,
    pub seq_step_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub id: Option<VarId>,
    pub declared_type: TypeExpr,
    pub resolved_type: Type,
    pub span: Span,
}

/// An `out` parameter to a step function producing a new agent
/// (spec.md §6, agent creation from within a step).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutVar {
    pub name: String,
    pub id: Option<VarId>,
    pub agent_name: String,
    pub agent_ref: Option<AgentRef>,
    pub span: Span,
}

/// Extra bookkeeping attached to step functions by the analyzer while
/// building the Flame model (spec.md §4.2): which agent's members this
/// step reads via `near`/position access, used to size the generated
/// Flame message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepMetadata {
    pub accessed_agent: Option<AgentRef>,
    pub accessed_members: Vec<String>,
    /// Set when this step calls `removeCurrent()`.
    pub uses_runtime_removal: bool,
    /// Set when this step calls `add(...)`: which agent kind it adds.
    pub runtime_added_agent: Option<AgentRef>,
    /// Set when this step calls `random`/`randomInt`.
    pub uses_rng: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub kind: FunctionKind,
    pub flags: FunctionFlags,
    /// Set for `Step`/`SeqStep` kinds: the agent this function is declared on.
    pub self_agent: Option<AgentRef>,
    pub params: Vec<Param>,
    pub out_vars: Vec<OutVar>,
    pub return_type: TypeExpr,
    pub resolved_return_type: Type,
    pub body: Stmt,
    pub step_metadata: StepMetadata,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMember {
    pub name: String,
    pub declared_type: TypeExpr,
    pub resolved_type: Type,
    /// Set on the member that represents spatial position (`position`
    /// keyword in source); drives the Flame message's always-present
    /// position field (spec.md §4.2).
    pub is_position: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDecl {
    pub name: String,
    pub members: Vec<AgentMember>,
    /// Step functions declared on this agent, in source order.
    pub steps: Vec<FuncRef>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstDecl {
    pub name: String,
    pub id: Option<VarId>,
    pub declared_type: Option<TypeExpr>,
    pub resolved_type: Type,
    pub value: Expr,
    /// True when declared with `param` rather than `const`: overridable
    /// from the command line via `-P name=value` (spec.md §5).
    pub is_param: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentDecl {
    pub min: Option<Expr>,
    pub max: Option<Expr>,
    pub dimension: Option<Expr>,
    pub granularity: Option<Expr>,
    pub span: Option<Span>,
}

/// What kind of reduction a `sum`/`count`-style builtin call folds over,
/// recorded so the backend knows which runtime accumulator to emit
/// (spec.md §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReductionKind {
    Count,
    Sum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulateStmt {
    pub step_count: Expr,
    /// Step function names as written in source, in declared order.
    pub step_names: Vec<String>,
    /// `step_names` resolved to `FuncRef`s by the analyzer, in the same order.
    pub resolved_steps: Vec<FuncRef>,
    pub span: Span,
}

/// The whole parsed-and-analyzed program. Agents and functions live in
/// flat arenas; every other node refers to them by `AgentRef`/`FuncRef`
/// rather than by pointer (spec.md §9, Design Notes).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub agents: Vec<AgentDecl>,
    pub functions: Vec<FunctionDecl>,
    pub consts: Vec<ConstDecl>,
    pub environment: EnvironmentDecl,
    pub main: Option<FuncRef>,
    /// Distinct `(kind, type)` pairs actually used by `sum`/`count` calls
    /// anywhere in the script; `Type` has no total order so this is kept
    /// as a deduplicated `Vec` rather than a `BTreeSet`/`HashSet`.
    pub reductions: Vec<(ReductionKind, Type)>,
    /// Distinct radii passed to `near(...)`, needed by spatial backends
    /// to size their neighbor grids.
    pub radiuses: Vec<f64>,
    pub uses_environment_min: bool,
    pub uses_environment_max: bool,
    pub uses_random: bool,
    pub uses_agent_creation_in_step: bool,
    /// Set when any step calls `removeCurrent()`.
    pub uses_runtime_removal: bool,
    /// Set when `main` or a parallel step calls `add(...)`.
    pub uses_runtime_addition: bool,
    /// Set when any function calls `log_csv(...)`.
    pub uses_logging: bool,
    /// Set when any function calls `getLastExecTime()`.
    pub uses_timing: bool,
}

impl Script {
    pub fn agent(&self, r: AgentRef) -> &AgentDecl {
        &self.agents[r.0 as usize]
    }
    pub fn agent_mut(&mut self, r: AgentRef) -> &mut AgentDecl {
        &mut self.agents[r.0 as usize]
    }
    pub fn function(&self, r: FuncRef) -> &FunctionDecl {
        &self.functions[r.0 as usize]
    }
    pub fn function_mut(&mut self, r: FuncRef) -> &mut FunctionDecl {
        &mut self.functions[r.0 as usize]
    }

    pub fn find_agent(&self, name: &str) -> Option<AgentRef> {
        self.agents
            .iter()
            .position(|a| a.name == name)
            .map(|i| AgentRef(i as u32))
    }

    pub fn add_reduction(&mut self, kind: ReductionKind, ty: Type) {
        if !self.reductions.iter().any(|(k, t)| *k == kind && *t == ty) {
            self.reductions.push((kind, ty));
        }
    }

    pub fn add_radius(&mut self, radius: f64) {
        if !self.radiuses.iter().any(|r| *r == radius) {
            self.radiuses.push(radius);
        }
    }
}
