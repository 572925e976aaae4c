//! Call resolution (spec.md §4.1).
//!
//! Mirrors the collaborator program's signature registry: every declared
//! function (plus the fixed builtin set) gets a `FunctionSignature`, and
//! a call site resolves against the table by name, argument count, and
//! per-argument promotability rather than exact type equality.

use crate::ast::{FuncRef, FunctionFlags};
use crate::types::{AgentRef, Type};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub orig_name: String,
    /// Name used in backend output, disambiguating overloads
    /// (`count_Predator`, `count_Prey`, ...).
    pub mangled_name: String,
    pub param_types: Vec<Type>,
    pub return_type: Type,
    pub flags: FunctionFlags,
    /// `None` for builtins that have no AST node of their own.
    pub decl_ref: Option<FuncRef>,
}

#[derive(Debug, Default)]
pub struct FunctionTable {
    signatures: Vec<FunctionSignature>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sig: FunctionSignature) {
        self.signatures.push(sig);
    }

    pub fn all(&self) -> &[FunctionSignature] {
        &self.signatures
    }

    /// Find every declared signature under `name`, for conflict checks.
    pub fn by_name(&self, name: &str) -> Vec<&FunctionSignature> {
        self.signatures.iter().filter(|s| s.orig_name == name).collect()
    }

    /// Resolve a call by name against the supplied argument types,
    /// picking the unique signature every argument is promotable to.
    /// Ambiguity (more than one match) and no-match are both reported by
    /// the caller as distinct diagnostics, so this returns the whole set.
    pub fn compatible_signatures(&self, name: &str, arg_types: &[Type]) -> Vec<&FunctionSignature> {
        self.signatures
            .iter()
            .filter(|s| {
                s.orig_name == name
                    && s.param_types.len() == arg_types.len()
                    && s.param_types
                        .iter()
                        .zip(arg_types)
                        .all(|(p, a)| a.is_promotable_to(p))
            })
            .collect()
    }

    /// Specialize a generic-agent builtin signature (parameter type
    /// `Agent(None)`) to the concrete agent an actual call site supplies,
    /// the way `count`/`sum`/`near`/`add` are specialized per agent type
    /// (spec.md §4.1).
    pub fn concrete_signature(base: &FunctionSignature, concrete: AgentRef) -> FunctionSignature {
        let specialize = |ty: &Type| -> Type {
            if matches!(ty, Type::Agent(None)) {
                Type::concrete_agent(concrete)
            } else {
                ty.clone()
            }
        };
        FunctionSignature {
            orig_name: base.orig_name.clone(),
            mangled_name: format!("{}_{}", base.mangled_name, concrete.0),
            param_types: base.param_types.iter().map(specialize).collect(),
            return_type: specialize(&base.return_type),
            flags: base.flags,
            decl_ref: base.decl_ref,
        }
    }
}

/// Whitelisted math functions callable from any context (spec.md §4.1).
pub const MATH_BUILTINS: &[&str] = &[
    "sin", "cos", "tan", "asin", "acos", "atan", "atan2", "sqrt", "pow", "exp", "log", "abs",
    "min", "max", "floor", "ceil", "round",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(name: &str, params: Vec<Type>, ret: Type) -> FunctionSignature {
        FunctionSignature {
            orig_name: name.to_string(),
            mangled_name: name.to_string(),
            param_types: params,
            return_type: ret,
            flags: FunctionFlags::default(),
            decl_ref: None,
        }
    }

    #[test]
    fn int_arg_matches_float_param_by_promotion() {
        let mut table = FunctionTable::new();
        table.insert(sig("f", vec![Type::Float], Type::Void));
        let matches = table.compatible_signatures("f", &[Type::Int]);
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn wrong_arity_does_not_match() {
        let mut table = FunctionTable::new();
        table.insert(sig("f", vec![Type::Float], Type::Void));
        assert!(table.compatible_signatures("f", &[Type::Float, Type::Float]).is_empty());
    }

    #[test]
    fn concrete_signature_specializes_generic_agent_param() {
        let base = sig("count", vec![Type::Agent(None)], Type::Int);
        let concrete = FunctionTable::concrete_signature(&base, AgentRef(2));
        assert_eq!(concrete.param_types[0], Type::concrete_agent(AgentRef(2)));
        assert_eq!(concrete.mangled_name, "count_2");
    }
}
