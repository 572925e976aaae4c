//! Lexical scoping for the analyzer (spec.md §4.1).
//!
//! Scopes are append-only: once a binding is entered it is never removed,
//! only shadowed by a later one in a child scope. Lookup walks the parent
//! chain, matching the teacher's `Scope`/`FunctionTable` split between
//! "what a name resolves to" and "what a call resolves to".

use crate::types::Type;
use crate::value::ConstValue;
use crate::varid::VarId;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Binding {
    pub id: VarId,
    pub ty: Type,
    pub is_const: bool,
    pub is_global: bool,
    /// Present when the analyzer could fold this binding's initializer
    /// to a compile-time constant (spec.md §4.1, constant folding).
    pub folded_value: Option<ConstValue>,
}

#[derive(Debug, Clone)]
pub struct Scope {
    bindings: HashMap<String, Binding>,
    parent: Option<Box<Scope>>,
}

impl Scope {
    pub fn root() -> Self {
        Self {
            bindings: HashMap::new(),
            parent: None,
        }
    }

    pub fn child(parent: Scope) -> Self {
        Self {
            bindings: HashMap::new(),
            parent: Some(Box::new(parent)),
        }
    }

    /// Discard this scope, returning its parent (the scope active again
    /// once a block is left).
    pub fn pop(self) -> Option<Scope> {
        self.parent.map(|p| *p)
    }

    pub fn declare(&mut self, name: impl Into<String>, binding: Binding) {
        self.bindings.insert(name.into(), binding);
    }

    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        if let Some(b) = self.bindings.get(name) {
            return Some(b);
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }

    /// True if `name` is already bound in this exact scope (not a parent);
    /// used to reject shadowing within the same block (spec.md §4.1).
    pub fn declared_in_this_scope(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(id: VarId, ty: Type) -> Binding {
        Binding {
            id,
            ty,
            is_const: false,
            is_global: false,
            folded_value: None,
        }
    }

    #[test]
    fn child_scope_sees_parent_bindings() {
        let mut ids = crate::varid::VarIdSource::new();
        let mut root = Scope::root();
        root.declare("x", binding(ids.fresh(), Type::Int));
        let child = Scope::child(root);
        assert!(child.lookup("x").is_some());
    }

    #[test]
    fn shadowing_in_same_scope_is_detectable() {
        let mut ids = crate::varid::VarIdSource::new();
        let mut scope = Scope::root();
        assert!(!scope.declared_in_this_scope("x"));
        scope.declare("x", binding(ids.fresh(), Type::Int));
        assert!(scope.declared_in_this_scope("x"));
    }
}
