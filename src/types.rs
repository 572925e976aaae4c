//! The closed semantic type system (spec.md §3, "Type").
//!
//! Agent declarations live in a flat arena on `Script` (spec.md §9, Design
//! Notes: "owning tree with interior raw back-references... use an arena
//! for AST nodes with nodes addressed by small indices"). `AgentRef` is
//! that index; `Type::Agent`/`AgentType`/`AgentMember` compare by index
//! identity, never structurally, matching the pointer-identity semantics
//! `spec.md` calls for.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of an agent declaration within `Script::agents`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentRef(pub u32);

/// A resolved semantic type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Invalid,
    Void,
    Bool,
    Int,
    Float,
    String,
    Vec2,
    Vec3,
    /// The generic agent type (`None`), used by builtin signatures such as
    /// `near`/`count`/`add`, or a concrete agent type (`Some(ref)`).
    Agent(Option<AgentRef>),
    AgentType(AgentRef),
    AgentMember(AgentRef, String),
    Array(Box<Type>),
}

impl Type {
    pub fn concrete_agent(r: AgentRef) -> Type {
        Type::Agent(Some(r))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Type::Invalid)
    }
    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }
    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Bool)
    }
    pub fn is_int(&self) -> bool {
        matches!(self, Type::Int)
    }
    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float)
    }
    pub fn is_num(&self) -> bool {
        self.is_int() || self.is_float()
    }
    pub fn is_vec2(&self) -> bool {
        matches!(self, Type::Vec2)
    }
    pub fn is_vec3(&self) -> bool {
        matches!(self, Type::Vec3)
    }
    pub fn is_vec(&self) -> bool {
        self.is_vec2() || self.is_vec3()
    }
    pub fn is_agent(&self) -> bool {
        matches!(self, Type::Agent(_))
    }
    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    pub fn agent_ref(&self) -> Option<AgentRef> {
        match self {
            Type::Agent(Some(r)) => Some(*r),
            Type::AgentType(r) => Some(*r),
            _ => None,
        }
    }

    pub fn array_base(&self) -> Option<&Type> {
        match self {
            Type::Array(base) => Some(base),
            _ => None,
        }
    }

    /// Implicit-promotion compatibility: can a value of `self` be used
    /// where `other` is expected? Only `Int -> Float` genuinely widens;
    /// `Agent(None)` (the generic agent type) is compatible with any
    /// concrete agent in either direction. Arrays compare base types
    /// without promotion (spec.md §3).
    pub fn is_promotable_to(&self, other: &Type) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (Type::Int, Type::Float) => true,
            (Type::Agent(Some(_)), Type::Agent(None)) => true,
            (Type::Agent(None), Type::Agent(Some(_))) => true,
            (Type::Array(a), Type::Array(b)) => a == b,
            _ => false,
        }
    }

    /// The common type two branches promote to (ternary, equality), or
    /// `None` if incompatible.
    pub fn common_promotion(&self, other: &Type) -> Option<Type> {
        if self == other {
            return Some(self.clone());
        }
        if self.is_promotable_to(other) {
            return Some(other.clone());
        }
        if other.is_promotable_to(self) {
            return Some(self.clone());
        }
        None
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Invalid => write!(f, "<invalid>"),
            Type::Void => write!(f, "void"),
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::String => write!(f, "string"),
            Type::Vec2 => write!(f, "float2"),
            Type::Vec3 => write!(f, "float3"),
            Type::Agent(Some(r)) => write!(f, "agent#{}", r.0),
            Type::Agent(None) => write!(f, "agent"),
            Type::AgentType(r) => write!(f, "agent_type#{}", r.0),
            Type::AgentMember(r, member) => write!(f, "agent#{}.{}", r.0, member),
            Type::Array(base) => write!(f, "{}[]", base),
        }
    }
}

/// Render a type using agent names rather than arena indices, for
/// diagnostics. Needs the arena because `Type` itself only stores indices.
pub fn display_type(ty: &Type, agent_name: impl Fn(AgentRef) -> String) -> String {
    match ty {
        Type::Agent(Some(r)) => agent_name(*r),
        Type::AgentType(r) => format!("agent_type<{}>", agent_name(*r)),
        Type::AgentMember(r, member) => format!("{}.{}", agent_name(*r), member),
        Type::Array(base) => format!("{}[]", display_type(base, agent_name)),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_promotes_to_float_but_not_back() {
        assert!(Type::Int.is_promotable_to(&Type::Float));
        assert!(!Type::Float.is_promotable_to(&Type::Int));
    }

    #[test]
    fn generic_agent_is_compatible_with_concrete() {
        let concrete = Type::concrete_agent(AgentRef(3));
        assert!(concrete.is_promotable_to(&Type::Agent(None)));
        assert!(Type::Agent(None).is_promotable_to(&concrete));
    }

    #[test]
    fn agent_types_compare_by_identity_not_structure() {
        let a = Type::concrete_agent(AgentRef(1));
        let b = Type::concrete_agent(AgentRef(2));
        assert_ne!(a, b);
    }

    #[test]
    fn arrays_do_not_promote_element_type() {
        let ints = Type::Array(Box::new(Type::Int));
        let floats = Type::Array(Box::new(Type::Float));
        assert!(!ints.is_promotable_to(&floats));
    }
}
