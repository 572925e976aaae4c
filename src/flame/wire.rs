//! Message wire-format unpacking (spec.md §4.2).
//!
//! Matches the collaborator program's `getUnpackedMembers`: bools become
//! ints on the wire, `float2` expands to `_x`/`_y`, `float3` to
//! `_x`/`_y`/`_z`. A position member always expands to bare `x`/`y`/`z`
//! (with `z = 0` in a 2D model) rather than the member's own name,
//! because GPU backends expect agent position under those fixed names.

use crate::ast::{AgentDecl, AgentMember};
use crate::types::Type;

#[derive(Debug, Clone, PartialEq)]
pub struct WireField {
    pub name: String,
    pub ty: Type,
}

pub fn unpack_members(agent: &AgentDecl, accessed: &[String]) -> Vec<WireField> {
    let mut fields = Vec::new();
    let position = agent.members.iter().find(|m| m.is_position);
    if let Some(pos) = position {
        fields.extend(unpack_one(pos, true));
    }
    for name in accessed {
        if position.map(|p| &p.name) == Some(name) {
            continue;
        }
        if let Some(member) = agent.members.iter().find(|m| &m.name == name) {
            fields.extend(unpack_one(member, false));
        }
    }
    fields
}

fn unpack_one(member: &AgentMember, is_position: bool) -> Vec<WireField> {
    match &member.resolved_type {
        Type::Bool => vec![WireField {
            name: member.name.clone(),
            ty: Type::Int,
        }],
        Type::Vec2 => {
            if is_position {
                vec![
                    WireField {
                        name: "x".to_string(),
                        ty: Type::Float,
                    },
                    WireField {
                        name: "y".to_string(),
                        ty: Type::Float,
                    },
                    WireField {
                        name: "z".to_string(),
                        ty: Type::Float,
                    },
                ]
            } else {
                vec![
                    WireField {
                        name: format!("{}_x", member.name),
                        ty: Type::Float,
                    },
                    WireField {
                        name: format!("{}_y", member.name),
                        ty: Type::Float,
                    },
                ]
            }
        }
        Type::Vec3 => {
            let (x, y, z) = if is_position {
                ("x".to_string(), "y".to_string(), "z".to_string())
            } else {
                (format!("{}_x", member.name), format!("{}_y", member.name), format!("{}_z", member.name))
            };
            vec![
                WireField { name: x, ty: Type::Float },
                WireField { name: y, ty: Type::Float },
                WireField { name: z, ty: Type::Float },
            ]
        }
        other => vec![WireField {
            name: member.name.clone(),
            ty: other.clone(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str, ty: Type, is_position: bool) -> AgentMember {
        AgentMember {
            name: name.to_string(),
            declared_type: crate::ast::TypeExpr::Float,
            resolved_type: ty,
            is_position,
            span: 0..0,
        }
    }

    #[test]
    fn vec2_position_expands_to_xyz_with_zero_z() {
        let agent = AgentDecl {
            name: "Boid".to_string(),
            members: vec![member("pos", Type::Vec2, true)],
            steps: Vec::new(),
            span: 0..0,
        };
        let fields = unpack_members(&agent, &[]);
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }

    #[test]
    fn bool_member_becomes_int_on_the_wire() {
        let agent = AgentDecl {
            name: "Boid".to_string(),
            members: vec![member("pos", Type::Vec2, true), member("alive", Type::Bool, false)],
            steps: Vec::new(),
            span: 0..0,
        };
        let fields = unpack_members(&agent, &["alive".to_string()]);
        let alive = fields.iter().find(|f| f.name == "alive").unwrap();
        assert_eq!(alive.ty, Type::Int);
    }
}
