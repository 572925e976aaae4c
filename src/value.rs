//! Compile-time constant values and CLI `-P` parameter values
//! (spec.md §3, "Value").

use crate::ast::expr::{BinOp, UnaryOp};
use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A compile-time constant value, used both for folded compile-time
/// constants and for CLI-injected `param` overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstValue {
    Invalid,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Vec2(f64, f64),
    Vec3(f64, f64, f64),
}

impl ConstValue {
    pub fn get_type(&self) -> Type {
        match self {
            ConstValue::Invalid => Type::Invalid,
            ConstValue::Bool(_) => Type::Bool,
            ConstValue::Int(_) => Type::Int,
            ConstValue::Float(_) => Type::Float,
            ConstValue::String(_) => Type::String,
            ConstValue::Vec2(..) => Type::Vec2,
            ConstValue::Vec3(..) => Type::Vec3,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ConstValue::Invalid)
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ConstValue::Int(i) => Some(*i as f64),
            ConstValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConstValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConstValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Explicit coercion used by CTOR calls (`bool(x)`, `int(x)`, `float(x)`).
    pub fn to_bool_explicit(&self) -> ConstValue {
        match self {
            ConstValue::Bool(_) => self.clone(),
            ConstValue::Int(i) => ConstValue::Bool(*i != 0),
            ConstValue::Float(f) => ConstValue::Bool(*f != 0.0),
            _ => ConstValue::Invalid,
        }
    }
    pub fn to_int_explicit(&self) -> ConstValue {
        match self {
            ConstValue::Int(_) => self.clone(),
            ConstValue::Float(f) => ConstValue::Int(*f as i64),
            ConstValue::Bool(b) => ConstValue::Int(*b as i64),
            _ => ConstValue::Invalid,
        }
    }
    pub fn to_float_explicit(&self) -> ConstValue {
        match self {
            ConstValue::Float(_) => self.clone(),
            ConstValue::Int(i) => ConstValue::Float(*i as f64),
            ConstValue::Bool(b) => ConstValue::Float(if *b { 1.0 } else { 0.0 }),
            _ => ConstValue::Invalid,
        }
    }

    /// Implicit widening used by the promotion machinery: only numeric.
    pub fn to_float_implicit(&self) -> ConstValue {
        match self {
            ConstValue::Float(_) => self.clone(),
            ConstValue::Int(i) => ConstValue::Float(*i as f64),
            _ => ConstValue::Invalid,
        }
    }

    /// Parse a `-P name=value` value against a declared target type.
    /// Mirrors the collaborator program's best-effort `fromString`:
    /// try bool, then int, then float, in that order.
    pub fn from_str_for(text: &str, target: &Type) -> Option<ConstValue> {
        let parsed = if text == "true" {
            ConstValue::Bool(true)
        } else if text == "false" {
            ConstValue::Bool(false)
        } else if let Ok(i) = text.parse::<i64>() {
            ConstValue::Int(i)
        } else if let Ok(f) = text.parse::<f64>() {
            ConstValue::Float(f)
        } else if matches!(target, Type::String) {
            ConstValue::String(text.to_string())
        } else {
            return None;
        };
        Some(parsed)
    }

    pub fn calc_unary_op(op: UnaryOp, val: &ConstValue) -> ConstValue {
        match op {
            UnaryOp::Plus => {
                if matches!(val, ConstValue::Int(_) | ConstValue::Float(_) | ConstValue::Vec2(..) | ConstValue::Vec3(..)) {
                    val.clone()
                } else {
                    ConstValue::Invalid
                }
            }
            UnaryOp::Minus => match val {
                ConstValue::Int(i) => ConstValue::Int(-i),
                ConstValue::Float(f) => ConstValue::Float(-f),
                ConstValue::Vec2(x, y) => ConstValue::Vec2(-x, -y),
                ConstValue::Vec3(x, y, z) => ConstValue::Vec3(-x, -y, -z),
                _ => ConstValue::Invalid,
            },
            UnaryOp::LogicalNot => match val {
                ConstValue::Bool(b) => ConstValue::Bool(!b),
                _ => ConstValue::Invalid,
            },
            UnaryOp::BitwiseNot => match val {
                ConstValue::Int(i) => ConstValue::Int(!i),
                _ => ConstValue::Invalid,
            },
        }
    }

    pub fn calc_binary_op(op: BinOp, l: &ConstValue, r: &ConstValue) -> ConstValue {
        use ConstValue::*;
        match op {
            BinOp::Add => match (l, r) {
                (Int(a), Int(b)) => Int(a + b),
                (a, b) if is_num(a) && is_num(b) => Float(a.as_float().unwrap() + b.as_float().unwrap()),
                (Vec2(ax, ay), Vec2(bx, by)) => Vec2(ax + bx, ay + by),
                (Vec3(ax, ay, az), Vec3(bx, by, bz)) => Vec3(ax + bx, ay + by, az + bz),
                _ => Invalid,
            },
            BinOp::Sub => match (l, r) {
                (Int(a), Int(b)) => Int(a - b),
                (a, b) if is_num(a) && is_num(b) => Float(a.as_float().unwrap() - b.as_float().unwrap()),
                (Vec2(ax, ay), Vec2(bx, by)) => Vec2(ax - bx, ay - by),
                (Vec3(ax, ay, az), Vec3(bx, by, bz)) => Vec3(ax - bx, ay - by, az - bz),
                _ => Invalid,
            },
            BinOp::Mul => match (l, r) {
                (Int(a), Int(b)) => Int(a * b),
                (Vec2(x, y), b) if is_num(b) => {
                    let f = b.as_float().unwrap();
                    Vec2(x * f, y * f)
                }
                (a, Vec2(x, y)) if is_num(a) => {
                    let f = a.as_float().unwrap();
                    Vec2(x * f, y * f)
                }
                (Vec3(x, y, z), b) if is_num(b) => {
                    let f = b.as_float().unwrap();
                    Vec3(x * f, y * f, z * f)
                }
                (a, Vec3(x, y, z)) if is_num(a) => {
                    let f = a.as_float().unwrap();
                    Vec3(x * f, y * f, z * f)
                }
                (a, b) if is_num(a) && is_num(b) => Float(a.as_float().unwrap() * b.as_float().unwrap()),
                _ => Invalid,
            },
            BinOp::Div => match (l, r) {
                (Int(a), Int(b)) if *b != 0 => Int(a / b),
                (Vec2(x, y), b) if is_num(b) => {
                    let f = b.as_float().unwrap();
                    Vec2(x / f, y / f)
                }
                (Vec3(x, y, z), b) if is_num(b) => {
                    let f = b.as_float().unwrap();
                    Vec3(x / f, y / f, z / f)
                }
                (a, b) if is_num(a) && is_num(b) => Float(a.as_float().unwrap() / b.as_float().unwrap()),
                _ => Invalid,
            },
            BinOp::Mod => match (l, r) {
                (Int(a), Int(b)) if *b != 0 => Int(a % b),
                (a, b) if is_num(a) && is_num(b) => Float(a.as_float().unwrap() % b.as_float().unwrap()),
                _ => Invalid,
            },
            BinOp::BitwiseAnd => match (l, r) {
                (Int(a), Int(b)) => Int(a & b),
                _ => Invalid,
            },
            BinOp::BitwiseOr => match (l, r) {
                (Int(a), Int(b)) => Int(a | b),
                _ => Invalid,
            },
            BinOp::BitwiseXor => match (l, r) {
                (Int(a), Int(b)) => Int(a ^ b),
                _ => Invalid,
            },
            BinOp::ShiftLeft => match (l, r) {
                (Int(a), Int(b)) => Int(a << b),
                _ => Invalid,
            },
            BinOp::ShiftRight => match (l, r) {
                (Int(a), Int(b)) => Int(a >> b),
                _ => Invalid,
            },
            BinOp::Eq | BinOp::Ne => {
                // Bug fix (spec.md §9, Open Question 2): the collaborator
                // program compares `vec3 == vec3` using the `vec2` union
                // member by mistake. Compare each vector kind against
                // itself here.
                let eq = match (l, r) {
                    (Vec2(ax, ay), Vec2(bx, by)) => Some(ax == bx && ay == by),
                    (Vec3(ax, ay, az), Vec3(bx, by, bz)) => Some(ax == bx && ay == by && az == bz),
                    (a, b) if is_num(a) && is_num(b) => Some(a.as_float() == b.as_float()),
                    _ => None,
                };
                match eq {
                    Some(v) => Bool(if op == BinOp::Eq { v } else { !v }),
                    None => Invalid,
                }
            }
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                if !is_num(l) || !is_num(r) {
                    return Invalid;
                }
                let (a, b) = (l.as_float().unwrap(), r.as_float().unwrap());
                let result = match op {
                    BinOp::Lt => a < b,
                    BinOp::Le => a <= b,
                    BinOp::Gt => a > b,
                    BinOp::Ge => a >= b,
                    _ => unreachable!(),
                };
                Bool(result)
            }
            BinOp::And => match (l, r) {
                (Bool(a), Bool(b)) => Bool(*a && *b),
                _ => Invalid,
            },
            BinOp::Or => match (l, r) {
                (Bool(a), Bool(b)) => Bool(*a || *b),
                _ => Invalid,
            },
            BinOp::Range => Invalid, // ranges are never constant-foldable values
        }
    }

    /// Identity element for `sum(...)` over an empty agent population.
    pub fn sum_identity(ty: &Type) -> ConstValue {
        match ty {
            Type::Int => ConstValue::Int(0),
            Type::Float => ConstValue::Float(0.0),
            Type::Vec2 => ConstValue::Vec2(0.0, 0.0),
            Type::Vec3 => ConstValue::Vec3(0.0, 0.0, 0.0),
            _ => ConstValue::Invalid,
        }
    }
}

fn is_num(v: &ConstValue) -> bool {
    matches!(v, ConstValue::Int(_) | ConstValue::Float(_))
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Invalid => write!(f, "<invalid>"),
            ConstValue::Bool(b) => write!(f, "{}", b),
            ConstValue::Int(i) => write!(f, "{}", i),
            ConstValue::Float(x) => write!(f, "{}", x),
            ConstValue::String(s) => write!(f, "\"{}\"", s),
            ConstValue::Vec2(x, y) => write!(f, "({}, {})", x, y),
            ConstValue::Vec3(x, y, z) => write!(f, "({}, {}, {})", x, y, z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec3_equality_compares_all_three_components() {
        let a = ConstValue::Vec3(1.0, 2.0, 3.0);
        let b = ConstValue::Vec3(1.0, 2.0, 4.0);
        assert_eq!(ConstValue::calc_binary_op(BinOp::Eq, &a, &b), ConstValue::Bool(false));
        let c = ConstValue::Vec3(1.0, 2.0, 3.0);
        assert_eq!(ConstValue::calc_binary_op(BinOp::Eq, &a, &c), ConstValue::Bool(true));
    }

    #[test]
    fn from_str_tries_bool_then_int_then_float() {
        assert_eq!(ConstValue::from_str_for("true", &Type::Bool), Some(ConstValue::Bool(true)));
        assert_eq!(ConstValue::from_str_for("42", &Type::Int), Some(ConstValue::Int(42)));
        assert_eq!(ConstValue::from_str_for("4.5", &Type::Float), Some(ConstValue::Float(4.5)));
        assert_eq!(ConstValue::from_str_for("nope", &Type::Int), None);
    }

    #[test]
    fn scalar_times_vector_either_order() {
        let v = ConstValue::Vec2(1.0, 2.0);
        let two = ConstValue::Int(2);
        assert_eq!(ConstValue::calc_binary_op(BinOp::Mul, &v, &two), ConstValue::Vec2(2.0, 4.0));
        assert_eq!(ConstValue::calc_binary_op(BinOp::Mul, &two, &v), ConstValue::Vec2(2.0, 4.0));
    }
}
