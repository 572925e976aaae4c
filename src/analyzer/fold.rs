//! Compile-time constant folding (spec.md §4.1).
//!
//! Only a subset of expressions are ever foldable: literals, references
//! to other constants, and unary/binary operators applied to foldable
//! operands. Anything else (calls, member access, agent state) folds to
//! `None` and is left for codegen to evaluate at runtime.

use crate::ast::ExprKind;
use crate::function_table::MATH_BUILTINS;
use crate::scope::Scope;
use crate::value::ConstValue;

pub fn eval_expression(expr: &crate::ast::Expr, scope: &Scope) -> Option<ConstValue> {
    match &*expr.kind {
        ExprKind::BoolLit(b) => Some(ConstValue::Bool(*b)),
        ExprKind::IntLit(i) => Some(ConstValue::Int(*i)),
        ExprKind::FloatLit(f) => Some(ConstValue::Float(*f)),
        ExprKind::StringLit(s) => Some(ConstValue::String(s.clone())),
        ExprKind::Var { name, .. } => scope.lookup(name).and_then(|b| b.folded_value.clone()),
        ExprKind::Unary { op, operand } => {
            let v = eval_expression(operand, scope)?;
            let result = ConstValue::calc_unary_op(*op, &v);
            if result.is_invalid() {
                None
            } else {
                Some(result)
            }
        }
        ExprKind::Binary { op, left, right } => {
            let l = eval_expression(left, scope)?;
            let r = eval_expression(right, scope)?;
            let result = ConstValue::calc_binary_op(*op, &l, &r);
            if result.is_invalid() {
                None
            } else {
                Some(result)
            }
        }
        ExprKind::Ternary {
            cond,
            then_branch,
            else_branch,
        } => {
            let c = eval_expression(cond, scope)?;
            match c.as_bool()? {
                true => eval_expression(then_branch, scope),
                false => eval_expression(else_branch, scope),
            }
        }
        ExprKind::Call { name, args } => fold_call(name, args, scope),
        _ => None,
    }
}

/// Fold the primitive/vector constructors and the whitelisted math
/// builtins; every other call (reductions, `add`, user functions, ...)
/// has runtime side effects or reads runtime state and is never foldable.
fn fold_call(name: &str, args: &[crate::ast::Expr], scope: &Scope) -> Option<ConstValue> {
    let arg_vals: Vec<ConstValue> = args
        .iter()
        .map(|a| eval_expression(a, scope))
        .collect::<Option<Vec<_>>>()?;

    match name {
        "bool" if arg_vals.len() == 1 => Some(arg_vals[0].to_bool_explicit()).filter(|v| !v.is_invalid()),
        "int" if arg_vals.len() == 1 => Some(arg_vals[0].to_int_explicit()).filter(|v| !v.is_invalid()),
        "float" if arg_vals.len() == 1 => Some(arg_vals[0].to_float_explicit()).filter(|v| !v.is_invalid()),
        "float2" => {
            let xs: Vec<f64> = arg_vals.iter().filter_map(|v| v.as_float()).collect();
            match xs.as_slice() {
                [x] => Some(ConstValue::Vec2(*x, *x)),
                [x, y] => Some(ConstValue::Vec2(*x, *y)),
                _ => None,
            }
        }
        "float3" => {
            let xs: Vec<f64> = arg_vals.iter().filter_map(|v| v.as_float()).collect();
            match xs.as_slice() {
                [x] => Some(ConstValue::Vec3(*x, *x, *x)),
                [x, y, z] => Some(ConstValue::Vec3(*x, *y, *z)),
                _ => None,
            }
        }
        _ if MATH_BUILTINS.contains(&name) => {
            let floats: Vec<f64> = arg_vals.iter().map(|v| v.as_float()).collect::<Option<Vec<_>>>()?;
            fold_math(name, &floats).map(ConstValue::Float)
        }
        _ => None,
    }
}

fn fold_math(name: &str, args: &[f64]) -> Option<f64> {
    Some(match (name, args) {
        ("sin", [x]) => x.sin(),
        ("cos", [x]) => x.cos(),
        ("tan", [x]) => x.tan(),
        ("asin", [x]) => x.asin(),
        ("acos", [x]) => x.acos(),
        ("atan", [x]) => x.atan(),
        ("atan2", [y, x]) => y.atan2(*x),
        ("sqrt", [x]) => x.sqrt(),
        ("pow", [base, exp]) => base.powf(*exp),
        ("exp", [x]) => x.exp(),
        ("log", [x]) => x.ln(),
        ("abs", [x]) => x.abs(),
        ("min", [a, b]) => a.min(*b),
        ("max", [a, b]) => a.max(*b),
        ("floor", [x]) => x.floor(),
        ("ceil", [x]) => x.ceil(),
        ("round", [x]) => x.round(),
        _ => return None,
    })
}
