//! Builtin function signatures (spec.md §4.1).
//!
//! Populated once per compilation, before any user function is resolved,
//! so user declarations can be checked for name collisions against them.

use crate::ast::FunctionFlags;
use crate::function_table::{FunctionSignature, FunctionTable, MATH_BUILTINS};
use crate::types::Type;

pub fn register(table: &mut FunctionTable) {
    // `count`, `sum`, `near`, `add`, `removeCurrent`, `log_csv`, and
    // `getLastExecTime` are handled directly in `check_call`: their
    // argument/return shapes involve `AgentType`/`AgentMember`, which this
    // table's arity/promotion-based overload resolution can't express, and
    // several carry call-site invariants (one `add` per step, context
    // restrictions) enforced alongside the type check.
    insert(table, "random", vec![Type::Float, Type::Float], Type::Float);
    insert(table, "randomInt", vec![Type::Int, Type::Int], Type::Int);

    for name in MATH_BUILTINS {
        let arity = match *name {
            "atan2" | "pow" | "min" | "max" => 2,
            _ => 1,
        };
        insert(table, name, vec![Type::Float; arity], Type::Float);
    }
}

fn insert(table: &mut FunctionTable, name: &str, params: Vec<Type>, ret: Type) {
    table.insert(FunctionSignature {
        orig_name: name.to_string(),
        mangled_name: name.to_string(),
        param_types: params,
        return_type: ret,
        flags: FunctionFlags::default(),
        decl_ref: None,
    });
}
