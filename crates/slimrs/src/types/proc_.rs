//! `Proc` (spec §4.2), grounded on `original_source/source/types/Proc.cpp`.

use crate::error::SlimResult;
use crate::expr::eval::{call_proc, EvalCtx};
use crate::intern::Symbol;
use crate::value::Value;

pub fn call(receiver: &Value, name: Symbol, args: &[Value], ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let Value::Proc(p) = receiver else {
        unreachable!("proc_::call always receives a Value::Proc");
    };
    match name.as_str() {
        "call" | "()" | "[]" | "yield" => call_proc(p, args, ctx),
        "arity" => Ok(Value::Number(p.params.len() as f64)),
        _ => Err(crate::error::no_such_method(format!("undefined method `{name}' for Proc"))),
    }
}
