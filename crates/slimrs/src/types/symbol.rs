//! `Symbol` (spec §4.1/§4.2), grounded on
//! `original_source/source/types/Symbol.cpp`. Minimal: a `Symbol` just
//! exposes its spelling back out as a `String`/itself.

use crate::error::SlimResult;
use crate::intern::Symbol as Sym;
use crate::value::Value;

fn sym(receiver: &Value) -> Sym {
    match receiver {
        Value::Symbol(s) => *s,
        _ => unreachable!("symbol::call always receives a Value::Symbol"),
    }
}

pub fn call(receiver: &Value, name: Sym, _args: &[Value]) -> SlimResult<Value> {
    let s = sym(receiver);
    match name.as_str() {
        "to_s" | "id2name" | "name" => Ok(Value::str(s.as_str())),
        "to_sym" => Ok(receiver.clone()),
        "length" | "size" => Ok(Value::Number(s.as_str().chars().count() as f64)),
        "empty?" => Ok(Value::Bool(s.as_str().is_empty())),
        "upcase" => Ok(Value::symbol(&s.as_str().to_uppercase())),
        "downcase" => Ok(Value::symbol(&s.as_str().to_lowercase())),
        _ => Err(crate::error::no_such_method(format!("undefined method `{name}' for Symbol"))),
    }
}
