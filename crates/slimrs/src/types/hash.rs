//! `Hash` (spec §4.2), grounded on `original_source/source/types/Hash.cpp`'s
//! insertion-order-preserving implementation — slimrs gets that for free from
//! `indexmap::IndexMap` rather than the parallel list+index-map the original
//! hand-rolls.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{key_error, type_error, SlimResult};
use crate::expr::eval::EvalCtx;
use crate::intern::{intern, Symbol};
use crate::types::enumerable;
use crate::types::want_args;
use crate::value::{HashData, HashKey, Value};

fn hash_ref(receiver: &Value) -> Rc<RefCell<HashData>> {
    match receiver {
        Value::Hash(h) => h.clone(),
        _ => unreachable!("hash::call always receives a Value::Hash"),
    }
}

pub fn call(
    receiver: &Value,
    name: Symbol,
    args: &[Value],
    block: Option<&Value>,
    ctx: &mut EvalCtx<'_>,
) -> SlimResult<Value> {
    let h = hash_ref(receiver);
    match name.as_str() {
        "[]" => {
            want_args("[]", args, 1, 1)?;
            let data = h.borrow();
            Ok(data
                .entries
                .get(&HashKey(args[0].clone()))
                .cloned()
                .or_else(|| data.default.clone())
                .unwrap_or(Value::Nil))
        }
        "[]=" => {
            want_args("[]=", args, 2, 2)?;
            h.borrow_mut().entries.insert(HashKey(args[0].clone()), args[1].clone());
            Ok(args[1].clone())
        }
        "fetch" => {
            want_args("fetch", args, 1, 2)?;
            let data = h.borrow();
            match data.entries.get(&HashKey(args[0].clone())) {
                Some(v) => Ok(v.clone()),
                None => match args.get(1) {
                    Some(default) => Ok(default.clone()),
                    None => Err(key_error(format!("key not found: {}", args[0].inspect()))),
                },
            }
        }
        "each" => each(receiver, &h, block, ctx),
        "each_key" => {
            let keys: Vec<Value> = h.borrow().entries.keys().map(|k| k.0.clone()).collect();
            each_over(receiver, keys, block, ctx)
        }
        "each_value" => {
            let values: Vec<Value> = h.borrow().entries.values().cloned().collect();
            each_over(receiver, values, block, ctx)
        }
        "empty?" => Ok(Value::Bool(h.borrow().entries.is_empty())),
        "flatten" => {
            let depth = match args.first() {
                Some(Value::Number(n)) => *n as i64,
                _ => 1,
            };
            let pairs: Vec<Value> = h
                .borrow()
                .entries
                .iter()
                .flat_map(|(k, v)| [k.0.clone(), v.clone()])
                .collect();
            let flattened = crate::types::array::call(
                &Value::array(pairs),
                intern("flatten"),
                &[Value::Number((depth - 1) as f64)],
                None,
                ctx,
            )?;
            Ok(flattened)
        }
        "has_key?" | "key?" | "include?" | "member?" => {
            want_args("has_key?", args, 1, 1)?;
            Ok(Value::Bool(h.borrow().entries.contains_key(&HashKey(args[0].clone()))))
        }
        "has_value?" | "value?" => {
            want_args("has_value?", args, 1, 1)?;
            Ok(Value::Bool(h.borrow().entries.values().any(|v| v.eq(&args[0]))))
        }
        "invert" => {
            let mut entries = indexmap::IndexMap::new();
            for (k, v) in &h.borrow().entries {
                entries.insert(HashKey(v.clone()), k.0.clone());
            }
            Ok(Value::Hash(Rc::new(RefCell::new(HashData { entries, default: None }))))
        }
        "key" => {
            want_args("key", args, 1, 1)?;
            Ok(h.borrow()
                .entries
                .iter()
                .find(|(_, v)| v.eq(&args[0]))
                .map_or(Value::Nil, |(k, _)| k.0.clone()))
        }
        "keys" => Ok(Value::array(h.borrow().entries.keys().map(|k| k.0.clone()).collect())),
        "values" => Ok(Value::array(h.borrow().entries.values().cloned().collect())),
        "size" | "length" | "count" if args.is_empty() && block.is_none() => Ok(Value::Number(h.borrow().entries.len() as f64)),
        "merge" => {
            want_args("merge", args, 1, 1)?;
            match &args[0] {
                Value::Hash(other) => {
                    let mut entries = h.borrow().entries.clone();
                    for (k, v) in &other.borrow().entries {
                        entries.insert(HashKey(k.0.clone()), v.clone());
                    }
                    Ok(Value::Hash(Rc::new(RefCell::new(HashData {
                        entries,
                        default: h.borrow().default.clone(),
                    }))))
                }
                other => Err(type_error(format!("no implicit conversion of {} into Hash", other.type_name()))),
            }
        }
        "dup" => Ok(Value::Hash(Rc::new(RefCell::new(HashData {
            entries: h.borrow().entries.clone(),
            default: h.borrow().default.clone(),
        })))),
        "to_a" => Ok(Value::array(
            h.borrow()
                .entries
                .iter()
                .map(|(k, v)| Value::array(vec![k.0.clone(), v.clone()]))
                .collect(),
        )),
        "to_h" => Ok(receiver.clone()),
        _ => enumerable::try_call(receiver, name, args, block, ctx)
            .unwrap_or_else(|| Err(crate::error::no_such_method(format!("undefined method `{name}' for Hash")))),
    }
}

fn each(receiver: &Value, h: &Rc<RefCell<HashData>>, block: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    match block {
        Some(p) => {
            let pairs: Vec<(Value, Value)> = h.borrow().entries.iter().map(|(k, v)| (k.0.clone(), v.clone())).collect();
            for (k, v) in pairs {
                enumerable::call_block(p, &[k, v], ctx)?;
                if let Some(v) = enumerable::take_break(ctx) {
                    return Ok(v);
                }
            }
            Ok(receiver.clone())
        }
        None => Ok(enumerable::make_enumerator(receiver.clone(), intern("each"), Vec::new())),
    }
}

fn each_over(receiver: &Value, items: Vec<Value>, block: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    match block {
        Some(p) => {
            for item in items {
                enumerable::call_block(p, &[item], ctx)?;
                if let Some(v) = enumerable::take_break(ctx) {
                    return Ok(v);
                }
            }
            Ok(receiver.clone())
        }
        None => Ok(Value::array(items)),
    }
}
