//! `Array` (spec §4.2), grounded on `original_source/source/types/Array.cpp`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{argument_error, index_error, type_error, SlimResult};
use crate::expr::eval::EvalCtx;
use crate::intern::{intern, Symbol};
use crate::types::enumerable;
use crate::types::want_args;
use crate::value::Value;

fn arr(receiver: &Value) -> Rc<RefCell<Vec<Value>>> {
    match receiver {
        Value::Array(a) => a.clone(),
        _ => unreachable!("array::call always receives a Value::Array"),
    }
}

fn norm_index(i: i64, len: usize) -> Option<usize> {
    let i = if i < 0 { i + len as i64 } else { i };
    (i >= 0 && (i as usize) <= len).then_some(i as usize)
}

fn as_number(v: &Value, what: &str) -> SlimResult<f64> {
    match v {
        Value::Number(n) => Ok(*n),
        other => Err(type_error(format!("{what} must be a Number, got {}", other.type_name()))),
    }
}

pub fn call(
    receiver: &Value,
    name: Symbol,
    args: &[Value],
    block: Option<&Value>,
    ctx: &mut EvalCtx<'_>,
) -> SlimResult<Value> {
    let a = arr(receiver);
    match name.as_str() {
        "[]" | "slice" | "at" => el_ref(&a, args),
        "fetch" => fetch(&a, args),
        "first" => first(&a, args),
        "last" => last(&a, args),
        "take" => {
            want_args("take", args, 1, 1)?;
            let n = as_number(&args[0], "take")? as usize;
            Ok(Value::array(a.borrow().iter().take(n).cloned().collect()))
        }
        "values_at" => {
            let items = a.borrow();
            let mut out = Vec::with_capacity(args.len());
            for v in args {
                let i = as_number(v, "values_at")? as i64;
                out.push(norm_index(i, items.len()).and_then(|i| items.get(i).cloned()).unwrap_or(Value::Nil));
            }
            Ok(Value::array(out))
        }
        "assoc" => {
            want_args("assoc", args, 1, 1)?;
            Ok(a.borrow()
                .iter()
                .find_map(|item| match item {
                    Value::Array(inner) if inner.borrow().first().is_some_and(|k| k.eq(&args[0])) => Some(item.clone()),
                    _ => None,
                })
                .unwrap_or(Value::Nil))
        }
        "rassoc" => {
            want_args("rassoc", args, 1, 1)?;
            Ok(a.borrow()
                .iter()
                .find_map(|item| match item {
                    Value::Array(inner) if inner.borrow().get(1).is_some_and(|v| v.eq(&args[0])) => Some(item.clone()),
                    _ => None,
                })
                .unwrap_or(Value::Nil))
        }
        "compact" => Ok(Value::array(a.borrow().iter().filter(|v| !matches!(v, Value::Nil)).cloned().collect())),
        "each" => each(receiver, &a, block, ctx),
        "empty?" => Ok(Value::Bool(a.borrow().is_empty())),
        "flatten" => {
            let depth = match args.first() {
                Some(Value::Number(n)) => *n as i64,
                _ => -1,
            };
            Ok(Value::array(flatten(&a.borrow(), depth)))
        }
        "include?" => {
            want_args("include?", args, 1, 1)?;
            Ok(Value::Bool(a.borrow().iter().any(|v| v.eq(&args[0]))))
        }
        "index" => enumerable::try_call(receiver, name, args, block, ctx).unwrap_or_else(|| {
            want_args("index", args, 1, 1)?;
            Ok(a.borrow()
                .iter()
                .position(|v| v.eq(&args[0]))
                .map_or(Value::Nil, |i| Value::Number(i as f64)))
        }),
        "rindex" => {
            want_args("rindex", args, 1, 1)?;
            Ok(a.borrow()
                .iter()
                .rposition(|v| v.eq(&args[0]))
                .map_or(Value::Nil, |i| Value::Number(i as f64)))
        }
        "join" => {
            let sep = match args.first() {
                Some(Value::Str(s)) => s.text.clone(),
                Some(other) => other.to_display_string(),
                None => String::new(),
            };
            Ok(Value::str(
                a.borrow().iter().map(Value::to_display_string).collect::<Vec<_>>().join(&sep),
            ))
        }
        "reverse" => Ok(Value::array(a.borrow().iter().rev().cloned().collect())),
        "reverse_each" => {
            let items: Vec<Value> = a.borrow().iter().rev().cloned().collect();
            if let Some(p) = block {
                for item in items {
                    enumerable::call_block(p, &[item], ctx)?;
                    if let Some(v) = enumerable::take_break(ctx) {
                        return Ok(v);
                    }
                }
                Ok(receiver.clone())
            } else {
                Ok(enumerable::make_enumerator(receiver.clone(), intern("reverse_each"), Vec::new()))
            }
        }
        "rotate" => {
            let n = match args.first() {
                Some(Value::Number(n)) => *n as i64,
                _ => 1,
            };
            let items = a.borrow();
            Ok(Value::array(rotate(&items, n)))
        }
        "size" | "length" => Ok(Value::Number(a.borrow().len() as f64)),
        "sort" => sort(&a, block, ctx),
        "sort_by" => sort_by(&a, block, ctx),
        "uniq" => uniq(&a),
        "+" => {
            want_args("+", args, 1, 1)?;
            match &args[0] {
                Value::Array(other) => {
                    let mut items = a.borrow().clone();
                    items.extend(other.borrow().iter().cloned());
                    Ok(Value::array(items))
                }
                other => Err(type_error(format!("no implicit conversion of {} into Array", other.type_name()))),
            }
        }
        "-" => {
            want_args("-", args, 1, 1)?;
            match &args[0] {
                Value::Array(other) => {
                    let other = other.borrow();
                    Ok(Value::array(a.borrow().iter().filter(|v| !other.iter().any(|o| o.eq(v))).cloned().collect()))
                }
                other => Err(type_error(format!("no implicit conversion of {} into Array", other.type_name()))),
            }
        }
        "push" | "<<" => {
            for v in args {
                a.borrow_mut().push(v.clone());
            }
            Ok(receiver.clone())
        }
        _ => enumerable::try_call(receiver, name, args, block, ctx)
            .unwrap_or_else(|| Err(crate::error::no_such_method(format!("undefined method `{name}' for Array")))),
    }
}

/// `Enumerable#each`, grounded on `original_source/source/types/Array.cpp`'s
/// `each`: a `break` inside the block (`BreakException` there) stops the
/// loop and becomes `each`'s own return value instead of the array itself.
fn each(receiver: &Value, a: &Rc<RefCell<Vec<Value>>>, block: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    match block {
        Some(p) => {
            let items = a.borrow().clone();
            for item in items {
                enumerable::call_block(p, &[item], ctx)?;
                if let Some(v) = enumerable::take_break(ctx) {
                    return Ok(v);
                }
            }
            Ok(receiver.clone())
        }
        None => Ok(enumerable::make_enumerator(receiver.clone(), intern("each"), Vec::new())),
    }
}

fn el_ref(a: &Rc<RefCell<Vec<Value>>>, args: &[Value]) -> SlimResult<Value> {
    let items = a.borrow();
    match args {
        [Value::Range(r)] => {
            let len = items.len();
            let begin = as_number(&r.begin, "range begin")? as i64;
            let end = as_number(&r.end, "range end")? as i64;
            let Some(b) = norm_index(begin, len) else { return Ok(Value::Nil) };
            let mut e = if end < 0 { end + len as i64 } else { end };
            if !r.exclude_end {
                e += 1;
            }
            let e = e.clamp(b as i64, len as i64) as usize;
            Ok(Value::array(items[b..e].to_vec()))
        }
        [i] => {
            let i = as_number(i, "index")? as i64;
            let i = if i < 0 { i + items.len() as i64 } else { i };
            Ok(usize::try_from(i).ok().and_then(|i| items.get(i).cloned()).unwrap_or(Value::Nil))
        }
        [i, len] => {
            let i = as_number(i, "index")? as i64;
            let len_n = as_number(len, "length")?;
            if len_n < 0.0 {
                return Ok(Value::Nil);
            }
            let Some(start) = norm_index(i, items.len()) else { return Ok(Value::Nil) };
            let end = (start + len_n as usize).min(items.len());
            Ok(Value::array(items[start..end].to_vec()))
        }
        _ => Err(argument_error("wrong number of arguments to Array#[]")),
    }
}

fn fetch(a: &Rc<RefCell<Vec<Value>>>, args: &[Value]) -> SlimResult<Value> {
    want_args("fetch", args, 1, 2)?;
    let items = a.borrow();
    let i = as_number(&args[0], "index")? as i64;
    match norm_index(i, items.len()).and_then(|i| items.get(i).cloned()) {
        Some(v) => Ok(v),
        None => match args.get(1) {
            Some(default) => Ok(default.clone()),
            None => Err(index_error(format!("index {i} outside of array bounds"))),
        },
    }
}

fn first(a: &Rc<RefCell<Vec<Value>>>, args: &[Value]) -> SlimResult<Value> {
    let items = a.borrow();
    match args.first() {
        Some(n) => {
            let n = as_number(n, "first")? as usize;
            Ok(Value::array(items.iter().take(n).cloned().collect()))
        }
        None => Ok(items.first().cloned().unwrap_or(Value::Nil)),
    }
}

fn last(a: &Rc<RefCell<Vec<Value>>>, args: &[Value]) -> SlimResult<Value> {
    let items = a.borrow();
    match args.first() {
        Some(n) => {
            let n = as_number(n, "last")? as usize;
            let start = items.len().saturating_sub(n);
            Ok(Value::array(items[start..].to_vec()))
        }
        None => Ok(items.last().cloned().unwrap_or(Value::Nil)),
    }
}

fn flatten(items: &[Value], depth: i64) -> Vec<Value> {
    let mut out = Vec::new();
    for item in items {
        match item {
            Value::Array(inner) if depth != 0 => {
                out.extend(flatten(&inner.borrow(), depth - 1));
            }
            other => out.push(other.clone()),
        }
    }
    out
}

fn rotate(items: &[Value], n: i64) -> Vec<Value> {
    let len = items.len();
    if len == 0 {
        return Vec::new();
    }
    let shift = n.rem_euclid(len as i64) as usize;
    items[shift..].iter().chain(items[..shift].iter()).cloned().collect()
}

fn sort(a: &Rc<RefCell<Vec<Value>>>, block: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let mut items = a.borrow().clone();
    let mut err = None;
    items.sort_by(|x, y| {
        let result = match block {
            Some(p) => enumerable::call_block(p, &[x.clone(), y.clone()], ctx).and_then(|r| match r {
                Value::Number(n) => Ok(n.partial_cmp(&0.0).unwrap_or(std::cmp::Ordering::Equal)),
                other => Err(type_error(format!("sort block must return a Number, got {}", other.type_name()))),
            }),
            None => x.cmp_value(y),
        };
        result.unwrap_or_else(|e| {
            err.get_or_insert(e);
            std::cmp::Ordering::Equal
        })
    });
    if let Some(e) = err {
        return Err(e);
    }
    Ok(Value::array(items))
}

fn sort_by(a: &Rc<RefCell<Vec<Value>>>, block: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let Some(p) = block else {
        return Err(argument_error("sort_by requires a block"));
    };
    let items = a.borrow().clone();
    let mut keyed = Vec::with_capacity(items.len());
    for item in items {
        let key = enumerable::call_block(p, &[item.clone()], ctx)?;
        if let Some(v) = enumerable::take_break(ctx) {
            return Ok(v);
        }
        keyed.push((key, item));
    }
    let mut err = None;
    keyed.sort_by(|(ka, _), (kb, _)| {
        ka.cmp_value(kb).unwrap_or_else(|e| {
            err.get_or_insert(e);
            std::cmp::Ordering::Equal
        })
    });
    if let Some(e) = err {
        return Err(e);
    }
    Ok(Value::array(keyed.into_iter().map(|(_, v)| v).collect()))
}

fn uniq(a: &Rc<RefCell<Vec<Value>>>) -> SlimResult<Value> {
    let items = a.borrow();
    let mut out: Vec<Value> = Vec::with_capacity(items.len());
    for item in items.iter() {
        if !out.iter().any(|seen| seen.eq(item)) {
            out.push(item.clone());
        }
    }
    Ok(Value::array(out))
}
