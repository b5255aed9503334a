//! The Enumerable capability (spec §4.2/§9 "Enumerable as mixin").
//!
//! Grounded on `original_source/source/types/Enumerable.cpp`'s `each2`
//! pattern: every derived operation is expressed purely in terms of the
//! receiver's own `each`. `to_vec` materializes the receiver into a
//! `Vec<Value>` via one `each` dispatch (the *collector* passed to that
//! `each` call never itself executes user code, so it cannot raise
//! `break`), and every derived method below then iterates that vector in
//! plain Rust — but each one still calls the user's own block per item, so
//! `break` inside e.g. a `map`/`select` block must be (and is) honored via
//! [`take_break`] exactly like a direct `each` call would (spec §7: "must
//! never escape Enumerable implementations"); see DESIGN.md.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use crate::error::{argument_error, type_error, SlimResult};
use crate::expr::eval::{call_proc, EvalCtx};
use crate::intern::{intern, Symbol};
use crate::object;
use crate::value::{HashData, HashKey, ProcBody, ProcData, Value};

/// Calls a `Value::Proc` (or fails) with `args`, forwarding to the tree
/// walker's `call_proc`.
pub(crate) fn call_block(block: &Value, args: &[Value], ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    match block {
        Value::Proc(p) => call_proc(p, args, ctx),
        other => Err(type_error(format!("{} is not a Proc", other.type_name()))),
    }
}

/// Consumes a pending `break` value set by the block just called, if any.
/// Every `each`-family loop below checks this right after invoking the
/// user's block and, if it fires, stops iterating and returns the break
/// value as its own result — mirroring `BreakException` unwinding to the
/// nearest enclosing `each` in the original.
pub(crate) fn take_break(ctx: &mut EvalCtx<'_>) -> Option<Value> {
    ctx.take_break()
}

fn native_proc(ctx: &EvalCtx<'_>, f: impl Fn(&[Value]) -> SlimResult<Value> + 'static) -> Value {
    Value::Proc(Rc::new(ProcData {
        params: Vec::new(),
        body: ProcBody::Native(Rc::new(f)),
        scope: ctx.scope.clone(),
    }))
}

/// Materializes any Enumerable receiver into a plain vector by dispatching
/// one `each` call and collecting every yielded value (spec §4.2: "Enumerable
/// ... implemented once and mixed into Array, Hash, Range, Enumerator").
/// Hash's `each` yields `[k, v]` pairs, matching its own `each` implementation.
pub(crate) fn to_vec(receiver: &Value, ctx: &mut EvalCtx<'_>) -> SlimResult<Vec<Value>> {
    let collected: Rc<RefCell<Vec<Value>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = collected.clone();
    let collector = native_proc(ctx, move |args| {
        let v = match args {
            [one] => one.clone(),
            many => Value::array(many.to_vec()),
        };
        sink.borrow_mut().push(v);
        Ok(Value::Nil)
    });
    object::call_method(receiver, intern("each"), &[], Some(&collector), ctx)?;
    Ok(Rc::try_unwrap(collected).map(RefCell::into_inner).unwrap_or_default())
}

fn cmp_with(a: &Value, b: &Value, proc: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Ordering> {
    match proc {
        Some(p) => {
            let r = call_block(p, &[a.clone(), b.clone()], ctx)?;
            let n = match r {
                Value::Number(n) => n,
                other => return Err(type_error(format!("comparison proc must return a Number, got {}", other.type_name()))),
            };
            Ok(n.partial_cmp(&0.0).unwrap_or(Ordering::Equal))
        }
        None => a.cmp_value(b),
    }
}

/// Attempts to handle `name` as an Enumerable method. Returns `None` if it is
/// not one of the names this mixin provides, so the caller can fall through
/// to its own `NoSuchMethod`.
pub(crate) fn try_call(
    receiver: &Value,
    name: Symbol,
    args: &[Value],
    block: Option<&Value>,
    ctx: &mut EvalCtx<'_>,
) -> Option<SlimResult<Value>> {
    let block_or_arg0 = block.or(args.first());
    Some(match name.as_str() {
        "all?" => all_q(receiver, block_or_arg0, ctx),
        "any?" => any_q(receiver, block_or_arg0, ctx),
        "count" => count(receiver, args, block, ctx),
        "drop" => drop_n(receiver, args, ctx),
        "drop_while" => drop_while(receiver, block_or_arg0, ctx),
        "each_with_index" | "with_index" => each_with_index(receiver, args, block, ctx),
        "find" | "detect" => find(receiver, args, block, ctx),
        "find_index" => find_index(receiver, args, block, ctx),
        "map" | "collect" => map(receiver, block_or_arg0, ctx),
        "max" => max(receiver, args, block, ctx),
        "max_by" => max_by(receiver, block_or_arg0, ctx),
        "min" => min(receiver, args, block, ctx),
        "min_by" => min_by(receiver, block_or_arg0, ctx),
        "minmax" => minmax(receiver, block, ctx),
        "minmax_by" => minmax_by(receiver, block_or_arg0, ctx),
        "reject" => reject(receiver, block_or_arg0, ctx),
        "select" | "filter" => select(receiver, block_or_arg0, ctx),
        "to_a" | "entries" => to_vec(receiver, ctx).map(Value::array),
        "to_h" => to_h(receiver, ctx),
        _ => return None,
    })
}

fn require_proc<'a>(name: &str, p: Option<&'a Value>) -> SlimResult<&'a Value> {
    p.ok_or_else(|| argument_error(format!("{name} requires a block")))
}

fn all_q(receiver: &Value, proc: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let items = to_vec(receiver, ctx)?;
    for item in &items {
        let truthy = match proc {
            Some(p) => {
                let r = call_block(p, std::slice::from_ref(item), ctx)?.is_true();
                if let Some(v) = take_break(ctx) {
                    return Ok(v);
                }
                r
            }
            None => item.is_true(),
        };
        if !truthy {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

fn any_q(receiver: &Value, proc: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let items = to_vec(receiver, ctx)?;
    for item in &items {
        let truthy = match proc {
            Some(p) => {
                let r = call_block(p, std::slice::from_ref(item), ctx)?.is_true();
                if let Some(v) = take_break(ctx) {
                    return Ok(v);
                }
                r
            }
            None => item.is_true(),
        };
        if truthy {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

fn count(receiver: &Value, args: &[Value], block: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let items = to_vec(receiver, ctx)?;
    let n = if let Some(p) = block {
        let mut n = 0usize;
        for item in &items {
            if call_block(p, std::slice::from_ref(item), ctx)?.is_true() {
                n += 1;
            }
            if let Some(v) = take_break(ctx) {
                return Ok(v);
            }
        }
        n
    } else if let Some(v) = args.first() {
        items.iter().filter(|item| item.eq(v)).count()
    } else {
        items.len()
    };
    Ok(Value::Number(n as f64))
}

fn drop_n(receiver: &Value, args: &[Value], ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let items = to_vec(receiver, ctx)?;
    let n = match args.first() {
        Some(Value::Number(n)) => *n as usize,
        _ => return Err(argument_error("drop requires a Number argument")),
    };
    Ok(Value::array(items.into_iter().skip(n).collect()))
}

fn drop_while(receiver: &Value, proc: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let items = to_vec(receiver, ctx)?;
    let proc = require_proc("drop_while", proc)?;
    let mut out = Vec::new();
    let mut dropping = true;
    for item in items {
        if dropping {
            let hit = call_block(proc, std::slice::from_ref(&item), ctx)?.is_true();
            if let Some(v) = take_break(ctx) {
                return Ok(v);
            }
            if hit {
                continue;
            }
        }
        dropping = false;
        out.push(item);
    }
    Ok(Value::array(out))
}

fn each_with_index(receiver: &Value, args: &[Value], block: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let items = to_vec(receiver, ctx)?;
    let offset = match args.first() {
        Some(Value::Number(n)) => *n as i64,
        _ => 0,
    };
    match block {
        Some(p) => {
            for (i, item) in items.into_iter().enumerate() {
                call_block(p, &[item, Value::Number((i as i64 + offset) as f64)], ctx)?;
                if let Some(v) = take_break(ctx) {
                    return Ok(v);
                }
            }
            Ok(receiver.clone())
        }
        None => {
            let pairs = items
                .into_iter()
                .enumerate()
                .map(|(i, item)| Value::array(vec![item, Value::Number((i as i64 + offset) as f64)]))
                .collect();
            Ok(Value::array(pairs))
        }
    }
}

fn find(receiver: &Value, args: &[Value], block: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let items = to_vec(receiver, ctx)?;
    let proc = require_proc("find", block)?;
    for item in &items {
        let hit = call_block(proc, std::slice::from_ref(item), ctx)?.is_true();
        if let Some(v) = take_break(ctx) {
            return Ok(v);
        }
        if hit {
            return Ok(item.clone());
        }
    }
    Ok(args.first().cloned().unwrap_or(Value::Nil))
}

fn find_index(receiver: &Value, args: &[Value], block: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let items = to_vec(receiver, ctx)?;
    for (i, item) in items.iter().enumerate() {
        let hit = match (block, args.first()) {
            (Some(p), _) => {
                let r = call_block(p, std::slice::from_ref(item), ctx)?.is_true();
                if let Some(v) = take_break(ctx) {
                    return Ok(v);
                }
                r
            }
            (None, Some(v)) => item.eq(v),
            (None, None) => return Err(argument_error("find_index requires a value or a block")),
        };
        if hit {
            return Ok(Value::Number(i as f64));
        }
    }
    Ok(Value::Nil)
}

fn map(receiver: &Value, proc: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let items = to_vec(receiver, ctx)?;
    let proc = require_proc("map", proc)?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(call_block(proc, &[item], ctx)?);
        if let Some(v) = take_break(ctx) {
            return Ok(v);
        }
    }
    Ok(Value::array(out))
}

fn max(receiver: &Value, args: &[Value], block: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let mut items = to_vec(receiver, ctx)?;
    let mut err = None;
    items.sort_by(|a, b| match cmp_with(a, b, block, ctx) {
        Ok(o) => o,
        Err(e) => {
            err = Some(e);
            Ordering::Equal
        }
    });
    if let Some(e) = err {
        return Err(e);
    }
    match args.first() {
        Some(Value::Number(n)) => {
            let n = *n as usize;
            let start = items.len().saturating_sub(n);
            Ok(Value::array(items[start..].iter().rev().cloned().collect()))
        }
        _ => Ok(items.into_iter().next_back().unwrap_or(Value::Nil)),
    }
}

fn max_by(receiver: &Value, proc: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let items = to_vec(receiver, ctx)?;
    let proc = require_proc("max_by", proc)?;
    let mut best: Option<(Value, Value)> = None;
    for item in items {
        let key = call_block(proc, std::slice::from_ref(&item), ctx)?;
        if let Some(v) = take_break(ctx) {
            return Ok(v);
        }
        best = Some(match best {
            None => (item, key),
            Some((bi, bk)) => {
                if key.cmp_value(&bk)?.is_gt() {
                    (item, key)
                } else {
                    (bi, bk)
                }
            }
        });
    }
    Ok(best.map_or(Value::Nil, |(item, _)| item))
}

fn min(receiver: &Value, args: &[Value], block: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let mut items = to_vec(receiver, ctx)?;
    let mut err = None;
    items.sort_by(|a, b| match cmp_with(a, b, block, ctx) {
        Ok(o) => o,
        Err(e) => {
            err = Some(e);
            Ordering::Equal
        }
    });
    if let Some(e) = err {
        return Err(e);
    }
    match args.first() {
        Some(Value::Number(n)) => Ok(Value::array(items.into_iter().take(*n as usize).collect())),
        _ => Ok(items.into_iter().next().unwrap_or(Value::Nil)),
    }
}

fn min_by(receiver: &Value, proc: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let items = to_vec(receiver, ctx)?;
    let proc = require_proc("min_by", proc)?;
    let mut best: Option<(Value, Value)> = None;
    for item in items {
        let key = call_block(proc, std::slice::from_ref(&item), ctx)?;
        if let Some(v) = take_break(ctx) {
            return Ok(v);
        }
        best = Some(match best {
            None => (item, key),
            Some((bi, bk)) => {
                if key.cmp_value(&bk)?.is_lt() {
                    (item, key)
                } else {
                    (bi, bk)
                }
            }
        });
    }
    Ok(best.map_or(Value::Nil, |(item, _)| item))
}

fn minmax(receiver: &Value, block: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let lo = min(receiver, &[], block, ctx)?;
    let hi = max(receiver, &[], block, ctx)?;
    Ok(Value::array(vec![lo, hi]))
}

fn minmax_by(receiver: &Value, proc: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let lo = min_by(receiver, proc, ctx)?;
    let hi = max_by(receiver, proc, ctx)?;
    Ok(Value::array(vec![lo, hi]))
}

fn reject(receiver: &Value, proc: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let items = to_vec(receiver, ctx)?;
    let proc = require_proc("reject", proc)?;
    let mut out = Vec::new();
    for item in items {
        let keep = !call_block(proc, std::slice::from_ref(&item), ctx)?.is_true();
        if let Some(v) = take_break(ctx) {
            return Ok(v);
        }
        if keep {
            out.push(item);
        }
    }
    Ok(Value::array(out))
}

fn select(receiver: &Value, proc: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let items = to_vec(receiver, ctx)?;
    let proc = require_proc("select", proc)?;
    let mut out = Vec::new();
    for item in items {
        let keep = call_block(proc, std::slice::from_ref(&item), ctx)?.is_true();
        if let Some(v) = take_break(ctx) {
            return Ok(v);
        }
        if keep {
            out.push(item);
        }
    }
    Ok(Value::array(out))
}

fn to_h(receiver: &Value, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let items = to_vec(receiver, ctx)?;
    let mut entries = indexmap::IndexMap::new();
    for item in items {
        match item {
            Value::Array(a) => {
                let a = a.borrow();
                if a.len() != 2 {
                    return Err(type_error("to_h element must be a 2-element array"));
                }
                entries.insert(HashKey(a[0].clone()), a[1].clone());
            }
            other => return Err(type_error(format!("to_h element must be a 2-element array, got {}", other.type_name()))),
        }
    }
    Ok(Value::Hash(Rc::new(RefCell::new(HashData { entries, default: None }))))
}

/// Dispatch for `Value::Enumerator` receivers (spec §4.2: "`Enumerator#each`
/// concatenates captured arguments with the block and re-dispatches").
pub fn call_enumerator(
    receiver: &Value,
    name: Symbol,
    args: &[Value],
    block: Option<&Value>,
    ctx: &mut EvalCtx<'_>,
) -> SlimResult<Value> {
    let Value::Enumerator(data) = receiver else {
        unreachable!("call_enumerator always receives a Value::Enumerator");
    };
    if name.as_str() == "each" {
        let mut all_args = data.args.clone();
        all_args.extend_from_slice(args);
        return object::call_method(&data.source, data.method, &all_args, block, ctx);
    }
    try_call(receiver, name, args, block, ctx)
        .unwrap_or_else(|| Err(crate::error::no_such_method(format!("undefined method `{name}' for Enumerator"))))
}

/// Builds the `Enumerator` returned when an Enumerable-capable method is
/// called with no block (spec §4.2).
#[must_use]
pub fn make_enumerator(source: Value, method: Symbol, args: Vec<Value>) -> Value {
    Value::Enumerator(Rc::new(crate::value::EnumeratorData { source, method, args }))
}
