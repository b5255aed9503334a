//! `Range` (spec §4.1/§4.2), grounded on
//! `original_source/source/types/Range.cpp`. The original stores `begin`/
//! `end` as raw doubles; `value.rs`'s `RangeData` stores them as `Value` so a
//! `Range` could in principle wrap non-Number endpoints, but every operation
//! below coerces through [`as_num`] and raises `TypeError` otherwise, which is
//! the only bound kind spec.md's examples ever construct.

use crate::error::{argument_error, type_error, SlimResult};
use crate::expr::eval::EvalCtx;
use crate::intern::{intern, Symbol};
use crate::types::{enumerable, want_args};
use crate::value::{RangeData, Value};

fn range(receiver: &Value) -> RangeData {
    match receiver {
        Value::Range(r) => r.clone(),
        _ => unreachable!("range::call always receives a Value::Range"),
    }
}

fn as_num(v: &Value) -> SlimResult<f64> {
    match v {
        Value::Number(n) => Ok(*n),
        other => Err(type_error(format!("Range bounds must be Numbers, got {}", other.type_name()))),
    }
}

pub fn call(
    receiver: &Value,
    name: Symbol,
    args: &[Value],
    block: Option<&Value>,
    ctx: &mut EvalCtx<'_>,
) -> SlimResult<Value> {
    let r = range(receiver);
    let begin = as_num(&r.begin)?;
    let end = as_num(&r.end)?;
    match name.as_str() {
        "begin" | "first" if args.is_empty() => Ok(r.begin.clone()),
        "first" => first(begin, end, r.exclude_end, args),
        "end" | "last" if args.is_empty() => Ok(r.end.clone()),
        "last" => last(begin, end, r.exclude_end, args),
        "exclude_end?" => Ok(Value::Bool(r.exclude_end)),
        "cover?" | "include?" | "member?" => {
            want_args(name.as_str(), args, 1, 1)?;
            let n = as_num(&args[0])?;
            Ok(Value::Bool(if r.exclude_end { n >= begin && n < end } else { n >= begin && n <= end }))
        }
        "size" => Ok(Value::Number(size(begin, end, r.exclude_end))),
        "each" => each(receiver, begin, end, r.exclude_end, block, ctx),
        "step" => step(receiver, begin, end, r.exclude_end, args, block, ctx),
        _ => enumerable::try_call(receiver, name, args, block, ctx)
            .unwrap_or_else(|| Err(crate::error::no_such_method(format!("undefined method `{name}' for Range")))),
    }
}

fn size(begin: f64, end: f64, exclude_end: bool) -> f64 {
    if exclude_end {
        if end <= begin {
            0.0
        } else {
            let n = end - begin;
            if n == n.trunc() {
                n
            } else {
                n.ceil()
            }
        }
    } else if end < begin {
        0.0
    } else {
        (end - begin + 1.0).trunc()
    }
}

fn first(begin: f64, end: f64, exclude_end: bool, args: &[Value]) -> SlimResult<Value> {
    want_args("first", args, 1, 1)?;
    let n = match &args[0] {
        Value::Number(n) => *n as i64,
        other => return Err(type_error(format!("first argument must be a Number, got {}", other.type_name()))),
    };
    if n < 0 {
        return Err(argument_error("negative array size (or size too big)"));
    }
    let mut out = Vec::new();
    let mut i = begin;
    while out.len() < n as usize && if exclude_end { i < end } else { i <= end } {
        out.push(Value::Number(i));
        i += 1.0;
    }
    Ok(Value::array(out))
}

fn last(begin: f64, end: f64, exclude_end: bool, args: &[Value]) -> SlimResult<Value> {
    want_args("last", args, 1, 1)?;
    let n = match &args[0] {
        Value::Number(n) => *n as i64,
        other => return Err(type_error(format!("last argument must be a Number, got {}", other.type_name()))),
    };
    if n < 0 {
        return Err(argument_error("negative array size (or size too big)"));
    }
    let mut window = std::collections::VecDeque::new();
    let mut i = begin;
    while if exclude_end { i < end } else { i <= end } {
        if window.len() as i64 == n {
            window.pop_front();
        }
        window.push_back(Value::Number(i));
        i += 1.0;
    }
    Ok(Value::array(window.into_iter().collect()))
}

fn each(
    receiver: &Value,
    begin: f64,
    end: f64,
    exclude_end: bool,
    block: Option<&Value>,
    ctx: &mut EvalCtx<'_>,
) -> SlimResult<Value> {
    match block {
        Some(p) => {
            let mut i = begin;
            while if exclude_end { i < end } else { i <= end } {
                enumerable::call_block(p, &[Value::Number(i)], ctx)?;
                if let Some(v) = enumerable::take_break(ctx) {
                    return Ok(v);
                }
                i += 1.0;
            }
            Ok(receiver.clone())
        }
        None => Ok(enumerable::make_enumerator(receiver.clone(), intern("each"), Vec::new())),
    }
}

fn step(
    receiver: &Value,
    begin: f64,
    end: f64,
    exclude_end: bool,
    args: &[Value],
    block: Option<&Value>,
    ctx: &mut EvalCtx<'_>,
) -> SlimResult<Value> {
    want_args("step", args, 0, 1)?;
    let step = match args.first() {
        Some(Value::Number(n)) => *n,
        Some(other) => return Err(type_error(format!("step argument must be a Number, got {}", other.type_name()))),
        None => 1.0,
    };
    match block {
        Some(p) => {
            let mut i = begin;
            while if exclude_end { i < end } else { i <= end } {
                enumerable::call_block(p, &[Value::Number(i)], ctx)?;
                if let Some(v) = enumerable::take_break(ctx) {
                    return Ok(v);
                }
                i += step;
            }
            Ok(receiver.clone())
        }
        None => Ok(enumerable::make_enumerator(receiver.clone(), intern("step"), args.to_vec())),
    }
}
