//! `Number` (spec §4.1/§4.2), grounded on
//! `original_source/source/types/Number.cpp`.

use crate::error::{type_error, SlimResult};
use crate::intern::Symbol;
use crate::types::want_args;
use crate::value::Value;

fn num(receiver: &Value) -> f64 {
    match receiver {
        Value::Number(n) => *n,
        _ => unreachable!("number::call always receives a Value::Number"),
    }
}

/// spec §4.1 `round`: "rounds half-away-from-zero to `n` fractional digits;
/// when `n` is negative, rounds to that many tens, hundreds, etc."
fn round_to(v: f64, ndigits: f64) -> f64 {
    if ndigits == 0.0 {
        return round_half_away_from_zero(v);
    }
    let factor = 10f64.powf(ndigits);
    round_half_away_from_zero(v * factor) / factor
}

fn round_half_away_from_zero(v: f64) -> f64 {
    if v >= 0.0 {
        (v + 0.5).floor()
    } else {
        (v - 0.5).ceil()
    }
}

pub fn call(receiver: &Value, name: Symbol, args: &[Value]) -> SlimResult<Value> {
    let v = num(receiver);
    match name.as_str() {
        "to_f" | "to_d" => Ok(Value::Number(v)),
        "to_i" | "to_int" | "truncate" => Ok(Value::Number(v.trunc())),
        "abs" | "magnitude" => Ok(Value::Number(v.abs())),
        "next_float" => Ok(Value::Number(next_after(v, f64::INFINITY))),
        "prev_float" => Ok(Value::Number(next_after(v, f64::NEG_INFINITY))),
        "ceil" => Ok(Value::Number(v.ceil())),
        "floor" => Ok(Value::Number(v.floor())),
        "round" => {
            want_args("round", args, 0, 1)?;
            let ndigits = match args.first() {
                Some(Value::Number(n)) => *n,
                Some(other) => return Err(type_error(format!("round argument must be a Number, got {}", other.type_name()))),
                None => 0.0,
            };
            if v == 0.0 {
                Ok(Value::Number(0.0))
            } else {
                Ok(Value::Number(round_to(v, ndigits)))
            }
        }
        "zero?" => Ok(Value::Bool(v == 0.0)),
        "positive?" => Ok(Value::Bool(v > 0.0)),
        "negative?" => Ok(Value::Bool(v < 0.0)),
        "nan?" => Ok(Value::Bool(v.is_nan())),
        "finite?" => Ok(Value::Bool(v.is_finite())),
        "infinite?" => Ok(if v.is_infinite() {
            Value::Number(if v > 0.0 { 1.0 } else { -1.0 })
        } else {
            Value::Nil
        }),
        "+" => binop(v, args, |a, b| a + b),
        "-" => binop(v, args, |a, b| a - b),
        "*" => binop(v, args, |a, b| a * b),
        "/" => binop(v, args, |a, b| a / b),
        "%" => binop(v, args, f64::rem_euclid),
        "**" => binop(v, args, f64::powf),
        _ => Err(crate::error::no_such_method(format!("undefined method `{name}' for Number"))),
    }
}

fn binop(a: f64, args: &[Value], f: impl Fn(f64, f64) -> f64) -> SlimResult<Value> {
    want_args("operator", args, 1, 1)?;
    match &args[0] {
        Value::Number(b) => Ok(Value::Number(f(a, *b))),
        other => Err(type_error(format!("{} can't be coerced into Number", other.type_name()))),
    }
}

/// `f64::next_up`/`next_down` require Rust 1.86+; implemented by hand against
/// the bit pattern to avoid depending on a specific toolchain edition.
fn next_after(v: f64, towards: f64) -> f64 {
    if v.is_nan() || towards.is_nan() || v == towards {
        return v;
    }
    if v == 0.0 {
        return if towards > 0.0 { f64::from_bits(1) } else { -f64::from_bits(1) };
    }
    let bits = v.to_bits();
    let next_bits = if (v < towards) == (v > 0.0) { bits + 1 } else { bits - 1 };
    f64::from_bits(next_bits)
}
