//! `Regexp`/`MatchData` (spec §4.1/§4.2), grounded on
//! `original_source/source/types/Regexp.cpp`. The original builds on
//! `std::regex`, which can't express Ruby-style `/x`-extended or
//! `/m`-multiline semantics and throws `ScriptError` for both at construction
//! time; slimrs's `regex` crate is in the same boat (no free-spacing mode,
//! and `.` already matches everything but `\n` unless `(?s)` is set, which
//! isn't the same knob as Ruby's per-line `^`/`$` anchoring) so the same two
//! flags are rejected here for the same reason, per spec's Open Question.

use std::rc::Rc;

use crate::error::{argument_error, index_error, script_error, type_error, SlimResult};
use crate::intern::Symbol;
use crate::value::{MatchDataInner, RegexpData, RegexpFlags, Value};

pub fn compile(src: &str, flags: RegexpFlags) -> SlimResult<Value> {
    if flags.contains(RegexpFlags::EXTENDED) {
        return Err(script_error("Regexp::EXTENDED is not supported"));
    }
    if flags.contains(RegexpFlags::MULTILINE) {
        return Err(script_error("Regex multiline mode not supported"));
    }
    let mut pattern = String::new();
    if flags.contains(RegexpFlags::IGNORECASE) {
        pattern.push_str("(?i)");
    }
    pattern.push_str(src);
    let compiled = regex::Regex::new(&pattern).map_err(|e| script_error(format!("invalid regular expression: {e}")))?;
    Ok(Value::Regexp(Rc::new(RegexpData {
        source: src.to_owned(),
        flags,
        compiled,
    })))
}

fn regexp(receiver: &Value) -> Rc<RegexpData> {
    match receiver {
        Value::Regexp(r) => r.clone(),
        _ => unreachable!("regexp::call always receives a Value::Regexp"),
    }
}

fn match_data(receiver: &Value) -> Rc<MatchDataInner> {
    match receiver {
        Value::MatchData(m) => m.clone(),
        _ => unreachable!("regexp::call_match_data always receives a Value::MatchData"),
    }
}

fn norm_index(i: i64, len: usize) -> Option<usize> {
    if i >= 0 {
        let i = i as usize;
        (i < len).then_some(i)
    } else {
        let i = len as i64 + i;
        (i >= 0).then_some(i as usize)
    }
}

/// `do_match`: searches `haystack` for `regexp` starting at byte offset `pos`
/// (negative `pos` indexes from the end, as in the original).
pub fn do_match(regexp: &Rc<RegexpData>, haystack: &str, pos: i64) -> Option<Value> {
    let start = if pos < 0 {
        let p = haystack.len() as i64 + pos;
        if p < 0 {
            return None;
        }
        p as usize
    } else {
        pos as usize
    };
    if start > haystack.len() {
        return None;
    }
    let window = haystack.get(start..)?;
    let caps = regexp.compiled.captures(window)?;
    let mut spans = Vec::with_capacity(caps.len());
    for i in 0..caps.len() {
        spans.push(caps.get(i).map(|m| (m.start() + start, m.end() + start)));
    }
    Some(Value::MatchData(Rc::new(MatchDataInner {
        regexp: Value::Regexp(regexp.clone()),
        haystack: Rc::from(haystack),
        captures: spans,
    })))
}

/// `do_rmatch`: used by `String#rindex(regexp)` to find the *last* match at
/// or before `pos` by anchoring a synthetic greedy-prefix capture.
pub fn do_rmatch(regexp: &RegexpData, haystack: &str, pos: usize) -> Option<(usize, usize)> {
    let window = haystack.get(..pos.min(haystack.len()))?;
    let anchored = format!("^[\\s\\S]*({})", regexp.compiled.as_str());
    let anchored = regex::Regex::new(&anchored).ok()?;
    let caps = anchored.captures(window)?;
    let m = caps.get(1)?;
    Some((m.start(), m.end()))
}

pub fn call(receiver: &Value, name: Symbol, args: &[Value]) -> SlimResult<Value> {
    let r = regexp(receiver);
    match name.as_str() {
        "match" => {
            let haystack = match args.first() {
                Some(Value::Str(s)) => s.text.clone(),
                Some(other) => return Err(type_error(format!("match requires a String, got {}", other.type_name()))),
                None => return Err(argument_error("match requires a String argument")),
            };
            let pos = match args.get(1) {
                Some(Value::Number(n)) => *n as i64,
                _ => 0,
            };
            Ok(do_match(&r, &haystack, pos).unwrap_or(Value::Nil))
        }
        "casefold?" => Ok(Value::Bool(r.flags.contains(RegexpFlags::IGNORECASE))),
        "options" => Ok(Value::Number(r.flags.bits() as f64)),
        "source" => Ok(Value::str(r.source.clone())),
        "to_s" => Ok(Value::str(format!("(?:{})", r.source))),
        "inspect" => Ok(Value::str(format!("/{}/", r.source))),
        _ => Err(crate::error::no_such_method(format!("undefined method `{name}' for Regexp"))),
    }
}

/// `get_sub`: capture index bounds-checked against `self.size()`.
fn get_sub(m: &MatchDataInner, n: i64) -> SlimResult<usize> {
    let len = m.captures.len();
    norm_index(n, len).ok_or_else(|| index_error(format!("index {n} out of bounds")))
}

pub fn call_match_data(receiver: &Value, name: Symbol, args: &[Value]) -> SlimResult<Value> {
    let m = match_data(receiver);
    match name.as_str() {
        "[]" | "at" => match args.len() {
            1 => Ok(el_ref(&m, &args[0])),
            2 => Ok(el_ref_range(&m, &args[0], &args[1])),
            _ => Err(argument_error("wrong number of arguments")),
        },
        "begin" => {
            let n = index_arg(args)?;
            let i = get_sub(&m, n)?;
            Ok(m.captures[i].map_or(Value::Nil, |(s, _)| Value::Number(s as f64)))
        }
        "end" => {
            let n = index_arg(args)?;
            let i = get_sub(&m, n)?;
            Ok(m.captures[i].map_or(Value::Nil, |(_, e)| Value::Number(e as f64)))
        }
        "captures" => Ok(Value::array(
            m.captures[1..]
                .iter()
                .map(|c| c.map_or(Value::Nil, |(s, e)| Value::str(&m.haystack[s..e])))
                .collect(),
        )),
        "offset" => {
            let n = index_arg(args)?;
            let i = get_sub(&m, n)?;
            Ok(match m.captures[i] {
                Some((s, e)) => Value::array(vec![Value::Number(s as f64), Value::Number(e as f64)]),
                None => Value::array(vec![Value::Nil, Value::Nil]),
            })
        }
        "pre_match" => {
            let (start, _) = m.captures.first().copied().flatten().unwrap_or((0, 0));
            Ok(Value::str(&m.haystack[..start]))
        }
        "post_match" => {
            let (_, end) = m.captures.first().copied().flatten().unwrap_or((m.haystack.len(), m.haystack.len()));
            Ok(Value::str(&m.haystack[end..]))
        }
        "size" | "length" => Ok(Value::Number(m.captures.len() as f64)),
        "string" => Ok(Value::str(m.haystack.to_string())),
        "to_a" => Ok(Value::array(
            m.captures
                .iter()
                .map(|c| c.map_or(Value::Nil, |(s, e)| Value::str(&m.haystack[s..e])))
                .collect(),
        )),
        "to_s" => Ok(Value::str(whole(&m))),
        "values_at" => Ok(Value::array(args.iter().map(|a| el_ref(&m, a)).collect())),
        _ => Err(crate::error::no_such_method(format!("undefined method `{name}' for MatchData"))),
    }
}

fn whole(m: &MatchDataInner) -> String {
    m.captures
        .first()
        .copied()
        .flatten()
        .map(|(s, e)| m.haystack[s..e].to_owned())
        .unwrap_or_default()
}

fn index_arg(args: &[Value]) -> SlimResult<i64> {
    match args.first() {
        Some(Value::Number(n)) => Ok(*n as i64),
        _ => Err(argument_error("expected a Number index")),
    }
}

fn el_ref(m: &MatchDataInner, index: &Value) -> Value {
    let Value::Number(n) = index else { return Value::Nil };
    match norm_index(*n as i64, m.captures.len()) {
        Some(i) => m.captures[i].map_or(Value::Nil, |(s, e)| Value::str(&m.haystack[s..e])),
        None => Value::Nil,
    }
}

fn el_ref_range(m: &MatchDataInner, start: &Value, len: &Value) -> Value {
    let (Value::Number(s), Value::Number(l)) = (start, len) else {
        return Value::Nil;
    };
    let Some(start) = norm_index(*s as i64, m.captures.len() + 1) else {
        return Value::Nil;
    };
    let l = (*l as i64).max(0) as usize;
    let out: Vec<Value> = (start..(start + l).min(m.captures.len()))
        .map(|i| m.captures[i].map_or(Value::Nil, |(s, e)| Value::str(&m.haystack[s..e])))
        .collect();
    Value::array(out)
}

/// `Regexp.escape`: every non-alphanumeric ASCII byte is escaped, matching
/// the original's byte-wise `\xHH` approach but rendered as the shorter
/// backslash form when the escaped character is printable punctuation.
#[must_use]
pub fn escape(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    for c in src.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else if c.is_ascii() {
            out.push('\\');
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out
}
