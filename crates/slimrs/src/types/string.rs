//! `String`/`HtmlSafeString` (spec §4.1/§4.2), grounded on
//! `original_source/source/types/String.cpp`.
//!
//! The original indexes by raw byte offset into a `std::string`, decoding
//! UTF-8 by hand wherever it cares about characters (`chars`, `each_char`,
//! `codepoints`). slimrs instead indexes every character-oriented method
//! (`[]`, `slice`, `chr`, `reverse`, ...) by Unicode scalar value via
//! `chars().collect::<Vec<char>>()`, which is both simpler and correct for
//! non-ASCII input the original's raw byte slicing would have split
//! mid-codepoint; `bytes`/`byteslice`/`getbyte`/`bytesize` stay byte-oriented
//! to keep that escape hatch spec.md documents.

use std::rc::Rc;

use crate::error::{argument_error, type_error, SlimResult};
use crate::expr::eval::EvalCtx;
use crate::intern::Symbol;
use crate::types::{enumerable, regexp, want_args};
use crate::value::{StrData, Value};

fn text(receiver: &Value) -> Rc<StrData> {
    match receiver {
        Value::Str(s) => s.clone(),
        _ => unreachable!("string::call always receives a Value::Str"),
    }
}

fn as_str_arg(v: &Value, what: &str) -> SlimResult<Rc<str>> {
    match v {
        Value::Str(s) => Ok(Rc::from(s.text.as_str())),
        other => Err(type_error(format!("{what} requires a String, got {}", other.type_name()))),
    }
}

fn chars_of(s: &str) -> Vec<char> {
    s.chars().collect()
}

fn norm_index(i: i64, len: usize) -> Option<usize> {
    if i >= 0 {
        let i = i as usize;
        (i <= len).then_some(i)
    } else {
        let i = len as i64 + i;
        (i >= 0).then_some(i as usize)
    }
}

pub fn call(
    receiver: &Value,
    name: Symbol,
    args: &[Value],
    block: Option<&Value>,
    ctx: &mut EvalCtx<'_>,
) -> SlimResult<Value> {
    let s = text(receiver);
    match name.as_str() {
        "to_f" | "to_d" => Ok(Value::Number(s.text.trim().parse().unwrap_or(0.0))),
        "to_i" => Ok(Value::Number(parse_leading_int(&s.text))),
        "to_sym" => Ok(Value::symbol(&s.text)),
        "html_safe" => Ok(Value::html_safe_str(s.text.clone())),
        "ascii_only?" => Ok(Value::Bool(s.text.is_ascii())),
        "bytes" => Ok(Value::array(s.text.bytes().map(|b| Value::Number(f64::from(b))).collect())),
        "byteslice" => byteslice(&s.text, args),
        "chars" => Ok(Value::array(chars_of(&s.text).into_iter().map(|c| Value::str(c.to_string())).collect())),
        "chop" => {
            let mut cs = chars_of(&s.text);
            cs.pop();
            Ok(Value::str(cs.into_iter().collect::<String>()))
        }
        "chr" => Ok(Value::str(chars_of(&s.text).first().map_or_else(String::new, ToString::to_string))),
        "codepoints" => Ok(Value::array(s.text.chars().map(|c| Value::Number(f64::from(u32::from(c)))).collect())),
        "getbyte" => {
            want_args("getbyte", args, 1, 1)?;
            let bytes = s.text.as_bytes();
            match &args[0] {
                Value::Number(n) => Ok(norm_index(*n as i64, bytes.len())
                    .filter(|&i| i < bytes.len())
                    .map_or(Value::Nil, |i| Value::Number(f64::from(bytes[i])))),
                other => Err(type_error(format!("getbyte requires a Number, got {}", other.type_name()))),
            }
        }
        "scrub" => Ok(Value::str(s.text.clone())),
        "[]" | "slice" => el_ref(&s.text, args, ctx),
        "capitalize" => {
            let mut cs = chars_of(&s.text);
            if let Some(first) = cs.first_mut() {
                *first = first.to_ascii_uppercase();
            }
            Ok(Value::str(cs.into_iter().collect::<String>()))
        }
        "casecmp" => {
            want_args("casecmp", args, 1, 1)?;
            let other = as_str_arg(&args[0], "casecmp")?;
            Ok(Value::Number(f64::from(
                s.text.to_lowercase().cmp(&other.to_lowercase()) as i8,
            )))
        }
        "center" => pad(&s.text, args, Pad::Center),
        "chomp" => Ok(Value::str(chomp(&s.text, args)?)),
        "downcase" => Ok(Value::str(s.text.to_lowercase())),
        "each_byte" => each_over(
            receiver,
            s.text.bytes().map(|b| Value::Number(f64::from(b))).collect(),
            "each_byte",
            block,
            ctx,
        ),
        "each_char" => each_over(
            receiver,
            chars_of(&s.text).into_iter().map(|c| Value::str(c.to_string())).collect(),
            "each_char",
            block,
            ctx,
        ),
        "each_codepoint" => each_over(
            receiver,
            s.text.chars().map(|c| Value::Number(f64::from(u32::from(c)))).collect(),
            "each_codepoint",
            block,
            ctx,
        ),
        "each_line" => {
            let sep = match args.first() {
                Some(Value::Str(s)) => s.text.clone(),
                _ => "\n".to_owned(),
            };
            each_over(
                receiver,
                split_lines(&s.text, &sep).into_iter().map(Value::str).collect(),
                "each_line",
                block,
                ctx,
            )
        }
        "empty?" => Ok(Value::Bool(s.text.is_empty())),
        "end_with?" => Ok(Value::Bool(args.iter().any(|a| {
            as_str_arg(a, "end_with?").map(|suf| s.text.ends_with(suf.as_ref())).unwrap_or(false)
        }))),
        "gsub" => do_sub(&s.text, args, true, ctx),
        "sub" => do_sub(&s.text, args, false, ctx),
        "hex" => Ok(Value::Number(parse_hex(&s.text))),
        "include?" => {
            want_args("include?", args, 1, 1)?;
            let needle = as_str_arg(&args[0], "include?")?;
            Ok(Value::Bool(s.text.contains(needle.as_ref())))
        }
        "index" => index(&s.text, args, false),
        "rindex" => index(&s.text, args, true),
        "lines" => Ok(Value::array(
            split_lines(&s.text, args.first().map_or("\n", |_| "\n")).into_iter().map(Value::str).collect(),
        )),
        "ljust" => pad(&s.text, args, Pad::Left),
        "rjust" => pad(&s.text, args, Pad::Right),
        "lstrip" => Ok(Value::str(s.text.trim_start().to_owned())),
        "rstrip" => Ok(Value::str(s.text.trim_end().to_owned())),
        "strip" => Ok(Value::str(s.text.trim().to_owned())),
        "match" => do_match(&s.text, args),
        "ord" => chars_of(&s.text)
            .first()
            .map(|c| Value::Number(f64::from(u32::from(*c))))
            .ok_or_else(|| argument_error("empty string")),
        "partition" => partition(&s.text, args, false),
        "rpartition" => partition(&s.text, args, true),
        "reverse" => Ok(Value::str(chars_of(&s.text).into_iter().rev().collect::<String>())),
        "size" | "length" => Ok(Value::Number(chars_of(&s.text).len() as f64)),
        "bytesize" => Ok(Value::Number(s.text.len() as f64)),
        "split" => split(&s.text, args),
        "start_with?" => Ok(Value::Bool(args.iter().any(|a| {
            as_str_arg(a, "start_with?").map(|pre| s.text.starts_with(pre.as_ref())).unwrap_or(false)
        }))),
        "upcase" => Ok(Value::str(s.text.to_uppercase())),
        "+" => {
            want_args("+", args, 1, 1)?;
            let other = as_str_arg(&args[0], "+")?;
            Ok(Value::str(format!("{}{}", s.text, other)))
        }
        "*" => {
            want_args("*", args, 1, 1)?;
            match &args[0] {
                Value::Number(n) if *n >= 0.0 => Ok(Value::str(s.text.repeat(*n as usize))),
                other => Err(argument_error(format!("* requires a non-negative Number, got {}", other.inspect()))),
            }
        }
        _ => enumerable::try_call(receiver, name, args, block, ctx)
            .unwrap_or_else(|| Err(crate::error::no_such_method(format!("undefined method `{name}' for String")))),
    }
}

fn parse_leading_int(s: &str) -> f64 {
    let t = s.trim_start();
    let mut end = 0;
    let bytes = t.as_bytes();
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    t[..end].parse().unwrap_or(0.0)
}

fn parse_hex(s: &str) -> f64 {
    let mut t = s;
    let neg = t.starts_with('-');
    if let Some(rest) = t.strip_prefix(['+', '-']) {
        t = rest;
    }
    let t = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")).unwrap_or(t);
    let end = t.find(|c: char| !c.is_ascii_hexdigit()).unwrap_or(t.len());
    let n = i64::from_str_radix(&t[..end], 16).unwrap_or(0) as f64;
    if neg {
        -n
    } else {
        n
    }
}

fn byteslice(s: &str, args: &[Value]) -> SlimResult<Value> {
    if let [Value::Range(r)] = args {
        let (Value::Number(begin), Value::Number(end)) = (&r.begin, &r.end) else {
            return Err(type_error("Range bounds must be Numbers"));
        };
        let Some((start, len)) = beg_len(*begin, *end, r.exclude_end, s.len()) else {
            return Ok(Value::Nil);
        };
        return Ok(s.get(start..start + len).map_or(Value::Nil, |t| Value::str(t.to_owned())));
    }
    want_args("byteslice", args, 1, 2)?;
    let offset = match &args[0] {
        Value::Number(n) => *n as i64,
        other => return Err(type_error(format!("byteslice requires a Number, got {}", other.type_name()))),
    };
    let len = match args.get(1) {
        Some(Value::Number(n)) => *n as i64,
        None => 1,
        Some(other) => return Err(type_error(format!("byteslice length must be a Number, got {}", other.type_name()))),
    };
    let offset = if offset < 0 { s.len() as i64 + offset } else { offset };
    if offset < 0 || offset as usize >= s.len() || len < 0 {
        return Ok(Value::Nil);
    }
    let start = offset as usize;
    let end = (start + len as usize).min(s.len());
    Ok(s.get(start..end).map_or(Value::Nil, |t| Value::str(t.to_owned())))
}

/// `get_beg_len`: normalizes a `Range`'s begin/end against `seq_len` into a
/// `(start, length)` pair, `None` if out of bounds (grounded on
/// `Range.cpp`'s `get_beg_len`).
fn beg_len(begin: f64, end: f64, exclude_end: bool, seq_len: usize) -> Option<(usize, usize)> {
    let mut start = begin as i64;
    let mut stop = end as i64;
    if start < 0 {
        start += seq_len as i64;
    }
    if stop < 0 {
        stop += seq_len as i64;
    }
    if !exclude_end {
        stop += 1;
    }
    if start < 0 || start as usize > seq_len {
        return None;
    }
    let stop = stop.clamp(start, seq_len as i64);
    Some((start as usize, (stop - start) as usize))
}

fn el_ref(s: &str, args: &[Value], ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let cs = chars_of(s);
    match args {
        [Value::Number(i)] => Ok(slice_chars(&cs, *i as i64, 1)),
        [Value::Regexp(r)] => Ok(match regexp::do_match(r, s, 0) {
            Some(m) => regexp::call_match_data(&m, crate::intern::intern("to_s"), &[]).unwrap_or(Value::Nil),
            None => Value::Nil,
        }),
        [Value::Str(needle)] => Ok(if s.contains(needle.text.as_str()) {
            Value::str(needle.text.clone())
        } else {
            Value::Nil
        }),
        [Value::Range(r)] => {
            let (Value::Number(begin), Value::Number(end)) = (&r.begin, &r.end) else {
                return Err(type_error("Range bounds must be Numbers"));
            };
            match beg_len(*begin, *end, r.exclude_end, cs.len()) {
                Some((start, len)) => Ok(Value::str(cs[start..(start + len).min(cs.len())].iter().collect::<String>())),
                None => Ok(Value::Nil),
            }
        }
        [Value::Regexp(r), idx] => match regexp::do_match(r, s, 0) {
            Some(m) => regexp::call_match_data(&m, crate::intern::intern("[]"), std::slice::from_ref(idx)),
            None => Ok(Value::Nil),
        },
        [start, len] => {
            let start = match start {
                Value::Number(n) => *n as i64,
                other => return Err(type_error(format!("slice start must be a Number, got {}", other.type_name()))),
            };
            let len = match len {
                Value::Number(n) => *n as i64,
                other => return Err(type_error(format!("slice length must be a Number, got {}", other.type_name()))),
            };
            Ok(slice_chars(&cs, start, len))
        }
        _ => {
            let _ = ctx;
            Err(argument_error("wrong number of arguments to slice"))
        }
    }
}

fn slice_chars(cs: &[char], start: i64, len: i64) -> Value {
    if len < 0 {
        return Value::Nil;
    }
    let start = if start < 0 { cs.len() as i64 + start } else { start };
    if start == cs.len() as i64 {
        return Value::str(String::new());
    }
    if start < 0 || start as usize > cs.len() {
        return Value::Nil;
    }
    let start = start as usize;
    let end = (start + len as usize).min(cs.len());
    Value::str(cs[start..end].iter().collect::<String>())
}

enum Pad {
    Left,
    Right,
    Center,
}

fn pad(s: &str, args: &[Value], mode: Pad) -> SlimResult<Value> {
    want_args("pad", args, 1, 2)?;
    let width = match &args[0] {
        Value::Number(n) => *n as i64,
        other => return Err(type_error(format!("width must be a Number, got {}", other.type_name()))),
    };
    let padstr = match args.get(1) {
        Some(Value::Str(p)) => p.text.clone(),
        None => " ".to_owned(),
        Some(other) => return Err(type_error(format!("pad string must be a String, got {}", other.type_name()))),
    };
    if padstr.is_empty() {
        return Err(argument_error("zero width padding"));
    }
    let cs = chars_of(s);
    if width <= cs.len() as i64 {
        return Ok(Value::str(s.to_owned()));
    }
    let pad_chars: Vec<char> = padstr.chars().collect();
    let fill = |n: usize| -> String { (0..n).map(|i| pad_chars[i % pad_chars.len()]).collect() };
    let total = width as usize - cs.len();
    Ok(Value::str(match mode {
        Pad::Left => format!("{}{}", s, fill(total)),
        Pad::Right => format!("{}{}", fill(total), s),
        Pad::Center => {
            let left = total / 2;
            let right = total - left;
            format!("{}{}{}", fill(left), s, fill(right))
        }
    }))
}

fn chomp(s: &str, args: &[Value]) -> SlimResult<String> {
    match args.first() {
        None => Ok(s
            .strip_suffix("\r\n")
            .or_else(|| s.strip_suffix('\n'))
            .or_else(|| s.strip_suffix('\r'))
            .unwrap_or(s)
            .to_owned()),
        Some(Value::Str(sep)) if sep.text.is_empty() => Ok(s.trim_end_matches(['\r', '\n']).to_owned()),
        Some(Value::Str(sep)) => Ok(s.strip_suffix(sep.text.as_str()).unwrap_or(s).to_owned()),
        Some(other) => Err(type_error(format!("chomp separator must be a String, got {}", other.type_name()))),
    }
}

fn split_lines(s: &str, sep: &str) -> Vec<String> {
    if sep.is_empty() {
        let mut out = Vec::new();
        let mut rest = s;
        loop {
            match rest.find("\n\n") {
                Some(p) => {
                    let after = rest[p + 2..].trim_start_matches('\n');
                    let consumed = rest.len() - after.len();
                    out.push(rest[..consumed].to_owned());
                    rest = after;
                    if rest.is_empty() {
                        break;
                    }
                }
                None => {
                    if !rest.is_empty() {
                        out.push(rest.to_owned());
                    }
                    break;
                }
            }
        }
        return out;
    }
    let mut out = Vec::new();
    let mut rest = s;
    while !rest.is_empty() {
        match rest.find(sep) {
            Some(p) => {
                let end = p + sep.len();
                out.push(rest[..end].to_owned());
                rest = &rest[end..];
            }
            None => {
                out.push(rest.to_owned());
                break;
            }
        }
    }
    out
}

fn index(s: &str, args: &[Value], reverse: bool) -> SlimResult<Value> {
    if args.is_empty() {
        return Err(argument_error("wrong number of arguments (given 0, expected 1..2)"));
    }
    let default_offset = if reverse { chars_of(s).len() as i64 } else { 0 };
    let offset = match args.get(1) {
        Some(Value::Number(n)) => *n as i64,
        _ => default_offset,
    };
    let cs = chars_of(s);
    let offset = if offset < 0 { cs.len() as i64 + offset } else { offset };
    if offset < 0 {
        return Ok(Value::Nil);
    }
    match &args[0] {
        Value::Regexp(r) => {
            let byte_pos: usize = cs.iter().take(offset as usize).map(|c| c.len_utf8()).sum();
            if reverse {
                let clamped = byte_pos.min(s.len().saturating_sub(1)) + 1;
                match regexp::do_rmatch(r, s, clamped) {
                    Some((start, _)) => Ok(Value::Number(s[..start].chars().count() as f64)),
                    None => Ok(Value::Nil),
                }
            } else {
                match regexp::do_match(r, s, byte_pos as i64) {
                    Some(Value::MatchData(m)) => Ok(m
                        .captures
                        .first()
                        .copied()
                        .flatten()
                        .map_or(Value::Nil, |(start, _)| Value::Number(s[..start].chars().count() as f64))),
                    _ => Ok(Value::Nil),
                }
            }
        }
        Value::Str(needle) => {
            if offset as usize > cs.len() {
                return Ok(Value::Nil);
            }
            let byte_pos: usize = cs.iter().take(offset as usize).map(|c| c.len_utf8()).sum();
            let found = if reverse {
                s[..byte_pos.min(s.len())].rfind(needle.text.as_str())
            } else {
                s[byte_pos..].find(needle.text.as_str()).map(|p| p + byte_pos)
            };
            Ok(found.map_or(Value::Nil, |p| Value::Number(s[..p].chars().count() as f64)))
        }
        other => Err(argument_error(format!("expected a String or Regexp, got {}", other.type_name()))),
    }
}

fn each_over(receiver: &Value, items: Vec<Value>, method: &str, block: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
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
        None => Ok(enumerable::make_enumerator(receiver.clone(), crate::intern::intern(method), Vec::new())),
    }
}

fn do_match(s: &str, args: &[Value]) -> SlimResult<Value> {
    want_args("match", args, 1, 2)?;
    let regexp_value = match &args[0] {
        Value::Regexp(_) => args[0].clone(),
        Value::Str(pat) => regexp::compile(&pat.text, crate::value::RegexpFlags::empty())?,
        other => return Err(type_error(format!("match requires a String or Regexp, got {}", other.type_name()))),
    };
    let Value::Regexp(r) = &regexp_value else {
        unreachable!()
    };
    let pos = match args.get(1) {
        Some(Value::Number(n)) => *n as i64,
        _ => 0,
    };
    Ok(regexp::do_match(r, s, pos).unwrap_or(Value::Nil))
}

fn partition(s: &str, args: &[Value], reverse: bool) -> SlimResult<Value> {
    want_args("partition", args, 1, 1)?;
    match &args[0] {
        Value::Str(sep) => {
            let pos = if reverse { s.rfind(sep.text.as_str()) } else { s.find(sep.text.as_str()) };
            match pos {
                Some(p) => Ok(Value::array(vec![
                    Value::str(s[..p].to_owned()),
                    Value::str(sep.text.clone()),
                    Value::str(s[p + sep.text.len()..].to_owned()),
                ])),
                None => Ok(no_match_partition(s, reverse)),
            }
        }
        Value::Regexp(r) => {
            if reverse {
                match regexp::do_rmatch(r, s, s.len()) {
                    Some((start, end)) => Ok(Value::array(vec![
                        Value::str(s[..start].to_owned()),
                        Value::str(s[start..end].to_owned()),
                        Value::str(s[end..].to_owned()),
                    ])),
                    None => Ok(no_match_partition(s, reverse)),
                }
            } else {
                match regexp::do_match(r, s, 0) {
                    Some(Value::MatchData(m)) => {
                        let (start, end) = m.captures.first().copied().flatten().unwrap_or((0, 0));
                        Ok(Value::array(vec![
                            Value::str(s[..start].to_owned()),
                            Value::str(s[start..end].to_owned()),
                            Value::str(s[end..].to_owned()),
                        ]))
                    }
                    _ => Ok(no_match_partition(s, reverse)),
                }
            }
        }
        other => Err(type_error(format!("partition requires a String or Regexp, got {}", other.type_name()))),
    }
}

fn no_match_partition(s: &str, reverse: bool) -> Value {
    if reverse {
        Value::array(vec![Value::str(String::new()), Value::str(String::new()), Value::str(s.to_owned())])
    } else {
        Value::array(vec![Value::str(s.to_owned()), Value::str(String::new()), Value::str(String::new())])
    }
}

fn replacement_text(replace: &Value, matched: &str, m: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<String> {
    match replace {
        Value::Str(template) => {
            let mut out = String::new();
            let bytes = template.text.as_bytes();
            let mut i = 0;
            while i < bytes.len() {
                if bytes[i] == b'\\' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit() {
                    let n = (bytes[i + 1] - b'0') as i64;
                    if n == 0 {
                        out.push_str(matched);
                    } else if let Some(Value::MatchData(md)) = m {
                        if let Some(Some((s, e))) = md.captures.get(n as usize) {
                            out.push_str(&md.haystack[*s..*e]);
                        }
                    }
                    i += 2;
                } else {
                    let ch_len = template.text[i..].chars().next().map_or(1, char::len_utf8);
                    out.push_str(&template.text[i..i + ch_len]);
                    i += ch_len;
                }
            }
            Ok(out)
        }
        Value::Hash(h) => {
            let v = h.borrow().entries.get(&crate::value::HashKey(Value::str(matched.to_owned()))).cloned();
            Ok(v.map_or_else(String::new, |v| v.to_display_string()))
        }
        Value::Proc(p) => {
            let result = crate::expr::eval::call_proc(p, &[Value::str(matched.to_owned())], ctx)?;
            Ok(result.to_display_string())
        }
        other => Err(argument_error(format!("invalid replacement type: {}", other.type_name()))),
    }
}

fn do_sub(s: &str, args: &[Value], global: bool, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    want_args(if global { "gsub" } else { "sub" }, args, 2, 2)?;
    let replace = args[1].clone();
    match &args[0] {
        Value::Regexp(r) => {
            let mut out = String::new();
            let mut pos = 0usize;
            loop {
                let Some(m) = regexp::do_match(r, s, pos as i64) else {
                    break;
                };
                let Value::MatchData(md) = &m else { break };
                let (start, end) = md.captures.first().copied().flatten().unwrap_or((pos, pos));
                out.push_str(&s[pos..start]);
                out.push_str(&replacement_text(&replace, &s[start..end], Some(&m), ctx)?);
                pos = if end > start { end } else { end + 1 };
                if !global || pos > s.len() {
                    break;
                }
            }
            out.push_str(s.get(pos..).unwrap_or(""));
            Ok(Value::str(out))
        }
        Value::Str(needle) => {
            if needle.text.is_empty() {
                return Ok(Value::str(s.to_owned()));
            }
            let mut out = String::new();
            let mut rest = s;
            loop {
                match rest.find(needle.text.as_str()) {
                    Some(p) => {
                        out.push_str(&rest[..p]);
                        out.push_str(&replacement_text(&replace, &needle.text, None, ctx)?);
                        rest = &rest[p + needle.text.len()..];
                        if !global {
                            break;
                        }
                    }
                    None => break,
                }
            }
            out.push_str(rest);
            Ok(Value::str(out))
        }
        other => Err(type_error(format!("sub/gsub pattern must be a String or Regexp, got {}", other.type_name()))),
    }
}

fn split(s: &str, args: &[Value]) -> SlimResult<Value> {
    let limit = match args.get(1) {
        Some(Value::Number(n)) => *n as i64,
        _ => 0,
    };
    let suppress_nulls = limit >= 0;
    let limit = limit.max(0);

    let mut out: Vec<String> = match args.first() {
        None => split_whitespace(s, limit),
        Some(Value::Str(sep)) if sep.text == " " => split_whitespace(s, limit),
        Some(Value::Str(sep)) if sep.text.is_empty() => split_chars(s, limit),
        Some(Value::Str(sep)) => split_literal(s, &sep.text, limit),
        Some(Value::Regexp(r)) => split_regex(s, r, limit),
        Some(other) => return Err(type_error(format!("split pattern must be a String or Regexp, got {}", other.type_name()))),
    };

    if suppress_nulls {
        while out.last().is_some_and(String::is_empty) {
            out.pop();
        }
    }
    Ok(Value::array(out.into_iter().map(Value::str).collect()))
}

fn split_whitespace(s: &str, limit: i64) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = s.trim_start_matches([' ', '\t', '\n', '\r']);
    while !rest.is_empty() {
        if limit > 0 && out.len() as i64 + 1 == limit {
            out.push(rest.to_owned());
            break;
        }
        match rest.find([' ', '\t', '\n', '\r']) {
            Some(p) => {
                out.push(rest[..p].to_owned());
                rest = rest[p..].trim_start_matches([' ', '\t', '\n', '\r']);
            }
            None => {
                out.push(rest.to_owned());
                break;
            }
        }
    }
    out
}

fn split_chars(s: &str, limit: i64) -> Vec<String> {
    let mut out = Vec::new();
    for (i, c) in s.char_indices() {
        if limit > 0 && out.len() as i64 + 1 == limit {
            out.push(s[i..].to_owned());
            return out;
        }
        out.push(c.to_string());
    }
    out
}

fn split_literal(s: &str, sep: &str, limit: i64) -> Vec<String> {
    let mut out = Vec::new();
    let mut pos = 0;
    while limit == 0 || limit > out.len() as i64 + 1 {
        match s[pos..].find(sep) {
            Some(p) => {
                out.push(s[pos..pos + p].to_owned());
                pos += p + sep.len();
            }
            None => break,
        }
    }
    out.push(s[pos..].to_owned());
    out
}

fn split_regex(s: &str, r: &crate::value::RegexpData, limit: i64) -> Vec<String> {
    let mut out = Vec::new();
    let mut pos = 0usize;
    while (limit == 0 || limit > out.len() as i64 + 1) && pos <= s.len() {
        let Some(caps) = r.compiled.captures(&s[pos..]) else { break };
        let m0 = caps.get(0).unwrap();
        let (mstart, mend) = (pos + m0.start(), pos + m0.end());
        if mstart == mend {
            if mstart >= s.len() {
                break;
            }
            let next = s[mstart..].chars().next().map_or(1, char::len_utf8) + mstart;
            out.push(s[pos..next].to_owned());
            pos = next;
        } else {
            out.push(s[pos..mstart].to_owned());
            pos = mend;
        }
        for i in 1..caps.len() {
            if let Some(c) = caps.get(i) {
                out.push(c.as_str().to_owned());
            }
        }
    }
    out.push(s[pos.min(s.len())..].to_owned());
    out
}
