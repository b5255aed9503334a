//! The runtime value model (component C1 of the spec).
//!
//! `Value` is the tagged-union equivalent of `parcadei-ouros`'s `Value` enum
//! in `value.rs`, scaled to this spec's variant list (spec §3) and to the
//! ownership model spec §9 calls for directly: "shared ownership... cheap to
//! duplicate (ref-counted) for scalars and referenced by handle for
//! collections" — so slimrs uses plain `Rc`/`Rc<RefCell<_>>` rather than
//! ouros's arena/heap-id indirection, which exists there to support a
//! multi-generational GC and bytecode snapshotting that this spec explicitly
//! has no use for (no cycles arise: blocks capture scopes by `Rc`, and scopes
//! never hold a forward reference to a block they create).

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::error::{unorderable_type, SlimResult};
use crate::expr::ast::Expr;
use crate::intern::Symbol;
use crate::object::SlimObject;
use crate::scope::Scope;
use crate::template::ast::Node as TemplateNode;

/// One entry in a `Hash` literal/value: insertion order is preserved by
/// `HashData.entries` (an `IndexMap`); `HashKey` only exists to give `Value`
/// the `Eq`/`Hash` impls `IndexMap` needs, delegating to the same rules as
/// `Value::eq`/`Value::hash_value` (spec invariant 3: eq/hash consistency).
#[derive(Debug, Clone)]
pub struct HashKey(pub Value);

impl PartialEq for HashKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}
impl Eq for HashKey {}
impl Hash for HashKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash_value());
    }
}

#[derive(Debug)]
pub struct HashData {
    pub entries: indexmap::IndexMap<HashKey, Value>,
    pub default: Option<Value>,
}

#[derive(Debug)]
pub struct RangeData {
    pub begin: Value,
    pub end: Value,
    pub exclude_end: bool,
}

bitflags::bitflags! {
    /// Regexp compile flags (spec §4.2). `MULTILINE`/`EXTENDED` are accepted
    /// syntactically but rejected at compile time (spec Open Questions).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RegexpFlags: u8 {
        const IGNORECASE = 0b001;
        const EXTENDED   = 0b010;
        const MULTILINE  = 0b100;
    }
}

#[derive(Debug)]
pub struct RegexpData {
    pub source: String,
    pub flags: RegexpFlags,
    pub compiled: regex::Regex,
}

#[derive(Debug)]
pub struct MatchDataInner {
    pub regexp: Value,
    pub haystack: Rc<str>,
    /// Byte-offset spans per capture group; index 0 is the whole match.
    pub captures: Vec<Option<(usize, usize)>>,
}

/// How a `ProcBody::Render` writes its rendered output (spec §4.7/§9
/// `content_for`/`ForEach` synthesis — both are "a template child block
/// re-entered as a Proc", but they differ in where the bytes land).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Writes straight into the surrounding output buffer; the call
    /// returns `Nil` (spec §3 `ForEach`).
    Inline,
    /// Writes into a fresh buffer and returns the result as an
    /// `HtmlSafeString` (spec §6/§9 `content_for`).
    Isolated,
}

/// The body a `Proc` runs when called (spec §4.2 Proc, and §4.7's
/// block-based `each`/`content_for` synthesis).
pub enum ProcBody {
    /// An expression-language block: `{ |x| expr }` / `do |x| expr end`.
    Expr(Rc<Expr>),
    /// A template child block re-entered by `ForEach`/`content_for`; see
    /// `RenderMode` for the two ways this can write its output.
    Render(Rc<TemplateNode>, RenderMode),
    /// A host-implemented block, used internally to materialize an
    /// `Enumerator`'s captured `each` call into a plain `Vec<Value>` without
    /// inventing a fake AST node for it.
    Native(Rc<dyn Fn(&[Value]) -> SlimResult<Value>>),
}

impl fmt::Debug for ProcBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcBody::Expr(_) => write!(f, "ProcBody::Expr"),
            ProcBody::Render(_, mode) => write!(f, "ProcBody::Render({mode:?})"),
            ProcBody::Native(_) => write!(f, "ProcBody::Native"),
        }
    }
}

#[derive(Debug)]
pub struct ProcData {
    pub params: Vec<Symbol>,
    pub body: ProcBody,
    pub scope: Rc<Scope>,
}

#[derive(Debug)]
pub struct EnumeratorData {
    pub source: Value,
    pub method: Symbol,
    pub args: Vec<Value>,
}

/// Runtime value variants (spec §3). `Str` unifies the spec's `String` and
/// `HtmlSafeString` into one variant with an `html_safe` flag, since spec
/// itself states they are "behaviorally... identical in every method" and
/// differ only in a tag the renderer consults — see DESIGN.md for this
/// decision.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(Rc<StrData>),
    Symbol(Symbol),
    Array(Rc<RefCell<Vec<Value>>>),
    Hash(Rc<RefCell<HashData>>),
    Range(Rc<RangeData>),
    Regexp(Rc<RegexpData>),
    MatchData(Rc<MatchDataInner>),
    /// Seconds since the Unix epoch, UTC only (spec §4.2 Time, Open Question
    /// on non-UTC offsets).
    Time(i64),
    Proc(Rc<ProcData>),
    Enumerator(Rc<EnumeratorData>),
    UserObject(Rc<dyn SlimObject>),
}

#[derive(Debug)]
pub struct StrData {
    pub text: String,
    pub html_safe: bool,
}

impl Value {
    #[must_use]
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(Rc::new(StrData {
            text: s.into(),
            html_safe: false,
        }))
    }

    #[must_use]
    pub fn html_safe_str(s: impl Into<String>) -> Self {
        Value::Str(Rc::new(StrData {
            text: s.into(),
            html_safe: true,
        }))
    }

    #[must_use]
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    #[must_use]
    pub fn symbol(name: &str) -> Self {
        Value::Symbol(crate::intern::intern(name))
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(&s.text),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_html_safe(&self) -> bool {
        matches!(self, Value::Str(s) if s.html_safe)
    }

    /// spec §3: "a type name string".
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "NilClass",
            Value::Bool(_) => "Boolean",
            Value::Number(_) => "Number",
            Value::Str(_) => "String",
            Value::Symbol(_) => "Symbol",
            Value::Array(_) => "Array",
            Value::Hash(_) => "Hash",
            Value::Range(_) => "Range",
            Value::Regexp(_) => "Regexp",
            Value::MatchData(_) => "MatchData",
            Value::Time(_) => "Time",
            Value::Proc(_) => "Proc",
            Value::Enumerator(_) => "Enumerator",
            Value::UserObject(o) => o.type_name(),
        }
    }

    /// spec §4.1: "only `Nil` and `FalseBool` are false".
    #[must_use]
    pub fn is_true(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// spec §4.1 `eq`: same-variant structural equality only.
    #[must_use]
    pub fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a.text == b.text,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.eq(y))
            }
            (Value::Hash(a), Value::Hash(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                a.entries.len() == b.entries.len()
                    && a.entries.iter().all(|(k, v)| {
                        b.entries.get(k).is_some_and(|bv| bv.eq(v))
                    })
            }
            (Value::Range(a), Value::Range(b)) => {
                a.begin.eq(&b.begin) && a.end.eq(&b.end) && a.exclude_end == b.exclude_end
            }
            (Value::Regexp(a), Value::Regexp(b)) => a.source == b.source && a.flags == b.flags,
            (Value::MatchData(a), Value::MatchData(b)) => Rc::ptr_eq(a, b),
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Proc(a), Value::Proc(b)) => Rc::ptr_eq(a, b),
            (Value::Enumerator(a), Value::Enumerator(b)) => Rc::ptr_eq(a, b),
            (Value::UserObject(a), Value::UserObject(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// spec §4.1 `cmp`.
    pub fn cmp_value(&self, other: &Value) -> SlimResult<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                a.partial_cmp(b).ok_or_else(|| unorderable_type("NaN is unorderable"))
            }
            (Value::Str(a), Value::Str(b)) => Ok(a.text.cmp(&b.text)),
            (Value::Symbol(a), Value::Symbol(b)) => Ok(a.as_str().cmp(b.as_str())),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (Value::Time(a), Value::Time(b)) => Ok(a.cmp(b)),
            (Value::Array(a), Value::Array(b)) => {
                // spec invariant 4: lexicographic, then length.
                let (a, b) = (a.borrow(), b.borrow());
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.cmp_value(y)? {
                        Ordering::Equal => continue,
                        other => return Ok(other),
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            _ => Err(unorderable_type(format!(
                "comparison of {} with {} failed",
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    /// spec §4.1 `hash`: must be consistent with `eq`.
    #[must_use]
    pub fn hash_value(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut h = DefaultHasher::new();
        std::mem::discriminant(self).hash(&mut h);
        match self {
            Value::Nil => {}
            Value::Bool(b) => b.hash(&mut h),
            Value::Number(n) => n.to_bits().hash(&mut h),
            Value::Str(s) => s.text.hash(&mut h),
            Value::Symbol(s) => s.hash(&mut h),
            Value::Array(a) => {
                for item in a.borrow().iter() {
                    item.hash_value().hash(&mut h);
                }
            }
            Value::Hash(map) => {
                // Order-independent: xor the per-entry hashes.
                let mut acc: u64 = 0;
                for (k, v) in &map.borrow().entries {
                    let mut eh = DefaultHasher::new();
                    k.0.hash_value().hash(&mut eh);
                    v.hash_value().hash(&mut eh);
                    acc ^= eh.finish();
                }
                acc.hash(&mut h);
            }
            Value::Range(r) => {
                r.begin.hash_value().hash(&mut h);
                r.end.hash_value().hash(&mut h);
                r.exclude_end.hash(&mut h);
            }
            Value::Regexp(r) => {
                r.source.hash(&mut h);
                r.flags.bits().hash(&mut h);
            }
            Value::Time(t) => t.hash(&mut h),
            Value::MatchData(m) => (Rc::as_ptr(m) as usize).hash(&mut h),
            Value::Proc(p) => (Rc::as_ptr(p) as *const () as usize).hash(&mut h),
            Value::Enumerator(e) => (Rc::as_ptr(e) as *const () as usize).hash(&mut h),
            Value::UserObject(o) => (Rc::as_ptr(o) as *const () as usize).hash(&mut h),
        }
        h.finish()
    }

    /// spec §3 `to_string`: display form.
    #[must_use]
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Nil => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.text.clone(),
            Value::Symbol(s) => s.as_str().to_owned(),
            Value::Array(a) => a
                .borrow()
                .iter()
                .map(Value::to_display_string)
                .collect::<Vec<_>>()
                .join(""),
            Value::Hash(_) => self.inspect(),
            Value::Range(r) => format!(
                "{}{}{}",
                r.begin.to_display_string(),
                if r.exclude_end { "..." } else { ".." },
                r.end.to_display_string()
            ),
            Value::Regexp(r) => format!("(?{}-mix:{})", flags_str(r.flags), r.source),
            Value::MatchData(m) => whole_match(m).unwrap_or_default().to_owned(),
            Value::Time(t) => crate::types::time::to_display_string(*t),
            Value::Proc(_) => "#<Proc>".to_owned(),
            Value::Enumerator(_) => "#<Enumerator>".to_owned(),
            Value::UserObject(o) => o.to_display_string(),
        }
    }

    /// spec §3 `inspect`: debug form (quotes strings, escapes).
    #[must_use]
    pub fn inspect(&self) -> String {
        match self {
            Value::Nil => "nil".to_owned(),
            Value::Str(s) => inspect_string(&s.text),
            Value::Symbol(s) => format!(":{}", s.as_str()),
            Value::Array(a) => {
                let items: Vec<String> = a.borrow().iter().map(Value::inspect).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Hash(h) => {
                let entries: Vec<String> = h
                    .borrow()
                    .entries
                    .iter()
                    .map(|(k, v)| format!("{} => {}", k.0.inspect(), v.inspect()))
                    .collect();
                format!("{{{}}}", entries.join(", "))
            }
            _ => self.to_display_string(),
        }
    }

    #[must_use]
    pub fn is_variant_same(&self, other: &Value) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

fn whole_match(m: &MatchDataInner) -> Option<&str> {
    let (start, end) = m.captures.first().copied().flatten()?;
    m.haystack.get(start..end)
}

fn flags_str(flags: RegexpFlags) -> String {
    let mut s = String::new();
    if flags.contains(RegexpFlags::MULTILINE) {
        s.push('m');
    }
    if flags.contains(RegexpFlags::IGNORECASE) {
        s.push('i');
    }
    if flags.contains(RegexpFlags::EXTENDED) {
        s.push('x');
    }
    s
}

/// Ruby-style number formatting: integral floats print without a trailing
/// `.0` is NOT applied here (Ruby keeps `1.0` as `"1.0"`); only the `to_i`
/// truncation (spec §4.1) drops the fraction.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_owned();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity".to_owned() } else { "-Infinity".to_owned() };
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.1}")
    } else {
        format!("{n}")
    }
}

fn inspect_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value::{}({})", self.type_name(), self.inspect())
    }
}

