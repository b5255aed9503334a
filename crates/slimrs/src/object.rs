//! Method dispatch (spec §4.1 `method_lookup`) and the `UserObject` extension
//! point (spec §6 "custom value type registration").
//!
//! `parcadei-ouros`'s `object.rs` exposes a public `Object` type that mirrors
//! the internal `Value` one-for-one for embedding-API use; slimrs follows the
//! same split (`Value` is the internal tagged union, dispatch lives here)
//! but keeps a single representation since nothing here needs the
//! arena/heap indirection ouros uses for its GC.

use std::fmt;
use std::rc::Rc;

use crate::error::{no_such_method, SlimResult};
use crate::expr::eval::EvalCtx;
use crate::intern::Symbol;
use crate::types;
use crate::value::Value;

/// The vtable a host-registered custom value type implements (spec §6,
/// §9 "user-extensible types register a method table once at construction").
pub trait SlimObject: fmt::Debug {
    fn type_name(&self) -> &'static str;
    fn to_display_string(&self) -> String;
    fn inspect(&self) -> String {
        self.to_display_string()
    }
    /// Returns `None` for `NoSuchMethod` (let the caller raise), `Some(Err)`
    /// for a method that ran and failed, `Some(Ok)` for success.
    fn call_method(&self, name: Symbol, args: &[Value]) -> Option<SlimResult<Value>>;
}

/// Central dispatch point: spec §4.1 `method_lookup` — "dispatches to a
/// method bound at the variant's table, falling back through a shared
/// `Object` base table".
pub fn call_method(
    receiver: &Value,
    name: Symbol,
    args: &[Value],
    block: Option<&Value>,
    ctx: &mut EvalCtx<'_>,
) -> SlimResult<Value> {
    if let Some(result) = shared_object_method(receiver, name, args) {
        return result;
    }
    match receiver {
        Value::Array(_) => types::array::call(receiver, name, args, block, ctx),
        Value::Hash(_) => types::hash::call(receiver, name, args, block, ctx),
        Value::Str(_) => types::string::call(receiver, name, args, block, ctx),
        Value::Symbol(_) => types::symbol::call(receiver, name, args),
        Value::Number(_) => types::number::call(receiver, name, args),
        Value::Range(_) => types::range::call(receiver, name, args, block, ctx),
        Value::Regexp(_) => types::regexp::call(receiver, name, args),
        Value::MatchData(_) => types::regexp::call_match_data(receiver, name, args),
        Value::Time(_) => types::time::call(receiver, name, args),
        Value::Proc(_) => types::proc_::call(receiver, name, args, ctx),
        Value::Enumerator(_) => types::enumerable::call_enumerator(receiver, name, args, block, ctx),
        Value::Bool(_) | Value::Nil => Err(no_such_method(format!(
            "undefined method `{}' for {}",
            name,
            receiver.type_name()
        ))),
        Value::UserObject(o) => o
            .call_method(name, args)
            .unwrap_or_else(|| Err(no_such_method(format!("undefined method `{name}' for {}", o.type_name())))),
    }
}

/// The shared `Object` base table (spec §4.1): methods every variant answers
/// to regardless of type.
fn shared_object_method(receiver: &Value, name: Symbol, args: &[Value]) -> Option<SlimResult<Value>> {
    match name.as_str() {
        "to_s" if args.is_empty() => Some(Ok(Value::str(receiver.to_display_string()))),
        "inspect" if args.is_empty() => Some(Ok(Value::str(receiver.inspect()))),
        "nil?" if args.is_empty() => Some(Ok(Value::Bool(matches!(receiver, Value::Nil)))),
        "class" if args.is_empty() => Some(Ok(Value::str(receiver.type_name()))),
        "frozen?" if args.is_empty() => Some(Ok(Value::Bool(true))),
        "==" if args.len() == 1 => Some(Ok(Value::Bool(receiver.eq(&args[0])))),
        "!=" if args.len() == 1 => Some(Ok(Value::Bool(!receiver.eq(&args[0])))),
        "<=>" if args.len() == 1 => Some(Ok(receiver
            .cmp_value(&args[0])
            .map_or(Value::Nil, |o| Value::Number(f64::from(o as i8))))),
        "html_safe" if args.is_empty() => Some(Ok(match receiver {
            Value::Str(s) => Value::html_safe_str(s.text.clone()),
            other => Value::html_safe_str(other.to_display_string()),
        })),
        "html_safe?" if args.is_empty() => Some(Ok(Value::Bool(receiver.is_html_safe()))),
        _ => None,
    }
}

/// spec §9 "per-call-site method cache": a single mutable slot recording the
/// variant tag last seen at a given `MemberFuncCall` AST node, so that under
/// the single-threaded evaluation model (spec §5) the second and later hits
/// at that call site can skip re-validating that the receiver is still a
/// `UserObject` of the same shape before going straight to its vtable call.
/// Plain enum-variant dispatch above is already a jump table, so this cache
/// only pays for itself on the one dynamic-dispatch case: `UserObject`.
#[derive(Debug, Default)]
pub struct MethodCache {
    last_user_object: std::cell::Cell<Option<*const ()>>,
}

impl MethodCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `receiver` is the same `UserObject` identity (by
    /// vtable pointer) as the last call through this cache slot.
    pub fn hit(&self, receiver: &Value) -> bool {
        if let Value::UserObject(o) = receiver {
            let ptr = Rc::as_ptr(o).cast::<()>();
            let prev = self.last_user_object.replace(Some(ptr));
            prev == Some(ptr)
        } else {
            self.last_user_object.set(None);
            false
        }
    }
}
