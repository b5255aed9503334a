//! Tree-walking evaluator (component C5, spec §4.5).
//!
//! Grounded on `parcadei-ouros`'s `eval.rs` dispatch-by-node-kind shape, but
//! without its bytecode-compilation step: this evaluator walks the `Expr`
//! tree directly, matching spec §9's "interpreter-first" design note.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{no_such_method, type_error, BreakSignal, SlimResult};
use crate::expr::ast::{AssignTarget, BinOp, Expr, StrFrag, UnOp};
use crate::intern::Symbol;
use crate::object::{self, MethodCache};
use crate::scope::Scope;
use crate::value::{ProcBody, ProcData, RenderMode, Value};

/// Threaded through every `eval_expr` call. Carries the current lexical
/// scope, the template file name (used only to annotate errors, spec §7),
/// and, while a render is in progress, the buffer `ProcBody::Render` procs
/// write into (see `call_proc` and `template::render`).
pub struct EvalCtx<'a> {
    pub scope: Rc<Scope>,
    pub file_name: Option<&'a str>,
    pub render_buf: Option<Rc<RefCell<String>>>,
    /// Set by `Expr::Break` while evaluating a block body, and consumed by
    /// whichever `each`-family implementation invoked that block (spec §7:
    /// "must never escape Enumerable implementations"). `None` the rest of
    /// the time.
    pub break_signal: Option<BreakSignal>,
}

impl<'a> EvalCtx<'a> {
    #[must_use]
    pub fn new(scope: Rc<Scope>, file_name: Option<&'a str>) -> Self {
        Self {
            scope,
            file_name,
            render_buf: None,
            break_signal: None,
        }
    }

    #[must_use]
    pub fn with_render_buf(scope: Rc<Scope>, file_name: Option<&'a str>, buf: Rc<RefCell<String>>) -> Self {
        Self {
            scope,
            file_name,
            render_buf: Some(buf),
            break_signal: None,
        }
    }

    /// Consumes a pending `break` value, if the block just evaluated hit one.
    /// Called by every `each`-family implementation right after invoking its
    /// block, the way the original's `catch (const BreakException &e)`
    /// unwinds to the nearest enclosing `each`.
    pub fn take_break(&mut self) -> Option<crate::value::Value> {
        self.break_signal.take().map(|b| b.0)
    }

    /// Runs `f` with `scope` swapped in for the duration of the call, then
    /// restores the previous scope — used to enter a block/iteration frame.
    fn with_scope<T>(&mut self, scope: Rc<Scope>, f: impl FnOnce(&mut Self) -> SlimResult<T>) -> SlimResult<T> {
        let saved = std::mem::replace(&mut self.scope, scope);
        let result = f(self);
        self.scope = saved;
        result
    }

    fn err_here(&self, e: crate::error::SlimError) -> crate::error::SlimError {
        match self.file_name {
            Some(f) => e.in_file(f),
            None => e,
        }
    }
}

/// Evaluates one expression node (spec §4.5's per-node-kind rules).
pub fn eval_expr(expr: &Expr, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    match expr {
        Expr::Literal(v, _) => Ok(v.clone()),
        Expr::Variable(name, _) => Ok(ctx.scope.get(*name).unwrap_or(Value::Nil)),
        Expr::Attribute(name, _) => Ok(ctx.scope.get_attr(*name)),
        Expr::GlobalConstant(name, _) => ctx
            .scope
            .view_model
            .borrow()
            .get_constant(*name)
            .map_err(|e| ctx.err_here(e).at(expr.pos())),
        Expr::ConstantNav(base, name, pos) => {
            let base_val = eval_expr(base, ctx)?;
            object::call_method(&base_val, *name, &[], None, ctx).map_err(|e| e.at(*pos))
        }
        Expr::Assign(target, rhs, _) => {
            let v = eval_expr(rhs, ctx)?;
            match target {
                AssignTarget::Local(name) => ctx.scope.set(*name, v.clone()),
                AssignTarget::Attr(name) => ctx.scope.view_model.borrow_mut().set_attr(*name, v.clone()),
            }
            Ok(v)
        }
        Expr::GlobalCall(name, args, block, pos) => {
            let arg_vals = eval_args(args, ctx)?;
            let block_val = eval_block_opt(block.as_deref(), ctx)?;
            eval_global_call(*name, &arg_vals, block_val.as_ref(), ctx).map_err(|e| e.at(*pos))
        }
        Expr::MemberCall(receiver, name, args, block, cache, pos) => {
            eval_member_call(receiver, *name, args, block.as_deref(), cache, false, ctx).map_err(|e| e.at(*pos))
        }
        Expr::SafeMemberCall(receiver, name, args, block, cache, pos) => {
            eval_member_call(receiver, *name, args, block.as_deref(), cache, true, ctx).map_err(|e| e.at(*pos))
        }
        Expr::ElementRef(receiver, args, pos) => {
            let recv = eval_expr(receiver, ctx)?;
            let arg_vals = eval_args(args, ctx)?;
            object::call_method(&recv, crate::intern::intern("[]"), &arg_vals, None, ctx).map_err(|e| e.at(*pos))
        }
        Expr::ArrayLit(items, _) => Ok(Value::array(eval_args(items, ctx)?)),
        Expr::HashLit(pairs, _) => {
            let mut entries = indexmap::IndexMap::new();
            for (k, v) in pairs {
                let kv = eval_expr(k, ctx)?;
                let vv = eval_expr(v, ctx)?;
                entries.insert(crate::value::HashKey(kv), vv);
                if ctx.break_signal.is_some() {
                    break;
                }
            }
            Ok(Value::Hash(Rc::new(std::cell::RefCell::new(crate::value::HashData {
                entries,
                default: None,
            }))))
        }
        Expr::RangeLit(begin, end, exclude, _) => {
            let b = eval_expr(begin, ctx)?;
            let e = eval_expr(end, ctx)?;
            Ok(Value::Range(Rc::new(crate::value::RangeData {
                begin: b,
                end: e,
                exclude_end: *exclude,
            })))
        }
        // spec §4.5: evaluating a Block node does NOT run its body — it
        // produces a `Proc` closing over the current scope.
        Expr::Block(params, body, _) => Ok(Value::Proc(Rc::new(ProcData {
            params: params.clone(),
            body: ProcBody::Expr(body.clone()),
            scope: ctx.scope.clone(),
        }))),
        Expr::Conditional(cond, then_b, else_b, _) => {
            if eval_expr(cond, ctx)?.is_true() {
                eval_expr(then_b, ctx)
            } else {
                eval_expr(else_b, ctx)
            }
        }
        Expr::InterpString(frags, _) => {
            let mut out = String::new();
            for f in frags {
                match f {
                    StrFrag::Text(t) => out.push_str(t),
                    StrFrag::Expr(e) => out.push_str(&eval_expr(e, ctx)?.to_display_string()),
                }
                if ctx.break_signal.is_some() {
                    break;
                }
            }
            Ok(Value::str(out))
        }
        Expr::InterpRegex(frags, flags, pos) => {
            let mut src = String::new();
            for f in frags {
                match f {
                    StrFrag::Text(t) => src.push_str(t),
                    StrFrag::Expr(e) => src.push_str(&eval_expr(e, ctx)?.to_display_string()),
                }
            }
            crate::types::regexp::compile(&src, *flags).map_err(|e| e.at(*pos))
        }
        Expr::Unary(op, operand, pos) => {
            let v = eval_expr(operand, ctx)?;
            eval_unary(*op, &v).map_err(|e| e.at(*pos))
        }
        Expr::Binary(op, lhs, rhs, pos) => eval_binary(*op, lhs, rhs, ctx).map_err(|e| e.at(*pos)),
        Expr::Break(value, _) => {
            let v = match value {
                Some(e) => eval_expr(e, ctx)?,
                None => Value::Nil,
            };
            ctx.break_signal = Some(BreakSignal(v.clone()));
            Ok(v)
        }
    }
}

fn eval_args(args: &[Expr], ctx: &mut EvalCtx<'_>) -> SlimResult<Vec<Value>> {
    let mut out = Vec::with_capacity(args.len());
    for a in args {
        out.push(eval_expr(a, ctx)?);
        if ctx.break_signal.is_some() {
            break;
        }
    }
    Ok(out)
}

fn eval_block_opt(block: Option<&Expr>, ctx: &mut EvalCtx<'_>) -> SlimResult<Option<Value>> {
    block.map(|b| eval_expr(b, ctx)).transpose()
}

/// `content_for`/`yield` are always-available builtins (spec §6/§9's layout
/// machinery, grounded on `original_source/tests/template/Layout.cpp`), not
/// helpers a host registers — so they are checked ahead of the ViewModel
/// helper table rather than living in it.
fn eval_global_call(name: Symbol, args: &[Value], block: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    if name == crate::intern::intern("content_for") {
        return eval_content_for(args, block, ctx).map_err(|e| ctx.err_here(e));
    }
    if name == crate::intern::intern("yield") {
        let target = match args.first() {
            None => None,
            Some(Value::Symbol(s)) => Some(*s),
            Some(other) => return Err(ctx.err_here(type_error(format!("yield expects a Symbol, got {}", other.type_name())))),
        };
        return Ok(ctx.scope.view_model.borrow().yield_content(target));
    }
    if let Some(helper) = ctx.scope.view_model.borrow().get_helper(name) {
        return helper(args).map_err(|e| ctx.err_here(e));
    }
    Err(ctx.err_here(no_such_method(format!("undefined method `{name}'"))))
}

fn eval_content_for(args: &[Value], block: Option<&Value>, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    let name = match args.first() {
        Some(Value::Symbol(s)) => *s,
        Some(other) => return Err(type_error(format!("content_for expects a Symbol, got {}", other.type_name()))),
        None => return Err(crate::error::argument_count_error("content_for requires a name argument")),
    };
    let proc_val = block.ok_or_else(|| type_error("content_for requires a block"))?;
    let rendered = match proc_val {
        Value::Proc(p) => call_proc(p, &[], ctx)?,
        other => return Err(type_error(format!("content_for block must be a Proc, got {}", other.type_name()))),
    };
    let text = match rendered {
        Value::Str(s) => s.text.clone(),
        Value::Nil => String::new(),
        other => other.to_display_string(),
    };
    ctx.scope.view_model.borrow_mut().set_content_for(name, text);
    Ok(Value::Nil)
}

fn eval_member_call(
    receiver: &Expr,
    name: Symbol,
    args: &[Expr],
    block: Option<&Expr>,
    cache: &MethodCache,
    safe: bool,
    ctx: &mut EvalCtx<'_>,
) -> SlimResult<Value> {
    let recv = eval_expr(receiver, ctx)?;
    if safe && matches!(recv, Value::Nil) {
        return Ok(Value::Nil);
    }
    let _ = cache.hit(&recv); // records/consults receiver identity (UserObject fast path)
    let arg_vals = eval_args(args, ctx)?;
    let block_val = eval_block_opt(block, ctx)?;
    object::call_method(&recv, name, &arg_vals, block_val.as_ref(), ctx)
}

/// Evaluates a `MemberCall`/`SafeMemberCall`/`GlobalCall` node but substitutes
/// `injected_block` for whatever block the node itself parsed (always `None`
/// for the each-header shape this is built for — spec §4.7's template-level
/// `for each` synthesizes the block from the child render tree instead of an
/// expression-language one).
pub fn eval_call_with_injected_block(expr: &Expr, injected_block: &Value, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    match expr {
        Expr::MemberCall(receiver, name, args, _, _, pos) | Expr::SafeMemberCall(receiver, name, args, _, _, pos) => {
            let recv = eval_expr(receiver, ctx)?;
            let arg_vals = eval_args(args, ctx)?;
            object::call_method(&recv, *name, &arg_vals, Some(injected_block), ctx).map_err(|e| e.at(*pos))
        }
        Expr::GlobalCall(name, args, _, pos) => {
            let arg_vals = eval_args(args, ctx)?;
            eval_global_call(*name, &arg_vals, Some(injected_block), ctx).map_err(|e| e.at(*pos))
        }
        other => Err(type_error(format!("{other:?} is not a call expression")).at(expr.pos())),
    }
}

/// Calls a `Proc` value with `args` bound to its parameters in a fresh child
/// scope (spec §4.2 Proc `call`, §8 invariant 8).
pub fn call_proc(proc_data: &ProcData, args: &[Value], ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    match &proc_data.body {
        ProcBody::Expr(body) => {
            let child = proc_data.scope.child();
            for (i, param) in proc_data.params.iter().enumerate() {
                child.set(*param, args.get(i).cloned().unwrap_or(Value::Nil));
            }
            ctx.with_scope(child, |ctx| eval_expr(body, ctx))
        }
        ProcBody::Native(f) => f(args),
        // spec §3 `ForEach` / §6+§9 `content_for`: a template child block,
        // re-entered here exactly like an expression block, except its
        // "body" is rendered rather than evaluated (see `RenderMode`).
        ProcBody::Render(node, mode) => {
            let child = proc_data.scope.child();
            for (i, param) in proc_data.params.iter().enumerate() {
                child.set(*param, args.get(i).cloned().unwrap_or(Value::Nil));
            }
            match mode {
                RenderMode::Inline => {
                    let buf = ctx
                        .render_buf
                        .clone()
                        .ok_or_else(|| type_error("no active render buffer for a template block"))?;
                    ctx.with_scope(child, |ctx| crate::template::render::render_node(node, &buf, ctx))?;
                    Ok(Value::Nil)
                }
                RenderMode::Isolated => {
                    let buf = Rc::new(RefCell::new(String::new()));
                    let saved = ctx.render_buf.replace(buf.clone());
                    let result = ctx.with_scope(child, |ctx| crate::template::render::render_node(node, &buf, ctx));
                    ctx.render_buf = saved;
                    result?;
                    let text = Rc::try_unwrap(buf).map(RefCell::into_inner).unwrap_or_default();
                    Ok(Value::html_safe_str(text))
                }
            }
        }
    }
}

fn eval_unary(op: UnOp, v: &Value) -> SlimResult<Value> {
    match (op, v) {
        (UnOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
        (UnOp::Plus, Value::Number(n)) => Ok(Value::Number(*n)),
        (UnOp::Not, v) => Ok(Value::Bool(!v.is_true())),
        (UnOp::BitNot, Value::Number(n)) => Ok(Value::Number(!(*n as i64) as f64)),
        (op, v) => Err(type_error(format!("undefined unary operator for {:?} on {}", op, v.type_name()))),
    }
}

fn eval_binary(op: BinOp, lhs: &Expr, rhs: &Expr, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    // Short-circuit operators evaluate the rhs lazily (spec §4.4/§4.5).
    if op == BinOp::And {
        let l = eval_expr(lhs, ctx)?;
        return if l.is_true() { eval_expr(rhs, ctx) } else { Ok(l) };
    }
    if op == BinOp::Or {
        let l = eval_expr(lhs, ctx)?;
        return if l.is_true() { Ok(l) } else { eval_expr(rhs, ctx) };
    }
    let l = eval_expr(lhs, ctx)?;
    let r = eval_expr(rhs, ctx)?;
    eval_binary_values(op, &l, &r, ctx)
}

fn eval_binary_values(op: BinOp, l: &Value, r: &Value, ctx: &mut EvalCtx<'_>) -> SlimResult<Value> {
    use Value::{Number, Str};
    match op {
        BinOp::Eq => return Ok(Value::Bool(l.eq(r))),
        BinOp::Ne => return Ok(Value::Bool(!l.eq(r))),
        BinOp::Cmp => {
            return Ok(l
                .cmp_value(r)
                .map_or(Value::Nil, |o| Value::Number(f64::from(o as i8))))
        }
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ord = l.cmp_value(r)?;
            let b = match op {
                BinOp::Lt => ord.is_lt(),
                BinOp::Le => ord.is_le(),
                BinOp::Gt => ord.is_gt(),
                BinOp::Ge => ord.is_ge(),
                _ => unreachable!(),
            };
            return Ok(Value::Bool(b));
        }
        _ => {}
    }
    match (op, l, r) {
        (BinOp::Add, Number(a), Number(b)) => Ok(Number(a + b)),
        (BinOp::Add, Str(a), Str(b)) => Ok(Value::str(format!("{}{}", a.text, b.text))),
        (BinOp::Add, Value::Array(a), Value::Array(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::array(items))
        }
        (BinOp::Sub, Number(a), Number(b)) => Ok(Number(a - b)),
        (BinOp::Mul, Number(a), Number(b)) => Ok(Number(a * b)),
        (BinOp::Mul, Str(a), Number(b)) => Ok(Value::str(a.text.repeat(*b as usize))),
        (BinOp::Div, Number(a), Number(b)) => Ok(Number(a / b)),
        (BinOp::Mod, Number(a), Number(b)) => Ok(Number(a.rem_euclid(*b))),
        (BinOp::Pow, Number(a), Number(b)) => Ok(Number(a.powf(*b))),
        (BinOp::Shl, Number(a), Number(b)) => Ok(Number(((*a as i64) << (*b as i64)) as f64)),
        (BinOp::Shr, Number(a), Number(b)) => Ok(Number(((*a as i64) >> (*b as i64)) as f64)),
        (BinOp::BAnd, Number(a), Number(b)) => Ok(Number(((*a as i64) & (*b as i64)) as f64)),
        (BinOp::BOr, Number(a), Number(b)) => Ok(Number(((*a as i64) | (*b as i64)) as f64)),
        (BinOp::BXor, Number(a), Number(b)) => Ok(Number(((*a as i64) ^ (*b as i64)) as f64)),
        (op, l, r) => {
            // Fall through to user-overloaded operator methods (spec §4.1:
            // "operators dispatch as ordinary method calls on the left
            // operand when no builtin rule applies").
            let method = operator_method_name(op);
            object::call_method(l, crate::intern::intern(method), std::slice::from_ref(r), None, ctx).map_err(|_| {
                crate::error::unsupported_operand(format!(
                    "unsupported operand types for {method}: {} and {}",
                    l.type_name(),
                    r.type_name()
                ))
            })
        }
    }
}

fn operator_method_name(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Pow => "**",
        BinOp::Shl => "<<",
        BinOp::Shr => ">>",
        BinOp::BAnd => "&",
        BinOp::BOr => "|",
        BinOp::BXor => "^",
        BinOp::And | BinOp::Or | BinOp::Eq | BinOp::Ne | BinOp::Cmp | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            unreachable!("handled before dispatch fallback")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parser::parse_full_expression;
    use crate::view_model::ViewModel;
    use std::cell::RefCell;

    fn eval_src(src: &str) -> Value {
        let vm = Rc::new(RefCell::new(ViewModel::new()));
        let scope = Scope::root(vm);
        let mut ctx = EvalCtx::new(scope, None);
        let expr = parse_full_expression(src, &[]).unwrap();
        eval_expr(&expr, &mut ctx).unwrap()
    }

    #[test]
    fn arithmetic() {
        assert!(matches!(eval_src("1 + 2 * 3"), Value::Number(n) if n == 7.0));
    }

    #[test]
    fn truthiness_only_nil_and_false() {
        assert!(matches!(eval_src("0 ? 1 : 2"), Value::Number(n) if n == 1.0));
        assert!(matches!(eval_src("nil ? 1 : 2"), Value::Number(n) if n == 2.0));
        assert!(matches!(eval_src("false ? 1 : 2"), Value::Number(n) if n == 2.0));
    }

    #[test]
    fn string_interpolation() {
        match eval_src(r#""a#{1 + 1}b""#) {
            Value::Str(s) => assert_eq!(s.text, "a2b"),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn array_and_range_literals() {
        match eval_src("[1, 2, 3]") {
            Value::Array(a) => assert_eq!(a.borrow().len(), 3),
            other => panic!("{other:?}"),
        }
        match eval_src("1..3") {
            Value::Range(r) => assert!(!r.exclude_end),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn break_sets_signal_and_evaluates_to_its_value() {
        let vm = Rc::new(RefCell::new(ViewModel::new()));
        let scope = Scope::root(vm);
        let mut ctx = EvalCtx::new(scope, None);
        let expr = parse_full_expression("break 5", &[]).unwrap();
        let v = eval_expr(&expr, &mut ctx).unwrap();
        assert!(matches!(v, Value::Number(n) if n == 5.0));
        assert!(matches!(ctx.take_break(), Some(Value::Number(n)) if n == 5.0));
    }

    #[test]
    fn bare_break_signals_nil() {
        let vm = Rc::new(RefCell::new(ViewModel::new()));
        let scope = Scope::root(vm);
        let mut ctx = EvalCtx::new(scope, None);
        let expr = parse_full_expression("break", &[]).unwrap();
        eval_expr(&expr, &mut ctx).unwrap();
        assert!(matches!(ctx.take_break(), Some(Value::Nil)));
    }

    #[test]
    fn short_circuit_or_skips_rhs_side_effects() {
        // `@x` defaults to Nil, so `1 || (@x = 5)` must leave @x unbound.
        let vm = Rc::new(RefCell::new(ViewModel::new()));
        let scope = Scope::root(vm.clone());
        let mut ctx = EvalCtx::new(scope, None);
        let expr = parse_full_expression("1 || (@x = 5)", &[]).unwrap();
        eval_expr(&expr, &mut ctx).unwrap();
        assert!(matches!(vm.borrow().get_attr(crate::intern::intern("x")), Value::Nil));
    }
}
