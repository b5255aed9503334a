//! Template renderer (component C8, spec §3/§4.7/§4.8).
//!
//! Walks the render tree built by `template::parser` and writes HTML into a
//! shared buffer. Attribute merging and the boolean-attribute special case
//! are ported from `original_source/source/template/TemplateParts.cpp`'s
//! `TemplateTagAttr::render`; the `If`/tag rendering shapes follow the same
//! file's `TemplateCondExpr`/`TemplateIfExpr`/tag-rendering logic.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::SlimResult;
use crate::expr::eval::{eval_call_with_injected_block, eval_expr, EvalCtx};
use crate::template::ast::{is_void_element, DynamicAttr, Node};
use crate::value::{ProcBody, ProcData, RenderMode, Value};

/// HTML entity escaping (spec §4.8 / GLOSSARY "HTML-escape"): `&`, `<`,
/// `>`, `"`, `'`.
#[must_use]
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_value(v: &Value) -> String {
    if v.is_html_safe() {
        v.to_display_string()
    } else {
        html_escape(&v.to_display_string())
    }
}

/// Renders one attribute into `buf` (spec §4.7 item 5,
/// `TemplateTagAttr::render`): dynamic expressions are evaluated and, if an
/// expression yields an `Array`, flattened element-by-element alongside the
/// attribute's static strings; a single all-dynamic boolean/nil value gets
/// the HTML boolean-attribute shorthand instead of a `name="..."` pair.
fn render_attr(attr: &DynamicAttr, buf: &Rc<RefCell<String>>, ctx: &mut EvalCtx<'_>) -> SlimResult<()> {
    let mut dyn_values = Vec::new();
    for expr in &attr.dynamic_exprs {
        match eval_expr(expr, ctx)? {
            Value::Array(items) => dyn_values.extend(items.borrow().iter().cloned()),
            other => dyn_values.push(other),
        }
    }
    if attr.static_values.is_empty() && dyn_values.is_empty() {
        return Ok(());
    }
    if attr.static_values.is_empty() && dyn_values.len() == 1 {
        match &dyn_values[0] {
            Value::Bool(true) => {
                let mut b = buf.borrow_mut();
                b.push(' ');
                b.push_str(&attr.name);
                return Ok(());
            }
            Value::Bool(false) | Value::Nil => return Ok(()),
            _ => {}
        }
    }
    let mut strings: Vec<String> = attr.static_values.clone();
    strings.extend(dyn_values.iter().map(|v| html_escape(&v.to_display_string())));
    let merged = strings.join(" ");
    let mut b = buf.borrow_mut();
    b.push(' ');
    b.push_str(&attr.name);
    b.push_str("=\"");
    b.push_str(&merged);
    b.push('"');
    Ok(())
}

/// Renders `node` into `buf` using `ctx`'s current scope (spec §3/§4.8).
/// `buf` is the same buffer threaded through `call_proc`'s `RenderMode`
/// handling, so `ForEach`/`CallWithBlock` children can recurse back into
/// this function through an ordinary method dispatch.
pub fn render_node(node: &Node, buf: &Rc<RefCell<String>>, ctx: &mut EvalCtx<'_>) -> SlimResult<()> {
    match node {
        Node::PartsList(parts) => {
            for part in parts {
                render_node(part, buf, ctx)?;
                // A `- break` line partway through this list must stop the
                // remaining siblings from rendering too (spec §7): the
                // enclosing `each` call consumes the signal, but not until
                // this whole body has finished unwinding.
                if ctx.break_signal.is_some() {
                    break;
                }
            }
            Ok(())
        }
        Node::Text(text) => {
            buf.borrow_mut().push_str(text);
            Ok(())
        }
        Node::OutputExpr(expr) => {
            let v = eval_expr(expr, ctx)?;
            buf.borrow_mut().push_str(&render_value(&v));
            Ok(())
        }
        Node::Tag {
            name,
            attrs,
            children,
            add_leading_ws,
            add_trailing_ws,
        } => {
            if *add_leading_ws {
                buf.borrow_mut().push(' ');
            }
            {
                let mut b = buf.borrow_mut();
                b.push('<');
                b.push_str(name);
            }
            for attr in attrs {
                render_attr(attr, buf, ctx)?;
            }
            // `parser::parse_tag` already rejects a void element with content
            // at parse time, so `children` is guaranteed empty here.
            if is_void_element(name) {
                buf.borrow_mut().push_str("/>");
            } else {
                buf.borrow_mut().push('>');
                for child in children {
                    render_node(child, buf, ctx)?;
                    if ctx.break_signal.is_some() {
                        break;
                    }
                }
                let mut b = buf.borrow_mut();
                b.push_str("</");
                b.push_str(name);
                b.push('>');
            }
            if *add_trailing_ws {
                buf.borrow_mut().push(' ');
            }
            Ok(())
        }
        Node::ForEach { call, params, body } => {
            let proc_val = Value::Proc(Rc::new(ProcData {
                params: params.clone(),
                body: ProcBody::Render(body.clone(), RenderMode::Inline),
                scope: ctx.scope.clone(),
            }));
            // Spec §3 `ForEach`: the call's own return value is discarded —
            // the block writes directly into `buf` via `call_proc`.
            eval_call_with_injected_block(call, &proc_val, ctx)?;
            Ok(())
        }
        Node::CallWithBlock { call, params, body } => {
            let proc_val = Value::Proc(Rc::new(ProcData {
                params: params.clone(),
                body: ProcBody::Render(body.clone(), RenderMode::Isolated),
                scope: ctx.scope.clone(),
            }));
            let result = eval_call_with_injected_block(call, &proc_val, ctx)?;
            buf.borrow_mut().push_str(&render_value(&result));
            Ok(())
        }
        Node::If { arms, else_body } => {
            for arm in arms {
                if eval_expr(&arm.cond, ctx)?.is_true() {
                    return render_node(&arm.body, buf, ctx);
                }
            }
            if let Some(else_body) = else_body {
                render_node(else_body, buf, ctx)?;
            }
            Ok(())
        }
        Node::Code(expr) => {
            eval_expr(expr, ctx)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::intern;
    use crate::scope::Scope;
    use crate::view_model::ViewModel;
    use std::cell::RefCell as Cell;

    fn render(node: &Node) -> String {
        let vm = Rc::new(Cell::new(ViewModel::new()));
        let scope = Scope::root(vm);
        let mut ctx = EvalCtx::new(scope, None);
        let buf = Rc::new(RefCell::new(String::new()));
        render_node(node, &buf, &mut ctx).unwrap();
        Rc::try_unwrap(buf).unwrap().into_inner()
    }

    #[test]
    fn escapes_text_output() {
        let n = Node::OutputExpr(crate::expr::ast::Expr::Literal(
            Value::str("<b>"),
            crate::error::SourcePos::default(),
        ));
        assert_eq!(render(&n), "&lt;b&gt;");
    }

    #[test]
    fn html_safe_output_is_not_escaped() {
        let n = Node::OutputExpr(crate::expr::ast::Expr::Literal(
            Value::html_safe_str("<b>"),
            crate::error::SourcePos::default(),
        ));
        assert_eq!(render(&n), "<b>");
    }

    #[test]
    fn void_element_self_closes() {
        let n = Node::Tag {
            name: "br".to_owned(),
            attrs: vec![],
            children: vec![],
            add_leading_ws: false,
            add_trailing_ws: false,
        };
        assert_eq!(render(&n), "<br/>");
    }

    #[test]
    fn boolean_attribute_shorthand() {
        let n = Node::Tag {
            name: "input".to_owned(),
            attrs: vec![DynamicAttr {
                name: "checked".to_owned(),
                static_values: vec![],
                dynamic_exprs: vec![crate::expr::ast::Expr::Literal(
                    Value::Bool(true),
                    crate::error::SourcePos::default(),
                )],
            }],
            children: vec![],
            add_leading_ws: false,
            add_trailing_ws: false,
        };
        assert_eq!(render(&n), "<input checked/>");
    }

    #[test]
    fn false_boolean_attribute_is_omitted() {
        let n = Node::Tag {
            name: "input".to_owned(),
            attrs: vec![DynamicAttr {
                name: "disabled".to_owned(),
                static_values: vec![],
                dynamic_exprs: vec![crate::expr::ast::Expr::Literal(
                    Value::Bool(false),
                    crate::error::SourcePos::default(),
                )],
            }],
            children: vec![],
            add_leading_ws: false,
            add_trailing_ws: false,
        };
        assert_eq!(render(&n), "<input/>");
    }

    #[test]
    fn if_chain_renders_matching_arm() {
        use crate::template::ast::CondArm;
        let n = Node::If {
            arms: vec![CondArm {
                cond: crate::expr::ast::Expr::Literal(Value::Bool(false), crate::error::SourcePos::default()),
                body: Node::Text("nope".to_owned()),
            }],
            else_body: Some(Box::new(Node::Text("yep".to_owned()))),
        };
        assert_eq!(render(&n), "yep");
    }

    #[test]
    fn content_for_then_yield_roundtrip() {
        use crate::expr::ast::Expr;
        let head_sym = intern("head");
        let call_with_block = Node::CallWithBlock {
            call: Expr::GlobalCall(
                intern("content_for"),
                vec![Expr::Literal(Value::Symbol(head_sym), crate::error::SourcePos::default())],
                None,
                crate::error::SourcePos::default(),
            ),
            params: vec![],
            body: Rc::new(Node::Text("<title>Hi</title>".to_owned())),
        };
        let yield_expr = Node::OutputExpr(Expr::GlobalCall(
            intern("yield"),
            vec![Expr::Literal(Value::Symbol(head_sym), crate::error::SourcePos::default())],
            None,
            crate::error::SourcePos::default(),
        ));
        let root = Node::PartsList(vec![call_with_block, yield_expr]);
        assert_eq!(render(&root), "<title>Hi</title>");
    }
}
