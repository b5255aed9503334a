//! Template parser (component C7, spec §4.7).
//!
//! Grounded on `original_source/source/template/Parser.cpp`'s
//! `parse_lines`/`parse_tag`/`parse_control_code`/`parse_code_lines`: an
//! indent-width recursive-descent parser where a line's children are
//! whatever follow it at a strictly deeper indent, and an `if`/`elsif`/
//! `else` chain is found by checking, after each arm's body, whether the
//! next sibling at the same indent is itself an `elsif`/`else` line.
//!
//! Unlike the expression parser this one carries no lookahead token buffer:
//! each template-lexer entry point already tells the caller exactly what
//! comes next, so the parser just keeps threading the latest `IndentTok`
//! through recursive calls (mirroring the C++ original's `current_token`
//! variable passed by reference through the same functions).

use std::rc::Rc;

use crate::error::{template_syntax_error, SlimResult};
use crate::expr::ast::{AssignTarget, Expr};
use crate::expr::parser::{parse_attr_expression, parse_each_header, parse_full_expression};
use crate::intern::Symbol;
use crate::template::ast::{is_void_element, CondArm, DynamicAttr, Node};
use crate::template::lexer::{ControlKw, IndentTok, Lexer, LineStart, TagContentTok, WsCtrl};

/// Parses a complete template (spec §4.7 `parse`). `local_names` seeds the
/// set of identifiers the expression parser treats as local variables
/// rather than zero-arg method calls (spec §6 `Template` construction
/// option, §4.9 Scope).
pub fn parse_template(src: &str, local_names: &[Symbol]) -> SlimResult<Node> {
    let mut p = Parser {
        lexer: Lexer::new(src),
        locals: local_names.to_vec(),
    };
    let first_tok = p.lexer.next_indent()?;
    let mut parts = Vec::new();
    p.parse_lines(-1, &mut parts, first_tok)?;
    Ok(node_from_parts(parts))
}

fn node_from_parts(mut parts: Vec<Node>) -> Node {
    if parts.len() == 1 {
        parts.pop().expect("len checked")
    } else {
        Node::PartsList(parts)
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    locals: Vec<Symbol>,
}

impl<'a> Parser<'a> {
    /// Spec §4.7 `parse_lines`: consumes sibling lines at exactly
    /// `parent_indent + 1`-or-deeper (any deeper amount counts as one
    /// indent level, matching Slim's "consistency only matters within a
    /// block" convention) until a line at `<= parent_indent` or `END` ends
    /// the block, returning that terminating token to the caller.
    fn parse_lines(&mut self, parent_indent: i32, out: &mut Vec<Node>, mut indent_tok: IndentTok) -> SlimResult<IndentTok> {
        loop {
            let indent = match indent_tok {
                IndentTok::End => return Ok(IndentTok::End),
                IndentTok::Indent(n) => n as i32,
            };
            if indent <= parent_indent {
                return Ok(indent_tok);
            }
            let (node, next_tok) = self.parse_line(indent)?;
            out.push(node);
            indent_tok = next_tok;
        }
    }

    fn parse_line(&mut self, indent: i32) -> SlimResult<(Node, IndentTok)> {
        match self.lexer.next_line_start()? {
            ls @ (LineStart::Name(_) | LineStart::TagId | LineStart::TagClass) => self.parse_tag(ls, indent),
            LineStart::Text => {
                let first = self.lexer.next_text_content();
                let (text, tok) = self.parse_multiline_text(first, indent)?;
                Ok((Node::Text(text), tok))
            }
            LineStart::TextTrailingSpace => {
                let first = self.lexer.next_text_content();
                let (text, tok) = self.parse_multiline_text(first, indent)?;
                Ok((Node::Text(format!("{text} ")), tok))
            }
            LineStart::Html => {
                let first = self.lexer.next_text_content();
                let (text, tok) = self.parse_multiline_text(first, indent)?;
                Ok((Node::Text(format!("<{text}")), tok))
            }
            LineStart::Comment => {
                let first = self.lexer.next_text_content();
                let (_, tok) = self.parse_multiline_text(first, indent)?;
                Ok((Node::PartsList(Vec::new()), tok))
            }
            LineStart::HtmlComment => {
                let first = self.lexer.next_text_content();
                let (text, tok) = self.parse_multiline_text(first, indent)?;
                Ok((Node::Text(format!("<!--{text}-->")), tok))
            }
            LineStart::Output => {
                let ws = self.lexer.next_whitespace_control();
                self.parse_output_line(ws, indent)
            }
            LineStart::Control => self.parse_control_line(indent),
        }
    }

    /// Spec §4.7 `parse_tag`: optional `#id`/`.class` shortcuts (each
    /// emitted as its own `DynamicAttr` with only static values), then zero
    /// or more `name=expr` attributes (plain or `(...)`/`[...]`/`{...}`
    /// wrapped — the lexer hides the wrapping), then whitespace-control
    /// sigils, then inline text/output/nothing, then nested children.
    fn parse_tag(&mut self, line_start: LineStart, indent: i32) -> SlimResult<(Node, IndentTok)> {
        let mut name = "div".to_owned();
        let mut tag_tok = match line_start {
            LineStart::Name(n) => {
                name = n;
                self.lexer.next_tag_content()?
            }
            LineStart::TagId => TagContentTok::TagId,
            LineStart::TagClass => TagContentTok::TagClass,
            _ => unreachable!("parse_tag only called for tag-starting lines"),
        };

        let mut attrs = Vec::new();
        if matches!(tag_tok, TagContentTok::TagId) {
            let id = self.lexer.next_name()?;
            attrs.push(DynamicAttr {
                name: "id".to_owned(),
                static_values: vec![id],
                dynamic_exprs: Vec::new(),
            });
            tag_tok = self.lexer.next_tag_content()?;
        }
        let mut classes = Vec::new();
        while matches!(tag_tok, TagContentTok::TagClass) {
            classes.push(self.lexer.next_name()?);
            tag_tok = self.lexer.next_tag_content()?;
        }
        if !classes.is_empty() {
            attrs.push(DynamicAttr {
                name: "class".to_owned(),
                static_values: classes,
                dynamic_exprs: Vec::new(),
            });
        }

        let mut add_leading_ws = false;
        let mut add_trailing_ws = false;
        loop {
            match tag_tok {
                TagContentTok::AttrName(attr_name) => {
                    let rest = self.lexer.remaining();
                    let (expr, consumed) = parse_attr_expression(rest, &self.locals)?;
                    self.lexer.advance_by(consumed);
                    // spec §5 S5: an explicit `class=expr` joins the `.shortcut`
                    // classes already collected into the same `class` attribute
                    // rather than emitting a second one.
                    if let Some(existing) = attrs.iter_mut().find(|a| a.name == attr_name) {
                        existing.dynamic_exprs.push(expr);
                    } else {
                        attrs.push(DynamicAttr {
                            name: attr_name,
                            static_values: Vec::new(),
                            dynamic_exprs: vec![expr],
                        });
                    }
                    tag_tok = self.lexer.next_tag_content()?;
                }
                TagContentTok::AddLeadingWs => {
                    add_leading_ws = true;
                    tag_tok = self.lexer.next_tag_content()?;
                }
                TagContentTok::AddTrailingWs => {
                    add_trailing_ws = true;
                    tag_tok = self.lexer.next_tag_content()?;
                }
                TagContentTok::AddLeadingAndTrailingWs => {
                    add_leading_ws = true;
                    add_trailing_ws = true;
                    tag_tok = self.lexer.next_tag_content()?;
                }
                TagContentTok::TagId | TagContentTok::TagClass => {
                    return Err(template_syntax_error("`#id`/`.class` must come before attributes").at(self.lexer.source_pos()));
                }
                TagContentTok::Output | TagContentTok::TextContent(_) | TagContentTok::Eol => break,
            }
        }

        let mut children = Vec::new();
        let mut next_tok;
        match tag_tok {
            TagContentTok::Eol => {
                next_tok = self.lexer.next_indent()?;
            }
            TagContentTok::TextContent(text) => {
                let (text, tok) = self.parse_multiline_text(text, indent)?;
                children.push(Node::Text(text));
                next_tok = tok;
            }
            TagContentTok::Output => {
                let ws = self.lexer.next_whitespace_control();
                let (node, tok) = self.parse_output_line(ws, indent)?;
                children.push(node);
                next_tok = tok;
            }
            TagContentTok::TagId | TagContentTok::TagClass | TagContentTok::AttrName(_) => {
                unreachable!("attribute loop above only exits on Output/TextContent/Eol")
            }
        }
        if let IndentTok::Indent(n) = next_tok {
            if (n as i32) > indent {
                next_tok = self.parse_lines(indent, &mut children, IndentTok::Indent(n))?;
            }
        }
        // spec §4.7/§8: a void element (`br`, `img`, ...) can never have
        // content — caught here, at parse time, rather than deferred to the
        // renderer (`original_source/source/template/Parser.cpp:298-305`).
        if !children.is_empty() && is_void_element(&name) {
            return Err(template_syntax_error(format!("`{name}` is a void element and cannot have content")).at(self.lexer.source_pos()));
        }
        Ok((
            Node::Tag {
                name,
                attrs,
                children,
                add_leading_ws,
                add_trailing_ws,
            },
            next_tok,
        ))
    }

    /// Joins a text line (or inline tag text) with any deeper-indented
    /// continuation lines (spec §4.7, `original_source`'s `parse_text_line`:
    /// each continuation line becomes a new output line, padded by
    /// `indent - base_indent - 2` spaces).
    fn parse_multiline_text(&mut self, first: String, base_indent: i32) -> SlimResult<(String, IndentTok)> {
        let mut buf = first;
        loop {
            let tok = self.lexer.next_indent()?;
            let n = match tok {
                IndentTok::End => return Ok((buf, tok)),
                IndentTok::Indent(n) => n as i32,
            };
            if n <= base_indent {
                return Ok((buf, tok));
            }
            let pad = (n - base_indent - 2).max(0) as usize;
            let cont = self.lexer.next_text_content();
            buf.push('\n');
            for _ in 0..pad {
                buf.push(' ');
            }
            buf.push_str(&cont);
        }
    }

    /// Spec §4.7 multi-line code continuation: a code line ending (after
    /// trimming trailing whitespace) in `,` or `\` continues onto the next
    /// physical line, regardless of that line's indentation.
    fn read_continued_code(&mut self, first: String) -> SlimResult<String> {
        let mut buf = first;
        loop {
            let trimmed = buf.trim_end();
            let continues = trimmed.ends_with(',') || trimmed.ends_with('\\');
            if !continues {
                return Ok(buf);
            }
            buf = if let Some(stripped) = trimmed.strip_suffix('\\') {
                stripped.trim_end().to_owned()
            } else {
                trimmed.to_owned()
            };
            buf.push(' ');
            match self.lexer.next_indent()? {
                IndentTok::End => return Ok(buf),
                IndentTok::Indent(_) => {
                    let more = self.lexer.next_text_content();
                    buf.push_str(more.trim_start());
                }
            }
        }
    }

    fn maybe_track_assign(&mut self, expr: &Expr) {
        if let Expr::Assign(AssignTarget::Local(name), ..) = expr {
            if !self.locals.contains(name) {
                self.locals.push(*name);
            }
        }
    }

    /// Tries to parse `code` as `receiver[.method](args) do |params|` with
    /// nothing left over (spec §4.7: the shape shared by `ForEach` on a
    /// control line and `content_for`-style calls on an output line). On
    /// success, parses the deeper-indented block as the call's body.
    fn try_parse_block_call(&mut self, code: &str, indent: i32) -> SlimResult<Option<(Expr, Vec<Symbol>, Rc<Node>, IndentTok)>> {
        let Ok((call, params, consumed)) = parse_each_header(code, &self.locals) else {
            return Ok(None);
        };
        if !code[consumed..].trim().is_empty() {
            return Ok(None);
        }
        let saved_len = self.locals.len();
        self.locals.extend(params.iter().copied());
        let mut children = Vec::new();
        let mut next_tok = self.lexer.next_indent()?;
        if let IndentTok::Indent(n) = next_tok {
            if (n as i32) > indent {
                next_tok = self.parse_lines(indent, &mut children, IndentTok::Indent(n))?;
            }
        }
        self.locals.truncate(saved_len);
        Ok(Some((call, params, Rc::new(node_from_parts(children)), next_tok)))
    }

    fn parse_output_line(&mut self, ws: WsCtrl, indent: i32) -> SlimResult<(Node, IndentTok)> {
        let raw = self.lexer.next_text_content();
        let code = self.read_continued_code(raw)?;
        if let Some((call, params, body, next_tok)) = self.try_parse_block_call(&code, indent)? {
            return Ok((wrap_ws(Node::CallWithBlock { call, params, body }, ws), next_tok));
        }
        let expr = parse_full_expression(&code, &self.locals)?;
        self.maybe_track_assign(&expr);
        let next_tok = self.lexer.next_indent()?;
        Ok((wrap_ws(Node::OutputExpr(expr), ws), next_tok))
    }

    fn parse_control_line(&mut self, indent: i32) -> SlimResult<(Node, IndentTok)> {
        match self.lexer.control_code_start() {
            ControlKw::If => self.parse_if_chain(indent),
            ControlKw::Elsif | ControlKw::Else => {
                Err(template_syntax_error("`elsif`/`else` without a matching `if`").at(self.lexer.source_pos()))
            }
            ControlKw::General => self.parse_control_general(indent),
        }
    }

    fn parse_control_general(&mut self, indent: i32) -> SlimResult<(Node, IndentTok)> {
        let raw = self.lexer.next_text_content();
        let code = self.read_continued_code(raw)?;
        if let Some((call, params, body, next_tok)) = self.try_parse_block_call(&code, indent)? {
            return Ok((Node::ForEach { call, params, body }, next_tok));
        }
        let expr = parse_full_expression(&code, &self.locals)?;
        self.maybe_track_assign(&expr);
        let next_tok = self.lexer.next_indent()?;
        if let IndentTok::Indent(n) = next_tok {
            if (n as i32) > indent {
                return Err(template_syntax_error("unexpected indented block after a plain control line").at(self.lexer.source_pos()));
            }
        }
        Ok((Node::Code(expr), next_tok))
    }

    /// Spec §4.7 `if`/`elsif`/`else`: after each arm's body, checks whether
    /// the next sibling at the SAME indent is itself an `elsif`/`else` line
    /// by checkpointing the lexer, trying to read that much of it, and
    /// restoring if it turns out to be an unrelated line instead.
    fn parse_if_chain(&mut self, indent: i32) -> SlimResult<(Node, IndentTok)> {
        let mut arms = Vec::new();
        let mut else_body: Option<Box<Node>> = None;

        let cond_src = self.read_continued_code(self.lexer.next_text_content())?;
        let cond = parse_full_expression(&cond_src, &self.locals)?;
        let mut children = Vec::new();
        let mut next_tok = self.lexer.next_indent()?;
        if let IndentTok::Indent(n) = next_tok {
            if (n as i32) > indent {
                next_tok = self.parse_lines(indent, &mut children, IndentTok::Indent(n))?;
            }
        }
        arms.push(CondArm {
            cond,
            body: node_from_parts(children),
        });

        loop {
            let at_same_indent = matches!(next_tok, IndentTok::Indent(n) if n as i32 == indent);
            if !at_same_indent {
                break;
            }
            let cp = self.lexer.checkpoint();
            if self.lexer.next_line_start()? != LineStart::Control {
                self.lexer.restore(cp);
                break;
            }
            match self.lexer.control_code_start() {
                ControlKw::Elsif => {
                    let cond_src = self.read_continued_code(self.lexer.next_text_content())?;
                    let cond = parse_full_expression(&cond_src, &self.locals)?;
                    let mut children = Vec::new();
                    let mut tok2 = self.lexer.next_indent()?;
                    if let IndentTok::Indent(n) = tok2 {
                        if (n as i32) > indent {
                            tok2 = self.parse_lines(indent, &mut children, IndentTok::Indent(n))?;
                        }
                    }
                    arms.push(CondArm {
                        cond,
                        body: node_from_parts(children),
                    });
                    next_tok = tok2;
                }
                ControlKw::Else => {
                    let mut children = Vec::new();
                    let mut tok2 = self.lexer.next_indent()?;
                    if let IndentTok::Indent(n) = tok2 {
                        if (n as i32) > indent {
                            tok2 = self.parse_lines(indent, &mut children, IndentTok::Indent(n))?;
                        }
                    }
                    else_body = Some(Box::new(node_from_parts(children)));
                    next_tok = tok2;
                    break;
                }
                ControlKw::If | ControlKw::General => {
                    self.lexer.restore(cp);
                    break;
                }
            }
        }
        Ok((Node::If { arms, else_body }, next_tok))
    }
}

fn wrap_ws(node: Node, ws: WsCtrl) -> Node {
    match ws {
        WsCtrl::None => node,
        WsCtrl::Leading => Node::PartsList(vec![Node::Text(" ".to_owned()), node]),
        WsCtrl::Trailing => Node::PartsList(vec![node, Node::Text(" ".to_owned())]),
        WsCtrl::Both => Node::PartsList(vec![Node::Text(" ".to_owned()), node, Node::Text(" ".to_owned())]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Node {
        parse_template(src, &[]).unwrap()
    }

    #[test]
    fn simple_tag_with_id_and_class() {
        let n = parse("div#main.red.big Hello");
        match n {
            Node::Tag { name, attrs, children, .. } => {
                assert_eq!(name, "div");
                assert_eq!(attrs.len(), 2);
                assert_eq!(attrs[0].name, "id");
                assert_eq!(attrs[0].static_values, vec!["main".to_owned()]);
                assert_eq!(attrs[1].name, "class");
                assert_eq!(attrs[1].static_values, vec!["red".to_owned(), "big".to_owned()]);
                assert_eq!(children.len(), 1);
            }
            other => panic!("expected Tag, got {other:?}"),
        }
    }

    #[test]
    fn nested_tags_by_indentation() {
        let n = parse("ul\n  li one\n  li two\n");
        match n {
            Node::Tag { name, children, .. } => {
                assert_eq!(name, "ul");
                assert_eq!(children.len(), 2);
            }
            other => panic!("expected Tag, got {other:?}"),
        }
    }

    #[test]
    fn wrapped_attrs_parse() {
        let n = parse("input(type=\"checkbox\" checked=true)");
        match n {
            Node::Tag { attrs, .. } => assert_eq!(attrs.len(), 2),
            other => panic!("expected Tag, got {other:?}"),
        }
    }

    #[test]
    fn if_elsif_else_chain() {
        let n = parse("- if a\n  | A\n- elsif b\n  | B\n- else\n  | C\n");
        match n {
            Node::If { arms, else_body } => {
                assert_eq!(arms.len(), 2);
                assert!(else_body.is_some());
            }
            other => panic!("expected If, got {other:?}"),
        }
    }

    #[test]
    fn each_block_on_control_line() {
        let n = parse("- @items.each do |item|\n  = item\n");
        assert!(matches!(n, Node::ForEach { .. }));
    }

    #[test]
    fn content_for_block_on_output_line() {
        let n = parse("= content_for :head do\n  | Hi\n");
        assert!(matches!(n, Node::CallWithBlock { .. }));
    }

    #[test]
    fn html_line_passes_through_raw() {
        let n = parse("<b>hi</b>");
        match n {
            Node::Text(t) => assert_eq!(t, "<b>hi</b>"),
            other => panic!("expected Text, got {other:?}"),
        }
    }
}
