//! Template engine entry point (spec §6 external interface).
//!
//! `Template` ties together the lexer (`lexer`), parser (`parser`), render
//! tree (`ast`), and renderer (`render`) behind the one type a host
//! actually touches — mirrors `parcadei-ouros`'s top-level `Runner`/module
//! being the one public door onto its otherwise-internal pipeline stages.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod render;

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::SlimResult;
use crate::expr::eval::EvalCtx;
use crate::intern::Symbol;
use crate::scope::Scope;
use crate::value::Value;
use crate::view_model::ViewModel;
use ast::Node;

/// A parsed template, ready to render any number of times against
/// different `ViewModel`s (spec §6).
pub struct Template {
    root: Node,
    local_names: Vec<Symbol>,
    include_doctype: bool,
}

impl Template {
    /// Parses `src` (spec §6 `Template::parse`). `local_names` fixes, by
    /// position, which identifiers `render`'s `locals` argument binds.
    pub fn parse(src: &str, local_names: &[Symbol]) -> SlimResult<Self> {
        log::debug!("parsing template ({} bytes, {} locals)", src.len(), local_names.len());
        let root = parser::parse_template(src, local_names)?;
        Ok(Self {
            root,
            local_names: local_names.to_vec(),
            include_doctype: true,
        })
    }

    /// spec §6: whether `render` prefixes `<!DOCTYPE html>\n` (default
    /// `true`, grounded on `original_source/source/template/Template.cpp`).
    #[must_use]
    pub fn with_doctype(mut self, include: bool) -> Self {
        self.include_doctype = include;
        self
    }

    /// Renders the template to a complete HTML document (spec §6
    /// `Template::render`).
    pub fn render(&self, view_model: Rc<RefCell<ViewModel>>, locals: &[Value], file_name: Option<&str>) -> SlimResult<String> {
        let mut html = self.render_partial(view_model, locals, file_name)?;
        if self.include_doctype {
            html.insert_str(0, "<!DOCTYPE html>\n");
        }
        Ok(html)
    }

    /// Renders without the `<!DOCTYPE html>` prefix, regardless of
    /// `with_doctype` (spec §6 `render_partial` — used for nested/partial
    /// includes and by `render_layout`'s own body pass).
    pub fn render_partial(&self, view_model: Rc<RefCell<ViewModel>>, locals: &[Value], file_name: Option<&str>) -> SlimResult<String> {
        log::trace!("rendering template {:?}", file_name.unwrap_or("<unnamed>"));
        let scope = Scope::root(view_model);
        for (name, value) in self.local_names.iter().zip(locals.iter()) {
            scope.set(*name, value.clone());
        }
        let buf = Rc::new(RefCell::new(String::new()));
        let mut ctx = EvalCtx::with_render_buf(scope, file_name, buf.clone());
        render::render_node(&self.root, &buf, &mut ctx)?;
        Ok(buf.borrow().clone())
    }

    /// Renders `self` as a layout's main body, then renders `layout` with
    /// that body available as `yield`/`yield :name` (spec §4.8
    /// `render_layout`, grounded on
    /// `original_source/tests/template/Layout.cpp`).
    pub fn render_layout(
        &self,
        layout: &Template,
        view_model: Rc<RefCell<ViewModel>>,
        locals: &[Value],
        file_name: Option<&str>,
    ) -> SlimResult<String> {
        let body_html = self.render_partial(view_model.clone(), locals, file_name)?;
        view_model.borrow_mut().set_main_content(body_html);
        layout.render(view_model, &[], file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_vm() -> Rc<RefCell<ViewModel>> {
        Rc::new(RefCell::new(ViewModel::new()))
    }

    #[test]
    fn renders_nested_tags_with_doctype() {
        let t = Template::parse("html\n  body\n    p Hi", &[]).unwrap();
        let out = t.render(fresh_vm(), &[], None).unwrap();
        assert_eq!(out, "<!DOCTYPE html>\n<html><body><p>Hi</p></body></html>");
    }

    #[test]
    fn without_doctype() {
        let t = Template::parse("p Hi", &[]).unwrap().with_doctype(false);
        let out = t.render(fresh_vm(), &[], None).unwrap();
        assert_eq!(out, "<p>Hi</p>");
    }

    #[test]
    fn each_loop_renders_items() {
        let t = Template::parse("ul\n  - @items.each do |x|\n    li= x", &[]).unwrap().with_doctype(false);
        let vm = fresh_vm();
        vm.borrow_mut()
            .set_attr(crate::intern::intern("items"), Value::array(vec![Value::str("a"), Value::str("b")]));
        let out = t.render(vm, &[], None).unwrap();
        assert_eq!(out, "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn layout_yields_main_content_and_named_block() {
        let layout = Template::parse("html\n  head\n    = yield :head\n  body\n    = yield", &[]).unwrap().with_doctype(false);
        let body = Template::parse("= content_for :head do\n  title Hi\np Body", &[]).unwrap();
        let vm = fresh_vm();
        let out = body.render_layout(&layout, vm, &[], None).unwrap();
        assert_eq!(out, "<html><head><title>Hi</title></head><body><p>Body</p></body></html>");
    }
}
