//! The "self" of a template (component C9, spec §4.9 / GLOSSARY).

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{no_constant_error, SlimResult};
use crate::intern::Symbol;
use crate::value::Value;

/// A helper method registered with `ViewModel::register_helper` (spec §6).
pub type HelperFn = Rc<dyn Fn(&[Value]) -> SlimResult<Value>>;

#[derive(Default)]
pub struct ViewModel {
    attrs: HashMap<Symbol, Value>,
    constants: HashMap<Symbol, Value>,
    helpers: HashMap<Symbol, HelperFn>,
    /// Named `content_for` blocks, already rendered to HTML-safe strings.
    content_for: HashMap<Symbol, String>,
    /// The body rendered by `Template::render_layout`, exposed to the layout
    /// template as `yield` with no arguments (spec §4.8).
    main_content: Option<String>,
}

impl std::fmt::Debug for ViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewModel")
            .field("attrs", &self.attrs.len())
            .field("constants", &self.constants.len())
            .field("helpers", &self.helpers.len())
            .finish()
    }
}

impl ViewModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// spec §4.9: "unbound → `Nil`".
    #[must_use]
    pub fn get_attr(&self, name: Symbol) -> Value {
        self.attrs.get(&name).cloned().unwrap_or(Value::Nil)
    }

    pub fn set_attr(&mut self, name: Symbol, value: Value) {
        self.attrs.insert(name, value);
    }

    /// spec §4.9: "fails when absent".
    pub fn get_constant(&self, name: Symbol) -> SlimResult<Value> {
        self.constants
            .get(&name)
            .cloned()
            .ok_or_else(|| no_constant_error(format!("uninitialized constant {name}")))
    }

    pub fn set_constant(&mut self, name: Symbol, value: Value) {
        self.constants.insert(name, value);
    }

    pub fn register_helper(&mut self, name: Symbol, f: HelperFn) {
        self.helpers.insert(name, f);
    }

    #[must_use]
    pub fn get_helper(&self, name: Symbol) -> Option<HelperFn> {
        self.helpers.get(&name).cloned()
    }

    /// spec §4.9 `content_for`: stores a rendered chunk under `name`. The
    /// template parser/renderer resolves the block to its rendered string
    /// before calling this (spec §4.8's layout machinery only ever needs the
    /// finished text, never the block itself, once rendering has started).
    pub fn set_content_for(&mut self, name: Symbol, rendered: String) {
        self.content_for.insert(name, rendered);
    }

    pub fn set_main_content(&mut self, rendered: String) {
        self.main_content = Some(rendered);
    }

    /// spec §4.8 `yield`: main content with no argument, a named block with
    /// one, defaulting to empty string if absent.
    #[must_use]
    pub fn yield_content(&self, name: Option<Symbol>) -> Value {
        let text = match name {
            None => self.main_content.clone().unwrap_or_default(),
            Some(n) => self.content_for.get(&n).cloned().unwrap_or_else(|| {
                log::warn!("yield :{n} has no matching content_for block; rendering empty");
                String::new()
            }),
        };
        Value::html_safe_str(text)
    }
}
