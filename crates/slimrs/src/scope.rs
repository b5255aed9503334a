//! The lookup context during expression evaluation (component C9, spec §4.9).
//!
//! Loosely grounded on `parcadei-ouros`'s `namespace.rs` (a stack of
//! variable frames threaded through evaluation) but modeled as a classic
//! parent-linked tree-walker scope rather than slot-indexed namespaces,
//! since slimrs has no bytecode compiler to pre-resolve slot indices.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::intern::Symbol;
use crate::value::Value;
use crate::view_model::ViewModel;

/// One frame of local-variable bindings, chained to zero or more parents and
/// always anchored to the same `ViewModel` (spec §4.9: "Scope holds a
/// reference to a ViewModel and a stack of local-variable frames").
#[derive(Debug)]
pub struct Scope {
    pub view_model: Rc<RefCell<ViewModel>>,
    parent: Option<Rc<Scope>>,
    locals: RefCell<HashMap<Symbol, Value>>,
}

impl Scope {
    #[must_use]
    pub fn root(view_model: Rc<RefCell<ViewModel>>) -> Rc<Scope> {
        Rc::new(Scope {
            view_model,
            parent: None,
            locals: RefCell::new(HashMap::new()),
        })
    }

    /// Enters a new block/iteration frame (spec §8 invariant 8: block lvar
    /// scoping — bindings made in the child are invisible once it is
    /// dropped).
    #[must_use]
    pub fn child(self: &Rc<Self>) -> Rc<Scope> {
        Rc::new(Scope {
            view_model: self.view_model.clone(),
            parent: Some(self.clone()),
            locals: RefCell::new(HashMap::new()),
        })
    }

    /// Searches inner frame to outer (spec §4.9 `get`).
    #[must_use]
    pub fn get(&self, name: Symbol) -> Option<Value> {
        if let Some(v) = self.locals.borrow().get(&name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    #[must_use]
    pub fn has_local(&self, name: Symbol) -> bool {
        self.locals.borrow().contains_key(&name) || self.parent.as_ref().is_some_and(|p| p.has_local(name))
    }

    /// Writes to the innermost frame, creating the binding if needed (spec
    /// §4.9 `set`). Unlike `get`, this never walks to an outer frame: Ruby
    /// block-local assignment always shadows rather than mutating an outer
    /// variable of the same name, matching spec invariant 8.
    pub fn set(&self, name: Symbol, value: Value) {
        self.locals.borrow_mut().insert(name, value);
    }

    #[must_use]
    pub fn get_attr(&self, name: Symbol) -> Value {
        self.view_model.borrow().get_attr(name)
    }
}
