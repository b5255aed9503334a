//! A Slim-style indentation-based HTML template engine with an embedded
//! Ruby-flavored expression language (spec §1 OVERVIEW).
//!
//! ```
//! use slimrs::{Template, ViewModel};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let tpl = Template::parse("p Hello, World!", &[]).unwrap();
//! let vm = Rc::new(RefCell::new(ViewModel::new()));
//! assert_eq!(tpl.render(vm, &[], None).unwrap(), "<!DOCTYPE html>\n<p>Hello, World!</p>");
//! ```

pub mod error;
pub mod expr;
mod intern;
pub mod object;
mod scope;
pub mod template;
mod types;
mod value;
mod view_model;

pub use crate::error::{ErrorKind, SlimError, SlimResult};
pub use crate::intern::{intern, Symbol};
pub use crate::object::SlimObject;
pub use crate::scope::Scope;
pub use crate::template::Template;
pub use crate::value::Value;
pub use crate::view_model::ViewModel;
