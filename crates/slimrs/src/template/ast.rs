//! Template render tree (component C7 output, spec §3 "Template render
//! tree"). Produced once by the template parser and walked repeatedly by
//! the renderer (component C8); never mutated after construction.

use std::rc::Rc;

use crate::expr::ast::Expr;
use crate::intern::Symbol;

/// One attribute whose value is the concatenation of zero or more static
/// strings (from id/class shortcuts and literal `name="..."` pairs) and
/// zero or more dynamic expressions (spec §3 `DynamicAttr`).
#[derive(Debug)]
pub struct DynamicAttr {
    pub name: String,
    pub static_values: Vec<String>,
    pub dynamic_exprs: Vec<Expr>,
}

/// One `elsif`/trailing `else` arm of an `If` chain.
#[derive(Debug)]
pub struct CondArm {
    pub cond: Expr,
    pub body: Node,
}

/// Render node kinds (spec §3). The root of a parsed `Template` is a
/// `PartsList` or, if only one part resulted, that part directly.
#[derive(Debug)]
pub enum Node {
    PartsList(Vec<Node>),
    Text(String),
    /// Evaluate `expr`, HTML-escape the result unless it is already
    /// `HtmlSafeString`, append (spec §3 `OutputExpr`).
    OutputExpr(Expr),
    /// An HTML element (spec §3 `Tag`, §4.7 `parse_tag`). `add_leading_ws`/
    /// `add_trailing_ws` record the `<`/`>` whitespace-control sigils (spec
    /// §4.6/§4.7) — the renderer emits a single space outside the tag on
    /// that side when set.
    Tag {
        name: String,
        attrs: Vec<DynamicAttr>,
        children: Vec<Node>,
        add_leading_ws: bool,
        add_trailing_ws: bool,
    },
    /// `receiver.each do |params| body end` (spec §3 `ForEach`,  §4.7): the
    /// body writes directly into the surrounding output buffer; the call's
    /// own return value is discarded.
    ForEach {
        call: Expr,
        params: Vec<Symbol>,
        body: Rc<Node>,
    },
    /// Any other `name(args) do |params| body end` appearing on an output
    /// line (spec §6/§9's `content_for`): `body` renders into an isolated
    /// buffer and is passed to the call as an `HtmlSafeString` block return
    /// value, and the call's own result is then escaped and appended like a
    /// plain `OutputExpr` (see DESIGN.md — a supplemented feature, not in
    /// spec.md's own render-node table).
    CallWithBlock {
        call: Expr,
        params: Vec<Symbol>,
        body: Rc<Node>,
    },
    /// Cascading `if`/`elsif`/`else` (spec §3 `If`).
    If {
        arms: Vec<CondArm>,
        else_body: Option<Box<Node>>,
    },
    /// A plain `-` control line with no `do` block: evaluated for side
    /// effects only (an assignment, a bare call), its value discarded.
    Code(Expr),
}

/// HTML void elements (spec §4.7): self-closing, and rejected with content
/// at parse time by `parser::parse_tag` — shared with `render` so the
/// renderer's self-closing `/>` stays consistent with what the parser
/// already guarantees can never have children.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link", "meta", "param", "source", "track",
    "wbr",
];

#[must_use]
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}
