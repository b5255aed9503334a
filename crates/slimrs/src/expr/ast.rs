//! Expression AST (component C4 output, spec §3 "Expression AST").

use std::rc::Rc;

use crate::error::SourcePos;
use crate::intern::Symbol;
use crate::object::MethodCache;
use crate::value::{RegexpFlags, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Plus,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Shl,
    Shr,
    BAnd,
    BOr,
    BXor,
    And,
    Or,
    Eq,
    Ne,
    Cmp,
    Lt,
    Le,
    Gt,
    Ge,
}

/// One fragment of an interpolated string/regex literal (spec §3).
#[derive(Debug)]
pub enum StrFrag {
    Text(String),
    Expr(Expr),
}

/// Distinguishes a local-variable assignment from a view-model attribute
/// assignment — both parse from a bare `name = expr` / `@name = expr`, but
/// the two write to different stores (spec §4.9 Scope vs ViewModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignTarget {
    Local(Symbol),
    Attr(Symbol),
}

/// Expression AST node kinds (spec §3). Every node carries `pos` for
/// diagnostics, matching spec's "Each node carries source position".
#[derive(Debug)]
pub enum Expr {
    Literal(Value, SourcePos),
    Variable(Symbol, SourcePos),
    Attribute(Symbol, SourcePos),
    GlobalConstant(Symbol, SourcePos),
    ConstantNav(Rc<Expr>, Symbol, SourcePos),
    Assign(AssignTarget, Rc<Expr>, SourcePos),
    GlobalCall(Symbol, Vec<Expr>, Option<Rc<Expr>>, SourcePos),
    /// spec §9 per-call-site method cache: the trailing `MethodCache` is a
    /// single mutable slot private to this AST node (see `object::MethodCache`).
    MemberCall(Rc<Expr>, Symbol, Vec<Expr>, Option<Rc<Expr>>, MethodCache, SourcePos),
    SafeMemberCall(Rc<Expr>, Symbol, Vec<Expr>, Option<Rc<Expr>>, MethodCache, SourcePos),
    ElementRef(Rc<Expr>, Vec<Expr>, SourcePos),
    ArrayLit(Vec<Expr>, SourcePos),
    HashLit(Vec<(Expr, Expr)>, SourcePos),
    RangeLit(Rc<Expr>, Rc<Expr>, bool, SourcePos),
    /// Parameter list + body; evaluating this node does NOT run the body —
    /// it produces a `Proc` (spec §4.5 "Block: do NOT evaluate body").
    Block(Vec<Symbol>, Rc<Expr>, SourcePos),
    Conditional(Rc<Expr>, Rc<Expr>, Rc<Expr>, SourcePos),
    InterpString(Vec<StrFrag>, SourcePos),
    InterpRegex(Vec<StrFrag>, RegexpFlags, SourcePos),
    Unary(UnOp, Rc<Expr>, SourcePos),
    Binary(BinOp, Rc<Expr>, Rc<Expr>, SourcePos),
    /// `break` / `break value` (spec §4.2/§7): unwinds to the nearest
    /// enclosing `each`-family call, which yields `value` (or `nil`) as its
    /// own result. Evaluating this node sets `EvalCtx::break_signal`; it is
    /// not itself a jump, so callers up the tree must check the signal after
    /// every sub-evaluation that can contain one (spec §7's "must never
    /// escape Enumerable implementations").
    Break(Option<Rc<Expr>>, SourcePos),
}

impl Expr {
    #[must_use]
    pub fn pos(&self) -> SourcePos {
        match self {
            Expr::Literal(_, p)
            | Expr::Variable(_, p)
            | Expr::Attribute(_, p)
            | Expr::GlobalConstant(_, p)
            | Expr::ConstantNav(_, _, p)
            | Expr::Assign(_, _, p)
            | Expr::GlobalCall(_, _, _, p) => *p,
            Expr::MemberCall(_, _, _, _, _, p) | Expr::SafeMemberCall(_, _, _, _, _, p) => *p,
            Expr::ElementRef(_, _, p)
            | Expr::ArrayLit(_, p)
            | Expr::HashLit(_, p)
            | Expr::RangeLit(_, _, _, p)
            | Expr::Block(_, _, p)
            | Expr::Conditional(_, _, _, p)
            | Expr::InterpString(_, p)
            | Expr::InterpRegex(_, _, p)
            | Expr::Unary(_, _, p)
            | Expr::Binary(_, _, _, p)
            | Expr::Break(_, p) => *p,
        }
    }
}
