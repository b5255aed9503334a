//! The embedded Ruby-flavored expression language (spec §4, components
//! C3/C4/C5): lexer, AST, Pratt parser, and tree-walking evaluator.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
