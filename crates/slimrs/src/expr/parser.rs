//! Pratt-style operator-precedence parser (component C4, spec §4.4).
//!
//! Grounded on the recursive-descent shape of `parcadei-ouros`'s
//! `parse.rs`/`expressions.rs` (one method per grammar production, a
//! lookahead-1 token buffer, a local-variable set threaded through block
//! parsing), generalized from Python's grammar to this spec's
//! Ruby-flavored one (§4.4 precedence table, lvar-vs-call disambiguation,
//! `is_func_arg_start`).

use std::collections::HashSet;
use std::rc::Rc;

use crate::error::{syntax_error, SlimResult, SourcePos};
use crate::expr::ast::{BinOp, Expr, StrFrag, UnOp};
use crate::expr::lexer::{Lexer, Token};
use crate::intern::{intern, Symbol};
use crate::object::MethodCache;
use crate::value::{RegexpFlags, Value};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Option<Token>,
    lookahead_pos: SourcePos,
    locals: HashSet<Symbol>,
    /// Set only while parsing `parse_each_header`'s receiver: suppresses
    /// block consumption on calls so the trailing `do |params|` is left for
    /// the caller instead of being parsed (and demanded a body+`end`) here.
    suppress_block: bool,
}

/// Parses a complete expression; spec §4.4 `full_expression()` — "requires
/// the next token after the expression to be `END`".
pub fn parse_full_expression(src: &str, locals: &[Symbol]) -> SlimResult<Expr> {
    log::trace!("lexing/parsing expression fragment: {src:?}");
    let mut p = Parser::new(src, locals);
    let e = p.parse_assign()?;
    p.expect_end()?;
    Ok(e)
}

/// Parses one expression without requiring EOF, returning how many source
/// bytes were consumed (spec §4.7 item 5: attribute values are parsed
/// mid-stream from the template source, and the template lexer resumes
/// "just after the last consumed character").
pub fn parse_attr_expression(src: &str, locals: &[Symbol]) -> SlimResult<(Expr, usize)> {
    let mut p = Parser::new(src, locals);
    let e = p.parse_assign()?;
    Ok((e, p.lexer.pos()))
}

/// Parses `receiver[.method(args)] do |params|` and stops right after the
/// block parameter list, WITHOUT a body or `end` (spec §4.7: "The template
/// parser recognizes this shape" for `for each`-style control lines). The
/// returned `Expr` is the call node with no block attached; the caller
/// (the template parser) fills in the block with its own render-node body.
pub fn parse_each_header(src: &str, locals: &[Symbol]) -> SlimResult<(Expr, Vec<Symbol>, usize)> {
    let mut p = Parser::new(src, locals);
    p.suppress_block = true;
    let receiver = p.parse_postfix_no_block()?;
    p.suppress_block = false;
    p.expect_ident("do")?;
    let params = p.parse_block_params()?;
    Ok((receiver, params, p.lexer.pos()))
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, locals: &[Symbol]) -> Self {
        Self {
            lexer: Lexer::new(src),
            lookahead: None,
            lookahead_pos: SourcePos::default(),
            locals: locals.iter().copied().collect(),
            suppress_block: false,
        }
    }

    fn peek(&mut self) -> SlimResult<&Token> {
        if self.lookahead.is_none() {
            self.lookahead_pos = self.lexer.source_pos();
            self.lookahead = Some(self.lexer.next_token()?);
        }
        Ok(self.lookahead.as_ref().expect("just filled"))
    }

    fn advance(&mut self) -> SlimResult<Token> {
        self.peek()?;
        Ok(self.lookahead.take().expect("peek filled it"))
    }

    fn cur_pos(&mut self) -> SourcePos {
        let _ = self.peek();
        self.lookahead_pos
    }

    fn eat(&mut self, want: &Token) -> SlimResult<bool> {
        if self.peek()? == want {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, want: &Token) -> SlimResult<()> {
        if !self.eat(want)? {
            let pos = self.cur_pos();
            return Err(syntax_error(format!("expected {want:?}, found {:?}", self.peek()?)).at(pos));
        }
        Ok(())
    }

    fn expect_end(&mut self) -> SlimResult<()> {
        if *self.peek()? != Token::End {
            let pos = self.cur_pos();
            return Err(syntax_error(format!("unexpected trailing token {:?}", self.peek()?)).at(pos));
        }
        Ok(())
    }

    fn expect_ident(&mut self, word: &str) -> SlimResult<()> {
        let pos = self.cur_pos();
        match self.advance()? {
            Token::Ident(s) if s == word => Ok(()),
            other => Err(syntax_error(format!("expected `{word}`, found {other:?}")).at(pos)),
        }
    }

    fn is_ident(&mut self, word: &str) -> bool {
        matches!(self.peek(), Ok(Token::Ident(s)) if s == word)
    }

    // ---- Assignment (lowest precedence, right-assoc) ----

    /// `x = expr` / `@x = expr`, spec §4.4: assignment binds an expression
    /// result to a local variable or view-model attribute and evaluates to
    /// that value. Only used at the entry points — sub-expressions (call
    /// args, array/hash items, ternary branches) parse at `parse_ternary`
    /// and so cannot themselves be bare assignments.
    fn parse_assign(&mut self) -> SlimResult<Expr> {
        let pos = self.cur_pos();
        let lhs = self.parse_ternary()?;
        if self.eat(&Token::Assign)? {
            let rhs = self.parse_assign()?;
            return match lhs {
                Expr::Variable(name, _) => {
                    self.locals.insert(name);
                    Ok(Expr::Assign(crate::expr::ast::AssignTarget::Local(name), Rc::new(rhs), pos))
                }
                Expr::Attribute(name, _) => {
                    Ok(Expr::Assign(crate::expr::ast::AssignTarget::Attr(name), Rc::new(rhs), pos))
                }
                _ => Err(syntax_error("invalid assignment target").at(pos)),
            };
        }
        Ok(lhs)
    }

    // ---- Grammar: ternary (level 13) ----

    fn parse_ternary(&mut self) -> SlimResult<Expr> {
        let pos = self.cur_pos();
        let cond = self.parse_binary(3)?;
        if self.eat(&Token::Conditional)? {
            let then_branch = self.parse_ternary()?;
            self.expect(&Token::Colon)?;
            let else_branch = self.parse_ternary()?;
            Ok(Expr::Conditional(Rc::new(cond), Rc::new(then_branch), Rc::new(else_branch), pos))
        } else {
            Ok(cond)
        }
    }

    /// Precedence-climbing binary operator parse, levels 3 (`**`) through
    /// 12 (`||`) of the spec §4.4 table. Level 1/2 (postfix, unary) are
    /// handled by `parse_unary`/`parse_postfix`.
    fn parse_binary(&mut self, min_level: u8) -> SlimResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let Some((op, level, right_assoc)) = self.peek_binop()? else {
                break;
            };
            if level < min_level {
                break;
            }
            let pos = self.cur_pos();
            self.advance()?;
            let next_min = if right_assoc { level } else { level + 1 };
            let rhs = self.parse_binary(next_min)?;
            lhs = Expr::Binary(op, Rc::new(lhs), Rc::new(rhs), pos);
        }
        Ok(lhs)
    }

    fn peek_binop(&mut self) -> SlimResult<Option<(BinOp, u8, bool)>> {
        Ok(match self.peek()? {
            Token::StarStar => Some((BinOp::Pow, 3, true)),
            Token::Star => Some((BinOp::Mul, 4, false)),
            Token::Slash => Some((BinOp::Div, 4, false)),
            Token::Percent => Some((BinOp::Mod, 4, false)),
            Token::Plus => Some((BinOp::Add, 5, false)),
            Token::Minus => Some((BinOp::Sub, 5, false)),
            Token::Shl => Some((BinOp::Shl, 6, false)),
            Token::Shr => Some((BinOp::Shr, 6, false)),
            Token::Amp => Some((BinOp::BAnd, 7, false)),
            Token::Pipe => Some((BinOp::BOr, 8, false)),
            Token::Caret => Some((BinOp::BXor, 8, false)),
            Token::Lt => Some((BinOp::Lt, 9, false)),
            Token::Le => Some((BinOp::Le, 9, false)),
            Token::Gt => Some((BinOp::Gt, 9, false)),
            Token::Ge => Some((BinOp::Ge, 9, false)),
            Token::EqEq => Some((BinOp::Eq, 10, false)),
            Token::Ne => Some((BinOp::Ne, 10, false)),
            Token::Spaceship => Some((BinOp::Cmp, 10, false)),
            Token::AndAnd => Some((BinOp::And, 11, false)),
            Token::OrOr => Some((BinOp::Or, 12, false)),
            _ => None,
        })
    }

    // ---- Unary (level 2) ----

    fn parse_unary(&mut self) -> SlimResult<Expr> {
        let pos = self.cur_pos();
        let op = match self.peek()? {
            Token::Minus => Some(UnOp::Neg),
            Token::Plus => Some(UnOp::Plus),
            Token::Bang => Some(UnOp::Not),
            Token::Tilde => Some(UnOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            self.advance()?;
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary(op, Rc::new(operand), pos));
        }
        self.parse_range()
    }

    // ---- Range: `a..b` / `a...b`, built from two fully postfix-chained
    // operands so e.g. `1..arr.length` binds as `1..(arr.length)` ----

    fn parse_range(&mut self) -> SlimResult<Expr> {
        let pos = self.cur_pos();
        let lhs = self.parse_postfix()?;
        let exclude = match self.peek()? {
            Token::DotDot => false,
            Token::DotDotDot => true,
            _ => return Ok(lhs),
        };
        self.advance()?;
        let rhs = self.parse_postfix()?;
        Ok(Expr::RangeLit(Rc::new(lhs), Rc::new(rhs), exclude, pos))
    }

    // ---- Postfix (level 1): member access, safe nav, index ----

    fn parse_postfix(&mut self) -> SlimResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            let pos = self.cur_pos();
            match self.peek()? {
                Token::Dot => {
                    self.advance()?;
                    expr = self.parse_member_call(expr, pos, false)?;
                }
                Token::SafeNav => {
                    self.advance()?;
                    expr = self.parse_member_call(expr, pos, true)?;
                }
                Token::LBracket => {
                    self.advance()?;
                    let args = self.parse_comma_list(&Token::RBracket)?;
                    self.expect(&Token::RBracket)?;
                    expr = Expr::ElementRef(Rc::new(expr), args, pos);
                }
                Token::ConstNav => {
                    self.advance()?;
                    let name = self.expect_ident_any()?;
                    expr = Expr::ConstantNav(Rc::new(expr), name, pos);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Used by `parse_each_header` with `suppress_block` set, so the trailing
    /// `do |params|` is left unconsumed for the caller rather than parsed
    /// (and a body+`end` demanded) here.
    fn parse_postfix_no_block(&mut self) -> SlimResult<Expr> {
        self.parse_postfix()
    }

    fn parse_member_call(&mut self, receiver: Expr, pos: SourcePos, safe: bool) -> SlimResult<Expr> {
        let name = self.expect_ident_any()?;
        let (args, block) = self.parse_call_tail(true)?;
        Ok(if safe {
            Expr::SafeMemberCall(Rc::new(receiver), name, args, block.map(Rc::new), MethodCache::new(), pos)
        } else {
            Expr::MemberCall(Rc::new(receiver), name, args, block.map(Rc::new), MethodCache::new(), pos)
        })
    }

    fn expect_ident_any(&mut self) -> SlimResult<Symbol> {
        let pos = self.cur_pos();
        match self.advance()? {
            Token::Ident(s) => Ok(intern(&s)),
            other => Err(syntax_error(format!("expected identifier, found {other:?}")).at(pos)),
        }
    }

    /// Parses an optional `(args)` / bare-command args, and an optional
    /// trailing block (`{ |p| expr }` / `do |p| expr end`).
    fn parse_call_tail(&mut self, allow_bare_args: bool) -> SlimResult<(Vec<Expr>, Option<Expr>)> {
        let args = if self.eat(&Token::LParen)? {
            let args = self.parse_comma_list(&Token::RParen)?;
            self.expect(&Token::RParen)?;
            args
        } else if allow_bare_args && self.is_arg_start()? {
            self.parse_comma_list_until_stop()?
        } else {
            Vec::new()
        };
        let block = self.parse_optional_block()?;
        Ok((args, block))
    }

    /// spec §4.4 `is_func_arg_start` (`original_source/source/expression/
    /// Parser.cpp`'s `is_func_arg_start`): identifies tokens that may open a
    /// bare (paren-less) argument list. Block/chain keywords (`do`, `end`)
    /// never start an argument even though they lex as plain identifiers.
    /// `[` and `-` are deliberately excluded — they belong to postfix
    /// indexing and binary subtraction respectively, so `foo [1, 2]` is a
    /// zero-arg call followed by `[1, 2]` indexing, and `foo -1` is `foo()`
    /// minus `1`, not a call with that argument.
    fn is_arg_start(&mut self) -> SlimResult<bool> {
        Ok(match self.peek()? {
            Token::Ident(s) => !is_reserved_word(s),
            Token::Colon | Token::Number(_) | Token::StringDelimOpen(_) | Token::AttrName(_) | Token::HashSymbol(_) => true,
            _ => false,
        })
    }

    fn parse_comma_list(&mut self, terminator: &Token) -> SlimResult<Vec<Expr>> {
        let mut items = Vec::new();
        if self.peek()? == terminator {
            return Ok(items);
        }
        items.push(self.parse_ternary()?);
        while self.eat(&Token::Comma)? {
            items.push(self.parse_ternary()?);
        }
        Ok(items)
    }

    /// Bare-command argument list: comma-separated expressions with no
    /// enclosing parens, stopping at a token that cannot continue one
    /// (spec §4.4's "until the next non-argument-start token").
    fn parse_comma_list_until_stop(&mut self) -> SlimResult<Vec<Expr>> {
        let mut items = vec![self.parse_ternary()?];
        while *self.peek()? == Token::Comma {
            self.advance()?;
            items.push(self.parse_ternary()?);
        }
        Ok(items)
    }

    fn parse_optional_block(&mut self) -> SlimResult<Option<Expr>> {
        if self.suppress_block {
            return Ok(None);
        }
        let pos = self.cur_pos();
        if self.eat(&Token::LBrace)? {
            let params = self.parse_block_params()?;
            let body = self.parse_ternary()?;
            self.expect(&Token::RBrace)?;
            self.pop_block_params(&params);
            return Ok(Some(Expr::Block(params, Rc::new(body), pos)));
        }
        if self.is_ident("do") {
            self.advance()?;
            let params = self.parse_block_params()?;
            let body = self.parse_ternary()?;
            self.expect_ident("end")?;
            self.pop_block_params(&params);
            return Ok(Some(Expr::Block(params, Rc::new(body), pos)));
        }
        Ok(None)
    }

    /// Parses `|a, b|` and adds the names to the lvar set for the duration
    /// of the block body (spec §4.4: "lexical lvar scoping").
    fn parse_block_params(&mut self) -> SlimResult<Vec<Symbol>> {
        let mut params = Vec::new();
        if self.eat(&Token::Pipe)? {
            if *self.peek()? != Token::Pipe {
                params.push(self.expect_ident_any()?);
                while self.eat(&Token::Comma)? {
                    params.push(self.expect_ident_any()?);
                }
            }
            self.expect(&Token::Pipe)?;
        }
        for p in &params {
            self.locals.insert(*p);
        }
        Ok(params)
    }

    fn pop_block_params(&mut self, params: &[Symbol]) {
        for p in params {
            self.locals.remove(p);
        }
    }

    // ---- Primary forms ----

    fn parse_primary(&mut self) -> SlimResult<Expr> {
        let pos = self.cur_pos();
        match self.peek()?.clone() {
            Token::Number(n) => {
                self.advance()?;
                Ok(Expr::Literal(Value::Number(n), pos))
            }
            Token::LParen => {
                self.advance()?;
                let e = self.parse_ternary()?;
                self.expect(&Token::RParen)?;
                Ok(e)
            }
            Token::AttrName(name) => {
                self.advance()?;
                Ok(Expr::Attribute(intern(&name), pos))
            }
            Token::LBracket => {
                self.advance()?;
                let items = self.parse_comma_list(&Token::RBracket)?;
                self.expect(&Token::RBracket)?;
                Ok(Expr::ArrayLit(items, pos))
            }
            Token::LBrace => {
                self.advance()?;
                let pairs = self.parse_hash_body()?;
                self.expect(&Token::RBrace)?;
                Ok(Expr::HashLit(pairs, pos))
            }
            Token::Colon => {
                self.advance()?;
                let name = self.expect_ident_any()?;
                Ok(Expr::Literal(Value::Symbol(name), pos))
            }
            Token::StringDelimOpen(delim) => {
                self.advance()?;
                self.parse_string_body(delim, pos)
            }
            Token::RegexDelimOpen => {
                self.advance()?;
                self.parse_regex_body(pos)
            }
            Token::Ident(name) => {
                self.advance()?;
                self.parse_ident_primary(&name, pos)
            }
            other => Err(syntax_error(format!("unexpected token {other:?}")).at(pos)),
        }
    }

    fn parse_ident_primary(&mut self, name: &str, pos: SourcePos) -> SlimResult<Expr> {
        match name {
            "nil" => return Ok(Expr::Literal(Value::Nil, pos)),
            "true" => return Ok(Expr::Literal(Value::Bool(true), pos)),
            "false" => return Ok(Expr::Literal(Value::Bool(false), pos)),
            // spec §4.2/§7 `break`/`break value`: only ever unwinds to the
            // nearest enclosing `each`, so it parses as a primary rather than
            // a call — `is_arg_start` tells us whether a value follows.
            "break" => {
                let value = if self.is_arg_start()? {
                    Some(Rc::new(self.parse_ternary()?))
                } else {
                    None
                };
                return Ok(Expr::Break(value, pos));
            }
            _ => {}
        }
        let sym = intern(name);
        // A capitalized identifier is a constant lookup (spec §4.4/GLOSSARY),
        // never a local var or a method name.
        if name.starts_with(|c: char| c.is_ascii_uppercase()) {
            return Ok(Expr::GlobalConstant(sym, pos));
        }
        // spec §4.4: a bare identifier is a local-var read if declared at
        // parse time, else a zero-argument (or bare-command-argument)
        // global method call.
        if self.locals.contains(&sym) && !matches!(self.peek()?, Token::LParen) {
            return Ok(Expr::Variable(sym, pos));
        }
        let (args, block) = self.parse_call_tail(true)?;
        Ok(Expr::GlobalCall(sym, args, block.map(Rc::new), pos))
    }

    fn parse_hash_body(&mut self) -> SlimResult<Vec<(Expr, Expr)>> {
        let mut pairs = Vec::new();
        if *self.peek()? == Token::RBrace {
            return Ok(pairs);
        }
        loop {
            let pos = self.cur_pos();
            let key = if let Token::HashSymbol(name) = self.peek()?.clone() {
                self.advance()?;
                Expr::Literal(Value::Symbol(intern(&name)), pos)
            } else {
                let k = self.parse_ternary()?;
                self.expect(&Token::HashArrow)?;
                k
            };
            let value = self.parse_ternary()?;
            pairs.push((key, value));
            if !self.eat(&Token::Comma)? {
                break;
            }
            if *self.peek()? == Token::RBrace {
                break;
            }
        }
        Ok(pairs)
    }

    fn parse_string_body(&mut self, delim: char, pos: SourcePos) -> SlimResult<Expr> {
        let mut frags = Vec::new();
        loop {
            match self.lexer.next_in_string(delim)? {
                Token::StringDelimClose => break,
                crate::expr::lexer::Token::StringText(t) => frags.push(StrFrag::Text(t)),
                crate::expr::lexer::Token::StringInterpStart => {
                    self.lookahead = None;
                    let inner = self.parse_ternary()?;
                    self.expect(&Token::RBrace)?;
                    frags.push(StrFrag::Expr(inner));
                }
                other => return Err(syntax_error(format!("unexpected {other:?} in string")).at(pos)),
            }
        }
        Ok(Expr::InterpString(frags, pos))
    }

    fn parse_regex_body(&mut self, pos: SourcePos) -> SlimResult<Expr> {
        let mut frags = Vec::new();
        let flags_str;
        loop {
            match self.lexer.next_in_regex()? {
                Token::RegexDelimClose(f) => {
                    flags_str = f;
                    break;
                }
                Token::RegexText(t) => frags.push(StrFrag::Text(t)),
                Token::RegexInterpStart => {
                    self.lookahead = None;
                    let inner = self.parse_ternary()?;
                    self.expect(&Token::RBrace)?;
                    frags.push(StrFrag::Expr(inner));
                }
                other => return Err(syntax_error(format!("unexpected {other:?} in regex")).at(pos)),
            }
        }
        let mut flags = RegexpFlags::empty();
        for c in flags_str.chars() {
            match c {
                'i' => flags |= RegexpFlags::IGNORECASE,
                'x' => flags |= RegexpFlags::EXTENDED,
                'm' => flags |= RegexpFlags::MULTILINE,
                _ => return Err(syntax_error(format!("unknown regex flag '{c}'")).at(pos)),
            }
        }
        Ok(Expr::InterpRegex(frags, flags, pos))
    }
}

/// Words that close a block or chain and so can never start a bare call
/// argument, even though the lexer has no dedicated keyword tokens for them.
fn is_reserved_word(s: &str) -> bool {
    matches!(s, "do" | "end" | "then" | "else" | "elsif" | "break")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Expr {
        parse_full_expression(src, &[]).unwrap_or_else(|e| panic!("{src}: {e}"))
    }

    #[test]
    fn precedence_mul_before_add() {
        match parse("1 + 2 * 3") {
            Expr::Binary(BinOp::Add, _, rhs, _) => {
                assert!(matches!(*rhs, Expr::Binary(BinOp::Mul, ..)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn pow_is_right_assoc() {
        // 2 ** 3 ** 2 == 2 ** (3 ** 2)
        match parse("2 ** 3 ** 2") {
            Expr::Binary(BinOp::Pow, lhs, rhs, _) => {
                assert!(matches!(*lhs, Expr::Literal(Value::Number(n), _) if n == 2.0));
                assert!(matches!(*rhs, Expr::Binary(BinOp::Pow, ..)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ternary_requires_parens_hint() {
        match parse("true ? 1 : 2") {
            Expr::Conditional(..) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn safe_nav_parses() {
        match parse("@a&.foo") {
            Expr::SafeMemberCall(..) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bracket_after_bare_call_is_postfix_index_not_an_argument() {
        // `foo [1, 2]` is `foo()` followed by indexing, not `foo([1, 2])`.
        match parse("foo [1, 2]") {
            Expr::ElementRef(receiver, args, _) => {
                assert!(matches!(*receiver, Expr::GlobalCall(_, ref a, _, _) if a.is_empty()));
                assert_eq!(args.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn minus_after_bare_call_is_subtraction_not_an_argument() {
        // `foo -1` is `foo() - 1`, not `foo(-1)`.
        match parse("foo -1") {
            Expr::Binary(BinOp::Sub, lhs, _, _) => {
                assert!(matches!(*lhs, Expr::GlobalCall(_, ref a, _, _) if a.is_empty()));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn break_with_no_value_parses() {
        assert!(matches!(parse("break"), Expr::Break(None, _)));
    }

    #[test]
    fn break_with_value_parses() {
        match parse("break 1") {
            Expr::Break(Some(v), _) => assert!(matches!(*v, Expr::Literal(Value::Number(n), _) if n == 1.0)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn break_is_reserved_and_not_a_bare_call_argument() {
        // `break` can never start a bare call argument, so `foo break` is
        // `foo()` followed by a stray `break` token — a syntax error, not
        // `foo(break)`.
        assert!(parse_full_expression("foo break", &[]).is_err());
    }
}
