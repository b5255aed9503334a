//! The error taxonomy described in spec §7.
//!
//! Hand-rolled in the style of `parcadei-ouros`'s `exception_private.rs`: a
//! plain `ErrorKind` enum with a `strum::Display` for the machine name, and a
//! wrapping struct that carries source position and a human message. Ouros
//! does not reach for `thiserror` for its own exception hierarchy, and
//! neither does slimrs.

use std::fmt;

use strum::Display;

/// Zero-based line/column of a source position, used by both the expression
/// and template parsers for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourcePos {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// The kind discriminant for every failure mode named in spec §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorKind {
    /// Expression-lexer/parser failure.
    SyntaxError,
    /// Template-lexer/parser failure.
    TemplateSyntaxError,
    TypeError,
    UnorderableType,
    UnsupportedOperand,
    NoSuchMethod,
    NoConstantError,
    ArgumentError,
    ArgumentCountError,
    IndexError,
    KeyError,
    /// Raised for constructs the expression language accepts syntactically
    /// but can't actually execute, e.g. an unsupported `Regexp` flag.
    ScriptError,
}

/// A single error produced anywhere in parsing or rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlimError {
    pub kind: ErrorKind,
    pub message: String,
    pub file_name: Option<String>,
    pub pos: Option<SourcePos>,
}

impl SlimError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file_name: None,
            pos: None,
        }
    }

    #[must_use]
    pub fn at(mut self, pos: SourcePos) -> Self {
        self.pos = Some(pos);
        self
    }

    #[must_use]
    pub fn in_file(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

impl fmt::Display for SlimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(file) = &self.file_name {
            write!(f, " ({file}")?;
            if let Some(pos) = self.pos {
                write!(f, ":{pos}")?;
            }
            write!(f, ")")?;
        } else if let Some(pos) = self.pos {
            write!(f, " at {pos}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SlimError {}

/// Result alias used throughout parsing and evaluation.
pub type SlimResult<T> = Result<T, SlimError>;

macro_rules! err_ctor {
    ($name:ident, $kind:ident) => {
        #[must_use]
        pub fn $name(message: impl Into<String>) -> SlimError {
            SlimError::new(ErrorKind::$kind, message)
        }
    };
}

err_ctor!(syntax_error, SyntaxError);
err_ctor!(template_syntax_error, TemplateSyntaxError);
err_ctor!(type_error, TypeError);
err_ctor!(unorderable_type, UnorderableType);
err_ctor!(unsupported_operand, UnsupportedOperand);
err_ctor!(no_such_method, NoSuchMethod);
err_ctor!(no_constant_error, NoConstantError);
err_ctor!(argument_error, ArgumentError);
err_ctor!(argument_count_error, ArgumentCountError);
err_ctor!(index_error, IndexError);
err_ctor!(key_error, KeyError);
err_ctor!(script_error, ScriptError);

/// Internal flow-control signal used to implement early `break` from inside
/// an `Enumerable` block (spec §7: "must never escape Enumerable
/// implementations"). Carried out of band from `SlimError` — in
/// `EvalCtx::break_signal`, not this module's `SlimResult` — so that it can
/// never accidentally leak to a `render`/`parse` caller as a user-visible
/// error. Every `each`-family implementation (`Array`/`Hash`/`Range`/`String`'s
/// `each*` methods, and the Enumerable mixin's derived iterators) consumes it
/// right after calling the block, the way the original's
/// `catch (const BreakException &e)` does around its own `each` loops.
#[derive(Debug, Clone)]
pub struct BreakSignal(pub crate::value::Value);
