//! Error types with rich diagnostics using miette
//!
//! Every error carries the 1-based source line and a span into the original
//! text. The span is attached to the source only when a report is built (see
//! [`crate::pikchr`]), so errors stay cheap to construct and `Send + Sync`.

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::lexer::Span;

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.end.saturating_sub(span.start)).into()
    }
}

/// The single diagnostic a failed compilation produces.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Unresolved(#[from] UnresolvedReference),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Degenerate(#[from] DegenerateGeometry),

    #[error(transparent)]
    #[diagnostic(transparent)]
    ResourceLimit(#[from] ResourceLimit),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Assertion(#[from] AssertionFailed),
}

impl Error {
    /// The 1-based line the diagnostic points at.
    pub fn line(&self) -> u32 {
        match self {
            Error::Lex(e) => e.line,
            Error::Parse(e) => e.line,
            Error::Unresolved(e) => e.line,
            Error::Degenerate(e) => e.line,
            Error::ResourceLimit(e) => e.line,
            Error::Eval(e) => e.line,
            Error::Assertion(e) => e.line,
        }
    }

    /// Short category name, stable across releases.
    pub fn category(&self) -> &'static str {
        match self {
            Error::Lex(_) => "lex",
            Error::Parse(_) => "parse",
            Error::Unresolved(_) => "unresolved",
            Error::Degenerate(_) => "degenerate",
            Error::ResourceLimit(_) => "resource-limit",
            Error::Eval(_) => "eval",
            Error::Assertion(_) => "assertion",
        }
    }
}

// ============================================================================
// Lex Errors
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexErrorKind {
    #[error("unterminated string")]
    UnterminatedString,

    #[error("invalid numeric suffix `{0}`")]
    InvalidSuffix(String),

    #[error("malformed number `{0}`")]
    InvalidNumber(String),

    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
}

/// A malformed token.
#[derive(Error, Diagnostic, Debug, Clone)]
#[error("line {line}: {kind}")]
#[diagnostic(code(pikdraw::lex))]
pub struct LexError {
    pub kind: LexErrorKind,
    pub line: u32,
    #[label("here")]
    pub span: SourceSpan,
}

// ============================================================================
// Parse Errors
// ============================================================================

/// A grammar violation. Parsing never recovers.
#[derive(Error, Diagnostic, Debug, Clone)]
#[error("line {line}: expected {expected}, found {found}")]
#[diagnostic(code(pikdraw::parse::unexpected_token))]
pub struct ParseError {
    pub expected: String,
    pub found: String,
    pub line: u32,
    #[label("found this")]
    pub span: SourceSpan,
}

// ============================================================================
// Reference Errors
// ============================================================================

/// A name, ordinal or relative reference that names nothing declared so far.
#[derive(Error, Diagnostic, Debug, Clone)]
#[error("line {line}: unresolved reference to `{name}`")]
#[diagnostic(code(pikdraw::unresolved_reference))]
pub struct UnresolvedReference {
    pub name: String,
    pub line: u32,
    #[label("not declared before this point")]
    pub span: SourceSpan,
    #[help]
    pub help: Option<String>,
}

// ============================================================================
// Geometry Errors
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DegenerateKind {
    #[error("{class} has no length: all of its waypoints coincide")]
    ZeroLength { class: &'static str },

    #[error("{class} {attribute} is negative")]
    NegativeSize {
        class: &'static str,
        attribute: &'static str,
    },
}

#[derive(Error, Diagnostic, Debug, Clone)]
#[error("line {line}: {kind}")]
#[diagnostic(code(pikdraw::degenerate_geometry))]
pub struct DegenerateGeometry {
    pub kind: DegenerateKind,
    pub line: u32,
    #[label("this object")]
    pub span: SourceSpan,
}

// ============================================================================
// Resource Limits
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LimitKind {
    #[error("canvas of {}x{} px exceeds the {limit} px limit", whole_px(.width), whole_px(.height))]
    Canvas { width: f64, height: f64, limit: f64 },

    #[error("coordinates beyond {limit} inches")]
    Coordinates { limit: f64 },

    #[error("macro `{name}` nests deeper than {limit} expansions")]
    MacroDepth { name: String, limit: usize },
}

/// Pixels rounded up, switching to scientific notation for huge canvases.
fn whole_px(px: &f64) -> String {
    if px.abs() < 1e12 {
        format!("{}", px.ceil())
    } else {
        format!("{px:.3e}")
    }
}

#[derive(Error, Diagnostic, Debug, Clone)]
#[error("line {line}: {kind}")]
#[diagnostic(code(pikdraw::resource_limit))]
pub struct ResourceLimit {
    pub kind: LimitKind,
    pub line: u32,
    #[label("while processing this")]
    pub span: SourceSpan,
}

// ============================================================================
// Evaluation Errors
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalErrorKind {
    #[error("division by zero")]
    DivisionByZero,

    #[error("{function}() is undefined for {value}")]
    Domain { function: &'static str, value: f64 },

    #[error("expression does not evaluate to a finite number")]
    NotFinite,

    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },

    #[error("`{clause}` cannot be applied to {class}")]
    InvalidClause {
        clause: &'static str,
        class: &'static str,
    },
}

#[derive(Error, Diagnostic, Debug, Clone)]
#[error("line {line}: {kind}")]
#[diagnostic(code(pikdraw::eval))]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub line: u32,
    #[label("in this statement")]
    pub span: SourceSpan,
}

// ============================================================================
// User-Facing Errors
// ============================================================================

/// Failure of an `assert` statement.
#[derive(Error, Diagnostic, Debug, Clone)]
#[error("line {line}: assertion failed: {left} != {right}")]
#[diagnostic(code(pikdraw::assertion_failed))]
pub struct AssertionFailed {
    pub left: String,
    pub right: String,
    pub line: u32,
    #[label("assertion failed here")]
    pub span: SourceSpan,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_lead_with_the_line_number() {
        let err: Error = UnresolvedReference {
            name: "C".into(),
            line: 1,
            span: Span { start: 8, end: 9 }.into(),
            help: None,
        }
        .into();
        assert_eq!(err.to_string(), "line 1: unresolved reference to `C`");
        assert_eq!(err.line(), 1);
        assert_eq!(err.category(), "unresolved");
    }

    #[test]
    fn span_conversion_keeps_offset_and_length() {
        let span: SourceSpan = Span { start: 4, end: 10 }.into();
        assert_eq!(span.offset(), 4);
        assert_eq!(span.len(), 6);
    }

    #[test]
    fn canvas_sizes_do_not_saturate() {
        let kind = LimitKind::Canvas {
            width: 1.44e302,
            height: 79.2,
            limit: 100_000.0,
        };
        assert_eq!(
            kind.to_string(),
            "canvas of 1.440e302x80 px exceeds the 100000 px limit"
        );
    }

    #[test]
    fn errors_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
