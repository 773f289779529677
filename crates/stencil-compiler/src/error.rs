//! Compile-time error type shared by the tokenizer, the expression parser,
//! and the directive compiler.

use thiserror::Error;

/// Error raised while turning template source into a [`Program`](crate::Program).
///
/// Every variant is fatal to the compilation that produced it; there is no
/// partial recovery.
#[derive(Debug, Error)]
pub enum CompileError {
    /// An opening delimiter with no matching closer.
    #[error("unterminated `{open}` delimiter at byte {offset}")]
    UnterminatedDelimiter { open: &'static str, offset: usize },

    /// Directive body that does not follow `name [args]` shape.
    #[error("invalid directive syntax: {0}")]
    InvalidDirective(String),

    /// Directive name with no registered compiler.
    #[error("unknown directive: {0}")]
    UnknownDirective(String),

    /// A directive that requires an argument was given none.
    #[error("`{0}` requires an argument")]
    MissingArgument(&'static str),

    /// Expression that could not be parsed.
    #[error("invalid expression `{expr}`: {reason}")]
    InvalidExpression { expr: String, reason: String },

    /// Filter segment that is not `name` or `name(args)`.
    #[error("invalid filter invocation: {0}")]
    InvalidFilter(String),

    /// `include` arguments that are not `"template"[, expr]`.
    #[error("invalid include syntax: {0}")]
    InvalidInclude(String),

    /// `set` arguments that are not `variable = expr`.
    #[error("invalid set syntax: {0}")]
    InvalidSet(String),

    /// `foreach` arguments that are not `expr as [$key =>] $value`.
    #[error("invalid foreach syntax: {0}")]
    InvalidForeach(String),

    /// A closing directive with no matching opener.
    #[error("unexpected `{found}` with no open `{expected}` block")]
    UnexpectedClose {
        found: &'static str,
        expected: &'static str,
    },

    /// A block directive left open at the end of the source.
    #[error("unclosed `{0}` block")]
    UnclosedBlock(&'static str),

    /// `slot` opened while another slot capture is still open.
    #[error("`slot` opened inside an unclosed `slot` block")]
    NestedSlot,

    /// `elseif` or a second `else` after the `else` arm of an `if` block.
    #[error("`{0}` after `else` in the same `if` block")]
    AfterElse(&'static str),
}
