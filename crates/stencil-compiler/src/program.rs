//! The compiled program model.
//!
//! A [`Program`] is an ordered tree of [`Node`]s: pure data, interpreted by
//! the render engine with no generated or dynamically executed code. The
//! whole tree serializes with serde, which is what the engine's compilation
//! cache persists.

use serde::{Deserialize, Serialize};

use crate::expr::{Expr, FilterCall};

/// A compiled template: the instruction tree produced by
/// [`Compiler::compile`](crate::Compiler::compile).
///
/// Programs are immutable once built and safe to cache keyed by template
/// identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub nodes: Vec<Node>,
}

/// One instruction of a compiled template.
///
/// Custom directives build values of this type; everything here is plain
/// data so programs round-trip through the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Emit a literal substring verbatim.
    Text(String),
    /// Evaluate and emit with the default (markup) escaping applied.
    Emit(Expr),
    /// Evaluate, thread through a filter chain, and emit unescaped.
    EmitPiped {
        value: Expr,
        filters: Vec<FilterCall>,
    },
    /// Push a layout for the enclosing render to consume.
    Layout(String),
    /// Suppress the process-wide root layout for this render.
    SkipRoot,
    /// Resolve and inline a named outlet.
    Outlet(String),
    /// Capture the body's output under a slot name instead of emitting it.
    Slot { name: String, body: Vec<Node> },
    /// Render another template inline, merging the current scope with an
    /// optional extra data expression.
    Include {
        template: String,
        data: Option<Expr>,
    },
    /// Conditional arms plus an optional fallback body.
    If { arms: Vec<IfArm>, fallback: Vec<Node> },
    /// Iterate an array or object in order.
    Foreach {
        key: Option<String>,
        value: String,
        iterable: Expr,
        body: Vec<Node>,
    },
    /// Assign into the active render scope.
    Set { target: String, value: Expr },
}

/// One `if`/`elseif` arm: a condition and the body it guards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfArm {
    pub condition: Expr,
    pub body: Vec<Node>,
}
