//! # Stencil - Hierarchical Template Rendering
//!
//! `stencil` renders text templates against `serde_json` data, resolving
//! nested layout inheritance, named content outlets, captured content
//! slots, and a filter/escaping pipeline. Templates compile to an
//! instruction tree (see [`stencil_compiler`]) that is cached on disk and
//! reused until the source file changes.
//!
//! ## Core Concepts
//!
//! - [`Engine`]: bound to a template directory and a cache directory;
//!   holds filters, globals, and the root layout setting
//! - Layouts: a template declares `{% layout base %}` and its output
//!   becomes the layout's `default` outlet; chains compose upward, with an
//!   optional process-wide root layout applied last
//! - [`Outlet`]: a named insertion point resolved from captured slots,
//!   caller-supplied overrides, or a deferred sub-render
//! - Slots: `{% slot title %}...{% endslot %}` captures output for an
//!   ancestor layout's `{% outlet title %}`
//! - Filters: `{{ value | capitalize | truncate(20) }}` pipelines,
//!   extensible with [`Engine::add_filter`]
//! - [`EscapeContext`]: markup, attribute, script, style, URL, or raw
//!   output encoding; plain `{{ ... }}` interpolations escape for markup
//!
//! ## Quick Start
//!
//! ```no_run
//! use serde_json::json;
//! use stencil::{Engine, Outlets};
//!
//! // templates/greeting.stencil.html:  <div>{{ name }}</div>
//! let engine = Engine::new("templates", "cache")?;
//! let html = engine.render("greeting", &json!({ "name": "World" }), Outlets::new())?;
//! assert_eq!(html, "<div>World</div>");
//! # Ok::<(), stencil::RenderError>(())
//! ```
//!
//! ## Layouts and Slots
//!
//! ```text
//! {# page.stencil.html #}
//! {% layout base %}
//! {% slot title %}Start page{% endslot %}
//! <p>{{ body }}</p>
//!
//! {# base.stencil.html #}
//! <title>{% outlet title %}</title>
//! <main>{% outlet %}</main>
//! ```
//!
//! Rendering `page` captures the `title` slot, renders the page body, then
//! renders `base` with the body as its `default` outlet and the captured
//! slot at `{% outlet title %}`. Unresolved outlets render empty.
//!
//! ## Trust Model
//!
//! Template authors are trusted: templates can include other templates and
//! recurse without depth checks. Only interpolated *data* is escaped.

mod cache;
mod engine;
mod error;
mod escape;
mod eval;
mod filters;
mod loader;
mod value;

pub use engine::{Engine, Outlet, Outlets};
pub use error::RenderError;
pub use escape::{escape, EscapeContext};
pub use filters::FilterFn;
pub use loader::TEMPLATE_SUFFIX;

// Compiler-side types, re-exported for custom directive authors.
pub use stencil_compiler::{CompileError, Compiler, Expr, FilterCall, Node, Program};
