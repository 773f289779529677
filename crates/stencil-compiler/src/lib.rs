//! # Stencil Compiler - Template Source to Instruction Tree
//!
//! `stencil-compiler` is the compile-time half of the Stencil template
//! engine: it tokenizes template source, parses the inline expression
//! language, and produces a serializable [`Program`] the engine interprets.
//! It knows nothing about data, filters, layouts, or the filesystem.
//!
//! ## Template Syntax
//!
//! - `{{ expr }}` - interpolation, escaped for markup by default
//! - `{{ expr | filter | filter(args) }}` - filter pipeline, emitted unescaped
//! - `{% directive args %}` - control directives
//!
//! Built-in directives: `layout`, `skip_root`, `outlet`, `slot`/`endslot`,
//! `include`, `if`/`elseif`/`else`/`endif`, `foreach`/`endforeach`, `set`.
//!
//! ## Example
//!
//! ```rust
//! use stencil_compiler::{Compiler, Expr, Node};
//!
//! let compiler = Compiler::new();
//! let program = compiler
//!     .compile("{% if logged_in %}Hi {{ user.name }}{% endif %}")
//!     .unwrap();
//!
//! match &program.nodes[0] {
//!     Node::If { arms, .. } => assert_eq!(arms[0].condition, Expr::Var("logged_in".into())),
//!     other => panic!("unexpected node: {other:?}"),
//! }
//! ```
//!
//! ## Custom Directives
//!
//! Custom directives are compiler functions from the raw argument string to
//! a [`Node`], registered with [`Compiler::add_directive`]. Later
//! registrations replace earlier ones, built-ins included.
//!
//! ```rust
//! use stencil_compiler::{Compiler, Node};
//!
//! let mut compiler = Compiler::new();
//! compiler.add_directive("shout", |args| Ok(Node::Text(args.to_uppercase())));
//!
//! let program = compiler.compile("{% shout hello %}").unwrap();
//! assert_eq!(program.nodes, vec![Node::Text("HELLO".into())]);
//! ```

mod compiler;
mod error;
mod expr;
mod program;
mod token;

pub use compiler::{Compiler, DirectiveFn};
pub use error::CompileError;
pub use expr::{parse_expression, BinaryOp, Expr, FilterCall, UnaryOp};
pub use program::{IfArm, Node, Program};
pub use token::{tokenize, Token};
