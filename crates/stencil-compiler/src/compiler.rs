//! The directive and expression compiler: consumes the token stream and
//! produces a [`Program`].
//!
//! Directives dispatch through a name → handler registry. The built-in table
//! is registered on construction; [`Compiler::add_directive`] adds custom
//! handlers with override-on-duplicate semantics, so a later registration
//! silently replaces an earlier one (built-ins included).

use std::collections::HashMap;

use crate::error::CompileError;
use crate::expr::{
    parse_expression, parse_filter_call, parse_foreach, parse_include, parse_set, split_pipes,
    Expr,
};
use crate::program::{IfArm, Node, Program};
use crate::token::{tokenize, Token};

/// A custom directive compiler: raw argument string in, instruction out.
pub type DirectiveFn = Box<dyn Fn(&str) -> Result<Node, CompileError> + Send + Sync>;

enum Handler {
    Layout,
    SkipRoot,
    Outlet,
    Slot,
    EndSlot,
    Include,
    If,
    ElseIf,
    Else,
    EndIf,
    Foreach,
    EndForeach,
    Set,
    Custom(DirectiveFn),
}

/// Compiles template source into a [`Program`].
///
/// # Example
///
/// ```rust
/// use stencil_compiler::{Compiler, Node};
///
/// let compiler = Compiler::new();
/// let program = compiler.compile("<h1>{{ title | upper }}</h1>").unwrap();
/// assert_eq!(program.nodes.len(), 3);
/// assert!(matches!(&program.nodes[0], Node::Text(t) if t == "<h1>"));
/// ```
pub struct Compiler {
    directives: HashMap<String, Handler>,
}

impl Compiler {
    /// Creates a compiler with the built-in directive table registered.
    pub fn new() -> Self {
        let mut directives = HashMap::new();
        for (name, handler) in [
            ("layout", Handler::Layout),
            ("skip_root", Handler::SkipRoot),
            ("outlet", Handler::Outlet),
            ("slot", Handler::Slot),
            ("endslot", Handler::EndSlot),
            ("include", Handler::Include),
            ("if", Handler::If),
            ("elseif", Handler::ElseIf),
            ("else", Handler::Else),
            ("endif", Handler::EndIf),
            ("foreach", Handler::Foreach),
            ("endforeach", Handler::EndForeach),
            ("set", Handler::Set),
        ] {
            directives.insert(name.to_string(), handler);
        }
        Self { directives }
    }

    /// Registers a custom directive, replacing any previous registration
    /// under the same name.
    pub fn add_directive<F>(&mut self, name: &str, compiler: F)
    where
        F: Fn(&str) -> Result<Node, CompileError> + Send + Sync + 'static,
    {
        self.directives
            .insert(name.to_string(), Handler::Custom(Box::new(compiler)));
    }

    /// Compiles template source into an instruction tree.
    pub fn compile(&self, source: &str) -> Result<Program, CompileError> {
        let tokens = tokenize(source)?;
        let mut frames = vec![Frame::Root(Vec::new())];

        for token in tokens {
            match token {
                Token::Text(text) => sink(&mut frames).push(Node::Text(text.to_string())),
                Token::Expression(body) => sink(&mut frames).push(compile_expression(body)?),
                Token::Directive { name, args } => self.compile_directive(name, args, &mut frames)?,
            }
        }

        match frames.pop() {
            Some(Frame::Root(nodes)) if frames.is_empty() => Ok(Program { nodes }),
            Some(frame) => Err(CompileError::UnclosedBlock(frame.name())),
            None => unreachable!("root frame always present"),
        }
    }

    fn compile_directive(
        &self,
        name: &str,
        args: &str,
        frames: &mut Vec<Frame>,
    ) -> Result<(), CompileError> {
        let handler = self
            .directives
            .get(name)
            .ok_or_else(|| CompileError::UnknownDirective(name.to_string()))?;

        match handler {
            Handler::Layout => {
                let template = unquote(args);
                if template.is_empty() {
                    return Err(CompileError::MissingArgument("layout"));
                }
                sink(frames).push(Node::Layout(template.to_string()));
            }
            Handler::SkipRoot => sink(frames).push(Node::SkipRoot),
            Handler::Outlet => {
                let name = unquote(args);
                let name = if name.is_empty() { "default" } else { name };
                sink(frames).push(Node::Outlet(name.to_string()));
            }
            Handler::Slot => {
                let name = unquote(args);
                if name.is_empty() {
                    return Err(CompileError::MissingArgument("slot"));
                }
                if frames.iter().any(|f| matches!(f, Frame::Slot { .. })) {
                    return Err(CompileError::NestedSlot);
                }
                frames.push(Frame::Slot {
                    name: name.to_string(),
                    body: Vec::new(),
                });
            }
            Handler::EndSlot => match frames.pop() {
                Some(Frame::Slot { name, body }) => sink(frames).push(Node::Slot { name, body }),
                Some(frame) => {
                    frames.push(frame);
                    return Err(CompileError::UnexpectedClose {
                        found: "endslot",
                        expected: "slot",
                    });
                }
                None => unreachable!("root frame always present"),
            },
            Handler::Include => {
                let (template, data) = parse_include(args)?;
                sink(frames).push(Node::Include { template, data });
            }
            Handler::If => {
                let condition = parse_expression(args)?;
                frames.push(Frame::If {
                    arms: Vec::new(),
                    condition: Some(condition),
                    current: Vec::new(),
                });
            }
            Handler::ElseIf => {
                let next = parse_expression(args)?;
                match frames.last_mut() {
                    Some(Frame::If {
                        arms,
                        condition,
                        current,
                    }) => {
                        match condition.take() {
                            Some(cond) => arms.push(IfArm {
                                condition: cond,
                                body: std::mem::take(current),
                            }),
                            None => return Err(CompileError::AfterElse("elseif")),
                        }
                        *condition = Some(next);
                    }
                    _ => {
                        return Err(CompileError::UnexpectedClose {
                            found: "elseif",
                            expected: "if",
                        })
                    }
                }
            }
            Handler::Else => match frames.last_mut() {
                Some(Frame::If {
                    arms,
                    condition,
                    current,
                }) => match condition.take() {
                    Some(cond) => arms.push(IfArm {
                        condition: cond,
                        body: std::mem::take(current),
                    }),
                    None => return Err(CompileError::AfterElse("else")),
                },
                _ => {
                    return Err(CompileError::UnexpectedClose {
                        found: "else",
                        expected: "if",
                    })
                }
            },
            Handler::EndIf => match frames.pop() {
                Some(Frame::If {
                    mut arms,
                    condition,
                    current,
                }) => {
                    let fallback = match condition {
                        Some(cond) => {
                            arms.push(IfArm {
                                condition: cond,
                                body: current,
                            });
                            Vec::new()
                        }
                        None => current,
                    };
                    sink(frames).push(Node::If { arms, fallback });
                }
                Some(frame) => {
                    frames.push(frame);
                    return Err(CompileError::UnexpectedClose {
                        found: "endif",
                        expected: "if",
                    });
                }
                None => unreachable!("root frame always present"),
            },
            Handler::Foreach => {
                let (key, value, iterable) = parse_foreach(args)?;
                frames.push(Frame::Foreach {
                    key,
                    value,
                    iterable,
                    body: Vec::new(),
                });
            }
            Handler::EndForeach => match frames.pop() {
                Some(Frame::Foreach {
                    key,
                    value,
                    iterable,
                    body,
                }) => sink(frames).push(Node::Foreach {
                    key,
                    value,
                    iterable,
                    body,
                }),
                Some(frame) => {
                    frames.push(frame);
                    return Err(CompileError::UnexpectedClose {
                        found: "endforeach",
                        expected: "foreach",
                    });
                }
                None => unreachable!("root frame always present"),
            },
            Handler::Set => {
                let (target, value) = parse_set(args)?;
                sink(frames).push(Node::Set { target, value });
            }
            Handler::Custom(compile) => sink(frames).push(compile(args)?),
        }

        Ok(())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

enum Frame {
    Root(Vec<Node>),
    If {
        arms: Vec<IfArm>,
        /// Condition of the arm currently collecting; `None` once the
        /// `else` arm is open.
        condition: Option<Expr>,
        current: Vec<Node>,
    },
    Foreach {
        key: Option<String>,
        value: String,
        iterable: Expr,
        body: Vec<Node>,
    },
    Slot {
        name: String,
        body: Vec<Node>,
    },
}

impl Frame {
    fn name(&self) -> &'static str {
        match self {
            Frame::Root(_) => "root",
            Frame::If { .. } => "if",
            Frame::Foreach { .. } => "foreach",
            Frame::Slot { .. } => "slot",
        }
    }
}

/// The node list currently collecting output.
fn sink(frames: &mut [Frame]) -> &mut Vec<Node> {
    match frames.last_mut().expect("root frame always present") {
        Frame::Root(nodes) => nodes,
        Frame::If { current, .. } => current,
        Frame::Foreach { body, .. } => body,
        Frame::Slot { body, .. } => body,
    }
}

/// Compiles a `{{ ... }}` body: plain expressions emit escaped, piped
/// expressions emit the filter chain's result unescaped.
fn compile_expression(body: &str) -> Result<Node, CompileError> {
    let segments = split_pipes(body);
    if segments.len() == 1 {
        return Ok(Node::Emit(parse_expression(body)?));
    }

    let mut segments = segments.into_iter();
    let value = parse_expression(segments.next().expect("split yields at least one segment"))?;
    let filters = segments
        .map(parse_filter_call)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Node::EmitPiped { value, filters })
}

/// Strips one matching pair of surrounding quotes, if present.
fn unquote(s: &str) -> &str {
    let s = s.trim();
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}
