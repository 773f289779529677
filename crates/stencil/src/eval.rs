//! Tree-walking evaluation of compiled programs.
//!
//! Instructions emit into a growing output buffer; slot bodies emit into a
//! side buffer that lands in the render state instead. Missing variables
//! evaluate to null and print nothing. Loop and `set` variables are written
//! into the flat render scope and stay visible after their block.

use std::cmp::Ordering;

use serde_json::{Map, Value};
use stencil_compiler::{BinaryOp, Expr, Node, UnaryOp};

use crate::engine::{Engine, Outlet, Outlets, RenderState};
use crate::error::RenderError;
use crate::escape::{escape, EscapeContext};
use crate::value::{as_f64, compare, display, is_truthy, loose_eq, member, number};

pub(crate) type Scope = Map<String, Value>;

impl Engine {
    pub(crate) fn exec(
        &self,
        nodes: &[Node],
        scope: &mut Scope,
        state: &mut RenderState,
        out: &mut String,
    ) -> Result<(), RenderError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Emit(expr) => {
                    out.push_str(&escape(&self.eval(expr, scope), EscapeContext::Html));
                }
                Node::EmitPiped { value, filters } => {
                    let mut current = self.eval(value, scope);
                    for call in filters {
                        let args: Vec<Value> =
                            call.args.iter().map(|arg| self.eval(arg, scope)).collect();
                        current = self.filters.apply(&call.name, &current, &args)?;
                    }
                    out.push_str(&display(&current));
                }
                Node::Layout(template) => state.layouts.push(template.clone()),
                Node::SkipRoot => state.skip_root = true,
                Node::Outlet(name) => self.render_outlet(name, scope, state, out)?,
                Node::Slot { name, body } => {
                    let mut captured = String::new();
                    self.exec(body, scope, state, &mut captured)?;
                    state.slots.insert(name.clone(), captured);
                }
                Node::Include { template, data } => {
                    let mut merged = scope.clone();
                    if let Some(expr) = data {
                        if let Value::Object(extra) = self.eval(expr, scope) {
                            merged.extend(extra);
                        }
                    }
                    out.push_str(&self.render_nested(template, &merged, Outlets::default())?);
                }
                Node::If { arms, fallback } => {
                    let mut taken = false;
                    for arm in arms {
                        if is_truthy(&self.eval(&arm.condition, scope)) {
                            self.exec(&arm.body, scope, state, out)?;
                            taken = true;
                            break;
                        }
                    }
                    if !taken {
                        self.exec(fallback, scope, state, out)?;
                    }
                }
                Node::Foreach {
                    key,
                    value,
                    iterable,
                    body,
                } => match self.eval(iterable, scope) {
                    Value::Array(items) => {
                        for (index, item) in items.into_iter().enumerate() {
                            if let Some(key) = key {
                                scope.insert(key.clone(), Value::from(index as u64));
                            }
                            scope.insert(value.clone(), item);
                            self.exec(body, scope, state, out)?;
                        }
                    }
                    Value::Object(entries) => {
                        for (entry_key, item) in entries {
                            if let Some(key) = key {
                                scope.insert(key.clone(), Value::String(entry_key));
                            }
                            scope.insert(value.clone(), item);
                            self.exec(body, scope, state, out)?;
                        }
                    }
                    // anything else iterates zero times
                    _ => {}
                },
                Node::Set { target, value } => {
                    let evaluated = self.eval(value, scope);
                    scope.insert(target.clone(), evaluated);
                }
            }
        }
        Ok(())
    }

    /// Resolution order: open slot, then caller-supplied outlet, then
    /// nothing. Unresolved names emit empty output by design.
    fn render_outlet(
        &self,
        name: &str,
        scope: &Scope,
        state: &mut RenderState,
        out: &mut String,
    ) -> Result<(), RenderError> {
        if let Some(content) = state.slots.get(name) {
            out.push_str(content);
            return Ok(());
        }

        match state.outlets.get(name).cloned() {
            Some(Outlet::Content(content)) => out.push_str(&content),
            Some(Outlet::Template { template, data }) => {
                let mut merged = scope.clone();
                if let Value::Object(extra) = data {
                    merged.extend(extra);
                }
                out.push_str(&self.render_nested(&template, &merged, Outlets::default())?);
            }
            None => {}
        }
        Ok(())
    }

    pub(crate) fn eval(&self, expr: &Expr, scope: &Scope) -> Value {
        match expr {
            Expr::Null => Value::Null,
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Int(n) => Value::from(*n),
            Expr::Float(f) => number(*f),
            Expr::Str(s) => Value::String(s.clone()),
            Expr::Var(name) => scope.get(name).cloned().unwrap_or(Value::Null),
            Expr::Member { base, name } => {
                let base = self.eval(base, scope);
                member(&base, name).cloned().unwrap_or(Value::Null)
            }
            Expr::Index { base, index } => {
                let base = self.eval(base, scope);
                let key = match self.eval(index, scope) {
                    Value::String(s) => s,
                    other => display(&other),
                };
                member(&base, &key).cloned().unwrap_or(Value::Null)
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand, scope);
                match op {
                    UnaryOp::Not => Value::Bool(!is_truthy(&operand)),
                    UnaryOp::Neg => as_f64(&operand).map(|f| number(-f)).unwrap_or(Value::Null),
                }
            }
            Expr::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs, scope),
            Expr::Array(items) => {
                Value::Array(items.iter().map(|item| self.eval(item, scope)).collect())
            }
            Expr::Map(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key.clone(), self.eval(value, scope));
                }
                Value::Object(map)
            }
        }
    }

    fn eval_binary(&self, op: BinaryOp, lhs: &Expr, rhs: &Expr, scope: &Scope) -> Value {
        // && and || short-circuit; everything else evaluates both sides
        match op {
            BinaryOp::Or => {
                let lhs = self.eval(lhs, scope);
                if is_truthy(&lhs) {
                    return Value::Bool(true);
                }
                return Value::Bool(is_truthy(&self.eval(rhs, scope)));
            }
            BinaryOp::And => {
                let lhs = self.eval(lhs, scope);
                if !is_truthy(&lhs) {
                    return Value::Bool(false);
                }
                return Value::Bool(is_truthy(&self.eval(rhs, scope)));
            }
            _ => {}
        }

        let lhs = self.eval(lhs, scope);
        let rhs = self.eval(rhs, scope);
        match op {
            BinaryOp::Eq => Value::Bool(loose_eq(&lhs, &rhs)),
            BinaryOp::Ne => Value::Bool(!loose_eq(&lhs, &rhs)),
            BinaryOp::Lt => Value::Bool(compare(&lhs, &rhs) == Ordering::Less),
            BinaryOp::Le => Value::Bool(compare(&lhs, &rhs) != Ordering::Greater),
            BinaryOp::Gt => Value::Bool(compare(&lhs, &rhs) == Ordering::Greater),
            BinaryOp::Ge => Value::Bool(compare(&lhs, &rhs) != Ordering::Less),
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let (Some(x), Some(y)) = (as_f64(&lhs), as_f64(&rhs)) else {
                    return Value::Null;
                };
                match op {
                    BinaryOp::Add => number(x + y),
                    BinaryOp::Sub => number(x - y),
                    BinaryOp::Mul => number(x * y),
                    BinaryOp::Div if y != 0.0 => number(x / y),
                    BinaryOp::Mod if y != 0.0 => number(x % y),
                    _ => Value::Null,
                }
            }
            BinaryOp::Or | BinaryOp::And => unreachable!("handled above"),
        }
    }
}
