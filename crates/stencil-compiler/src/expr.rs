//! The inline expression language: variable references, member access,
//! literals, and a small operator set, parsed once at compile time into an
//! [`Expr`] tree the engine interprets.
//!
//! Variable reference normalization: a bare identifier and a `$`-prefixed
//! identifier are the same context lookup; `a.b.c` and `a->b->c` are the
//! same chained member access; anything else is parsed as a full inline
//! expression.

use serde::{Deserialize, Serialize};

use crate::error::CompileError;

/// A compiled expression, evaluated against the render scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Context variable lookup by name.
    Var(String),
    /// Member access: `base.name` or `base->name`.
    Member { base: Box<Expr>, name: String },
    /// Computed access: `base[index]`.
    Index { base: Box<Expr>, index: Box<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `[a, b, c]` literal.
    Array(Vec<Expr>),
    /// `{ key: value, ... }` literal.
    Map(Vec<(String, Expr)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// A single filter invocation in a pipe expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCall {
    pub name: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    True,
    False,
    Null,
    As,
    Dot,
    Arrow,
    FatArrow,
    Comma,
    Colon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Bang,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Assign,
}

fn lex(src: &str) -> Result<Vec<Tok>, CompileError> {
    let err = |reason: String| CompileError::InvalidExpression {
        expr: src.to_string(),
        reason,
    };

    let mut toks = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_digit() {
                        end = i + 1;
                        chars.next();
                    } else {
                        break;
                    }
                }
                // a fraction only counts when the number is not itself a
                // member name, as in `items.0.name`
                let member_position = matches!(toks.last(), Some(Tok::Dot | Tok::Arrow));
                let mut is_float = false;
                if !member_position {
                    if let Some(&(dot, '.')) = chars.peek() {
                        if src[dot + 1..].starts_with(|d: char| d.is_ascii_digit()) {
                            is_float = true;
                            chars.next();
                            while let Some(&(i, d)) = chars.peek() {
                                if d.is_ascii_digit() {
                                    end = i + 1;
                                    chars.next();
                                } else {
                                    break;
                                }
                            }
                        }
                    }
                }
                let text = &src[start..end];
                if is_float {
                    let value = text
                        .parse::<f64>()
                        .map_err(|_| err(format!("malformed number `{text}`")))?;
                    toks.push(Tok::Float(value));
                } else {
                    let value = text
                        .parse::<i64>()
                        .map_err(|_| err(format!("malformed number `{text}`")))?;
                    toks.push(Tok::Int(value));
                }
            }
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    match c {
                        c if c == quote => {
                            closed = true;
                            break;
                        }
                        '\\' => match chars.next() {
                            Some((_, 'n')) => value.push('\n'),
                            Some((_, 't')) => value.push('\t'),
                            Some((_, c)) => value.push(c),
                            None => break,
                        },
                        c => value.push(c),
                    }
                }
                if !closed {
                    return Err(err("unterminated string literal".to_string()));
                }
                toks.push(Tok::Str(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        end = i + 1;
                        chars.next();
                    } else {
                        break;
                    }
                }
                toks.push(match &src[start..end] {
                    "true" => Tok::True,
                    "false" => Tok::False,
                    "null" => Tok::Null,
                    "as" => Tok::As,
                    name => Tok::Ident(name.to_string()),
                });
            }
            '$' => {
                chars.next();
                let name_start = match chars.peek() {
                    Some(&(i, d)) if d.is_ascii_alphabetic() || d == '_' => i,
                    _ => return Err(err("`$` must be followed by a name".to_string())),
                };
                let mut end = name_start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        end = i + 1;
                        chars.next();
                    } else {
                        break;
                    }
                }
                toks.push(Tok::Ident(src[name_start..end].to_string()));
            }
            '-' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '>'))) {
                    chars.next();
                    toks.push(Tok::Arrow);
                } else {
                    toks.push(Tok::Minus);
                }
            }
            '=' => {
                chars.next();
                match chars.peek() {
                    Some(&(_, '=')) => {
                        chars.next();
                        toks.push(Tok::EqEq);
                    }
                    Some(&(_, '>')) => {
                        chars.next();
                        toks.push(Tok::FatArrow);
                    }
                    _ => toks.push(Tok::Assign),
                }
            }
            '!' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    toks.push(Tok::NotEq);
                } else {
                    toks.push(Tok::Bang);
                }
            }
            '<' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    toks.push(Tok::Le);
                } else {
                    toks.push(Tok::Lt);
                }
            }
            '>' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    toks.push(Tok::Ge);
                } else {
                    toks.push(Tok::Gt);
                }
            }
            '&' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '&'))) {
                    chars.next();
                    toks.push(Tok::AndAnd);
                } else {
                    return Err(err("unexpected `&`".to_string()));
                }
            }
            '|' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '|'))) {
                    chars.next();
                    toks.push(Tok::OrOr);
                } else {
                    return Err(err("unexpected `|`".to_string()));
                }
            }
            '.' => {
                chars.next();
                toks.push(Tok::Dot);
            }
            ',' => {
                chars.next();
                toks.push(Tok::Comma);
            }
            ':' => {
                chars.next();
                toks.push(Tok::Colon);
            }
            '(' => {
                chars.next();
                toks.push(Tok::LParen);
            }
            ')' => {
                chars.next();
                toks.push(Tok::RParen);
            }
            '[' => {
                chars.next();
                toks.push(Tok::LBracket);
            }
            ']' => {
                chars.next();
                toks.push(Tok::RBracket);
            }
            '{' => {
                chars.next();
                toks.push(Tok::LBrace);
            }
            '}' => {
                chars.next();
                toks.push(Tok::RBrace);
            }
            '+' => {
                chars.next();
                toks.push(Tok::Plus);
            }
            '*' => {
                chars.next();
                toks.push(Tok::Star);
            }
            '/' => {
                chars.next();
                toks.push(Tok::Slash);
            }
            '%' => {
                chars.next();
                toks.push(Tok::Percent);
            }
            c => return Err(err(format!("unexpected character `{c}`"))),
        }
    }

    Ok(toks)
}

struct Parser<'a> {
    src: &'a str,
    toks: Vec<Tok>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Result<Self, CompileError> {
        Ok(Self {
            src,
            toks: lex(src)?,
            pos: 0,
        })
    }

    fn err(&self, reason: impl Into<String>) -> CompileError {
        CompileError::InvalidExpression {
            expr: self.src.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.toks.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: Tok, what: &str) -> Result<(), CompileError> {
        if self.eat(&tok) {
            Ok(())
        } else {
            Err(self.err(format!("expected {what}")))
        }
    }

    fn finish(&self) -> Result<(), CompileError> {
        if self.pos == self.toks.len() {
            Ok(())
        } else {
            Err(self.err("unexpected trailing input"))
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, CompileError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Tok::OrOr) {
            let rhs = self.parse_and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_equality()?;
        while self.eat(&Tok::AndAnd) {
            let rhs = self.parse_equality()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = match self.peek() {
                Some(Tok::EqEq) => BinaryOp::Eq,
                Some(Tok::NotEq) => BinaryOp::Ne,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_comparison()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Lt) => BinaryOp::Lt,
                Some(Tok::Le) => BinaryOp::Le,
                Some(Tok::Gt) => BinaryOp::Gt,
                Some(Tok::Ge) => BinaryOp::Ge,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_additive()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Plus) => BinaryOp::Add,
                Some(Tok::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Star) => BinaryOp::Mul,
                Some(Tok::Slash) => BinaryOp::Div,
                Some(Tok::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        if self.eat(&Tok::Bang) {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        if self.eat(&Tok::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(&Tok::Dot) || self.eat(&Tok::Arrow) {
                let name = match self.next() {
                    Some(Tok::Ident(name)) => name,
                    Some(Tok::Int(index)) => index.to_string(),
                    _ => return Err(self.err("expected a member name")),
                };
                expr = Expr::Member {
                    base: Box::new(expr),
                    name,
                };
            } else if self.eat(&Tok::LBracket) {
                let index = self.parse_expr()?;
                self.expect(Tok::RBracket, "`]`")?;
                expr = Expr::Index {
                    base: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        match self.next() {
            Some(Tok::Null) => Ok(Expr::Null),
            Some(Tok::True) => Ok(Expr::Bool(true)),
            Some(Tok::False) => Ok(Expr::Bool(false)),
            Some(Tok::Int(value)) => Ok(Expr::Int(value)),
            Some(Tok::Float(value)) => Ok(Expr::Float(value)),
            Some(Tok::Str(value)) => Ok(Expr::Str(value)),
            Some(Tok::Ident(name)) => Ok(Expr::Var(name)),
            Some(Tok::LParen) => {
                let expr = self.parse_expr()?;
                self.expect(Tok::RParen, "`)`")?;
                Ok(expr)
            }
            Some(Tok::LBracket) => {
                let mut items = Vec::new();
                if !self.eat(&Tok::RBracket) {
                    loop {
                        items.push(self.parse_expr()?);
                        if !self.eat(&Tok::Comma) {
                            break;
                        }
                    }
                    self.expect(Tok::RBracket, "`]`")?;
                }
                Ok(Expr::Array(items))
            }
            Some(Tok::LBrace) => {
                let mut entries = Vec::new();
                if !self.eat(&Tok::RBrace) {
                    loop {
                        let key = match self.next() {
                            Some(Tok::Ident(name)) => name,
                            Some(Tok::Str(value)) => value,
                            _ => return Err(self.err("expected a map key")),
                        };
                        self.expect(Tok::Colon, "`:`")?;
                        entries.push((key, self.parse_expr()?));
                        if !self.eat(&Tok::Comma) {
                            break;
                        }
                    }
                    self.expect(Tok::RBrace, "`}`")?;
                }
                Ok(Expr::Map(entries))
            }
            _ => Err(self.err("expected a value")),
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

/// Parses a full inline expression.
pub fn parse_expression(src: &str) -> Result<Expr, CompileError> {
    let mut parser = Parser::new(src)?;
    let expr = parser.parse_expr()?;
    parser.finish()?;
    Ok(expr)
}

/// Parses a `foreach` head: `expr as $value` or `expr as $key => $value`.
///
/// Returns `(key, value, iterable)`.
pub(crate) fn parse_foreach(src: &str) -> Result<(Option<String>, String, Expr), CompileError> {
    let invalid = || CompileError::InvalidForeach(src.to_string());

    let mut parser = Parser::new(src)?;
    let iterable = parser.parse_expr()?;
    if !parser.eat(&Tok::As) {
        return Err(invalid());
    }
    let first = match parser.next() {
        Some(Tok::Ident(name)) => name,
        _ => return Err(invalid()),
    };
    let (key, value) = if parser.eat(&Tok::FatArrow) {
        match parser.next() {
            Some(Tok::Ident(name)) => (Some(first), name),
            _ => return Err(invalid()),
        }
    } else {
        (None, first)
    };
    parser.finish().map_err(|_| invalid())?;
    Ok((key, value, iterable))
}

/// Parses a `set` body: `variable = expr`.
pub(crate) fn parse_set(src: &str) -> Result<(String, Expr), CompileError> {
    let invalid = || CompileError::InvalidSet(src.to_string());

    let mut parser = Parser::new(src)?;
    let target = match parser.next() {
        Some(Tok::Ident(name)) => name,
        _ => return Err(invalid()),
    };
    if !parser.eat(&Tok::Assign) {
        return Err(invalid());
    }
    let value = parser.parse_expr()?;
    parser.finish().map_err(|_| invalid())?;
    Ok((target, value))
}

/// Parses an `include` body: `"template"[, expr]`.
pub(crate) fn parse_include(src: &str) -> Result<(String, Option<Expr>), CompileError> {
    let invalid = || CompileError::InvalidInclude(src.to_string());

    let mut parser = Parser::new(src)?;
    let template = match parser.next() {
        Some(Tok::Str(name)) => name,
        _ => return Err(invalid()),
    };
    let data = if parser.eat(&Tok::Comma) {
        Some(parser.parse_expr()?)
    } else {
        None
    };
    parser.finish().map_err(|_| invalid())?;
    Ok((template, data))
}

/// Parses one filter segment of a pipe expression: `name` or `name(args)`.
pub(crate) fn parse_filter_call(src: &str) -> Result<FilterCall, CompileError> {
    let invalid = || CompileError::InvalidFilter(src.to_string());

    let mut parser = Parser::new(src)?;
    let name = match parser.next() {
        Some(Tok::Ident(name)) => name,
        _ => return Err(invalid()),
    };
    let mut args = Vec::new();
    if parser.eat(&Tok::LParen) {
        if !parser.eat(&Tok::RParen) {
            loop {
                args.push(parser.parse_expr()?);
                if !parser.eat(&Tok::Comma) {
                    break;
                }
            }
            parser.expect(Tok::RParen, "`)`").map_err(|_| invalid())?;
        }
    }
    parser.finish().map_err(|_| invalid())?;
    Ok(FilterCall { name, args })
}

/// Splits a pipe expression on `|` separators, respecting string literals,
/// bracket nesting, and the `||` operator.
pub(crate) fn split_pipes(src: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = src.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match quote {
            Some(q) => {
                if c == '\\' {
                    chars.next();
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                '|' => {
                    if matches!(chars.peek(), Some(&(_, '|'))) {
                        chars.next();
                    } else if depth == 0 {
                        segments.push(src[start..i].trim());
                        start = i + 1;
                    }
                }
                _ => {}
            },
        }
    }

    segments.push(src[start..].trim());
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_and_sigil_references_are_equivalent() {
        assert_eq!(parse_expression("test").unwrap(), Expr::Var("test".into()));
        assert_eq!(parse_expression("$test").unwrap(), Expr::Var("test".into()));
    }

    #[test]
    fn dotted_and_arrow_paths_are_equivalent() {
        let dotted = parse_expression("user.profile.name").unwrap();
        let arrows = parse_expression("user->profile->name").unwrap();
        assert_eq!(dotted, arrows);
        assert_eq!(
            dotted,
            Expr::Member {
                base: Box::new(Expr::Member {
                    base: Box::new(Expr::Var("user".into())),
                    name: "profile".into(),
                }),
                name: "name".into(),
            }
        );
    }

    #[test]
    fn numeric_members_stay_members() {
        let expr = parse_expression("items.0.name").unwrap();
        assert_eq!(
            expr,
            Expr::Member {
                base: Box::new(Expr::Member {
                    base: Box::new(Expr::Var("items".into())),
                    name: "0".into(),
                }),
                name: "name".into(),
            }
        );
    }

    #[test]
    fn index_access() {
        let expr = parse_expression("$item['name']").unwrap();
        assert_eq!(
            expr,
            Expr::Index {
                base: Box::new(Expr::Var("item".into())),
                index: Box::new(Expr::Str("name".into())),
            }
        );
    }

    #[test]
    fn comparison_binds_tighter_than_logic() {
        let expr = parse_expression("$a == 1 && $b == 2").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::And,
                ..
            }
        ));
    }

    #[test]
    fn arithmetic_precedence() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        match expr {
            Expr::Binary {
                op: BinaryOp::Add,
                rhs,
                ..
            } => assert!(matches!(
                *rhs,
                Expr::Binary {
                    op: BinaryOp::Mul,
                    ..
                }
            )),
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn literals() {
        assert_eq!(parse_expression("null").unwrap(), Expr::Null);
        assert_eq!(parse_expression("true").unwrap(), Expr::Bool(true));
        assert_eq!(parse_expression("42").unwrap(), Expr::Int(42));
        assert_eq!(parse_expression("1.5").unwrap(), Expr::Float(1.5));
        assert_eq!(
            parse_expression("'hi there'").unwrap(),
            Expr::Str("hi there".into())
        );
        assert_eq!(
            parse_expression("\"double\"").unwrap(),
            Expr::Str("double".into())
        );
    }

    #[test]
    fn map_literal() {
        let expr = parse_expression("{ title: name, 'n': 3 }").unwrap();
        assert_eq!(
            expr,
            Expr::Map(vec![
                ("title".into(), Expr::Var("name".into())),
                ("n".into(), Expr::Int(3)),
            ])
        );
    }

    #[test]
    fn trailing_garbage_is_an_error() {
        assert!(parse_expression("a b").is_err());
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(parse_expression("'open").is_err());
    }

    #[test]
    fn foreach_head_with_value() {
        let (key, value, iterable) = parse_foreach("$items as $item").unwrap();
        assert_eq!(key, None);
        assert_eq!(value, "item");
        assert_eq!(iterable, Expr::Var("items".into()));
    }

    #[test]
    fn foreach_head_with_key_and_value() {
        let (key, value, _) = parse_foreach("users as $id => $user").unwrap();
        assert_eq!(key.as_deref(), Some("id"));
        assert_eq!(value, "user");
    }

    #[test]
    fn foreach_without_as_is_an_error() {
        assert!(matches!(
            parse_foreach("$items").unwrap_err(),
            CompileError::InvalidForeach(_)
        ));
    }

    #[test]
    fn set_body() {
        let (target, value) = parse_set("$text = 'new_value'").unwrap();
        assert_eq!(target, "text");
        assert_eq!(value, Expr::Str("new_value".into()));
    }

    #[test]
    fn set_without_assignment_is_an_error() {
        assert!(matches!(
            parse_set("$text == 1").unwrap_err(),
            CompileError::InvalidSet(_)
        ));
    }

    #[test]
    fn include_with_data() {
        let (template, data) = parse_include("\"partials.header\", { title: t }").unwrap();
        assert_eq!(template, "partials.header");
        assert!(data.is_some());
    }

    #[test]
    fn include_without_quotes_is_an_error() {
        assert!(matches!(
            parse_include("partials.header").unwrap_err(),
            CompileError::InvalidInclude(_)
        ));
    }

    #[test]
    fn filter_call_with_args() {
        let call = parse_filter_call("truncate(20, '..')").unwrap();
        assert_eq!(call.name, "truncate");
        assert_eq!(call.args, vec![Expr::Int(20), Expr::Str("..".into())]);
    }

    #[test]
    fn filter_call_without_args() {
        let call = parse_filter_call("upper").unwrap();
        assert_eq!(call.name, "upper");
        assert!(call.args.is_empty());
    }

    #[test]
    fn split_respects_quotes_and_logic_or() {
        assert_eq!(
            split_pipes("items | join('|')"),
            vec!["items", "join('|')"]
        );
        assert_eq!(split_pipes("a || b"), vec!["a || b"]);
        assert_eq!(
            split_pipes("test | capitalize | truncate(20)"),
            vec!["test", "capitalize", "truncate(20)"]
        );
    }
}
