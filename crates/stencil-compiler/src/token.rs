//! Lexical splitting of template source into text, expression, and
//! directive tokens.
//!
//! Two delimiter pairs are recognized: `{{ ... }}` for expressions and
//! `{% ... %}` for directives. Everything between delimiters is emitted
//! verbatim as [`Token::Text`]. Tokens borrow from the source and are
//! consumed immediately by the compiler.

use crate::error::CompileError;

/// A single lexical unit of template source, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Literal text, emitted verbatim.
    Text(&'a str),
    /// The trimmed body of a `{{ ... }}` interpolation.
    Expression(&'a str),
    /// The name and raw argument string of a `{% ... %}` directive.
    Directive { name: &'a str, args: &'a str },
}

#[derive(Clone, Copy)]
enum Delim {
    Expression,
    Directive,
}

impl Delim {
    fn open(self) -> &'static str {
        match self {
            Delim::Expression => "{{",
            Delim::Directive => "{%",
        }
    }

    fn close(self) -> &'static str {
        match self {
            Delim::Expression => "}}",
            Delim::Directive => "%}",
        }
    }
}

/// Splits template source into tokens.
///
/// Zero-length text segments and whitespace-only delimiter bodies are
/// dropped. An opening delimiter with no matching closer is a
/// [`CompileError::UnterminatedDelimiter`].
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, CompileError> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < source.len() {
        let rest = &source[pos..];
        let (offset, kind) = match (rest.find("{{"), rest.find("{%")) {
            (None, None) => break,
            (Some(e), None) => (e, Delim::Expression),
            (None, Some(d)) => (d, Delim::Directive),
            (Some(e), Some(d)) => {
                if e <= d {
                    (e, Delim::Expression)
                } else {
                    (d, Delim::Directive)
                }
            }
        };

        if offset > 0 {
            tokens.push(Token::Text(&rest[..offset]));
        }

        let body_start = offset + kind.open().len();
        let end = match rest[body_start..].find(kind.close()) {
            Some(end) => end,
            None => {
                return Err(CompileError::UnterminatedDelimiter {
                    open: kind.open(),
                    offset: pos + offset,
                })
            }
        };

        let body = rest[body_start..body_start + end].trim();
        if !body.is_empty() {
            match kind {
                Delim::Expression => tokens.push(Token::Expression(body)),
                Delim::Directive => tokens.push(parse_directive(body)?),
            }
        }

        pos += body_start + end + kind.close().len();
    }

    if pos < source.len() {
        tokens.push(Token::Text(&source[pos..]));
    }

    Ok(tokens)
}

/// Splits a directive body into its name and raw argument string.
///
/// The name is a leading run of word characters; anything after it must be
/// separated by whitespace and stays opaque until the directive compiler
/// parses it.
fn parse_directive(body: &str) -> Result<Token<'_>, CompileError> {
    let name_len = body
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    let name = &body[..name_len];
    let rest = &body[name_len..];

    if name.is_empty() || !(rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace())) {
        return Err(CompileError::InvalidDirective(body.to_string()));
    }

    Ok(Token::Directive {
        name,
        args: rest.trim(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_single_token() {
        let tokens = tokenize("just plain text").unwrap();
        assert_eq!(tokens, vec![Token::Text("just plain text")]);
    }

    #[test]
    fn expression_between_text() {
        let tokens = tokenize("<div>{{ test }}</div>").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Text("<div>"),
                Token::Expression("test"),
                Token::Text("</div>"),
            ]
        );
    }

    #[test]
    fn directive_with_args() {
        let tokens = tokenize("{% layout base %}").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Directive {
                name: "layout",
                args: "base"
            }]
        );
    }

    #[test]
    fn directive_without_args() {
        let tokens = tokenize("{% skip_root %}").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Directive {
                name: "skip_root",
                args: ""
            }]
        );
    }

    #[test]
    fn adjacent_delimiters_drop_empty_text() {
        let tokens = tokenize("{{ a }}{{ b }}").unwrap();
        assert_eq!(tokens, vec![Token::Expression("a"), Token::Expression("b")]);
    }

    #[test]
    fn whitespace_only_bodies_are_dropped() {
        let tokens = tokenize("a{{   }}b{%  %}c").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Text("a"), Token::Text("b"), Token::Text("c")]
        );
    }

    #[test]
    fn unterminated_expression_is_an_error() {
        let err = tokenize("hello {{ name").unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnterminatedDelimiter { open: "{{", .. }
        ));
    }

    #[test]
    fn unterminated_directive_is_an_error() {
        let err = tokenize("{% if cond").unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnterminatedDelimiter { open: "{%", .. }
        ));
    }

    #[test]
    fn directive_name_must_lead() {
        let err = tokenize("{% !bang %}").unwrap_err();
        assert!(matches!(err, CompileError::InvalidDirective(_)));
    }

    #[test]
    fn expression_wins_when_braces_overlap() {
        // "{{%" opens an expression, not a directive
        let tokens = tokenize("{{% x %}}").unwrap();
        assert_eq!(tokens, vec![Token::Expression("% x %")]);
    }

    #[test]
    fn stray_closers_are_text() {
        let tokens = tokenize("a }} b %} c").unwrap();
        assert_eq!(tokens, vec![Token::Text("a }} b %} c")]);
    }
}
