//! Output-context-aware escaping.
//!
//! Every interpolated value passes through [`escape`] with a context that
//! names the output sink it is headed for. Null and `false` escape to the
//! empty string and `true` to `"1"` in every context, never to literal
//! `null`/`true`/`false` text.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

use crate::value::display;

/// rawurlencode-style set: everything but unreserved characters.
const URL_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The output sink a value is being escaped for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeContext {
    /// Markup text content.
    Html,
    /// Markup attribute value.
    Attr,
    /// Embedded script content; the value is emitted as a quoted JSON
    /// encoding with markup-significant sequences hex-escaped.
    Js,
    /// Style identifier; stripped to `[A-Za-z0-9_-]`.
    Css,
    /// URL component; percent-encoded.
    Url,
    /// No transformation.
    Raw,
}

impl EscapeContext {
    /// Looks up a context by its template-facing name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "html" => Some(Self::Html),
            "attr" => Some(Self::Attr),
            "js" => Some(Self::Js),
            "css" => Some(Self::Css),
            "url" => Some(Self::Url),
            "raw" => Some(Self::Raw),
            _ => None,
        }
    }
}

/// Escapes a value for the given output context.
pub fn escape(value: &Value, context: EscapeContext) -> String {
    match value {
        Value::Null | Value::Bool(false) => return String::new(),
        Value::Bool(true) => return "1".to_string(),
        _ => {}
    }

    match context {
        EscapeContext::Html | EscapeContext::Attr => escape_html(&display(value)),
        EscapeContext::Js => escape_js(value),
        EscapeContext::Css => display(value)
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
            .collect(),
        EscapeContext::Url => utf8_percent_encode(&display(value), URL_ENCODE_SET).to_string(),
        EscapeContext::Raw => display(value),
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON-encodes the value, then hex-escapes the characters that could
/// terminate a surrounding script context. Quote characters inside string
/// content become `"`; the delimiting quotes stay.
fn escape_js(value: &Value) -> String {
    let encoded = serde_json::to_string(value).unwrap_or_default();
    let mut out = String::with_capacity(encoded.len());
    let mut chars = encoded.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('"') => out.push_str("\\u0022"),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            },
            '<' => out.push_str("\\u003C"),
            '>' => out.push_str("\\u003E"),
            '&' => out.push_str("\\u0026"),
            '\'' => out.push_str("\\u0027"),
            '/' => out.push_str("\\/"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn html_entity_encodes_markup() {
        assert_eq!(
            escape(&json!("<div>test</div>"), EscapeContext::Html),
            "&lt;div&gt;test&lt;/div&gt;"
        );
    }

    #[test]
    fn attr_encodes_quotes() {
        assert_eq!(
            escape(&json!("\"test!\""), EscapeContext::Attr),
            "&quot;test!&quot;"
        );
        assert_eq!(
            escape(&json!("it's"), EscapeContext::Html),
            "it&#039;s"
        );
    }

    #[test]
    fn js_quotes_and_hex_escapes() {
        assert_eq!(
            escape(
                &json!("this string's a test & <div>test</div>"),
                EscapeContext::Js
            ),
            "\"this string\\u0027s a test \\u0026 \\u003Cdiv\\u003Etest\\u003C\\/div\\u003E\""
        );
    }

    #[test]
    fn js_escapes_embedded_quotes_but_not_delimiters() {
        assert_eq!(
            escape(&json!("say \"hi\""), EscapeContext::Js),
            "\"say \\u0022hi\\u0022\""
        );
        assert_eq!(
            escape(&json!({"test": "test"}), EscapeContext::Js),
            "{\"test\":\"test\"}"
        );
    }

    #[test]
    fn css_strips_to_identifier_characters() {
        assert_eq!(escape(&json!("{css test}"), EscapeContext::Css), "csstest");
        assert_eq!(escape(&json!("a-b_c9"), EscapeContext::Css), "a-b_c9");
    }

    #[test]
    fn url_percent_encodes() {
        assert_eq!(
            escape(&json!("this is a test"), EscapeContext::Url),
            "this%20is%20a%20test"
        );
        assert_eq!(escape(&json!("a.b-c_d~e"), EscapeContext::Url), "a.b-c_d~e");
        assert_eq!(escape(&json!("a/b?c"), EscapeContext::Url), "a%2Fb%3Fc");
    }

    #[test]
    fn raw_passes_through() {
        assert_eq!(
            escape(&json!("<div>test</div>"), EscapeContext::Raw),
            "<div>test</div>"
        );
    }

    #[test]
    fn null_and_booleans_never_spell_themselves() {
        for context in [
            EscapeContext::Html,
            EscapeContext::Js,
            EscapeContext::Url,
            EscapeContext::Raw,
        ] {
            assert_eq!(escape(&Value::Null, context), "");
            assert_eq!(escape(&json!(false), context), "");
            assert_eq!(escape(&json!(true), context), "1");
        }
    }

    #[test]
    fn numbers_pass_through_markup_contexts() {
        assert_eq!(escape(&json!(42), EscapeContext::Html), "42");
    }

    #[test]
    fn context_names_resolve() {
        assert_eq!(EscapeContext::from_name("html"), Some(EscapeContext::Html));
        assert_eq!(EscapeContext::from_name("attr"), Some(EscapeContext::Attr));
        assert_eq!(EscapeContext::from_name("nope"), None);
    }
}
