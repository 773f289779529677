//! The filter registry and built-in filters.
//!
//! Filters are named transforms applied to expression values in a pipe
//! chain. The registry is name-unique; registering over an existing name
//! silently replaces it, built-ins included. Applying an unregistered name
//! is a runtime failure naming the filter.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde_json::Value;

use crate::error::RenderError;
use crate::escape::{escape, EscapeContext};
use crate::value::{compare, display, is_truthy};

/// A named value transform: `(value, args) → value`.
pub type FilterFn = Box<dyn Fn(&Value, &[Value]) -> Result<Value, RenderError> + Send + Sync>;

pub(crate) struct FilterRegistry {
    filters: HashMap<String, FilterFn>,
}

impl FilterRegistry {
    /// Creates a registry with the built-in filters registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            filters: HashMap::new(),
        };

        registry.add("upper", |v, _| {
            Ok(Value::String(display(v).to_uppercase()))
        });
        registry.add("lower", |v, _| {
            Ok(Value::String(display(v).to_lowercase()))
        });
        registry.add("capitalize", |v, _| {
            let s = display(v).to_lowercase();
            let mut chars = s.chars();
            Ok(Value::String(match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }))
        });
        registry.add("length", |v, _| {
            let len = match v {
                Value::Array(a) => a.len(),
                Value::Object(m) => m.len(),
                Value::String(s) => s.chars().count(),
                other => display(other).chars().count(),
            };
            Ok(Value::from(len))
        });
        registry.add("reverse", |v, _| {
            Ok(match v {
                Value::Array(a) => Value::Array(a.iter().rev().cloned().collect()),
                other => Value::String(display(other).chars().rev().collect()),
            })
        });
        registry.add("sort", |v, _| {
            Ok(match v {
                Value::Array(a) => {
                    let mut sorted = a.clone();
                    sorted.sort_by(compare);
                    Value::Array(sorted)
                }
                other => other.clone(),
            })
        });
        registry.add("join", |v, args| {
            Ok(match v {
                Value::Array(a) => {
                    let sep = args.first().map(display).unwrap_or_else(|| ", ".to_string());
                    Value::String(
                        a.iter().map(|item| display(item)).collect::<Vec<_>>().join(&sep),
                    )
                }
                other => other.clone(),
            })
        });
        registry.add("default", |v, args| {
            if is_truthy(v) {
                Ok(v.clone())
            } else {
                args.first()
                    .cloned()
                    .ok_or_else(|| filter_err("default", "expects a fallback value"))
            }
        });
        registry.add("date", |v, args| {
            let datetime = parse_datetime(v).ok_or_else(|| {
                filter_err("date", &format!("cannot parse `{}` as a date", display(v)))
            })?;
            let pattern = args.first().map(display).unwrap_or_else(|| "Y-m-d".to_string());
            Ok(Value::String(format_date(&datetime, &pattern)))
        });
        registry.add("truncate", |v, args| {
            let s = display(v);
            let len = args
                .first()
                .and_then(Value::as_u64)
                .map(|n| n as usize)
                .unwrap_or(100);
            let suffix = args.get(1).map(display).unwrap_or_else(|| "...".to_string());
            Ok(Value::String(if s.chars().count() > len {
                s.chars().take(len).collect::<String>() + &suffix
            } else {
                s
            }))
        });
        registry.add("raw", |v, _| {
            Ok(Value::String(escape(v, EscapeContext::Raw)))
        });
        registry.add("json", |v, _| {
            Ok(Value::String(escape(v, EscapeContext::Js)))
        });
        registry.add("dump", |v, _| {
            let pretty = serde_json::to_string_pretty(v).unwrap_or_default();
            Ok(Value::String(format!(
                "<pre>{}</pre>",
                escape(&Value::String(pretty), EscapeContext::Html)
            )))
        });

        registry
    }

    /// Registers a filter, replacing any previous registration under the
    /// same name.
    pub fn add<F>(&mut self, name: &str, filter: F)
    where
        F: Fn(&Value, &[Value]) -> Result<Value, RenderError> + Send + Sync + 'static,
    {
        self.filters.insert(name.to_string(), Box::new(filter));
    }

    /// Applies a filter by name.
    pub fn apply(&self, name: &str, value: &Value, args: &[Value]) -> Result<Value, RenderError> {
        let filter = self
            .filters
            .get(name)
            .ok_or_else(|| RenderError::UnknownFilter(name.to_string()))?;
        filter(value, args)
    }
}

fn filter_err(filter: &str, reason: &str) -> RenderError {
    RenderError::Filter {
        filter: filter.to_string(),
        reason: reason.to_string(),
    }
}

/// Reads a value as a point in time: numeric values are an epoch timestamp,
/// strings are tried against the common date formats.
fn parse_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Number(n) => {
            let epoch = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp(epoch, 0).map(|dt| dt.naive_utc())
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(epoch) = s.parse::<i64>() {
                return DateTime::from_timestamp(epoch, 0).map(|dt| dt.naive_utc());
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.naive_utc());
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            for format in ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"] {
                if let Ok(date) = NaiveDate::parse_from_str(s, format) {
                    return date.and_hms_opt(0, 0, 0);
                }
            }
            None
        }
        _ => None,
    }
}

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Formats per the classic single-character pattern table (`Y-m-d`,
/// `M d, Y`, ...). Unknown characters pass through; backslash escapes the
/// next character.
fn format_date(dt: &NaiveDateTime, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            'd' => out.push_str(&format!("{:02}", dt.day())),
            'j' => out.push_str(&dt.day().to_string()),
            'D' => out.push_str(&WEEKDAYS[dt.weekday().num_days_from_monday() as usize][..3]),
            'l' => out.push_str(WEEKDAYS[dt.weekday().num_days_from_monday() as usize]),
            'N' => out.push_str(&dt.weekday().number_from_monday().to_string()),
            'm' => out.push_str(&format!("{:02}", dt.month())),
            'n' => out.push_str(&dt.month().to_string()),
            'M' => out.push_str(&MONTHS[dt.month0() as usize][..3]),
            'F' => out.push_str(MONTHS[dt.month0() as usize]),
            'Y' => out.push_str(&dt.year().to_string()),
            'y' => out.push_str(&format!("{:02}", dt.year().rem_euclid(100))),
            'H' => out.push_str(&format!("{:02}", dt.hour())),
            'G' => out.push_str(&dt.hour().to_string()),
            'h' => out.push_str(&format!("{:02}", dt.hour12().1)),
            'g' => out.push_str(&dt.hour12().1.to_string()),
            'i' => out.push_str(&format!("{:02}", dt.minute())),
            's' => out.push_str(&format!("{:02}", dt.second())),
            'A' => out.push_str(if dt.hour12().0 { "PM" } else { "AM" }),
            'a' => out.push_str(if dt.hour12().0 { "pm" } else { "am" }),
            'U' => out.push_str(&dt.and_utc().timestamp().to_string()),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apply(name: &str, value: Value, args: &[Value]) -> Value {
        FilterRegistry::with_builtins()
            .apply(name, &value, args)
            .unwrap()
    }

    #[test]
    fn upper_and_lower() {
        assert_eq!(apply("upper", json!("test"), &[]), json!("TEST"));
        assert_eq!(apply("lower", json!("TEST"), &[]), json!("test"));
    }

    #[test]
    fn capitalize_lowers_the_rest() {
        assert_eq!(apply("capitalize", json!("tEST"), &[]), json!("Test"));
        assert_eq!(apply("capitalize", json!(""), &[]), json!(""));
    }

    #[test]
    fn length_counts_elements_or_characters() {
        assert_eq!(apply("length", json!("test"), &[]), json!(4));
        assert_eq!(apply("length", json!(["first", "second"]), &[]), json!(2));
        assert_eq!(apply("length", json!({"a": 1, "b": 2}), &[]), json!(2));
        assert_eq!(apply("length", json!(1234), &[]), json!(4));
    }

    #[test]
    fn reverse_strings_and_arrays() {
        assert_eq!(apply("reverse", json!("test"), &[]), json!("tset"));
        assert_eq!(
            apply("reverse", json!(["first", "second"]), &[]),
            json!(["second", "first"])
        );
    }

    #[test]
    fn sort_is_ascending_and_non_mutating() {
        let original = json!([3, 1, 4, 2]);
        assert_eq!(apply("sort", original.clone(), &[]), json!([1, 2, 3, 4]));
        assert_eq!(original, json!([3, 1, 4, 2]));
    }

    #[test]
    fn join_defaults_to_comma_space() {
        assert_eq!(apply("join", json!([1, 2, 3, 4]), &[]), json!("1, 2, 3, 4"));
        assert_eq!(
            apply("join", json!([1, 2, 3, 4]), &[json!(".")]),
            json!("1.2.3.4")
        );
        assert_eq!(apply("join", json!("scalar"), &[]), json!("scalar"));
    }

    #[test]
    fn default_substitutes_on_falsy() {
        assert_eq!(
            apply("default", json!("set_value"), &[json!("default_value")]),
            json!("set_value")
        );
        assert_eq!(
            apply("default", Value::Null, &[json!("default_value")]),
            json!("default_value")
        );
        assert_eq!(
            apply("default", json!(""), &[json!("fallback")]),
            json!("fallback")
        );
    }

    #[test]
    fn date_defaults_to_iso() {
        assert_eq!(apply("date", json!("12/20/2000"), &[]), json!("2000-12-20"));
    }

    #[test]
    fn date_with_custom_format() {
        assert_eq!(
            apply("date", json!("12/20/2000"), &[json!("M d, Y")]),
            json!("Dec 20, 2000")
        );
    }

    #[test]
    fn date_accepts_epoch_numbers() {
        assert_eq!(apply("date", json!(0), &[]), json!("1970-01-01"));
        assert_eq!(
            apply("date", json!(977270400), &[json!("Y-m-d H:i:s")]),
            json!("2000-12-20 00:00:00")
        );
    }

    #[test]
    fn date_rejects_garbage() {
        let err = FilterRegistry::with_builtins()
            .apply("date", &json!("not a date"), &[])
            .unwrap_err();
        assert!(err.to_string().contains("date"));
    }

    #[test]
    fn truncate_only_when_longer() {
        let long = "0".repeat(150);
        let result = apply("truncate", json!(long), &[]);
        assert_eq!(result.as_str().unwrap().len(), 100 + "...".len());

        let result = apply("truncate", json!("0".repeat(150)), &[json!(20)]);
        assert_eq!(result.as_str().unwrap().len(), 20 + "...".len());

        assert_eq!(apply("truncate", json!("short"), &[json!(20)]), json!("short"));
    }

    #[test]
    fn truncate_custom_suffix() {
        assert_eq!(
            apply("truncate", json!("abcdef"), &[json!(3), json!("~")]),
            json!("abc~")
        );
    }

    #[test]
    fn raw_json_and_dump_delegate_to_escape_paths() {
        assert_eq!(
            apply("raw", json!("<div>test</div>"), &[]),
            json!("<div>test</div>")
        );
        assert_eq!(
            apply("json", json!({"test": "test"}), &[]),
            json!("{\"test\":\"test\"}")
        );
        let dumped = apply("dump", json!({"test": "test"}), &[]);
        let dumped = dumped.as_str().unwrap();
        assert!(dumped.starts_with("<pre>"));
        assert!(dumped.ends_with("</pre>"));
        assert!(dumped.contains("&quot;test&quot;"));
    }

    #[test]
    fn unknown_filter_names_the_offender() {
        let err = FilterRegistry::with_builtins()
            .apply("sparkle", &json!(1), &[])
            .unwrap_err();
        match err {
            RenderError::UnknownFilter(name) => assert_eq!(name, "sparkle"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn later_registration_overwrites() {
        let mut registry = FilterRegistry::with_builtins();
        registry.add("upper", |_, _| Ok(json!("overridden")));
        assert_eq!(
            registry.apply("upper", &json!("x"), &[]).unwrap(),
            json!("overridden")
        );
    }
}
