//! Text rendering of values
//!
//! JSON for the JSON subset, with readable constructors for the rest:
//!
//! ```text
//! 42  3.14m  2.5d  double('NaN')  hex('0AFF')  date('2020-01-01T00:00:00.000Z')
//! span(1,5)  regex('a+','i')  schema long(min=0)  fn('add', [1])
//! ```
//!
//! Every rendering is accepted by the text reader and reads back equal.

use std::fmt::Write as _;

use crate::value::{format_date, to_hex, Value};

/// Render `value`; `indent_step == 0` gives the compact single-line form
pub fn to_text(value: &Value, indent_step: usize) -> String {
    let mut out = String::new();
    render(&mut out, value, indent_step, 0);
    out
}

fn json_string(out: &mut String, s: &str) {
    match serde_json::to_string(s) {
        Ok(quoted) => out.push_str(&quoted),
        Err(_) => single_quoted(out, s),
    }
}

/// `'text'` with the same escapes as JSON plus `\'`
pub(crate) fn single_quoted(out: &mut String, s: &str) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
}

fn newline(out: &mut String, indent_step: usize, level: usize) {
    out.push('\n');
    out.extend(std::iter::repeat(' ').take(indent_step * level));
}

fn render_double(out: &mut String, d: f64) {
    if d.is_nan() {
        out.push_str("double('NaN')");
    } else if d.is_infinite() {
        out.push_str(if d > 0.0 { "double('Infinity')" } else { "double('-Infinity')" });
    } else {
        let _ = write!(out, "{:?}d", d);
    }
}

fn render(out: &mut String, value: &Value, indent_step: usize, level: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Long(v) => {
            let _ = write!(out, "{}", v);
        }
        Value::Decimal(d) => {
            let _ = write!(out, "{}m", d);
        }
        Value::Double(d) => render_double(out, *d),
        Value::String(s) => json_string(out, s),
        Value::Binary(b) => {
            let _ = write!(out, "hex('{}')", to_hex(b));
        }
        Value::Date(millis) => match format_date(*millis) {
            Ok(iso) => {
                out.push_str("date(");
                single_quoted(out, &iso);
                out.push(')');
            }
            Err(_) => {
                let _ = write!(out, "date({})", millis);
            }
        },
        Value::Span(s) => {
            let _ = write!(out, "span({},{})", s.begin, s.end);
        }
        Value::Regex(r) => {
            out.push_str("regex(");
            single_quoted(out, r.pattern());
            out.push(',');
            single_quoted(out, r.flags());
            out.push(')');
        }
        Value::Schema(s) => {
            let _ = write!(out, "schema {}", s);
        }
        Value::Function(f) => {
            out.push_str("fn(");
            single_quoted(out, &f.name);
            if !f.bound.is_empty() {
                out.push_str(", ");
                render(out, &Value::Array(f.bound.clone()), 0, 0);
            }
            out.push(')');
        }
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                if indent_step > 0 {
                    newline(out, indent_step, level + 1);
                }
                render(out, item, indent_step, level + 1);
            }
            if indent_step > 0 {
                newline(out, indent_step, level);
            }
            out.push(']');
        }
        Value::Record(r) => {
            if r.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push('{');
            for (i, (name, v)) in r.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                if indent_step > 0 {
                    newline(out, indent_step, level + 1);
                }
                json_string(out, name);
                out.push_str(if indent_step > 0 { ": " } else { ":" });
                render(out, v, indent_step, level + 1);
            }
            if indent_step > 0 {
                newline(out, indent_step, level);
            }
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::value::{FunctionRef, Record, Span};

    #[test]
    fn test_scalars() {
        assert_eq!(to_text(&Value::Long(-42), 0), "-42");
        assert_eq!(to_text(&Value::decimal("3.140").unwrap(), 0), "3.140m");
        assert_eq!(to_text(&Value::Double(2.0), 0), "2.0d");
        assert_eq!(to_text(&Value::Double(f64::NEG_INFINITY), 0), "double('-Infinity')");
        assert_eq!(to_text(&Value::Binary(vec![0x0a, 0xff]), 0), "hex('0AFF')");
        assert_eq!(to_text(&Value::Date(0), 0), "date('1970-01-01T00:00:00.000Z')");
        assert_eq!(to_text(&Value::Span(Span::new(1, 5)), 0), "span(1,5)");
        assert_eq!(to_text(&Value::regex("a'b", "i").unwrap(), 0), "regex('a\\'b','i')");
        assert_eq!(to_text(&Value::string("q\""), 0), "\"q\\\"\"");
    }

    #[test]
    fn test_containers_compact_and_pretty() {
        let v = Value::Record(
            Record::new()
                .with("b", Value::Array(vec![Value::Long(1), Value::Null]))
                .with("a", Value::Record(Record::new())),
        );
        assert_eq!(to_text(&v, 0), "{\"b\":[1,null],\"a\":{}}");
        assert_eq!(
            to_text(&v, 2),
            "{\n  \"b\": [\n    1,\n    null\n  ],\n  \"a\": {}\n}"
        );
    }

    #[test]
    fn test_schema_and_function() {
        let s = Value::schema(Schema::long_range(Some(0), None));
        assert_eq!(to_text(&s, 0), "schema long(min=0)");
        let f = Value::Function(FunctionRef::with_bound("add", vec![Value::Long(1)]));
        assert_eq!(to_text(&f, 0), "fn('add', [1])");
        assert_eq!(to_text(&Value::Function(FunctionRef::new("now")), 0), "fn('now')");
    }
}
