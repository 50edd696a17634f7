//! Text form of schemas
//!
//! ```text
//! long(min=0, max=10)          string(value="x")         [long, string*{1,}]
//! {"a": long, "b"?: string, *: any}                      long | null
//! @{"doc": "ids"} long
//! ```
//!
//! Parsing lives with the text reader; `FromStr` delegates to it.

use std::fmt;
use std::str::FromStr;

use super::types::{ArraySchema, RecordSchema, Schema, SchemaKind};
use crate::serialization::{self, SerializationError};
use crate::value::Value;

fn text(v: &Value) -> String {
    serialization::to_text(v, 0)
}

/// `name(p1=v1, p2=v2)`, or bare `name` without parameters
fn write_params(f: &mut fmt::Formatter<'_>, name: &str, params: &[(&str, Option<String>)]) -> fmt::Result {
    let present: Vec<String> = params
        .iter()
        .filter_map(|(k, v)| v.as_ref().map(|v| format!("{}={}", k, v)))
        .collect();
    if present.is_empty() {
        f.write_str(name)
    } else {
        write!(f, "{}({})", name, present.join(", "))
    }
}

fn write_range(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    min: Option<Value>,
    max: Option<Value>,
) -> fmt::Result {
    match (&min, &max) {
        (Some(a), Some(b)) if a == b && a.encoding() == b.encoding() => {
            write_params(f, name, &[("value", Some(text(a)))])
        }
        _ => write_params(
            f,
            name,
            &[("min", min.as_ref().map(text)), ("max", max.as_ref().map(text))],
        ),
    }
}

fn write_lengths(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    min_length: Option<u64>,
    max_length: Option<u64>,
    value: Option<Value>,
) -> fmt::Result {
    match value {
        Some(v) => write_params(f, name, &[("value", Some(text(&v)))]),
        None => write_params(
            f,
            name,
            &[
                ("minLength", min_length.map(|n| n.to_string())),
                ("maxLength", max_length.map(|n| n.to_string())),
            ],
        ),
    }
}

fn write_array(f: &mut fmt::Formatter<'_>, a: &ArraySchema) -> fmt::Result {
    f.write_str("[")?;
    let mut first = true;
    for s in &a.head {
        if !first {
            f.write_str(", ")?;
        }
        first = false;
        write!(f, "{}", s)?;
    }
    if let Some(rest) = a.rest.as_deref() {
        if !first {
            f.write_str(", ")?;
        }
        if matches!(rest.kind, SchemaKind::Or(_)) && rest.annotation.is_none() {
            write!(f, "({})*", rest)?;
        } else {
            write!(f, "{}*", rest)?;
        }
        match (a.min_rest, a.max_rest) {
            (0, None) => {}
            (min, None) => write!(f, "{{{},}}", min)?,
            (min, Some(max)) => write!(f, "{{{},{}}}", min, max)?,
        }
    }
    f.write_str("]")
}

fn write_record(f: &mut fmt::Formatter<'_>, r: &RecordSchema) -> fmt::Result {
    f.write_str("{")?;
    let mut first = true;
    for field in &r.fields {
        if !first {
            f.write_str(", ")?;
        }
        first = false;
        let name = serde_json::to_string(&field.name).map_err(|_| fmt::Error)?;
        let marker = if field.optional { "?" } else { "" };
        write!(f, "{}{}: {}", name, marker, field.schema)?;
    }
    if let Some(extra) = r.additional.as_deref() {
        if !first {
            f.write_str(", ")?;
        }
        write!(f, "*: {}", extra)?;
    }
    f.write_str("}")
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(annotation) = &self.annotation {
            write!(f, "@{} ", text(&Value::Record(annotation.clone())))?;
            if matches!(self.kind, SchemaKind::Or(_)) {
                f.write_str("(")?;
                write_kind(f, &self.kind)?;
                return f.write_str(")");
            }
        }
        write_kind(f, &self.kind)
    }
}

fn write_kind(f: &mut fmt::Formatter<'_>, kind: &SchemaKind) -> fmt::Result {
    match kind {
        SchemaKind::Any => f.write_str("any"),
        SchemaKind::AnyNonNull => f.write_str("nonnull"),
        SchemaKind::Null => f.write_str("null"),
        SchemaKind::Boolean { value } => {
            write_params(f, "boolean", &[("value", value.map(|b| b.to_string()))])
        }
        SchemaKind::Long { min, max } => write_range(f, "long", min.map(Value::Long), max.map(Value::Long)),
        SchemaKind::Decimal { min, max } => write_range(
            f,
            "decimal",
            min.clone().map(Value::Decimal),
            max.clone().map(Value::Decimal),
        ),
        SchemaKind::Double { min, max } => {
            write_range(f, "double", min.map(Value::Double), max.map(Value::Double))
        }
        SchemaKind::Numeric => f.write_str("numeric"),
        SchemaKind::String {
            min_length,
            max_length,
            value,
        } => write_lengths(f, "string", *min_length, *max_length, value.clone().map(Value::String)),
        SchemaKind::Binary {
            min_length,
            max_length,
            value,
        } => write_lengths(f, "binary", *min_length, *max_length, value.clone().map(Value::Binary)),
        SchemaKind::Date { min, max } => write_range(f, "date", min.map(Value::Date), max.map(Value::Date)),
        SchemaKind::Generic(t) => f.write_str(t.name()),
        SchemaKind::Array(a) => write_array(f, a),
        SchemaKind::Record(r) => write_record(f, r),
        SchemaKind::Or(alts) => {
            for (i, s) in alts.iter().enumerate() {
                if i > 0 {
                    f.write_str(" | ")?;
                }
                write!(f, "{}", s)?;
            }
            Ok(())
        }
    }
}

impl FromStr for Schema {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serialization::parse_schema(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RecordField;
    use crate::value::{JsonType, Record};

    #[test]
    fn test_atomic_forms() {
        assert_eq!(Schema::any().to_string(), "any");
        assert_eq!(Schema::long().to_string(), "long");
        assert_eq!(Schema::long_range(Some(0), Some(10)).to_string(), "long(min=0, max=10)");
        assert_eq!(Schema::long_range(Some(3), Some(3)).to_string(), "long(value=3)");
        assert_eq!(Schema::long_range(None, Some(3)).to_string(), "long(max=3)");
        assert_eq!(Schema::generic(JsonType::Regex).to_string(), "regex");
    }

    #[test]
    fn test_composite_forms() {
        let arr = Schema::array(ArraySchema::new(
            vec![Schema::long()],
            Some(Schema::nullable(Schema::string())),
            1,
            None,
        ));
        assert_eq!(arr.to_string(), "[long, (null | string)*{1,}]");

        let rec = Schema::record(RecordSchema::new(
            vec![
                RecordField::optional("b", Schema::string()),
                RecordField::required("a", Schema::long()),
            ],
            Some(Schema::any()),
        ));
        assert_eq!(rec.to_string(), "{\"a\": long, \"b\"?: string, *: any}");
        assert_eq!(Schema::array(ArraySchema::fixed(vec![])).to_string(), "[]");
    }

    #[test]
    fn test_annotation_prefix() {
        let s = Schema::long().with_annotation(Record::new().with("doc", Value::string("id")));
        assert_eq!(s.to_string(), "@{\"doc\":\"id\"} long");
    }

    #[test]
    fn test_parse_round_trip() {
        for text in [
            "long(min=0, max=10)",
            "[long, (null | string)*{1,5}]",
            "{\"a\": long, \"b\"?: string(minLength=1), *: any}",
            "@{\"doc\":\"id\"} date",
            "decimal(value=3.14m) | double(min=0.5d)",
            "binary(value=hex('0A'))",
        ] {
            let parsed: Schema = text.parse().unwrap();
            assert_eq!(parsed.to_string(), text);
        }
    }
}
