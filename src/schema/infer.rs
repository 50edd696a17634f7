//! Schemas derived from values

use super::types::{ArraySchema, RecordField, RecordSchema, Schema, SchemaKind};
use crate::value::Value;

impl Schema {
    /// The schema admitting exactly `value`
    ///
    /// Variants without a constant schema form (regex, span, schema,
    /// function) map to their generic schema.
    pub fn of_constant(value: &Value) -> Schema {
        let kind = match value {
            Value::Null => SchemaKind::Null,
            Value::Boolean(b) => SchemaKind::Boolean { value: Some(*b) },
            Value::Long(l) => SchemaKind::Long {
                min: Some(*l),
                max: Some(*l),
            },
            Value::Decimal(d) => SchemaKind::Decimal {
                min: Some(d.clone()),
                max: Some(d.clone()),
            },
            Value::Double(d) => SchemaKind::Double {
                min: Some(*d),
                max: Some(*d),
            },
            Value::String(s) => SchemaKind::String {
                min_length: None,
                max_length: None,
                value: Some(s.clone()),
            },
            Value::Binary(b) => SchemaKind::Binary {
                min_length: None,
                max_length: None,
                value: Some(b.clone()),
            },
            Value::Date(d) => SchemaKind::Date {
                min: Some(*d),
                max: Some(*d),
            },
            Value::Array(items) => {
                SchemaKind::Array(ArraySchema::fixed(items.iter().map(Schema::of_constant).collect()))
            }
            Value::Record(r) => SchemaKind::Record(RecordSchema::new(
                r.iter()
                    .map(|(k, v)| RecordField::required(k, Schema::of_constant(v)))
                    .collect(),
                None,
            )),
            other => SchemaKind::Generic(other.json_type()),
        };
        Schema::new(kind)
    }

    /// The most specific constant-free schema describing `value`
    ///
    /// Array lengths and record field sets are kept exact; compaction over
    /// many inferred schemas is what generalises them.
    pub fn infer(value: &Value) -> Schema {
        match value {
            Value::Null => Schema::null(),
            Value::Boolean(_) => Schema::boolean(),
            Value::Long(_) => Schema::long(),
            Value::Decimal(_) => Schema::decimal(),
            Value::Double(_) => Schema::double(),
            Value::String(_) => Schema::string(),
            Value::Binary(_) => Schema::binary(),
            Value::Date(_) => Schema::date(),
            Value::Array(items) => Schema::array(ArraySchema::fixed(items.iter().map(Schema::infer).collect())),
            Value::Record(r) => Schema::record(RecordSchema::new(
                r.iter()
                    .map(|(k, v)| RecordField::required(k, Schema::infer(v)))
                    .collect(),
                None,
            )),
            other => Schema::generic(other.json_type()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{compact, CompactOptions};
    use crate::value::{Record, Span};

    #[test]
    fn test_of_constant_round_trips() {
        let values = vec![
            Value::Null,
            Value::Long(7),
            Value::string("x"),
            Value::Array(vec![Value::Boolean(true), Value::Date(5)]),
            Value::Record(Record::new().with("a", Value::Binary(vec![1, 2]))),
        ];
        for v in values {
            let s = Schema::of_constant(&v);
            assert!(s.is_constant(), "{}", s);
            assert_eq!(s.get_constant().unwrap(), v);
            assert!(s.matches(&v));
        }
    }

    #[test]
    fn test_non_constant_variants() {
        let s = Schema::of_constant(&Value::Span(Span::new(0, 1)));
        assert!(!s.is_constant());
        assert_eq!(s.to_string(), "span");
    }

    #[test]
    fn test_infer_then_compact() {
        let rows = vec![
            Value::Record(Record::new().with("id", Value::Long(1)).with("tags", Value::Array(vec![]))),
            Value::Record(
                Record::new()
                    .with("id", Value::Long(2))
                    .with("tags", Value::Array(vec![Value::string("a"), Value::string("b")]))
                    .with("note", Value::string("n")),
            ),
        ];
        let schemas: Vec<Schema> = rows.iter().map(Schema::infer).collect();
        let merged = compact(&schemas, &CompactOptions::default()).unwrap();
        assert_eq!(merged.to_string(), "{\"id\": long, \"note\"?: string, \"tags\": [string*{0,2}]}");
        for row in &rows {
            assert!(merged.matches(row));
        }
    }
}
