//! Schema-specialized binary serializer
//!
//! When the schema of a stream is known up front, most of the full
//! encoding is redundant: constants need no bytes, tags are implied by the
//! schema, numeric ranges shrink to deltas from their minimum and fixed
//! record fields need no names. The serializer compiles the schema into a
//! plan once and then encodes values by walking the plan.
//!
//! Only values matching the schema can be written; anything else fails with
//! `SchemaMismatch` before a byte is emitted. Where the schema is too loose
//! to specialize, the plan falls back to the full serializer.

use std::io::Read;

use super::basic::{
    BasicSerializer, BinarySerializer, BooleanSerializer, DateSerializer, DecimalSerializer,
    DoubleSerializer, FullSerializer, LongSerializer, StringSerializer,
};
use super::errors::{SerializationError, SerializationResult};
use super::full::DefaultFullSerializer;
use super::text_writer::to_text;
use super::varint::{read_u8, read_vulong, write_vulong};
use crate::schema::{Schema, SchemaKind};
use crate::value::{Record, Value};

enum Plan {
    /// The schema admits one value: nothing is written
    Constant(Value),
    /// Flag byte (0 = null) then the inner plan
    Nullable(Box<Plan>),
    /// Tag-less basic encoding
    Basic(Box<dyn BasicSerializer>),
    Array {
        head: Vec<Plan>,
        /// `None` for fixed-length arrays: no count is written
        rest: Option<Box<Plan>>,
    },
    Record {
        fields: Vec<FieldPlan>,
        optional_count: usize,
        additional: Option<Box<Plan>>,
    },
    /// Tagged full encoding
    Generic,
}

struct FieldPlan {
    name: String,
    optional: bool,
    plan: Plan,
}

impl Plan {
    fn compile(schema: &Schema) -> Plan {
        if schema.is_constant() {
            if let Ok(v) = schema.get_constant() {
                return Plan::Constant(v);
            }
        }
        match schema.kind() {
            SchemaKind::Boolean { .. } => Plan::Basic(Box::new(BooleanSerializer)),
            SchemaKind::Long { min, .. } => Plan::Basic(Box::new(match min {
                Some(m) => LongSerializer::with_min(*m),
                None => LongSerializer::new(),
            })),
            SchemaKind::Date { min, .. } => Plan::Basic(Box::new(match min {
                Some(m) => DateSerializer::with_min(*m),
                None => DateSerializer::new(),
            })),
            SchemaKind::Decimal { .. } => Plan::Basic(Box::new(DecimalSerializer)),
            SchemaKind::Double { .. } => Plan::Basic(Box::new(DoubleSerializer)),
            SchemaKind::String { .. } => Plan::Basic(Box::new(StringSerializer)),
            SchemaKind::Binary { .. } => Plan::Basic(Box::new(BinarySerializer)),
            SchemaKind::Array(a) => Plan::Array {
                head: a.head().iter().map(Plan::compile).collect(),
                rest: match (a.rest(), a.max_rest()) {
                    (Some(rest), max) if max != Some(0) => Some(Box::new(Plan::compile(rest))),
                    _ => None,
                },
            },
            SchemaKind::Record(r) => Plan::Record {
                fields: r
                    .fields()
                    .iter()
                    .map(|f| FieldPlan {
                        name: f.name.clone(),
                        optional: f.optional,
                        plan: Plan::compile(&f.schema),
                    })
                    .collect(),
                optional_count: r.fields().iter().filter(|f| f.optional).count(),
                additional: r.additional().map(|s| Box::new(Plan::compile(s))),
            },
            SchemaKind::Or(alts) => {
                let non_null: Vec<&Schema> = alts.iter().filter(|s| !matches!(s.kind(), SchemaKind::Null)).collect();
                match non_null.as_slice() {
                    [inner] if alts.len() == 2 && !inner.accepts_null() => {
                        Plan::Nullable(Box::new(Plan::compile(inner)))
                    }
                    _ => Plan::Generic,
                }
            }
            _ => Plan::Generic,
        }
    }

    fn encode(&self, buf: &mut Vec<u8>, value: &Value) -> SerializationResult<()> {
        match self {
            Plan::Constant(_) => Ok(()),
            Plan::Nullable(inner) => {
                if value.is_null() {
                    buf.push(0);
                    Ok(())
                } else {
                    buf.push(1);
                    inner.encode(buf, value)
                }
            }
            Plan::Basic(s) => s.encode(buf, value),
            Plan::Array { head, rest } => {
                let items = value.as_array()?;
                let (fixed, tail) = items.split_at(head.len().min(items.len()));
                for (plan, item) in head.iter().zip(fixed) {
                    plan.encode(buf, item)?;
                }
                if let Some(rest) = rest {
                    write_vulong(buf, tail.len() as u64);
                    for item in tail {
                        rest.encode(buf, item)?;
                    }
                }
                Ok(())
            }
            Plan::Record {
                fields,
                optional_count,
                additional,
            } => {
                let record = value.as_record()?;
                let mut mask = vec![0u8; (optional_count + 7) / 8];
                let mut bit = 0;
                for f in fields.iter().filter(|f| f.optional) {
                    if record.contains(&f.name) {
                        mask[bit / 8] |= 1 << (bit % 8);
                    }
                    bit += 1;
                }
                buf.extend_from_slice(&mask);
                for f in fields {
                    if let Some(v) = record.get(&f.name) {
                        f.plan.encode(buf, v)?;
                    }
                }
                if let Some(extra) = additional {
                    let undeclared: Vec<(&str, &Value)> = record
                        .sorted_fields()
                        .into_iter()
                        .filter(|(name, _)| !fields.iter().any(|f| f.name == *name))
                        .collect();
                    write_vulong(buf, undeclared.len() as u64);
                    for (name, v) in undeclared {
                        StringSerializer.encode(buf, &Value::string(name))?;
                        extra.encode(buf, v)?;
                    }
                }
                Ok(())
            }
            Plan::Generic => DefaultFullSerializer.encode(buf, value),
        }
    }

    fn read(&self, input: &mut dyn Read, reuse: Option<Value>) -> SerializationResult<Value> {
        match self {
            Plan::Constant(v) => Ok(v.clone()),
            Plan::Nullable(inner) => match read_u8(input)? {
                0 => Ok(Value::Null),
                1 => inner.read(input, reuse),
                b => Err(SerializationError::malformed(format!("null flag {:#04x}", b))),
            },
            Plan::Basic(s) => s.read(input, reuse),
            Plan::Array { head, rest } => {
                let mut items = Vec::with_capacity(head.len());
                for plan in head {
                    items.push(plan.read(input, None)?);
                }
                if let Some(rest) = rest {
                    let n = read_vulong(input)?;
                    for _ in 0..n {
                        items.push(rest.read(input, None)?);
                    }
                }
                Ok(Value::Array(items))
            }
            Plan::Record {
                fields,
                optional_count,
                additional,
            } => {
                let mut mask = vec![0u8; (optional_count + 7) / 8];
                input.read_exact(&mut mask)?;
                let mut record = Record::with_capacity(fields.len());
                let mut bit = 0;
                for f in fields {
                    let present = if f.optional {
                        let set = mask[bit / 8] & (1 << (bit % 8)) != 0;
                        bit += 1;
                        set
                    } else {
                        true
                    };
                    if present {
                        record.set(f.name.clone(), f.plan.read(input, None)?);
                    }
                }
                if let Some(extra) = additional {
                    let n = read_vulong(input)?;
                    for _ in 0..n {
                        let name = StringSerializer.read(input, None)?;
                        let v = extra.read(input, None)?;
                        record.set(name.as_str()?.to_string(), v);
                    }
                }
                Ok(Value::Record(record))
            }
            Plan::Generic => DefaultFullSerializer.read(input, reuse),
        }
    }
}

/// Binary serializer bound to one schema
pub struct SchemaBinarySerializer {
    schema: Schema,
    plan: Plan,
}

impl SchemaBinarySerializer {
    pub fn new(schema: Schema) -> Self {
        let plan = Plan::compile(&schema);
        Self { schema, plan }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl BasicSerializer for SchemaBinarySerializer {
    fn encode(&self, buf: &mut Vec<u8>, value: &Value) -> SerializationResult<()> {
        if !self.schema.matches(value) {
            return Err(SerializationError::SchemaMismatch {
                value: to_text(value, 0),
                schema: self.schema.to_string(),
            });
        }
        self.plan.encode(buf, value)
    }

    fn read(&self, input: &mut dyn Read, reuse: Option<Value>) -> SerializationResult<Value> {
        self.plan.read(input, reuse)
    }
}

/// Self-describing within the schema's domain
impl FullSerializer for SchemaBinarySerializer {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ArraySchema, RecordField, RecordSchema};

    fn round_trip(s: &SchemaBinarySerializer, v: &Value) -> Vec<u8> {
        let mut buf = Vec::new();
        s.encode(&mut buf, v).unwrap();
        let mut input = buf.as_slice();
        assert_eq!(&s.read(&mut input, None).unwrap(), v);
        assert!(input.is_empty());
        buf
    }

    #[test]
    fn test_constant_takes_no_bytes() {
        let s = SchemaBinarySerializer::new(Schema::long_range(Some(5), Some(5)));
        assert!(round_trip(&s, &Value::Long(5)).is_empty());
    }

    #[test]
    fn test_long_range_is_delta_coded() {
        let s = SchemaBinarySerializer::new(Schema::long_range(Some(1_000_000), None));
        assert_eq!(round_trip(&s, &Value::Long(1_000_003)), vec![3]);
    }

    #[test]
    fn test_nullable_uses_flag() {
        let s = SchemaBinarySerializer::new(Schema::nullable(Schema::string()));
        assert_eq!(round_trip(&s, &Value::Null), vec![0]);
        assert_eq!(round_trip(&s, &Value::string("a")), vec![1, 1, b'a']);
    }

    #[test]
    fn test_record_with_optional_and_additional() {
        let schema = Schema::record(RecordSchema::new(
            vec![
                RecordField::required("id", Schema::long()),
                RecordField::optional("note", Schema::string()),
                RecordField::required("kind", Schema::new(SchemaKind::String {
                    min_length: None,
                    max_length: None,
                    value: Some("user".into()),
                })),
            ],
            Some(Schema::any()),
        ));
        let s = SchemaBinarySerializer::new(schema);
        let with_note = Value::Record(
            Record::new()
                .with("id", Value::Long(1))
                .with("kind", Value::string("user"))
                .with("note", Value::string("hi"))
                .with("zz", Value::Boolean(true)),
        );
        round_trip(&s, &with_note);
        let bare = Value::Record(Record::new().with("id", Value::Long(2)).with("kind", Value::string("user")));
        round_trip(&s, &bare);
    }

    #[test]
    fn test_array_head_and_rest() {
        let s = SchemaBinarySerializer::new(Schema::array(ArraySchema::new(
            vec![Schema::boolean()],
            Some(Schema::double()),
            0,
            None,
        )));
        round_trip(
            &s,
            &Value::Array(vec![Value::Boolean(true), Value::Double(1.5), Value::Double(-2.0)]),
        );
        round_trip(&s, &Value::Array(vec![Value::Boolean(false)]));
    }

    #[test]
    fn test_value_outside_schema_rejected() {
        let s = SchemaBinarySerializer::new(Schema::long_range(Some(0), Some(10)));
        let mut buf = Vec::new();
        let err = s.encode(&mut buf, &Value::Long(11)).unwrap_err();
        assert!(matches!(err, SerializationError::SchemaMismatch { .. }));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_loose_schema_falls_back_to_full() {
        let s = SchemaBinarySerializer::new(Schema::any());
        round_trip(&s, &Value::regex("x", "").unwrap());
    }
}
