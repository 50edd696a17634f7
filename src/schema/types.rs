//! Schema model
//!
//! A schema is an immutable description of the values a slot may hold. Each
//! node has one kind plus an optional annotation record that carries
//! documentation only: annotations never affect `matches`.

use bigdecimal::BigDecimal;

use super::errors::{SchemaError, SchemaResult};
use crate::value::{cmp_f64, JsonType, Record, Value};

/// A schema node
#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) kind: SchemaKind,
    pub(crate) annotation: Option<Record>,
}

/// The shape a schema constrains values to
#[derive(Debug, Clone)]
pub enum SchemaKind {
    /// Every value, null included
    Any,
    /// Every value except null
    AnyNonNull,
    Null,
    Boolean {
        value: Option<bool>,
    },
    Long {
        min: Option<i64>,
        max: Option<i64>,
    },
    Decimal {
        min: Option<BigDecimal>,
        max: Option<BigDecimal>,
    },
    Double {
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Any Long, Decimal or Double
    Numeric,
    String {
        min_length: Option<u64>,
        max_length: Option<u64>,
        value: Option<String>,
    },
    Binary {
        min_length: Option<u64>,
        max_length: Option<u64>,
        value: Option<Vec<u8>>,
    },
    Date {
        min: Option<i64>,
        max: Option<i64>,
    },
    /// Any value of a type class without finer constraints
    /// (regex, span, schema, function)
    Generic(JsonType),
    Array(ArraySchema),
    Record(RecordSchema),
    /// Union of two or more alternatives; flat, sorted, deduplicated
    Or(Vec<Schema>),
}

/// Discriminant order used to sort schemas of different kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchemaType {
    Any,
    AnyNonNull,
    Array,
    Binary,
    Boolean,
    Date,
    Decimal,
    Double,
    Generic,
    Long,
    Null,
    Numeric,
    Or,
    Record,
    String,
}

/// Array shape: fixed-position `head` schemas followed by between
/// `min_rest` and `max_rest` elements matching `rest`
#[derive(Debug, Clone)]
pub struct ArraySchema {
    pub(crate) head: Vec<Schema>,
    pub(crate) rest: Option<Box<Schema>>,
    pub(crate) min_rest: u64,
    pub(crate) max_rest: Option<u64>,
}

impl ArraySchema {
    /// `max_rest == None` means unbounded. Without a `rest` schema the
    /// bounds are forced to zero.
    pub fn new(head: Vec<Schema>, rest: Option<Schema>, min_rest: u64, max_rest: Option<u64>) -> Self {
        match rest {
            Some(rest) => Self {
                head,
                rest: Some(Box::new(rest)),
                min_rest,
                max_rest,
            },
            None => Self {
                head,
                rest: None,
                min_rest: 0,
                max_rest: Some(0),
            },
        }
    }

    /// Exactly `head.len()` elements
    pub fn fixed(head: Vec<Schema>) -> Self {
        Self::new(head, None, 0, Some(0))
    }

    /// Any number of elements matching `element`
    pub fn of(element: Schema) -> Self {
        Self::new(Vec::new(), Some(element), 0, None)
    }

    pub fn head(&self) -> &[Schema] {
        &self.head
    }

    pub fn rest(&self) -> Option<&Schema> {
        self.rest.as_deref()
    }

    pub fn min_rest(&self) -> u64 {
        self.min_rest
    }

    pub fn max_rest(&self) -> Option<u64> {
        self.max_rest
    }

    pub fn min_len(&self) -> u64 {
        self.head.len() as u64 + self.min_rest
    }

    pub fn max_len(&self) -> Option<u64> {
        self.max_rest.map(|m| self.head.len() as u64 + m)
    }

    /// Schema of the element at `index`, if any element may sit there
    pub fn element(&self, index: usize) -> Option<&Schema> {
        match self.head.get(index) {
            Some(s) => Some(s),
            None => {
                let offset = (index - self.head.len()) as u64;
                match self.max_rest {
                    Some(max) if offset >= max => None,
                    _ => self.rest.as_deref(),
                }
            }
        }
    }
}

/// One declared record field
#[derive(Debug, Clone)]
pub struct RecordField {
    pub name: String,
    pub schema: Schema,
    pub optional: bool,
}

impl RecordField {
    pub fn required(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            optional: true,
        }
    }
}

/// Record shape: declared fields, sorted by name, plus an optional schema
/// every undeclared field must match
#[derive(Debug, Clone)]
pub struct RecordSchema {
    pub(crate) fields: Vec<RecordField>,
    pub(crate) additional: Option<Box<Schema>>,
}

impl RecordSchema {
    /// Later declarations of a repeated name replace earlier ones
    pub fn new(fields: Vec<RecordField>, additional: Option<Schema>) -> Self {
        let mut sorted: Vec<RecordField> = Vec::with_capacity(fields.len());
        for field in fields {
            match sorted.iter_mut().find(|f| f.name == field.name) {
                Some(existing) => *existing = field,
                None => sorted.push(field),
            }
        }
        sorted.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
        Self {
            fields: sorted,
            additional: additional.map(Box::new),
        }
    }

    pub fn fields(&self) -> &[RecordField] {
        &self.fields
    }

    pub fn additional(&self) -> Option<&Schema> {
        self.additional.as_deref()
    }

    pub fn field(&self, name: &str) -> Option<&RecordField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl Schema {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            annotation: None,
        }
    }

    pub fn any() -> Self {
        Self::new(SchemaKind::Any)
    }

    pub fn non_null() -> Self {
        Self::new(SchemaKind::AnyNonNull)
    }

    pub fn null() -> Self {
        Self::new(SchemaKind::Null)
    }

    pub fn boolean() -> Self {
        Self::new(SchemaKind::Boolean { value: None })
    }

    pub fn long() -> Self {
        Self::long_range(None, None)
    }

    pub fn long_range(min: Option<i64>, max: Option<i64>) -> Self {
        Self::new(SchemaKind::Long { min, max })
    }

    pub fn decimal() -> Self {
        Self::new(SchemaKind::Decimal { min: None, max: None })
    }

    pub fn double() -> Self {
        Self::new(SchemaKind::Double { min: None, max: None })
    }

    pub fn numeric() -> Self {
        Self::new(SchemaKind::Numeric)
    }

    pub fn string() -> Self {
        Self::new(SchemaKind::String {
            min_length: None,
            max_length: None,
            value: None,
        })
    }

    pub fn binary() -> Self {
        Self::new(SchemaKind::Binary {
            min_length: None,
            max_length: None,
            value: None,
        })
    }

    pub fn date() -> Self {
        Self::new(SchemaKind::Date { min: None, max: None })
    }

    pub fn generic(t: JsonType) -> Self {
        Self::new(SchemaKind::Generic(t))
    }

    pub fn array(array: ArraySchema) -> Self {
        Self::new(SchemaKind::Array(array))
    }

    /// Array of any length whose elements all match `element`
    pub fn array_of(element: Schema) -> Self {
        Self::array(ArraySchema::of(element))
    }

    pub fn record(record: RecordSchema) -> Self {
        Self::new(SchemaKind::Record(record))
    }

    /// `schema | null`
    pub fn nullable(schema: Schema) -> Self {
        schema.union(&Schema::null())
    }

    pub fn with_annotation(mut self, annotation: Record) -> Self {
        self.annotation = Some(annotation);
        self
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    pub fn annotation(&self) -> Option<&Record> {
        self.annotation.as_ref()
    }

    pub fn schema_type(&self) -> SchemaType {
        match &self.kind {
            SchemaKind::Any => SchemaType::Any,
            SchemaKind::AnyNonNull => SchemaType::AnyNonNull,
            SchemaKind::Null => SchemaType::Null,
            SchemaKind::Boolean { .. } => SchemaType::Boolean,
            SchemaKind::Long { .. } => SchemaType::Long,
            SchemaKind::Decimal { .. } => SchemaType::Decimal,
            SchemaKind::Double { .. } => SchemaType::Double,
            SchemaKind::Numeric => SchemaType::Numeric,
            SchemaKind::String { .. } => SchemaType::String,
            SchemaKind::Binary { .. } => SchemaType::Binary,
            SchemaKind::Date { .. } => SchemaType::Date,
            SchemaKind::Generic(_) => SchemaType::Generic,
            SchemaKind::Array(_) => SchemaType::Array,
            SchemaKind::Record(_) => SchemaType::Record,
            SchemaKind::Or(_) => SchemaType::Or,
        }
    }

    /// Alternatives of an Or, or the schema itself
    pub fn alternatives(&self) -> &[Schema] {
        match &self.kind {
            SchemaKind::Or(alts) => alts,
            _ => std::slice::from_ref(self),
        }
    }

    /// Exactly one value matches this schema
    pub fn is_constant(&self) -> bool {
        match &self.kind {
            SchemaKind::Null => true,
            SchemaKind::Boolean { value } => value.is_some(),
            SchemaKind::Long { min, max } | SchemaKind::Date { min, max } => {
                min.is_some() && min == max
            }
            SchemaKind::Decimal { min, max } => min.is_some() && min == max,
            SchemaKind::Double { min: Some(a), max: Some(b) } => !a.is_nan() && a == b,
            SchemaKind::String { value, .. } => value.is_some(),
            SchemaKind::Binary { value, .. } => value.is_some(),
            SchemaKind::Array(a) => a.max_rest == Some(0) && a.head.iter().all(Schema::is_constant),
            SchemaKind::Record(r) => {
                r.additional.is_none() && r.fields.iter().all(|f| !f.optional && f.schema.is_constant())
            }
            _ => false,
        }
    }

    /// The single value this schema admits
    ///
    /// Calling this on a non-constant schema is a programming error and
    /// reported as a fatal `NotConstant`.
    pub fn get_constant(&self) -> SchemaResult<Value> {
        let not_constant = || SchemaError::NotConstant {
            schema: self.to_string(),
        };
        if !self.is_constant() {
            return Err(not_constant());
        }
        let v = match &self.kind {
            SchemaKind::Null => Value::Null,
            SchemaKind::Boolean { value: Some(b) } => Value::Boolean(*b),
            SchemaKind::Long { min: Some(v), .. } => Value::Long(*v),
            SchemaKind::Date { min: Some(v), .. } => Value::Date(*v),
            SchemaKind::Decimal { min: Some(v), .. } => Value::Decimal(v.clone()),
            SchemaKind::Double { min: Some(v), .. } => Value::Double(*v),
            SchemaKind::String { value: Some(s), .. } => Value::String(s.clone()),
            SchemaKind::Binary { value: Some(b), .. } => Value::Binary(b.clone()),
            SchemaKind::Array(a) => Value::Array(
                a.head
                    .iter()
                    .map(Schema::get_constant)
                    .collect::<SchemaResult<Vec<_>>>()?,
            ),
            SchemaKind::Record(r) => {
                let mut record = Record::with_capacity(r.fields.len());
                for f in &r.fields {
                    record.set(f.name.clone(), f.schema.get_constant()?);
                }
                Value::Record(record)
            }
            _ => return Err(not_constant()),
        };
        Ok(v)
    }

    /// Whether `value` belongs to this schema; never fails
    pub fn matches(&self, value: &Value) -> bool {
        match (&self.kind, value) {
            (SchemaKind::Any, _) => true,
            (SchemaKind::AnyNonNull, v) => !v.is_null(),
            (SchemaKind::Null, Value::Null) => true,
            (SchemaKind::Boolean { value: c }, Value::Boolean(b)) => c.map_or(true, |c| c == *b),
            (SchemaKind::Long { min, max }, Value::Long(v))
            | (SchemaKind::Date { min, max }, Value::Date(v)) => {
                min.map_or(true, |m| *v >= m) && max.map_or(true, |m| *v <= m)
            }
            (SchemaKind::Decimal { min, max }, Value::Decimal(v)) => {
                min.as_ref().map_or(true, |m| v >= m) && max.as_ref().map_or(true, |m| v <= m)
            }
            (SchemaKind::Double { min, max }, Value::Double(v)) => {
                min.map_or(true, |m| cmp_f64(*v, m).is_ge()) && max.map_or(true, |m| cmp_f64(*v, m).is_le())
            }
            (SchemaKind::Numeric, v) => v.is_number(),
            (
                SchemaKind::String {
                    min_length,
                    max_length,
                    value: c,
                },
                Value::String(s),
            ) => {
                let len = s.chars().count() as u64;
                within(len, *min_length, *max_length) && c.as_ref().map_or(true, |c| c == s)
            }
            (
                SchemaKind::Binary {
                    min_length,
                    max_length,
                    value: c,
                },
                Value::Binary(b),
            ) => within(b.len() as u64, *min_length, *max_length) && c.as_ref().map_or(true, |c| c == b),
            (SchemaKind::Generic(t), v) => v.json_type() == *t,
            (SchemaKind::Array(a), Value::Array(items)) => a.matches_items(items),
            (SchemaKind::Record(r), Value::Record(rec)) => r.matches_record(rec),
            (SchemaKind::Or(alts), v) => alts.iter().any(|s| s.matches(v)),
            _ => false,
        }
    }

    /// Whether null belongs to this schema
    pub fn accepts_null(&self) -> bool {
        self.matches(&Value::Null)
    }

    /// Every value this schema admits is an array or null
    pub fn is_array_or_null(&self) -> bool {
        match &self.kind {
            SchemaKind::Array(_) | SchemaKind::Null => true,
            SchemaKind::Or(alts) => alts.iter().all(Schema::is_array_or_null),
            _ => false,
        }
    }

    /// Schema of the elements produced by iterating a value of this schema
    ///
    /// Arrays yield their element schemas merged; null yields nothing; any
    /// other schema may yield anything.
    pub fn element_schema(&self) -> Option<Schema> {
        match &self.kind {
            SchemaKind::Null => None,
            SchemaKind::Array(a) => {
                let mut parts: Vec<Schema> = a.head.clone();
                if let Some(rest) = a.rest.as_deref() {
                    parts.push(rest.clone());
                }
                parts.into_iter().reduce(|acc, s| acc.merge(&s).unwrap_or_else(Schema::any))
            }
            SchemaKind::Or(alts) => alts
                .iter()
                .filter_map(Schema::element_schema)
                .reduce(|acc, s| acc.merge(&s).unwrap_or_else(Schema::any)),
            _ => Some(Schema::any()),
        }
    }

    /// Schema of field `name` of records described by this schema
    pub fn field_schema(&self, name: &str) -> Schema {
        match &self.kind {
            SchemaKind::Record(r) => match r.field(name) {
                Some(f) if f.optional => Schema::nullable(f.schema.clone()),
                Some(f) => f.schema.clone(),
                None => match r.additional.as_deref() {
                    Some(extra) => Schema::nullable(extra.clone()),
                    None => Schema::null(),
                },
            },
            SchemaKind::Null => Schema::null(),
            SchemaKind::Or(alts) => alts
                .iter()
                .map(|s| s.field_schema(name))
                .reduce(|acc, s| acc.union(&s))
                .unwrap_or_else(Schema::any),
            _ => Schema::any(),
        }
    }
}

fn within(len: u64, min: Option<u64>, max: Option<u64>) -> bool {
    min.map_or(true, |m| len >= m) && max.map_or(true, |m| len <= m)
}

impl ArraySchema {
    /// Whether `value` may sit at position `index`, judged on its own
    pub(crate) fn accepts_at(&self, index: u64, value: &Value) -> bool {
        let head = self.head.len() as u64;
        if index < head {
            return self.head[index as usize].matches(value);
        }
        let tail = index - head;
        self.max_rest.map_or(true, |m| tail < m)
            && self.rest.as_deref().map_or(false, |rest| rest.matches(value))
    }

    /// Whether `len` elements, each accepted at its position, form a match
    pub(crate) fn accepts_len(&self, len: u64) -> bool {
        let head = self.head.len() as u64;
        len >= head && len - head >= self.min_rest
    }

    fn matches_items(&self, items: &[Value]) -> bool {
        if items.len() < self.head.len() {
            return false;
        }
        let (head, tail) = items.split_at(self.head.len());
        if !self.head.iter().zip(head).all(|(s, v)| s.matches(v)) {
            return false;
        }
        let n = tail.len() as u64;
        if n < self.min_rest || self.max_rest.map_or(false, |m| n > m) {
            return false;
        }
        match self.rest.as_deref() {
            Some(rest) => tail.iter().all(|v| rest.matches(v)),
            None => tail.is_empty(),
        }
    }
}

impl RecordSchema {
    fn matches_record(&self, record: &Record) -> bool {
        for field in &self.fields {
            match record.get(&field.name) {
                Some(v) => {
                    if !field.schema.matches(v) {
                        return false;
                    }
                }
                None => {
                    if !field.optional {
                        return false;
                    }
                }
            }
        }
        record.iter().all(|(name, v)| {
            self.field(name).is_some()
                || self.additional.as_deref().map_or(false, |extra| extra.matches(v))
        })
    }
}
