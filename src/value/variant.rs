//! The value variants

use std::fmt;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use regex::Regex;

use super::errors::{ValueError, ValueResult};
use super::record::Record;
use super::types::{Encoding, JsonType};
use crate::schema::Schema;

/// A JSON-like value
///
/// Ordering, equality and hashing are defined in `compare.rs` and agree with
/// each other: numbers compare by mathematical value across the three
/// numeric encodings, records compare through their canonical field order.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Long(i64),
    Decimal(BigDecimal),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    /// Milliseconds since the Unix epoch, UTC
    Date(i64),
    Array(Vec<Value>),
    Record(Record),
    Regex(JsonRegex),
    Schema(Arc<Schema>),
    Function(FunctionRef),
    Span(Span),
}

/// A compiled regular expression together with its source text
///
/// Flags are a subset of `g`, `i`, `m`, `s`, `x`. `g` (global) only affects
/// how callers iterate matches; the others become inline regex flags.
#[derive(Debug, Clone)]
pub struct JsonRegex {
    pattern: String,
    flags: String,
    compiled: Regex,
}

impl JsonRegex {
    pub fn new(pattern: impl Into<String>, flags: impl Into<String>) -> ValueResult<Self> {
        let pattern = pattern.into();
        let flags = flags.into();
        let mut inline = String::new();
        for f in flags.chars() {
            match f {
                'i' | 'm' | 's' | 'x' => inline.push(f),
                'g' => {}
                _ => return Err(ValueError::invalid_literal("regex flag", f.to_string())),
            }
        }
        let source = if inline.is_empty() {
            pattern.clone()
        } else {
            format!("(?{}){}", inline, pattern)
        };
        let compiled = Regex::new(&source)
            .map_err(|e| ValueError::invalid_literal("regex", format!("{}: {}", pattern, e)))?;
        Ok(Self {
            pattern,
            flags,
            compiled,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn is_global(&self) -> bool {
        self.flags.contains('g')
    }

    pub fn matcher(&self) -> &Regex {
        &self.compiled
    }
}

/// A half-open range of offsets, `[begin, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub begin: i64,
    pub end: i64,
}

impl Span {
    pub fn new(begin: i64, end: i64) -> Self {
        Self { begin, end }
    }
}

/// A function value: a registered function name plus captured arguments
///
/// Invoking it looks the name up in the active function registry and passes
/// `bound` ahead of the call-site arguments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionRef {
    pub name: String,
    pub bound: Vec<Value>,
}

impl FunctionRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bound: Vec::new(),
        }
    }

    pub fn with_bound(name: impl Into<String>, bound: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            bound,
        }
    }
}

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }

    pub fn decimal(text: &str) -> ValueResult<Value> {
        text.parse::<BigDecimal>()
            .map(Value::Decimal)
            .map_err(|_| ValueError::invalid_literal("decimal", text))
    }

    pub fn regex(pattern: &str, flags: &str) -> ValueResult<Value> {
        JsonRegex::new(pattern, flags).map(Value::Regex)
    }

    pub fn schema(schema: Schema) -> Value {
        Value::Schema(Arc::new(schema))
    }

    pub fn encoding(&self) -> Encoding {
        match self {
            Value::Null => Encoding::Null,
            Value::Boolean(_) => Encoding::Boolean,
            Value::Long(_) => Encoding::Long,
            Value::Decimal(_) => Encoding::Decimal,
            Value::Double(_) => Encoding::Double,
            Value::String(_) => Encoding::String,
            Value::Binary(_) => Encoding::Binary,
            Value::Date(_) => Encoding::Date,
            Value::Array(_) => Encoding::Array,
            Value::Record(_) => Encoding::Record,
            Value::Regex(_) => Encoding::Regex,
            Value::Schema(_) => Encoding::Schema,
            Value::Function(_) => Encoding::Function,
            Value::Span(_) => Encoding::Span,
        }
    }

    pub fn json_type(&self) -> JsonType {
        self.encoding().json_type()
    }

    /// Name used in type-mismatch messages
    pub fn type_name(&self) -> &'static str {
        self.encoding().name()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        self.json_type() == JsonType::Number
    }

    fn mismatch(&self, expected: &str) -> ValueError {
        ValueError::type_mismatch(expected, self.type_name())
    }

    pub fn as_bool(&self) -> ValueResult<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            other => Err(other.mismatch("boolean")),
        }
    }

    pub fn as_str(&self) -> ValueResult<&str> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn as_binary(&self) -> ValueResult<&[u8]> {
        match self {
            Value::Binary(b) => Ok(b),
            other => Err(other.mismatch("binary")),
        }
    }

    pub fn as_date(&self) -> ValueResult<i64> {
        match self {
            Value::Date(d) => Ok(*d),
            other => Err(other.mismatch("date")),
        }
    }

    pub fn as_array(&self) -> ValueResult<&[Value]> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(other.mismatch("array")),
        }
    }

    pub fn as_record(&self) -> ValueResult<&Record> {
        match self {
            Value::Record(r) => Ok(r),
            other => Err(other.mismatch("record")),
        }
    }

    pub fn as_regex(&self) -> ValueResult<&JsonRegex> {
        match self {
            Value::Regex(r) => Ok(r),
            other => Err(other.mismatch("regex")),
        }
    }

    pub fn as_schema(&self) -> ValueResult<&Schema> {
        match self {
            Value::Schema(s) => Ok(s),
            other => Err(other.mismatch("schema")),
        }
    }

    pub fn as_function(&self) -> ValueResult<&FunctionRef> {
        match self {
            Value::Function(f) => Ok(f),
            other => Err(other.mismatch("function")),
        }
    }

    /// Field lookup that treats a missing field as null
    pub fn field(&self, name: &str) -> ValueResult<Value> {
        match self {
            Value::Record(r) => Ok(r.get(name).cloned().unwrap_or(Value::Null)),
            Value::Null => Ok(Value::Null),
            other => Err(other.mismatch("record")),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl fmt::Display for Value {
    /// Compact text form; parseable by the text reader
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::serialization::to_text(self, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_of_each_variant() {
        assert_eq!(Value::Null.encoding(), Encoding::Null);
        assert_eq!(Value::Long(1).encoding(), Encoding::Long);
        assert_eq!(Value::Double(1.0).encoding(), Encoding::Double);
        assert_eq!(Value::decimal("1.5").unwrap().encoding(), Encoding::Decimal);
        assert_eq!(Value::Span(Span::new(1, 2)).json_type(), JsonType::Span);
    }

    #[test]
    fn test_accessor_type_mismatch() {
        let err = Value::Array(vec![]).as_record().unwrap_err();
        assert_eq!(
            err,
            ValueError::TypeMismatch {
                expected: "record".into(),
                actual: "array".into()
            }
        );
    }

    #[test]
    fn test_field_on_null_is_null() {
        assert_eq!(Value::Null.field("a").unwrap(), Value::Null);
        let r = Value::Record(Record::new().with("a", Value::Long(1)));
        assert_eq!(r.field("a").unwrap(), Value::Long(1));
        assert_eq!(r.field("b").unwrap(), Value::Null);
    }

    #[test]
    fn test_regex_flags() {
        let re = JsonRegex::new("ab+", "gi").unwrap();
        assert!(re.is_global());
        assert!(re.matcher().is_match("xABBy"));
        assert!(JsonRegex::new("a", "q").is_err());
        assert!(JsonRegex::new("(", "").is_err());
    }
}
