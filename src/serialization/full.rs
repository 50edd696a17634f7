//! Self-describing binary serializer
//!
//! Layout: one tag byte (the `Encoding` discriminant) followed by the basic
//! encoding of the value. `compare` on encoded bytes agrees with the value
//! order: different type classes are decided from the tags alone, equal
//! tags delegate to the basic serializer, and mixed numeric encodings fall
//! back to decoding both sides.

use std::cmp::Ordering;
use std::io::{Read, Write};

use super::basic::{
    ArraySerializer, BasicSerializer, BinarySerializer, BooleanSerializer, DateSerializer,
    DecimalSerializer, DoubleSerializer, FullSerializer, FunctionSerializer, LongSerializer,
    NullSerializer, RecordSerializer, RegexSerializer, SchemaValueSerializer, SpanSerializer,
    StringSerializer,
};
use super::errors::{SerializationError, SerializationResult};
use super::varint::read_u8;
use crate::observability::MetricsRegistry;
use crate::value::{Encoding, Value};

/// Tag byte plus basic encoding, for every variant
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFullSerializer;

impl DefaultFullSerializer {
    pub fn new() -> Self {
        Self
    }

    fn read_encoding(input: &mut dyn Read) -> SerializationResult<Encoding> {
        let tag = read_u8(input)?;
        Encoding::from_tag(tag).ok_or(SerializationError::UnknownTag(tag))
    }

    /// Run `f` with the basic serializer of `encoding`
    fn with_basic<R>(&self, encoding: Encoding, f: impl FnOnce(&dyn BasicSerializer) -> R) -> R {
        match encoding {
            Encoding::Null => f(&NullSerializer),
            Encoding::Boolean => f(&BooleanSerializer),
            Encoding::Long => f(&LongSerializer::new()),
            Encoding::Decimal => f(&DecimalSerializer),
            Encoding::Double => f(&DoubleSerializer),
            Encoding::String => f(&StringSerializer),
            Encoding::Binary => f(&BinarySerializer),
            Encoding::Date => f(&DateSerializer::new()),
            Encoding::Span => f(&SpanSerializer),
            Encoding::Regex => f(&RegexSerializer),
            Encoding::Schema => f(&SchemaValueSerializer),
            Encoding::Array => f(&ArraySerializer::new(self)),
            Encoding::Record => f(&RecordSerializer::new(self)),
            Encoding::Function => f(&FunctionSerializer::new(self)),
        }
    }
}

impl BasicSerializer for DefaultFullSerializer {
    fn encode(&self, buf: &mut Vec<u8>, value: &Value) -> SerializationResult<()> {
        let encoding = value.encoding();
        buf.push(encoding.tag());
        self.with_basic(encoding, |s| s.encode(buf, value))
    }

    fn read(&self, input: &mut dyn Read, reuse: Option<Value>) -> SerializationResult<Value> {
        let encoding = Self::read_encoding(input)?;
        self.with_basic(encoding, |s| s.read(input, reuse))
    }

    fn write(&self, out: &mut dyn Write, value: &Value) -> SerializationResult<()> {
        let mut buf = Vec::new();
        self.encode(&mut buf, value)?;
        out.write_all(&buf)?;
        MetricsRegistry::global().increment_values_serialized();
        Ok(())
    }

    fn skip(&self, input: &mut dyn Read) -> SerializationResult<()> {
        let encoding = Self::read_encoding(input)?;
        self.with_basic(encoding, |s| s.skip(input))
    }

    fn compare(&self, in1: &mut dyn Read, in2: &mut dyn Read) -> SerializationResult<Ordering> {
        let e1 = Self::read_encoding(in1)?;
        let e2 = Self::read_encoding(in2)?;
        if e1 == e2 {
            return self.with_basic(e1, |s| s.compare(in1, in2));
        }
        let (c1, c2) = (e1.json_type(), e2.json_type());
        if c1 != c2 {
            self.with_basic(e1, |s| s.skip(in1))?;
            self.with_basic(e2, |s| s.skip(in2))?;
            return Ok(c1.cmp(&c2));
        }
        // same class, different encodings: only numbers get here
        let a = self.with_basic(e1, |s| s.read(in1, None))?;
        let b = self.with_basic(e2, |s| s.read(in2, None))?;
        Ok(a.cmp(&b))
    }

    fn copy(&self, input: &mut dyn Read, out: &mut dyn Write) -> SerializationResult<()> {
        let encoding = Self::read_encoding(input)?;
        let mut buf = vec![encoding.tag()];
        self.with_basic(encoding, |s| s.copy(input, &mut buf))?;
        out.write_all(&buf)?;
        Ok(())
    }
}

impl FullSerializer for DefaultFullSerializer {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{FunctionRef, Record, Span};

    fn enc(v: &Value) -> Vec<u8> {
        let mut buf = Vec::new();
        DefaultFullSerializer.encode(&mut buf, v).unwrap();
        buf
    }

    fn cmp_encoded(a: &Value, b: &Value) -> Ordering {
        let (x, y) = (enc(a), enc(b));
        DefaultFullSerializer
            .compare(&mut x.as_slice(), &mut y.as_slice())
            .unwrap()
    }

    #[test]
    fn test_tag_bytes() {
        assert_eq!(enc(&Value::Null), vec![2]);
        assert_eq!(enc(&Value::Boolean(true)), vec![6, 1]);
        assert_eq!(enc(&Value::Long(0)), vec![9, 0x80]);
        assert_eq!(enc(&Value::string("a")), vec![7, 1, b'a']);
    }

    #[test]
    fn test_unknown_tag() {
        let err = DefaultFullSerializer
            .read(&mut [0x63u8].as_slice(), None)
            .unwrap_err();
        assert!(matches!(err, SerializationError::UnknownTag(0x63)));
        assert_eq!(err.to_string(), "unknown type tag 0x63");
    }

    #[test]
    fn test_cross_class_compare_skips_payloads() {
        let arr = Value::Array(vec![Value::Long(1), Value::string("x")]);
        let s = Value::string("zzz");
        let mut a = enc(&arr);
        a.extend(enc(&Value::Long(7)));
        let mut b = enc(&s);
        b.extend(enc(&Value::Long(8)));

        let (mut ra, mut rb) = (a.as_slice(), b.as_slice());
        let c = DefaultFullSerializer.compare(&mut ra, &mut rb).unwrap();
        assert_eq!(c, Ordering::Less);
        assert_eq!(DefaultFullSerializer.read(&mut ra, None).unwrap(), Value::Long(7));
        assert_eq!(DefaultFullSerializer.read(&mut rb, None).unwrap(), Value::Long(8));
    }

    #[test]
    fn test_mixed_numeric_compare() {
        assert_eq!(cmp_encoded(&Value::Long(2), &Value::Double(2.5)), Ordering::Less);
        assert_eq!(
            cmp_encoded(&Value::decimal("2.0").unwrap(), &Value::Long(2)),
            Ordering::Equal
        );
        assert_eq!(cmp_encoded(&Value::Double(f64::NAN), &Value::Long(i64::MAX)), Ordering::Greater);
    }

    #[test]
    fn test_record_compare_uses_sorted_pairs() {
        let a = Value::Record(Record::new().with("b", Value::Long(1)).with("a", Value::Long(2)));
        let b = Value::Record(Record::new().with("a", Value::Long(2)).with("b", Value::Long(1)));
        assert_eq!(enc(&a), enc(&b));
        let c = Value::Record(Record::new().with("a", Value::Long(3)));
        assert_eq!(cmp_encoded(&a, &c), a.cmp(&c));
    }

    #[test]
    fn test_copy_preserves_bytes() {
        let v = Value::Array(vec![
            Value::Function(FunctionRef::with_bound("add", vec![Value::Long(1)])),
            Value::Span(Span::new(2, 9)),
            Value::regex("a+", "i").unwrap(),
        ]);
        let bytes = enc(&v);
        let mut out = Vec::new();
        DefaultFullSerializer.copy(&mut bytes.as_slice(), &mut out).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_truncated_array() {
        let bytes = enc(&Value::Array(vec![Value::Long(1), Value::Long(2)]));
        let cut = &bytes[..bytes.len() - 1];
        assert!(matches!(
            DefaultFullSerializer.read(&mut &cut[..], None),
            Err(SerializationError::Truncated)
        ));
    }
}
