//! Binary serializer contracts and the per-variant basic serializers
//!
//! A basic serializer is bound to one value variant and writes no type tag.
//! Container serializers (array, record, function) borrow a full serializer
//! for their elements, since elements may be of any variant.
//!
//! Every `read` consumes exactly the bytes the matching `encode` produced,
//! and every `compare` consumes exactly one value from each input, even
//! when the order is decided early.

use std::cmp::Ordering;
use std::io::{self, Read, Write};

use bigdecimal::BigDecimal;

use super::errors::{SerializationError, SerializationResult};
use super::varint::{read_u8, read_vslong, read_vulong, write_vslong, write_vulong};
use crate::value::{cmp_f64, FunctionRef, JsonRegex, Record, Span, Value, ValueError};

/// Codec for values of one variant
pub trait BasicSerializer: Send + Sync {
    /// Append the encoding of `value` to `buf`
    fn encode(&self, buf: &mut Vec<u8>, value: &Value) -> SerializationResult<()>;

    /// Decode one value; `reuse` may donate its buffers
    fn read(&self, input: &mut dyn Read, reuse: Option<Value>) -> SerializationResult<Value>;

    /// Encode into a private buffer, then write it with a single
    /// `write_all`, so a failed encode leaves `out` untouched
    fn write(&self, out: &mut dyn Write, value: &Value) -> SerializationResult<()> {
        let mut buf = Vec::new();
        self.encode(&mut buf, value)?;
        out.write_all(&buf)?;
        Ok(())
    }

    /// Advance past one encoded value
    fn skip(&self, input: &mut dyn Read) -> SerializationResult<()> {
        self.read(input, None).map(drop)
    }

    /// Order the next encoded value of each input
    fn compare(&self, in1: &mut dyn Read, in2: &mut dyn Read) -> SerializationResult<Ordering> {
        let a = self.read(in1, None)?;
        let b = self.read(in2, None)?;
        Ok(a.cmp(&b))
    }

    /// Re-encode the next value of `input` onto `out`
    fn copy(&self, input: &mut dyn Read, out: &mut dyn Write) -> SerializationResult<()> {
        let v = self.read(input, None)?;
        self.write(out, &v)
    }
}

/// A self-describing serializer: handles every variant by writing a type
/// tag ahead of the basic encoding
pub trait FullSerializer: BasicSerializer {}

fn mismatch(expected: &str, value: &Value) -> SerializationError {
    SerializationError::Value(ValueError::type_mismatch(expected, value.type_name()))
}

/// Read exactly `len` bytes into `buf` (cleared first), without trusting
/// `len` for preallocation
pub(crate) fn read_bytes_into(input: &mut dyn Read, len: u64, buf: &mut Vec<u8>) -> SerializationResult<()> {
    buf.clear();
    let n = (&mut *input).take(len).read_to_end(buf)?;
    if n as u64 != len {
        return Err(SerializationError::Truncated);
    }
    Ok(())
}

pub(crate) fn skip_bytes(input: &mut dyn Read, len: u64) -> SerializationResult<()> {
    let n = io::copy(&mut (&mut *input).take(len), &mut io::sink())?;
    if n != len {
        return Err(SerializationError::Truncated);
    }
    Ok(())
}

/// Compare two length-prefixed byte runs chunk by chunk, consuming both
fn compare_byte_runs(in1: &mut dyn Read, len1: u64, in2: &mut dyn Read, len2: u64) -> SerializationResult<Ordering> {
    const CHUNK: usize = 256;
    let mut a = [0u8; CHUNK];
    let mut b = [0u8; CHUNK];
    let mut remaining = len1.min(len2);
    let mut result = Ordering::Equal;
    while remaining > 0 && result == Ordering::Equal {
        let n = remaining.min(CHUNK as u64) as usize;
        in1.read_exact(&mut a[..n])?;
        in2.read_exact(&mut b[..n])?;
        result = a[..n].cmp(&b[..n]);
        remaining -= n as u64;
    }
    let consumed = len1.min(len2) - remaining;
    skip_bytes(in1, len1 - consumed)?;
    skip_bytes(in2, len2 - consumed)?;
    Ok(result.then(len1.cmp(&len2)))
}

fn encode_str(buf: &mut Vec<u8>, s: &str) {
    write_vulong(buf, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

fn read_string(input: &mut dyn Read, reuse: Option<String>) -> SerializationResult<String> {
    let len = read_vulong(input)?;
    let mut bytes = reuse.map(String::into_bytes).unwrap_or_default();
    read_bytes_into(input, len, &mut bytes)?;
    String::from_utf8(bytes).map_err(|_| SerializationError::malformed("string is not UTF-8"))
}

fn skip_length_prefixed(input: &mut dyn Read) -> SerializationResult<()> {
    let len = read_vulong(input)?;
    skip_bytes(input, len)
}

/// `null`: zero bytes
pub struct NullSerializer;

impl BasicSerializer for NullSerializer {
    fn encode(&self, _buf: &mut Vec<u8>, value: &Value) -> SerializationResult<()> {
        match value {
            Value::Null => Ok(()),
            other => Err(mismatch("null", other)),
        }
    }

    fn read(&self, _input: &mut dyn Read, _reuse: Option<Value>) -> SerializationResult<Value> {
        Ok(Value::Null)
    }

    fn skip(&self, _input: &mut dyn Read) -> SerializationResult<()> {
        Ok(())
    }

    fn compare(&self, _in1: &mut dyn Read, _in2: &mut dyn Read) -> SerializationResult<Ordering> {
        Ok(Ordering::Equal)
    }
}

/// One byte, 0 or 1
pub struct BooleanSerializer;

impl BasicSerializer for BooleanSerializer {
    fn encode(&self, buf: &mut Vec<u8>, value: &Value) -> SerializationResult<()> {
        match value {
            Value::Boolean(b) => {
                buf.push(u8::from(*b));
                Ok(())
            }
            other => Err(mismatch("boolean", other)),
        }
    }

    fn read(&self, input: &mut dyn Read, _reuse: Option<Value>) -> SerializationResult<Value> {
        match read_u8(input)? {
            0 => Ok(Value::Boolean(false)),
            1 => Ok(Value::Boolean(true)),
            b => Err(SerializationError::malformed(format!("boolean byte {:#04x}", b))),
        }
    }

    fn skip(&self, input: &mut dyn Read) -> SerializationResult<()> {
        read_u8(input).map(drop)
    }

    fn compare(&self, in1: &mut dyn Read, in2: &mut dyn Read) -> SerializationResult<Ordering> {
        Ok(read_u8(in1)?.cmp(&read_u8(in2)?))
    }
}

/// Integer payload shared by Long and Date: a signed varint, or an unsigned
/// varint delta when a minimum is known
#[derive(Debug, Clone, Copy, Default)]
struct IntegerCodec {
    min: Option<i64>,
}

impl IntegerCodec {
    fn encode(&self, buf: &mut Vec<u8>, v: i64) -> SerializationResult<()> {
        match self.min {
            None => write_vslong(buf, v),
            Some(min) => {
                if v < min {
                    return Err(SerializationError::SchemaMismatch {
                        value: v.to_string(),
                        schema: format!("min={}", min),
                    });
                }
                write_vulong(buf, v.wrapping_sub(min) as u64);
            }
        }
        Ok(())
    }

    fn read(&self, input: &mut dyn Read) -> SerializationResult<i64> {
        match self.min {
            None => read_vslong(input),
            Some(min) => Ok(min.wrapping_add(read_vulong(input)? as i64)),
        }
    }

    /// Deltas from the same minimum order like the values themselves, so
    /// only the two varints are decoded
    fn compare(&self, in1: &mut dyn Read, in2: &mut dyn Read) -> SerializationResult<Ordering> {
        match self.min {
            None => Ok(read_vslong(in1)?.cmp(&read_vslong(in2)?)),
            Some(_) => Ok(read_vulong(in1)?.cmp(&read_vulong(in2)?)),
        }
    }
}

/// Long: signed varint, or unsigned delta from a schema minimum
#[derive(Debug, Clone, Copy, Default)]
pub struct LongSerializer {
    codec: IntegerCodec,
}

impl LongSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min(min: i64) -> Self {
        Self {
            codec: IntegerCodec { min: Some(min) },
        }
    }
}

impl BasicSerializer for LongSerializer {
    fn encode(&self, buf: &mut Vec<u8>, value: &Value) -> SerializationResult<()> {
        match value {
            Value::Long(v) => self.codec.encode(buf, *v),
            other => Err(mismatch("long", other)),
        }
    }

    fn read(&self, input: &mut dyn Read, _reuse: Option<Value>) -> SerializationResult<Value> {
        self.codec.read(input).map(Value::Long)
    }

    fn compare(&self, in1: &mut dyn Read, in2: &mut dyn Read) -> SerializationResult<Ordering> {
        self.codec.compare(in1, in2)
    }
}

/// Date: epoch milliseconds, encoded like Long
#[derive(Debug, Clone, Copy, Default)]
pub struct DateSerializer {
    codec: IntegerCodec,
}

impl DateSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min(min: i64) -> Self {
        Self {
            codec: IntegerCodec { min: Some(min) },
        }
    }
}

impl BasicSerializer for DateSerializer {
    fn encode(&self, buf: &mut Vec<u8>, value: &Value) -> SerializationResult<()> {
        match value {
            Value::Date(v) => self.codec.encode(buf, *v),
            other => Err(mismatch("date", other)),
        }
    }

    fn read(&self, input: &mut dyn Read, _reuse: Option<Value>) -> SerializationResult<Value> {
        self.codec.read(input).map(Value::Date)
    }

    fn compare(&self, in1: &mut dyn Read, in2: &mut dyn Read) -> SerializationResult<Ordering> {
        self.codec.compare(in1, in2)
    }
}

/// Decimal: length-prefixed UTF-8 of the decimal text, scale preserved
///
/// Ordering is by mathematical value, so `3.140` and `3.14` compare equal
/// even though their bytes differ.
pub struct DecimalSerializer;

impl DecimalSerializer {
    fn read_decimal(input: &mut dyn Read) -> SerializationResult<BigDecimal> {
        let text = read_string(input, None)?;
        text.parse::<BigDecimal>()
            .map_err(|_| SerializationError::malformed(format!("decimal text {:?}", text)))
    }
}

impl BasicSerializer for DecimalSerializer {
    fn encode(&self, buf: &mut Vec<u8>, value: &Value) -> SerializationResult<()> {
        match value {
            Value::Decimal(d) => {
                encode_str(buf, &d.to_string());
                Ok(())
            }
            other => Err(mismatch("decimal", other)),
        }
    }

    fn read(&self, input: &mut dyn Read, _reuse: Option<Value>) -> SerializationResult<Value> {
        Self::read_decimal(input).map(Value::Decimal)
    }

    fn skip(&self, input: &mut dyn Read) -> SerializationResult<()> {
        skip_length_prefixed(input)
    }

    fn compare(&self, in1: &mut dyn Read, in2: &mut dyn Read) -> SerializationResult<Ordering> {
        Ok(Self::read_decimal(in1)?.cmp(&Self::read_decimal(in2)?))
    }
}

/// Double: 8 bytes, big-endian IEEE-754
pub struct DoubleSerializer;

impl DoubleSerializer {
    fn read_f64(input: &mut dyn Read) -> SerializationResult<f64> {
        let mut raw = [0u8; 8];
        input.read_exact(&mut raw)?;
        Ok(f64::from_be_bytes(raw))
    }
}

impl BasicSerializer for DoubleSerializer {
    fn encode(&self, buf: &mut Vec<u8>, value: &Value) -> SerializationResult<()> {
        match value {
            Value::Double(d) => {
                buf.extend_from_slice(&d.to_be_bytes());
                Ok(())
            }
            other => Err(mismatch("double", other)),
        }
    }

    fn read(&self, input: &mut dyn Read, _reuse: Option<Value>) -> SerializationResult<Value> {
        Self::read_f64(input).map(Value::Double)
    }

    fn skip(&self, input: &mut dyn Read) -> SerializationResult<()> {
        skip_bytes(input, 8)
    }

    fn compare(&self, in1: &mut dyn Read, in2: &mut dyn Read) -> SerializationResult<Ordering> {
        Ok(cmp_f64(Self::read_f64(in1)?, Self::read_f64(in2)?))
    }
}

/// String: unsigned varint byte length, then UTF-8 bytes
pub struct StringSerializer;

impl BasicSerializer for StringSerializer {
    fn encode(&self, buf: &mut Vec<u8>, value: &Value) -> SerializationResult<()> {
        match value {
            Value::String(s) => {
                encode_str(buf, s);
                Ok(())
            }
            other => Err(mismatch("string", other)),
        }
    }

    fn read(&self, input: &mut dyn Read, reuse: Option<Value>) -> SerializationResult<Value> {
        let buffer = match reuse {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        read_string(input, buffer).map(Value::String)
    }

    fn skip(&self, input: &mut dyn Read) -> SerializationResult<()> {
        skip_length_prefixed(input)
    }

    fn compare(&self, in1: &mut dyn Read, in2: &mut dyn Read) -> SerializationResult<Ordering> {
        let len1 = read_vulong(in1)?;
        let len2 = read_vulong(in2)?;
        compare_byte_runs(in1, len1, in2, len2)
    }
}

/// Binary: unsigned varint length, then raw bytes
pub struct BinarySerializer;

impl BasicSerializer for BinarySerializer {
    fn encode(&self, buf: &mut Vec<u8>, value: &Value) -> SerializationResult<()> {
        match value {
            Value::Binary(b) => {
                write_vulong(buf, b.len() as u64);
                buf.extend_from_slice(b);
                Ok(())
            }
            other => Err(mismatch("binary", other)),
        }
    }

    fn read(&self, input: &mut dyn Read, reuse: Option<Value>) -> SerializationResult<Value> {
        let len = read_vulong(input)?;
        let mut bytes = match reuse {
            Some(Value::Binary(b)) => b,
            _ => Vec::new(),
        };
        read_bytes_into(input, len, &mut bytes)?;
        Ok(Value::Binary(bytes))
    }

    fn skip(&self, input: &mut dyn Read) -> SerializationResult<()> {
        skip_length_prefixed(input)
    }

    fn compare(&self, in1: &mut dyn Read, in2: &mut dyn Read) -> SerializationResult<Ordering> {
        let len1 = read_vulong(in1)?;
        let len2 = read_vulong(in2)?;
        compare_byte_runs(in1, len1, in2, len2)
    }
}

/// Span: two signed varints
pub struct SpanSerializer;

impl SpanSerializer {
    fn read_span(input: &mut dyn Read) -> SerializationResult<Span> {
        let begin = read_vslong(input)?;
        let end = read_vslong(input)?;
        Ok(Span::new(begin, end))
    }
}

impl BasicSerializer for SpanSerializer {
    fn encode(&self, buf: &mut Vec<u8>, value: &Value) -> SerializationResult<()> {
        match value {
            Value::Span(s) => {
                write_vslong(buf, s.begin);
                write_vslong(buf, s.end);
                Ok(())
            }
            other => Err(mismatch("span", other)),
        }
    }

    fn read(&self, input: &mut dyn Read, _reuse: Option<Value>) -> SerializationResult<Value> {
        Self::read_span(input).map(Value::Span)
    }

    fn compare(&self, in1: &mut dyn Read, in2: &mut dyn Read) -> SerializationResult<Ordering> {
        Ok(Self::read_span(in1)?.cmp(&Self::read_span(in2)?))
    }
}

/// Regex: pattern string, then flags string
pub struct RegexSerializer;

impl BasicSerializer for RegexSerializer {
    fn encode(&self, buf: &mut Vec<u8>, value: &Value) -> SerializationResult<()> {
        match value {
            Value::Regex(r) => {
                encode_str(buf, r.pattern());
                encode_str(buf, r.flags());
                Ok(())
            }
            other => Err(mismatch("regex", other)),
        }
    }

    fn read(&self, input: &mut dyn Read, _reuse: Option<Value>) -> SerializationResult<Value> {
        let pattern = read_string(input, None)?;
        let flags = read_string(input, None)?;
        Ok(Value::Regex(JsonRegex::new(pattern, flags)?))
    }

    fn skip(&self, input: &mut dyn Read) -> SerializationResult<()> {
        skip_length_prefixed(input)?;
        skip_length_prefixed(input)
    }

    fn compare(&self, in1: &mut dyn Read, in2: &mut dyn Read) -> SerializationResult<Ordering> {
        let pattern = StringSerializer.compare(in1, in2)?;
        let flags = StringSerializer.compare(in1, in2)?;
        Ok(pattern.then(flags))
    }
}

/// Schema: length-prefixed UTF-8 of the schema text
pub struct SchemaValueSerializer;

impl BasicSerializer for SchemaValueSerializer {
    fn encode(&self, buf: &mut Vec<u8>, value: &Value) -> SerializationResult<()> {
        match value {
            Value::Schema(s) => {
                encode_str(buf, &s.to_string());
                Ok(())
            }
            other => Err(mismatch("schema", other)),
        }
    }

    fn read(&self, input: &mut dyn Read, _reuse: Option<Value>) -> SerializationResult<Value> {
        let text = read_string(input, None)?;
        Ok(Value::schema(super::parse_schema(&text)?))
    }

    fn skip(&self, input: &mut dyn Read) -> SerializationResult<()> {
        skip_length_prefixed(input)
    }
}

/// Array: unsigned varint count, then each element full-encoded
pub struct ArraySerializer<'a> {
    elements: &'a dyn FullSerializer,
}

impl<'a> ArraySerializer<'a> {
    pub fn new(elements: &'a dyn FullSerializer) -> Self {
        Self { elements }
    }

    fn skip_elements(&self, input: &mut dyn Read, n: u64) -> SerializationResult<()> {
        for _ in 0..n {
            self.elements.skip(input)?;
        }
        Ok(())
    }
}

impl BasicSerializer for ArraySerializer<'_> {
    fn encode(&self, buf: &mut Vec<u8>, value: &Value) -> SerializationResult<()> {
        match value {
            Value::Array(items) => {
                write_vulong(buf, items.len() as u64);
                for item in items {
                    self.elements.encode(buf, item)?;
                }
                Ok(())
            }
            other => Err(mismatch("array", other)),
        }
    }

    fn read(&self, input: &mut dyn Read, reuse: Option<Value>) -> SerializationResult<Value> {
        let n = read_vulong(input)?;
        let mut recycled = match reuse {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        }
        .into_iter();
        let mut items = Vec::with_capacity(n.min(1024) as usize);
        for _ in 0..n {
            items.push(self.elements.read(input, recycled.next())?);
        }
        Ok(Value::Array(items))
    }

    fn skip(&self, input: &mut dyn Read) -> SerializationResult<()> {
        let n = read_vulong(input)?;
        self.skip_elements(input, n)
    }

    fn compare(&self, in1: &mut dyn Read, in2: &mut dyn Read) -> SerializationResult<Ordering> {
        let n1 = read_vulong(in1)?;
        let n2 = read_vulong(in2)?;
        let common = n1.min(n2);
        for i in 0..common {
            let c = self.elements.compare(in1, in2)?;
            if c != Ordering::Equal {
                self.skip_elements(in1, n1 - i - 1)?;
                self.skip_elements(in2, n2 - i - 1)?;
                return Ok(c);
            }
        }
        self.skip_elements(in1, n1 - common)?;
        self.skip_elements(in2, n2 - common)?;
        Ok(n1.cmp(&n2))
    }

    fn copy(&self, input: &mut dyn Read, out: &mut dyn Write) -> SerializationResult<()> {
        let n = read_vulong(input)?;
        let mut buf = Vec::new();
        write_vulong(&mut buf, n);
        for _ in 0..n {
            self.elements.copy(input, &mut buf)?;
        }
        out.write_all(&buf)?;
        Ok(())
    }
}

/// Record: unsigned varint count, then (name, full-encoded value) pairs in
/// canonical name order so encoded records compare pair by pair
pub struct RecordSerializer<'a> {
    values: &'a dyn FullSerializer,
}

impl<'a> RecordSerializer<'a> {
    pub fn new(values: &'a dyn FullSerializer) -> Self {
        Self { values }
    }

    fn skip_pairs(&self, input: &mut dyn Read, n: u64) -> SerializationResult<()> {
        for _ in 0..n {
            skip_length_prefixed(input)?;
            self.values.skip(input)?;
        }
        Ok(())
    }
}

impl BasicSerializer for RecordSerializer<'_> {
    fn encode(&self, buf: &mut Vec<u8>, value: &Value) -> SerializationResult<()> {
        match value {
            Value::Record(r) => {
                write_vulong(buf, r.len() as u64);
                for (name, v) in r.sorted_fields() {
                    encode_str(buf, name);
                    self.values.encode(buf, v)?;
                }
                Ok(())
            }
            other => Err(mismatch("record", other)),
        }
    }

    fn read(&self, input: &mut dyn Read, reuse: Option<Value>) -> SerializationResult<Value> {
        let n = read_vulong(input)?;
        let mut record = match reuse {
            Some(Value::Record(mut r)) => {
                r.clear();
                r
            }
            _ => Record::with_capacity(n.min(64) as usize),
        };
        for _ in 0..n {
            let name = read_string(input, None)?;
            let v = self.values.read(input, None)?;
            record.set(name, v);
        }
        Ok(Value::Record(record))
    }

    fn skip(&self, input: &mut dyn Read) -> SerializationResult<()> {
        let n = read_vulong(input)?;
        self.skip_pairs(input, n)
    }

    fn compare(&self, in1: &mut dyn Read, in2: &mut dyn Read) -> SerializationResult<Ordering> {
        let n1 = read_vulong(in1)?;
        let n2 = read_vulong(in2)?;
        let common = n1.min(n2);
        for i in 0..common {
            let c = match StringSerializer.compare(in1, in2)? {
                Ordering::Equal => self.values.compare(in1, in2)?,
                decided => {
                    self.values.skip(in1)?;
                    self.values.skip(in2)?;
                    decided
                }
            };
            if c != Ordering::Equal {
                self.skip_pairs(in1, n1 - i - 1)?;
                self.skip_pairs(in2, n2 - i - 1)?;
                return Ok(c);
            }
        }
        self.skip_pairs(in1, n1 - common)?;
        self.skip_pairs(in2, n2 - common)?;
        Ok(n1.cmp(&n2))
    }
}

/// Function: name string, then the bound arguments as an array
pub struct FunctionSerializer<'a> {
    values: &'a dyn FullSerializer,
}

impl<'a> FunctionSerializer<'a> {
    pub fn new(values: &'a dyn FullSerializer) -> Self {
        Self { values }
    }
}

impl BasicSerializer for FunctionSerializer<'_> {
    fn encode(&self, buf: &mut Vec<u8>, value: &Value) -> SerializationResult<()> {
        match value {
            Value::Function(f) => {
                encode_str(buf, &f.name);
                write_vulong(buf, f.bound.len() as u64);
                for v in &f.bound {
                    self.values.encode(buf, v)?;
                }
                Ok(())
            }
            other => Err(mismatch("function", other)),
        }
    }

    fn read(&self, input: &mut dyn Read, _reuse: Option<Value>) -> SerializationResult<Value> {
        let name = read_string(input, None)?;
        let n = read_vulong(input)?;
        let mut bound = Vec::with_capacity(n.min(64) as usize);
        for _ in 0..n {
            bound.push(self.values.read(input, None)?);
        }
        Ok(Value::Function(FunctionRef::with_bound(name, bound)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enc(s: &dyn BasicSerializer, v: &Value) -> Vec<u8> {
        let mut buf = Vec::new();
        s.encode(&mut buf, v).unwrap();
        buf
    }

    #[test]
    fn test_long_with_min_uses_delta() {
        let s = LongSerializer::with_min(1000);
        let bytes = enc(&s, &Value::Long(1005));
        assert_eq!(bytes, vec![5]);
        assert_eq!(s.read(&mut bytes.as_slice(), None).unwrap(), Value::Long(1005));
        assert!(matches!(
            s.encode(&mut Vec::new(), &Value::Long(999)),
            Err(SerializationError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_long_extremes_with_min() {
        let s = LongSerializer::with_min(i64::MIN);
        let bytes = enc(&s, &Value::Long(i64::MAX));
        assert_eq!(s.read(&mut bytes.as_slice(), None).unwrap(), Value::Long(i64::MAX));
    }

    #[test]
    fn test_date_compare_decodes_only_deltas() {
        let s = DateSerializer::with_min(1_000_000);
        let a = enc(&s, &Value::Date(1_000_010));
        let b = enc(&s, &Value::Date(1_500_000));
        assert_eq!(s.compare(&mut a.as_slice(), &mut b.as_slice()).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_decimal_keeps_scale_but_compares_by_value() {
        let s = DecimalSerializer;
        let a = enc(&s, &Value::decimal("3.140").unwrap());
        let b = enc(&s, &Value::decimal("3.14").unwrap());
        assert_ne!(a, b);
        assert_eq!(s.compare(&mut a.as_slice(), &mut b.as_slice()).unwrap(), Ordering::Equal);
        let back = s.read(&mut a.as_slice(), None).unwrap();
        assert_eq!(back.to_string(), "3.140m");
    }

    #[test]
    fn test_string_compare_streams_and_consumes() {
        let s = StringSerializer;
        let mut a = enc(&s, &Value::string("apple"));
        a.extend(enc(&s, &Value::string("tail-a")));
        let mut b = enc(&s, &Value::string("apricot"));
        b.extend(enc(&s, &Value::string("tail-b")));

        let (mut ra, mut rb) = (a.as_slice(), b.as_slice());
        assert_eq!(s.compare(&mut ra, &mut rb).unwrap(), Ordering::Less);
        assert_eq!(s.read(&mut ra, None).unwrap(), Value::string("tail-a"));
        assert_eq!(s.read(&mut rb, None).unwrap(), Value::string("tail-b"));
    }

    #[test]
    fn test_string_prefix_orders_first() {
        let s = StringSerializer;
        let a = enc(&s, &Value::string("ab"));
        let b = enc(&s, &Value::string("abc"));
        assert_eq!(s.compare(&mut a.as_slice(), &mut b.as_slice()).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_string_reuse_buffer() {
        let s = StringSerializer;
        let bytes = enc(&s, &Value::string("fresh"));
        let reused = s
            .read(&mut bytes.as_slice(), Some(Value::string("old contents that are longer")))
            .unwrap();
        assert_eq!(reused, Value::string("fresh"));
    }

    #[test]
    fn test_bad_boolean_byte() {
        assert!(matches!(
            BooleanSerializer.read(&mut [7u8].as_slice(), None),
            Err(SerializationError::Malformed(_))
        ));
    }

    #[test]
    fn test_wrong_variant_rejected() {
        let err = DoubleSerializer.encode(&mut Vec::new(), &Value::Long(1)).unwrap_err();
        assert_eq!(err.code(), "JQ_VALUE_TYPE_MISMATCH");
    }
}
