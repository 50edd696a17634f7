//! Text parsing of values and schemas
//!
//! The reader works on a `BufRead` and peeks through `fill_buf`, so after a
//! successful `read_value` the underlying stream sits right after the value
//! and the next value can be read from the same stream.
//!
//! Numbers: an integer without a suffix is a Long (a Decimal if it does not
//! fit), a fraction or exponent without a suffix is a Double, and the `m`
//! and `d` suffixes force Decimal and Double.

use std::io::{BufRead, ErrorKind};

use bigdecimal::BigDecimal;

use super::errors::{SerializationError, SerializationResult};
use crate::schema::{ArraySchema, RecordField, RecordSchema, Schema, SchemaError, SchemaKind};
use crate::value::{from_hex, parse_date, FunctionRef, JsonRegex, JsonType, Record, Span, Value};

/// Pull parser over a byte stream
pub struct TextReader<R> {
    input: R,
    position: u64,
}

impl<R: BufRead> TextReader<R> {
    pub fn new(input: R) -> Self {
        Self { input, position: 0 }
    }

    /// Bytes consumed so far
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.input
    }

    /// Next value, or `None` at end of input
    pub fn read_value(&mut self) -> SerializationResult<Option<Value>> {
        self.skip_ws()?;
        if self.peek()?.is_none() {
            return Ok(None);
        }
        self.value().map(Some)
    }

    pub fn read_schema(&mut self) -> SerializationResult<Schema> {
        self.schema_or()
    }

    // ---- bytes ----

    fn peek(&mut self) -> SerializationResult<Option<u8>> {
        loop {
            match self.input.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(SerializationError::Io(e)),
            }
        }
    }

    fn bump(&mut self) {
        self.input.consume(1);
        self.position += 1;
    }

    fn next_byte(&mut self) -> SerializationResult<Option<u8>> {
        let b = self.peek()?;
        if b.is_some() {
            self.bump();
        }
        Ok(b)
    }

    fn error(&self, message: impl Into<String>) -> SerializationError {
        SerializationError::Parse {
            position: self.position,
            message: message.into(),
        }
    }

    fn skip_ws(&mut self) -> SerializationResult<()> {
        while let Some(b) = self.peek()? {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.bump();
        }
        Ok(())
    }

    /// Consume `want` if it is the next non-blank byte
    fn eat(&mut self, want: u8) -> SerializationResult<bool> {
        self.skip_ws()?;
        if self.peek()? == Some(want) {
            self.bump();
            return Ok(true);
        }
        Ok(false)
    }

    fn expect(&mut self, want: u8) -> SerializationResult<()> {
        self.skip_ws()?;
        match self.next_byte()? {
            Some(b) if b == want => Ok(()),
            Some(b) => Err(self.error(format!("expected '{}', found '{}'", want as char, b as char))),
            None => Err(self.error(format!("expected '{}', found end of input", want as char))),
        }
    }

    fn identifier(&mut self) -> SerializationResult<String> {
        self.skip_ws()?;
        let mut name = String::new();
        while let Some(b) = self.peek()? {
            if b.is_ascii_alphanumeric() || b == b'_' {
                name.push(b as char);
                self.bump();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(self.error("expected an identifier"));
        }
        Ok(name)
    }

    fn unsigned(&mut self) -> SerializationResult<u64> {
        self.skip_ws()?;
        let mut digits = String::new();
        while let Some(b) = self.peek()? {
            if !b.is_ascii_digit() {
                break;
            }
            digits.push(b as char);
            self.bump();
        }
        digits
            .parse::<u64>()
            .map_err(|_| self.error(format!("expected a count, found {:?}", digits)))
    }

    // ---- values ----

    fn value(&mut self) -> SerializationResult<Value> {
        self.skip_ws()?;
        match self.peek()? {
            None => Err(self.error("unexpected end of input")),
            Some(b'[') => self.array(),
            Some(b'{') => self.record().map(Value::Record),
            Some(q @ (b'"' | b'\'')) => self.string(q).map(Value::String),
            Some(b) if b == b'-' || b.is_ascii_digit() => self.number(),
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => self.word(),
            Some(b) => Err(self.error(format!("unexpected character '{}'", b as char))),
        }
    }

    fn array(&mut self) -> SerializationResult<Value> {
        self.expect(b'[')?;
        let mut items = Vec::new();
        if self.eat(b']')? {
            return Ok(Value::Array(items));
        }
        loop {
            items.push(self.value()?);
            if self.eat(b',')? {
                continue;
            }
            self.expect(b']')?;
            return Ok(Value::Array(items));
        }
    }

    fn field_name(&mut self) -> SerializationResult<String> {
        self.skip_ws()?;
        match self.peek()? {
            Some(q @ (b'"' | b'\'')) => self.string(q),
            _ => self.identifier(),
        }
    }

    fn record(&mut self) -> SerializationResult<Record> {
        self.expect(b'{')?;
        let mut record = Record::new();
        if self.eat(b'}')? {
            return Ok(record);
        }
        loop {
            let name = self.field_name()?;
            self.expect(b':')?;
            let v = self.value()?;
            record.set(name, v);
            if self.eat(b',')? {
                continue;
            }
            self.expect(b'}')?;
            return Ok(record);
        }
    }

    fn string(&mut self, quote: u8) -> SerializationResult<String> {
        self.bump();
        let mut bytes = Vec::new();
        loop {
            match self.next_byte()? {
                None => return Err(self.error("unterminated string")),
                Some(b) if b == quote => break,
                Some(b'\\') => self.escape(&mut bytes)?,
                Some(b) => bytes.push(b),
            }
        }
        String::from_utf8(bytes).map_err(|_| self.error("string is not UTF-8"))
    }

    fn escape(&mut self, bytes: &mut Vec<u8>) -> SerializationResult<()> {
        let c = match self.next_byte()? {
            Some(b @ (b'"' | b'\'' | b'\\' | b'/')) => b as char,
            Some(b'b') => '\u{8}',
            Some(b'f') => '\u{c}',
            Some(b'n') => '\n',
            Some(b'r') => '\r',
            Some(b't') => '\t',
            Some(b'u') => {
                let unit = self.hex4()?;
                let code = if (0xd800..0xdc00).contains(&unit) {
                    self.expect_raw(b'\\')?;
                    self.expect_raw(b'u')?;
                    let low = self.hex4()?;
                    if !(0xdc00..0xe000).contains(&low) {
                        return Err(self.error("unpaired surrogate in \\u escape"));
                    }
                    0x10000 + ((unit - 0xd800) << 10) + (low - 0xdc00)
                } else {
                    unit
                };
                char::from_u32(code).ok_or_else(|| self.error("invalid \\u escape"))?
            }
            Some(b) => return Err(self.error(format!("invalid escape '\\{}'", b as char))),
            None => return Err(self.error("unterminated escape")),
        };
        let mut utf8 = [0u8; 4];
        bytes.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
        Ok(())
    }

    /// Like `expect` but without skipping blanks
    fn expect_raw(&mut self, want: u8) -> SerializationResult<()> {
        match self.next_byte()? {
            Some(b) if b == want => Ok(()),
            _ => Err(self.error(format!("expected '{}'", want as char))),
        }
    }

    fn hex4(&mut self) -> SerializationResult<u32> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .next_byte()?
                .and_then(|b| (b as char).to_digit(16))
                .ok_or_else(|| self.error("invalid \\u escape"))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn number(&mut self) -> SerializationResult<Value> {
        let mut text = String::new();
        if self.peek()? == Some(b'-') {
            text.push('-');
            self.bump();
        }
        while let Some(b) = self.peek()? {
            let after_exponent = matches!(text.as_bytes().last(), Some(b'e' | b'E'));
            if b.is_ascii_digit() || b == b'.' || b == b'e' || b == b'E' || (after_exponent && (b == b'+' || b == b'-')) {
                text.push(b as char);
                self.bump();
            } else {
                break;
            }
        }
        let suffix = match self.peek()? {
            Some(s @ (b'm' | b'd')) => {
                self.bump();
                Some(s)
            }
            _ => None,
        };
        if let Some(b) = self.peek()? {
            if b.is_ascii_alphanumeric() || b == b'_' {
                return Err(self.error(format!("unexpected '{}' after number {}", b as char, text)));
            }
        }
        let fractional = text.contains(['.', 'e', 'E']);
        let bad = || self.error(format!("invalid number {:?}", text));
        match suffix {
            Some(b'm') => text.parse::<BigDecimal>().map(Value::Decimal).map_err(|_| bad()),
            Some(_) => text.parse::<f64>().map(Value::Double).map_err(|_| bad()),
            None if fractional => text.parse::<f64>().map(Value::Double).map_err(|_| bad()),
            None => match text.parse::<i64>() {
                Ok(v) => Ok(Value::Long(v)),
                Err(_) => text.parse::<BigDecimal>().map(Value::Decimal).map_err(|_| bad()),
            },
        }
    }

    /// Parenthesised constructor arguments
    fn args(&mut self) -> SerializationResult<Vec<Value>> {
        self.expect(b'(')?;
        let mut args = Vec::new();
        if self.eat(b')')? {
            return Ok(args);
        }
        loop {
            args.push(self.value()?);
            if self.eat(b',')? {
                continue;
            }
            self.expect(b')')?;
            return Ok(args);
        }
    }

    fn word(&mut self) -> SerializationResult<Value> {
        let name = self.identifier()?;
        match name.as_str() {
            "null" => Ok(Value::Null),
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            "schema" => Ok(Value::schema(self.schema_or()?)),
            _ => {
                let args = self.args()?;
                self.construct(&name, args)
            }
        }
    }

    fn construct(&self, name: &str, args: Vec<Value>) -> SerializationResult<Value> {
        let arity = |n: usize| {
            if args.len() == n {
                Ok(())
            } else {
                Err(self.error(format!("{}() takes {} argument(s), got {}", name, n, args.len())))
            }
        };
        match name {
            "hex" => {
                arity(1)?;
                Ok(Value::Binary(from_hex(args[0].as_str()?)?))
            }
            "date" => {
                arity(1)?;
                match &args[0] {
                    Value::Long(millis) => Ok(Value::Date(*millis)),
                    other => Ok(Value::Date(parse_date(other.as_str()?)?)),
                }
            }
            "span" => {
                arity(2)?;
                Ok(Value::Span(Span::new(
                    args[0].long_value_exact()?,
                    args[1].long_value_exact()?,
                )))
            }
            "regex" => {
                let flags = match args.len() {
                    1 => "",
                    2 => args[1].as_str()?,
                    n => return Err(self.error(format!("regex() takes 1 or 2 arguments, got {}", n))),
                };
                Ok(Value::Regex(JsonRegex::new(args[0].as_str()?, flags)?))
            }
            "double" => {
                arity(1)?;
                match &args[0] {
                    Value::String(s) => match s.as_str() {
                        "NaN" => Ok(Value::Double(f64::NAN)),
                        "Infinity" => Ok(Value::Double(f64::INFINITY)),
                        "-Infinity" => Ok(Value::Double(f64::NEG_INFINITY)),
                        other => other
                            .parse::<f64>()
                            .map(Value::Double)
                            .map_err(|_| self.error(format!("invalid double {:?}", other))),
                    },
                    other => Ok(Value::Double(other.to_f64()?)),
                }
            }
            "fn" => {
                let bound = match args.len() {
                    1 => Vec::new(),
                    2 => args[1].as_array()?.to_vec(),
                    n => return Err(self.error(format!("fn() takes 1 or 2 arguments, got {}", n))),
                };
                Ok(Value::Function(FunctionRef::with_bound(args[0].as_str()?, bound)))
            }
            other => Err(self.error(format!("unknown constructor '{}'", other))),
        }
    }

    // ---- schemas ----

    fn schema_or(&mut self) -> SerializationResult<Schema> {
        let mut result = self.schema_annotated()?;
        while self.eat(b'|')? {
            let next = self.schema_annotated()?;
            result = result.union(&next);
        }
        Ok(result)
    }

    fn schema_annotated(&mut self) -> SerializationResult<Schema> {
        if self.eat(b'@')? {
            let annotation = self.record()?;
            let schema = self.schema_primary()?;
            return Ok(schema.with_annotation(annotation));
        }
        self.schema_primary()
    }

    fn schema_primary(&mut self) -> SerializationResult<Schema> {
        self.skip_ws()?;
        match self.peek()? {
            Some(b'(') => {
                self.bump();
                let inner = self.schema_or()?;
                self.expect(b')')?;
                Ok(inner)
            }
            Some(b'[') => self.array_schema(),
            Some(b'{') => self.record_schema(),
            Some(b) if b.is_ascii_alphabetic() => {
                let name = self.identifier()?;
                self.skip_ws()?;
                let params = if self.peek()? == Some(b'(') {
                    self.schema_params()?
                } else {
                    Vec::new()
                };
                build_atomic(&name, params)
            }
            Some(b) => Err(self.error(format!("unexpected '{}' in schema", b as char))),
            None => Err(self.error("expected a schema, found end of input")),
        }
    }

    fn schema_params(&mut self) -> SerializationResult<Vec<(String, Value)>> {
        self.expect(b'(')?;
        let mut params = Vec::new();
        if self.eat(b')')? {
            return Ok(params);
        }
        loop {
            let name = self.identifier()?;
            self.expect(b'=')?;
            params.push((name, self.value()?));
            if self.eat(b',')? {
                continue;
            }
            self.expect(b')')?;
            return Ok(params);
        }
    }

    fn array_schema(&mut self) -> SerializationResult<Schema> {
        self.expect(b'[')?;
        let mut head = Vec::new();
        if self.eat(b']')? {
            return Ok(Schema::array(ArraySchema::fixed(head)));
        }
        loop {
            let element = self.schema_or()?;
            if self.eat(b'*')? {
                let (mut min, mut max) = (0, None);
                if self.eat(b'{')? {
                    min = self.unsigned()?;
                    self.expect(b',')?;
                    if !self.eat(b'}')? {
                        max = Some(self.unsigned()?);
                        self.expect(b'}')?;
                    }
                }
                self.expect(b']')?;
                return Ok(Schema::array(ArraySchema::new(head, Some(element), min, max)));
            }
            head.push(element);
            if self.eat(b',')? {
                continue;
            }
            self.expect(b']')?;
            return Ok(Schema::array(ArraySchema::fixed(head)));
        }
    }

    fn record_schema(&mut self) -> SerializationResult<Schema> {
        self.expect(b'{')?;
        let mut fields = Vec::new();
        let mut additional = None;
        if self.eat(b'}')? {
            return Ok(Schema::record(RecordSchema::new(fields, additional)));
        }
        loop {
            if self.eat(b'*')? {
                self.expect(b':')?;
                additional = Some(self.schema_or()?);
            } else {
                let name = self.field_name()?;
                let optional = self.eat(b'?')?;
                self.expect(b':')?;
                let schema = self.schema_or()?;
                fields.push(if optional {
                    RecordField::optional(name, schema)
                } else {
                    RecordField::required(name, schema)
                });
            }
            if self.eat(b',')? {
                continue;
            }
            self.expect(b'}')?;
            return Ok(Schema::record(RecordSchema::new(fields, additional)));
        }
    }
}

fn invalid(schema: &str, message: impl Into<String>) -> SerializationError {
    SerializationError::Schema(SchemaError::InvalidParameter {
        schema: schema.to_string(),
        message: message.into(),
    })
}

fn length_param(schema: &str, name: &str, v: &Value) -> SerializationResult<u64> {
    match v {
        Value::Long(n) if *n >= 0 => Ok(*n as u64),
        other => Err(invalid(schema, format!("{} must be a non-negative long, got {}", name, other))),
    }
}

/// Build a named schema from its `name(key=value, ...)` parameters
fn build_atomic(name: &str, params: Vec<(String, Value)>) -> SerializationResult<Schema> {
    let unknown = |key: &str| invalid(name, format!("unknown parameter '{}'", key));
    let kind = match name {
        "any" | "nonnull" | "null" | "numeric" => {
            if let Some((key, _)) = params.first() {
                return Err(unknown(key));
            }
            match name {
                "any" => SchemaKind::Any,
                "nonnull" => SchemaKind::AnyNonNull,
                "null" => SchemaKind::Null,
                _ => SchemaKind::Numeric,
            }
        }
        "boolean" => {
            let mut value = None;
            for (key, v) in &params {
                match key.as_str() {
                    "value" => value = Some(v.as_bool()?),
                    other => return Err(unknown(other)),
                }
            }
            SchemaKind::Boolean { value }
        }
        "long" | "date" => {
            let (mut min, mut max) = (None, None);
            for (key, v) in &params {
                let n = match v {
                    Value::Date(d) if name == "date" => *d,
                    other => other.long_value_exact()?,
                };
                match key.as_str() {
                    "min" => min = Some(n),
                    "max" => max = Some(n),
                    "value" => (min, max) = (Some(n), Some(n)),
                    other => return Err(unknown(other)),
                }
            }
            if name == "long" {
                SchemaKind::Long { min, max }
            } else {
                SchemaKind::Date { min, max }
            }
        }
        "decimal" => {
            let (mut min, mut max) = (None, None);
            for (key, v) in &params {
                let d = v.to_decimal()?;
                match key.as_str() {
                    "min" => min = Some(d),
                    "max" => max = Some(d),
                    "value" => (min, max) = (Some(d.clone()), Some(d)),
                    other => return Err(unknown(other)),
                }
            }
            SchemaKind::Decimal { min, max }
        }
        "double" => {
            let (mut min, mut max) = (None, None);
            for (key, v) in &params {
                let d = v.to_f64()?;
                match key.as_str() {
                    "min" => min = Some(d),
                    "max" => max = Some(d),
                    "value" => (min, max) = (Some(d), Some(d)),
                    other => return Err(unknown(other)),
                }
            }
            SchemaKind::Double { min, max }
        }
        "string" => {
            let (mut min_length, mut max_length, mut value) = (None, None, None);
            for (key, v) in &params {
                match key.as_str() {
                    "minLength" => min_length = Some(length_param(name, key, v)?),
                    "maxLength" => max_length = Some(length_param(name, key, v)?),
                    "value" => value = Some(v.as_str()?.to_string()),
                    other => return Err(unknown(other)),
                }
            }
            SchemaKind::String {
                min_length,
                max_length,
                value,
            }
        }
        "binary" => {
            let (mut min_length, mut max_length, mut value) = (None, None, None);
            for (key, v) in &params {
                match key.as_str() {
                    "minLength" => min_length = Some(length_param(name, key, v)?),
                    "maxLength" => max_length = Some(length_param(name, key, v)?),
                    "value" => value = Some(v.as_binary()?.to_vec()),
                    other => return Err(unknown(other)),
                }
            }
            SchemaKind::Binary {
                min_length,
                max_length,
                value,
            }
        }
        other => match JsonType::from_name(other) {
            Some(t @ (JsonType::Regex | JsonType::Span | JsonType::Schema | JsonType::Function)) => {
                if let Some((key, _)) = params.first() {
                    return Err(unknown(key));
                }
                SchemaKind::Generic(t)
            }
            _ => return Err(invalid(other, "unknown schema type")),
        },
    };
    Ok(Schema::new(kind))
}

fn parse_all<T>(
    text: &str,
    f: impl FnOnce(&mut TextReader<&[u8]>) -> SerializationResult<T>,
) -> SerializationResult<T> {
    let mut reader = TextReader::new(text.as_bytes());
    let result = f(&mut reader)?;
    reader.skip_ws()?;
    if reader.peek()?.is_some() {
        return Err(reader.error("trailing characters after value"));
    }
    Ok(result)
}

/// Parse exactly one value from `text`
pub fn parse_value(text: &str) -> SerializationResult<Value> {
    parse_all(text, |r| {
        r.read_value()?
            .ok_or_else(|| r.error("expected a value, found end of input"))
    })
}

/// Parse exactly one schema from `text`
pub fn parse_schema(text: &str) -> SerializationResult<Schema> {
    parse_all(text, |r| r.read_schema())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::to_text;

    #[test]
    fn test_number_literals() {
        assert_eq!(parse_value("42").unwrap(), Value::Long(42));
        assert_eq!(parse_value("-7").unwrap().encoding().name(), "long");
        assert_eq!(parse_value("2.5").unwrap(), Value::Double(2.5));
        assert_eq!(parse_value("1e3").unwrap().encoding().name(), "double");
        assert_eq!(parse_value("3.140m").unwrap().to_string(), "3.140m");
        assert_eq!(parse_value("3d").unwrap(), Value::Double(3.0));
        assert_eq!(
            parse_value("99999999999999999999").unwrap().encoding().name(),
            "decimal"
        );
        assert!(parse_value("12abc").is_err());
    }

    #[test]
    fn test_constructors() {
        assert_eq!(parse_value("hex('0aFF')").unwrap(), Value::Binary(vec![0x0a, 0xff]));
        assert_eq!(parse_value("date('1970-01-01T00:00:01Z')").unwrap(), Value::Date(1000));
        assert_eq!(parse_value("span(1, 5)").unwrap(), Value::Span(Span::new(1, 5)));
        assert!(matches!(parse_value("double('NaN')").unwrap(), Value::Double(d) if d.is_nan()));
        assert_eq!(parse_value("regex('a+')").unwrap(), Value::regex("a+", "").unwrap());
        let f = parse_value("fn('add', [1, 2])").unwrap();
        assert_eq!(f.as_function().unwrap().bound.len(), 2);
        assert!(matches!(
            parse_value("nope(1)"),
            Err(SerializationError::Parse { .. })
        ));
    }

    #[test]
    fn test_strings_and_records() {
        let v = parse_value(r#"{name: 'it\'s', "u": "é😀", n: null}"#).unwrap();
        let r = v.as_record().unwrap();
        assert_eq!(r.get("name"), Some(&Value::string("it's")));
        assert_eq!(r.get("u"), Some(&Value::string("é😀")));
        assert_eq!(r.get("n"), Some(&Value::Null));
    }

    #[test]
    fn test_text_round_trip() {
        for text in [
            "[1,2.5d,3.14m,\"x\",null,true]",
            "{\"b\":hex('00'),\"a\":[span(0,1),regex('x','i')]}",
            "schema [long, string*{0,2}]",
            "fn('f', [1])",
        ] {
            let v = parse_value(text).unwrap();
            assert_eq!(to_text(&v, 0), text);
            assert_eq!(parse_value(&to_text(&v, 4)).unwrap(), v);
        }
    }

    #[test]
    fn test_stream_of_values() {
        let mut reader = TextReader::new("1 [2] {\"a\":3}\n".as_bytes());
        assert_eq!(reader.read_value().unwrap(), Some(Value::Long(1)));
        assert_eq!(reader.read_value().unwrap(), Some(Value::Array(vec![Value::Long(2)])));
        assert!(reader.read_value().unwrap().is_some());
        assert_eq!(reader.read_value().unwrap(), None);
    }

    #[test]
    fn test_errors_carry_position() {
        match parse_value("[1, }") {
            Err(SerializationError::Parse { position, .. }) => assert_eq!(position, 4),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(parse_value("[1] 2").is_err());
        assert!(parse_value("").is_err());
    }

    #[test]
    fn test_schema_parameters_checked() {
        assert!(matches!(
            parse_schema("long(size=3)"),
            Err(SerializationError::Schema(SchemaError::InvalidParameter { .. }))
        ));
        assert!(parse_schema("widget").is_err());
        assert_eq!(parse_schema("null | regex").unwrap().to_string(), "regex | null");
    }
}
