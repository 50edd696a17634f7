//! Conversions layered on top of values
//!
//! Binary encodings (hex, base64), ISO-8601 dates, exact numeric narrowing
//! and the bridge to `serde_json`. None of these are part of a value's own
//! behaviour; they are pure functions over its contents.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use num_traits::ToPrimitive;

use super::errors::{ValueError, ValueResult};
use super::record::Record;
use super::variant::Value;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Upper-case hex rendering of bytes
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(HEX_DIGITS[(b >> 4) as usize] as char);
        out.push(HEX_DIGITS[(b & 0x0f) as usize] as char);
    }
    out
}

fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Parse hex text, either case; odd length is rejected
pub fn from_hex(text: &str) -> ValueResult<Vec<u8>> {
    let raw = text.as_bytes();
    if raw.len() % 2 != 0 {
        return Err(ValueError::invalid_literal("hex", text));
    }
    raw.chunks(2)
        .map(|pair| match (hex_nibble(pair[0]), hex_nibble(pair[1])) {
            (Some(hi), Some(lo)) => Ok(hi << 4 | lo),
            _ => Err(ValueError::invalid_literal("hex", text)),
        })
        .collect()
}

pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn from_base64(text: &str) -> ValueResult<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|_| ValueError::invalid_literal("base64", text))
}

/// Parse an ISO-8601 date into epoch milliseconds
///
/// Accepts RFC 3339 timestamps with an offset, naive timestamps (taken as
/// UTC) and bare `YYYY-MM-DD` dates.
pub fn parse_date(text: &str) -> ValueResult<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(Utc.from_utc_datetime(&naive).timestamp_millis());
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight).timestamp_millis());
        }
    }
    Err(ValueError::invalid_literal("date", text))
}

/// Render epoch milliseconds as `YYYY-MM-DDTHH:MM:SS.sssZ`
pub fn format_date(millis: i64) -> ValueResult<String> {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(dt) => Ok(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => Err(ValueError::ArithmeticOverflow(format!(
            "date out of range: {} ms",
            millis
        ))),
    }
}

impl Value {
    /// Exact conversion to i64; fractional or out-of-range numbers fail
    pub fn long_value_exact(&self) -> ValueResult<i64> {
        match self {
            Value::Long(l) => Ok(*l),
            Value::Double(d) => {
                if d.fract() == 0.0 && *d >= -9.223_372_036_854_775_808e18 && *d < 9.223_372_036_854_775_808e18 {
                    Ok(*d as i64)
                } else {
                    Err(ValueError::ArithmeticOverflow(format!("{} does not fit a long", d)))
                }
            }
            Value::Decimal(d) => {
                if d.with_scale(0) != *d {
                    return Err(ValueError::ArithmeticOverflow(format!("{} has a fraction", d)));
                }
                d.to_i64()
                    .ok_or_else(|| ValueError::ArithmeticOverflow(format!("{} does not fit a long", d)))
            }
            other => Err(ValueError::type_mismatch("number", other.type_name())),
        }
    }

    /// Exact conversion to i32
    pub fn i32_value_exact(&self) -> ValueResult<i32> {
        let l = self.long_value_exact()?;
        i32::try_from(l).map_err(|_| ValueError::ArithmeticOverflow(format!("{} does not fit an int", l)))
    }

    /// Nearest double; Long and Decimal may round
    pub fn to_f64(&self) -> ValueResult<f64> {
        match self {
            Value::Long(l) => Ok(*l as f64),
            Value::Double(d) => Ok(*d),
            Value::Decimal(d) => d
                .to_f64()
                .ok_or_else(|| ValueError::ArithmeticOverflow(format!("{} does not fit a double", d))),
            other => Err(ValueError::type_mismatch("number", other.type_name())),
        }
    }

    /// Exact decimal; NaN and infinities fail
    pub fn to_decimal(&self) -> ValueResult<BigDecimal> {
        match self {
            Value::Long(l) => Ok(BigDecimal::from(*l)),
            Value::Decimal(d) => Ok(d.clone()),
            Value::Double(d) => super::compare::exact_decimal_of_f64(*d)
                .ok_or_else(|| ValueError::ArithmeticOverflow(format!("{} has no decimal value", d))),
            other => Err(ValueError::type_mismatch("number", other.type_name())),
        }
    }

    /// Build a value from parsed JSON
    ///
    /// Integers become Long (Decimal if they overflow i64), other numbers
    /// become Double.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => {
                if let Some(l) = n.as_i64() {
                    Value::Long(l)
                } else if let Some(u) = n.as_u64() {
                    Value::Decimal(BigDecimal::from(u))
                } else {
                    Value::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::Array(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => Value::Record(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect::<Record>(),
            ),
        }
    }

    /// Lower a value to plain JSON
    ///
    /// Variants without a JSON counterpart are rendered as strings: binaries
    /// in base64, dates in ISO-8601, the rest in their text form.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Long(l) => serde_json::Value::from(*l),
            Value::Double(d) => serde_json::Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(d.to_string())),
            Value::Decimal(d) => d
                .to_f64()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(d.to_string())),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Binary(b) => serde_json::Value::String(to_base64(b)),
            Value::Date(ms) => serde_json::Value::String(format_date(*ms).unwrap_or_else(|_| ms.to_string())),
            Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Record(r) => {
                let mut map = serde_json::Map::new();
                for (k, v) in r.iter() {
                    map.insert(k.to_string(), v.to_json());
                }
                serde_json::Value::Object(map)
            }
            other => serde_json::Value::String(other.to_string()),
        }
    }
}
