//! Total order, equality and hashing of values
//!
//! Values of different type classes order by class. Within the number class
//! the comparison is exact: Long against Double never rounds the Long, and
//! Decimal against Double expands the Double into its exact decimal value.
//! Doubles follow one extra rule so the order stays total: NaN equals NaN
//! and sorts above every other number. `-0.0` equals `0.0`.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use super::variant::{JsonRegex, Value};

/// Total order on doubles: NaN is greatest and equal to itself
pub fn cmp_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Exact decimal expansion of a finite double
pub fn exact_decimal_of_f64(v: f64) -> Option<BigDecimal> {
    if !v.is_finite() {
        return None;
    }
    if v == 0.0 {
        return Some(BigDecimal::from(0));
    }
    let bits = v.to_bits();
    let negative = bits >> 63 == 1;
    let exp_bits = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & 0x000f_ffff_ffff_ffff;
    let (mantissa, exponent) = if exp_bits == 0 {
        (fraction, -1074)
    } else {
        (fraction | 0x0010_0000_0000_0000, exp_bits - 1075)
    };
    let mut digits = BigInt::from(mantissa);
    if negative {
        digits = -digits;
    }
    if exponent >= 0 {
        Some(BigDecimal::new(digits << exponent as usize, 0))
    } else {
        // m * 2^-k == m * 5^k / 10^k
        let k = (-exponent) as u32;
        Some(BigDecimal::new(digits * BigInt::from(5).pow(k), k as i64))
    }
}

fn cmp_long_f64(a: i64, b: f64) -> Ordering {
    if b.is_nan() {
        return Ordering::Less;
    }
    const EXACT: i64 = 1 << 53;
    if (-EXACT..=EXACT).contains(&a) {
        return cmp_f64(a as f64, b);
    }
    // 2^63 is exactly representable; anything at or beyond it is out of range
    if b >= 9_223_372_036_854_775_808.0 {
        return Ordering::Less;
    }
    if b < -9_223_372_036_854_775_808.0 {
        return Ordering::Greater;
    }
    let whole = b.trunc();
    let whole_i = whole as i64;
    match a.cmp(&whole_i) {
        Ordering::Equal => cmp_f64(0.0, b - whole),
        other => other,
    }
}

fn cmp_decimal_f64(a: &BigDecimal, b: f64) -> Ordering {
    if b.is_nan() {
        return Ordering::Less;
    }
    if b == f64::INFINITY {
        return Ordering::Less;
    }
    if b == f64::NEG_INFINITY {
        return Ordering::Greater;
    }
    match exact_decimal_of_f64(b) {
        Some(exact) => a.cmp(&exact),
        None => Ordering::Equal,
    }
}

/// Mathematical comparison of two numeric values
///
/// Returns `None` when either operand is not a number.
pub fn compare_numbers(a: &Value, b: &Value) -> Option<Ordering> {
    let ord = match (a, b) {
        (Value::Long(x), Value::Long(y)) => x.cmp(y),
        (Value::Double(x), Value::Double(y)) => cmp_f64(*x, *y),
        (Value::Decimal(x), Value::Decimal(y)) => x.cmp(y),
        (Value::Long(x), Value::Double(y)) => cmp_long_f64(*x, *y),
        (Value::Double(x), Value::Long(y)) => cmp_long_f64(*y, *x).reverse(),
        (Value::Long(x), Value::Decimal(y)) => BigDecimal::from(*x).cmp(y),
        (Value::Decimal(x), Value::Long(y)) => x.cmp(&BigDecimal::from(*y)),
        (Value::Decimal(x), Value::Double(y)) => cmp_decimal_f64(x, *y),
        (Value::Double(x), Value::Decimal(y)) => cmp_decimal_f64(y, *x).reverse(),
        _ => return None,
    };
    Some(ord)
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        let (ta, tb) = (self.json_type(), other.json_type());
        if ta != tb {
            return ta.cmp(&tb);
        }
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Value::Binary(a), Value::Binary(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a.cmp(b),
            (Value::Record(a), Value::Record(b)) => a.cmp(b),
            (Value::Regex(a), Value::Regex(b)) => a.cmp(b),
            (Value::Schema(a), Value::Schema(b)) => a.cmp(b),
            (Value::Function(a), Value::Function(b)) => a.cmp(b),
            (Value::Span(a), Value::Span(b)) => a.cmp(b),
            (a, b) => compare_numbers(a, b).unwrap_or(Ordering::Equal),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

/// Hash key of a number: equal numbers produce equal keys whatever their
/// encoding
enum NumberKey {
    Integral(i64),
    Exact(String),
    NaN,
    PosInf,
    NegInf,
}

fn number_key(v: &Value) -> NumberKey {
    let exact = match v {
        Value::Long(l) => return NumberKey::Integral(*l),
        Value::Double(d) => {
            if d.is_nan() {
                return NumberKey::NaN;
            }
            if d.is_infinite() {
                return if *d > 0.0 {
                    NumberKey::PosInf
                } else {
                    NumberKey::NegInf
                };
            }
            if d.fract() == 0.0 && d.abs() < 9.2e18 {
                return NumberKey::Integral(*d as i64);
            }
            match exact_decimal_of_f64(*d) {
                Some(e) => e,
                None => return NumberKey::NaN,
            }
        }
        Value::Decimal(d) => d.clone(),
        _ => return NumberKey::NaN,
    };
    if exact.with_scale(0) == exact {
        if let Some(l) = exact.to_i64() {
            return NumberKey::Integral(l);
        }
    }
    NumberKey::Exact(exact.normalized().to_string())
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.json_type().hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::Long(_) | Value::Decimal(_) | Value::Double(_) => match number_key(self) {
                NumberKey::Integral(l) => {
                    0u8.hash(state);
                    l.hash(state);
                }
                NumberKey::Exact(s) => {
                    1u8.hash(state);
                    s.hash(state);
                }
                NumberKey::NaN => 2u8.hash(state),
                NumberKey::PosInf => 3u8.hash(state),
                NumberKey::NegInf => 4u8.hash(state),
            },
            Value::String(s) => s.hash(state),
            Value::Binary(b) => b.hash(state),
            Value::Date(d) => d.hash(state),
            Value::Array(items) => items.hash(state),
            Value::Record(r) => {
                let sorted = r.sorted_fields();
                sorted.len().hash(state);
                for (k, v) in sorted {
                    k.hash(state);
                    v.hash(state);
                }
            }
            Value::Regex(r) => r.hash(state),
            Value::Schema(s) => s.to_string().hash(state),
            Value::Function(f) => f.hash(state),
            Value::Span(s) => s.hash(state),
        }
    }
}

impl Ord for JsonRegex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.pattern()
            .cmp(other.pattern())
            .then_with(|| self.flags().cmp(other.flags()))
    }
}

impl PartialOrd for JsonRegex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for JsonRegex {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for JsonRegex {}

impl Hash for JsonRegex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pattern().hash(state);
        self.flags().hash(state);
    }
}
