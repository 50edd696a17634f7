//! Value Ordering Tests
//!
//! The total order over values:
//! - Type classes order before contents
//! - Numbers compare by mathematical value across encodings
//! - Equality and hashing agree with the order

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use jsonq::schema::Schema;
use jsonq::value::{FunctionRef, Record, Span, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn hash_of(v: &Value) -> u64 {
    let mut h = DefaultHasher::new();
    v.hash(&mut h);
    h.finish()
}

fn decimal(text: &str) -> Value {
    Value::decimal(text).unwrap()
}

// =============================================================================
// Type Class Tests
// =============================================================================

#[test]
fn test_type_classes_in_total_order() {
    let ordered = vec![
        Value::Null,
        Value::Array(vec![Value::Long(99)]),
        Value::Record(Record::new().with("z", Value::Long(1))),
        Value::Boolean(true),
        Value::string("zzz"),
        Value::Long(i64::MIN),
        Value::Binary(vec![]),
        Value::Date(-1),
        Value::schema(Schema::any()),
        Value::Function(FunctionRef::new("add")),
        Value::regex("a", "").unwrap(),
        Value::Span(Span::new(0, 0)),
    ];
    for pair in ordered.windows(2) {
        assert!(pair[0] < pair[1], "{:?} should sort before {:?}", pair[0], pair[1]);
    }
}

#[test]
fn test_sort_is_stable_under_reversal() {
    let mut forward = vec![
        Value::string("b"),
        Value::Long(3),
        Value::Null,
        Value::Double(2.5),
        Value::Boolean(false),
        decimal("2.75"),
    ];
    let mut backward: Vec<Value> = forward.iter().rev().cloned().collect();
    forward.sort();
    backward.sort();
    assert_eq!(forward, backward);
    assert_eq!(forward[0], Value::Null);
    assert_eq!(forward[3], Value::Double(2.5));
    assert_eq!(forward[4], decimal("2.75"));
}

// =============================================================================
// Numeric Equality Tests
// =============================================================================

#[test]
fn test_decimal_scale_is_not_significant() {
    let a = decimal("3.140");
    let b = decimal("3.14");
    assert_eq!(a, b);
    assert_eq!(a.cmp(&b), std::cmp::Ordering::Equal);
    assert_eq!(hash_of(&a), hash_of(&b));
}

#[test]
fn test_numbers_equal_across_encodings() {
    let long = Value::Long(2);
    let double = Value::Double(2.0);
    let dec = decimal("2.00");
    assert_eq!(long, double);
    assert_eq!(long, dec);
    assert_eq!(hash_of(&long), hash_of(&double));
    assert_eq!(hash_of(&long), hash_of(&dec));
    assert!(Value::Long(2) < Value::Double(2.5));
    assert!(decimal("0.1") != Value::Double(0.1));
}

#[test]
fn test_double_edge_cases() {
    let nan = Value::Double(f64::NAN);
    assert_eq!(nan, Value::Double(f64::NAN));
    assert!(nan > Value::Double(f64::INFINITY));
    assert!(nan > Value::Long(i64::MAX));
    assert_eq!(Value::Double(-0.0), Value::Double(0.0));
    assert_eq!(hash_of(&Value::Double(-0.0)), hash_of(&Value::Long(0)));
}

// =============================================================================
// Container Tests
// =============================================================================

#[test]
fn test_records_compare_in_canonical_key_order() {
    let a = Value::Record(Record::new().with("b", Value::Long(1)).with("a", Value::Long(2)));
    let b = Value::Record(Record::new().with("a", Value::Long(2)).with("b", Value::Long(1)));
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
}

#[test]
fn test_arrays_compare_elementwise_then_by_length() {
    let short = Value::Array(vec![Value::Long(1)]);
    let long = Value::Array(vec![Value::Long(1), Value::Null]);
    let bigger = Value::Array(vec![Value::Long(2)]);
    assert!(short < long);
    assert!(long < bigger);
}
