//! Schema Algebra Tests
//!
//! Tests for merge, union, compaction and the schema text form:
//! - Merge never rejects a value either input accepted
//! - Union is exact
//! - Strict merge refuses mismatched kinds
//! - Text rendering parses back to an equal schema

use jsonq::schema::{compact, ArraySchema, CompactOptions, MergeMode, RecordField, RecordSchema, Schema};
use jsonq::serialization::parse_schema;
use jsonq::value::{Record, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn probe_values() -> Vec<Value> {
    vec![
        Value::Null,
        Value::Long(-1),
        Value::Long(0),
        Value::Long(7),
        Value::Long(20),
        Value::Long(21),
        Value::Double(0.5),
        Value::string("a"),
        Value::string("abcdef"),
        Value::Array(vec![Value::Long(1)]),
        Value::Record(Record::new().with("a", Value::Long(1))),
    ]
}

fn schemas() -> Vec<Schema> {
    vec![
        Schema::long_range(Some(0), Some(10)),
        Schema::long_range(Some(5), Some(20)),
        Schema::nullable(Schema::string()),
        Schema::double(),
        Schema::array_of(Schema::long()),
        Schema::record(RecordSchema::new(vec![RecordField::required("a", Schema::long())], None)),
        Schema::null(),
    ]
}

// =============================================================================
// Merge Tests
// =============================================================================

#[test]
fn test_long_ranges_widen() {
    let merged = Schema::long_range(Some(0), Some(10))
        .merge(&Schema::long_range(Some(5), Some(20)))
        .unwrap();
    assert_eq!(merged, Schema::long_range(Some(0), Some(20)));
    assert!(merged.matches(&Value::Long(0)));
    assert!(merged.matches(&Value::Long(20)));
    assert!(!merged.matches(&Value::Long(-1)));
    assert!(!merged.matches(&Value::Long(21)));
}

#[test]
fn test_merge_is_monotone() {
    for a in schemas() {
        for b in schemas() {
            let merged = a.merge(&b).unwrap();
            for v in probe_values() {
                if a.matches(&v) || b.matches(&v) {
                    assert!(merged.matches(&v), "{} + {} lost {:?}", a, b, v);
                }
            }
        }
    }
}

#[test]
fn test_union_is_exact() {
    for a in schemas() {
        for b in schemas() {
            let union = a.union(&b);
            for v in probe_values() {
                assert_eq!(union.matches(&v), a.matches(&v) || b.matches(&v), "{} | {} on {:?}", a, b, v);
            }
        }
    }
}

#[test]
fn test_strict_merge_refuses_mismatched_kinds() {
    let long = Schema::long();
    assert!(long.merge_with(&Schema::string(), MergeMode::Strict).is_none());
    assert!(long.merge_with(&Schema::long_range(Some(1), Some(2)), MergeMode::Strict).is_some());
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_compact_inferred_samples() {
    let samples = vec![
        Value::Record(Record::new().with("id", Value::Long(1)).with("name", Value::string("a"))),
        Value::Record(Record::new().with("id", Value::Long(2))),
        Value::Record(Record::new().with("id", Value::Long(3)).with("name", Value::string("bb"))),
    ];
    let inferred: Vec<Schema> = samples.iter().map(Schema::infer).collect();
    let compacted = compact(&inferred, &CompactOptions::default()).unwrap();
    for v in &samples {
        assert!(compacted.matches(v), "{} rejects {:?}", compacted, v);
    }
}

#[test]
fn test_compact_empty_is_none() {
    assert!(compact(&[], &CompactOptions::default()).is_none());
}

// =============================================================================
// Constant Tests
// =============================================================================

#[test]
fn test_constant_schema_round_trip() {
    let v = Value::Array(vec![Value::Long(1), Value::string("x")]);
    let s = Schema::of_constant(&v);
    assert!(s.is_constant());
    assert_eq!(s.get_constant().unwrap(), v);
}

#[test]
fn test_get_constant_on_open_schema_is_fatal() {
    let err = Schema::long().get_constant().unwrap_err();
    assert_eq!(err.code(), "JQ_SCHEMA_NOT_CONSTANT");
}

// =============================================================================
// Text Form Tests
// =============================================================================

#[test]
fn test_text_form_parses_back() {
    let mut all = schemas();
    all.push(Schema::any());
    all.push(Schema::array(ArraySchema::new(
        vec![Schema::long()],
        Some(Schema::string()),
        0,
        Some(5),
    )));
    all.push(Schema::record(RecordSchema::new(
        vec![
            RecordField::required("a", Schema::long()),
            RecordField::optional("b", Schema::string()),
        ],
        Some(Schema::any()),
    )));
    for s in all {
        let text = s.to_string();
        assert_eq!(parse_schema(&text).unwrap(), s, "parse of {}", text);
    }
}
