//! Spilled Array Tests
//!
//! Tests for disk-backed arrays:
//! - Elements past the cache go to one spill file and read back in order
//! - Iteration requires a frozen array and can be repeated
//! - A modified spill file is detected, never silently accepted
//! - The collection encoding matches an in-memory array's

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::sync::Arc;

use jsonq::iter::{collect_values, JsonIter};
use jsonq::serialization::{ArraySerializer, BasicSerializer, DefaultFullSerializer, FullSerializer};
use jsonq::spill::{SpilledArray, SpilledArraySerializer};
use jsonq::value::Value;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn full() -> Arc<dyn FullSerializer> {
    Arc::new(DefaultFullSerializer::new())
}

fn filled(dir: &TempDir, cache_size: usize, n: i64) -> SpilledArray {
    let mut array = SpilledArray::with_cache_size(full(), cache_size).with_spill_dir(dir.path());
    for i in 0..n {
        array.append(&Value::Long(i)).unwrap();
    }
    array.freeze().unwrap();
    array
}

// =============================================================================
// Spill Tests
// =============================================================================

#[test]
fn test_ten_thousand_longs_with_small_cache() {
    let dir = TempDir::new().unwrap();
    let array = filled(&dir, 16, 10_000);
    assert_eq!(array.count(), 10_000);
    assert_eq!(array.cached().len(), 16);
    assert_eq!(array.spilled_count(), 9_984);
    assert!(array.spill_path().unwrap().starts_with(dir.path()));

    let values = array.to_vec().unwrap();
    assert_eq!(values.len(), 10_000);
    for (i, v) in values.iter().enumerate() {
        assert_eq!(v, &Value::Long(i as i64));
    }
}

#[test]
fn test_iteration_is_repeatable() {
    let dir = TempDir::new().unwrap();
    let array = filled(&dir, 3, 50);
    let first = collect_values(&mut array.iter().unwrap()).unwrap();
    let second = collect_values(&mut array.iter().unwrap()).unwrap();
    assert_eq!(first, second);

    // two live sequences advance independently
    let mut a = array.iter().unwrap();
    let mut b = array.iter().unwrap();
    for _ in 0..10 {
        assert!(a.move_next().unwrap());
    }
    assert!(b.move_next().unwrap());
    assert_eq!(a.current(), &Value::Long(9));
    assert_eq!(b.current(), &Value::Long(0));
}

#[test]
fn test_unfrozen_iteration_and_frozen_append_fail() {
    let dir = TempDir::new().unwrap();
    let mut array = SpilledArray::with_cache_size(full(), 2).with_spill_dir(dir.path());
    array.append(&Value::Long(1)).unwrap();
    assert_eq!(array.iter().err().map(|e| e.code()), Some("JQ_SPILL_NOT_FROZEN"));
    array.freeze().unwrap();
    assert_eq!(array.append(&Value::Long(2)).unwrap_err().code(), "JQ_SPILL_FROZEN");
}

#[test]
fn test_spill_file_removed_with_array() {
    let dir = TempDir::new().unwrap();
    let array = filled(&dir, 1, 10);
    let path = array.spill_path().unwrap().to_path_buf();
    assert!(path.exists());
    drop(array);
    assert!(!path.exists());
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_modified_spill_file_is_detected() {
    let dir = TempDir::new().unwrap();
    let array = filled(&dir, 4, 40);

    // first spilled value is Long(4): tag 9, payload 0x84
    let mut file = OpenOptions::new()
        .write(true)
        .open(array.spill_path().unwrap())
        .unwrap();
    file.seek(SeekFrom::Start(1)).unwrap();
    file.write_all(&[0x85]).unwrap();
    file.sync_all().unwrap();

    let mut seq = array.iter().unwrap();
    let mut seen = Vec::new();
    let err = loop {
        match seq.move_next() {
            Ok(true) => seen.push(seq.current().clone()),
            Ok(false) => panic!("corruption went unnoticed"),
            Err(e) => break e,
        }
    };
    assert_eq!(err.code(), "JQ_SPILL_CORRUPT");
    assert!(err.is_fatal());
    assert_eq!(seen.len(), 40);
    assert_eq!(seen[4], Value::Long(5));

    // the sequence stays failed
    assert_eq!(seq.move_next().unwrap_err().code(), "JQ_ITER_POISONED");
}

// =============================================================================
// Collection Encoding Tests
// =============================================================================

#[test]
fn test_collection_encoding_matches_array_encoding() {
    let dir = TempDir::new().unwrap();
    let array = filled(&dir, 5, 30);
    let ser = SpilledArraySerializer::new(full()).with_spill_dir(dir.path());

    let mut spilled_bytes = Vec::new();
    ser.write(&mut spilled_bytes, &array).unwrap();

    let element = DefaultFullSerializer::new();
    let mut plain_bytes = Vec::new();
    ArraySerializer::new(&element)
        .encode(&mut plain_bytes, &Value::Array((0..30).map(Value::Long).collect()))
        .unwrap();
    assert_eq!(spilled_bytes, plain_bytes);

    let back = ser.read(&mut spilled_bytes.as_slice(), None).unwrap();
    assert!(back.is_frozen());
    assert_eq!(back.to_vec().unwrap(), array.to_vec().unwrap());
}
