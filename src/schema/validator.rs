//! Slot validation
//!
//! A slot is a named place a value is assigned to (a variable, a function
//! parameter). When the slot declares a schema, every assignment is checked
//! and a mismatch fails fast with the slot, the value and the schema.
//!
//! Arrays too large to hold in memory are checked element by element with
//! `validate_slot_elements`; the offending element is reported by position.

use super::errors::{SchemaError, SchemaResult};
use super::types::{ArraySchema, Schema, SchemaKind};
use crate::error::Result;
use crate::iter::JsonIter;
use crate::observability::{Event, Logger};
use crate::value::Value;

/// Check `value` against the schema declared for `slot`
pub fn validate_slot(slot: &str, schema: &Schema, value: &Value) -> SchemaResult<()> {
    if schema.matches(value) {
        return Ok(());
    }
    Err(violation(slot.to_string(), value.to_string(), schema))
}

/// Check the elements of an array bound to `slot`, one at a time
///
/// Equivalent to `validate_slot` on the whole array, but never holds more
/// than the current element. The sequence is closed on a violation.
pub fn validate_slot_elements(slot: &str, schema: &Schema, elements: &mut dyn JsonIter) -> Result<()> {
    let mut candidates = Vec::new();
    if accepts_any_array(schema, &mut candidates) {
        return Ok(());
    }
    let mut alive = vec![true; candidates.len()];
    let mut index = 0u64;
    while elements.move_next()? {
        let v = elements.current();
        let mut any = false;
        for (array, ok) in candidates.iter().zip(alive.iter_mut()) {
            *ok = *ok && array.accepts_at(index, v);
            any |= *ok;
        }
        if !any {
            let err = violation(format!("{}[{}]", slot, index), v.to_string(), schema);
            elements.close()?;
            return Err(err.into());
        }
        index += 1;
    }
    let complete = candidates
        .iter()
        .zip(&alive)
        .any(|(array, ok)| *ok && array.accepts_len(index));
    if !complete {
        let err = violation(slot.to_string(), format!("array of {} elements", index), schema);
        return Err(err.into());
    }
    Ok(())
}

/// Collect the array alternatives of `schema`; `true` if it takes every array
fn accepts_any_array<'s>(schema: &'s Schema, out: &mut Vec<&'s ArraySchema>) -> bool {
    match schema.kind() {
        SchemaKind::Any | SchemaKind::AnyNonNull => true,
        SchemaKind::Array(array) => {
            out.push(array);
            false
        }
        SchemaKind::Or(alternatives) => alternatives.iter().any(|s| accepts_any_array(s, out)),
        _ => false,
    }
}

fn violation(slot: String, value: String, schema: &Schema) -> SchemaError {
    let expected = schema.to_string();
    Logger::warn(
        Event::SchemaViolation,
        &[("slot", slot.as_str()), ("value", value.as_str()), ("expected", expected.as_str())],
    );
    SchemaError::Violation { slot, value, expected }
}
