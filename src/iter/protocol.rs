//! The lazy sequence protocol
//!
//! ```text
//! Fresh ──move_next──► Positioned ──move_next──► Exhausted (terminal)
//!   │                    │  ▲                       ▲
//!   │                    └──┘                       │
//!   └───────────────────────────────────────────────┘
//!           any state ──error──► Poisoned (terminal)
//! ```
//!
//! `current` is meaningful only while positioned and reads as null
//! otherwise. Once exhausted, `move_next` keeps returning `false`. Once a
//! `move_next` has failed, every later call fails with `Poisoned`.

use std::vec;

use super::errors::IterError;
use crate::error::{Error, Result};
use crate::value::Value;

static NULL_VALUE: Value = Value::Null;

/// Pull-based, single-pass cursor over values
pub trait JsonIter {
    /// Advance; `false` means the sequence is exhausted
    fn move_next(&mut self) -> Result<bool>;

    /// The element the cursor is positioned on
    fn current(&self) -> &Value;

    /// Release held resources early; the sequence reads as exhausted after
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// The null sequence: "no sequence at all", distinct from empty
    fn is_null(&self) -> bool {
        false
    }
}

pub type BoxIter<'a> = Box<dyn JsonIter + 'a>;

impl<I: JsonIter + ?Sized> JsonIter for Box<I> {
    fn move_next(&mut self) -> Result<bool> {
        (**self).move_next()
    }

    fn current(&self) -> &Value {
        (**self).current()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn is_null(&self) -> bool {
        (**self).is_null()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterState {
    Fresh,
    Positioned,
    Exhausted,
    Poisoned,
}

/// State machine shared by every adapter
#[derive(Debug)]
pub(crate) struct Cursor {
    state: IterState,
    current: Value,
    cause: String,
}

impl Cursor {
    pub(crate) fn new() -> Self {
        Self {
            state: IterState::Fresh,
            current: Value::Null,
            cause: String::new(),
        }
    }

    pub(crate) fn state(&self) -> IterState {
        self.state
    }

    pub(crate) fn current(&self) -> &Value {
        match self.state {
            IterState::Positioned => &self.current,
            _ => &NULL_VALUE,
        }
    }

    /// Run one step of an adapter, enforcing the terminal states
    ///
    /// `step` returns the next element or `None` when the source is done.
    pub(crate) fn advance(&mut self, step: impl FnOnce() -> Result<Option<Value>>) -> Result<bool> {
        match self.state {
            IterState::Exhausted => return Ok(false),
            IterState::Poisoned => {
                return Err(Error::Iter(IterError::Poisoned {
                    cause: self.cause.clone(),
                }))
            }
            IterState::Fresh | IterState::Positioned => {}
        }
        match step() {
            Ok(Some(v)) => {
                self.current = v;
                self.state = IterState::Positioned;
                Ok(true)
            }
            Ok(None) => {
                self.finish();
                Ok(false)
            }
            Err(e) => {
                self.cause = e.to_string();
                self.current = Value::Null;
                self.state = IterState::Poisoned;
                Err(e)
            }
        }
    }

    /// Enter the exhausted state unless already poisoned
    pub(crate) fn finish(&mut self) {
        if self.state != IterState::Poisoned {
            self.state = IterState::Exhausted;
            self.current = Value::Null;
        }
    }
}

/// The null sequence
#[derive(Debug, Default)]
pub struct NullIter;

impl JsonIter for NullIter {
    fn move_next(&mut self) -> Result<bool> {
        Err(IterError::NullSequence.into())
    }

    fn current(&self) -> &Value {
        &NULL_VALUE
    }

    fn is_null(&self) -> bool {
        true
    }
}

/// Sequence over owned values
#[derive(Debug)]
pub struct ValuesIter {
    items: vec::IntoIter<Value>,
    cursor: Cursor,
}

impl ValuesIter {
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items: items.into_iter(),
            cursor: Cursor::new(),
        }
    }
}

impl JsonIter for ValuesIter {
    fn move_next(&mut self) -> Result<bool> {
        let items = &mut self.items;
        self.cursor.advance(|| Ok(items.next()))
    }

    fn current(&self) -> &Value {
        self.cursor.current()
    }

    fn close(&mut self) -> Result<()> {
        self.items = Vec::new().into_iter();
        self.cursor.finish();
        Ok(())
    }
}

/// The null sequence; check `is_null` before advancing it
pub fn null<'a>() -> BoxIter<'a> {
    Box::new(NullIter)
}

/// The always-exhausted sequence
pub fn empty<'a>() -> BoxIter<'a> {
    Box::new(ValuesIter::new(Vec::new()))
}

pub fn values<'a>(items: Vec<Value>) -> BoxIter<'a> {
    Box::new(ValuesIter::new(items))
}

pub fn once<'a>(value: Value) -> BoxIter<'a> {
    values(vec![value])
}

/// Drain a sequence into a vector, closing it afterwards; the null
/// sequence drains to nothing
pub fn collect_values(iter: &mut dyn JsonIter) -> Result<Vec<Value>> {
    let mut out = Vec::new();
    if iter.is_null() {
        return Ok(out);
    }
    while iter.move_next()? {
        out.push(iter.current().clone());
    }
    iter.close()?;
    Ok(out)
}

/// Number of remaining elements; consumes the sequence
pub fn count(iter: &mut dyn JsonIter) -> Result<u64> {
    if iter.is_null() {
        return Ok(0);
    }
    let mut n = 0;
    while iter.move_next()? {
        n += 1;
    }
    iter.close()?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhaustion_is_idempotent() {
        let mut it = ValuesIter::new(vec![Value::Long(1)]);
        assert_eq!(it.current(), &Value::Null);
        assert!(it.move_next().unwrap());
        assert_eq!(it.current(), &Value::Long(1));
        for _ in 0..3 {
            assert!(!it.move_next().unwrap());
            assert_eq!(it.current(), &Value::Null);
        }
    }

    #[test]
    fn test_null_and_empty_differ() {
        let mut n = null();
        let mut e = empty();
        assert!(n.is_null());
        assert!(!e.is_null());
        assert!(!e.move_next().unwrap());
        let err = n.move_next().unwrap_err();
        assert_eq!(err.code(), "JQ_ITER_NULL_SEQUENCE");
        assert!(err.is_fatal());
        assert!(collect_values(n.as_mut()).unwrap().is_empty());
    }

    #[test]
    fn test_poisoned_after_error() {
        let mut cursor = Cursor::new();
        let err = cursor
            .advance(|| Err(crate::value::ValueError::ArithmeticOverflow("x".into()).into()))
            .unwrap_err();
        assert_eq!(err.code(), "JQ_VALUE_ARITHMETIC_OVERFLOW");
        assert_eq!(cursor.state(), IterState::Poisoned);
        let again = cursor.advance(|| Ok(Some(Value::Long(1)))).unwrap_err();
        assert_eq!(again.code(), "JQ_ITER_POISONED");
    }

    #[test]
    fn test_close_ends_sequence() {
        let mut it = ValuesIter::new(vec![Value::Long(1), Value::Long(2)]);
        assert!(it.move_next().unwrap());
        it.close().unwrap();
        assert!(!it.move_next().unwrap());
        assert_eq!(count(&mut ValuesIter::new(vec![Value::Null; 3])).unwrap(), 3);
    }
}
