//! Composable sequence adapters
//!
//! Each adapter owns the sequences it wraps and forwards `close` to the
//! ones it still holds. Sources are closed and dropped as soon as the
//! adapter can prove it needs nothing more from them, so abandoning an
//! adapter part way leaks nothing beyond what its own fields hold.

use std::collections::VecDeque;
use std::vec;

use super::protocol::{BoxIter, Cursor, JsonIter};
use crate::error::Result;
use crate::value::{Value, ValueError};

type MapFn<'a> = Box<dyn FnMut(&Value) -> Result<Value> + 'a>;
type PredicateFn<'a> = Box<dyn FnMut(&Value) -> Result<bool> + 'a>;

/// Next element of `source`, treating the null sequence as empty
pub(crate) fn next_from(source: &mut dyn JsonIter) -> Result<Option<Value>> {
    if source.is_null() {
        return Ok(None);
    }
    if source.move_next()? {
        Ok(Some(source.current().clone()))
    } else {
        Ok(None)
    }
}

/// Next element of a held source; the source is closed and dropped once
/// it runs dry
fn pull(source: &mut Option<BoxIter<'_>>) -> Result<Option<Value>> {
    let Some(held) = source.as_mut() else {
        return Ok(None);
    };
    let next = next_from(held.as_mut())?;
    if next.is_none() {
        release(source)?;
    }
    Ok(next)
}

fn release(source: &mut Option<BoxIter<'_>>) -> Result<()> {
    match source.take() {
        Some(mut s) => s.close(),
        None => Ok(()),
    }
}

/// Apply a function to every element
pub struct Map<'a> {
    source: Option<BoxIter<'a>>,
    f: MapFn<'a>,
    cursor: Cursor,
}

impl<'a> Map<'a> {
    pub fn new(source: BoxIter<'a>, f: impl FnMut(&Value) -> Result<Value> + 'a) -> Self {
        Self {
            source: Some(source),
            f: Box::new(f),
            cursor: Cursor::new(),
        }
    }
}

impl JsonIter for Map<'_> {
    fn move_next(&mut self) -> Result<bool> {
        let (source, f) = (&mut self.source, &mut self.f);
        self.cursor.advance(|| match pull(source)? {
            Some(v) => f(&v).map(Some),
            None => Ok(None),
        })
    }

    fn current(&self) -> &Value {
        self.cursor.current()
    }

    fn close(&mut self) -> Result<()> {
        self.cursor.finish();
        release(&mut self.source)
    }
}

/// Keep the elements a predicate accepts
pub struct Filter<'a> {
    source: Option<BoxIter<'a>>,
    predicate: PredicateFn<'a>,
    cursor: Cursor,
}

impl<'a> Filter<'a> {
    pub fn new(source: BoxIter<'a>, predicate: impl FnMut(&Value) -> Result<bool> + 'a) -> Self {
        Self {
            source: Some(source),
            predicate: Box::new(predicate),
            cursor: Cursor::new(),
        }
    }
}

impl JsonIter for Filter<'_> {
    fn move_next(&mut self) -> Result<bool> {
        let (source, predicate) = (&mut self.source, &mut self.predicate);
        self.cursor.advance(|| {
            while let Some(v) = pull(source)? {
                if predicate(&v)? {
                    return Ok(Some(v));
                }
            }
            Ok(None)
        })
    }

    fn current(&self) -> &Value {
        self.cursor.current()
    }

    fn close(&mut self) -> Result<()> {
        self.cursor.finish();
        release(&mut self.source)
    }
}

/// Every element of each source in turn; null sources contribute nothing
pub struct Concat<'a> {
    sources: VecDeque<BoxIter<'a>>,
    cursor: Cursor,
}

impl<'a> Concat<'a> {
    pub fn new(sources: Vec<BoxIter<'a>>) -> Self {
        Self {
            sources: sources.into(),
            cursor: Cursor::new(),
        }
    }
}

impl JsonIter for Concat<'_> {
    fn move_next(&mut self) -> Result<bool> {
        let sources = &mut self.sources;
        self.cursor.advance(|| {
            while let Some(front) = sources.front_mut() {
                if let Some(v) = next_from(front.as_mut())? {
                    return Ok(Some(v));
                }
                if let Some(mut done) = sources.pop_front() {
                    done.close()?;
                }
            }
            Ok(None)
        })
    }

    fn current(&self) -> &Value {
        self.cursor.current()
    }

    fn close(&mut self) -> Result<()> {
        self.cursor.finish();
        for mut s in self.sources.drain(..) {
            s.close()?;
        }
        Ok(())
    }
}

/// Elements of each array element; null elements contribute nothing and
/// any other element is a type mismatch
pub struct Flatten<'a> {
    source: Option<BoxIter<'a>>,
    inner: vec::IntoIter<Value>,
    cursor: Cursor,
}

impl<'a> Flatten<'a> {
    pub fn new(source: BoxIter<'a>) -> Self {
        Self {
            source: Some(source),
            inner: Vec::new().into_iter(),
            cursor: Cursor::new(),
        }
    }
}

impl JsonIter for Flatten<'_> {
    fn move_next(&mut self) -> Result<bool> {
        let (source, inner) = (&mut self.source, &mut self.inner);
        self.cursor.advance(|| loop {
            if let Some(v) = inner.next() {
                return Ok(Some(v));
            }
            match pull(source)? {
                None => return Ok(None),
                Some(Value::Array(items)) => *inner = items.into_iter(),
                Some(Value::Null) => {}
                Some(other) => return Err(ValueError::type_mismatch("array", other.type_name()).into()),
            }
        })
    }

    fn current(&self) -> &Value {
        self.cursor.current()
    }

    fn close(&mut self) -> Result<()> {
        self.cursor.finish();
        self.inner = Vec::new().into_iter();
        release(&mut self.source)
    }
}

/// The source, or the default sequence when the source turns out empty
///
/// The default is closed and dropped as soon as the source yields its first
/// element; the source is closed and dropped as soon as it proves empty.
pub struct DefaultIfEmpty<'a> {
    source: Option<BoxIter<'a>>,
    default: Option<BoxIter<'a>>,
    started: bool,
    cursor: Cursor,
}

impl<'a> DefaultIfEmpty<'a> {
    pub fn new(source: BoxIter<'a>, default: BoxIter<'a>) -> Self {
        Self {
            source: Some(source),
            default: Some(default),
            started: false,
            cursor: Cursor::new(),
        }
    }

    /// Whether the default sequence is still held
    pub fn holds_default(&self) -> bool {
        self.default.is_some() && self.source.is_some()
    }
}

impl JsonIter for DefaultIfEmpty<'_> {
    fn move_next(&mut self) -> Result<bool> {
        let (source, default, started) = (&mut self.source, &mut self.default, &mut self.started);
        self.cursor.advance(|| {
            if let Some(src) = source.as_mut() {
                let next = next_from(src.as_mut())?;
                let first = !*started;
                *started = true;
                match next {
                    Some(v) => {
                        if first {
                            if let Some(mut unused) = default.take() {
                                unused.close()?;
                            }
                        }
                        return Ok(Some(v));
                    }
                    None => {
                        if let Some(mut done) = source.take() {
                            done.close()?;
                        }
                        if !first {
                            return Ok(None);
                        }
                    }
                }
            }
            match default.as_mut() {
                Some(d) => next_from(d.as_mut()),
                None => Ok(None),
            }
        })
    }

    fn current(&self) -> &Value {
        self.cursor.current()
    }

    fn close(&mut self) -> Result<()> {
        self.cursor.finish();
        if let Some(mut s) = self.source.take() {
            s.close()?;
        }
        if let Some(mut d) = self.default.take() {
            d.close()?;
        }
        Ok(())
    }
}

/// At most `limit` elements; the source is closed once the limit is hit
pub struct Take<'a> {
    source: Option<BoxIter<'a>>,
    remaining: u64,
    cursor: Cursor,
}

impl<'a> Take<'a> {
    pub fn new(source: BoxIter<'a>, limit: u64) -> Self {
        Self {
            source: Some(source),
            remaining: limit,
            cursor: Cursor::new(),
        }
    }
}

impl JsonIter for Take<'_> {
    fn move_next(&mut self) -> Result<bool> {
        let (source, remaining) = (&mut self.source, &mut self.remaining);
        self.cursor.advance(|| {
            if *remaining == 0 {
                if let Some(mut s) = source.take() {
                    s.close()?;
                }
                return Ok(None);
            }
            match source.as_mut() {
                Some(s) => {
                    let next = next_from(s.as_mut())?;
                    if next.is_some() {
                        *remaining -= 1;
                    }
                    Ok(next)
                }
                None => Ok(None),
            }
        })
    }

    fn current(&self) -> &Value {
        self.cursor.current()
    }

    fn close(&mut self) -> Result<()> {
        self.cursor.finish();
        match self.source.take() {
            Some(mut s) => s.close(),
            None => Ok(()),
        }
    }
}
