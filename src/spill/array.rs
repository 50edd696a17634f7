//! Spillable array
//!
//! The first `cache_size` elements stay in memory. Every later append is
//! encoded with the bound full serializer and written straight to the spill
//! file, so peak memory does not grow with the element count.
//!
//! Lifecycle: append* → freeze → iter* → clear → append* ...

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::errors::{SpillError, SpillResult};
use super::file::{SpillFile, SpillReader};
use crate::error::Result;
use crate::iter::{Cursor, JsonIter};
use crate::observability::{Event, Logger, MetricsRegistry};
use crate::serialization::{DefaultFullSerializer, FullSerializer};
use crate::value::Value;

/// In-memory prefix length used when none is configured
pub const DEFAULT_CACHE_SIZE: usize = 256;

pub struct SpilledArray {
    cache: Arc<Vec<Value>>,
    cache_size: usize,
    count: u64,
    spill: Option<SpillFile>,
    spill_dir: Option<PathBuf>,
    frozen: bool,
    serializer: Arc<dyn FullSerializer>,
    scratch: Vec<u8>,
}

impl SpilledArray {
    pub fn new(serializer: Arc<dyn FullSerializer>) -> Self {
        Self::with_cache_size(serializer, DEFAULT_CACHE_SIZE)
    }

    pub fn with_cache_size(serializer: Arc<dyn FullSerializer>, cache_size: usize) -> Self {
        Self {
            cache: Arc::new(Vec::new()),
            cache_size,
            count: 0,
            spill: None,
            spill_dir: None,
            frozen: false,
            serializer,
            scratch: Vec::new(),
        }
    }

    /// Place spill files under `dir` instead of the system temp directory
    pub fn with_spill_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spill_dir = Some(dir.into());
        self
    }

    /// A frozen array holding `items`
    pub fn from_values(items: Vec<Value>) -> SpillResult<Self> {
        let mut array = Self::new(Arc::new(DefaultFullSerializer::new()));
        for item in &items {
            array.append(item)?;
        }
        array.freeze()?;
        Ok(array)
    }

    pub fn append(&mut self, value: &Value) -> SpillResult<()> {
        if self.frozen {
            return Err(SpillError::Frozen);
        }
        // nothing spilled yet since the last clear
        let caching = self.count == self.cache.len() as u64;
        if caching && self.cache.len() < self.cache_size {
            Arc::make_mut(&mut self.cache).push(value.clone());
        } else {
            if self.spill.is_none() {
                self.spill = Some(SpillFile::create(self.spill_dir.as_deref())?);
            }
            self.scratch.clear();
            self.serializer.encode(&mut self.scratch, value)?;
            if let Some(spill) = self.spill.as_mut() {
                spill.append_bytes(&self.scratch)?;
            }
            MetricsRegistry::global().record_spilled_value(self.scratch.len() as u64);
        }
        self.count += 1;
        Ok(())
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn cache_size(&self) -> usize {
        self.cache_size
    }

    /// The in-memory prefix
    pub fn cached(&self) -> &[Value] {
        &self.cache
    }

    /// Number of elements living in the spill file
    pub fn spilled_count(&self) -> u64 {
        self.count - self.cache.len() as u64
    }

    pub fn spill_path(&self) -> Option<&Path> {
        self.spill.as_ref().map(SpillFile::path)
    }

    pub fn serializer(&self) -> &Arc<dyn FullSerializer> {
        &self.serializer
    }

    pub(crate) fn spill_file(&self) -> Option<&SpillFile> {
        self.spill.as_ref()
    }

    /// Seal the array for reading; idempotent
    pub fn freeze(&mut self) -> SpillResult<()> {
        if self.frozen {
            return Ok(());
        }
        let mut spilled_bytes = 0;
        if let Some(spill) = self.spill.as_mut() {
            spill.finish()?;
            spilled_bytes = spill.len();
        }
        self.frozen = true;
        Logger::trace(
            Event::SpillFrozen,
            &[
                ("count", self.count.to_string().as_str()),
                ("spilled_bytes", spilled_bytes.to_string().as_str()),
            ],
        );
        Ok(())
    }

    /// A fresh sequence over every element in append order
    ///
    /// The sequence owns its own file handle; `clear` invalidates it.
    pub fn iter(&self) -> SpillResult<SpilledIter> {
        if !self.frozen {
            return Err(SpillError::NotFrozen);
        }
        let reader = match &self.spill {
            Some(spill) => Some(spill.reader()?),
            None => None,
        };
        Ok(SpilledIter {
            cache: Arc::clone(&self.cache),
            next_cached: 0,
            spilled_remaining: self.spilled_count(),
            reader,
            serializer: Arc::clone(&self.serializer),
            cursor: Cursor::new(),
        })
    }

    /// Drain every element into memory
    pub fn to_vec(&self) -> Result<Vec<Value>> {
        crate::iter::collect_values(&mut self.iter()?)
    }

    /// Back to empty and unfrozen, keeping allocations and the spill file
    pub fn clear(&mut self) -> SpillResult<()> {
        match Arc::get_mut(&mut self.cache) {
            Some(cache) => cache.clear(),
            None => self.cache = Arc::new(Vec::with_capacity(self.cache.len())),
        }
        if let Some(spill) = self.spill.as_mut() {
            spill.clear()?;
        }
        let dropped = self.count;
        self.count = 0;
        self.frozen = false;
        Logger::trace(Event::SpillCleared, &[("count", dropped.to_string().as_str())]);
        Ok(())
    }
}

impl std::fmt::Debug for SpilledArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpilledArray")
            .field("count", &self.count)
            .field("cache_size", &self.cache_size)
            .field("frozen", &self.frozen)
            .field("spill", &self.spill_path())
            .finish()
    }
}

/// Replays the cached prefix, then decodes the spill file
pub struct SpilledIter {
    cache: Arc<Vec<Value>>,
    next_cached: usize,
    spilled_remaining: u64,
    reader: Option<SpillReader>,
    serializer: Arc<dyn FullSerializer>,
    cursor: Cursor,
}

impl JsonIter for SpilledIter {
    fn move_next(&mut self) -> Result<bool> {
        let Self {
            cache,
            next_cached,
            spilled_remaining,
            reader,
            serializer,
            cursor,
        } = self;
        cursor.advance(|| {
            if let Some(v) = cache.get(*next_cached) {
                *next_cached += 1;
                return Ok(Some(v.clone()));
            }
            let Some(input) = reader.as_mut() else {
                return Ok(None);
            };
            if *spilled_remaining == 0 {
                let result = input.verify();
                *reader = None;
                result?;
                return Ok(None);
            }
            let v = serializer.read(input, None)?;
            *spilled_remaining -= 1;
            Ok(Some(v))
        })
    }

    fn current(&self) -> &Value {
        self.cursor.current()
    }

    fn close(&mut self) -> Result<()> {
        self.reader = None;
        self.cursor.finish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::collect_values;

    fn full() -> Arc<dyn FullSerializer> {
        Arc::new(DefaultFullSerializer::new())
    }

    #[test]
    fn test_small_array_stays_in_memory() {
        let mut a = SpilledArray::with_cache_size(full(), 4);
        for i in 0..3 {
            a.append(&Value::Long(i)).unwrap();
        }
        a.freeze().unwrap();
        assert!(a.spill_path().is_none());
        assert_eq!(a.to_vec().unwrap(), vec![Value::Long(0), Value::Long(1), Value::Long(2)]);
    }

    #[test]
    fn test_spills_past_cache_and_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = SpilledArray::with_cache_size(full(), 2).with_spill_dir(dir.path());
        let items = vec![
            Value::Long(1),
            Value::string("two"),
            Value::Null,
            Value::Array(vec![Value::Boolean(true)]),
            Value::Double(5.5),
        ];
        for v in &items {
            a.append(v).unwrap();
        }
        assert_eq!(a.count(), 5);
        assert_eq!(a.spilled_count(), 3);
        assert!(a.spill_path().unwrap().starts_with(dir.path()));
        a.freeze().unwrap();
        // re-readable once frozen
        assert_eq!(a.to_vec().unwrap(), items);
        assert_eq!(a.to_vec().unwrap(), items);
    }

    #[test]
    fn test_lifecycle_errors() {
        let mut a = SpilledArray::with_cache_size(full(), 1);
        a.append(&Value::Long(1)).unwrap();
        assert!(matches!(a.iter(), Err(SpillError::NotFrozen)));
        a.freeze().unwrap();
        a.freeze().unwrap();
        let err = a.append(&Value::Long(2)).unwrap_err();
        assert_eq!(err.code(), "JQ_SPILL_FROZEN");
    }

    #[test]
    fn test_clear_reuses_array() {
        let mut a = SpilledArray::with_cache_size(full(), 1);
        for round in 0..3i64 {
            for i in 0..5 {
                a.append(&Value::Long(round * 10 + i)).unwrap();
            }
            a.freeze().unwrap();
            let got = collect_values(&mut a.iter().unwrap()).unwrap();
            let want: Vec<_> = (0..5).map(|i| Value::Long(round * 10 + i)).collect();
            assert_eq!(got, want);
            a.clear().unwrap();
            assert_eq!(a.count(), 0);
            assert!(!a.is_frozen());
        }
    }

    #[test]
    fn test_clear_restores_in_memory_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = SpilledArray::with_cache_size(full(), 4).with_spill_dir(dir.path());
        for i in 0..10 {
            a.append(&Value::Long(i)).unwrap();
        }
        a.freeze().unwrap();
        assert_eq!(a.spilled_count(), 6);
        a.clear().unwrap();

        for i in 0..3 {
            a.append(&Value::Long(100 + i)).unwrap();
        }
        assert_eq!(a.cached().len(), 3);
        assert_eq!(a.spilled_count(), 0);
        a.append(&Value::Long(103)).unwrap();
        a.append(&Value::Long(104)).unwrap();
        assert_eq!(a.cached().len(), 4);
        assert_eq!(a.spilled_count(), 1);
        a.freeze().unwrap();
        let want: Vec<_> = (100..105).map(Value::Long).collect();
        assert_eq!(a.to_vec().unwrap(), want);
    }

    #[test]
    fn test_clear_with_outstanding_iterator_keeps_cache_snapshot() {
        let mut a = SpilledArray::with_cache_size(full(), 8);
        a.append(&Value::Long(1)).unwrap();
        a.freeze().unwrap();
        let mut it = a.iter().unwrap();
        a.clear().unwrap();
        a.append(&Value::Long(2)).unwrap();
        assert!(it.move_next().unwrap());
        assert_eq!(it.current(), &Value::Long(1));
    }
}
