//! Collection serializer for spilled arrays
//!
//! Layout matches the plain array encoding: a VULong count followed by the
//! full-encoded elements. Writing emits the cached prefix element by element,
//! then copies the spill file byte for byte, so spilled elements are never
//! decoded and re-encoded. The copy is only valid when the reader's element
//! serializer is the one the array was built with.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use super::array::{SpilledArray, DEFAULT_CACHE_SIZE};
use super::errors::{SpillError, SpillResult};
use crate::serialization::{read_vulong, write_vulong, FullSerializer};

pub struct SpilledArraySerializer {
    element: Arc<dyn FullSerializer>,
    cache_size: usize,
    spill_dir: Option<PathBuf>,
}

impl SpilledArraySerializer {
    pub fn new(element: Arc<dyn FullSerializer>) -> Self {
        Self {
            element,
            cache_size: DEFAULT_CACHE_SIZE,
            spill_dir: None,
        }
    }

    /// Cache size of arrays created by `read`
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    pub fn with_spill_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spill_dir = Some(dir.into());
        self
    }

    /// Write a frozen array
    pub fn write(&self, out: &mut dyn Write, array: &SpilledArray) -> SpillResult<()> {
        if !array.is_frozen() {
            return Err(SpillError::NotFrozen);
        }
        let mut buf = Vec::new();
        write_vulong(&mut buf, array.count());
        for v in array.cached() {
            array.serializer().encode(&mut buf, v)?;
        }
        out.write_all(&buf)?;
        if let Some(spill) = array.spill_file() {
            spill.copy_to(out)?;
        }
        Ok(())
    }

    /// Read one array; `reuse` is cleared and refilled instead of allocating
    ///
    /// The result is frozen.
    pub fn read(&self, input: &mut dyn Read, reuse: Option<SpilledArray>) -> SpillResult<SpilledArray> {
        let mut array = match reuse {
            Some(mut array) => {
                array.clear()?;
                array
            }
            None => {
                let array = SpilledArray::with_cache_size(Arc::clone(&self.element), self.cache_size);
                match &self.spill_dir {
                    Some(dir) => array.with_spill_dir(dir.clone()),
                    None => array,
                }
            }
        };
        let count = read_vulong(input)?;
        let mut slot = None;
        for _ in 0..count {
            let v = self.element.read(input, slot.take())?;
            array.append(&v)?;
            slot = Some(v);
        }
        array.freeze()?;
        Ok(array)
    }

    pub fn skip(&self, input: &mut dyn Read) -> SpillResult<()> {
        let count = read_vulong(input)?;
        for _ in 0..count {
            self.element.skip(input)?;
        }
        Ok(())
    }
}
