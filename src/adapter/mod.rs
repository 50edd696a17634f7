//! Input and output adapters
//!
//! An input adapter exposes a source as one lazy sequence of values; an
//! output adapter hands out a writer that accepts values one at a time.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──open──► Open ──close──► Closed
//! ```
//!
//! `iter` and `writer` require an open adapter. Closing twice is harmless;
//! using a closed adapter fails with `Closed`.
//!
//! # Invariants
//!
//! - The schema of an input describes the whole source and is an array or
//!   null schema
//! - Binary streams hold full-encoded values back to back, with no framing

mod errors;
mod input;
mod output;

pub use errors::{AdapterError, AdapterResult};
pub use input::{ArrayInput, BinaryStreamInput, JsonLinesInput};
pub use output::{BinaryStreamOutput, CollectingOutput, DelimitedOutput, TextOutput};

use crate::error::Result;
use crate::iter::BoxIter;
use crate::schema::Schema;
use crate::value::Value;

pub trait InputAdapter {
    fn open(&mut self) -> Result<()>;

    /// The source as a lazy sequence; borrows the adapter while it runs
    fn iter(&mut self) -> Result<BoxIter<'_>>;

    fn schema(&self) -> Schema;

    fn close(&mut self) -> Result<()>;
}

pub trait OutputAdapter {
    fn open(&mut self) -> Result<()>;

    fn writer(&mut self) -> Result<Box<dyn RecordWriter + '_>>;

    fn close(&mut self) -> Result<()>;
}

pub trait RecordWriter {
    fn write(&mut self, value: &Value) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdapterState {
    Created,
    Open,
    Closed,
}

impl AdapterState {
    fn open(&mut self) -> AdapterResult<()> {
        match self {
            AdapterState::Closed => Err(AdapterError::Closed),
            _ => {
                *self = AdapterState::Open;
                Ok(())
            }
        }
    }

    fn require_open(&self) -> AdapterResult<()> {
        match self {
            AdapterState::Created => Err(AdapterError::NotOpen),
            AdapterState::Open => Ok(()),
            AdapterState::Closed => Err(AdapterError::Closed),
        }
    }
}

/// Drain `input` into `output`, opening and closing both
///
/// Returns the number of values copied.
pub fn copy_all(input: &mut dyn InputAdapter, output: &mut dyn OutputAdapter) -> Result<u64> {
    input.open()?;
    output.open()?;
    let mut copied = 0u64;
    {
        let mut values = input.iter()?;
        let mut writer = output.writer()?;
        if !values.is_null() {
            while values.move_next()? {
                writer.write(values.current())?;
                copied += 1;
            }
        }
        values.close()?;
        writer.close()?;
    }
    output.close()?;
    input.close()?;
    Ok(copied)
}
