//! Spill subsystem
//!
//! Append-only arrays that overflow from memory into a temporary file of
//! encoded values once a size threshold is crossed.
//!
//! # Invariants
//!
//! 1. Iteration yields elements in append order, cached prefix first
//! 2. Appends after `freeze` fail; reads before `freeze` fail
//! 3. Every spilled byte is covered by a CRC32 checked on replay
//! 4. A spill file belongs to exactly one array and is deleted with it
//!
//! I/O errors propagate to the caller. Nothing is retried.

mod array;
mod errors;
mod file;
mod serializer;

pub use array::{SpilledArray, SpilledIter, DEFAULT_CACHE_SIZE};
pub use errors::{SpillError, SpillResult};
pub use file::{SpillFile, SpillReader};
pub use serializer::SpilledArraySerializer;
