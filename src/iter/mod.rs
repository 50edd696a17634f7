//! Lazy sequence subsystem
//!
//! Evaluation produces sequences through a pull protocol: `move_next`
//! advances, `current` reads, `close` releases resources early.
//!
//! # Invariants
//!
//! 1. After `move_next` returns `false`, every later call returns `false`
//! 2. After `move_next` fails, every later call fails
//! 3. `current` reads as null unless the cursor is positioned
//! 4. The null sequence is distinct from the empty sequence
//! 5. Adapters release upstream resources as soon as they are not needed
//!
//! Sequences are single-pass and single-threaded.

mod combinators;
mod errors;
mod protocol;
mod regex_match;

pub use combinators::{Concat, DefaultIfEmpty, Filter, Flatten, Map, Take};
pub use errors::{IterError, IterResult};
pub use protocol::{
    collect_values, count, empty, null, once, values, BoxIter, IterState, JsonIter, NullIter,
    ValuesIter,
};
pub use regex_match::RegexMatchIter;

pub(crate) use combinators::next_from;
pub(crate) use protocol::Cursor;
