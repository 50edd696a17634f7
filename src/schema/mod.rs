//! Schema subsystem
//!
//! Immutable, recursive descriptions of the values a slot may hold.
//!
//! # Invariants
//!
//! 1. `matches` is a pure predicate and never fails
//! 2. `merge` never rejects a value either input accepted
//! 3. `union` accepts exactly the values either input accepted
//! 4. `get_constant` on a non-constant schema is a fatal programming error
//! 5. The order on schemas is total: kind, then content, then annotation

mod display;
mod errors;
mod infer;
mod merge;
mod order;
mod types;
mod validator;

pub use errors::{SchemaError, SchemaResult};
pub use merge::{compact, CompactOptions, MergeMode};
pub use types::{ArraySchema, RecordField, RecordSchema, Schema, SchemaKind, SchemaType};
pub use validator::{validate_slot, validate_slot_elements};
