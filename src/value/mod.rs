//! Value model
//!
//! The closed set of JSON-like value variants with a total order,
//! structural equality and a hash consistent with both.
//!
//! # Invariants
//!
//! 1. `a.cmp(b) == Equal` exactly when `a == b`, and equal values hash equal
//! 2. Values of different type classes order by class alone
//! 3. Numbers compare by mathematical value across Long, Decimal and Double
//! 4. Record keys are unique; records compare through their sorted view
//!
//! # Reuse
//!
//! Decoders take `reuse: Option<Value>`: a previous value whose buffers the
//! callee may recycle. Ownership moves into the call and the returned value
//! is the only valid handle afterwards.

mod compare;
mod convert;
mod errors;
mod record;
mod types;
mod variant;

pub use compare::{cmp_f64, compare_numbers, exact_decimal_of_f64};
pub use convert::{format_date, from_base64, from_hex, parse_date, to_base64, to_hex};
pub use errors::{ValueError, ValueResult};
pub use record::Record;
pub use types::{Encoding, JsonType};
pub use variant::{FunctionRef, JsonRegex, Span, Value};
