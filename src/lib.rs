//! jsonq - typed JSON values for query evaluation
//!
//! Values, schemas, lazy sequences, order-preserving binary encodings,
//! disk-backed arrays and a small expression evaluator.

pub mod adapter;
pub mod cli;
pub mod config;
pub mod error;
pub mod expr;
pub mod iter;
pub mod observability;
pub mod schema;
pub mod serialization;
pub mod spill;
pub mod value;

pub use error::{Error, Result};
