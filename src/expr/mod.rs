//! Expression evaluation
//!
//! A small expression tree over values and lazy sequences, evaluated in a
//! `Context` of variable slots and registered functions.
//!
//! # Principles
//!
//! - Sequence expressions are lazy: elements are produced as the consumer
//!   pulls them, and loop variables are rebound per element
//! - The null sequence propagates: a transform of null is null, not empty
//! - Group-by materializes groups in spilled arrays, never in plain vectors
//! - Folding never changes what an expression evaluates to
//!
//! # Invariants
//!
//! - A value bound to a slot with a declared schema matches that schema
//! - `schema()` of an expression admits every value `eval()` can return
//! - Only deterministic scalar functions are folded

mod ast;
mod builtins;
mod context;
mod errors;
mod eval;
mod fold;
mod function;
mod group;
mod infer;

pub use ast::Expr;
pub use context::{Binding, Context};
pub use errors::{EvalError, EvalResult};
pub use function::{AggregateFn, Function, FunctionImpl, FunctionRegistry, GeneratorFn, ScalarFn};
