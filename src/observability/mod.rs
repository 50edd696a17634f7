//! Observability subsystem
//!
//! - Structured logging (JSON lines)
//! - Monotonic counters
//!
//! # Principles
//!
//! 1. Observability is read-only: it never changes evaluation results
//! 2. No background threads
//! 3. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use jsonq::observability::{Event, Logger, MetricsRegistry};
//!
//! Logger::info(Event::SpillFrozen, &[("count", "10000")]);
//! MetricsRegistry::global().increment_spill_files();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
