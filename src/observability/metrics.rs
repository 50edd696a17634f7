//! Counters for the evaluation core
//!
//! - Counters only, monotonic increase
//! - Reset only on process start
//! - Relaxed atomics; exactness per counter, not across counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

/// Operational counters
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    spill_files_created: AtomicU64,
    values_spilled: AtomicU64,
    spill_bytes_written: AtomicU64,
    values_serialized: AtomicU64,
    constants_folded: AtomicU64,
}

static GLOBAL: OnceLock<MetricsRegistry> = OnceLock::new();

impl MetricsRegistry {
    /// Create a new registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn global() -> &'static MetricsRegistry {
        GLOBAL.get_or_init(MetricsRegistry::new)
    }

    pub fn increment_spill_files(&self) {
        self.spill_files_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one value written to a spill file along with its encoded size
    pub fn record_spilled_value(&self, bytes: u64) {
        self.values_spilled.fetch_add(1, Ordering::Relaxed);
        self.spill_bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn increment_values_serialized(&self) {
        self.values_serialized.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_constants_folded(&self) {
        self.constants_folded.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            spill_files_created: self.spill_files_created.load(Ordering::Relaxed),
            values_spilled: self.values_spilled.load(Ordering::Relaxed),
            spill_bytes_written: self.spill_bytes_written.load(Ordering::Relaxed),
            values_serialized: self.values_serialized.load(Ordering::Relaxed),
            constants_folded: self.constants_folded.load(Ordering::Relaxed),
        }
    }

    /// Snapshot rendered as a JSON object
    pub fn to_json(&self) -> String {
        let s = self.snapshot();
        serde_json::json!({
            "constants_folded": s.constants_folded,
            "spill_bytes_written": s.spill_bytes_written,
            "spill_files_created": s.spill_files_created,
            "values_serialized": s.values_serialized,
            "values_spilled": s.values_spilled,
        })
        .to_string()
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub spill_files_created: u64,
    pub values_spilled: u64,
    pub spill_bytes_written: u64,
    pub values_serialized: u64,
    pub constants_folded: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let snapshot = MetricsRegistry::new().snapshot();
        assert_eq!(snapshot.values_spilled, 0);
        assert_eq!(snapshot.spill_files_created, 0);
        assert_eq!(snapshot.constants_folded, 0);
    }

    #[test]
    fn test_record_spilled_value() {
        let registry = MetricsRegistry::new();
        registry.record_spilled_value(9);
        registry.record_spilled_value(3);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.values_spilled, 2);
        assert_eq!(snapshot.spill_bytes_written, 12);
    }

    #[test]
    fn test_to_json_is_valid() {
        let registry = MetricsRegistry::new();
        registry.increment_constants_folded();

        let parsed: serde_json::Value = serde_json::from_str(&registry.to_json()).unwrap();
        assert_eq!(parsed["constants_folded"], 1);
        assert_eq!(parsed["values_spilled"], 0);
    }
}
