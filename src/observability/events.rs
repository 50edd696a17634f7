//! Observable events
//!
//! Events are explicit and typed; the logger only ever receives one of these.

use std::fmt;

/// Observable events in the evaluation core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Engine configuration loaded and validated
    ConfigLoaded,
    /// Process-wide default serialization config replaced
    DefaultSerializerSet,

    // Spill files
    /// A spilled array created its backing temporary file
    SpillFileCreated,
    /// A spilled array was frozen for reading
    SpillFrozen,
    /// A spilled array was cleared for reuse
    SpillCleared,
    /// Spill file checksum mismatch on replay
    SpillCorruption,

    // Evaluation
    /// A value did not match the declared schema of its slot
    SchemaViolation,
    /// A call was replaced by its precomputed constant
    ConstantFolded,
    /// A function was added to a registry
    FunctionRegistered,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::DefaultSerializerSet => "DEFAULT_SERIALIZER_SET",
            Event::SpillFileCreated => "SPILL_FILE_CREATED",
            Event::SpillFrozen => "SPILL_FROZEN",
            Event::SpillCleared => "SPILL_CLEARED",
            Event::SpillCorruption => "SPILL_CORRUPTION",
            Event::SchemaViolation => "SCHEMA_VIOLATION",
            Event::ConstantFolded => "CONSTANT_FOLDED",
            Event::FunctionRegistered => "FUNCTION_REGISTERED",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::SpillCorruption)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_unique() {
        let events = [
            Event::ConfigLoaded,
            Event::DefaultSerializerSet,
            Event::SpillFileCreated,
            Event::SpillFrozen,
            Event::SpillCleared,
            Event::SpillCorruption,
            Event::SchemaViolation,
            Event::ConstantFolded,
            Event::FunctionRegistered,
        ];
        let mut names: Vec<_> = events.iter().map(|e| e.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), events.len());
    }

    #[test]
    fn test_fatal_events() {
        assert!(Event::SpillCorruption.is_fatal());
        assert!(!Event::SpillFrozen.is_fatal());
    }
}
