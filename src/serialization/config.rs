//! Serializer selection
//!
//! A `SerializationConfig` names the binary and text serializers used by an
//! evaluation and keeps a registry of named binary serializer factories
//! (`"default"`, `"schema"`). One process-wide default exists; replacing it
//! is logged, never silent.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use super::basic::FullSerializer;
use super::errors::{SerializationError, SerializationResult};
use super::full::DefaultFullSerializer;
use super::schema_binary::SchemaBinarySerializer;
use super::text::{TextFullSerializer, TextSerializer};
use crate::observability::{Event, Logger};
use crate::schema::Schema;

/// Builds a binary serializer, optionally specialized to a schema
pub type SerializerFactory = Arc<dyn Fn(Option<&Schema>) -> Arc<dyn FullSerializer> + Send + Sync>;

#[derive(Clone)]
pub struct SerializationConfig {
    binary: Arc<dyn FullSerializer>,
    text: Arc<dyn TextSerializer>,
    indent_step: usize,
    factories: BTreeMap<String, SerializerFactory>,
}

static PROCESS_DEFAULT: OnceLock<RwLock<Arc<SerializationConfig>>> = OnceLock::new();

fn process_slot() -> &'static RwLock<Arc<SerializationConfig>> {
    PROCESS_DEFAULT.get_or_init(|| RwLock::new(Arc::new(SerializationConfig::new())))
}

impl SerializationConfig {
    pub fn new() -> Self {
        let mut factories: BTreeMap<String, SerializerFactory> = BTreeMap::new();
        factories.insert(
            "default".to_string(),
            Arc::new(|_: Option<&Schema>| Arc::new(DefaultFullSerializer) as Arc<dyn FullSerializer>),
        );
        factories.insert(
            "schema".to_string(),
            Arc::new(|schema: Option<&Schema>| match schema {
                Some(s) => Arc::new(SchemaBinarySerializer::new(s.clone())) as Arc<dyn FullSerializer>,
                None => Arc::new(DefaultFullSerializer) as Arc<dyn FullSerializer>,
            }),
        );
        Self {
            binary: Arc::new(DefaultFullSerializer),
            text: Arc::new(TextFullSerializer::default()),
            indent_step: TextFullSerializer::default().indent_step(),
            factories,
        }
    }

    /// Pretty-print text output with `indent_step` spaces per level
    pub fn with_indent(mut self, indent_step: usize) -> Self {
        self.indent_step = indent_step;
        self.text = Arc::new(TextFullSerializer::new(indent_step));
        self
    }

    pub fn with_binary(mut self, binary: Arc<dyn FullSerializer>) -> Self {
        self.binary = binary;
        self
    }

    pub fn with_text(mut self, text: Arc<dyn TextSerializer>) -> Self {
        self.text = text;
        self
    }

    pub fn binary(&self) -> &Arc<dyn FullSerializer> {
        &self.binary
    }

    pub fn text(&self) -> &Arc<dyn TextSerializer> {
        &self.text
    }

    pub fn indent_step(&self) -> usize {
        self.indent_step
    }

    /// Register (or replace) a named binary serializer factory
    pub fn register(&mut self, name: impl Into<String>, factory: SerializerFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn factory_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build the named serializer
    pub fn serializer(&self, name: &str, schema: Option<&Schema>) -> SerializationResult<Arc<dyn FullSerializer>> {
        match self.factories.get(name) {
            Some(factory) => Ok(factory(schema)),
            None => Err(SerializationError::Unsupported(format!("no serializer named '{}'", name))),
        }
    }

    /// The process-wide default configuration
    pub fn process_default() -> Arc<SerializationConfig> {
        let guard = process_slot().read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Replace the process-wide default; evaluations already holding the
    /// previous configuration keep using it
    pub fn set_process_default(config: SerializationConfig) {
        let indent = config.indent_step.to_string();
        let factories = config.factory_names().collect::<Vec<_>>().join(",");
        let mut guard = process_slot().write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(config);
        drop(guard);
        Logger::info(
            Event::DefaultSerializerSet,
            &[("indent_step", indent.as_str()), ("factories", factories.as_str())],
        );
    }
}

impl Default for SerializationConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SerializationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializationConfig")
            .field("indent_step", &self.indent_step)
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
