//! Evaluation context
//!
//! Holds variable slots, declared slot schemas, the function registry and
//! the serialization and engine settings one evaluation runs with. A
//! context is single-threaded; run independent queries with independent
//! contexts.
//!
//! Slots are assigned through `&self` so that lazy sequences borrowing the
//! context can rebind loop variables as they advance. Rebinding a slot
//! overwrites it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::errors::EvalError;
use super::function::FunctionRegistry;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::schema::{validate_slot, validate_slot_elements, Schema};
use crate::serialization::SerializationConfig;
use crate::spill::SpilledArray;
use crate::value::Value;

/// What a variable slot holds
#[derive(Debug, Clone)]
pub enum Binding {
    Value(Value),
    /// A frozen spilled array, read lazily
    Spilled(Rc<SpilledArray>),
}

pub struct Context {
    bindings: RefCell<HashMap<String, Binding>>,
    schemas: HashMap<String, Schema>,
    functions: FunctionRegistry,
    serialization: SerializationConfig,
    engine: EngineConfig,
}

impl Context {
    /// Builtins, default engine settings and the process-wide serializers
    pub fn new() -> Self {
        let serialization = SerializationConfig::process_default().as_ref().clone();
        Self::build(EngineConfig::default(), serialization)
    }

    pub fn with_config(engine: EngineConfig) -> Self {
        let serialization = engine.serialization_config();
        Self::build(engine, serialization)
    }

    fn build(engine: EngineConfig, serialization: SerializationConfig) -> Self {
        Self {
            bindings: RefCell::new(HashMap::new()),
            schemas: HashMap::new(),
            functions: FunctionRegistry::with_builtins(),
            serialization,
            engine,
        }
    }

    pub fn with_serialization(mut self, serialization: SerializationConfig) -> Self {
        self.serialization = serialization;
        self
    }

    /// Declare the schema every value bound to `name` must match
    pub fn declare(&mut self, name: impl Into<String>, schema: Schema) {
        self.schemas.insert(name.into(), schema);
    }

    pub fn declared_schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn bind(&self, name: &str, value: Value) -> Result<()> {
        if let Some(schema) = self.schemas.get(name) {
            validate_slot(name, schema, &value)?;
        }
        self.bindings
            .borrow_mut()
            .insert(name.to_string(), Binding::Value(value));
        Ok(())
    }

    /// Bind a frozen spilled array without materializing it
    ///
    /// A declared schema is still enforced by streaming the array once.
    pub fn bind_spilled(&self, name: &str, array: Rc<SpilledArray>) -> Result<()> {
        if let Some(schema) = self.schemas.get(name) {
            validate_slot_elements(name, schema, &mut array.iter()?)?;
        }
        self.bindings
            .borrow_mut()
            .insert(name.to_string(), Binding::Spilled(array));
        Ok(())
    }

    pub fn unbind(&self, name: &str) -> Option<Binding> {
        self.bindings.borrow_mut().remove(name)
    }

    pub fn lookup(&self, name: &str) -> Result<Binding> {
        self.bindings
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnboundVariable(name.to_string()).into())
    }

    /// The bound value, reading a spilled binding into memory
    pub fn value_of(&self, name: &str) -> Result<Value> {
        match self.lookup(name)? {
            Binding::Value(v) => Ok(v),
            Binding::Spilled(array) => Ok(Value::Array(array.to_vec()?)),
        }
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    pub fn serialization(&self) -> &SerializationConfig {
        &self.serialization
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// An empty spilled array configured from the engine settings
    pub fn new_spilled_array(&self) -> SpilledArray {
        let array = SpilledArray::with_cache_size(
            self.serialization.binary().clone(),
            self.engine.spill_cache_size,
        );
        match self.engine.spill_dir() {
            Some(dir) => array.with_spill_dir(dir),
            None => array,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
