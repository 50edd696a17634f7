//! Functions and the function registry
//!
//! Calls and function values resolve names through a registry populated at
//! startup. A function is one of three shapes:
//!
//! - scalar: evaluated arguments in, one value out
//! - aggregate: one argument consumed as a lazy sequence, one value out
//! - generator: evaluated arguments in, a lazy sequence out

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::errors::{EvalError, EvalResult};
use crate::error::Result;
use crate::iter::{BoxIter, JsonIter};
use crate::observability::{Event, Logger};
use crate::schema::Schema;
use crate::value::Value;

pub type ScalarFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;
pub type AggregateFn = Arc<dyn Fn(&mut dyn JsonIter) -> Result<Value> + Send + Sync>;
pub type GeneratorFn = Arc<dyn Fn(&[Value]) -> Result<BoxIter<'static>> + Send + Sync>;

#[derive(Clone)]
pub enum FunctionImpl {
    Scalar(ScalarFn),
    Aggregate(AggregateFn),
    Generator(GeneratorFn),
}

#[derive(Clone)]
pub struct Function {
    name: String,
    min_args: usize,
    max_args: Option<usize>,
    deterministic: bool,
    result: Schema,
    body: FunctionImpl,
}

impl Function {
    pub fn scalar(
        name: impl Into<String>,
        arity: usize,
        result: Schema,
        f: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self::build(name.into(), arity, Some(arity), result, FunctionImpl::Scalar(Arc::new(f)))
    }

    pub fn aggregate(
        name: impl Into<String>,
        result: Schema,
        f: impl Fn(&mut dyn JsonIter) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self::build(name.into(), 1, Some(1), result, FunctionImpl::Aggregate(Arc::new(f)))
    }

    pub fn generator(
        name: impl Into<String>,
        arity: usize,
        result: Schema,
        f: impl Fn(&[Value]) -> Result<BoxIter<'static>> + Send + Sync + 'static,
    ) -> Self {
        Self::build(name.into(), arity, Some(arity), result, FunctionImpl::Generator(Arc::new(f)))
    }

    fn build(
        name: String,
        min_args: usize,
        max_args: Option<usize>,
        result: Schema,
        body: FunctionImpl,
    ) -> Self {
        Self {
            name,
            min_args,
            max_args,
            deterministic: true,
            result,
            body,
        }
    }

    /// Accept between `min` and `max` arguments (`None` for no upper bound)
    pub fn with_arity(mut self, min: usize, max: Option<usize>) -> Self {
        self.min_args = min;
        self.max_args = max;
        self
    }

    /// Exclude the function from constant folding
    pub fn nondeterministic(mut self) -> Self {
        self.deterministic = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_deterministic(&self) -> bool {
        self.deterministic
    }

    /// Schema of every value the function can return
    pub fn result_schema(&self) -> &Schema {
        &self.result
    }

    pub fn body(&self) -> &FunctionImpl {
        &self.body
    }

    pub fn check_arity(&self, actual: usize) -> EvalResult<()> {
        let too_many = self.max_args.map_or(false, |max| actual > max);
        if actual < self.min_args || too_many {
            let expected = match self.max_args {
                Some(max) if max == self.min_args => max.to_string(),
                Some(max) => format!("{}..={}", self.min_args, max),
                None => format!("at least {}", self.min_args),
            };
            return Err(EvalError::Arity {
                function: self.name.clone(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self.body {
            FunctionImpl::Scalar(_) => "scalar",
            FunctionImpl::Aggregate(_) => "aggregate",
            FunctionImpl::Generator(_) => "generator",
        };
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("shape", &shape)
            .field("deterministic", &self.deterministic)
            .finish()
    }
}

/// Functions by name
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    by_name: BTreeMap<String, Arc<Function>>,
}

impl FunctionRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every builtin
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        super::builtins::register_all(&mut registry);
        registry
    }

    pub fn register(&mut self, function: Function) -> EvalResult<()> {
        if self.by_name.contains_key(function.name()) {
            return Err(EvalError::DuplicateFunction(function.name().to_string()));
        }
        Logger::trace(Event::FunctionRegistered, &[("name", function.name())]);
        self.by_name.insert(function.name().to_string(), Arc::new(function));
        Ok(())
    }

    pub fn get(&self, name: &str) -> EvalResult<Arc<Function>> {
        self.by_name
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double_it() -> Function {
        Function::scalar("double_it", 1, Schema::long(), |args| {
            Ok(Value::Long(args[0].long_value_exact()? * 2))
        })
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = FunctionRegistry::new();
        registry.register(double_it()).unwrap();
        let f = registry.get("double_it").unwrap();
        assert_eq!(f.name(), "double_it");
        assert!(f.is_deterministic());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = FunctionRegistry::new();
        registry.register(double_it()).unwrap();
        let err = registry.register(double_it()).unwrap_err();
        assert_eq!(err.code(), "JQ_EVAL_DUPLICATE_FUNCTION");
    }

    #[test]
    fn test_unknown_function() {
        let err = FunctionRegistry::new().get("nope").unwrap_err();
        assert_eq!(err, EvalError::UnknownFunction("nope".into()));
    }

    #[test]
    fn test_arity_messages() {
        let f = double_it();
        assert!(f.check_arity(1).is_ok());
        assert_eq!(
            f.check_arity(2).unwrap_err().to_string(),
            "double_it expects 1 argument(s), got 2"
        );
        let g = double_it().with_arity(1, Some(2));
        assert!(g.check_arity(2).is_ok());
        assert!(g.check_arity(0).unwrap_err().to_string().contains("1..=2"));
    }
}
