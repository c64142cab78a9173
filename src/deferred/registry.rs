//! Explicit registration of deferred functions by name.

use crate::deferred::DeferredFn;
use crate::error::{PipelineError, Result};
use crate::types::{Kwargs, Value};
use std::collections::BTreeMap;

/// Named collection of deferred functions.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, DeferredFn>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in processing functions.
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        crate::functions::register_builtins(&mut registry)?;
        Ok(registry)
    }

    /// Wrap `func` and register it under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, func: F) -> Result<DeferredFn>
    where
        F: Fn(&[Value], &Kwargs) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let function = DeferredFn::new(name, func);
        self.insert(function.clone())?;
        Ok(function)
    }

    /// Register an already wrapped function. Empty and duplicate names are rejected.
    pub fn insert(&mut self, function: DeferredFn) -> Result<()> {
        let name = function.name();
        if name.is_empty() {
            return Err(PipelineError::Construction(
                "function name cannot be empty".to_string(),
            ));
        }
        if self.functions.contains_key(name) {
            return Err(PipelineError::Construction(format!(
                "function `{name}` is already registered"
            )));
        }
        tracing::debug!("Registered function `{}`", name);
        self.functions.insert(name.to_string(), function);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&DeferredFn> {
        self.functions.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
