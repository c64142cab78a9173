//! Rhai Script Engine Implementation
//!
//! Compiles scripts into [`DeferredFn`]s and converts values between the
//! crate's [`Value`] and Rhai's `Dynamic`.

use crate::deferred::{DeferredFn, FunctionRegistry, ProcessFn};
use crate::error::{PipelineError, Result};
use crate::scripting::{CompiledScript, ScriptCache, SharedScriptCache};
use crate::types::{Kwargs, Value};
use anyhow::{anyhow, bail};
use rhai::{Array, Dynamic, Engine, Map, Scope};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Script engine producing deferred processing functions
#[derive(Clone)]
pub struct ScriptEngine {
    /// The Rhai engine instance
    engine: Arc<Engine>,
    /// Cache of compiled scripts
    cache: SharedScriptCache,
}

impl ScriptEngine {
    /// Create a new script engine with default configuration
    pub fn new() -> Self {
        Self::with_cache(Arc::new(RwLock::new(ScriptCache::new())))
    }

    /// Create a new script engine with a shared cache
    pub fn with_cache(cache: SharedScriptCache) -> Self {
        let mut engine = Engine::new();
        Self::configure_engine(&mut engine);
        Self {
            engine: Arc::new(engine),
            cache,
        }
    }

    /// Configure the Rhai engine with helper functions and safety limits
    fn configure_engine(engine: &mut Engine) {
        // Set safety limits
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(32);
        engine.set_max_operations(1_000_000);
        engine.set_max_string_size(10_000);
        engine.set_max_array_size(1_000_000);
        engine.set_max_map_size(1_000);

        // ===== Array Statistics =====

        engine.register_fn("sum", |arr: Array| -> f64 { numbers(&arr).sum() });
        engine.register_fn("mean", |arr: Array| -> f64 {
            if arr.is_empty() {
                f64::NAN
            } else {
                numbers(&arr).sum::<f64>() / arr.len() as f64
            }
        });
        engine.register_fn("min_of", |arr: Array| -> f64 {
            numbers(&arr).fold(f64::INFINITY, f64::min)
        });
        engine.register_fn("max_of", |arr: Array| -> f64 {
            numbers(&arr).fold(f64::NEG_INFINITY, f64::max)
        });

        // ===== Mathematical Functions =====

        engine.register_fn("abs", |x: f64| x.abs());
        engine.register_fn("sqrt", |x: f64| x.sqrt());
        engine.register_fn("pow", |x: f64, y: f64| x.powf(y));
        engine.register_fn("exp", |x: f64| x.exp());
        engine.register_fn("ln", |x: f64| x.ln());
        engine.register_fn("floor", |x: f64| x.floor());
        engine.register_fn("ceil", |x: f64| x.ceil());
        engine.register_fn("round", |x: f64| x.round());
        engine.register_fn("clamp", |x: f64, min: f64, max: f64| x.clamp(min, max));
        engine.register_fn("lerp", |a: f64, b: f64, t: f64| a + (b - a) * t);
        engine.register_fn(
            "map_range",
            |x: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64| {
                (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
            },
        );
    }

    /// Compile a script and cache it
    pub fn compile(&self, name: &str, source: &str) -> Result<CompiledScript> {
        let mut cache = self.cache.write().map_err(|e| {
            PipelineError::Construction(format!("Failed to acquire cache lock: {}", e))
        })?;
        cache.get_or_compile(&self.engine, name, source)
    }

    /// Validate a script without executing it
    pub fn validate(&self, source: &str) -> Result<()> {
        self.engine
            .compile(source)
            .map(|_| ())
            .map_err(PipelineError::from_rhai_parse)
    }

    /// Compile `source` into a deferred function called `name`.
    pub fn function(&self, name: &str, source: &str) -> Result<DeferredFn> {
        let script = self.compile(name, source)?;
        let function = ScriptFunction {
            engine: Arc::clone(&self.engine),
            script,
        };
        Ok(DeferredFn::from_arc(name, Arc::new(function)))
    }

    /// Compile `source` and register it in `registry` under `name`.
    pub fn register(&self, registry: &mut FunctionRegistry, name: &str, source: &str) -> Result<DeferredFn> {
        let function = self.function(name, source)?;
        registry.insert(function.clone())?;
        Ok(function)
    }

    /// Compile and run a script once on concrete values.
    ///
    /// One-off scripts are not cached.
    pub fn eval(&self, source: &str, args: &[Value], kwargs: &Kwargs) -> anyhow::Result<Value> {
        let ast = self
            .engine
            .compile(source)
            .map_err(PipelineError::from_rhai_parse)?;
        let script = CompiledScript {
            ast,
            source: source.to_string(),
            name: "temp".to_string(),
        };
        run_script(&self.engine, &script, args, kwargs)
    }

    /// Get a reference to the underlying Rhai engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Get a reference to the shared cache
    pub fn cache(&self) -> &SharedScriptCache {
        &self.cache
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptEngine")
            .field("cache_size", &self.cache.read().map(|c| c.len()).ok())
            .finish()
    }
}

/// A compiled script bound to the engine that runs it
pub struct ScriptFunction {
    engine: Arc<Engine>,
    script: CompiledScript,
}

impl ScriptFunction {
    pub fn script(&self) -> &CompiledScript {
        &self.script
    }
}

impl ProcessFn for ScriptFunction {
    fn call(&self, args: &[Value], kwargs: &Kwargs) -> anyhow::Result<Value> {
        run_script(&self.engine, &self.script, args, kwargs)
    }
}

fn run_script(
    engine: &Engine,
    script: &CompiledScript,
    args: &[Value],
    kwargs: &Kwargs,
) -> anyhow::Result<Value> {
    let mut scope = Scope::new();
    let converted: Array = args.iter().map(to_dynamic).collect();
    for (i, value) in converted.iter().enumerate() {
        scope.push_dynamic(format!("x{i}"), value.clone());
    }
    scope.push("args", converted);
    for (name, value) in kwargs {
        scope.push_dynamic(name.clone(), to_dynamic(value));
    }

    let result = engine
        .eval_ast_with_scope::<Dynamic>(&mut scope, &script.ast)
        .map_err(|e| anyhow!("script `{}` failed: {}", script.name, e))?;
    from_dynamic(result)
}

fn numbers(arr: &Array) -> impl Iterator<Item = f64> + '_ {
    arr.iter().filter_map(|v| {
        v.as_float()
            .ok()
            .or_else(|| v.as_int().ok().map(|i| i as f64))
    })
}

/// Convert a value into a Rhai `Dynamic`
pub fn to_dynamic(value: &Value) -> Dynamic {
    match value {
        Value::Empty => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from(*b),
        Value::Int(i) => Dynamic::from(*i),
        Value::Float(f) => Dynamic::from(*f),
        Value::Str(s) => Dynamic::from(s.clone()),
        Value::List(items) => Dynamic::from_array(items.iter().map(to_dynamic).collect()),
        Value::Map(map) => {
            let converted: Map = map
                .iter()
                .map(|(k, v)| (k.as_str().into(), to_dynamic(v)))
                .collect();
            Dynamic::from_map(converted)
        }
        Value::Tensor(t) => {
            Dynamic::from_array(t.data().iter().map(|&v| Dynamic::from(v)).collect())
        }
    }
}

/// Convert a Rhai result back into a value
pub fn from_dynamic(value: Dynamic) -> anyhow::Result<Value> {
    if value.is_unit() {
        return Ok(Value::Empty);
    }
    if let Ok(b) = value.as_bool() {
        return Ok(Value::Bool(b));
    }
    if let Ok(i) = value.as_int() {
        return Ok(Value::Int(i));
    }
    if let Ok(f) = value.as_float() {
        return Ok(Value::Float(f));
    }
    if value.is_string() {
        return value
            .into_string()
            .map(Value::Str)
            .map_err(|t| anyhow!("cannot read string result of type {t}"));
    }
    if value.is_array() {
        let items = value
            .into_array()
            .map_err(|t| anyhow!("cannot read array result of type {t}"))?;
        return items
            .into_iter()
            .map(from_dynamic)
            .collect::<anyhow::Result<Vec<_>>>()
            .map(Value::List);
    }
    if value.is_map() {
        let type_name = value.type_name();
        let Some(map) = value.try_cast::<Map>() else {
            bail!("cannot read map result of type {type_name}");
        };
        let mut out = BTreeMap::new();
        for (k, v) in map {
            out.insert(k.to_string(), from_dynamic(v)?);
        }
        return Ok(Value::Map(out));
    }
    bail!("script returned unsupported type {}", value.type_name())
}
