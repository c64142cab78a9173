//! Rhai Scripting Engine for Processing Functions
//!
//! This module lets users define processing functions as Rhai scripts and
//! use them like any other deferred function.
//!
//! ## Script Variables
//!
//! The following variables are available in a script:
//!
//! - `args` - Array of every positional argument
//! - `x0`, `x1`, ... - The positional arguments one by one
//! - every keyword argument, under its own name
//!
//! Numbers, booleans and strings map to their Rhai counterparts, lists to
//! arrays, maps to object maps and tensors to flat float arrays. The value of
//! the last expression is the result; `()` becomes an empty value.
//!
//! ## Helper Functions
//!
//! - `sum(array)`, `mean(array)`, `min_of(array)`, `max_of(array)` - Array statistics
//! - `abs`, `sqrt`, `pow`, `exp`, `ln`, `floor`, `ceil`, `round` - Math on floats
//! - `clamp(x, min, max)`, `lerp(a, b, t)`, `map_range(x, in_min, in_max, out_min, out_max)`
//!
//! ## Example Scripts
//!
//! Scaling with a keyword argument:
//! ```rhai
//! x0 * gain
//! ```
//!
//! Centering an array:
//! ```rhai
//! let m = mean(x0);
//! x0.map(|v| v - m)
//! ```

mod engine;

pub use engine::{ScriptEngine, ScriptFunction};

use crate::error::{PipelineError, Result};
use rhai::{Engine, AST};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A compiled script that can be executed efficiently
#[derive(Clone)]
pub struct CompiledScript {
    /// The compiled AST
    ast: AST,
    /// Script source text
    source: String,
    /// Name/identifier for this script
    name: String,
}

impl CompiledScript {
    /// Get the source code of this script
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Get the name of this script
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for CompiledScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledScript")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish()
    }
}

/// Cache for compiled scripts to avoid recompilation
#[derive(Default)]
pub struct ScriptCache {
    /// Map from script source to its AST
    cache: HashMap<String, AST>,
}

impl ScriptCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached script or compile and cache it
    pub fn get_or_compile(&mut self, engine: &Engine, name: &str, source: &str) -> Result<CompiledScript> {
        let ast = match self.cache.get(source) {
            Some(ast) => ast.clone(),
            None => {
                let ast = engine.compile(source).map_err(PipelineError::from_rhai_parse)?;
                self.cache.insert(source.to_string(), ast.clone());
                ast
            }
        };
        Ok(CompiledScript {
            ast,
            source: source.to_string(),
            name: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Drop the compiled form of `source`
    pub fn invalidate(&mut self, source: &str) {
        self.cache.remove(source);
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

/// Thread-safe script cache wrapper
pub type SharedScriptCache = Arc<RwLock<ScriptCache>>;

/// Built-in processing scripts
pub mod builtins {
    /// Multiply the data by `gain`
    pub const GAIN: &str = "x0 * gain";

    /// Subtract the mean of an array from every element
    pub const CENTER: &str = r#"
let m = mean(x0);
x0.map(|v| v - m)
"#;

    /// Clip every element of an array to [0, 1]
    pub const CLIP_UNIT: &str = r#"
x0.map(|v| clamp(v, 0.0, 1.0))
"#;

    /// Sum of all positional arguments
    pub const SUM_ARGS: &str = r#"
let total = 0.0;
for a in args { total += a; }
total
"#;

    /// List of all built-in scripts with their function names
    pub fn all() -> Vec<(&'static str, &'static str)> {
        vec![
            ("gain", GAIN),
            ("center", CENTER),
            ("clip_unit", CLIP_UNIT),
            ("sum_args", SUM_ARGS),
        ]
    }
}
