//! # lazypipe-rs: Lazy Data-Processing Pipelines
//!
//! Build a computation graph by calling processing functions on node handles,
//! then run it many times with concrete inputs. A call whose arguments contain
//! a node does not execute: it adds a function node and returns its handle.
//! A [`Pipeline`] fixes the inputs, the outputs and the execution order of
//! everything in between, and checks each output with its validators.
//!
//! ## Architecture
//!
//! - **Graph**: Arena of nodes addressed by `NodeId`, plus the execution mode
//! - **Deferred functions**: `DeferredFn` builds nodes or, in instant mode, runs directly
//! - **Pipeline**: Compiled execution plan, per-output validators, nesting via `as_deferred`
//! - **Functions**: Built-in tensor transforms and Rhai-scripted functions
//!
//! ## Configuration
//!
//! An optional TOML file under the platform config directory (`dev.hxyulin.lazypipe-rs`)
//! sets the default execution mode and the logging filter.
//!
//! ## Example
//!
//! ```ignore
//! use lazypipe_rs::{args, FunctionRegistry, Graph, Pipeline, Tensor, Value};
//! use lazypipe_rs::validator::MinMaxValidator;
//!
//! let registry = FunctionRegistry::with_builtins()?;
//! let rescale = registry.get("rescale").unwrap();
//! let pad = registry.get("rpad_rcut").unwrap();
//!
//! let mut graph = Graph::new();
//! let signal = graph.input_node("signal");
//! let scaled = rescale.call(&mut graph, args![signal])?.into_node()?;
//! let padded = pad.call(&mut graph, args![scaled, 16])?.into_node()?;
//!
//! let mut pipeline = Pipeline::new(&graph, signal, padded)?;
//! pipeline.add_validator(MinMaxValidator::new(Some(0.0), Some(1.0))?, 0)?;
//!
//! let data = Tensor::from_rows(vec![vec![2.0, 4.0, 6.0]])?;
//! let out = pipeline.call(&mut graph, [Value::Tensor(data)])?;
//! ```

pub mod config;
pub mod deferred;
pub mod error;
pub mod functions;
pub mod logging;
pub mod pipeline;
pub mod scripting;
pub mod types;
pub mod validator;

// Re-export commonly used types
pub use config::EngineConfig;
pub use deferred::{Arg, Deferral, DeferredFn, ExecutionMode, FunctionRegistry};
pub use error::{PipelineError, Result};
pub use pipeline::{Graph, NodeId, Pipeline};
pub use types::{ItemKey, Kwargs, Tensor, Value, ValueKind};
pub use validator::{ValidationError, Validator};
