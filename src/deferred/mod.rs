//! Deferred execution of processing functions.
//!
//! A [`DeferredFn`] wraps a plain processing function. Calling it with at
//! least one node handle among its positional arguments does not run the
//! function: it adds a function node to the graph and returns its handle.
//! The function runs later, when a [`Pipeline`](crate::pipeline::Pipeline)
//! executes that node with concrete inputs.
//!
//! ```ignore
//! use lazypipe_rs::{args, DeferredFn, Graph, Pipeline, Value};
//!
//! let add = DeferredFn::new("add", |args: &[Value], _: &_| {
//!     Ok(Value::Int(args[0].as_int().unwrap_or(0) + args[1].as_int().unwrap_or(0)))
//! });
//!
//! let mut graph = Graph::new();
//! let a = graph.input_node("a");
//! let b = graph.input_node("b");
//! let sum = add.call(&mut graph, args![a, b])?.into_node()?;
//!
//! let pipeline = Pipeline::new(&graph, [a, b], sum)?;
//! assert_eq!(pipeline.call(&mut graph, [20, 10])?, Value::Int(30));
//! ```
//!
//! # Execution modes
//!
//! Calls without any node argument are a contract violation in the default
//! [`ExecutionMode::Deferred`] mode. Inside an
//! [`instant_execution`](crate::pipeline::Graph::instant_execution) scope the
//! function runs immediately instead. The mode belongs to the graph, so
//! scopes on different graphs never interfere.

mod mode;
mod registry;
mod wrapper;

pub use mode::{ExecutionMode, InstantScope};
pub use registry::FunctionRegistry;
pub use wrapper::{Arg, Deferral, DeferredFn, ProcessFn};

pub(crate) use wrapper::partition;

/// Build a `Vec<Arg>` from node handles and plain values.
///
/// ```ignore
/// let scaled = rescale.call(&mut graph, args![input, 0.0, 2.0])?;
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::deferred::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::deferred::Arg::from($arg)),+]
    };
}
