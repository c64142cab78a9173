//! The deferred-execution wrapper and its dispatch protocol.

use crate::deferred::ExecutionMode;
use crate::error::{ContractViolation, PipelineError, Result};
use crate::pipeline::graph::Graph;
use crate::pipeline::id::NodeId;
use crate::pipeline::node::{ArgSlot, Invocation, NodeOp};
use crate::types::{Kwargs, Tensor, Value};
use std::fmt;
use std::sync::Arc;

/// A processing function: resolved positional values plus keyword arguments in,
/// one value out. Assumed free of side effects.
pub trait ProcessFn: Send + Sync {
    fn call(&self, args: &[Value], kwargs: &Kwargs) -> anyhow::Result<Value>;
}

impl<F> ProcessFn for F
where
    F: Fn(&[Value], &Kwargs) -> anyhow::Result<Value> + Send + Sync,
{
    fn call(&self, args: &[Value], kwargs: &Kwargs) -> anyhow::Result<Value> {
        self(args, kwargs)
    }
}

/// One positional argument of a deferred call.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A graph argument: becomes a parent of the new node.
    Node(NodeId),
    /// A plain argument, bound as-is.
    Value(Value),
    /// A plain sequence argument, resolved into `Value::List`.
    Seq(Vec<Arg>),
}

impl Arg {
    /// Find a node handle anywhere inside this argument.
    fn nested_node(&self) -> Option<NodeId> {
        match self {
            Arg::Node(id) => Some(*id),
            Arg::Value(_) => None,
            Arg::Seq(items) => items.iter().find_map(Arg::nested_node),
        }
    }

    /// Resolve a plain argument into a concrete value.
    fn into_value(self, function: &str) -> std::result::Result<Value, ContractViolation> {
        match self {
            Arg::Node(node) => Err(ContractViolation::UnresolvedNode {
                function: function.to_string(),
                node,
            }),
            Arg::Value(value) => Ok(value),
            Arg::Seq(items) => items
                .into_iter()
                .map(|item| item.into_value(function))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Value::List),
        }
    }
}

impl From<NodeId> for Arg {
    fn from(id: NodeId) -> Self {
        Arg::Node(id)
    }
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        Arg::Value(v)
    }
}

impl From<Vec<Arg>> for Arg {
    fn from(v: Vec<Arg>) -> Self {
        Arg::Seq(v)
    }
}

impl From<Deferral> for Arg {
    fn from(d: Deferral) -> Self {
        match d {
            Deferral::Node(id) => Arg::Node(id),
            Deferral::Value(v) => Arg::Value(v),
        }
    }
}

macro_rules! impl_arg_from_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Arg {
                fn from(v: $t) -> Self {
                    Arg::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_arg_from_value!(bool, i32, i64, usize, f64, &str, String, Tensor);

/// Outcome of a deferred call.
#[derive(Debug, Clone, PartialEq)]
pub enum Deferral {
    /// A function node was added to the graph.
    Node(NodeId),
    /// The function ran immediately (instant mode).
    Value(Value),
}

impl Deferral {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Deferral::Node(id) => Some(*id),
            Deferral::Value(_) => None,
        }
    }

    /// The handle of the built node; fails if the call executed immediately.
    pub fn into_node(self) -> Result<NodeId> {
        match self {
            Deferral::Node(id) => Ok(id),
            Deferral::Value(_) => Err(PipelineError::Construction(
                "call executed immediately, no node was built".to_string(),
            )),
        }
    }

    /// The computed value; `None` if a node was built instead.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Deferral::Node(_) => None,
            Deferral::Value(v) => Some(v),
        }
    }
}

/// Arguments of a deferred call split into graph and plain arguments.
pub(crate) struct Partition {
    /// Graph arguments in encountered order.
    pub graph_args: Vec<NodeId>,
    /// Every argument in original order, plain ones resolved.
    pub layout: Vec<ArgSlot>,
}

impl Partition {
    pub fn plain_values(&self) -> Vec<Value> {
        self.layout
            .iter()
            .filter_map(|slot| match slot {
                ArgSlot::Plain(v) => Some(v.clone()),
                ArgSlot::Graph => None,
            })
            .collect()
    }
}

/// Split `args` preserving relative order. Requires at least one graph argument.
pub(crate) fn partition(function: &str, args: Vec<Arg>) -> Result<Partition> {
    let mut graph_args = Vec::new();
    let mut layout = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Arg::Node(id) => {
                graph_args.push(id);
                layout.push(ArgSlot::Graph);
            }
            plain => layout.push(ArgSlot::Plain(plain.into_value(function)?)),
        }
    }
    if graph_args.is_empty() {
        return Err(ContractViolation::NoGraphArgument {
            function: function.to_string(),
        }
        .into());
    }
    Ok(Partition { graph_args, layout })
}

/// A processing function wrapped for deferred execution.
#[derive(Clone)]
pub struct DeferredFn {
    name: Arc<str>,
    func: Arc<dyn ProcessFn>,
}

impl DeferredFn {
    /// Wrap `func` under `name`.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value], &Kwargs) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::from_arc(name, Arc::new(func))
    }

    pub fn from_arc(name: impl Into<String>, func: Arc<dyn ProcessFn>) -> Self {
        Self {
            name: Arc::from(name.into()),
            func,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the underlying function directly on concrete values.
    pub fn invoke(&self, args: &[Value], kwargs: &Kwargs) -> anyhow::Result<Value> {
        self.func.call(args, kwargs)
    }

    /// Dispatch a call without keyword arguments.
    pub fn call(&self, graph: &mut Graph, args: Vec<Arg>) -> Result<Deferral> {
        self.call_with(graph, args, Kwargs::new())
    }

    /// Dispatch a call.
    ///
    /// With at least one node argument a new function node is built whose
    /// parents are the node arguments in encountered order. It will compute
    /// `f(*resolved, *plain, **kwargs)`. Without node arguments, the call is
    /// rejected in deferred mode and executed immediately in instant mode.
    pub fn call_with(&self, graph: &mut Graph, args: Vec<Arg>, kwargs: Kwargs) -> Result<Deferral> {
        let has_graph_arg = args.iter().any(|a| matches!(a, Arg::Node(_)));

        if !has_graph_arg {
            if graph.mode() == ExecutionMode::Deferred {
                return Err(ContractViolation::NoGraphArgument {
                    function: self.name().to_string(),
                }
                .into());
            }
            if let Some(node) = args.iter().find_map(Arg::nested_node) {
                return Err(ContractViolation::UnresolvedNode {
                    function: self.name().to_string(),
                    node,
                }
                .into());
            }
            let values = args
                .into_iter()
                .map(|a| a.into_value(self.name()))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            tracing::trace!("Instant execution of `{}`", self.name());
            let value = self
                .invoke(&values, &kwargs)
                .map_err(|e| PipelineError::Execution {
                    node: NodeId::INVALID,
                    name: self.name().to_string(),
                    source: e.into(),
                })?;
            return Ok(Deferral::Value(value));
        }

        let partition = partition(self.name(), args)?;
        let bound = partition.plain_values();
        let op = NodeOp::Call(Invocation::new(self.clone(), bound, kwargs));
        let id = graph.add_node(Some(op), partition.graph_args, None)?;
        tracing::trace!("Deferred `{}` as {}", self.name(), id);
        Ok(Deferral::Node(id))
    }
}

impl fmt::Debug for DeferredFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredFn")
            .field("name", &self.name)
            .finish()
    }
}
