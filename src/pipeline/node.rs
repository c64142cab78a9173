//! Node abstraction for the graph arena.
//!
//! A node is a plain record: an optional operation, the ordered handles of
//! its parents, a value slot and an optional unwrap count. Operations are
//! tagged records:
//!
//! - **`Call`**: a deferred function plus the plain arguments bound at
//!   construction time.
//! - **`GetItem`**: indexed access into the single parent's value.
//! - **`Pipeline`**: a whole pipeline used as one node.

use crate::deferred::DeferredFn;
use crate::error::{NodeFailure, Result};
use crate::pipeline::executor::Pipeline;
use crate::pipeline::graph::Graph;
use crate::pipeline::id::NodeId;
use crate::types::{ItemKey, Kwargs, Value};
use std::sync::Arc;

/// A deferred function call bound to its plain arguments.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub function: DeferredFn,
    /// Plain positional arguments, appended after the resolved parent values.
    pub bound: Arc<[Value]>,
    pub kwargs: Arc<Kwargs>,
}

impl Invocation {
    pub fn new(function: DeferredFn, bound: Vec<Value>, kwargs: Kwargs) -> Self {
        Self {
            function,
            bound: bound.into(),
            kwargs: Arc::new(kwargs),
        }
    }

    /// Call `f(*resolved, *bound, **kwargs)`.
    fn invoke(&self, mut resolved: Vec<Value>) -> anyhow::Result<Value> {
        resolved.extend(self.bound.iter().cloned());
        self.function.invoke(&resolved, &self.kwargs)
    }
}

/// Position of an argument in a deferred pipeline call.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgSlot {
    /// Filled with the next resolved parent value.
    Graph,
    /// Captured at construction time.
    Plain(Value),
}

/// A pipeline embedded in a larger graph as a single node.
#[derive(Debug, Clone)]
pub struct NestedPipeline {
    pub pipeline: Arc<Pipeline>,
    pub layout: Arc<[ArgSlot]>,
}

impl NestedPipeline {
    /// Interleave resolved parent values with the captured plain arguments
    /// in their original positional order and run the pipeline.
    fn invoke(&self, graph: &mut Graph, resolved: Vec<Value>) -> Result<Value> {
        let mut resolved = resolved.into_iter();
        let args: Vec<Value> = self
            .layout
            .iter()
            .map(|slot| match slot {
                ArgSlot::Graph => resolved.next().unwrap_or_default(),
                ArgSlot::Plain(value) => value.clone(),
            })
            .collect();
        self.pipeline.call(graph, args)
    }
}

/// Operation computed by a function node.
#[derive(Debug, Clone)]
pub enum NodeOp {
    Call(Invocation),
    GetItem(ItemKey),
    Pipeline(NestedPipeline),
}

impl NodeOp {
    /// Short human-readable description, used in logs and snapshots.
    pub fn describe(&self) -> String {
        match self {
            NodeOp::Call(inv) => inv.function.name().to_string(),
            NodeOp::GetItem(key) => format!("__getitem__[{key}]"),
            NodeOp::Pipeline(nested) => nested.pipeline.to_string(),
        }
    }

    /// Apply the operation to the parents' resolved values, in parent order.
    pub(crate) fn apply(
        &self,
        graph: &mut Graph,
        resolved: Vec<Value>,
    ) -> std::result::Result<Value, NodeFailure> {
        match self {
            NodeOp::Call(inv) => inv.invoke(resolved).map_err(NodeFailure::from),
            NodeOp::GetItem(key) => {
                let parent = resolved.first().unwrap_or(&Value::Empty);
                parent.get_item(key).map_err(NodeFailure::from)
            }
            NodeOp::Pipeline(nested) => nested.invoke(graph, resolved).map_err(NodeFailure::from),
        }
    }
}

/// A vertex of the graph arena.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub(crate) name: Option<String>,
    pub(crate) op: Option<NodeOp>,
    pub(crate) parents: Vec<NodeId>,
    pub(crate) value: Value,
    pub(crate) unwrap_count: Option<usize>,
}

impl Node {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn op(&self) -> Option<&NodeOp> {
        self.op.as_ref()
    }

    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    /// Last computed or assigned value; `Value::Empty` until then.
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn unwrap_count(&self) -> Option<usize> {
        self.unwrap_count
    }

    /// Input nodes have neither an operation nor parents.
    pub fn is_input(&self) -> bool {
        self.op.is_none() && self.parents.is_empty()
    }

    /// Nodes that `execute` skips although they are wired into the graph.
    pub fn is_inert(&self) -> bool {
        self.op.is_none() != self.parents.is_empty()
    }

    /// Name if set, otherwise the operation description.
    pub fn label(&self) -> String {
        match (&self.name, &self.op) {
            (Some(name), _) => name.clone(),
            (None, Some(op)) => op.describe(),
            (None, None) => "node".to_string(),
        }
    }
}
