//! The graph arena: owns every node and the execution-mode context.

use crate::config::ExecutionSettings;
use crate::deferred::{ExecutionMode, InstantScope};
use crate::error::{PipelineError, Result};
use crate::pipeline::id::{GraphId, NodeId};
use crate::pipeline::node::{Node, NodeOp};
use crate::pipeline::snapshot::TopologySnapshot;
use crate::types::{ItemKey, Value};
use std::time::Instant;

/// Arena of nodes addressed by [`NodeId`].
///
/// Nodes are only ever appended. A node's parents must already be in the
/// arena when it is added, so the graph is acyclic by construction.
#[derive(Debug)]
pub struct Graph {
    id: GraphId,
    nodes: Vec<Node>,
    mode: ExecutionMode,
    trace_timings: bool,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self {
            id: GraphId::next(),
            nodes: Vec::new(),
            mode: ExecutionMode::default(),
            trace_timings: false,
        }
    }

    /// Graph using the execution settings of an [`EngineConfig`](crate::config::EngineConfig).
    pub fn with_config(settings: &ExecutionSettings) -> Self {
        Self {
            mode: settings.default_mode,
            trace_timings: settings.trace_node_timings,
            ..Self::new()
        }
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub(crate) fn set_mode(&mut self, mode: ExecutionMode) {
        self.mode = mode;
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    // ── Construction ──

    /// Append a node. Every parent must already exist.
    pub fn add_node(
        &mut self,
        op: Option<NodeOp>,
        parents: Vec<NodeId>,
        name: Option<String>,
    ) -> Result<NodeId> {
        if let Some(unknown) = parents.iter().find(|p| !self.contains(**p)) {
            return Err(PipelineError::Construction(format!(
                "parent {unknown} does not belong to this graph"
            )));
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            name,
            op,
            parents,
            ..Node::default()
        });
        Ok(id)
    }

    /// Add an input node named `"Input <name>"`.
    pub fn input_node(&mut self, name: &str) -> NodeId {
        let label = if name.is_empty() {
            "Input".to_string()
        } else {
            format!("Input {name}")
        };
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            name: Some(label),
            ..Node::default()
        });
        id
    }

    /// Node `id[key]`, evaluated when the pipeline runs.
    pub fn get_item(&mut self, id: NodeId, key: impl Into<ItemKey>) -> Result<NodeId> {
        self.add_node(Some(NodeOp::GetItem(key.into())), vec![id], None)
    }

    /// Record that the value of `id` is an indexable of `n` items.
    pub fn unwrap(&mut self, id: NodeId, n: usize) -> Result<NodeId> {
        self.node_mut(id)?.unwrap_count = Some(n);
        Ok(id)
    }

    /// One `get_item` node per element, in index order.
    ///
    /// Fails with [`PipelineError::NotUnwrapped`] unless [`unwrap`](Self::unwrap)
    /// recorded the length first.
    pub fn items(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        let count = self
            .node(id)?
            .unwrap_count
            .ok_or(PipelineError::NotUnwrapped(id))?;
        (0..count).map(|i| self.get_item(id, i)).collect()
    }

    // ── Access ──

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.index())
            .ok_or_else(|| unknown_node(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.index())
            .ok_or_else(|| unknown_node(id))
    }

    /// Last computed or assigned value of `id`.
    pub fn value(&self, id: NodeId) -> Result<&Value> {
        Ok(&self.node(id)?.value)
    }

    pub fn parents(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.node(id)?.parents)
    }

    pub fn set_value(&mut self, id: NodeId, value: impl Into<Value>) -> Result<()> {
        self.node_mut(id)?.value = value.into();
        Ok(())
    }

    // ── Execution ──

    /// Compute the value of `id` from its parents' current values.
    ///
    /// Only nodes with an operation and at least one parent compute anything;
    /// every other node is left untouched. Ancestors are not executed.
    pub fn execute(&mut self, id: NodeId) -> Result<()> {
        let node = self.node(id)?;
        let op = match (&node.op, node.parents.is_empty()) {
            (Some(op), false) => op.clone(),
            _ => return Ok(()),
        };
        let resolved = node
            .parents
            .iter()
            .map(|p| self.nodes[p.index()].value.clone())
            .collect();

        let start = self.trace_timings.then(Instant::now);
        let value = op.apply(self, resolved).map_err(|source| PipelineError::Execution {
            node: id,
            name: self.nodes[id.index()].label(),
            source,
        })?;
        if let Some(start) = start {
            tracing::trace!(
                "Executed {} ({}) in {:?}",
                id,
                op.describe(),
                start.elapsed()
            );
        }
        self.nodes[id.index()].value = value;
        Ok(())
    }

    // ── Mode ──

    /// Enter an instant-execution scope.
    ///
    /// While the returned guard lives, deferred calls without node arguments
    /// run immediately. The previous mode is restored when it is dropped.
    pub fn instant_execution(&mut self) -> InstantScope<'_> {
        InstantScope::enter(self)
    }

    /// Closure form of [`instant_execution`](Self::instant_execution).
    pub fn with_instant_execution<T>(&mut self, f: impl FnOnce(&mut Graph) -> T) -> T {
        let mut scope = self.instant_execution();
        f(&mut *scope)
    }

    /// Serializable view of the current topology.
    pub fn snapshot(&self) -> TopologySnapshot {
        TopologySnapshot::capture(self)
    }
}

fn unknown_node(id: NodeId) -> PipelineError {
    PipelineError::Construction(format!("{id} does not belong to this graph"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionSettings;
    use crate::deferred::DeferredFn;
    use crate::pipeline::node::Invocation;
    use crate::types::Kwargs;

    fn double() -> DeferredFn {
        DeferredFn::new("double", |args: &[Value], _: &Kwargs| {
            Ok(Value::Int(args[0].as_int().unwrap_or(0) * 2))
        })
    }

    #[test]
    fn test_input_node_names() {
        let mut graph = Graph::new();
        let a = graph.input_node("a");
        let anon = graph.input_node("");
        assert_eq!(graph.node(a).unwrap().name(), Some("Input a"));
        assert_eq!(graph.node(anon).unwrap().name(), Some("Input"));
        assert!(graph.node(a).unwrap().is_input());
        assert_eq!(graph.value(a).unwrap(), &Value::Empty);
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let mut graph = Graph::new();
        let err = graph.add_node(None, vec![NodeId(7)], None).unwrap_err();
        assert!(matches!(err, PipelineError::Construction(_)));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_execute_uses_parent_values_only() {
        let mut graph = Graph::new();
        let a = graph.input_node("a");
        let op = NodeOp::Call(Invocation::new(double(), Vec::new(), Kwargs::new()));
        let b = graph.add_node(Some(op.clone()), vec![a], None).unwrap();
        let c = graph.add_node(Some(op), vec![b], None).unwrap();

        graph.set_value(a, 4).unwrap();
        graph.execute(c).unwrap();
        // b was never executed, so c doubled an empty value
        assert_eq!(graph.value(b).unwrap(), &Value::Empty);
        assert_eq!(graph.value(c).unwrap(), &Value::Int(0));

        graph.execute(b).unwrap();
        graph.execute(c).unwrap();
        assert_eq!(graph.value(c).unwrap(), &Value::Int(16));
    }

    #[test]
    fn test_execute_is_noop_for_inert_nodes() {
        let mut graph = Graph::new();
        let a = graph.input_node("a");
        let passthrough = graph.add_node(None, vec![a], None).unwrap();
        let orphan_op = NodeOp::GetItem(ItemKey::Index(0));
        let orphan = graph.add_node(Some(orphan_op), Vec::new(), None).unwrap();

        graph.set_value(a, 1).unwrap();
        graph.execute(passthrough).unwrap();
        graph.execute(orphan).unwrap();
        graph.execute(a).unwrap();
        assert_eq!(graph.value(passthrough).unwrap(), &Value::Empty);
        assert_eq!(graph.value(orphan).unwrap(), &Value::Empty);
        assert_eq!(graph.value(a).unwrap(), &Value::Int(1));
    }

    #[test]
    fn test_get_item_failure_names_the_node() {
        let mut graph = Graph::new();
        let a = graph.input_node("a");
        let item = graph.get_item(a, 0).unwrap();
        graph.set_value(a, 3.5).unwrap();

        match graph.execute(item).unwrap_err() {
            PipelineError::Execution { node, name, .. } => {
                assert_eq!(node, item);
                assert_eq!(name, "__getitem__[0]");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_items_requires_unwrap() {
        let mut graph = Graph::new();
        let a = graph.input_node("a");
        assert!(matches!(
            graph.items(a),
            Err(PipelineError::NotUnwrapped(id)) if id == a
        ));

        assert_eq!(graph.unwrap(a, 3).unwrap(), a);
        let items = graph.items(a).unwrap();
        assert_eq!(items.len(), 3);
        for (i, item) in items.iter().enumerate() {
            assert_eq!(graph.parents(*item).unwrap(), &[a]);
            assert!(matches!(
                graph.node(*item).unwrap().op(),
                Some(NodeOp::GetItem(ItemKey::Index(k))) if *k == i as i64
            ));
        }
    }

    #[test]
    fn test_with_config_sets_mode() {
        let settings = ExecutionSettings {
            default_mode: ExecutionMode::Instant,
            trace_node_timings: true,
        };
        let graph = Graph::with_config(&settings);
        assert_eq!(graph.mode(), ExecutionMode::Instant);
        assert_ne!(graph.id(), Graph::new().id());
    }

    #[test]
    fn test_with_instant_execution_restores_mode() {
        let mut graph = Graph::new();
        let value = graph
            .with_instant_execution(|g| double().call(g, crate::args![21]))
            .unwrap();
        assert_eq!(value.into_value(), Some(Value::Int(42)));
        assert_eq!(graph.mode(), ExecutionMode::Deferred);
    }
}
