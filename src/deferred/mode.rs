//! Execution mode and the scoped instant-execution toggle.

use crate::pipeline::graph::Graph;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// How a deferred function treats a call without node arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Calls must contain a node argument and always build a node.
    #[default]
    Deferred,
    /// Calls without node arguments run the function immediately.
    Instant,
}

/// Scope guard returned by [`Graph::instant_execution`].
///
/// Dereferences to the graph. Dropping the guard restores the mode that was
/// active before the scope, whether the scope ends normally, through an
/// early `?` return, or by unwinding.
pub struct InstantScope<'g> {
    graph: &'g mut Graph,
    previous: ExecutionMode,
}

impl<'g> InstantScope<'g> {
    pub(crate) fn enter(graph: &'g mut Graph) -> Self {
        let previous = graph.mode();
        graph.set_mode(ExecutionMode::Instant);
        tracing::trace!("Entered instant execution scope (previous mode {:?})", previous);
        Self { graph, previous }
    }
}

impl Deref for InstantScope<'_> {
    type Target = Graph;

    fn deref(&self) -> &Graph {
        self.graph
    }
}

impl DerefMut for InstantScope<'_> {
    fn deref_mut(&mut self) -> &mut Graph {
        self.graph
    }
}

impl Drop for InstantScope<'_> {
    fn drop(&mut self) {
        self.graph.set_mode(self.previous);
        tracing::trace!("Left instant execution scope, mode restored to {:?}", self.previous);
    }
}
