use crate::pipeline::id::NodeId;

/// Compiled execution plan for a pipeline.
/// Contains every ancestor of the outputs, dependency-first.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    /// Planned nodes in topological order
    pub order: Vec<NodeId>,

    /// Compilation statistics
    pub stats: PlanStats,

    /// Declared inputs that no output depends on
    pub unreachable_inputs: Vec<NodeId>,

    /// Planned nodes that `execute` will skip (op without parents or parents without op)
    pub inert_nodes: Vec<NodeId>,
}

/// Statistics about the compiled plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanStats {
    /// Total number of nodes in the graph at compile time
    pub total_nodes: usize,

    /// Number of nodes in the execution order
    pub planned_nodes: usize,

    /// Number of input nodes in the execution order
    pub input_nodes: usize,

    /// Number of planned nodes that compute nothing
    pub inert_nodes: usize,

    /// Compilation time in microseconds
    pub compile_time_us: u64,
}

impl ExecutionPlan {
    /// Check if the plan has any nodes
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Position of `id` in the execution order
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.order.iter().position(|&n| n == id)
    }
}
