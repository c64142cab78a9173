use super::compiled_plan::{ExecutionPlan, PlanStats};
use super::graph::Graph;
use super::id::NodeId;

/// Compiles the ancestors of a set of outputs into an execution plan
pub struct PlanCompiler;

impl PlanCompiler {
    /// Compile the execution order for `outputs`.
    ///
    /// Depth-first post-order from a synthetic sink whose parents are the
    /// outputs: parents are visited in order before their child, every node
    /// is emitted once, and only ancestors of the outputs are kept. The sink
    /// itself is never emitted.
    ///
    /// All handles must belong to `graph`.
    pub fn compile(graph: &Graph, inputs: &[NodeId], outputs: &[NodeId]) -> ExecutionPlan {
        let start_time = std::time::Instant::now();
        let nodes = graph.nodes();

        let order = Self::post_order(graph, outputs);

        let mut planned = vec![false; nodes.len()];
        for id in &order {
            planned[id.index()] = true;
        }

        let unreachable_inputs: Vec<NodeId> = inputs
            .iter()
            .filter(|id| !planned[id.index()])
            .copied()
            .collect();

        let inert_nodes: Vec<NodeId> = order
            .iter()
            .filter(|id| nodes[id.index()].is_inert())
            .copied()
            .collect();

        let stats = PlanStats {
            total_nodes: nodes.len(),
            planned_nodes: order.len(),
            input_nodes: order
                .iter()
                .filter(|id| nodes[id.index()].is_input())
                .count(),
            inert_nodes: inert_nodes.len(),
            compile_time_us: start_time.elapsed().as_micros() as u64,
        };

        ExecutionPlan {
            order,
            stats,
            unreachable_inputs,
            inert_nodes,
        }
    }

    /// Iterative depth-first post-order over parent links
    fn post_order(graph: &Graph, outputs: &[NodeId]) -> Vec<NodeId> {
        let nodes = graph.nodes();
        let mut visited = vec![false; nodes.len()];
        let mut order = Vec::new();
        // (node, index of the next parent to visit)
        let mut stack: Vec<(NodeId, usize)> = Vec::new();

        for &output in outputs {
            if visited[output.index()] {
                continue;
            }
            visited[output.index()] = true;
            stack.push((output, 0));

            while let Some(&(node, next)) = stack.last() {
                let parents = &nodes[node.index()].parents;
                if let Some(&parent) = parents.get(next) {
                    if let Some(top) = stack.last_mut() {
                        top.1 += 1;
                    }
                    if !visited[parent.index()] {
                        visited[parent.index()] = true;
                        stack.push((parent, 0));
                    }
                } else {
                    stack.pop();
                    order.push(node);
                }
            }
        }

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::node::NodeOp;
    use crate::types::ItemKey;
    use proptest::prelude::*;

    fn item() -> Option<NodeOp> {
        Some(NodeOp::GetItem(ItemKey::Index(0)))
    }

    #[test]
    fn test_compile_linear() {
        // a -> b -> c
        let mut graph = Graph::new();
        let a = graph.input_node("a");
        let b = graph.add_node(item(), vec![a], None).unwrap();
        let c = graph.add_node(item(), vec![b], None).unwrap();

        let plan = PlanCompiler::compile(&graph, &[a], &[c]);
        assert_eq!(plan.order, vec![a, b, c]);
        assert_eq!(plan.stats.planned_nodes, 3);
        assert_eq!(plan.stats.input_nodes, 1);
        assert!(plan.unreachable_inputs.is_empty());
    }

    #[test]
    fn test_compile_diamond() {
        // a -> b, a -> c, (b, c) -> d
        let mut graph = Graph::new();
        let a = graph.input_node("a");
        let b = graph.add_node(item(), vec![a], None).unwrap();
        let c = graph.add_node(item(), vec![a], None).unwrap();
        let d = graph.add_node(item(), vec![b, c], None).unwrap();

        let plan = PlanCompiler::compile(&graph, &[a], &[d]);
        assert_eq!(plan.order, vec![a, b, c, d]);
    }

    #[test]
    fn test_compile_skips_unrelated_nodes() {
        let mut graph = Graph::new();
        let a = graph.input_node("a");
        let unused = graph.input_node("unused");
        let side = graph.add_node(item(), vec![unused], None).unwrap();
        let out = graph.add_node(item(), vec![a], None).unwrap();

        let plan = PlanCompiler::compile(&graph, &[a, unused], &[out]);
        assert_eq!(plan.order, vec![a, out]);
        assert_eq!(plan.unreachable_inputs, vec![unused]);
        assert_eq!(plan.stats.total_nodes, 4);
        assert!(plan.position(side).is_none());
    }

    #[test]
    fn test_compile_shared_output_and_intermediate() {
        // out1 is also a parent of out2
        let mut graph = Graph::new();
        let a = graph.input_node("a");
        let out1 = graph.add_node(item(), vec![a], None).unwrap();
        let out2 = graph.add_node(item(), vec![out1, a], None).unwrap();

        let plan = PlanCompiler::compile(&graph, &[a], &[out2, out1]);
        assert_eq!(plan.order, vec![a, out1, out2]);
    }

    #[test]
    fn test_compile_reports_inert_nodes() {
        let mut graph = Graph::new();
        let a = graph.input_node("a");
        let passthrough = graph.add_node(None, vec![a], None).unwrap();

        let plan = PlanCompiler::compile(&graph, &[a], &[passthrough]);
        assert_eq!(plan.inert_nodes, vec![passthrough]);
        assert_eq!(plan.stats.inert_nodes, 1);
    }

    /// Random DAG: node `i` takes parents from nodes `< i`.
    fn build_random_graph(parent_picks: &[Vec<usize>]) -> Graph {
        let mut graph = Graph::new();
        for (i, picks) in parent_picks.iter().enumerate() {
            if i == 0 || picks.is_empty() {
                graph.input_node(&i.to_string());
                continue;
            }
            let parents = picks.iter().map(|p| NodeId((p % i) as u32)).collect();
            graph.add_node(item(), parents, None).unwrap();
        }
        graph
    }

    proptest! {
        #[test]
        fn prop_plan_is_topological_and_unique(
            parent_picks in prop::collection::vec(prop::collection::vec(0usize..64, 0..4), 1..40),
            output_picks in prop::collection::vec(0usize..64, 1..4),
        ) {
            let graph = build_random_graph(&parent_picks);
            let outputs: Vec<NodeId> = output_picks
                .iter()
                .map(|p| NodeId((p % graph.len()) as u32))
                .collect();

            let plan = PlanCompiler::compile(&graph, &[], &outputs);

            let mut seen = std::collections::HashSet::new();
            for id in &plan.order {
                prop_assert!(seen.insert(*id), "duplicate {:?}", id);
            }
            for (pos, id) in plan.order.iter().enumerate() {
                for parent in graph.parents(*id).unwrap() {
                    let parent_pos = plan.position(*parent);
                    prop_assert!(parent_pos.is_some_and(|p| p < pos));
                }
            }
            for output in &outputs {
                prop_assert!(plan.position(*output).is_some());
            }
        }
    }
}
