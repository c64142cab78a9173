//! Pipeline executor: fixed-order execution of a graph's ancestors.
//!
//! A pipeline is built once over designated input and output nodes. Each call:
//! 1. Check the number of arguments against the inputs.
//! 2. Assign the arguments to the input nodes, in declared order.
//! 3. Execute the planned nodes in topological order.
//! 4. Read every output and run its validators.
//! 5. Return one value, or a list when there are several outputs.

use crate::deferred::{partition, Arg};
use crate::error::{PipelineError, Result};
use crate::pipeline::compiled_plan::ExecutionPlan;
use crate::pipeline::compiler::PlanCompiler;
use crate::pipeline::graph::Graph;
use crate::pipeline::id::{GraphId, NodeId};
use crate::pipeline::node::{NestedPipeline, NodeOp};
use crate::types::Value;
use crate::validator::Validator;
use std::fmt;
use std::sync::Arc;

/// Ordered list of node handles accepted by [`Pipeline::new`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeList(pub Vec<NodeId>);

impl From<NodeId> for NodeList {
    fn from(id: NodeId) -> Self {
        NodeList(vec![id])
    }
}

impl From<Vec<NodeId>> for NodeList {
    fn from(ids: Vec<NodeId>) -> Self {
        NodeList(ids)
    }
}

impl From<&Vec<NodeId>> for NodeList {
    fn from(ids: &Vec<NodeId>) -> Self {
        NodeList(ids.clone())
    }
}

impl From<&[NodeId]> for NodeList {
    fn from(ids: &[NodeId]) -> Self {
        NodeList(ids.to_vec())
    }
}

impl<const N: usize> From<[NodeId; N]> for NodeList {
    fn from(ids: [NodeId; N]) -> Self {
        NodeList(ids.to_vec())
    }
}

/// A compiled, callable view over part of a graph.
#[derive(Clone)]
pub struct Pipeline {
    graph_id: GraphId,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
    /// One list per output, in registration order.
    validators: Vec<Vec<Arc<dyn Validator>>>,
    plan: ExecutionPlan,
}

impl Pipeline {
    /// Build a pipeline and fix its execution order.
    ///
    /// Only ancestors of `outputs` are planned; an input that no output
    /// depends on is still assigned on every call but never read.
    pub fn new(
        graph: &Graph,
        inputs: impl Into<NodeList>,
        outputs: impl Into<NodeList>,
    ) -> Result<Self> {
        let NodeList(inputs) = inputs.into();
        let NodeList(outputs) = outputs.into();

        if let Some(unknown) = inputs.iter().chain(&outputs).find(|id| !graph.contains(**id)) {
            return Err(PipelineError::Construction(format!(
                "{unknown} does not belong to this graph"
            )));
        }

        let plan = PlanCompiler::compile(graph, &inputs, &outputs);

        tracing::debug!(
            "Compiled pipeline: {}/{} nodes planned ({} inputs, {} outputs) in {}µs",
            plan.stats.planned_nodes,
            plan.stats.total_nodes,
            inputs.len(),
            outputs.len(),
            plan.stats.compile_time_us,
        );
        for &input in &plan.unreachable_inputs {
            tracing::warn!("Input {} does not feed any output", input);
        }
        for &node in &plan.inert_nodes {
            tracing::warn!(
                "Node {} ({}) has parents or an operation but not both; it will not be computed",
                node,
                graph.node(node)?.label()
            );
        }

        Ok(Self {
            graph_id: graph.id(),
            validators: vec![Vec::new(); outputs.len()],
            inputs,
            outputs,
            plan,
        })
    }

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    /// Total number of registered validators.
    pub fn num_validators(&self) -> usize {
        self.validators.iter().map(Vec::len).sum()
    }

    /// Append a validator to the output at `output_index`.
    pub fn add_validator(
        &mut self,
        validator: impl Validator + 'static,
        output_index: usize,
    ) -> Result<()> {
        self.add_validator_arc(Arc::new(validator), output_index)
    }

    /// Shared-ownership form of [`add_validator`](Self::add_validator).
    pub fn add_validator_arc(
        &mut self,
        validator: Arc<dyn Validator>,
        output_index: usize,
    ) -> Result<()> {
        let num_outputs = self.outputs.len();
        let list = self.validators.get_mut(output_index).ok_or_else(|| {
            PipelineError::Construction(format!(
                "validator index {output_index} is out of range for {num_outputs} output(s)"
            ))
        })?;
        list.push(validator);
        Ok(())
    }

    /// Run the pipeline on concrete inputs.
    ///
    /// Nodes executed before a failure keep their new values and every
    /// other node keeps its previous one.
    pub fn call<I>(&self, graph: &mut Graph, args: I) -> Result<Value>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        if graph.id() != self.graph_id {
            return Err(PipelineError::Construction(
                "pipeline was built from a different graph".to_string(),
            ));
        }

        let args: Vec<Value> = args.into_iter().map(Into::into).collect();
        if args.len() != self.inputs.len() {
            return Err(PipelineError::Arity {
                expected: self.inputs.len(),
                given: args.len(),
            });
        }

        tracing::debug!("Running {}", self);

        for (&input, value) in self.inputs.iter().zip(args) {
            graph.set_value(input, value)?;
        }

        for &node in &self.plan.order {
            graph.execute(node)?;
        }

        let mut results = Vec::with_capacity(self.outputs.len());
        for (output_index, (&output, validators)) in
            self.outputs.iter().zip(&self.validators).enumerate()
        {
            let value = graph.value(output)?;
            for (position, validator) in validators.iter().enumerate() {
                validator
                    .validate(value)
                    .map_err(|source| PipelineError::Validation {
                        output_index,
                        position,
                        source,
                    })?;
            }
            results.push(value.clone());
        }

        if results.len() == 1 {
            Ok(results.swap_remove(0))
        } else {
            Ok(Value::List(results))
        }
    }

    /// Use this pipeline as a single node of `graph`.
    ///
    /// Node arguments become the parents of the new node. When executed, the
    /// node calls a snapshot of this pipeline, validators included, with the
    /// parents' values interleaved with the plain arguments in their original
    /// positional order.
    pub fn as_deferred(&self, graph: &mut Graph, args: Vec<Arg>) -> Result<NodeId> {
        let partition = partition("Pipeline::as_deferred", args)?;
        let nested = NestedPipeline {
            pipeline: Arc::new(self.clone()),
            layout: partition.layout.into(),
        };
        graph.add_node(Some(NodeOp::Pipeline(nested)), partition.graph_args, None)
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pipeline(num_inputs = {}, num_outputs = {}, num_validators = {})",
            self.inputs.len(),
            self.outputs.len(),
            self.num_validators()
        )
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("num_validators", &self.num_validators())
            .field("plan", &self.plan.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::deferred::DeferredFn;
    use crate::error::ContractViolation;
    use crate::types::Kwargs;
    use crate::validator::{MockValidator, ValidationError};

    fn add() -> DeferredFn {
        DeferredFn::new("add", |args: &[Value], _: &Kwargs| {
            Ok(Value::Int(args.iter().filter_map(Value::as_int).sum()))
        })
    }

    fn build() -> (Graph, Pipeline) {
        let mut graph = Graph::new();
        let a = graph.input_node("a");
        let b = graph.input_node("b");
        let sum = add().call(&mut graph, args![a, b]).unwrap().into_node().unwrap();
        let pipeline = Pipeline::new(&graph, [a, b], sum).unwrap();
        (graph, pipeline)
    }

    #[test]
    fn test_single_output_returns_value() {
        let (mut graph, pipeline) = build();
        assert_eq!(pipeline.call(&mut graph, [20, 10]).unwrap(), Value::Int(30));
        // values persist until the next call
        assert_eq!(pipeline.call(&mut graph, [1, 2]).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_display() {
        let (_, mut pipeline) = build();
        pipeline
            .add_validator(crate::validator::TypeValidator::new([crate::types::ValueKind::Int]), 0)
            .unwrap();
        assert_eq!(
            pipeline.to_string(),
            "Pipeline(num_inputs = 2, num_outputs = 1, num_validators = 1)"
        );
    }

    #[test]
    fn test_validator_index_out_of_range() {
        let (_, mut pipeline) = build();
        let err = pipeline.add_validator(MockValidator::new(), 1).unwrap_err();
        assert!(matches!(err, PipelineError::Construction(_)));
    }

    #[test]
    fn test_unknown_handles_are_rejected() {
        let graph = Graph::new();
        let err = Pipeline::new(&graph, NodeId(0), NodeId(1)).unwrap_err();
        assert!(matches!(err, PipelineError::Construction(_)));
    }

    #[test]
    fn test_foreign_graph_is_rejected() {
        let (_, pipeline) = build();
        let mut other = Graph::new();
        other.input_node("a");
        other.input_node("b");
        let err = pipeline.call(&mut other, [1, 2]).unwrap_err();
        assert!(matches!(err, PipelineError::Construction(_)));
    }

    #[test]
    fn test_validators_stop_at_first_failure() {
        let (mut graph, mut pipeline) = build();

        let mut first = MockValidator::new();
        first.expect_validate().times(1).returning(|_| Ok(()));
        let mut second = MockValidator::new();
        second
            .expect_validate()
            .times(1)
            .returning(|_| Err(ValidationError::new("rejected")));
        let mut third = MockValidator::new();
        third.expect_validate().never();

        pipeline.add_validator(first, 0).unwrap();
        pipeline.add_validator(second, 0).unwrap();
        pipeline.add_validator(third, 0).unwrap();

        match pipeline.call(&mut graph, [1, 1]).unwrap_err() {
            PipelineError::Validation {
                output_index,
                position,
                source,
            } => {
                assert_eq!(output_index, 0);
                assert_eq!(position, 1);
                assert_eq!(source.message(), "rejected");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validator_sees_output_value() {
        let (mut graph, mut pipeline) = build();
        let mut validator = MockValidator::new();
        validator
            .expect_validate()
            .withf(|data| *data == Value::Int(7))
            .times(1)
            .returning(|_| Ok(()));
        pipeline.add_validator(validator, 0).unwrap();
        assert_eq!(pipeline.call(&mut graph, [3, 4]).unwrap(), Value::Int(7));
    }

    #[test]
    fn test_as_deferred_requires_node_argument() {
        let (mut graph, pipeline) = build();
        let err = pipeline.as_deferred(&mut graph, args![1, 2]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Contract(ContractViolation::NoGraphArgument { .. })
        ));
    }

    #[test]
    fn test_as_deferred_interleaves_plain_arguments() {
        let sub = DeferredFn::new("sub", |args: &[Value], _: &Kwargs| {
            Ok(Value::Int(
                args[0].as_int().unwrap_or(0) - args[1].as_int().unwrap_or(0),
            ))
        });
        let mut graph = Graph::new();
        let a = graph.input_node("a");
        let b = graph.input_node("b");
        let diff = sub.call(&mut graph, args![a, b]).unwrap().into_node().unwrap();
        let inner = Pipeline::new(&graph, [a, b], diff).unwrap();

        let x = graph.input_node("x");
        // inner(100, x)
        let nested = inner.as_deferred(&mut graph, args![100, x]).unwrap();
        let outer = Pipeline::new(&graph, x, nested).unwrap();

        assert_eq!(outer.call(&mut graph, [30]).unwrap(), Value::Int(70));
        assert_eq!(
            graph.node(nested).unwrap().label(),
            "Pipeline(num_inputs = 2, num_outputs = 1, num_validators = 0)"
        );
    }
}
