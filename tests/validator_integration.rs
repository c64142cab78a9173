//! Integration tests for built-in functions and validators inside pipelines

mod common;

use common::assert_float_eq;
use common::mock_helpers::CountingValidator;
use lazypipe_rs::scripting::{builtins, ScriptEngine};
use lazypipe_rs::validator::{MeanVarValidator, MinMaxValidator, ShapeValidator, TypeValidator};
use lazypipe_rs::{
    args, FunctionRegistry, Graph, NodeId, Pipeline, PipelineError, Tensor, ValidationError,
    Value, ValueKind,
};

fn signal() -> Value {
    Value::Tensor(Tensor::from_rows(vec![vec![2.0, 4.0, 6.0], vec![0.0, 8.0, 10.0]]).unwrap())
}

/// `rpad_rcut(rescale(x), 5)`
fn signal_pipeline(registry: &FunctionRegistry) -> (Graph, NodeId, Pipeline) {
    let mut graph = Graph::new();
    let x = graph.input_node("signal");
    let scaled = registry
        .get("rescale")
        .unwrap()
        .call(&mut graph, args![x])
        .unwrap()
        .into_node()
        .unwrap();
    let padded = registry
        .get("rpad_rcut")
        .unwrap()
        .call(&mut graph, args![scaled, 5])
        .unwrap()
        .into_node()
        .unwrap();
    let pipeline = Pipeline::new(&graph, x, padded).unwrap();
    (graph, scaled, pipeline)
}

#[test]
fn test_builtin_chain_passes_validators() {
    let registry = FunctionRegistry::with_builtins().unwrap();
    let (mut graph, _, mut pipeline) = signal_pipeline(&registry);
    pipeline.add_validator(TypeValidator::new([ValueKind::Tensor]), 0).unwrap();
    pipeline.add_validator(ShapeValidator::new([2, 5]), 0).unwrap();
    pipeline
        .add_validator(MinMaxValidator::new(Some(0.0), Some(1.0)).unwrap(), 0)
        .unwrap();

    let result = pipeline.call(&mut graph, [signal()]).unwrap();
    let tensor = result.as_tensor().unwrap();
    assert_eq!(tensor.shape(), &[2, 5]);
    assert_float_eq(tensor.get(&[0, 0]), 0.2, 1e-12);
    assert_float_eq(tensor.get(&[1, 2]), 1.0, 1e-12);
    assert_eq!(tensor.get(&[0, 4]), 0.0);
}

#[test]
fn test_shape_validator_rejects_wrong_length() {
    let registry = FunctionRegistry::with_builtins().unwrap();
    let (mut graph, _, mut pipeline) = signal_pipeline(&registry);
    pipeline.add_validator(ShapeValidator::new([2, 4]), 0).unwrap();

    let err = pipeline.call(&mut graph, [signal()]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation of output 0 failed at validator #0: \
         Invalid shape, expected : [2, 4], received : [2, 5]."
    );
}

#[test]
fn test_min_max_validator_on_custom_range() {
    let registry = FunctionRegistry::with_builtins().unwrap();
    let mut graph = Graph::new();
    let x = graph.input_node("x");
    let scaled = registry
        .get("rescale")
        .unwrap()
        .call(&mut graph, args![x, -1.0, 1.0])
        .unwrap()
        .into_node()
        .unwrap();
    let mut pipeline = Pipeline::new(&graph, x, scaled).unwrap();
    pipeline
        .add_validator(MinMaxValidator::new(Some(0.0), None).unwrap(), 0)
        .unwrap();

    match pipeline.call(&mut graph, [signal()]).unwrap_err() {
        PipelineError::Validation { source, .. } => {
            assert_eq!(
                source.message(),
                "Min of data is -1, this is less than 0, defined by user."
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_mean_var_validator_on_intermediate_output() {
    let registry = FunctionRegistry::with_builtins().unwrap();
    let (mut graph, scaled, full) = signal_pipeline(&registry);
    let x = full.inputs()[0];

    // the rescaled data (before padding) has mean 0.5
    let mut pipeline = Pipeline::new(&graph, x, scaled).unwrap();
    pipeline
        .add_validator(MeanVarValidator::mean(0.5).with_mean(0.5, 0.01), 0)
        .unwrap();
    pipeline.call(&mut graph, [signal()]).unwrap();

    let mut strict = Pipeline::new(&graph, x, scaled).unwrap();
    strict
        .add_validator(MeanVarValidator::var(0.0).with_var(0.0, 0.01), 0)
        .unwrap();
    assert!(matches!(
        strict.call(&mut graph, [signal()]),
        Err(PipelineError::Validation { .. })
    ));
}

#[test]
fn test_builtin_failure_reports_node() {
    let registry = FunctionRegistry::with_builtins().unwrap();
    let (mut graph, scaled, pipeline) = signal_pipeline(&registry);
    let constant = Value::Tensor(Tensor::full(vec![2, 3], 4.0));

    match pipeline.call(&mut graph, [constant]).unwrap_err() {
        PipelineError::Execution { node, name, source } => {
            assert_eq!(node, scaled);
            assert_eq!(name, "rescale");
            assert!(source.to_string().contains("Data range is zero"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_script_function_inside_pipeline() {
    let engine = ScriptEngine::new();
    let mut registry = FunctionRegistry::with_builtins().unwrap();
    let center = engine.register(&mut registry, "center", builtins::CENTER).unwrap();

    let mut graph = Graph::new();
    let x = graph.input_node("x");
    let centered = center.call(&mut graph, args![x]).unwrap().into_node().unwrap();
    let mut pipeline = Pipeline::new(&graph, x, centered).unwrap();

    let counter = CountingValidator::default();
    pipeline.add_validator(counter.clone(), 0).unwrap();
    pipeline.add_validator(TypeValidator::new([ValueKind::List]), 0).unwrap();
    pipeline
        .add_validator(MeanVarValidator::mean(0.0).with_mean(0.0, 1e-9), 0)
        .unwrap();

    let data = Value::Tensor(Tensor::from_vec(vec![1.0, 2.0, 6.0]));
    let result = pipeline.call(&mut graph, [data.clone()]).unwrap();
    assert_eq!(
        result,
        Value::List(vec![Value::Float(-2.0), Value::Float(-1.0), Value::Float(3.0)])
    );
    pipeline.call(&mut graph, [data]).unwrap();
    assert_eq!(counter.calls(), 2);
}

#[test]
fn test_closure_validator() {
    let registry = FunctionRegistry::with_builtins().unwrap();
    let (mut graph, _, mut pipeline) = signal_pipeline(&registry);
    pipeline
        .add_validator(
            |data: &Value| match data.shape() {
                Some(shape) if shape[0] == 3 => Ok(()),
                _ => Err(ValidationError::new("expected 3 channels")),
            },
            0,
        )
        .unwrap();

    let err = pipeline.call(&mut graph, [signal()]).unwrap_err();
    assert!(err.to_string().ends_with("expected 3 channels"));
}
