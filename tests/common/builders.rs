//! Test graph builders

use lazypipe_rs::{args, DeferredFn, FunctionRegistry, Graph, Kwargs, NodeId, Pipeline, Value};

fn int_arg(args: &[Value], i: usize) -> anyhow::Result<i64> {
    args.get(i)
        .and_then(Value::as_int)
        .ok_or_else(|| anyhow::anyhow!("argument {} must be an int, got {:?}", i, args.get(i)))
}

/// Registry with integer `add`, `sub`, `mul` and a `pair` function returning a 2-element list
pub fn arithmetic_registry() -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();
    registry
        .register("add", |args: &[Value], _: &Kwargs| {
            Ok(Value::Int(int_arg(args, 0)? + int_arg(args, 1)?))
        })
        .unwrap();
    registry
        .register("sub", |args: &[Value], _: &Kwargs| {
            Ok(Value::Int(int_arg(args, 0)? - int_arg(args, 1)?))
        })
        .unwrap();
    registry
        .register("mul", |args: &[Value], _: &Kwargs| {
            Ok(Value::Int(int_arg(args, 0)? * int_arg(args, 1)?))
        })
        .unwrap();
    registry
        .register("pair", |args: &[Value], _: &Kwargs| {
            let x = int_arg(args, 0)?;
            Ok(Value::List(vec![Value::Int(x), Value::Int(x * 10)]))
        })
        .unwrap();
    registry
}

pub fn function(registry: &FunctionRegistry, name: &str) -> DeferredFn {
    registry
        .get(name)
        .cloned()
        .unwrap_or_else(|| panic!("function {name} is not registered"))
}

/// `Pipeline([a, b], [add(a, b), sub(a, b)])`
pub struct SumDiff {
    pub graph: Graph,
    pub a: NodeId,
    pub b: NodeId,
    pub sum: NodeId,
    pub diff: NodeId,
    pub pipeline: Pipeline,
}

impl SumDiff {
    pub fn build() -> Self {
        let registry = arithmetic_registry();
        let mut graph = Graph::new();
        let a = graph.input_node("a");
        let b = graph.input_node("b");
        let sum = function(&registry, "add")
            .call(&mut graph, args![a, b])
            .unwrap()
            .into_node()
            .unwrap();
        let diff = function(&registry, "sub")
            .call(&mut graph, args![a, b])
            .unwrap()
            .into_node()
            .unwrap();
        let pipeline = Pipeline::new(&graph, [a, b], [sum, diff]).unwrap();
        Self {
            graph,
            a,
            b,
            sum,
            diff,
            pipeline,
        }
    }
}
