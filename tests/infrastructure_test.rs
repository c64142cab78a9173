//! Test to verify test infrastructure works correctly

mod common;

use common::builders::{arithmetic_registry, SumDiff};
use lazypipe_rs::Value;

#[test]
fn test_infrastructure_setup() {
    let registry = arithmetic_registry();
    assert_eq!(
        registry.names().collect::<Vec<_>>(),
        vec!["add", "mul", "pair", "sub"]
    );

    let fixture = SumDiff::build();
    assert_eq!(fixture.graph.len(), 4);
    assert_eq!(fixture.graph.value(fixture.sum).unwrap(), &Value::Empty);
}

#[test]
fn test_float_comparison() {
    common::assert_float_eq(1.0, 1.0000001, 0.001);
}

#[test]
#[should_panic]
fn test_float_comparison_fails() {
    common::assert_float_eq(1.0, 2.0, 0.001);
}
