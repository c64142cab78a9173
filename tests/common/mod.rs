//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use lazypipe_rs::Value;

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Unpack a multi-output result
pub fn outputs(value: Value) -> Vec<Value> {
    match value {
        Value::List(items) => items,
        other => panic!("expected a list of outputs, got {:?}", other),
    }
}
