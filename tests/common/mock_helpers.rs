//! Validator helpers

use lazypipe_rs::{ValidationError, Validator, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Rejects every value
pub struct RejectAll;

impl Validator for RejectAll {
    fn validate(&self, _data: &Value) -> Result<(), ValidationError> {
        Err(ValidationError::new("always rejected"))
    }
}

/// Accepts every value and counts how often it ran
#[derive(Clone, Default)]
pub struct CountingValidator {
    calls: Arc<AtomicUsize>,
}

impl CountingValidator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Validator for CountingValidator {
    fn validate(&self, _data: &Value) -> Result<(), ValidationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
