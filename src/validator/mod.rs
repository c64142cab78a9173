//! Output validators.
//!
//! A pipeline holds one ordered list of validators per output. After every
//! call, each output value is handed to its validators in registration order
//! and the first rejection aborts the call with
//! [`PipelineError::Validation`](crate::error::PipelineError::Validation).
//!
//! Anything implementing [`Validator`] can be registered, including closures
//! of type `Fn(&Value) -> Result<(), ValidationError>`.

mod mean_var_validator;
mod min_max_validator;
mod shape_validator;
mod type_validator;

pub use mean_var_validator::MeanVarValidator;
pub use min_max_validator::MinMaxValidator;
pub use shape_validator::ShapeValidator;
pub use type_validator::TypeValidator;

use crate::types::Value;
use thiserror::Error;

/// Rejection raised by a validator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Check applied to a pipeline output after execution.
#[cfg_attr(test, mockall::automock)]
pub trait Validator: Send + Sync {
    /// Accept `data` or describe why it is rejected.
    fn validate(&self, data: &Value) -> Result<(), ValidationError>;
}

impl<F> Validator for F
where
    F: Fn(&Value) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(&self, data: &Value) -> Result<(), ValidationError> {
        self(data)
    }
}

/// Flattened numbers of `data`, or a rejection naming its kind.
fn numeric_data(data: &Value) -> Result<Vec<f64>, ValidationError> {
    match data.numbers() {
        Some(numbers) if !numbers.is_empty() => Ok(numbers),
        Some(_) => Err(ValidationError::new("data has no elements.")),
        None => Err(ValidationError::new(format!(
            "data must be numeric, not {}",
            data.kind()
        ))),
    }
}
