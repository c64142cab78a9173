use super::{ValidationError, Validator};
use crate::types::Value;

/// Accepts values whose shape equals the expected shape.
///
/// Tensors report their shape. Rectangular nested lists report every
/// level, so `[[1, 2], [3, 4]]` is `[2, 2]`. Any other value has no shape
/// and is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeValidator {
    shape: Vec<usize>,
}

impl ShapeValidator {
    pub fn new(shape: impl IntoIterator<Item = usize>) -> Self {
        Self {
            shape: shape.into_iter().collect(),
        }
    }
}

impl Validator for ShapeValidator {
    fn validate(&self, data: &Value) -> Result<(), ValidationError> {
        let shape = data
            .shape()
            .ok_or_else(|| ValidationError::new("data must have a shape."))?;
        if shape != self.shape {
            return Err(ValidationError::new(format!(
                "Invalid shape, expected : {:?}, received : {:?}.",
                self.shape, shape
            )));
        }
        Ok(())
    }
}
