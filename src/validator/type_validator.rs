use super::{ValidationError, Validator};
use crate::types::{Value, ValueKind};

/// Accepts values whose kind is one of the accepted kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeValidator {
    kinds: Vec<ValueKind>,
}

impl TypeValidator {
    pub fn new(kinds: impl IntoIterator<Item = ValueKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }
}

impl Validator for TypeValidator {
    fn validate(&self, data: &Value) -> Result<(), ValidationError> {
        let kind = data.kind();
        if self.kinds.contains(&kind) {
            return Ok(());
        }
        let accepted: Vec<String> = self.kinds.iter().map(ToString::to_string).collect();
        Err(ValidationError::new(format!(
            "data must be type : [{}], not {}",
            accepted.join(", "),
            kind
        )))
    }
}
