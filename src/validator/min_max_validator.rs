use super::{numeric_data, ValidationError, Validator};
use crate::error::{PipelineError, Result};
use crate::types::Value;

/// Bounds check on the smallest and largest element of numeric data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxValidator {
    min: Option<f64>,
    max: Option<f64>,
}

impl MinMaxValidator {
    /// At least one bound is required.
    pub fn new(min_value: Option<f64>, max_value: Option<f64>) -> Result<Self> {
        if min_value.is_none() && max_value.is_none() {
            return Err(PipelineError::Construction(
                "Both min_value and max_value cannot be None".to_string(),
            ));
        }
        Ok(Self {
            min: min_value,
            max: max_value,
        })
    }
}

impl Validator for MinMaxValidator {
    fn validate(&self, data: &Value) -> std::result::Result<(), ValidationError> {
        let numbers = numeric_data(data)?;
        if let Some(min) = self.min {
            let data_min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
            if data_min < min {
                return Err(ValidationError::new(format!(
                    "Min of data is {data_min}, this is less than {min}, defined by user."
                )));
            }
        }
        if let Some(max) = self.max {
            let data_max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if data_max > max {
                return Err(ValidationError::new(format!(
                    "Max of data is {data_max}, this is more than {max}, defined by user."
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tensor;

    #[test]
    fn test_requires_a_bound() {
        assert!(matches!(
            MinMaxValidator::new(None, None),
            Err(PipelineError::Construction(_))
        ));
    }

    #[test]
    fn test_bounds() {
        let validator = MinMaxValidator::new(Some(0.0), Some(1.0)).unwrap();
        let ok = Value::Tensor(Tensor::from_vec(vec![0.0, 0.5, 1.0]));
        assert!(validator.validate(&ok).is_ok());

        let high = Value::Tensor(Tensor::from_vec(vec![0.5, 0.8, 1.2]));
        assert_eq!(
            validator.validate(&high).unwrap_err().message(),
            "Max of data is 1.2, this is more than 1, defined by user."
        );

        let low = Value::List(vec![Value::Float(-0.5), Value::Int(1)]);
        assert!(validator
            .validate(&low)
            .unwrap_err()
            .message()
            .starts_with("Min of data is -0.5"));
    }

    #[test]
    fn test_only_min_is_checked() {
        let validator = MinMaxValidator::new(Some(0.0), None).unwrap();
        assert!(validator.validate(&Value::Float(1e9)).is_ok());
        assert!(validator.validate(&Value::from("x")).is_err());
    }
}
