use super::{numeric_data, ValidationError, Validator};
use crate::error::{PipelineError, Result};
use crate::types::{mean, variance, Value};

/// Checks that the mean and/or population variance of numeric data stay
/// within a gap of their targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanVarValidator {
    target_mean: Option<f64>,
    max_mean_gap: f64,
    target_var: Option<f64>,
    max_var_gap: f64,
}

impl MeanVarValidator {
    pub const DEFAULT_GAP: f64 = 1.0;

    pub fn new(
        target_mean: Option<f64>,
        max_mean_gap: f64,
        target_var: Option<f64>,
        max_var_gap: f64,
    ) -> Result<Self> {
        if target_mean.is_none() && target_var.is_none() {
            return Err(PipelineError::Construction(
                "Both target_mean and target_var cannot be None".to_string(),
            ));
        }
        Ok(Self {
            target_mean,
            max_mean_gap,
            target_var,
            max_var_gap,
        })
    }

    /// Mean check only, with the default gap.
    pub fn mean(target: f64) -> Self {
        Self {
            target_mean: Some(target),
            max_mean_gap: Self::DEFAULT_GAP,
            target_var: None,
            max_var_gap: Self::DEFAULT_GAP,
        }
    }

    /// Variance check only, with the default gap.
    pub fn var(target: f64) -> Self {
        Self {
            target_mean: None,
            max_mean_gap: Self::DEFAULT_GAP,
            target_var: Some(target),
            max_var_gap: Self::DEFAULT_GAP,
        }
    }

    pub fn with_mean(mut self, target: f64, max_gap: f64) -> Self {
        self.target_mean = Some(target);
        self.max_mean_gap = max_gap;
        self
    }

    pub fn with_var(mut self, target: f64, max_gap: f64) -> Self {
        self.target_var = Some(target);
        self.max_var_gap = max_gap;
        self
    }
}

fn check_gap(label: &str, actual: f64, target: f64, gap: f64) -> std::result::Result<(), ValidationError> {
    if (actual - target).abs() > gap {
        return Err(ValidationError::new(format!(
            "{label} of data is {actual}, this is out of interval [{}, {}], defined by user.",
            target - gap,
            target + gap
        )));
    }
    Ok(())
}

impl Validator for MeanVarValidator {
    fn validate(&self, data: &Value) -> std::result::Result<(), ValidationError> {
        let numbers = numeric_data(data)?;
        if let (Some(target), Some(actual)) = (self.target_mean, mean(&numbers)) {
            check_gap("Mean", actual, target, self.max_mean_gap)?;
        }
        if let (Some(target), Some(actual)) = (self.target_var, variance(&numbers)) {
            check_gap("Var", actual, target, self.max_var_gap)?;
        }
        Ok(())
    }
}
