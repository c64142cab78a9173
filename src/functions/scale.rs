use super::ArgReader;
use crate::types::{Kwargs, Value};
use anyhow::{anyhow, bail};

/// Linearly map the data range onto `[min_value, max_value]`.
pub fn rescale(args: &[Value], kwargs: &Kwargs) -> anyhow::Result<Value> {
    let reader = ArgReader::new("rescale", args, kwargs);
    let data = reader.tensor(0, "data")?;
    let min_value = reader.f64_or(1, "min_value", 0.0)?;
    let max_value = reader.f64_or(2, "max_value", 1.0)?;

    let data_min = data.min().ok_or_else(|| anyhow!("cannot rescale an empty array"))?;
    let data_max = data.max().ok_or_else(|| anyhow!("cannot rescale an empty array"))?;
    let data_range = data_max - data_min;
    if data_range == 0.0 {
        bail!("Data range is zero, cannot rescale a constant array.");
    }
    let factor = (max_value - min_value) / data_range;
    Ok(Value::Tensor(data.map(|v| (v - data_min) * factor + min_value)))
}
