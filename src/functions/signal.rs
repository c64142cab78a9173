//! Length adjustment of 2-D `(channels, samples)` signals.

use super::ArgReader;
use crate::types::{Kwargs, Tensor, Value};
use anyhow::ensure;

fn signal_args<'a>(
    function: &'static str,
    args: &'a [Value],
    kwargs: &'a Kwargs,
) -> anyhow::Result<(&'a Tensor, usize)> {
    let reader = ArgReader::new(function, args, kwargs);
    let data = reader.tensor(0, "data")?;
    ensure!(
        data.ndim() == 2,
        "signal should be a 2D array of shape (channels, samples), got shape {:?}",
        data.shape()
    );
    let desired = reader.usize_or(1, "desired_length", None)?;
    Ok((data, desired))
}

/// Copy `columns` columns of `data` starting at `from`, placed at column
/// `offset` of a zero-filled `(rows, width)` tensor.
fn place_columns(data: &Tensor, from: usize, columns: usize, width: usize, offset: usize) -> Tensor {
    let rows = data.shape()[0];
    let mut out = Tensor::zeros(vec![rows, width]);
    for r in 0..rows {
        for c in 0..columns {
            out.set(&[r, offset + c], data.get(&[r, from + c]));
        }
    }
    out
}

/// Zero-pad on the right, or keep the first `desired_length` samples.
pub fn rpad_rcut(args: &[Value], kwargs: &Kwargs) -> anyhow::Result<Value> {
    let (data, desired) = signal_args("rpad_rcut", args, kwargs)?;
    let length = data.shape()[1];
    let kept = length.min(desired);
    Ok(Value::Tensor(place_columns(data, 0, kept, desired, 0)))
}

/// Zero-pad on the left, or keep the last `desired_length` samples.
pub fn lpad_lcut(args: &[Value], kwargs: &Kwargs) -> anyhow::Result<Value> {
    let (data, desired) = signal_args("lpad_lcut", args, kwargs)?;
    let length = data.shape()[1];
    let out = if length < desired {
        place_columns(data, 0, length, desired, desired - length)
    } else {
        place_columns(data, length - desired, desired, desired, 0)
    };
    Ok(Value::Tensor(out))
}

/// Zero-pad evenly on both sides (the odd sample goes right), or keep the
/// first `desired_length` samples.
pub fn center_pad_rcut(args: &[Value], kwargs: &Kwargs) -> anyhow::Result<Value> {
    let (data, desired) = signal_args("center_pad_rcut", args, kwargs)?;
    let length = data.shape()[1];
    let out = if length < desired {
        place_columns(data, 0, length, desired, (desired - length) / 2)
    } else {
        place_columns(data, 0, desired, desired, 0)
    };
    Ok(Value::Tensor(out))
}
