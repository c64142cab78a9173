//! Image layout helpers. Images are `(height, width)` or
//! `(height, width, channels)` tensors unless stated otherwise.

use super::ArgReader;
use crate::types::{Kwargs, Tensor, Value};
use anyhow::{bail, ensure};

/// Centre the image in a `target_shape` array filled with `fill_value`.
pub fn padding_2d(args: &[Value], kwargs: &Kwargs) -> anyhow::Result<Value> {
    let reader = ArgReader::new("padding_2d", args, kwargs);
    let data = reader.tensor(0, "data")?;
    let [target_h, target_w] = reader.pair(1, "target_shape")?;
    let fill_value = reader.f64_or(2, "fill_value", 1.0)?;

    let shape = data.shape();
    let (h, w, channels) = match *shape {
        [h, w] => (h, w, None),
        [h, w, c] => (h, w, Some(c)),
        _ => bail!("Input data must be 2D or 3D array"),
    };
    ensure!(
        h <= target_h && w <= target_w,
        "Data shape must be smaller than target shape to add padding, \
         target : {:?} ; data shape : {:?}",
        [target_h, target_w],
        shape
    );

    let top = (target_h - h) / 2;
    let left = (target_w - w) / 2;
    let out = match channels {
        None => {
            let mut out = Tensor::full(vec![target_h, target_w], fill_value);
            for r in 0..h {
                for c in 0..w {
                    out.set(&[top + r, left + c], data.get(&[r, c]));
                }
            }
            out
        }
        Some(depth) => {
            let mut out = Tensor::full(vec![target_h, target_w, depth], fill_value);
            for r in 0..h {
                for c in 0..w {
                    for k in 0..depth {
                        out.set(&[top + r, left + c, k], data.get(&[r, c, k]));
                    }
                }
            }
            out
        }
    };
    Ok(Value::Tensor(out))
}

/// Convert to `channel_number_target` channels.
///
/// Grayscale images (2-D or single channel) are repeated on every channel.
/// Images with too few channels get the missing ones set to `fill_value`,
/// images with too many are truncated.
pub fn image_to_channel_num(args: &[Value], kwargs: &Kwargs) -> anyhow::Result<Value> {
    let reader = ArgReader::new("image_to_channel_num", args, kwargs);
    let image = reader.tensor(0, "image")?;
    let target = reader.usize_or(1, "channel_number_target", Some(3))?;
    let fill_value = reader.f64_or(2, "fill_value", 0.0)?;

    let (h, w, channels) = match *image.shape() {
        [h, w] => (h, w, 1),
        [h, w, c] => (h, w, c),
        _ => bail!("image must be a 2D or 3D array, got shape {:?}", image.shape()),
    };
    let grayscale = image.ndim() == 2 || channels == 1;

    let mut out = Tensor::full(vec![h, w, target], fill_value);
    for r in 0..h {
        for c in 0..w {
            for k in 0..target {
                let source = if grayscale {
                    Some(image.data()[(r * w + c) * channels])
                } else if k < channels {
                    Some(image.get(&[r, c, k]))
                } else {
                    None
                };
                if let Some(v) = source {
                    out.set(&[r, c, k], v);
                }
            }
        }
    }
    Ok(Value::Tensor(out))
}

/// Permute the axes of a 3-D tensor: output axis `i` is input axis `axes[i]`.
fn transpose3(data: &Tensor, axes: [usize; 3]) -> Tensor {
    let shape = data.shape();
    let out_shape = vec![shape[axes[0]], shape[axes[1]], shape[axes[2]]];
    let mut out = Tensor::zeros(out_shape.clone());
    for i in 0..out_shape[0] {
        for j in 0..out_shape[1] {
            for k in 0..out_shape[2] {
                let mut src = [0usize; 3];
                src[axes[0]] = i;
                src[axes[1]] = j;
                src[axes[2]] = k;
                out.set(&[i, j, k], data.get(&src));
            }
        }
    }
    out
}

fn three_d<'a>(function: &'static str, args: &'a [Value], kwargs: &'a Kwargs) -> anyhow::Result<&'a Tensor> {
    let data = ArgReader::new(function, args, kwargs).tensor(0, "data")?;
    ensure!(data.ndim() == 3, "input data must be dim 3");
    Ok(data)
}

pub fn image_hwc_to_chw(args: &[Value], kwargs: &Kwargs) -> anyhow::Result<Value> {
    let data = three_d("image_hwc_to_chw", args, kwargs)?;
    Ok(Value::Tensor(transpose3(data, [2, 0, 1])))
}

pub fn image_chw_to_hwc(args: &[Value], kwargs: &Kwargs) -> anyhow::Result<Value> {
    let data = three_d("image_chw_to_hwc", args, kwargs)?;
    Ok(Value::Tensor(transpose3(data, [1, 2, 0])))
}
