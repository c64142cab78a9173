//! Image files and resampling through the `image` crate.

use super::ArgReader;
use crate::types::{Kwargs, Tensor, Value};
use ::image::imageops::{self, FilterType};
use ::image::{ImageBuffer, Luma};
use anyhow::{anyhow, bail, ensure, Context};

/// Read an image file as a `(height, width, 3)` RGB tensor with values in `[0, 255]`.
pub fn open_rgb_image(args: &[Value], kwargs: &Kwargs) -> anyhow::Result<Value> {
    let reader = ArgReader::new("open_rgb_image", args, kwargs);
    let path = reader.str(0, "path")?;
    let rgb = ::image::open(path)
        .with_context(|| format!("failed to open image {path:?}"))?
        .to_rgb8();
    let (width, height) = rgb.dimensions();
    let data = rgb.into_raw().into_iter().map(f64::from).collect();
    let tensor = Tensor::new(vec![height as usize, width as usize, 3], data)?;
    Ok(Value::Tensor(tensor))
}

/// Resize towards `target_shape`, letting the aspect ratio drift by at most
/// `max_ratio_distortion` (relative) and never exceeding the target.
pub fn resize_with_max_distortion(args: &[Value], kwargs: &Kwargs) -> anyhow::Result<Value> {
    let reader = ArgReader::new("resize_with_max_distortion", args, kwargs);
    let data = reader.tensor(0, "data")?;
    let [target_h, target_w] = reader.pair(1, "target_shape")?;
    let max_ratio_distortion = reader.f64(2, "max_ratio_distortion")?;

    let (height, width) = match *data.shape() {
        [h, w] | [h, w, _] => (h, w),
        _ => bail!("Input data is not a 2D or 3D array"),
    };
    ensure!(height > 0 && width > 0, "cannot resize an empty image");
    ensure!(
        target_h > 0 && target_w > 0,
        "target_shape must be positive, got {:?}",
        [target_h, target_w]
    );

    let (new_h, new_w) =
        distortion_bounded_size(height, width, [target_h, target_w], max_ratio_distortion);
    ensure!(
        new_h > 0 && new_w > 0,
        "resizing {:?} to {:?} leaves no pixels",
        [height, width],
        [target_h, target_w]
    );
    Ok(Value::Tensor(resample(data, new_h, new_w)?))
}

/// Output `(height, width)` for [`resize_with_max_distortion`].
///
/// The target aspect ratio is clamped to within `max_ratio_distortion` of the
/// original one, then the largest size with that ratio fitting in `target` is
/// taken, truncating to whole pixels.
pub fn distortion_bounded_size(
    height: usize,
    width: usize,
    target: [usize; 2],
    max_ratio_distortion: f64,
) -> (usize, usize) {
    let [target_h, target_w] = target;
    let original_ratio = width as f64 / height as f64;
    let target_ratio = target_w as f64 / target_h as f64;
    let ratio = target_ratio
        .max(original_ratio * (1.0 - max_ratio_distortion))
        .min(original_ratio * (1.0 + max_ratio_distortion));

    let (mut new_h, mut new_w);
    if ratio > target_ratio {
        new_h = target_h;
        new_w = (new_h as f64 * ratio) as usize;
        if new_w > target_w {
            new_w = target_w;
            new_h = (new_w as f64 / ratio) as usize;
        }
    } else {
        new_w = target_w;
        new_h = (new_w as f64 / ratio) as usize;
        if new_h > target_h {
            new_h = target_h;
            new_w = (new_h as f64 * ratio) as usize;
        }
    }
    (new_h.min(target_h), new_w.min(target_w))
}

/// Bilinear resize of every channel plane to `new_h x new_w`.
fn resample(data: &Tensor, new_h: usize, new_w: usize) -> anyhow::Result<Tensor> {
    let (height, width, channels) = match *data.shape() {
        [h, w] => (h, w, None),
        [h, w, c] => (h, w, Some(c)),
        _ => bail!("Input data is not a 2D or 3D array"),
    };
    let depth = channels.unwrap_or(1);
    let mut out_shape = vec![new_h, new_w];
    out_shape.extend(channels);
    let mut out = Tensor::zeros(out_shape);

    for k in 0..depth {
        let plane: Vec<f64> = (0..height * width).map(|i| data.data()[i * depth + k]).collect();
        // float samples are clamped to [0, 1] while resampling
        let lo = plane.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = plane.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = if hi > lo { hi - lo } else { 1.0 };
        let normalized = plane.iter().map(|v| ((v - lo) / span) as f32).collect();

        let buffer: ImageBuffer<Luma<f32>, Vec<f32>> =
            ImageBuffer::from_raw(width as u32, height as u32, normalized)
                .ok_or_else(|| anyhow!("channel {k} does not fill a {height}x{width} plane"))?;
        let resized = imageops::resize(&buffer, new_w as u32, new_h as u32, FilterType::Triangle);
        for (x, y, pixel) in resized.enumerate_pixels() {
            let value = f64::from(pixel.0[0]) * span + lo;
            match channels {
                Some(_) => out.set(&[y as usize, x as usize, k], value),
                None => out.set(&[y as usize, x as usize], value),
            }
        }
    }
    Ok(out)
}
