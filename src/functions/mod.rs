//! Built-in processing functions over [`Tensor`] values.
//!
//! Every function takes its data first, then its parameters. Parameters are
//! read positionally, then by keyword, then fall back to their default:
//!
//! | function | parameters |
//! |---|---|
//! | `rescale` | `min_value = 0.0`, `max_value = 1.0` |
//! | `rpad_rcut`, `lpad_lcut`, `center_pad_rcut` | `desired_length` |
//! | `padding_2d` | `target_shape`, `fill_value = 1.0` |
//! | `image_to_channel_num` | `channel_number_target = 3`, `fill_value = 0.0` |
//! | `image_hwc_to_chw`, `image_chw_to_hwc` | |
//! | `resize_with_max_distortion` | `target_shape`, `max_ratio_distortion` |
//! | `open_rgb_image` | takes a file path instead of data |

mod image;
mod raster;
mod scale;
mod signal;

pub use self::image::{image_chw_to_hwc, image_hwc_to_chw, image_to_channel_num, padding_2d};
pub use raster::{distortion_bounded_size, open_rgb_image, resize_with_max_distortion};
pub use scale::rescale;
pub use signal::{center_pad_rcut, lpad_lcut, rpad_rcut};

use crate::deferred::FunctionRegistry;
use crate::error::Result;
use crate::types::{Kwargs, Tensor, Value};
use anyhow::{anyhow, bail};

/// Register every built-in processing function under its own name.
pub fn register_builtins(registry: &mut FunctionRegistry) -> Result<()> {
    registry.register("rescale", rescale)?;
    registry.register("rpad_rcut", rpad_rcut)?;
    registry.register("lpad_lcut", lpad_lcut)?;
    registry.register("center_pad_rcut", center_pad_rcut)?;
    registry.register("padding_2d", padding_2d)?;
    registry.register("image_to_channel_num", image_to_channel_num)?;
    registry.register("image_hwc_to_chw", image_hwc_to_chw)?;
    registry.register("image_chw_to_hwc", image_chw_to_hwc)?;
    registry.register("resize_with_max_distortion", resize_with_max_distortion)?;
    registry.register("open_rgb_image", open_rgb_image)?;
    Ok(())
}

/// Positional-then-keyword argument lookup.
struct ArgReader<'a> {
    function: &'static str,
    args: &'a [Value],
    kwargs: &'a Kwargs,
}

impl<'a> ArgReader<'a> {
    fn new(function: &'static str, args: &'a [Value], kwargs: &'a Kwargs) -> Self {
        Self {
            function,
            args,
            kwargs,
        }
    }

    fn get(&self, position: usize, name: &str) -> Option<&'a Value> {
        self.args.get(position).or_else(|| self.kwargs.get(name))
    }

    fn required(&self, position: usize, name: &str) -> anyhow::Result<&'a Value> {
        self.get(position, name)
            .ok_or_else(|| anyhow!("{}() missing required argument `{name}`", self.function))
    }

    fn tensor(&self, position: usize, name: &str) -> anyhow::Result<&'a Tensor> {
        let value = self.required(position, name)?;
        value.as_tensor().ok_or_else(|| {
            anyhow!(
                "{}() expects `{name}` to be a tensor, not {}",
                self.function,
                value.kind()
            )
        })
    }

    fn str(&self, position: usize, name: &str) -> anyhow::Result<&'a str> {
        let value = self.required(position, name)?;
        value.as_str().ok_or_else(|| {
            anyhow!(
                "{}() expects `{name}` to be a string, not {}",
                self.function,
                value.kind()
            )
        })
    }

    fn f64(&self, position: usize, name: &str) -> anyhow::Result<f64> {
        let value = self.required(position, name)?;
        value.as_f64().ok_or_else(|| {
            anyhow!(
                "{}() expects `{name}` to be a number, not {}",
                self.function,
                value.kind()
            )
        })
    }

    fn f64_or(&self, position: usize, name: &str, default: f64) -> anyhow::Result<f64> {
        match self.get(position, name) {
            None => Ok(default),
            Some(value) => value.as_f64().ok_or_else(|| {
                anyhow!(
                    "{}() expects `{name}` to be a number, not {}",
                    self.function,
                    value.kind()
                )
            }),
        }
    }

    fn usize_or(&self, position: usize, name: &str, default: Option<usize>) -> anyhow::Result<usize> {
        let Some(value) = self.get(position, name) else {
            return default
                .ok_or_else(|| anyhow!("{}() missing required argument `{name}`", self.function));
        };
        match value.as_int() {
            Some(n) if n >= 0 => Ok(n as usize),
            _ => bail!(
                "{}() expects `{name}` to be a non-negative integer, got {:?}",
                self.function,
                value
            ),
        }
    }

    /// A `[height, width]` pair given as a list of integers.
    fn pair(&self, position: usize, name: &str) -> anyhow::Result<[usize; 2]> {
        let value = self.required(position, name)?;
        let dims: Option<Vec<usize>> = value.as_list().and_then(|items| {
            items
                .iter()
                .map(|v| v.as_int().and_then(|n| usize::try_from(n).ok()))
                .collect()
        });
        match dims.as_deref() {
            Some(&[h, w]) => Ok([h, w]),
            _ => bail!(
                "{}() expects `{name}` to be a list of two non-negative integers",
                self.function
            ),
        }
    }
}
