//! Photometric image kernels: normalization, color adjustment, noise.

use super::{as_hwc, channels, from_hwc, is_grayscale};
use crate::error::{AugmentError, Result};
use crate::sample::Image;
use ndarray::Axis;

/// Nominal intensity ceiling; kernels that stay in the native range clip
/// against it. `normalize` is the deliberate exception.
pub const MAX_PIXEL_VALUE: f32 = 255.0;

fn clip(value: f32) -> f32 {
    value.clamp(0.0, MAX_PIXEL_VALUE)
}

fn per_channel(values: &[f32], channel: usize) -> f32 {
    if values.len() == 1 {
        values[0]
    } else {
        values[channel]
    }
}

/// Channel-wise `(v * scale - mean) / std`. Float output, deliberately
/// unclipped. `mean`/`std` must have length 1 or match the channel count.
pub fn normalize(image: &Image, mean: &[f32], std: &[f32], scale: f32) -> Result<Image> {
    let ch = channels(image);
    if mean.len() != 1 && mean.len() != ch {
        return Err(AugmentError::shape(format!(
            "normalization stats have {} entries but the image has {ch} channels",
            mean.len()
        )));
    }

    let mut out = as_hwc(image)?.to_owned();
    for c in 0..ch {
        let m = per_channel(mean, c);
        let s = per_channel(std, c);
        out.index_axis_mut(Axis(2), c)
            .mapv_inplace(|v| (v * scale - m) / s);
    }
    Ok(from_hwc(out, image.ndim()))
}

pub fn adjust_brightness(image: &Image, factor: f32) -> Image {
    image.mapv(|v| clip(v * factor))
}

/// Blends toward the image's mean intensity (luma mean for RGB input).
pub fn adjust_contrast(image: &Image, factor: f32) -> Result<Image> {
    let hwc = as_hwc(image)?;
    let mean = if hwc.dim().2 == 3 {
        let (rows, cols, _) = hwc.dim();
        let mut sum = 0.0f64;
        for y in 0..rows {
            for x in 0..cols {
                sum += luma(hwc[[y, x, 0]], hwc[[y, x, 1]], hwc[[y, x, 2]]) as f64;
            }
        }
        (sum / (rows * cols) as f64) as f32
    } else {
        hwc.mean().unwrap_or(0.0)
    };
    Ok(image.mapv(|v| clip(mean + (v - mean) * factor)))
}

/// Blends each pixel toward its own luma. Identity for grayscale input.
pub fn adjust_saturation(image: &Image, factor: f32) -> Result<Image> {
    if is_grayscale(image) {
        return Ok(image.clone());
    }
    require_rgb(image, "saturation")?;

    let mut out = as_hwc(image)?.to_owned();
    for mut pixel in out.lanes_mut(Axis(2)) {
        let gray = luma(pixel[0], pixel[1], pixel[2]);
        for v in pixel.iter_mut() {
            *v = clip(gray + (*v - gray) * factor);
        }
    }
    Ok(from_hwc(out, image.ndim()))
}

/// Shifts hue by `shift` full turns (`0.5` is the opposite hue).
/// Identity for grayscale input.
pub fn adjust_hue(image: &Image, shift: f32) -> Result<Image> {
    if is_grayscale(image) {
        return Ok(image.clone());
    }
    require_rgb(image, "hue")?;

    let mut out = as_hwc(image)?.to_owned();
    for mut pixel in out.lanes_mut(Axis(2)) {
        let (h, s, v) = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);
        let (r, g, b) = hsv_to_rgb(h + shift, s, v);
        pixel[0] = clip(r);
        pixel[1] = clip(g);
        pixel[2] = clip(b);
    }
    Ok(from_hwc(out, image.ndim()))
}

/// Multiplies by one shared factor or one factor per channel.
pub fn multiply(image: &Image, factors: &[f32]) -> Result<Image> {
    if factors.len() == 1 {
        let factor = factors[0];
        return Ok(image.mapv(|v| clip(v * factor)));
    }
    let ch = channels(image);
    if factors.len() != ch {
        return Err(AugmentError::shape(format!(
            "{} multipliers for an image with {ch} channels",
            factors.len()
        )));
    }

    let mut out = as_hwc(image)?.to_owned();
    for c in 0..ch {
        let factor = factors[c];
        out.index_axis_mut(Axis(2), c)
            .mapv_inplace(|v| clip(v * factor));
    }
    Ok(from_hwc(out, image.ndim()))
}

/// Adds a precomputed noise field of identical shape.
pub fn add_noise(image: &Image, noise: &Image) -> Result<Image> {
    if image.shape() != noise.shape() {
        return Err(AugmentError::shape(format!(
            "noise shape {:?} does not match image shape {:?}",
            noise.shape(),
            image.shape()
        )));
    }
    let mut out = image + noise;
    out.mapv_inplace(clip);
    Ok(out)
}

fn require_rgb(image: &Image, what: &str) -> Result<()> {
    if channels(image) == 3 {
        Ok(())
    } else {
        Err(AugmentError::shape(format!(
            "{what} adjustment requires a grayscale or 3-channel image, got {} channels",
            channels(image)
        )))
    }
}

fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        ((g - b) / delta).rem_euclid(6.0) / 6.0
    } else if max == g {
        ((b - r) / delta + 2.0) / 6.0
    } else {
        ((r - g) / delta + 4.0) / 6.0
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };
    (h, s, max)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let h6 = h.rem_euclid(1.0) * 6.0;
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as i32 % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}
