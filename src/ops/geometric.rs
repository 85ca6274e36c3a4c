//! Geometric image kernels: resize, flip, rotate, crop.

use super::{as_hwc, from_hwc};
use crate::error::{AugmentError, Result};
use crate::sample::Image;
use ndarray::{Array3, ArrayView3, Axis, Slice};
use serde::{Deserialize, Serialize};

/// Pixel resampling strategy for resize and rotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
}

/// Mirror axis selection. `Horizontal` mirrors about the vertical axis,
/// `Vertical` about the horizontal axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipDirection {
    Horizontal,
    Vertical,
    #[default]
    Both,
}

/// Policy for pixels sampled outside the source during rotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderMode {
    /// Mirror across the edge without repeating the edge row/column.
    #[default]
    Reflect,
    /// Repeat the edge row/column.
    Replicate,
    /// A constant fill value.
    Constant,
}

/// Rescales to exactly `(height, width)`, independently per axis.
pub fn resize(
    image: &Image,
    height: usize,
    width: usize,
    interpolation: Interpolation,
) -> Result<Image> {
    let src = as_hwc(image)?;
    let (rows, cols, channels) = src.dim();
    if rows == 0 || cols == 0 {
        return Err(AugmentError::shape("cannot resize an empty image"));
    }

    let scale_y = rows as f32 / height as f32;
    let scale_x = cols as f32 / width as f32;
    let mut dst = Array3::<f32>::zeros((height, width, channels));

    for y in 0..height {
        for x in 0..width {
            match interpolation {
                Interpolation::Nearest => {
                    let sy = ((y as f32 * scale_y) as usize).min(rows - 1);
                    let sx = ((x as f32 * scale_x) as usize).min(cols - 1);
                    for c in 0..channels {
                        dst[[y, x, c]] = src[[sy, sx, c]];
                    }
                }
                Interpolation::Bilinear => {
                    let sy = y as f32 * scale_y;
                    let sx = x as f32 * scale_x;
                    let y0 = (sy.floor() as usize).min(rows - 1);
                    let y1 = (y0 + 1).min(rows - 1);
                    let x0 = (sx.floor() as usize).min(cols - 1);
                    let x1 = (x0 + 1).min(cols - 1);
                    let dy = sy - y0 as f32;
                    let dx = sx - x0 as f32;
                    for c in 0..channels {
                        let v00 = src[[y0, x0, c]];
                        let v01 = src[[y0, x1, c]];
                        let v10 = src[[y1, x0, c]];
                        let v11 = src[[y1, x1, c]];
                        dst[[y, x, c]] = v00 * (1.0 - dx) * (1.0 - dy)
                            + v01 * dx * (1.0 - dy)
                            + v10 * (1.0 - dx) * dy
                            + v11 * dx * dy;
                    }
                }
            }
        }
    }

    Ok(from_hwc(dst, image.ndim()))
}

/// Mirrors the image about the requested axis (or both). The result is a
/// standard-layout buffer, not a reversed-stride view of the source.
pub fn flip(image: &Image, direction: FlipDirection) -> Image {
    let mut view = image.view();
    match direction {
        FlipDirection::Horizontal => view.invert_axis(Axis(1)),
        FlipDirection::Vertical => view.invert_axis(Axis(0)),
        FlipDirection::Both => {
            view.invert_axis(Axis(0));
            view.invert_axis(Axis(1));
        }
    }
    view.as_standard_layout().into_owned()
}

/// Rotates by `angle_deg` about the image center, keeping the canvas size.
///
/// Uses inverse mapping: every destination pixel samples the source at the
/// back-rotated coordinate, so the forward corner rotation used for boxes
/// in [`super::bbox::rotate`] describes exactly where source content lands.
pub fn rotate(
    image: &Image,
    angle_deg: f64,
    interpolation: Interpolation,
    border_mode: BorderMode,
    fill_value: f32,
) -> Result<Image> {
    let src = as_hwc(image)?;
    let (rows, cols, channels) = src.dim();
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let cy = rows as f64 / 2.0;
    let cx = cols as f64 / 2.0;

    let mut dst = Array3::<f32>::zeros((rows, cols, channels));
    for y in 0..rows {
        for x in 0..cols {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            let sx = cos * dx - sin * dy + cx;
            let sy = sin * dx + cos * dy + cy;
            for c in 0..channels {
                dst[[y, x, c]] =
                    sample_at(&src, sy, sx, c, interpolation, border_mode, fill_value);
            }
        }
    }

    Ok(from_hwc(dst, image.ndim()))
}

/// Extracts the `(height, width)` window anchored at `(y_origin, x_origin)`.
pub fn crop(
    image: &Image,
    y_origin: usize,
    x_origin: usize,
    height: usize,
    width: usize,
) -> Result<Image> {
    let rows = super::rows(image);
    let cols = super::cols(image);
    if y_origin + height > rows || x_origin + width > cols {
        return Err(AugmentError::shape(format!(
            "crop window {height}x{width} at ({y_origin}, {x_origin}) exceeds image {rows}x{cols}"
        )));
    }
    Ok(image
        .slice_axis(Axis(0), Slice::from(y_origin..y_origin + height))
        .slice_axis(Axis(1), Slice::from(x_origin..x_origin + width))
        .to_owned())
}

/// Maps the unit-interval start fractions to a crop origin, proportional
/// to the available slack per axis.
pub fn crop_origin(
    h_start: f64,
    w_start: f64,
    rows: usize,
    cols: usize,
    height: usize,
    width: usize,
) -> Result<(usize, usize)> {
    let slack_y = rows.checked_sub(height).ok_or_else(|| {
        AugmentError::shape(format!("crop height {height} exceeds image height {rows}"))
    })?;
    let slack_x = cols.checked_sub(width).ok_or_else(|| {
        AugmentError::shape(format!("crop width {width} exceeds image width {cols}"))
    })?;
    Ok((
        (slack_y as f64 * h_start) as usize,
        (slack_x as f64 * w_start) as usize,
    ))
}

fn sample_at(
    src: &ArrayView3<'_, f32>,
    sy: f64,
    sx: f64,
    channel: usize,
    interpolation: Interpolation,
    border_mode: BorderMode,
    fill_value: f32,
) -> f32 {
    match interpolation {
        Interpolation::Nearest => fetch(
            src,
            sy.round() as i64,
            sx.round() as i64,
            channel,
            border_mode,
            fill_value,
        ),
        Interpolation::Bilinear => {
            let y0 = sy.floor();
            let x0 = sx.floor();
            let dy = (sy - y0) as f32;
            let dx = (sx - x0) as f32;
            let (y0, x0) = (y0 as i64, x0 as i64);
            let v00 = fetch(src, y0, x0, channel, border_mode, fill_value);
            let v01 = fetch(src, y0, x0 + 1, channel, border_mode, fill_value);
            let v10 = fetch(src, y0 + 1, x0, channel, border_mode, fill_value);
            let v11 = fetch(src, y0 + 1, x0 + 1, channel, border_mode, fill_value);
            v00 * (1.0 - dx) * (1.0 - dy)
                + v01 * dx * (1.0 - dy)
                + v10 * (1.0 - dx) * dy
                + v11 * dx * dy
        }
    }
}

fn fetch(
    src: &ArrayView3<'_, f32>,
    y: i64,
    x: i64,
    channel: usize,
    border_mode: BorderMode,
    fill_value: f32,
) -> f32 {
    let (rows, cols, _) = src.dim();
    match (
        border_index(y, rows as i64, border_mode),
        border_index(x, cols as i64, border_mode),
    ) {
        (Some(y), Some(x)) => src[[y as usize, x as usize, channel]],
        _ => fill_value,
    }
}

fn border_index(index: i64, len: i64, border_mode: BorderMode) -> Option<i64> {
    if (0..len).contains(&index) {
        return Some(index);
    }
    match border_mode {
        BorderMode::Constant => None,
        BorderMode::Replicate => Some(index.clamp(0, len - 1)),
        BorderMode::Reflect => {
            if len == 1 {
                return Some(0);
            }
            let period = 2 * (len - 1);
            let mut reflected = index.rem_euclid(period);
            if reflected >= len {
                reflected = period - reflected;
            }
            Some(reflected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    fn gradient(rows: usize, cols: usize) -> Image {
        ArrayD::from_shape_fn(IxDyn(&[rows, cols]), |idx| (idx[0] * cols + idx[1]) as f32)
    }

    #[test]
    fn test_resize_output_shape() {
        let image = gradient(10, 20);
        let resized = resize(&image, 5, 4, Interpolation::Bilinear).unwrap();
        assert_eq!(resized.shape(), &[5, 4]);
    }

    #[test]
    fn test_resize_preserves_singleton_channel() {
        let image: Image = ArrayD::zeros(IxDyn(&[8, 8, 1]));
        let resized = resize(&image, 4, 4, Interpolation::Nearest).unwrap();
        assert_eq!(resized.shape(), &[4, 4, 1]);
    }

    #[test]
    fn test_flip_horizontal_mirrors_columns() {
        let image = gradient(1, 3);
        let flipped = flip(&image, FlipDirection::Horizontal);
        assert!(flipped.is_standard_layout());
        assert_eq!(
            flipped.as_slice().unwrap(),
            &[2.0, 1.0, 0.0]
        );
    }

    #[test]
    fn test_flip_twice_is_identity() {
        let image = gradient(3, 4);
        for direction in [
            FlipDirection::Horizontal,
            FlipDirection::Vertical,
            FlipDirection::Both,
        ] {
            let round_trip = flip(&flip(&image, direction), direction);
            assert_eq!(round_trip, image);
        }
    }

    #[test]
    fn test_rotate_zero_angle_is_identity() {
        let image = gradient(5, 7);
        let rotated = rotate(
            &image,
            0.0,
            Interpolation::Bilinear,
            BorderMode::Reflect,
            0.0,
        )
        .unwrap();
        for (a, b) in rotated.iter().zip(image.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_rotate_keeps_canvas_shape() {
        let image: Image = ArrayD::zeros(IxDyn(&[6, 9, 3]));
        let rotated = rotate(
            &image,
            33.0,
            Interpolation::Nearest,
            BorderMode::Constant,
            0.0,
        )
        .unwrap();
        assert_eq!(rotated.shape(), image.shape());
    }

    #[test]
    fn test_crop_extracts_window() {
        let image = gradient(4, 4);
        let cropped = crop(&image, 1, 2, 2, 2).unwrap();
        assert_eq!(cropped.shape(), &[2, 2]);
        assert_eq!(cropped[[0, 0]], 6.0);
        assert_eq!(cropped[[1, 1]], 11.0);
    }

    #[test]
    fn test_crop_out_of_bounds_is_shape_error() {
        let image = gradient(4, 4);
        assert!(crop(&image, 3, 0, 2, 2).is_err());
    }

    #[test]
    fn test_crop_origin_spans_slack() {
        assert_eq!(crop_origin(0.0, 0.0, 10, 10, 4, 4).unwrap(), (0, 0));
        assert_eq!(crop_origin(0.999, 0.999, 10, 10, 4, 4).unwrap(), (5, 5));
        assert!(crop_origin(0.5, 0.5, 3, 10, 4, 4).is_err());
    }

    #[test]
    fn test_border_reflect_skips_edge() {
        // reflect-101 of index -1 is 1, of index len is len - 2
        assert_eq!(border_index(-1, 5, BorderMode::Reflect), Some(1));
        assert_eq!(border_index(5, 5, BorderMode::Reflect), Some(3));
        assert_eq!(border_index(-1, 5, BorderMode::Replicate), Some(0));
        assert_eq!(border_index(-1, 5, BorderMode::Constant), None);
    }
}
