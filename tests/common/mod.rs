//! Shared fixtures for the pipeline tests.

use augmentor::{BBox, Image, Sample, TailValue};
use ndarray::{ArrayD, IxDyn};

/// RGB ramp image where every pixel value encodes its position, so any
/// unexpected spatial move shows up as a value mismatch.
pub fn gradient_rgb(rows: usize, cols: usize) -> Image {
    ArrayD::from_shape_fn(IxDyn(&[rows, cols, 3]), |idx| {
        (idx[0] * cols + idx[1]) as f32 % 251.0 + idx[2] as f32
    })
}

pub fn gradient_gray(rows: usize, cols: usize) -> Image {
    ArrayD::from_shape_fn(IxDyn(&[rows, cols]), |idx| {
        (idx[0] * cols + idx[1]) as f32 % 251.0
    })
}

/// A fully annotated bundle: image, mask, two boxes with labeled tails,
/// and aligned category ids.
pub fn annotated_sample(rows: usize, cols: usize) -> Sample {
    Sample::new(gradient_rgb(rows, cols))
        .with_mask(gradient_gray(rows, cols))
        .with_bboxes(vec![
            BBox::new(10.0, 10.0, 50.0, 50.0).with_tail(vec![TailValue::from("cat")]),
            BBox::new(5.0, 5.0, 15.0, 20.0).with_tail(vec![TailValue::from("dog")]),
        ])
        .with_category_ids(vec![17, 4])
}

pub fn assert_images_equal(a: &Image, b: &Image) {
    assert_eq!(a.shape(), b.shape(), "shape mismatch");
    for (va, vb) in a.iter().zip(b.iter()) {
        assert!((va - vb).abs() < 1e-4, "pixel mismatch: {va} vs {vb}");
    }
}

pub fn assert_bbox_close(bbox: &BBox, expected: (f64, f64, f64, f64)) {
    let (x_min, y_min, x_max, y_max) = expected;
    assert!(
        (bbox.x_min - x_min).abs() < 1e-6
            && (bbox.y_min - y_min).abs() < 1e-6
            && (bbox.x_max - x_max).abs() < 1e-6
            && (bbox.y_max - y_max).abs() < 1e-6,
        "expected ({x_min}, {y_min}, {x_max}, {y_max}), got ({}, {}, {}, {})",
        bbox.x_min,
        bbox.y_min,
        bbox.x_max,
        bbox.y_max,
    );
}
