//! Bounding-box coordinate kernels.
//!
//! Each function consumes a box and returns the transformed box with its
//! tail suffix untouched. Functions that can invert corner ordering
//! (flip, rotate) re-normalize before returning.

use super::geometric::FlipDirection;
use crate::sample::BBox;

/// Affine per-axis scaling, as produced by a resize.
pub fn scale(bbox: BBox, scale_x: f64, scale_y: f64) -> BBox {
    BBox {
        x_min: bbox.x_min * scale_x,
        y_min: bbox.y_min * scale_y,
        x_max: bbox.x_max * scale_x,
        y_max: bbox.y_max * scale_y,
        tail: bbox.tail,
    }
}

/// Reflects about the image axes selected by `direction`.
pub fn flip(bbox: BBox, direction: FlipDirection, rows: usize, cols: usize) -> BBox {
    let width = cols as f64;
    let height = rows as f64;
    let mut out = bbox;
    if matches!(direction, FlipDirection::Horizontal | FlipDirection::Both) {
        out.x_min = width - out.x_min;
        out.x_max = width - out.x_max;
    }
    if matches!(direction, FlipDirection::Vertical | FlipDirection::Both) {
        out.y_min = height - out.y_min;
        out.y_max = height - out.y_max;
    }
    out.ordered()
}

/// Rotates the four corners about the image center and returns their
/// axis-aligned hull (the conservative bbox-under-rotation rule).
pub fn rotate(bbox: BBox, angle_deg: f64, rows: usize, cols: usize) -> BBox {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let cx = cols as f64 / 2.0;
    let cy = rows as f64 / 2.0;

    let corners = [
        (bbox.x_min, bbox.y_min),
        (bbox.x_max, bbox.y_min),
        (bbox.x_max, bbox.y_max),
        (bbox.x_min, bbox.y_max),
    ];

    let mut x_min = f64::INFINITY;
    let mut y_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for (x, y) in corners {
        let dx = x - cx;
        let dy = y - cy;
        let rx = cos * dx + sin * dy + cx;
        let ry = -sin * dx + cos * dy + cy;
        x_min = x_min.min(rx);
        y_min = y_min.min(ry);
        x_max = x_max.max(rx);
        y_max = y_max.max(ry);
    }

    BBox {
        x_min,
        y_min,
        x_max,
        y_max,
        tail: bbox.tail,
    }
}

/// Translates into a crop window's frame and clips to its bounds. A box
/// entirely outside the window degenerates to zero area.
pub fn crop(bbox: BBox, x_origin: usize, y_origin: usize, height: usize, width: usize) -> BBox {
    let x0 = x_origin as f64;
    let y0 = y_origin as f64;
    BBox {
        x_min: (bbox.x_min - x0).clamp(0.0, width as f64),
        y_min: (bbox.y_min - y0).clamp(0.0, height as f64),
        x_max: (bbox.x_max - x0).clamp(0.0, width as f64),
        y_max: (bbox.y_max - y0).clamp(0.0, height as f64),
        tail: bbox.tail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::TailValue;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_scale_keeps_tail() {
        let bbox = BBox::new(10.0, 20.0, 30.0, 40.0).with_tail(vec![TailValue::from("cat")]);
        let scaled = scale(bbox, 0.5, 2.0);
        assert!(close(scaled.x_min, 5.0) && close(scaled.x_max, 15.0));
        assert!(close(scaled.y_min, 40.0) && close(scaled.y_max, 80.0));
        assert_eq!(scaled.tail, vec![TailValue::from("cat")]);
    }

    #[test]
    fn test_horizontal_flip_reflects_and_reorders() {
        let flipped = flip(
            BBox::new(10.0, 5.0, 30.0, 25.0),
            FlipDirection::Horizontal,
            100,
            200,
        );
        assert!(close(flipped.x_min, 170.0) && close(flipped.x_max, 190.0));
        assert!(close(flipped.y_min, 5.0) && close(flipped.y_max, 25.0));
    }

    #[test]
    fn test_flip_is_involution() {
        let bbox = BBox::new(3.0, 7.0, 40.0, 90.0);
        for direction in [
            FlipDirection::Horizontal,
            FlipDirection::Vertical,
            FlipDirection::Both,
        ] {
            let round_trip = flip(flip(bbox.clone(), direction, 100, 100), direction, 100, 100);
            assert_eq!(round_trip, bbox);
        }
    }

    #[test]
    fn test_rotate_zero_angle_is_identity() {
        let bbox = BBox::new(10.0, 20.0, 30.0, 40.0);
        let rotated = rotate(bbox.clone(), 0.0, 100, 100);
        assert!(close(rotated.x_min, bbox.x_min) && close(rotated.y_min, bbox.y_min));
        assert!(close(rotated.x_max, bbox.x_max) && close(rotated.y_max, bbox.y_max));
    }

    #[test]
    fn test_rotate_quarter_turn_about_center() {
        // A square offset from the center of a square image moves to the
        // mirrored quadrant under a 90 degree turn; the hull stays ordered.
        let rotated = rotate(BBox::new(60.0, 40.0, 80.0, 60.0), 90.0, 100, 100);
        assert!(rotated.x_min <= rotated.x_max && rotated.y_min <= rotated.y_max);
        assert!(close(rotated.x_min, 40.0) && close(rotated.x_max, 60.0));
        assert!(close(rotated.y_min, 20.0) && close(rotated.y_max, 40.0));
    }

    #[test]
    fn test_rotate_180_matches_double_flip() {
        let bbox = BBox::new(10.0, 20.0, 30.0, 40.0);
        let rotated = rotate(bbox.clone(), 180.0, 100, 200);
        let flipped = flip(bbox, FlipDirection::Both, 100, 200);
        assert!(close(rotated.x_min, flipped.x_min) && close(rotated.x_max, flipped.x_max));
        assert!(close(rotated.y_min, flipped.y_min) && close(rotated.y_max, flipped.y_max));
    }

    #[test]
    fn test_crop_translates_and_clips() {
        let cropped = crop(BBox::new(30.0, 30.0, 90.0, 90.0), 20, 20, 50, 50);
        assert!(close(cropped.x_min, 10.0) && close(cropped.x_max, 50.0));
        assert!(close(cropped.y_min, 10.0) && close(cropped.y_max, 50.0));
    }

    #[test]
    fn test_crop_degenerates_outside_boxes() {
        let cropped = crop(BBox::new(60.0, 60.0, 80.0, 80.0), 0, 0, 50, 50);
        assert_eq!(cropped.area(), 0.0);
    }
}
