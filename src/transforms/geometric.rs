//! Spatial transforms. Each one moves image, mask and bounding boxes
//! through the same geometry, parameterized by a single record drawn once
//! per activation.

use super::{decode, default_prob_half, default_prob_one, ensure_probability};
use crate::error::{AugmentError, Result};
use crate::ops;
use crate::sample::{BBox, Image, Sample};
use crate::transform::{Augmentation, Targets, Transform};
use rand::{Rng, RngCore};
use serde::Deserialize;
use tracing::debug;

pub use crate::ops::geometric::{BorderMode, FlipDirection, Interpolation};

/// Source image shape captured at draw time, so bbox appliers see the
/// geometry the image applier saw even though boxes are processed after
/// the image has already changed shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageShape {
    pub rows: usize,
    pub cols: usize,
}

impl ImageShape {
    fn of(sample: &Sample) -> Self {
        Self {
            rows: sample.rows(),
            cols: sample.cols(),
        }
    }
}

// ============================================================================
// Resize
// ============================================================================

/// Rescales every target to exactly `(height, width)`, scaling bbox
/// coordinates by the same per-axis factors.
#[derive(Debug, Clone)]
pub struct Resize {
    height: usize,
    width: usize,
    interpolation: Interpolation,
    prob: f64,
    always_apply: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResizeSpec {
    height: usize,
    width: usize,
    #[serde(default)]
    interpolation: Interpolation,
    #[serde(default = "default_prob_one")]
    prob: f64,
    #[serde(default)]
    always_apply: bool,
}

impl Resize {
    pub fn new(height: usize, width: usize) -> Result<Self> {
        Self::with_options(height, width, Interpolation::default(), 1.0, false)
    }

    pub fn with_options(
        height: usize,
        width: usize,
        interpolation: Interpolation,
        prob: f64,
        always_apply: bool,
    ) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(AugmentError::configuration(format!(
                "resize dimensions must be positive, got {height}x{width}"
            )));
        }
        ensure_probability(prob)?;
        Ok(Self {
            height,
            width,
            interpolation,
            prob,
            always_apply,
        })
    }

    pub(crate) fn from_spec(params: serde_json::Value) -> Result<Box<dyn Transform>> {
        let spec: ResizeSpec = decode("Resize", params)?;
        Ok(Box::new(Self::with_options(
            spec.height,
            spec.width,
            spec.interpolation,
            spec.prob,
            spec.always_apply,
        )?))
    }
}

impl Augmentation for Resize {
    type Params = ImageShape;

    fn name(&self) -> &'static str {
        "Resize"
    }

    fn targets(&self) -> Targets {
        Targets::SPATIAL
    }

    fn probability(&self) -> f64 {
        self.prob
    }

    fn always_apply(&self) -> bool {
        self.always_apply
    }

    fn get_params(&self, sample: &Sample, _rng: &mut dyn RngCore) -> ImageShape {
        ImageShape::of(sample)
    }

    fn apply(&self, image: Image, _params: &ImageShape) -> Result<Image> {
        ops::geometric::resize(&image, self.height, self.width, self.interpolation)
    }

    fn apply_to_mask(&self, mask: Image, _params: &ImageShape) -> Result<Image> {
        ops::geometric::resize(&mask, self.height, self.width, self.interpolation)
    }

    fn apply_to_bbox(&self, bbox: BBox, params: &ImageShape) -> Result<BBox> {
        let scale_x = self.width as f64 / params.cols as f64;
        let scale_y = self.height as f64 / params.rows as f64;
        Ok(ops::bbox::scale(bbox, scale_x, scale_y))
    }
}

// ============================================================================
// RandomFlip
// ============================================================================

/// Mirrors every target about the configured axis (or both).
#[derive(Debug, Clone)]
pub struct RandomFlip {
    direction: FlipDirection,
    prob: f64,
    always_apply: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RandomFlipSpec {
    #[serde(default)]
    direction: FlipDirection,
    #[serde(default = "default_prob_half")]
    prob: f64,
    #[serde(default)]
    always_apply: bool,
}

impl RandomFlip {
    pub fn new(direction: FlipDirection) -> Result<Self> {
        Self::with_options(direction, 0.5, false)
    }

    pub fn with_options(direction: FlipDirection, prob: f64, always_apply: bool) -> Result<Self> {
        ensure_probability(prob)?;
        Ok(Self {
            direction,
            prob,
            always_apply,
        })
    }

    pub(crate) fn from_spec(params: serde_json::Value) -> Result<Box<dyn Transform>> {
        let spec: RandomFlipSpec = decode("RandomFlip", params)?;
        Ok(Box::new(Self::with_options(
            spec.direction,
            spec.prob,
            spec.always_apply,
        )?))
    }
}

impl Augmentation for RandomFlip {
    type Params = ImageShape;

    fn name(&self) -> &'static str {
        "RandomFlip"
    }

    fn targets(&self) -> Targets {
        Targets::SPATIAL
    }

    fn probability(&self) -> f64 {
        self.prob
    }

    fn always_apply(&self) -> bool {
        self.always_apply
    }

    fn get_params(&self, sample: &Sample, _rng: &mut dyn RngCore) -> ImageShape {
        ImageShape::of(sample)
    }

    fn apply(&self, image: Image, _params: &ImageShape) -> Result<Image> {
        Ok(ops::geometric::flip(&image, self.direction))
    }

    fn apply_to_mask(&self, mask: Image, _params: &ImageShape) -> Result<Image> {
        Ok(ops::geometric::flip(&mask, self.direction))
    }

    fn apply_to_bbox(&self, bbox: BBox, params: &ImageShape) -> Result<BBox> {
        Ok(ops::bbox::flip(
            bbox,
            self.direction,
            params.rows,
            params.cols,
        ))
    }
}

// ============================================================================
// Rotate
// ============================================================================

/// Parameters shared by every target of one rotation: the drawn angle and
/// the shape it was drawn against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationParams {
    pub angle: f64,
    pub rows: usize,
    pub cols: usize,
}

/// Rotates image and mask about the center by an angle drawn uniformly
/// from the configured limit; bboxes become the axis-aligned hull of
/// their rotated corners.
#[derive(Debug, Clone)]
pub struct Rotate {
    limit: (f64, f64),
    interpolation: Interpolation,
    border_mode: BorderMode,
    fill_value: f32,
    prob: f64,
    always_apply: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LimitSpec {
    Scalar(f64),
    Range([f64; 2]),
}

impl LimitSpec {
    fn into_range(self) -> (f64, f64) {
        match self {
            // a scalar limit l means angles in [-l, l]
            LimitSpec::Scalar(limit) => (-limit.abs(), limit.abs()),
            LimitSpec::Range([low, high]) => (low, high),
        }
    }
}

fn default_rotate_limit() -> LimitSpec {
    LimitSpec::Scalar(90.0)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RotateSpec {
    #[serde(default = "default_rotate_limit")]
    limit: LimitSpec,
    #[serde(default)]
    interpolation: Interpolation,
    #[serde(default)]
    border_mode: BorderMode,
    #[serde(default)]
    fill_value: f32,
    #[serde(default = "default_prob_half")]
    prob: f64,
    #[serde(default)]
    always_apply: bool,
}

impl Rotate {
    pub fn new(limit: (f64, f64)) -> Result<Self> {
        Self::with_options(
            limit,
            Interpolation::default(),
            BorderMode::default(),
            0.0,
            0.5,
            false,
        )
    }

    pub fn with_options(
        limit: (f64, f64),
        interpolation: Interpolation,
        border_mode: BorderMode,
        fill_value: f32,
        prob: f64,
        always_apply: bool,
    ) -> Result<Self> {
        if limit.0 > limit.1 {
            return Err(AugmentError::configuration(format!(
                "rotation limit low {} exceeds high {}",
                limit.0, limit.1
            )));
        }
        ensure_probability(prob)?;
        Ok(Self {
            limit,
            interpolation,
            border_mode,
            fill_value,
            prob,
            always_apply,
        })
    }

    pub(crate) fn from_spec(params: serde_json::Value) -> Result<Box<dyn Transform>> {
        let spec: RotateSpec = decode("Rotate", params)?;
        Ok(Box::new(Self::with_options(
            spec.limit.into_range(),
            spec.interpolation,
            spec.border_mode,
            spec.fill_value,
            spec.prob,
            spec.always_apply,
        )?))
    }
}

impl Augmentation for Rotate {
    type Params = RotationParams;

    fn name(&self) -> &'static str {
        "Rotate"
    }

    fn targets(&self) -> Targets {
        Targets::SPATIAL
    }

    fn probability(&self) -> f64 {
        self.prob
    }

    fn always_apply(&self) -> bool {
        self.always_apply
    }

    fn get_params(&self, sample: &Sample, rng: &mut dyn RngCore) -> RotationParams {
        RotationParams {
            angle: rng.random_range(self.limit.0..=self.limit.1),
            rows: sample.rows(),
            cols: sample.cols(),
        }
    }

    fn apply(&self, image: Image, params: &RotationParams) -> Result<Image> {
        ops::geometric::rotate(
            &image,
            params.angle,
            self.interpolation,
            self.border_mode,
            self.fill_value,
        )
    }

    fn apply_to_mask(&self, mask: Image, params: &RotationParams) -> Result<Image> {
        ops::geometric::rotate(
            &mask,
            params.angle,
            self.interpolation,
            self.border_mode,
            self.fill_value,
        )
    }

    fn apply_to_bbox(&self, bbox: BBox, params: &RotationParams) -> Result<BBox> {
        Ok(ops::bbox::rotate(
            bbox,
            params.angle,
            params.rows,
            params.cols,
        ))
    }
}

// ============================================================================
// RandomCrop
// ============================================================================

/// Crop geometry shared by every target: the start fractions drawn once
/// and the shape they apply to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropParams {
    pub h_start: f64,
    pub w_start: f64,
    pub rows: usize,
    pub cols: usize,
}

/// Extracts a `(height, width)` window at a random origin. Boxes are
/// translated into the window and clipped; boxes whose clipped area is
/// zero are dropped along with their category id.
#[derive(Debug, Clone)]
pub struct RandomCrop {
    height: usize,
    width: usize,
    prob: f64,
    always_apply: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RandomCropSpec {
    height: usize,
    width: usize,
    #[serde(default = "default_prob_half")]
    prob: f64,
    #[serde(default)]
    always_apply: bool,
}

impl RandomCrop {
    pub fn new(height: usize, width: usize) -> Result<Self> {
        Self::with_options(height, width, 0.5, false)
    }

    pub fn with_options(
        height: usize,
        width: usize,
        prob: f64,
        always_apply: bool,
    ) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(AugmentError::configuration(format!(
                "crop dimensions must be positive, got {height}x{width}"
            )));
        }
        ensure_probability(prob)?;
        Ok(Self {
            height,
            width,
            prob,
            always_apply,
        })
    }

    pub(crate) fn from_spec(params: serde_json::Value) -> Result<Box<dyn Transform>> {
        let spec: RandomCropSpec = decode("RandomCrop", params)?;
        Ok(Box::new(Self::with_options(
            spec.height,
            spec.width,
            spec.prob,
            spec.always_apply,
        )?))
    }

    fn origin(&self, params: &CropParams) -> Result<(usize, usize)> {
        ops::geometric::crop_origin(
            params.h_start,
            params.w_start,
            params.rows,
            params.cols,
            self.height,
            self.width,
        )
    }
}

impl Augmentation for RandomCrop {
    type Params = CropParams;

    fn name(&self) -> &'static str {
        "RandomCrop"
    }

    fn targets(&self) -> Targets {
        Targets::SPATIAL
    }

    fn probability(&self) -> f64 {
        self.prob
    }

    fn always_apply(&self) -> bool {
        self.always_apply
    }

    fn get_params(&self, sample: &Sample, rng: &mut dyn RngCore) -> CropParams {
        CropParams {
            h_start: rng.random_range(0.0..1.0),
            w_start: rng.random_range(0.0..1.0),
            rows: sample.rows(),
            cols: sample.cols(),
        }
    }

    fn apply(&self, image: Image, params: &CropParams) -> Result<Image> {
        let (y_origin, x_origin) = self.origin(params)?;
        ops::geometric::crop(&image, y_origin, x_origin, self.height, self.width)
    }

    fn apply_to_mask(&self, mask: Image, params: &CropParams) -> Result<Image> {
        let (y_origin, x_origin) = self.origin(params)?;
        ops::geometric::crop(&mask, y_origin, x_origin, self.height, self.width)
    }

    fn apply_to_bbox(&self, bbox: BBox, params: &CropParams) -> Result<BBox> {
        let (y_origin, x_origin) = self.origin(params)?;
        Ok(ops::bbox::crop(
            bbox,
            x_origin,
            y_origin,
            self.height,
            self.width,
        ))
    }

    fn apply_to_bboxes(
        &self,
        bboxes: Vec<BBox>,
        category_ids: Option<Vec<i64>>,
        params: &CropParams,
    ) -> Result<(Vec<BBox>, Option<Vec<i64>>)> {
        let total = bboxes.len();
        let mut kept = Vec::with_capacity(total);

        let kept_ids = match category_ids {
            Some(ids) => {
                let mut kept_ids = Vec::with_capacity(ids.len());
                for (bbox, id) in bboxes.into_iter().zip(ids) {
                    let clipped = self.apply_to_bbox(bbox, params)?;
                    if clipped.area() > 0.0 {
                        kept.push(clipped);
                        kept_ids.push(id);
                    }
                }
                Some(kept_ids)
            }
            None => {
                for bbox in bboxes {
                    let clipped = self.apply_to_bbox(bbox, params)?;
                    if clipped.area() > 0.0 {
                        kept.push(clipped);
                    }
                }
                None
            }
        };

        if kept.len() < total {
            debug!(dropped = total - kept.len(), "crop dropped out-of-window boxes");
        }
        Ok((kept, kept_ids))
    }
}
