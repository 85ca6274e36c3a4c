//! Image-only transforms. Their capability set is `{image}`: masks and
//! bounding boxes pass through byte-identical even when present.

use super::{decode, default_prob_half, default_prob_one, ensure_probability};
use crate::error::{AugmentError, Result};
use crate::ops;
use crate::sample::{Image, Sample};
use crate::transform::{Augmentation, Targets, Transform};
use ndarray::ArrayD;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use rand_distr::StandardNormal;
use serde::Deserialize;

// ============================================================================
// Normalize
// ============================================================================

/// Channel-wise standardization `(v * scale - mean) / std`. The one
/// transform whose output leaves the native `[0, 255]` range.
#[derive(Debug, Clone)]
pub struct Normalize {
    mean: Vec<f32>,
    std: Vec<f32>,
    scale: f32,
    prob: f64,
    always_apply: bool,
}

fn imagenet_mean() -> Vec<f32> {
    vec![0.485, 0.456, 0.406]
}

fn imagenet_std() -> Vec<f32> {
    vec![0.229, 0.224, 0.225]
}

fn default_scale() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NormalizeSpec {
    #[serde(default = "imagenet_mean")]
    mean: Vec<f32>,
    #[serde(default = "imagenet_std")]
    std: Vec<f32>,
    #[serde(default = "default_scale")]
    scale: f32,
    #[serde(default = "default_prob_one")]
    prob: f64,
    #[serde(default)]
    always_apply: bool,
}

impl Normalize {
    /// ImageNet statistics, applied unconditionally.
    pub fn imagenet() -> Self {
        Self::with_options(imagenet_mean(), imagenet_std(), 1.0, 1.0, false)
            .expect("imagenet statistics are valid")
    }

    pub fn new(mean: Vec<f32>, std: Vec<f32>) -> Result<Self> {
        Self::with_options(mean, std, 1.0, 1.0, false)
    }

    pub fn with_options(
        mean: Vec<f32>,
        std: Vec<f32>,
        scale: f32,
        prob: f64,
        always_apply: bool,
    ) -> Result<Self> {
        if mean.is_empty() {
            return Err(AugmentError::configuration(
                "normalization mean cannot be empty",
            ));
        }
        if mean.len() != std.len() {
            return Err(AugmentError::configuration(format!(
                "normalization mean has {} entries but std has {}",
                mean.len(),
                std.len()
            )));
        }
        if std.iter().any(|&s| s == 0.0) {
            return Err(AugmentError::configuration(
                "normalization std entries must be non-zero",
            ));
        }
        ensure_probability(prob)?;
        Ok(Self {
            mean,
            std,
            scale,
            prob,
            always_apply,
        })
    }

    pub(crate) fn from_spec(params: serde_json::Value) -> Result<Box<dyn Transform>> {
        let spec: NormalizeSpec = decode("Normalize", params)?;
        Ok(Box::new(Self::with_options(
            spec.mean,
            spec.std,
            spec.scale,
            spec.prob,
            spec.always_apply,
        )?))
    }
}

impl Augmentation for Normalize {
    type Params = ();

    fn name(&self) -> &'static str {
        "Normalize"
    }

    fn targets(&self) -> Targets {
        Targets::IMAGE_ONLY
    }

    fn probability(&self) -> f64 {
        self.prob
    }

    fn always_apply(&self) -> bool {
        self.always_apply
    }

    fn get_params(&self, _sample: &Sample, _rng: &mut dyn RngCore) {}

    fn apply(&self, image: Image, _params: &()) -> Result<Image> {
        ops::photometric::normalize(&image, &self.mean, &self.std, self.scale)
    }
}

// ============================================================================
// ColorJitter
// ============================================================================

/// One color adjustment step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JitterOp {
    Brightness,
    Contrast,
    Saturation,
    Hue,
}

/// Factors drawn for one activation, applied in a freshly shuffled order.
#[derive(Clone, Debug, PartialEq)]
pub struct JitterParams {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub hue: f32,
    pub order: [JitterOp; 4],
}

/// Randomly perturbs brightness, contrast, saturation and hue.
#[derive(Debug, Clone)]
pub struct ColorJitter {
    brightness: (f32, f32),
    contrast: (f32, f32),
    saturation: (f32, f32),
    hue: (f32, f32),
    prob: f64,
    always_apply: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JitterRange {
    Scalar(f32),
    Range([f32; 2]),
}

fn default_jitter() -> JitterRange {
    JitterRange::Scalar(0.2)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ColorJitterSpec {
    #[serde(default = "default_jitter")]
    brightness: JitterRange,
    #[serde(default = "default_jitter")]
    contrast: JitterRange,
    #[serde(default = "default_jitter")]
    saturation: JitterRange,
    #[serde(default = "default_jitter")]
    hue: JitterRange,
    #[serde(default = "default_prob_half")]
    prob: f64,
    #[serde(default)]
    always_apply: bool,
}

/// Expands a scalar spread to a range around `offset` (clipping the lower
/// bound to the domain where configured) and validates explicit ranges
/// against `bounds`.
fn check_range(
    value: JitterRange,
    name: &str,
    offset: f32,
    bounds: (f32, f32),
    clip_low: bool,
) -> Result<(f32, f32)> {
    match value {
        JitterRange::Scalar(spread) => {
            if spread < 0.0 {
                return Err(AugmentError::configuration(format!(
                    "{name} spread must be non-negative, got {spread}"
                )));
            }
            let mut low = offset - spread;
            if clip_low {
                low = low.max(0.0);
            }
            Ok((low, offset + spread))
        }
        JitterRange::Range([low, high]) => {
            if !(bounds.0 <= low && low <= high && high <= bounds.1) {
                return Err(AugmentError::configuration(format!(
                    "{name} range [{low}, {high}] must be ordered within [{}, {}]",
                    bounds.0, bounds.1
                )));
            }
            Ok((low, high))
        }
    }
}

impl ColorJitter {
    pub fn new() -> Result<Self> {
        Self::with_options(
            JitterRange::Scalar(0.2),
            JitterRange::Scalar(0.2),
            JitterRange::Scalar(0.2),
            JitterRange::Scalar(0.2),
            0.5,
            false,
        )
    }

    fn with_options(
        brightness: JitterRange,
        contrast: JitterRange,
        saturation: JitterRange,
        hue: JitterRange,
        prob: f64,
        always_apply: bool,
    ) -> Result<Self> {
        ensure_probability(prob)?;
        Ok(Self {
            brightness: check_range(brightness, "brightness", 1.0, (0.0, f32::INFINITY), true)?,
            contrast: check_range(contrast, "contrast", 1.0, (0.0, f32::INFINITY), true)?,
            saturation: check_range(saturation, "saturation", 1.0, (0.0, f32::INFINITY), true)?,
            hue: check_range(hue, "hue", 0.0, (-0.5, 0.5), false)?,
            prob,
            always_apply,
        })
    }

    pub(crate) fn from_spec(params: serde_json::Value) -> Result<Box<dyn Transform>> {
        let spec: ColorJitterSpec = decode("ColorJitter", params)?;
        Ok(Box::new(Self::with_options(
            spec.brightness,
            spec.contrast,
            spec.saturation,
            spec.hue,
            spec.prob,
            spec.always_apply,
        )?))
    }
}

impl Augmentation for ColorJitter {
    type Params = JitterParams;

    fn name(&self) -> &'static str {
        "ColorJitter"
    }

    fn targets(&self) -> Targets {
        Targets::IMAGE_ONLY
    }

    fn probability(&self) -> f64 {
        self.prob
    }

    fn always_apply(&self) -> bool {
        self.always_apply
    }

    fn get_params(&self, _sample: &Sample, rng: &mut dyn RngCore) -> JitterParams {
        let mut order = [
            JitterOp::Brightness,
            JitterOp::Contrast,
            JitterOp::Saturation,
            JitterOp::Hue,
        ];
        order.shuffle(rng);
        JitterParams {
            brightness: rng.random_range(self.brightness.0..=self.brightness.1),
            contrast: rng.random_range(self.contrast.0..=self.contrast.1),
            saturation: rng.random_range(self.saturation.0..=self.saturation.1),
            hue: rng.random_range(self.hue.0..=self.hue.1),
            order,
        }
    }

    fn apply(&self, image: Image, params: &JitterParams) -> Result<Image> {
        let mut out = image;
        for op in params.order {
            out = match op {
                JitterOp::Brightness => {
                    ops::photometric::adjust_brightness(&out, params.brightness)
                }
                JitterOp::Contrast => ops::photometric::adjust_contrast(&out, params.contrast)?,
                JitterOp::Saturation => {
                    ops::photometric::adjust_saturation(&out, params.saturation)?
                }
                JitterOp::Hue => ops::photometric::adjust_hue(&out, params.hue)?,
            };
        }
        Ok(out)
    }
}

// ============================================================================
// MultiplicativeNoise
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct MultiplierParams {
    pub factors: Vec<f32>,
}

/// Multiplies the image by factors drawn uniformly from the configured
/// range, optionally one per channel.
#[derive(Debug, Clone)]
pub struct MultiplicativeNoise {
    multiplier: (f32, f32),
    per_channel: bool,
    prob: f64,
    always_apply: bool,
}

fn default_multiplier() -> [f32; 2] {
    [0.9, 1.1]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MultiplicativeNoiseSpec {
    #[serde(default = "default_multiplier")]
    multiplier: [f32; 2],
    #[serde(default)]
    per_channel: bool,
    #[serde(default = "default_prob_half")]
    prob: f64,
    #[serde(default)]
    always_apply: bool,
}

impl MultiplicativeNoise {
    pub fn new(multiplier: (f32, f32), per_channel: bool) -> Result<Self> {
        Self::with_options(multiplier, per_channel, 0.5, false)
    }

    pub fn with_options(
        multiplier: (f32, f32),
        per_channel: bool,
        prob: f64,
        always_apply: bool,
    ) -> Result<Self> {
        if !(0.0 <= multiplier.0 && multiplier.0 <= multiplier.1) {
            return Err(AugmentError::configuration(format!(
                "multiplier range [{}, {}] must be ordered and non-negative",
                multiplier.0, multiplier.1
            )));
        }
        ensure_probability(prob)?;
        Ok(Self {
            multiplier,
            per_channel,
            prob,
            always_apply,
        })
    }

    pub(crate) fn from_spec(params: serde_json::Value) -> Result<Box<dyn Transform>> {
        let spec: MultiplicativeNoiseSpec = decode("MultiplicativeNoise", params)?;
        Ok(Box::new(Self::with_options(
            (spec.multiplier[0], spec.multiplier[1]),
            spec.per_channel,
            spec.prob,
            spec.always_apply,
        )?))
    }
}

impl Augmentation for MultiplicativeNoise {
    type Params = MultiplierParams;

    fn name(&self) -> &'static str {
        "MultiplicativeNoise"
    }

    fn targets(&self) -> Targets {
        Targets::IMAGE_ONLY
    }

    fn probability(&self) -> f64 {
        self.prob
    }

    fn always_apply(&self) -> bool {
        self.always_apply
    }

    fn get_params(&self, sample: &Sample, rng: &mut dyn RngCore) -> MultiplierParams {
        let (low, high) = self.multiplier;
        if low == high {
            return MultiplierParams {
                factors: vec![low],
            };
        }
        let count = if self.per_channel && !ops::is_grayscale(&sample.image) {
            ops::channels(&sample.image)
        } else {
            1
        };
        MultiplierParams {
            factors: (0..count).map(|_| rng.random_range(low..=high)).collect(),
        }
    }

    fn apply(&self, image: Image, params: &MultiplierParams) -> Result<Image> {
        ops::photometric::multiply(&image, &params.factors)
    }
}

// ============================================================================
// GaussNoise
// ============================================================================

pub struct NoiseParams {
    pub noise: Image,
}

/// Adds Gaussian noise with a variance drawn uniformly from `var_limit`.
/// The full noise field is generated at draw time so the applier stays
/// deterministic in its inputs.
#[derive(Debug, Clone)]
pub struct GaussNoise {
    var_limit: (f32, f32),
    mean: f32,
    prob: f64,
    always_apply: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VarLimitSpec {
    Scalar(f32),
    Range([f32; 2]),
}

impl VarLimitSpec {
    fn into_range(self) -> (f32, f32) {
        match self {
            // a scalar limit v means variances in [0, v]
            VarLimitSpec::Scalar(limit) => (0.0, limit),
            VarLimitSpec::Range([low, high]) => (low, high),
        }
    }
}

fn default_var_limit() -> VarLimitSpec {
    VarLimitSpec::Range([10.0, 50.0])
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GaussNoiseSpec {
    #[serde(default = "default_var_limit")]
    var_limit: VarLimitSpec,
    #[serde(default)]
    mean: f32,
    #[serde(default = "default_prob_half")]
    prob: f64,
    #[serde(default)]
    always_apply: bool,
}

impl GaussNoise {
    pub fn new(var_limit: (f32, f32), mean: f32) -> Result<Self> {
        Self::with_options(var_limit, mean, 0.5, false)
    }

    pub fn with_options(
        var_limit: (f32, f32),
        mean: f32,
        prob: f64,
        always_apply: bool,
    ) -> Result<Self> {
        if !(0.0 <= var_limit.0 && var_limit.0 <= var_limit.1) {
            return Err(AugmentError::configuration(format!(
                "variance limit [{}, {}] must be ordered and non-negative",
                var_limit.0, var_limit.1
            )));
        }
        ensure_probability(prob)?;
        Ok(Self {
            var_limit,
            mean,
            prob,
            always_apply,
        })
    }

    pub(crate) fn from_spec(params: serde_json::Value) -> Result<Box<dyn Transform>> {
        let spec: GaussNoiseSpec = decode("GaussNoise", params)?;
        Ok(Box::new(Self::with_options(
            spec.var_limit.into_range(),
            spec.mean,
            spec.prob,
            spec.always_apply,
        )?))
    }
}

impl Augmentation for GaussNoise {
    type Params = NoiseParams;

    fn name(&self) -> &'static str {
        "GaussNoise"
    }

    fn targets(&self) -> Targets {
        Targets::IMAGE_ONLY
    }

    fn probability(&self) -> f64 {
        self.prob
    }

    fn always_apply(&self) -> bool {
        self.always_apply
    }

    fn get_params(&self, sample: &Sample, rng: &mut dyn RngCore) -> NoiseParams {
        let variance = rng.random_range(self.var_limit.0..=self.var_limit.1);
        let sigma = variance.sqrt();
        let mean = self.mean;
        let noise = ArrayD::from_shape_fn(sample.image.raw_dim(), |_| {
            mean + sigma * rng.sample::<f32, _>(StandardNormal)
        });
        NoiseParams { noise }
    }

    fn apply(&self, image: Image, params: &NoiseParams) -> Result<Image> {
        ops::photometric::add_noise(&image, &params.noise)
    }
}
