//! Sequential pipeline over boxed transforms.

use std::fmt;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::registry::{self, Registry};
use crate::sample::Sample;
use crate::transform::Transform;

/// One pipeline step in declarative form: a registered transform name plus
/// its parameter object. Omitted `params` means "all defaults".
#[derive(Debug, Deserialize)]
pub struct TransformSpec {
    pub name: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// An ordered pipeline of transforms, applied left to right. Each step
/// draws its own activation gate and parameters, so two steps of the same
/// type act independently.
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
}

impl fmt::Debug for Compose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.transforms.iter().map(|step| step.name()))
            .finish()
    }
}

impl Compose {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }

    /// Builds a pipeline from specs using the global registry.
    pub fn from_config(specs: Vec<TransformSpec>) -> Result<Self> {
        Self::from_config_with(registry::global(), specs)
    }

    /// Builds a pipeline from specs, resolving names in `registry`.
    pub fn from_config_with(registry: &Registry, specs: Vec<TransformSpec>) -> Result<Self> {
        let transforms = specs
            .into_iter()
            .map(|spec| registry.resolve(&spec.name, spec.params))
            .collect::<Result<Vec<_>>>()?;
        debug!(steps = transforms.len(), "built pipeline");
        Ok(Self::new(transforms))
    }

    /// Builds a pipeline from a JSON array of specs.
    ///
    /// ```
    /// # use augmentor::Compose;
    /// let pipeline = Compose::from_json(
    ///     r#"[
    ///         {"name": "Resize", "params": {"height": 256, "width": 256}},
    ///         {"name": "RandomFlip"}
    ///     ]"#,
    /// )?;
    /// assert_eq!(pipeline.len(), 2);
    /// # Ok::<(), augmentor::AugmentError>(())
    /// ```
    pub fn from_json(config: &str) -> Result<Self> {
        let specs: Vec<TransformSpec> = serde_json::from_str(config)
            .map_err(|err| crate::error::AugmentError::configuration(err.to_string()))?;
        Self::from_config(specs)
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Runs the pipeline with thread-local randomness.
    pub fn apply(&self, sample: Sample) -> Result<Sample> {
        let mut rng = rand::rng();
        self.apply_with_rng(sample, &mut rng)
    }

    /// Runs the pipeline with a fixed seed. Identical seed and input give
    /// an identical output.
    pub fn apply_seeded(&self, sample: Sample, seed: u64) -> Result<Sample> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.apply_with_rng(sample, &mut rng)
    }

    /// Runs the pipeline drawing all randomness from `rng`.
    #[instrument(skip_all, fields(steps = self.transforms.len()))]
    pub fn apply_with_rng(&self, mut sample: Sample, rng: &mut dyn RngCore) -> Result<Sample> {
        sample.validate()?;
        for transform in &self.transforms {
            sample = transform.transform(sample, rng)?;
        }
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Image;
    use ndarray::{ArrayD, IxDyn};

    fn image(rows: usize, cols: usize) -> Image {
        ArrayD::zeros(IxDyn(&[rows, cols, 3]))
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let pipeline = Compose::new(vec![]);
        let out = pipeline.apply(Sample::new(image(4, 4))).unwrap();
        assert_eq!(out.image.shape(), &[4, 4, 3]);
    }

    #[test]
    fn test_from_json_reports_unknown_transform() {
        let err = Compose::from_json(r#"[{"name": "Mosaic"}]"#).unwrap_err();
        assert!(matches!(
            err,
            crate::error::AugmentError::UnknownTransform { name } if name == "Mosaic"
        ));
    }

    #[test]
    fn test_from_json_malformed_config() {
        assert!(Compose::from_json("not json").is_err());
    }

    #[test]
    fn test_debug_lists_step_names() {
        let pipeline = Compose::from_json(
            r#"[
                {"name": "Resize", "params": {"height": 8, "width": 8}},
                {"name": "Normalize"}
            ]"#,
        )
        .unwrap();
        assert_eq!(format!("{pipeline:?}"), r#"["Resize", "Normalize"]"#);
    }

    #[test]
    fn test_invalid_sample_is_rejected_before_any_step() {
        let pipeline = Compose::new(vec![]);
        let bad = Sample::new(ArrayD::zeros(IxDyn(&[2, 2, 3, 1])));
        assert!(pipeline.apply(bad).is_err());
    }
}
