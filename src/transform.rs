//! The common transform contract.
//!
//! Every built-in augmentation implements [`Augmentation`], a statically
//! typed contract with an associated parameter record. The object-safe
//! [`Transform`] trait is blanket-implemented on top of it and is what
//! [`Compose`](crate::Compose) stores and drives: one Bernoulli activation
//! draw per step, one `get_params` call per activation, and the same
//! parameter record dispatched to every target the transform declares a
//! capability for. That single shared record is what keeps image, mask and
//! bounding boxes spatially consistent.

use crate::error::Result;
use crate::sample::{BBox, Image, Sample};
use rand::{Rng, RngCore};
use std::fmt;
use tracing::{debug, trace};

/// The capability set of a transform: which target kinds it acts on.
///
/// Targets absent from the set are passed through byte-identical even when
/// present in the bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Targets {
    pub image: bool,
    pub mask: bool,
    pub bboxes: bool,
}

impl Targets {
    /// Photometric transforms: the image alone.
    pub const IMAGE_ONLY: Targets = Targets {
        image: true,
        mask: false,
        bboxes: false,
    };

    /// Geometric transforms: every spatial target moves together.
    pub const SPATIAL: Targets = Targets {
        image: true,
        mask: true,
        bboxes: true,
    };
}

/// Statically typed per-transform contract.
///
/// `get_params` is called at most once per invocation and never when the
/// activation gate draws false, so a fixed activation outcome consumes a
/// fixed amount of randomness.
pub trait Augmentation: Send + Sync {
    /// Immutable parameter record produced once per activation and shared
    /// by every target-specific applier.
    type Params;

    fn name(&self) -> &'static str;

    fn targets(&self) -> Targets;

    /// Activation probability in `[0, 1]`.
    fn probability(&self) -> f64;

    /// Forces activation regardless of `probability`.
    fn always_apply(&self) -> bool {
        false
    }

    /// Draws this invocation's random parameters. The sample is available
    /// chiefly so geometry can read the current image shape.
    fn get_params(&self, sample: &Sample, rng: &mut dyn RngCore) -> Self::Params;

    fn apply(&self, image: Image, params: &Self::Params) -> Result<Image>;

    fn apply_to_mask(&self, mask: Image, _params: &Self::Params) -> Result<Image> {
        Ok(mask)
    }

    fn apply_to_bbox(&self, bbox: BBox, _params: &Self::Params) -> Result<BBox> {
        Ok(bbox)
    }

    /// Collection-level bbox hook. The default maps [`apply_to_bbox`]
    /// pairwise and keeps category ids aligned; transforms that drop boxes
    /// (crops) override it to filter ids in lockstep.
    ///
    /// [`apply_to_bbox`]: Augmentation::apply_to_bbox
    fn apply_to_bboxes(
        &self,
        bboxes: Vec<BBox>,
        category_ids: Option<Vec<i64>>,
        params: &Self::Params,
    ) -> Result<(Vec<BBox>, Option<Vec<i64>>)> {
        let bboxes = bboxes
            .into_iter()
            .map(|bbox| self.apply_to_bbox(bbox, params))
            .collect::<Result<Vec<_>>>()?;
        Ok((bboxes, category_ids))
    }
}

/// Object-safe pipeline step, blanket-implemented for every
/// [`Augmentation`]. Implement it directly only for instrumentation or
/// non-standard steps.
pub trait Transform: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn transform(&self, sample: Sample, rng: &mut dyn RngCore) -> Result<Sample>;
}

impl<A: Augmentation + fmt::Debug> Transform for A {
    fn name(&self) -> &str {
        Augmentation::name(self)
    }

    fn transform(&self, sample: Sample, rng: &mut dyn RngCore) -> Result<Sample> {
        let name = Augmentation::name(self);
        if !self.always_apply() && !rng.random_bool(self.probability()) {
            trace!(transform = name, "activation gate drew false");
            return Ok(sample);
        }

        let params = self.get_params(&sample, rng);
        let targets = self.targets();

        let Sample {
            image,
            mask,
            bboxes,
            category_ids,
        } = sample;

        let image = if targets.image {
            self.apply(image, &params)?
        } else {
            image
        };

        let mask = match (mask, targets.mask) {
            (Some(mask), true) => Some(self.apply_to_mask(mask, &params)?),
            (mask, _) => mask,
        };

        let (bboxes, category_ids) = match (bboxes, targets.bboxes) {
            (Some(bboxes), true) => {
                let (bboxes, category_ids) =
                    self.apply_to_bboxes(bboxes, category_ids, &params)?;
                (Some(bboxes), category_ids)
            }
            (bboxes, _) => (bboxes, category_ids),
        };

        debug!(transform = name, "applied");
        Ok(Sample {
            image,
            mask,
            bboxes,
            category_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Doubles every pixel; declares the image-only capability.
    #[derive(Debug)]
    struct Doubler {
        prob: f64,
        param_draws: AtomicUsize,
    }

    impl Doubler {
        fn new(prob: f64) -> Self {
            Self {
                prob,
                param_draws: AtomicUsize::new(0),
            }
        }
    }

    impl Augmentation for Doubler {
        type Params = ();

        fn name(&self) -> &'static str {
            "Doubler"
        }

        fn targets(&self) -> Targets {
            Targets::IMAGE_ONLY
        }

        fn probability(&self) -> f64 {
            self.prob
        }

        fn get_params(&self, _sample: &Sample, _rng: &mut dyn RngCore) {
            self.param_draws.fetch_add(1, Ordering::SeqCst);
        }

        fn apply(&self, image: Image, _params: &()) -> Result<Image> {
            Ok(image.mapv(|v| v * 2.0))
        }
    }

    fn sample() -> Sample {
        Sample::new(ArrayD::from_elem(IxDyn(&[2, 2]), 1.0))
            .with_mask(ArrayD::from_elem(IxDyn(&[2, 2]), 3.0))
            .with_bboxes(vec![BBox::new(0.0, 0.0, 1.0, 1.0)])
    }

    #[test]
    fn test_gate_failure_skips_get_params_and_all_targets() -> Result<()> {
        let transform = Doubler::new(0.0);
        let mut rng = StdRng::seed_from_u64(7);
        let out = transform.transform(sample(), &mut rng)?;

        assert_eq!(transform.param_draws.load(Ordering::SeqCst), 0);
        assert_eq!(out.image, sample().image);
        Ok(())
    }

    #[test]
    fn test_image_only_capability_leaves_annotations_untouched() -> Result<()> {
        let transform = Doubler::new(1.0);
        let mut rng = StdRng::seed_from_u64(7);
        let out = transform.transform(sample(), &mut rng)?;

        assert_eq!(transform.param_draws.load(Ordering::SeqCst), 1);
        assert_eq!(out.image[[0, 0]], 2.0);
        assert_eq!(out.mask.unwrap(), sample().mask.unwrap());
        assert_eq!(out.bboxes.unwrap(), sample().bboxes.unwrap());
        Ok(())
    }

    #[test]
    fn test_absent_targets_are_not_an_error() -> Result<()> {
        let transform = Doubler::new(1.0);
        let mut rng = StdRng::seed_from_u64(7);
        let out = transform.transform(
            Sample::new(ArrayD::from_elem(IxDyn(&[2, 2]), 1.0)),
            &mut rng,
        )?;
        assert!(out.mask.is_none());
        assert!(out.bboxes.is_none());
        Ok(())
    }
}
