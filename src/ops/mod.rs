//! Pure pixel- and coordinate-level kernels.
//!
//! Kernels are free functions over a single buffer or a single box; they
//! own no randomness and no configuration. All random draws happen in the
//! transforms' `get_params`, so a kernel called twice with the same inputs
//! produces the same output.

pub mod bbox;
pub mod geometric;
pub mod photometric;

use crate::error::{AugmentError, Result};
use crate::sample::Image;
use ndarray::{Array3, ArrayView3, Axis, Ix3};

pub fn rows(image: &Image) -> usize {
    image.shape()[0]
}

pub fn cols(image: &Image) -> usize {
    image.shape()[1]
}

pub fn channels(image: &Image) -> usize {
    if image.ndim() == 3 {
        image.shape()[2]
    } else {
        1
    }
}

pub fn is_grayscale(image: &Image) -> bool {
    image.ndim() == 2 || (image.ndim() == 3 && image.shape()[2] == 1)
}

/// Views any supported buffer as `(H, W, C)`, inserting a virtual channel
/// axis for rank-2 input. Rejects every other rank.
pub(crate) fn as_hwc(image: &Image) -> Result<ArrayView3<'_, f32>> {
    let view = match image.ndim() {
        2 => image.view().insert_axis(Axis(2)),
        3 => image.view(),
        rank => {
            return Err(AugmentError::shape(format!(
                "expected a (H, W) or (H, W, C) array, got rank {rank}"
            )))
        }
    };
    view.into_dimensionality::<Ix3>()
        .map_err(|err| AugmentError::shape(err.to_string()))
}

/// Inverse of [`as_hwc`]: restores the source rank so an implicit
/// grayscale channel dimension survives shape-changing kernels.
pub(crate) fn from_hwc(array: Array3<f32>, source_ndim: usize) -> Image {
    if source_ndim == 2 {
        array.remove_axis(Axis(2)).into_dyn()
    } else {
        array.into_dyn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn test_hwc_round_trip_preserves_rank() {
        for shape in [&[4, 5][..], &[4, 5, 1], &[4, 5, 3]] {
            let image: Image = ArrayD::zeros(IxDyn(shape));
            let hwc = as_hwc(&image).unwrap().to_owned();
            let restored = from_hwc(hwc, image.ndim());
            assert_eq!(restored.shape(), image.shape());
        }
    }

    #[test]
    fn test_as_hwc_rejects_rank_4() {
        let image: Image = ArrayD::zeros(IxDyn(&[2, 2, 2, 2]));
        assert!(as_hwc(&image).is_err());
    }

    #[test]
    fn test_grayscale_detection() {
        assert!(is_grayscale(&ArrayD::zeros(IxDyn(&[4, 4]))));
        assert!(is_grayscale(&ArrayD::zeros(IxDyn(&[4, 4, 1]))));
        assert!(!is_grayscale(&ArrayD::zeros(IxDyn(&[4, 4, 3]))));
    }
}
