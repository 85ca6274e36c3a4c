//! Built-in transforms.
//!
//! # Module organization
//!
//! ```text
//! transforms/
//! ├── geometric.rs    → spatial transforms (Resize, RandomFlip, Rotate, RandomCrop)
//! └── photometric.rs  → image-only transforms (Normalize, ColorJitter,
//!                       MultiplicativeNoise, GaussNoise)
//! ```
//!
//! Every transform validates its static parameters at construction and
//! exposes a `from_spec` constructor that decodes the same parameters from
//! a configuration value, so pipelines can be built programmatically or
//! declaratively through the [`Registry`](crate::Registry).

pub mod geometric;
pub mod photometric;

pub use geometric::{RandomCrop, RandomFlip, Resize, Rotate};
pub use photometric::{ColorJitter, GaussNoise, MultiplicativeNoise, Normalize};

use crate::error::{AugmentError, Result};
use serde::de::DeserializeOwned;

pub(crate) fn default_prob_half() -> f64 {
    0.5
}

pub(crate) fn default_prob_one() -> f64 {
    1.0
}

pub(crate) fn ensure_probability(prob: f64) -> Result<()> {
    if (0.0..=1.0).contains(&prob) {
        Ok(())
    } else {
        Err(AugmentError::configuration(format!(
            "probability must be in [0, 1], got {prob}"
        )))
    }
}

pub(crate) fn decode<T: DeserializeOwned>(name: &str, params: serde_json::Value) -> Result<T> {
    serde_json::from_value(params).map_err(|source| AugmentError::InvalidParams {
        name: name.to_string(),
        source,
    })
}
