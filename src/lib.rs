//! Composable image augmentation for training pipelines.
//!
//! A [`Sample`] bundles an image with its optional mask, bounding boxes and
//! category ids. A [`Compose`] pipeline threads the sample through a
//! sequence of [`Transform`]s, each of which keeps every annotation target
//! geometrically consistent with the image by deriving all of its per-call
//! randomness once and reusing it across targets.
//!
//! Pipelines are built either programmatically:
//!
//! ```
//! use augmentor::transforms::geometric::FlipDirection;
//! use augmentor::transforms::{RandomFlip, Resize};
//! use augmentor::Compose;
//!
//! # fn main() -> augmentor::Result<()> {
//! let pipeline = Compose::new(vec![
//!     Box::new(Resize::new(256, 256)?),
//!     Box::new(RandomFlip::new(FlipDirection::Horizontal)?),
//! ]);
//! # Ok(())
//! # }
//! ```
//!
//! or declaratively from JSON through the transform [`Registry`]:
//!
//! ```
//! use augmentor::Compose;
//!
//! # fn main() -> augmentor::Result<()> {
//! let pipeline = Compose::from_json(
//!     r#"[
//!         {"name": "Resize", "params": {"height": 256, "width": 256}},
//!         {"name": "RandomFlip", "params": {"prob": 0.5}},
//!         {"name": "Normalize"}
//!     ]"#,
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod compose;
pub mod error;
pub mod ops;
pub mod registry;
pub mod sample;
pub mod transform;
pub mod transforms;

pub use compose::{Compose, TransformSpec};
pub use error::{AugmentError, Result};
pub use registry::{global, Constructor, Registry};
pub use sample::{BBox, Image, Sample, TailValue};
pub use transform::{Augmentation, Targets, Transform};
