use crate::error::{AugmentError, Result};
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

/// Image and mask buffer type.
///
/// Rank 2 `(H, W)` for grayscale or rank 3 `(H, W, C)` for multi-channel
/// data. A singleton channel dimension `(H, W, 1)` is preserved through
/// every kernel. Values are conventionally in `[0, 255]`; `Normalize` is
/// the one transform whose output leaves that range.
pub type Image = ArrayD<f32>;

/// Opaque suffix element carried through a bounding box unmodified
/// (a class label, a score, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TailValue {
    Num(f64),
    Text(String),
}

impl From<f64> for TailValue {
    fn from(value: f64) -> Self {
        TailValue::Num(value)
    }
}

impl From<&str> for TailValue {
    fn from(value: &str) -> Self {
        TailValue::Text(value.to_string())
    }
}

impl From<String> for TailValue {
    fn from(value: String) -> Self {
        TailValue::Text(value)
    }
}

/// Axis-aligned bounding box in absolute pixel coordinates, with an
/// opaque tail suffix that geometric transforms never touch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    #[serde(default)]
    pub tail: Vec<TailValue>,
}

impl BBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
            tail: Vec::new(),
        }
    }

    pub fn with_tail(mut self, tail: Vec<TailValue>) -> Self {
        self.tail = tail;
        self
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Restores the corner ordering invariant (`x_min <= x_max`,
    /// `y_min <= y_max`) after a reflection or rotation.
    pub fn ordered(mut self) -> Self {
        if self.x_min > self.x_max {
            std::mem::swap(&mut self.x_min, &mut self.x_max);
        }
        if self.y_min > self.y_max {
            std::mem::swap(&mut self.y_min, &mut self.y_max);
        }
        self
    }
}

/// The bundle of co-transformed targets threaded through one pipeline call.
///
/// `image` is mandatory; the annotation targets are optional and simply
/// skipped by transforms when absent. `category_ids` is aligned by index
/// with `bboxes` and is only ever reordered or filtered in lockstep.
#[derive(Clone, Debug)]
pub struct Sample {
    pub image: Image,
    pub mask: Option<Image>,
    pub bboxes: Option<Vec<BBox>>,
    pub category_ids: Option<Vec<i64>>,
}

impl Sample {
    pub fn new(image: Image) -> Self {
        Self {
            image,
            mask: None,
            bboxes: None,
            category_ids: None,
        }
    }

    pub fn with_mask(mut self, mask: Image) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_bboxes(mut self, bboxes: Vec<BBox>) -> Self {
        self.bboxes = Some(bboxes);
        self
    }

    pub fn with_category_ids(mut self, category_ids: Vec<i64>) -> Self {
        self.category_ids = Some(category_ids);
        self
    }

    pub fn rows(&self) -> usize {
        self.image.shape()[0]
    }

    pub fn cols(&self) -> usize {
        self.image.shape()[1]
    }

    /// Checks the structural invariants the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        check_rank("image", &self.image)?;
        if let Some(mask) = &self.mask {
            check_rank("mask", mask)?;
        }
        match (&self.bboxes, &self.category_ids) {
            (Some(bboxes), Some(ids)) if bboxes.len() != ids.len() => {
                Err(AugmentError::shape(format!(
                    "category_ids length {} does not match bboxes length {}",
                    ids.len(),
                    bboxes.len()
                )))
            }
            (None, Some(_)) => Err(AugmentError::shape(
                "category_ids present without bboxes".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

fn check_rank(name: &str, image: &Image) -> Result<()> {
    match image.ndim() {
        2 | 3 => Ok(()),
        rank => Err(AugmentError::shape(format!(
            "{name} must be a (H, W) or (H, W, C) array, got rank {rank}"
        ))),
    }
}
