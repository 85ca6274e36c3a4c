//! Name-to-constructor registry backing declarative pipeline configuration.
//!
//! The registry maps a transform name to a constructor that decodes a JSON
//! parameter object and returns the boxed transform. A process-wide instance
//! pre-populated with the built-ins is available through [`global`]; callers
//! that need a custom catalog (extra transforms, or a restricted set) build
//! their own [`Registry`] and pass it to
//! [`Compose::from_config_with`](crate::Compose::from_config_with).

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::{AugmentError, Result};
use crate::transform::Transform;
use crate::transforms::{
    ColorJitter, GaussNoise, MultiplicativeNoise, Normalize, RandomCrop, RandomFlip, Resize,
    Rotate,
};

/// Decodes a JSON parameter object into a ready-to-run transform.
pub type Constructor = fn(serde_json::Value) -> Result<Box<dyn Transform>>;

const BUILTINS: &[(&str, Constructor)] = &[
    ("Resize", Resize::from_spec),
    ("RandomFlip", RandomFlip::from_spec),
    ("Rotate", Rotate::from_spec),
    ("RandomCrop", RandomCrop::from_spec),
    ("Normalize", Normalize::from_spec),
    ("ColorJitter", ColorJitter::from_spec),
    ("MultiplicativeNoise", MultiplicativeNoise::from_spec),
    ("GaussNoise", GaussNoise::from_spec),
];

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::with_builtins);

/// The shared registry holding every built-in transform.
pub fn global() -> &'static Registry {
    &GLOBAL
}

#[derive(Default)]
pub struct Registry {
    constructors: HashMap<String, Constructor>,
}

impl Registry {
    /// An empty registry with no transforms registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the built-in transforms.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, constructor) in BUILTINS {
            registry
                .register(name, *constructor)
                .expect("built-in transform names are unique");
        }
        registry
    }

    /// Registers a constructor under `name`. Names are unique; registering
    /// a taken name fails rather than silently replacing the entry.
    pub fn register(&mut self, name: &str, constructor: Constructor) -> Result<()> {
        if self.constructors.contains_key(name) {
            return Err(AugmentError::DuplicateName {
                name: name.to_string(),
            });
        }
        self.constructors.insert(name.to_string(), constructor);
        debug!(transform = name, "registered transform");
        Ok(())
    }

    /// Instantiates the transform registered under `name` from `params`.
    /// A `null` parameter value stands for "all defaults".
    pub fn resolve(&self, name: &str, params: serde_json::Value) -> Result<Box<dyn Transform>> {
        let constructor =
            self.constructors
                .get(name)
                .copied()
                .ok_or_else(|| AugmentError::UnknownTransform {
                    name: name.to_string(),
                })?;
        let params = if params.is_null() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            params
        };
        constructor(params)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}
