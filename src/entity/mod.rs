//! Entities: typed models, their descriptors, payload conversion and validation.

mod descriptor;
pub mod payload;
mod validation;

pub use descriptor::*;
pub use payload::Row;
pub use validation::{RequestValidator, ValidationRule};

use serde::{de::DeserializeOwned, Serialize};

/// A model that can be served by a viewset.
///
/// `Default` is the blank instance request bodies are decoded into, so fields missing from a
/// payload keep their zero value.
pub trait Entity: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static {
    /// Shape of the model. Called once when a viewset is built.
    fn descriptor() -> EntityDescriptor;

    /// Primary key, `None` before the object is stored.
    fn id(&self) -> Option<i64>;
}
