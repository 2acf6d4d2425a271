//! Stored documents and field access.

use crate::StoreError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// A document held in a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document id, unique within its collection.
    pub id: String,
    /// Document body.
    pub body: Value,
}

impl Document {
    /// Serialize a value into a document.
    pub fn from_value<T: Serialize>(id: impl Into<String>, value: &T) -> Result<Self, StoreError> {
        let body =
            serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Self {
            id: id.into(),
            body,
        })
    }

    /// Look up a field by dotted path (e.g. `shipping_address.email`).
    pub fn field(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.body, |value, segment| value.get(segment))
    }

    /// Deserialize the document body into a type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        T::deserialize(&self.body).map_err(|e| StoreError::Deserialize(format!("{}: {}", self.id, e)))
    }
}
