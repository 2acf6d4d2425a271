//! Store error types.

use thiserror::Error;

/// Errors that can occur when using the document store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A document with this id already exists in the collection.
    #[error("Duplicate document {id} in {collection}")]
    Duplicate { collection: String, id: String },

    /// No document with this id exists in the collection.
    #[error("Document {id} not found in {collection}")]
    NotFound { collection: String, id: String },

    /// Failed to serialize a value into a document.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Failed to deserialize a document into a value.
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}
