//! Collection storage and query execution.

use crate::{Document, Filter, Query, StoreError};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process document store.
///
/// Collections are created on first write and keep insertion order, so an
/// unsorted query returns documents in the order they were written.
#[derive(Debug, Default)]
pub struct DocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new document.
    ///
    /// Fails with [`StoreError::Duplicate`] if the id is already taken.
    pub async fn insert<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let doc = Document::from_value(id, value)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|d| d.id == id) {
            return Err(StoreError::Duplicate {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        docs.push(doc);
        tracing::trace!(collection, id, "document inserted");
        Ok(())
    }

    /// Replace an existing document, keeping its position.
    ///
    /// Fails with [`StoreError::NotFound`] if the id is unknown.
    pub async fn replace<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let doc = Document::from_value(id, value)?;
        let mut collections = self.collections.write().await;
        let slot = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        *slot = doc;
        Ok(())
    }

    /// Insert or replace a document. Returns `true` if it was newly inserted.
    pub async fn upsert<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        value: &T,
    ) -> Result<bool, StoreError> {
        let doc = Document::from_value(id, value)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|d| d.id == id) {
            Some(slot) => {
                *slot = doc;
                Ok(false)
            }
            None => {
                docs.push(doc);
                Ok(true)
            }
        }
    }

    /// Fetch a document by id.
    pub async fn get<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, StoreError> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .map(Document::deserialize)
            .transpose()
    }

    /// Run a query and deserialize the matching documents.
    pub async fn find<T: DeserializeOwned>(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<T>, StoreError> {
        let matched = self.find_documents(collection, query).await;
        matched.iter().map(Document::deserialize).collect()
    }

    /// Run a query and return the first match.
    pub async fn find_one<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<T>, StoreError> {
        let query = Query::new(filter.clone()).limit(1);
        let mut found: Vec<T> = self.find(collection, &query).await?;
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.swap_remove(0))
        })
    }

    /// Run a query and return the raw documents.
    pub async fn find_documents(&self, collection: &str, query: &Query) -> Vec<Document> {
        let collections = self.collections.read().await;
        let mut matched: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| query.filter.matches(d))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(collections);

        if let Some(ref sort) = query.sort {
            matched.sort_by(|a, b| sort.compare(a, b));
        }
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        matched
    }

    /// Count documents matching a filter.
    pub async fn count(&self, collection: &str, filter: &Filter) -> u64 {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).count() as u64)
            .unwrap_or(0)
    }

    /// Bulk-insert documents, e.g. from a fixture or dump.
    ///
    /// Stops at the first duplicate id; documents before it stay inserted.
    pub async fn import<T: Serialize>(
        &self,
        collection: &str,
        items: impl IntoIterator<Item = (String, T)>,
    ) -> Result<usize, StoreError> {
        let mut imported = 0;
        for (id, value) in items {
            self.insert(collection, &id, &value).await?;
            imported += 1;
        }
        tracing::debug!(collection, imported, "documents imported");
        Ok(imported)
    }

    /// Number of documents in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map(Vec::len).unwrap_or(0)
    }

    /// Check if a collection is empty or missing.
    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}
