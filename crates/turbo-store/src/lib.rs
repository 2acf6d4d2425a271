//! In-process JSON document store for the TurboCommerce order engine.
//!
//! Documents are serde values kept in named collections. Queries filter on
//! dotted field paths, sort on a single field, and cap the result size, which
//! is all the order engine needs from its backing store.
//!
//! # Example
//!
//! ```rust,ignore
//! use turbo_store::{DocumentStore, Filter, Query, Sort};
//!
//! let store = DocumentStore::new();
//! store.insert("orders", "ord-1", &order).await?;
//!
//! let recent: Vec<Order> = store
//!     .find(
//!         "orders",
//!         &Query::new(Filter::new().gte("created_at", 1_700_000_000_000_i64))
//!             .sort(Sort::desc("created_at"))
//!             .limit(10),
//!     )
//!     .await?;
//! ```

mod document;
mod error;
mod filter;
mod store;

pub use document::Document;
pub use error::StoreError;
pub use filter::{Condition, Direction, Filter, Query, Sort};
pub use store::DocumentStore;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Direction, Document, DocumentStore, Filter, Query, Sort, StoreError};
}
