//! Document store abstraction and backends.

mod memory;
mod supabase;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Document, Fields};

pub use memory::InMemoryDocumentStore;
pub use supabase::SupabaseDocumentStore;

/// Sort direction for ordered queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// `ORDER BY` clause of a collection query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Collection-scoped CRUD over schemaless documents keyed by string id.
///
/// Implementations must be safe to share between concurrent operations.
/// Identifiers are always assigned by the store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document and return the identifier the store assigned.
    async fn create(&self, collection: &str, fields: Fields) -> Result<String>;

    /// Fetch a document, `Ok(None)` when nothing exists at `id`.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Fetch every document of a collection in the requested order.
    async fn list(&self, collection: &str, order: &OrderBy) -> Result<Vec<Document>>;

    /// Overwrite the fields of an existing document.
    ///
    /// Fails with `Error::NotFound` when the document does not exist.
    async fn replace(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    /// Remove a document. Removing a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;
}
