pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::query::{Condition, QuerySpec};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// A stored entity: flat JSON object keyed by field name, including the
/// bookkeeping fields (`id`, `created_at`, `updated_at`) merged in on read.
pub type Document = serde_json::Map<String, serde_json::Value>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint violated on {collection}")]
    UniqueViolation { collection: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Storage seam for document collections.
///
/// The SQL-backed store is the production implementation; the in-memory store
/// backs tests and local development. Both honor the same unique-violation
/// contract so conflict handling upstream stays backend-agnostic.
#[async_trait]
pub trait Store: Send + Sync {
    /// Run a translated query against a collection.
    async fn find(&self, collection: &str, spec: &QuerySpec) -> Result<Vec<Document>, StoreError>;

    async fn find_by_id(&self, collection: &str, id: Uuid)
        -> Result<Option<Document>, StoreError>;

    /// First document matching all conditions, in storage order.
    async fn find_one(
        &self,
        collection: &str,
        conditions: &[Condition],
    ) -> Result<Option<Document>, StoreError>;

    /// Insert a new document, returning it with `id` and timestamps filled in.
    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError>;

    /// Full-document replace. Bookkeeping fields in the incoming document are
    /// ignored: `id` and `created_at` are preserved, `updated_at` is stamped.
    /// Returns `None` when the id does not exist.
    async fn update_by_id(
        &self,
        collection: &str,
        id: Uuid,
        doc: Document,
    ) -> Result<Option<Document>, StoreError>;

    /// Returns whether a document was deleted.
    async fn delete_by_id(&self, collection: &str, id: Uuid) -> Result<bool, StoreError>;
}
