//! Document store capability
//!
//! [`DocumentStore`] is the boundary to the underlying document database. The
//! repository only ever talks to a store through this trait, so any backend
//! offering per-document reads and writes, collection queries and atomic
//! batches can sit underneath it.
//!
//! With the `memory-store` feature, [`MemoryStore`] provides an in-process
//! implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::query::Query;

#[cfg(feature = "memory-store")]
mod memory;

#[cfg(feature = "memory-store")]
pub use memory::MemoryStore;

/// Stored fields of a document, without its identity
pub type Document = Map<String, Value>;

/// A document read from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Document identity
    pub id: String,
    /// Stored fields
    pub data: Document,
}

impl DocumentSnapshot {
    /// Create a new snapshot
    pub fn new(id: impl Into<String>, data: Document) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Errors raised by a document store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// `create` targeted an existing document
    #[error("document '{id}' already exists in collection '{collection}'")]
    AlreadyExists {
        /// Collection name
        collection: String,
        /// Document identity
        id: String,
    },

    /// `update` targeted a missing document
    #[error("document '{id}' does not exist in collection '{collection}'")]
    NotFound {
        /// Collection name
        collection: String,
        /// Document identity
        id: String,
    },

    /// The store refused the write
    #[error("write to '{collection}/{id}' was rejected: {reason}")]
    PermissionDenied {
        /// Collection name
        collection: String,
        /// Document identity
        id: String,
        /// Reason reported by the store
        reason: String,
    },

    /// The query cannot be evaluated
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The store could not be reached
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

/// Kind of write inside a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// Fails if the document exists
    Create,
    /// Create or replace
    Set,
}

/// One write inside a [`WriteBatch`]
#[derive(Debug, Clone, PartialEq)]
pub struct BatchWrite {
    /// Write semantics
    pub kind: WriteKind,
    /// Target collection
    pub collection: String,
    /// Target document identity
    pub id: String,
    /// Fields to write
    pub data: Document,
}

/// Accumulator of writes committed as one atomic unit
///
/// # Example
///
/// ```rust
/// use docstore_crud::store::{Document, WriteBatch};
///
/// let mut batch = WriteBatch::new();
/// batch.create("kits", "1", Document::new());
/// batch.set("kits", "2", Document::new());
/// assert_eq!(batch.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<BatchWrite>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a create (fails the whole batch if the document exists)
    pub fn create(&mut self, collection: impl Into<String>, id: impl Into<String>, data: Document) -> &mut Self {
        self.push(WriteKind::Create, collection.into(), id.into(), data)
    }

    /// Queue a create-or-replace
    pub fn set(&mut self, collection: impl Into<String>, id: impl Into<String>, data: Document) -> &mut Self {
        self.push(WriteKind::Set, collection.into(), id.into(), data)
    }

    fn push(&mut self, kind: WriteKind, collection: String, id: String, data: Document) -> &mut Self {
        self.writes.push(BatchWrite {
            kind,
            collection,
            id,
            data,
        });
        self
    }

    /// Number of queued writes
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Queued writes in order
    pub fn writes(&self) -> &[BatchWrite] {
        &self.writes
    }

    /// Consume the batch
    pub fn into_writes(self) -> Vec<BatchWrite> {
        self.writes
    }
}

/// Capability offered by a document database
///
/// Implementations must be safe for concurrent use; callers share one handle
/// across requests.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document
    async fn get(&self, collection: &str, id: &str) -> Result<Option<DocumentSnapshot>, StoreError>;

    /// Write a new document; fails with [`StoreError::AlreadyExists`] if present
    async fn create(&self, collection: &str, id: &str, data: Document) -> Result<(), StoreError>;

    /// Create or replace a document
    async fn set(&self, collection: &str, id: &str, data: Document) -> Result<(), StoreError>;

    /// Merge fields into an existing document; fails with [`StoreError::NotFound`] if absent
    async fn update(&self, collection: &str, id: &str, data: Document) -> Result<(), StoreError>;

    /// Remove a document; succeeds if it does not exist
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Run a query and return matching documents
    async fn run_query(&self, query: &Query) -> Result<Vec<DocumentSnapshot>, StoreError>;

    /// Count documents matching a query
    ///
    /// The default materializes the full result set. Stores with a native
    /// aggregation should override it.
    async fn count(&self, query: &Query) -> Result<u64, StoreError> {
        Ok(self.run_query(query).await?.len() as u64)
    }

    /// Apply every write in the batch, or none of them
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Generate a fresh document identity
    fn new_document_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}
