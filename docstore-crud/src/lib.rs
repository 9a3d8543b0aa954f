//! # docstore-crud
//!
//! A CRUD translation layer for document databases. It turns framework-neutral
//! CRUD requests (filters, sorting, pagination, field selection, payload
//! merging) into document-store queries and writes.
//!
//! ## Features
//!
//! - **Schemas**: per-collection field declarations with one identity field
//! - **Query translation**: a closed operator set mapped onto native comparisons
//! - **Lifecycle**: `createdAt`/`updatedAt` stamping and soft delete with recovery
//! - **Bulk create**: one atomic batch, all or nothing
//! - **Field visibility**: `allow`, `exclude` and `persist` rules per route
//! - **In-memory store**: a complete [`store::MemoryStore`] for tests and tooling
//!
//! ## Example
//!
//! ```rust
//! use docstore_crud::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> docstore_crud::Result<()> {
//! let repository = DocumentRepository::from_config(
//!     Arc::new(MemoryStore::new()),
//!     SchemaConfig::new("kits")
//!         .id_field("id")
//!         .field("name")
//!         .soft_delete(true),
//! )?;
//! let service = CrudService::new(repository);
//!
//! let kit = json!({"id": "kit-1", "name": "A"}).as_object().cloned().unwrap();
//! service.create_one(&CrudRequest::default(), kit).await?;
//!
//! let kits = service.get_many(&CrudRequest::default()).await?;
//! assert_eq!(kits.len(), 1);
//! assert_eq!(kits[0]["name"], "A");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crud;
pub mod error;
pub mod observability;
pub mod query;
pub mod repository;
pub mod schema;
pub mod store;

pub use error::{Error, Result};

/// Commonly used types
pub mod prelude {
    pub use crate::config::{CollectionConfig, Config};
    pub use crate::crud::{CrudRequest, CrudService, ListResponse, ParamOption, ParsedRequest, QueryOptions, RequestOptions};
    pub use crate::error::{Error, Result};
    pub use crate::observability::init_tracing;
    pub use crate::query::{FilterCondition, FilterOperator, OrderDirection, SearchCondition, SortSpec};
    pub use crate::repository::{CrudRepository, DocumentRepository, Entity, LifecycleOptions};
    pub use crate::schema::{Schema, SchemaConfig};
    pub use crate::store::{DocumentStore, StoreError};

    #[cfg(feature = "memory-store")]
    pub use crate::store::MemoryStore;
}
