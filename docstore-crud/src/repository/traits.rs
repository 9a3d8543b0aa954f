//! Repository trait definitions
//!
//! [`CrudRepository`] is the narrow interface the CRUD orchestrator depends on.
//! It uses RPITIT (Return Position Impl Trait In Traits), so implementations
//! write plain `async fn`s.

use serde::{Deserialize, Serialize};
use std::future::Future;

use super::Entity;
use crate::error::Result;
use crate::query::QueryBuilder;
use crate::schema::Schema;

/// Per-call overrides of the schema's lifecycle defaults
///
/// Each flag is resolved on its own: `Some` wins, `None` falls back to the
/// schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleOptions {
    /// Override timestamp stamping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<bool>,
    /// Override soft delete
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "softDelete")]
    pub soft_delete: Option<bool>,
}

impl LifecycleOptions {
    /// Force soft delete on or off
    #[must_use]
    pub fn with_soft_delete(mut self, enabled: bool) -> Self {
        self.soft_delete = Some(enabled);
        self
    }

    /// Force timestamping on or off
    #[must_use]
    pub fn with_timestamp(mut self, enabled: bool) -> Self {
        self.timestamp = Some(enabled);
        self
    }

    /// Effective policy against a schema
    pub fn resolve(options: Option<&Self>, schema: &Schema) -> LifecyclePolicy {
        LifecyclePolicy {
            timestamp: options
                .and_then(|o| o.timestamp)
                .unwrap_or(schema.timestamp_enabled()),
            soft_delete: options
                .and_then(|o| o.soft_delete)
                .unwrap_or(schema.soft_delete_enabled()),
        }
    }
}

/// Lifecycle flags after resolving overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// Stamp `createdAt`/`updatedAt`
    pub timestamp: bool,
    /// Flag instead of physically deleting
    pub soft_delete: bool,
}

/// Entity persistence for one collection
///
/// Implementations own id resolution, timestamp stamping and soft-delete
/// bookkeeping. Queries are built with [`build_query`](Self::build_query),
/// refined by the caller, and handed back to [`find`](Self::find) or
/// [`count`](Self::count).
pub trait CrudRepository: Send + Sync {
    /// Schema of the collection
    fn schema(&self) -> &Schema;

    /// Builder scoped to the collection
    ///
    /// When soft delete is in effect and `include_deleted` is false the builder
    /// already excludes soft-deleted documents.
    fn build_query(&self, include_deleted: bool, options: Option<&LifecycleOptions>) -> QueryBuilder;

    /// Execute a query and map rows to entities
    fn find(&self, query: QueryBuilder) -> impl Future<Output = Result<Vec<Entity>>> + Send;

    /// Execute a query and return the number of matching rows
    fn count(&self, query: QueryBuilder) -> impl Future<Output = Result<u64>> + Send;

    /// Insert a new document; never overwrites an existing one
    fn create_one(
        &self,
        data: Entity,
        options: Option<&LifecycleOptions>,
    ) -> impl Future<Output = Result<Entity>> + Send;

    /// Insert or replace a document
    fn save_one(
        &self,
        data: Entity,
        options: Option<&LifecycleOptions>,
    ) -> impl Future<Output = Result<Entity>> + Send;

    /// Soft or hard delete; deleting a missing document succeeds
    fn remove_one(
        &self,
        id: &str,
        options: Option<&LifecycleOptions>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Clear the soft-delete flag and return the entity
    fn recover_one(
        &self,
        id: &str,
        options: Option<&LifecycleOptions>,
    ) -> impl Future<Output = Result<Entity>> + Send;

    /// Insert every item in one atomic batch; returns the ids only
    fn create_many(
        &self,
        items: Vec<Entity>,
        options: Option<&LifecycleOptions>,
    ) -> impl Future<Output = Result<Vec<Entity>>> + Send;
}
