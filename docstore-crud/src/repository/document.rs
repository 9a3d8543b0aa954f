//! Document-store backed repository

use serde_json::Value;
use std::sync::Arc;

use super::clock::{timestamp_value, Clock, SystemClock};
use super::traits::{CrudRepository, LifecycleOptions, LifecyclePolicy};
use super::{identity_string, Entity};
use crate::error::{Error, Result};
use crate::query::{FilterOperator, QueryBuilder};
use crate::schema::{Schema, SchemaConfig};
use crate::store::{Document, DocumentSnapshot, DocumentStore, StoreError, WriteBatch};

/// Repository for one collection of a [`DocumentStore`]
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use docstore_crud::repository::{CrudRepository, DocumentRepository};
/// use docstore_crud::schema::SchemaConfig;
/// use docstore_crud::store::MemoryStore;
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> docstore_crud::Result<()> {
/// let repository = DocumentRepository::from_config(
///     Arc::new(MemoryStore::new()),
///     SchemaConfig::new("kits").id_field("id").field("name").soft_delete(true),
/// )?;
///
/// let data = json!({"name": "A"}).as_object().cloned().unwrap();
/// let kit = repository.create_one(data, None).await?;
/// assert_eq!(kit["isDeleted"], false);
/// assert_eq!(kit["createdAt"], kit["updatedAt"]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DocumentRepository {
    store: Arc<dyn DocumentStore>,
    schema: Arc<Schema>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for DocumentRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentRepository")
            .field("collection", &self.schema.collection_name())
            .finish_non_exhaustive()
    }
}

impl DocumentRepository {
    /// Create a repository over a validated schema
    pub fn new(store: Arc<dyn DocumentStore>, schema: Schema) -> Self {
        Self {
            store,
            schema: Arc::new(schema),
            clock: Arc::new(SystemClock),
        }
    }

    /// Validate `config` and create a repository
    ///
    /// Fails with [`Error::Configuration`] when the schema is invalid.
    pub fn from_config(store: Arc<dyn DocumentStore>, config: SchemaConfig) -> Result<Self> {
        Ok(Self::new(store, Schema::new(config)?))
    }

    /// Replace the time source
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Underlying store handle
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    fn collection(&self) -> &str {
        self.schema.collection_name()
    }

    fn policy(&self, options: Option<&LifecycleOptions>) -> LifecyclePolicy {
        LifecycleOptions::resolve(options, &self.schema)
    }

    /// Identity carried by `data`, if any
    fn supplied_id(&self, data: &Entity) -> Result<Option<String>> {
        match data.get(self.schema.id_field()) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(id)) if id.is_empty() => Ok(None),
            Some(value) => identity_string(value).map(Some).ok_or_else(|| {
                Error::BadRequest(format!(
                    "'{}' cannot be used as a document id in collection '{}'",
                    value,
                    self.collection()
                ))
            }),
        }
    }

    fn resolve_id(&self, data: &Entity) -> Result<String> {
        Ok(match self.supplied_id(data)? {
            Some(id) => id,
            None => self.store.new_document_id(),
        })
    }

    /// Stored payload for a new document: id stripped, lifecycle fields stamped
    fn new_document(&self, mut data: Entity, policy: LifecyclePolicy, now: &Value) -> Document {
        data.remove(self.schema.id_field());
        if policy.timestamp {
            data.insert(self.schema.created_at_field().to_string(), now.clone());
            data.insert(self.schema.updated_at_field().to_string(), now.clone());
        }
        if policy.soft_delete {
            data.insert(self.schema.deleted_field().to_string(), Value::Bool(false));
        }
        data
    }

    fn to_entity(&self, snapshot: DocumentSnapshot) -> Entity {
        let mut entity = snapshot.data;
        entity.insert(self.schema.id_field().to_string(), Value::String(snapshot.id));
        entity
    }

    fn id_only(&self, id: String) -> Entity {
        let mut entity = Entity::new();
        entity.insert(self.schema.id_field().to_string(), Value::String(id));
        entity
    }

    async fn read_back(&self, id: &str) -> Result<Entity> {
        let snapshot = self
            .store
            .get(self.collection(), id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                collection: self.collection().to_string(),
                id: id.to_string(),
            })?;
        Ok(self.to_entity(snapshot))
    }
}

impl CrudRepository for DocumentRepository {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn build_query(&self, include_deleted: bool, options: Option<&LifecycleOptions>) -> QueryBuilder {
        let query = QueryBuilder::new(self.collection());
        if self.policy(options).soft_delete && !include_deleted {
            query.filter(self.schema.deleted_field(), FilterOperator::Eq, false)
        } else {
            query
        }
    }

    async fn find(&self, query: QueryBuilder) -> Result<Vec<Entity>> {
        let rows = query.execute(self.store.as_ref()).await?;
        tracing::debug!(collection = self.collection(), rows = rows.len(), "query executed");
        Ok(rows.into_iter().map(|row| self.to_entity(row)).collect())
    }

    async fn count(&self, query: QueryBuilder) -> Result<u64> {
        Ok(query.count(self.store.as_ref()).await?)
    }

    async fn create_one(&self, data: Entity, options: Option<&LifecycleOptions>) -> Result<Entity> {
        let policy = self.policy(options);
        let id = self.resolve_id(&data)?;
        let now = timestamp_value(self.clock.now());

        let document = self.new_document(data, policy, &now);
        self.store.create(self.collection(), &id, document).await?;
        tracing::debug!(collection = self.collection(), id = %id, "document created");

        self.read_back(&id).await
    }

    async fn save_one(&self, data: Entity, options: Option<&LifecycleOptions>) -> Result<Entity> {
        let policy = self.policy(options);
        let id = self.resolve_id(&data)?;
        let existing = self.store.get(self.collection(), &id).await?;

        let mut document = data;
        document.remove(self.schema.id_field());

        if policy.timestamp {
            let now = timestamp_value(self.clock.now());
            let created_at = self.schema.created_at_field();
            match &existing {
                Some(snapshot) => {
                    if let Some(stored) = snapshot.data.get(created_at) {
                        document.insert(created_at.to_string(), stored.clone());
                    }
                }
                None => {
                    document.insert(created_at.to_string(), now.clone());
                }
            }
            document.insert(self.schema.updated_at_field().to_string(), now);
        }

        if policy.soft_delete {
            let deleted = self.schema.deleted_field();
            if document.get(deleted).map_or(true, Value::is_null) {
                document.insert(deleted.to_string(), Value::Bool(false));
            }
        }

        self.store.set(self.collection(), &id, document).await?;
        tracing::debug!(
            collection = self.collection(),
            id = %id,
            created = existing.is_none(),
            "document saved"
        );

        self.read_back(&id).await
    }

    async fn remove_one(&self, id: &str, options: Option<&LifecycleOptions>) -> Result<()> {
        let policy = self.policy(options);

        if !policy.soft_delete {
            self.store.delete(self.collection(), id).await?;
            tracing::debug!(collection = self.collection(), id, "document deleted");
            return Ok(());
        }

        let mut patch = Document::new();
        patch.insert(self.schema.deleted_field().to_string(), Value::Bool(true));
        if policy.timestamp {
            patch.insert(
                self.schema.updated_at_field().to_string(),
                timestamp_value(self.clock.now()),
            );
        }

        match self.store.update(self.collection(), id, patch).await {
            Ok(()) => {
                tracing::debug!(collection = self.collection(), id, "document soft deleted");
                Ok(())
            }
            Err(StoreError::NotFound { .. }) => {
                tracing::debug!(collection = self.collection(), id, "nothing to soft delete");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn recover_one(&self, id: &str, options: Option<&LifecycleOptions>) -> Result<Entity> {
        let policy = self.policy(options);
        if !policy.soft_delete {
            return Err(Error::PreconditionFailed(format!(
                "collection '{}' does not use soft delete; nothing to recover",
                self.collection()
            )));
        }

        let mut patch = Document::new();
        patch.insert(self.schema.deleted_field().to_string(), Value::Bool(false));
        if policy.timestamp {
            patch.insert(
                self.schema.updated_at_field().to_string(),
                timestamp_value(self.clock.now()),
            );
        }

        self.store.update(self.collection(), id, patch).await?;
        tracing::debug!(collection = self.collection(), id, "document recovered");

        self.read_back(id).await
    }

    async fn create_many(&self, items: Vec<Entity>, options: Option<&LifecycleOptions>) -> Result<Vec<Entity>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let policy = self.policy(options);
        let now = timestamp_value(self.clock.now());

        let mut batch = WriteBatch::new();
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            let id = self.resolve_id(&item)?;
            batch.create(self.collection(), id.clone(), self.new_document(item, policy, &now));
            ids.push(id);
        }

        self.store.commit(batch).await?;
        tracing::debug!(collection = self.collection(), documents = ids.len(), "batch created");

        Ok(ids.into_iter().map(|id| self.id_only(id)).collect())
    }
}

#[cfg(all(test, feature = "memory-store"))]
mod tests {
    use super::*;
    use crate::repository::ManualClock;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn entity(value: Value) -> Entity {
        value.as_object().cloned().expect("test entities are objects")
    }

    fn kits_config() -> SchemaConfig {
        SchemaConfig::new("kits")
            .id_field("id")
            .field("name")
            .field("createdAt")
            .field("updatedAt")
            .field("isDeleted")
            .timestamp(true)
            .soft_delete(true)
    }

    struct Fixture {
        store: MemoryStore,
        clock: Arc<ManualClock>,
        repository: DocumentRepository,
    }

    fn fixture(config: SchemaConfig) -> Fixture {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let repository = DocumentRepository::from_config(Arc::new(store.clone()), config)
            .unwrap()
            .with_clock(clock.clone());
        Fixture {
            store,
            clock,
            repository,
        }
    }

    #[test]
    fn test_two_id_fields_fail_at_construction() {
        let err = DocumentRepository::from_config(
            Arc::new(MemoryStore::new()),
            SchemaConfig::new("kits").id_field("id").id_field("key"),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Configuration(_)));
    }

    #[tokio::test]
    async fn test_create_one_stamps_lifecycle_fields() {
        let f = fixture(kits_config());
        let kit = f.repository.create_one(entity(json!({"name": "A"})), None).await.unwrap();

        assert_eq!(kit["name"], "A");
        assert_eq!(kit["isDeleted"], false);
        assert_eq!(kit["createdAt"], "2024-01-01T00:00:00.000000Z");
        assert_eq!(kit["createdAt"], kit["updatedAt"]);
        assert!(kit["id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn test_create_one_uses_supplied_id_and_strips_it() {
        let f = fixture(kits_config());
        let kit = f
            .repository
            .create_one(entity(json!({"id": "kit-1", "name": "A"})), None)
            .await
            .unwrap();
        assert_eq!(kit["id"], "kit-1");

        let stored = f.store.get("kits", "kit-1").await.unwrap().unwrap();
        assert!(!stored.data.contains_key("id"));
    }

    #[tokio::test]
    async fn test_create_one_accepts_numeric_id() {
        let f = fixture(kits_config());
        let kit = f
            .repository
            .create_one(entity(json!({"id": 7, "name": "A"})), None)
            .await
            .unwrap();

        assert_eq!(kit["id"], "7");
    }

    #[tokio::test]
    async fn test_create_one_rejects_object_id() {
        let f = fixture(kits_config());
        let err = f
            .repository
            .create_one(entity(json!({"id": {"nested": true}})), None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_create_one_never_overwrites() {
        let f = fixture(kits_config());
        f.repository
            .create_one(entity(json!({"id": "kit-1", "name": "A"})), None)
            .await
            .unwrap();

        let err = f
            .repository
            .create_one(entity(json!({"id": "kit-1", "name": "B"})), None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Store(StoreError::AlreadyExists { .. })));
        let stored = f.store.get("kits", "kit-1").await.unwrap().unwrap();
        assert_eq!(stored.data["name"], "A");
    }

    #[tokio::test]
    async fn test_save_one_keeps_created_at_and_advances_updated_at() {
        let f = fixture(kits_config());
        let first = f
            .repository
            .save_one(entity(json!({"id": "kit-1", "name": "A"})), None)
            .await
            .unwrap();
        assert_eq!(first["createdAt"], first["updatedAt"]);

        f.clock.advance(Duration::seconds(30));
        let second = f
            .repository
            .save_one(entity(json!({"id": "kit-1", "name": "B"})), None)
            .await
            .unwrap();

        assert_eq!(second["name"], "B");
        assert_eq!(second["createdAt"], first["createdAt"]);
        assert!(second["updatedAt"].as_str().unwrap() > first["updatedAt"].as_str().unwrap());
    }

    #[tokio::test]
    async fn test_save_one_keeps_explicit_deleted_flag() {
        let f = fixture(kits_config());
        let kit = f
            .repository
            .save_one(entity(json!({"id": "kit-1", "isDeleted": true})), None)
            .await
            .unwrap();
        assert_eq!(kit["isDeleted"], true);

        let kit = f
            .repository
            .save_one(entity(json!({"id": "kit-2"})), None)
            .await
            .unwrap();
        assert_eq!(kit["isDeleted"], false);
    }

    #[tokio::test]
    async fn test_timestamps_can_be_disabled_per_call() {
        let f = fixture(kits_config());
        let options = LifecycleOptions::default().with_timestamp(false);
        let kit = f
            .repository
            .create_one(entity(json!({"name": "A"})), Some(&options))
            .await
            .unwrap();

        assert!(!kit.contains_key("createdAt"));
        assert!(!kit.contains_key("updatedAt"));
        assert_eq!(kit["isDeleted"], false);
    }

    #[tokio::test]
    async fn test_soft_remove_hides_document_from_default_queries() {
        let f = fixture(kits_config());
        let kit = f
            .repository
            .create_one(entity(json!({"id": "kit-1", "name": "A"})), None)
            .await
            .unwrap();

        f.clock.advance(Duration::seconds(1));
        f.repository.remove_one("kit-1", None).await.unwrap();

        let visible = f.repository.find(f.repository.build_query(false, None)).await.unwrap();
        assert!(visible.is_empty());

        let all = f.repository.find(f.repository.build_query(true, None)).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0]["isDeleted"], true);
        assert_eq!(all[0]["name"], "A");
        assert!(all[0]["updatedAt"].as_str().unwrap() > kit["updatedAt"].as_str().unwrap());
        assert_eq!(f.store.document_count("kits").await, 1);
    }

    #[tokio::test]
    async fn test_remove_missing_document_is_idempotent() {
        let f = fixture(kits_config());
        f.repository.remove_one("missing", None).await.unwrap();

        let hard = LifecycleOptions::default().with_soft_delete(false);
        f.repository.remove_one("missing", Some(&hard)).await.unwrap();
    }

    #[tokio::test]
    async fn test_hard_remove_deletes_physically() {
        let f = fixture(kits_config().soft_delete(false));
        f.repository
            .create_one(entity(json!({"id": "kit-1", "name": "A"})), None)
            .await
            .unwrap();

        f.repository.remove_one("kit-1", None).await.unwrap();
        assert_eq!(f.store.document_count("kits").await, 0);
    }

    #[tokio::test]
    async fn test_remove_surfaces_store_errors() {
        let f = fixture(kits_config());
        f.repository
            .create_one(entity(json!({"id": "kit-1"})), None)
            .await
            .unwrap();
        f.store.deny_writes("kits", "kit-1");

        let err = f.repository.remove_one("kit-1", None).await.unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::PermissionDenied { .. })));
    }

    #[tokio::test]
    async fn test_recover_one_clears_flag() {
        let f = fixture(kits_config());
        f.repository
            .create_one(entity(json!({"id": "kit-1", "name": "A"})), None)
            .await
            .unwrap();
        f.repository.remove_one("kit-1", None).await.unwrap();

        let kit = f.repository.recover_one("kit-1", None).await.unwrap();
        assert_eq!(kit["isDeleted"], false);
        assert_eq!(kit["name"], "A");

        let visible = f.repository.find(f.repository.build_query(false, None)).await.unwrap();
        assert_eq!(visible.len(), 1);
    }

    #[tokio::test]
    async fn test_recover_without_soft_delete_is_precondition_failure() {
        let f = fixture(kits_config().soft_delete(false));
        let err = f.repository.recover_one("kit-1", None).await.unwrap_err();
        assert!(matches!(err, Error::PreconditionFailed(_)));

        let f = fixture(kits_config());
        let options = LifecycleOptions::default().with_soft_delete(false);
        let err = f.repository.recover_one("kit-1", Some(&options)).await.unwrap_err();
        assert!(matches!(err, Error::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn test_create_many_returns_ids_only() {
        let f = fixture(kits_config());
        let created = f
            .repository
            .create_many(
                vec![entity(json!({"id": "1", "name": "A"})), entity(json!({"name": "B"}))],
                None,
            )
            .await
            .unwrap();

        assert_eq!(created.len(), 2);
        assert_eq!(created[0], entity(json!({"id": "1"})));
        assert_eq!(created[1].len(), 1);

        let stored = f.repository.find(f.repository.build_query(false, None)).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|kit| kit["createdAt"] == stored[0]["createdAt"]));
    }

    #[tokio::test]
    async fn test_create_many_is_atomic() {
        let f = fixture(kits_config());
        f.store.deny_writes("kits", "2");

        let err = f
            .repository
            .create_many(
                vec![
                    entity(json!({"id": "1", "name": "A"})),
                    entity(json!({"id": "2", "name": "B"})),
                ],
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::PermissionDenied { .. })));

        let stored = f.repository.find(f.repository.build_query(true, None)).await.unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_build_query_respects_override() {
        let f = fixture(kits_config());
        f.repository
            .create_one(entity(json!({"id": "kit-1"})), None)
            .await
            .unwrap();
        f.repository.remove_one("kit-1", None).await.unwrap();

        let options = LifecycleOptions::default().with_soft_delete(false);
        let found = f
            .repository
            .find(f.repository.build_query(false, Some(&options)))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let count = f.repository.count(f.repository.build_query(false, None)).await.unwrap();
        assert_eq!(count, 0);
    }
}
