//! In-memory document store
//!
//! Collections are `BTreeMap`s keyed by document id behind a single
//! `tokio::sync::RwLock`, so natural order is ascending id and a batch commit
//! sees a consistent view of every collection it touches.
//!
//! Query evaluation mirrors hosted document stores: a document lacking a
//! filtered or ordered field never matches, and range comparisons only match
//! values of the same kind.

use async_trait::async_trait;
use dashmap::DashSet;
use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{Document, DocumentSnapshot, DocumentStore, StoreError, WriteBatch, WriteKind};
use crate::query::{FieldRef, NativeOperator, OrderDirection, Predicate, Query};

type Collection = BTreeMap<String, Document>;

/// Document store held entirely in process memory
///
/// Cloning is cheap and clones share the same data.
///
/// # Example
///
/// ```rust
/// use docstore_crud::store::{Document, DocumentStore, MemoryStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), docstore_crud::store::StoreError> {
/// let store = MemoryStore::new();
/// store.create("kits", "1", Document::new()).await?;
/// assert!(store.get("kits", "1").await?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
    denied: Arc<DashSet<(String, String)>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every future write to `collection/id` with `PermissionDenied`
    pub fn deny_writes(&self, collection: impl Into<String>, id: impl Into<String>) {
        self.denied.insert((collection.into(), id.into()));
    }

    /// Lift a rejection installed with [`deny_writes`](Self::deny_writes)
    pub fn allow_writes(&self, collection: &str, id: &str) {
        self.denied.remove(&(collection.to_string(), id.to_string()));
    }

    /// Number of physically stored documents in a collection
    pub async fn document_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    fn check_writable(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        if self.denied.contains(&(collection.to_string(), id.to_string())) {
            return Err(StoreError::PermissionDenied {
                collection: collection.to_string(),
                id: id.to_string(),
                reason: "writes to this document are denied".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<DocumentSnapshot>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| DocumentSnapshot::new(id, data.clone())))
    }

    async fn create(&self, collection: &str, id: &str, data: Document) -> Result<(), StoreError> {
        self.check_writable(collection, id)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(StoreError::AlreadyExists {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        docs.insert(id.to_string(), data);
        tracing::trace!(collection, id, "document created");
        Ok(())
    }

    async fn set(&self, collection: &str, id: &str, data: Document) -> Result<(), StoreError> {
        self.check_writable(collection, id)?;
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        tracing::trace!(collection, id, "document set");
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, data: Document) -> Result<(), StoreError> {
        self.check_writable(collection, id)?;
        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        existing.extend(data);
        tracing::trace!(collection, id, "document updated");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.check_writable(collection, id)?;
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        tracing::trace!(collection, id, "document deleted");
        Ok(())
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<DocumentSnapshot>, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(query.collection()) else {
            validate(query)?;
            return Ok(Vec::new());
        };

        let rows = evaluate(docs, query)?;
        Ok(rows
            .into_iter()
            .map(|(id, data)| {
                let data = match query.projection() {
                    Some(fields) => fields
                        .iter()
                        .filter_map(|field| data.get(field).map(|v| (field.clone(), v.clone())))
                        .collect(),
                    None => data.clone(),
                };
                DocumentSnapshot::new(id.clone(), data)
            })
            .collect())
    }

    async fn count(&self, query: &Query) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        match collections.get(query.collection()) {
            Some(docs) => Ok(evaluate(docs, query)?.len() as u64),
            None => validate(query).map(|()| 0),
        }
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;

        let mut created: HashSet<(&str, &str)> = HashSet::new();
        for write in batch.writes() {
            self.check_writable(&write.collection, &write.id)?;
            if write.kind == WriteKind::Create {
                let exists = collections
                    .get(&write.collection)
                    .is_some_and(|docs| docs.contains_key(&write.id));
                if exists || !created.insert((write.collection.as_str(), write.id.as_str())) {
                    return Err(StoreError::AlreadyExists {
                        collection: write.collection.clone(),
                        id: write.id.clone(),
                    });
                }
            }
        }

        let size = batch.len();
        for write in batch.into_writes() {
            collections
                .entry(write.collection)
                .or_default()
                .insert(write.id, write.data);
        }
        tracing::trace!(writes = size, "batch committed");
        Ok(())
    }
}

fn validate(query: &Query) -> Result<(), StoreError> {
    for predicate in query.predicates() {
        if matches!(predicate.operator, NativeOperator::In | NativeOperator::NotIn)
            && !predicate.value.is_array()
        {
            return Err(StoreError::InvalidQuery(format!(
                "'{}' on '{}' requires an array operand",
                predicate.operator, predicate.target
            )));
        }
    }
    Ok(())
}

/// Filter, order and paginate a collection
fn evaluate<'a>(docs: &'a Collection, query: &Query) -> Result<Vec<(&'a String, &'a Document)>, StoreError> {
    validate(query)?;

    let mut rows: Vec<(&String, &Document)> = docs
        .iter()
        .filter(|(id, data)| query.predicates().iter().all(|p| matches(p, id, data)))
        .filter(|(id, data)| {
            query
                .order()
                .iter()
                .all(|key| resolve(&key.target, id, data).is_some())
        })
        .collect();

    if !query.order().is_empty() {
        // stable sort keeps id order for ties
        rows.sort_by(|(a_id, a), (b_id, b)| {
            query
                .order()
                .iter()
                .map(|key| {
                    let ordering = match (resolve(&key.target, a_id, a), resolve(&key.target, b_id, b)) {
                        (Some(x), Some(y)) => total_order(&x, &y),
                        _ => Ordering::Equal,
                    };
                    match key.direction {
                        OrderDirection::Ascending => ordering,
                        OrderDirection::Descending => ordering.reverse(),
                    }
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });
    }

    let offset = usize::try_from(query.offset().unwrap_or(0)).unwrap_or(usize::MAX);
    let limit = query
        .limit()
        .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));
    Ok(rows.into_iter().skip(offset).take(limit).collect())
}

fn resolve<'a>(target: &FieldRef, id: &'a str, data: &'a Document) -> Option<Cow<'a, Value>> {
    match target {
        FieldRef::DocumentId => Some(Cow::Owned(Value::String(id.to_string()))),
        FieldRef::Field(name) => data.get(name).map(Cow::Borrowed),
    }
}

fn matches(predicate: &Predicate, id: &str, data: &Document) -> bool {
    let Some(actual) = resolve(&predicate.target, id, data) else {
        return false;
    };
    let expected = &predicate.value;

    match predicate.operator {
        NativeOperator::Equal => values_equal(&actual, expected),
        NativeOperator::NotEqual => !actual.is_null() && !values_equal(&actual, expected),
        NativeOperator::GreaterThan => same_kind_cmp(&actual, expected) == Some(Ordering::Greater),
        NativeOperator::LessThan => same_kind_cmp(&actual, expected) == Some(Ordering::Less),
        NativeOperator::GreaterThanOrEqual => {
            matches!(same_kind_cmp(&actual, expected), Some(Ordering::Greater | Ordering::Equal))
        }
        NativeOperator::LessThanOrEqual => {
            matches!(same_kind_cmp(&actual, expected), Some(Ordering::Less | Ordering::Equal))
        }
        NativeOperator::In => expected
            .as_array()
            .is_some_and(|candidates| candidates.iter().any(|c| values_equal(&actual, c))),
        NativeOperator::NotIn => {
            !actual.is_null()
                && expected
                    .as_array()
                    .is_some_and(|candidates| !candidates.iter().any(|c| values_equal(&actual, c)))
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn same_kind_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Ordering across mixed kinds: null < bool < number < string < array < object
fn total_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y)
            .map(|(l, r)| total_order(l, r))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => same_kind_cmp(a, b).unwrap_or_else(|| kind_rank(a).cmp(&kind_rank(b))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FilterOperator, QueryBuilder};
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test documents must be objects"),
        }
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.set("kits", "a", doc(json!({"name": "Alpha", "stock": 5, "isDeleted": false}))).await.unwrap();
        store.set("kits", "b", doc(json!({"name": "Bravo", "stock": 12, "isDeleted": true}))).await.unwrap();
        store.set("kits", "c", doc(json!({"name": "Charlie", "stock": 12.0, "isDeleted": false}))).await.unwrap();
        store.set("kits", "d", doc(json!({"name": "Delta"}))).await.unwrap();
        store
    }

    fn ids(rows: &[DocumentSnapshot]) -> Vec<&str> {
        rows.iter().map(|row| row.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_create_fails_if_document_exists() {
        let store = MemoryStore::new();
        store.create("kits", "1", doc(json!({"name": "A"}))).await.unwrap();

        let err = store.create("kits", "1", doc(json!({"name": "B"}))).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));

        let stored = store.get("kits", "1").await.unwrap().unwrap();
        assert_eq!(stored.data["name"], "A");
    }

    #[tokio::test]
    async fn test_update_merges_and_requires_existing_document() {
        let store = MemoryStore::new();
        let err = store.update("kits", "1", doc(json!({"name": "A"}))).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        store.set("kits", "1", doc(json!({"name": "A", "stock": 1}))).await.unwrap();
        store.update("kits", "1", doc(json!({"stock": 2}))).await.unwrap();

        let stored = store.get("kits", "1").await.unwrap().unwrap();
        assert_eq!(stored.data, doc(json!({"name": "A", "stock": 2})));
    }

    #[tokio::test]
    async fn test_delete_missing_document_is_ok() {
        let store = MemoryStore::new();
        store.delete("kits", "missing").await.unwrap();
    }

    #[tokio::test]
    async fn test_predicates_are_conjunctive() {
        let store = seeded().await;
        let rows = QueryBuilder::new("kits")
            .filter("isDeleted", FilterOperator::Eq, false)
            .filter("stock", FilterOperator::Gte, 10)
            .execute(&store)
            .await
            .unwrap();

        assert_eq!(ids(&rows), vec!["c"]);
    }

    #[tokio::test]
    async fn test_missing_field_never_matches() {
        let store = seeded().await;

        let rows = QueryBuilder::new("kits")
            .filter("isDeleted", FilterOperator::Ne, true)
            .execute(&store)
            .await
            .unwrap();
        assert_eq!(ids(&rows), vec!["a", "c"]);

        let rows = QueryBuilder::new("kits")
            .filter("stock", FilterOperator::NotIn, json!([5]))
            .execute(&store)
            .await
            .unwrap();
        assert_eq!(ids(&rows), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_numbers_compare_numerically() {
        let store = seeded().await;
        let rows = QueryBuilder::new("kits")
            .filter("stock", FilterOperator::Eq, 12)
            .execute(&store)
            .await
            .unwrap();

        assert_eq!(ids(&rows), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_range_requires_same_kind() {
        let store = seeded().await;
        let rows = QueryBuilder::new("kits")
            .filter("name", FilterOperator::Gt, 1)
            .execute(&store)
            .await
            .unwrap();

        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_document_id_reference() {
        let store = seeded().await;
        let rows = QueryBuilder::new("kits")
            .filter(FieldRef::DocumentId, FilterOperator::In, json!(["b", "d", "z"]))
            .execute(&store)
            .await
            .unwrap();

        assert_eq!(ids(&rows), vec!["b", "d"]);
    }

    #[tokio::test]
    async fn test_in_requires_array_operand() {
        let store = seeded().await;
        let err = QueryBuilder::new("kits")
            .filter("name", FilterOperator::In, "Alpha")
            .execute(&store)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_compound_order_excludes_missing_fields() {
        let store = seeded().await;
        let rows = QueryBuilder::new("kits")
            .order_by("stock", OrderDirection::Descending)
            .order_by("name", OrderDirection::Descending)
            .execute(&store)
            .await
            .unwrap();

        assert_eq!(ids(&rows), vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_limit_offset_and_projection() {
        let store = seeded().await;
        let rows = QueryBuilder::new("kits")
            .select(["name"])
            .offset(1)
            .limit(2)
            .execute(&store)
            .await
            .unwrap();

        assert_eq!(ids(&rows), vec!["b", "c"]);
        assert_eq!(rows[0].data, doc(json!({"name": "Bravo"})));
    }

    #[tokio::test]
    async fn test_prefix_range_search() {
        let store = seeded().await;
        store.set("kits", "e", doc(json!({"name": "Charger"}))).await.unwrap();

        let rows = QueryBuilder::new("kits")
            .filter("name", FilterOperator::Gte, "Char")
            .filter("name", FilterOperator::Lte, "Char\u{f8ff}")
            .execute(&store)
            .await
            .unwrap();

        assert_eq!(ids(&rows), vec!["c", "e"]);
    }

    #[tokio::test]
    async fn test_native_count() {
        let store = seeded().await;
        let count = QueryBuilder::new("kits")
            .filter("isDeleted", FilterOperator::Eq, false)
            .count(&store)
            .await
            .unwrap();
        assert_eq!(count, 2);

        let count = QueryBuilder::new("empty").count(&store).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_batch_commits_all_writes() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.create("kits", "1", doc(json!({"name": "A"})));
        batch.create("kits", "2", doc(json!({"name": "B"})));

        store.commit(batch).await.unwrap();
        assert_eq!(store.document_count("kits").await, 2);
    }

    #[tokio::test]
    async fn test_batch_is_atomic_on_denied_write() {
        let store = MemoryStore::new();
        store.deny_writes("kits", "2");

        let mut batch = WriteBatch::new();
        batch.create("kits", "1", doc(json!({"name": "A"})));
        batch.create("kits", "2", doc(json!({"name": "B"})));

        let err = store.commit(batch).await.unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied { .. }));
        assert_eq!(store.document_count("kits").await, 0);
    }

    #[tokio::test]
    async fn test_batch_is_atomic_on_existing_document() {
        let store = MemoryStore::new();
        store.set("kits", "2", doc(json!({"name": "old"}))).await.unwrap();

        let mut batch = WriteBatch::new();
        batch.create("kits", "1", doc(json!({"name": "A"})));
        batch.create("kits", "2", doc(json!({"name": "B"})));

        let err = store.commit(batch).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert!(store.get("kits", "1").await.unwrap().is_none());
        assert_eq!(store.get("kits", "2").await.unwrap().unwrap().data["name"], "old");
    }

    #[tokio::test]
    async fn test_allow_writes_lifts_denial() {
        let store = MemoryStore::new();
        store.deny_writes("kits", "1");
        assert!(store.set("kits", "1", Document::new()).await.is_err());

        store.allow_writes("kits", "1");
        store.set("kits", "1", Document::new()).await.unwrap();
    }
}
