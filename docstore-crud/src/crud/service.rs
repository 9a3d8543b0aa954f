//! CRUD orchestration over a [`CrudRepository`]

use serde_json::Value;
use std::fmt;

use super::fields::{allowed_fields, select_fields};
use super::merge::{merge_for_create, merge_for_replace, merge_for_update, param_values};
use super::options::{QueryOptions, RequestOptions};
use super::request::{CrudRequest, ParsedRequest};
use super::response::{ListResponse, PaginationMeta};
use crate::error::{Error, Result};
use crate::query::{FieldRef, FilterCondition, FilterOperator, QueryBuilder, SortSpec};
use crate::repository::{identity_string, CrudRepository, Entity};

/// CRUD verb, used as a tracing field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// List
    GetMany,
    /// Count
    CountMany,
    /// Get one
    GetOne,
    /// Create one
    CreateOne,
    /// Create many
    CreateMany,
    /// Partial update
    UpdateOne,
    /// Replacement
    ReplaceOne,
    /// Delete one
    DeleteOne,
    /// Recover one
    RecoverOne,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetMany => write!(f, "get_many"),
            Self::CountMany => write!(f, "count_many"),
            Self::GetOne => write!(f, "get_one"),
            Self::CreateOne => write!(f, "create_one"),
            Self::CreateMany => write!(f, "create_many"),
            Self::UpdateOne => write!(f, "update_one"),
            Self::ReplaceOne => write!(f, "replace_one"),
            Self::DeleteOne => write!(f, "delete_one"),
            Self::RecoverOne => write!(f, "recover_one"),
        }
    }
}

const EMPTY_PAYLOAD: &str = "Empty data. Nothing to save.";

/// How a single-entity read is shaped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    /// The route's full query, projection included
    Projected,
    /// Filters and search only; every stored field comes back
    Raw,
    /// Like [`Lookup::Raw`], soft-deleted documents included
    RawWithDeleted,
}

/// Implements the CRUD verbs for one collection
///
/// Holds no storage state of its own; every call builds its query from the
/// request, the route options and the repository's schema.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use docstore_crud::crud::{CrudRequest, CrudService, ParsedRequest, RequestOptions};
/// use docstore_crud::query::FilterCondition;
/// use docstore_crud::repository::DocumentRepository;
/// use docstore_crud::schema::SchemaConfig;
/// use docstore_crud::store::MemoryStore;
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> docstore_crud::Result<()> {
/// let repository = DocumentRepository::from_config(
///     Arc::new(MemoryStore::new()),
///     SchemaConfig::new("kits").id_field("id").field("name"),
/// )?;
/// let service = CrudService::new(repository);
///
/// let dto = json!({"name": "A"}).as_object().cloned().unwrap();
/// let created = service.create_one(&CrudRequest::default(), dto).await?;
///
/// let request = CrudRequest::new(
///     ParsedRequest::default().with_param_filter(FilterCondition::eq("id", created["id"].clone())),
///     RequestOptions::default(),
/// );
/// let found = service.get_one(&request).await?;
/// assert_eq!(found["name"], "A");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CrudService<R> {
    repository: R,
}

impl<R: CrudRepository> CrudService<R> {
    /// Create a service over `repository`
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// The underlying repository
    pub fn repository(&self) -> &R {
        &self.repository
    }

    fn collection(&self) -> &str {
        self.repository.schema().collection_name()
    }

    /// Field bound to the primary route param, defaulting to the schema id field
    fn primary_field<'a>(&'a self, options: &'a RequestOptions) -> Result<&'a str> {
        Ok(options
            .primary_param()?
            .unwrap_or_else(|| self.repository.schema().id_field()))
    }

    fn targets_identity(&self, field: &str, primary: &str) -> bool {
        field == primary || field == self.repository.schema().id_field()
    }

    /// Schema fields the route may return
    pub fn allowed_fields(&self, options: &QueryOptions) -> Vec<String> {
        allowed_fields(self.repository.schema().field_names(), options)
    }

    /// Fields projected for a request
    pub fn select(&self, request: &CrudRequest) -> Vec<String> {
        let allowed = self.allowed_fields(&request.options.query);
        select_fields(&request.parsed.fields, &allowed, &request.options.query.persist)
    }

    /// Request sort if present, else the route default
    pub fn sort<'a>(&self, request: &'a CrudRequest) -> &'a [SortSpec] {
        if request.parsed.sort.is_empty() {
            &request.options.query.sort
        } else {
            &request.parsed.sort
        }
    }

    /// Page size after applying route defaults and caps
    pub fn take(&self, parsed: &ParsedRequest, options: &QueryOptions) -> Option<u64> {
        let positive = |value: Option<u64>| value.filter(|n| *n > 0);
        let max_limit = positive(options.max_limit);
        let capped = |n: u64| max_limit.map_or(n, |max| n.min(max));

        positive(parsed.limit)
            .map(capped)
            .or_else(|| positive(options.limit).map(capped))
            .or(max_limit)
    }

    /// Rows to skip; a 1-indexed page wins over a raw offset
    pub fn skip(&self, parsed: &ParsedRequest, take: Option<u64>) -> Option<u64> {
        let skip = match (parsed.page.filter(|p| *p > 0), take) {
            (Some(page), Some(take)) => Some(take.saturating_mul(page - 1)),
            _ => parsed.offset,
        };
        skip.filter(|n| *n > 0)
    }

    fn apply_filter(&self, query: QueryBuilder, condition: &FilterCondition, primary: &str) -> Result<QueryBuilder> {
        if self.targets_identity(&condition.field, primary) {
            let value = self.identity_operand(&condition.value)?;
            Ok(query.filter(FieldRef::DocumentId, condition.operator, value))
        } else {
            Ok(query.filter(condition.field.as_str(), condition.operator, condition.value.clone()))
        }
    }

    /// Coerce a filter operand to the store's identity representation
    fn identity_operand(&self, value: &Value) -> Result<Value> {
        let coerce = |item: &Value| {
            identity_string(item).map(Value::String).ok_or_else(|| {
                Error::BadRequest(format!(
                    "'{}' cannot identify a document in collection '{}'",
                    item,
                    self.collection()
                ))
            })
        };

        match value {
            Value::Array(items) => items.iter().map(coerce).collect::<Result<Vec<_>>>().map(Value::Array),
            scalar => coerce(scalar),
        }
    }

    /// Declared filters, then path-bound filters, then request filters, then search
    fn apply_search_condition(&self, mut query: QueryBuilder, request: &CrudRequest) -> Result<QueryBuilder> {
        let primary = self.primary_field(&request.options)?;
        let conditions = request
            .options
            .query
            .filter
            .iter()
            .chain(&request.parsed.param_filters)
            .chain(&request.parsed.filters);

        for condition in conditions {
            query = self.apply_filter(query, condition, primary)?;
        }

        if let Some(search) = request.parsed.search.as_ref().filter(|s| !s.term.is_empty()) {
            query = query
                .filter(search.field.as_str(), FilterOperator::Gte, search.term.clone())
                .filter(search.field.as_str(), FilterOperator::Lte, search.upper_bound());
        }

        Ok(query)
    }

    fn build_query(&self, request: &CrudRequest, many: bool, with_deleted: bool) -> Result<QueryBuilder> {
        let lifecycle = request.options.lifecycle();
        let include_deleted = request.parsed.include_deleted || with_deleted;

        let query = self.repository.build_query(include_deleted, Some(&lifecycle));
        let mut query = self.apply_search_condition(query, request)?.select(self.select(request));

        if many {
            let primary = self.primary_field(&request.options)?;
            for sort in self.sort(request) {
                let target = if self.targets_identity(&sort.field, primary) {
                    FieldRef::DocumentId
                } else {
                    FieldRef::from(&sort.field)
                };
                query = query.order_by(target, sort.direction);
            }

            let take = self.take(&request.parsed, &request.options.query);
            if let Some(take) = take {
                query = query.limit(take);
            }
            if let Some(skip) = self.skip(&request.parsed, take) {
                query = query.offset(skip);
            }
        }

        Ok(query)
    }

    /// List matching entities
    pub async fn get_many(&self, request: &CrudRequest) -> Result<Vec<Entity>> {
        let query = self.build_query(request, true, false)?;
        let entities = self.repository.find(query).await?;
        tracing::debug!(
            operation = %Operation::GetMany,
            collection = self.collection(),
            returned = entities.len(),
            "listed entities"
        );
        Ok(entities)
    }

    /// Count matching entities, ignoring sort and pagination
    pub async fn count_many(&self, request: &CrudRequest) -> Result<u64> {
        let query = self.build_query(request, false, false)?;
        let total = self.repository.count(query).await?;
        tracing::debug!(
            operation = %Operation::CountMany,
            collection = self.collection(),
            total,
            "counted entities"
        );
        Ok(total)
    }

    /// List matching entities together with the total count
    pub async fn get_many_page(&self, request: &CrudRequest) -> Result<ListResponse<Entity>> {
        let take = self.take(&request.parsed, &request.options.query);
        let offset = self.skip(&request.parsed, take).unwrap_or(0);

        let (data, total) = futures::try_join!(self.get_many(request), self.count_many(request))?;
        let pagination = PaginationMeta::from_window(take, offset, data.len(), total);
        Ok(ListResponse::new(data, pagination))
    }

    /// Fetch one entity
    pub async fn get_one(&self, request: &CrudRequest) -> Result<Entity> {
        self.get_one_or_fail(request, Lookup::Projected).await
    }

    /// Fetch the first matching entity or fail with [`Error::NotFound`]
    async fn get_one_or_fail(&self, request: &CrudRequest, lookup: Lookup) -> Result<Entity> {
        let query = match lookup {
            Lookup::Projected => self.build_query(request, false, false)?,
            Lookup::Raw | Lookup::RawWithDeleted => {
                let lifecycle = request.options.lifecycle();
                let include_deleted = request.parsed.include_deleted || lookup == Lookup::RawWithDeleted;
                let query = self.repository.build_query(include_deleted, Some(&lifecycle));
                self.apply_search_condition(query, request)?
            }
        };

        match self.repository.find(query).await?.into_iter().next() {
            Some(entity) => Ok(entity),
            None => {
                tracing::debug!(
                    operation = %Operation::GetOne,
                    collection = self.collection(),
                    "no matching entity"
                );
                Err(Error::not_found(self.collection()))
            }
        }
    }

    /// Read back an entity through the route's query, located by its primary value
    async fn refetch(&self, request: &CrudRequest, written: Entity) -> Result<Entity> {
        let primary = self.primary_field(&request.options)?;
        let Some(value) = written.get(primary).filter(|v| !v.is_null()).cloned() else {
            return Ok(written);
        };

        let mut refetch = request.clone();
        refetch.parsed.param_filters = vec![FilterCondition::eq(primary, value)];
        self.get_one_or_fail(&refetch, Lookup::Projected).await
    }

    /// Create one entity
    pub async fn create_one(&self, request: &CrudRequest, dto: Entity) -> Result<Entity> {
        let params = param_values(&request.parsed.param_filters);
        let entity = merge_for_create(&dto, &params, &request.parsed.auth_persist)
            .ok_or_else(|| Error::BadRequest(EMPTY_PAYLOAD.to_string()))?;

        let lifecycle = request.options.lifecycle();
        let saved = self.repository.create_one(entity, Some(&lifecycle)).await?;
        tracing::info!(
            operation = %Operation::CreateOne,
            collection = self.collection(),
            "entity created"
        );

        if request.options.routes.create_one.return_shallow {
            Ok(saved)
        } else {
            self.refetch(request, saved).await
        }
    }

    /// Create several entities atomically; returns their ids
    pub async fn create_many(&self, request: &CrudRequest, bulk: Vec<Entity>) -> Result<Vec<Entity>> {
        if bulk.is_empty() {
            return Err(Error::BadRequest(EMPTY_PAYLOAD.to_string()));
        }

        let params = param_values(&request.parsed.param_filters);
        let prepared: Vec<Entity> = bulk
            .iter()
            .filter_map(|dto| merge_for_create(dto, &params, &request.parsed.auth_persist))
            .collect();
        if prepared.is_empty() {
            return Err(Error::BadRequest(EMPTY_PAYLOAD.to_string()));
        }

        let lifecycle = request.options.lifecycle();
        let created = self.repository.create_many(prepared, Some(&lifecycle)).await?;
        tracing::info!(
            operation = %Operation::CreateMany,
            collection = self.collection(),
            created = created.len(),
            "entities created"
        );
        Ok(created)
    }

    /// Merge `dto` into an existing entity
    ///
    /// The merge base is the stored document, so fields the route hides are
    /// written back unchanged.
    pub async fn update_one(&self, request: &CrudRequest, dto: Entity) -> Result<Entity> {
        let route = request.options.routes.update_one;
        let found = self.get_one_or_fail(request, Lookup::Raw).await?;

        let params = param_values(&request.parsed.param_filters);
        let to_save = merge_for_update(
            &found,
            &dto,
            &params,
            &request.parsed.auth_persist,
            route.allow_params_override,
        );

        let lifecycle = request.options.lifecycle();
        let updated = self.repository.save_one(to_save, Some(&lifecycle)).await?;
        tracing::info!(
            operation = %Operation::UpdateOne,
            collection = self.collection(),
            "entity updated"
        );

        if route.return_shallow {
            return Ok(updated);
        }

        let mut refetch = request.clone();
        for filter in &mut refetch.parsed.param_filters {
            filter.value = updated.get(&filter.field).cloned().unwrap_or(Value::Null);
        }
        self.get_one_or_fail(&refetch, Lookup::Projected).await
    }

    /// Replace an existing entity with `dto`
    pub async fn replace_one(&self, request: &CrudRequest, dto: Entity) -> Result<Entity> {
        let route = request.options.routes.replace_one;
        let found = self.get_one_or_fail(request, Lookup::Raw).await?;

        let params = param_values(&request.parsed.param_filters);
        let to_save = merge_for_replace(
            &found,
            &dto,
            &params,
            &request.parsed.auth_persist,
            route.allow_params_override,
        );

        let lifecycle = request.options.lifecycle();
        let replaced = self.repository.save_one(to_save, Some(&lifecycle)).await?;
        tracing::info!(
            operation = %Operation::ReplaceOne,
            collection = self.collection(),
            "entity replaced"
        );

        if route.return_shallow {
            Ok(replaced)
        } else {
            self.refetch(request, replaced).await
        }
    }

    /// Delete one entity; returns it when the route asks for it
    ///
    /// A returned entity goes through the route's projection.
    pub async fn delete_one(&self, request: &CrudRequest) -> Result<Option<Entity>> {
        let return_deleted = request.options.routes.delete_one.return_deleted;
        let lookup = if return_deleted { Lookup::Projected } else { Lookup::Raw };
        let found = self.get_one_or_fail(request, lookup).await?;
        let id = self.entity_id(&found)?;

        let lifecycle = request.options.lifecycle();
        self.repository.remove_one(&id, Some(&lifecycle)).await?;
        tracing::info!(
            operation = %Operation::DeleteOne,
            collection = self.collection(),
            id = %id,
            "entity deleted"
        );

        Ok(return_deleted.then_some(found))
    }

    /// Clear the soft-delete flag of one entity
    pub async fn recover_one(&self, request: &CrudRequest) -> Result<Entity> {
        let found = self.get_one_or_fail(request, Lookup::RawWithDeleted).await?;
        let id = self.entity_id(&found)?;

        let lifecycle = request.options.lifecycle();
        let recovered = self.repository.recover_one(&id, Some(&lifecycle)).await?;
        tracing::info!(
            operation = %Operation::RecoverOne,
            collection = self.collection(),
            id = %id,
            "entity recovered"
        );
        Ok(recovered)
    }

    fn entity_id(&self, entity: &Entity) -> Result<String> {
        let id_field = self.repository.schema().id_field();
        entity
            .get(id_field)
            .and_then(identity_string)
            .ok_or_else(|| Error::Configuration(format!(
                "entity read from '{}' carries no '{}' value",
                self.collection(),
                id_field
            )))
    }
}
