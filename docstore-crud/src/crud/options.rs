//! Per-route options
//!
//! Every field has a default, so a route can be declared in a config file with
//! only the parts it changes:
//!
//! ```toml
//! [query]
//! exclude = ["secret"]
//! persist = ["id"]
//! sort = [{ field = "createdAt", order = "desc" }]
//! max_limit = 100
//!
//! [routes.delete_one]
//! return_deleted = true
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::query::{FilterCondition, SortSpec};
use crate::repository::LifecycleOptions;

/// Everything a route can configure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// Query shaping and lifecycle overrides
    pub query: QueryOptions,
    /// Route parameters bound from the call path
    pub params: Vec<ParamOption>,
    /// Per-verb behavior flags
    pub routes: RoutesOptions,
}

impl RequestOptions {
    /// Lifecycle overrides carried by this route
    pub fn lifecycle(&self) -> LifecycleOptions {
        LifecycleOptions {
            timestamp: self.query.timestamp,
            soft_delete: self.query.soft_delete,
        }
    }

    /// The field bound to the single primary route parameter
    ///
    /// Returns `Ok(None)` when no parameter is primary. More than one primary
    /// parameter is a [`Error::BadRequest`].
    pub fn primary_param(&self) -> Result<Option<&str>> {
        let mut primary = self.params.iter().filter(|p| p.primary);
        match (primary.next(), primary.next()) {
            (None, _) => Ok(None),
            (Some(param), None) => Ok(Some(param.field.as_str())),
            (Some(first), Some(second)) => Err(Error::BadRequest(format!(
                "route declares more than one primary param ('{}', '{}')",
                first.field, second.field
            ))),
        }
    }

    /// Add a route parameter
    #[must_use]
    pub fn with_param(mut self, param: ParamOption) -> Self {
        self.params.push(param);
        self
    }

    /// Replace query options
    #[must_use]
    pub fn with_query(mut self, query: QueryOptions) -> Self {
        self.query = query;
        self
    }

    /// Replace per-verb options
    #[must_use]
    pub fn with_routes(mut self, routes: RoutesOptions) -> Self {
        self.routes = routes;
        self
    }
}

/// Query shaping configured on a route
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Only these fields may be returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow: Option<Vec<String>>,
    /// These fields are never returned unless persisted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
    /// Always returned, regardless of allow/exclude
    pub persist: Vec<String>,
    /// Declared filters applied to every query on the route
    pub filter: Vec<FilterCondition>,
    /// Default sort when the request has none
    pub sort: Vec<SortSpec>,
    /// Default page size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Upper bound on page size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_limit: Option<u64>,
    /// Soft-delete override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soft_delete: Option<bool>,
    /// Timestamp override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<bool>,
}

impl QueryOptions {
    /// Restrict returned fields to `fields`
    #[must_use]
    pub fn allow<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Never return `fields`
    #[must_use]
    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Always return `fields`
    #[must_use]
    pub fn persist<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.persist = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Add a declared filter
    #[must_use]
    pub fn filter(mut self, condition: FilterCondition) -> Self {
        self.filter.push(condition);
        self
    }

    /// Add a default sort key
    #[must_use]
    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort.push(sort);
        self
    }

    /// Default page size
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Upper bound on page size
    #[must_use]
    pub fn max_limit(mut self, max_limit: u64) -> Self {
        self.max_limit = Some(max_limit);
        self
    }

    /// Override soft delete for the route
    #[must_use]
    pub fn soft_delete(mut self, enabled: bool) -> Self {
        self.soft_delete = Some(enabled);
        self
    }

    /// Override timestamping for the route
    #[must_use]
    pub fn timestamp(mut self, enabled: bool) -> Self {
        self.timestamp = Some(enabled);
        self
    }
}

/// A route parameter bound from the call path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamOption {
    /// Entity field the parameter filters on
    pub field: String,
    /// Whether the parameter identifies the entity
    #[serde(default)]
    pub primary: bool,
}

impl ParamOption {
    /// The identifying parameter
    pub fn primary(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            primary: true,
        }
    }

    /// A scoping parameter (e.g. a parent id)
    pub fn scope(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            primary: false,
        }
    }
}

/// Per-verb behavior flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesOptions {
    /// Create-one
    pub create_one: CreateOneRoute,
    /// Update-one
    pub update_one: WriteRoute,
    /// Replace-one
    pub replace_one: WriteRoute,
    /// Delete-one
    pub delete_one: DeleteOneRoute,
}

/// Create-one behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateOneRoute {
    /// Return the write result without reading back through the route's query
    pub return_shallow: bool,
}

/// Update-one / replace-one behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteRoute {
    /// Let the payload override path-bound values
    pub allow_params_override: bool,
    /// Return the write result without reading back through the route's query
    pub return_shallow: bool,
}

/// Delete-one behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteOneRoute {
    /// Return the entity as it was before deletion
    pub return_deleted: bool,
}
