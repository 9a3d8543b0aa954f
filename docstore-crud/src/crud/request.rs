//! Parsed CRUD requests
//!
//! A routing layer parses its wire format into a [`ParsedRequest`] and pairs it
//! with the route's [`RequestOptions`] in a [`CrudRequest`].
//!
//! # Example
//!
//! ```rust
//! use docstore_crud::crud::{CrudRequest, ParsedRequest, RequestOptions};
//! use docstore_crud::query::{FilterCondition, SortSpec};
//!
//! let parsed = ParsedRequest::default()
//!     .with_param_filter(FilterCondition::eq("id", "kit-1"))
//!     .with_fields(["name"])
//!     .with_sort(SortSpec::desc("createdAt"));
//!
//! let request = CrudRequest::new(parsed, RequestOptions::default());
//! assert_eq!(request.parsed.fields, vec!["name".to_string()]);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::options::RequestOptions;
use crate::query::{FilterCondition, SearchCondition, SortSpec};
use crate::repository::Entity;

/// Framework-neutral description of one CRUD call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedRequest {
    /// Requested fields; empty means every allowed field
    pub fields: Vec<String>,
    /// Filters bound from the call path
    pub param_filters: Vec<FilterCondition>,
    /// Free-form filters from the query string
    pub filters: Vec<FilterCondition>,
    /// Prefix search on one field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchCondition>,
    /// Requested sort; replaces the route default when non-empty
    pub sort: Vec<SortSpec>,
    /// Page size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Rows to skip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// 1-indexed page; takes precedence over `offset`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    /// Include soft-deleted rows
    pub include_deleted: bool,
    /// Fields injected by authentication (e.g. owner id)
    pub auth_persist: Entity,
}

impl ParsedRequest {
    /// Add a path-bound filter
    #[must_use]
    pub fn with_param_filter(mut self, condition: FilterCondition) -> Self {
        self.param_filters.push(condition);
        self
    }

    /// Add a free-form filter
    #[must_use]
    pub fn with_filter(mut self, condition: FilterCondition) -> Self {
        self.filters.push(condition);
        self
    }

    /// Set the prefix search
    #[must_use]
    pub fn with_search(mut self, search: SearchCondition) -> Self {
        self.search = Some(search);
        self
    }

    /// Add a sort key
    #[must_use]
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort.push(sort);
        self
    }

    /// Request specific fields
    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the offset
    #[must_use]
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set the 1-indexed page
    #[must_use]
    pub fn with_page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    /// Include soft-deleted rows
    #[must_use]
    pub fn with_deleted(mut self, include: bool) -> Self {
        self.include_deleted = include;
        self
    }

    /// Inject an authenticated field
    #[must_use]
    pub fn with_auth_persist(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.auth_persist.insert(field.into(), value.into());
        self
    }
}

/// A parsed request together with its route options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrudRequest {
    /// What the caller asked for
    pub parsed: ParsedRequest,
    /// How the route is configured
    pub options: RequestOptions,
}

impl CrudRequest {
    /// Pair a parsed request with route options
    pub fn new(parsed: ParsedRequest, options: RequestOptions) -> Self {
        Self { parsed, options }
    }
}
