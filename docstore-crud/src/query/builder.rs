//! Incremental query construction
//!
//! [`QueryBuilder`] accumulates predicates, projection, ordering and pagination
//! for one collection. Nothing touches the store until [`QueryBuilder::execute`]
//! or [`QueryBuilder::count`] is called, and both consume the builder, so a
//! builder runs at most once.
//!
//! # Example
//!
//! ```rust
//! use docstore_crud::query::{FieldRef, FilterOperator, OrderDirection, QueryBuilder};
//!
//! let query = QueryBuilder::new("kits")
//!     .filter("isDeleted", FilterOperator::Eq, false)
//!     .filter(FieldRef::DocumentId, FilterOperator::In, vec!["a", "b"])
//!     .order_by("name", OrderDirection::Ascending)
//!     .select(["name", "createdAt"])
//!     .limit(10)
//!     .build();
//!
//! assert_eq!(query.collection(), "kits");
//! assert_eq!(query.predicates().len(), 2);
//! assert_eq!(query.limit(), Some(10));
//! ```

use serde_json::Value;
use std::fmt;

use super::operator::{FilterOperator, NativeOperator};
use super::filter::OrderDirection;
use crate::store::{DocumentSnapshot, DocumentStore, StoreError};

/// Target of a predicate or sort key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldRef {
    /// A stored field
    Field(String),
    /// The document's own identity
    DocumentId,
}

impl FieldRef {
    /// Stored field name, if this is not the identity reference
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Self::Field(name) => Some(name),
            Self::DocumentId => None,
        }
    }
}

impl From<&str> for FieldRef {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

impl From<String> for FieldRef {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl From<&String> for FieldRef {
    fn from(name: &String) -> Self {
        Self::Field(name.clone())
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::DocumentId => f.write_str("__name__"),
        }
    }
}

/// A translated predicate, already in native operator form
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Field or identity reference
    pub target: FieldRef,
    /// Native comparison operator
    pub operator: NativeOperator,
    /// Operand
    pub value: Value,
}

/// A sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    /// Field or identity reference
    pub target: FieldRef,
    /// Sort direction
    pub direction: OrderDirection,
}

/// Immutable description of a query against one collection
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    collection: String,
    predicates: Vec<Predicate>,
    projection: Option<Vec<String>>,
    order: Vec<OrderKey>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Query {
    /// Collection the query is scoped to
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Conjunctive predicates, in application order
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Selected fields, `None` meaning every stored field
    pub fn projection(&self) -> Option<&[String]> {
        self.projection.as_deref()
    }

    /// Compound sort, left to right
    pub fn order(&self) -> &[OrderKey] {
        &self.order
    }

    /// Maximum number of rows
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Rows to skip
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }
}

/// Consuming builder producing a [`Query`]
#[derive(Debug, Clone)]
#[must_use = "a query builder does nothing until executed"]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Start a query against `collection`
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            query: Query {
                collection: collection.into(),
                predicates: Vec::new(),
                projection: None,
                order: Vec::new(),
                limit: None,
                offset: None,
            },
        }
    }

    /// Collection the builder is scoped to
    pub fn collection(&self) -> &str {
        &self.query.collection
    }

    /// Append a predicate; multiple predicates are combined with AND
    pub fn filter(
        mut self,
        target: impl Into<FieldRef>,
        operator: FilterOperator,
        value: impl Into<Value>,
    ) -> Self {
        self.query.predicates.push(Predicate {
            target: target.into(),
            operator: operator.to_native(),
            value: value.into(),
        });
        self
    }

    /// Restrict returned fields; replaces any earlier selection
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Append a sort key
    pub fn order_by(mut self, target: impl Into<FieldRef>, direction: OrderDirection) -> Self {
        self.query.order.push(OrderKey {
            target: target.into(),
            direction,
        });
        self
    }

    /// Limit the number of rows
    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Skip rows
    pub fn offset(mut self, offset: u64) -> Self {
        self.query.offset = Some(offset);
        self
    }

    /// Finish building without executing
    pub fn build(self) -> Query {
        self.query
    }

    /// Run the query; store errors are returned unmodified
    pub async fn execute(self, store: &dyn DocumentStore) -> Result<Vec<DocumentSnapshot>, StoreError> {
        store.run_query(&self.query).await
    }

    /// Count matching rows; pagination still applies when set
    pub async fn count(self, store: &dyn DocumentStore) -> Result<u64, StoreError> {
        store.count(&self.query).await
    }
}

impl From<QueryBuilder> for Query {
    fn from(builder: QueryBuilder) -> Self {
        builder.build()
    }
}
