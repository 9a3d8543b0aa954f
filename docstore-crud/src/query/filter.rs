//! Filter, sort and search types shared by requests and route options
//!
//! # Example
//!
//! ```rust
//! use docstore_crud::query::{FilterCondition, SortSpec};
//!
//! let filters = vec![
//!     FilterCondition::eq("status", "active"),
//!     FilterCondition::gte("stock", 10),
//! ];
//!
//! let sort = vec![SortSpec::desc("createdAt"), SortSpec::asc("name")];
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::operator::FilterOperator;

/// Direction for ordering results
///
/// # Example
///
/// ```rust
/// use docstore_crud::query::OrderDirection;
///
/// assert_eq!(format!("{}", OrderDirection::Ascending), "asc");
/// assert_eq!(format!("{}", OrderDirection::Descending), "desc");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Sort in ascending order (A-Z, 0-9)
    #[default]
    #[serde(rename = "asc", alias = "ASC")]
    Ascending,
    /// Sort in descending order (Z-A, 9-0)
    #[serde(rename = "desc", alias = "DESC")]
    Descending,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// A single sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Field to sort on
    pub field: String,
    /// Sort direction
    #[serde(rename = "order", alias = "direction", default)]
    pub direction: OrderDirection,
}

impl SortSpec {
    /// Ascending sort on `field`
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Ascending,
        }
    }

    /// Descending sort on `field`
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Descending,
        }
    }
}

/// A single filter condition
///
/// Values are kept as JSON so conditions can be declared in configuration files
/// and carried straight from request parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// The field name to filter on
    pub field: String,
    /// The comparison operator
    pub operator: FilterOperator,
    /// The value to compare against
    pub value: Value,
}

impl FilterCondition {
    /// Create a new filter condition
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Create an equality filter (field == value)
    ///
    /// # Example
    ///
    /// ```rust
    /// use docstore_crud::query::{FilterCondition, FilterOperator};
    ///
    /// let filter = FilterCondition::eq("id", "kit-1");
    /// assert_eq!(filter.operator, FilterOperator::Eq);
    /// ```
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    /// Create a not-equal filter (field != value)
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Ne, value)
    }

    /// Create a greater-than filter (field > value)
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Gt, value)
    }

    /// Create a less-than filter (field < value)
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Lt, value)
    }

    /// Create a greater-than-or-equal filter (field >= value)
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Gte, value)
    }

    /// Create a less-than-or-equal filter (field <= value)
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Lte, value)
    }

    /// Create a membership filter (field in values)
    pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::new(
            field,
            FilterOperator::In,
            Value::Array(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Create an exclusion filter (field not in values)
    pub fn not_in<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::new(
            field,
            FilterOperator::NotIn,
            Value::Array(values.into_iter().map(Into::into).collect()),
        )
    }
}

/// Free-text search against a single string field
///
/// Translated to a prefix range: `field >= term AND field <= term + U+F8FF`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCondition {
    /// Field to search
    pub field: String,
    /// Prefix to match
    pub term: String,
}

impl SearchCondition {
    /// Highest code point in the private use area; closes the prefix range.
    pub const RANGE_END: char = '\u{f8ff}';

    /// Create a new search condition
    pub fn new(field: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            term: term.into(),
        }
    }

    /// Upper bound of the prefix range
    pub fn upper_bound(&self) -> String {
        let mut bound = self.term.clone();
        bound.push(Self::RANGE_END);
        bound
    }
}
