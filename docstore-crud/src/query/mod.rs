//! Query vocabulary and the incremental query builder
//!
//! - [`FilterOperator`] / [`NativeOperator`]: the closed operator set and its
//!   translation into store syntax
//! - [`FilterCondition`], [`SortSpec`], [`SearchCondition`]: request-level
//!   building blocks
//! - [`QueryBuilder`] / [`Query`]: single-use accumulation of predicates,
//!   projection, ordering and pagination

mod builder;
mod filter;
mod operator;

pub use builder::{FieldRef, OrderKey, Predicate, Query, QueryBuilder};
pub use filter::{FilterCondition, OrderDirection, SearchCondition, SortSpec};
pub use operator::{FilterOperator, NativeOperator, UnknownOperator};
