//! Framework-neutral CRUD verbs
//!
//! [`CrudService`] turns a [`CrudRequest`] (what the caller asked for plus the
//! route's [`RequestOptions`]) into repository calls:
//!
//! - field visibility from `allow`/`exclude`/`persist` ([`fields`])
//! - filters from route declarations, path params and the query string
//! - sort, page size and offset with route defaults and caps
//! - payload merging for writes ([`merge`])
//!
//! Filters and sorts on the route's primary param (or the schema id field)
//! target the document identity instead of a stored field.

pub mod fields;
pub mod merge;
mod options;
mod request;
mod response;
mod service;

pub use options::{
    CreateOneRoute, DeleteOneRoute, ParamOption, QueryOptions, RequestOptions, RoutesOptions, WriteRoute,
};
pub use request::{CrudRequest, ParsedRequest};
pub use response::{ListResponse, PaginationMeta};
pub use service::{CrudService, Operation};
