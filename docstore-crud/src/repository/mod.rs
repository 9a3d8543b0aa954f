//! Schema-governed entity persistence
//!
//! The repository is the only place that knows how entities map onto stored
//! documents:
//!
//! - **Identity**: the schema's id field becomes the document id and is never
//!   written into the stored fields
//! - **Timestamps**: `createdAt` is set once, `updatedAt` on every write
//! - **Soft delete**: a flag instead of a physical delete, hidden from default
//!   queries
//! - **Bulk create**: one atomic batch
//!
//! Callers program against [`CrudRepository`]; [`DocumentRepository`] is the
//! implementation over any [`DocumentStore`](crate::store::DocumentStore).

use serde_json::{Map, Value};

mod clock;
mod document;
mod traits;

pub use clock::{timestamp_value, Clock, ManualClock, SystemClock};
pub use document::DocumentRepository;
pub use traits::{CrudRepository, LifecycleOptions, LifecyclePolicy};

/// An open mapping of field name to value, always carrying the id field once
/// read from storage
pub type Entity = Map<String, Value>;

/// Native identity for a scalar value: strings as-is, numbers in decimal form
pub(crate) fn identity_string(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
