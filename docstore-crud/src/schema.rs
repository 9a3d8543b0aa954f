//! Collection schemas
//!
//! A [`SchemaConfig`] is the declarative description of a collection, loaded
//! from configuration or built in code. [`Schema::new`] validates it once and
//! produces the immutable [`Schema`] shared by the repository and orchestrator.
//!
//! # Example
//!
//! ```rust
//! use docstore_crud::schema::{Schema, SchemaConfig};
//!
//! let schema = Schema::new(
//!     SchemaConfig::new("kits")
//!         .id_field("id")
//!         .field("name")
//!         .soft_delete(true),
//! )
//! .unwrap();
//!
//! assert_eq!(schema.collection_name(), "kits");
//! assert_eq!(schema.id_field(), "id");
//! assert!(schema.timestamp_enabled());
//! assert!(schema.soft_delete_enabled());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Error, Result};

/// A declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Whether this field is the document identity
    #[serde(default, rename = "isId", alias = "is_id")]
    pub is_id: bool,
}

impl FieldDef {
    /// A regular field
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_id: false,
        }
    }

    /// The identity field
    pub fn id(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_id: true,
        }
    }
}

/// Names of the fields maintained by the repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleFields {
    /// Creation timestamp
    #[serde(default = "default_created_at")]
    pub created_at: String,
    /// Last write timestamp
    #[serde(default = "default_updated_at")]
    pub updated_at: String,
    /// Soft-delete flag
    #[serde(default = "default_deleted")]
    pub deleted: String,
}

impl Default for LifecycleFields {
    fn default() -> Self {
        Self {
            created_at: default_created_at(),
            updated_at: default_updated_at(),
            deleted: default_deleted(),
        }
    }
}

fn default_created_at() -> String {
    "createdAt".to_string()
}

fn default_updated_at() -> String {
    "updatedAt".to_string()
}

fn default_deleted() -> String {
    "isDeleted".to_string()
}

fn default_true() -> bool {
    true
}

/// Unvalidated collection description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Collection name
    pub collection: String,

    /// Declared fields; exactly one must be flagged as id
    #[serde(default)]
    pub fields: Vec<FieldDef>,

    /// Stamp creation/update timestamps by default
    #[serde(default = "default_true")]
    pub timestamp: bool,

    /// Soft delete by default
    #[serde(default, rename = "soft_delete", alias = "softDelete")]
    pub soft_delete: bool,

    /// Lifecycle field names
    #[serde(default)]
    pub lifecycle: LifecycleFields,
}

impl SchemaConfig {
    /// Start describing `collection` with timestamps on and soft delete off
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            fields: Vec::new(),
            timestamp: true,
            soft_delete: false,
            lifecycle: LifecycleFields::default(),
        }
    }

    /// Declare a regular field
    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldDef::new(name));
        self
    }

    /// Declare the identity field
    #[must_use]
    pub fn id_field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldDef::id(name));
        self
    }

    /// Set the default timestamp policy
    #[must_use]
    pub fn timestamp(mut self, enabled: bool) -> Self {
        self.timestamp = enabled;
        self
    }

    /// Set the default soft-delete policy
    #[must_use]
    pub fn soft_delete(mut self, enabled: bool) -> Self {
        self.soft_delete = enabled;
        self
    }

    /// Rename the lifecycle fields
    #[must_use]
    pub fn lifecycle(mut self, lifecycle: LifecycleFields) -> Self {
        self.lifecycle = lifecycle;
        self
    }
}

/// Validated, immutable collection schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    collection_name: String,
    fields: Vec<FieldDef>,
    id_field: String,
    timestamp_enabled: bool,
    soft_delete_enabled: bool,
    lifecycle: LifecycleFields,
}

impl Schema {
    /// Validate a description
    ///
    /// Fails with [`Error::Configuration`] unless the collection name is
    /// non-empty, field names are unique, and exactly one field is the id.
    pub fn new(config: SchemaConfig) -> Result<Self> {
        let collection = config.collection.trim();
        if collection.is_empty() {
            return Err(Error::Configuration(
                "schema collection name must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for field in &config.fields {
            if field.name.is_empty() {
                return Err(Error::Configuration(format!(
                    "collection '{collection}' declares a field with an empty name"
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Error::Configuration(format!(
                    "collection '{collection}' declares field '{}' more than once",
                    field.name
                )));
            }
        }

        let ids: Vec<&FieldDef> = config.fields.iter().filter(|f| f.is_id).collect();
        let id_field = match ids.as_slice() {
            [only] => only.name.clone(),
            [] => {
                return Err(Error::Configuration(format!(
                    "collection '{collection}' must declare exactly one id field, found none"
                )))
            }
            many => {
                let names: Vec<&str> = many.iter().map(|f| f.name.as_str()).collect();
                return Err(Error::Configuration(format!(
                    "collection '{collection}' must declare exactly one id field, found {}: {}",
                    many.len(),
                    names.join(", ")
                )));
            }
        };

        Ok(Self {
            collection_name: collection.to_string(),
            id_field,
            fields: config.fields,
            timestamp_enabled: config.timestamp,
            soft_delete_enabled: config.soft_delete,
            lifecycle: config.lifecycle,
        })
    }

    /// Collection name
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Declared fields in declaration order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Declared field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// The identity field
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Default timestamp policy
    pub fn timestamp_enabled(&self) -> bool {
        self.timestamp_enabled
    }

    /// Default soft-delete policy
    pub fn soft_delete_enabled(&self) -> bool {
        self.soft_delete_enabled
    }

    /// Creation timestamp field
    pub fn created_at_field(&self) -> &str {
        &self.lifecycle.created_at
    }

    /// Update timestamp field
    pub fn updated_at_field(&self) -> &str {
        &self.lifecycle.updated_at
    }

    /// Soft-delete flag field
    pub fn deleted_field(&self) -> &str {
        &self.lifecycle.deleted
    }
}

impl TryFrom<SchemaConfig> for Schema {
    type Error = Error;

    fn try_from(config: SchemaConfig) -> Result<Self> {
        Self::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exactly_one_id_field() {
        let schema = Schema::new(SchemaConfig::new("kits").field("name").id_field("id")).unwrap();
        assert_eq!(schema.id_field(), "id");
        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["name", "id"]);
    }

    #[test]
    fn test_missing_id_field_is_configuration_error() {
        let err = Schema::new(SchemaConfig::new("kits").field("name")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("found none"));
    }

    #[test]
    fn test_two_id_fields_is_configuration_error() {
        let err = Schema::new(SchemaConfig::new("kits").id_field("id").id_field("uid")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("id, uid"));
    }

    #[test]
    fn test_duplicate_field_is_rejected() {
        let err = Schema::new(SchemaConfig::new("kits").id_field("id").field("name").field("name"))
            .unwrap_err();
        assert!(err.to_string().contains("'name' more than once"));
    }

    #[test]
    fn test_empty_collection_is_rejected() {
        let err = Schema::new(SchemaConfig::new("  ").id_field("id")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_defaults_from_serialized_config() {
        let config: SchemaConfig = serde_json::from_value(json!({
            "collection": "kits",
            "fields": [{"name": "id", "isId": true}, {"name": "name"}],
            "softDelete": true
        }))
        .unwrap();
        let schema = Schema::try_from(config).unwrap();

        assert!(schema.timestamp_enabled());
        assert!(schema.soft_delete_enabled());
        assert_eq!(schema.created_at_field(), "createdAt");
        assert_eq!(schema.updated_at_field(), "updatedAt");
        assert_eq!(schema.deleted_field(), "isDeleted");
    }

    #[test]
    fn test_renamed_lifecycle_fields() {
        let schema = Schema::new(SchemaConfig::new("kits").id_field("id").lifecycle(LifecycleFields {
            created_at: "created".into(),
            updated_at: "modified".into(),
            deleted: "archived".into(),
        }))
        .unwrap();

        assert_eq!(schema.created_at_field(), "created");
        assert_eq!(schema.updated_at_field(), "modified");
        assert_eq!(schema.deleted_field(), "archived");
    }
}
