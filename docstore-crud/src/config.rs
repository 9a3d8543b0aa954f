//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: DOCSTORE_, nested keys split on `__`)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/docstore-crud/{service_name}/config.toml
//! 4. System directory: /etc/docstore-crud/{service_name}/config.toml
//! 5. Default values
//!
//! Collections are declared as an array of tables. The schema keys sit at the
//! top of each entry; route options live under `options`:
//!
//! ```toml
//! [service]
//! name = "inventory"
//!
//! [[collections]]
//! collection = "kits"
//! soft_delete = true
//! fields = [
//!     { name = "id", isId = true },
//!     { name = "name" },
//! ]
//!
//! [collections.options.query]
//! max_limit = 100
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::crud::RequestOptions;
use crate::error::{Error, Result};
use crate::schema::{Schema, SchemaConfig};

const CONFIG_PREFIX: &str = "docstore-crud";
const ENV_PREFIX: &str = "DOCSTORE_";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// Document store selection
    #[serde(default)]
    pub store: StoreConfig,

    /// Declared collections
    #[serde(default)]
    pub collections: Vec<CollectionConfig>,
}

/// Service-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

/// Document store configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend implementation
    #[serde(default)]
    pub backend: StoreBackend,
}

/// Available document store backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local store, lost on exit
    #[default]
    Memory,
}

/// One collection: its schema plus the route options used to serve it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Schema declaration
    #[serde(flatten)]
    pub schema: SchemaConfig,

    /// Route options
    #[serde(default)]
    pub options: RequestOptions,
}

impl CollectionConfig {
    /// Pair a schema with default route options
    pub fn new(schema: SchemaConfig) -> Self {
        Self {
            schema,
            options: RequestOptions::default(),
        }
    }
}

fn default_service_name() -> String {
    CONFIG_PREFIX.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from all sources
    ///
    /// The service name is inferred from the binary name.
    pub fn load() -> Result<Self> {
        let service_name = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| CONFIG_PREFIX.to_string());

        Self::load_for_service(&service_name)
    }

    /// Load configuration for a specific service name
    pub fn load_for_service(service_name: &str) -> Result<Self> {
        let config_paths = Self::find_config_paths(service_name);

        tracing::debug!(service = service_name, "searching for config files");
        for path in &config_paths {
            tracing::debug!(path = %path.display(), "config candidate");
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Lowest priority first so later files override earlier ones
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!(path = %path.display(), "loading configuration");
                figment = figment.merge(Toml::file(path));
            }
        }

        Self::extract(figment)
    }

    /// Load configuration from a specific file
    ///
    /// Bypasses the search path; environment variables still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()));

        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Candidate config file paths, highest priority first
    fn find_config_paths(service_name: &str) -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix(CONFIG_PREFIX);
        let config_file_path = Path::new(service_name).join("config.toml");
        if let Some(path) = xdg_dirs.find_config_file(&config_file_path) {
            paths.push(path);
        }

        paths.push(
            PathBuf::from("/etc")
                .join(CONFIG_PREFIX)
                .join(service_name)
                .join("config.toml"),
        );

        paths
    }

    /// Where a service's config file is expected to live
    pub fn recommended_path(service_name: &str) -> PathBuf {
        let config_file_path = Path::new(service_name).join("config.toml");
        xdg::BaseDirectories::with_prefix(CONFIG_PREFIX)
            .get_config_file(&config_file_path)
            .unwrap_or_else(|| {
                PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| String::from("~")))
                    .join(".config")
                    .join(CONFIG_PREFIX)
                    .join(config_file_path)
            })
    }

    /// Validate every declared collection and pair it with its route options
    ///
    /// Fails on the first invalid schema or on a collection declared twice.
    pub fn registry(&self) -> Result<Vec<(Schema, RequestOptions)>> {
        let mut registry: Vec<(Schema, RequestOptions)> = Vec::with_capacity(self.collections.len());
        for collection in &self.collections {
            let schema = Schema::new(collection.schema.clone())?;
            if registry.iter().any(|(s, _)| s.collection_name() == schema.collection_name()) {
                return Err(Error::Configuration(format!(
                    "collection '{}' is declared more than once",
                    schema.collection_name()
                )));
            }
            collection.options.primary_param()?;
            registry.push((schema, collection.options.clone()));
        }
        Ok(registry)
    }

    /// Declared collection by name
    pub fn collection(&self, name: &str) -> Option<&CollectionConfig> {
        self.collections.iter().find(|c| c.schema.collection == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crud::ParamOption;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const KITS: &str = r#"
[service]
name = "inventory"
log_level = "debug"

[[collections]]
collection = "kits"
soft_delete = true
fields = [
    { name = "id", isId = true },
    { name = "name" },
    { name = "secret" },
]

[collections.options.query]
exclude = ["secret"]
max_limit = 100

[[collections.options.params]]
field = "id"
primary = true
"#;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.service.name, "docstore-crud");
        assert_eq!(config.service.log_level, "info");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert!(config.collections.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let file = config_file(KITS);
        let config = Config::load_from(file.path()).unwrap();

        assert_eq!(config.service.name, "inventory");
        assert_eq!(config.service.log_level, "debug");

        let kits = config.collection("kits").unwrap();
        assert!(kits.schema.soft_delete);
        assert!(kits.schema.timestamp);
        assert_eq!(kits.schema.fields.len(), 3);
        assert_eq!(kits.options.query.exclude, Some(vec!["secret".to_string()]));
        assert_eq!(kits.options.query.max_limit, Some(100));
        assert_eq!(kits.options.params, vec![ParamOption::primary("id")]);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_registry_builds_schemas() {
        let file = config_file(KITS);
        let config = Config::load_from(file.path()).unwrap();

        let registry = config.registry().unwrap();
        assert_eq!(registry.len(), 1);
        let (schema, options) = &registry[0];
        assert_eq!(schema.collection_name(), "kits");
        assert_eq!(schema.id_field(), "id");
        assert!(schema.soft_delete_enabled());
        assert_eq!(options.query.max_limit, Some(100));
    }

    #[test]
    fn test_registry_rejects_invalid_schema() {
        let config = Config {
            collections: vec![CollectionConfig::new(SchemaConfig::new("kits").field("name"))],
            ..Config::default()
        };

        assert!(matches!(config.registry(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_registry_rejects_duplicate_collections() {
        let kits = CollectionConfig::new(SchemaConfig::new("kits").id_field("id"));
        let config = Config {
            collections: vec![kits.clone(), kits],
            ..Config::default()
        };

        let err = config.registry().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_registry_rejects_two_primary_params() {
        let mut kits = CollectionConfig::new(SchemaConfig::new("kits").id_field("id").field("slug"));
        kits.options = RequestOptions::default()
            .with_param(ParamOption::primary("id"))
            .with_param(ParamOption::primary("slug"));
        let config = Config {
            collections: vec![kits],
            ..Config::default()
        };

        assert!(matches!(config.registry(), Err(Error::BadRequest(_))));
    }

    #[test]
    fn test_recommended_path() {
        let path = Config::recommended_path("inventory");
        assert!(path.ends_with("docstore-crud/inventory/config.toml"));
    }
}
