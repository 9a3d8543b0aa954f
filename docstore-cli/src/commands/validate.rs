use anyhow::{Context, Result};
use docstore_crud::config::Config;
use docstore_crud::schema::Schema;
use std::path::Path;

use crate::utils;

pub async fn execute(config_path: Option<&Path>, verbose: bool) -> Result<()> {
    let config = utils::load_config(config_path)?;
    utils::init_logging(&config, verbose)?;

    utils::section(&format!("Validating collections for '{}'", config.service.name));
    let schemas = validate(&config)?;

    if schemas.is_empty() {
        utils::warning("No collections declared");
        return Ok(());
    }

    for schema in &schemas {
        utils::success(&describe(schema));
    }
    println!();
    utils::success(&format!("{} collection(s) valid", schemas.len()));
    Ok(())
}

/// Build every declared schema, stopping at the first invalid one
pub fn validate(config: &Config) -> Result<Vec<Schema>> {
    for collection in &config.collections {
        Schema::new(collection.schema.clone())
            .with_context(|| format!("Collection '{}' is invalid", collection.schema.collection))?;
    }

    let registry = config.registry().context("Collection registry is invalid")?;
    Ok(registry.into_iter().map(|(schema, _)| schema).collect())
}

fn describe(schema: &Schema) -> String {
    format!(
        "{}: {} field(s), id '{}', timestamps {}, soft delete {}",
        schema.collection_name(),
        schema.fields().len(),
        schema.id_field(),
        utils::on_off(schema.timestamp_enabled()),
        utils::on_off(schema.soft_delete_enabled()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore_crud::config::CollectionConfig;
    use docstore_crud::schema::SchemaConfig;

    fn config(collections: Vec<SchemaConfig>) -> Config {
        Config {
            collections: collections.into_iter().map(CollectionConfig::new).collect(),
            ..Config::default()
        }
    }

    #[test]
    fn test_valid_collections() {
        let schemas = validate(&config(vec![
            SchemaConfig::new("kits").id_field("id").field("name"),
            SchemaConfig::new("owners").id_field("ownerId"),
        ]))
        .unwrap();

        assert_eq!(schemas.len(), 2);
        assert_eq!(
            describe(&schemas[0]),
            "kits: 2 field(s), id 'id', timestamps on, soft delete off"
        );
    }

    #[test]
    fn test_sample_configuration_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../demos/kits.toml");
        let config = Config::load_from(&path).unwrap();

        let schemas = validate(&config).unwrap();
        assert_eq!(schemas.len(), 1);
        assert!(schemas[0].soft_delete_enabled());
    }

    #[test]
    fn test_first_invalid_collection_is_named() {
        let err = validate(&config(vec![
            SchemaConfig::new("kits").id_field("id"),
            SchemaConfig::new("owners").field("name"),
        ]))
        .unwrap_err();

        assert!(err.to_string().contains("owners"));
    }
}
