use anyhow::{Context, Result};
use docstore_crud::config::{CollectionConfig, Config};
use docstore_crud::crud::{CrudRequest, CrudService, ParsedRequest};
use docstore_crud::query::FilterCondition;
use docstore_crud::repository::{DocumentRepository, Entity};
use docstore_crud::schema::{Schema, SchemaConfig};
use docstore_crud::store::MemoryStore;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

use crate::utils;

/// Collection used when the configuration declares none
pub fn builtin_kits() -> CollectionConfig {
    CollectionConfig::new(
        SchemaConfig::new("kits")
            .id_field("id")
            .field("name")
            .field("createdAt")
            .field("updatedAt")
            .field("isDeleted")
            .timestamp(true)
            .soft_delete(true),
    )
}

/// One step of the walkthrough
#[derive(Debug, Serialize)]
pub struct Step {
    pub title: String,
    /// Whether the step did what the walkthrough expects of it
    pub ok: bool,
    pub outcome: Value,
}

impl Step {
    fn new(title: impl Into<String>, outcome: impl Serialize) -> Result<Self> {
        Ok(Self {
            title: title.into(),
            ok: true,
            outcome: serde_json::to_value(outcome).context("Failed to serialize step outcome")?,
        })
    }

    fn failed(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ok: false,
            outcome: json!({ "error": message.into() }),
        }
    }
}

pub async fn execute(config_path: Option<&Path>, collection: Option<&str>, verbose: bool) -> Result<()> {
    let config = utils::load_config(config_path)?;
    utils::init_logging(&config, verbose)?;

    let collection = select_collection(&config, collection)?;
    utils::info(&format!(
        "Running the lifecycle walkthrough on '{}' (in-memory store)",
        collection.schema.collection
    ));

    for step in run(&collection).await? {
        utils::section(&step.title);
        utils::print_json(&step.outcome)?;
        if step.ok {
            utils::success("as expected");
        } else {
            utils::warning("unexpected outcome");
        }
    }
    Ok(())
}

/// Pick the named collection, the only declared one, or the built-in kits
fn select_collection(config: &Config, name: Option<&str>) -> Result<CollectionConfig> {
    match (name, config.collections.as_slice()) {
        (Some(name), []) if name == "kits" => Ok(builtin_kits()),
        (None, []) => Ok(builtin_kits()),
        (None, [only]) => Ok(only.clone()),
        (None, _) => anyhow::bail!("Several collections are declared; choose one with --collection"),
        (Some(name), declared) => config.collection(name).cloned().with_context(|| {
            let known: Vec<&str> = declared.iter().map(|c| c.schema.collection.as_str()).collect();
            format!("Collection '{}' is not declared (known: {})", name, known.join(", "))
        }),
    }
}

fn entity(value: Value) -> Entity {
    match value {
        Value::Object(map) => map,
        _ => Entity::new(),
    }
}

/// Walk one collection through create, list, soft delete, recover and bulk create
pub async fn run(collection: &CollectionConfig) -> Result<Vec<Step>> {
    let schema = Schema::new(collection.schema.clone())
        .with_context(|| format!("Collection '{}' is invalid", collection.schema.collection))?;
    let id_field = schema.id_field().to_string();
    let name = schema.collection_name().to_string();
    let soft_delete = schema.soft_delete_enabled();

    let store = MemoryStore::new();
    let service = CrudService::new(DocumentRepository::new(Arc::new(store.clone()), schema));
    let options = collection.options.clone();
    let primary = options.primary_param()?.unwrap_or(id_field.as_str()).to_string();

    let list = CrudRequest::new(ParsedRequest::default(), options.clone());
    let with_deleted = CrudRequest::new(ParsedRequest::default().with_deleted(true), options.clone());
    let by_id = |id: &str| {
        CrudRequest::new(
            ParsedRequest::default().with_param_filter(FilterCondition::eq(primary.as_str(), id)),
            options.clone(),
        )
    };

    let mut steps = Vec::new();

    let first = service
        .create_one(&list, entity(json!({ id_field.as_str(): "kit-1", "name": "Starter kit" })))
        .await?;
    service
        .create_one(&list, entity(json!({ id_field.as_str(): "kit-2", "name": "Repair kit" })))
        .await?;
    steps.push(Step::new("Create two documents", &first)?);

    steps.push(Step::new("List", service.get_many(&list).await?)?);

    service.delete_one(&by_id("kit-1")).await?;
    let remaining = service.get_many(&list).await?;
    let mut deleted = Step::new("Delete kit-1, then list", &remaining)?;
    deleted.ok = remaining.len() == 1;
    steps.push(deleted);

    let everything = service.get_many(&with_deleted).await?;
    let mut listed = Step::new("List including deleted", &everything)?;
    listed.ok = everything.len() == if soft_delete { 2 } else { 1 };
    steps.push(listed);

    if soft_delete {
        steps.push(Step::new("Recover kit-1", service.recover_one(&by_id("kit-1")).await?)?);
    } else {
        steps.push(Step::failed(
            "Recover kit-1",
            format!("soft delete is off for '{}'; nothing to recover", name),
        ));
    }

    let bulk = vec![
        entity(json!({ id_field.as_str(): "bulk-1", "name": "Bulk kit 1" })),
        entity(json!({ id_field.as_str(): "bulk-2", "name": "Bulk kit 2" })),
    ];
    let before = store.document_count(&name).await;
    store.deny_writes(name.as_str(), "bulk-2");
    let rejected = service.create_many(&list, bulk.clone()).await;
    let after = store.document_count(&name).await;
    steps.push(match rejected {
        Err(err) => {
            let mut step = Step::new(
                "Bulk create with a rejected document",
                json!({ "error": err.to_string(), "status": err.status_code().as_u16(), "documents_before": before, "documents_after": after }),
            )?;
            step.ok = before == after;
            step
        }
        Ok(created) => {
            let mut step = Step::new("Bulk create with a rejected document", created)?;
            step.ok = false;
            step
        }
    });

    store.allow_writes(&name, "bulk-2");
    steps.push(Step::new("Bulk create", service.create_many(&list, bulk).await?)?);

    Ok(steps)
}
