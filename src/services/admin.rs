//! Admin service core
//!
//! Owns the external collaborators and the shared query cache. Reads go
//! through [`QueryCache::get_or_fetch`]; every successful mutation ends in
//! [`AdminService::committed`], which applies the entity's invalidation rule.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::revalidation::Revalidator;
use crate::cache::{Entity, QueryCache, rule_for};
use crate::config::{BulkConfig, CollectionsConfig, StaticConfig};
use crate::errors::{AdminError, Result};
use crate::storage::{DocumentStore, FileStorage, FunctionRunner};

/// External collaborators, substitutable in tests
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn DocumentStore>,
    pub files: Arc<dyn FileStorage>,
    pub functions: Arc<dyn FunctionRunner>,
    pub revalidator: Arc<dyn Revalidator>,
}

/// Collection ids and limits the service needs at runtime
#[derive(Debug, Clone)]
pub struct AdminSettings {
    pub collections: CollectionsConfig,
    pub stats_document_id: String,
    pub uploaders_document_id: String,
    pub activity_function_id: String,
    pub bulk: BulkConfig,
}

impl AdminSettings {
    pub fn from_config(config: &StaticConfig) -> Self {
        Self {
            collections: config.database.collections.clone(),
            stats_document_id: config.database.stats_document_id.clone(),
            uploaders_document_id: config.database.uploaders_document_id.clone(),
            activity_function_id: config.database.activity_function_id.clone(),
            bulk: config.bulk.clone(),
        }
    }
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self::from_config(&StaticConfig::default())
    }
}

pub struct AdminService {
    pub(super) backends: Backends,
    pub(super) cache: Arc<QueryCache>,
    pub(super) settings: AdminSettings,
}

impl AdminService {
    pub fn new(backends: Backends, cache: Arc<QueryCache>, settings: AdminSettings) -> Self {
        info!(
            "AdminService initialized (bulk concurrency: {})",
            settings.bulk.max_concurrency
        );
        Self {
            backends,
            cache,
            settings,
        }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn settings(&self) -> &AdminSettings {
        &self.settings
    }

    pub(super) fn store(&self) -> &dyn DocumentStore {
        self.backends.store.as_ref()
    }

    pub(super) fn collections(&self) -> &CollectionsConfig {
        &self.settings.collections
    }

    pub(super) fn bulk_concurrency(&self) -> usize {
        self.settings.bulk.max_concurrency
    }

    /// JSON payload of a precomputed document in the cache collection
    ///
    /// The payload is stored as a JSON string in the `data` attribute. A
    /// missing document or attribute yields `None`.
    pub(super) async fn precomputed(&self, doc_id: &str) -> Result<Option<Value>> {
        let doc = match self
            .store()
            .get_document(&self.collections().cache, doc_id)
            .await
        {
            Ok(doc) => doc,
            Err(AdminError::NotFound(_)) => {
                warn!("Precomputed document {} does not exist yet", doc_id);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        match doc.get("data") {
            Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
            Some(Value::String(raw)) => serde_json::from_str(raw).map(Some).map_err(|e| {
                AdminError::database_service(format!(
                    "Precomputed document {} is not valid JSON: {}",
                    doc_id, e
                ))
            }),
            Some(Value::Null) | None => Ok(None),
            Some(other) => Ok(Some(other.clone())),
        }
    }

    /// Apply the invalidation rule for a mutated entity
    ///
    /// The revalidation push is awaited, but its failure is only logged.
    pub async fn committed(&self, entity: Entity) {
        let rule = rule_for(entity);
        self.cache.invalidate_entity(entity);
        debug!("Invalidated {} families after {} mutation", rule.families.len(), entity);

        if let Some(tag) = rule.revalidate_tag
            && let Err(e) = self.backends.revalidator.revalidate(tag).await
        {
            error!("Failed to revalidate tag '{}': {}", tag, e);
        }
    }

    /// Manual refresh: one entity, or everything when `None`
    pub async fn invalidate(&self, entity: Option<Entity>) {
        match entity {
            Some(entity) => {
                info!("Manual invalidation of {}", entity);
                self.committed(entity).await;
            }
            None => {
                info!("Manual invalidation of all cached queries");
                self.cache.invalidate_all();
            }
        }
    }
}
