use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::kv::{KvError, KvStore};
use crate::ledger::Ledger;
use crate::models::service::{ConfigDocument, Configuration, ServiceEntry};

pub const CONFIG_KEY: &str = "config";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required fields: {0}")]
    Validation(String),
    #[error("no writable configuration store is configured")]
    NoWritableStore,
    #[error("service {0} already exists")]
    DuplicateName(String),
    #[error("service {0} not found")]
    NotFound(String),
    #[error("stored configuration is invalid: {0}")]
    Malformed(String),
    #[error(transparent)]
    Persistence(#[from] KvError),
}

/// Resolves the active service set from either the process-supplied snapshot or the persisted document.
///
/// With a key-value store bound, the persisted document is authoritative and
/// the snapshot is ignored. Without one, the snapshot is served read-only.
pub struct ConfigStore {
    fallback: Configuration,
    kv: Option<Arc<dyn KvStore>>,
    ledger: Ledger,
}

impl ConfigStore {
    pub fn new(fallback: Configuration, kv: Option<Arc<dyn KvStore>>) -> Self {
        let ledger = Ledger::new(kv.clone());
        Self {
            fallback,
            kv,
            ledger,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub async fn resolve(&self) -> Result<Configuration, ConfigError> {
        let Some(kv) = &self.kv else {
            return Ok(self.fallback.clone());
        };
        match kv.get(CONFIG_KEY).await? {
            None => Ok(Configuration::default()),
            Some(raw) => ConfigDocument::parse(&raw)
                .map(ConfigDocument::normalize)
                .map_err(|e| ConfigError::Malformed(e.to_string())),
        }
    }

    pub async fn lookup(&self, name: &str) -> Result<Option<ServiceEntry>, ConfigError> {
        Ok(self.resolve().await?.find(name).cloned())
    }

    pub async fn add(&self, entry: ServiceEntry) -> Result<(), ConfigError> {
        let missing = entry.missing_fields();
        if !missing.is_empty() {
            return Err(ConfigError::Validation(missing.join(", ")));
        }
        let kv = self.writable()?;

        let mut config = self.resolve().await?;
        if config.contains(&entry.name) {
            return Err(ConfigError::DuplicateName(entry.name));
        }
        let name = entry.name.clone();
        config.services.push(entry);
        self.persist(kv, &config).await?;
        info!("Added service {}", name);
        Ok(())
    }

    pub async fn remove(&self, name: &str) -> Result<(), ConfigError> {
        let kv = self.writable()?;

        let mut config = self.resolve().await?;
        if !config.contains(name) {
            return Err(ConfigError::NotFound(name.to_string()));
        }
        config.services.retain(|s| s.name != name);
        self.persist(kv, &config).await?;

        if let Err(e) = self.ledger.forget(name).await {
            warn!("Removed service {} but failed to drop its ledger records: {}", name, e);
        }
        info!("Removed service {}", name);
        Ok(())
    }

    fn writable(&self) -> Result<&Arc<dyn KvStore>, ConfigError> {
        self.kv.as_ref().ok_or(ConfigError::NoWritableStore)
    }

    async fn persist(&self, kv: &Arc<dyn KvStore>, config: &Configuration) -> Result<(), ConfigError> {
        let raw = serde_json::to_string(&config.to_document())
            .map_err(|e| ConfigError::Malformed(e.to_string()))?;
        kv.put(CONFIG_KEY, &raw).await?;
        Ok(())
    }
}
