use std::sync::Arc;

use chrono::Utc;
use kw_shared::action::Action;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::SharedSecret;
use crate::remote::{RemoteControl, RemoteError};
use crate::store::{ConfigError, ConfigStore};

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("invalid action {0}")]
    InvalidAction(String),
    #[error("invalid password")]
    Unauthorized,
    #[error("service {0} not found")]
    NotFound(String),
    #[error("service {0} has no usable {1}")]
    MisconfiguredService(String, Misconfig),
    #[error("remote call failed: {0}")]
    RemoteFailure(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Which part of an entry keeps it from being acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Misconfig {
    Credential,
    TargetIds,
}

impl std::fmt::Display for Misconfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Misconfig::Credential => write!(f, "credential"),
            Misconfig::TargetIds => write!(f, "service or environment id"),
        }
    }
}

impl From<RemoteError> for ActionError {
    fn from(err: RemoteError) -> Self {
        ActionError::RemoteFailure(err.message())
    }
}

pub fn parse_action(name: &str) -> Result<Action, ActionError> {
    Action::from_str(name).map_err(|_| ActionError::InvalidAction(name.to_string()))
}

/// Validates and executes operator actions, keeping the stopped-at ledger in step.
pub struct Dispatcher {
    store: Arc<ConfigStore>,
    remote: Arc<dyn RemoteControl>,
    secret: SharedSecret,
}

impl Dispatcher {
    pub fn new(
        store: Arc<ConfigStore>,
        remote: Arc<dyn RemoteControl>,
        secret: SharedSecret,
    ) -> Self {
        Self {
            store,
            remote,
            secret,
        }
    }

    pub fn authorize(&self, provided: Option<&str>) -> Result<(), ActionError> {
        if self.secret.verify(provided) {
            Ok(())
        } else {
            Err(ActionError::Unauthorized)
        }
    }

    pub async fn dispatch(
        &self,
        provided: Option<&str>,
        action_name: &str,
        service_name: Option<&str>,
    ) -> Result<Value, ActionError> {
        let action = parse_action(action_name)?;
        self.run(provided, action, service_name).await
    }

    pub async fn run(
        &self,
        provided: Option<&str>,
        action: Action,
        service_name: Option<&str>,
    ) -> Result<Value, ActionError> {
        self.authorize(provided)?;

        let name = service_name.unwrap_or_default();
        let entry = self
            .store
            .lookup(name)
            .await?
            .ok_or_else(|| ActionError::NotFound(name.to_string()))?;
        let credential = entry
            .credential
            .as_deref()
            .ok_or_else(|| {
                ActionError::MisconfiguredService(entry.name.clone(), Misconfig::Credential)
            })?;
        if !entry.has_target() {
            return Err(ActionError::MisconfiguredService(
                entry.name.clone(),
                Misconfig::TargetIds,
            ));
        }

        let data = self
            .remote
            .execute(credential, action.into(), &entry.target())
            .await?;
        info!("{} succeeded for {}", action, entry.name);

        let ledger = self.store.ledger();
        let recorded = match action {
            Action::Stop => ledger.record_stop(&entry.name, Utc::now()).await,
            Action::Restart => ledger.record_restart(&entry.name).await,
            Action::Start | Action::Redeploy => Ok(()),
        };
        if let Err(e) = recorded {
            warn!("{} for {} succeeded but the ledger was not updated: {}", action, entry.name, e);
        }

        Ok(data)
    }
}
