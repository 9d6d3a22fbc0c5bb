use std::collections::BTreeMap;
use std::fmt;

use kw_shared::api::ServiceSummary;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::remote::RemoteTarget;

pub const CURRENT_CONFIG_VERSION: u32 = 2;

fn current_config_version() -> u32 {
    CURRENT_CONFIG_VERSION
}

/// One managed service with its credential already resolved.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub name: String,
    pub account: String,
    pub credential: Option<String>,
    pub service_id: String,
    pub environment_id: String,
}

impl fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("name", &self.name)
            .field("account", &self.account)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("service_id", &self.service_id)
            .field("environment_id", &self.environment_id)
            .finish()
    }
}

impl ServiceEntry {
    pub fn target(&self) -> RemoteTarget {
        RemoteTarget {
            service_id: self.service_id.clone(),
            environment_id: self.environment_id.clone(),
        }
    }

    /// Both remote ids are non-blank, so the entry can be addressed remotely.
    pub fn has_target(&self) -> bool {
        !self.service_id.trim().is_empty() && !self.environment_id.trim().is_empty()
    }

    pub fn summary(&self) -> ServiceSummary {
        ServiceSummary {
            name: self.name.clone(),
            account: self.account.clone(),
        }
    }

    /// Names every required field that is blank. Empty when the entry is complete.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.account.trim().is_empty() {
            missing.push("account");
        }
        if self.credential.as_deref().is_none_or(|t| t.trim().is_empty()) {
            missing.push("token");
        }
        if self.service_id.trim().is_empty() {
            missing.push("serviceId");
        }
        if self.environment_id.trim().is_empty() {
            missing.push("environmentId");
        }
        missing
    }
}

/// Canonical in-memory configuration, whatever shape it was loaded from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    pub services: Vec<ServiceEntry>,
}

impl Configuration {
    pub fn find(&self, name: &str) -> Option<&ServiceEntry> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Distinct account labels in first-seen order.
    pub fn accounts(&self) -> Vec<String> {
        let mut accounts: Vec<String> = Vec::new();
        for service in &self.services {
            if !accounts.contains(&service.account) {
                accounts.push(service.account.clone());
            }
        }
        accounts
    }

    pub fn summaries(&self) -> Vec<ServiceSummary> {
        self.services.iter().map(ServiceEntry::summary).collect()
    }

    pub fn to_document(&self) -> CurrentConfig {
        CurrentConfig {
            version: CURRENT_CONFIG_VERSION,
            services: self
                .services
                .iter()
                .map(|s| CurrentServiceEntry {
                    name: s.name.clone(),
                    account: s.account.clone(),
                    token: s.credential.clone(),
                    service_id: s.service_id.clone(),
                    environment_id: s.environment_id.clone(),
                })
                .collect(),
        }
    }

    fn push_unique(&mut self, entry: ServiceEntry) {
        if self.contains(&entry.name) {
            warn!(
                "Duplicate service name {} in configuration, keeping the first",
                entry.name
            );
            return;
        }
        self.services.push(entry);
    }
}

/// Shared-token shape: entries reference an account whose token lives in `accounts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyConfig {
    pub accounts: BTreeMap<String, String>,
    #[serde(default)]
    pub services: Vec<LegacyServiceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyServiceEntry {
    pub name: String,
    pub account: String,
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub environment_id: String,
}

/// Versioned shape: every entry carries its own token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConfig {
    #[serde(default = "current_config_version")]
    pub version: u32,
    #[serde(default)]
    pub services: Vec<CurrentServiceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentServiceEntry {
    pub name: String,
    pub account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub environment_id: String,
}

/// Either configuration shape. Legacy is tried first since only it requires `accounts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigDocument {
    Legacy(LegacyConfig),
    Current(CurrentConfig),
}

fn non_blank(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.trim().is_empty())
}

impl ConfigDocument {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn normalize(self) -> Configuration {
        let mut config = Configuration::default();
        match self {
            ConfigDocument::Legacy(legacy) => {
                for s in legacy.services {
                    let credential = non_blank(legacy.accounts.get(&s.account).cloned());
                    config.push_unique(ServiceEntry {
                        name: s.name,
                        account: s.account,
                        credential,
                        service_id: s.service_id,
                        environment_id: s.environment_id,
                    });
                }
            }
            ConfigDocument::Current(current) => {
                if current.version != CURRENT_CONFIG_VERSION {
                    warn!(
                        "Configuration document declares version {}, reading it as version {}",
                        current.version, CURRENT_CONFIG_VERSION
                    );
                }
                for s in current.services {
                    config.push_unique(ServiceEntry {
                        name: s.name,
                        account: s.account,
                        credential: non_blank(s.token),
                        service_id: s.service_id,
                        environment_id: s.environment_id,
                    });
                }
            }
        }
        config
    }
}
