use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::kv::{KvStore, MemoryKv};
use crate::models::service::{Configuration, ServiceEntry};
use crate::remote::{Operation, RemoteControl, RemoteError, RemoteTarget};
use crate::store::ConfigStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub credential: String,
    pub operation: Operation,
    pub target: RemoteTarget,
}

/// Remote fake that records every call and answers from per-operation scripts.
#[derive(Default)]
pub struct RecordingRemote {
    calls: Mutex<Vec<RecordedCall>>,
    failures: Mutex<HashMap<(String, &'static str), RemoteError>>,
    statuses: Mutex<HashMap<String, String>>,
}

impl RecordingRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, service_id: &str, operation: Operation, err: RemoteError) {
        self.failures
            .lock()
            .unwrap()
            .insert((service_id.to_string(), operation.name()), err);
    }

    pub fn set_status(&self, service_id: &str, status: &str) {
        self.statuses
            .lock()
            .unwrap()
            .insert(service_id.to_string(), status.to_string());
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.calls().into_iter().map(|c| c.operation).collect()
    }
}

#[async_trait]
impl RemoteControl for RecordingRemote {
    async fn execute(
        &self,
        credential: &str,
        operation: Operation,
        target: &RemoteTarget,
    ) -> Result<Value, RemoteError> {
        self.calls.lock().unwrap().push(RecordedCall {
            credential: credential.to_string(),
            operation,
            target: target.clone(),
        });
        if let Some(err) = self
            .failures
            .lock()
            .unwrap()
            .get(&(target.service_id.clone(), operation.name()))
        {
            return Err(err.clone());
        }
        match operation {
            Operation::QueryStatus => {
                let status = self
                    .statuses
                    .lock()
                    .unwrap()
                    .get(&target.service_id)
                    .cloned()
                    .unwrap_or_else(|| "RUNNING".to_string());
                Ok(json!({ "service": { "status": status } }))
            }
            other => Ok(json!({ "operation": other.name(), "ok": true })),
        }
    }
}

pub fn entry(name: &str, account: &str) -> ServiceEntry {
    ServiceEntry {
        name: name.to_string(),
        account: account.to_string(),
        credential: Some(format!("tok-{}", account)),
        service_id: format!("svc-{}", name),
        environment_id: format!("env-{}", name),
    }
}

/// Writable store backed by memory and seeded with `entries`.
pub async fn seeded_store(entries: Vec<ServiceEntry>) -> (Arc<MemoryKv>, Arc<ConfigStore>) {
    let kv = Arc::new(MemoryKv::new());
    let dyn_kv: Arc<dyn KvStore> = kv.clone();
    let store = Arc::new(ConfigStore::new(Configuration::default(), Some(dyn_kv.clone())));
    let config = Configuration { services: entries };
    let raw = serde_json::to_string(&config.to_document()).unwrap();
    dyn_kv.put(crate::store::CONFIG_KEY, &raw).await.unwrap();
    (kv, store)
}
