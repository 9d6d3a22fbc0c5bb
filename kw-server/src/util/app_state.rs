use std::sync::Arc;

use crate::config::AppConfig;
use crate::dispatch::Dispatcher;
use crate::keepalive::KeepaliveEngine;
use crate::kv::KvStore;
use crate::remote::RemoteControl;
use crate::store::ConfigStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<ConfigStore>,
    pub remote: Arc<dyn RemoteControl>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        kv: Option<Arc<dyn KvStore>>,
        remote: Arc<dyn RemoteControl>,
    ) -> Self {
        let store = Arc::new(ConfigStore::new(config.fallback_services.clone(), kv));
        let dispatcher = Arc::new(Dispatcher::new(
            store.clone(),
            remote.clone(),
            config.auth_password.clone(),
        ));
        Self {
            config: Arc::new(config),
            store,
            remote,
            dispatcher,
        }
    }

    pub fn keepalive(&self) -> KeepaliveEngine {
        KeepaliveEngine::new(
            self.store.clone(),
            self.remote.clone(),
            self.config.keepalive.policy(),
        )
    }
}
