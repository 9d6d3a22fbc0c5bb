use std::sync::Arc;

use kw_server::{
    api,
    config::AppConfig,
    kv::{KvStore, MongoKv},
    remote::{RemoteControl, ZeaburClient},
    response::{ServerError, ServerResult},
    util::{app_state::AppState, logging::init_logging},
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> ServerResult<()> {
    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {}", e);
        std::process::exit(1);
    });
    init_logging(&config.log_level);
    info!("Starting keepwarm");

    if !config.auth_password.is_set() {
        warn!("AUTH_PASSWORD is not set, every mutating request will be rejected");
    }

    let kv: Option<Arc<dyn KvStore>> = match &config.mongo_uri {
        Some(uri) => {
            info!("Connecting to database");
            Some(Arc::new(MongoKv::connect(uri, &config.mongo_db).await?))
        }
        None => {
            warn!(
                "MONGO_URI is not set, serving {} services from SERVICES read-only",
                config.fallback_services.services.len()
            );
            None
        }
    };

    let remote: Arc<dyn RemoteControl> = Arc::new(
        ZeaburClient::new(&config.zeabur_api_url)
            .map_err(|e| ServerError::internal_error(&e.to_string()))?,
    );
    let state = AppState::new(config, kv, remote);

    match state.config.keepalive.interval() {
        Some(every) => {
            info!("Keepalive sweep every {}s", every.as_secs());
            Arc::new(state.keepalive()).spawn(every);
        }
        None => info!("Keepalive sweep disabled"),
    }

    if let Err(e) = api::serve::serve(state).await {
        tracing::error!("Server exited: {}", e);
    }
    Ok(())
}
