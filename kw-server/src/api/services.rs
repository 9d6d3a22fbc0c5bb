use axum::extract::State;
use kw_shared::api::{ServicesResponse, StatusResponse};
use tracing::error;

use crate::response::{ServerAppResult, ServerError, ServerResponse};
use crate::status::collect_statuses;
use crate::util::app_state::AppState;

pub async fn list_services(State(state): State<AppState>) -> ServerAppResult<ServicesResponse> {
    let config = state.store.resolve().await.map_err(|e| {
        error!("Error resolving services: {}", e);
        ServerError::internal_error("Service configuration error")
    })?;

    Ok(ServerResponse::builder()
        .body(ServicesResponse {
            success: true,
            accounts: config.accounts(),
            services: config.summaries(),
        })
        .ok()
        .build())
}

pub async fn get_statuses(State(state): State<AppState>) -> ServerAppResult<StatusResponse> {
    let config = state.store.resolve().await.map_err(|e| {
        error!("Error getting statuses: {}", e);
        ServerError::internal_error("Failed to get statuses")
    })?;
    let statuses = collect_statuses(&config, state.remote.as_ref()).await;

    Ok(ServerResponse::builder()
        .body(StatusResponse {
            success: true,
            statuses,
        })
        .ok()
        .build())
}
