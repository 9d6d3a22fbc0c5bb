use axum::extract::State;
use kw_shared::api::{AckResponse, AddServiceRequest, DeleteServiceRequest};

use crate::models::service::ServiceEntry;
use crate::response::{ServerAppResult, ServerError, ServerResponse};
use crate::util::app_state::AppState;
use crate::util::json::JsonBody;

fn ack() -> ServerResponse<AckResponse> {
    ServerResponse::builder()
        .body(AckResponse { success: true })
        .ok()
        .build()
}

pub async fn add_service(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AddServiceRequest>,
) -> ServerAppResult<AckResponse> {
    state.dispatcher.authorize(request.password.as_deref())?;

    let trimmed = |v: Option<String>| v.map(|s| s.trim().to_string()).unwrap_or_default();
    let entry = ServiceEntry {
        name: trimmed(request.name),
        account: trimmed(request.account),
        credential: request.token.map(|t| t.trim().to_string()),
        service_id: trimmed(request.service_id),
        environment_id: trimmed(request.environment_id),
    };
    state.store.add(entry).await?;
    Ok(ack())
}

pub async fn delete_service(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<DeleteServiceRequest>,
) -> ServerAppResult<AckResponse> {
    state.dispatcher.authorize(request.password.as_deref())?;

    let name = request
        .service_name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ServerError::bad_request("Missing required fields: serviceName"))?;
    state.store.remove(&name).await?;
    Ok(ack())
}
