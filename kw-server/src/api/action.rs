use axum::body::Bytes;
use axum::extract::{Path, State};
use kw_shared::api::{ActionRequest, ActionResponse};

use crate::dispatch::parse_action;
use crate::response::{ServerAppResult, ServerResponse};
use crate::util::app_state::AppState;
use crate::util::json::JsonBody;

/// `POST /api/{action}`. The action name is checked before the body is read.
pub async fn run_action(
    State(state): State<AppState>,
    Path(action): Path<String>,
    body: Bytes,
) -> ServerAppResult<ActionResponse> {
    let action = parse_action(&action)?;
    let JsonBody(request) = JsonBody::<ActionRequest>::from_bytes(&body)?;

    let data = state
        .dispatcher
        .run(
            request.password.as_deref(),
            action,
            request.service_name.as_deref(),
        )
        .await?;

    Ok(ServerResponse::builder()
        .body(ActionResponse {
            success: true,
            data,
        })
        .ok()
        .build())
}
