use axum::{
    Router,
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    api::{action, service_config, services},
    response::{ServerError, ServerResult},
    util::app_state::AppState,
};

async fn get_status() -> impl IntoResponse {
    "ok".to_string()
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    ServerError::not_found("Not found").into_response()
}

async fn method_not_allowed() -> ServerError {
    ServerError::MethodNotAllowed("Method not allowed".to_string())
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(
            "/api/services",
            get(services::list_services).options(preflight),
        )
        .route("/api/status", get(services::get_statuses).options(preflight))
        .route(
            "/api/config/add",
            post(service_config::add_service).options(preflight),
        )
        .route(
            "/api/config/delete",
            post(service_config::delete_service).options(preflight),
        )
        .route("/api/{action}", post(action::run_action).options(preflight))
        .route("/health", get(get_status))
        .fallback(fallback)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e:?}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

pub async fn serve(state: AppState) -> ServerResult<()> {
    let addr = format!("{}:{}", state.config.bind_address, state.config.port);
    let app = create_router(state);

    let listener = TcpListener::bind(addr.as_str()).await?;
    info!("REST listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
