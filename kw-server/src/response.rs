use axum::{
    http::header::CONTENT_TYPE,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use kw_shared::api::ErrorResponse;
use serde::Serialize;
use std::fmt::Display;
use tracing::{error, warn};

use crate::dispatch::{ActionError, Misconfig};
use crate::kv::KvError;
use crate::store::ConfigError;

/// Message returned for every secret mismatch. No other error uses it.
pub const UNAUTHORIZED_MESSAGE: &str = "Invalid password";

#[derive(Debug)]
pub struct ServerResponse<T: Serialize> {
    pub body: Option<T>,
    pub status_code: StatusCode,
}

#[derive(Debug)]
pub struct ServerResponseBuilder<T: Serialize> {
    pub body: Option<T>,
    pub status_code: Option<StatusCode>,
}

impl<T> ServerResponseBuilder<T>
where
    T: Serialize,
{
    pub fn body(mut self, body: T) -> Self {
        self.body = Some(body);
        self
    }

    pub fn status_code(mut self, status_code: StatusCode) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn ok(mut self) -> Self {
        self.status_code = Some(StatusCode::OK);
        self
    }

    pub fn build(self) -> ServerResponse<T> {
        ServerResponse {
            body: self.body,
            status_code: self.status_code.unwrap_or(StatusCode::OK),
        }
    }

    pub fn new() -> Self {
        Self {
            body: None,
            status_code: None,
        }
    }
}

impl<T: Serialize> ServerResponse<T> {
    pub fn builder() -> ServerResponseBuilder<T> {
        ServerResponseBuilder::new()
    }
}

impl<T: Serialize> IntoResponse for ServerResponse<T> {
    fn into_response(self) -> Response {
        let body = match self.body {
            Some(body) => body,
            None => return self.status_code.into_response(),
        };

        let bytes = match serde_json::to_vec(&body) {
            Ok(b) => b,
            Err(err) => {
                tracing::error!("Error serializing response body: {:?}", err);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        (self.status_code, headers, bytes).into_response()
    }
}

#[derive(Debug)]
pub enum ServerError {
    InternalError(String),
    Unauthorized(String),
    BadRequest(String),
    NotFound(String),
    MethodNotAllowed(String),
}

impl Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::InternalError(message) => write!(f, "Internal Error: {}", message),
            ServerError::Unauthorized(message) => write!(f, "Unauthorized: {}", message),
            ServerError::BadRequest(message) => write!(f, "Bad Request: {}", message),
            ServerError::NotFound(message) => write!(f, "Not Found: {}", message),
            ServerError::MethodNotAllowed(message) => write!(f, "Method Not Allowed: {}", message),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::InternalError(err.to_string())
    }
}

impl From<KvError> for ServerError {
    fn from(err: KvError) -> Self {
        ServerError::InternalError(err.to_string())
    }
}

impl From<ConfigError> for ServerError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation(fields) => {
                ServerError::BadRequest(format!("Missing required fields: {}", fields))
            }
            ConfigError::DuplicateName(name) => {
                ServerError::BadRequest(format!("Service {} already exists", name))
            }
            ConfigError::NotFound(_) => ServerError::not_found("Service not found"),
            ConfigError::NoWritableStore => {
                ServerError::internal_error("No writable configuration store is configured")
            }
            ConfigError::Malformed(detail) => {
                error!("Stored configuration is invalid: {}", detail);
                ServerError::internal_error("Service configuration error")
            }
            ConfigError::Persistence(e) => {
                error!("Configuration store failed: {}", e);
                ServerError::internal_error("Configuration store unavailable")
            }
        }
    }
}

impl From<ActionError> for ServerError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::InvalidAction(_) => ServerError::bad_request("Invalid action"),
            ActionError::Unauthorized => ServerError::unauthorized(),
            ActionError::NotFound(_) => ServerError::not_found("Service not found"),
            ActionError::MisconfiguredService(_, Misconfig::Credential) => {
                ServerError::internal_error("Account token not found")
            }
            ActionError::MisconfiguredService(_, Misconfig::TargetIds) => {
                ServerError::internal_error("Service configuration error")
            }
            ActionError::RemoteFailure(message) => ServerError::InternalError(message),
            ActionError::Config(e) => e.into(),
        }
    }
}

impl ServerError {
    pub fn internal_error(message: &str) -> Self {
        ServerError::InternalError(message.to_string())
    }

    pub fn bad_request(message: &str) -> Self {
        ServerError::BadRequest(message.to_string())
    }

    pub fn not_found(message: &str) -> Self {
        ServerError::NotFound(message.to_string())
    }

    pub fn unauthorized() -> Self {
        ServerError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ServerError::InternalError(m)
            | ServerError::Unauthorized(m)
            | ServerError::BadRequest(m)
            | ServerError::NotFound(m)
            | ServerError::MethodNotAllowed(m) => m,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Returning error response {} {}", status, self.message());
        } else {
            warn!("Returning error response {} {}", status, self.message());
        }

        ServerResponse::<ErrorResponse>::builder()
            .body(ErrorResponse {
                success: false,
                error: self.message().to_owned(),
            })
            .status_code(status)
            .build()
            .into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
pub type ServerAppResult<T> = Result<ServerResponse<T>, ServerError>;
