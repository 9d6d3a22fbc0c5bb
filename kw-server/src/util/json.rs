use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::response::ServerError;

/// JSON body whose rejections render as the API's `{success:false, error}` envelope.
pub struct JsonBody<T>(pub T);

impl<T> JsonBody<T>
where
    T: DeserializeOwned,
{
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ServerError> {
        serde_json::from_slice(bytes)
            .map(JsonBody)
            .map_err(|_| ServerError::bad_request("Invalid request body"))
    }
}

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| ServerError::bad_request("Invalid request body"))?;
        Self::from_bytes(&bytes)
    }
}
