use anyhow::{Result, anyhow};
use kw_shared::action::Action;
use kw_shared::api::{
    AckResponse, ActionRequest, ActionResponse, AddServiceRequest, DeleteServiceRequest,
    ErrorResponse, ServicesResponse, StatusResponse,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Thin wrapper over the keepwarm HTTP API.
#[derive(Clone)]
pub struct KeepwarmClient {
    base_url: String,
    password: Option<String>,
    client: Client,
}

impl KeepwarmClient {
    pub fn new(base_url: &str, password: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            password,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn list_services(&self) -> Result<ServicesResponse> {
        let res = self.client.get(self.url("/api/services")).send().await?;
        decode(res).await
    }

    pub async fn statuses(&self) -> Result<StatusResponse> {
        let res = self.client.get(self.url("/api/status")).send().await?;
        decode(res).await
    }

    pub async fn run_action(&self, action: Action, service_name: &str) -> Result<ActionResponse> {
        let body = ActionRequest {
            password: self.password.clone(),
            service_name: Some(service_name.to_string()),
        };
        let url = self.url(&format!("/api/{}", action));
        debug!("POST {}", url);
        let res = self.client.post(&url).json(&body).send().await?;
        decode(res).await
    }

    pub async fn add_service(&self, mut body: AddServiceRequest) -> Result<AckResponse> {
        body.password = self.password.clone();
        let res = self
            .client
            .post(self.url("/api/config/add"))
            .json(&body)
            .send()
            .await?;
        decode(res).await
    }

    pub async fn delete_service(&self, service_name: &str) -> Result<AckResponse> {
        let body = DeleteServiceRequest {
            password: self.password.clone(),
            service_name: Some(service_name.to_string()),
        };
        let res = self
            .client
            .post(self.url("/api/config/delete"))
            .json(&body)
            .send()
            .await?;
        decode(res).await
    }
}

/// Non-2xx responses surface the server's `error` message when it sent one.
async fn decode<T: DeserializeOwned>(res: Response) -> Result<T> {
    let status = res.status();
    if status.is_success() {
        return Ok(res.json::<T>().await?);
    }
    let text = res.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(err) => Err(anyhow!(err.error)),
        Err(_) => Err(anyhow!("Request failed with status {}", status)),
    }
}
