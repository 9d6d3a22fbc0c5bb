use async_trait::async_trait;
use kw_shared::action::Action;
use kw_shared::status::ServiceStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_ZEABUR_API: &str = "https://api.zeabur.com/graphql";

const RESTART_SERVICE: &str = r#"
mutation RestartService($serviceId: ObjectID!, $environmentId: ObjectID!) {
    restartService(serviceID: $serviceId, environmentID: $environmentId)
}"#;

const RESUME_SERVICE: &str = r#"
mutation ResumeService($serviceId: ObjectID!, $environmentId: ObjectID!) {
    resumeService(serviceID: $serviceId, environmentID: $environmentId)
}"#;

const SUSPEND_SERVICE: &str = r#"
mutation SuspendService($serviceId: ObjectID!, $environmentId: ObjectID!) {
    suspendService(serviceID: $serviceId, environmentID: $environmentId)
}"#;

const REDEPLOY_SERVICE: &str = r#"
mutation RedeployService($serviceId: ObjectID!, $environmentId: ObjectID!) {
    redeployService(serviceID: $serviceId, environmentID: $environmentId)
}"#;

const SERVICE_STATUS: &str = r#"
query GetServiceStatus($serviceId: ObjectID!, $environmentId: ObjectID!) {
    service(_id: $serviceId) {
        status(environmentID: $environmentId)
    }
}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Restart,
    Start,
    Stop,
    Redeploy,
    QueryStatus,
}

impl Operation {
    pub fn document(&self) -> &'static str {
        match self {
            Operation::Restart => RESTART_SERVICE,
            Operation::Start => RESUME_SERVICE,
            Operation::Stop => SUSPEND_SERVICE,
            Operation::Redeploy => REDEPLOY_SERVICE,
            Operation::QueryStatus => SERVICE_STATUS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Restart => "restart",
            Operation::Start => "start",
            Operation::Stop => "stop",
            Operation::Redeploy => "redeploy",
            Operation::QueryStatus => "status",
        }
    }
}

impl From<Action> for Operation {
    fn from(action: Action) -> Self {
        match action {
            Action::Restart => Operation::Restart,
            Action::Start => Operation::Start,
            Action::Stop => Operation::Stop,
            Action::Redeploy => Operation::Redeploy,
        }
    }
}

/// The two opaque ids the platform needs to address one service deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTarget {
    pub service_id: String,
    pub environment_id: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("remote API unreachable: {0}")]
    Transport(String),
    #[error("{0}")]
    Api(String),
}

impl RemoteError {
    pub fn message(&self) -> String {
        match self {
            RemoteError::Transport(m) => m.clone(),
            RemoteError::Api(m) => m.clone(),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError::Transport(err.to_string())
    }
}

/// Narrow seam over the hosting platform's service-management API.
///
/// Implementations issue exactly one outbound call per invocation and never retry.
#[async_trait]
pub trait RemoteControl: Send + Sync {
    async fn execute(
        &self,
        credential: &str,
        operation: Operation,
        target: &RemoteTarget,
    ) -> Result<Value, RemoteError>;
}

/// Reads `service.status` out of a status query payload.
pub fn status_from_payload(payload: &Value) -> ServiceStatus {
    payload
        .pointer("/service/status")
        .and_then(Value::as_str)
        .map(ServiceStatus::from)
        .unwrap_or_default()
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: &'a RemoteTarget,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

impl GraphQlResponse {
    fn into_result(self) -> Result<Value, RemoteError> {
        if let Some(errors) = self.errors {
            let message = errors
                .into_iter()
                .find_map(|e| e.message)
                .unwrap_or_else(|| "API call failed".to_string());
            return Err(RemoteError::Api(message));
        }
        Ok(self.data.unwrap_or(Value::Null))
    }
}

#[derive(Clone)]
pub struct ZeaburClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ZeaburClient {
    pub fn new(endpoint: &str) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("keepwarm/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl RemoteControl for ZeaburClient {
    async fn execute(
        &self,
        credential: &str,
        operation: Operation,
        target: &RemoteTarget,
    ) -> Result<Value, RemoteError> {
        debug!(
            "Calling remote {} for service {}",
            operation.name(),
            target.service_id
        );
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(credential)
            .json(&GraphQlRequest {
                query: operation.document(),
                variables: target,
            })
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        match serde_json::from_str::<GraphQlResponse>(&text) {
            Ok(decoded) if decoded.errors.is_some() || status.is_success() => {
                decoded.into_result()
            }
            Ok(_) => Err(RemoteError::Transport(format!(
                "remote API returned status {}",
                status
            ))),
            Err(err) => Err(RemoteError::Transport(format!(
                "invalid response (status {}): {}",
                status, err
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(raw: &str) -> Result<Value, RemoteError> {
        serde_json::from_str::<GraphQlResponse>(raw)
            .unwrap()
            .into_result()
    }

    #[test]
    fn test_first_error_message_is_reported() {
        let err = decode(r#"{"errors":[{"message":"service not found"},{"message":"other"}]}"#)
            .unwrap_err();
        assert_eq!(err, RemoteError::Api("service not found".to_string()));
    }

    #[test]
    fn test_error_without_message_uses_fallback() {
        let err = decode(r#"{"errors":[{}]}"#).unwrap_err();
        assert_eq!(err.message(), "API call failed");

        let err = decode(r#"{"data":null,"errors":[]}"#).unwrap_err();
        assert_eq!(err.message(), "API call failed");
    }

    #[test]
    fn test_data_is_returned_on_success() {
        let data = decode(r#"{"data":{"restartService":true}}"#).unwrap();
        assert_eq!(data, json!({"restartService": true}));
    }

    #[test]
    fn test_status_from_payload() {
        let payload = json!({"service": {"status": "SUSPENDED"}});
        assert_eq!(status_from_payload(&payload), ServiceStatus::Suspended);
        assert_eq!(status_from_payload(&json!({"service": null})), ServiceStatus::Unknown);
        assert_eq!(status_from_payload(&Value::Null), ServiceStatus::Unknown);
    }

    #[test]
    fn test_request_variables_are_camel_case() {
        let target = RemoteTarget {
            service_id: "s1".into(),
            environment_id: "e1".into(),
        };
        let body = serde_json::to_value(GraphQlRequest {
            query: Operation::Stop.document(),
            variables: &target,
        })
        .unwrap();
        assert_eq!(body["variables"], json!({"serviceId": "s1", "environmentId": "e1"}));
        assert!(body["query"].as_str().unwrap().contains("suspendService"));
    }

    #[test]
    fn test_actions_map_to_mutations() {
        assert!(Operation::from(Action::Start).document().contains("resumeService"));
        assert!(Operation::from(Action::Redeploy).document().contains("redeployService"));
        assert!(Operation::from(Action::Restart).document().contains("restartService"));
    }
}
