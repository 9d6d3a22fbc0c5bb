use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kw_server::api::serve::create_router;
use kw_server::config::AppConfig;
use kw_server::kv::{KvStore, MemoryKv};
use kw_server::remote::{Operation, RemoteControl, RemoteError, RemoteTarget};
use kw_server::util::app_state::AppState;
use serde_json::{Value, json};
use tokio::net::TcpListener;

const PASSWORD: &str = "correct horse";

#[derive(Default)]
struct FakeRemote {
    calls: Mutex<Vec<(Operation, RemoteTarget)>>,
}

impl FakeRemote {
    fn calls(&self) -> Vec<(Operation, RemoteTarget)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteControl for FakeRemote {
    async fn execute(
        &self,
        _credential: &str,
        operation: Operation,
        target: &RemoteTarget,
    ) -> Result<Value, RemoteError> {
        self.calls.lock().unwrap().push((operation, target.clone()));
        match operation {
            Operation::QueryStatus => Ok(json!({"service": {"status": "RUNNING"}})),
            _ => Ok(json!({ "ok": true })),
        }
    }
}

struct TestApp {
    base: String,
    http: reqwest::Client,
    remote: Arc<FakeRemote>,
    kv: Option<Arc<MemoryKv>>,
}

impl TestApp {
    async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self
            .http
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .http
            .post(format!("{}{}", self.base, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }
}

const SERVICES: &str = r#"{
    "accounts": { "x": "tok-x", "y": "tok-y" },
    "services": [
        { "name": "A", "account": "x", "serviceId": "svc-a", "environmentId": "env-a" },
        { "name": "B", "account": "y", "serviceId": "svc-b", "environmentId": "env-b" },
        { "name": "C", "account": "z", "serviceId": "svc-c", "environmentId": "env-c" }
    ]
}"#;

async fn spawn_app(with_store: bool) -> TestApp {
    spawn_app_with(with_store, SERVICES).await
}

async fn spawn_app_with(with_store: bool, services: &str) -> TestApp {
    let mut vars = HashMap::new();
    vars.insert("AUTH_PASSWORD", PASSWORD.to_string());
    vars.insert("SERVICES", services.to_string());
    let config = AppConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();

    let kv = with_store.then(|| Arc::new(MemoryKv::new()));
    let dyn_kv = kv.clone().map(|kv| kv as Arc<dyn KvStore>);
    let remote = Arc::new(FakeRemote::default());
    let state = AppState::new(config, dyn_kv, remote.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });

    TestApp {
        base: format!("http://{}", addr),
        http: reqwest::Client::new(),
        remote,
        kv,
    }
}

fn add_body(name: &str, account: &str) -> Value {
    json!({
        "password": PASSWORD,
        "name": name,
        "account": account,
        "token": format!("tok-{}", account),
        "serviceId": format!("svc-{}", name),
        "environmentId": format!("env-{}", name),
    })
}

#[tokio::test]
async fn test_services_lists_accounts_in_first_seen_order() {
    let app = spawn_app(false).await;
    let (status, body) = app.get("/api/services").await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["accounts"], json!(["x", "y", "z"]));
    assert_eq!(
        body["services"],
        json!([
            {"name": "A", "account": "x"},
            {"name": "B", "account": "y"},
            {"name": "C", "account": "z"}
        ])
    );
    // no credentials or remote ids in the public listing
    assert!(!body.to_string().contains("tok-"));
    assert!(!body.to_string().contains("svc-"));
}

#[tokio::test]
async fn test_status_marks_credential_less_service_unknown() {
    let app = spawn_app(false).await;
    let (status, body) = app.get("/api/status").await;

    assert_eq!(status, 200);
    assert_eq!(
        body["statuses"],
        json!({"A": "RUNNING", "B": "RUNNING", "C": "UNKNOWN"})
    );
    assert_eq!(app.remote.calls().len(), 2);
}

#[tokio::test]
async fn test_wrong_password_is_rejected_without_remote_call() {
    let app = spawn_app(true).await;
    let (status, body) = app
        .post("/api/stop", json!({"password": "nope", "serviceName": "A"}))
        .await;

    assert_eq!(status, 401);
    assert_eq!(body, json!({"success": false, "error": "Invalid password"}));
    assert!(app.remote.calls().is_empty());
    assert!(app.kv.as_ref().unwrap().is_empty());
}

#[tokio::test]
async fn test_stop_records_ledger_entry() {
    let app = spawn_app(true).await;
    let (status, _) = app.post("/api/config/add", add_body("api", "x")).await;
    assert_eq!(status, 200);

    let (status, body) = app
        .post("/api/stop", json!({"password": PASSWORD, "serviceName": "api"}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], json!({"ok": true}));

    let calls = app.remote.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, Operation::Stop);
    assert_eq!(calls[0].1.service_id, "svc-api");
    assert_eq!(calls[0].1.environment_id, "env-api");
    assert!(app.kv.as_ref().unwrap().contains("stopped:api"));

    let (status, _) = app
        .post("/api/restart", json!({"password": PASSWORD, "serviceName": "api"}))
        .await;
    assert_eq!(status, 200);
    assert!(!app.kv.as_ref().unwrap().contains("stopped:api"));
}

#[tokio::test]
async fn test_invalid_action_and_unknown_service() {
    let app = spawn_app(false).await;

    let (status, body) = app
        .post("/api/explode", json!({"password": PASSWORD, "serviceName": "A"}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Invalid action");

    let (status, body) = app
        .post("/api/start", json!({"password": PASSWORD, "serviceName": "ghost"}))
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);

    let (status, body) = app
        .post("/api/redeploy", json!({"password": PASSWORD, "serviceName": "C"}))
        .await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "Account token not found");
    assert!(app.remote.calls().is_empty());
}

#[tokio::test]
async fn test_config_add_and_delete() {
    let app = spawn_app(true).await;

    let (status, body) = app.post("/api/config/add", add_body("api", "x")).await;
    assert_eq!((status, body), (200, json!({"success": true})));

    let (status, body) = app.post("/api/config/add", add_body("api", "y")).await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);

    let mut incomplete = add_body("web", "x");
    incomplete["token"] = json!("");
    let (status, _) = app.post("/api/config/add", incomplete).await;
    assert_eq!(status, 400);

    let (_, listing) = app.get("/api/services").await;
    assert_eq!(listing["services"], json!([{"name": "api", "account": "x"}]));

    let (status, _) = app
        .post(
            "/api/config/delete",
            json!({"password": PASSWORD, "serviceName": "api"}),
        )
        .await;
    assert_eq!(status, 200);

    let (status, _) = app
        .post(
            "/api/config/delete",
            json!({"password": PASSWORD, "serviceName": "api"}),
        )
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_config_writes_need_store_and_password() {
    let app = spawn_app(false).await;

    let mut unauthorized = add_body("api", "x");
    unauthorized["password"] = json!("nope");
    let (status, _) = app.post("/api/config/add", unauthorized).await;
    assert_eq!(status, 401);

    let (status, body) = app.post("/api/config/add", add_body("api", "x")).await;
    assert_eq!(status, 500);
    assert_eq!(body["success"], false);
    assert_ne!(body["error"], "Invalid password");
}

#[tokio::test]
async fn test_malformed_body_is_a_json_error() {
    let app = spawn_app(false).await;
    let resp = app
        .http
        .post(format!("{}/api/stop", app.base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_preflight_and_unknown_route() {
    let app = spawn_app(false).await;

    let resp = app
        .http
        .request(reqwest::Method::OPTIONS, format!("{}/api/stop", app.base))
        .header("origin", "https://example.com")
        .header("access-control-request-method", "POST")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    let resp = app
        .http
        .request(reqwest::Method::OPTIONS, format!("{}/anything", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let (status, body) = app.get("/api/nothing/here").await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_wrong_method_uses_error_envelope() {
    let app = spawn_app(false).await;

    let (status, body) = app.post("/api/services", json!({})).await;
    assert_eq!(status, 405);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Method not allowed");

    let (status, body) = app.get("/api/restart").await;
    assert_eq!(status, 405);
    assert_eq!(body["success"], false);
    assert!(app.remote.calls().is_empty());
}

#[tokio::test]
async fn test_entry_without_remote_ids_is_listed_but_not_actionable() {
    let services = r#"{
        "accounts": { "x": "tok-x" },
        "services": [
            { "name": "A", "account": "x", "serviceId": "svc-a", "environmentId": "env-a" },
            { "name": "bare", "account": "x" }
        ]
    }"#;
    let app = spawn_app_with(false, services).await;

    let (status, body) = app.get("/api/services").await;
    assert_eq!(status, 200);
    assert_eq!(
        body["services"],
        json!([{"name": "A", "account": "x"}, {"name": "bare", "account": "x"}])
    );

    let (status, body) = app
        .post("/api/stop", json!({"password": PASSWORD, "serviceName": "bare"}))
        .await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "Service configuration error");

    let (_, body) = app.get("/api/status").await;
    assert_eq!(body["statuses"], json!({"A": "RUNNING", "bare": "UNKNOWN"}));
    assert_eq!(app.remote.calls().len(), 1);
}
