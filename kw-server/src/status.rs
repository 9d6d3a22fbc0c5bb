use std::collections::BTreeMap;

use futures::future::join_all;
use kw_shared::status::ServiceStatus;
use tracing::debug;

use crate::models::service::{Configuration, ServiceEntry};
use crate::remote::{Operation, RemoteControl, status_from_payload};

async fn query_one(remote: &dyn RemoteControl, entry: &ServiceEntry) -> ServiceStatus {
    let Some(credential) = entry.credential.as_deref() else {
        return ServiceStatus::Unknown;
    };
    if !entry.has_target() {
        return ServiceStatus::Unknown;
    }
    match remote
        .execute(credential, Operation::QueryStatus, &entry.target())
        .await
    {
        Ok(payload) => status_from_payload(&payload),
        Err(e) => {
            debug!("Status query for {} failed: {}", entry.name, e);
            ServiceStatus::Unknown
        }
    }
}

/// Queries every configured service concurrently. Individual failures read as `UNKNOWN`.
pub async fn collect_statuses(
    config: &Configuration,
    remote: &dyn RemoteControl,
) -> BTreeMap<String, ServiceStatus> {
    let queries = config.services.iter().map(|entry| async move {
        (entry.name.clone(), query_one(remote, entry).await)
    });
    join_all(queries).await.into_iter().collect()
}
