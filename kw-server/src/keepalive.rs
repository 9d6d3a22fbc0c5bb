use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::kv::KvError;
use crate::models::service::ServiceEntry;
use crate::remote::{Operation, RemoteControl, RemoteError};
use crate::store::ConfigStore;

pub const DEFAULT_THRESHOLD_DAYS: i64 = 20;
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
enum CycleError {
    #[error("remote {0} failed: {1}")]
    Remote(&'static str, RemoteError),
    #[error(transparent)]
    Ledger(#[from] KvError),
}

#[derive(Debug, Clone)]
pub struct KeepalivePolicy {
    pub threshold: TimeDelta,
    pub settle: Duration,
}

impl Default for KeepalivePolicy {
    fn default() -> Self {
        Self {
            threshold: TimeDelta::days(DEFAULT_THRESHOLD_DAYS),
            settle: DEFAULT_SETTLE,
        }
    }
}

impl KeepalivePolicy {
    pub fn is_stale(&self, stopped_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(stopped_at) >= self.threshold
    }
}

/// Outcome of one sweep, by service name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Full restart and re-stop cycle completed.
    pub reactivated: Vec<String>,
    /// An interrupted cycle from an earlier sweep was finished with a stop.
    pub recovered: Vec<String>,
    /// Due for action but not actionable (no credential).
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
    /// True when there was no ledger to sweep.
    pub disabled: bool,
}

/// Wakes services that have been suspended longer than the policy threshold.
///
/// A cycle is restart, settle, stop. The pending marker written before the
/// restart survives until the final stop succeeds, so a cycle cut short by a
/// crash or a failed stop is finished on the next sweep.
pub struct KeepaliveEngine {
    store: Arc<ConfigStore>,
    remote: Arc<dyn RemoteControl>,
    policy: KeepalivePolicy,
}

impl KeepaliveEngine {
    pub fn new(
        store: Arc<ConfigStore>,
        remote: Arc<dyn RemoteControl>,
        policy: KeepalivePolicy,
    ) -> Self {
        Self {
            store,
            remote,
            policy,
        }
    }

    pub fn spawn(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                info!("Keepalive sweep triggered");
                let report = self.sweep().await;
                if !report.disabled {
                    info!(
                        "Keepalive sweep done: {} reactivated, {} recovered, {} skipped, {} failed",
                        report.reactivated.len(),
                        report.recovered.len(),
                        report.skipped.len(),
                        report.failed.len()
                    );
                }
            }
        })
    }

    pub async fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();
        let ledger = self.store.ledger();
        if !ledger.is_enabled() {
            info!("No ledger store bound, skipping keepalive sweep");
            report.disabled = true;
            return report;
        }

        let config = match self.store.resolve().await {
            Ok(config) => config,
            Err(e) => {
                error!("Keepalive sweep could not load configuration: {}", e);
                return report;
            }
        };

        for entry in &config.services {
            let now = Utc::now();

            let pending = match ledger.pending_since(&entry.name).await {
                Ok(pending) => pending,
                Err(e) => {
                    error!("Keepalive: cannot read pending marker for {}: {}", entry.name, e);
                    report.failed.push(entry.name.clone());
                    continue;
                }
            };
            if let Some(since) = pending {
                warn!(
                    "Keepalive: {} has an unfinished cycle since {}, stopping it again",
                    entry.name, since
                );
                let Some(credential) = self.credential(entry, &mut report) else {
                    continue;
                };
                match self.finish_cycle(entry, credential).await {
                    Ok(()) => report.recovered.push(entry.name.clone()),
                    Err(e) => {
                        error!("Keepalive recovery failed for {}: {}", entry.name, e);
                        report.failed.push(entry.name.clone());
                    }
                }
                continue;
            }

            let stopped_at = match ledger.stopped_at(&entry.name).await {
                Ok(Some(at)) => at,
                Ok(None) => continue,
                Err(e) => {
                    error!("Keepalive: cannot read stop time for {}: {}", entry.name, e);
                    report.failed.push(entry.name.clone());
                    continue;
                }
            };
            if !self.policy.is_stale(stopped_at, now) {
                continue;
            }

            info!(
                "Keepalive: {} has been stopped for {} days",
                entry.name,
                now.signed_duration_since(stopped_at).num_days()
            );
            let Some(credential) = self.credential(entry, &mut report) else {
                continue;
            };
            match self.reactivate(entry, credential, now).await {
                Ok(()) => report.reactivated.push(entry.name.clone()),
                Err(e) => {
                    error!("Keepalive failed for {}: {}", entry.name, e);
                    report.failed.push(entry.name.clone());
                }
            }
        }

        report
    }

    /// The entry's credential, if it can be acted on at all. Otherwise records a skip.
    fn credential<'a>(&self, entry: &'a ServiceEntry, report: &mut SweepReport) -> Option<&'a str> {
        let Some(credential) = entry.credential.as_deref() else {
            error!("Keepalive: no token found for account {}", entry.account);
            report.skipped.push(entry.name.clone());
            return None;
        };
        if !entry.has_target() {
            error!("Keepalive: {} has no service or environment id", entry.name);
            report.skipped.push(entry.name.clone());
            return None;
        }
        Some(credential)
    }

    async fn reactivate(
        &self,
        entry: &ServiceEntry,
        credential: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CycleError> {
        let ledger = self.store.ledger();
        ledger.mark_pending(&entry.name, now).await?;

        if let Err(e) = self
            .remote
            .execute(credential, Operation::Restart, &entry.target())
            .await
        {
            if let Err(clear) = ledger.clear_pending(&entry.name).await {
                warn!("Keepalive: could not clear pending marker for {}: {}", entry.name, clear);
            }
            return Err(CycleError::Remote(Operation::Restart.name(), e));
        }
        info!("Keepalive: restarted {}", entry.name);

        tokio::time::sleep(self.policy.settle).await;
        self.finish_cycle(entry, credential).await
    }

    async fn finish_cycle(&self, entry: &ServiceEntry, credential: &str) -> Result<(), CycleError> {
        self.remote
            .execute(credential, Operation::Stop, &entry.target())
            .await
            .map_err(|e| CycleError::Remote(Operation::Stop.name(), e))?;
        info!("Keepalive: stopped {} again", entry.name);

        self.store.ledger().record_stop(&entry.name, Utc::now()).await?;
        Ok(())
    }
}
