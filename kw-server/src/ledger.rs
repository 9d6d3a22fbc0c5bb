use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::kv::{KvError, KvStore};

const STOPPED_PREFIX: &str = "stopped:";
const PENDING_PREFIX: &str = "pending:";

fn stopped_key(name: &str) -> String {
    format!("{}{}", STOPPED_PREFIX, name)
}

fn pending_key(name: &str) -> String {
    format!("{}{}", PENDING_PREFIX, name)
}

pub fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.timestamp_millis().to_string()
}

/// Accepts epoch milliseconds or RFC 3339.
pub fn decode_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(millis) = raw.parse::<i64>() {
        return DateTime::<Utc>::from_timestamp_millis(millis);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Per-service stopped-at timestamps plus the keepalive pending-reactivation markers.
///
/// Without a backing store every read is empty and every write is a no-op.
#[derive(Clone)]
pub struct Ledger {
    kv: Option<Arc<dyn KvStore>>,
}

impl Ledger {
    pub fn new(kv: Option<Arc<dyn KvStore>>) -> Self {
        Self { kv }
    }

    pub fn is_enabled(&self) -> bool {
        self.kv.is_some()
    }

    async fn read(&self, key: String) -> Result<Option<DateTime<Utc>>, KvError> {
        let Some(kv) = &self.kv else {
            return Ok(None);
        };
        match kv.get(&key).await? {
            None => Ok(None),
            Some(value) => match decode_timestamp(&value) {
                Some(at) => Ok(Some(at)),
                None => Err(KvError::Malformed { key, value }),
            },
        }
    }

    async fn write(&self, key: String, at: DateTime<Utc>) -> Result<(), KvError> {
        match &self.kv {
            Some(kv) => kv.put(&key, &encode_timestamp(at)).await,
            None => Ok(()),
        }
    }

    async fn remove(&self, key: String) -> Result<(), KvError> {
        match &self.kv {
            Some(kv) => kv.delete(&key).await,
            None => Ok(()),
        }
    }

    pub async fn stopped_at(&self, name: &str) -> Result<Option<DateTime<Utc>>, KvError> {
        self.read(stopped_key(name)).await
    }

    pub async fn pending_since(&self, name: &str) -> Result<Option<DateTime<Utc>>, KvError> {
        self.read(pending_key(name)).await
    }

    /// Service is now suspended: start the dormancy clock and drop any pending cycle.
    pub async fn record_stop(&self, name: &str, at: DateTime<Utc>) -> Result<(), KvError> {
        self.write(stopped_key(name), at).await?;
        self.remove(pending_key(name)).await
    }

    /// Service is running again on purpose, so nothing is left to keep alive.
    pub async fn record_restart(&self, name: &str) -> Result<(), KvError> {
        self.remove(stopped_key(name)).await?;
        self.remove(pending_key(name)).await
    }

    pub async fn mark_pending(&self, name: &str, at: DateTime<Utc>) -> Result<(), KvError> {
        self.write(pending_key(name), at).await
    }

    pub async fn clear_pending(&self, name: &str) -> Result<(), KvError> {
        self.remove(pending_key(name)).await
    }

    pub async fn forget(&self, name: &str) -> Result<(), KvError> {
        self.record_restart(name).await
    }
}
