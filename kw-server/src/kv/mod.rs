mod memory;
mod mongo;

pub use memory::MemoryKv;
pub use mongo::MongoKv;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("key-value backend error: {0}")]
    Backend(String),
    #[error("malformed value under {key}: {value}")]
    Malformed { key: String, value: String },
}

impl From<mongodb::error::Error> for KvError {
    fn from(err: mongodb::error::Error) -> Self {
        KvError::Backend(err.to_string())
    }
}

/// Minimal string key-value persistence used for the service document and the ledger.
///
/// Writes are plain overwrites; there is no compare-and-swap, so concurrent
/// writers to the same key resolve as last-writer-wins.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;
    async fn put(&self, key: &str, value: &str) -> Result<(), KvError>;
    async fn delete(&self, key: &str) -> Result<(), KvError>;
}
