use async_trait::async_trait;
use mongodb::bson::{DateTime, doc};
use mongodb::{Client, Collection, options::ClientOptions};
use serde::{Deserialize, Serialize};

use super::{KvError, KvStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KvDoc {
    #[serde(rename = "_id")]
    pub key: String,
    pub value: String,
    pub updated_at: DateTime,
}

#[derive(Clone)]
pub struct MongoKv {
    pub client: Client,
    pub db_name: String,
}

impl MongoKv {
    pub async fn connect(url: &str, db_name: &str) -> Result<Self, KvError> {
        let mut opts = ClientOptions::parse(url).await?;
        opts.app_name = Some("keepwarm".into());
        let client = Client::with_options(opts)?;
        let kv = Self {
            client,
            db_name: db_name.into(),
        };
        kv.ping().await?;
        Ok(kv)
    }

    fn entries(&self) -> Collection<KvDoc> {
        self.client.database(&self.db_name).collection("kv")
    }

    async fn ping(&self) -> Result<(), KvError> {
        self.client
            .database(&self.db_name)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl KvStore for MongoKv {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let found = self.entries().find_one(doc! { "_id": key }).await?;
        Ok(found.map(|d| d.value))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), KvError> {
        let replacement = KvDoc {
            key: key.to_string(),
            value: value.to_string(),
            updated_at: DateTime::now(),
        };
        self.entries()
            .replace_one(doc! { "_id": key }, replacement)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        self.entries().delete_one(doc! { "_id": key }).await?;
        Ok(())
    }
}
