use std::time::Duration;

use chrono::TimeDelta;

use crate::auth::SharedSecret;
use crate::keepalive::{DEFAULT_SETTLE, DEFAULT_THRESHOLD_DAYS, KeepalivePolicy};
use crate::models::service::{ConfigDocument, Configuration};
use crate::remote::DEFAULT_ZEABUR_API;
use crate::response::{ServerError, ServerResult};

#[derive(Debug, Clone)]
pub struct KeepaliveConfig {
    /// At least one day; `from_lookup` rejects anything `TimeDelta` cannot hold.
    pub threshold_days: i64,
    pub settle_secs: u64,
    /// Sweep period. Zero disables the scheduled task.
    pub interval_secs: u64,
}

impl KeepaliveConfig {
    pub fn policy(&self) -> KeepalivePolicy {
        KeepalivePolicy {
            threshold: TimeDelta::try_days(self.threshold_days)
                .unwrap_or(TimeDelta::days(DEFAULT_THRESHOLD_DAYS)),
            settle: Duration::from_secs(self.settle_secs),
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        match self.interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub auth_password: SharedSecret,
    /// Read-only service set from `SERVICES`, used when no store is bound.
    pub fallback_services: Configuration,
    pub mongo_uri: Option<String>,
    pub mongo_db: String,
    pub bind_address: String,
    pub port: u16,
    pub zeabur_api_url: String,
    pub keepalive: KeepaliveConfig,
    pub log_level: String,
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: Option<String>, default: T) -> ServerResult<T> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            ServerError::internal_error(&format!("{} must be a number, got {:?}", name, raw))
        }),
    }
}

fn parse_threshold_days(raw: Option<String>) -> ServerResult<i64> {
    let days = parse_number("KEEPALIVE_DAYS", raw, DEFAULT_THRESHOLD_DAYS)?;
    if days < 1 || TimeDelta::try_days(days).is_none() {
        return Err(ServerError::internal_error(&format!(
            "KEEPALIVE_DAYS must be a positive number of days, got {}",
            days
        )));
    }
    Ok(days)
}

impl AppConfig {
    pub fn from_env() -> ServerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ServerResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let fallback_services = match get("SERVICES") {
            Some(raw) => ConfigDocument::parse(&raw)
                .map_err(|e| ServerError::internal_error(&format!("SERVICES is not valid: {}", e)))?
                .normalize(),
            None => Configuration::default(),
        };

        let keepalive = KeepaliveConfig {
            threshold_days: parse_threshold_days(get("KEEPALIVE_DAYS"))?,
            settle_secs: parse_number(
                "KEEPALIVE_SETTLE_SECS",
                get("KEEPALIVE_SETTLE_SECS"),
                DEFAULT_SETTLE.as_secs(),
            )?,
            interval_secs: parse_number(
                "KEEPALIVE_INTERVAL_SECS",
                get("KEEPALIVE_INTERVAL_SECS"),
                86_400,
            )?,
        };

        Ok(Self {
            auth_password: SharedSecret::new(lookup("AUTH_PASSWORD")),
            fallback_services,
            mongo_uri: get("MONGO_URI"),
            mongo_db: get("MONGO_DB").unwrap_or_else(|| "keepwarm".into()),
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_number("PORT", get("PORT"), 8787)?,
            zeabur_api_url: get("ZEABUR_API_URL").unwrap_or_else(|| DEFAULT_ZEABUR_API.into()),
            keepalive,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".into()),
        })
    }
}
