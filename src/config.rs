// src/config.rs

use std::net::SocketAddr;
use std::time::Duration;

use crate::errors::CrmError;

pub const DEFAULT_API_BASE: &str = "https://api.airtable.com/v0";
pub const DEFAULT_WEBHOOK_URL: &str = "http://127.0.0.1:5678/webhook/appointment-scheduled";

/// Credentials and coordinates for the remote record store.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteStoreConfig {
    pub api_base: String,
    pub token: String,
    pub base_id: String,
    pub table_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// `Some` selects the remote backend for the whole session.
    pub remote: Option<RemoteStoreConfig>,
    pub webhook_url: String,
    /// SQLite file backing the local cache.
    pub cache_path: String,
    pub refresh_interval: Duration,
    pub bind_addr: SocketAddr,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote: None,
            webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            cache_path: "crm_cache.sqlite3".to_string(),
            refresh_interval: Duration::from_secs(25),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

impl AppConfig {
    /// Read the process environment (after an optional `.env`).
    pub fn from_env() -> Result<Self, CrmError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CrmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let remote = match (
            get("CRM_STORE_TOKEN"),
            get("CRM_STORE_BASE_ID"),
            get("CRM_STORE_TABLE_ID"),
        ) {
            (Some(token), Some(base_id), Some(table_id)) => Some(RemoteStoreConfig {
                api_base: get("CRM_STORE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                token,
                base_id,
                table_id,
            }),
            _ => None,
        };

        let refresh_interval = match get("CRM_REFRESH_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .map_err(|e| CrmError::Config(format!("CRM_REFRESH_SECS `{raw}`: {e}")))?;
                if secs == 0 {
                    return Err(CrmError::Config("CRM_REFRESH_SECS must be positive".into()));
                }
                Duration::from_secs(secs)
            }
            None => defaults.refresh_interval,
        };

        let bind_addr = match get("CRM_BIND_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|e| CrmError::Config(format!("CRM_BIND_ADDR `{raw}`: {e}")))?,
            None => defaults.bind_addr,
        };

        Ok(Self {
            remote,
            webhook_url: get("CRM_WEBHOOK_URL").unwrap_or(defaults.webhook_url),
            cache_path: get("CRM_CACHE_PATH").unwrap_or(defaults.cache_path),
            refresh_interval,
            bind_addr,
        })
    }
}
