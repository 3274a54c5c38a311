//! Environment-driven settings for the CLI.

use std::env;
use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use crate::fetch::auth::ApiKey;
use crate::fetch::{BasicClient, HttpClient};

pub const DEFAULT_LOG_FILE_PATH: &str = "logs/waste_ledger.log";
pub const DEFAULT_STORE_PATH: &str = "data/waste-ledger.json";

/// API key sent to the data API serving the ledger CSV.
#[derive(Clone)]
pub struct ApiKeyConfig {
    /// Header to send; `None` means `Authorization: Bearer <key>`.
    pub header: Option<String>,
    pub key: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub log_file_path: String,
    pub store_path: PathBuf,
    pub api_key: Option<ApiKeyConfig>,
}

impl AppConfig {
    /// Reads `LOG_FILE_PATH`, `WASTE_STORE_PATH`, `WASTE_API_KEY` and
    /// `WASTE_API_KEY_HEADER`, falling back to defaults.
    pub fn load() -> Self {
        let api_key = var("WASTE_API_KEY").map(|key| ApiKeyConfig {
            header: var("WASTE_API_KEY_HEADER"),
            key,
        });

        Self {
            log_file_path: var_or("LOG_FILE_PATH", DEFAULT_LOG_FILE_PATH),
            store_path: PathBuf::from(var_or("WASTE_STORE_PATH", DEFAULT_STORE_PATH)),
            api_key,
        }
    }

    /// HTTP client for fetching the CSV, with the API key attached when one
    /// is configured.
    pub fn http_client(&self) -> Result<Box<dyn HttpClient>> {
        let basic = BasicClient::new()?;

        let client: Box<dyn HttpClient> = match &self.api_key {
            Some(ApiKeyConfig {
                header: Some(header),
                key,
            }) => Box::new(ApiKey::new(basic, header, key)?),
            Some(ApiKeyConfig { header: None, key }) => Box::new(ApiKey::bearer(basic, key)?),
            None => Box::new(basic),
        };
        Ok(client)
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn var_or(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|| {
        debug!("{key} not set, using default: {default}");
        default.to_string()
    })
}

/// Logs the effective settings without revealing the API key.
pub fn log_config(config: &AppConfig) {
    info!(
        store_path = %config.store_path.display(),
        log_file_path = %config.log_file_path,
        api_key = config.api_key.is_some(),
        "Configuration loaded"
    );
}
