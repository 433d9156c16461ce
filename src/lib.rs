pub mod api;
pub mod db;
pub mod deploy;
pub mod error;
pub mod filter;
pub mod logging;
pub mod pipeline;
pub mod signature;

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::db::SqlPipelineStore;
use crate::deploy::DeployLocks;

#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// When set, logs are also written to daily-rotated files here.
    pub log_directory: Option<String>,
    /// Base URL advertised in webhook URLs handed to operators.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    #[serde(default = "default_deploy_timeout_secs")]
    pub deploy_timeout_secs: u64,
}

fn default_bind_address() -> String {
    "127.0.0.1:8888".to_string()
}

fn default_database_path() -> String {
    "data/relay.db".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8888".to_string()
}

fn default_deploy_timeout_secs() -> u64 {
    300
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            database_path: default_database_path(),
            log_directory: None,
            public_base_url: default_public_base_url(),
            deploy_timeout_secs: default_deploy_timeout_secs(),
        }
    }
}

impl RelayConfig {
    pub fn deploy_timeout(&self) -> Duration {
        Duration::from_secs(self.deploy_timeout_secs)
    }

    /// The URL an operator pastes into GitHub's webhook settings.
    pub fn webhook_url(&self, pipeline_name: &str) -> String {
        format!(
            "{}/webhook?pipeline={}",
            self.public_base_url.trim_end_matches('/'),
            pipeline_name
        )
    }
}

pub struct AppState {
    pub config: RelayConfig,
    pub store: SqlPipelineStore,
    pub deploy_locks: DeployLocks,
}

pub type SharedState = Arc<AppState>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: RelayConfig = toml::from_str("").unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:8888");
        assert_eq!(config.deploy_timeout_secs, 300);
        assert!(config.log_directory.is_none());
    }

    #[test]
    fn webhook_url_handles_trailing_slash() {
        let config = RelayConfig {
            public_base_url: "https://deploy.example.com/".to_string(),
            ..RelayConfig::default()
        };
        assert_eq!(
            config.webhook_url("my-app"),
            "https://deploy.example.com/webhook?pipeline=my-app"
        );
    }
}
