use deploy_relay::api::router;
use deploy_relay::db::{SqlPipelineStore, init_db};
use deploy_relay::deploy::DeployLocks;
use deploy_relay::error::RelayError;
use deploy_relay::logging::setup_logging;
use deploy_relay::{AppState, RelayConfig};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "relay_config.toml";

/// Load and parse the configuration file
fn load_config(path: &str) -> Result<RelayConfig, RelayError> {
    let config_str = fs::read_to_string(path).map_err(|e| {
        RelayError::Config(format!("Failed to read config file '{}': {}", path, e))
    })?;

    let config: RelayConfig = toml::from_str(&config_str).map_err(|e| {
        RelayError::Config(format!("Failed to parse config file '{}': {}", path, e))
    })?;

    Ok(config)
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let config_path =
        std::env::var("RELAY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let mut config: RelayConfig = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Ok(bind_address) = std::env::var("BIND_ADDRESS") {
        config.bind_address = bind_address;
    }

    // The guard keeps the file writer alive until shutdown.
    let _log_guard = setup_logging(config.log_directory.as_deref().map(Path::new));

    let pool = match init_db(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Database error: {}", e);
            std::process::exit(1);
        }
    };

    let bind_address = config.bind_address.clone();
    let state = Arc::new(AppState {
        config,
        store: SqlPipelineStore::new(pool),
        deploy_locks: DeployLocks::new(),
    });

    let app = router(state);

    info!("Listening on {}", bind_address);
    info!("Using config at {:?}", config_path);
    let listener = tokio::net::TcpListener::bind(bind_address).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
