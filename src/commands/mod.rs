//! Entry points for a rendering layer.
//!
//! Each command drives the services and returns a serializable result or a
//! [`ScanError`](crate::types::errors::ScanError), which itself serializes to
//! its display string.

pub mod history_cmds;
pub mod scan_cmds;

use crate::database::open_cache_pool;
use crate::services::config::ClientConfig;
use crate::services::remote::history::HistoryClient;
use crate::services::remote::ApiClient;
use crate::types::errors::ScanResult;
use serde::Serialize;

/// Long-lived handles shared by every command.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: ClientConfig,
    pub history: HistoryClient,
}

impl AppContext {
    /// Build clients from `config`. An unusable cache path only disables
    /// the offline cache.
    pub async fn init(config: ClientConfig) -> Self {
        let mut history = HistoryClient::new(&config);
        if let Some(path) = &config.cache_path {
            match open_cache_pool(path).await {
                Ok(pool) => {
                    log::info!("History cache at {}", path.display());
                    history = history.with_cache(pool);
                }
                Err(e) => log::warn!("History cache disabled ({}): {e}", path.display()),
            }
        }
        Self { config, history }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingStatus {
    pub configured: bool,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Check whether the backend answers at all.
pub async fn ping(ctx: &AppContext) -> ScanResult<PingStatus> {
    let api = ApiClient::new(&ctx.config);
    let result = api.health().await;
    Ok(PingStatus {
        configured: api.is_configured(),
        reachable: result.is_ok(),
        error: result.err().map(|e| e.to_string()),
    })
}
