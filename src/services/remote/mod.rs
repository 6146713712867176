//! HTTP plumbing shared by the analysis, alternatives and history clients.
//!
//! Failure classification is the same for every endpoint:
//! - transport failure (refused, reset, timeout, no base URL) → `Network`
//! - non-2xx status → `BadStatus` with the response body
//! - 2xx with a body that is not JSON → `Malformed`
//!
//! Nothing here retries.

pub mod alternatives;
pub mod analysis;
pub mod history;

use crate::services::config::ClientConfig;
use crate::types::errors::{ScanError, ScanResult};
use log::{debug, info, warn};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;

/// Longest body excerpt kept in logs.
const LOG_BODY_LIMIT: usize = 200;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Self {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {e}");
                Client::new()
            });
        Self {
            http,
            base_url: config
                .base_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Absolute URL for an `/api/...` path.
    pub fn url(&self, path: &str) -> ScanResult<String> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| ScanError::Network("backend URL is not configured".to_string()))?;
        Ok(format!("{base}{path}"))
    }

    pub async fn get_json(&self, path: &str) -> ScanResult<Value> {
        let url = self.url(path)?;
        debug!("GET {url}");
        let response = self.http.get(&url).send().await?;
        read_json("GET", path, response).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ScanResult<Value> {
        let url = self.url(path)?;
        debug!("POST {url}");
        let response = self.http.post(&url).json(body).send().await?;
        read_json("POST", path, response).await
    }

    /// DELETE with no interesting response body.
    pub async fn delete(&self, path: &str) -> ScanResult<()> {
        let url = self.url(path)?;
        debug!("DELETE {url}");
        let response = self.http.delete(&url).send().await?;
        check_status("DELETE", path, response).await.map(|_| ())
    }

    /// Ping the API root. `Ok(())` means the backend answered with 2xx.
    pub async fn health(&self) -> ScanResult<()> {
        let url = self.url("/api/")?;
        let response = self.http.get(&url).send().await?;
        check_status("GET", "/api/", response).await.map(|_| ())
    }
}

async fn check_status(method: &str, path: &str, response: Response) -> ScanResult<Response> {
    let status = response.status();
    if status.is_success() {
        info!("{method} {path}: HTTP {}", status.as_u16());
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(
        "{method} {path} rejected: HTTP {} {}",
        status.as_u16(),
        excerpt(&body)
    );
    Err(ScanError::BadStatus {
        code: status.as_u16(),
        body,
    })
}

async fn read_json(method: &str, path: &str, response: Response) -> ScanResult<Value> {
    let response = check_status(method, path, response).await?;
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        warn!("{method} {path}: unparseable body: {}", excerpt(&body));
        ScanError::Malformed(format!("response is not valid JSON: {e}"))
    })
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(LOG_BODY_LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
