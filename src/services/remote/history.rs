//! Remote scan-history collection.
//!
//! The store is the source of truth. When a cache pool is attached, every
//! successful `list()` is mirrored into it so a record that was listed once
//! can be re-opened without another round trip. Cache failures are logged
//! and never fail the remote operation.

use crate::database::history_cache_repo;
use crate::services::config::ClientConfig;
use crate::services::remote::ApiClient;
use crate::services::report::normalizer::normalize_report;
use crate::types::errors::{ScanError, ScanResult};
use crate::types::scan::{ImagePayload, ScanRecord, ScanType};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;

pub const HISTORY_PATH: &str = "/api/scan-history";
pub const SCAN_PATH_PREFIX: &str = "/api/scan/";

/// A record as the store serves it: raw analysis, naive timestamps.
#[derive(Debug, Deserialize)]
struct WireRecord {
    id: String,
    #[serde(alias = "imageBase64", alias = "imageData", alias = "image")]
    image_base64: String,
    #[serde(alias = "report")]
    analysis: Value,
    #[serde(alias = "scanType", default)]
    scan_type: ScanType,
    timestamp: String,
}

#[derive(Debug, Clone)]
pub struct HistoryClient {
    api: ApiClient,
    cache: Option<SqlitePool>,
}

impl HistoryClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            api: ApiClient::new(config),
            cache: None,
        }
    }

    pub fn with_cache(mut self, pool: SqlitePool) -> Self {
        self.cache = Some(pool);
        self
    }

    /// All stored scans, most recent first, whatever order the store used.
    pub async fn list(&self) -> ScanResult<Vec<ScanRecord>> {
        let raw = self.api.get_json(HISTORY_PATH).await?;
        let records = parse_history(raw)?;
        info!("Fetched {} history records", records.len());

        if let Some(pool) = &self.cache {
            if let Err(e) = history_cache_repo::replace_all(pool, &records).await {
                warn!("Failed to refresh history cache: {e}");
            }
        }
        Ok(records)
    }

    /// One record by id. Served from the cache when possible, otherwise
    /// from a fresh listing.
    pub async fn fetch_one(&self, id: &str) -> ScanResult<ScanRecord> {
        if let Some(pool) = &self.cache {
            match history_cache_repo::get(pool, id).await {
                Ok(Some(record)) => return Ok(record),
                Ok(None) => {}
                Err(e) => warn!("History cache lookup for {id} failed: {e}"),
            }
        }

        self.list()
            .await?
            .into_iter()
            .find(|record| record.id == id)
            .ok_or_else(|| ScanError::NotFound(id.to_string()))
    }

    /// Delete immediately. Callers re-fetch `list()` to observe the removal.
    pub async fn delete_one(&self, id: &str) -> ScanResult<()> {
        let path = format!("{SCAN_PATH_PREFIX}{}", urlencoding::encode(id));
        let result = match self.api.delete(&path).await {
            Err(ScanError::BadStatus { code: 404, .. }) => {
                Err(ScanError::NotFound(id.to_string()))
            }
            other => other,
        };

        if matches!(result, Ok(()) | Err(ScanError::NotFound(_))) {
            if let Some(pool) = &self.cache {
                if let Err(e) = history_cache_repo::remove(pool, id).await {
                    warn!("Failed to drop {id} from history cache: {e}");
                }
            }
        }

        match &result {
            Ok(()) => info!("Deleted scan {id}"),
            Err(e) => warn!("Delete of scan {id} failed: {e}"),
        }
        result
    }

    /// Whatever the last successful `list()` left behind. Never touches the network.
    pub async fn cached(&self) -> ScanResult<Vec<ScanRecord>> {
        match &self.cache {
            Some(pool) => Ok(history_cache_repo::list(pool).await?),
            None => Ok(Vec::new()),
        }
    }
}

/// Decode a history listing. Individual records that fail to decode are
/// skipped; a body that is not a list fails as a whole.
pub fn parse_history(raw: Value) -> ScanResult<Vec<ScanRecord>> {
    let items = match raw {
        Value::Array(items) => items,
        other => {
            return Err(ScanError::Malformed(format!(
                "history listing must be an array, got {}",
                if other.is_object() { "an object" } else { "a scalar" }
            )))
        }
    };

    let total = items.len();
    let mut records: Vec<ScanRecord> = items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| match decode_record(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping history record #{idx}: {e}");
                None
            }
        })
        .collect();

    if records.len() < total {
        warn!("{} of {total} history records were unreadable", total - records.len());
    }

    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(records)
}

fn decode_record(item: Value) -> ScanResult<ScanRecord> {
    let wire: WireRecord = serde_json::from_value(item)
        .map_err(|e| ScanError::Malformed(format!("bad record: {e}")))?;

    let analysis = wire.analysis.as_object().ok_or_else(|| {
        ScanError::Malformed(format!("record {} has no analysis object", wire.id))
    })?;
    let report = normalize_report(analysis)?;
    let timestamp = parse_timestamp(&wire.timestamp).ok_or_else(|| {
        ScanError::Malformed(format!(
            "record {} has unreadable timestamp {:?}",
            wire.id, wire.timestamp
        ))
    })?;

    Ok(ScanRecord {
        id: wire.id,
        image: ImagePayload::from(wire.image_base64),
        scan_type: wire.scan_type,
        report,
        timestamp,
    })
}

/// RFC 3339, or the naive ISO form the store writes (read as UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
