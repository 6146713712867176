//! Offline copy of the last fetched scan history.
//!
//! Only holds what is needed to re-open a record that was already listed
//! once. The remote store stays the source of truth: every successful
//! `list()` replaces the whole table.

use crate::types::scan::ScanRecord;
use chrono::SecondsFormat;
use sqlx::SqlitePool;

/// Create the cache table if it doesn't exist (idempotent).
pub async fn ensure_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS scan_cache (
            id TEXT PRIMARY KEY,
            payload TEXT NOT NULL,
            timestamp TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Replace the cached history with `records` in a single transaction.
pub async fn replace_all(pool: &SqlitePool, records: &[ScanRecord]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM scan_cache")
        .execute(&mut *tx)
        .await?;

    for record in records {
        let payload =
            serde_json::to_string(record).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        sqlx::query("INSERT OR REPLACE INTO scan_cache (id, payload, timestamp) VALUES (?, ?, ?)")
            .bind(&record.id)
            .bind(payload)
            .bind(record.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true))
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Fetch one cached record. Rows that no longer decode are treated as absent.
pub async fn get(pool: &SqlitePool, id: &str) -> Result<Option<ScanRecord>, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as("SELECT payload FROM scan_cache WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(|(payload,)| match serde_json::from_str(&payload) {
        Ok(record) => Some(record),
        Err(e) => {
            log::warn!("Dropping unreadable cached scan {id}: {e}");
            None
        }
    }))
}

/// All cached records, most recent first.
pub async fn list(pool: &SqlitePool) -> Result<Vec<ScanRecord>, sqlx::Error> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT payload FROM scan_cache ORDER BY timestamp DESC")
            .fetch_all(pool)
            .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(payload,)| match serde_json::from_str(&payload) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Skipping unreadable cached scan: {e}");
                None
            }
        })
        .collect())
}

/// Remove one record. Returns whether a row was deleted.
pub async fn remove(pool: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM scan_cache WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
#[path = "tests/history_cache_repo_tests.rs"]
mod tests;
