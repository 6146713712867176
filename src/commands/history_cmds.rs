use crate::commands::scan_cmds::{review, ScanView};
use crate::commands::AppContext;
use crate::services::image_source::FileImageSource;
use crate::services::workflow::{Collaborators, ScanWorkflow, WorkflowOptions};
use crate::types::errors::ScanResult;
use crate::types::scan::{ScanRecord, ScanType};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// One row of the history list. Images stay out of the listing.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub scan_type: ScanType,
    pub timestamp: DateTime<Utc>,
    pub clothing_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_sustainable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

impl From<&ScanRecord> for HistoryEntry {
    fn from(record: &ScanRecord) -> Self {
        Self {
            id: record.id.clone(),
            scan_type: record.scan_type,
            timestamp: record.timestamp,
            clothing_type: record.report.clothing_type().to_string(),
            is_sustainable: record.report.is_sustainable(),
            score: record.report.score(),
        }
    }
}

pub async fn list_history(ctx: &AppContext) -> ScanResult<Vec<HistoryEntry>> {
    let records = ctx.history.list().await?;
    Ok(records.iter().map(HistoryEntry::from).collect())
}

/// Re-open a stored scan as a reviewed workflow.
pub async fn show_history(
    ctx: &AppContext,
    id: &str,
    with_alternatives: bool,
) -> ScanResult<ScanView> {
    let record = ctx.history.fetch_one(id).await?;
    let workflow = ScanWorkflow::reopen(
        record,
        Collaborators::http(&ctx.config, Arc::new(FileImageSource::dismissed())),
        WorkflowOptions::from(&ctx.config),
    );
    review(&workflow, with_alternatives).await
}

pub async fn delete_history(ctx: &AppContext, id: &str) -> ScanResult<()> {
    ctx.history.delete_one(id).await
}
