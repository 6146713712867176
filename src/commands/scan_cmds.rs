use crate::commands::AppContext;
use crate::services::image_source::{CaptureSource, FileImageSource};
use crate::services::workflow::{
    Collaborators, ScanStage, ScanWorkflow, WorkflowOptions, WorkflowState,
};
use crate::types::errors::{MissingField, ScanError, ScanResult};
use crate::types::report::{ScoreBand, SustainabilityReport};
use crate::types::scan::{AlternativeItem, ScanType};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub image: PathBuf,
    pub scan_type: ScanType,
    pub clothing_type: Option<String>,
    pub with_alternatives: bool,
}

/// What the results screen renders for a reviewed scan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_id: Option<String>,
    pub scan_type: ScanType,
    pub clothing_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_band: Option<ScoreBand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_color: Option<&'static str>,
    pub material_summary: String,
    pub report: SustainabilityReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<Vec<AlternativeItem>>,
    /// Set when the report came through but the alternatives lookup did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternatives_error: Option<String>,
}

impl ScanView {
    pub fn from_state(state: &WorkflowState) -> ScanResult<Self> {
        let report = state
            .last_report
            .clone()
            .ok_or_else(|| ScanError::MissingInput(MissingField::Report))?;
        let band = report.score_band();
        Ok(Self {
            scan_id: state.last_scan_id.clone(),
            scan_type: state.scan_type,
            clothing_type: report.clothing_type().to_string(),
            verdict: report.verdict_message(),
            score_band: band,
            score_color: band.map(ScoreBand::color),
            material_summary: report.material_summary(),
            report,
            alternatives: state.last_alternatives.clone(),
            alternatives_error: None,
        })
    }
}

/// Capture from disk, analyze, and optionally look up alternatives.
pub async fn scan_image(ctx: &AppContext, request: ScanRequest) -> ScanResult<ScanView> {
    let source = Arc::new(FileImageSource::new(&request.image));
    let workflow = ScanWorkflow::new(
        Collaborators::http(&ctx.config, source),
        WorkflowOptions::from(&ctx.config),
    );

    if workflow.start_capture(CaptureSource::Library).await? != ScanStage::Captured {
        return Err(ScanError::MissingInput(MissingField::Image));
    }
    workflow.select_scan_type(request.scan_type)?;
    workflow.select_clothing_type(request.clothing_type.as_deref())?;
    workflow.submit().await?;

    review(&workflow, request.with_alternatives).await
}

/// Render a reviewed workflow, running the alternatives lookup when asked
/// and allowed.
pub async fn review(workflow: &ScanWorkflow, with_alternatives: bool) -> ScanResult<ScanView> {
    let mut alternatives_error = None;
    if with_alternatives {
        if workflow.snapshot().alternatives_available() {
            if let Err(e) = workflow.find_alternatives().await {
                log::warn!("Alternatives lookup failed: {e}");
                alternatives_error = Some(e.to_string());
            }
        } else {
            log::info!("Item is not marked unsustainable; skipping alternatives");
        }
    }

    let mut view = ScanView::from_state(&workflow.snapshot())?;
    view.alternatives_error = alternatives_error;
    Ok(view)
}
