use crate::types::errors::ScanError;
use crate::types::report::SustainabilityReport;
use crate::types::scan::{AlternativeItem, ImageData, ScanType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a scan session currently is.
///
/// ```text
/// Idle → Capturing → Captured → Analyzing → Reviewed
///   ↑        │           │  ↑        │          │
///   └────────┘ (cancel,  │  └────────┘ (failure) │
///   ↑          error)    │                       │
///   └────────────────────┘ (retake)              │
///   └────────────────────────────────────────────┘ (scan another)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStage {
    #[default]
    Idle,
    Capturing,
    Captured,
    Analyzing,
    Reviewed,
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanStage::Idle => write!(f, "idle"),
            ScanStage::Capturing => write!(f, "capturing"),
            ScanStage::Captured => write!(f, "captured"),
            ScanStage::Analyzing => write!(f, "analyzing"),
            ScanStage::Reviewed => write!(f, "reviewed"),
        }
    }
}

/// Read-only view of a workflow handed to the rendering layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowState {
    pub stage: ScanStage,
    pub captured_image: Option<ImageData>,
    pub scan_type: ScanType,
    /// Required for label scans when the deployment asks for it.
    pub selected_clothing_type: Option<String>,
    pub last_report: Option<SustainabilityReport>,
    /// Id the server assigned, when it persisted the scan itself.
    pub last_scan_id: Option<String>,
    pub last_alternatives: Option<Vec<AlternativeItem>>,
    pub last_error: Option<ScanError>,
}

impl WorkflowState {
    /// Human-readable text for the current error, if any.
    pub fn error_message(&self) -> Option<&'static str> {
        self.last_error.as_ref().map(ScanError::user_message)
    }

    /// Alternatives may be requested for a reviewed, explicitly unsustainable item.
    pub fn alternatives_available(&self) -> bool {
        self.stage == ScanStage::Reviewed
            && self
                .last_report
                .as_ref()
                .and_then(SustainabilityReport::is_sustainable)
                == Some(false)
    }
}
