//! Scan-to-report workflow.
//!
//! One `ScanWorkflow` per screen session. The rendering layer reads
//! [`WorkflowState`] through [`ScanWorkflow::snapshot`] and asks for
//! transitions; it never mutates state directly.
//!
//! The state mutex is only held between awaits. Every method that talks to
//! a collaborator snapshots what it needs, releases the lock, awaits, and
//! then re-checks that the instance is still the one that issued the call
//! (generation counter) before applying the outcome.

pub mod in_flight;
pub mod state;

pub use in_flight::{InFlight, InFlightGuard};
pub use state::{ScanStage, WorkflowState};

use crate::services::config::ClientConfig;
use crate::services::image_source::{Acquired, CaptureSource, ImageSource};
use crate::services::remote::alternatives::{AlternativesProvider, HttpAlternativesClient};
use crate::services::remote::analysis::{Analyzer, HttpAnalysisClient};
use crate::types::errors::{MissingField, ScanError, ScanResult};
use crate::types::report::SustainabilityReport;
use crate::types::scan::{AlternativeItem, ScanRecord, ScanType};
use log::{info, warn};
use std::sync::{Arc, Mutex, MutexGuard};

/// Remote and device collaborators a workflow talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub image_source: Arc<dyn ImageSource>,
    pub analyzer: Arc<dyn Analyzer>,
    pub alternatives: Arc<dyn AlternativesProvider>,
}

impl Collaborators {
    /// HTTP-backed analyzer and alternatives lookup for `config`.
    pub fn http(config: &ClientConfig, image_source: Arc<dyn ImageSource>) -> Self {
        Self {
            image_source,
            analyzer: Arc::new(HttpAnalysisClient::new(config)),
            alternatives: Arc::new(HttpAlternativesClient::new(config)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowOptions {
    pub require_clothing_type_for_labels: bool,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            require_clothing_type_for_labels: true,
        }
    }
}

impl From<&ClientConfig> for WorkflowOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            require_clothing_type_for_labels: config.require_clothing_type_for_labels,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: WorkflowState,
    /// Bumped whenever in-flight results must no longer be applied.
    generation: u64,
    disposed: bool,
}

pub struct ScanWorkflow {
    session_id: String,
    options: WorkflowOptions,
    collaborators: Collaborators,
    inner: Mutex<Inner>,
    in_flight: InFlight,
}

impl ScanWorkflow {
    pub fn new(collaborators: Collaborators, options: WorkflowOptions) -> Self {
        let workflow = Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            options,
            collaborators,
            inner: Mutex::new(Inner::default()),
            in_flight: InFlight::new(),
        };
        info!("[{}] Scan session started", workflow.session_id);
        workflow
    }

    /// Enter `Reviewed` directly from a stored record.
    pub fn reopen(
        record: ScanRecord,
        collaborators: Collaborators,
        options: WorkflowOptions,
    ) -> Self {
        let workflow = Self::new(collaborators, options);
        {
            let mut inner = workflow.lock();
            let state = &mut inner.state;
            state.captured_image = record.image.as_image().cloned();
            state.scan_type = record.scan_type;
            state.selected_clothing_type = record
                .report
                .has_known_clothing_type()
                .then(|| record.report.clothing_type().to_string());
            state.last_report = Some(record.report);
            state.last_scan_id = Some(record.id.clone());
            workflow.transition(&mut inner, ScanStage::Reviewed);
        }
        info!("[{}] Re-opened stored scan {}", workflow.session_id, record.id);
        workflow
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn snapshot(&self) -> WorkflowState {
        self.lock().state.clone()
    }

    pub fn stage(&self) -> ScanStage {
        self.lock().state.stage
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    /// `Idle → Capturing`, then `Captured` on an image, back to `Idle` on
    /// cancel or failure. Returns the stage the capture ended in.
    pub async fn start_capture(&self, source: CaptureSource) -> ScanResult<ScanStage> {
        let generation = {
            let mut inner = self.lock();
            self.require(&inner, ScanStage::Idle, "start a capture")?;
            self.transition(&mut inner, ScanStage::Capturing);
            inner.generation
        };

        let rollback =
            StageRollback::new(self, generation, ScanStage::Capturing, ScanStage::Idle);
        let outcome = self.collaborators.image_source.acquire(source).await;
        rollback.disarm();

        let mut inner = self.lock();
        if self.is_stale(&inner, generation) {
            warn!(
                "[{}] Discarding capture result for a discarded session",
                self.session_id
            );
            return Err(ScanError::Disposed);
        }

        match outcome {
            Ok(Acquired::Image(image)) => {
                info!(
                    "[{}] Captured {} ({} bytes) from {:?}",
                    self.session_id,
                    image.mime(),
                    image.len(),
                    source
                );
                inner.state.captured_image = Some(image);
                inner.state.last_error = None;
                self.transition(&mut inner, ScanStage::Captured);
                Ok(ScanStage::Captured)
            }
            Ok(Acquired::Cancelled) => {
                info!("[{}] Capture cancelled", self.session_id);
                inner.state.last_error = None;
                self.transition(&mut inner, ScanStage::Idle);
                Ok(ScanStage::Idle)
            }
            Err(e) => {
                warn!("[{}] Capture failed: {e}", self.session_id);
                inner.state.captured_image = None;
                inner.state.last_error = Some(e.clone());
                self.transition(&mut inner, ScanStage::Idle);
                Err(e)
            }
        }
    }

    /// `Captured → Idle`, discarding the held image.
    pub fn retake(&self) -> ScanResult<()> {
        let mut inner = self.lock();
        self.require(&inner, ScanStage::Captured, "retake")?;
        inner.state.captured_image = None;
        inner.state.last_error = None;
        self.transition(&mut inner, ScanStage::Idle);
        Ok(())
    }

    pub fn select_scan_type(&self, scan_type: ScanType) -> ScanResult<()> {
        let mut inner = self.lock();
        self.require(&inner, ScanStage::Captured, "change the scan type")?;
        inner.state.scan_type = scan_type;
        Ok(())
    }

    /// Blank input clears the selection.
    pub fn select_clothing_type(&self, clothing_type: Option<&str>) -> ScanResult<()> {
        let mut inner = self.lock();
        self.require(&inner, ScanStage::Captured, "choose a clothing type")?;
        inner.state.selected_clothing_type = clothing_type
            .map(str::trim)
            .filter(|kind| !kind.is_empty())
            .map(str::to_string);
        Ok(())
    }

    /// `Captured → Analyzing → Reviewed`. On failure the workflow returns to
    /// `Captured` holding the very same image so it can be resubmitted.
    pub async fn submit(&self) -> ScanResult<SustainabilityReport> {
        let (guard, generation, image, scan_type, clothing_type) = {
            let mut inner = self.lock();
            if inner.disposed {
                return Err(ScanError::Disposed);
            }
            if inner.state.stage == ScanStage::Analyzing {
                return Err(ScanError::Busy);
            }
            self.require(&inner, ScanStage::Captured, "submit")?;

            let image = inner
                .state
                .captured_image
                .clone()
                .ok_or_else(|| ScanError::MissingInput(MissingField::Image))?;
            let scan_type = inner.state.scan_type;
            // Only label scans tell the service what the garment is
            let clothing_type = match scan_type {
                ScanType::Label => inner.state.selected_clothing_type.clone(),
                ScanType::Garment => None,
            };

            if scan_type == ScanType::Label
                && self.options.require_clothing_type_for_labels
                && clothing_type.is_none()
            {
                let err = ScanError::MissingInput(MissingField::ClothingType);
                inner.state.last_error = Some(err.clone());
                return Err(err);
            }

            let guard = self.in_flight.try_start()?;
            inner.state.last_error = None;
            self.transition(&mut inner, ScanStage::Analyzing);
            (guard, inner.generation, image, scan_type, clothing_type)
        };

        let rollback =
            StageRollback::new(self, generation, ScanStage::Analyzing, ScanStage::Captured);
        let result = self
            .collaborators
            .analyzer
            .analyze(&image, scan_type, clothing_type.as_deref())
            .await;
        rollback.disarm();
        drop(guard);

        let mut inner = self.lock();
        if self.is_stale(&inner, generation) {
            warn!(
                "[{}] Discarding late analysis response for a discarded session",
                self.session_id
            );
            return Err(ScanError::Disposed);
        }

        match result {
            Ok(analysis) => {
                info!(
                    "[{}] Analysis complete ({} report)",
                    self.session_id,
                    match analysis.report {
                        SustainabilityReport::Scored(_) => "scored",
                        SustainabilityReport::Verdict(_) => "verdict",
                    }
                );
                inner.state.last_report = Some(analysis.report.clone());
                inner.state.last_scan_id = analysis.scan_id;
                inner.state.last_alternatives = None;
                self.transition(&mut inner, ScanStage::Reviewed);
                Ok(analysis.report)
            }
            Err(e) => {
                warn!("[{}] Analysis failed: {e}", self.session_id);
                inner.state.last_error = Some(e.clone());
                self.transition(&mut inner, ScanStage::Captured);
                Err(e)
            }
        }
    }

    /// Look up substitutes for a reviewed item the service judged unsustainable.
    ///
    /// The clothing type comes from the report, falling back to the user's
    /// own selection. Stays in `Reviewed` whatever the outcome.
    pub async fn find_alternatives(&self) -> ScanResult<Vec<AlternativeItem>> {
        let (guard, generation, clothing_type) = {
            let inner = self.lock();
            self.require(&inner, ScanStage::Reviewed, "search for alternatives")?;
            if !inner.state.alternatives_available() {
                return Err(ScanError::InvalidTransition {
                    action: "search for alternatives",
                    state: "the item is not marked unsustainable".to_string(),
                });
            }

            let clothing_type = inner
                .state
                .last_report
                .as_ref()
                .filter(|report| report.has_known_clothing_type())
                .map(|report| report.clothing_type().to_string())
                .or_else(|| inner.state.selected_clothing_type.clone())
                .ok_or(ScanError::MissingInput(MissingField::ClothingType))?;

            let guard = self.in_flight.try_start()?;
            (guard, inner.generation, clothing_type)
        };

        info!(
            "[{}] Searching alternatives for {clothing_type}",
            self.session_id
        );
        let result = self
            .collaborators
            .alternatives
            .find_alternatives(&clothing_type)
            .await;
        drop(guard);

        let mut inner = self.lock();
        if inner.disposed {
            warn!(
                "[{}] Discarding late alternatives response for a discarded session",
                self.session_id
            );
            return Err(ScanError::Disposed);
        }
        if inner.generation != generation {
            warn!(
                "[{}] Discarding alternatives response for a scan that was left",
                self.session_id
            );
            return Err(ScanError::InvalidTransition {
                action: "show alternatives",
                state: inner.state.stage.to_string(),
            });
        }

        match result {
            Ok(items) => {
                info!("[{}] {} alternatives found", self.session_id, items.len());
                inner.state.last_alternatives = Some(items.clone());
                inner.state.last_error = None;
                Ok(items)
            }
            Err(e) => {
                warn!("[{}] Alternatives lookup failed: {e}", self.session_id);
                inner.state.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// `Reviewed → Idle` with a clean slate.
    pub fn scan_another(&self) -> ScanResult<()> {
        let mut inner = self.lock();
        self.require(&inner, ScanStage::Reviewed, "scan another item")?;
        inner.generation += 1;
        inner.state = WorkflowState::default();
        self.transition(&mut inner, ScanStage::Idle);
        Ok(())
    }

    /// `Reviewed → Idle`, after which this instance is discarded.
    pub fn view_history(&self) -> ScanResult<()> {
        {
            let inner = self.lock();
            self.require(&inner, ScanStage::Reviewed, "open history")?;
        }
        self.dispose();
        Ok(())
    }

    /// Discard the instance. Allowed from any stage; responses still in
    /// flight are dropped when they arrive.
    pub fn dispose(&self) {
        let mut inner = self.lock();
        if inner.disposed {
            return;
        }
        inner.generation += 1;
        inner.disposed = true;
        inner.state = WorkflowState::default();
        info!("[{}] Scan session discarded", self.session_id);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn require(&self, inner: &Inner, expected: ScanStage, action: &'static str) -> ScanResult<()> {
        if inner.disposed {
            return Err(ScanError::Disposed);
        }
        if inner.state.stage != expected {
            return Err(ScanError::InvalidTransition {
                action,
                state: inner.state.stage.to_string(),
            });
        }
        Ok(())
    }

    fn is_stale(&self, inner: &Inner, generation: u64) -> bool {
        inner.disposed || inner.generation != generation
    }

    fn transition(&self, inner: &mut Inner, to: ScanStage) {
        let from = inner.state.stage;
        inner.state.stage = to;
        info!("[{}] {from} -> {to}", self.session_id);
    }
}

/// Puts an in-progress stage back when the future awaiting a collaborator is
/// dropped before it can apply the outcome (timeout, `select!`, aborted task).
struct StageRollback<'a> {
    workflow: &'a ScanWorkflow,
    generation: u64,
    during: ScanStage,
    fallback: ScanStage,
    armed: bool,
}

impl<'a> StageRollback<'a> {
    fn new(
        workflow: &'a ScanWorkflow,
        generation: u64,
        during: ScanStage,
        fallback: ScanStage,
    ) -> Self {
        Self {
            workflow,
            generation,
            during,
            fallback,
            armed: true,
        }
    }

    /// Must be called before re-taking the state lock.
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for StageRollback<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.workflow.lock();
        if self.workflow.is_stale(&inner, self.generation) || inner.state.stage != self.during {
            return;
        }
        warn!(
            "[{}] {} abandoned before completion",
            self.workflow.session_id, self.during
        );
        self.workflow.transition(&mut inner, self.fallback);
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
