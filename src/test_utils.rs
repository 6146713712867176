use crate::database::history_cache_repo;
use crate::services::image_source::{Acquired, ImageSource};
use crate::services::remote::alternatives::AlternativesProvider;
use crate::services::remote::analysis::Analyzer;
use crate::services::report::{normalize, NormalizedAnalysis};
use crate::services::workflow::{Collaborators, ScanWorkflow, WorkflowOptions};
use crate::types::errors::ScanResult;
use crate::types::scan::{AlternativeItem, ImageData, ImagePayload, ScanRecord, ScanType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use tokio::sync::Notify;

static INIT: Once = Once::new();

pub struct TestContext {
    pub pool: Pool<Sqlite>,
}

pub fn init_test_logger() {
    INIT.call_once(|| {
        // Initialize logger only once
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub async fn init_test_db() -> TestContext {
    init_test_logger();

    // Fresh in-memory database per test; one connection so every query sees it
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    history_cache_repo::ensure_table(&pool)
        .await
        .expect("Failed to create cache table");

    TestContext { pool }
}

/// Verdict-shaped payload as the analysis service emits it (snake_case).
pub fn verdict_payload(sustainable: bool) -> Value {
    json!({
        "carbon_footprint": "12 kg CO2e",
        "material_composition": [
            {"material_name": "Polyester", "environmental_consequence": "Sheds microplastics"},
            {"material_name": "Cotton", "environmental_consequence": "Water intensive"}
        ],
        "country_origin": "Bangladesh",
        "expected_durability": "2-3 years",
        "final_decision": sustainable,
        "sustainable_tips": ["Wash cold", "Line dry", "Repair seams"],
        "clothing_type": "jacket"
    })
}

pub fn scored_payload(score: &str) -> Value {
    json!({
        "sustainabilityScore": score,
        "materials": ["organic cotton"],
        "longevity": "5+ years",
        "recyclability": "High",
        "careInstructions": "Cold wash",
        "environmentalImpact": "Low"
    })
}

pub fn sample_image() -> ImageData {
    ImageData::with_mime(vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3], "image/jpeg")
}

pub fn sample_record(id: &str, timestamp: DateTime<Utc>) -> ScanRecord {
    let analysis = normalize(&verdict_payload(false)).expect("fixture payload normalizes");
    ScanRecord {
        id: id.to_string(),
        image: ImagePayload::Embedded(sample_image()),
        scan_type: ScanType::Label,
        report: analysis.report,
        timestamp,
    }
}

/// What the analyzer double was last asked.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeCall {
    pub image: ImageData,
    pub scan_type: ScanType,
    pub clothing_type: Option<String>,
}

/// Analyzer double: counts calls, replays queued responses, and can be held
/// mid-flight until the test releases it.
#[derive(Default)]
pub struct CountingAnalyzer {
    pub calls: AtomicUsize,
    pub last_call: Mutex<Option<AnalyzeCall>>,
    responses: Mutex<VecDeque<ScanResult<Value>>>,
    /// Signalled when a call has started.
    pub entered: Notify,
    /// When set, calls wait for a permit before answering.
    pub release: Option<Notify>,
}

impl CountingAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held() -> Self {
        Self {
            release: Some(Notify::new()),
            ..Self::default()
        }
    }

    pub fn respond(self, response: ScanResult<Value>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<AnalyzeCall> {
        self.last_call.lock().unwrap().clone()
    }
}

#[async_trait]
impl Analyzer for CountingAnalyzer {
    async fn analyze(
        &self,
        image: &ImageData,
        scan_type: ScanType,
        clothing_type: Option<&str>,
    ) -> ScanResult<NormalizedAnalysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_call.lock().unwrap() = Some(AnalyzeCall {
            image: image.clone(),
            scan_type,
            clothing_type: clothing_type.map(str::to_string),
        });
        self.entered.notify_one();

        if let Some(release) = &self.release {
            release.notified().await;
        }

        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(verdict_payload(false)));
        normalize(&response?)
    }
}

#[derive(Default)]
pub struct CountingAlternatives {
    pub calls: AtomicUsize,
    pub queries: Mutex<Vec<String>>,
    response: Mutex<Option<ScanResult<Vec<AlternativeItem>>>>,
    pub entered: Notify,
    pub release: Option<Notify>,
}

impl CountingAlternatives {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held() -> Self {
        Self {
            release: Some(Notify::new()),
            ..Self::default()
        }
    }

    pub fn respond(self, response: ScanResult<Vec<AlternativeItem>>) -> Self {
        *self.response.lock().unwrap() = Some(response);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlternativesProvider for CountingAlternatives {
    async fn find_alternatives(&self, clothing_type: &str) -> ScanResult<Vec<AlternativeItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(clothing_type.to_string());
        self.entered.notify_one();

        if let Some(release) = &self.release {
            release.notified().await;
        }

        self.response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Image source double that replays a script of outcomes, one per call.
/// An exhausted script behaves like a dismissed picker.
#[derive(Default)]
pub struct ScriptedImageSource {
    outcomes: Mutex<VecDeque<ScanResult<Acquired>>>,
}

impl ScriptedImageSource {
    pub fn new(outcomes: Vec<ScanResult<Acquired>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
        }
    }

    pub fn image(image: ImageData) -> Self {
        Self::new(vec![Ok(Acquired::Image(image))])
    }

    fn next(&self) -> ScanResult<Acquired> {
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Acquired::Cancelled))
    }
}

#[async_trait]
impl ImageSource for ScriptedImageSource {
    async fn capture(&self) -> ScanResult<Acquired> {
        self.next()
    }

    async fn pick_from_library(&self) -> ScanResult<Acquired> {
        self.next()
    }
}

/// A workflow wired to the given doubles.
pub fn workflow_with(
    image_source: Arc<ScriptedImageSource>,
    analyzer: Arc<CountingAnalyzer>,
    alternatives: Arc<CountingAlternatives>,
    options: WorkflowOptions,
) -> ScanWorkflow {
    init_test_logger();
    ScanWorkflow::new(
        Collaborators {
            image_source,
            analyzer,
            alternatives,
        },
        options,
    )
}
