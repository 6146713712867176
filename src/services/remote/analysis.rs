use crate::services::config::ClientConfig;
use crate::services::remote::ApiClient;
use crate::services::report::{normalize, NormalizedAnalysis};
use crate::types::errors::ScanResult;
use crate::types::scan::{ImageData, ScanType};
use async_trait::async_trait;
use log::info;
use serde::Serialize;

pub const ANALYZE_PATH: &str = "/api/analyze-clothing";

/// Remote image → report capability.
///
/// One call, one network request. Implementations never retry.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(
        &self,
        image: &ImageData,
        scan_type: ScanType,
        clothing_type: Option<&str>,
    ) -> ScanResult<NormalizedAnalysis>;
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    image_base64: String,
    scan_type: ScanType,
    #[serde(skip_serializing_if = "Option::is_none")]
    clothing_type: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    api: ApiClient,
}

impl HttpAnalysisClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            api: ApiClient::new(config),
        }
    }
}

#[async_trait]
impl Analyzer for HttpAnalysisClient {
    async fn analyze(
        &self,
        image: &ImageData,
        scan_type: ScanType,
        clothing_type: Option<&str>,
    ) -> ScanResult<NormalizedAnalysis> {
        let request = AnalyzeRequest {
            image_base64: image.to_data_uri(),
            scan_type,
            clothing_type,
        };
        info!(
            "Submitting {} scan ({} bytes, clothing type: {})",
            scan_type,
            image.len(),
            clothing_type.unwrap_or("-")
        );

        let raw = self.api.post_json(ANALYZE_PATH, &request).await?;
        normalize(&raw)
    }
}
