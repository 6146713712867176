//! Image acquisition.
//!
//! Camera capture and library picks both end in the same normalized
//! [`ImageData`] or an explicit cancellation. Cancelling is not a failure.

use crate::types::errors::{ScanError, ScanResult};
use crate::types::scan::ImageData;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub enum Acquired {
    Image(ImageData),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    Camera,
    Library,
}

/// Device-side image provider. Permission prompts happen inside these calls;
/// a refusal comes back as `DeviceDenied`, never as an empty image.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn capture(&self) -> ScanResult<Acquired>;
    async fn pick_from_library(&self) -> ScanResult<Acquired>;

    async fn acquire(&self, source: CaptureSource) -> ScanResult<Acquired> {
        match source {
            CaptureSource::Camera => self.capture().await,
            CaptureSource::Library => self.pick_from_library().await,
        }
    }
}

/// Library picks served from the local filesystem.
///
/// Used by the headless driver and on hosts without a camera. A source with
/// no path behaves like a picker the user dismissed.
#[derive(Debug, Clone, Default)]
pub struct FileImageSource {
    path: Option<PathBuf>,
}

impl FileImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn dismissed() -> Self {
        Self { path: None }
    }
}

#[async_trait]
impl ImageSource for FileImageSource {
    async fn capture(&self) -> ScanResult<Acquired> {
        Err(ScanError::DeviceFailure(
            "no camera available on this device".to_string(),
        ))
    }

    async fn pick_from_library(&self) -> ScanResult<Acquired> {
        match &self.path {
            None => Ok(Acquired::Cancelled),
            Some(path) => read_image_file(path).await.map(Acquired::Image),
        }
    }
}

/// Read and sniff an image file.
pub async fn read_image_file(path: &Path) -> ScanResult<ImageData> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => {
            ScanError::DeviceDenied(format!("cannot read {}: {e}", path.display()))
        }
        _ => ScanError::DeviceFailure(format!("cannot read {}: {e}", path.display())),
    })?;

    if bytes.is_empty() {
        return Err(ScanError::DeviceFailure(format!(
            "{} is empty",
            path.display()
        )));
    }

    let image = ImageData::from_encoded(bytes)?;
    log::debug!(
        "Loaded {} ({}, {} bytes)",
        path.display(),
        image.mime(),
        image.len()
    );
    Ok(image)
}
