use crate::types::errors::ScanError;
use crate::types::report::SustainabilityReport;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// What the user pointed the camera at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    /// Care/composition label. The capture screen starts on this one.
    #[default]
    Label,
    Garment,
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanType::Label => write!(f, "label"),
            ScanType::Garment => write!(f, "garment"),
        }
    }
}

impl FromStr for ScanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "label" => Ok(ScanType::Label),
            "garment" => Ok(ScanType::Garment),
            _ => Err(format!("Unknown scan type: {s}")),
        }
    }
}

/// An encoded image held in memory.
///
/// Clones share the underlying buffer, so a captured image survives state
/// transitions without being copied.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    bytes: Arc<[u8]>,
    mime: String,
}

impl ImageData {
    /// Wrap already-encoded bytes, sniffing the format from the header.
    pub fn from_encoded(bytes: Vec<u8>) -> Result<Self, ScanError> {
        let format = image::guess_format(&bytes)
            .map_err(|e| ScanError::DeviceFailure(format!("Unrecognized image data: {e}")))?;
        Ok(Self {
            bytes: bytes.into(),
            mime: format.to_mime_type().to_string(),
        })
    }

    pub fn with_mime(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime: mime.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True when both values point at the same buffer, not merely equal bytes.
    pub fn same_bytes(&self, other: &ImageData) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }

    /// `data:<mime>;base64,<payload>`, the form the analysis endpoint takes.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    pub fn from_data_uri(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (meta, payload) = rest.split_once(',')?;
        let mime = meta.strip_suffix(";base64")?;
        let bytes = STANDARD.decode(payload.trim()).ok()?;
        let mime = if mime.is_empty() { "image/jpeg" } else { mime };
        Some(Self::with_mime(bytes, mime))
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Image reference carried by a stored scan: either the embedded image or a
/// link the store handed back instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImagePayload {
    Embedded(ImageData),
    Uri(String),
}

impl ImagePayload {
    pub fn as_image(&self) -> Option<&ImageData> {
        match self {
            ImagePayload::Embedded(image) => Some(image),
            ImagePayload::Uri(_) => None,
        }
    }
}

const URI_SCHEMES: &[&str] = &["http://", "https://", "file://", "content://", "ph://"];

impl From<String> for ImagePayload {
    fn from(raw: String) -> Self {
        if let Some(image) = ImageData::from_data_uri(&raw) {
            return ImagePayload::Embedded(image);
        }
        if URI_SCHEMES.iter().any(|scheme| raw.starts_with(scheme)) {
            return ImagePayload::Uri(raw);
        }
        // Older clients stored the bare base64 body without the data: prefix
        match STANDARD.decode(raw.trim()) {
            Ok(bytes) if !bytes.is_empty() => {
                let mime = image::guess_format(&bytes)
                    .map(|f| f.to_mime_type())
                    .unwrap_or("image/jpeg");
                ImagePayload::Embedded(ImageData::with_mime(bytes, mime))
            }
            _ => ImagePayload::Uri(raw),
        }
    }
}

impl From<ImagePayload> for String {
    fn from(payload: ImagePayload) -> Self {
        match payload {
            ImagePayload::Embedded(image) => image.to_data_uri(),
            ImagePayload::Uri(uri) => uri,
        }
    }
}

/// One persisted scan as held by the remote history store.
///
/// Records are replace-or-delete only; nothing on the client mutates one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub id: String,
    pub image: ImagePayload,
    pub scan_type: ScanType,
    pub report: SustainabilityReport,
    pub timestamp: DateTime<Utc>,
}

/// A substitute product suggested for a non-sustainable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeItem {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}
