use serde::Serialize;
use thiserror::Error;

/// Every failure the scan workflow and its collaborators can surface.
///
/// Capture cancellation is deliberately absent: it is an acquisition outcome
/// (`Acquired::Cancelled`), not an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("Device permission denied: {0}")]
    DeviceDenied(String),
    #[error("Device failure: {0}")]
    DeviceFailure(String),
    #[error("Missing input: {0}")]
    MissingInput(MissingField),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Server rejected request: HTTP {code}")]
    BadStatus { code: u16, body: String },
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Cannot {action} while {state}")]
    InvalidTransition { action: &'static str, state: String },
    #[error("Another request is already in progress")]
    Busy,
    #[error("Scan session was discarded")]
    Disposed,
    #[error("Cache error: {0}")]
    Cache(String),
}

/// The piece of user input a request could not proceed without.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum MissingField {
    #[error("no image captured")]
    Image,
    #[error("clothing type not chosen")]
    ClothingType,
    #[error("no report to show")]
    Report,
}

impl MissingField {
    pub fn user_message(&self) -> &'static str {
        match self {
            MissingField::Image => "Please take or choose a photo first.",
            MissingField::ClothingType => {
                "Please choose what kind of clothing this label belongs to."
            }
            MissingField::Report => "There is no scan result to show yet.",
        }
    }
}

impl ScanError {
    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            ScanError::DeviceDenied(_) => {
                "Camera access is required to scan clothing items. Please grant permission."
            }
            ScanError::DeviceFailure(_) => "Failed to take picture. Please try again.",
            ScanError::MissingInput(field) => field.user_message(),
            ScanError::Network(_) => {
                "Could not reach the analysis service. Check your connection and try again."
            }
            ScanError::BadStatus { .. } => "Failed to analyze clothing. Please try again.",
            ScanError::Malformed(_) => {
                "The analysis service returned an unexpected answer. Please try again later."
            }
            ScanError::NotFound(_) => "This scan no longer exists.",
            ScanError::InvalidTransition { .. } => "That action is not available right now.",
            ScanError::Busy => "Please wait for the current request to finish.",
            ScanError::Disposed => "This scan session has ended.",
            ScanError::Cache(_) => "Saved scans could not be read.",
        }
    }

    /// Whether the same request can reasonably be sent again as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScanError::Network(_) | ScanError::BadStatus { .. } | ScanError::Malformed(_)
        )
    }
}

impl From<reqwest::Error> for ScanError {
    fn from(error: reqwest::Error) -> Self {
        ScanError::Network(error.to_string())
    }
}

impl From<sqlx::Error> for ScanError {
    fn from(error: sqlx::Error) -> Self {
        ScanError::Cache(error.to_string())
    }
}

impl Serialize for ScanError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

pub type ScanResult<T> = Result<T, ScanError>;

#[cfg(test)]
#[path = "tests/errors_tests.rs"]
mod tests;
