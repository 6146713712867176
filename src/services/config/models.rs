use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything the remote clients and the workflow need from the outside.
///
/// Handed to each client constructor; nothing reads process-wide state after
/// this value has been built.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Root of the backend, e.g. `https://scanner.example`. `None` is a valid
    /// configuration: every network call then fails at call time.
    pub base_url: Option<String>,
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    /// Label scans must name the clothing type before submission.
    pub require_clothing_type_for_labels: bool,
    /// SQLite file backing the offline history cache. `None` disables it.
    pub cache_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            require_clothing_type_for_labels: true,
            cache_path: None,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
