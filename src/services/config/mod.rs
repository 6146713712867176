pub mod models;

pub use models::*;

use std::path::PathBuf;
use std::time::Duration;

pub const ENV_BACKEND_URL: &str = "GREENSCAN_BACKEND_URL";
pub const ENV_TIMEOUT_SECS: &str = "GREENSCAN_TIMEOUT_SECS";
pub const ENV_REQUIRE_CLOTHING_TYPE: &str = "GREENSCAN_REQUIRE_CLOTHING_TYPE";
pub const ENV_CACHE_PATH: &str = "GREENSCAN_CACHE_PATH";

impl ClientConfig {
    /// Load from the process environment, after merging a `.env` file if one exists.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // Try to load .env, ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Bad values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup(ENV_BACKEND_URL)
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty());
        if base_url.is_none() {
            log::warn!("{ENV_BACKEND_URL} is not set; network calls will fail until configured");
        }

        let request_timeout = match lookup(ENV_TIMEOUT_SECS) {
            None => defaults.request_timeout,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    log::warn!("Ignoring invalid {ENV_TIMEOUT_SECS}={raw:?}");
                    defaults.request_timeout
                }
            },
        };

        let require_clothing_type_for_labels = match lookup(ENV_REQUIRE_CLOTHING_TYPE) {
            None => defaults.require_clothing_type_for_labels,
            Some(raw) => match parse_flag(&raw) {
                Some(flag) => flag,
                None => {
                    log::warn!("Ignoring invalid {ENV_REQUIRE_CLOTHING_TYPE}={raw:?}");
                    defaults.require_clothing_type_for_labels
                }
            },
        };

        let cache_path = lookup(ENV_CACHE_PATH)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self {
            base_url,
            request_timeout,
            require_clothing_type_for_labels,
            cache_path,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
