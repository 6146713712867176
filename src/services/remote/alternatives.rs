use crate::services::config::ClientConfig;
use crate::services::remote::ApiClient;
use crate::types::errors::{MissingField, ScanError, ScanResult};
use crate::types::scan::AlternativeItem;
use async_trait::async_trait;
use log::info;
use serde::Serialize;
use serde_json::Value;

pub const ALTERNATIVES_PATH: &str = "/api/search-alternatives";

/// Substitute-product search keyed by clothing type.
#[async_trait]
pub trait AlternativesProvider: Send + Sync {
    /// An empty list is a valid answer ("no alternatives found").
    async fn find_alternatives(&self, clothing_type: &str) -> ScanResult<Vec<AlternativeItem>>;
}

#[derive(Debug, Serialize)]
struct AlternativesRequest<'a> {
    clothing_type: &'a str,
}

#[derive(Debug, Clone)]
pub struct HttpAlternativesClient {
    api: ApiClient,
}

impl HttpAlternativesClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            api: ApiClient::new(config),
        }
    }
}

#[async_trait]
impl AlternativesProvider for HttpAlternativesClient {
    async fn find_alternatives(&self, clothing_type: &str) -> ScanResult<Vec<AlternativeItem>> {
        let clothing_type = clothing_type.trim();
        if clothing_type.is_empty() {
            return Err(ScanError::MissingInput(MissingField::ClothingType));
        }

        let raw = self
            .api
            .post_json(ALTERNATIVES_PATH, &AlternativesRequest { clothing_type })
            .await?;
        let items = parse_alternatives(&raw)?;
        info!("Found {} alternatives for '{}'", items.len(), clothing_type);
        Ok(items)
    }
}

/// Read the `{"web": [{url, title, description}, ...]}` search answer.
pub fn parse_alternatives(raw: &Value) -> ScanResult<Vec<AlternativeItem>> {
    let web = raw.get("web").ok_or_else(|| {
        ScanError::Malformed("alternatives response has no `web` list".to_string())
    })?;
    if web.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(web.clone())
        .map_err(|e| ScanError::Malformed(format!("invalid alternatives list: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_keeps_order() {
        let raw = json!({
            "web": [
                {"url": "https://a.example", "title": "A", "description": "first"},
                {"url": "https://b.example", "title": "B", "description": "second"}
            ]
        });
        let items = parse_alternatives(&raw).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "A");
        assert_eq!(items[1].url, "https://b.example");
    }

    #[test]
    fn test_parse_empty_list_is_success() {
        assert!(parse_alternatives(&json!({ "web": [] })).unwrap().is_empty());
        assert!(parse_alternatives(&json!({ "web": null })).unwrap().is_empty());
    }

    #[test]
    fn test_parse_without_web_is_malformed() {
        assert!(matches!(
            parse_alternatives(&json!({ "results": [] })),
            Err(ScanError::Malformed(_))
        ));
        assert!(matches!(
            parse_alternatives(&json!({ "web": [{"title": "no url"}] })),
            Err(ScanError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_clothing_type_rejected_locally() {
        // No base URL: a network attempt would surface as Network, not MissingInput
        let client = HttpAlternativesClient::new(&ClientConfig::default());
        let err = client.find_alternatives("  ").await.unwrap_err();
        assert!(matches!(err, ScanError::MissingInput(_)));
    }
}
