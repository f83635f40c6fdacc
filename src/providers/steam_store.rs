use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::price::PriceFetcher;

// SteamStoreProvider implementation for PriceFetcher
pub struct SteamStoreProvider {
    base_url: String,
    region: String,
    timeout: Duration,
}

impl SteamStoreProvider {
    pub fn new(base_url: &str, region: &str, timeout: Duration) -> Self {
        SteamStoreProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            region: region.to_string(),
            timeout,
        }
    }
}

#[derive(Deserialize, Debug)]
struct AppDetailsEntry {
    #[serde(default)]
    success: bool,
    data: Option<AppData>,
}

#[derive(Deserialize, Debug)]
struct AppData {
    price_overview: Option<PriceOverview>,
}

#[derive(Deserialize, Debug)]
struct PriceOverview {
    #[serde(rename = "final")]
    final_price: u64,
    currency: Option<String>,
}

#[async_trait]
impl PriceFetcher for SteamStoreProvider {
    #[instrument(
        name = "SteamPriceFetch",
        skip(self),
        fields(item_id = %item_id, region = %self.region)
    )]
    async fn fetch_reference_price(&self, item_id: &str) -> Result<Option<u64>> {
        let url = format!("{}/api/appdetails/", self.base_url);
        debug!("Requesting app details from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("cnprice/0.5")
            .timeout(self.timeout)
            .build()?;
        let response = client
            .get(&url)
            .query(&[("appids", item_id), ("cc", self.region.as_str())])
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for item: {}", e, item_id))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for item: {}",
                response.status(),
                item_id
            ));
        }

        let text = response.text().await?;
        let mut details: HashMap<String, AppDetailsEntry> = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", item_id, e))?;

        let entry = details
            .remove(item_id)
            .ok_or_else(|| anyhow!("No app details found for item: {}", item_id))?;
        let data = entry.data.ok_or_else(|| {
            anyhow!(
                "App details missing for item: {} (success: {})",
                item_id,
                entry.success
            )
        })?;

        match data.price_overview {
            Some(price) => {
                debug!(final_price = price.final_price, currency = ?price.currency, "Found reference price");
                Ok(Some(price.final_price))
            }
            None => {
                debug!("Item has no reference price");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(item_id: &str, status: u16, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/appdetails/"))
            .and(query_param("appids", item_id))
            .and(query_param("cc", "cn"))
            .respond_with(ResponseTemplate::new(status).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn provider(mock_server: &MockServer) -> SteamStoreProvider {
        SteamStoreProvider::new(&mock_server.uri(), "cn", Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_successful_price_fetch() {
        let mock_response = r#"{
            "570": {
                "success": true,
                "data": {
                    "price_overview": {
                        "currency": "CNY",
                        "initial": 1999,
                        "final": 999,
                        "discount_percent": 50
                    }
                }
            }
        }"#;
        let mock_server = create_mock_server("570", 200, mock_response).await;

        let result = provider(&mock_server).fetch_reference_price("570").await.unwrap();
        assert_eq!(result, Some(999));
    }

    #[tokio::test]
    async fn test_missing_price_overview_is_unavailable() {
        let mock_response = r#"{"440": {"success": true, "data": {"name": "Team Fortress 2", "is_free": true}}}"#;
        let mock_server = create_mock_server("440", 200, mock_response).await;

        let result = provider(&mock_server).fetch_reference_price("440").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_unsuccessful_entry_is_error() {
        let mock_response = r#"{"123": {"success": false}}"#;
        let mock_server = create_mock_server("123", 200, mock_response).await;

        let result = provider(&mock_server).fetch_reference_price("123").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "App details missing for item: 123 (success: false)"
        );
    }

    #[tokio::test]
    async fn test_entry_for_other_item_is_error() {
        let mock_response = r#"{"999": {"success": true, "data": {}}}"#;
        let mock_server = create_mock_server("570", 200, mock_response).await;

        let result = provider(&mock_server).fetch_reference_price("570").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No app details found for item: 570"
        );
    }

    #[tokio::test]
    async fn test_item_id_is_encoded_in_query() {
        let mock_response = r#"{"570&cc=us": {"success": true, "data": {"price_overview": {"final": 4200}}}}"#;
        let mock_server = create_mock_server("570&cc=us", 200, mock_response).await;

        let result = provider(&mock_server)
            .fetch_reference_price("570&cc=us")
            .await
            .unwrap();
        assert_eq!(result, Some(4200));
    }

    #[tokio::test]
    async fn test_api_error_response() {
        let mock_server = create_mock_server("570", 500, "").await;

        let result = provider(&mock_server).fetch_reference_price("570").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error for item: 570"
        );
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = create_mock_server("570", 200, "<html>rate limited</html>").await;

        let result = provider(&mock_server).fetch_reference_price("570").await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse JSON response for 570")
        );
    }

    #[tokio::test]
    async fn test_transport_error() {
        // Nothing listens on the discard port
        let provider = SteamStoreProvider::new("http://127.0.0.1:9", "cn", Duration::from_secs(2));
        let result = provider.fetch_reference_price("570").await;
        assert!(result.unwrap_err().to_string().starts_with("Request error:"));
    }
}
