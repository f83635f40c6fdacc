use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::currency::RateProvider;

// ExchangeRateProvider implementation for RateProvider
pub struct ExchangeRateProvider {
    base_url: String,
    timeout: Duration,
}

impl ExchangeRateProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        ExchangeRateProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: HashMap<String, f64>,
}

#[async_trait]
impl RateProvider for ExchangeRateProvider {
    #[instrument(name = "ExchangeRateFetch", skip(self), fields(base = %base))]
    async fn fetch_rates(&self, base: &str) -> Result<HashMap<String, f64>> {
        let url = format!("{}/v6/latest/{}", self.base_url, base);
        debug!("Requesting rate table from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("cnprice/0.5")
            .timeout(self.timeout)
            .build()?;

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for rate table: {}", e, base))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for rate table: {}",
                response.status(),
                base
            ));
        }

        let text = response.text().await?;

        let data: LatestRatesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", base, e))?;

        debug!(count = data.rates.len(), "Received rate table");
        Ok(data.rates)
    }
}
