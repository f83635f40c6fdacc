//! Currency rate table and the live rate abstraction

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, info};

/// Currency the reference store prices are quoted in.
pub const REFERENCE_CURRENCY: &str = "CNY";

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Returns a flat mapping of currency code to units per one `base` unit.
    async fn fetch_rates(&self, base: &str) -> Result<HashMap<String, f64>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyInfo {
    pub code: String,
    #[serde(default)]
    pub label: String,
    pub rate: f64,
}

impl CurrencyInfo {
    pub fn new(code: &str, label: &str, rate: f64) -> Self {
        Self {
            code: code.to_uppercase(),
            label: label.to_string(),
            rate,
        }
    }
}

/// Multipliers from the reference currency into each supported currency.
///
/// The reference currency is always present with a rate of exactly 1.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    reference: String,
    currencies: Vec<CurrencyInfo>,
}

impl RateTable {
    pub fn new(reference: &str, currencies: Vec<CurrencyInfo>) -> Self {
        let reference = reference.to_uppercase();
        let mut table = Self {
            reference: reference.clone(),
            currencies: Vec::with_capacity(currencies.len() + 1),
        };
        table
            .currencies
            .push(CurrencyInfo::new(&reference, &reference, 1.0));

        for currency in currencies {
            let code = currency.code.to_uppercase();
            if code == reference {
                // Keep the configured label, but never the rate
                if !currency.label.is_empty() {
                    table.currencies[0].label = currency.label;
                }
                continue;
            }
            match table.currencies.iter_mut().find(|c| c.code == code) {
                Some(existing) => existing.rate = currency.rate,
                None => table.currencies.push(CurrencyInfo { code, ..currency }),
            }
        }
        table
    }

    /// The static built-in table.
    pub fn builtin() -> Self {
        Self::new(
            REFERENCE_CURRENCY,
            vec![
                CurrencyInfo::new("CNY", "CNY (China)", 1.0),
                CurrencyInfo::new("JPY", "JPY (Japan)", 20.5),
                CurrencyInfo::new("HKD", "HKD (Hong Kong)", 1.09),
                CurrencyInfo::new("USD", "USD (United States)", 0.14),
                CurrencyInfo::new("RUB", "RUB (Russia)", 12.7),
                CurrencyInfo::new("PHP", "PHP (Philippines)", 7.74),
                CurrencyInfo::new("INR", "INR (India)", 11.52),
                CurrencyInfo::new("KRW", "KRW (South Korea)", 185.87),
                CurrencyInfo::new("CAD", "CAD (Canada)", 0.19),
            ],
        )
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn currencies(&self) -> &[CurrencyInfo] {
        &self.currencies
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        let code = code.to_uppercase();
        self.currencies
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.rate)
    }

    /// Overwrites the rates of supported codes with live values. Codes that
    /// are not already in the table are ignored. Returns the number updated.
    pub fn merge_live(&mut self, live: &HashMap<String, f64>) -> usize {
        let mut updated = 0;
        for currency in self.currencies.iter_mut() {
            if currency.code == self.reference {
                continue;
            }
            if let Some(rate) = live.get(&currency.code) {
                if rate.is_finite() && *rate > 0.0 {
                    currency.rate = *rate;
                    updated += 1;
                }
            }
        }
        debug!(updated, "Merged live rates");
        updated
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Refreshes `table` from a live provider, bounded by `timeout`.
///
/// Any failure is logged and leaves the table untouched. Returns whether the
/// live rates were applied.
pub async fn load_rates(table: &mut RateTable, provider: &dyn RateProvider, timeout: Duration) -> bool {
    let base = table.reference().to_string();
    match tokio::time::timeout(timeout, provider.fetch_rates(&base)).await {
        Ok(Ok(live)) => {
            let updated = table.merge_live(&live);
            info!(base = %base, updated, "Loaded live exchange rates");
            true
        }
        Ok(Err(e)) => {
            error!(error = %e, "Failed to load exchange rates, keeping defaults");
            false
        }
        Err(_) => {
            error!(
                timeout_ms = timeout.as_millis() as u64,
                "Timed out loading exchange rates, keeping defaults"
            );
            false
        }
    }
}
