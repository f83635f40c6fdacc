pub mod currencies;
pub mod setup;
pub mod show;
pub mod ui;
pub mod watch;

use crate::core::config::AppConfig;
use crate::core::currency::load_rates;
use crate::core::{CompletionReceiver, RefreshOrchestrator};
use crate::page::SalesPage;
use crate::providers::{ExchangeRateProvider, SteamStoreProvider};
use anyhow::Result;
use comfy_table::Cell;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Options shared by the commands that annotate a page.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides the configured page location.
    pub source: Option<String>,
    /// Overrides the configured currency.
    pub currency: Option<String>,
    pub format: OutputFormat,
    pub sort: bool,
}

impl RunOptions {
    pub fn source<'a>(&'a self, config: &'a AppConfig) -> &'a str {
        self.source.as_deref().unwrap_or(&config.source)
    }

    pub fn currency<'a>(&'a self, config: &'a AppConfig) -> &'a str {
        self.currency.as_deref().unwrap_or(&config.currency)
    }
}

/// Loads the rate table (live rates when enabled) and builds the refresh
/// orchestrator around the Steam store provider.
pub async fn start_session(config: &AppConfig) -> (RefreshOrchestrator, CompletionReceiver) {
    let mut rates = config.rate_table();
    if config.providers.exchange_rate.enabled {
        let provider = ExchangeRateProvider::new(
            &config.providers.exchange_rate.base_url,
            config.request_timeout(),
        );
        load_rates(&mut rates, &provider, config.rate_timeout()).await;
    }

    let fetcher = Arc::new(SteamStoreProvider::new(
        &config.providers.steam.base_url,
        &config.providers.steam.region,
        config.request_timeout(),
    ));
    RefreshOrchestrator::new(fetcher, rates, config.stagger(), &config.layout.result_header)
}

impl SalesPage {
    pub fn display_as_table(&self, currency: &str) -> String {
        let mut table = ui::new_styled_table();

        let mut header: Vec<Cell> = self.header.iter().map(|h| ui::header_cell(h)).collect();
        if let Some(result_header) = &self.result_header {
            header.push(ui::header_cell(&format!("{result_header} ({currency})")));
        }
        table.set_header(header);

        for row in &self.rows {
            let mut cells: Vec<Cell> = row.cells.iter().map(Cell::new).collect();
            if let Some(result) = &row.result {
                cells.push(ui::result_cell(result));
            }
            table.add_row(cells);
        }

        let mut output = format!(
            "Sales: {} rows, prices in {}\n\n",
            self.rows.len(),
            ui::style_text(currency, ui::StyleType::Label)
        );
        output.push_str(&table.to_string());
        output
    }
}

pub fn render_page(page: &SalesPage, currency: &str, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(page.display_as_table(currency)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(page)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PageLayout;
    use crate::core::{PageAdapter, RowId};

    const HTML: &str = r#"<table class="table-sales">
        <thead><tr><th>Name</th><th>A</th><th>B</th><th>C</th><th>Price</th></tr></thead>
        <tbody><tr data-appid="570"><td>Dota 2</td><td></td><td></td><td></td><td>$2.00</td></tr></tbody>
    </table>"#;

    #[test]
    fn test_render_table_and_json() {
        let mut page = SalesPage::parse(HTML, &PageLayout::default()).unwrap();
        page.ensure_result_header("CNPrice");
        page.get_or_create_result_cell(RowId(0)).unwrap().text = "1.40 (143.00%)".to_string();

        let table = render_page(&page, "USD", OutputFormat::Table).unwrap();
        assert!(table.contains("CNPrice (USD)"));
        assert!(table.contains("1.40 (143.00%)"));
        assert!(table.contains("Dota 2"));

        let json = render_page(&page, "USD", OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["rows"][0]["item_id"], "570");
        assert_eq!(value["rows"][0]["result"]["text"], "1.40 (143.00%)");
        assert_eq!(value["result_header"], "CNPrice");
    }

    #[test]
    fn test_run_options_override_config() {
        let config = AppConfig::default();
        let options = RunOptions {
            currency: Some("JPY".to_string()),
            ..Default::default()
        };
        assert_eq!(options.currency(&config), "JPY");
        assert_eq!(options.source(&config), "https://steamdb.info/sales/");
    }
}
