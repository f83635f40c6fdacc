use super::{RunOptions, render_page, start_session, ui};
use crate::core::config::AppConfig;
use crate::core::sort::sort_by_percentage;
use crate::page::{SalesPage, load_page, source};
use anyhow::{Context, Result};
use tracing::info;

/// Loads the page once, annotates every row and returns the result.
pub async fn annotate(config: &AppConfig, options: &RunOptions) -> Result<SalesPage> {
    let (mut orchestrator, mut completions) = start_session(config).await;

    let location = options.source(config);
    let source = source::from_location(location, &config.user_agent, config.request_timeout());
    let mut page = load_page(source.as_ref(), &config.layout)
        .await
        .with_context(|| format!("Failed to load sales page: {}", source.describe()))?;

    let issued = orchestrator.select_currency(options.currency(config), &mut page)?;
    if issued == 0 {
        info!(
            currency = %orchestrator.currency(),
            "Nothing to fetch for this page and currency"
        );
    }

    let pb = ui::new_progress_bar(issued as u64);
    pb.set_message("Fetching reference prices...");
    orchestrator
        .settle(&mut page, &mut completions, &|| pb.inc(1))
        .await;
    pb.finish_and_clear();

    if options.sort {
        sort_by_percentage(&mut page);
    }
    Ok(page)
}

pub async fn run(config: &AppConfig, options: &RunOptions) -> Result<()> {
    let page = annotate(config, options).await?;
    let currency = options.currency(config).to_uppercase();
    println!("{}", render_page(&page, &currency, options.format)?);
    Ok(())
}
