use super::{RunOptions, render_page, start_session, ui};
use crate::core::config::{AppConfig, PageLayout};
use crate::core::sort::sort_by_percentage;
use crate::core::{ChangeWatcher, CompletionReceiver, PageAdapter, RefreshOrchestrator};
use crate::page::{PageSource, SalesPage, load_page, source};
use anyhow::{Context, Result};
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Everything the polling loop needs besides the page itself.
pub struct WatchLoop<'a> {
    pub orchestrator: &'a mut RefreshOrchestrator,
    pub completions: &'a mut CompletionReceiver,
    pub source: &'a dyn PageSource,
    pub layout: &'a PageLayout,
    pub poll_interval: Duration,
    pub sort: bool,
}

impl WatchLoop<'_> {
    /// Polls the page until `shutdown` resolves and returns the last page.
    ///
    /// Each tick reloads the page and compares its region snapshot. A change
    /// replaces the page and starts a new refresh. Completions are applied as
    /// they arrive, and `on_settled` is called whenever a refresh has nothing
    /// left in flight. Lines received on `selections` switch the currency.
    pub async fn run<F>(
        self,
        mut page: SalesPage,
        mut selections: mpsc::UnboundedReceiver<String>,
        shutdown: F,
        on_settled: &mut dyn FnMut(&SalesPage, &RefreshOrchestrator),
    ) -> SalesPage
    where
        F: Future<Output = ()>,
    {
        let WatchLoop {
            orchestrator,
            completions,
            source,
            layout,
            poll_interval,
            sort,
        } = self;

        let mut watcher = ChangeWatcher::new();
        watcher.prime(page.region_snapshot());

        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Stopping page watcher");
                    break;
                }
                _ = ticker.tick() => {
                    match load_page(source, layout).await {
                        Ok(next) => {
                            if watcher.observe(next.region_snapshot().as_deref()) {
                                info!(rows = next.row_count(), "Page changed, refreshing");
                                page = next;
                                orchestrator.refresh(&mut page);
                                if orchestrator.is_settled() {
                                    on_settled(&page, &*orchestrator);
                                }
                            }
                        }
                        Err(e) => warn!(error = %e, source = %source.describe(), "Failed to reload page"),
                    }
                }
                Some(completion) = completions.recv() => {
                    if orchestrator.apply(&mut page, completion) && orchestrator.is_settled() {
                        if sort {
                            sort_by_percentage(&mut page);
                        }
                        on_settled(&page, &*orchestrator);
                    }
                }
                Some(code) = selections.recv() => {
                    let code = code.trim();
                    if !code.is_empty() {
                        match orchestrator.select_currency(code, &mut page) {
                            Ok(issued) => {
                                debug!(currency = %orchestrator.currency(), issued, "Currency selected");
                                if orchestrator.is_settled() {
                                    on_settled(&page, &*orchestrator);
                                }
                            }
                            Err(e) => warn!(error = %e, "Ignoring currency selection"),
                        }
                    }
                }
            }
        }

        page
    }
}

/// Forwards stdin lines as currency selections.
fn spawn_stdin_selections() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

pub async fn run<F>(config: &AppConfig, options: &RunOptions, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let (mut orchestrator, mut completions) = start_session(config).await;

    let location = options.source(config);
    let source = source::from_location(location, &config.user_agent, config.request_timeout());
    let mut page = load_page(source.as_ref(), &config.layout)
        .await
        .with_context(|| format!("Failed to load sales page: {}", source.describe()))?;

    let format = options.format;
    let mut print_page = |page: &SalesPage, orchestrator: &RefreshOrchestrator| {
        match render_page(page, orchestrator.rendered_currency(), format) {
            Ok(output) => {
                println!("{output}");
                let stamp = chrono::Local::now().format("%H:%M:%S").to_string();
                println!(
                    "{}",
                    ui::style_text(
                        &format!("Updated {stamp}. Type a currency code to switch, Ctrl-C to quit."),
                        ui::StyleType::Subtle
                    )
                );
            }
            Err(e) => eprintln!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error)),
        }
    };

    orchestrator.select_currency(options.currency(config), &mut page)?;
    if orchestrator.is_settled() {
        print_page(&page, &orchestrator);
    }

    WatchLoop {
        orchestrator: &mut orchestrator,
        completions: &mut completions,
        source: source.as_ref(),
        layout: &config.layout,
        poll_interval: config.poll_interval(),
        sort: options.sort,
    }
    .run(page, spawn_stdin_selections(), shutdown, &mut print_page)
    .await;

    Ok(())
}
