//! The refresh cycle: attach a result cell to every row, fetch each row's
//! reference price concurrently and write results back as they arrive.
//!
//! Fetch tasks never touch the page. They report a [`Completion`] over a
//! channel and the owner of the page applies it with
//! [`RefreshOrchestrator::apply`], so every completion only updates the row it
//! was issued for. Each refresh bumps a generation counter and completions
//! from older generations are discarded.

use crate::core::currency::RateTable;
use crate::core::page::{PageAdapter, RowId};
use crate::core::price::{
    ERROR_TEXT, FetchOutcome, PriceFetcher, UNAVAILABLE_TEXT, convert, minor_to_major,
    parse_price, render_result,
};
use anyhow::{Result, anyhow};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub generation: u64,
    pub row: RowId,
    pub item_id: String,
    pub outcome: FetchOutcome,
}

pub type CompletionReceiver = mpsc::UnboundedReceiver<Completion>;

pub struct RefreshOrchestrator {
    fetcher: Arc<dyn PriceFetcher>,
    rates: RateTable,
    currency: String,
    rate: f64,
    rendered_currency: String,
    generation: u64,
    in_flight: usize,
    stagger: Duration,
    result_header: String,
    tx: mpsc::UnboundedSender<Completion>,
}

impl RefreshOrchestrator {
    /// Creates an orchestrator with the reference currency active, plus the
    /// receiving end for completions of the fetches it issues.
    pub fn new(
        fetcher: Arc<dyn PriceFetcher>,
        rates: RateTable,
        stagger: Duration,
        result_header: &str,
    ) -> (Self, CompletionReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let orchestrator = RefreshOrchestrator {
            fetcher,
            currency: rates.reference().to_string(),
            rendered_currency: rates.reference().to_string(),
            rates,
            rate: 1.0,
            generation: 0,
            in_flight: 0,
            stagger,
            result_header: result_header.to_string(),
            tx,
        };
        (orchestrator, rx)
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Currency the result cells were last filled in. Differs from
    /// [`currency`](Self::currency) after switching to the identity rate,
    /// which leaves the cells as they were.
    pub fn rendered_currency(&self) -> &str {
        &self.rendered_currency
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_settled(&self) -> bool {
        self.in_flight == 0
    }

    pub fn set_currency(&mut self, code: &str) -> Result<()> {
        let code = code.trim().to_uppercase();
        let rate = self
            .rates
            .rate(&code)
            .ok_or_else(|| anyhow!("Unsupported currency: {}", code))?;
        debug!(currency = %code, rate, "Active currency changed");
        self.currency = code;
        self.rate = rate;
        Ok(())
    }

    /// Switches the active currency and refreshes right away.
    pub fn select_currency(&mut self, code: &str, page: &mut dyn PageAdapter) -> Result<usize> {
        self.set_currency(code)?;
        Ok(self.refresh(page))
    }

    /// Starts a refresh cycle over every row currently on the page and
    /// returns the number of fetches issued.
    ///
    /// Nothing is issued while the identity rate is active, but fetches
    /// still in flight from an earlier refresh are superseded.
    pub fn refresh(&mut self, page: &mut dyn PageAdapter) -> usize {
        self.generation += 1;
        self.in_flight = 0;

        if self.rate == 1.0 {
            debug!(currency = %self.currency, "Identity rate, skipping refresh");
            return 0;
        }

        self.rendered_currency = self.currency.clone();
        page.ensure_result_header(&self.result_header);

        let mut issued = 0usize;
        for row in page.list_rows() {
            let item_id = page.identifier(row).map(String::from);
            let Some(cell) = page.get_or_create_result_cell(row) else {
                continue;
            };
            cell.clear();

            match item_id {
                Some(item_id) => {
                    let delay = self.stagger.saturating_mul(issued as u32);
                    self.spawn_fetch(row, item_id, delay);
                    issued += 1;
                }
                None => debug!(row = row.0, "Row has no identifier, skipping"),
            }
        }

        self.in_flight = issued;
        info!(
            generation = self.generation,
            currency = %self.currency,
            issued,
            "Refresh started"
        );
        issued
    }

    fn spawn_fetch(&self, row: RowId, item_id: String, delay: Duration) {
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        let rate = self.rate;
        let generation = self.generation;

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let outcome = match fetcher.fetch_reference_price(&item_id).await {
                Ok(Some(minor)) => FetchOutcome::Converted(convert(minor_to_major(minor), rate)),
                Ok(None) => FetchOutcome::Unavailable,
                Err(e) => FetchOutcome::Failed(format!("{e:#}")),
            };
            // The receiver is gone only when the app is shutting down
            let _ = tx.send(Completion {
                generation,
                row,
                item_id,
                outcome,
            });
        });
    }

    /// Writes a completion into its row's result cell. Returns false when the
    /// completion was dropped as stale.
    pub fn apply(&mut self, page: &mut dyn PageAdapter, completion: Completion) -> bool {
        if completion.generation != self.generation {
            debug!(
                item_id = %completion.item_id,
                generation = completion.generation,
                current = self.generation,
                "Dropping completion from superseded refresh"
            );
            return false;
        }
        self.in_flight = self.in_flight.saturating_sub(1);

        if page.identifier(completion.row) != Some(completion.item_id.as_str()) {
            debug!(item_id = %completion.item_id, row = completion.row.0, "Row moved, dropping completion");
            return false;
        }

        let comparison = page.comparison_text(completion.row).and_then(parse_price);
        let Some(cell) = page.get_or_create_result_cell(completion.row) else {
            return false;
        };

        match completion.outcome {
            FetchOutcome::Converted(converted) => match comparison {
                Some(comparison) => *cell = render_result(converted, comparison),
                None => {
                    warn!(item_id = %completion.item_id, "Comparison price missing or unreadable");
                    cell.text = ERROR_TEXT.to_string();
                }
            },
            FetchOutcome::Unavailable => cell.text = UNAVAILABLE_TEXT.to_string(),
            FetchOutcome::Failed(err) => {
                error!(item_id = %completion.item_id, error = %err, "Error fetching reference price");
                cell.text = ERROR_TEXT.to_string();
            }
        }
        true
    }

    /// Applies completions until the current refresh has nothing in flight.
    pub async fn settle(
        &mut self,
        page: &mut dyn PageAdapter,
        completions: &mut CompletionReceiver,
        on_applied: &dyn Fn(),
    ) {
        while !self.is_settled() {
            let Some(completion) = completions.recv().await else {
                break;
            };
            if self.apply(page, completion) {
                on_applied();
            }
        }
    }
}
