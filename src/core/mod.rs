//! Core business logic abstractions

pub mod config;
pub mod currency;
pub mod log;
pub mod page;
pub mod price;
pub mod refresh;
pub mod sort;
pub mod watcher;

// Re-export main types for cleaner imports
pub use currency::{CurrencyInfo, RateProvider, RateTable};
pub use page::{CellColor, PageAdapter, ResultCell, RowId};
pub use price::{FetchOutcome, PriceFetcher};
pub use refresh::{Completion, CompletionReceiver, RefreshOrchestrator};
pub use watcher::ChangeWatcher;
