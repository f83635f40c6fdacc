//! The sales page: HTML model and where it is loaded from

pub mod html;
pub mod source;

pub use html::{SalesPage, SalesRow};
pub use source::{FilePageSource, HttpPageSource, PageSource};

use crate::core::config::PageLayout;
use anyhow::Result;

pub async fn load_page(source: &dyn PageSource, layout: &PageLayout) -> Result<SalesPage> {
    let html = source.load().await?;
    SalesPage::parse(&html, layout)
}
