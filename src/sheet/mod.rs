//! Spreadsheet Feed
//!
//! Secondary usage data keyed by building number, merged into the records
//! the telemetry feed produced.

pub mod google;
pub mod merger;

pub use google::GoogleSheetSource;
pub use merger::{merge, parse_rows, MergeReport};

use async_trait::async_trait;

use crate::error::Result;

/// Raw cell grid, header row first
pub type SheetRows = Vec<Vec<String>>;

#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn rows(&self) -> Result<SheetRows>;
}
