//! Change notifications for readers that re-render on refresh

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum MappingEvent {
    /// The model index was built during init
    IndexBuilt { buildings: usize, collisions: usize },
    /// A new record table was published
    RecordsRefreshed { seq: u64, records: usize },
    /// A refresh cycle was abandoned; the previous table stays published
    RefreshFailed { seq: u64, error: String },
    /// Spreadsheet rows were merged into the published table
    SheetMerged { matched: usize, skipped: usize },
}
