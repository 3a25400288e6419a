//! Spreadsheet Merger
//!
//! Rows are positional: `[name, key, water, water unit, gas, gas unit]`.
//! Only keys already present in the record table are touched. Rows with an
//! empty key are dropped here even though the model index keeps empty keys:
//! no telemetry record is ever keyed by `""`.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::model::{RecordTable, SheetData};

/// Outcome of one merge pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub matched: usize,
    /// Rows whose key has no record
    pub skipped: usize,
}

/// Parse data rows, skipping the header row. Missing trailing cells read
/// as empty; rows without a key are dropped.
pub fn parse_rows(rows: &[Vec<String>]) -> Vec<SheetData> {
    rows.iter()
        .skip(1)
        .filter_map(|row| {
            let cell = |i: usize| row.get(i).cloned().unwrap_or_default();

            let key = cell(1);
            if key.is_empty() {
                trace!("Skipping spreadsheet row without a building number: {:?}", row);
                return None;
            }

            Some(SheetData {
                matching_key: key.clone(),
                building_name: cell(0),
                building_number: key,
                water_usage: cell(2),
                water_usage_unit: cell(3),
                gas_usage: cell(4),
                gas_usage_unit: cell(5),
            })
        })
        .collect()
}

/// Copy of `table` with every matching record's secondary slot replaced.
pub fn merge(table: &RecordTable, rows: &[SheetData]) -> (RecordTable, MergeReport) {
    let mut merged = table.clone();
    let mut report = MergeReport::default();

    for sheet in rows {
        match table.get(&sheet.matching_key) {
            Some(record) => {
                merged.insert(
                    sheet.matching_key.clone(),
                    Arc::new(record.with_sheet(sheet.clone())),
                );
                report.matched += 1;
            }
            None => {
                trace!("No building record for spreadsheet key {}", sheet.matching_key);
                report.skipped += 1;
            }
        }
    }

    debug!(
        "Merged spreadsheet rows: {} matched, {} skipped",
        report.matched, report.skipped
    );
    (merged, report)
}
