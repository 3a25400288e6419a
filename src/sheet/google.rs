//! Google Sheets values source (API-key access)

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{SheetRows, SheetSource};
use crate::error::{MappingError, Result};

pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_SHEET_RANGE: &str = "Sheet1!A1:T";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

pub struct GoogleSheetSource {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    range: String,
    api_key: String,
}

impl GoogleSheetSource {
    pub fn new(spreadsheet_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            range: DEFAULT_SHEET_RANGE.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = range.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn values_url(&self) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid sheets base url {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("sheets base url {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                self.range.as_str(),
            ]);
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

fn cell_text(cell: Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[async_trait]
impl SheetSource for GoogleSheetSource {
    async fn rows(&self) -> Result<SheetRows> {
        let url = self.values_url().map_err(MappingError::Sheet)?;
        debug!("Fetching spreadsheet {} range {}", self.spreadsheet_id, self.range);

        let range: ValueRange = self
            .client
            .get(url)
            .send()
            .await
            .context("spreadsheet request failed")
            .map_err(MappingError::Sheet)?
            .error_for_status()
            .context("spreadsheet endpoint returned an error status")
            .map_err(MappingError::Sheet)?
            .json()
            .await
            .context("spreadsheet body is not a value range")
            .map_err(MappingError::Sheet)?;

        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }
}
