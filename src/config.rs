//! Mapper Configuration
//!
//! Endpoint URLs and the refresh interval, with defaults matching the local
//! telemetry bridge. Values can be overridden from the environment or a
//! `.env` file.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{MappingError, Result};
use crate::index::BUILDING_QUERY;
use crate::sheet::google::{DEFAULT_SHEETS_BASE_URL, DEFAULT_SHEET_RANGE};
use crate::telemetry::DEFAULT_TELEMETRY_URL;

pub const ENV_TELEMETRY_URL: &str = "BUILDING_TELEMETRY_URL";
pub const ENV_REFRESH_SECS: &str = "BUILDING_REFRESH_SECS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "BUILDING_REQUEST_TIMEOUT_SECS";
pub const ENV_MODEL_QUERY: &str = "BUILDING_MODEL_QUERY";
pub const ENV_SHEET_ID: &str = "BUILDING_SHEET_ID";
pub const ENV_SHEET_API_KEY: &str = "BUILDING_SHEET_API_KEY";
pub const ENV_SHEET_RANGE: &str = "BUILDING_SHEET_RANGE";
pub const ENV_SHEET_BASE_URL: &str = "BUILDING_SHEET_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetConfig {
    pub spreadsheet_id: String,
    pub api_key: String,
    pub range: String,
    pub base_url: String,
}

/// Configuration for the mapping store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperConfig {
    /// Telemetry endpoint polled on every refresh
    pub telemetry_url: String,
    /// Time between refresh cycles
    pub refresh_interval: Duration,
    /// Optional per-request timeout; requests may hang without one
    pub request_timeout: Option<Duration>,
    /// Query run once against the model to build the index
    pub model_query: String,
    /// Spreadsheet feed, if one is configured
    pub sheet: Option<SheetConfig>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            telemetry_url: DEFAULT_TELEMETRY_URL.to_string(),
            refresh_interval: Duration::from_secs(10),
            request_timeout: None,
            model_query: BUILDING_QUERY.to_string(),
            sheet: None,
        }
    }
}

impl MapperConfig {
    /// Read overrides from the process environment, after loading `.env`
    /// if one exists.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides from a dotenv file without touching the environment
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        // reads the file without exporting it to the process environment
        #[allow(deprecated)]
        let iter = dotenv::from_path_iter(path)
            .map_err(|e| MappingError::Config(format!("cannot read {}: {}", path.display(), e)))?;

        let mut vars = HashMap::new();
        for item in iter {
            let (key, value) = item
                .map_err(|e| MappingError::Config(format!("bad line in {}: {}", path.display(), e)))?;
            vars.insert(key, value);
        }

        Self::from_lookup(|key| vars.get(key).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_TELEMETRY_URL) {
            config.telemetry_url = url;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, ENV_REFRESH_SECS)? {
            config.refresh_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, ENV_REQUEST_TIMEOUT_SECS)? {
            config.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(query) = lookup(ENV_MODEL_QUERY) {
            config.model_query = query;
        }

        if let (Some(spreadsheet_id), Some(api_key)) = (lookup(ENV_SHEET_ID), lookup(ENV_SHEET_API_KEY)) {
            config.sheet = Some(SheetConfig {
                spreadsheet_id,
                api_key,
                range: lookup(ENV_SHEET_RANGE).unwrap_or_else(|| DEFAULT_SHEET_RANGE.to_string()),
                base_url: lookup(ENV_SHEET_BASE_URL)
                    .unwrap_or_else(|| DEFAULT_SHEETS_BASE_URL.to_string()),
            });
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval.is_zero() {
            return Err(MappingError::Config("refresh interval must be positive".into()));
        }
        if self.telemetry_url.trim().is_empty() {
            return Err(MappingError::Config("telemetry url is empty".into()));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| MappingError::Config(format!("{}={:?}: {}", key, raw, e))),
    }
}
