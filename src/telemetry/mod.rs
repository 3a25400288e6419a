//! Telemetry Feed
//!
//! Fetches the building attribute feed and reshapes it into records.

pub mod fetcher;
pub mod http;

pub use fetcher::{build_records, fetch};
pub use http::HttpTelemetrySource;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;

/// Default local endpoint of the telemetry bridge
pub const DEFAULT_TELEMETRY_URL: &str = "http://localhost:5000/v1/pi/buildings";

/// `{buildings: {<key>: {<attribute>: {Value, UnitsAbbreviation, Timestamp, Good}}}}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryPayload {
    pub buildings: HashMap<String, HashMap<String, Value>>,
}

/// Anything that can produce one telemetry document per call
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    async fn fetch(&self) -> Result<TelemetryPayload>;
}
