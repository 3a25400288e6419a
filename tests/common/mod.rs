//! Test doubles for the model channel, telemetry feed and spreadsheet

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use tokio::sync::Notify;

use building_mapper::error::{MappingError, Result};
use building_mapper::index::RowStream;
use building_mapper::sheet::SheetRows;
use building_mapper::telemetry::TelemetryPayload;
use building_mapper::{ModelConnection, SheetSource, TelemetrySource};

pub struct RowsConnection {
    rows: Vec<Value>,
}

impl RowsConnection {
    pub fn new(rows: Vec<Value>) -> Self {
        Self { rows }
    }

    /// The single building of scenario A: element 0x1, number "0042"
    pub fn scenario_a() -> Self {
        Self::new(vec![json!({"element": {"id": "0x1"}, "building__number": "0042"})])
    }
}

#[async_trait]
impl ModelConnection for RowsConnection {
    async fn query(&self, _query: &str) -> anyhow::Result<RowStream> {
        let rows: Vec<anyhow::Result<Value>> = self.rows.iter().cloned().map(Ok).collect();
        Ok(stream::iter(rows).boxed())
    }
}

pub struct ClosedConnection;

#[async_trait]
impl ModelConnection for ClosedConnection {
    async fn query(&self, _query: &str) -> anyhow::Result<RowStream> {
        anyhow::bail!("imodel connection closed")
    }
}

/// Telemetry feed whose document and health can be changed between calls
pub struct ScriptedFeed {
    payload: Mutex<Value>,
    failing: AtomicBool,
    calls: AtomicUsize,
    gate: Notify,
    gated_call: AtomicUsize,
}

impl ScriptedFeed {
    pub fn new(payload: Value) -> Self {
        Self {
            payload: Mutex::new(payload),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            gate: Notify::new(),
            gated_call: AtomicUsize::new(0),
        }
    }

    pub fn scenario_a() -> Self {
        Self::new(hall_payload("1990"))
    }

    pub fn set_payload(&self, payload: Value) {
        *self.payload.lock().unwrap() = payload;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make the given call (1-based) wait until `release` is called
    pub fn hold_call(&self, call: usize) {
        self.gated_call.store(call, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl TelemetrySource for ScriptedFeed {
    async fn fetch(&self) -> Result<TelemetryPayload> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let payload = self.payload.lock().unwrap().clone();

        if call == self.gated_call.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(MappingError::Fetch(anyhow::anyhow!("503 Service Unavailable")));
        }

        serde_json::from_value(payload).map_err(|e| MappingError::Decode(e.into()))
    }
}

pub struct StaticSheet {
    rows: SheetRows,
    failing: AtomicBool,
}

impl StaticSheet {
    pub fn new(rows: SheetRows) -> Self {
        Self {
            rows,
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl SheetSource for StaticSheet {
    async fn rows(&self) -> Result<SheetRows> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MappingError::Sheet(anyhow::anyhow!("quota exceeded")));
        }
        Ok(self.rows.clone())
    }
}

pub fn hall_payload(year: &str) -> Value {
    json!({
        "buildings": {
            "42": {
                "BuildingName": {"Value": "Hall"},
                "YearBuilt": {"Value": year, "UnitsAbbreviation": "", "Timestamp": "2020-06-01T00:00:00Z", "Good": true}
            }
        }
    })
}

pub fn sheet_grid() -> SheetRows {
    vec![
        row(&["Building Name", "Building Number", "Water", "Water Unit", "Gas", "Gas Unit"]),
        row(&["Hall", "42", "100", "gal", "50", "therm"]),
    ]
}

pub fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}
