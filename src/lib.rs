//! Building Mapper
//!
//! Reconciles buildings in a 3D engineering model with external telemetry:
//! - Model id ↔ matching key index built from the model query channel
//! - Building records refreshed from a polling telemetry feed
//! - Spreadsheet usage data merged into the same records
//! - Lock-light reads that always see a complete table

pub mod config;
pub mod error;
pub mod index;
pub mod model;
pub mod sheet;
pub mod store;
pub mod telemetry;
pub mod utils;

// Re-exports for convenience
pub use config::MapperConfig;
pub use error::{MappingError, Result};
pub use index::{canonical_key, ModelConnection};
pub use model::{BuildingRecord, DynamicValue, SheetData};
pub use sheet::SheetSource;
pub use store::{MappingEvent, MappingStore, RefreshHandle, StoreState};
pub use telemetry::TelemetrySource;

use std::sync::Arc;

/// Build a store from `config`, initialize it and start its refresh loop.
pub async fn connect(
    config: &MapperConfig,
    connection: Arc<dyn ModelConnection>,
) -> Result<(Arc<MappingStore>, RefreshHandle)> {
    let store = Arc::new(MappingStore::from_config(config, connection)?);
    store.init().await?;
    let handle = store.start()?;
    Ok((store, handle))
}
