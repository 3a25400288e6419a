//! Data Model
//!
//! Typed values, the closed attribute schema, and the per-building records
//! held by the mapping store.

pub mod attribute;
pub mod record;
pub mod value;

pub use attribute::BuildingAttribute;
pub use record::{BuildingData, BuildingRecord, RecordTable, SheetData};
pub use value::{DynamicValue, RawDynamicValue};
