//! Building Record types

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{BuildingAttribute, DynamicValue};

/// Matching key → record, the table the store publishes on every refresh
pub type RecordTable = HashMap<String, Arc<BuildingRecord>>;

/// Telemetry-sourced fields of one building, keyed by its matching key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingData {
    pub matching_key: String,
    pub building_name: String,
    pub year_built: Option<DynamicValue>,
    pub monthly_average_watts: Option<DynamicValue>,
    pub longitude: Option<DynamicValue>,
    pub latitude: Option<DynamicValue>,
    pub campus: Option<DynamicValue>,
    pub building_type: Option<DynamicValue>,
    pub address: Option<DynamicValue>,
    pub building_number: Option<DynamicValue>,
    pub about: Option<DynamicValue>,
    pub daily_power: Option<DynamicValue>,
    pub daily_energy: Option<DynamicValue>,
}

impl BuildingData {
    /// Assemble the fixed record fields from a reshaped attribute dictionary
    pub fn from_attributes(
        matching_key: impl Into<String>,
        mut attributes: HashMap<BuildingAttribute, DynamicValue>,
    ) -> Self {
        let mut take = |attr: BuildingAttribute| attributes.remove(&attr);

        Self {
            matching_key: matching_key.into(),
            building_name: take(BuildingAttribute::BuildingName)
                .map(|v| v.value)
                .unwrap_or_default(),
            year_built: take(BuildingAttribute::YearBuilt),
            monthly_average_watts: take(BuildingAttribute::MonthlyAverageWatts),
            longitude: take(BuildingAttribute::Longitude),
            latitude: take(BuildingAttribute::Latitude),
            campus: take(BuildingAttribute::Campus),
            building_type: take(BuildingAttribute::BuildingType),
            address: take(BuildingAttribute::Address),
            building_number: take(BuildingAttribute::BuildingNumber),
            about: take(BuildingAttribute::About),
            daily_power: take(BuildingAttribute::DailyPower),
            daily_energy: take(BuildingAttribute::DailyEnergy),
        }
    }
}

/// Spreadsheet-sourced usage figures for one building.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetData {
    pub matching_key: String,
    pub building_name: String,
    pub building_number: String,
    pub water_usage: String,
    pub water_usage_unit: String,
    pub gas_usage: String,
    pub gas_usage_unit: String,
}

/// The enriched per-key record handed out to readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingRecord {
    /// Model element id, when the model has a building with this key
    pub model_id: Option<String>,
    pub data: BuildingData,
    /// Secondary data, empty until a spreadsheet row is merged
    pub sheet: Option<SheetData>,
}

impl BuildingRecord {
    pub fn new(model_id: Option<String>, data: BuildingData) -> Self {
        Self {
            model_id,
            data,
            sheet: None,
        }
    }

    pub fn matching_key(&self) -> &str {
        &self.data.matching_key
    }

    /// Copy of this record with its secondary slot replaced.
    pub fn with_sheet(&self, sheet: SheetData) -> Self {
        Self {
            model_id: self.model_id.clone(),
            data: self.data.clone(),
            sheet: Some(sheet),
        }
    }

    /// Case-insensitive name lookup used by the search API.
    ///
    /// An exact match compares the building name; otherwise the text
    /// `"<name>. <year built>"` must contain the query.
    pub fn matches_query(&self, query: &str, exact: bool) -> bool {
        let name = self.data.building_name.to_lowercase();
        let query = query.to_lowercase();

        if exact {
            return name == query;
        }

        let year = self
            .data
            .year_built
            .as_ref()
            .map(|v| v.value.as_str())
            .unwrap_or("");
        format!("{}. {}", name, year).contains(&query)
    }
}
