//! Time-stamped measurement values

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One quality-flagged measurement as the telemetry feed reports it.
///
/// Every field may be missing on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDynamicValue {
    #[serde(rename = "Value", default)]
    pub value: Value,
    #[serde(rename = "UnitsAbbreviation", default)]
    pub units_abbreviation: Option<String>,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: Option<String>,
    #[serde(rename = "Good", default)]
    pub good: Option<bool>,
}

/// A measurement after reshaping. Replaced wholesale on every refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicValue {
    pub value: String,
    pub unit_abbreviation: String,
    pub timestamp: String,
    pub good: bool,
}

impl DynamicValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }
}

impl From<RawDynamicValue> for DynamicValue {
    fn from(raw: RawDynamicValue) -> Self {
        let value = match raw.value {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        };

        Self {
            value,
            unit_abbreviation: raw.units_abbreviation.unwrap_or_default(),
            timestamp: raw.timestamp.unwrap_or_default(),
            good: raw.good.unwrap_or(false),
        }
    }
}
