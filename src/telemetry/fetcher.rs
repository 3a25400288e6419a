use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use super::{TelemetryPayload, TelemetrySource};
use crate::error::Result;
use crate::index::KeyIndex;
use crate::model::{BuildingAttribute, BuildingData, BuildingRecord, DynamicValue, RawDynamicValue, RecordTable};

/// Fetch one telemetry document and build a fresh record table from it.
pub async fn fetch(source: &dyn TelemetrySource, keys: &KeyIndex) -> Result<RecordTable> {
    let payload = source.fetch().await?;
    Ok(build_records(payload, keys))
}

/// Reshape a telemetry document into records. Unknown attributes and
/// attribute values that are not objects are dropped.
pub fn build_records(payload: TelemetryPayload, keys: &KeyIndex) -> RecordTable {
    let mut table = RecordTable::with_capacity(payload.buildings.len());
    let mut ignored = 0usize;

    for (key, raw_attributes) in payload.buildings {
        let mut attributes = HashMap::new();

        for (name, raw) in raw_attributes {
            let Some(attr) = BuildingAttribute::from_wire_name(&name) else {
                trace!("Ignoring unknown attribute {:?} on building {}", name, key);
                ignored += 1;
                continue;
            };

            match serde_json::from_value::<RawDynamicValue>(raw) {
                Ok(raw) => {
                    attributes.insert(attr, DynamicValue::from(raw));
                }
                Err(e) => {
                    debug!("Dropping malformed attribute {} on building {}: {}", attr, key, e);
                    ignored += 1;
                }
            }
        }

        let model_id = keys.get(&key).map(str::to_string);
        if model_id.is_none() {
            trace!("Building {} has no model counterpart", key);
        }

        let data = BuildingData::from_attributes(key.clone(), attributes);
        table.insert(key, Arc::new(BuildingRecord::new(model_id, data)));
    }

    debug!("Built {} building records ({} attributes ignored)", table.len(), ignored);
    table
}
