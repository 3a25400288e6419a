//! Known telemetry attribute names

use std::fmt;

/// The closed set of attributes a building record is assembled from.
///
/// Anything else in the feed is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildingAttribute {
    BuildingName,
    YearBuilt,
    MonthlyAverageWatts,
    Longitude,
    Latitude,
    Campus,
    BuildingType,
    Address,
    BuildingNumber,
    About,
    DailyPower,
    DailyEnergy,
}

impl BuildingAttribute {
    pub const ALL: [BuildingAttribute; 12] = [
        BuildingAttribute::BuildingName,
        BuildingAttribute::YearBuilt,
        BuildingAttribute::MonthlyAverageWatts,
        BuildingAttribute::Longitude,
        BuildingAttribute::Latitude,
        BuildingAttribute::Campus,
        BuildingAttribute::BuildingType,
        BuildingAttribute::Address,
        BuildingAttribute::BuildingNumber,
        BuildingAttribute::About,
        BuildingAttribute::DailyPower,
        BuildingAttribute::DailyEnergy,
    ];

    /// Attribute name exactly as it appears in the telemetry document.
    pub fn wire_name(self) -> &'static str {
        match self {
            BuildingAttribute::BuildingName => "BuildingName",
            BuildingAttribute::YearBuilt => "YearBuilt",
            BuildingAttribute::MonthlyAverageWatts => "Monthly Average Watts",
            BuildingAttribute::Longitude => "Longitude",
            BuildingAttribute::Latitude => "Latitude",
            BuildingAttribute::Campus => "Campus",
            BuildingAttribute::BuildingType => "BuildingType",
            BuildingAttribute::Address => "Address",
            BuildingAttribute::BuildingNumber => "BuildingNumber",
            BuildingAttribute::About => "About",
            BuildingAttribute::DailyPower => "Daily Power",
            BuildingAttribute::DailyEnergy => "Daily Energy",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| attr.wire_name() == name)
    }
}

impl fmt::Display for BuildingAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
