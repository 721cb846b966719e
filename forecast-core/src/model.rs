use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp layout used by the CWA datastore, e.g. `2025-10-02 18:00:00`.
pub const SLOT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Top-level payload of the `F-C0032-001` dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub success: String,
    pub result: ApiResult,
    pub records: Records,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResult {
    pub resource_id: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Records {
    pub dataset_description: String,
    pub location: Vec<LocationForecast>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationForecast {
    pub location_name: String,
    pub weather_element: Vec<ElementSeries>,
}

impl LocationForecast {
    /// First series tagged with `name`. Later duplicates are never returned.
    pub fn element(&self, name: ElementName) -> Option<&ElementSeries> {
        self.weather_element
            .iter()
            .find(|series| series.element_name == name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSeries {
    pub element_name: String,
    pub time: Vec<TimeSlot>,
}

impl ElementSeries {
    /// `parameterName` of the slot at `index`, if the series is long enough.
    pub fn parameter_name_at(&self, index: usize) -> Option<&str> {
        self.time
            .get(index)
            .map(|slot| slot.parameter.parameter_name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub start_time: String,
    pub end_time: String,
    pub parameter: ParameterValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterValue {
    pub parameter_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_unit: Option<String>,
}

/// Element names the parser knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementName {
    /// `Wx`, the weather description. Anchors the time axis.
    Weather,
    /// `PoP`, probability of precipitation.
    RainProbability,
    /// `MinT`
    MinTemperature,
    /// `MaxT`
    MaxTemperature,
    /// `CI`, comfort index. Recognized but not rendered into records yet.
    ComfortIndex,
}

impl ElementName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementName::Weather => "Wx",
            ElementName::RainProbability => "PoP",
            ElementName::MinTemperature => "MinT",
            ElementName::MaxTemperature => "MaxT",
            ElementName::ComfortIndex => "CI",
        }
    }
}

impl fmt::Display for ElementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One display-ready time window for one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastRecord {
    pub start_time: String,
    pub end_time: String,
    pub weather_description: String,
    /// `"{min}-{max}°C"`
    pub temperature_range: String,
    /// `"{pop}%"`
    pub rain_probability: String,
    pub location_name: String,
}

impl ForecastRecord {
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        parse_slot_time(&self.start_time)
    }

    pub fn ends_at(&self) -> Option<NaiveDateTime> {
        parse_slot_time(&self.end_time)
    }
}

impl fmt::Display for ForecastRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:\n{} {} Rain {}",
            self.start_time, self.weather_description, self.temperature_range, self.rain_probability
        )
    }
}

pub fn parse_slot_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), SLOT_TIME_FORMAT).ok()
}
