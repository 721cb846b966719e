//! Flattens a [`WeatherResponse`] into [`ForecastRecord`]s.
//!
//! The upstream payload carries each weather attribute as its own series.
//! Series of one location share a time axis, but nothing in the payload ties
//! them together except their position. The `Wx` series anchors the join:
//! it decides how many records a location yields and supplies their
//! timestamps, while every other series is read at the same index.
//!
//! Parsing never fails. A missing series or a short series yields empty
//! strings in the affected fields; a location without `Wx` yields nothing.
//! Timestamps of the non-anchor series are not checked against the anchor.

use tracing::debug;

use crate::model::{ElementName, ElementSeries, ForecastRecord, LocationForecast, WeatherResponse};

/// All records of all locations, in location order then slot order.
pub fn parse(response: &WeatherResponse) -> Vec<ForecastRecord> {
    response
        .records
        .location
        .iter()
        .flat_map(parse_location)
        .collect()
}

pub fn parse_location(location: &LocationForecast) -> Vec<ForecastRecord> {
    let Some(anchor) = location.element(ElementName::Weather) else {
        debug!(
            location = %location.location_name,
            "no {} series, location contributes no records",
            ElementName::Weather
        );
        return Vec::new();
    };

    let rain = location.element(ElementName::RainProbability);
    let min_temp = location.element(ElementName::MinTemperature);
    let max_temp = location.element(ElementName::MaxTemperature);

    anchor
        .time
        .iter()
        .enumerate()
        .map(|(i, slot)| ForecastRecord {
            start_time: slot.start_time.clone(),
            end_time: slot.end_time.clone(),
            weather_description: slot.parameter.parameter_name.clone(),
            temperature_range: format!("{}-{}°C", value_at(min_temp, i), value_at(max_temp, i)),
            rain_probability: format!("{}%", value_at(rain, i)),
            location_name: location.location_name.clone(),
        })
        .collect()
}

fn value_at(series: Option<&ElementSeries>, index: usize) -> &str {
    series
        .and_then(|s| s.parameter_name_at(index))
        .unwrap_or_default()
}
