use std::fmt::Write as _;

use anyhow::Context;
use chrono::NaiveDateTime;
use forecast_core::ForecastRecord;

const WINDOW_FORMAT: &str = "%m/%d %H:%M";

/// `10/02 18:00 - 10/03 06:00`, or the raw timestamps if they don't parse.
pub fn format_window(record: &ForecastRecord) -> String {
    match (record.starts_at(), record.ends_at()) {
        (Some(start), Some(end)) => format!("{} - {}", short_time(start), short_time(end)),
        _ => format!("{} - {}", record.start_time, record.end_time),
    }
}

fn short_time(at: NaiveDateTime) -> String {
    at.format(WINDOW_FORMAT).to_string()
}

/// Plain-text table, one heading per run of records for the same location.
pub fn records_text(records: &[ForecastRecord]) -> String {
    let mut out = String::new();
    let mut current_location: Option<&str> = None;

    for record in records {
        if current_location != Some(record.location_name.as_str()) {
            if current_location.is_some() {
                out.push('\n');
            }
            let _ = writeln!(out, "{}", record.location_name);
            current_location = Some(record.location_name.as_str());
        }

        let _ = writeln!(
            out,
            "  {}  {}  {}  Rain {}",
            format_window(record),
            record.weather_description,
            record.temperature_range,
            record.rain_probability,
        );
    }

    out
}

pub fn records_json(records: &[ForecastRecord]) -> anyhow::Result<String> {
    serde_json::to_string_pretty(records).context("Failed to serialize forecast records")
}
