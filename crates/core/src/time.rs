use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

/// Numeric inputs below this are unix seconds and get scaled to millis.
const SECONDS_CUTOFF: i64 = 10_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeOutput {
    pub iso: String,
    pub utc: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    #[error("No time provided")]
    Missing,
    #[error("Invalid timestamp number")]
    InvalidTimestamp,
    #[error("Invalid date string")]
    InvalidDateString,
    #[error("Time must be a valid number or string")]
    UnsupportedType,
}

/// Convert a unix timestamp or date string into iso / utc / millisecond
/// renderings. The input arrives as a raw JSON value because callers send
/// both numbers and strings in the same field.
pub fn convert_time(time: &serde_json::Value) -> Result<TimeOutput, TimeError> {
    match time {
        serde_json::Value::Null => Err(TimeError::Missing),
        serde_json::Value::Number(number) => {
            let raw = number
                .as_i64()
                .or_else(|| number.as_f64().map(|float| float as i64))
                .ok_or(TimeError::InvalidTimestamp)?;
            from_timestamp(raw)
        }
        serde_json::Value::String(text) if !text.trim().is_empty() => parse_string(text.trim()),
        _ => Err(TimeError::UnsupportedType),
    }
}

fn from_timestamp(raw: i64) -> Result<TimeOutput, TimeError> {
    let millis = if raw < SECONDS_CUTOFF { raw * 1000 } else { raw };
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(output)
        .ok_or(TimeError::InvalidTimestamp)
}

fn parse_string(text: &str) -> Result<TimeOutput, TimeError> {
    // Numeric strings are timestamps, same as the number case.
    if let Ok(raw) = text.parse::<i64>() {
        return from_timestamp(raw);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(output(parsed.with_timezone(&Utc)));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
        return Ok(output(parsed.with_timezone(&Utc)));
    }

    // Zone-less forms are taken as UTC.
    const NAIVE_DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
    ];
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(output(parsed.and_utc()));
        }
    }

    const NAIVE_DATE_FORMATS: &[&str] = &["%B %d, %Y", "%Y-%m-%d", "%Y/%m/%d"];
    for format in NAIVE_DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(text, format) {
            if let Some(midnight) = parsed.and_hms_opt(0, 0, 0) {
                return Ok(output(midnight.and_utc()));
            }
        }
    }

    Err(TimeError::InvalidDateString)
}

fn output(datetime: DateTime<Utc>) -> TimeOutput {
    TimeOutput {
        iso: datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        utc: datetime.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        timestamp: datetime.timestamp_millis(),
    }
}
