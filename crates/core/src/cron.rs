use chrono::{DateTime, Utc};
use cron::Schedule;
use serde::Serialize;
use std::str::FromStr;

const UPCOMING_RUNS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CronDescription {
    pub description: String,
    pub upcoming: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CronError {
    #[error("Error parsing the cron expression: {0}")]
    Parse(String),
}

/// Describe a cron expression field by field and list its next runs.
///
/// Five-field expressions are accepted and normalized by prepending a
/// seconds field; six and seven field (seconds / year) forms pass through.
pub fn describe_cron(expression: &str) -> Result<CronDescription, CronError> {
    let expression = expression.trim();
    let fields: Vec<&str> = expression.split_whitespace().collect();
    let normalized = if fields.len() == 5 {
        format!("0 {expression}")
    } else {
        expression.to_string()
    };

    let schedule =
        Schedule::from_str(&normalized).map_err(|error| CronError::Parse(error.to_string()))?;

    Ok(CronDescription {
        description: describe_fields(&normalized),
        upcoming: schedule
            .upcoming(Utc)
            .take(UPCOMING_RUNS)
            .map(format_run)
            .collect(),
    })
}

fn describe_fields(normalized: &str) -> String {
    const NAMES: &[&str] = &[
        "second",
        "minute",
        "hour",
        "day-of-month",
        "month",
        "day-of-week",
        "year",
    ];

    normalized
        .split_whitespace()
        .zip(NAMES)
        .map(|(value, name)| {
            if value == "*" {
                format!("every {name}")
            } else {
                format!("{name} {value}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_run(run: DateTime<Utc>) -> String {
    run.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
