//! Date dimension builder.
//!
//! Generates one row per calendar day across the observed message date
//! range, padded on both sides so late-arriving data near the edges still
//! joins. The bounds are dynamic: they follow the data, not the clock
//! (reruns over unchanged staging rows produce an identical table).

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{date_key, CleanedMessage, DateDimension};

/// Build the full dimension row for one calendar day
#[must_use]
pub fn date_row(date: NaiveDate) -> DateDimension {
    let day_of_week = date.weekday().number_from_monday();

    DateDimension {
        date_key: date_key(date),
        full_date: date,
        day_of_week,
        day_name: date.format("%A").to_string(),
        week_of_year: date.iso_week().week(),
        month: date.month(),
        month_name: date.format("%B").to_string(),
        quarter: (date.month() - 1) / 3 + 1,
        year: date.year(),
        is_weekend: day_of_week >= 6,
    }
}

/// Enumerate every day in the inclusive range, ascending
#[must_use]
pub fn generate_calendar(start: NaiveDate, end: NaiveDate) -> Vec<DateDimension> {
    if start > end {
        return Vec::new();
    }

    start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(date_row)
        .collect()
}

/// Build the date dimension from cleaned messages.
///
/// The range is `min(message_date) - padding .. max(message_date) + padding`
/// in whole days; an empty staging input yields an empty dimension. Every
/// message date is inside the range by construction.
#[must_use]
pub fn build_date_dimension(cleaned: &[CleanedMessage], padding_days: i64) -> Vec<DateDimension> {
    let observed_min = cleaned.iter().map(|m| m.message_date.date()).min();
    let observed_max = cleaned.iter().map(|m| m.message_date.date()).max();

    match (observed_min, observed_max) {
        (Some(min), Some(max)) => {
            let padding = Duration::days(padding_days);
            generate_calendar(min - padding, max + padding)
        }
        _ => Vec::new(),
    }
}
