// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Utc};

/// Convert Lichess epoch milliseconds to a UTC timestamp.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Convert a UTC timestamp to Lichess epoch milliseconds.
pub fn to_epoch_millis(date: DateTime<Utc>) -> i64 {
    date.timestamp_millis()
}

/// Parse an RFC3339 query parameter, naming the parameter on failure.
pub fn parse_rfc3339_param(
    name: &str,
    raw: Option<&str>,
) -> crate::error::Result<Option<DateTime<Utc>>> {
    raw.map(|value| {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| {
                crate::error::AppError::BadRequest(format!(
                    "Invalid '{}' parameter: must be RFC3339 datetime",
                    name
                ))
            })
    })
    .transpose()
}
