//! Normalization of feed timestamps.
//!
//! NexTrip serializes instants as Microsoft JSON dates
//! (`/Date(1510000000000-0600)/`). The millisecond part is always UTC; the
//! trailing offset only describes the agency's local zone and is validated
//! but not applied.

use chrono::{DateTime, Utc};

use crate::models::types::{RawTime, Result, TransitError};

const MS_DATE_PREFIX: &str = "/Date(";
const MS_DATE_SUFFIX: &str = ")/";

pub fn normalize(raw: &RawTime) -> Result<DateTime<Utc>> {
    match raw {
        RawTime::EpochMillis(ms) => from_millis(*ms, &ms.to_string()),
        RawTime::Text(text) => parse_text(text),
    }
}

fn parse_text(text: &str) -> Result<DateTime<Utc>> {
    let trimmed = text.trim();

    if let Some(inner) = trimmed
        .strip_prefix(MS_DATE_PREFIX)
        .and_then(|rest| rest.strip_suffix(MS_DATE_SUFFIX))
    {
        return parse_ms_date(inner, text);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    match trimmed.parse::<i64>() {
        Ok(ms) => from_millis(ms, text),
        Err(_) => Err(invalid(text)),
    }
}

/// Parses the `1510000000000-0600` part of a Microsoft JSON date
fn parse_ms_date(inner: &str, original: &str) -> Result<DateTime<Utc>> {
    // Skip a leading sign so pre-1970 instants are not mistaken for an offset
    let offset_at = inner
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '+' || *c == '-')
        .map(|(i, _)| i);

    let (millis, offset) = match offset_at {
        Some(i) => (&inner[..i], Some(&inner[i + 1..])),
        None => (inner, None),
    };

    if let Some(offset) = offset {
        if offset.len() != 4 || !offset.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid(original));
        }
    }

    let ms = millis.parse::<i64>().map_err(|_| invalid(original))?;
    from_millis(ms, original)
}

fn from_millis(ms: i64, original: &str) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| invalid(original))
}

fn invalid(text: &str) -> TransitError {
    TransitError::InvalidTimestamp(text.to_string())
}
