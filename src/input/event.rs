//! Delivery events read from the newline-delimited input stream.

use crate::error::ParseError;
use crate::input::timezone::TimeZonePolicy;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::Deserialize;

/// Naive date-time layouts accepted when a timestamp carries no offset.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Offset-carrying layouts tried after RFC 3339.
const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

/// A translation delivery, reduced to what the moving average needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// Timestamp floored to whole minutes since the Unix epoch
    pub epoch_minute: i64,
    /// Delivery duration, in the unit of the input (seconds in practice)
    pub duration: f64,
}

/// Raw shape of an input line. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct RawEvent {
    timestamp: String,
    duration: serde_json::Number,
}

impl Event {
    pub fn new(epoch_minute: i64, duration: f64) -> Self {
        Self {
            epoch_minute,
            duration,
        }
    }

    /// Parse one JSON input line into an event.
    ///
    /// Timestamps without an offset are read in the zone given by `policy`.
    pub fn from_input_line(line: &str, policy: &TimeZonePolicy) -> Result<Self, ParseError> {
        let raw: RawEvent = serde_json::from_str(line)?;

        let timestamp = parse_timestamp(&raw.timestamp, policy)?;
        let epoch_minute = whole_seconds(&timestamp).div_euclid(60);

        let duration = raw
            .duration
            .as_f64()
            .filter(|d| d.is_finite() && *d >= 0.0)
            .ok_or_else(|| ParseError::InvalidDuration {
                value: raw.duration.to_string(),
            })?;

        Ok(Self::new(epoch_minute, duration))
    }
}

/// Free-function form of [`Event::from_input_line`].
pub fn parse_line(line: &str, policy: &TimeZonePolicy) -> Result<Event, ParseError> {
    Event::from_input_line(line, policy)
}

/// Epoch seconds with the fraction truncated toward zero, so a pre-epoch
/// instant like `-60.5s` counts as `-60s` before minutes are floored.
fn whole_seconds(timestamp: &DateTime<FixedOffset>) -> i64 {
    let secs = timestamp.timestamp();
    if secs < 0 && timestamp.timestamp_subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// Parse an ISO-8601 timestamp into an absolute instant.
pub fn parse_timestamp(
    value: &str,
    policy: &TimeZonePolicy,
) -> Result<DateTime<FixedOffset>, ParseError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt);
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| ParseError::InvalidTimestamp {
            value: value.to_string(),
        })?;

    policy
        .interpret_naive(&naive)
        .ok_or_else(|| ParseError::OutOfRange {
            value: value.to_string(),
            zone: policy.to_string(),
        })
}
