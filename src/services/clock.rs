use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, TimeZone, Timelike};

use crate::models::search::SearchError;

/// ISO-8601 extended forms with an offset that RFC 3339 does not cover.
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M%#z"];

/// Offset-less local forms; read as venue wall-clock time.
const LOCAL_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse an ISO-8601 instant. RFC 3339 first, then minute precision, then a
/// local date-time without offset, which is taken to be in `venue`.
pub fn parse_reference_timestamp(
    raw: &str,
    venue: &FixedOffset,
) -> Result<DateTime<FixedOffset>, SearchError> {
    let trimmed = raw.trim();
    let rfc3339_err = match DateTime::parse_from_rfc3339(trimmed) {
        Ok(at) => return Ok(at),
        Err(e) => e,
    };

    if let Some(at) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(trimmed, fmt).ok())
    {
        return Ok(at);
    }

    LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .and_then(|local| venue.from_local_datetime(&local).single())
        .ok_or_else(|| SearchError::MalformedTimestamp(format!("{raw:?}: {rfc3339_err}")))
}

/// Fixed offset the opening hours are authored in (JST by default).
pub fn venue_offset(offset_minutes: i32) -> anyhow::Result<FixedOffset> {
    FixedOffset::east_opt(offset_minutes * 60)
        .ok_or_else(|| anyhow::anyhow!("invalid venue UTC offset: {offset_minutes} minutes"))
}

/// A point in the venue's week: day 0 = Sunday, minute 0..=1439.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceInstant {
    pub day_of_week: u8,
    pub minute_of_day: u16,
}

impl ReferenceInstant {
    pub fn new(day_of_week: u8, hour: u16, minute: u16) -> Self {
        debug_assert!(day_of_week < 7 && hour < 24 && minute < 60);
        Self {
            day_of_week,
            minute_of_day: hour * 60 + minute,
        }
    }

    /// Normalize `instant` into the venue frame, then decompose it.
    pub fn in_venue_frame<Tz: TimeZone>(instant: &DateTime<Tz>, venue: &FixedOffset) -> Self {
        let local = instant.with_timezone(venue);
        Self {
            day_of_week: local.weekday().num_days_from_sunday() as u8,
            minute_of_day: (local.hour() * 60 + local.minute()) as u16,
        }
    }

    pub fn previous_day(self) -> u8 {
        (self.day_of_week + 6) % 7
    }
}
