use crate::{Result, TimelineError};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::str::FromStr;
use tracing::debug;

/// Optional UTC bounds applied to the event page fetcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Build a range from user input. Empty strings mean "unbounded".
    ///
    /// A date-only start is the start of that day; a date-only end covers the
    /// whole day.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let start = match start.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => Some(parse_bound(s, false)?),
            None => None,
        };
        let end = match end.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => Some(parse_bound(s, true)?),
            None => None,
        };

        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(TimelineError::InvalidDate(format!(
                    "start date {} is after end date {}",
                    s, e
                )));
            }
        }

        Ok(Self { start, end })
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| at >= s) && self.end.map_or(true, |e| at <= e)
    }
}

fn parse_bound(input: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    let date = NaiveDate::from_str(input)
        .map_err(|_| TimelineError::InvalidDate(format!("unrecognised date '{}'", input)))?;

    let day_start = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| TimelineError::InvalidDate(format!("invalid day '{}'", input)))?;
    let bound = if end_of_day {
        Utc.from_utc_datetime(&day_start) + Duration::days(1) - Duration::seconds(1)
    } else {
        Utc.from_utc_datetime(&day_start)
    };

    debug!("Date bound {} => {} (end_of_day={})", input, bound, end_of_day);
    Ok(bound)
}

/// Parse a marketplace timestamp. The feed omits the offset and is always UTC.
pub fn parse_event_timestamp(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| TimelineError::InvalidDate(format!("'{}': {}", input, e)))
}
