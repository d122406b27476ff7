//! Time utilities: timezone lookup and date-range bounds.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;

/// Which end of a date range a bound is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundSide {
    Start,
    End,
}

/// Parse an IANA timezone name like "America/Chicago".
pub fn parse_timezone(tz: &str) -> Result<Tz> {
    tz.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

/// Parse a range bound given as RFC 3339 or a bare `YYYY-MM-DD` date.
///
/// A bare date covers the whole UTC day: start bounds snap to 00:00:00 and
/// end bounds to the last nanosecond of the day, so both ends are inclusive.
pub fn parse_date_bound(s: &str, side: BoundSide) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("invalid date '{s}': {e}"))?;

    let start = date.and_time(NaiveTime::MIN).and_utc();
    Ok(match side {
        BoundSide::Start => start,
        BoundSide::End => start + TimeDelta::days(1) - TimeDelta::nanoseconds(1),
    })
}

/// `now` minus a whole number of days.
pub fn days_before(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now - TimeDelta::days(i64::from(days))
}
