//! Calendar-day arithmetic for the daily reset.
//!
//! Visit dates are plain `YYYY-MM-DD` strings with no timezone recorded.
//! The reconciler compares them by string equality; this module only turns
//! "now" into such a string and steps a string back by one day.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};

use crate::error::{Result, StudyGateError};

/// Format used for stored visit dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Which clock decides where midnight falls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimezonePolicy {
    /// The device's local timezone.
    Local,
    /// UTC.
    Utc,
    /// A fixed offset from UTC.
    Fixed(FixedOffset),
}

impl TimezonePolicy {
    /// Parse `"local"`, `"utc"`, or a `±HH:MM` offset.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        match value.to_lowercase().as_str() {
            "local" => return Some(TimezonePolicy::Local),
            "utc" | "z" => return Some(TimezonePolicy::Utc),
            _ => {}
        }

        let (sign, rest) = match *value.as_bytes().first()? {
            b'+' => (1, &value[1..]),
            b'-' => (-1, &value[1..]),
            _ => return None,
        };
        let (hours, minutes) = rest.split_once(':')?;
        if hours.len() != 2 || minutes.len() != 2 {
            return None;
        }
        let hours: i32 = hours.parse().ok()?;
        let minutes: i32 = minutes.parse().ok()?;
        if hours > 14 || minutes > 59 {
            return None;
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).map(TimezonePolicy::Fixed)
    }

    /// Calendar date of `now` under this policy.
    pub fn date_of(&self, now: DateTime<Utc>) -> NaiveDate {
        match self {
            TimezonePolicy::Local => now.with_timezone(&Local).date_naive(),
            TimezonePolicy::Utc => now.date_naive(),
            TimezonePolicy::Fixed(offset) => now.with_timezone(offset).date_naive(),
        }
    }

    /// Today's visit-date string.
    pub fn today(&self) -> String {
        format_date(self.date_of(Utc::now()))
    }
}

/// Render a date as a visit-date string.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a visit-date string.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| StudyGateError::invalid_date(value))
}

/// The visit-date string for the day before `today`.
pub fn previous_day(today: &str) -> Result<String> {
    let date = parse_date(today)?;
    date.pred_opt()
        .map(format_date)
        .ok_or_else(|| StudyGateError::invalid_date(today))
}
