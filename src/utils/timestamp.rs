//! Restricted ISO-8601 timestamp parsing
//!
//! Query bounds are accepted in a single format: `YYYY-MM-DDTHH:MM:SS`,
//! optionally followed by fractional seconds (`.mmm`) and/or a zone marker
//! (`Z`, `+HH:MM`, `-HH:MM`). Fractional seconds and zone markers are
//! tolerated but not interpreted; every accepted value is read as UTC
//! wall-clock time.
//!
//! Years are accepted strictly between [`MIN_YEAR`] and [`MAX_YEAR`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

/// Exclusive lower year bound
pub const MIN_YEAR: u32 = 2000;

/// Exclusive upper year bound
pub const MAX_YEAR: u32 = 2050;

/// Calendar component of a timestamp, used to report which part failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::Year => "Year",
            Component::Month => "Month",
            Component::Day => "Day",
            Component::Hour => "Hour",
            Component::Minute => "Minute",
            Component::Second => "Second",
        };
        f.write_str(name)
    }
}

/// Timestamp parse failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// No `T` between the date and the time
    #[error("Invalid ISO time string '{0}': missing 'T' separator")]
    MissingSeparator(String),

    /// Date portion did not split into year, month and day
    #[error("Invalid ISO timestamp. Invalid date: expected YYYY-MM-DD, got {0} part(s)")]
    InvalidDate(usize),

    /// Time portion did not split into hours, minutes and seconds
    #[error("Invalid ISO timestamp. Invalid time: expected HH:MM:SS, got {0} part(s)")]
    InvalidTime(usize),

    /// A component is not an unsigned decimal integer
    #[error("Invalid ISO timestamp. {component} '{value}' is not a number")]
    NotNumeric { component: Component, value: String },

    /// A component is outside its calendar range (bounds inclusive)
    #[error("{component} should be between {min} and {max}, got {value}")]
    OutOfRange {
        component: Component,
        value: u32,
        min: u32,
        max: u32,
    },
}

impl TimestampError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TimestampError::MissingSeparator(_) => "missing_separator",
            TimestampError::InvalidDate(_) => "invalid_date",
            TimestampError::InvalidTime(_) => "invalid_time",
            TimestampError::NotNumeric { .. } => "not_numeric",
            TimestampError::OutOfRange { .. } => "out_of_range",
        }
    }
}

/// Validated calendar fields of a parsed timestamp
///
/// Only [`TimestampParts::parse`] builds values, so every instance holds an
/// in-range date and time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimestampParts {
    year: u32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    instant: NaiveDateTime,
}

impl TimestampParts {
    /// Parse and validate a timestamp string
    pub fn parse(input: &str) -> Result<Self, TimestampError> {
        let (date, rest) = input
            .split_once('T')
            .ok_or_else(|| TimestampError::MissingSeparator(input.to_string()))?;

        let date_fields: Vec<&str> = date.split('-').collect();
        if date_fields.len() != 3 {
            return Err(TimestampError::InvalidDate(date_fields.len()));
        }

        let year = parse_component(Component::Year, date_fields[0])?;
        let month = parse_component(Component::Month, date_fields[1])?;
        let day = parse_component(Component::Day, date_fields[2])?;

        check_range(Component::Year, year, MIN_YEAR + 1, MAX_YEAR - 1)?;
        check_range(Component::Month, month, 1, 12)?;
        check_range(Component::Day, day, 1, days_in_month(year, month))?;

        // Everything from the fractional marker or zone marker on is ignored.
        let time = rest
            .split(['.', 'Z', 'z', '+', '-'])
            .next()
            .unwrap_or_default();

        let time_fields: Vec<&str> = time.split(':').collect();
        if time_fields.len() != 3 {
            return Err(TimestampError::InvalidTime(time_fields.len()));
        }

        let hour = parse_component(Component::Hour, time_fields[0])?;
        let minute = parse_component(Component::Minute, time_fields[1])?;
        let second = parse_component(Component::Second, time_fields[2])?;

        check_range(Component::Hour, hour, 0, 23)?;
        check_range(Component::Minute, minute, 0, 59)?;
        check_range(Component::Second, second, 0, 59)?;

        let instant = NaiveDate::from_ymd_opt(year as i32, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, second))
            .ok_or(TimestampError::OutOfRange {
                component: Component::Day,
                value: day,
                min: 1,
                max: days_in_month(year, month),
            })?;

        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            instant,
        })
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn second(&self) -> u32 {
        self.second
    }

    /// Date portion as `Y-M-D`, without zero padding
    pub fn date_portion(&self) -> String {
        format!("{}-{}-{}", self.year, self.month, self.day)
    }

    /// Time portion as `H:M:S`, without zero padding
    pub fn time_portion(&self) -> String {
        format!("{}:{}:{}", self.hour, self.minute, self.second)
    }

    /// The calendar date combined with its own time of day, in UTC
    pub fn to_utc(&self) -> DateTime<Utc> {
        self.instant.and_utc()
    }
}

impl FromStr for TimestampParts {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TimestampParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.instant.format("%Y-%m-%dT%H:%M:%S"))
    }
}

/// Gregorian leap year rule
pub fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-12) of `year`; 0 for an invalid month
pub fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

fn parse_component(component: Component, value: &str) -> Result<u32, TimestampError> {
    let not_numeric = || TimestampError::NotNumeric {
        component,
        value: value.to_string(),
    };

    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_numeric());
    }

    value.parse().map_err(|_| not_numeric())
}

fn check_range(component: Component, value: u32, min: u32, max: u32) -> Result<(), TimestampError> {
    if value < min || value > max {
        return Err(TimestampError::OutOfRange {
            component,
            value,
            min,
            max,
        });
    }
    Ok(())
}
