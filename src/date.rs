use crate::errors::{JaxpError, Result};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use std::fmt::{self, Write};

/// `01/02/2024`
pub const FORMAT_SHORT: &str = "%d/%m/%Y";
/// `01/02/2024 10:30:00`
pub const FORMAT_DATETIME: &str = "%d/%m/%Y %H:%M:%S";
/// `10:30:00`
pub const FORMAT_TIME: &str = "%H:%M:%S";

const DATETIME_INPUTS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"];
const DATE_INPUTS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// A calendar date and wall-clock time in a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateValue {
    inner: DateTime<FixedOffset>,
}

impl DateValue {
    pub fn now(offset: FixedOffset) -> Self {
        Self {
            inner: Utc::now().with_timezone(&offset),
        }
    }

    pub fn from_epoch(seconds: i64, offset: FixedOffset) -> Result<Self> {
        let inner = offset
            .timestamp_opt(seconds, 0)
            .single()
            .ok_or_else(|| JaxpError::invalid_argument(&format!("timestamp {} out of range", seconds)))?;
        Ok(Self { inner })
    }

    pub fn from_parts(
        day: u32,
        month: u32,
        year: i32,
        hour: u32,
        minute: u32,
        second: u32,
        offset: FixedOffset,
    ) -> Result<Self> {
        let inner = offset
            .with_ymd_and_hms(year, month, day, hour, minute, second)
            .single()
            .ok_or_else(|| {
                JaxpError::invalid_argument(&format!(
                    "invalid date {:02}/{:02}/{} {:02}:{:02}:{:02}",
                    day, month, year, hour, minute, second
                ))
            })?;
        Ok(Self { inner })
    }

    /// Accepts `YYYY-MM-DD[ HH:MM:SS]`, `DD/MM/YYYY[ HH:MM:SS]` and RFC 3339.
    /// Values without an explicit offset are read in `offset`.
    pub fn parse(text: &str, offset: FixedOffset) -> Result<Self> {
        let text = text.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
            return Ok(Self {
                inner: parsed.with_timezone(&offset),
            });
        }

        let naive = DATETIME_INPUTS
            .iter()
            .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
            .or_else(|| {
                DATE_INPUTS
                    .iter()
                    .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .ok_or_else(|| JaxpError::invalid_argument(&format!("unrecognised date '{}'", text)))?;

        let inner = offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| JaxpError::invalid_argument(&format!("ambiguous date '{}'", text)))?;
        Ok(Self { inner })
    }

    pub fn to_epoch(&self) -> i64 {
        self.inner.timestamp()
    }

    /// Renders with a strftime pattern such as [`FORMAT_SHORT`].
    pub fn format(&self, pattern: &str) -> Result<String> {
        let mut out = String::new();
        write!(out, "{}", self.inner.format(pattern))
            .map_err(|_| JaxpError::invalid_argument(&format!("bad date pattern '{}'", pattern)))?;
        Ok(out)
    }

    pub fn day(&self) -> u32 {
        self.inner.day()
    }

    pub fn month(&self) -> u32 {
        self.inner.month()
    }

    pub fn year(&self) -> i32 {
        self.inner.year()
    }

    pub fn hour(&self) -> u32 {
        self.inner.hour()
    }

    pub fn minute(&self) -> u32 {
        self.inner.minute()
    }

    pub fn second(&self) -> u32 {
        self.inner.second()
    }

    pub fn offset(&self) -> FixedOffset {
        *self.inner.offset()
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.format(FORMAT_DATETIME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn buenos_aires() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    #[test]
    fn test_from_parts() {
        let date = DateValue::from_parts(1, 2, 2024, 10, 30, 0, utc()).unwrap();
        assert_eq!(date.to_epoch(), 1706783400);
        assert_eq!(date.format(FORMAT_DATETIME).unwrap(), "01/02/2024 10:30:00");
        assert_eq!(date.format(FORMAT_SHORT).unwrap(), "01/02/2024");
        assert_eq!(date.format(FORMAT_TIME).unwrap(), "10:30:00");
        assert_eq!((date.day(), date.month(), date.year()), (1, 2, 2024));
        assert_eq!((date.hour(), date.minute(), date.second()), (10, 30, 0));

        assert!(DateValue::from_parts(31, 2, 2024, 0, 0, 0, utc()).is_err());
        assert!(DateValue::from_parts(1, 1, 2024, 24, 0, 0, utc()).is_err());
    }

    #[test]
    fn test_parse_inputs() {
        let iso = DateValue::parse("2024-02-01 10:30:00", buenos_aires()).unwrap();
        assert_eq!(iso.to_epoch(), 1706794200);

        let local = DateValue::parse("01/02/2024 10:30:00", buenos_aires()).unwrap();
        assert_eq!(local, iso);

        let rfc = DateValue::parse("2024-02-01T13:30:00Z", buenos_aires()).unwrap();
        assert_eq!(rfc.to_epoch(), iso.to_epoch());
        assert_eq!(rfc.hour(), 10);

        let day_only = DateValue::parse("2024-02-01", utc()).unwrap();
        assert_eq!(day_only.format(FORMAT_DATETIME).unwrap(), "01/02/2024 00:00:00");

        assert!(DateValue::parse("next tuesday", utc()).is_err());
    }

    #[test]
    fn test_from_epoch_uses_offset() {
        let date = DateValue::from_epoch(1700000000, buenos_aires()).unwrap();
        assert_eq!(date.to_string(), "14/11/2023 19:13:20");
        assert_eq!(date.offset(), buenos_aires());
        assert_eq!(date.to_epoch(), 1700000000);
    }

    #[test]
    fn test_bad_pattern_is_an_error() {
        let date = DateValue::from_epoch(0, utc()).unwrap();
        assert!(date.format("%Q").is_err());
        assert_eq!(date.format("%Y").unwrap(), "1970");
    }

    #[test]
    fn test_now_is_recent() {
        let now = DateValue::now(utc());
        assert!(now.year() >= 2024);
    }
}
