//! Anchoring caller input to an absolute instant.
//!
//! Every operation in this crate works on instants with a known UTC offset.
//! [`AsInstant`] is the seam where caller input is checked: a
//! `DateTime<Tz>` is always anchored, a `NaiveDateTime` never is, and text
//! is parsed as RFC 3339.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::error::{ConversionError, Result};

/// Offset-less ISO 8601 forms recognised as unanchored local values.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Input that may or may not denote an absolute instant.
pub trait AsInstant {
    /// The instant in UTC.
    ///
    /// # Errors
    ///
    /// [`ConversionError::InvalidInput`] if the value is a wall-clock time
    /// without a UTC offset.
    fn as_instant(&self) -> Result<DateTime<Utc>>;
}

impl<Tz: TimeZone> AsInstant for DateTime<Tz> {
    fn as_instant(&self) -> Result<DateTime<Utc>> {
        Ok(self.with_timezone(&Utc))
    }
}

impl AsInstant for NaiveDateTime {
    fn as_instant(&self) -> Result<DateTime<Utc>> {
        Err(unanchored(self))
    }
}

impl AsInstant for str {
    fn as_instant(&self) -> Result<DateTime<Utc>> {
        parse_instant(self)
    }
}

impl AsInstant for String {
    fn as_instant(&self) -> Result<DateTime<Utc>> {
        parse_instant(self)
    }
}

/// Parse an RFC 3339 string into `DateTime<Utc>`.
///
/// A well-formed ISO 8601 datetime without an offset (`"2023-01-01T00:00:00"`,
/// `"2023-01-01 00:00"`) is rejected with [`ConversionError::InvalidInput`];
/// anything else that does not parse is [`ConversionError::InvalidDatetime`].
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    let err = match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => return Ok(dt.with_timezone(&Utc)),
        Err(e) => e,
    };
    match NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        Some(naive) => Err(unanchored(&naive)),
        None => Err(ConversionError::InvalidDatetime(format!("'{s}': {err}"))),
    }
}

fn unanchored(naive: &NaiveDateTime) -> ConversionError {
    ConversionError::InvalidInput(format!(
        "'{naive}' has no UTC offset; only anchored instants can be converted"
    ))
}
