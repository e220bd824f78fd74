//! Calendar arithmetic in German local time.
//!
//! "Local" in this crate always means `Europe/Berlin`, including its full
//! history of daylight-saving transitions. The zone table is compiled into
//! `chrono-tz`, so it is static and shared by every caller without locking.
//!
//! All operations take an anchored instant (see [`AsInstant`]) and return
//! an instant in UTC. Day-level operations step over *local calendar days*,
//! not fixed durations: the distance between German midnight and German
//! 06:00 is 5 hours on the spring-forward day and 7 hours on the fall-back
//! day, and a local day lasts 23, 24 or 25 hours.

use chrono::{
    DateTime, Days, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;

use crate::error::{ConversionError, Result};
use crate::instant::AsInstant;

/// The only timezone used for local-time decisions.
pub const GERMAN_TIME: Tz = chrono_tz::Europe::Berlin;

/// Local time at which the gas day starts.
const GAS_DAY_START: NaiveTime = match NaiveTime::from_hms_opt(6, 0, 0) {
    Some(time) => time,
    None => NaiveTime::MIN,
};

/// Half-width of the window searched for the first instant of a local day
/// whose midnight falls into a gap. Wider than any offset Berlin ever had.
const DAY_START_SEARCH_SECS: i64 = 14 * 3600;

// ── Anchor checks ───────────────────────────────────────────────────────────

/// `true` iff the instant is 00:00:00.000 German local time, i.e. the start
/// of an electricity day.
///
/// # Errors
///
/// [`ConversionError::InvalidInput`] if the input has no UTC offset.
///
/// # Examples
///
/// ```
/// use mako_datetime::is_local_midnight;
///
/// assert!(is_local_midnight("2022-12-31T23:00:00Z").unwrap());
/// assert!(!is_local_midnight("2022-06-15T23:00:00Z").unwrap());
/// ```
pub fn is_local_midnight<T: AsInstant + ?Sized>(instant: &T) -> Result<bool> {
    Ok(is_local_time(instant.as_instant()?, NaiveTime::MIN))
}

/// `true` iff the instant is 06:00:00.000 German local time, i.e. the start
/// of a gas day.
///
/// # Errors
///
/// [`ConversionError::InvalidInput`] if the input has no UTC offset.
pub fn is_local_6am<T: AsInstant + ?Sized>(instant: &T) -> Result<bool> {
    Ok(is_local_time(instant.as_instant()?, GAS_DAY_START))
}

/// [`is_local_midnight`] over optional input: absent in, absent out.
pub fn is_local_midnight_opt<T: AsInstant>(instant: Option<&T>) -> Result<Option<bool>> {
    instant.map(is_local_midnight).transpose()
}

/// [`is_local_6am`] over optional input: absent in, absent out.
pub fn is_local_6am_opt<T: AsInstant>(instant: Option<&T>) -> Result<Option<bool>> {
    instant.map(is_local_6am).transpose()
}

// ── Day-start shifts ────────────────────────────────────────────────────────

/// Move a gas-day start (German 06:00) back to German midnight of the same
/// local day.
///
/// # Errors
///
/// [`ConversionError::InvalidInput`] if the input has no UTC offset or is not
/// German 06:00.
///
/// # Examples
///
/// ```
/// use mako_datetime::shift_6am_to_midnight;
///
/// // spring forward: only 5 hours between local midnight and 06:00
/// let midnight = shift_6am_to_midnight("2023-03-26T04:00:00Z").unwrap();
/// assert_eq!(midnight.to_rfc3339(), "2023-03-25T23:00:00+00:00");
/// ```
pub fn shift_6am_to_midnight<T: AsInstant + ?Sized>(instant: &T) -> Result<DateTime<Utc>> {
    let utc = instant.as_instant()?;
    if !is_local_time(utc, GAS_DAY_START) {
        return Err(ConversionError::InvalidInput(format!(
            "{} is not 06:00 German local time",
            utc.to_rfc3339()
        )));
    }
    start_of_local_day(local_date(utc))
}

/// Move German midnight forward to the gas-day start (06:00) of the same
/// local day.
///
/// # Errors
///
/// [`ConversionError::InvalidInput`] if the input has no UTC offset or is not
/// German midnight.
pub fn shift_midnight_to_6am<T: AsInstant + ?Sized>(instant: &T) -> Result<DateTime<Utc>> {
    let utc = instant.as_instant()?;
    if !is_local_time(utc, NaiveTime::MIN) {
        return Err(ConversionError::InvalidInput(format!(
            "{} is not midnight German local time",
            utc.to_rfc3339()
        )));
    }
    from_local(&local_date(utc).and_time(GAS_DAY_START))
}

// ── Calendar steps ──────────────────────────────────────────────────────────

/// Same German wall-clock time on the next local day (23, 24 or 25 hours
/// later).
///
/// # Errors
///
/// [`ConversionError::InvalidInput`] if the input has no UTC offset, or if
/// the wall-clock time does not exist on the next day (it falls into the
/// spring-forward gap).
///
/// # Examples
///
/// ```
/// use mako_datetime::add_local_day;
///
/// let next = add_local_day("2023-12-31T23:00:00Z").unwrap();
/// assert_eq!(next.to_rfc3339(), "2024-01-01T23:00:00+00:00");
/// ```
pub fn add_local_day<T: AsInstant + ?Sized>(instant: &T) -> Result<DateTime<Utc>> {
    let local = to_local(instant.as_instant()?);
    let shifted = local
        .checked_add_days(Days::new(1))
        .ok_or_else(|| out_of_range(&local))?;
    from_local(&shifted)
}

/// Same German wall-clock time on the previous local day.
///
/// # Errors
///
/// As for [`add_local_day`].
pub fn subtract_local_day<T: AsInstant + ?Sized>(instant: &T) -> Result<DateTime<Utc>> {
    let local = to_local(instant.as_instant()?);
    let shifted = local
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| out_of_range(&local))?;
    from_local(&shifted)
}

/// Floor to German midnight of the same local day.
///
/// If midnight occurred twice that day the earlier one is returned; if it
/// never occurred, the first instant of the local day is.
///
/// # Errors
///
/// [`ConversionError::InvalidInput`] if the input has no UTC offset.
pub fn strip_time<T: AsInstant + ?Sized>(instant: &T) -> Result<DateTime<Utc>> {
    let utc = instant.as_instant()?;
    start_of_local_day(local_date(utc))
}

// ── Internal helpers ────────────────────────────────────────────────────────

/// German wall-clock time of an instant.
fn to_local(utc: DateTime<Utc>) -> NaiveDateTime {
    utc.with_timezone(&GERMAN_TIME).naive_local()
}

fn local_date(utc: DateTime<Utc>) -> NaiveDate {
    to_local(utc).date()
}

/// Local wall-clock time equals `anchor` to the millisecond.
fn is_local_time(utc: DateTime<Utc>, anchor: NaiveTime) -> bool {
    let local = to_local(utc);
    local.hour() == anchor.hour()
        && local.minute() == anchor.minute()
        && local.second() == anchor.second()
        && local.nanosecond() / 1_000_000 == anchor.nanosecond() / 1_000_000
}

/// Earliest instant whose German date is `date`.
fn start_of_local_day(date: NaiveDate) -> Result<DateTime<Utc>> {
    match GERMAN_TIME.from_local_datetime(&date.and_time(NaiveTime::MIN)) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => first_instant_after_gap(date),
    }
}

/// Midnight was skipped by a transition; the day starts at that transition.
/// Offsets are whole seconds, so a search over seconds finds it exactly.
fn first_instant_after_gap(date: NaiveDate) -> Result<DateTime<Utc>> {
    let midnight = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    let mut before = midnight - DAY_START_SEARCH_SECS;
    let mut after = midnight + DAY_START_SEARCH_SECS;
    while after - before > 1 {
        let mid = before + (after - before) / 2;
        if local_date(utc_from_secs(mid, date)?) < date {
            before = mid;
        } else {
            after = mid;
        }
    }
    utc_from_secs(after, date)
}

fn utc_from_secs(secs: i64, date: NaiveDate) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        ConversionError::InvalidInput(format!("start of local day {date} is out of range"))
    })
}

/// Resolve a German wall-clock time to UTC for the calendar steps.
///
/// In the fall-back hour the wall-clock time occurs twice; standard time
/// (the later instant) wins. In the spring-forward gap it does not occur
/// at all.
fn from_local(local: &NaiveDateTime) -> Result<DateTime<Utc>> {
    match GERMAN_TIME.from_local_datetime(local) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(_, standard) => Ok(standard.with_timezone(&Utc)),
        LocalResult::None => Err(ConversionError::InvalidInput(format!(
            "{local} does not exist in German local time (daylight saving gap)"
        ))),
    }
}

fn out_of_range(local: &NaiveDateTime) -> ConversionError {
    ConversionError::InvalidInput(format!("{local} cannot be moved by a day"))
}

// ── Tests ───────────────────────────────────────────────────────────────────
