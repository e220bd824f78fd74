//! Converting a timestamp from one meaning to another.
//!
//! [`convert`] applies a fixed sequence of optional steps:
//!
//! 1. floor to German midnight if the source carries no time of day;
//! 2. stop here if source and target mean the same thing;
//! 3. gas only: move between gas-day start (06:00) and midnight;
//! 4. end dates only: move one local day between inclusive and exclusive;
//! 5. floor to German midnight if the target carries no time of day.
//!
//! The gas-day shift runs before the end-date shift so that the day step
//! already operates on the target's day boundary.

use chrono::{DateTime, Utc};
use log::{debug, trace};

use crate::error::Result;
use crate::german_time::{
    add_local_day, is_local_6am, is_local_midnight, shift_6am_to_midnight, shift_midnight_to_6am,
    strip_time, subtract_local_day,
};
use crate::instant::AsInstant;
use crate::meaning::{Boundary, ConversionPlan, EndKind, Sector, ValidatedPlan};

/// Convert `instant`, described by `plan.source`, into the meaning of
/// `plan.target`.
///
/// # Errors
///
/// - [`ConversionError::InvalidConfiguration`](crate::ConversionError::InvalidConfiguration)
///   if `plan` is not valid.
/// - [`ConversionError::InvalidInput`](crate::ConversionError::InvalidInput)
///   if `instant` has no UTC offset, or a day step lands in the
///   spring-forward gap.
///
/// # Examples
///
/// ```
/// use mako_datetime::{convert, ConversionPlan, EndKind, TimestampMeaning};
///
/// // end of the last gas day of 2022, handed to a system that ignores the
/// // gas day and stores end dates inclusively
/// let plan = ConversionPlan {
///     source: TimestampMeaning::end_date(EndKind::Exclusive).gas(true),
///     target: TimestampMeaning::end_date(EndKind::Inclusive).gas(false),
/// };
/// let converted = convert("2023-01-01T05:00:00Z", &plan).unwrap();
/// assert_eq!(converted.to_rfc3339(), "2022-12-30T23:00:00+00:00");
/// ```
pub fn convert<T: AsInstant + ?Sized>(
    instant: &T,
    plan: &ConversionPlan,
) -> Result<DateTime<Utc>> {
    let plan = ValidatedPlan::try_from(plan)?;
    convert_validated(instant, &plan)
}

/// [`convert`] for a plan that has already been validated.
pub fn convert_validated<T: AsInstant + ?Sized>(
    instant: &T,
    plan: &ValidatedPlan,
) -> Result<DateTime<Utc>> {
    let mut current = instant.as_instant()?;
    let source = plan.source();
    let target = plan.target();
    trace!("converting {current} from {source:?} to {target:?}");

    if source.strip_time {
        current = strip_time(&current)?;
        debug!("stripped source time of day: {current}");
    }

    if source == target {
        debug!("source and target meaning are equal, nothing to convert");
        return Ok(current);
    }

    if let (Sector::Gas { day_aware: from }, Sector::Gas { day_aware: to }) =
        (source.sector, target.sector)
    {
        current = shift_gas_day(current, from, to)?;
    }

    if let (Boundary::End(from), Boundary::End(to)) = (source.boundary, target.boundary) {
        current = match (from, to) {
            (EndKind::Inclusive, EndKind::Exclusive) => {
                let next = add_local_day(&current)?;
                debug!("inclusive -> exclusive end: {current} -> {next}");
                next
            }
            (EndKind::Exclusive, EndKind::Inclusive) => {
                let prev = subtract_local_day(&current)?;
                debug!("exclusive -> inclusive end: {current} -> {prev}");
                prev
            }
            _ => current,
        };
    }

    if target.strip_time {
        current = strip_time(&current)?;
        debug!("stripped target time of day: {current}");
    }

    Ok(current)
}

/// Move between gas-day start and midnight when the day awareness changes.
///
/// Instants that are at neither boundary pass through unchanged; they are
/// taken to be deliberate non-boundary values.
fn shift_gas_day(
    current: DateTime<Utc>,
    from_aware: bool,
    to_aware: bool,
) -> Result<DateTime<Utc>> {
    match (from_aware, to_aware) {
        (true, false) if is_local_6am(&current)? => {
            let shifted = shift_6am_to_midnight(&current)?;
            debug!("gas day start -> midnight: {current} -> {shifted}");
            Ok(shifted)
        }
        (false, true) if is_local_midnight(&current)? => {
            let shifted = shift_midnight_to_6am(&current)?;
            debug!("midnight -> gas day start: {current} -> {shifted}");
            Ok(shifted)
        }
        (true, false) | (false, true) => {
            debug!("{current} is not at a day boundary, gas day shift skipped");
            Ok(current)
        }
        _ => Ok(current),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionError;
    use crate::meaning::TimestampMeaning;
    use chrono::NaiveDate;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn plan(source: TimestampMeaning, target: TimestampMeaning) -> ConversionPlan {
        ConversionPlan { source, target }
    }

    fn assert_converts(cases: &[(&str, &str)], plan: &ConversionPlan) {
        for (input, expected) in cases {
            assert_eq!(convert(*input, plan).unwrap(), utc(expected), "case: {input}");
        }
    }

    // ── validation & input ──────────────────────────────────────────────

    #[test]
    fn test_convert_rejects_cross_sector_plan() {
        let p = plan(TimestampMeaning::point(), TimestampMeaning::point().gas(true));
        let err = convert("2022-01-01T00:00:00Z", &p).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidConfiguration(_)), "got: {err:?}");
    }

    #[test]
    fn test_convert_rejects_start_to_end_plan() {
        let p = plan(
            TimestampMeaning::point(),
            TimestampMeaning::end_date(EndKind::Exclusive),
        );
        let err = convert("2022-01-01T00:00:00Z", &p).unwrap_err();
        assert!(err.to_string().contains("start and end dates"), "got: {err}");
    }

    #[test]
    fn test_convert_rejects_inconsistent_meaning() {
        let broken = TimestampMeaning {
            is_end_date: true,
            ..TimestampMeaning::point()
        };
        let p = plan(broken.clone(), broken);
        assert!(matches!(
            convert("2022-01-01T00:00:00Z", &p),
            Err(ConversionError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_convert_checks_plan_before_input() {
        let p = plan(TimestampMeaning::point(), TimestampMeaning::point().gas(false));
        assert!(matches!(
            convert("2022-01-01T00:00:00", &p),
            Err(ConversionError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_convert_rejects_unanchored_input() {
        let p = plan(
            TimestampMeaning::point().gas(true),
            TimestampMeaning::point().gas(false),
        );
        let naive = NaiveDate::from_ymd_opt(2023, 6, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        assert!(matches!(convert(&naive, &p), Err(ConversionError::InvalidInput(_))));
        for input in ["2023-06-01T06:00:00", "2023-06-01T06:00", "2023-06-01 06:00:00"] {
            assert!(
                matches!(convert(input, &p), Err(ConversionError::InvalidInput(_))),
                "case: {input}"
            );
        }
    }

    // ── identity ────────────────────────────────────────────────────────

    #[test]
    fn test_convert_identity_returns_input() {
        let m = TimestampMeaning::end_date(EndKind::Inclusive).gas(true);
        let p = plan(m.clone(), m);
        assert_eq!(
            convert("2023-06-01T13:14:15Z", &p).unwrap(),
            utc("2023-06-01T13:14:15Z")
        );
    }

    #[test]
    fn test_convert_identity_after_source_strip() {
        let m = TimestampMeaning::point().stripped();
        let p = plan(m.clone(), m);
        assert_eq!(
            convert("2023-06-01T13:14:15Z", &p).unwrap(),
            utc("2023-05-31T22:00:00Z")
        );
    }

    // ── gas day awareness ───────────────────────────────────────────────

    #[test]
    fn test_gas_day_aware_to_unaware() {
        let p = plan(
            TimestampMeaning::point().gas(true),
            TimestampMeaning::point().gas(false),
        );
        assert_converts(
            &[
                ("2023-06-01T04:00:00Z", "2023-05-31T22:00:00Z"),
                ("2023-12-01T05:00:00Z", "2023-11-30T23:00:00Z"),
            ],
            &p,
        );
    }

    #[test]
    fn test_gas_day_unaware_to_aware() {
        let p = plan(
            TimestampMeaning::point().gas(false),
            TimestampMeaning::point().gas(true),
        );
        assert_converts(
            &[
                ("2023-05-31T22:00:00Z", "2023-06-01T04:00:00Z"),
                ("2023-11-30T23:00:00Z", "2023-12-01T05:00:00Z"),
            ],
            &p,
        );
    }

    #[test]
    fn test_gas_day_shift_roundtrip() {
        let p = plan(
            TimestampMeaning::point().gas(true),
            TimestampMeaning::point().gas(false),
        );
        let there = convert("2023-06-01T04:00:00Z", &p).unwrap();
        assert_eq!(there, utc("2023-05-31T22:00:00Z"));
        assert_eq!(convert(&there, &p.invert()).unwrap(), utc("2023-06-01T04:00:00Z"));
    }

    #[test]
    fn test_gas_day_off_boundary_passes_through() {
        let p = plan(
            TimestampMeaning::point().gas(true),
            TimestampMeaning::point().gas(false),
        );
        assert_eq!(
            convert("2023-06-01T09:30:00Z", &p).unwrap(),
            utc("2023-06-01T09:30:00Z")
        );
        assert_eq!(
            convert("2023-06-01T09:30:00Z", &p.invert()).unwrap(),
            utc("2023-06-01T09:30:00Z")
        );
    }

    #[test]
    fn test_electricity_ignores_gas_rules() {
        let p = plan(
            TimestampMeaning::end_date(EndKind::Exclusive),
            TimestampMeaning::end_date(EndKind::Exclusive).stripped(),
        );
        // no gas day shift for electricity, only the strip applies
        assert_eq!(
            convert("2023-06-01T04:00:00Z", &p).unwrap(),
            utc("2023-05-31T22:00:00Z")
        );
    }

    // ── end date kind ───────────────────────────────────────────────────

    #[test]
    fn test_electricity_inclusive_to_exclusive_end() {
        let p = plan(
            TimestampMeaning::end_date(EndKind::Inclusive),
            TimestampMeaning::end_date(EndKind::Exclusive),
        );
        assert_converts(
            &[
                ("2023-05-30T22:00:00Z", "2023-05-31T22:00:00Z"),
                ("2023-05-31T22:00:00Z", "2023-06-01T22:00:00Z"),
                ("2023-12-31T23:00:00Z", "2024-01-01T23:00:00Z"),
                ("2023-12-01T23:00:00Z", "2023-12-02T23:00:00Z"),
            ],
            &p,
        );
    }

    #[test]
    fn test_electricity_exclusive_to_inclusive_end() {
        let p = plan(
            TimestampMeaning::end_date(EndKind::Exclusive),
            TimestampMeaning::end_date(EndKind::Inclusive),
        );
        assert_converts(
            &[
                ("2024-01-01T23:00:00Z", "2023-12-31T23:00:00Z"),
                // 23-hour day
                ("2023-03-26T22:00:00Z", "2023-03-25T23:00:00Z"),
            ],
            &p,
        );
    }

    #[test]
    fn test_gas_inclusive_to_exclusive_end() {
        let p = plan(
            TimestampMeaning::end_date(EndKind::Inclusive).gas(true),
            TimestampMeaning::end_date(EndKind::Exclusive).gas(true),
        );
        assert_converts(
            &[
                ("2023-05-30T04:00:00Z", "2023-05-31T04:00:00Z"),
                ("2023-12-30T05:00:00Z", "2023-12-31T05:00:00Z"),
                ("2023-12-01T05:00:00Z", "2023-12-02T05:00:00Z"),
            ],
            &p,
        );
    }

    // ── combined ────────────────────────────────────────────────────────

    #[test]
    fn test_gas_inclusive_to_exclusive_and_make_day_aware() {
        let p = plan(
            TimestampMeaning::end_date(EndKind::Inclusive).gas(false),
            TimestampMeaning::end_date(EndKind::Exclusive).gas(true),
        );
        assert_converts(
            &[
                ("2023-05-30T22:00:00Z", "2023-06-01T04:00:00Z"),
                ("2023-03-25T23:00:00Z", "2023-03-27T04:00:00Z"),
                ("2022-10-29T22:00:00Z", "2022-10-31T05:00:00Z"),
            ],
            &p,
        );
    }

    #[test]
    fn test_gas_contract_end_to_inclusive_unaware_system() {
        let p = plan(
            TimestampMeaning::end_date(EndKind::Exclusive).gas(true),
            TimestampMeaning::end_date(EndKind::Inclusive).gas(false),
        );
        let offset = chrono::FixedOffset::east_opt(0).unwrap();
        let from_message = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(5, 0, 0)
            .unwrap()
            .and_local_timezone(offset)
            .unwrap();
        assert_eq!(convert(&from_message, &p).unwrap(), utc("2022-12-30T23:00:00Z"));
    }

    #[test]
    fn test_strip_on_both_sides() {
        let p = plan(
            TimestampMeaning::end_date(EndKind::Inclusive).stripped(),
            TimestampMeaning::end_date(EndKind::Exclusive).stripped(),
        );
        // local 2023-06-15 17:45 -> floor -> next local day
        assert_eq!(
            convert("2023-06-15T15:45:00Z", &p).unwrap(),
            utc("2023-06-15T22:00:00Z")
        );
    }

    #[test]
    fn test_target_strip_after_gas_shift() {
        let p = plan(
            TimestampMeaning::point().gas(false),
            TimestampMeaning::point().gas(true).stripped(),
        );
        // midnight -> 06:00 -> floored back to midnight
        assert_eq!(
            convert("2023-05-31T22:00:00Z", &p).unwrap(),
            utc("2023-05-31T22:00:00Z")
        );
    }

    #[test]
    fn test_convert_validated_matches_convert() {
        let p = plan(
            TimestampMeaning::end_date(EndKind::Inclusive).gas(false),
            TimestampMeaning::end_date(EndKind::Exclusive).gas(true),
        );
        let validated = ValidatedPlan::try_from(&p).unwrap();
        assert_eq!(
            convert_validated("2023-05-30T22:00:00Z", &validated).unwrap(),
            convert("2023-05-30T22:00:00Z", &p).unwrap()
        );
    }
}
