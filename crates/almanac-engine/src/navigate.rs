//! Weekday navigation and batch query evaluation.
//!
//! Whole-day arithmetic happens on the naive calendar — no zone, no offset —
//! and the original time-of-day is recombined afterwards through the offset
//! resolver. That keeps "next Friday" exactly N calendar days away even when
//! a DST transition sits in between.

use std::fmt;

use chrono::{Datelike, Duration, Weekday};
use serde::{Deserialize, Serialize};

use crate::boundary::{self, weekday_index, Period, WeekStart};
use crate::error::{AlmanacError, Result};
use crate::instant::Instant;
use crate::zone::{self, ZoneId};

/// Parse a weekday name, full or abbreviated, case-insensitively.
///
/// # Errors
///
/// Returns [`AlmanacError::InvalidWeekday`] for anything else.
pub fn parse_weekday(s: &str) -> Result<Weekday> {
    match s.trim().to_ascii_lowercase().as_str() {
        "monday" | "mon" => Ok(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Ok(Weekday::Tue),
        "wednesday" | "wed" => Ok(Weekday::Wed),
        "thursday" | "thu" | "thurs" => Ok(Weekday::Thu),
        "friday" | "fri" => Ok(Weekday::Fri),
        "saturday" | "sat" => Ok(Weekday::Sat),
        "sunday" | "sun" => Ok(Weekday::Sun),
        _ => Err(AlmanacError::InvalidWeekday(format!("'{s}'"))),
    }
}

pub(crate) fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

// ── Single-step navigation ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// The next instant strictly after `reference` falling on `target`, as
/// observed in `zone`, keeping the reference's wall-clock time of day.
///
/// When `reference` already falls on `target`, the result is a full week
/// ahead — the day delta substitutes 7 for 0, never the same day.
pub fn next_weekday(
    target: Weekday,
    reference: Instant,
    zone: &ZoneId,
    week_start: WeekStart,
) -> Result<Instant> {
    to_weekday(target, reference, zone, week_start, Direction::Forward)
}

/// Mirror of [`next_weekday`]: the closest strictly-earlier occurrence.
pub fn previous_weekday(
    target: Weekday,
    reference: Instant,
    zone: &ZoneId,
    week_start: WeekStart,
) -> Result<Instant> {
    to_weekday(target, reference, zone, week_start, Direction::Backward)
}

fn to_weekday(
    target: Weekday,
    reference: Instant,
    zone: &ZoneId,
    week_start: WeekStart,
    direction: Direction,
) -> Result<Instant> {
    let local = reference.to_utc()?.with_timezone(&zone.tz());

    // Indices are re-based onto the week start; the difference mod 7 is the
    // same under either convention.
    let current = rebased(local.weekday(), week_start);
    let wanted = rebased(target, week_start);
    let delta = match direction {
        Direction::Forward => (wanted + 7 - current) % 7,
        Direction::Backward => (current + 7 - wanted) % 7,
    };
    let delta = i64::from(if delta == 0 { 7 } else { delta });

    let date = match direction {
        Direction::Forward => local.date_naive().checked_add_signed(Duration::days(delta)),
        Direction::Backward => local.date_naive().checked_sub_signed(Duration::days(delta)),
    }
    .ok_or_else(|| {
        AlmanacError::InvalidDate("weekday navigation leaves the representable range".to_string())
    })?;

    let resolved = zone::resolve_local(zone.tz(), date.and_time(local.time()));
    Ok(Instant::from_epoch_millis(resolved.timestamp_millis()))
}

fn rebased(weekday: Weekday, week_start: WeekStart) -> u32 {
    (weekday_index(weekday) + 7 - week_start.index()) % 7
}

// ── Batch queries ───────────────────────────────────────────────────────────

/// One step of a batch navigation/boundary request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStep {
    StartOf(Period),
    EndOf(Period),
    Next(Weekday),
    Previous(Weekday),
}

impl QueryStep {
    /// Parse an (operation, argument) literal pair.
    ///
    /// # Errors
    ///
    /// [`AlmanacError::UnsupportedOperation`] for an unrecognized operation
    /// literal; [`AlmanacError::InvalidPeriod`] or
    /// [`AlmanacError::InvalidWeekday`] for a bad argument.
    pub fn parse(operation: &str, argument: &str) -> Result<Self> {
        match operation.trim().to_ascii_lowercase().as_str() {
            "start_of" | "startof" => Ok(Self::StartOf(argument.parse()?)),
            "end_of" | "endof" => Ok(Self::EndOf(argument.parse()?)),
            "next" => Ok(Self::Next(parse_weekday(argument)?)),
            "previous" | "prev" => Ok(Self::Previous(parse_weekday(argument)?)),
            _ => Err(AlmanacError::UnsupportedOperation(format!("'{operation}'"))),
        }
    }

    fn apply(self, reference: Instant, zone: &ZoneId, week_start: WeekStart) -> Result<Instant> {
        match self {
            Self::StartOf(period) => boundary::start_of(period, reference, zone, week_start),
            Self::EndOf(period) => boundary::end_of(period, reference, zone, week_start),
            Self::Next(weekday) => next_weekday(weekday, reference, zone, week_start),
            Self::Previous(weekday) => previous_weekday(weekday, reference, zone, week_start),
        }
    }
}

impl fmt::Display for QueryStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartOf(period) => write!(f, "start_of {}", period.as_str()),
            Self::EndOf(period) => write!(f, "end_of {}", period.as_str()),
            Self::Next(weekday) => write!(f, "next {}", weekday_name(*weekday)),
            Self::Previous(weekday) => write!(f, "previous {}", weekday_name(*weekday)),
        }
    }
}

/// Whether each step of a batch sees the previous step's result or the
/// original base instant.
///
/// An explicit flag — never inferred from the shape of the request — so both
/// behaviors stay testable in isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationMode {
    /// Each step's reference is the previous step's result.
    #[default]
    Chained,
    /// Every step is evaluated against the original base instant.
    Independent,
}

/// Evaluate a batch of steps against `base`, one result per step.
pub fn run_queries(
    base: Instant,
    steps: &[QueryStep],
    zone: &ZoneId,
    week_start: WeekStart,
    mode: EvaluationMode,
) -> Result<Vec<Instant>> {
    let mut results = Vec::with_capacity(steps.len());
    let mut reference = base;
    for step in steps {
        let outcome = step.apply(reference, zone, week_start)?;
        if mode == EvaluationMode::Chained {
            reference = outcome;
        }
        results.push(outcome);
    }
    Ok(results)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instant::{format_instant, parse_instant, NaivePolicy};
    use crate::zone::ZoneDb;

    fn db() -> ZoneDb {
        ZoneDb::new()
    }

    fn at(text: &str) -> Instant {
        parse_instant(text, NaivePolicy::Reject).unwrap()
    }

    fn utc_text(instant: Instant) -> String {
        format_instant(instant).unwrap()
    }

    // ── Weekday parsing ─────────────────────────────────────────────────

    #[test]
    fn test_parse_weekday_names_and_abbreviations() {
        assert_eq!(parse_weekday("Friday").unwrap(), Weekday::Fri);
        assert_eq!(parse_weekday("tues").unwrap(), Weekday::Tue);
        assert_eq!(parse_weekday("SUN").unwrap(), Weekday::Sun);
    }

    #[test]
    fn test_parse_weekday_rejects_unknown() {
        let err = parse_weekday("someday").unwrap_err();
        assert!(matches!(err, AlmanacError::InvalidWeekday(_)), "got: {err}");
    }

    // ── next / previous ─────────────────────────────────────────────────

    #[test]
    fn test_next_weekday_later_in_week() {
        // 2025-08-20 is a Wednesday.
        let zone = db().resolve("UTC").unwrap();
        let result =
            next_weekday(Weekday::Fri, at("2025-08-20T09:00:00Z"), &zone, WeekStart::Monday)
                .unwrap();
        assert_eq!(utc_text(result), "2025-08-22T09:00:00.000Z");
    }

    #[test]
    fn test_next_weekday_wraps_to_following_week() {
        let zone = db().resolve("UTC").unwrap();
        let result =
            next_weekday(Weekday::Mon, at("2025-08-20T09:00:00Z"), &zone, WeekStart::Monday)
                .unwrap();
        assert_eq!(utc_text(result), "2025-08-25T09:00:00.000Z");
    }

    #[test]
    fn test_next_same_weekday_is_a_week_ahead() {
        // 2025-08-18 is a Monday; "next monday" is never the same day.
        let zone = db().resolve("UTC").unwrap();
        let reference = at("2025-08-18T10:00:00Z");
        let result = next_weekday(Weekday::Mon, reference, &zone, WeekStart::Monday).unwrap();
        assert_ne!(result, reference);
        assert_eq!(utc_text(result), "2025-08-25T10:00:00.000Z");
    }

    #[test]
    fn test_previous_same_weekday_is_a_week_back() {
        let zone = db().resolve("UTC").unwrap();
        let reference = at("2025-08-18T10:00:00Z");
        let result = previous_weekday(Weekday::Mon, reference, &zone, WeekStart::Monday).unwrap();
        assert_eq!(utc_text(result), "2025-08-11T10:00:00.000Z");
    }

    #[test]
    fn test_previous_weekday_earlier_in_week() {
        let zone = db().resolve("UTC").unwrap();
        let result =
            previous_weekday(Weekday::Tue, at("2025-08-20T09:00:00Z"), &zone, WeekStart::Monday)
                .unwrap();
        assert_eq!(utc_text(result), "2025-08-19T09:00:00.000Z");
    }

    #[test]
    fn test_same_day_exclusion_under_both_week_starts() {
        let zone = db().resolve("UTC").unwrap();
        let reference = at("2025-08-17T08:00:00Z"); // a Sunday
        for week_start in [WeekStart::Monday, WeekStart::Sunday] {
            let result = next_weekday(Weekday::Sun, reference, &zone, week_start).unwrap();
            assert_eq!(utc_text(result), "2025-08-24T08:00:00.000Z");
        }
    }

    #[test]
    fn test_navigation_preserves_wall_clock_across_dst() {
        // Friday 2025-03-07 14:30 New York (EST); the following Monday is
        // past the spring-forward transition but stays 14:30 local.
        let zone = db().resolve("America/New_York").unwrap();
        let reference = at("2025-03-07T19:30:00Z"); // 14:30 EST
        let result = next_weekday(Weekday::Mon, reference, &zone, WeekStart::Monday).unwrap();
        // 14:30 EDT on 2025-03-10 is 18:30Z.
        assert_eq!(utc_text(result), "2025-03-10T18:30:00.000Z");
    }

    // ── Batch queries ───────────────────────────────────────────────────

    #[test]
    fn test_query_step_parsing() {
        assert_eq!(
            QueryStep::parse("start_of", "month").unwrap(),
            QueryStep::StartOf(Period::Month)
        );
        assert_eq!(
            QueryStep::parse("next", "friday").unwrap(),
            QueryStep::Next(Weekday::Fri)
        );
    }

    #[test]
    fn test_query_step_rejects_unknown_operation() {
        let err = QueryStep::parse("interpolate", "day").unwrap_err();
        assert!(matches!(err, AlmanacError::UnsupportedOperation(_)), "got: {err}");
    }

    #[test]
    fn test_query_step_rejects_bad_argument() {
        assert!(matches!(
            QueryStep::parse("start_of", "era").unwrap_err(),
            AlmanacError::InvalidPeriod(_)
        ));
        assert!(matches!(
            QueryStep::parse("next", "caturday").unwrap_err(),
            AlmanacError::InvalidWeekday(_)
        ));
    }

    #[test]
    fn test_chained_steps_feed_each_other() {
        // end_of month from Aug 20, then next friday from *that* result:
        // Aug 31 end-of-month, then Friday Sep 5.
        let zone = db().resolve("UTC").unwrap();
        let steps = [
            QueryStep::EndOf(Period::Month),
            QueryStep::Next(Weekday::Fri),
        ];
        let results = run_queries(
            at("2025-08-20T12:00:00Z"),
            &steps,
            &zone,
            WeekStart::Monday,
            EvaluationMode::Chained,
        )
        .unwrap();
        assert_eq!(utc_text(results[0]), "2025-08-31T23:59:59.999Z");
        assert_eq!(utc_text(results[1]), "2025-09-05T23:59:59.999Z");
    }

    #[test]
    fn test_independent_steps_share_the_base() {
        let zone = db().resolve("UTC").unwrap();
        let steps = [
            QueryStep::EndOf(Period::Month),
            QueryStep::Next(Weekday::Fri),
        ];
        let results = run_queries(
            at("2025-08-20T12:00:00Z"),
            &steps,
            &zone,
            WeekStart::Monday,
            EvaluationMode::Independent,
        )
        .unwrap();
        assert_eq!(utc_text(results[0]), "2025-08-31T23:59:59.999Z");
        // "next friday" from the Wednesday base, not from the month end.
        assert_eq!(utc_text(results[1]), "2025-08-22T12:00:00.000Z");
    }
}
