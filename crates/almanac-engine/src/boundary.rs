//! Period boundaries: start/end of day, week, month, quarter, and year as
//! observed in a zone.
//!
//! Boundaries are computed by decomposing the instant into a wall clock in
//! the zone, truncating or advancing the calendar fields, and recombining
//! through the offset resolver. Raw millisecond arithmetic is never used —
//! adding a flat 24 hours lands an hour off whenever a DST transition falls
//! inside the period.

use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{AlmanacError, Result};
use crate::instant::Instant;
use crate::zone::{self, ZoneId};

// ── Period ──────────────────────────────────────────────────────────────────

/// A calendar period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }
}

impl FromStr for Period {
    type Err = AlmanacError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            _ => Err(AlmanacError::InvalidPeriod(format!("'{s}'"))),
        }
    }
}

// ── Week start ──────────────────────────────────────────────────────────────

/// Which day begins a week for period and weekday-offset computations.
///
/// The numeric weekday encoding (0 = Sunday .. 6 = Saturday) is accepted as
/// an alternate spelling; values other than 0 normalize to Monday, since
/// these are the only two supported conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "WeekStartRepr")]
pub enum WeekStart {
    Sunday,
    /// ISO 8601 convention.
    #[default]
    Monday,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WeekStartRepr {
    Number(u8),
    Name(String),
}

impl TryFrom<WeekStartRepr> for WeekStart {
    type Error = AlmanacError;

    fn try_from(repr: WeekStartRepr) -> Result<Self> {
        match repr {
            WeekStartRepr::Number(n) => Self::from_number(n),
            WeekStartRepr::Name(name) => name.parse(),
        }
    }
}

impl WeekStart {
    /// Accept the numeric weekday encoding, 0 = Sunday .. 6 = Saturday.
    pub fn from_number(n: u8) -> Result<Self> {
        match n {
            0 => Ok(Self::Sunday),
            1..=6 => Ok(Self::Monday),
            _ => Err(AlmanacError::InvalidWeekday(format!(
                "week start {n} is outside 0-6"
            ))),
        }
    }

    /// Index in 0=Sunday..6=Saturday numbering.
    pub(crate) fn index(self) -> u32 {
        match self {
            Self::Sunday => 0,
            Self::Monday => 1,
        }
    }
}

impl FromStr for WeekStart {
    type Err = AlmanacError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<u8>() {
            return Self::from_number(n);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "sunday" | "sun" => Ok(Self::Sunday),
            "monday" | "mon" => Ok(Self::Monday),
            _ => Err(AlmanacError::InvalidWeekday(format!(
                "'{s}' is not a recognized week start"
            ))),
        }
    }
}

/// Weekday index in the 0=Sunday..6=Saturday numbering.
pub(crate) fn weekday_index(weekday: Weekday) -> u32 {
    weekday.num_days_from_sunday()
}

// ── Boundary computation ────────────────────────────────────────────────────

/// The first instant of the period containing `instant`, as observed in
/// `zone`.
pub fn start_of(
    period: Period,
    instant: Instant,
    zone: &ZoneId,
    week_start: WeekStart,
) -> Result<Instant> {
    let date = local_date(instant, zone)?;
    Ok(local_midnight(zone, period_start_date(period, date, week_start)?))
}

/// The last instant of the period containing `instant`: one millisecond
/// before the next period's local midnight.
///
/// Computed from the following midnight rather than a literal 23:59:59.999
/// wall clock, so it stays correct in zones that shift their clocks exactly
/// at midnight.
pub fn end_of(
    period: Period,
    instant: Instant,
    zone: &ZoneId,
    week_start: WeekStart,
) -> Result<Instant> {
    let date = local_date(instant, zone)?;
    let next_start = local_midnight(zone, period_next_start_date(period, date, week_start)?);
    Ok(Instant::from_epoch_millis(next_start.epoch_millis() - 1))
}

fn local_date(instant: Instant, zone: &ZoneId) -> Result<NaiveDate> {
    Ok(instant.to_utc()?.with_timezone(&zone.tz()).date_naive())
}

fn local_midnight(zone: &ZoneId, date: NaiveDate) -> Instant {
    let resolved = zone::resolve_local(zone.tz(), date.and_time(NaiveTime::MIN));
    Instant::from_epoch_millis(resolved.timestamp_millis())
}

fn period_start_date(period: Period, date: NaiveDate, week_start: WeekStart) -> Result<NaiveDate> {
    let start = match period {
        Period::Day => Some(date),
        Period::Week => {
            let back = (weekday_index(date.weekday()) + 7 - week_start.index()) % 7;
            date.checked_sub_signed(Duration::days(i64::from(back)))
        }
        Period::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1),
        Period::Quarter => {
            let quarter_month = (date.month0() / 3) * 3 + 1;
            NaiveDate::from_ymd_opt(date.year(), quarter_month, 1)
        }
        Period::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
    };
    start.ok_or_else(|| out_of_range(date))
}

fn period_next_start_date(
    period: Period,
    date: NaiveDate,
    week_start: WeekStart,
) -> Result<NaiveDate> {
    let next = match period {
        Period::Day => date.succ_opt(),
        Period::Week => {
            period_start_date(Period::Week, date, week_start)?.checked_add_signed(Duration::days(7))
        }
        Period::Month => first_of_following_month(date.year(), date.month()),
        Period::Quarter => {
            let quarter_month = (date.month0() / 3) * 3 + 1;
            if quarter_month == 10 {
                NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(date.year(), quarter_month + 3, 1)
            }
        }
        Period::Year => NaiveDate::from_ymd_opt(date.year() + 1, 1, 1),
    };
    next.ok_or_else(|| out_of_range(date))
}

fn first_of_following_month(year: i32, month: u32) -> Option<NaiveDate> {
    if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
}

fn out_of_range(date: NaiveDate) -> AlmanacError {
    AlmanacError::InvalidDate(format!(
        "period boundary for {date} leaves the representable calendar range"
    ))
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

    // ── Period / WeekStart parsing ──────────────────────────────────────

    #[test]
    fn test_period_parses_known_literals() {
        assert_eq!("day".parse::<Period>().unwrap(), Period::Day);
        assert_eq!("Quarter".parse::<Period>().unwrap(), Period::Quarter);
    }

    #[test]
    fn test_period_rejects_unknown_literal() {
        let err = "fortnight".parse::<Period>().unwrap_err();
        assert!(matches!(err, AlmanacError::InvalidPeriod(_)), "got: {err}");
    }

    #[test]
    fn test_week_start_numeric_encoding() {
        assert_eq!(WeekStart::from_number(0).unwrap(), WeekStart::Sunday);
        assert_eq!(WeekStart::from_number(1).unwrap(), WeekStart::Monday);
        // Other weekdays normalize to the ISO convention.
        assert_eq!(WeekStart::from_number(4).unwrap(), WeekStart::Monday);
        assert!(WeekStart::from_number(7).is_err());
    }

    #[test]
    fn test_week_start_name_encoding() {
        assert_eq!("sunday".parse::<WeekStart>().unwrap(), WeekStart::Sunday);
        assert_eq!("Mon".parse::<WeekStart>().unwrap(), WeekStart::Monday);
        assert!("tuesday".parse::<WeekStart>().is_err());
    }

    // ── Day boundaries ──────────────────────────────────────────────────

    #[test]
    fn test_day_boundaries_plain_day() {
        let zone = db().resolve("America/New_York").unwrap();
        let reference = at("2025-08-15T18:30:00Z");
        let start = start_of(Period::Day, reference, &zone, WeekStart::Monday).unwrap();
        let end = end_of(Period::Day, reference, &zone, WeekStart::Monday).unwrap();
        assert_eq!(utc_text(start), "2025-08-15T04:00:00.000Z");
        assert_eq!(utc_text(end), "2025-08-16T03:59:59.999Z");
    }

    #[test]
    fn test_day_start_on_spring_forward_date() {
        // Local midnight on 2025-03-09 is still EST, so 05:00Z — not a flat
        // 24h from the neighboring day's midnight.
        let zone = db().resolve("America/New_York").unwrap();
        let reference = at("2025-03-09T15:00:00Z");
        let start = start_of(Period::Day, reference, &zone, WeekStart::Monday).unwrap();
        assert_eq!(utc_text(start), "2025-03-09T05:00:00.000Z");
    }

    #[test]
    fn test_spring_forward_day_is_23_hours() {
        let zone = db().resolve("America/New_York").unwrap();
        let reference = at("2025-03-09T15:00:00Z");
        let start = start_of(Period::Day, reference, &zone, WeekStart::Monday).unwrap();
        let end = end_of(Period::Day, reference, &zone, WeekStart::Monday).unwrap();
        assert_eq!(end.epoch_millis() - start.epoch_millis(), 23 * 3_600_000 - 1);
    }

    #[test]
    fn test_fall_back_day_is_25_hours() {
        let zone = db().resolve("America/New_York").unwrap();
        let reference = at("2025-11-02T15:00:00Z");
        let start = start_of(Period::Day, reference, &zone, WeekStart::Monday).unwrap();
        let end = end_of(Period::Day, reference, &zone, WeekStart::Monday).unwrap();
        assert_eq!(end.epoch_millis() - start.epoch_millis(), 25 * 3_600_000 - 1);
    }

    // ── Week boundaries ─────────────────────────────────────────────────

    #[test]
    fn test_week_start_monday_convention() {
        // 2025-08-20 is a Wednesday; the Monday-based week begins Aug 18.
        let zone = db().resolve("UTC").unwrap();
        let reference = at("2025-08-20T12:00:00Z");
        let start = start_of(Period::Week, reference, &zone, WeekStart::Monday).unwrap();
        let end = end_of(Period::Week, reference, &zone, WeekStart::Monday).unwrap();
        assert_eq!(utc_text(start), "2025-08-18T00:00:00.000Z");
        assert_eq!(utc_text(end), "2025-08-24T23:59:59.999Z");
    }

    #[test]
    fn test_week_start_sunday_convention() {
        let zone = db().resolve("UTC").unwrap();
        let reference = at("2025-08-20T12:00:00Z");
        let start = start_of(Period::Week, reference, &zone, WeekStart::Sunday).unwrap();
        let end = end_of(Period::Week, reference, &zone, WeekStart::Sunday).unwrap();
        assert_eq!(utc_text(start), "2025-08-17T00:00:00.000Z");
        assert_eq!(utc_text(end), "2025-08-23T23:59:59.999Z");
    }

    #[test]
    fn test_week_start_on_the_week_start_day_is_same_day() {
        // Monday reference with Monday start: the week begins that day.
        let zone = db().resolve("UTC").unwrap();
        let reference = at("2025-08-18T12:00:00Z");
        let start = start_of(Period::Week, reference, &zone, WeekStart::Monday).unwrap();
        assert_eq!(utc_text(start), "2025-08-18T00:00:00.000Z");
    }

    // ── Month / quarter / year boundaries ───────────────────────────────

    #[test]
    fn test_month_boundaries_handle_lengths_uniformly() {
        let zone = db().resolve("UTC").unwrap();

        let feb = at("2024-02-10T12:00:00Z");
        assert_eq!(
            utc_text(end_of(Period::Month, feb, &zone, WeekStart::Monday).unwrap()),
            "2024-02-29T23:59:59.999Z"
        );

        let dec = at("2025-12-10T12:00:00Z");
        assert_eq!(
            utc_text(start_of(Period::Month, dec, &zone, WeekStart::Monday).unwrap()),
            "2025-12-01T00:00:00.000Z"
        );
        assert_eq!(
            utc_text(end_of(Period::Month, dec, &zone, WeekStart::Monday).unwrap()),
            "2025-12-31T23:59:59.999Z"
        );
    }

    #[test]
    fn test_quarter_boundaries() {
        let zone = db().resolve("UTC").unwrap();
        let reference = at("2025-08-15T12:00:00Z");
        let start = start_of(Period::Quarter, reference, &zone, WeekStart::Monday).unwrap();
        let end = end_of(Period::Quarter, reference, &zone, WeekStart::Monday).unwrap();
        assert_eq!(utc_text(start), "2025-07-01T00:00:00.000Z");
        assert_eq!(utc_text(end), "2025-09-30T23:59:59.999Z");
    }

    #[test]
    fn test_fourth_quarter_rolls_into_next_year() {
        let zone = db().resolve("UTC").unwrap();
        let reference = at("2025-11-20T12:00:00Z");
        let end = end_of(Period::Quarter, reference, &zone, WeekStart::Monday).unwrap();
        assert_eq!(utc_text(end), "2025-12-31T23:59:59.999Z");
    }

    #[test]
    fn test_year_boundaries_in_zone() {
        // New Year in Tokyo happens nine hours before UTC's.
        let zone = db().resolve("Asia/Tokyo").unwrap();
        let reference = at("2025-06-15T00:00:00Z");
        let start = start_of(Period::Year, reference, &zone, WeekStart::Monday).unwrap();
        let end = end_of(Period::Year, reference, &zone, WeekStart::Monday).unwrap();
        assert_eq!(utc_text(start), "2024-12-31T15:00:00.000Z");
        assert_eq!(utc_text(end), "2025-12-31T14:59:59.999Z");
    }

    // ── Ordering property ───────────────────────────────────────────────

    #[test]
    fn test_start_at_most_reference_at_most_end() {
        let zone = db().resolve("America/New_York").unwrap();
        let references = [
            at("2025-03-09T15:00:00Z"),
            at("2025-11-02T06:30:00Z"),
            at("2025-08-15T23:59:59.999Z"),
            at("2024-02-29T12:00:00Z"),
        ];
        let periods = [
            Period::Day,
            Period::Week,
            Period::Month,
            Period::Quarter,
            Period::Year,
        ];
        for reference in references {
            for period in periods {
                let start = start_of(period, reference, &zone, WeekStart::Monday).unwrap();
                let end = end_of(period, reference, &zone, WeekStart::Monday).unwrap();
                assert!(start <= reference, "{period:?}: start after reference");
                assert!(reference <= end, "{period:?}: reference after end");
                assert!(end > start, "{period:?}: empty period");
            }
        }
    }
}
