//! Business-day membership and arithmetic.
//!
//! Membership is a calendar-date property, not an instant property. Each
//! instant is canonicalized to exactly one calendar date before testing —
//! its UTC date unless the caller names the zone whose wall-clock date the
//! instant encodes — so two zone interpretations of "today" can never
//! disagree within a single call.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};

use crate::boundary::weekday_index;
use crate::error::{AlmanacError, Result};
use crate::instant::Instant;
use crate::navigate::parse_weekday;
use crate::zone::{self, ZoneId};

// ── Business-day set ────────────────────────────────────────────────────────

/// The weekdays that count as business days. Indexed 0=Sunday..6=Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessDaySet {
    days: [bool; 7],
}

impl BusinessDaySet {
    /// Monday through Friday.
    pub fn weekdays() -> Self {
        Self::from_weekdays(&[
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ])
    }

    pub fn from_weekdays(weekdays: &[Weekday]) -> Self {
        let mut days = [false; 7];
        for weekday in weekdays {
            days[weekday_index(*weekday) as usize] = true;
        }
        Self { days }
    }

    /// Parse the compact list syntax: comma-separated names, numbers, or
    /// ranges (`"Mon-Fri"`, `"Mon,Wed,Fri"`, `"1-5"`). Ranges wrap, so
    /// `"Fri-Mon"` covers Friday through Monday.
    ///
    /// Unrecognized tokens are skipped with a warning instead of failing the
    /// whole set. This is the engine's one lenient parse; everything else
    /// rejects bad input outright.
    pub fn parse(list: &str) -> Self {
        let mut days = [false; 7];
        for token in list.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match token.split_once('-') {
                Some((from, to)) => match (day_index(from), day_index(to)) {
                    (Some(start), Some(end)) => {
                        let mut index = start;
                        loop {
                            days[index] = true;
                            if index == end {
                                break;
                            }
                            index = (index + 1) % 7;
                        }
                    }
                    _ => {
                        tracing::warn!(token, "ignoring unrecognized weekday range in business-day list");
                    }
                },
                None => match day_index(token) {
                    Some(index) => days[index] = true,
                    None => {
                        tracing::warn!(token, "ignoring unrecognized weekday token in business-day list");
                    }
                },
            }
        }
        Self { days }
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.days[weekday_index(weekday) as usize]
    }

    pub fn is_empty(&self) -> bool {
        !self.days.iter().any(|&day| day)
    }
}

impl Default for BusinessDaySet {
    fn default() -> Self {
        Self::weekdays()
    }
}

fn day_index(token: &str) -> Option<usize> {
    let token = token.trim();
    if let Ok(n) = token.parse::<u8>() {
        return (n <= 6).then_some(n as usize);
    }
    parse_weekday(token).ok().map(|w| weekday_index(w) as usize)
}

// ── Exclusion set ───────────────────────────────────────────────────────────

/// Calendar dates that are never business days, whatever their weekday.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    dates: BTreeSet<NaiveDate>,
}

impl ExclusionSet {
    /// Parse `YYYY-MM-DD` strings. Strict, unlike the weekday-list parser:
    /// one invalid date fails the whole list.
    pub fn parse<I, S>(dates: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for raw in dates {
            let raw = raw.as_ref().trim();
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                AlmanacError::InvalidDate(format!("'{raw}' is not a YYYY-MM-DD exclusion date"))
            })?;
            set.insert(date);
        }
        Ok(Self { dates: set })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

// ── Membership and arithmetic ───────────────────────────────────────────────

/// Whether the instant's canonical calendar date is a business day.
pub fn is_business_day(
    instant: Instant,
    set: &BusinessDaySet,
    exclusions: &ExclusionSet,
    zone: Option<&ZoneId>,
) -> Result<bool> {
    Ok(passes(canonical_date(instant, zone)?, set, exclusions))
}

/// Walk `n` business days from `instant` (`n < 0` walks backwards), keeping
/// the wall-clock time of day.
///
/// Only days passing both the weekday-set and the exclusion test are
/// counted; every other day is stepped over without consuming the count.
///
/// # Errors
///
/// [`AlmanacError::MissingDaysCount`] when `n == 0` — a zero count is a
/// caller error, not a no-op. [`AlmanacError::InvalidWeekday`] when the set
/// selects no weekdays at all (the walk could never terminate).
pub fn add_business_days(
    instant: Instant,
    n: i64,
    set: &BusinessDaySet,
    exclusions: &ExclusionSet,
    zone: Option<&ZoneId>,
) -> Result<Instant> {
    if n == 0 {
        return Err(AlmanacError::MissingDaysCount(
            "a business-day walk needs a non-zero day count".to_string(),
        ));
    }
    if set.is_empty() {
        return Err(AlmanacError::InvalidWeekday(
            "business-day set selects no weekdays".to_string(),
        ));
    }

    let step = if n > 0 { 1 } else { -1 };
    let utc = instant.to_utc()?;
    match zone {
        Some(zone) => {
            let local = utc.with_timezone(&zone.tz());
            let landed = walk(local.date_naive(), step, n.unsigned_abs(), set, exclusions)?;
            let resolved = zone::resolve_local(zone.tz(), landed.and_time(local.time()));
            Ok(Instant::from_epoch_millis(resolved.timestamp_millis()))
        }
        None => {
            let landed = walk(utc.date_naive(), step, n.unsigned_abs(), set, exclusions)?;
            let recombined = Utc.from_utc_datetime(&landed.and_time(utc.time()));
            Ok(Instant::from_epoch_millis(recombined.timestamp_millis()))
        }
    }
}

fn walk(
    mut date: NaiveDate,
    step: i64,
    mut remaining: u64,
    set: &BusinessDaySet,
    exclusions: &ExclusionSet,
) -> Result<NaiveDate> {
    while remaining > 0 {
        date = date
            .checked_add_signed(Duration::days(step))
            .ok_or_else(|| {
                AlmanacError::InvalidDate(
                    "business-day walk leaves the representable date range".to_string(),
                )
            })?;
        if passes(date, set, exclusions) {
            remaining -= 1;
        }
    }
    Ok(date)
}

fn passes(date: NaiveDate, set: &BusinessDaySet, exclusions: &ExclusionSet) -> bool {
    set.contains(date.weekday()) && !exclusions.contains(date)
}

fn canonical_date(instant: Instant, zone: Option<&ZoneId>) -> Result<NaiveDate> {
    let utc = instant.to_utc()?;
    Ok(match zone {
        Some(zone) => utc.with_timezone(&zone.tz()).date_naive(),
        None => utc.date_naive(),
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────
