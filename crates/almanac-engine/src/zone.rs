//! IANA zone handling: canonical zone lookup, wall-clock decomposition, and
//! UTC-offset resolution.
//!
//! Offsets are a function of (zone, wall clock) and are re-derived from the
//! platform zone database on every call — a zone has many offsets over a
//! year, so there is nothing meaningful to cache per zone. The only
//! long-lived value is the canonical zone-name index ([`ZoneDb`]), built once
//! at process start and passed into every call that validates a zone name.

use std::collections::HashMap;
use std::fmt;

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone,
    Timelike,
};
use chrono_tz::{Tz, TZ_VARIANTS};

use crate::error::{AlmanacError, Result};
use crate::instant::Instant;

// ── Canonical zone index ────────────────────────────────────────────────────

/// Case-insensitive index over the platform's canonical IANA zone list.
///
/// Read-only after construction. The IANA data itself is compiled into the
/// binary by `chrono-tz`, so building the index cannot fail at runtime; a
/// process that constructs a `ZoneDb` always has a complete zone set.
#[derive(Debug, Clone)]
pub struct ZoneDb {
    by_lower: HashMap<String, Tz>,
}

impl ZoneDb {
    /// Index every zone in the platform database.
    pub fn new() -> Self {
        let mut by_lower = HashMap::with_capacity(TZ_VARIANTS.len());
        for tz in TZ_VARIANTS {
            by_lower.insert(tz.name().to_ascii_lowercase(), tz);
        }
        Self { by_lower }
    }

    /// Look up a zone name case-insensitively, yielding its canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`AlmanacError::InvalidTimezone`] if the name is not in the
    /// canonical set.
    pub fn resolve(&self, name: &str) -> Result<ZoneId> {
        self.by_lower
            .get(&name.trim().to_ascii_lowercase())
            .copied()
            .map(ZoneId)
            .ok_or_else(|| AlmanacError::InvalidTimezone(format!("'{name}'")))
    }

    /// Number of zones in the canonical set.
    pub fn len(&self) -> usize {
        self.by_lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_lower.is_empty()
    }
}

impl Default for ZoneDb {
    fn default() -> Self {
        Self::new()
    }
}

/// A validated IANA zone identifier in canonical casing.
///
/// Only constructible through [`ZoneDb::resolve`], so holding a `ZoneId`
/// means the zone exists in the platform database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneId(Tz);

impl ZoneId {
    /// The canonical zone name (e.g. `"America/New_York"`).
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    pub(crate) fn tz(&self) -> Tz {
        self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Wall clocks ─────────────────────────────────────────────────────────────

/// A naive calendar tuple with no zone attached.
///
/// Wall clocks are the intermediate between "local time in a zone" and an
/// [`Instant`]; they are never compared across zones without first resolving
/// to an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock {
    pub year: i32,
    /// 1-12.
    pub month: u32,
    /// 1-31.
    pub day: u32,
    /// 0-23.
    pub hour: u32,
    /// 0-59.
    pub minute: u32,
    /// 0-59.
    pub second: u32,
    /// 0-999.
    pub millisecond: u32,
}

impl WallClock {
    /// Build a wall clock, rejecting out-of-range calendar fields.
    pub fn new(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        millisecond: u32,
    ) -> Result<Self> {
        let wall = Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            millisecond,
        };
        wall.to_naive()?;
        Ok(wall)
    }

    pub(crate) fn to_naive(&self) -> Result<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|date| {
                date.and_hms_milli_opt(self.hour, self.minute, self.second, self.millisecond)
            })
            .ok_or_else(|| {
                AlmanacError::InvalidDate(format!(
                    "{}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03} has an out-of-range field",
                    self.year, self.month, self.day, self.hour, self.minute, self.second,
                    self.millisecond
                ))
            })
    }

    pub(crate) fn from_naive(naive: NaiveDateTime) -> Self {
        Self {
            year: naive.year(),
            month: naive.month(),
            day: naive.day(),
            hour: naive.hour(),
            minute: naive.minute(),
            second: naive.second(),
            millisecond: (naive.nanosecond() / 1_000_000).min(999),
        }
    }
}

// ── Offset resolution ───────────────────────────────────────────────────────

/// Resolve a naive wall clock in a zone to a concrete local datetime.
///
/// Tie-breaks are fixed by construction: a wall clock in the repeated
/// (fall-back) hour maps to the earlier offset; one in the skipped
/// (spring-forward) gap maps through the pre-transition offset, which lands
/// the instant just after the gap.
pub(crate) fn resolve_local(tz: Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earlier, _) => earlier,
        LocalResult::None => {
            let pre = tz.offset_from_utc_datetime(&naive).fix().local_minus_utc();
            let utc = naive - Duration::seconds(i64::from(pre));
            tz.from_utc_datetime(&utc)
        }
    }
}

/// The UTC offset, in minutes (positive = ahead of UTC), in effect for
/// `wall` as observed in `zone`.
pub fn offset_minutes(zone: &ZoneId, wall: &WallClock) -> Result<i32> {
    let resolved = resolve_local(zone.tz(), wall.to_naive()?);
    Ok(resolved.offset().fix().local_minus_utc() / 60)
}

/// Combine a wall clock with the offset in effect in `zone` to produce the
/// absolute instant.
pub fn to_instant(zone: &ZoneId, wall: &WallClock) -> Result<Instant> {
    let resolved = resolve_local(zone.tz(), wall.to_naive()?);
    Ok(Instant::from_epoch_millis(resolved.timestamp_millis()))
}

/// Render an instant's calendar fields as observed in `zone`. Inverse of
/// [`to_instant`] wherever the wall clock is unambiguous.
pub fn from_instant(zone: &ZoneId, instant: Instant) -> Result<WallClock> {
    let local = instant.to_utc()?.with_timezone(&zone.tz());
    Ok(WallClock::from_naive(local.naive_local()))
}

// ── Tests ───────────────────────────────────────────────────────────────────
