//! Absolute instants and the strict ISO-8601 codec.
//!
//! Parsing enforces an explicit ambiguity policy: input that carries no
//! offset is only interpreted when the caller names the zone it belongs to.
//! The engine never guesses UTC or the host zone for a naive datetime.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AlmanacError, Result};
use crate::zone::{self, WallClock, ZoneId};

/// An absolute point in time: milliseconds since the Unix epoch, UTC.
///
/// Carries no timezone — zones apply only at the formatting and
/// boundary-computation edges. Equality and ordering are total, by epoch
/// millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instant(i64);

impl Instant {
    pub const fn from_epoch_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn epoch_millis(self) -> i64 {
        self.0
    }

    pub(crate) fn to_utc(self) -> Result<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0).ok_or_else(|| {
            AlmanacError::InvalidDate(format!(
                "epoch offset {}ms is outside the representable range",
                self.0
            ))
        })
    }
}

/// How [`parse_instant`] treats naive input (no trailing `Z`, no numeric
/// offset).
#[derive(Debug, Clone, Copy, Default)]
pub enum NaivePolicy<'a> {
    /// Fail with [`AlmanacError::AmbiguousDate`]. This is the default: the
    /// engine never silently assumes UTC or the host zone for an offset-less
    /// datetime.
    #[default]
    Reject,
    /// Interpret the naive fields as a wall clock in this zone. Callers that
    /// opted into "interpret as local" resolve the host zone themselves and
    /// pass it here.
    InZone(&'a ZoneId),
}

/// Parse an ISO-8601 date or datetime into an [`Instant`].
///
/// Accepted forms:
///
/// - offset-carrying datetimes: `2025-08-26T15:00:00Z`, `...+02:00`
/// - naive datetimes (`2025-08-26T15:00:00`), resolved per `naive`
/// - bare calendar dates (`2025-08-26`): always UTC midnight, exempt from
///   the ambiguity check
///
/// Out-of-range calendar fields (month 13, day 32, hour 24) are rejected,
/// never clamped or rolled over.
///
/// # Errors
///
/// [`AlmanacError::InvalidDate`] when the text is not lexically or
/// semantically a calendar date/datetime; [`AlmanacError::AmbiguousDate`]
/// for naive input under [`NaivePolicy::Reject`].
pub fn parse_instant(text: &str, naive: NaivePolicy<'_>) -> Result<Instant> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(Instant::from_epoch_millis(dt.timestamp_millis()));
    }

    // Bare calendar date: UTC midnight, a deliberate convenience carve-out.
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        let midnight = Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN));
        return Ok(Instant::from_epoch_millis(midnight.timestamp_millis()));
    }

    let fields = parse_naive_fields(text)?;
    match naive {
        NaivePolicy::Reject => Err(AlmanacError::AmbiguousDate(format!(
            "'{text}' carries no offset and no zone context; supply a zone or opt into local interpretation"
        ))),
        NaivePolicy::InZone(zone) => zone::to_instant(zone, &WallClock::from_naive(fields)),
    }
}

fn parse_naive_fields(text: &str) -> Result<NaiveDateTime> {
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(parsed);
        }
    }
    Err(AlmanacError::InvalidDate(format!(
        "'{text}' is not an ISO-8601 date or datetime"
    )))
}

/// Render an instant as canonical ISO-8601 UTC: millisecond precision, `Z`
/// suffix. Round-trips through [`parse_instant`] without zone context.
///
/// # Errors
///
/// Fails only for instants outside the representable calendar range.
pub fn format_instant(instant: Instant) -> Result<String> {
    Ok(instant
        .to_utc()?
        .to_rfc3339_opts(SecondsFormat::Millis, true))
}

// ── Tests ───────────────────────────────────────────────────────────────────
