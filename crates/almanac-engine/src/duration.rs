//! Duration decomposition, formatting, and instant shifting.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{AlmanacError, Result};
use crate::instant::Instant;
use crate::zone::{self, ZoneId};

const MILLIS_PER_SECOND: u64 = 1_000;
const MILLIS_PER_MINUTE: u64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: u64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: u64 = 24 * MILLIS_PER_HOUR;
/// 365-day year approximation, display only.
const MILLIS_PER_YEAR: u64 = 365 * MILLIS_PER_DAY;

// ── Formatting ──────────────────────────────────────────────────────────────

/// Unit spelling for formatted durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// `2y 3d 4h`
    Compact,
    /// `2 years, 3 days and 4 hours`
    #[default]
    Verbose,
}

/// Render a millisecond magnitude as a human-readable duration.
///
/// The magnitude decomposes into years (365-day approximation), days, hours,
/// minutes, and seconds by floor division in strictly descending unit order.
/// Only non-zero components appear; `max_units` truncates the list
/// largest-first (`0` means no cap). The sign of the input becomes a single
/// leading `-`, suppressed when the magnitude is exactly zero. Verbose mode
/// spells out unit words and joins the final component with "and" when two
/// or more are shown.
pub fn format_duration(millis: i64, verbosity: Verbosity, max_units: usize) -> String {
    let mut components: Vec<(u64, &str, &str)> = Vec::new();
    let mut rest = millis.unsigned_abs();
    for (unit_millis, compact, word) in [
        (MILLIS_PER_YEAR, "y", "year"),
        (MILLIS_PER_DAY, "d", "day"),
        (MILLIS_PER_HOUR, "h", "hour"),
        (MILLIS_PER_MINUTE, "m", "minute"),
        (MILLIS_PER_SECOND, "s", "second"),
    ] {
        let value = rest / unit_millis;
        rest %= unit_millis;
        if value > 0 {
            components.push((value, compact, word));
        }
    }
    if components.is_empty() {
        components.push((0, "s", "second"));
    }
    if max_units > 0 {
        components.truncate(max_units);
    }

    let rendered: Vec<String> = components
        .iter()
        .map(|(value, compact, word)| match verbosity {
            Verbosity::Compact => format!("{value}{compact}"),
            Verbosity::Verbose => {
                let plural = if *value == 1 { "" } else { "s" };
                format!("{value} {word}{plural}")
            }
        })
        .collect();

    let joined = match verbosity {
        Verbosity::Compact => rendered.join(" "),
        Verbosity::Verbose => match rendered.split_last() {
            Some((last, rest)) if !rest.is_empty() => {
                format!("{} and {}", rest.join(", "), last)
            }
            _ => rendered.join(""),
        },
    };

    let sign = if millis < 0 { "-" } else { "" };
    format!("{sign}{joined}")
}

// ── Duration between instants ───────────────────────────────────────────────

/// Signed total and absolute decomposition of the span between two instants.
#[derive(Debug, Clone, Serialize)]
pub struct DurationBreakdown {
    /// Negative when the end precedes the start.
    pub total_millis: i64,
    pub years: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub human: String,
}

/// The span from `start` to `end`.
pub fn between(start: Instant, end: Instant) -> DurationBreakdown {
    let total_millis = end.epoch_millis().saturating_sub(start.epoch_millis());
    let mut rest = total_millis.unsigned_abs();

    let years = rest / MILLIS_PER_YEAR;
    rest %= MILLIS_PER_YEAR;
    let days = rest / MILLIS_PER_DAY;
    rest %= MILLIS_PER_DAY;
    let hours = rest / MILLIS_PER_HOUR;
    rest %= MILLIS_PER_HOUR;
    let minutes = rest / MILLIS_PER_MINUTE;
    rest %= MILLIS_PER_MINUTE;
    let seconds = rest / MILLIS_PER_SECOND;

    DurationBreakdown {
        total_millis,
        years: years as i64,
        days: days as i64,
        hours: hours as i64,
        minutes: minutes as i64,
        seconds: seconds as i64,
        human: format_duration(total_millis, Verbosity::Verbose, 0),
    }
}

// ── Adjustments ─────────────────────────────────────────────────────────────

/// Parsed components of a `+1w2d3h4m5s`-style adjustment string.
#[derive(Debug, Clone, Copy, Default)]
pub struct Adjustment {
    sign: i64,
    weeks: i64,
    days: i64,
    hours: i64,
    minutes: i64,
    seconds: i64,
}

impl Adjustment {
    fn day_count(&self) -> i64 {
        self.sign * (self.weeks * 7 + self.days)
    }

    fn sub_day_millis(&self) -> i64 {
        self.sign * (self.hours * 3_600 + self.minutes * 60 + self.seconds) * 1_000
    }

    /// Normalized rendering, e.g. `+1d2h30m`.
    pub fn to_compact(&self) -> String {
        let mut out = String::from(if self.sign < 0 { "-" } else { "+" });
        for (value, unit) in [
            (self.weeks, 'w'),
            (self.days, 'd'),
            (self.hours, 'h'),
            (self.minutes, 'm'),
            (self.seconds, 's'),
        ] {
            if value != 0 {
                out.push_str(&format!("{value}{unit}"));
            }
        }
        if out.len() == 1 {
            out.push_str("0s");
        }
        out
    }
}

/// Parse an adjustment string: a leading `+` or `-`, then one or more `Nw`,
/// `Nd`, `Nh`, `Nm`, `Ns` components (`+1d2h30m`, `-2w3d`).
///
/// # Errors
///
/// [`AlmanacError::InvalidDuration`] for a missing sign, an unknown unit, or
/// a dangling number.
pub fn parse_adjustment(s: &str) -> Result<Adjustment> {
    let s = s.trim();
    let (sign, body) = match s.chars().next() {
        Some('+') => (1, &s[1..]),
        Some('-') => (-1, &s[1..]),
        _ => {
            return Err(AlmanacError::InvalidDuration(format!(
                "'{s}' must start with '+' or '-'"
            )))
        }
    };
    if body.is_empty() {
        return Err(AlmanacError::InvalidDuration(format!(
            "'{s}' has no components"
        )));
    }

    let mut adjustment = Adjustment {
        sign,
        ..Default::default()
    };
    let mut digits = String::new();
    for ch in body.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        if digits.is_empty() {
            return Err(AlmanacError::InvalidDuration(format!(
                "expected a number before '{ch}' in '{s}'"
            )));
        }
        let value: i64 = digits.parse().map_err(|_| {
            AlmanacError::InvalidDuration(format!("'{digits}' overflows in '{s}'"))
        })?;
        digits.clear();
        match ch.to_ascii_lowercase() {
            'w' => adjustment.weeks += value,
            'd' => adjustment.days += value,
            'h' => adjustment.hours += value,
            'm' => adjustment.minutes += value,
            's' => adjustment.seconds += value,
            other => {
                return Err(AlmanacError::InvalidDuration(format!(
                    "unknown unit '{other}' in '{s}'"
                )))
            }
        }
    }
    if !digits.is_empty() {
        return Err(AlmanacError::InvalidDuration(format!(
            "trailing number without a unit in '{s}'"
        )));
    }
    Ok(adjustment)
}

/// Shift an instant by an adjustment, as observed in `zone`.
///
/// Week and day components move the local calendar date and keep the
/// wall-clock time — one local day across a DST transition is not 24 hours.
/// Hour and smaller components are absolute millisecond arithmetic.
pub fn shift(instant: Instant, adjustment: &Adjustment, zone: &ZoneId) -> Result<Instant> {
    let day_count = adjustment.day_count();
    let shifted_millis = if day_count != 0 {
        let local = instant.to_utc()?.with_timezone(&zone.tz());
        let date = local
            .date_naive()
            .checked_add_signed(Duration::days(day_count))
            .ok_or_else(|| {
                AlmanacError::InvalidDate(
                    "adjustment leaves the representable date range".to_string(),
                )
            })?;
        let resolved = zone::resolve_local(zone.tz(), date.and_time(local.time()));
        resolved.timestamp_millis() + adjustment.sub_day_millis()
    } else {
        instant.epoch_millis() + adjustment.sub_day_millis()
    };
    Ok(Instant::from_epoch_millis(shifted_millis))
}

// ── Tests ───────────────────────────────────────────────────────────────────
