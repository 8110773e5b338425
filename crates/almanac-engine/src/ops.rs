//! Typed operation surface consumed by command and presentation adapters.
//!
//! Every method takes raw strings and options, runs the corresponding
//! computation, and returns a serializable result struct. Failure kinds map
//! one-to-one onto [`AlmanacError`](crate::error::AlmanacError) variants;
//! adapters own the translation into user-facing text.
//!
//! The engine is pure: it never reads the system clock (callers supply
//! `now`), never consults ambient configuration, and holds no mutable state.
//! The injected [`ZoneDb`] is read-only after construction, so concurrent
//! callers need no coordination.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, Offset, SecondsFormat, TimeZone};
use chrono_tz::Tz;
use serde::Serialize;

use crate::boundary::{self, Period, WeekStart};
use crate::business::{self, BusinessDaySet, ExclusionSet};
use crate::config::EngineDefaults;
use crate::duration::{self, DurationBreakdown, Verbosity};
use crate::error::Result;
use crate::instant::{format_instant, parse_instant, Instant, NaivePolicy};
use crate::navigate::{self, weekday_name, EvaluationMode, QueryStep};
use crate::zone::{ZoneDb, ZoneId};

const FALLBACK_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

// ── Result shapes ───────────────────────────────────────────────────────────

/// An instant rendered in a target zone.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertedTime {
    /// Canonical ISO-8601 UTC rendering.
    pub utc: String,
    /// RFC 3339 rendering with the zone's offset.
    pub local: String,
    /// Canonical zone name.
    pub timezone: String,
    /// Offset in effect at this instant, e.g. `"-04:00"`.
    pub utc_offset: String,
    /// Whether the zone is observing daylight saving at this instant.
    pub dst_active: bool,
    /// The local time rendered with the configured output format.
    pub formatted: String,
}

/// The outcome of shifting an instant by an adjustment string.
#[derive(Debug, Clone, Serialize)]
pub struct ShiftedTime {
    pub utc: String,
    pub local: String,
    pub timezone: String,
    /// Normalized adjustment that was applied, e.g. `"+1d2h30m"`.
    pub adjustment: String,
}

/// A period boundary in a zone.
#[derive(Debug, Clone, Serialize)]
pub struct BoundaryTime {
    pub period: Period,
    /// `"start"` or `"end"`.
    pub edge: &'static str,
    pub week_start: WeekStart,
    pub timezone: String,
    pub utc: String,
    pub local: String,
}

/// A single weekday-navigation result.
#[derive(Debug, Clone, Serialize)]
pub struct NavigatedTime {
    pub weekday: String,
    pub timezone: String,
    pub utc: String,
    pub local: String,
}

/// The outcome of one step in a batch navigation request.
#[derive(Debug, Clone, Serialize)]
pub struct NavigationStep {
    pub operation: String,
    pub utc: String,
    pub local: String,
}

/// The outcome of a batch navigation request.
#[derive(Debug, Clone, Serialize)]
pub struct NavigationRun {
    pub timezone: String,
    pub mode: EvaluationMode,
    pub steps: Vec<NavigationStep>,
}

/// Business-day membership for one canonical calendar date.
#[derive(Debug, Clone, Serialize)]
pub struct BusinessDayCheck {
    /// The canonical date the instant resolved to (`YYYY-MM-DD`).
    pub date: String,
    pub weekday: String,
    pub business_day: bool,
    /// Whether the date was suppressed by the exclusion list specifically.
    pub excluded: bool,
}

/// The outcome of a business-day walk.
#[derive(Debug, Clone, Serialize)]
pub struct BusinessDayShift {
    pub days: i64,
    pub start_date: String,
    pub end_date: String,
    pub utc: String,
    pub local: String,
}

// ── Engine ──────────────────────────────────────────────────────────────────

/// The operation facade: an injected canonical zone list plus host defaults.
#[derive(Debug, Clone)]
pub struct Engine {
    zones: ZoneDb,
    defaults: EngineDefaults,
}

impl Engine {
    pub fn new(zones: ZoneDb, defaults: EngineDefaults) -> Self {
        Self { zones, defaults }
    }

    pub fn zones(&self) -> &ZoneDb {
        &self.zones
    }

    /// Render the caller-supplied `now` in a zone (UTC when omitted).
    ///
    /// The engine never reads the system clock; the adapter owns "now".
    pub fn current_time(&self, now: Instant, timezone: Option<&str>) -> Result<ConvertedTime> {
        let zone = self.zones.resolve(timezone.unwrap_or("UTC"))?;
        self.converted(now, &zone)
    }

    /// Re-express a datetime in a target zone.
    ///
    /// # Errors
    ///
    /// `InvalidDate` / `AmbiguousDate` from parsing, `InvalidTimezone` for an
    /// unknown zone.
    pub fn convert(&self, datetime: &str, timezone: &str) -> Result<ConvertedTime> {
        let zone = self.zones.resolve(timezone)?;
        let instant = parse_instant(datetime, NaivePolicy::Reject)?;
        self.converted(instant, &zone)
    }

    /// Shift a datetime by an adjustment string (`"+1d2h"`, `"-30m"`), with
    /// day-level components applied to the zone's wall clock.
    pub fn shift(&self, datetime: &str, adjustment: &str, timezone: &str) -> Result<ShiftedTime> {
        let zone = self.zones.resolve(timezone)?;
        let instant = parse_instant(datetime, NaivePolicy::InZone(&zone))?;
        let adjustment = duration::parse_adjustment(adjustment)?;
        let shifted = duration::shift(instant, &adjustment, &zone)?;
        let local = shifted.to_utc()?.with_timezone(&zone.tz());
        Ok(ShiftedTime {
            utc: format_instant(shifted)?,
            local: rfc3339_local(&local),
            timezone: zone.name().to_string(),
            adjustment: adjustment.to_compact(),
        })
    }

    /// The span between two datetimes.
    pub fn between(&self, start: &str, end: &str) -> Result<DurationBreakdown> {
        let start = parse_instant(start, NaivePolicy::Reject)?;
        let end = parse_instant(end, NaivePolicy::Reject)?;
        Ok(duration::between(start, end))
    }

    /// Start of the period containing `datetime`, observed in `timezone`.
    ///
    /// `week_start` overrides the configured default for this call.
    pub fn start_of(
        &self,
        period: &str,
        datetime: &str,
        timezone: &str,
        week_start: Option<&str>,
    ) -> Result<BoundaryTime> {
        self.boundary("start", period, datetime, timezone, week_start)
    }

    /// End of the period containing `datetime`, observed in `timezone`.
    pub fn end_of(
        &self,
        period: &str,
        datetime: &str,
        timezone: &str,
        week_start: Option<&str>,
    ) -> Result<BoundaryTime> {
        self.boundary("end", period, datetime, timezone, week_start)
    }

    fn boundary(
        &self,
        edge: &'static str,
        period: &str,
        datetime: &str,
        timezone: &str,
        week_start: Option<&str>,
    ) -> Result<BoundaryTime> {
        let zone = self.zones.resolve(timezone)?;
        let period: Period = period.parse()?;
        let week_start = self.week_start(week_start)?;
        let instant = parse_instant(datetime, NaivePolicy::InZone(&zone))?;
        let result = match edge {
            "start" => boundary::start_of(period, instant, &zone, week_start)?,
            _ => boundary::end_of(period, instant, &zone, week_start)?,
        };
        let local = result.to_utc()?.with_timezone(&zone.tz());
        Ok(BoundaryTime {
            period,
            edge,
            week_start,
            timezone: zone.name().to_string(),
            utc: format_instant(result)?,
            local: rfc3339_local(&local),
        })
    }

    /// The next occurrence of a weekday after `datetime`, observed in
    /// `timezone`. Same-day matches roll a full week forward.
    pub fn next_weekday(
        &self,
        weekday: &str,
        datetime: &str,
        timezone: &str,
    ) -> Result<NavigatedTime> {
        let zone = self.zones.resolve(timezone)?;
        let target = navigate::parse_weekday(weekday)?;
        let instant = parse_instant(datetime, NaivePolicy::InZone(&zone))?;
        let result =
            navigate::next_weekday(target, instant, &zone, self.defaults.week_start)?;
        self.navigated(target, result, &zone)
    }

    /// Mirror of [`Engine::next_weekday`].
    pub fn previous_weekday(
        &self,
        weekday: &str,
        datetime: &str,
        timezone: &str,
    ) -> Result<NavigatedTime> {
        let zone = self.zones.resolve(timezone)?;
        let target = navigate::parse_weekday(weekday)?;
        let instant = parse_instant(datetime, NaivePolicy::InZone(&zone))?;
        let result =
            navigate::previous_weekday(target, instant, &zone, self.defaults.week_start)?;
        self.navigated(target, result, &zone)
    }

    /// Evaluate a batch of navigation/boundary steps against one base
    /// datetime.
    pub fn navigate(
        &self,
        datetime: &str,
        timezone: &str,
        steps: &[QueryStep],
        mode: EvaluationMode,
        week_start: Option<&str>,
    ) -> Result<NavigationRun> {
        let zone = self.zones.resolve(timezone)?;
        let week_start = self.week_start(week_start)?;
        let base = parse_instant(datetime, NaivePolicy::InZone(&zone))?;
        let instants = navigate::run_queries(base, steps, &zone, week_start, mode)?;
        let steps = steps
            .iter()
            .zip(instants)
            .map(|(step, instant)| {
                let local = instant.to_utc()?.with_timezone(&zone.tz());
                Ok(NavigationStep {
                    operation: step.to_string(),
                    utc: format_instant(instant)?,
                    local: rfc3339_local(&local),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(NavigationRun {
            timezone: zone.name().to_string(),
            mode,
            steps,
        })
    }

    /// Whether `datetime` falls on a business day.
    ///
    /// The membership date is the instant's UTC date unless `timezone` names
    /// the zone whose wall-clock date the instant encodes. Set and exclusion
    /// arguments override the configured defaults for this call.
    pub fn is_business_day(
        &self,
        datetime: &str,
        timezone: Option<&str>,
        business_days: Option<&str>,
        excluded_dates: Option<&[String]>,
    ) -> Result<BusinessDayCheck> {
        let zone = self.optional_zone(timezone)?;
        let instant = parse_instant(datetime, policy(zone.as_ref()))?;
        let set = self.business_set(business_days);
        let exclusions = self.exclusions(excluded_dates)?;

        let date = match zone.as_ref() {
            Some(zone) => instant.to_utc()?.with_timezone(&zone.tz()).date_naive(),
            None => instant.to_utc()?.date_naive(),
        };
        let business_day =
            business::is_business_day(instant, &set, &exclusions, zone.as_ref())?;
        Ok(BusinessDayCheck {
            date: date.format("%Y-%m-%d").to_string(),
            weekday: weekday_name(date.weekday()).to_string(),
            business_day,
            excluded: exclusions.contains(date),
        })
    }

    /// Walk `days` business days from `datetime` (`days < 0` walks back).
    pub fn add_business_days(
        &self,
        datetime: &str,
        days: i64,
        timezone: Option<&str>,
        business_days: Option<&str>,
        excluded_dates: Option<&[String]>,
    ) -> Result<BusinessDayShift> {
        let zone = self.optional_zone(timezone)?;
        let instant = parse_instant(datetime, policy(zone.as_ref()))?;
        let set = self.business_set(business_days);
        let exclusions = self.exclusions(excluded_dates)?;

        let shifted =
            business::add_business_days(instant, days, &set, &exclusions, zone.as_ref())?;
        let (start_local, end_local) = match zone.as_ref() {
            Some(zone) => (
                instant.to_utc()?.with_timezone(&zone.tz()).date_naive(),
                shifted.to_utc()?.with_timezone(&zone.tz()).date_naive(),
            ),
            None => (instant.to_utc()?.date_naive(), shifted.to_utc()?.date_naive()),
        };
        let local = match zone.as_ref() {
            Some(zone) => rfc3339_local(&shifted.to_utc()?.with_timezone(&zone.tz())),
            None => format_instant(shifted)?,
        };
        Ok(BusinessDayShift {
            days,
            start_date: start_local.format("%Y-%m-%d").to_string(),
            end_date: end_local.format("%Y-%m-%d").to_string(),
            utc: format_instant(shifted)?,
            local,
        })
    }

    /// Render a millisecond magnitude as a human-readable duration.
    pub fn format_duration(&self, millis: i64, verbosity: Verbosity, max_units: usize) -> String {
        duration::format_duration(millis, verbosity, max_units)
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn converted(&self, instant: Instant, zone: &ZoneId) -> Result<ConvertedTime> {
        let local = instant.to_utc()?.with_timezone(&zone.tz());
        Ok(ConvertedTime {
            utc: format_instant(instant)?,
            local: rfc3339_local(&local),
            timezone: zone.name().to_string(),
            utc_offset: format_offset(&local),
            dst_active: dst_active(&local),
            formatted: self.render_local(&local),
        })
    }

    fn navigated(
        &self,
        target: chrono::Weekday,
        result: Instant,
        zone: &ZoneId,
    ) -> Result<NavigatedTime> {
        let local = result.to_utc()?.with_timezone(&zone.tz());
        Ok(NavigatedTime {
            weekday: weekday_name(target).to_string(),
            timezone: zone.name().to_string(),
            utc: format_instant(result)?,
            local: rfc3339_local(&local),
        })
    }

    fn optional_zone(&self, timezone: Option<&str>) -> Result<Option<ZoneId>> {
        timezone.map(|name| self.zones.resolve(name)).transpose()
    }

    fn week_start(&self, arg: Option<&str>) -> Result<WeekStart> {
        match arg {
            Some(raw) => raw.parse(),
            None => Ok(self.defaults.week_start),
        }
    }

    fn business_set(&self, arg: Option<&str>) -> BusinessDaySet {
        BusinessDaySet::parse(arg.unwrap_or(&self.defaults.business_days))
    }

    fn exclusions(&self, arg: Option<&[String]>) -> Result<ExclusionSet> {
        match arg {
            Some(dates) => ExclusionSet::parse(dates),
            None => ExclusionSet::parse(&self.defaults.excluded_dates),
        }
    }

    fn render_local(&self, local: &DateTime<Tz>) -> String {
        let format = &self.defaults.output_format;
        let usable = !StrftimeItems::new(format).any(|item| matches!(item, Item::Error));
        if usable {
            local.format(format).to_string()
        } else {
            tracing::warn!(%format, "configured output format is invalid; using the default");
            local.format(FALLBACK_FORMAT).to_string()
        }
    }
}

fn policy<'a>(zone: Option<&'a ZoneId>) -> NaivePolicy<'a> {
    zone.map_or(NaivePolicy::Reject, NaivePolicy::InZone)
}

fn rfc3339_local(local: &DateTime<Tz>) -> String {
    local.to_rfc3339_opts(SecondsFormat::Millis, false)
}

fn format_offset(local: &DateTime<Tz>) -> String {
    let seconds = local.offset().fix().local_minus_utc();
    let sign = if seconds < 0 { '-' } else { '+' };
    let magnitude = seconds.unsigned_abs();
    format!("{sign}{:02}:{:02}", magnitude / 3600, (magnitude % 3600) / 60)
}

/// Daylight saving is in effect when the current offset exceeds the zone's
/// standard offset, taken as the smaller of the mid-January and mid-July
/// offsets so both hemispheres are covered.
fn dst_active(local: &DateTime<Tz>) -> bool {
    let tz = local.timezone();
    let reference = local.naive_utc();
    let january = reference
        .with_day(15)
        .and_then(|probe| probe.with_month(1))
        .unwrap_or(reference);
    let july = reference
        .with_day(15)
        .and_then(|probe| probe.with_month(7))
        .unwrap_or(reference);
    let standard = seasonal_offset(tz, january).min(seasonal_offset(tz, july));
    local.offset().fix().local_minus_utc() > standard
}

fn seasonal_offset(tz: Tz, probe: chrono::NaiveDateTime) -> i32 {
    tz.offset_from_utc_datetime(&probe).fix().local_minus_utc()
}

// ── Tests ───────────────────────────────────────────────────────────────────
