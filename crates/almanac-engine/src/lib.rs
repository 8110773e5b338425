//! # almanac-engine
//!
//! Deterministic, timezone-aware calendar arithmetic for AI agents.
//!
//! The engine turns date strings into absolute instants under an explicit
//! ambiguity policy, computes DST-correct period boundaries, navigates
//! weekdays, walks business days, and formats durations. Every operation is
//! a pure function of its explicit inputs: no system clock, no ambient
//! configuration, no hidden state beyond the injected canonical zone list.
//! Where an input cannot be interpreted unambiguously, the engine returns an
//! error rather than guessing.
//!
//! ## Modules
//!
//! - [`instant`] — epoch-millisecond instants and the strict ISO-8601 codec
//! - [`zone`] — canonical zone lookup, wall clocks, UTC-offset resolution
//! - [`boundary`] — start/end of day, week, month, quarter, and year
//! - [`navigate`] — next/previous weekday and batch query evaluation
//! - [`business`] — business-day membership and arithmetic
//! - [`duration`] — duration decomposition, formatting, instant shifting
//! - [`ops`] — typed operation surface for command/presentation adapters
//! - [`config`] — defaults supplied by the host configuration store
//! - [`error`] — error types

pub mod boundary;
pub mod business;
pub mod config;
pub mod duration;
pub mod error;
pub mod instant;
pub mod navigate;
pub mod ops;
pub mod zone;

pub use boundary::{end_of, start_of, Period, WeekStart};
pub use business::{add_business_days, is_business_day, BusinessDaySet, ExclusionSet};
pub use config::EngineDefaults;
pub use duration::{
    between, format_duration, parse_adjustment, shift, Adjustment, DurationBreakdown, Verbosity,
};
pub use error::{AlmanacError, Result};
pub use instant::{format_instant, parse_instant, Instant, NaivePolicy};
pub use navigate::{
    next_weekday, parse_weekday, previous_weekday, run_queries, EvaluationMode, QueryStep,
};
pub use ops::{
    BoundaryTime, BusinessDayCheck, BusinessDayShift, ConvertedTime, Engine, NavigatedTime,
    NavigationRun, NavigationStep, ShiftedTime,
};
pub use zone::{from_instant, offset_minutes, to_instant, WallClock, ZoneDb, ZoneId};
