//! Engine defaults supplied by the host's configuration store.
//!
//! The core never reads ambient configuration; adapters deserialize this
//! struct from wherever they keep settings and pass it in as a plain value.

use serde::Deserialize;

use crate::boundary::WeekStart;

/// Default values consumed by the [`Engine`](crate::ops::Engine) facade.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineDefaults {
    /// Week-start convention for period and weekday-offset computations.
    pub week_start: WeekStart,
    /// Business-day set in the compact list syntax (e.g. `"Mon-Fri"`).
    pub business_days: String,
    /// Calendar dates (`YYYY-MM-DD`) that are never business days.
    pub excluded_dates: Vec<String>,
    /// strftime-style format for the `formatted` field of rendered results.
    pub output_format: String,
}

impl Default for EngineDefaults {
    fn default() -> Self {
        Self {
            week_start: WeekStart::Monday,
            business_days: "Mon-Fri".to_string(),
            excluded_dates: Vec::new(),
            output_format: "%Y-%m-%d %H:%M:%S %Z".to_string(),
        }
    }
}
