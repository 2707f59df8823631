//! Component configuration.
//!
//! Every config struct has sensible defaults, a `validate` step, and a
//! `from_env` constructor reading `VALUEWATCH_*` variables.
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `VALUEWATCH_ERROR_THRESHOLD` | [`MetricsConfig::error_threshold`] | `0.1` |
//! | `VALUEWATCH_ALERT_WINDOW_MINUTES` | [`MetricsConfig::alert_window`] | `60` |
//! | `VALUEWATCH_MAX_HISTORY_HOURS` | [`MetricsConfig::max_history`] | `24` |
//! | `VALUEWATCH_VALIDATION_CACHE_HOURS` | [`ValidatorConfig::cache_duration`] | `24` |
//! | `VALUEWATCH_BATCH_PAUSE_MS` | [`ValidatorConfig::batch_pause`] | `500` |
//! | `VALUEWATCH_FILTERING_MODE` | [`FilterConfig::filtering_mode`] | `tolerant` |
//! | `VALUEWATCH_HIGH_FILTER_RATE_THRESHOLD` | [`FilterConfig::high_filter_rate_threshold`] | `0.3` |
//! | `VALUEWATCH_EMPTY_LIST_ALERT` | [`FilterConfig::empty_list_alert`] | `true` |
//! | `VALUEWATCH_FILTER_CACHE_MINUTES` | [`FilterConfig::cache_duration`] | `60` |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::filter::FilteringMode;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;

/// Settings for [`ErrorMetrics`](crate::ErrorMetrics).
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Error rate (0.0-1.0) above which an alert is warranted.
    pub error_threshold: f64,
    /// Window used by default alert evaluation.
    pub alert_window: Duration,
    /// Records older than this are discarded by the retention sweep.
    pub max_history: Duration,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            error_threshold: 0.1,
            alert_window: Duration::from_secs(60 * MINUTE),
            max_history: Duration::from_secs(24 * HOUR),
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("error_threshold", self.error_threshold)?;
        check_non_zero("alert_window", self.alert_window)?;
        check_non_zero("max_history", self.max_history)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(threshold) = read_parsed::<f64, _>(&lookup, "VALUEWATCH_ERROR_THRESHOLD")? {
            config.error_threshold = threshold;
        }
        if let Some(minutes) = read_parsed::<u64, _>(&lookup, "VALUEWATCH_ALERT_WINDOW_MINUTES")? {
            config.alert_window = Duration::from_secs(minutes * MINUTE);
        }
        if let Some(hours) = read_parsed::<u64, _>(&lookup, "VALUEWATCH_MAX_HISTORY_HOURS")? {
            config.max_history = Duration::from_secs(hours * HOUR);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Settings for [`SymbolValidator`](crate::SymbolValidator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// How long a validation outcome is reused before probing again.
    pub cache_duration: Duration,
    /// Pause inserted during batch validation to respect source rate limits.
    pub batch_pause: Duration,
    /// A pause follows every `batch_pause_every` symbols.
    pub batch_pause_every: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            cache_duration: Duration::from_secs(24 * HOUR),
            batch_pause: Duration::from_millis(500),
            batch_pause_every: 10,
        }
    }
}

impl ValidatorConfig {
    /// Same defaults without batch pacing, for offline sources.
    pub fn unpaced() -> Self {
        Self {
            batch_pause: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_zero("cache_duration", self.cache_duration)?;
        if self.batch_pause_every == 0 {
            return Err(ConfigError::OutOfRange {
                field: "batch_pause_every",
                value: 0.0,
                min: 1.0,
                max: f64::from(u32::MAX),
            });
        }
        Ok(())
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(hours) = read_parsed::<u64, _>(&lookup, "VALUEWATCH_VALIDATION_CACHE_HOURS")? {
            config.cache_duration = Duration::from_secs(hours * HOUR);
        }
        if let Some(millis) = read_parsed::<u64, _>(&lookup, "VALUEWATCH_BATCH_PAUSE_MS")? {
            config.batch_pause = Duration::from_millis(millis);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Settings for [`SymbolFilter`](crate::SymbolFilter).
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub filtering_mode: FilteringMode,
    /// Fraction of filtered symbols above which a warning alert is raised.
    pub high_filter_rate_threshold: f64,
    pub empty_list_alert: bool,
    /// Lifetime of cached filtering results.
    pub cache_duration: Duration,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            filtering_mode: FilteringMode::Tolerant,
            high_filter_rate_threshold: 0.3,
            empty_list_alert: true,
            cache_duration: Duration::from_secs(HOUR),
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("high_filter_rate_threshold", self.high_filter_rate_threshold)?;
        check_non_zero("cache_duration", self.cache_duration)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup("VALUEWATCH_FILTERING_MODE") {
            config.filtering_mode = raw.parse()?;
        }
        if let Some(threshold) =
            read_parsed::<f64, _>(&lookup, "VALUEWATCH_HIGH_FILTER_RATE_THRESHOLD")?
        {
            config.high_filter_rate_threshold = threshold;
        }
        if let Some(raw) = lookup("VALUEWATCH_EMPTY_LIST_ALERT") {
            config.empty_list_alert = parse_flag("VALUEWATCH_EMPTY_LIST_ALERT", &raw)?;
        }
        if let Some(minutes) = read_parsed::<u64, _>(&lookup, "VALUEWATCH_FILTER_CACHE_MINUTES")? {
            config.cache_duration = Duration::from_secs(minutes * MINUTE);
        }
        config.validate()?;
        Ok(config)
    }
}

fn read_parsed<T, F>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnvValue {
                name: name.to_owned(),
                value: raw,
            }),
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvValue {
            name: name.to_owned(),
            value: raw.to_owned(),
        }),
    }
}

fn check_fraction(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: 1.0,
        });
    }
    Ok(())
}

fn check_non_zero(field: &'static str, value: Duration) -> Result<(), ConfigError> {
    if value.is_zero() {
        return Err(ConfigError::ZeroDuration { field });
    }
    Ok(())
}
