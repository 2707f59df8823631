//! # Symbol Filter
//!
//! Turns a raw candidate list into a policy-filtered list, feeding every
//! outcome back into [`ErrorMetrics`] and raising alerts on degenerate
//! results.
//!
//! ## Modes
//!
//! | Mode | VALID | DELISTED | INVALID / NOT_FOUND | ERROR |
//! |------|-------|----------|---------------------|-------|
//! | `strict` | include | exclude | exclude | exclude |
//! | `tolerant` (default) | include | exclude | exclude | include |
//! | `permissive` | include | exclude | include | include |
//!
//! `tolerant` ships symbols whose lookup merely failed downstream as if they
//! were valid.
//!
//! ## Alerts
//!
//! Both alerts are recorded as [`ErrorType::DataValidation`] errors and each
//! owns an independent 30-minute cooldown:
//!
//! - empty result list: [`AlertLevel::Critical`] under `ALL_SYMBOLS`, tagged
//!   `alert_type=empty_symbol_list`
//! - filter rate above the threshold: [`AlertLevel::Warning`] under
//!   `SYMBOL_LIST`, tagged `alert_type=high_filter_rate`

use std::collections::{BTreeSet, HashMap};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::alert_gate::{CooldownGate, ALERT_COOLDOWN};
use crate::cache::TtlCache;
use crate::clock::{Clock, SystemClock};
use crate::config::FilterConfig;
use crate::domain::duration_serde;
use crate::error::ConfigError;
use crate::metrics::{AlertLevel, ErrorMetrics, ErrorType, CLEANUP_INTERVAL};
use crate::validator::{SymbolValidator, ValidationResult, ValidationStatus};
use crate::{Attributes, UtcDateTime, ValidationError};

/// Sentinel symbol for the empty-list alert.
pub const ALL_SYMBOLS: &str = "ALL_SYMBOLS";
/// Sentinel symbol for the high-filter-rate alert.
pub const SYMBOL_LIST: &str = "SYMBOL_LIST";

const HISTORY_WINDOW: Duration = Duration::from_secs(24 * 3600);
const LOG_SAMPLE: usize = 5;

/// Policy deciding which validation outcomes survive filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilteringMode {
    Strict,
    Tolerant,
    Permissive,
}

impl FilteringMode {
    pub const ALL: [Self; 3] = [Self::Strict, Self::Tolerant, Self::Permissive];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Tolerant => "tolerant",
            Self::Permissive => "permissive",
        }
    }

    /// DELISTED is excluded in every mode.
    pub const fn includes(self, status: ValidationStatus) -> bool {
        match (self, status) {
            (_, ValidationStatus::Valid) => true,
            (_, ValidationStatus::Delisted) => false,
            (Self::Strict, _) => false,
            (Self::Tolerant, ValidationStatus::Error) => true,
            (Self::Tolerant, _) => false,
            (Self::Permissive, _) => true,
        }
    }
}

impl Default for FilteringMode {
    fn default() -> Self {
        Self::Tolerant
    }
}

impl Display for FilteringMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilteringMode {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or(ValidationError::InvalidFilteringMode { value: normalized })
    }
}

/// Outcome of one filtering call.
///
/// `original_symbols` keeps the caller's list as given. Every entry lands in
/// exactly one of `valid_symbols` or `filtered_symbols`, and
/// `filtered_symbols` is `delisted ++ invalid ++ error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteringResult {
    pub original_symbols: Vec<String>,
    pub valid_symbols: Vec<String>,
    pub filtered_symbols: Vec<String>,
    pub delisted_symbols: Vec<String>,
    pub invalid_symbols: Vec<String>,
    pub error_symbols: Vec<String>,
    pub filtering_mode: FilteringMode,
    #[serde(with = "duration_serde::secs")]
    pub processing_time: Duration,
    pub timestamp: UtcDateTime,
}

impl FilteringResult {
    /// Share of the original list that was filtered out; 0.0 for an empty list.
    pub fn filter_rate(&self) -> f64 {
        share(self.filtered_symbols.len(), self.original_symbols.len())
    }

    /// Share of the original list that survived; 0.0 for an empty list.
    pub fn success_rate(&self) -> f64 {
        share(self.valid_symbols.len(), self.original_symbols.len())
    }
}

/// Cumulative counters across filtering calls, cache hits excluded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteringStats {
    pub total_filtering_operations: u64,
    pub total_symbols_processed: u64,
    pub total_symbols_filtered: u64,
    pub total_valid_symbols: u64,
    pub delisted_count: u64,
    pub invalid_count: u64,
    pub error_count: u64,
    #[serde(with = "duration_serde::secs")]
    pub total_processing_time: Duration,
    #[serde(with = "duration_serde::secs")]
    pub average_processing_time: Duration,
    pub empty_list_alerts: u64,
    pub high_filter_rate_alerts: u64,
}

impl FilteringStats {
    fn update_from_result(&mut self, result: &FilteringResult) {
        self.total_filtering_operations += 1;
        self.total_symbols_processed += result.original_symbols.len() as u64;
        self.total_symbols_filtered += result.filtered_symbols.len() as u64;
        self.total_valid_symbols += result.valid_symbols.len() as u64;
        self.delisted_count += result.delisted_symbols.len() as u64;
        self.invalid_count += result.invalid_symbols.len() as u64;
        self.error_count += result.error_symbols.len() as u64;
        self.total_processing_time += result.processing_time;
        self.average_processing_time = self
            .total_processing_time
            .div_f64(self.total_filtering_operations as f64);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub total_operations: u64,
    pub total_symbols_processed: u64,
    pub total_symbols_filtered: u64,
    pub total_valid_symbols: u64,
    pub overall_filter_rate: f64,
    pub overall_success_rate: f64,
    #[serde(with = "duration_serde::secs")]
    pub average_processing_time: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownStats {
    pub delisted_count: u64,
    pub invalid_count: u64,
    pub error_count: u64,
}

/// Per-call averages over the last 24 hours of filtering history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentStats {
    pub recent_operations: usize,
    pub recent_filter_rate: f64,
    pub recent_success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertStats {
    pub empty_list_alerts: u64,
    pub high_filter_rate_alerts: u64,
    pub last_empty_list_alert: Option<UtcDateTime>,
    pub last_high_filter_rate_alert: Option<UtcDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    pub filtering_mode: FilteringMode,
    pub high_filter_rate_threshold: f64,
    pub empty_list_alert: bool,
    pub cache_duration_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteringStatistics {
    pub overall: OverallStats,
    pub breakdown: BreakdownStats,
    pub recent: RecentStats,
    pub alerts: AlertStats,
    pub configuration: FilterSettings,
}

struct FilterState {
    config: FilterConfig,
    cache: TtlCache<FilteringResult>,
    stats: FilteringStats,
    history: Vec<FilteringResult>,
}

/// Policy-driven symbol filter backed by a shared validator and metrics ledger.
pub struct SymbolFilter {
    validator: Arc<SymbolValidator>,
    metrics: Arc<ErrorMetrics>,
    clock: Arc<dyn Clock>,
    empty_list_gate: CooldownGate,
    high_rate_gate: CooldownGate,
    state: Mutex<FilterState>,
}

impl SymbolFilter {
    pub fn new(
        validator: Arc<SymbolValidator>,
        metrics: Arc<ErrorMetrics>,
        config: FilterConfig,
    ) -> Self {
        Self::with_clock(validator, metrics, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        validator: Arc<SymbolValidator>,
        metrics: Arc<ErrorMetrics>,
        config: FilterConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!(
            mode = %config.filtering_mode,
            high_filter_rate_threshold = config.high_filter_rate_threshold,
            empty_list_alert = config.empty_list_alert,
            "symbol filter initialized"
        );

        Self {
            empty_list_gate: CooldownGate::new(ALERT_COOLDOWN, clock.clone()),
            high_rate_gate: CooldownGate::new(ALERT_COOLDOWN, clock.clone()),
            state: Mutex::new(FilterState {
                cache: TtlCache::new(config.cache_duration, clock.clone()),
                config,
                stats: FilteringStats::default(),
                history: Vec::new(),
            }),
            validator,
            metrics,
            clock,
        }
    }

    pub fn config(&self) -> FilterConfig {
        self.lock().config.clone()
    }

    /// Validates and partitions `symbols` under `mode` (default: configured mode).
    ///
    /// A cached result for the same symbol set and mode is returned as-is,
    /// without alerts or metrics.
    pub fn filter_symbols<S: AsRef<str>>(
        &self,
        symbols: &[S],
        mode: Option<FilteringMode>,
        operation_name: &str,
        log_details: bool,
    ) -> FilteringResult {
        let started = Instant::now();
        let config = self.config();
        let mode = mode.unwrap_or(config.filtering_mode);
        info!(
            operation = operation_name,
            symbols = symbols.len(),
            mode = %mode,
            "starting symbol filtering"
        );

        let cache_key = cache_key(symbols, mode);
        if let Some(cached) = self.lock().cache.get(&cache_key) {
            debug!(symbols = symbols.len(), mode = %mode, "filtering cache hit");
            return cached;
        }

        let validation = self.validator.batch_validate_symbols(symbols);

        let mut valid = Vec::new();
        let mut delisted = Vec::new();
        let mut invalid = Vec::new();
        let mut errors = Vec::new();
        for raw in symbols {
            let raw = raw.as_ref();
            let Some(outcome) = validation.get(raw) else {
                continue;
            };
            if mode.includes(outcome.status) {
                valid.push(raw.to_owned());
                continue;
            }
            match outcome.status {
                ValidationStatus::Delisted => delisted.push(raw.to_owned()),
                ValidationStatus::Invalid | ValidationStatus::NotFound => {
                    invalid.push(raw.to_owned())
                }
                ValidationStatus::Valid | ValidationStatus::Error => errors.push(raw.to_owned()),
            }
        }

        let filtered = [delisted.as_slice(), invalid.as_slice(), errors.as_slice()].concat();
        let result = FilteringResult {
            original_symbols: symbols.iter().map(|s| s.as_ref().to_owned()).collect(),
            valid_symbols: valid,
            filtered_symbols: filtered,
            delisted_symbols: delisted,
            invalid_symbols: invalid,
            error_symbols: errors,
            filtering_mode: mode,
            processing_time: started.elapsed(),
            timestamp: self.clock.now(),
        };

        {
            let mut state = self.lock();
            state.cache.put(cache_key, result.clone());
            if let Some(removed) = state.cache.sweep(CLEANUP_INTERVAL).filter(|&n| n > 0) {
                debug!(removed, "expired filtering results swept");
            }
            state.stats.update_from_result(&result);
            let cutoff = result.timestamp.minus(HISTORY_WINDOW);
            state.history.retain(|past| past.timestamp >= cutoff);
            state.history.push(result.clone());
        }

        if log_details {
            log_filtering_result(&result, operation_name);
        }
        self.check_alert_conditions(&result, &config, operation_name);
        self.record_filtering_metrics(&result, &validation, operation_name);

        result
    }

    /// Valid symbols of a default-mode filtering pass, logging what was removed.
    pub fn pre_filter_symbol_list<S: AsRef<str>>(
        &self,
        symbols: &[S],
        operation_name: &str,
        update_log: bool,
    ) -> Vec<String> {
        info!(
            operation = operation_name,
            original = symbols.len(),
            "pre-filtering symbol list"
        );
        let result = self.filter_symbols(symbols, None, operation_name, true);
        if update_log {
            log_symbol_list_update(&result, operation_name);
        }
        result.valid_symbols
    }

    /// Returns whether `symbols` is empty, raising the empty-list alert when
    /// enabled and either forced or outside its cooldown.
    pub fn validate_and_alert_empty_list<S: AsRef<str>>(
        &self,
        symbols: &[S],
        operation_name: &str,
        force_alert: bool,
    ) -> bool {
        let is_empty = symbols.is_empty();
        let config = self.config();
        if !is_empty || !config.empty_list_alert {
            return is_empty;
        }

        let granted = if force_alert {
            self.empty_list_gate.force_acquire();
            true
        } else {
            self.empty_list_gate.try_acquire()
        };
        if granted {
            self.send_empty_list_alert(config.filtering_mode, operation_name);
            self.lock().stats.empty_list_alerts += 1;
        }
        is_empty
    }

    pub fn get_filtering_statistics(&self) -> FilteringStatistics {
        let now = self.clock.now();
        let cutoff = now.minus(HISTORY_WINDOW);
        let state = self.lock();
        let stats = &state.stats;

        let recent: Vec<&FilteringResult> = state
            .history
            .iter()
            .filter(|result| result.timestamp >= cutoff)
            .collect();
        let average = |rate: fn(&FilteringResult) -> f64| {
            if recent.is_empty() {
                0.0
            } else {
                recent.iter().map(|result| rate(result)).sum::<f64>() / recent.len() as f64
            }
        };

        FilteringStatistics {
            overall: OverallStats {
                total_operations: stats.total_filtering_operations,
                total_symbols_processed: stats.total_symbols_processed,
                total_symbols_filtered: stats.total_symbols_filtered,
                total_valid_symbols: stats.total_valid_symbols,
                overall_filter_rate: share_u64(
                    stats.total_symbols_filtered,
                    stats.total_symbols_processed,
                ),
                overall_success_rate: share_u64(
                    stats.total_valid_symbols,
                    stats.total_symbols_processed,
                ),
                average_processing_time: stats.average_processing_time,
            },
            breakdown: BreakdownStats {
                delisted_count: stats.delisted_count,
                invalid_count: stats.invalid_count,
                error_count: stats.error_count,
            },
            recent: RecentStats {
                recent_operations: recent.len(),
                recent_filter_rate: average(FilteringResult::filter_rate),
                recent_success_rate: average(FilteringResult::success_rate),
            },
            alerts: AlertStats {
                empty_list_alerts: stats.empty_list_alerts,
                high_filter_rate_alerts: stats.high_filter_rate_alerts,
                last_empty_list_alert: self.empty_list_gate.last_fired(),
                last_high_filter_rate_alert: self.high_rate_gate.last_fired(),
            },
            configuration: FilterSettings {
                filtering_mode: state.config.filtering_mode,
                high_filter_rate_threshold: state.config.high_filter_rate_threshold,
                empty_list_alert: state.config.empty_list_alert,
                cache_duration_hours: state.config.cache_duration.as_secs_f64() / 3600.0,
            },
        }
    }

    pub fn stats(&self) -> FilteringStats {
        self.lock().stats.clone()
    }

    /// Updates the given settings; the previous configuration is kept when the
    /// result would be invalid.
    pub fn configure_filtering(
        &self,
        filtering_mode: Option<FilteringMode>,
        high_filter_rate_threshold: Option<f64>,
        empty_list_alert: Option<bool>,
    ) -> Result<(), ConfigError> {
        let mut state = self.lock();
        let mut config = state.config.clone();
        if let Some(mode) = filtering_mode {
            config.filtering_mode = mode;
        }
        if let Some(threshold) = high_filter_rate_threshold {
            config.high_filter_rate_threshold = threshold;
        }
        if let Some(enabled) = empty_list_alert {
            config.empty_list_alert = enabled;
        }
        config.validate()?;

        info!(
            mode = %config.filtering_mode,
            high_filter_rate_threshold = config.high_filter_rate_threshold,
            empty_list_alert = config.empty_list_alert,
            "filtering configuration updated"
        );
        state.config = config;
        Ok(())
    }

    pub fn clear_cache(&self) {
        let removed = self.lock().cache.clear();
        info!(removed, "filtering cache cleared");
    }

    fn check_alert_conditions(
        &self,
        result: &FilteringResult,
        config: &FilterConfig,
        operation_name: &str,
    ) {
        if result.valid_symbols.is_empty() {
            self.validate_and_alert_empty_list(&result.valid_symbols, operation_name, false);
        }

        if result.filter_rate() > config.high_filter_rate_threshold
            && self.high_rate_gate.try_acquire()
        {
            self.send_high_filter_rate_alert(result, config.high_filter_rate_threshold, operation_name);
            self.lock().stats.high_filter_rate_alerts += 1;
        }
    }

    fn send_empty_list_alert(&self, mode: FilteringMode, operation_name: &str) {
        error!(
            operation = operation_name,
            "CRITICAL ALERT: empty symbol list, every symbol was filtered out"
        );

        let mut info = Attributes::new();
        info.insert("alert_type".to_owned(), json!("empty_symbol_list"));
        info.insert("filtering_mode".to_owned(), json!(mode.as_str()));
        info.insert(
            "timestamp".to_owned(),
            json!(self.clock.now().format_rfc3339()),
        );
        self.metrics.record_error(
            ErrorType::DataValidation,
            ALL_SYMBOLS,
            operation_name,
            "empty symbol list after filtering, all symbols removed",
            AlertLevel::Critical,
            info,
        );
    }

    fn send_high_filter_rate_alert(
        &self,
        result: &FilteringResult,
        threshold: f64,
        operation_name: &str,
    ) {
        let percent = result.filter_rate() * 100.0;
        warn!(
            operation = operation_name,
            filter_rate_percent = percent,
            threshold_percent = threshold * 100.0,
            original = result.original_symbols.len(),
            valid = result.valid_symbols.len(),
            filtered = result.filtered_symbols.len(),
            "HIGH FILTER RATE ALERT"
        );

        let mut info = Attributes::new();
        info.insert("alert_type".to_owned(), json!("high_filter_rate"));
        info.insert("filter_rate".to_owned(), json!(result.filter_rate()));
        info.insert("threshold".to_owned(), json!(threshold));
        info.insert("original_count".to_owned(), json!(result.original_symbols.len()));
        info.insert("valid_count".to_owned(), json!(result.valid_symbols.len()));
        info.insert("filtered_count".to_owned(), json!(result.filtered_symbols.len()));
        info.insert("delisted_count".to_owned(), json!(result.delisted_symbols.len()));
        info.insert("invalid_count".to_owned(), json!(result.invalid_symbols.len()));
        info.insert("error_count".to_owned(), json!(result.error_symbols.len()));
        info.insert("filtering_mode".to_owned(), json!(result.filtering_mode.as_str()));
        info.insert(
            "timestamp".to_owned(),
            json!(self.clock.now().format_rfc3339()),
        );
        self.metrics.record_error(
            ErrorType::DataValidation,
            SYMBOL_LIST,
            operation_name,
            &format!("high filter rate: {percent:.1}% of symbols filtered"),
            AlertLevel::Warning,
            info,
        );
    }

    fn record_filtering_metrics(
        &self,
        result: &FilteringResult,
        validation: &HashMap<String, ValidationResult>,
        operation_name: &str,
    ) {
        let operation = format!("{operation_name}_filtering");
        if !result.original_symbols.is_empty() {
            let share = result
                .processing_time
                .div_f64(result.original_symbols.len() as f64);
            for symbol in &result.valid_symbols {
                self.metrics
                    .record_success(symbol, &operation, Some(share), Attributes::new());
            }
        }

        let buckets = [
            (
                &result.delisted_symbols,
                ErrorType::DelistedStock,
                "symbol filtered due to delisted status",
            ),
            (
                &result.invalid_symbols,
                ErrorType::DataNotFound,
                "symbol filtered due to invalid status",
            ),
        ];
        for (symbols, error_type, details) in buckets {
            for symbol in symbols {
                self.metrics.record_error(
                    error_type,
                    symbol,
                    &operation,
                    details,
                    AlertLevel::Warning,
                    Attributes::new(),
                );
            }
        }

        for symbol in &result.error_symbols {
            let outcome = validation.get(symbol);
            let mut info = Attributes::new();
            if let Some(message) = outcome.and_then(|outcome| outcome.error_message.as_deref()) {
                info.insert("validation_error".to_owned(), json!(message));
            }
            self.metrics.record_error(
                outcome.map_or(ErrorType::Unknown, failure_category),
                symbol,
                &operation,
                "symbol filtered due to validation error",
                AlertLevel::Error,
                info,
            );
        }
    }

    fn lock(&self) -> MutexGuard<'_, FilterState> {
        self.state
            .lock()
            .expect("symbol filter lock is not poisoned")
    }
}

impl std::fmt::Debug for SymbolFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolFilter")
            .field("empty_list_gate", &self.empty_list_gate)
            .field("high_rate_gate", &self.high_rate_gate)
            .finish_non_exhaustive()
    }
}

/// Error bucket type for a failed lookup, from the source's error kind and message.
fn failure_category(outcome: &ValidationResult) -> ErrorType {
    ErrorType::classify(
        outcome.error_type.as_deref().unwrap_or_default(),
        outcome.error_message.as_deref().unwrap_or_default(),
    )
}

fn cache_key<S: AsRef<str>>(symbols: &[S], mode: FilteringMode) -> String {
    let unique: BTreeSet<&str> = symbols.iter().map(AsRef::as_ref).collect();
    let joined: Vec<&str> = unique.into_iter().collect();
    format!("{}|{}", joined.join(","), mode.as_str())
}

fn share(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

fn share_u64(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

fn sample(symbols: &[String]) -> &[String] {
    &symbols[..symbols.len().min(LOG_SAMPLE)]
}

fn log_filtering_result(result: &FilteringResult, operation_name: &str) {
    info!(
        operation = operation_name,
        original = result.original_symbols.len(),
        valid = result.valid_symbols.len(),
        filtered = result.filtered_symbols.len(),
        filter_rate_percent = result.filter_rate() * 100.0,
        success_rate_percent = result.success_rate() * 100.0,
        processing_secs = result.processing_time.as_secs_f64(),
        "symbol filtering completed"
    );

    if result.filtered_symbols.is_empty() {
        return;
    }
    info!(
        delisted = result.delisted_symbols.len(),
        invalid = result.invalid_symbols.len(),
        errors = result.error_symbols.len(),
        "filtering breakdown"
    );
    if !result.delisted_symbols.is_empty() {
        debug!(sample = ?sample(&result.delisted_symbols), "sample delisted symbols");
    }
    if !result.invalid_symbols.is_empty() {
        debug!(sample = ?sample(&result.invalid_symbols), "sample invalid symbols");
    }
}

fn log_symbol_list_update(result: &FilteringResult, operation_name: &str) {
    if result.filtered_symbols.is_empty() {
        info!(operation = operation_name, "symbol list unchanged");
        return;
    }

    warn!(
        operation = operation_name,
        removed = result.filtered_symbols.len(),
        delisted = result.delisted_symbols.len(),
        invalid = result.invalid_symbols.len(),
        errors = result.error_symbols.len(),
        "symbol list updated"
    );
    if !result.delisted_symbols.is_empty() {
        warn!(symbols = ?result.delisted_symbols, "delisted symbols removed");
    }
    if !result.invalid_symbols.is_empty() {
        warn!(symbols = ?result.invalid_symbols, "invalid symbols removed");
    }
    if !result.error_symbols.is_empty() {
        error!(symbols = ?result.error_symbols, "error symbols removed");
    }
}
