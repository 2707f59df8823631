//! # Error Metrics
//!
//! Rolling, in-memory ledger of failures and successes with rate computation
//! and alert gating.
//!
//! ## Retention
//!
//! Records are kept while `now - timestamp <= max_history`. Retention runs
//! lazily on the write path and at most once per [`CLEANUP_INTERVAL`], so the
//! ledger never holds records older than `max_history + CLEANUP_INTERVAL`.
//!
//! ## Alerting
//!
//! [`ErrorMetrics::current_error_rate`] is a pure query.
//! [`ErrorMetrics::try_acquire_alert_slot`] (aliased as
//! [`ErrorMetrics::should_alert`]) is a stateful gate: when it returns `true`
//! it also starts the [`ALERT_COOLDOWN`], so asking is acknowledging.
//!
//! ```rust
//! use valuewatch_core::{AlertLevel, Attributes, ErrorMetrics, ErrorType, MetricsConfig};
//!
//! let metrics = ErrorMetrics::new(MetricsConfig::default());
//! metrics.record_success("7203.T", "fetch_financials", None, Attributes::new());
//! metrics.record_error(
//!     ErrorType::NetworkError,
//!     "6758.T",
//!     "fetch_financials",
//!     "connection reset",
//!     AlertLevel::Warning,
//!     Attributes::new(),
//! );
//!
//! assert_eq!(metrics.get_error_rate(None, None), 0.5);
//! assert!(metrics.should_alert(None));
//! assert!(!metrics.should_alert(None));
//! ```

mod report;
mod types;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, error, info, warn};

pub use report::{
    ErrorSummary, ErrorTrends, ExportConfiguration, ExportedRecords, MetricsCounters,
    MetricsExport, RankedCount, SessionInfo, TrendBucket,
};
pub use types::{AlertLevel, ErrorEvent, ErrorRecord, ErrorType, OperationRecord};

use crate::alert_gate::{CooldownGate, ALERT_COOLDOWN};
use crate::clock::{Clock, SystemClock};
use crate::config::MetricsConfig;
use crate::{Attributes, UtcDateTime};

/// Minimum wall-clock progress between two retention sweeps.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Upper bound on the number of trend buckets produced per error type.
pub const MAX_TREND_BUCKETS: u64 = 10_000;

const TOP_N: usize = 10;

#[derive(Debug)]
struct Ledger {
    error_records: Vec<ErrorRecord>,
    operation_records: Vec<OperationRecord>,
    by_type: HashMap<ErrorType, Vec<usize>>,
    by_symbol: HashMap<String, Vec<usize>>,
    by_operation: HashMap<String, Vec<usize>>,
    counters: MetricsCounters,
    session_start: UtcDateTime,
    last_cleanup: UtcDateTime,
}

impl Ledger {
    fn new(now: UtcDateTime) -> Self {
        Self {
            error_records: Vec::new(),
            operation_records: Vec::new(),
            by_type: HashMap::new(),
            by_symbol: HashMap::new(),
            by_operation: HashMap::new(),
            counters: MetricsCounters::default(),
            session_start: now,
            last_cleanup: now,
        }
    }

    fn push_error(&mut self, record: ErrorRecord) {
        let index = self.error_records.len();
        *self.counters.error_counts.entry(record.error_type).or_insert(0) += 1;
        self.index_error(index, &record);
        self.error_records.push(record);
    }

    fn push_success(&mut self, record: OperationRecord) {
        let counters = &mut self.counters;
        *counters
            .success_counts
            .entry(record.operation.clone())
            .or_insert(0) += 1;
        *counters
            .operation_counts
            .entry(record.operation.clone())
            .or_insert(0) += 1;
        *counters
            .operation_counts
            .entry(format!("{}_total", record.operation))
            .or_insert(0) += 1;
        self.operation_records.push(record);
    }

    fn index_error(&mut self, index: usize, record: &ErrorRecord) {
        self.by_type.entry(record.error_type).or_default().push(index);
        self.by_symbol
            .entry(record.symbol.clone())
            .or_default()
            .push(index);
        self.by_operation
            .entry(record.operation.clone())
            .or_default()
            .push(index);
    }

    fn rebuild_indexes(&mut self) {
        self.by_type.clear();
        self.by_symbol.clear();
        self.by_operation.clear();

        let records = std::mem::take(&mut self.error_records);
        for (index, record) in records.iter().enumerate() {
            self.index_error(index, record);
        }
        self.error_records = records;
    }

    /// Drops expired records when the throttle allows. Returns the number of
    /// removed (error, operation) records, or `None` when throttled.
    fn sweep(&mut self, now: UtcDateTime, max_history: Duration) -> Option<(usize, usize)> {
        if now.duration_since(self.last_cleanup) < CLEANUP_INTERVAL {
            return None;
        }

        let errors_before = self.error_records.len();
        let operations_before = self.operation_records.len();

        self.error_records
            .retain(|record| now.duration_since(record.timestamp) <= max_history);
        self.operation_records
            .retain(|record| now.duration_since(record.timestamp) <= max_history);
        self.rebuild_indexes();
        self.last_cleanup = now;

        Some((
            errors_before - self.error_records.len(),
            operations_before - self.operation_records.len(),
        ))
    }

    fn errors_since(&self, cutoff: UtcDateTime) -> impl Iterator<Item = &ErrorRecord> {
        self.error_records
            .iter()
            .filter(move |record| record.timestamp >= cutoff)
    }

    fn operations_since(&self, cutoff: UtcDateTime) -> impl Iterator<Item = &OperationRecord> {
        self.operation_records
            .iter()
            .filter(move |record| record.timestamp >= cutoff)
    }

    fn error_indices_for_operation(&self, operation: &str) -> &[usize] {
        self.by_operation
            .get(operation)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Time-bounded error/success ledger with alert gating.
///
/// All methods take `&self`; share one instance between collaborators with an
/// `Arc`.
pub struct ErrorMetrics {
    config: MetricsConfig,
    clock: Arc<dyn Clock>,
    alert_gate: CooldownGate,
    ledger: Mutex<Ledger>,
}

impl ErrorMetrics {
    pub fn new(config: MetricsConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: MetricsConfig, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        info!(
            error_threshold = config.error_threshold,
            alert_window_minutes = config.alert_window.as_secs() / 60,
            max_history_hours = config.max_history.as_secs() / 3600,
            "error metrics initialized"
        );

        Self {
            alert_gate: CooldownGate::new(ALERT_COOLDOWN, clock.clone()),
            ledger: Mutex::new(Ledger::new(now)),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Appends an error record stamped with the current time.
    pub fn record_error(
        &self,
        error_type: ErrorType,
        symbol: &str,
        operation: &str,
        details: &str,
        severity: AlertLevel,
        additional_info: Attributes,
    ) {
        let now = self.clock.now();
        match severity {
            AlertLevel::Critical => error!(
                error_type = %error_type, symbol, operation, details,
                "CRITICAL error recorded"
            ),
            AlertLevel::Error => {
                error!(error_type = %error_type, symbol, operation, details, "error recorded")
            }
            AlertLevel::Warning => {
                warn!(error_type = %error_type, symbol, operation, details, "error recorded")
            }
            AlertLevel::Info => {
                info!(error_type = %error_type, symbol, operation, details, "error recorded")
            }
        }

        let mut ledger = self.lock();
        ledger.push_error(ErrorRecord {
            timestamp: now,
            error_type,
            symbol: symbol.to_owned(),
            operation: operation.to_owned(),
            details: details.to_owned(),
            severity,
            additional_info,
        });
        self.sweep(&mut ledger, now);
    }

    pub fn record_error_event(&self, event: ErrorEvent) {
        self.record_error(
            event.error_type,
            &event.symbol,
            &event.operation,
            &event.details,
            event.severity,
            event.additional_info,
        );
    }

    /// Appends a success record stamped with the current time.
    pub fn record_success(
        &self,
        symbol: &str,
        operation: &str,
        duration: Option<Duration>,
        additional_info: Attributes,
    ) {
        let now = self.clock.now();
        debug!(
            symbol,
            operation,
            duration_secs = duration.map(|d| d.as_secs_f64()),
            "success recorded"
        );

        let mut ledger = self.lock();
        ledger.push_success(OperationRecord {
            timestamp: now,
            symbol: symbol.to_owned(),
            operation: operation.to_owned(),
            duration,
            additional_info,
        });
        self.sweep(&mut ledger, now);
    }

    /// Errors / (errors + successes) within `time_window` of now, optionally
    /// restricted to one operation. Defaults to the whole session; 0.0 when
    /// nothing was observed.
    pub fn get_error_rate(&self, operation: Option<&str>, time_window: Option<Duration>) -> f64 {
        let now = self.clock.now();
        let ledger = self.lock();
        let window = time_window.unwrap_or_else(|| now.duration_since(ledger.session_start));
        let cutoff = now.minus(window);

        let (errors, successes) = match operation {
            Some(operation) => {
                let errors = ledger
                    .error_indices_for_operation(operation)
                    .iter()
                    .filter(|&&index| ledger.error_records[index].timestamp >= cutoff)
                    .count();
                let successes = ledger
                    .operations_since(cutoff)
                    .filter(|record| record.operation == operation)
                    .count();
                (errors, successes)
            }
            None => (
                ledger.errors_since(cutoff).count(),
                ledger.operations_since(cutoff).count(),
            ),
        };

        let rate = ratio(errors, errors + successes);
        debug!(
            operation = operation.unwrap_or("all"),
            window_secs = window.as_secs(),
            errors,
            total = errors + successes,
            rate,
            "error rate calculated"
        );
        rate
    }

    /// Overall error rate over `time_window`, defaulting to the alert window.
    pub fn current_error_rate(&self, time_window: Option<Duration>) -> f64 {
        self.get_error_rate(None, Some(time_window.unwrap_or(self.config.alert_window)))
    }

    /// Grants an alert when the error rate strictly exceeds the threshold and
    /// no alert was granted within the cooldown. A grant starts a new cooldown.
    pub fn try_acquire_alert_slot(&self, time_window: Option<Duration>) -> bool {
        if !self.alert_gate.is_open() {
            return false;
        }

        let rate = self.current_error_rate(time_window);
        if rate <= self.config.error_threshold {
            return false;
        }

        let granted = self.alert_gate.try_acquire();
        if granted {
            warn!(
                current_rate = rate,
                threshold = self.config.error_threshold,
                "alert threshold exceeded"
            );
        }
        granted
    }

    /// Alias of [`ErrorMetrics::try_acquire_alert_slot`]; not idempotent.
    pub fn should_alert(&self, time_window: Option<Duration>) -> bool {
        self.try_acquire_alert_slot(time_window)
    }

    pub fn last_alert_time(&self) -> Option<UtcDateTime> {
        self.alert_gate.last_fired()
    }

    /// Statistics over `time_window` (default: whole session).
    ///
    /// `should_alert` in the result is evaluated through the alert gate at the
    /// default window, so building a summary can consume the alert slot.
    pub fn get_error_summary(&self, time_window: Option<Duration>) -> ErrorSummary {
        let mut summary = {
            let now = self.clock.now();
            let ledger = self.lock();
            let window = time_window.unwrap_or_else(|| now.duration_since(ledger.session_start));
            let cutoff = now.minus(window);

            let recent_errors: Vec<&ErrorRecord> = ledger.errors_since(cutoff).collect();
            let recent_operations: Vec<&OperationRecord> =
                ledger.operations_since(cutoff).collect();

            let failed = recent_errors.len();
            let successful = recent_operations.len();
            let total = failed + successful;

            let mut error_by_type = std::collections::BTreeMap::new();
            let mut error_by_severity = std::collections::BTreeMap::new();
            for record in &recent_errors {
                *error_by_type.entry(record.error_type).or_insert(0) += 1;
                *error_by_severity.entry(record.severity).or_insert(0) += 1;
            }

            let durations: Vec<f64> = recent_operations
                .iter()
                .filter_map(|record| record.duration)
                .map(|duration| duration.as_secs_f64())
                .collect();
            let average_operation_duration = if durations.is_empty() {
                None
            } else {
                Some(durations.iter().sum::<f64>() / durations.len() as f64)
            };

            ErrorSummary {
                time_window_hours: hours(window),
                total_operations: total,
                successful_operations: successful,
                failed_operations: failed,
                error_rate: ratio(failed, total),
                success_rate: ratio(successful, total),
                error_by_type,
                error_by_severity,
                top_problematic_symbols: report::top_counts(
                    recent_errors.iter().map(|record| record.symbol.as_str()),
                    TOP_N,
                ),
                top_problematic_operations: report::top_counts(
                    recent_errors.iter().map(|record| record.operation.as_str()),
                    TOP_N,
                ),
                average_operation_duration,
                session_duration_hours: hours(now.duration_since(ledger.session_start)),
                last_error_time: recent_errors.last().map(|record| record.timestamp),
                alert_threshold: self.config.error_threshold,
                should_alert: false,
            }
        };

        summary.should_alert = self.try_acquire_alert_slot(None);
        summary
    }

    /// Up to `count` error records matching the optional filters, most recent first.
    pub fn get_recent_errors(
        &self,
        count: usize,
        error_type: Option<ErrorType>,
        symbol: Option<&str>,
    ) -> Vec<ErrorRecord> {
        let ledger = self.lock();
        let candidates: Vec<usize> = match (symbol, error_type) {
            (Some(symbol), _) => ledger.by_symbol.get(symbol).cloned().unwrap_or_default(),
            (None, Some(error_type)) => ledger.by_type.get(&error_type).cloned().unwrap_or_default(),
            (None, None) => (0..ledger.error_records.len()).collect(),
        };

        candidates
            .into_iter()
            .rev()
            .map(|index| &ledger.error_records[index])
            .filter(|record| error_type.map_or(true, |kind| record.error_type == kind))
            .take(count)
            .cloned()
            .collect()
    }

    /// Per-type error counts in fixed buckets covering the trailing `hours`.
    ///
    /// Buckets start at `now - hours` and are generated while the bucket start
    /// is not after now, so every type gets at least
    /// `ceil(hours * 60 / bucket_size_minutes)` buckets.
    ///
    /// Bucket width is widened when the request would need more than
    /// [`MAX_TREND_BUCKETS`] buckets per type. The window start saturates at
    /// the earliest representable instant.
    pub fn get_error_trends(&self, hours: u32, bucket_size_minutes: u32) -> ErrorTrends {
        let now = self.clock.now();
        let start = now.minus(Duration::from_secs(u64::from(hours) * 3600));
        let span_minutes = now.duration_since(start).as_secs().div_ceil(60);
        let requested_minutes = u64::from(bucket_size_minutes.max(1));
        let bucket_minutes = requested_minutes.max(span_minutes.div_ceil(MAX_TREND_BUCKETS - 1));
        if bucket_minutes != requested_minutes {
            debug!(hours, requested_minutes, bucket_minutes, "trend buckets widened");
        }
        let bucket = Duration::from_secs(bucket_minutes * 60);

        let mut bounds = Vec::new();
        let mut cursor = start;
        while cursor <= now {
            let end = cursor.plus(bucket);
            if end <= cursor {
                break;
            }
            bounds.push((cursor, end));
            cursor = end;
        }
        let window_end = bounds.last().map(|&(_, end)| end).unwrap_or(start);

        let ledger = self.lock();
        let mut trends = ErrorTrends::new();
        for error_type in ErrorType::ALL {
            let mut counts = vec![0usize; bounds.len()];
            let indices = ledger
                .by_type
                .get(&error_type)
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            for &index in indices {
                let timestamp = ledger.error_records[index].timestamp;
                if timestamp < start || timestamp >= window_end {
                    continue;
                }
                let offset = timestamp.duration_since(start).as_nanos() / bucket.as_nanos();
                if let Some(count) = counts.get_mut(offset as usize) {
                    *count += 1;
                }
            }

            let buckets = bounds
                .iter()
                .zip(counts)
                .map(|(&(bucket_start, bucket_end), count)| TrendBucket {
                    bucket_start,
                    bucket_end,
                    count,
                })
                .collect();
            trends.insert(error_type, buckets);
        }

        trends
    }

    /// Clears every record, index, counter and the alert stamp, and restarts
    /// the session clock.
    pub fn reset_metrics(&self) {
        info!("resetting error metrics");
        let now = self.clock.now();
        *self.lock() = Ledger::new(now);
        self.alert_gate.reset();
    }

    /// Runs the retention sweep if the throttle allows; returns whether it ran.
    pub fn run_maintenance(&self) -> bool {
        let now = self.clock.now();
        let mut ledger = self.lock();
        self.sweep(&mut ledger, now)
    }

    /// Configuration, session info, summary and counters, optionally with
    /// every retained record. Performs no I/O.
    pub fn export_metrics(&self, include_records: bool) -> MetricsExport {
        let summary = self.get_error_summary(None);
        let now = self.clock.now();
        let ledger = self.lock();

        let records = include_records.then(|| ExportedRecords {
            error_records: ledger.error_records.clone(),
            operation_records: ledger.operation_records.clone(),
        });

        MetricsExport {
            configuration: ExportConfiguration {
                error_threshold: self.config.error_threshold,
                alert_window_minutes: self.config.alert_window.as_secs_f64() / 60.0,
                max_history_hours: hours(self.config.max_history),
            },
            session_info: SessionInfo {
                session_start: ledger.session_start,
                export_time: now,
                session_duration_hours: hours(now.duration_since(ledger.session_start)),
            },
            summary,
            counters: ledger.counters.clone(),
            records,
        }
    }

    pub fn session_start(&self) -> UtcDateTime {
        self.lock().session_start
    }

    pub fn error_record_count(&self) -> usize {
        self.lock().error_records.len()
    }

    pub fn operation_record_count(&self) -> usize {
        self.lock().operation_records.len()
    }

    fn sweep(&self, ledger: &mut Ledger, now: UtcDateTime) -> bool {
        match ledger.sweep(now, self.config.max_history) {
            None => false,
            Some((removed_errors, removed_operations)) => {
                if removed_errors > 0 || removed_operations > 0 {
                    debug!(
                        removed_errors,
                        removed_operations,
                        retention_hours = hours(self.config.max_history),
                        "expired metric records removed"
                    );
                }
                true
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger
            .lock()
            .expect("error metrics lock is not poisoned")
    }
}

impl std::fmt::Debug for ErrorMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorMetrics")
            .field("config", &self.config)
            .field("alert_gate", &self.alert_gate)
            .finish_non_exhaustive()
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

fn hours(duration: Duration) -> f64 {
    duration.as_secs_f64() / 3600.0
}
