//! Read-side snapshots produced by [`ErrorMetrics`](super::ErrorMetrics).

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::types::{AlertLevel, ErrorRecord, ErrorType, OperationRecord};
use crate::UtcDateTime;

/// A key with its occurrence count, used for "top N" rankings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedCount {
    pub name: String,
    pub count: usize,
}

/// Aggregate statistics over a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub time_window_hours: f64,
    pub total_operations: usize,
    pub successful_operations: usize,
    pub failed_operations: usize,
    pub error_rate: f64,
    pub success_rate: f64,
    pub error_by_type: BTreeMap<ErrorType, usize>,
    pub error_by_severity: BTreeMap<AlertLevel, usize>,
    pub top_problematic_symbols: Vec<RankedCount>,
    pub top_problematic_operations: Vec<RankedCount>,
    /// Mean duration of successful operations that reported one, in seconds.
    pub average_operation_duration: Option<f64>,
    pub session_duration_hours: f64,
    pub last_error_time: Option<UtcDateTime>,
    pub alert_threshold: f64,
    /// Outcome of the alert gate at the default window; producing the
    /// summary may consume the alert slot.
    pub should_alert: bool,
}

/// One half-open `[bucket_start, bucket_end)` slot of an error trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendBucket {
    pub bucket_start: UtcDateTime,
    pub bucket_end: UtcDateTime,
    pub count: usize,
}

pub type ErrorTrends = BTreeMap<ErrorType, Vec<TrendBucket>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfiguration {
    pub error_threshold: f64,
    pub alert_window_minutes: f64,
    pub max_history_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_start: UtcDateTime,
    pub export_time: UtcDateTime,
    pub session_duration_hours: f64,
}

/// Cumulative session counters; unlike records these survive retention sweeps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsCounters {
    pub error_counts: BTreeMap<ErrorType, u64>,
    pub success_counts: BTreeMap<String, u64>,
    pub operation_counts: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedRecords {
    pub error_records: Vec<ErrorRecord>,
    pub operation_records: Vec<OperationRecord>,
}

/// Full metrics dump for external analysis; persisting it is the caller's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsExport {
    pub configuration: ExportConfiguration,
    pub session_info: SessionInfo,
    pub summary: ErrorSummary,
    pub counters: MetricsCounters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<ExportedRecords>,
}

/// Counts keys in first-seen order and returns the `limit` most frequent.
/// Ties keep first-seen order.
pub(crate) fn top_counts<'a, I>(keys: I, limit: usize) -> Vec<RankedCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut order: Vec<RankedCount> = Vec::new();
    let mut positions: HashMap<&'a str, usize> = HashMap::new();

    for key in keys {
        match positions.get(key) {
            Some(&index) => order[index].count += 1,
            None => {
                positions.insert(key, order.len());
                order.push(RankedCount {
                    name: key.to_owned(),
                    count: 1,
                });
            }
        }
    }

    order.sort_by(|left, right| right.count.cmp(&left.count));
    order.truncate(limit);
    order
}
