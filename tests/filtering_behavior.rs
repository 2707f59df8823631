//! Behavior-driven tests for symbol filtering.
//!
//! These tests drive the filter, validator and metrics ledger together and
//! verify what a screening run would observe: which symbols survive each
//! mode, which alerts reach the ledger, and when work is served from cache.

use valuewatch_tests::*;

const ONE_OF_EACH: [&str; 5] = ["7203", "1423", "9999", "6758", "0000"];
const SCREENING_RUN: [&str; 4] = ["7203", "1423", "6758", "9999"];

// =============================================================================
// Filtering Modes
// =============================================================================

#[test]
fn when_filtering_under_each_mode_partitions_follow_the_mode_table() {
    // Given: One symbol per validation outcome (0000 is unknown: NOT_FOUND)
    let pipeline = Pipeline::new(one_symbol_per_status(), FilterConfig::default());

    // When: The same list is filtered under every mode
    let strict = pipeline
        .filter
        .filter_symbols(&ONE_OF_EACH, Some(FilteringMode::Strict), "matrix", false);
    let tolerant = pipeline
        .filter
        .filter_symbols(&ONE_OF_EACH, Some(FilteringMode::Tolerant), "matrix", false);
    let permissive =
        pipeline
            .filter
            .filter_symbols(&ONE_OF_EACH, Some(FilteringMode::Permissive), "matrix", false);

    // Then: STRICT keeps only VALID
    assert_eq!(strict.valid_symbols, vec!["7203"]);
    assert_eq!(strict.delisted_symbols, vec!["1423"]);
    assert_eq!(strict.invalid_symbols, vec!["9999", "0000"]);
    assert_eq!(strict.error_symbols, vec!["6758"]);

    // And: TOLERANT also keeps ERROR, but not NOT_FOUND
    assert_eq!(tolerant.valid_symbols, vec!["7203", "6758"]);
    assert_eq!(tolerant.invalid_symbols, vec!["9999", "0000"]);
    assert!(tolerant.error_symbols.is_empty());

    // And: PERMISSIVE keeps everything except DELISTED
    assert_eq!(permissive.valid_symbols, vec!["7203", "9999", "6758", "0000"]);
    assert_eq!(permissive.filtered_symbols, vec!["1423"]);

    // And: Each symbol was looked up once across the three passes
    assert_eq!(pipeline.source.lookups(), ONE_OF_EACH.len());
}

#[test]
fn when_symbol_is_delisted_no_mode_keeps_it() {
    for mode in FilteringMode::ALL {
        assert!(!mode.includes(ValidationStatus::Delisted), "{mode}");
        assert!(mode.includes(ValidationStatus::Valid), "{mode}");
    }
}

#[test]
fn when_lookup_errored_tolerant_mode_keeps_the_symbol() {
    // Given: A transient failure on an otherwise listed symbol
    let pipeline = Pipeline::new(one_symbol_per_status(), FilterConfig::default());

    // When: Filtering under the default mode
    let result = pipeline.filter.filter_symbols(&["6758"], None, "retry", false);

    // Then: The symbol is retained rather than dropped
    assert_eq!(result.filtering_mode, FilteringMode::Tolerant);
    assert_eq!(result.valid_symbols, vec!["6758"]);
    assert!(FilteringMode::Tolerant.includes(ValidationStatus::Error));
    assert!(!FilteringMode::Tolerant.includes(ValidationStatus::NotFound));
}

// =============================================================================
// Rates
// =============================================================================

#[test]
fn when_list_is_non_empty_filter_and_success_rates_sum_to_one() {
    let pipeline = Pipeline::new(one_symbol_per_status(), FilterConfig::default());
    let inputs: [&[&str]; 4] = [
        &["7203"],
        &["1423", "9999"],
        &ONE_OF_EACH,
        &["7203", "7203", "1423"],
    ];

    for input in inputs {
        for mode in FilteringMode::ALL {
            let result = pipeline.filter.filter_symbols(input, Some(mode), "rates", false);
            let sum = result.filter_rate() + result.success_rate();
            assert!((sum - 1.0).abs() < 1e-9, "{input:?} under {mode}: {sum}");
        }
    }
}

#[test]
fn when_list_is_empty_both_rates_are_zero() {
    let pipeline = Pipeline::new(one_symbol_per_status(), FilterConfig::default());
    let nothing: [&str; 0] = [];

    let result = pipeline.filter.filter_symbols(&nothing, None, "rates", false);

    assert_eq!(result.filter_rate(), 0.0);
    assert_eq!(result.success_rate(), 0.0);
}

// =============================================================================
// Screening Run
// =============================================================================

#[test]
fn when_screening_list_is_filtered_delisted_and_invalid_symbols_drop_out() {
    // Given: Two listed names, one delisted and one without essential data
    let pipeline = Pipeline::new(screening_universe(), FilterConfig::default());

    // When: The list is filtered with detailed logging
    let result = pipeline
        .filter
        .filter_symbols(&SCREENING_RUN, Some(FilteringMode::Tolerant), "screening", true);

    // Then: Only the listed names remain
    assert_eq!(result.valid_symbols, vec!["7203", "6758"]);
    assert_eq!(result.filtered_symbols, vec!["1423", "9999"]);
    assert_eq!(result.original_symbols, SCREENING_RUN.to_vec());
    assert_eq!(result.filter_rate(), 0.5);

    // And: The ledger saw two successes and one record per filtered symbol
    let summary = pipeline.metrics.get_error_summary(None);
    assert_eq!(summary.successful_operations, 2);
    let delisted = pipeline.metrics.get_recent_errors(10, Some(ErrorType::DelistedStock), None);
    assert_eq!(delisted.len(), 1);
    assert_eq!(delisted[0].symbol, "1423");
    assert_eq!(delisted[0].operation, "screening_filtering");
    let invalid = pipeline.metrics.get_recent_errors(10, Some(ErrorType::DataNotFound), None);
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].symbol, "9999");
}

#[test]
fn when_pre_filtering_the_configured_mode_applies() {
    // Given: A filter switched to strict mode
    let pipeline = Pipeline::new(one_symbol_per_status(), FilterConfig::default());
    pipeline
        .filter
        .configure_filtering(Some(FilteringMode::Strict), None, None)
        .expect("valid settings");

    // When: A symbol list is pre-filtered
    let survivors = pipeline
        .filter
        .pre_filter_symbol_list(&["7203", "6758", "1423"], "screening", true);

    // Then: The errored symbol is no longer tolerated
    assert_eq!(survivors, vec!["7203"]);
}

// =============================================================================
// Alerts
// =============================================================================

#[test]
fn when_list_is_empty_one_critical_alert_is_recorded() {
    // Given: A filter with the empty-list alert enabled
    let pipeline = Pipeline::new(screening_universe(), FilterConfig::default());
    let nothing: [&str; 0] = [];

    // When: An empty list is filtered
    let result = pipeline.filter.filter_symbols(&nothing, None, "screening", false);

    // Then: Exactly one critical alert lands in the ledger
    assert!(result.valid_symbols.is_empty());
    let alerts = pipeline.alerts(ALL_SYMBOLS);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, AlertLevel::Critical);
    assert_eq!(alerts[0].additional_info["alert_type"], "empty_symbol_list");
    assert_eq!(alerts[0].additional_info["filtering_mode"], "tolerant");

    // And: No high filter rate alert accompanies it
    assert!(pipeline.alerts(SYMBOL_LIST).is_empty());
    assert_eq!(pipeline.filter.stats().empty_list_alerts, 1);
}

#[test]
fn when_every_symbol_is_filtered_both_alerts_fire_once() {
    // Given: A list of only unusable symbols
    let pipeline = Pipeline::new(screening_universe(), FilterConfig::default());

    // When: It is filtered
    let result = pipeline
        .filter
        .filter_symbols(&["1423", "9999"], None, "screening", false);

    // Then: The empty list and the 100% filter rate are each reported once
    assert!(result.valid_symbols.is_empty());
    assert_eq!(pipeline.alerts(ALL_SYMBOLS).len(), 1);
    assert_eq!(pipeline.alerts(SYMBOL_LIST).len(), 1);
}

#[test]
fn when_empty_list_repeats_cooldown_suppresses_until_forced_or_elapsed() {
    // Given: An empty-list alert already raised
    let pipeline = Pipeline::new(screening_universe(), FilterConfig::default());
    let nothing: [&str; 0] = [];
    assert!(pipeline
        .filter
        .validate_and_alert_empty_list(&nothing, "screening", false));

    // When: The check repeats within the cooldown
    assert!(pipeline
        .filter
        .validate_and_alert_empty_list(&nothing, "screening", false));

    // Then: No second alert is recorded
    assert_eq!(pipeline.alerts(ALL_SYMBOLS).len(), 1);

    // And: Forcing bypasses the cooldown
    pipeline
        .filter
        .validate_and_alert_empty_list(&nothing, "screening", true);
    assert_eq!(pipeline.alerts(ALL_SYMBOLS).len(), 2);

    // And: After 30 minutes the regular path alerts again
    pipeline.clock.advance(ALERT_COOLDOWN);
    pipeline
        .filter
        .validate_and_alert_empty_list(&nothing, "screening", false);
    assert_eq!(pipeline.alerts(ALL_SYMBOLS).len(), 3);
    assert_eq!(pipeline.filter.stats().empty_list_alerts, 3);
}

#[test]
fn when_list_is_not_empty_no_empty_alert_is_raised() {
    let pipeline = Pipeline::new(screening_universe(), FilterConfig::default());

    let is_empty = pipeline
        .filter
        .validate_and_alert_empty_list(&["7203"], "screening", true);

    assert!(!is_empty);
    assert!(pipeline.alerts(ALL_SYMBOLS).is_empty());
}

#[test]
fn when_empty_list_alert_is_disabled_nothing_is_recorded() {
    // Given: The empty-list alert switched off
    let pipeline = Pipeline::new(
        screening_universe(),
        FilterConfig {
            empty_list_alert: false,
            ..FilterConfig::default()
        },
    );
    let nothing: [&str; 0] = [];

    // When: Even a forced check runs on an empty list
    let is_empty = pipeline
        .filter
        .validate_and_alert_empty_list(&nothing, "screening", true);

    // Then: Emptiness is still reported but no alert is written
    assert!(is_empty);
    assert!(pipeline.alerts(ALL_SYMBOLS).is_empty());
    assert_eq!(pipeline.filter.stats().empty_list_alerts, 0);
}

#[test]
fn when_filter_rate_exceeds_threshold_one_warning_is_recorded() {
    // Given: A 40% threshold and a run that filters half the list
    let pipeline = Pipeline::new(
        screening_universe(),
        FilterConfig {
            high_filter_rate_threshold: 0.4,
            ..FilterConfig::default()
        },
    );

    // When: The run is filtered
    pipeline
        .filter
        .filter_symbols(&SCREENING_RUN, None, "screening", false);

    // Then: One warning carries the run's counts
    let alerts = pipeline.alerts(SYMBOL_LIST);
    assert_eq!(alerts.len(), 1);
    let alert = &alerts[0];
    assert_eq!(alert.severity, AlertLevel::Warning);
    assert_eq!(alert.error_type, ErrorType::DataValidation);
    assert_eq!(alert.additional_info["alert_type"], "high_filter_rate");
    assert_eq!(alert.additional_info["filter_rate"], 0.5);
    assert_eq!(alert.additional_info["threshold"], 0.4);
    assert_eq!(alert.additional_info["original_count"], 4);
    assert_eq!(alert.additional_info["filtered_count"], 2);

    // And: Neither a cached repeat nor a recomputation within the cooldown adds another
    pipeline
        .filter
        .filter_symbols(&SCREENING_RUN, None, "screening", false);
    pipeline.filter.clear_cache();
    pipeline
        .filter
        .filter_symbols(&SCREENING_RUN, None, "screening", false);
    assert_eq!(pipeline.alerts(SYMBOL_LIST).len(), 1);
    assert_eq!(pipeline.filter.stats().high_filter_rate_alerts, 1);
    assert_eq!(pipeline.filter.stats().total_filtering_operations, 2);
}

#[test]
fn when_filter_rate_equals_threshold_no_warning_is_recorded() {
    let pipeline = Pipeline::new(
        screening_universe(),
        FilterConfig {
            high_filter_rate_threshold: 0.5,
            ..FilterConfig::default()
        },
    );

    pipeline
        .filter
        .filter_symbols(&SCREENING_RUN, None, "screening", false);

    assert!(pipeline.alerts(SYMBOL_LIST).is_empty());
}

// =============================================================================
// Caching
// =============================================================================

#[test]
fn when_identical_request_repeats_cached_result_is_returned() {
    // Given: A completed filtering run
    let pipeline = Pipeline::new(screening_universe(), FilterConfig::default());
    let first = pipeline
        .filter
        .filter_symbols(&SCREENING_RUN, None, "screening", false);
    let lookups = pipeline.source.lookups();
    let recorded = pipeline.metrics.operation_record_count();

    // When: The same set is requested again, reordered and with a duplicate
    let second = pipeline
        .filter
        .filter_symbols(&["9999", "6758", "7203", "1423", "7203"], None, "screening", false);

    // Then: Nothing is re-validated, recorded or counted
    assert_eq!(second, first);
    assert_eq!(pipeline.source.lookups(), lookups);
    assert_eq!(pipeline.metrics.operation_record_count(), recorded);
    assert_eq!(pipeline.filter.stats().total_filtering_operations, 1);
}

#[test]
fn when_mode_differs_cache_is_not_shared() {
    let pipeline = Pipeline::new(one_symbol_per_status(), FilterConfig::default());

    pipeline
        .filter
        .filter_symbols(&ONE_OF_EACH, Some(FilteringMode::Strict), "screening", false);
    pipeline
        .filter
        .filter_symbols(&ONE_OF_EACH, Some(FilteringMode::Permissive), "screening", false);

    assert_eq!(pipeline.filter.stats().total_filtering_operations, 2);
}

#[test]
fn when_cache_entry_expires_filtering_runs_again() {
    // Given: A cached run
    let pipeline = Pipeline::new(screening_universe(), FilterConfig::default());
    pipeline
        .filter
        .filter_symbols(&SCREENING_RUN, None, "screening", false);

    // When: The one hour filter cache lapses
    pipeline
        .clock
        .advance(pipeline.filter.config().cache_duration + Duration::from_secs(1));
    pipeline
        .filter
        .filter_symbols(&SCREENING_RUN, None, "screening", false);

    // Then: The run is recomputed from still-cached validations
    assert_eq!(pipeline.filter.stats().total_filtering_operations, 2);
    assert_eq!(pipeline.source.lookups(), SCREENING_RUN.len());
}

// =============================================================================
// Statistics and Configuration
// =============================================================================

#[test]
fn when_statistics_are_requested_runs_are_summarized() {
    // Given: Two different runs
    let pipeline = Pipeline::new(screening_universe(), FilterConfig::default());
    pipeline
        .filter
        .filter_symbols(&SCREENING_RUN, None, "screening", false);
    pipeline
        .filter
        .filter_symbols(&["7203", "6758"], None, "screening", false);

    // When: Statistics are gathered
    let statistics = pipeline.filter.get_filtering_statistics();

    // Then: Totals, breakdown and the recent window agree with the runs
    assert_eq!(statistics.overall.total_operations, 2);
    assert_eq!(statistics.overall.total_symbols_processed, 6);
    assert_eq!(statistics.overall.total_symbols_filtered, 2);
    assert!((statistics.overall.overall_filter_rate - 2.0 / 6.0).abs() < 1e-9);
    assert_eq!(statistics.breakdown.delisted_count, 1);
    assert_eq!(statistics.breakdown.invalid_count, 1);
    assert_eq!(statistics.breakdown.error_count, 0);
    assert_eq!(statistics.recent.recent_operations, 2);
    assert!((statistics.recent.recent_filter_rate - 0.25).abs() < 1e-9);
    assert_eq!(statistics.alerts.high_filter_rate_alerts, 1);
    assert!(statistics.alerts.last_high_filter_rate_alert.is_some());
    assert_eq!(statistics.configuration.filtering_mode, FilteringMode::Tolerant);
    assert_eq!(statistics.configuration.cache_duration_hours, 1.0);

    // And: A day later the recent window is empty while totals remain
    pipeline.clock.advance(Duration::from_secs(25 * 3600));
    let later = pipeline.filter.get_filtering_statistics();
    assert_eq!(later.recent.recent_operations, 0);
    assert_eq!(later.recent.recent_filter_rate, 0.0);
    assert_eq!(later.overall.total_operations, 2);
}

#[test]
fn when_configuration_is_invalid_previous_settings_are_kept() {
    // Given: A filter with default settings
    let pipeline = Pipeline::new(screening_universe(), FilterConfig::default());

    // When: An out-of-range threshold is submitted along with a new mode
    let outcome =
        pipeline
            .filter
            .configure_filtering(Some(FilteringMode::Permissive), Some(1.5), None);

    // Then: The update is rejected as a whole
    assert!(outcome.is_err());
    assert_eq!(pipeline.filter.config(), FilterConfig::default());

    // And: A valid partial update only touches what was given
    pipeline
        .filter
        .configure_filtering(None, Some(0.6), Some(false))
        .expect("valid settings");
    let config = pipeline.filter.config();
    assert_eq!(config.filtering_mode, FilteringMode::Tolerant);
    assert_eq!(config.high_filter_rate_threshold, 0.6);
    assert!(!config.empty_list_alert);
}
