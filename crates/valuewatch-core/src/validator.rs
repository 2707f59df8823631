//! Symbol validation with delisting detection and result caching.
//!
//! A symbol is looked up through a [`MarketDataSource`] and classified into one
//! of five [`ValidationStatus`] values. Every outcome is cached for
//! [`ValidatorConfig::cache_duration`], bad outcomes included, so a
//! consistently failing symbol is not looked up again within the window.

use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cache::TtlCache;
use crate::clock::{Clock, SystemClock};
use crate::config::ValidatorConfig;
use crate::market_data::{LookupError, MarketDataSource, TickerInfo};
use crate::metrics::CLEANUP_INTERVAL;
use crate::{Attributes, Symbol, UtcDateTime, ValidationError};

/// Lowercase phrases that mark a lookup failure as a delisting.
const DELISTED_PHRASES: [&str; 8] = [
    "possibly delisted",
    "delisted",
    "no data found",
    "ticker not found",
    "invalid ticker",
    "not found",
    "no price data found",
    "symbol may be delisted",
];

const IDENTITY_FIELDS: [&str; 3] = ["symbol", "shortName", "longName"];
const ESSENTIAL_FIELDS: [&str; 5] = [
    "symbol",
    "shortName",
    "longName",
    "regularMarketPrice",
    "currentPrice",
];
const DESCRIPTIVE_FIELDS: [&str; 3] = ["longBusinessSummary", "industry", "sector"];
const KEY_SAMPLE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    Delisted,
    Invalid,
    NotFound,
    Error,
}

impl ValidationStatus {
    pub const ALL: [Self; 5] = [
        Self::Valid,
        Self::Delisted,
        Self::Invalid,
        Self::NotFound,
        Self::Error,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Delisted => "delisted",
            Self::Invalid => "invalid",
            Self::NotFound => "not_found",
            Self::Error => "error",
        }
    }
}

impl Display for ValidationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating one symbol.
///
/// `is_valid` always equals `status == Valid`; results are only built through
/// [`ValidationResult::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub symbol: String,
    pub status: ValidationStatus,
    pub is_valid: bool,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
    pub validated_at: UtcDateTime,
    pub additional_info: Attributes,
}

impl ValidationResult {
    pub fn new(symbol: impl Into<String>, status: ValidationStatus, validated_at: UtcDateTime) -> Self {
        Self {
            symbol: symbol.into(),
            status,
            is_valid: status == ValidationStatus::Valid,
            error_type: None,
            error_message: None,
            validated_at,
            additional_info: Attributes::new(),
        }
    }

    pub fn with_error_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_info(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.additional_info.insert(key.to_owned(), value.into());
        self
    }
}

/// Validator counters plus cache sizes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationStats {
    /// Every request for a well-formed symbol, cache hits included.
    pub total_validations: u64,
    pub cache_hits: u64,
    pub valid_symbols: u64,
    pub delisted_symbols: u64,
    /// INVALID and NOT_FOUND outcomes.
    pub invalid_symbols: u64,
    pub errors: u64,
    pub cache_size: usize,
    pub delisted_cache_size: usize,
    /// Cache hits as a percentage of `total_validations`.
    pub cache_hit_rate: f64,
}

#[derive(Debug, Default)]
struct Counters {
    total_validations: u64,
    cache_hits: u64,
    valid_symbols: u64,
    delisted_symbols: u64,
    invalid_symbols: u64,
    errors: u64,
}

impl Counters {
    fn count_outcome(&mut self, status: ValidationStatus) {
        match status {
            ValidationStatus::Valid => self.valid_symbols += 1,
            ValidationStatus::Delisted => self.delisted_symbols += 1,
            ValidationStatus::Invalid | ValidationStatus::NotFound => self.invalid_symbols += 1,
            ValidationStatus::Error => self.errors += 1,
        }
    }
}

struct ValidatorState {
    cache: TtlCache<ValidationResult>,
    delisted: HashSet<String>,
    counters: Counters,
}

impl ValidatorState {
    /// Cached result for `key`; an expired entry also leaves the delisted set.
    fn cached(&mut self, key: &str) -> Option<ValidationResult> {
        let cached = self.cache.get(key);
        if cached.is_none() {
            self.delisted.remove(key);
        }
        cached
    }

    /// Throttled bulk eviction; delisted marks follow their cache entries out.
    fn sweep(&mut self) {
        if let Some(removed) = self.cache.sweep(CLEANUP_INTERVAL) {
            let cache = &self.cache;
            self.delisted.retain(|key| cache.contains_key(key));
            if removed > 0 {
                debug!(removed, "expired validation results swept");
            }
        }
    }
}

/// Classifies symbols against a market-data source and caches the outcome.
pub struct SymbolValidator {
    source: Arc<dyn MarketDataSource>,
    config: ValidatorConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<ValidatorState>,
}

impl SymbolValidator {
    pub fn new(source: Arc<dyn MarketDataSource>, config: ValidatorConfig) -> Self {
        Self::with_clock(source, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        source: Arc<dyn MarketDataSource>,
        config: ValidatorConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!(
            cache_hours = config.cache_duration.as_secs() / 3600,
            "symbol validator initialized"
        );
        Self {
            state: Mutex::new(ValidatorState {
                cache: TtlCache::new(config.cache_duration, clock.clone()),
                delisted: HashSet::new(),
                counters: Counters::default(),
            }),
            source,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Normalizes `symbol`, serves a live cached result or queries the source.
    ///
    /// Lookup failures are folded into the result; only a malformed symbol is
    /// an error.
    pub fn validate_symbol(&self, symbol: &str) -> Result<ValidationResult, ValidationError> {
        let symbol = Symbol::parse(symbol)?;

        {
            let mut state = self.lock();
            state.counters.total_validations += 1;
            if let Some(cached) = state.cached(symbol.as_str()) {
                state.counters.cache_hits += 1;
                debug!(symbol = %symbol, status = %cached.status, "validation cache hit");
                return Ok(cached);
            }
        }

        let result = self.lookup(&symbol);

        {
            let mut state = self.lock();
            state.counters.count_outcome(result.status);
            if result.status == ValidationStatus::Delisted {
                state.delisted.insert(symbol.as_str().to_owned());
            }
            state.cache.put(symbol.as_str(), result.clone());
            state.sweep();
        }

        info!(
            symbol = %symbol,
            status = %result.status,
            valid = result.is_valid,
            "symbol validation completed"
        );
        Ok(result)
    }

    /// Validates `symbols` sequentially, keyed by the caller's input strings.
    ///
    /// Malformed symbols become ERROR results. A pause of
    /// [`ValidatorConfig::batch_pause`] follows every
    /// [`ValidatorConfig::batch_pause_every`] symbols except the last batch.
    pub fn batch_validate_symbols<S: AsRef<str>>(
        &self,
        symbols: &[S],
    ) -> HashMap<String, ValidationResult> {
        let started = std::time::Instant::now();
        let total = symbols.len();
        info!(total, "starting batch validation");

        let mut results = HashMap::with_capacity(total);
        for (position, raw) in symbols.iter().enumerate() {
            let raw = raw.as_ref();
            let result = self.validate_symbol(raw).unwrap_or_else(|err| {
                error!(symbol = raw, error = %err, "malformed symbol in batch");
                ValidationResult::new(raw.trim(), ValidationStatus::Error, self.clock.now())
                    .with_error_type("validation")
                    .with_message(err.to_string())
            });
            results.insert(raw.to_owned(), result);

            let done = position + 1;
            if done % self.config.batch_pause_every == 0 && done < total {
                debug!(done, total, "batch validation progress");
                if !self.config.batch_pause.is_zero() {
                    std::thread::sleep(self.config.batch_pause);
                }
            }
        }

        let count = |wanted: &[ValidationStatus]| {
            results
                .values()
                .filter(|result| wanted.contains(&result.status))
                .count()
        };
        info!(
            duration_secs = started.elapsed().as_secs_f64(),
            total,
            valid = count(&[ValidationStatus::Valid]),
            delisted = count(&[ValidationStatus::Delisted]),
            invalid = count(&[ValidationStatus::Invalid, ValidationStatus::NotFound]),
            errors = count(&[ValidationStatus::Error]),
            "batch validation completed"
        );
        results
    }

    /// True when a live cached result marks `symbol` as delisted. Never queries the source.
    pub fn is_delisted(&self, symbol: &str) -> bool {
        let Ok(symbol) = Symbol::parse(symbol) else {
            return false;
        };
        let mut state = self.lock();
        if !state.delisted.contains(symbol.as_str()) {
            return false;
        }
        state
            .cached(symbol.as_str())
            .is_some_and(|result| result.status == ValidationStatus::Delisted)
    }

    /// Valid symbols in first-occurrence input order.
    pub fn filter_valid_symbols<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<String> {
        info!(total = symbols.len(), "filtering symbols for validity");
        let results = self.batch_validate_symbols(symbols);

        let mut seen = HashSet::new();
        let mut valid = Vec::new();
        let mut removed: HashMap<ValidationStatus, Vec<&str>> = HashMap::new();
        for raw in symbols {
            let raw = raw.as_ref();
            if !seen.insert(raw) {
                continue;
            }
            match results.get(raw) {
                Some(result) if result.is_valid => valid.push(raw.to_owned()),
                Some(result) => removed.entry(result.status).or_default().push(raw),
                None => {}
            }
        }

        for (status, symbols) in &removed {
            let sample = &symbols[..symbols.len().min(KEY_SAMPLE)];
            match status {
                ValidationStatus::Error => {
                    error!(status = %status, count = symbols.len(), sample = ?sample, "symbols filtered")
                }
                _ => warn!(status = %status, count = symbols.len(), sample = ?sample, "symbols filtered"),
            }
        }
        info!(
            original = seen.len(),
            valid = valid.len(),
            filtered = seen.len() - valid.len(),
            "symbol filtering completed"
        );
        valid
    }

    pub fn get_validation_stats(&self) -> ValidationStats {
        let state = self.lock();
        let counters = &state.counters;
        let cache_hit_rate = if counters.total_validations == 0 {
            0.0
        } else {
            counters.cache_hits as f64 / counters.total_validations as f64 * 100.0
        };

        ValidationStats {
            total_validations: counters.total_validations,
            cache_hits: counters.cache_hits,
            valid_symbols: counters.valid_symbols,
            delisted_symbols: counters.delisted_symbols,
            invalid_symbols: counters.invalid_symbols,
            errors: counters.errors,
            cache_size: state.cache.len(),
            delisted_cache_size: state.delisted.len(),
            cache_hit_rate,
        }
    }

    /// Drops every cached result and the delisted set; counters are kept.
    pub fn clear_cache(&self) {
        let mut state = self.lock();
        let cleared = state.cache.clear();
        state.delisted.clear();
        info!(cleared, "validation cache cleared");
    }

    fn lookup(&self, symbol: &Symbol) -> ValidationResult {
        let now = self.clock.now();
        let info = match self.source.ticker_info(symbol) {
            Ok(info) => info,
            Err(err) => return lookup_failure(symbol, &err, now),
        };

        if info.is_near_empty() {
            return ValidationResult::new(symbol.as_str(), ValidationStatus::NotFound, now)
                .with_message("no ticker info available");
        }

        if has_delisted_indicators(&info) {
            return ValidationResult::new(symbol.as_str(), ValidationStatus::Delisted, now)
                .with_message("stock appears to be delisted")
                .with_info("info_keys", info.keys(KEY_SAMPLE));
        }

        if !ESSENTIAL_FIELDS.iter().any(|field| info.has(field)) {
            return ValidationResult::new(symbol.as_str(), ValidationStatus::Invalid, now)
                .with_message("insufficient data: missing essential fields")
                .with_info("available_keys", info.keys(KEY_SAMPLE));
        }

        match self.source.recent_history(symbol) {
            Ok(history) if history.is_empty() => {
                return ValidationResult::new(symbol.as_str(), ValidationStatus::Delisted, now)
                    .with_message("no recent price data available, likely delisted");
            }
            Ok(_) => {}
            Err(err) => {
                debug!(symbol = %symbol, error = %err, "price history unavailable, ignoring");
            }
        }

        ValidationResult::new(symbol.as_str(), ValidationStatus::Valid, now)
            .with_info(
                "has_current_price",
                info.has("currentPrice") || info.has("regularMarketPrice"),
            )
            .with_info("exchange", info.text("exchange").unwrap_or_default())
            .with_info("currency", info.text("currency").unwrap_or_default())
    }

    fn lock(&self) -> MutexGuard<'_, ValidatorState> {
        self.state
            .lock()
            .expect("symbol validator lock is not poisoned")
    }
}

impl std::fmt::Debug for SymbolValidator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolValidator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn lookup_failure(symbol: &Symbol, err: &LookupError, now: UtcDateTime) -> ValidationResult {
    let text = err.message().to_lowercase();
    if DELISTED_PHRASES.iter().any(|phrase| text.contains(phrase)) {
        warn!(symbol = %symbol, error = %err, "delisted stock detected");
        ValidationResult::new(symbol.as_str(), ValidationStatus::Delisted, now)
            .with_error_type(err.kind().as_str())
            .with_message(format!("delisted stock detected: {}", err.message()))
    } else {
        ValidationResult::new(symbol.as_str(), ValidationStatus::Error, now)
            .with_error_type(err.kind().as_str())
            .with_message(err.message())
    }
}

fn has_delisted_indicators(info: &TickerInfo) -> bool {
    if info.text("quoteType") == Some("DELISTED") {
        return true;
    }
    if IDENTITY_FIELDS.iter().any(|field| info.has(field)) {
        return false;
    }
    DESCRIPTIVE_FIELDS.iter().any(|field| {
        info.text(field)
            .is_some_and(|text| text.to_lowercase().contains("delisted"))
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::clock::ManualClock;
    use crate::market_data::{LookupErrorKind, PriceBar, StaticMarketData};

    fn symbol(code: &str) -> Symbol {
        Symbol::parse(code).expect("valid symbol")
    }

    fn bar() -> PriceBar {
        PriceBar::new(UtcDateTime::now(), 100.0, Some(1_000))
    }

    fn validator(source: StaticMarketData) -> (SymbolValidator, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let validator =
            SymbolValidator::with_clock(Arc::new(source), ValidatorConfig::unpaced(), clock.clone());
        (validator, clock)
    }

    #[test]
    fn listed_symbol_is_valid_with_market_details() {
        let (validator, _clock) =
            validator(StaticMarketData::new().with_listed(symbol("7203"), "TOYOTA MOTOR CORP", 2950.0));

        let result = validator.validate_symbol("7203").expect("well-formed");

        assert_eq!(result.symbol, "7203.T");
        assert_eq!(result.status, ValidationStatus::Valid);
        assert!(result.is_valid);
        assert_eq!(result.additional_info["has_current_price"], true);
        assert_eq!(result.additional_info["exchange"], "JPX");
        assert_eq!(result.additional_info["currency"], "JPY");
    }

    #[test]
    fn lookup_error_with_delisting_phrase_is_delisted() {
        let (validator, _clock) = validator(StaticMarketData::new().with_error(
            symbol("1423"),
            LookupError::new(
                LookupErrorKind::Http,
                "1423.T: No price data found, symbol may be delisted",
            ),
        ));

        let result = validator.validate_symbol("1423.T").expect("well-formed");

        assert_eq!(result.status, ValidationStatus::Delisted);
        assert_eq!(result.error_type.as_deref(), Some("http"));
        assert!(validator.is_delisted("1423"));
    }

    #[test]
    fn other_lookup_errors_are_errors() {
        let (validator, _clock) = validator(
            StaticMarketData::new()
                .with_error(symbol("6758"), LookupError::timeout("read timed out")),
        );

        let result = validator.validate_symbol("6758").expect("well-formed");

        assert_eq!(result.status, ValidationStatus::Error);
        assert_eq!(result.error_type.as_deref(), Some("timeout"));
        assert_eq!(result.error_message.as_deref(), Some("read timed out"));
        assert!(!validator.is_delisted("6758"));
    }

    #[test]
    fn empty_metadata_is_not_found() {
        let (validator, _clock) = validator(StaticMarketData::new());
        let result = validator.validate_symbol("9999").expect("well-formed");
        assert_eq!(result.status, ValidationStatus::NotFound);
    }

    #[test]
    fn explicit_delisted_quote_type_wins_over_identity() {
        let info = TickerInfo::default()
            .with("symbol", "8604.T")
            .with("quoteType", "DELISTED");
        let (validator, _clock) =
            validator(StaticMarketData::new().with_info(symbol("8604"), info, vec![bar()]));

        let result = validator.validate_symbol("8604").expect("well-formed");
        assert_eq!(result.status, ValidationStatus::Delisted);
        assert!(result.additional_info.contains_key("info_keys"));
    }

    #[test]
    fn delisted_mention_only_counts_without_identity() {
        let anonymous = TickerInfo::default()
            .with("industry", "Formerly listed, now delisted")
            .with("sector", "Industrials");
        let named = TickerInfo::default()
            .with("shortName", "SHIMIZU CORP")
            .with("industry", "Formerly listed, now delisted");
        let (validator, _clock) = validator(
            StaticMarketData::new()
                .with_info(symbol("1111"), anonymous, vec![bar()])
                .with_info(symbol("1803"), named, vec![bar()]),
        );

        assert_eq!(
            validator.validate_symbol("1111").expect("well-formed").status,
            ValidationStatus::Delisted
        );
        assert_eq!(
            validator.validate_symbol("1803").expect("well-formed").status,
            ValidationStatus::Valid
        );
    }

    #[test]
    fn metadata_without_essential_fields_is_invalid() {
        let info = TickerInfo::default()
            .with("sector", "Industrials")
            .with("exchange", "JPX");
        let (validator, _clock) =
            validator(StaticMarketData::new().with_info(symbol("2222"), info, vec![bar()]));

        let result = validator.validate_symbol("2222").expect("well-formed");
        assert_eq!(result.status, ValidationStatus::Invalid);
        assert_eq!(result.additional_info["available_keys"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn empty_history_downgrades_identity_to_delisted() {
        let info = TickerInfo::default().with("shortName", "OLD CO");
        let (validator, _clock) =
            validator(StaticMarketData::new().with_info(symbol("3333"), info, Vec::new()));

        let result = validator.validate_symbol("3333").expect("well-formed");
        assert_eq!(result.status, ValidationStatus::Delisted);
    }

    #[test]
    fn history_failure_is_ignored() {
        let mut entry = crate::market_data::SnapshotEntry {
            info: TickerInfo::listed(&symbol("9984"), "SOFTBANK GROUP", 8000.0),
            ..Default::default()
        };
        entry.history_error = Some(LookupError::new(LookupErrorKind::Network, "connection reset"));
        let (validator, _clock) = validator(StaticMarketData::new().with_entry(symbol("9984"), entry));

        let result = validator.validate_symbol("9984").expect("well-formed");
        assert_eq!(result.status, ValidationStatus::Valid);
    }

    #[test]
    fn malformed_symbol_is_rejected() {
        let (validator, _clock) = validator(StaticMarketData::new());
        assert_eq!(validator.validate_symbol("   "), Err(ValidationError::EmptySymbol));
        assert_eq!(validator.get_validation_stats().total_validations, 0);
    }

    #[test]
    fn cached_results_expire_and_leave_delisted_set() {
        let (validator, clock) = validator(
            StaticMarketData::new()
                .with_error(symbol("1423"), LookupError::not_found("1423.T: possibly delisted")),
        );

        validator.validate_symbol("1423").expect("well-formed");
        validator.validate_symbol("1423").expect("well-formed");
        let stats = validator.get_validation_stats();
        assert_eq!(stats.total_validations, 2);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.delisted_symbols, 1);
        assert_eq!(stats.delisted_cache_size, 1);
        assert_eq!(stats.cache_hit_rate, 50.0);

        clock.advance(Duration::from_secs(24 * 3600 + 1));
        assert!(!validator.is_delisted("1423"));
        assert_eq!(validator.get_validation_stats().delisted_cache_size, 0);
    }

    #[test]
    fn later_writes_sweep_expired_results_and_delisted_marks() {
        let (validator, clock) = validator(
            StaticMarketData::new()
                .with_listed(symbol("7203"), "TOYOTA MOTOR CORP", 2950.0)
                .with_error(symbol("1423"), LookupError::not_found("1423.T: possibly delisted")),
        );
        validator.validate_symbol("1423").expect("well-formed");

        clock.advance(Duration::from_secs(25 * 3600));
        validator.validate_symbol("7203").expect("well-formed");

        let stats = validator.get_validation_stats();
        assert_eq!(stats.cache_size, 1);
        assert_eq!(stats.delisted_cache_size, 0);
    }

    #[test]
    fn batch_keys_by_input_and_converts_malformed_symbols() {
        let (validator, _clock) =
            validator(StaticMarketData::new().with_listed(symbol("7203"), "TOYOTA MOTOR CORP", 2950.0));

        let results = validator.batch_validate_symbols(&["7203", "72$3", "9999"]);

        assert_eq!(results.len(), 3);
        assert_eq!(results["7203"].status, ValidationStatus::Valid);
        assert_eq!(results["72$3"].status, ValidationStatus::Error);
        assert_eq!(results["72$3"].error_type.as_deref(), Some("validation"));
        assert_eq!(results["9999"].status, ValidationStatus::NotFound);
    }

    #[test]
    fn filter_valid_symbols_preserves_input_order() {
        let (validator, _clock) = validator(
            StaticMarketData::new()
                .with_listed(symbol("9984"), "SOFTBANK GROUP", 8000.0)
                .with_listed(symbol("7203"), "TOYOTA MOTOR CORP", 2950.0),
        );

        let valid = validator.filter_valid_symbols(&["9984", "1423", "7203", "9984"]);
        assert_eq!(valid, vec!["9984".to_owned(), "7203".to_owned()]);
    }

    #[test]
    fn clear_cache_forces_a_new_lookup() {
        let (validator, _clock) =
            validator(StaticMarketData::new().with_listed(symbol("7203"), "TOYOTA MOTOR CORP", 2950.0));
        validator.validate_symbol("7203").expect("well-formed");
        validator.clear_cache();
        validator.validate_symbol("7203").expect("well-formed");

        let stats = validator.get_validation_stats();
        assert_eq!(stats.cache_hits, 0);
        assert_eq!(stats.valid_symbols, 2);
        assert_eq!(stats.cache_size, 1);
    }
}
