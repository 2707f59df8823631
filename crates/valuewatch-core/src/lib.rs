//! Core contracts for valuewatch.
//!
//! This crate contains:
//! - Rolling error metrics with rate-limited alerting
//! - Symbol validation with delisting detection and caching
//! - Policy-driven symbol filtering on top of validation
//! - Canonical domain models, configuration, and structured errors

pub mod alert_gate;
pub mod cache;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod filter;
pub mod market_data;
pub mod metrics;
pub mod validator;

pub use alert_gate::{CooldownGate, ALERT_COOLDOWN};
pub use cache::TtlCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{FilterConfig, MetricsConfig, ValidatorConfig};
pub use domain::{Attributes, Symbol, UtcDateTime, TOKYO_SUFFIX};
pub use error::{ConfigError, CoreError, ValidationError};
pub use filter::{
    AlertStats, BreakdownStats, FilterSettings, FilteringMode, FilteringResult,
    FilteringStatistics, FilteringStats, OverallStats, RecentStats, SymbolFilter, ALL_SYMBOLS,
    SYMBOL_LIST,
};
pub use market_data::{
    LookupError, LookupErrorKind, MarketDataSource, PriceBar, SnapshotEntry, StaticMarketData,
    TickerInfo,
};
pub use metrics::{
    AlertLevel, ErrorEvent, ErrorMetrics, ErrorRecord, ErrorSummary, ErrorTrends, ErrorType,
    MetricsExport, OperationRecord, RankedCount, TrendBucket, CLEANUP_INTERVAL,
    MAX_TREND_BUCKETS,
};
pub use validator::{SymbolValidator, ValidationResult, ValidationStats, ValidationStatus};
