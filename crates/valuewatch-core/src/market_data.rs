//! Market-data collaborator contract.
//!
//! The validator only needs two queries from a data source: a metadata lookup
//! and a recent-price-history lookup. Real network adapters live outside this
//! crate; [`StaticMarketData`] is the deterministic in-memory implementation
//! used by tests and by the CLI's snapshot mode.
//!
//! # Snapshot format
//!
//! ```json
//! {
//!   "7203": {
//!     "info": { "symbol": "7203.T", "shortName": "TOYOTA MOTOR CORP", "currentPrice": 2950.0 },
//!     "history": [ { "ts": "2024-04-01T06:00:00Z", "close": 2950.0, "volume": 1200000 } ]
//!   },
//!   "1423": { "error": { "kind": "not_found", "message": "1423.T: possibly delisted" } }
//! }
//! ```

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Attributes, CoreError, Symbol, UtcDateTime};

/// Failure category reported by a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupErrorKind {
    Network,
    Timeout,
    Http,
    Unauthorized,
    RateLimited,
    NotFound,
    Malformed,
    Other,
}

impl LookupErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Http => "http",
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate_limited",
            Self::NotFound => "not_found",
            Self::Malformed => "malformed",
            Self::Other => "other",
        }
    }
}

impl Display for LookupErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured data-source error. The message text is inspected for
/// delisting phrases by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupError {
    kind: LookupErrorKind,
    message: String,
}

impl LookupError {
    pub fn new(kind: LookupErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LookupErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(LookupErrorKind::Timeout, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(LookupErrorKind::NotFound, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(LookupErrorKind::RateLimited, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(LookupErrorKind::Unauthorized, message)
    }

    pub const fn kind(&self) -> LookupErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            LookupErrorKind::Network => "lookup.network",
            LookupErrorKind::Timeout => "lookup.timeout",
            LookupErrorKind::Http => "lookup.http",
            LookupErrorKind::Unauthorized => "lookup.unauthorized",
            LookupErrorKind::RateLimited => "lookup.rate_limited",
            LookupErrorKind::NotFound => "lookup.not_found",
            LookupErrorKind::Malformed => "lookup.malformed",
            LookupErrorKind::Other => "lookup.other",
        }
    }
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for LookupError {}

/// Truthiness of a metadata value: null, false, zero, and empty
/// strings or collections count as absent.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Metadata bag returned by a ticker lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickerInfo(Attributes);

impl TickerInfo {
    pub fn new(fields: Attributes) -> Self {
        Self(fields)
    }

    /// Typical metadata for an actively listed Tokyo equity.
    pub fn listed(symbol: &Symbol, short_name: &str, price: f64) -> Self {
        Self::default()
            .with("symbol", symbol.as_str())
            .with("shortName", short_name)
            .with("quoteType", "EQUITY")
            .with("exchange", "JPX")
            .with("currency", "JPY")
            .with("currentPrice", price)
            .with("regularMarketPrice", price)
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_owned(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// True when `key` is present with a truthy value.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).map(is_truthy).unwrap_or(false)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// No fields at all, or a single field carrying nothing.
    pub fn is_near_empty(&self) -> bool {
        self.0.is_empty() || (self.0.len() == 1 && !self.0.values().any(is_truthy))
    }

    pub fn keys(&self, limit: usize) -> Vec<String> {
        self.0.keys().take(limit).cloned().collect()
    }
}

/// One daily price point from a recent-history query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub ts: UtcDateTime,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<u64>,
}

impl PriceBar {
    pub fn new(ts: UtcDateTime, close: f64, volume: Option<u64>) -> Self {
        Self { ts, close, volume }
    }
}

/// Data source consumed by the symbol validator.
///
/// Both queries block the caller. Implementations must be `Send + Sync` so a
/// validator can be shared behind an `Arc`.
pub trait MarketDataSource: Send + Sync {
    /// Metadata for the symbol; an empty bag means the source knows nothing about it.
    fn ticker_info(&self, symbol: &Symbol) -> Result<TickerInfo, LookupError>;

    /// Recent daily prices; an empty series means no trading activity.
    fn recent_history(&self, symbol: &Symbol) -> Result<Vec<PriceBar>, LookupError>;
}

/// Canned responses for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    #[serde(default)]
    pub info: TickerInfo,
    #[serde(default)]
    pub history: Vec<PriceBar>,
    #[serde(default)]
    pub error: Option<LookupError>,
    #[serde(default)]
    pub history_error: Option<LookupError>,
}

/// Deterministic in-memory data source.
///
/// Unknown symbols yield empty metadata and an empty history.
#[derive(Debug, Clone, Default)]
pub struct StaticMarketData {
    entries: HashMap<Symbol, SnapshotEntry>,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON snapshot keyed by (possibly bare) symbol codes.
    pub fn from_json_str(input: &str) -> Result<Self, CoreError> {
        let raw: HashMap<String, SnapshotEntry> = serde_json::from_str(input)?;
        let mut entries = HashMap::with_capacity(raw.len());
        for (key, entry) in raw {
            entries.insert(Symbol::parse(&key)?, entry);
        }
        Ok(Self { entries })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn with_entry(mut self, symbol: Symbol, entry: SnapshotEntry) -> Self {
        self.entries.insert(symbol, entry);
        self
    }

    /// Listed symbol with metadata and one recent price bar.
    pub fn with_listed(self, symbol: Symbol, short_name: &str, price: f64) -> Self {
        let info = TickerInfo::listed(&symbol, short_name, price);
        let history = vec![PriceBar::new(UtcDateTime::now(), price, Some(100_000))];
        self.with_entry(
            symbol,
            SnapshotEntry {
                info,
                history,
                ..SnapshotEntry::default()
            },
        )
    }

    pub fn with_info(self, symbol: Symbol, info: TickerInfo, history: Vec<PriceBar>) -> Self {
        self.with_entry(
            symbol,
            SnapshotEntry {
                info,
                history,
                ..SnapshotEntry::default()
            },
        )
    }

    pub fn with_error(self, symbol: Symbol, error: LookupError) -> Self {
        self.with_entry(
            symbol,
            SnapshotEntry {
                error: Some(error),
                ..SnapshotEntry::default()
            },
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MarketDataSource for StaticMarketData {
    fn ticker_info(&self, symbol: &Symbol) -> Result<TickerInfo, LookupError> {
        match self.entries.get(symbol) {
            None => Ok(TickerInfo::default()),
            Some(entry) => match &entry.error {
                Some(error) => Err(error.clone()),
                None => Ok(entry.info.clone()),
            },
        }
    }

    fn recent_history(&self, symbol: &Symbol) -> Result<Vec<PriceBar>, LookupError> {
        match self.entries.get(symbol) {
            None => Ok(Vec::new()),
            Some(entry) => match &entry.history_error {
                Some(error) => Err(error.clone()),
                None => Ok(entry.history.clone()),
            },
        }
    }
}
