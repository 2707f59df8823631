use thiserror::Error;

/// Validation and contract errors exposed by `valuewatch-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },
    #[error("symbol market suffix cannot be empty: '{value}'")]
    EmptyMarketSuffix { value: String },

    #[error("timestamp must be RFC3339, got '{value}'")]
    InvalidTimestamp { value: String },

    #[error("invalid filtering mode '{value}', expected one of strict, tolerant, permissive")]
    InvalidFilteringMode { value: String },
    #[error("invalid error type '{value}'")]
    InvalidErrorType { value: String },
    #[error("invalid alert level '{value}', expected one of info, warning, error, critical")]
    InvalidAlertLevel { value: String },
}

/// Configuration errors raised while building component settings.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("field '{field}' must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("field '{field}' must be greater than zero")]
    ZeroDuration { field: &'static str },
    #[error("environment variable '{name}' has unparsable value '{value}'")]
    InvalidEnvValue { name: String, value: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
}
