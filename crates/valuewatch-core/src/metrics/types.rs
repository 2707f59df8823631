use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::duration_serde;
use crate::{Attributes, UtcDateTime, ValidationError};

/// Failure category recorded in the metrics ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    DelistedStock,
    TimezoneError,
    DataValidation,
    NetworkError,
    ApiRateLimit,
    DataNotFound,
    Authentication,
    Unknown,
}

const NETWORK_KIND_MARKERS: [&str; 4] = ["connection", "network", "timeout", "http"];
const AUTH_KIND_MARKERS: [&str; 4] = ["auth", "permission", "unauthorized", "403"];

impl ErrorType {
    pub const ALL: [Self; 8] = [
        Self::DelistedStock,
        Self::TimezoneError,
        Self::DataValidation,
        Self::NetworkError,
        Self::ApiRateLimit,
        Self::DataNotFound,
        Self::Authentication,
        Self::Unknown,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DelistedStock => "delisted_stock",
            Self::TimezoneError => "timezone_error",
            Self::DataValidation => "data_validation",
            Self::NetworkError => "network_error",
            Self::ApiRateLimit => "api_rate_limit",
            Self::DataNotFound => "data_not_found",
            Self::Authentication => "authentication",
            Self::Unknown => "unknown",
        }
    }

    /// Heuristic classification of a raw failure.
    ///
    /// Message phrases are checked first, in order; the error kind name only
    /// decides between network and authentication failures.
    pub fn classify(kind_name: &str, message: &str) -> Self {
        let kind_name = kind_name.to_ascii_lowercase();
        let message = message.to_lowercase();

        if message.contains("delisted") {
            Self::DelistedStock
        } else if message.contains("timezone") || message.contains("tz") {
            Self::TimezoneError
        } else if message.contains("validation") || message.contains("invalid") {
            Self::DataValidation
        } else if message.contains("not found") || message.contains("404") {
            Self::DataNotFound
        } else if message.contains("rate limit") || message.contains("429") {
            Self::ApiRateLimit
        } else if NETWORK_KIND_MARKERS
            .iter()
            .any(|marker| kind_name.contains(marker))
        {
            Self::NetworkError
        } else if AUTH_KIND_MARKERS.iter().any(|marker| kind_name.contains(marker)) {
            Self::Authentication
        } else {
            Self::Unknown
        }
    }
}

impl Display for ErrorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or(ValidationError::InvalidErrorType { value: normalized })
    }
}

/// Severity attached to an error record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
    Critical,
}

impl AlertLevel {
    pub const ALL: [Self; 4] = [Self::Info, Self::Warning, Self::Error, Self::Critical];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl Default for AlertLevel {
    fn default() -> Self {
        Self::Warning
    }
}

impl Display for AlertLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertLevel {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            other => Err(ValidationError::InvalidAlertLevel {
                value: other.to_owned(),
            }),
        }
    }
}

/// One recorded failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub timestamp: UtcDateTime,
    pub error_type: ErrorType,
    pub symbol: String,
    pub operation: String,
    pub details: String,
    pub severity: AlertLevel,
    pub additional_info: Attributes,
}

/// One recorded successful unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub timestamp: UtcDateTime,
    pub symbol: String,
    pub operation: String,
    #[serde(with = "duration_serde::option_secs")]
    pub duration: Option<Duration>,
    pub additional_info: Attributes,
}

/// Builder-style description of an error to record.
///
/// Severity defaults to [`AlertLevel::Warning`].
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEvent {
    pub error_type: ErrorType,
    pub symbol: String,
    pub operation: String,
    pub details: String,
    pub severity: AlertLevel,
    pub additional_info: Attributes,
}

impl ErrorEvent {
    pub fn new(
        error_type: ErrorType,
        symbol: impl Into<String>,
        operation: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            error_type,
            symbol: symbol.into(),
            operation: operation.into(),
            details: details.into(),
            severity: AlertLevel::default(),
            additional_info: Attributes::new(),
        }
    }

    pub fn with_severity(mut self, severity: AlertLevel) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_info(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.additional_info.insert(key.to_owned(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::LookupError;

    #[test]
    fn classifies_message_phrases_before_kind_names() {
        assert_eq!(
            ErrorType::classify("network", "7203.T: possibly delisted"),
            ErrorType::DelistedStock
        );
        assert_eq!(
            ErrorType::classify("other", "Invalid timezone offset"),
            ErrorType::TimezoneError
        );
        assert_eq!(
            ErrorType::classify("other", "schema validation failed"),
            ErrorType::DataValidation
        );
        assert_eq!(
            ErrorType::classify("http", "HTTP 404 from upstream"),
            ErrorType::DataNotFound
        );
        assert_eq!(
            ErrorType::classify("http", "Rate limit exceeded"),
            ErrorType::ApiRateLimit
        );
    }

    #[test]
    fn classifies_kind_names_when_message_is_generic() {
        assert_eq!(ErrorType::classify("ConnectionError", "reset by peer"), ErrorType::NetworkError);
        assert_eq!(ErrorType::classify("timeout", "deadline elapsed"), ErrorType::NetworkError);
        assert_eq!(ErrorType::classify("unauthorized", "bad credentials"), ErrorType::Authentication);
        assert_eq!(ErrorType::classify("other", "boom"), ErrorType::Unknown);
    }

    #[test]
    fn classifies_lookup_error_kind_names() {
        for (error, expected) in [
            (LookupError::rate_limited("429 Too Many Requests"), ErrorType::ApiRateLimit),
            (LookupError::network("connection refused"), ErrorType::NetworkError),
            (LookupError::unauthorized("access denied"), ErrorType::Authentication),
        ] {
            assert_eq!(ErrorType::classify(error.kind().as_str(), error.message()), expected);
        }
    }

    #[test]
    fn parses_and_displays_closed_sets() {
        for kind in ErrorType::ALL {
            assert_eq!(kind.as_str().parse::<ErrorType>(), Ok(kind));
        }
        assert_eq!("CRITICAL".parse::<AlertLevel>(), Ok(AlertLevel::Critical));
        assert!("fatal".parse::<AlertLevel>().is_err());
        assert!(AlertLevel::Critical > AlertLevel::Warning);
        assert_eq!(AlertLevel::default(), AlertLevel::Warning);
    }
}
