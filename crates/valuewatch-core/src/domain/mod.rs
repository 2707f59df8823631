//! # Domain Models
//!
//! Canonical domain types shared by the metrics, validation, and filtering
//! components.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Exchange-qualified ticker (`7203` normalizes to `7203.T`) |
//! | [`UtcDateTime`] | RFC3339 UTC timestamp |
//! | [`Attributes`] | Open key/value bag attached to records and results |

pub mod duration_serde;
mod symbol;
mod timestamp;

pub use symbol::{Symbol, TOKYO_SUFFIX};
pub use timestamp::UtcDateTime;

/// Free-form structured context attached to records and validation results.
pub type Attributes = serde_json::Map<String, serde_json::Value>;
