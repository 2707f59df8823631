use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::ValidationError;

/// Instant held in UTC and rendered as RFC3339 with a `Z` suffix.
///
/// Input may carry any offset (snapshots of Tokyo sessions are usually
/// stamped `+09:00`); it is normalized to UTC on parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime(OffsetDateTime);

impl UtcDateTime {
    /// Earliest representable instant.
    pub const MIN: Self = Self(PrimitiveDateTime::MIN.assume_utc());
    /// Latest representable instant.
    pub const MAX: Self = Self(PrimitiveDateTime::MAX.assume_utc());

    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        OffsetDateTime::parse(input.trim(), &Rfc3339)
            .map(|parsed| Self(parsed.to_offset(UtcOffset::UTC)))
            .map_err(|_| ValidationError::InvalidTimestamp {
                value: input.to_owned(),
            })
    }

    /// Shifts the timestamp forward, saturating at [`UtcDateTime::MAX`].
    pub fn plus(self, duration: Duration) -> Self {
        time::Duration::try_from(duration)
            .ok()
            .and_then(|delta| self.0.checked_add(delta))
            .map_or(Self::MAX, Self)
    }

    /// Shifts the timestamp backward, saturating at [`UtcDateTime::MIN`].
    pub fn minus(self, duration: Duration) -> Self {
        time::Duration::try_from(duration)
            .ok()
            .and_then(|delta| self.0.checked_sub(delta))
            .map_or(Self::MIN, Self)
    }

    /// Elapsed time from `earlier` to `self`; zero when `earlier` is in the future.
    pub fn duration_since(self, earlier: Self) -> Duration {
        Duration::try_from(self.0 - earlier.0).unwrap_or(Duration::ZERO)
    }

    pub fn format_rfc3339(self) -> String {
        self.0
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.0.unix_timestamp().to_string())
    }
}

impl Display for UtcDateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for UtcDateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_rfc3339())
    }
}

impl<'de> Deserialize<'de> for UtcDateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}
