//! Timestamp utilities

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

use crate::{Error, Result};

/// Current UTC timestamp, truncated to the millisecond precision it is stored with
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Format a timestamp the way it is stored in the database (RFC 3339, millisecond precision)
pub fn to_db_string(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored RFC 3339 timestamp
pub fn from_db_string(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid stored timestamp '{}': {}", value, e)))
}

/// Parse an optional stored timestamp
pub fn from_db_optional(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value.as_deref().map(from_db_string).transpose()
}
