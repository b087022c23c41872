//! Serde helpers for message and conversation timestamps.
//!
//! Timestamps are written as RFC 3339 with an offset. Older stores wrote
//! offset-less ISO-8601 local times, which are still accepted on load.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serializer};

pub type Timestamp = DateTime<Local>;

pub fn serialize<S>(timestamp: &Timestamp, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&timestamp.to_rfc3339())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

/// Parse an RFC 3339 timestamp, falling back to a naive local date-time.
pub fn parse(raw: &str) -> Option<Timestamp> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Local));
    }

    let naive = raw.parse::<NaiveDateTime>().ok()?;
    Local.from_local_datetime(&naive).earliest()
}
