//! Forgiving deserializers for task fields.
//!
//! Task documents come from outside the core. A bad date or a non-numeric
//! estimate must not reject the whole task, so these helpers map anything they
//! cannot read to `None` and log a warning.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMinutes {
    Whole(u64),
    Signed(i64),
    Fractional(f64),
    Text(String),
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInstant {
    Text(String),
    EpochMillis(i64),
    Other(IgnoredAny),
}

pub(super) fn minutes<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawMinutes>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| {
        let parsed = match &raw {
            RawMinutes::Whole(n) => u32::try_from(*n).ok(),
            RawMinutes::Signed(_) => None,
            RawMinutes::Fractional(f) if f.is_finite() && *f >= 0.0 => Some(f.round() as u32),
            RawMinutes::Fractional(_) => None,
            RawMinutes::Text(s) => s.trim().parse::<u32>().ok(),
            RawMinutes::Other(_) => None,
        };
        if parsed.is_none() {
            tracing::warn!("ignoring malformed minute value in task document");
        }
        parsed
    }))
}

pub(super) fn instant<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawInstant>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| match raw {
        RawInstant::Text(s) => {
            let parsed = parse_instant(&s);
            if parsed.is_none() {
                tracing::warn!(value = %s, "ignoring unparseable timestamp in task document");
            }
            parsed
        }
        RawInstant::EpochMillis(ms) => Utc.timestamp_millis_opt(ms).single(),
        RawInstant::Other(_) => {
            tracing::warn!("ignoring non-string timestamp in task document");
            None
        }
    }))
}

/// Parse an instant written as RFC 3339, a naive `YYYY-MM-DDTHH:MM[:SS]`
/// (taken as UTC) or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
