//! Lenient timestamp (de)serialization for persisted entities.
//!
//! The flat store carries `createdAt`/`updatedAt` as ISO-8601 strings. On
//! load, a valid RFC 3339 string becomes a real `DateTime<Utc>`; anything
//! malformed (or a non-string value) is replaced with `Utc::now()` instead
//! of failing the whole collection. Combined with `#[serde(default =
//! "chrono::Utc::now")]` on the fields, missing timestamps rehydrate the
//! same way at every nesting depth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&dt.to_rfc3339())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        _ => Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Datelike, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Stamped {
        #[serde(default = "chrono::Utc::now", with = "super")]
        at: DateTime<Utc>,
    }

    #[test]
    fn valid_iso_string_round_trips() {
        let parsed: Stamped = serde_json::from_str(r#"{"at":"2025-03-01T12:30:00Z"}"#).unwrap();
        assert_eq!(parsed.at.year(), 2025);
        assert_eq!(parsed.at.month(), 3);

        let json = serde_json::to_string(&parsed).unwrap();
        let again: Stamped = serde_json::from_str(&json).unwrap();
        assert_eq!(again.at, parsed.at);
    }

    #[test]
    fn malformed_string_becomes_now() {
        let before = Utc::now();
        let parsed: Stamped = serde_json::from_str(r#"{"at":"not-a-date"}"#).unwrap();
        assert!(parsed.at >= before);
    }

    #[test]
    fn non_string_value_becomes_now() {
        let before = Utc::now();
        let parsed: Stamped = serde_json::from_str(r#"{"at":42}"#).unwrap();
        assert!(parsed.at >= before);
    }

    #[test]
    fn missing_field_becomes_now() {
        let before = Utc::now();
        let parsed: Stamped = serde_json::from_str("{}").unwrap();
        assert!(parsed.at >= before);
    }
}
