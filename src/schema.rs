//! JSON codec shared by every API record.
//!
//! Each record is a single serde type: required fields are plain types,
//! optional/nullable fields are `Option<_>` with `#[serde(default)]`, and
//! unknown fields are ignored. The [`Schema`] trait gives all of them the
//! same `load`/`dump` surface.
//!
//! Two field helpers cover the cases serde does not express directly:
//!
//! - [`nullable`] — the key must be present but its value may be `null`.
//! - [`timestamp`] / [`timestamp_opt`] — ISO-8601 timestamps with or without
//!   an offset (naive values are taken as UTC).

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::Result;

/// Decode/encode pair for an API record.
pub trait Schema: Sized {
    /// Validates and converts a parsed JSON value.
    fn load(value: Value) -> Result<Self>;

    /// Validates and converts a JSON document.
    fn loads(json: &str) -> Result<Self>;

    /// Converts the record back to a JSON value.
    fn dump(&self) -> Result<Value>;

    /// Converts the record back to a JSON document.
    fn dumps(&self) -> Result<String>;
}

impl<T> Schema for T
where
    T: Serialize + DeserializeOwned,
{
    fn load(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    fn loads(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn dump(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn dumps(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Deserializes a field that must be present but may be `null`.
///
/// Using `deserialize_with` on an `Option` field turns off serde's
/// implicit "missing means `None`" behaviour.
pub fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

fn parse_timestamp(raw: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&chrono::Utc));
    }
    raw.parse::<chrono::NaiveDateTime>()
        .ok()
        .map(|naive| naive.and_utc())
}

/// Required timestamp field.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    /// Writes RFC 3339 in UTC.
    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, false))
    }

    /// Reads RFC 3339 or naive ISO-8601.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| D::Error::custom(format!("not a valid datetime: {raw:?}")))
    }
}

/// Optional, nullable timestamp field. Pair with `#[serde(default)]`.
pub mod timestamp_opt {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    /// Writes RFC 3339 in UTC, or `null`.
    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => super::timestamp::serialize(dt, s),
            None => s.serialize_none(),
        }
    }

    /// Reads RFC 3339, naive ISO-8601, or `null`.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) => super::parse_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("not a valid datetime: {raw:?}"))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Datelike, Timelike, Utc};

    #[derive(Debug, Serialize, Deserialize)]
    struct Stamped {
        #[serde(with = "timestamp")]
        at: DateTime<Utc>,
        #[serde(default, with = "timestamp_opt")]
        maybe: Option<DateTime<Utc>>,
        #[serde(deserialize_with = "nullable")]
        cursor: Option<String>,
    }

    #[test]
    fn timestamp_accepts_offset_form() {
        let s = Stamped::loads(
            r#"{"at": "2020-08-26T04:00:11.143+00:00", "cursor": null}"#,
        )
        .unwrap();
        assert_eq!(s.at.year(), 2020);
        assert_eq!(s.at.hour(), 4);
        assert!(s.maybe.is_none());
        assert!(s.cursor.is_none());
    }

    #[test]
    fn timestamp_accepts_naive_form_as_utc() {
        let s = Stamped::loads(r#"{"at": "2021-03-04T10:11:12.123456", "cursor": "c"}"#).unwrap();
        assert_eq!(s.at.minute(), 11);
        assert_eq!(s.cursor.as_deref(), Some("c"));
    }

    #[test]
    fn timestamp_converts_offsets_to_utc() {
        let s = Stamped::loads(r#"{"at": "2020-01-01T02:00:00+02:00", "cursor": null}"#).unwrap();
        assert_eq!(s.at.hour(), 0);
    }

    #[test]
    fn timestamp_rejects_garbage() {
        assert!(Stamped::loads(r#"{"at": "yesterday", "cursor": null}"#).is_err());
    }

    #[test]
    fn nullable_field_must_be_present() {
        assert!(Stamped::loads(r#"{"at": "2020-01-01T00:00:00Z"}"#).is_err());
    }

    #[test]
    fn dumps_is_stable_across_loads() {
        let json = r#"{"at": "2020-08-26T04:00:11.143+00:00", "maybe": "2020-08-27T00:00:00Z", "cursor": null}"#;
        let first = Stamped::loads(json).unwrap().dumps().unwrap();
        let second = Stamped::loads(&first).unwrap().dumps().unwrap();
        assert_eq!(first, second);
    }
}
