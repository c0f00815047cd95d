//! Untyped values exchanged with the remote procedure endpoint.
//!
//! # Design
//! The remote API is loosely typed: every parameter and result is one of a
//! small, closed set of wire types, and records are string-keyed structs whose
//! shape is only known by convention. `Value` models that set exactly so the
//! mappers can pin down field contracts without guessing.
//!
//! The serde representation is externally tagged with the wire type names
//! (`{"int": 5}`, `{"dateTime.iso8601": "20240101T10:00:00"}`), which keeps the
//! distinction between strings, dates and binary payloads when the value is
//! carried over a JSON transport.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Fixed timestamp layout used by `dateTime.iso8601` values.
pub const DATE_FORMAT: &str = "%Y%m%dT%H:%M:%S";

/// A string-keyed remote struct.
pub type Record = BTreeMap<String, Value>;

/// A dynamically typed remote value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[serde(rename = "int")]
    Int(i64),
    #[serde(rename = "boolean")]
    Bool(bool),
    #[serde(rename = "string")]
    String(String),
    #[serde(rename = "double")]
    Double(f64),
    #[serde(rename = "dateTime.iso8601", with = "wire_date")]
    DateTime(NaiveDateTime),
    #[serde(rename = "base64")]
    Base64(Vec<u8>),
    #[serde(rename = "array")]
    Array(Vec<Value>),
    #[serde(rename = "struct")]
    Struct(Record),
    #[serde(rename = "nil")]
    Nil,
}

impl Value {
    /// Build a `Struct` value from `(name, value)` pairs.
    pub fn record<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Name of the wire type, used in mapping error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "boolean",
            Value::String(_) => "string",
            Value::Double(_) => "double",
            Value::DateTime(_) => "dateTime.iso8601",
            Value::Base64(_) => "base64",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
            Value::Nil => "nil",
        }
    }

    /// Boolean-like wire check: only `1` and `true` count.
    ///
    /// The API encodes flags as the integers `1`/`0`, and some servers send
    /// real booleans instead. Any other value, including the string `"1"`, is
    /// false.
    pub fn is_one(&self) -> bool {
        matches!(self, Value::Int(1) | Value::Bool(true))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Struct(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Record> for Value {
    fn from(fields: Record) -> Self {
        Value::Struct(fields)
    }
}

mod wire_date {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DATE_FORMAT;

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&dt.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(12, 0, 5)
            .unwrap()
    }

    #[test]
    fn is_one_only_accepts_one_and_true() {
        assert!(Value::Int(1).is_one());
        assert!(Value::Bool(true).is_one());
        assert!(!Value::Int(0).is_one());
        assert!(!Value::Int(2).is_one());
        assert!(!Value::Bool(false).is_one());
        assert!(!Value::from("1").is_one());
    }

    #[test]
    fn serializes_with_wire_type_tags() {
        let value = Value::record([
            ("title", Value::from("Hi")),
            ("postid", Value::Int(7)),
            ("published", Value::Bool(true)),
        ]);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["struct"]["title"]["string"], "Hi");
        assert_eq!(json["struct"]["postid"]["int"], 7);
        assert_eq!(json["struct"]["published"]["boolean"], true);
    }

    #[test]
    fn date_uses_fixed_wire_format() {
        let json = serde_json::to_value(Value::DateTime(noon())).unwrap();
        assert_eq!(json["dateTime.iso8601"], "20240309T12:00:05");

        let back: Value = serde_json::from_value(json).unwrap();
        assert_eq!(back, Value::DateTime(noon()));
    }

    #[test]
    fn rejects_malformed_date() {
        let result: Result<Value, _> =
            serde_json::from_str(r#"{"dateTime.iso8601":"2024-03-09 12:00:05"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn nil_is_a_bare_tag() {
        assert_eq!(serde_json::to_string(&Value::Nil).unwrap(), r#""nil""#);
        let back: Value = serde_json::from_str(r#""nil""#).unwrap();
        assert_eq!(back, Value::Nil);
    }

    #[test]
    fn accessors_match_variant() {
        let arr = Value::from(vec![Value::Int(1), Value::from("x")]);
        assert_eq!(arr.as_array().map(<[Value]>::len), Some(2));
        assert!(arr.as_record().is_none());
        assert_eq!(Value::Int(3).as_i64(), Some(3));
        assert_eq!(Value::from("3").as_i64(), None);
        assert_eq!(Value::from("abc").as_str(), Some("abc"));
        assert_eq!(Value::Base64(vec![1]).type_name(), "base64");
    }
}
