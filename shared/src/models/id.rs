//! Record identifiers
//!
//! The backend may key a table with `bigint` or `uuid` columns, so an id can
//! arrive as a JSON number or a JSON string. [`RecordId`] accepts both and
//! writes back the same form it read.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Identifier of a backend row
///
/// Equality and hashing use the textual form, so `5` and `"5"` name the same row.
#[derive(Debug, Clone)]
pub struct RecordId {
    raw: String,
    numeric: bool,
}

impl RecordId {
    /// Build an id from text, treating integer-looking text as a numeric key
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let numeric = raw.parse::<i64>().is_ok();
        Self { raw, numeric }
    }

    /// Textual form, as used in REST filters (`id=eq.<as_str>`)
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the backend stores this key as an integer
    pub fn is_numeric(&self) -> bool {
        self.numeric
    }

    /// Short form shown on tickets (`Pedido #1a2b3c`)
    pub fn short(&self) -> &str {
        match self.raw.char_indices().nth(6) {
            Some((idx, _)) => &self.raw[..idx],
            None => &self.raw,
        }
    }
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for RecordId {}

impl Hash for RecordId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for RecordId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self {
            raw: value.to_string(),
            numeric: true,
        }
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.raw.parse::<i64>() {
            Ok(n) if self.numeric => serializer.serialize_i64(n),
            _ => serializer.serialize_str(&self.raw),
        }
    }
}

struct RecordIdVisitor;

impl Visitor<'_> for RecordIdVisitor {
    type Value = RecordId;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an integer or string record id")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(RecordId::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v)
            .map(RecordId::from)
            .map_err(|_| E::custom(format!("record id {v} out of range")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        if v.is_empty() {
            return Err(E::custom("record id must not be empty"));
        }
        Ok(RecordId {
            raw: v.to_string(),
            numeric: false,
        })
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RecordIdVisitor)
    }
}
