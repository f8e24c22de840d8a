//! Tagged property values and the semantic types declared by the schema.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Semantic type of a property, as declared in a class definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropType {
    Integer,
    Decimal,
    String,
    Boolean,
    Date,
    Guid,
    Bytes,
}

impl PropType {
    /// Postgres column type used when generating DDL and casting binds.
    pub fn sql_type(&self) -> &'static str {
        match self {
            PropType::Integer => "bigint",
            PropType::Decimal => "double precision",
            PropType::String => "text",
            PropType::Boolean => "bool",
            PropType::Date => "timestamptz",
            PropType::Guid => "uuid",
            PropType::Bytes => "bytea",
        }
    }

    /// Converts `value` into this type.
    ///
    /// `Null` is always accepted. Strings are parsed into the target type, and
    /// integers widen into decimals. NaN is rejected. Returns `None` when the
    /// value cannot be represented as this type.
    pub fn coerce(&self, value: PropValue) -> Option<PropValue> {
        match (self, value) {
            (_, PropValue::Null) => Some(PropValue::Null),
            (PropType::Integer, v @ PropValue::Integer(_)) => Some(v),
            (PropType::Decimal, PropValue::Decimal(d)) if d.is_nan() => None,
            (PropType::Decimal, v @ PropValue::Decimal(_)) => Some(v),
            (PropType::String, v @ PropValue::String(_)) => Some(v),
            (PropType::Boolean, v @ PropValue::Boolean(_)) => Some(v),
            (PropType::Date, v @ PropValue::Date(_)) => Some(v),
            (PropType::Guid, v @ PropValue::Guid(_)) => Some(v),
            (PropType::Bytes, v @ PropValue::Bytes(_)) => Some(v),

            (PropType::Decimal, PropValue::Integer(i)) => Some(PropValue::Decimal(i as f64)),
            (PropType::Integer, PropValue::String(s)) => {
                s.trim().parse::<i64>().ok().map(PropValue::Integer)
            }
            (PropType::Decimal, PropValue::String(s)) => {
                s.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|d| !d.is_nan())
                    .map(PropValue::Decimal)
            }
            (PropType::Boolean, PropValue::String(s)) => {
                match s.trim().to_lowercase().as_str() {
                    "true" | "yes" | "1" => Some(PropValue::Boolean(true)),
                    "false" | "no" | "0" => Some(PropValue::Boolean(false)),
                    _ => None,
                }
            }
            (PropType::Guid, PropValue::String(s)) => {
                Uuid::parse_str(s.trim()).ok().map(PropValue::Guid)
            }
            (PropType::Date, PropValue::String(s)) => parse_date(&s).map(PropValue::Date),
            (PropType::Bytes, PropValue::String(s)) => Some(PropValue::Bytes(s.into_bytes())),
            _ => None,
        }
    }
}

impl fmt::Display for PropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropType::Integer => "integer",
            PropType::Decimal => "decimal",
            PropType::String => "string",
            PropType::Boolean => "boolean",
            PropType::Date => "date",
            PropType::Guid => "guid",
            PropType::Bytes => "bytes",
        };
        f.write_str(name)
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(ndt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

/// A property value. `Null` means "has no value".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropValue {
    #[default]
    Null,
    Integer(i64),
    Decimal(f64),
    String(String),
    Boolean(bool),
    Date(DateTime<Utc>),
    Guid(Uuid),
    Bytes(Vec<u8>),
}

impl PropValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PropValue::Null)
    }

    /// Name of the variant, used in type-mismatch messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropValue::Null => "null",
            PropValue::Integer(_) => "integer",
            PropValue::Decimal(_) => "decimal",
            PropValue::String(_) => "string",
            PropValue::Boolean(_) => "boolean",
            PropValue::Date(_) => "date",
            PropValue::Guid(_) => "guid",
            PropValue::Bytes(_) => "bytes",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropValue::Decimal(d) => Some(*d),
            PropValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            PropValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            PropValue::Guid(g) => Some(*g),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PropValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => f.write_str("NULL"),
            PropValue::Integer(i) => write!(f, "{}", i),
            PropValue::Decimal(d) => write!(f, "{}", d),
            PropValue::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            PropValue::Boolean(b) => write!(f, "{}", b),
            PropValue::Date(d) => write!(f, "'{}'", d.to_rfc3339()),
            PropValue::Guid(g) => write!(f, "'{}'", g),
            PropValue::Bytes(b) => write!(f, "'\\x{}'", hex::encode(b)),
        }
    }
}

impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        PropValue::Integer(v)
    }
}

impl From<i32> for PropValue {
    fn from(v: i32) -> Self {
        PropValue::Integer(v as i64)
    }
}

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        PropValue::Decimal(v)
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        PropValue::String(v.to_string())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        PropValue::String(v)
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        PropValue::Boolean(v)
    }
}

impl From<DateTime<Utc>> for PropValue {
    fn from(v: DateTime<Utc>) -> Self {
        PropValue::Date(v)
    }
}

impl From<Uuid> for PropValue {
    fn from(v: Uuid) -> Self {
        PropValue::Guid(v)
    }
}

impl From<Vec<u8>> for PropValue {
    fn from(v: Vec<u8>) -> Self {
        PropValue::Bytes(v)
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(PropValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_widens_to_decimal() {
        assert_eq!(
            PropType::Decimal.coerce(PropValue::Integer(3)),
            Some(PropValue::Decimal(3.0))
        );
    }

    #[test]
    fn strings_parse_into_declared_type() {
        assert_eq!(
            PropType::Integer.coerce("42".into()),
            Some(PropValue::Integer(42))
        );
        let id = Uuid::new_v4();
        assert_eq!(
            PropType::Guid.coerce(id.to_string().into()),
            Some(PropValue::Guid(id))
        );
        assert!(PropType::Date.coerce("2024-03-01".into()).is_some());
    }

    #[test]
    fn incompatible_values_are_rejected() {
        assert_eq!(PropType::Integer.coerce(PropValue::Boolean(true)), None);
        assert_eq!(PropType::Guid.coerce("not-a-guid".into()), None);
        assert_eq!(PropType::Integer.coerce(PropValue::Decimal(1.5)), None);
    }

    #[test]
    fn null_is_accepted_by_every_type() {
        assert_eq!(PropType::Bytes.coerce(PropValue::Null), Some(PropValue::Null));
    }
}
