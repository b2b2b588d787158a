//! Dynamic value representation for Sigma data.
//!
//! This module provides the [`Value`] enum which represents any valid Sigma
//! value. It is what the reader produces and what the writer consumes.
//!
//! ## Core Types
//!
//! - [`Value`]: null, boolean, number, string, binary, list, map, temporal or
//!   named object
//! - [`Bytes`]: marks a typed byte sequence so it is written as binary rather
//!   than as a list of numbers
//!
//! ## Usage Patterns
//!
//! ### Creating Values
//!
//! ```rust
//! use sigma::{value, Value};
//!
//! let null = Value::Null;
//! let boolean = Value::from(true);
//! let number = Value::from(42);
//! let text = Value::from("hello");
//!
//! let map = value!({ "name" => "Alice", 1 => [1, 2] });
//! assert!(map.is_map());
//! ```
//!
//! ### Type Checking
//!
//! ```rust
//! use sigma::Value;
//!
//! let value = Value::from(42);
//! assert!(value.is_number());
//! assert!(!value.is_string());
//! assert_eq!(value.kind(), "number");
//! ```
//!
//! ### Exporting Through Serde
//!
//! `Value` implements [`serde::Serialize`] and [`serde::Deserialize`], so a
//! parsed document can be handed to any serde data format. Numbers and
//! temporals travel as their wire text:
//!
//! ```rust
//! use sigma::from_str;
//!
//! let value: sigma::Value = from_str(r#"{"a"=[1,&t]}"#).unwrap();
//! let json = serde_json::to_string(&value).unwrap();
//! assert_eq!(json, r#"{"a":["1",true]}"#);
//! ```
//!
//! Inside this crate the same impls are lossless: a `Value` field of a
//! derived struct keeps its exact number, temporal or object.

use crate::temporal::{OffsetTime, Temporal, ZonedDateTime};
use crate::{Map, Object};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;

// Newtype-struct names that mark payloads whose plain serde form would lose
// their kind. Other formats see the inner text; this crate's serializer and
// deserializer recognize the marker.
pub(crate) const NUMBER_TOKEN: &str = "$sigma::private::Number";
pub(crate) const TEMPORAL_TOKEN: &str = "$sigma::private::Temporal";
pub(crate) const OBJECT_TOKEN: &str = "$sigma::private::Object";
pub(crate) const VALUE_TOKEN: &str = "$sigma::private::Value";

/// A dynamically-typed representation of any Sigma value.
///
/// Numbers compare numerically, so `Value::from(1)` equals the value read from
/// `1.0`. Any value, including lists and maps, may be used as a map key.
///
/// # Examples
///
/// ```rust
/// use sigma::{Map, Value};
///
/// let list = Value::List(vec![Value::from(1), Value::Null]);
/// assert!(list.is_list());
/// assert_eq!(list.as_list().map(Vec::len), Some(2));
///
/// let mut map = Map::new();
/// map.insert(list.clone(), Value::from("list key"));
/// assert_eq!(Value::from(map).kind(), "map");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Decimal),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(Map),
    Temporal(Temporal),
    Object(Object),
}

/// An owned byte sequence that is written as binary.
///
/// A plain `Vec<u8>` field is written as a list of numbers; wrap it in `Bytes`
/// to get the `|len|...` or `*base64` forms instead.
///
/// # Examples
///
/// ```rust
/// use sigma::{to_string, Bytes};
///
/// assert_eq!(to_string(&Bytes::from(vec![1, 2])).unwrap(), "|2|\u{1}\u{2}");
/// assert_eq!(to_string(&vec![1u8, 2]).unwrap(), "[1,2]");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    /// Unwraps the byte vector.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes(bytes)
    }
}

impl From<&[u8]> for Bytes {
    fn from(bytes: &[u8]) -> Self {
        Bytes(bytes.to_vec())
    }
}

impl Value {
    /// Returns `true` if the value is null.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` if the value is a boolean.
    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Returns `true` if the value is a number.
    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Returns `true` if the value is a string.
    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Returns `true` if the value is a byte blob.
    #[inline]
    #[must_use]
    pub const fn is_bytes(&self) -> bool {
        matches!(self, Value::Bytes(_))
    }

    /// Returns `true` if the value is a list.
    #[inline]
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Returns `true` if the value is a map.
    #[inline]
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Returns `true` if the value is a date or time.
    #[inline]
    #[must_use]
    pub const fn is_temporal(&self) -> bool {
        matches!(self, Value::Temporal(_))
    }

    /// Returns `true` if the value is a named object.
    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Short name of the value's kind, as used in coercion errors. Objects
    /// report their type name.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sigma::Value;
    ///
    /// assert_eq!(Value::Null.kind(), "null");
    /// assert_eq!(Value::Bytes(vec![]).kind(), "binary");
    /// ```
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bytes(_) => "binary",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Temporal(t) => t.kind(),
            Value::Object(o) => o.name(),
        }
    }

    /// If the value is a boolean, returns it. Otherwise returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sigma::Value;
    ///
    /// assert_eq!(Value::Bool(true).as_bool(), Some(true));
    /// assert_eq!(Value::from(42).as_bool(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is a string, returns a reference to it. Otherwise returns `None`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// If the value is a number, returns it. Otherwise returns `None`.
    #[inline]
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_temporal(&self) -> Option<&Temporal> {
        match self {
            Value::Temporal(t) => Some(t),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

struct Binary<'a>(&'a [u8]);

impl Serialize for Binary<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.0)
    }
}

impl Serialize for Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

struct BytesVisitor;

impl<'de> Visitor<'de> for BytesVisitor {
    type Value = Bytes;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("binary data or a list of bytes")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Bytes, E> {
        Ok(Bytes(v.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Bytes, E> {
        Ok(Bytes(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Bytes, A::Error> {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(b) = seq.next_element::<u8>()? {
            bytes.push(b);
        }
        Ok(Bytes(bytes))
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_byte_buf(BytesVisitor)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_newtype_struct(NUMBER_TOKEN, &n.to_string()),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(b) => Binary(b).serialize(serializer),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut ser_map = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    ser_map.serialize_entry(k, v)?;
                }
                ser_map.end()
            }
            Value::Temporal(t) => t.serialize(serializer),
            Value::Object(object) => object.serialize(serializer),
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any valid Sigma value")
    }

    fn visit_bool<E>(self, value: bool) -> Result<Value, E> {
        Ok(Value::Bool(value))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Value, E> {
        Ok(Value::from(value))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Value, E> {
        Ok(Value::from(value))
    }

    fn visit_i128<E: de::Error>(self, value: i128) -> Result<Value, E> {
        Decimal::from_i128(value)
            .map(Value::Number)
            .ok_or_else(|| E::custom(format!("{} is out of decimal range", value)))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Value, E> {
        Decimal::from_f64(value)
            .map(Value::Number)
            .ok_or_else(|| E::custom(format!("{} is not a decimal number", value)))
    }

    fn visit_str<E>(self, value: &str) -> Result<Value, E> {
        Ok(Value::String(value.to_string()))
    }

    fn visit_string<E>(self, value: String) -> Result<Value, E> {
        Ok(Value::String(value))
    }

    fn visit_bytes<E>(self, value: &[u8]) -> Result<Value, E> {
        Ok(Value::Bytes(value.to_vec()))
    }

    fn visit_byte_buf<E>(self, value: Vec<u8>) -> Result<Value, E> {
        Ok(Value::Bytes(value))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Deserialize::deserialize(deserializer)
    }

    fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut vec = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(elem) = seq.next_element()? {
            vec.push(elem);
        }
        Ok(Value::List(vec))
    }

    fn visit_map<A>(self, mut access: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let first: Option<Value> = access.next_key()?;
        if let Some(Value::String(tag)) = &first {
            match tag.as_str() {
                NUMBER_TOKEN => {
                    let text: String = access.next_value()?;
                    return Decimal::from_str_exact(&text)
                        .map(Value::Number)
                        .map_err(de::Error::custom);
                }
                TEMPORAL_TOKEN => {
                    let text: String = access.next_value()?;
                    return text
                        .parse::<Temporal>()
                        .map(Value::Temporal)
                        .map_err(de::Error::custom);
                }
                OBJECT_TOKEN => {
                    let body: Value = access.next_value()?;
                    return Object::from_body(body)
                        .map(Value::Object)
                        .ok_or_else(|| de::Error::custom("malformed object"));
                }
                _ => {}
            }
        }
        let mut map = Map::new();
        if let Some(key) = first {
            map.insert(key, access.next_value()?);
            while let Some((key, value)) = access.next_entry()? {
                map.insert(key, value);
            }
        }
        Ok(Value::Map(map))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_newtype_struct(VALUE_TOKEN, ValueVisitor)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(Decimal::from(value))
                }
            }
        )*
    };
}

number_from!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Bytes(value.0)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Map(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<Temporal> for Value {
    fn from(value: Temporal) -> Self {
        Value::Temporal(value)
    }
}

macro_rules! temporal_from {
    ($($ty:ty => $variant:ident),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Temporal(Temporal::$variant(value))
                }
            }
        )*
    };
}

temporal_from!(
    NaiveDate => Date,
    NaiveTime => Time,
    OffsetTime => OffsetTime,
    NaiveDateTime => DateTime,
    DateTime<FixedOffset> => OffsetDateTime,
    ZonedDateTime => Zoned
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    use std::str::FromStr;

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_numbers_compare_numerically() {
        let one = Value::from(1);
        let one_point_zero = Value::Number(Decimal::from_str("1.0").unwrap());
        assert_eq!(one, one_point_zero);
        assert_eq!(hash_of(&one), hash_of(&one_point_zero));
    }

    #[test]
    fn test_from_primitives() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42u8), Value::Number(Decimal::from(42)));
        assert_eq!(Value::from("test"), Value::String("test".to_string()));
        assert_eq!(Value::from(Bytes(vec![1])), Value::Bytes(vec![1]));
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Value::from(1).kind(), "number");
        assert_eq!(Value::List(vec![]).kind(), "list");
        let date = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        assert_eq!(Value::from(date).kind(), "date");
    }

    #[test]
    fn test_accessors() {
        let value = Value::List(vec![Value::Null]);
        assert!(value.as_map().is_none());
        assert_eq!(value.as_list().unwrap()[0], Value::Null);
        assert_eq!(Value::Bytes(vec![9]).as_bytes(), Some(&[9u8][..]));
        assert_eq!(Value::from(7).as_decimal(), Some(Decimal::from(7)));
    }

    #[test]
    fn test_const_is_methods() {
        const fn check_null(v: &Value) -> bool {
            v.is_null()
        }

        assert!(check_null(&Value::Null));
        assert!(!check_null(&Value::Bool(false)));
    }

    #[test]
    fn test_serialize_temporal_as_text() {
        let date = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        let json = serde_json::to_string(&Value::from(date)).unwrap();
        assert_eq!(json, "\"2019-01-01\"");
    }

    #[test]
    fn test_deserialize_from_json() {
        let value: Value = serde_json::from_str(r#"{"a":[1,2.5,null,true]}"#).unwrap();
        let map = value.as_map().unwrap();
        let list = map.get(&Value::from("a")).and_then(Value::as_list).unwrap();
        assert_eq!(list[0], Value::from(1));
        assert_eq!(list[1], Value::Number(Decimal::from_str("2.5").unwrap()));
        assert_eq!(list[2], Value::Null);
        assert_eq!(list[3], Value::Bool(true));
    }
}
