//! Coercion of dynamic [`Value`]s into statically typed Rust values.
//!
//! `Value` implements [`serde::Deserializer`], so any `T: Deserialize` can be
//! narrowed out of a parsed value. The deserializer applies these rules:
//!
//! 1. `Null` becomes `None` for `Option<T>` and unit for `()`; every other
//!    target rejects it, except [`Value`] itself.
//! 2. A value whose payload already has the target's shape is taken as-is.
//! 3. Booleans go to `bool`.
//! 4. Numbers narrow exactly into the integer and float types. A fractional
//!    part or an out-of-range magnitude is an error; nothing is rounded.
//! 5. Maps go into map targets (`IndexMap`, `BTreeMap`, `HashMap`, [`Map`]),
//!    narrowing every key and value.
//! 6. Lists go into sequence targets, narrowing every element. A byte blob
//!    counts as a list of byte-sized numbers.
//! 7. Named objects go into the struct with the same serialized name, field
//!    by field. Temporals go only into temporal types.
//! 8. Anything else fails with "unable to coerce".
//!
//! Container coercion is all-or-nothing: one failing entry fails the whole
//! container.
//!
//! ```rust
//! use sigma::{coerce, value};
//!
//! let names: Vec<String> = coerce(value!(["abc"])).unwrap();
//! assert_eq!(names, vec!["abc".to_string()]);
//!
//! let err = coerce::<Vec<String>>(value!(["abc", 4])).unwrap_err();
//! assert!(err.to_string().contains("unable to coerce"));
//! ```

use crate::record::Object;
use crate::value::{NUMBER_TOKEN, OBJECT_TOKEN, TEMPORAL_TOKEN, VALUE_TOKEN};
use crate::{Error, Map, Result, Value};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, DeserializeOwned, DeserializeSeed, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;

/// Coerces `value` into `T`.
///
/// # Errors
///
/// Returns an error containing "unable to coerce" when no lossless
/// conversion exists.
pub fn coerce<T: DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(value)
}

fn mismatch(value: &Value, target: &str) -> Error {
    Error::coerce(value.kind(), target)
}

fn inexact(n: Decimal, target: &str) -> Error {
    Error::coerce(&format!("number {}", n), target)
}

fn visit_number<'de, V: Visitor<'de>>(n: Decimal, visitor: V) -> Result<V::Value> {
    if n.fract().is_zero() {
        if let Some(i) = n.to_i64() {
            return visitor.visit_i64(i);
        }
        if let Some(u) = n.to_u64() {
            return visitor.visit_u64(u);
        }
    }
    visitor.visit_string(n.to_string())
}

macro_rules! deserialize_integral {
    ($($method:ident => $visit:ident, $to:ident, $target:literal;)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                match self {
                    Value::Number(n) if n.fract().is_zero() => match n.$to() {
                        Some(v) => visitor.$visit(v),
                        None => Err(inexact(n, $target)),
                    },
                    Value::Number(n) => Err(inexact(n, $target)),
                    other => Err(mismatch(&other, $target)),
                }
            }
        )*
    };
}

macro_rules! deserialize_float {
    ($($method:ident => $visit:ident, $to:ident, $target:literal;)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                match self {
                    Value::Number(n) => match n.$to().filter(|f| f.is_finite()) {
                        Some(v) => visitor.$visit(v),
                        None => Err(inexact(n, $target)),
                    },
                    other => Err(mismatch(&other, $target)),
                }
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for Value {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(n) => visit_number(n, visitor),
            Value::String(s) => visitor.visit_string(s),
            Value::Bytes(b) => visitor.visit_byte_buf(b),
            Value::List(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            Value::Map(map) => visitor.visit_map(MapDeserializer::new(map)),
            Value::Temporal(t) => visitor.visit_string(t.to_string()),
            Value::Object(object) => visitor.visit_map(StructDeserializer::new(object)),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            Value::Bool(b) => visitor.visit_bool(b),
            other => Err(mismatch(&other, "bool")),
        }
    }

    deserialize_integral! {
        deserialize_i8 => visit_i8, to_i8, "i8";
        deserialize_i16 => visit_i16, to_i16, "i16";
        deserialize_i32 => visit_i32, to_i32, "i32";
        deserialize_i64 => visit_i64, to_i64, "i64";
        deserialize_i128 => visit_i128, to_i128, "i128";
        deserialize_u8 => visit_u8, to_u8, "u8";
        deserialize_u16 => visit_u16, to_u16, "u16";
        deserialize_u32 => visit_u32, to_u32, "u32";
        deserialize_u64 => visit_u64, to_u64, "u64";
        deserialize_u128 => visit_u128, to_u128, "u128";
    }

    deserialize_float! {
        deserialize_f32 => visit_f32, to_f32, "f32";
        deserialize_f64 => visit_f64, to_f64, "f64";
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            Value::String(s) if s.chars().count() == 1 => match s.chars().next() {
                Some(c) => visitor.visit_char(c),
                None => Err(Error::coerce("string", "char")),
            },
            other => Err(mismatch(&other, "char")),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            Value::String(s) => visitor.visit_string(s),
            other => Err(mismatch(&other, "string")),
        }
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            Value::Bytes(b) => visitor.visit_byte_buf(b),
            Value::List(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            other => Err(mismatch(&other, "binary")),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(other),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            Value::Null => visitor.visit_unit(),
            other => Err(mismatch(&other, "null")),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        match (name, self) {
            (VALUE_TOKEN, value) => visitor.visit_newtype_struct(Lossless(value)),
            (NUMBER_TOKEN, Value::Number(n)) => visitor.visit_string(n.to_string()),
            (NUMBER_TOKEN, other) => Err(mismatch(&other, "number")),
            (TEMPORAL_TOKEN, Value::Temporal(t)) => visitor.visit_string(t.to_string()),
            (TEMPORAL_TOKEN, other) => Err(mismatch(&other, "date or time")),
            (_, value) => visitor.visit_newtype_struct(value),
        }
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            Value::List(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            Value::Bytes(bytes) => {
                let items = bytes.into_iter().map(Value::from).collect();
                visitor.visit_seq(SeqDeserializer::new(items))
            }
            other => Err(mismatch(&other, "list")),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            Value::Map(map) => visitor.visit_map(MapDeserializer::new(map)),
            other => Err(mismatch(&other, "map")),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self {
            Value::Object(object) if object.name() == name => {
                visitor.visit_map(StructDeserializer::new(object))
            }
            other => Err(mismatch(&other, name)),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self {
            Value::String(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
            }),
            Value::Map(map) if map.len() == 1 => match map.into_iter().next() {
                Some((Value::String(variant), value)) => visitor.visit_enum(EnumDeserializer {
                    variant,
                    value: Some(value),
                }),
                _ => Err(Error::coerce("map", name)),
            },
            other => Err(mismatch(&other, name)),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        drop(self);
        visitor.visit_unit()
    }
}

impl<'de> IntoDeserializer<'de, Error> for Value {
    type Deserializer = Value;

    fn into_deserializer(self) -> Value {
        self
    }
}

/// Feeds a value to [`Value`]'s own `Deserialize` without narrowing.
///
/// Numbers, temporals and objects are handed over as single-entry maps keyed
/// by their marker name, which the value visitor turns back into the original
/// payload.
struct Lossless(Value);

impl<'de> de::Deserializer<'de> for Lossless {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.0 {
            Value::Number(n) => {
                visitor.visit_map(Tagged::new(NUMBER_TOKEN, Value::String(n.to_string())))
            }
            Value::Temporal(t) => {
                visitor.visit_map(Tagged::new(TEMPORAL_TOKEN, Value::String(t.to_string())))
            }
            Value::Object(object) => visitor.visit_map(Tagged::new(OBJECT_TOKEN, object.into_body())),
            Value::List(items) => visitor.visit_seq(SeqDeserializer::lossless(items)),
            Value::Map(map) => visitor.visit_map(MapDeserializer::lossless(map)),
            other => other.deserialize_any(visitor),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

fn seed_value<'de, T: DeserializeSeed<'de>>(
    seed: T,
    value: Value,
    lossless: bool,
) -> Result<T::Value> {
    if lossless {
        seed.deserialize(Lossless(value))
    } else {
        seed.deserialize(value)
    }
}

struct Tagged {
    tag: Option<&'static str>,
    value: Option<Value>,
}

impl Tagged {
    fn new(tag: &'static str, value: Value) -> Self {
        Tagged {
            tag: Some(tag),
            value: Some(value),
        }
    }
}

impl<'de> de::MapAccess<'de> for Tagged {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.tag.take() {
            Some(tag) => {
                let key: de::value::StrDeserializer<'_, Error> = tag.into_deserializer();
                seed.deserialize(key).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        match self.value.take() {
            Some(value) => seed.deserialize(Lossless(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
    lossless: bool,
}

impl SeqDeserializer {
    fn new(vec: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
            lossless: false,
        }
    }

    fn lossless(vec: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
            lossless: true,
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed_value(seed, value, self.lossless).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: <Map as IntoIterator>::IntoIter,
    value: Option<Value>,
    lossless: bool,
}

impl MapDeserializer {
    fn new(map: Map) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
            lossless: false,
        }
    }

    fn lossless(map: Map) -> Self {
        MapDeserializer {
            lossless: true,
            ..MapDeserializer::new(map)
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed_value(seed, key, self.lossless).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        match self.value.take() {
            Some(value) => seed_value(seed, value, self.lossless),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

/// Walks a named object's fields, tagging each field error with
/// `record.field`.
struct StructDeserializer {
    record: String,
    iter: std::vec::IntoIter<(String, Value)>,
    pending: Option<(String, Value)>,
}

impl StructDeserializer {
    fn new(object: Object) -> Self {
        StructDeserializer {
            record: object.name().to_string(),
            iter: object.into_fields().into_iter(),
            pending: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for StructDeserializer {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.iter.next() {
            Some((field, value)) => {
                let key: de::value::StringDeserializer<Error> = field.clone().into_deserializer();
                self.pending = Some((field, value));
                seed.deserialize(key).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        match self.pending.take() {
            Some((field, value)) => seed
                .deserialize(value)
                .map_err(|cause| Error::property(&self.record, &field, cause)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self::Variant)> {
        let variant = seed.deserialize(Value::String(self.variant))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Some(Value::Null) | None => Ok(()),
            Some(other) => Err(mismatch(&other, "unit variant")),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        match self.value {
            Some(value) => seed.deserialize(value),
            None => Err(Error::coerce("string", "newtype variant")),
        }
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        match self.value {
            Some(Value::List(items)) => visitor.visit_seq(SeqDeserializer::new(items)),
            Some(other) => Err(mismatch(&other, "tuple variant")),
            None => Err(Error::coerce("string", "tuple variant")),
        }
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self.value {
            Some(Value::Map(map)) => visitor.visit_map(MapDeserializer::new(map)),
            Some(other) => Err(mismatch(&other, "struct variant")),
            None => Err(Error::coerce("string", "struct variant")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::Temporal;
    use crate::value::Bytes;
    use chrono::NaiveDate;
    use serde::Deserialize;
    use std::collections::BTreeMap;
    use std::str::FromStr;

    fn number(s: &str) -> Value {
        Value::Number(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_null_handling() {
        assert_eq!(coerce::<Option<i32>>(Value::Null).unwrap(), None);
        assert_eq!(coerce::<Value>(Value::Null).unwrap(), Value::Null);
        assert!(coerce::<i32>(Value::Null).is_err());
        assert!(coerce::<String>(Value::Null).is_err());
    }

    #[test]
    fn test_integral_narrowing() {
        assert_eq!(coerce::<i32>(number("54")).unwrap(), 54);
        assert_eq!(coerce::<i64>(number("55.000")).unwrap(), 55);
        assert_eq!(coerce::<u8>(number("255")).unwrap(), 255);
        assert_eq!(coerce::<i16>(number("-32768")).unwrap(), -32768);
        assert_eq!(coerce::<u64>(number("18446744073709551615")).unwrap(), u64::MAX);

        let err = coerce::<i32>(number("1.5")).unwrap_err();
        assert!(err.to_string().contains("unable to coerce number 1.5 to i32"));
        assert!(coerce::<u8>(number("256")).is_err());
        assert!(coerce::<u8>(number("-1")).is_err());
        assert!(coerce::<i32>(number("2147483648")).is_err());
    }

    #[test]
    fn test_float_and_decimal() {
        assert_eq!(coerce::<f64>(number("1.25")).unwrap(), 1.25);
        assert_eq!(coerce::<f32>(number("-0.5")).unwrap(), -0.5);
        assert_eq!(
            coerce::<Decimal>(number("1.20")).unwrap().to_string(),
            "1.20"
        );
        assert!(coerce::<f64>(Value::from("1.25")).is_err());
    }

    #[test]
    fn test_value_target_is_lossless() {
        let date = Value::from(NaiveDate::from_ymd_opt(2019, 3, 21).unwrap());
        let list = Value::List(vec![number("1.50"), date.clone(), Value::Bytes(vec![1])]);
        let back: Vec<Value> = coerce(list.clone()).unwrap();
        assert_eq!(Value::List(back), list);
        assert_eq!(coerce::<Value>(date.clone()).unwrap(), date);
        let n = coerce::<Value>(number("1.50")).unwrap();
        assert_eq!(n.as_decimal().unwrap().to_string(), "1.50");
    }

    #[test]
    fn test_map_target_rejects_list() {
        let err = coerce::<BTreeMap<i32, i32>>(Value::List(vec![])).unwrap_err();
        assert!(err.to_string().contains("unable to coerce list"));
    }

    #[test]
    fn test_list_target_rejects_map() {
        assert!(coerce::<Vec<i32>>(Value::Map(Map::new())).is_err());
    }

    #[test]
    fn test_bytes_as_sequence() {
        let bytes = Value::Bytes(vec![1, 2, 3]);
        assert_eq!(coerce::<Vec<i32>>(bytes.clone()).unwrap(), vec![1, 2, 3]);
        assert_eq!(coerce::<Bytes>(bytes).unwrap(), Bytes(vec![1, 2, 3]));
        let list = Value::List(vec![number("7"), number("300")]);
        assert!(coerce::<Bytes>(list).is_err());
    }

    #[test]
    fn test_temporal_identity_only() {
        let date = Value::from(NaiveDate::from_ymd_opt(2019, 3, 21).unwrap());
        assert!(matches!(
            coerce::<Temporal>(date.clone()).unwrap(),
            Temporal::Date(_)
        ));
        assert!(coerce::<String>(date).is_err());
        assert!(coerce::<Temporal>(Value::from("2019-03-21")).is_err());
    }

    #[derive(Debug, Deserialize, PartialEq)]
    enum Shape {
        Empty,
        Circle(i32),
        Rect { w: i32, h: i32 },
    }

    #[test]
    fn test_enums() {
        assert_eq!(coerce::<Shape>(Value::from("Empty")).unwrap(), Shape::Empty);
        let circle = crate::value!({ "Circle" => 3 });
        assert_eq!(coerce::<Shape>(circle).unwrap(), Shape::Circle(3));
        let rect = crate::value!({ "Rect" => { "w" => 1, "h" => 2 } });
        assert_eq!(coerce::<Shape>(rect).unwrap(), Shape::Rect { w: 1, h: 2 });
        assert!(coerce::<Shape>(Value::from(1)).is_err());
    }
}
