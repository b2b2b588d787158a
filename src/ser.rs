//! Sigma writing.
//!
//! This module provides the [`Writer`] that encodes [`Value`]s, or any type
//! implementing [`serde::Serialize`], as Sigma text on a [`std::io::Write`]
//! sink. Typed values are first converted with [`ValueSerializer`].
//!
//! ## Overview
//!
//! - **Exact numbers**: decimals are written in their canonical expansion,
//!   never rounded and never switched to exponent form
//! - **Minimal escaping**: only `"`, `\`, and control characters are escaped;
//!   everything else, including astral codepoints, is raw UTF-8
//! - **Binary**: byte blobs are written raw (`|len|bytes`) or as unpadded
//!   base64 (`*...`) depending on [`WriteOptions`]
//!
//! ## Usage
//!
//! Most users should use the high-level functions in the crate root:
//!
//! ```rust
//! use sigma::{to_string, value};
//!
//! let text = to_string(&value!([1, 2, 3, "test"])).unwrap();
//! assert_eq!(text, r#"[1,2,3,"test"]"#);
//! ```
//!
//! ## Direct Writer Usage
//!
//! ```rust
//! use sigma::{Bytes, Writer, WriteOptions};
//!
//! let mut writer = Writer::new(Vec::new()).with_options(WriteOptions::base64());
//! writer.write_as(&Bytes::from(b"The quick brown fox".to_vec())).unwrap();
//! assert_eq!(writer.into_inner(), b"*VGhlIHF1aWNrIGJyb3duIGZveA");
//! ```

use crate::options::{BinaryEncoding, WriteOptions};
use crate::registry::TypeRegistry;
use crate::temporal::Temporal;
use crate::value::{NUMBER_TOKEN, OBJECT_TOKEN, TEMPORAL_TOKEN};
use crate::{utf8, Error, Map, Object, Result, Value};
use base64::Engine as _;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{ser, Serialize};
use std::io::Write;

const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

/// The Sigma writer.
///
/// Created via [`Writer::new`]; named objects are resolved against the global
/// [`TypeRegistry`] unless another one is supplied.
pub struct Writer<'a, W: Write> {
    output: W,
    options: WriteOptions,
    registry: &'a TypeRegistry,
}

impl<'a, W: Write> Writer<'a, W> {
    pub fn new(output: W) -> Self {
        Writer {
            output,
            options: WriteOptions::default(),
            registry: TypeRegistry::global(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: &'a TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Writes one value.
    ///
    /// # Errors
    ///
    /// Fails when a named object's type is not registered, when a temporal
    /// value has no exact wire form, or when the sink fails ("unable to
    /// write").
    pub fn write(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.put(b"&n"),
            Value::Bool(true) => self.put(b"&t"),
            Value::Bool(false) => self.put(b"&f"),
            Value::String(s) => self.write_string(s),
            Value::Number(n) => self.put(n.to_string().as_bytes()),
            Value::Temporal(t) => self.write_temporal(t),
            Value::Map(map) => self.write_map(map),
            Value::Bytes(bytes) => self.write_binary(bytes),
            Value::List(items) => self.write_list(items),
            Value::Object(object) => self.write_object(object),
        }
    }

    /// Converts `value` with [`ValueSerializer`] and writes the result.
    pub fn write_as<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let value = value.serialize(ValueSerializer)?;
        self.write(&value)
    }

    /// Flushes the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.output
            .flush()
            .map_err(|e| Error::write(format!("unable to write: {}", e)))
    }

    /// Returns the underlying sink.
    pub fn into_inner(self) -> W {
        self.output
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.output
            .write_all(bytes)
            .map_err(|e| Error::write(format!("unable to write: {}", e)))
    }

    fn write_codepoint(&mut self, c: u32) -> Result<()> {
        let mut buf = [0u8; 4];
        let mut len = 0;
        utf8::encode(c, |b| {
            buf[len] = b;
            len += 1;
            Ok(())
        })?;
        self.put(&buf[..len])
    }

    fn write_text(&mut self, s: &str) -> Result<()> {
        for ch in s.chars() {
            self.write_codepoint(ch as u32)?;
        }
        Ok(())
    }

    fn write_string(&mut self, s: &str) -> Result<()> {
        self.put(b"\"")?;
        for ch in s.chars() {
            match ch {
                '"' => self.put(b"\\\"")?,
                '\\' => self.put(b"\\\\")?,
                '\n' => self.put(b"\\n")?,
                '\r' => self.put(b"\\r")?,
                '\t' => self.put(b"\\t")?,
                c if (c as u32) < 0x20 => {
                    let c = c as usize;
                    self.put(b"\\u00")?;
                    self.put(&[HEX_CHARS[(c >> 4) & 0xF], HEX_CHARS[c & 0xF]])?;
                }
                c => self.write_codepoint(c as u32)?,
            }
        }
        self.put(b"\"")
    }

    fn write_temporal(&mut self, t: &Temporal) -> Result<()> {
        t.check_writable()
            .map_err(|reason| Error::write(format!("unable to write temporal value: {}", reason)))?;
        self.put(b"@")?;
        self.write_text(&t.to_string())
    }

    fn write_binary(&mut self, bytes: &[u8]) -> Result<()> {
        match self.options.binary_encoding {
            BinaryEncoding::Raw => {
                self.put(b"|")?;
                self.put(bytes.len().to_string().as_bytes())?;
                self.put(b"|")?;
                self.put(bytes)
            }
            BinaryEncoding::Base64 => {
                self.put(b"*")?;
                let encoded = base64::engine::general_purpose::STANDARD_NO_PAD.encode(bytes);
                self.put(encoded.as_bytes())
            }
        }
    }

    fn write_list(&mut self, items: &[Value]) -> Result<()> {
        self.put(b"[")?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.put(b",")?;
            }
            self.write(item)?;
        }
        self.put(b"]")
    }

    fn write_map(&mut self, map: &Map) -> Result<()> {
        self.put(b"{")?;
        for (i, (key, value)) in map.iter().enumerate() {
            if i > 0 {
                self.put(b",")?;
            }
            self.write(key)?;
            self.put(b"=")?;
            self.write(value)?;
        }
        self.put(b"}")
    }

    fn write_object(&mut self, object: &Object) -> Result<()> {
        let identifier = self
            .registry
            .lookup_identifier(object.name())
            .ok_or_else(|| {
                Error::write(format!(
                    "No object type registered for class {}",
                    object.name()
                ))
            })?;
        self.write_text(&identifier)?;
        self.put(b"{")?;
        for (i, (name, value)) in object.fields().iter().enumerate() {
            if i > 0 {
                self.put(b",")?;
            }
            self.write_text(name)?;
            self.put(b"=")?;
            self.write(value)?;
        }
        self.put(b"}")
    }
}

/// Converts any `T: Serialize` into a [`Value`].
///
/// Structs become named [`Object`]s under their serde name, unit variants
/// become strings, and other enum variants become single-entry maps keyed by
/// the variant name. Floats must have an exact decimal form.
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<Value>,
}

pub struct SerializeMap {
    map: Map,
    current_key: Option<Value>,
}

pub struct SerializeObject {
    object: Object,
}

/// Wraps a finished variant payload as `{variant: payload}`.
pub struct SerializeVariant<S> {
    variant: &'static str,
    inner: S,
}

fn float(v: Option<Decimal>, text: &dyn std::fmt::Display) -> Result<Value> {
    v.map(Value::Number)
        .ok_or_else(|| Error::write(format!("{} cannot be written as a decimal number", text)))
}

fn tagged(variant: &'static str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(Value::from(variant), value);
    Value::Map(map)
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVariant<SerializeVec>;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeObject;
    type SerializeStructVariant = SerializeVariant<SerializeMap>;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value> {
        Decimal::from_i128(v)
            .map(Value::Number)
            .ok_or_else(|| Error::write(format!("{} is out of decimal range", v)))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value> {
        Decimal::from_u128(v)
            .map(Value::Number)
            .ok_or_else(|| Error::write(format!("{} is out of decimal range", v)))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        float(Decimal::from_f32(v), &v)
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        float(Decimal::from_f64(v), &v)
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::from(variant))
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        let inner = value.serialize(self)?;
        match (name, inner) {
            (NUMBER_TOKEN, Value::String(text)) => Decimal::from_str_exact(&text)
                .map(Value::Number)
                .map_err(|e| Error::write(format!("invalid number {}: {}", text, e))),
            (TEMPORAL_TOKEN, Value::String(text)) => {
                text.parse::<Temporal>().map(Value::Temporal)
            }
            (OBJECT_TOKEN, body) => Object::from_body(body)
                .map(Value::Object)
                .ok_or_else(|| Error::write("malformed named object")),
            (_, inner) => Ok(inner),
        }
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(tagged(variant, value.serialize(self)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVariant<SerializeVec>> {
        Ok(SerializeVariant {
            variant,
            inner: SerializeVec::new(len),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new())
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<SerializeObject> {
        Ok(SerializeObject {
            object: Object::new(name),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeVariant<SerializeMap>> {
        Ok(SerializeVariant {
            variant,
            inner: SerializeMap::new(),
        })
    }
}

impl SerializeVec {
    fn new(capacity: usize) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(capacity),
        }
    }
}

impl SerializeMap {
    fn new() -> Self {
        SerializeMap {
            map: Map::new(),
            current_key: None,
        }
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::List(self.vec))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleVariant for SerializeVariant<SerializeVec> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(&mut self.inner, value)
    }

    fn end(self) -> Result<Value> {
        Ok(tagged(self.variant, ser::SerializeSeq::end(self.inner)?))
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.current_key = Some(key.serialize(ValueSerializer)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.map.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Map(self.map))
    }
}

impl ser::SerializeStruct for SerializeObject {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.object.push(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Object(self.object))
    }
}

impl ser::SerializeStructVariant for SerializeVariant<SerializeMap> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let value = value.serialize(ValueSerializer)?;
        self.inner.map.insert(Value::from(key), value);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(tagged(self.variant, Value::Map(self.inner.map)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::OffsetTime;
    use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone};
    use std::io;

    fn write(value: &Value) -> String {
        let mut writer = Writer::new(Vec::new());
        writer.write(value).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    struct FailingSink;

    impl io::Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_constants() {
        assert_eq!(write(&Value::Null), "&n");
        assert_eq!(write(&Value::Bool(true)), "&t");
        assert_eq!(write(&Value::Bool(false)), "&f");
    }

    #[test]
    fn test_control_characters_use_uppercase_hex() {
        assert_eq!(write(&Value::from("\u{0}\u{1}\u{1f}")), r#""\u0000\u0001\u001F""#);
        assert_eq!(write(&Value::from("a\"b\\c\n\r\t")), r#""a\"b\\c\n\r\t""#);
    }

    #[test]
    fn test_astral_codepoints_are_raw() {
        assert_eq!(write(&Value::from("\u{1F600}")), "\"\u{1F600}\"");
    }

    #[test]
    fn test_empty_base64() {
        let mut writer = Writer::new(Vec::new()).with_options(WriteOptions::base64());
        writer.write(&Value::Bytes(Vec::new())).unwrap();
        assert_eq!(writer.into_inner(), b"*");
    }

    fn write_err(value: &Value) -> Error {
        Writer::new(Vec::new()).write(value).unwrap_err()
    }

    #[test]
    fn test_offset_with_seconds_is_rejected() {
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let odd = FixedOffset::east_opt(3659).unwrap();
        let err = write_err(&Value::from(OffsetTime::new(noon, odd)));
        assert!(matches!(err, Error::Write(_)));
        assert!(err.to_string().contains("offset has a seconds part"));
    }

    #[test]
    fn test_offset_out_of_range_is_rejected() {
        let local = NaiveDate::from_ymd_opt(2019, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let far = FixedOffset::east_opt(15 * 3600).unwrap();
        let odt = far.from_local_datetime(&local).unwrap();
        let err = write_err(&Value::from(odt));
        assert!(err.to_string().starts_with("Writer Error"));
        assert!(err.to_string().contains("offset outside -12:00..+14:00"));
    }

    #[test]
    fn test_year_out_of_range_is_rejected() {
        let date = NaiveDate::from_ymd_opt(10000, 1, 1).unwrap();
        let err = write_err(&Value::from(date));
        assert!(err.to_string().contains("year outside 0000..9999"));

        let mut writer = Writer::new(Vec::new());
        let err = writer.write_as(&Temporal::Date(date)).unwrap_err();
        assert!(matches!(err, Error::Write(_)));
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn test_boundary_offsets_are_written() {
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let east = OffsetTime::new(noon, FixedOffset::east_opt(14 * 3600).unwrap());
        let west = OffsetTime::new(noon, FixedOffset::west_opt(12 * 3600).unwrap());
        assert_eq!(write(&Value::from(east)), "@12:00:00+14:00");
        assert_eq!(write(&Value::from(west)), "@12:00:00-12:00");
    }

    #[test]
    fn test_unregistered_object() {
        let err = write_err(&Value::Object(Object::new("Nowhere")));
        assert!(err
            .to_string()
            .contains("No object type registered for class Nowhere"));
    }

    #[derive(Serialize)]
    struct Reading {
        level: f64,
        tag: Option<char>,
    }

    #[derive(Serialize)]
    enum Event {
        Idle,
        Moved(i32, i32),
        Named { label: &'static str },
    }

    #[test]
    fn test_value_serializer_shapes() {
        let value = Reading {
            level: 0.5,
            tag: None,
        }
        .serialize(ValueSerializer)
        .unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.name(), "Reading");
        assert_eq!(object.get("level").unwrap().as_decimal().unwrap().to_string(), "0.5");
        assert_eq!(object.get("tag"), Some(&Value::Null));

        assert_eq!(write(&Event::Idle.serialize(ValueSerializer).unwrap()), r#""Idle""#);
        assert_eq!(
            write(&Event::Moved(1, -2).serialize(ValueSerializer).unwrap()),
            r#"{"Moved"=[1,-2]}"#
        );
        assert_eq!(
            write(&Event::Named { label: "x" }.serialize(ValueSerializer).unwrap()),
            r#"{"Named"={"label"="x"}}"#
        );
    }

    #[test]
    fn test_non_finite_float() {
        let err = f64::INFINITY.serialize(ValueSerializer).unwrap_err();
        assert!(err.to_string().contains("cannot be written as a decimal number"));
    }

    #[test]
    fn test_sink_failure() {
        let mut writer = Writer::new(FailingSink);
        let err = writer.write(&Value::Null).unwrap_err();
        assert!(err.to_string().contains("unable to write"));
    }
}
