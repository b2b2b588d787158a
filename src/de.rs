//! Sigma reading.
//!
//! This module provides the [`Reader`] that parses Sigma text from any
//! [`std::io::Read`] source into a [`Value`].
//!
//! ## Overview
//!
//! - **Single-pass parsing**: one codepoint of lookahead, no backtracking
//! - **Byte positions**: every error carries the byte offset where it was
//!   detected
//! - **Raw binary**: `|len|` blobs are pulled straight from the byte source,
//!   bypassing UTF-8 decoding
//!
//! ## Usage
//!
//! Most users should use the high-level functions in the crate root:
//!
//! ```rust
//! use sigma::{from_str, Value};
//!
//! let value: Value = from_str(r#"[1, "two", &t]"#).unwrap();
//! assert_eq!(value.as_list().map(Vec::len), Some(3));
//! ```
//!
//! A `Reader` can be pointed at a private [`TypeRegistry`] or a custom
//! [`ZoneProvider`]:
//!
//! ```rust
//! use sigma::{Reader, TypeRegistry, Value};
//!
//! let registry = TypeRegistry::new();
//! let mut reader = Reader::new("&n".as_bytes()).with_registry(&registry);
//! assert_eq!(reader.read().unwrap(), Value::Null);
//! ```

use crate::registry::TypeRegistry;
use crate::temporal::{AssemblyError, Parts, Temporal, Tzdb, ZoneProvider};
use crate::{utf8, Error, Map, Object, Result, Value};
use base64::Engine as _;
use rust_decimal::Decimal;
use std::io::{ErrorKind, Read};
use tracing::trace;

static TZDB: Tzdb = Tzdb;

/// Maximum exponent shift that can still produce a representable decimal.
const MAX_SCALE: u32 = 28;

/// The Sigma reader.
///
/// Holds the byte source, the current lookahead codepoint and the byte
/// position. A reader parses one document; create a new one per input.
pub struct Reader<'a, R: Read> {
    input: R,
    c: Option<char>,
    pos: u64,
    registry: &'a TypeRegistry,
    zones: &'a dyn ZoneProvider,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TemporalState {
    DateOrHour,
    Time,
    Offset,
    Assemble,
}

fn is_ws(c: Option<char>) -> bool {
    matches!(c, Some(' ' | '\t' | '\n' | '\r'))
}

fn is_separator(c: Option<char>) -> bool {
    matches!(c, None | Some('=' | ',' | '{' | '}' | '[' | ']'))
}

fn describe(c: Option<char>) -> String {
    match c {
        Some(ch) if ch.is_control() => format!("U+{:04X}", ch as u32),
        Some(ch) => format!("'{}'", ch),
        None => "end of input".to_string(),
    }
}

impl<'a, R: Read> Reader<'a, R> {
    /// Creates a reader over `input` using the global type registry and the
    /// bundled time-zone database.
    ///
    /// For file or socket input wrap the source in a [`std::io::BufReader`];
    /// the reader pulls one byte at a time.
    pub fn new(input: R) -> Self {
        Reader {
            input,
            c: None,
            pos: 0,
            registry: TypeRegistry::global(),
            zones: &TZDB,
        }
    }

    /// Resolves named objects against `registry`.
    #[must_use]
    pub fn with_registry(mut self, registry: &'a TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Resolves zone identifiers through `zones`.
    #[must_use]
    pub fn with_zone_provider(mut self, zones: &'a dyn ZoneProvider) -> Self {
        self.zones = zones;
        self
    }

    /// Reads one complete document.
    ///
    /// Empty or whitespace-only input yields [`Value::Null`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] for malformed input, including trailing content
    /// after the value ("end of input expected"), and [`Error::Io`] when the
    /// byte source fails.
    pub fn read(&mut self) -> Result<Value> {
        self.next_char()?;
        self.skip_ws()?;
        if self.c.is_none() {
            return Ok(Value::Null);
        }
        let value = self.read_value()?;
        self.skip_ws()?;
        if self.c.is_some() {
            return Err(self.error("end of input expected"));
        }
        Ok(value)
    }

    fn error<M: Into<String>>(&self, message: M) -> Error {
        let err = Error::read(self.pos, message);
        trace!(position = self.pos, error = %err, "read failed");
        err
    }

    fn error_with_cause<M: Into<String>>(&self, message: M, cause: Error) -> Error {
        let err = Error::read_with_cause(self.pos, message, cause);
        trace!(position = self.pos, error = %err, "read failed");
        err
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.input.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.pos += 1;
                    return Ok(Some(buf[0]));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::io(self.pos, &e)),
            }
        }
    }

    /// Decodes the next codepoint into the lookahead.
    fn next_char(&mut self) -> Result<()> {
        let first = match self.read_byte()? {
            Some(b) => b,
            None => {
                self.c = None;
                return Ok(());
            }
        };
        let mut failure = None;
        let decoded = utf8::decode(first, || match self.read_byte() {
            Ok(b) => b,
            Err(e) => {
                failure = Some(e);
                None
            }
        });
        if let Some(e) = failure {
            return Err(e);
        }
        let codepoint = match decoded {
            Ok(cp) => cp,
            Err(utf8::DecodeError::IllegalLeadingByte(b)) => {
                return Err(self.error(format!("illegal UTF-8 leading byte {:#04X}", b)))
            }
            Err(utf8::DecodeError::Truncated) => {
                return Err(self.error("unexpected end of input in UTF-8 sequence"))
            }
        };
        self.c = Some(self.scalar(codepoint)?);
        Ok(())
    }

    fn scalar(&self, codepoint: u32) -> Result<char> {
        char::from_u32(codepoint)
            .ok_or_else(|| self.error(format!("invalid code point U+{:04X}", codepoint)))
    }

    fn is(&self, ch: char) -> bool {
        self.c == Some(ch)
    }

    fn is_digit(&self) -> bool {
        matches!(self.c, Some('0'..='9'))
    }

    fn skip_ws(&mut self) -> Result<()> {
        while is_ws(self.c) {
            self.next_char()?;
        }
        Ok(())
    }

    fn consume(&mut self, ch: char) -> Result<bool> {
        if self.is(ch) {
            self.next_char()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, ch: char) -> Result<()> {
        if self.consume(ch)? {
            Ok(())
        } else {
            Err(self.error(format!("'{}' expected but {} found", ch, describe(self.c))))
        }
    }

    fn consume_digit(&mut self) -> Result<u32> {
        match self.c.and_then(|ch| ch.to_digit(10)) {
            Some(d) => {
                self.next_char()?;
                Ok(d)
            }
            None => Err(self.error(format!("digit expected but {} found", describe(self.c)))),
        }
    }

    fn two_digits(&mut self) -> Result<u32> {
        let tens = self.consume_digit()?;
        Ok(tens * 10 + self.consume_digit()?)
    }

    fn read_hex_digit(&mut self) -> Result<u32> {
        match self.c.and_then(|ch| ch.to_digit(16)) {
            Some(d) => {
                self.next_char()?;
                Ok(d)
            }
            None => Err(self.error(format!("invalid hex digit {}", describe(self.c)))),
        }
    }

    fn read_value(&mut self) -> Result<Value> {
        match self.c {
            Some('"') => self.read_string().map(Value::String),
            Some('[') => self.read_list(),
            Some('{') => self.read_map(),
            Some('+' | '-' | '0'..='9') => self.read_number().map(Value::Number),
            Some('@') => self.read_temporal().map(Value::Temporal),
            Some('|') => self.read_raw_binary().map(Value::Bytes),
            Some('*') => self.read_base64().map(Value::Bytes),
            Some('&') => self.read_constant(),
            Some(_) => self.read_object(),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn read_constant(&mut self) -> Result<Value> {
        self.next_char()?; // skip '&'
        let value = match self.c {
            Some('n') => Value::Null,
            Some('t') => Value::Bool(true),
            Some('f') => Value::Bool(false),
            _ => return Err(self.error("invalid constant value")),
        };
        self.next_char()?;
        Ok(value)
    }

    /// Accumulates codepoints up to a separator or whitespace.
    fn read_token(&mut self) -> Result<String> {
        let mut token = String::new();
        while !is_separator(self.c) && !is_ws(self.c) {
            if let Some(ch) = self.c {
                token.push(ch);
            }
            self.next_char()?;
        }
        Ok(token)
    }

    fn read_string(&mut self) -> Result<String> {
        self.next_char()?; // skip '"'
        let mut s = String::new();
        loop {
            match self.c {
                None => return Err(self.error("unexpected end of input in string")),
                Some('"') => {
                    self.next_char()?;
                    return Ok(s);
                }
                Some('\\') => {
                    self.next_char()?;
                    let escaped = match self.c {
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('u') => {
                            self.next_char()?;
                            let mut codepoint = 0;
                            for _ in 0..4 {
                                codepoint = (codepoint << 4) | self.read_hex_digit()?;
                            }
                            s.push(self.scalar(codepoint)?);
                            continue;
                        }
                        Some(other) => other,
                        None => return Err(self.error("unexpected end of input in string")),
                    };
                    s.push(escaped);
                    self.next_char()?;
                }
                Some(ch) => {
                    s.push(ch);
                    self.next_char()?;
                }
            }
        }
    }

    fn read_number(&mut self) -> Result<Decimal> {
        let token = self.read_token()?;
        parse_decimal(&token).ok_or_else(|| self.error(format!("invalid number '{}'", token)))
    }

    /// `|len|` followed by `len` bytes taken verbatim from the source.
    fn read_raw_binary(&mut self) -> Result<Vec<u8>> {
        self.next_char()?; // skip '|'
        let mut len: u64 = 0;
        while !self.is('|') {
            let digit = self.consume_digit()?;
            len = len
                .checked_mul(10)
                .and_then(|l| l.checked_add(u64::from(digit)))
                .ok_or_else(|| self.error("binary length out of range"))?;
        }
        // The closing '|' is the lookahead, so the source now sits on the
        // first payload byte.
        let mut bytes = Vec::new();
        let read = (&mut self.input)
            .take(len)
            .read_to_end(&mut bytes)
            .map_err(|e| Error::io(self.pos, &e))?;
        self.pos += read as u64;
        if (read as u64) < len {
            return Err(self.error("unexpected end of input in binary data"));
        }
        self.next_char()?;
        Ok(bytes)
    }

    fn read_base64(&mut self) -> Result<Vec<u8>> {
        self.next_char()?; // skip '*'
        let mut token = self.read_token()?;
        let padding = (4 - token.len() % 4) % 4;
        token.extend(std::iter::repeat('=').take(padding));
        base64::engine::general_purpose::STANDARD
            .decode(token.as_bytes())
            .map_err(|e| self.error(format!("invalid base64 data: {}", e)))
    }

    fn read_list(&mut self) -> Result<Value> {
        self.next_char()?; // skip '['
        let mut items = Vec::new();
        self.skip_ws()?;
        if self.consume(']')? {
            return Ok(Value::List(items));
        }
        loop {
            self.skip_ws()?;
            items.push(self.read_value()?);
            self.skip_ws()?;
            if !self.consume(',')? {
                break;
            }
        }
        self.expect(']')?;
        Ok(Value::List(items))
    }

    fn read_map(&mut self) -> Result<Value> {
        self.next_char()?; // skip '{'
        let mut map = Map::new();
        self.skip_ws()?;
        if self.consume('}')? {
            return Ok(Value::Map(map));
        }
        loop {
            self.skip_ws()?;
            let key = self.read_value()?;
            self.skip_ws()?;
            self.expect('=')?;
            self.skip_ws()?;
            let value = self.read_value()?;
            self.skip_ws()?;
            map.insert(key, value);
            if !self.consume(',')? {
                break;
            }
        }
        self.expect('}')?;
        Ok(Value::Map(map))
    }

    fn read_object(&mut self) -> Result<Value> {
        let identifier = self.read_token()?;
        self.skip_ws()?;
        self.expect('{')?;
        let ty = self
            .registry
            .lookup_type(&identifier)
            .ok_or_else(|| self.error(format!("type '{}' is not registered", identifier)))?;
        let built = ty
            .instantiate()
            .and_then(|object| self.read_object_fields(object))
            .and_then(|object| ty.bind(object));
        match built {
            Ok(object) => Ok(Value::Object(object)),
            Err(cause) => Err(self.error_with_cause(
                format!(
                    "unable to create instance of type '{}': {}",
                    identifier,
                    cause.message()
                ),
                cause,
            )),
        }
    }

    fn read_object_fields(&mut self, mut object: Object) -> Result<Object> {
        self.skip_ws()?;
        if self.consume('}')? {
            return Ok(object);
        }
        loop {
            self.read_object_field(&mut object)?;
            if !self.consume(',')? {
                break;
            }
        }
        self.expect('}')?;
        Ok(object)
    }

    fn read_object_field(&mut self, object: &mut Object) -> Result<()> {
        self.skip_ws()?;
        let name = self.read_token()?;
        self.skip_ws()?;
        self.expect('=')?;
        self.skip_ws()?;
        let value = self.read_value()?;
        self.skip_ws()?;
        if object.set(&name, value) {
            Ok(())
        } else {
            Err(self.error(format!(
                "unable to find property {}.{}",
                object.name(),
                name
            )))
        }
    }

    fn read_fraction(&mut self) -> Result<u32> {
        let mut multiplier = 100_000_000;
        let mut nanos = self.consume_digit()? * multiplier;
        while self.is_digit() {
            multiplier /= 10;
            if multiplier == 0 {
                return Err(self.error("invalid fraction of a second"));
            }
            nanos += self.consume_digit()? * multiplier;
        }
        Ok(nanos)
    }

    fn read_temporal(&mut self) -> Result<Temporal> {
        self.next_char()?; // skip '@'
        let mut parts = Parts::default();
        let mut state = TemporalState::DateOrHour;
        loop {
            state = match state {
                TemporalState::DateOrHour => {
                    let lead = self.two_digits()?;
                    if self.consume(':')? {
                        parts.has_time = true;
                        parts.hour = lead;
                        TemporalState::Time
                    } else {
                        parts.has_date = true;
                        parts.year = (lead * 100 + self.two_digits()?) as i32;
                        self.expect('-')?;
                        parts.month = self.two_digits()?;
                        self.expect('-')?;
                        parts.day = self.two_digits()?;
                        if self.consume('T')? {
                            parts.has_time = true;
                            parts.hour = self.two_digits()?;
                            self.expect(':')?;
                            TemporalState::Time
                        } else {
                            TemporalState::Assemble
                        }
                    }
                }
                TemporalState::Time => {
                    parts.minute = self.two_digits()?;
                    self.expect(':')?;
                    parts.second = self.two_digits()?;
                    if self.consume('.')? {
                        parts.nanos = self.read_fraction()?;
                    }
                    if matches!(self.c, Some('+' | '-' | 'Z')) {
                        TemporalState::Offset
                    } else {
                        TemporalState::Assemble
                    }
                }
                TemporalState::Offset => {
                    parts.has_offset = true;
                    if !self.consume('Z')? {
                        parts.offset_negative = self.is('-');
                        self.next_char()?;
                        parts.offset_hour = self.two_digits()? as i32;
                        self.expect(':')?;
                        parts.offset_minute = self.two_digits()? as i32;
                    }
                    if self.consume('[')? {
                        parts.zone = Some(self.read_token()?);
                        self.expect(']')?;
                    }
                    TemporalState::Assemble
                }
                TemporalState::Assemble => {
                    return parts.assemble(self.zones).map_err(|e| match e {
                        AssemblyError::OutOfRange => self.error("invalid time or date"),
                        AssemblyError::UnknownZone(zone) => {
                            self.error(format!("invalid time zone '{}'", zone))
                        }
                        AssemblyError::OffsetNotInZone(zone) => {
                            self.error(format!("invalid time zone offset for '{}'", zone))
                        }
                    });
                }
            };
        }
    }
}

fn is_sign(c: char) -> bool {
    c == '+' || c == '-'
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parses `[+-]?digits[.digits]?([eE][+-]?digits)?` exactly. Values that do
/// not fit the decimal's 28-digit scale or 96-bit significand are rejected.
fn parse_decimal(text: &str) -> Option<Decimal> {
    let (mantissa, exponent) = match text.find(|c| c == 'e' || c == 'E') {
        Some(at) => (&text[..at], Some(&text[at + 1..])),
        None => (text, None),
    };
    let unsigned = mantissa.strip_prefix(is_sign).unwrap_or(mantissa);
    let well_formed = match unsigned.split_once('.') {
        Some((int, frac)) => all_digits(int) && all_digits(frac),
        None => all_digits(unsigned),
    };
    if !well_formed {
        return None;
    }
    let mut value = Decimal::from_str_exact(mantissa.strip_prefix('+').unwrap_or(mantissa)).ok()?;

    let exponent = match exponent {
        Some(e) => {
            let digits = e.strip_prefix(is_sign).unwrap_or(e);
            if !all_digits(digits) {
                return None;
            }
            e.parse::<i64>().ok()?
        }
        None => return Some(value),
    };
    if value.is_zero() {
        return Some(value);
    }
    let mut shifted = i64::from(value.scale()).checked_sub(exponent)?;
    if shifted > i64::from(MAX_SCALE) {
        value = value.normalize();
        shifted = i64::from(value.scale()).checked_sub(exponent)?;
        while shifted > i64::from(MAX_SCALE)
            && value.scale() == 0
            && (value % Decimal::TEN).is_zero()
        {
            value = value.checked_div(Decimal::TEN)?.normalize();
            shifted -= 1;
        }
    }
    if shifted >= 0 {
        let shifted = u32::try_from(shifted).ok().filter(|s| *s <= MAX_SCALE)?;
        value.set_scale(shifted).ok()?;
    } else {
        let mut remaining = u32::try_from(-shifted).ok().filter(|s| *s <= MAX_SCALE + 1)?;
        value.set_scale(0).ok()?;
        while remaining > 0 {
            value = value.checked_mul(Decimal::TEN)?;
            remaining -= 1;
        }
    }
    Some(value)
}

/// Parses temporal wire text given without its leading `@`.
pub(crate) fn parse_temporal(text: &str) -> Result<Temporal> {
    let input = (&b"@"[..]).chain(text.as_bytes());
    match Reader::new(input).read()? {
        Value::Temporal(t) => Ok(t),
        other => Err(Error::coerce(other.kind(), "temporal")),
    }
}
