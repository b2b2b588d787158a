//! Sigma Format Reference
//!
//! This module documents the Sigma text format as implemented by this library.
//!
//! # Overview
//!
//! Sigma is a JSON superset with explicit tags for the values JSON leaves
//! ambiguous: constants, exact decimals, binary blobs, dates and times, and
//! named objects bound to registered Rust types. Text is UTF-8 throughout,
//! except for the payload of raw binary blobs.
//!
//! # Values
//!
//! | Form | Syntax | Example |
//! |------|--------|---------|
//! | Null, true, false | `&n` `&t` `&f` | `&t` |
//! | String | `"..."` | `"tab\there"` |
//! | Number | `[+-]?digits[.digits]?([eE][+-]?digits)?` | `-1.23e-16` |
//! | Raw binary | `\|len\|bytes` | `\|3\|abc` |
//! | Base64 binary | `*` unpadded base64 | `*AQID` |
//! | Date | `@YYYY-MM-DD` | `@2019-01-01` |
//! | Time | `@HH:MM:SS[.fffffffff]` | `@12:31:47.7654` |
//! | Offset time | time followed by `Z` or `±HH:MM` | `@12:31:47-11:00` |
//! | Date-time | `@YYYY-MM-DDTHH:MM:SS[.fff]` | `@2019-01-01T12:31:47` |
//! | Offset date-time | date-time followed by `Z` or `±HH:MM` | `@2019-01-01T12:31:47Z` |
//! | Zoned date-time | offset date-time followed by `[ZoneId]` | `@2019-01-01T12:31:47+11:00[Australia/Hobart]` |
//! | List | `[v,v,...]` | `[1,"a",&n]` |
//! | Map | `{k=v,...}` | `{1=2,"3"=4}` |
//! | Named object | `identifier{name=v,...}` | `point{x=1,y=2}` |
//!
//! ## Whitespace And Separators
//!
//! Space, tab, LF and CR may appear around every token. An unquoted token
//! (object identifiers, field names, numbers, base64 payloads, zone ids) ends
//! at whitespace, at one of `= , { } [ ]`, or at end of input.
//!
//! An empty or whitespace-only document reads as null. Anything but
//! whitespace after the top-level value is an error.
//!
//! ## Strings
//!
//! The escapes `\"`, `\\`, `\n`, `\r`, `\t` and `\uXXXX` (exactly four hex
//! digits) are recognized. A backslash before any other character yields that
//! character. The writer escapes `"`, `\`, LF, CR and tab with the two
//! character forms and every other codepoint below U+0020 as `\u00XX` with
//! uppercase hex; everything else is written as raw UTF-8.
//!
//! ## Numbers
//!
//! Numbers are exact decimals. No distinction between integers and fractions
//! is made when reading; [`from_value`](crate::from_value) decides later
//! whether a value fits the requested type. A literal that cannot be held
//! exactly (more than 28 fractional digits or a significand beyond 96 bits)
//! is rejected rather than rounded:
//!
//! ```rust
//! use sigma::{from_str, to_string, Value};
//!
//! let v: Value = from_str("-1.23e-16").unwrap();
//! assert_eq!(to_string(&v).unwrap(), "-0.000000000000000123");
//!
//! let err = from_str::<Value>("+1.23E+234").unwrap_err();
//! assert!(err.to_string().contains("invalid number"));
//! ```
//!
//! ## Binary
//!
//! `|len|` is followed by exactly `len` bytes copied verbatim; they are not
//! UTF-8 decoded and may contain any byte, including separators. `*` is
//! followed by standard base64 without padding; `*` alone is an empty blob.
//!
//! ## Dates And Times
//!
//! Fractions of a second carry at most nine digits. Offsets lie in
//! `[-12:00, +14:00]`; the minute part takes the sign of the hour part, so
//! `-01:30` is ninety minutes behind UTC. A zone id must name a zone known to
//! the [`ZoneProvider`](crate::ZoneProvider) and that zone must actually use
//! the written offset at that local time.
//!
//! The writer trims trailing zeros from the fraction and omits it entirely
//! when it is zero; a zero offset is written as `Z`.
//!
//! ## Named Objects
//!
//! The identifier must be registered with the [`TypeRegistry`](crate::TypeRegistry)
//! in use. Fields may appear in any order and may be omitted; omitted fields
//! keep their `Default` value. The writer emits every field in declared
//! order.
//!
//! # Errors
//!
//! Reader errors have the form `Reader Error [<byte position>]: <message>`.
//! The message contains one of these fragments:
//!
//! | Fragment | Cause |
//! |----------|-------|
//! | `invalid constant` | `&` not followed by `n`, `t` or `f` |
//! | `invalid number` | malformed or unrepresentable number |
//! | `digit expected` | non-digit inside a temporal literal or binary length |
//! | `invalid fraction of a second` | more than nine fractional digits |
//! | `invalid time or date` | a component out of range, or a zone on a literal without both date and time |
//! | `invalid time zone` | unknown zone id, or an offset the zone never uses |
//! | `end of input expected` | trailing content after the value |
//! | `is not registered` | unknown object identifier |
//! | `unable to find property` | field name the record does not have |
//! | `unable to set property` | field value that cannot be coerced |
//! | `unable to create instance` | wraps either of the two above |
//!
//! The writer reports `No object type registered for class` for records
//! whose type is not registered and `unable to write temporal value` for
//! dates and times the wire form cannot carry exactly (years outside
//! 0000..9999, leap seconds, offsets with a seconds part or outside
//! -12:00..+14:00). Coercion reports `unable to coerce`.
