//! # sigma
//!
//! A reader and writer for Sigma, a compact, human-readable and strongly
//! typed text interchange format.
//!
//! ## What is Sigma?
//!
//! Sigma is a JSON superset that tags what JSON leaves ambiguous. It has
//! explicit constants for null and booleans and exact decimal numbers. Binary
//! blobs can be raw or base64, and there are six flavors of date and time
//! with IANA zone support. Named objects bind to registered Rust types.
//!
//! ## Key Features
//!
//! - **Exact Numbers**: numbers are `rust_decimal::Decimal`s, read and written
//!   without rounding
//! - **Any Map Key**: maps are keyed by arbitrary values, in insertion order
//! - **Serde Integration**: [`Value`] is a serde `Deserializer` that narrows a
//!   parsed value into any `Deserialize` type, failing instead of losing
//!   information
//! - **Named Objects**: `point{x=1,y=2}` binds to a struct deriving
//!   `Serialize` and `Deserialize` through a [`TypeRegistry`]
//! - **Streaming I/O**: reads from any `std::io::Read`, writes to any
//!   `std::io::Write`
//!
//! ## Quick Start
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sigma = "0.1"
//! ```
//!
//! ### Reading and Writing Values
//!
//! ```rust
//! use sigma::{from_str, to_string, Value};
//!
//! let value: Value = from_str(r#"{"a"=6, "b"=&f , "c"=@2019-01-01}"#).unwrap();
//! assert_eq!(to_string(&value).unwrap(), r#"{"a"=6,"b"=&f,"c"=@2019-01-01}"#);
//! ```
//!
//! ### Narrowing Into Rust Types
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use sigma::from_str;
//!
//! let scores: BTreeMap<String, i32> = from_str(r#"{"b"=2,"a"=1}"#).unwrap();
//! assert_eq!(scores.keys().collect::<Vec<_>>(), vec!["a", "b"]);
//!
//! let err = from_str::<Vec<i32>>("[1, 2.5]").unwrap_err();
//! assert!(err.to_string().contains("unable to coerce"));
//! ```
//!
//! ### Named Objects
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use sigma::{from_str, register, to_string};
//!
//! #[derive(Serialize, Deserialize, Default)]
//! struct Sensor {
//!     id: i32,
//!     label: String,
//!     reading: Option<f64>,
//! }
//!
//! register::<Sensor>("sensor").unwrap();
//!
//! let sensor: Sensor = from_str(r#"sensor{id=7, label="hall"}"#).unwrap();
//! assert_eq!(sensor.id, 7);
//! assert_eq!(to_string(&sensor).unwrap(), r#"sensor{id=7,label="hall",reading=&n}"#);
//! ```
//!
//! ### Dynamic Values with value! Macro
//!
//! ```rust
//! use sigma::{value, Value};
//!
//! let data = value!({
//!     "name" => "Alice",
//!     "tags" => ["rust", "sigma"]
//! });
//!
//! if let Value::Map(map) = data {
//!     assert_eq!(map.get(&Value::from("name")).and_then(|v| v.as_str()), Some("Alice"));
//! }
//! ```
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Proper error propagation with `Result` types
//! - Every error is fatal to the call that raised it; no partial values
//!
//! ## Format Reference
//!
//! See the [`grammar`] module for the complete wire format.
//!
//! ## Examples
//!
//! See the `demos/` directory:
//!
//! - **`simple.rs`** - Reading, writing and narrowing values
//! - **`named_objects.rs`** - Registering record types and field adapters
//!
//! Run any of them with: `cargo run --example <name>`

pub mod coerce;
pub mod de;
pub mod error;
pub mod grammar;
pub mod macros;
pub mod map;
pub mod options;
pub mod record;
pub mod registry;
pub mod ser;
pub mod temporal;
pub mod utf8;
pub mod value;
pub mod with;

pub use coerce::coerce;
pub use de::Reader;
pub use error::{Error, Result};
pub use map::Map;
pub use options::{BinaryEncoding, WriteOptions};
pub use record::Object;
pub use registry::{register, unregister_all, RecordType, TypeRegistry};
pub use ser::{ValueSerializer, Writer};
pub use temporal::{OffsetTime, Temporal, TemporalKind, Tzdb, ZoneProvider, ZonedDateTime};
pub use value::{Bytes, Value};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;

/// Write any `T: Serialize` as a Sigma string.
///
/// # Examples
///
/// ```rust
/// use sigma::to_string;
///
/// assert_eq!(to_string(&vec![1, 2, 3]).unwrap(), "[1,2,3]");
/// assert_eq!(to_string("a\"b").unwrap(), r#""a\"b""#);
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be written or if the output is not
/// valid UTF-8 (raw binary blobs may hold arbitrary bytes; use [`to_vec`] or
/// base64 output for those).
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, WriteOptions::default())
}

/// Write any `T: Serialize` as a Sigma string with custom options.
///
/// # Examples
///
/// ```rust
/// use sigma::{to_string_with_options, Bytes, WriteOptions};
///
/// let bytes = Bytes::from(b"The quick brown fox".to_vec());
/// let text = to_string_with_options(&bytes, WriteOptions::base64()).unwrap();
/// assert_eq!(text, "*VGhlIHF1aWNrIGJyb3duIGZveA");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be written or the output is not UTF-8.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T>(value: &T, options: WriteOptions) -> Result<String>
where
    T: ?Sized + Serialize,
{
    let bytes = to_vec_with_options(value, options)?;
    String::from_utf8(bytes)
        .map_err(|e| Error::write(format!("output is not valid UTF-8: {}", e)))
}

/// Write any `T: Serialize` as Sigma bytes.
///
/// # Errors
///
/// Returns an error if the value cannot be written.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    to_vec_with_options(value, WriteOptions::default())
}

/// Write any `T: Serialize` as Sigma bytes with custom options.
///
/// # Examples
///
/// ```rust
/// use sigma::{to_vec_with_options, Bytes, WriteOptions};
///
/// let raw = to_vec_with_options(&Bytes::from(vec![0xFF]), WriteOptions::new()).unwrap();
/// assert_eq!(raw, b"|1|\xFF");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be written.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_vec_with_options<T>(value: &T, options: WriteOptions) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    let mut writer = Writer::new(Vec::with_capacity(128)).with_options(options);
    writer.write_as(value)?;
    Ok(writer.into_inner())
}

/// Convert any `T: Serialize` to a [`Value`].
///
/// # Examples
///
/// ```rust
/// use sigma::{to_value, Value};
///
/// let value = to_value(&vec!["a", "b"]).unwrap();
/// assert!(value.is_list());
/// assert!(to_value(&f64::NAN).is_err());
/// ```
///
/// # Errors
///
/// Returns an error if the value has no Sigma representation.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}

/// Narrow a [`Value`] into `T`.
///
/// # Examples
///
/// ```rust
/// use sigma::{from_value, value};
///
/// let pair: (String, u8) = from_value(value!(["a", 7])).unwrap();
/// assert_eq!(pair, ("a".to_string(), 7));
/// assert!(from_value::<u8>(value!(256)).is_err());
/// ```
///
/// # Errors
///
/// Returns an error containing "unable to coerce" if no lossless conversion
/// exists.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(value)
}

/// Write any `T: Serialize` to an I/O sink in Sigma format.
///
/// # Examples
///
/// ```rust
/// use sigma::to_writer;
///
/// let mut buffer = Vec::new();
/// to_writer(&mut buffer, &true).unwrap();
/// assert_eq!(buffer, b"&t");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be written or the sink fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    to_writer_with_options(writer, value, WriteOptions::default())
}

/// Write any `T: Serialize` to an I/O sink in Sigma format with custom options.
///
/// # Errors
///
/// Returns an error if the value cannot be written or the sink fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W, T>(writer: W, value: &T, options: WriteOptions) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let mut writer = Writer::new(writer).with_options(options);
    writer.write_as(value)?;
    writer.flush()
}

/// Read an instance of type `T` from a string of Sigma text.
///
/// # Examples
///
/// ```rust
/// use sigma::from_str;
///
/// let numbers: Vec<i64> = from_str("[1, 2 ,3]").unwrap();
/// assert_eq!(numbers, vec![1, 2, 3]);
///
/// let nothing: Option<i32> = from_str("   ").unwrap();
/// assert_eq!(nothing, None);
/// ```
///
/// # Errors
///
/// Returns an error if the input is not valid Sigma or cannot be narrowed into
/// `T`. Reader errors carry the byte position of the problem.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_slice(s.as_bytes())
}

/// Read an instance of type `T` from bytes of Sigma text.
///
/// # Examples
///
/// ```rust
/// use sigma::{from_slice, Bytes};
///
/// let bytes: Bytes = from_slice(b"|2|\x00\xFF").unwrap();
/// assert_eq!(bytes.into_inner(), vec![0x00, 0xFF]);
/// ```
///
/// # Errors
///
/// Returns an error if the bytes are not valid Sigma or cannot be narrowed
/// into `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(v: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    from_reader(v)
}

/// Read an instance of type `T` from an I/O stream of Sigma text.
///
/// The stream is read one byte at a time; wrap unbuffered sources in a
/// [`std::io::BufReader`].
///
/// # Examples
///
/// ```rust
/// use sigma::from_reader;
/// use std::io::Cursor;
///
/// let flag: bool = from_reader(Cursor::new(b" &t ")).unwrap();
/// assert!(flag);
/// ```
///
/// # Errors
///
/// Returns an error if reading from the stream fails, the input is not valid
/// Sigma, or the value cannot be narrowed into `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let value = Reader::new(reader).read()?;
    T::deserialize(value)
}
