//! Error types for Sigma reading, writing and coercion.
//!
//! Every failure in this crate is fatal to the call that raised it: a read
//! either yields a complete [`Value`](crate::Value) or an [`Error`], never a
//! partial result.
//!
//! ## Error Categories
//!
//! - **Read errors**: malformed input, carrying the byte position at which the
//!   problem was detected
//! - **Write errors**: values that cannot be expressed in the format (for
//!   example a record whose type was never registered)
//! - **Coercion errors**: a parsed value that cannot be narrowed losslessly
//!   into the requested Rust type
//! - **I/O errors**: failures of the underlying byte source or sink
//!
//! Messages contain stable fragments (`"invalid number"`, `"unable to coerce"`,
//! `"is not registered"`, ...) that callers may match on.
//!
//! ## Examples
//!
//! ```rust
//! use sigma::{from_str, Error, Value};
//!
//! let result: Result<Value, Error> = from_str("&x");
//! let err = result.unwrap_err();
//! assert!(err.to_string().contains("invalid constant"));
//! assert_eq!(err.position(), Some(2));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur while reading, writing or
/// coercing Sigma values.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Malformed input detected by the reader.
    #[error("Reader Error [{position}]: {message}")]
    Read {
        position: u64,
        message: String,
        #[source]
        cause: Option<Box<Error>>,
    },

    /// A value that the writer cannot express.
    #[error("Writer Error: {0}")]
    Write(String),

    /// A value that cannot be narrowed into the requested type.
    #[error("unable to coerce {found} to {target}")]
    Coerce { found: String, target: String },

    /// A named-object field whose value the record type rejected.
    #[error("unable to set property {record}.{field}: {cause}")]
    Property {
        record: String,
        field: String,
        #[source]
        cause: Box<Error>,
    },

    /// Failure of the underlying byte source or sink.
    #[error("IO error at byte {position}: {message}")]
    Io { position: u64, message: String },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a read error at the given byte position.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sigma::Error;
    ///
    /// let err = Error::read(10, "digit expected");
    /// assert_eq!(err.to_string(), "Reader Error [10]: digit expected");
    /// ```
    pub fn read<M: Into<String>>(position: u64, message: M) -> Self {
        Error::Read {
            position,
            message: message.into(),
            cause: None,
        }
    }

    /// Creates a read error that wraps the error which caused it.
    pub fn read_with_cause<M: Into<String>>(position: u64, message: M, cause: Error) -> Self {
        Error::Read {
            position,
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Creates a write error.
    pub fn write<M: Into<String>>(message: M) -> Self {
        Error::Write(message.into())
    }

    /// Creates a coercion error naming the kind of value found and the target type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sigma::Error;
    ///
    /// let err = Error::coerce("number", "alloc::string::String");
    /// assert!(err.to_string().contains("unable to coerce number"));
    /// ```
    pub fn coerce(found: &str, target: &str) -> Self {
        Error::Coerce {
            found: found.to_string(),
            target: target.to_string(),
        }
    }

    /// Wraps the error raised while assigning `record.field`.
    pub fn property(record: &str, field: &str, cause: Error) -> Self {
        Error::Property {
            record: record.to_string(),
            field: field.to_string(),
            cause: Box::new(cause),
        }
    }

    /// Creates an I/O error at the given byte position.
    pub fn io(position: u64, err: &std::io::Error) -> Self {
        Error::Io {
            position,
            message: err.to_string(),
        }
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// The byte position of a read or I/O error, if the error carries one.
    #[must_use]
    pub fn position(&self) -> Option<u64> {
        match self {
            Error::Read { position, .. } | Error::Io { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// The error message without its positional prefix.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Error::Read { message, .. } => message.clone(),
            Error::Write(message) | Error::Custom(message) => message.clone(),
            Error::Io { message, .. } => message.clone(),
            Error::Coerce { .. } | Error::Property { .. } => self.to_string(),
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Write(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    fn invalid_type(unexp: serde::de::Unexpected<'_>, exp: &dyn serde::de::Expected) -> Self {
        Error::coerce(&unexp.to_string(), &exp.to_string())
    }

    fn invalid_value(unexp: serde::de::Unexpected<'_>, exp: &dyn serde::de::Expected) -> Self {
        Error::coerce(&unexp.to_string(), &exp.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_read_error_display() {
        let err = Error::read(7, "end of input expected");
        assert_eq!(err.to_string(), "Reader Error [7]: end of input expected");
        assert_eq!(err.position(), Some(7));
        assert!(err.source().is_none());
    }

    #[test]
    fn test_read_error_keeps_cause() {
        let cause = Error::coerce("string", "i32");
        let err = Error::read_with_cause(3, "unable to set property Model.i", cause);
        assert!(err.to_string().contains("unable to set property"));
        let source = err.source().unwrap();
        assert!(source.to_string().contains("unable to coerce string to i32"));
    }

    #[test]
    fn test_property_error_chain() {
        let err = Error::property("Point", "x", Error::coerce("string", "i32"));
        assert_eq!(
            err.to_string(),
            "unable to set property Point.x: unable to coerce string to i32"
        );
        assert!(err.source().unwrap().to_string().contains("unable to coerce"));
    }

    #[test]
    fn test_serde_invalid_type_is_coercion() {
        use serde::de::{Error as _, Unexpected};

        let err = Error::invalid_type(Unexpected::Str("x"), &"a boolean");
        assert!(err.to_string().starts_with("unable to coerce"));
    }

    #[test]
    fn test_message_strips_prefix() {
        assert_eq!(Error::read(1, "invalid number").message(), "invalid number");
        assert_eq!(Error::write("boom").message(), "boom");
        assert_eq!(Error::write("boom").position(), None);
    }
}
