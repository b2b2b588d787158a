//! Configuration options for Sigma writing.
//!
//! This module provides types to customize writer output:
//!
//! - [`WriteOptions`]: Main configuration struct
//! - [`BinaryEncoding`]: How byte blobs are written (raw or base64)
//!
//! ## Examples
//!
//! ```rust
//! use sigma::{to_string_with_options, Bytes, WriteOptions};
//!
//! let data = Bytes::from(vec![1, 2, 3]);
//!
//! let options = WriteOptions::base64();
//! assert_eq!(to_string_with_options(&data, options).unwrap(), "*AQID");
//! ```

/// Encoding used for byte blobs.
///
/// - **Raw**: `|len|` followed by the bytes verbatim. Default, most compact.
/// - **Base64**: `*` followed by unpadded standard base64. Keeps the output
///   printable.
///
/// # Examples
///
/// ```rust
/// use sigma::BinaryEncoding;
///
/// assert_eq!(BinaryEncoding::default(), BinaryEncoding::Raw);
/// assert_eq!(BinaryEncoding::Base64.marker(), '*');
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BinaryEncoding {
    #[default]
    Raw,
    Base64,
}

impl BinaryEncoding {
    /// The character that introduces a blob in this encoding.
    #[must_use]
    pub const fn marker(&self) -> char {
        match self {
            BinaryEncoding::Raw => '|',
            BinaryEncoding::Base64 => '*',
        }
    }
}

/// Configuration options for the Sigma writer.
///
/// # Examples
///
/// ```rust
/// use sigma::{BinaryEncoding, WriteOptions};
///
/// let options = WriteOptions::new();
/// assert_eq!(options.binary_encoding, BinaryEncoding::Raw);
///
/// let options = WriteOptions::new().with_raw_binary(false);
/// assert_eq!(options.binary_encoding, BinaryEncoding::Base64);
/// ```
#[derive(Clone, Debug, Default)]
pub struct WriteOptions {
    pub binary_encoding: BinaryEncoding,
}

impl WriteOptions {
    /// Creates default options (raw binary).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for base64 binary output.
    #[must_use]
    pub fn base64() -> Self {
        Self::new().with_binary_encoding(BinaryEncoding::Base64)
    }

    /// Sets the binary encoding.
    #[must_use]
    pub fn with_binary_encoding(mut self, encoding: BinaryEncoding) -> Self {
        self.binary_encoding = encoding;
        self
    }

    /// Chooses raw binary when `allow` is true and base64 otherwise.
    #[must_use]
    pub fn with_raw_binary(self, allow: bool) -> Self {
        self.with_binary_encoding(if allow {
            BinaryEncoding::Raw
        } else {
            BinaryEncoding::Base64
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chaining() {
        let options = WriteOptions::base64().with_raw_binary(true);
        assert_eq!(options.binary_encoding, BinaryEncoding::Raw);
    }

    #[test]
    fn test_markers() {
        assert_eq!(BinaryEncoding::Raw.marker(), '|');
        assert_eq!(BinaryEncoding::Base64.marker(), '*');
    }
}
