//! UTF-8 translation between byte streams and Unicode codepoints.
//!
//! Decoding is table driven: the leading byte selects the sequence length and
//! the accumulated bytes are untagged with a single subtraction. Encoding
//! writes the standard 1–4 byte forms.

use crate::{Error, Result};

/// Length of a UTF-8 sequence indexed by its leading byte. Zero marks a byte
/// that cannot start a sequence.
pub const UTF8_LENGTH: [u8; 256] = [
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, //
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, //
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, //
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, //
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, //
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, //
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, //
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, //
    2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, //
    3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, //
    4, 4, 4, 4, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
];

/// Tag bits accumulated by a sequence of each length, removed in one subtraction.
pub const UTF8_TAG: [u32; 5] = [0x0000_0000, 0x0000_0000, 0x0000_3080, 0x000E_2080, 0x03C8_2080];

/// Why a byte sequence could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The leading byte cannot start a sequence.
    IllegalLeadingByte(u8),
    /// The input ended inside a multi-byte sequence.
    Truncated,
}

/// Decodes one codepoint whose leading byte is `first`, pulling continuation
/// bytes from `next` (which returns `None` at end of input).
///
/// Continuation bytes are not validated beyond their presence; the caller
/// decides what to do with codepoints that are not Unicode scalar values.
///
/// # Examples
///
/// ```rust
/// use sigma::utf8::decode;
///
/// let bytes = "é".as_bytes();
/// let mut rest = bytes[1..].iter().copied();
/// assert_eq!(decode(bytes[0], || rest.next()), Ok(0xE9));
/// ```
pub fn decode<F>(first: u8, mut next: F) -> std::result::Result<u32, DecodeError>
where
    F: FnMut() -> Option<u8>,
{
    let len = UTF8_LENGTH[first as usize] as usize;
    if len == 0 {
        return Err(DecodeError::IllegalLeadingByte(first));
    }
    let mut utf8 = first as u32;
    for _ in 1..len {
        let b = next().ok_or(DecodeError::Truncated)?;
        utf8 = (utf8 << 6).wrapping_add(b as u32);
    }
    Ok(utf8.wrapping_sub(UTF8_TAG[len]))
}

/// Encodes `c` as UTF-8, handing each byte to `sink`.
///
/// # Errors
///
/// Fails with "character out of range" for codepoints beyond U+10FFFF.
///
/// # Examples
///
/// ```rust
/// use sigma::utf8::encode;
///
/// let mut out = Vec::new();
/// encode(0x1F600, |b| { out.push(b); Ok(()) }).unwrap();
/// assert_eq!(out, "😀".as_bytes());
/// assert!(encode(0x110000, |_| Ok(())).is_err());
/// ```
pub fn encode<F>(c: u32, mut sink: F) -> Result<()>
where
    F: FnMut(u8) -> Result<()>,
{
    if c <= 0x7F {
        sink(c as u8)
    } else if c <= 0x7FF {
        sink((0xC0 | (c >> 6)) as u8)?;
        sink((0x80 | (c & 0x3F)) as u8)
    } else if c <= 0xFFFF {
        sink((0xE0 | (c >> 12)) as u8)?;
        sink((0x80 | ((c >> 6) & 0x3F)) as u8)?;
        sink((0x80 | (c & 0x3F)) as u8)
    } else if c <= 0x10FFFF {
        sink((0xF0 | (c >> 18)) as u8)?;
        sink((0x80 | ((c >> 12) & 0x3F)) as u8)?;
        sink((0x80 | ((c >> 6) & 0x3F)) as u8)?;
        sink((0x80 | (c & 0x3F)) as u8)
    } else {
        Err(Error::write(format!(
            "character out of range for UTF-8 encoding: {:#X}",
            c
        )))
    }
}
