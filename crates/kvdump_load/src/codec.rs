//! In-place decoding of record payloads.
//!
//! Both decoders rewrite a line inside its own buffer. Every encoded form
//! is at least as long as the bytes it decodes to, so the write cursor
//! never passes the read cursor.

use crate::error::FormatError;

/// How record payloads in a section are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatMode {
    /// Printable bytes verbatim, `\\` for a backslash, `\XX` for anything
    /// else (`format=print`).
    EscapedText,
    /// Two hex digits per byte (`format=bytevalue`).
    #[default]
    HexPairs,
}

impl FormatMode {
    /// Maps a `format=` header value to a mode. Matching is exact.
    #[must_use]
    pub fn from_header_value(value: &[u8]) -> Option<Self> {
        match value {
            b"print" => Some(Self::EscapedText),
            b"bytevalue" => Some(Self::HexPairs),
            _ => None,
        }
    }

    /// The header value naming this mode.
    #[must_use]
    pub fn header_value(self) -> &'static str {
        match self {
            Self::EscapedText => "print",
            Self::HexPairs => "bytevalue",
        }
    }

    /// Decodes `buf` in place, returning the decoded length.
    ///
    /// # Errors
    ///
    /// Returns the first encoding violation found.
    pub fn decode_in_place(self, buf: &mut [u8]) -> Result<usize, FormatError> {
        match self {
            Self::EscapedText => unescape_in_place(buf),
            Self::HexPairs => unhex_in_place(buf),
        }
    }
}

/// Value of one hex digit, accepting either case.
#[must_use]
pub fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

fn hex_pair(high: u8, low: u8) -> Option<u8> {
    Some((hex_value(high)? << 4) | hex_value(low)?)
}

/// Decodes escaped text in place.
///
/// # Errors
///
/// [`FormatError::InvalidEscape`] for a backslash followed by anything but
/// a backslash or two hex digits, including one cut short by the line end.
pub fn unescape_in_place(buf: &mut [u8]) -> Result<usize, FormatError> {
    let mut read = 0;
    let mut write = 0;

    while read < buf.len() {
        let byte = buf[read];
        if byte != b'\\' {
            buf[write] = byte;
            read += 1;
            write += 1;
            continue;
        }

        let invalid = FormatError::InvalidEscape { offset: read };
        buf[write] = match buf.get(read + 1) {
            Some(b'\\') => {
                read += 2;
                b'\\'
            }
            Some(&high) => {
                let low = *buf.get(read + 2).ok_or(invalid.clone())?;
                let value = hex_pair(high, low).ok_or(invalid)?;
                read += 3;
                value
            }
            None => return Err(invalid),
        };
        write += 1;
    }

    Ok(write)
}

/// Decodes hex pairs in place.
///
/// # Errors
///
/// [`FormatError::OddHexLength`] for an odd digit count,
/// [`FormatError::InvalidHexDigit`] for a non-hex pair.
pub fn unhex_in_place(buf: &mut [u8]) -> Result<usize, FormatError> {
    if buf.len() % 2 != 0 {
        return Err(FormatError::OddHexLength { len: buf.len() });
    }

    let decoded = buf.len() / 2;
    for i in 0..decoded {
        let offset = i * 2;
        buf[i] = hex_pair(buf[offset], buf[offset + 1])
            .ok_or(FormatError::InvalidHexDigit { offset })?;
    }
    Ok(decoded)
}
