//! Error types for dump loading.

use kvdump_store::StoreError;
use std::io;
use thiserror::Error;

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// A violation of the dump format.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The header declares a version newer than this loader understands.
    #[error("unsupported VERSION {0}")]
    UnsupportedVersion(u32),

    /// The `VERSION=` value is not an integer.
    #[error("invalid VERSION {0:?}")]
    InvalidVersion(String),

    /// The `format=` value is neither `print` nor `bytevalue`.
    #[error("unsupported format {0:?}")]
    UnsupportedFormat(String),

    /// The `type=` value is not `btree`.
    #[error("unsupported type {0:?}")]
    UnsupportedType(String),

    /// A header line lacks `=`.
    #[error("unexpected format: header line without '='")]
    MalformedHeaderLine,

    /// The `database=` value is not valid UTF-8.
    #[error("database name is not valid UTF-8")]
    InvalidDatabaseName,

    /// A record line starts with neither a space nor `DATA=END`.
    #[error("malformed record framing")]
    MalformedFraming,

    /// A `\` escape is neither `\\` nor two hex digits.
    #[error("invalid escape at byte {offset}")]
    InvalidEscape {
        /// Offset of the backslash within the line payload.
        offset: usize,
    },

    /// A hex-pairs payload contains a non-hex digit.
    #[error("invalid hex digit at byte {offset}")]
    InvalidHexDigit {
        /// Offset of the offending pair within the line payload.
        offset: usize,
    },

    /// A hex-pairs payload has an odd number of digits.
    #[error("odd-length hex line ({len} digits)")]
    OddHexLength {
        /// Number of hex digits on the line.
        len: usize,
    },

    /// A key line was not followed by a value line.
    #[error("key without a value")]
    UnpairedKey,

    /// The input ended inside a header or a record.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// The scratch buffer could not grow to hold a line.
    #[error("out of memory, line too long (buffer at {capacity} bytes)")]
    BufferExhausted {
        /// Capacity at the time growth failed.
        capacity: usize,
    },
}

/// A failed load, tagged with the 1-based input line it was detected on.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The load was configured inconsistently.
    #[error("configuration error: {0}")]
    Config(String),

    /// The input violates the dump format.
    #[error("line {line}: {source}")]
    Format {
        /// Line number.
        line: u64,
        /// What was wrong.
        source: FormatError,
    },

    /// The store rejected an operation.
    #[error("line {line}: {source}")]
    Store {
        /// Line number.
        line: u64,
        /// The store failure.
        source: StoreError,
    },

    /// Reading the input failed.
    #[error("line {line}: read failed: {source}")]
    Io {
        /// Line number.
        line: u64,
        /// The I/O failure.
        source: io::Error,
    },
}

impl LoadError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a format error at `line`.
    pub fn format(line: u64, source: FormatError) -> Self {
        Self::Format { line, source }
    }

    /// Creates a store error at `line`.
    pub fn store(line: u64, source: StoreError) -> Self {
        Self::Store { line, source }
    }

    /// Line the failure was detected on, if it concerns the input.
    #[must_use]
    pub fn line(&self) -> Option<u64> {
        match self {
            Self::Config(_) => None,
            Self::Format { line, .. } | Self::Store { line, .. } | Self::Io { line, .. } => {
                Some(*line)
            }
        }
    }

    /// The format violation, if that is what failed.
    #[must_use]
    pub fn format_error(&self) -> Option<&FormatError> {
        match self {
            Self::Format { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A failure while pulling a line off the input, not yet tagged with a line.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The reader failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The line could not be held or decoded.
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl ReadError {
    pub(crate) fn at(self, line: u64) -> LoadError {
        match self {
            Self::Io(source) => LoadError::Io { line, source },
            Self::Format(source) => LoadError::Format { line, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_line_number() {
        let err = LoadError::format(17, FormatError::OddHexLength { len: 3 });
        assert_eq!(err.to_string(), "line 17: odd-length hex line (3 digits)");
        assert_eq!(err.line(), Some(17));
    }

    #[test]
    fn store_errors_keep_their_message() {
        let err = LoadError::store(4, StoreError::KeyExist);
        assert_eq!(err.to_string(), "line 4: key already exists");
        assert!(err.format_error().is_none());
    }

    #[test]
    fn read_error_tags_line() {
        let err = ReadError::from(FormatError::UnexpectedEof).at(9);
        assert_eq!(err.format_error(), Some(&FormatError::UnexpectedEof));
        assert_eq!(err.line(), Some(9));
    }
}
