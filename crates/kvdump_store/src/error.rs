//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] kvdump_storage::StorageError),

    /// I/O error outside the storage backend (directories, lock file).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A commit record could not be serialized or deserialized.
    #[error("commit record encoding failed: {message}")]
    Encoding {
        /// Description of the failure.
        message: String,
    },

    /// The key (or, with `NO_DUP_DATA`, the exact pair) is already present.
    #[error("key already exists")]
    KeyExist,

    /// A key or value has a size the database cannot hold.
    #[error("bad value size: {message}")]
    BadValueSize {
        /// Description of the offending size.
        message: String,
    },

    /// The named database does not exist.
    #[error("database not found: {name}")]
    DatabaseNotFound {
        /// Display form of the database name.
        name: String,
    },

    /// An existing database was opened with different persistent flags.
    #[error("database {name} exists with flags {stored:#x}, requested {requested:#x}")]
    IncompatibleFlags {
        /// Display form of the database name.
        name: String,
        /// Flags recorded for the database.
        stored: u32,
        /// Flags passed to the open call.
        requested: u32,
    },

    /// Another process holds the environment lock.
    #[error("environment locked: another process has exclusive access")]
    EnvironmentLocked,

    /// The commit log is corrupted before its final record.
    #[error("commit log corruption at offset {offset}: {message}")]
    LogCorruption {
        /// Offset of the bad record.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Why the operation is invalid.
        message: String,
    },
}

impl StoreError {
    /// Creates an encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Creates a bad value size error.
    pub fn bad_value_size(message: impl Into<String>) -> Self {
        Self::BadValueSize {
            message: message.into(),
        }
    }

    /// Creates a log corruption error.
    pub fn log_corruption(offset: u64, message: impl Into<String>) -> Self {
        Self::LogCorruption {
            offset,
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true for the duplicate-key condition a loader may tolerate.
    #[must_use]
    pub fn is_key_exist(&self) -> bool {
        matches!(self, Self::KeyExist)
    }
}

/// Formats an optional database name for diagnostics.
pub(crate) fn display_name(name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{name:?}"),
        None => "<default>".to_string(),
    }
}
