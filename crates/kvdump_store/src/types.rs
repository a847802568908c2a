//! Core type definitions for the store.

use bitflags::bitflags;
use std::fmt;

/// Unique identifier for a write transaction.
///
/// Transaction IDs are monotonically increasing and never reused within
/// one environment; reopening continues after the last committed ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Creates a new transaction ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// Handle to an open database.
///
/// A handle obtained inside a write transaction stays valid for later
/// transactions until `Environment::close_database` is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dbi(pub(crate) u32);

impl Dbi {
    /// Returns the raw handle value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Dbi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dbi:{}", self.0)
    }
}

bitflags! {
    /// Persistent per-database flags, fixed when the database is created.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DatabaseFlags: u32 {
        /// Compare keys from their last byte backwards.
        const REVERSE_KEY = 0x02;
        /// A key may hold several values, kept sorted.
        const DUP_SORT = 0x04;
        /// Keys are native-endian unsigned integers of 4 or 8 bytes.
        const INTEGER_KEY = 0x08;
        /// Duplicate values all share one size.
        const DUP_FIXED = 0x10;
        /// Duplicate values are native-endian unsigned integers.
        const INTEGER_DUP = 0x20;
        /// Compare duplicate values from their last byte backwards.
        const REVERSE_DUP = 0x40;
    }
}

bitflags! {
    /// Options for a single `Cursor::put`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PutFlags: u32 {
        /// Fail with `KeyExist` if the key is already present.
        const NO_OVERWRITE = 0x10;
        /// In a `DUP_SORT` database, fail with `KeyExist` if the pair is present.
        const NO_DUP_DATA = 0x20;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_id_ordering() {
        assert!(TransactionId::new(1) < TransactionId::new(2));
        assert_eq!(format!("{}", TransactionId::new(7)), "txn:7");
    }

    #[test]
    fn dbi_display() {
        assert_eq!(format!("{}", Dbi(3)), "dbi:3");
    }

    #[test]
    fn database_flags_from_bits_drop_unknown() {
        let flags = DatabaseFlags::from_bits_truncate(0x04 | 0x01);
        assert_eq!(flags, DatabaseFlags::DUP_SORT);
    }
}
